//! Player profiles, XP levels, daily streaks and an in-memory progress store.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use crate::achievements::UserStats;
use crate::constants::XP_PER_LEVEL;
use crate::modes::GameModeId;
use crate::session::SessionReport;
use crate::{ProgressStore, UserDirectory};

/// Level reached with `xp` total experience: `floor(xp / 100) + 1`.
#[must_use]
pub const fn level_for_xp(xp: u32) -> u32 {
    xp / XP_PER_LEVEL + 1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub xp: u32,
    pub level: u32,
    /// Consecutive days played.
    pub streak: u32,
    #[serde(default)]
    pub max_streak: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<NaiveDate>,
}

impl UserProfile {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            xp: 0,
            level: level_for_xp(0),
            streak: 0,
            max_streak: 0,
            last_activity: None,
        }
    }

    /// Count a visit on `today` towards the daily streak and return it.
    ///
    /// The day after the last visit extends the streak, a longer gap restarts
    /// it at 1 and a repeat visit the same day leaves it alone. A date before
    /// the last visit is treated as the same day.
    pub fn record_activity(&mut self, today: NaiveDate) -> u32 {
        let gap = self.last_activity.map(|last| (today - last).num_days());
        self.streak = match gap {
            None => 1,
            Some(1) => self.streak.saturating_add(1),
            Some(days) if days > 1 => 1,
            Some(_) => self.streak.max(1),
        };
        self.max_streak = self.max_streak.max(self.streak);
        self.last_activity = Some(self.last_activity.map_or(today, |last| last.max(today)));
        self.streak
    }

    /// Add `amount` XP and recompute the level. Non-positive amounts change nothing.
    ///
    /// Returns `true` when the level went up.
    pub fn apply_xp(&mut self, amount: i64) -> bool {
        if amount <= 0 {
            return false;
        }
        let gained = u32::try_from(amount).unwrap_or(u32::MAX);
        let before = self.level;
        self.xp = self.xp.saturating_add(gained);
        self.level = level_for_xp(self.xp);
        self.level > before
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    current_user: Option<String>,
    users: HashMap<String, UserProfile>,
    sessions: Vec<SessionReport>,
    high_scores: HashMap<(String, GameModeId), u32>,
}

/// Shared in-memory directory and progress store.
///
/// Clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    inner: Rc<RefCell<MemoryState>>,
}

impl MemoryProgressStore {
    /// Store with `profile` registered and signed in.
    #[must_use]
    pub fn with_user(profile: UserProfile) -> Self {
        let store = Self::default();
        store.insert_user(profile);
        store
    }

    /// Register `profile` and make it the signed-in user.
    pub fn insert_user(&self, profile: UserProfile) {
        let mut state = self.inner.borrow_mut();
        state.current_user = Some(profile.id.clone());
        state.users.insert(profile.id.clone(), profile);
    }

    pub fn sign_out(&self) {
        self.inner.borrow_mut().current_user = None;
    }

    #[must_use]
    pub fn profile(&self, user_id: &str) -> Option<UserProfile> {
        self.inner.borrow().users.get(user_id).cloned()
    }

    #[must_use]
    pub fn sessions(&self) -> Vec<SessionReport> {
        self.inner.borrow().sessions.clone()
    }

    /// Streak update for a visit on `today`; `None` for an unknown user.
    pub fn record_activity(&self, user_id: &str, today: NaiveDate) -> Option<u32> {
        let mut state = self.inner.borrow_mut();
        let profile = state.users.get_mut(user_id)?;
        let streak = profile.record_activity(today);
        log::debug!("{user_id} is on a {streak} day streak");
        Some(streak)
    }

    /// Lifetime stats of `user_id` for achievement checks.
    ///
    /// A perfect score is a session with every answered question correct.
    /// Quests and chapter unlocks are not tracked here and stay at zero.
    #[must_use]
    pub fn user_stats(&self, user_id: &str) -> Option<UserStats> {
        let state = self.inner.borrow();
        let profile = state.users.get(user_id)?;
        let mut stats = UserStats {
            total_xp: profile.xp,
            level: profile.level,
            streak: profile.streak,
            max_streak: profile.max_streak,
            ..UserStats::default()
        };
        let mut seconds: u64 = 0;
        for report in state.sessions.iter().filter(|r| r.user_id == user_id) {
            stats.total_games = stats.total_games.saturating_add(1);
            stats.total_exercises = stats.total_exercises.saturating_add(report.answered);
            if report.answered > 0 && report.correct_answers == report.answered {
                stats.perfect_scores = stats.perfect_scores.saturating_add(1);
            }
            seconds = seconds.saturating_add(report.duration_seconds);
        }
        stats.total_play_time = u32::try_from(seconds / 60).unwrap_or(u32::MAX);
        Some(stats)
    }

    #[must_use]
    pub fn high_score(&self, user_id: &str, mode: GameModeId) -> Option<u32> {
        self.inner
            .borrow()
            .high_scores
            .get(&(user_id.to_string(), mode))
            .copied()
    }
}

impl UserDirectory for MemoryProgressStore {
    type Error = Infallible;

    fn current_user(&self) -> Result<Option<UserProfile>, Self::Error> {
        let state = self.inner.borrow();
        Ok(state
            .current_user
            .as_ref()
            .and_then(|id| state.users.get(id))
            .cloned())
    }
}

impl ProgressStore for MemoryProgressStore {
    type Error = Infallible;

    fn record_session(&self, report: &SessionReport) -> Result<(), Self::Error> {
        self.inner.borrow_mut().sessions.push(report.clone());
        Ok(())
    }

    fn apply_xp(&self, user_id: &str, amount: i64) -> Result<Option<UserProfile>, Self::Error> {
        let mut state = self.inner.borrow_mut();
        Ok(state.users.get_mut(user_id).map(|profile| {
            profile.apply_xp(amount);
            profile.clone()
        }))
    }

    fn save_high_score(
        &self,
        user_id: &str,
        mode: GameModeId,
        score: u32,
    ) -> Result<bool, Self::Error> {
        let mut state = self.inner.borrow_mut();
        let best = state
            .high_scores
            .entry((user_id.to_string(), mode))
            .or_insert(0);
        if score > *best {
            *best = score;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
