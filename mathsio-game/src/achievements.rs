//! Achievement table and unlock checks against a player's lifetime stats.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_ACHIEVEMENT_DATA: &str = include_str!("../assets/achievements.json");

/// Lifetime counters achievements are checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub total_xp: u32,
    pub level: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub total_exercises: u32,
    pub perfect_scores: u32,
    pub total_games: u32,
    /// Minutes.
    pub total_play_time: u32,
    pub quests_completed: u32,
    pub chapters_unlocked: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Progression,
    Streak,
    Score,
    Special,
}

impl AchievementCategory {
    pub const ALL: &'static [Self] = &[Self::Progression, Self::Streak, Self::Score, Self::Special];

    /// Display name shown above each group of badges.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Progression => "Progression",
            Self::Streak => "Séries",
            Self::Score => "Performance",
            Self::Special => "Spécial",
        }
    }
}

/// Which counter of [`UserStats`] a condition reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatMetric {
    TotalXp,
    Level,
    Streak,
    MaxStreak,
    TotalExercises,
    PerfectScores,
    TotalGames,
    TotalPlayTime,
    QuestsCompleted,
    ChaptersUnlocked,
}

impl StatMetric {
    #[must_use]
    pub const fn read(self, stats: &UserStats) -> u32 {
        match self {
            Self::TotalXp => stats.total_xp,
            Self::Level => stats.level,
            Self::Streak => stats.streak,
            Self::MaxStreak => stats.max_streak,
            Self::TotalExercises => stats.total_exercises,
            Self::PerfectScores => stats.perfect_scores,
            Self::TotalGames => stats.total_games,
            Self::TotalPlayTime => stats.total_play_time,
            Self::QuestsCompleted => stats.quests_completed,
            Self::ChaptersUnlocked => stats.chapters_unlocked,
        }
    }
}

/// Threshold on a single counter: met once `metric >= at_least`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockCondition {
    pub metric: StatMetric,
    pub at_least: u32,
}

impl UnlockCondition {
    #[must_use]
    pub const fn is_met(&self, stats: &UserStats) -> bool {
        self.metric.read(stats) >= self.at_least
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    pub category: AchievementCategory,
    pub condition: UnlockCondition,
    pub xp_reward: u32,
}

#[derive(Debug, Error)]
pub enum AchievementConfigError {
    #[error("achievement table is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("achievement with an empty id")]
    EmptyId,
    #[error("achievement {0} is declared more than once")]
    Duplicate(String),
    #[error("achievement {0} grants no XP")]
    ZeroReward(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AchievementCatalog {
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

impl AchievementCatalog {
    /// Parse and validate an achievement table.
    ///
    /// # Errors
    ///
    /// Returns [`AchievementConfigError`] on malformed JSON, an empty or
    /// repeated id, or an achievement worth zero XP.
    pub fn from_json(json: &str) -> Result<Self, AchievementConfigError> {
        let catalog: Self = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        for achievement in &catalog.achievements {
            if achievement.id.trim().is_empty() {
                return Err(AchievementConfigError::EmptyId);
            }
            if !seen.insert(achievement.id.clone()) {
                return Err(AchievementConfigError::Duplicate(achievement.id.clone()));
            }
            if achievement.xp_reward == 0 {
                return Err(AchievementConfigError::ZeroReward(achievement.id.clone()));
            }
        }
        Ok(catalog)
    }

    /// Bundled table. A rejected table unlocks nothing rather than failing.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_ACHIEVEMENT_DATA).unwrap_or_else(|err| {
            log::warn!("bundled achievement table rejected: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<AchievementCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    /// Achievements whose condition holds and whose id is not yet unlocked,
    /// in table order.
    #[must_use]
    pub fn check_new<S: AsRef<str>>(&self, stats: &UserStats, unlocked: &[S]) -> Vec<&Achievement> {
        self.achievements
            .iter()
            .filter(|a| !unlocked.iter().any(|id| id.as_ref() == a.id))
            .filter(|a| a.condition.is_met(stats))
            .collect()
    }

    #[must_use]
    pub fn in_category(&self, category: AchievementCategory) -> Vec<&Achievement> {
        self.achievements
            .iter()
            .filter(|a| a.category == category)
            .collect()
    }
}

/// Look up an achievement in the bundled table.
#[must_use]
pub fn achievement_by_id(id: &str) -> Option<&'static Achievement> {
    AchievementCatalog::default_catalog().by_id(id)
}

/// Newly earned achievements from the bundled table.
#[must_use]
pub fn check_new_achievements<S: AsRef<str>>(
    stats: &UserStats,
    unlocked: &[S],
) -> Vec<&'static Achievement> {
    let fresh = AchievementCatalog::default_catalog().check_new(stats, unlocked);
    if !fresh.is_empty() {
        log::debug!("{} achievements unlocked", fresh.len());
    }
    fresh
}
