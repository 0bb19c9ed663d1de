//! Game session state machine: `Loading → InProgress → Finished`.
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::answer::check_answer;
use crate::catalog::{Chapter, ExerciseType};
use crate::constants::{
    COMBO_BONUS_FACTOR, COMBO_BONUS_THRESHOLD, FEEDBACK_ANSWER_PREFIX, FEEDBACK_CORRECT,
};
use crate::exercise::Exercise;
use crate::generator::ExerciseGenerator;
use crate::modes::{GameModeId, GameModeRules, ModeCatalog};
use crate::numbers::{floor_scaled_u32, rounded_percent, saturating_u32};
use crate::rng::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Loading,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The mode's error limit was reached.
    ErrorLimit,
    /// The last exercise was answered.
    Completed,
    /// The countdown reached zero.
    TimeUp,
}

/// Bonus for reaching `new_combo` consecutive correct answers.
#[must_use]
pub const fn combo_bonus(new_combo: u32) -> u32 {
    if new_combo >= COMBO_BONUS_THRESHOLD {
        new_combo.saturating_mul(COMBO_BONUS_FACTOR)
    } else {
        0
    }
}

/// Running score counters for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBoard {
    pub score: u32,
    pub errors: u32,
    pub correct_answers: u32,
    pub combo: u32,
    pub max_combo: u32,
}

impl ScoreBoard {
    /// Fold one judged answer into the counters, returning `(points, combo_bonus)`.
    pub fn record(&mut self, correct: bool, xp_reward: u32) -> (u32, u32) {
        let new_combo = if correct {
            self.combo.saturating_add(1)
        } else {
            0
        };
        let bonus = if correct { combo_bonus(new_combo) } else { 0 };
        let points = if correct { xp_reward } else { 0 };
        self.score = self.score.saturating_add(points).saturating_add(bonus);
        self.combo = new_combo;
        self.max_combo = self.max_combo.max(new_combo);
        if correct {
            self.correct_answers = self.correct_answers.saturating_add(1);
        } else {
            self.errors = self.errors.saturating_add(1);
        }
        (points, bonus)
    }

    #[must_use]
    pub const fn answered(&self) -> u32 {
        self.correct_answers.saturating_add(self.errors)
    }
}

/// What the player sees right after submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_answer: String,
    pub message: String,
    pub points: u32,
    pub combo_bonus: u32,
    pub combo: u32,
    /// Set when this answer ended the session.
    pub finished: Option<FinishReason>,
}

/// Aggregate handed to the progress sink when a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub user_id: String,
    pub mode: GameModeId,
    pub score: u32,
    pub total_questions: u32,
    pub answered: u32,
    pub correct_answers: u32,
    pub errors: u32,
    pub max_combo: u32,
    pub xp_earned: u32,
    pub duration_seconds: u64,
    /// Rounded percentage of answered questions that were correct.
    pub accuracy: u32,
    pub reason: FinishReason,
}

/// Which mode to play and, optionally, which exercise kinds to draw from.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub mode: GameModeId,
    pub rules: GameModeRules,
    pub kinds: Option<Vec<ExerciseType>>,
}

impl SessionConfig {
    /// Rules taken from the bundled mode table.
    #[must_use]
    pub fn for_mode(mode: GameModeId) -> Self {
        Self {
            mode,
            rules: ModeCatalog::default_catalog().rules_safe(mode),
            kinds: None,
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: GameModeRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_kinds(mut self, kinds: Vec<ExerciseType>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    /// Restrict the draw to the kinds a chapter covers.
    #[must_use]
    pub fn for_chapter(self, chapter: &Chapter) -> Self {
        self.with_kinds(chapter.exercise_types.clone())
    }
}

/// Single-fire flag guarding the finish transition.
#[derive(Debug, Default)]
struct FinishLatch(AtomicBool);

impl FinishLatch {
    /// Returns `true` only for the first caller.
    fn fire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn is_fired(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One play-through of a game mode.
#[derive(Debug)]
pub struct GameSession {
    user_id: String,
    config: SessionConfig,
    phase: SessionPhase,
    exercises: Vec<Exercise>,
    current_index: usize,
    board: ScoreBoard,
    time_remaining: Option<u32>,
    pending_feedback: Option<AnswerFeedback>,
    latch: FinishLatch,
    finish_reason: Option<FinishReason>,
    xp_earned: Option<u32>,
    report: Option<SessionReport>,
    ticked_seconds: u64,
    started_at: Option<Instant>,
}

impl GameSession {
    /// A session in `Loading`, waiting for its exercises.
    #[must_use]
    pub fn new(user_id: impl Into<String>, config: SessionConfig) -> Self {
        Self {
            user_id: user_id.into(),
            config,
            phase: SessionPhase::Loading,
            exercises: Vec::new(),
            current_index: 0,
            board: ScoreBoard::default(),
            time_remaining: None,
            pending_feedback: None,
            latch: FinishLatch::default(),
            finish_reason: None,
            xp_earned: None,
            report: None,
            ticked_seconds: 0,
            started_at: None,
        }
    }

    /// Generate the exercise sequence and move to `InProgress`.
    pub fn begin<R: RandomSource>(&mut self, generator: &mut ExerciseGenerator<R>) {
        let count = self.config.rules.effective_question_count();
        let exercises = generator.generate_exercises(count, self.config.kinds.as_deref());
        self.begin_with(exercises);
    }

    /// Start with a prepared exercise sequence. Ignored outside `Loading`.
    pub fn begin_with(&mut self, exercises: Vec<Exercise>) {
        if self.phase != SessionPhase::Loading {
            log::debug!("begin ignored in phase {:?}", self.phase);
            return;
        }
        self.exercises = exercises;
        self.time_remaining = self.config.rules.time_limit;
        self.started_at = Some(Instant::now());
        self.phase = SessionPhase::InProgress;
        log::debug!(
            "session for {} started in {} with {} exercises",
            self.user_id,
            self.config.mode,
            self.exercises.len()
        );
        if self.exercises.is_empty() {
            self.finish(FinishReason::Completed);
        }
    }

    /// Judge `raw` against the current exercise.
    ///
    /// Returns `None` when the session is not in progress or when the previous
    /// answer's feedback has not been acknowledged with [`GameSession::advance`].
    pub fn submit_answer(&mut self, raw: &str) -> Option<AnswerFeedback> {
        if self.phase != SessionPhase::InProgress || self.pending_feedback.is_some() {
            return None;
        }
        let exercise = self.exercises.get(self.current_index)?;
        let check = check_answer(exercise, raw);
        let (points, bonus) = self.board.record(check.correct, exercise.xp_reward());

        let limit_hit = self
            .config
            .rules
            .max_errors
            .is_some_and(|max| self.board.errors >= max);
        let last = self.current_index + 1 >= self.exercises.len();
        let reason = if limit_hit {
            Some(FinishReason::ErrorLimit)
        } else if last {
            Some(FinishReason::Completed)
        } else {
            None
        };

        let message = if check.correct {
            FEEDBACK_CORRECT.to_string()
        } else {
            format!("{FEEDBACK_ANSWER_PREFIX}{}", check.correct_answer)
        };
        let mut feedback = AnswerFeedback {
            correct: check.correct,
            correct_answer: check.correct_answer,
            message,
            points,
            combo_bonus: bonus,
            combo: self.board.combo,
            finished: None,
        };
        match reason {
            Some(reason) if self.finish(reason) => feedback.finished = Some(reason),
            Some(_) => {}
            None => self.pending_feedback = Some(feedback.clone()),
        }
        Some(feedback)
    }

    /// Clear pending feedback and move to the next exercise.
    pub fn advance(&mut self) -> bool {
        if self.phase != SessionPhase::InProgress || self.pending_feedback.take().is_none() {
            return false;
        }
        self.current_index += 1;
        true
    }

    /// Count down `seconds`; returns the finish reason if this tick ended the session.
    pub fn tick(&mut self, seconds: u32) -> Option<FinishReason> {
        if self.phase != SessionPhase::InProgress {
            return None;
        }
        self.ticked_seconds = self.ticked_seconds.saturating_add(u64::from(seconds));
        let remaining = self.time_remaining?.saturating_sub(seconds);
        self.time_remaining = Some(remaining);
        if remaining == 0 && self.finish(FinishReason::TimeUp) {
            return Some(FinishReason::TimeUp);
        }
        None
    }

    /// Finish with `reason`. Only the first call has any effect.
    pub fn finish(&mut self, reason: FinishReason) -> bool {
        if self.phase == SessionPhase::Loading || !self.latch.fire() {
            return false;
        }
        self.phase = SessionPhase::Finished;
        self.pending_feedback = None;
        self.finish_reason = Some(reason);
        let xp = floor_scaled_u32(self.board.score, self.config.rules.xp_multiplier);
        self.xp_earned = Some(xp);
        let report = SessionReport {
            user_id: self.user_id.clone(),
            mode: self.config.mode,
            score: self.board.score,
            total_questions: saturating_u32(self.exercises.len()),
            answered: self.board.answered(),
            correct_answers: self.board.correct_answers,
            errors: self.board.errors,
            max_combo: self.board.max_combo,
            xp_earned: xp,
            duration_seconds: self.duration_seconds(),
            accuracy: self.accuracy(),
            reason,
        };
        log::info!(
            "session for {} in {} finished ({reason:?}): score {}, xp {xp}",
            self.user_id,
            self.config.mode,
            report.score
        );
        self.report = Some(report);
        true
    }

    /// Hand out the finish report. Yields `Some` at most once per play-through.
    pub fn take_report(&mut self) -> Option<SessionReport> {
        self.report.take()
    }

    /// Back to `Loading` with fresh counters; call [`GameSession::begin`] again to replay.
    pub fn restart(&mut self) {
        let user_id = std::mem::take(&mut self.user_id);
        let config = self.config.clone();
        *self = Self::new(user_id, config);
        log::debug!("session restarted in {}", self.config.mode);
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub const fn mode(&self) -> GameModeId {
        self.config.mode
    }

    #[must_use]
    pub const fn rules(&self) -> &GameModeRules {
        &self.config.rules
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.latch.is_fired()
    }

    #[must_use]
    pub const fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    #[must_use]
    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    #[must_use]
    pub fn current_exercise(&self) -> Option<&Exercise> {
        match self.phase {
            SessionPhase::InProgress => self.exercises.get(self.current_index),
            _ => None,
        }
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub const fn board(&self) -> &ScoreBoard {
        &self.board
    }

    #[must_use]
    pub const fn time_remaining(&self) -> Option<u32> {
        self.time_remaining
    }

    #[must_use]
    pub const fn pending_feedback(&self) -> Option<&AnswerFeedback> {
        self.pending_feedback.as_ref()
    }

    #[must_use]
    pub const fn xp_earned(&self) -> Option<u32> {
        self.xp_earned
    }

    #[must_use]
    pub fn accuracy(&self) -> u32 {
        rounded_percent(
            self.board.correct_answers as usize,
            self.board.answered() as usize,
        )
    }

    /// Larger of the ticked countdown seconds and the wall-clock time since start.
    #[must_use]
    pub fn duration_seconds(&self) -> u64 {
        let wall = self
            .started_at
            .map_or(0, |started| started.elapsed().as_secs());
        wall.max(self.ticked_seconds)
    }
}
