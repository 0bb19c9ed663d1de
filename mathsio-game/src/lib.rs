//! Mathsio Game Engine
//!
//! Platform-agnostic exercise engine for BTS SIO math revision: procedural
//! exercise generation, free-text answer checking and the scoring game loop.
//! User identity and persistence are provided by the host through
//! [`UserDirectory`] and [`ProgressStore`].

pub mod achievements;
pub mod answer;
pub mod boolean;
pub mod catalog;
pub mod constants;
#[cfg(feature = "async")]
pub mod countdown;
pub mod exercise;
pub mod generator;
pub mod modes;
pub mod numbers;
pub mod numeric;
pub mod progress;
pub mod rng;
pub mod session;

use thiserror::Error;

// Re-export commonly used types
pub use achievements::{
    Achievement, AchievementCatalog, AchievementCategory, StatMetric, UnlockCondition, UserStats,
    achievement_by_id, check_new_achievements,
};
pub use answer::{AnswerCheck, check_answer, normalize};
pub use boolean::{
    BinaryOp, BooleanError, Expr, LogicGate, MAX_EXPRESSION_DEPTH, TruthRow, TruthTable, evaluate,
    parse, truth_column, truth_table, try_evaluate,
};
pub use catalog::{Chapter, ChapterCatalog, Difficulty, ExerciseType, Subject};
#[cfg(feature = "async")]
pub use countdown::{SharedSession, spawn_countdown};
pub use exercise::{Exercise, ExerciseData, Expected};
pub use generator::{ExerciseGenerator, SIMPLIFY_TEMPLATES, TRUTH_TABLE_TEMPLATES};
pub use modes::{GameModeConfig, GameModeId, GameModeRules, ModeCatalog, ModeConfigError, lookup};
pub use numeric::{
    Matrix, NumericError, conversion_steps, conversion_steps_from_str, convert_base, determinant,
    determinant_2x2, determinant_3x3, gcd, matrix_add, matrix_multiply, parse_in_base, transpose,
};
pub use progress::{MemoryProgressStore, UserProfile, level_for_xp};
pub use rng::{GenerationStreams, RandomSource, ScriptedSource};
pub use session::{
    AnswerFeedback, FinishReason, GameSession, ScoreBoard, SessionConfig, SessionPhase,
    SessionReport, combo_bonus,
};

/// Source of the signed-in player.
/// Platform-specific implementations should provide this
pub trait UserDirectory {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the currently authenticated user, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    fn current_user(&self) -> Result<Option<UserProfile>, Self::Error>;
}

/// Sink for finished sessions and XP updates.
pub trait ProgressStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Record a finished session
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be stored.
    fn record_session(&self, report: &SessionReport) -> Result<(), Self::Error>;

    /// Add XP to a user and recompute their level
    ///
    /// Non-positive amounts leave the profile untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be updated.
    fn apply_xp(&self, user_id: &str, amount: i64) -> Result<Option<UserProfile>, Self::Error>;

    /// Keep `score` as the user's best for `mode` if it beats the stored one
    ///
    /// # Errors
    ///
    /// Returns an error if the score cannot be stored.
    fn save_high_score(
        &self,
        user_id: &str,
        mode: GameModeId,
        score: u32,
    ) -> Result<bool, Self::Error>;
}

/// Failure to open a session.
#[derive(Debug, Error)]
pub enum StartError<E>
where
    E: std::error::Error + 'static,
{
    #[error("no authenticated user")]
    NotAuthenticated,
    #[error("user lookup failed")]
    Lookup(#[source] E),
}

/// Main game engine wiring sessions to the host's collaborators
pub struct GameEngine<D, S>
where
    D: UserDirectory,
    S: ProgressStore,
{
    directory: D,
    store: S,
}

impl<D, S> GameEngine<D, S>
where
    D: UserDirectory,
    S: ProgressStore,
{
    /// Create a new engine with the provided user directory and progress store
    pub const fn new(directory: D, store: S) -> Self {
        Self { directory, store }
    }

    pub const fn directory(&self) -> &D {
        &self.directory
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Open a session for the signed-in user and generate its exercises
    ///
    /// # Errors
    ///
    /// Returns [`StartError::NotAuthenticated`] when nobody is signed in and
    /// [`StartError::Lookup`] when the directory fails. Nothing is recorded.
    pub fn start_session<R: RandomSource>(
        &self,
        config: SessionConfig,
        generator: &mut ExerciseGenerator<R>,
    ) -> Result<GameSession, StartError<D::Error>> {
        let user = self
            .directory
            .current_user()
            .map_err(StartError::Lookup)?
            .ok_or(StartError::NotAuthenticated)?;
        let mut session = GameSession::new(user.id, config);
        session.begin(generator);
        Ok(session)
    }

    /// Submit an answer and persist the outcome if it ended the session
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the finished session fails.
    pub fn submit(
        &self,
        session: &mut GameSession,
        answer: &str,
    ) -> Result<Option<AnswerFeedback>, S::Error> {
        let feedback = session.submit_answer(answer);
        self.persist_finished(session)?;
        Ok(feedback)
    }

    /// Advance the countdown and persist the outcome if time ran out
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the finished session fails.
    pub fn tick(
        &self,
        session: &mut GameSession,
        seconds: u32,
    ) -> Result<Option<FinishReason>, S::Error> {
        let reason = session.tick(seconds);
        self.persist_finished(session)?;
        Ok(reason)
    }

    /// Store a finished session's report, award its XP and keep the high score
    ///
    /// Runs at most once per play-through since the report can only be taken once.
    ///
    /// # Errors
    ///
    /// Returns an error if any store call fails.
    pub fn persist_finished(
        &self,
        session: &mut GameSession,
    ) -> Result<Option<SessionReport>, S::Error> {
        let Some(report) = session.take_report() else {
            return Ok(None);
        };
        self.store.record_session(&report)?;
        self.store
            .apply_xp(&report.user_id, i64::from(report.xp_earned))?;
        self.store
            .save_high_score(&report.user_id, report.mode, report.score)?;
        Ok(Some(report))
    }

    /// Replay a session from `Loading` with fresh exercises
    pub fn replay<R: RandomSource>(
        &self,
        session: &mut GameSession,
        generator: &mut ExerciseGenerator<R>,
    ) {
        session.restart();
        session.begin(generator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Error)]
    #[error("directory offline")]
    struct Offline;

    struct BrokenDirectory;

    impl UserDirectory for BrokenDirectory {
        type Error = Offline;

        fn current_user(&self) -> Result<Option<UserProfile>, Self::Error> {
            Err(Offline)
        }
    }

    #[derive(Clone, Default)]
    struct CountingStore {
        recorded: Rc<RefCell<u32>>,
    }

    impl ProgressStore for CountingStore {
        type Error = std::convert::Infallible;

        fn record_session(&self, _report: &SessionReport) -> Result<(), Self::Error> {
            *self.recorded.borrow_mut() += 1;
            Ok(())
        }

        fn apply_xp(
            &self,
            _user_id: &str,
            _amount: i64,
        ) -> Result<Option<UserProfile>, Self::Error> {
            Ok(None)
        }

        fn save_high_score(
            &self,
            _user_id: &str,
            _mode: GameModeId,
            _score: u32,
        ) -> Result<bool, Self::Error> {
            Ok(false)
        }
    }

    #[test]
    fn missing_user_aborts_start() {
        let store = MemoryProgressStore::default();
        let engine = GameEngine::new(store.clone(), store.clone());
        let mut generator = ExerciseGenerator::seeded(1);
        let config = SessionConfig::for_mode(GameModeId::Sprint);
        let result = engine.start_session(config, &mut generator);
        assert!(matches!(result, Err(StartError::NotAuthenticated)));
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn directory_failure_is_propagated_with_source() {
        let engine = GameEngine::new(BrokenDirectory, CountingStore::default());
        let mut generator = ExerciseGenerator::seeded(1);
        let err = engine
            .start_session(SessionConfig::for_mode(GameModeId::Duel), &mut generator)
            .unwrap_err();
        assert!(matches!(err, StartError::Lookup(Offline)));
        assert_eq!(
            std::error::Error::source(&err).map(ToString::to_string),
            Some("directory offline".to_string())
        );
    }

    #[test]
    fn finished_session_is_persisted_once() {
        let store = MemoryProgressStore::with_user(UserProfile::new("lea"));
        let engine = GameEngine::new(store.clone(), store.clone());
        let mut generator = ExerciseGenerator::seeded(42);
        let mut session = engine
            .start_session(SessionConfig::for_mode(GameModeId::Boss), &mut generator)
            .unwrap();
        assert_eq!(session.exercises().len(), 1);

        let expected = session.current_exercise().unwrap().expected().canonical();
        let feedback = engine.submit(&mut session, &expected).unwrap().unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.finished, Some(FinishReason::Completed));
        assert!(engine.submit(&mut session, &expected).unwrap().is_none());
        assert_eq!(engine.tick(&mut session, 700).unwrap(), None);

        let sessions = store.sessions();
        assert_eq!(sessions.len(), 1);
        let xp = sessions[0].xp_earned;
        assert_eq!(xp, sessions[0].score * 3);
        assert_eq!(store.profile("lea").unwrap().xp, xp);
        assert_eq!(store.high_score("lea", GameModeId::Boss), Some(sessions[0].score));
    }

    #[test]
    fn timeout_is_persisted_through_tick() {
        let store = MemoryProgressStore::with_user(UserProfile::new("tom"));
        let counting = CountingStore::default();
        let engine = GameEngine::new(store, counting.clone());
        let mut generator = ExerciseGenerator::seeded(7);
        let mut session = engine
            .start_session(SessionConfig::for_mode(GameModeId::Sprint), &mut generator)
            .unwrap();
        assert_eq!(engine.tick(&mut session, 299).unwrap(), None);
        assert_eq!(
            engine.tick(&mut session, 1).unwrap(),
            Some(FinishReason::TimeUp)
        );
        assert_eq!(engine.tick(&mut session, 1).unwrap(), None);
        assert_eq!(*counting.recorded.borrow(), 1);

        engine.replay(&mut session, &mut generator);
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.time_remaining(), Some(300));
    }
}
