//! Async countdown driving a shared session (feature `async`).
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::session::{FinishReason, GameSession, SessionPhase};

pub type SharedSession = Arc<Mutex<GameSession>>;

/// Tick `session` every `period_secs` seconds until it finishes.
///
/// The task resolves to the session's finish reason, whichever path ended it.
/// It returns at once when the session is not running or its mode is untimed.
pub fn spawn_countdown(
    session: SharedSession,
    period_secs: u32,
) -> JoinHandle<Option<FinishReason>> {
    let period_secs = period_secs.max(1);
    tokio::spawn(async move {
        {
            let guard = session.lock().await;
            if guard.phase() != SessionPhase::InProgress || !guard.rules().is_timed() {
                log::debug!("no countdown for {} in {:?}", guard.user_id(), guard.phase());
                return guard.finish_reason();
            }
        }
        let mut interval = tokio::time::interval(Duration::from_secs(u64::from(period_secs)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let mut guard = session.lock().await;
            if guard.phase() == SessionPhase::Finished {
                return guard.finish_reason();
            }
            if let Some(reason) = guard.tick(period_secs) {
                log::debug!("countdown ended session for {}", guard.user_id());
                return Some(reason);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Difficulty;
    use crate::exercise::{Exercise, ExerciseData};
    use crate::modes::{GameModeId, GameModeRules};
    use crate::session::SessionConfig;

    fn timed_session(time_limit: u32, count: usize) -> SharedSession {
        let rules = GameModeRules {
            time_limit: Some(time_limit),
            ..GameModeRules::default()
        };
        let config = SessionConfig::for_mode(GameModeId::Sprint).with_rules(rules);
        let mut session = GameSession::new("timer", config);
        session.begin_with(
            (0..count)
                .map(|i| {
                    Exercise::new(
                        format!("c{i}"),
                        "Calculer 12 mod 5",
                        Difficulty::EASY,
                        ExerciseData::ArithmeticCongruence {
                            number: 12,
                            modulo: 5,
                            expected: 2,
                        },
                    )
                })
                .collect(),
        );
        Arc::new(Mutex::new(session))
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_finishes_timed_session() {
        let session = timed_session(3, 5);
        let reason = spawn_countdown(Arc::clone(&session), 1).await.unwrap();
        assert_eq!(reason, Some(FinishReason::TimeUp));
        let mut guard = session.lock().await;
        assert_eq!(guard.time_remaining(), Some(0));
        assert!(guard.take_report().is_some());
        assert!(guard.take_report().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn submission_wins_the_race_once() {
        let session = timed_session(2, 1);
        let handle = spawn_countdown(Arc::clone(&session), 1);
        {
            let mut guard = session.lock().await;
            let feedback = guard.submit_answer("2").unwrap();
            assert_eq!(feedback.finished, Some(FinishReason::Completed));
            assert!(guard.take_report().is_some());
        }
        assert_eq!(handle.await.unwrap(), Some(FinishReason::Completed));
        assert!(session.lock().await.take_report().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_skips_sessions_that_never_started() {
        let config = SessionConfig::for_mode(GameModeId::Sprint);
        let session = Arc::new(Mutex::new(GameSession::new("loading", config)));
        let reason = spawn_countdown(Arc::clone(&session), 1).await.unwrap();
        assert_eq!(reason, None);
        assert_eq!(session.lock().await.phase(), SessionPhase::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_skips_untimed_modes() {
        let mut untimed = GameSession::new("untimed", SessionConfig::for_mode(GameModeId::Training));
        untimed.begin_with(vec![Exercise::new(
            "t0",
            "Calculer 12 mod 5",
            Difficulty::EASY,
            ExerciseData::ArithmeticCongruence {
                number: 12,
                modulo: 5,
                expected: 2,
            },
        )]);
        assert_eq!(untimed.phase(), SessionPhase::InProgress);
        let session = Arc::new(Mutex::new(untimed));
        let reason = spawn_countdown(Arc::clone(&session), 1).await.unwrap();
        assert_eq!(reason, None);
        assert!(!session.lock().await.is_finished());
    }
}
