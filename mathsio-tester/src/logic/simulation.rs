//! Simulated players driving full sessions through the engine.
use anyhow::{Context, Result};
use mathsio_game::{
    AnswerFeedback, Exercise, ExerciseGenerator, Expected, GameEngine, GameModeId, GameModeRules,
    MemoryProgressStore, SessionConfig, SessionPhase, SessionReport, UserProfile, UserStats,
    check_new_achievements,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::hash::Hasher;
use twox_hash::XxHash64;

const PLAYER_STREAM_SALT: u64 = 0x504C_4159_4552;
const WRONG_ANSWER: &str = "#wrong";

/// How a simulated player behaves during one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationPlan {
    pub mode: GameModeId,
    /// Chance, in percent, that the player knows the answer.
    pub accuracy: u8,
    /// Seconds spent before each submission on timed modes.
    pub seconds_per_answer: u32,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(mode: GameModeId, accuracy: u8, seconds_per_answer: u32) -> Self {
        Self {
            mode,
            accuracy,
            seconds_per_answer,
        }
    }
}

/// Everything observed while playing one seeded session.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub mode: GameModeId,
    pub rules: GameModeRules,
    pub question_count: usize,
    pub feedback: Vec<AnswerFeedback>,
    pub report: SessionReport,
    pub recorded_sessions: usize,
    pub profile_xp: u32,
    pub high_score: Option<u32>,
    pub stats: UserStats,
    /// Achievement ids a fresh profile earns from this one session.
    pub achievements: Vec<String>,
    pub fingerprint: u64,
    pub replay_fingerprint: u64,
}

/// Plays a session for `plan` with every random draw derived from `seed`.
///
/// # Errors
///
/// Returns an error if the session cannot start or never produces a report.
pub fn run_plan(plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
    let user_id = format!("sim-{seed}");
    let store = MemoryProgressStore::with_user(UserProfile::new(user_id.as_str()));
    let engine = GameEngine::new(store.clone(), store.clone());
    let rules = mathsio_game::ModeCatalog::default_catalog().rules_safe(plan.mode);
    let config = SessionConfig::for_mode(plan.mode).with_rules(rules.clone());

    let mut generator = ExerciseGenerator::seeded(seed);
    let mut session = engine
        .start_session(config, &mut generator)
        .with_context(|| format!("starting {} session for seed {seed}", plan.mode))?;
    let mut player = ChaCha20Rng::seed_from_u64(seed ^ PLAYER_STREAM_SALT);
    let mut feedback = Vec::new();

    // Every submission either advances or finishes, so this bounds the loop.
    let max_turns = session.exercises().len() + 1;
    for _ in 0..max_turns {
        if session.phase() != SessionPhase::InProgress {
            break;
        }
        if rules.is_timed() && engine.tick(&mut session, plan.seconds_per_answer)?.is_some() {
            break;
        }
        let Some(exercise) = session.current_exercise() else {
            break;
        };
        let answer = choose_answer(exercise, plan.accuracy, &mut player);
        if let Some(outcome) = engine.submit(&mut session, &answer)? {
            log::trace!("{} answered {answer:?}: {}", plan.mode, outcome.message);
            feedback.push(outcome);
        }
        session.advance();
    }

    let report = store
        .sessions()
        .pop()
        .with_context(|| format!("{} session for seed {seed} never finished", plan.mode))?;
    let profile_xp = store.profile(&user_id).map_or(0, |profile| profile.xp);
    let stats = store.user_stats(&user_id).unwrap_or_default();
    let none: [&str; 0] = [];
    let achievements = check_new_achievements(&stats, &none)
        .into_iter()
        .map(|achievement| achievement.id.clone())
        .collect();
    let generated = fingerprint(session.exercises());
    let replay_fingerprint = fingerprint_for(seed, session.exercises().len());

    Ok(SimulationSummary {
        seed,
        mode: plan.mode,
        question_count: session.exercises().len(),
        rules,
        feedback,
        recorded_sessions: store.sessions().len(),
        profile_xp,
        high_score: store.high_score(&user_id, plan.mode),
        stats,
        achievements,
        fingerprint: generated,
        replay_fingerprint,
        report,
    })
}

/// A correct answer in one of the accepted spellings, or a wrong one.
fn choose_answer(exercise: &Exercise, accuracy: u8, player: &mut impl Rng) -> String {
    if player.gen_range(0..100_u8) >= accuracy {
        return WRONG_ANSWER.to_string();
    }
    let expected = exercise.expected();
    let canonical = expected.canonical();
    match (player.gen_range(0..3_u8), expected) {
        (0, Expected::Matrix(matrix)) => matrix.flattened(),
        (1, _) => format!("  {}  ", canonical.to_lowercase().replace(',', ", ")),
        _ => canonical,
    }
}

/// Generation fingerprint over payloads and tiers. Ids are random and excluded.
#[must_use]
pub fn fingerprint(exercises: &[Exercise]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for exercise in exercises {
        let payload = serde_json::to_vec(exercise.data()).unwrap_or_default();
        hasher.write(&payload);
        hasher.write_u8(exercise.difficulty().tier());
    }
    hasher.finish()
}

fn fingerprint_for(seed: u64, count: usize) -> u64 {
    fingerprint(&ExerciseGenerator::seeded(seed).generate_exercises(count, None))
}
