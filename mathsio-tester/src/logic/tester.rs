use colored::Colorize;
use mathsio_game::{FinishReason, GameModeId};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::simulation::{SimulationPlan, SimulationSummary, run_plan};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub mode: GameModeId,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub mean_score: f64,
    pub mean_accuracy: f64,
    #[serde(with = "duration_millis")]
    pub average_duration: Duration,
}

pub struct SessionTester {
    verbose: bool,
}

impl SessionTester {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run_plan(
        &self,
        plan: &SimulationPlan,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Simulating {} (accuracy {}% seed {seed})",
                        plan.mode.key().bright_white(),
                        plan.accuracy
                    );
                }
                self.run_seed(plan, seed, iterations)
            })
            .collect()
    }

    fn run_seed(&self, plan: &SimulationPlan, seed: u64, iterations: usize) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut durations = Vec::new();
        let mut scores = Vec::new();
        let mut accuracies = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let outcome = run_plan(plan, iteration_seed)
                .map_err(|err| format!("{err:#}"))
                .and_then(|summary| check_invariants(&summary).map(|()| summary));
            durations.push(start_time.elapsed());

            match outcome {
                Ok(summary) => {
                    successes += 1;
                    scores.push(f64::from(summary.report.score));
                    accuracies.push(f64::from(summary.report.accuracy));
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed score:{} answered:{}/{} reason:{:?}",
                            i + 1,
                            iterations,
                            summary.report.score,
                            summary.report.answered,
                            summary.report.total_questions,
                            summary.report.reason
                        );
                    }
                }
                Err(err) => {
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            err.clone().red()
                        );
                    }
                    failures.push(format!(
                        "Iteration {} (mode {}, seed {iteration_seed}): {err}",
                        i + 1,
                        plan.mode
                    ));
                }
            }
        }

        ScenarioResult {
            scenario_name: format!("{} @ {}%", plan.mode.key(), plan.accuracy),
            mode: plan.mode,
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            mean_score: mean(&scores),
            mean_accuracy: mean(&accuracies),
            average_duration: average(&durations),
        }
    }
}

/// Session rules every finished play-through must satisfy.
///
/// # Errors
///
/// Returns a description of the first violated rule.
pub fn check_invariants(summary: &SimulationSummary) -> Result<(), String> {
    let report = &summary.report;
    let rules = &summary.rules;

    let expected_xp = xp_for(report.score, rules.xp_multiplier);
    if report.xp_earned != expected_xp {
        return Err(format!(
            "xp {} != floor({} * {})",
            report.xp_earned, report.score, rules.xp_multiplier
        ));
    }
    if summary.profile_xp != report.xp_earned {
        return Err(format!(
            "profile holds {} xp, session earned {}",
            summary.profile_xp, report.xp_earned
        ));
    }
    if summary.recorded_sessions != 1 {
        return Err(format!(
            "session recorded {} times",
            summary.recorded_sessions
        ));
    }

    let answered = u32::try_from(summary.feedback.len()).unwrap_or(u32::MAX);
    if report.answered != answered || report.answered != report.correct_answers + report.errors
    {
        return Err(format!(
            "answered {} but saw {answered} answers ({} correct, {} errors)",
            report.answered, report.correct_answers, report.errors
        ));
    }

    let points: u32 = summary
        .feedback
        .iter()
        .map(|f| f.points + f.combo_bonus)
        .sum();
    if points != report.score {
        return Err(format!("score {} != sum of awards {points}", report.score));
    }

    let peak = summary.feedback.iter().map(|f| f.combo).max().unwrap_or(0);
    if report.max_combo != peak {
        return Err(format!("max combo {} != peak combo {peak}", report.max_combo));
    }

    if let Some(max) = rules.max_errors {
        if report.errors > max {
            return Err(format!("{} errors exceed the limit of {max}", report.errors));
        }
        if (report.reason == FinishReason::ErrorLimit) != (report.errors == max) {
            return Err(format!(
                "finished with {:?} after {} of {max} errors",
                report.reason, report.errors
            ));
        }
    } else if report.reason == FinishReason::ErrorLimit {
        return Err("error limit reached without a limit".to_string());
    }

    match report.reason {
        FinishReason::Completed if report.answered as usize != summary.question_count => {
            return Err(format!(
                "completed after {} of {} questions",
                report.answered, summary.question_count
            ));
        }
        FinishReason::TimeUp if !rules.is_timed() => {
            return Err("timed out in an untimed mode".to_string());
        }
        _ => {}
    }

    if summary.high_score.unwrap_or(0) < report.score {
        return Err(format!(
            "high score {:?} below session score {}",
            summary.high_score, report.score
        ));
    }

    if summary.stats.total_exercises != report.answered || summary.stats.total_games != 1 {
        return Err(format!(
            "stats count {} exercises over {} games, session answered {}",
            summary.stats.total_exercises, summary.stats.total_games, report.answered
        ));
    }
    let first_steps = summary.achievements.iter().any(|id| id == "first_steps");
    if first_steps != (report.answered > 0) {
        return Err(format!(
            "first_steps unlocked: {first_steps} after {} answers",
            report.answered
        ));
    }
    let perfect = summary.achievements.iter().any(|id| id == "perfect_1");
    if perfect != (report.answered > 0 && report.errors == 0) {
        return Err(format!(
            "perfect_1 unlocked: {perfect} with {} errors",
            report.errors
        ));
    }

    if summary.fingerprint != summary.replay_fingerprint {
        return Err(format!(
            "seed {} generated {:016x} then {:016x}",
            summary.seed, summary.fingerprint, summary.replay_fingerprint
        ));
    }

    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn xp_for(score: u32, multiplier: f64) -> u32 {
    (f64::from(score) * multiplier).floor() as u32
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn average(durations: &[Duration]) -> Duration {
    if durations.is_empty() {
        Duration::ZERO
    } else {
        durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}
