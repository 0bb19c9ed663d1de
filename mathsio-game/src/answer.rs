//! Free-text answer checking.
use serde::{Deserialize, Serialize};

use crate::exercise::{Exercise, Expected};

/// Outcome of comparing a player's answer with the expected result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerCheck {
    pub correct: bool,
    /// Canonical expected answer, for display.
    pub correct_answer: String,
}

/// Trim, uppercase and drop every whitespace character.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Judge `raw` against the exercise's expected result.
///
/// Matrix results accept either the bracketed JSON form or the row-major
/// comma list. Everything else is an exact match after normalization. An
/// empty or malformed answer is simply incorrect.
#[must_use]
pub fn check_answer(exercise: &Exercise, raw: &str) -> AnswerCheck {
    let expected = exercise.expected();
    let correct_answer = expected.canonical();
    let answer = normalize(raw);
    let correct = match expected {
        Expected::Matrix(matrix) => {
            answer == normalize(&correct_answer) || answer == normalize(&matrix.flattened())
        }
        _ => answer == normalize(&correct_answer),
    };
    log::trace!(
        "checked answer for {} ({}): {correct}",
        exercise.id(),
        exercise.kind()
    );
    AnswerCheck {
        correct,
        correct_answer,
    }
}
