//! Centralized tuning constants for Mathsio exercise and session logic.
//!
//! These values define the scoring and generation math. Keeping them
//! together ensures balance changes go through code review rather than
//! through the JSON assets.

// Scoring ------------------------------------------------------------------
pub(crate) const XP_PER_DIFFICULTY: u32 = 10;
pub(crate) const COMBO_BONUS_THRESHOLD: u32 = 3;
pub(crate) const COMBO_BONUS_FACTOR: u32 = 2;
pub(crate) const XP_PER_LEVEL: u32 = 100;

// Sessions -----------------------------------------------------------------
pub(crate) const DEFAULT_QUESTION_COUNT: usize = 10;

// Difficulty ramp ----------------------------------------------------------
pub(crate) const DIFFICULTY_RAMP_STEP: usize = 3;
pub(crate) const MIN_DIFFICULTY: u8 = 1;
pub(crate) const MAX_DIFFICULTY: u8 = 3;

// Matrix generation --------------------------------------------------------
pub(crate) const MULTIPLY_VALUE_SPAN: i64 = 5;
pub(crate) const ADD_VALUE_SPAN: i64 = 10;
pub(crate) const DETERMINANT_VALUE_SPAN: i64 = 10;
pub(crate) const DETERMINANT_3X3_VALUE_SPAN: i64 = 5;

// Arithmetic generation ----------------------------------------------------
pub(crate) const CONGRUENCE_MODULI: [i64; 3] = [5, 7, 11];
pub(crate) const CONGRUENCE_MIN: i64 = 10;
pub(crate) const CONGRUENCE_SPAN: i64 = 100;
pub(crate) const PGCD_MAX_OPERANDS: [i64; 3] = [50, 100, 200];
pub(crate) const PGCD_MIN: i64 = 10;
pub(crate) const BASE_CONVERSION_MIN: i64 = 1;
pub(crate) const BASE_CONVERSION_MAX: i64 = 255;
pub(crate) const BASE_CONVERSION_PAIRS: [(u32, u32); 4] = [(10, 2), (10, 16), (2, 10), (16, 10)];

// Radix bounds -------------------------------------------------------------
pub(crate) const MIN_RADIX: u32 = 2;
pub(crate) const MAX_RADIX: u32 = 16;

// Placeholder exercises ----------------------------------------------------
pub(crate) const PLACEHOLDER_EXPECTED: &str = "0";
pub(crate) const PLACEHOLDER_CHAPTER: &str = "Général";
pub(crate) const PLACEHOLDER_TITLE: &str = "Exercice";

// Feedback -----------------------------------------------------------------
pub(crate) const FEEDBACK_CORRECT: &str = "Correct !";
pub(crate) const FEEDBACK_ANSWER_PREFIX: &str = "Réponse : ";
