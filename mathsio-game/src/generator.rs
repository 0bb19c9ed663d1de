//! Randomized exercise generation.
//!
//! Every generator computes its expected result up front through
//! [`crate::numeric`], so the evaluator never recomputes anything.
use rand::rngs::SmallRng;
use rand::{Rng, RngCore};

use crate::catalog::{Difficulty, ExerciseType};
use crate::constants::{
    ADD_VALUE_SPAN, BASE_CONVERSION_MAX, BASE_CONVERSION_MIN, BASE_CONVERSION_PAIRS,
    CONGRUENCE_MIN, CONGRUENCE_MODULI, CONGRUENCE_SPAN, DETERMINANT_3X3_VALUE_SPAN,
    DETERMINANT_VALUE_SPAN, MULTIPLY_VALUE_SPAN, PGCD_MAX_OPERANDS, PGCD_MIN, PLACEHOLDER_TITLE,
};
use crate::exercise::{Exercise, ExerciseData};
use crate::numeric::{
    Matrix, NumericError, convert_base, determinant, gcd, matrix_add, matrix_multiply,
};
use crate::rng::{GenerationStreams, RandomSource, id_rng};

/// Truth-table templates paired with their precomputed output column.
pub const TRUTH_TABLE_TEMPLATES: [(&str, &str); 4] = [
    ("A AND B", "0,0,0,1"),
    ("A OR B", "0,1,1,1"),
    ("NOT A", "1,0"),
    ("A XOR B", "0,1,1,0"),
];

/// Boolean identities: expression and its simplified form.
pub const SIMPLIFY_TEMPLATES: [(&str, &str); 4] = [
    ("A + A.B", "A"),
    ("A.(A + B)", "A"),
    ("A + NOT(A)", "1"),
    ("A.NOT(A)", "0"),
];

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Produces exercises from an injectable random source.
///
/// Operand draws go through `source`; identifier suffixes use a separate RNG
/// so scripted sources only ever see operand and kind draws.
#[derive(Debug, Clone)]
pub struct ExerciseGenerator<R> {
    source: R,
    ids: SmallRng,
}

impl ExerciseGenerator<SmallRng> {
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(id_rng())
    }
}

impl ExerciseGenerator<GenerationStreams> {
    /// Reproducible generator; the same seed yields the same exercise contents.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(GenerationStreams::from_seed(seed))
    }
}

impl<R: RandomSource> ExerciseGenerator<R> {
    #[must_use]
    pub fn new(source: R) -> Self {
        Self {
            source,
            ids: id_rng(),
        }
    }

    pub fn source_mut(&mut self) -> &mut R {
        &mut self.source
    }

    #[must_use]
    pub fn into_source(self) -> R {
        self.source
    }

    /// Build one exercise of `kind` at `difficulty`.
    ///
    /// Kinds without a generator yield a placeholder whose expected answer is `"0"`.
    pub fn generate_exercise(&mut self, kind: ExerciseType, difficulty: Difficulty) -> Exercise {
        let id = exercise_id(kind, &mut self.ids);
        match build_payload(kind, difficulty, &mut self.source) {
            Ok(Some((title, data))) => Exercise::new(id, title, difficulty, data),
            Ok(None) => placeholder(id, kind, difficulty),
            Err(err) => {
                log::warn!("generation of {kind} failed, using placeholder: {err}");
                placeholder(id, kind, difficulty)
            }
        }
    }

    /// Build `count` exercises following the difficulty ramp.
    ///
    /// Kinds are drawn uniformly from `kinds`, or from the generated set when
    /// `kinds` is `None` or empty.
    pub fn generate_exercises(
        &mut self,
        count: usize,
        kinds: Option<&[ExerciseType]>,
    ) -> Vec<Exercise> {
        let pool = match kinds {
            Some(kinds) if !kinds.is_empty() => kinds,
            _ => ExerciseType::GENERATED,
        };
        let exercises: Vec<Exercise> = (0..count)
            .map(|index| {
                let kind = pool[self.source.pick_kind(pool.len()).min(pool.len() - 1)];
                self.generate_exercise(kind, Difficulty::for_index(index))
            })
            .collect();
        log::debug!(
            "generated {} exercises from a pool of {} kinds",
            exercises.len(),
            pool.len()
        );
        exercises
    }
}

fn placeholder(id: String, kind: ExerciseType, difficulty: Difficulty) -> Exercise {
    Exercise::new(
        id,
        PLACEHOLDER_TITLE,
        difficulty,
        ExerciseData::Placeholder { kind },
    )
}

fn exercise_id<G: RngCore>(kind: ExerciseType, rng: &mut G) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("{kind}_{millis}_{suffix}")
}

/// Centered value in `[-span/2, span - span/2)`.
fn centered<R: RandomSource + ?Sized>(source: &mut R, span: i64) -> i64 {
    let low = -(span / 2);
    source.int_in(low..low + span)
}

fn square<R: RandomSource + ?Sized>(source: &mut R, size: usize, span: i64) -> Matrix {
    Matrix::from_fn(size, size, |_, _| centered(source, span))
}

type Payload = (String, ExerciseData);

fn build_payload<R: RandomSource + ?Sized>(
    kind: ExerciseType,
    difficulty: Difficulty,
    source: &mut R,
) -> Result<Option<Payload>, NumericError> {
    let tier = difficulty.index();
    let payload = match kind {
        ExerciseType::MatrixMultiplication => {
            let size = if difficulty == Difficulty::HARD { 3 } else { 2 };
            let matrix_a = square(source, size, MULTIPLY_VALUE_SPAN);
            let matrix_b = square(source, size, MULTIPLY_VALUE_SPAN);
            let expected = matrix_multiply(&matrix_a, &matrix_b)?;
            (
                "Multiplication de matrices".to_string(),
                ExerciseData::MatrixMultiplication {
                    matrix_a,
                    matrix_b,
                    expected,
                },
            )
        }
        ExerciseType::MatrixAddition => {
            let size = if difficulty == Difficulty::EASY { 2 } else { 3 };
            let matrix_a = square(source, size, ADD_VALUE_SPAN);
            let matrix_b = square(source, size, ADD_VALUE_SPAN);
            let expected = matrix_add(&matrix_a, &matrix_b)?;
            (
                "Addition de matrices".to_string(),
                ExerciseData::MatrixAddition {
                    matrix_a,
                    matrix_b,
                    expected,
                },
            )
        }
        ExerciseType::MatrixDeterminant => {
            let matrix_a = if difficulty == Difficulty::HARD {
                square(source, 3, DETERMINANT_3X3_VALUE_SPAN)
            } else {
                square(source, 2, DETERMINANT_VALUE_SPAN)
            };
            let expected = determinant(&matrix_a)?;
            (
                "Calculer le déterminant".to_string(),
                ExerciseData::MatrixDeterminant { matrix_a, expected },
            )
        }
        ExerciseType::ArithmeticCongruence => {
            let modulo = CONGRUENCE_MODULI[tier];
            let number = source.int_in(CONGRUENCE_MIN..CONGRUENCE_MIN + CONGRUENCE_SPAN);
            (
                format!("Calculer {number} mod {modulo}"),
                ExerciseData::ArithmeticCongruence {
                    number,
                    modulo,
                    expected: number.rem_euclid(modulo),
                },
            )
        }
        ExerciseType::ArithmeticPgcd => {
            let max = PGCD_MAX_OPERANDS[tier];
            let a = source.int_in(PGCD_MIN..PGCD_MIN + max);
            let b = source.int_in(PGCD_MIN..PGCD_MIN + max);
            (
                format!("Trouver le PGCD({a}, {b})"),
                ExerciseData::ArithmeticPgcd {
                    numbers: [a, b],
                    expected: gcd(a, b),
                },
            )
        }
        ExerciseType::ArithmeticBaseConversion => {
            let number = source.int_in(BASE_CONVERSION_MIN..BASE_CONVERSION_MAX + 1);
            let (base, target_base) =
                BASE_CONVERSION_PAIRS[source.index(BASE_CONVERSION_PAIRS.len())];
            let expected = convert_base(number, target_base)?;
            (
                format!("Convertir de base {base} en base {target_base}"),
                ExerciseData::ArithmeticBaseConversion {
                    number,
                    base,
                    target_base,
                    expected,
                },
            )
        }
        ExerciseType::BooleanTruthTable => {
            let (expression, column) =
                TRUTH_TABLE_TEMPLATES[source.index(TRUTH_TABLE_TEMPLATES.len())];
            let variables = if expression.contains('B') {
                vec!["A".to_string(), "B".to_string()]
            } else {
                vec!["A".to_string()]
            };
            (
                "Compléter la table de vérité".to_string(),
                ExerciseData::BooleanTruthTable {
                    expression: expression.to_string(),
                    variables,
                    expected: column.to_string(),
                },
            )
        }
        ExerciseType::BooleanSimplify => {
            let (expression, simplified) =
                SIMPLIFY_TEMPLATES[source.index(SIMPLIFY_TEMPLATES.len())];
            (
                "Simplifier l'expression".to_string(),
                ExerciseData::BooleanSimplify {
                    expression: expression.to_string(),
                    expected: simplified.to_string(),
                },
            )
        }
        _ => return Ok(None),
    };
    Ok(Some(payload))
}
