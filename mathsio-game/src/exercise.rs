//! Generated exercise values.
use serde::{Deserialize, Serialize};

use crate::catalog::{Difficulty, ExerciseType, Subject};
use crate::constants::{PLACEHOLDER_CHAPTER, PLACEHOLDER_EXPECTED};
use crate::numeric::{Matrix, convert_base};

/// Kind-specific payload of an exercise, including its expected result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExerciseData {
    MatrixMultiplication {
        matrix_a: Matrix,
        matrix_b: Matrix,
        expected: Matrix,
    },
    MatrixAddition {
        matrix_a: Matrix,
        matrix_b: Matrix,
        expected: Matrix,
    },
    MatrixDeterminant {
        matrix_a: Matrix,
        expected: i64,
    },
    ArithmeticCongruence {
        number: i64,
        modulo: i64,
        expected: i64,
    },
    ArithmeticPgcd {
        numbers: [i64; 2],
        expected: u64,
    },
    ArithmeticBaseConversion {
        number: i64,
        base: u32,
        target_base: u32,
        expected: String,
    },
    BooleanTruthTable {
        expression: String,
        variables: Vec<String>,
        expected: String,
    },
    BooleanSimplify {
        expression: String,
        expected: String,
    },
    /// Stand-in for kinds without a generator.
    Placeholder {
        kind: ExerciseType,
    },
}

/// Borrowed view of an expected result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected<'a> {
    Integer(i64),
    Natural(u64),
    Matrix(&'a Matrix),
    Text(&'a str),
}

impl Expected<'_> {
    /// Canonical string shown to the player; matrices use compact JSON.
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            Self::Integer(value) => value.to_string(),
            Self::Natural(value) => value.to_string(),
            Self::Matrix(matrix) => matrix.bracketed(),
            Self::Text(text) => (*text).to_string(),
        }
    }
}

impl ExerciseData {
    #[must_use]
    pub const fn kind(&self) -> ExerciseType {
        match self {
            Self::MatrixMultiplication { .. } => ExerciseType::MatrixMultiplication,
            Self::MatrixAddition { .. } => ExerciseType::MatrixAddition,
            Self::MatrixDeterminant { .. } => ExerciseType::MatrixDeterminant,
            Self::ArithmeticCongruence { .. } => ExerciseType::ArithmeticCongruence,
            Self::ArithmeticPgcd { .. } => ExerciseType::ArithmeticPgcd,
            Self::ArithmeticBaseConversion { .. } => ExerciseType::ArithmeticBaseConversion,
            Self::BooleanTruthTable { .. } => ExerciseType::BooleanTruthTable,
            Self::BooleanSimplify { .. } => ExerciseType::BooleanSimplify,
            Self::Placeholder { kind } => *kind,
        }
    }

    #[must_use]
    pub fn expected(&self) -> Expected<'_> {
        match self {
            Self::MatrixMultiplication { expected, .. } | Self::MatrixAddition { expected, .. } => {
                Expected::Matrix(expected)
            }
            Self::MatrixDeterminant { expected, .. }
            | Self::ArithmeticCongruence { expected, .. } => Expected::Integer(*expected),
            Self::ArithmeticPgcd { expected, .. } => Expected::Natural(*expected),
            Self::ArithmeticBaseConversion { expected, .. }
            | Self::BooleanTruthTable { expected, .. }
            | Self::BooleanSimplify { expected, .. } => Expected::Text(expected),
            Self::Placeholder { .. } => Expected::Text(PLACEHOLDER_EXPECTED),
        }
    }

    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

/// One immutable exercise instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    id: String,
    subject: Subject,
    chapter: String,
    title: String,
    difficulty: Difficulty,
    data: ExerciseData,
}

impl Exercise {
    /// Assemble an exercise; subject and chapter follow from the payload.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        difficulty: Difficulty,
        data: ExerciseData,
    ) -> Self {
        let (subject, chapter) = if data.is_placeholder() {
            (Subject::Matrices, PLACEHOLDER_CHAPTER)
        } else {
            let kind = data.kind();
            (kind.subject(), kind.chapter_name())
        };
        Self {
            id: id.into(),
            subject,
            chapter: chapter.to_string(),
            title: title.into(),
            difficulty,
            data,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn kind(&self) -> ExerciseType {
        self.data.kind()
    }

    #[must_use]
    pub const fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn chapter(&self) -> &str {
        &self.chapter
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub const fn xp_reward(&self) -> u32 {
        self.difficulty.xp_reward()
    }

    #[must_use]
    pub const fn data(&self) -> &ExerciseData {
        &self.data
    }

    #[must_use]
    pub fn expected(&self) -> Expected<'_> {
        self.data.expected()
    }

    /// The base-conversion operand written in its source radix.
    #[must_use]
    pub fn source_digits(&self) -> Option<String> {
        match &self.data {
            ExerciseData::ArithmeticBaseConversion { number, base, .. } => {
                convert_base(*number, *base).ok()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[i64]]) -> Matrix {
        Matrix::new(rows.iter().map(|row| row.to_vec()).collect()).unwrap()
    }

    #[test]
    fn metadata_follows_payload() {
        let ex = Exercise::new(
            "id",
            "Trouver le PGCD(48, 18)",
            Difficulty::EASY,
            ExerciseData::ArithmeticPgcd {
                numbers: [48, 18],
                expected: 6,
            },
        );
        assert_eq!(ex.kind(), ExerciseType::ArithmeticPgcd);
        assert_eq!(ex.subject(), Subject::Arithmetique);
        assert_eq!(ex.chapter(), "PGCD et Euclide");
        assert_eq!(ex.xp_reward(), 10);
        assert_eq!(ex.expected(), Expected::Natural(6));
    }

    #[test]
    fn placeholder_keeps_requested_kind() {
        let ex = Exercise::new(
            "id",
            "Exercice",
            Difficulty::HARD,
            ExerciseData::Placeholder {
                kind: ExerciseType::GraphPert,
            },
        );
        assert_eq!(ex.kind(), ExerciseType::GraphPert);
        assert_eq!(ex.subject(), Subject::Matrices);
        assert_eq!(ex.chapter(), "Général");
        assert_eq!(ex.expected().canonical(), "0");
        assert_eq!(ex.xp_reward(), 30);
    }

    #[test]
    fn matrix_expected_is_compact_json() {
        let data = ExerciseData::MatrixAddition {
            matrix_a: matrix(&[&[1, 1], &[1, 1]]),
            matrix_b: matrix(&[&[0, 1], &[2, 3]]),
            expected: matrix(&[&[1, 2], &[3, 4]]),
        };
        assert_eq!(data.expected().canonical(), "[[1,2],[3,4]]");
    }

    #[test]
    fn payload_serializes_with_kind_tag() {
        let data = ExerciseData::ArithmeticCongruence {
            number: 23,
            modulo: 5,
            expected: 3,
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "arithmetic_congruence");
        assert_eq!(json["expected"], 3);
        let back: ExerciseData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn source_digits_render_in_source_base() {
        let ex = Exercise::new(
            "id",
            "Convertir de base 16 en base 10",
            Difficulty::EASY,
            ExerciseData::ArithmeticBaseConversion {
                number: 255,
                base: 16,
                target_base: 10,
                expected: "255".into(),
            },
        );
        assert_eq!(ex.source_digits().as_deref(), Some("FF"));
    }
}
