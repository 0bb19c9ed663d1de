//! Exercise kinds, subjects, difficulty tiers and the chapter table.
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::constants::{DIFFICULTY_RAMP_STEP, MAX_DIFFICULTY, MIN_DIFFICULTY, XP_PER_DIFFICULTY};

const DEFAULT_CHAPTER_DATA: &str = include_str!("../assets/chapters.json");

/// Compiled-in chapters as `(id, order, kinds)`; name and subject come from the first kind.
const BUILTIN_CHAPTERS: &[(&str, u32, &[ExerciseType])] = &[
    ("mat_calc", 1, &[ExerciseType::MatrixMultiplication, ExerciseType::MatrixAddition]),
    ("mat_det", 2, &[ExerciseType::MatrixDeterminant]),
    ("mat_inv", 3, &[ExerciseType::MatrixInverse]),
    ("graph_base", 1, &[ExerciseType::GraphPath, ExerciseType::GraphColoring]),
    ("graph_dijkstra", 2, &[ExerciseType::GraphDijkstra]),
    ("graph_mpm", 3, &[ExerciseType::GraphMpm]),
    ("graph_pert", 4, &[ExerciseType::GraphPert]),
    ("bool_table", 1, &[ExerciseType::BooleanTruthTable]),
    ("bool_simplify", 2, &[ExerciseType::BooleanSimplify]),
    ("bool_expr", 3, &[ExerciseType::BooleanExpression]),
    ("arith_cong", 1, &[ExerciseType::ArithmeticCongruence]),
    ("arith_pgcd", 2, &[ExerciseType::ArithmeticPgcd]),
    ("arith_base", 3, &[ExerciseType::ArithmeticBaseConversion]),
    ("ens_op", 1, &[ExerciseType::SetOperations]),
    ("ens_rel", 2, &[ExerciseType::SetRelations]),
    ("algo_tri", 1, &[ExerciseType::AlgorithmSort]),
    ("algo_complex", 2, &[ExerciseType::AlgorithmComplexity]),
    ("algo_trace", 3, &[ExerciseType::AlgorithmTrace]),
];

/// Coarse topic tag attached to every exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Matrices,
    Graphes,
    Logique,
    Arithmetique,
    Ensembles,
    Algorithmique,
}

impl Subject {
    pub const ALL: &'static [Self] = &[
        Self::Matrices,
        Self::Graphes,
        Self::Logique,
        Self::Arithmetique,
        Self::Ensembles,
        Self::Algorithmique,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Matrices => "matrices",
            Self::Graphes => "graphes",
            Self::Logique => "logique",
            Self::Arithmetique => "arithmetique",
            Self::Ensembles => "ensembles",
            Self::Algorithmique => "algorithmique",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Every exercise kind known to the application.
///
/// Only the kinds listed in [`ExerciseType::GENERATED`] have a generator; the
/// others are reserved for future chapters and produce placeholder exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    MatrixMultiplication,
    MatrixAddition,
    MatrixDeterminant,
    MatrixInverse,
    GraphDijkstra,
    GraphColoring,
    GraphPath,
    GraphMpm,
    GraphPert,
    BooleanTruthTable,
    BooleanSimplify,
    BooleanExpression,
    ArithmeticCongruence,
    ArithmeticPgcd,
    ArithmeticBaseConversion,
    SetOperations,
    SetRelations,
    AlgorithmSort,
    AlgorithmComplexity,
    AlgorithmTrace,
}

impl ExerciseType {
    pub const ALL: &'static [Self] = &[
        Self::MatrixMultiplication,
        Self::MatrixAddition,
        Self::MatrixDeterminant,
        Self::MatrixInverse,
        Self::GraphDijkstra,
        Self::GraphColoring,
        Self::GraphPath,
        Self::GraphMpm,
        Self::GraphPert,
        Self::BooleanTruthTable,
        Self::BooleanSimplify,
        Self::BooleanExpression,
        Self::ArithmeticCongruence,
        Self::ArithmeticPgcd,
        Self::ArithmeticBaseConversion,
        Self::SetOperations,
        Self::SetRelations,
        Self::AlgorithmSort,
        Self::AlgorithmComplexity,
        Self::AlgorithmTrace,
    ];

    /// Kinds with a real generator, in the order used for uniform selection.
    pub const GENERATED: &'static [Self] = &[
        Self::MatrixMultiplication,
        Self::MatrixAddition,
        Self::MatrixDeterminant,
        Self::ArithmeticCongruence,
        Self::ArithmeticPgcd,
        Self::ArithmeticBaseConversion,
        Self::BooleanTruthTable,
        Self::BooleanSimplify,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::MatrixMultiplication => "matrix_multiplication",
            Self::MatrixAddition => "matrix_addition",
            Self::MatrixDeterminant => "matrix_determinant",
            Self::MatrixInverse => "matrix_inverse",
            Self::GraphDijkstra => "graph_dijkstra",
            Self::GraphColoring => "graph_coloring",
            Self::GraphPath => "graph_path",
            Self::GraphMpm => "graph_mpm",
            Self::GraphPert => "graph_pert",
            Self::BooleanTruthTable => "boolean_truth_table",
            Self::BooleanSimplify => "boolean_simplify",
            Self::BooleanExpression => "boolean_expression",
            Self::ArithmeticCongruence => "arithmetic_congruence",
            Self::ArithmeticPgcd => "arithmetic_pgcd",
            Self::ArithmeticBaseConversion => "arithmetic_base_conversion",
            Self::SetOperations => "set_operations",
            Self::SetRelations => "set_relations",
            Self::AlgorithmSort => "algorithm_sort",
            Self::AlgorithmComplexity => "algorithm_complexity",
            Self::AlgorithmTrace => "algorithm_trace",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.key().eq_ignore_ascii_case(key))
    }

    #[must_use]
    pub const fn subject(self) -> Subject {
        match self {
            Self::MatrixMultiplication
            | Self::MatrixAddition
            | Self::MatrixDeterminant
            | Self::MatrixInverse => Subject::Matrices,
            Self::GraphDijkstra
            | Self::GraphColoring
            | Self::GraphPath
            | Self::GraphMpm
            | Self::GraphPert => Subject::Graphes,
            Self::BooleanTruthTable | Self::BooleanSimplify | Self::BooleanExpression => {
                Subject::Logique
            }
            Self::ArithmeticCongruence | Self::ArithmeticPgcd | Self::ArithmeticBaseConversion => {
                Subject::Arithmetique
            }
            Self::SetOperations | Self::SetRelations => Subject::Ensembles,
            Self::AlgorithmSort | Self::AlgorithmComplexity | Self::AlgorithmTrace => {
                Subject::Algorithmique
            }
        }
    }

    /// Display name of the chapter this kind belongs to.
    #[must_use]
    pub const fn chapter_name(self) -> &'static str {
        match self {
            Self::MatrixMultiplication | Self::MatrixAddition => "Calcul matriciel",
            Self::MatrixDeterminant => "Déterminants",
            Self::MatrixInverse => "Matrices inverses",
            Self::GraphPath | Self::GraphColoring => "Graphes finis simples",
            Self::GraphDijkstra => "Algorithme de Dijkstra",
            Self::GraphMpm => "Méthode MPM",
            Self::GraphPert => "Méthode PERT",
            Self::BooleanTruthTable => "Tables de vérité",
            Self::BooleanSimplify => "Simplification booléenne",
            Self::BooleanExpression => "Expressions booléennes",
            Self::ArithmeticCongruence => "Congruences",
            Self::ArithmeticPgcd => "PGCD et Euclide",
            Self::ArithmeticBaseConversion => "Conversions de bases",
            Self::SetOperations => "Opérations ensemblistes",
            Self::SetRelations => "Relations binaires",
            Self::AlgorithmSort => "Algorithmes de tri",
            Self::AlgorithmComplexity => "Complexité",
            Self::AlgorithmTrace => "Interprétation",
        }
    }

    #[must_use]
    pub fn is_generated(self) -> bool {
        Self::GENERATED.contains(&self)
    }
}

impl std::fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Difficulty tier in `1..=3`; scales value ranges and the XP reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const EASY: Self = Self(1);
    pub const MEDIUM: Self = Self(2);
    pub const HARD: Self = Self(3);

    #[must_use]
    pub const fn new(tier: u8) -> Option<Self> {
        if tier >= MIN_DIFFICULTY && tier <= MAX_DIFFICULTY {
            Some(Self(tier))
        } else {
            None
        }
    }

    /// Clamp any tier into the supported range.
    #[must_use]
    pub fn saturating(tier: u8) -> Self {
        Self(tier.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY))
    }

    /// Difficulty ramp for batch generation: `min(floor(index / 3) + 1, 3)`.
    #[must_use]
    pub fn for_index(index: usize) -> Self {
        let tier = (index / DIFFICULTY_RAMP_STEP).saturating_add(1);
        Self(u8::try_from(tier).unwrap_or(MAX_DIFFICULTY).min(MAX_DIFFICULTY))
    }

    #[must_use]
    pub const fn tier(self) -> u8 {
        self.0
    }

    /// Zero-based position, handy for indexing per-tier tables.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - MIN_DIFFICULTY) as usize
    }

    #[must_use]
    pub const fn xp_reward(self) -> u32 {
        self.0 as u32 * XP_PER_DIFFICULTY
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::EASY
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(tier: u8) -> Result<Self, Self::Error> {
        Self::new(tier).ok_or_else(|| format!("difficulty {tier} is outside 1..=3"))
    }
}

impl From<Difficulty> for u8 {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.0
    }
}

/// One chapter of the syllabus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub subject: Subject,
    pub name: String,
    pub order: u32,
    #[serde(default)]
    pub exercise_types: Vec<ExerciseType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChapterCatalog {
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl ChapterCatalog {
    /// Bundled table, or [`ChapterCatalog::builtin`] when it fails to parse.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json_or_builtin(DEFAULT_CHAPTER_DATA)
    }

    #[must_use]
    pub fn from_json_or_builtin(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|err| {
            log::warn!("chapter catalog failed to parse, using built-in chapters: {err}");
            Self::builtin()
        })
    }

    #[must_use]
    pub fn builtin() -> Self {
        let chapters = BUILTIN_CHAPTERS
            .iter()
            .filter_map(|&(id, order, kinds)| {
                let lead = kinds.first()?;
                Some(Chapter {
                    id: id.to_string(),
                    subject: lead.subject(),
                    name: lead.chapter_name().to_string(),
                    order,
                    exercise_types: kinds.to_vec(),
                })
            })
            .collect();
        Self { chapters }
    }

    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<ChapterCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a chapter catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// Chapters of one subject, sorted by their syllabus order.
    #[must_use]
    pub fn for_subject(&self, subject: Subject) -> Vec<&Chapter> {
        let mut chapters: Vec<&Chapter> =
            self.chapters.iter().filter(|c| c.subject == subject).collect();
        chapters.sort_by_key(|c| c.order);
        chapters
    }

    #[must_use]
    pub fn chapter_of(&self, kind: ExerciseType) -> Option<&Chapter> {
        self.chapters
            .iter()
            .find(|c| c.exercise_types.contains(&kind))
    }
}
