//! Game mode table and per-mode session rules.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

use crate::constants::DEFAULT_QUESTION_COUNT;

const DEFAULT_MODE_DATA: &str = include_str!("../assets/modes.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameModeId {
    Training,
    Sprint,
    Survival,
    Duel,
    Boss,
    Express,
    Exam,
}

impl GameModeId {
    pub const ALL: &'static [Self] = &[
        Self::Training,
        Self::Sprint,
        Self::Survival,
        Self::Duel,
        Self::Boss,
        Self::Express,
        Self::Exam,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Sprint => "sprint",
            Self::Survival => "survival",
            Self::Duel => "duel",
            Self::Boss => "boss",
            Self::Express => "express",
            Self::Exam => "exam",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.key().eq_ignore_ascii_case(key))
    }
}

impl std::fmt::Display for GameModeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Termination and scoring parameters for one mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameModeRules {
    /// Countdown length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_count: Option<usize>,
    /// Number of errors that ends the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_errors: Option<u32>,
    #[serde(default)]
    pub mix_subjects: bool,
    #[serde(default)]
    pub difficulty_progression: bool,
    #[serde(default)]
    pub show_timer: bool,
    #[serde(default = "default_multiplier")]
    pub xp_multiplier: f64,
}

impl Default for GameModeRules {
    fn default() -> Self {
        Self {
            time_limit: None,
            question_count: None,
            max_errors: None,
            mix_subjects: false,
            difficulty_progression: false,
            show_timer: false,
            xp_multiplier: default_multiplier(),
        }
    }
}

impl GameModeRules {
    #[must_use]
    pub fn effective_question_count(&self) -> usize {
        self.question_count.unwrap_or(DEFAULT_QUESTION_COUNT)
    }

    #[must_use]
    pub const fn is_timed(&self) -> bool {
        self.time_limit.is_some()
    }

    /// # Errors
    ///
    /// Returns [`ModeConfigError`] when the multiplier is below 1 (or not a
    /// number) or when a present count or limit is zero.
    pub fn validate(&self, mode: GameModeId) -> Result<(), ModeConfigError> {
        if !self.xp_multiplier.is_finite() || self.xp_multiplier < 1.0 {
            return Err(ModeConfigError::MultiplierBelowOne {
                mode,
                value: self.xp_multiplier,
            });
        }
        if self.question_count == Some(0) {
            return Err(ModeConfigError::ZeroQuestionCount(mode));
        }
        if self.time_limit == Some(0) {
            return Err(ModeConfigError::ZeroTimeLimit(mode));
        }
        if self.max_errors == Some(0) {
            return Err(ModeConfigError::ZeroMaxErrors(mode));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameModeConfig {
    pub id: GameModeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub rules: GameModeRules,
}

#[derive(Debug, Error)]
pub enum ModeConfigError {
    #[error("mode table is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("mode {mode} has xp multiplier {value}, expected at least 1")]
    MultiplierBelowOne { mode: GameModeId, value: f64 },
    #[error("mode {0} declares zero questions")]
    ZeroQuestionCount(GameModeId),
    #[error("mode {0} declares a zero second time limit")]
    ZeroTimeLimit(GameModeId),
    #[error("mode {0} declares a zero error limit")]
    ZeroMaxErrors(GameModeId),
    #[error("mode {0} is declared more than once")]
    Duplicate(GameModeId),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModeCatalog {
    #[serde(default)]
    pub modes: Vec<GameModeConfig>,
}

impl ModeCatalog {
    /// Parse and validate a mode table.
    ///
    /// # Errors
    ///
    /// Returns [`ModeConfigError`] on malformed JSON, invalid rules, or a
    /// mode id listed twice.
    pub fn from_json(json: &str) -> Result<Self, ModeConfigError> {
        let catalog: Self = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        for mode in &catalog.modes {
            if !seen.insert(mode.id) {
                return Err(ModeConfigError::Duplicate(mode.id));
            }
            mode.rules.validate(mode.id)?;
        }
        Ok(catalog)
    }

    /// Bundled table, or [`ModeCatalog::builtin`] when it fails to load.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json_or_builtin(DEFAULT_MODE_DATA)
    }

    #[must_use]
    pub fn from_json_or_builtin(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|err| {
            log::warn!("mode table rejected, using built-in modes: {err}");
            Self::builtin()
        })
    }

    /// The seven modes compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        let rules = |time_limit, question_count, max_errors, xp_multiplier| GameModeRules {
            time_limit,
            question_count,
            max_errors,
            mix_subjects: true,
            difficulty_progression: false,
            show_timer: time_limit.is_some(),
            xp_multiplier,
        };
        let mode = |id, name: &str, description: &str, icon: &str, rules| GameModeConfig {
            id,
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            rules,
        };
        Self {
            modes: vec![
                mode(
                    GameModeId::Training,
                    "Entraînement",
                    "Exercices libres par thème, sans pression",
                    "library",
                    GameModeRules {
                        mix_subjects: false,
                        ..rules(None, None, None, 1.0)
                    },
                ),
                mode(
                    GameModeId::Sprint,
                    "Sprint",
                    "10 exercices en 5 minutes, tous sujets",
                    "flash",
                    rules(Some(300), Some(10), None, 1.5),
                ),
                mode(
                    GameModeId::Survival,
                    "Survie",
                    "Enchaînez jusqu'à 3 erreurs",
                    "heart",
                    GameModeRules {
                        difficulty_progression: true,
                        ..rules(None, None, Some(3), 2.0)
                    },
                ),
                mode(
                    GameModeId::Duel,
                    "Duel",
                    "Battez le fantôme IA",
                    "people",
                    GameModeRules {
                        show_timer: true,
                        ..rules(None, Some(10), None, 1.75)
                    },
                ),
                mode(
                    GameModeId::Boss,
                    "Boss",
                    "Un exercice complexe multi-notions",
                    "shield",
                    rules(Some(600), Some(1), None, 3.0),
                ),
                mode(
                    GameModeId::Express,
                    "Révision Express",
                    "5 questions sur vos points faibles",
                    "locate",
                    rules(None, Some(5), None, 1.25),
                ),
                mode(
                    GameModeId::Exam,
                    "Examen Blanc",
                    "Simulation d'épreuve complète",
                    "document-text",
                    rules(Some(3600), Some(20), None, 2.5),
                ),
            ],
        }
    }

    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<ModeCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    #[must_use]
    pub fn get(&self, id: GameModeId) -> Option<&GameModeConfig> {
        self.modes.iter().find(|mode| mode.id == id)
    }

    /// Rules for `id`, falling back to untimed unlimited rules.
    #[must_use]
    pub fn rules_safe(&self, id: GameModeId) -> GameModeRules {
        self.get(id).map(|mode| mode.rules.clone()).unwrap_or_else(|| {
            log::warn!("no rules configured for mode {id}; using defaults");
            GameModeRules::default()
        })
    }
}

/// Look up a mode in the bundled table.
#[must_use]
pub fn lookup(id: GameModeId) -> Option<&'static GameModeConfig> {
    ModeCatalog::default_catalog().get(id)
}

/// Look up a mode by its string id.
#[must_use]
pub fn lookup_key(key: &str) -> Option<&'static GameModeConfig> {
    let found = GameModeId::from_key(key).and_then(lookup);
    if found.is_none() {
        log::warn!("unknown game mode id {key:?}");
    }
    found
}

const fn default_multiplier() -> f64 {
    1.0
}
