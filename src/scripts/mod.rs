//! Built-in interview scripts
//!
//! Scripts embedded in the binary at compile time, so a session can start
//! with no files at all: `sensei session run --builtin aws-migration`.

use std::sync::LazyLock;

use crate::config::loader::{LoadResult, ScriptLoader, builtin_origin};
use crate::config::schema::InterviewType;
use crate::error::ConfigError;

/// Name of the script used when none is given.
pub const DEFAULT_SCRIPT: &str = "aws-migration";

/// A script embedded in the binary.
#[derive(Debug)]
pub struct BuiltinScript {
    /// Unique identifier (kebab-case).
    pub name: &'static str,

    /// Short description.
    pub description: &'static str,

    /// Interview type the script practices.
    pub interview_type: InterviewType,

    /// Raw YAML content.
    pub yaml: &'static str,
}

impl BuiltinScript {
    /// Parses and validates the embedded YAML.
    ///
    /// # Errors
    ///
    /// Returns the loader error if the script does not load.
    pub fn load(&self, loader: &ScriptLoader) -> Result<LoadResult, ConfigError> {
        loader.load_str(self.yaml, &builtin_origin(self.name))
    }
}

static BUILTIN_SCRIPTS: LazyLock<Vec<BuiltinScript>> = LazyLock::new(|| {
    vec![
        BuiltinScript {
            name: "aws-migration",
            description: "Technical screening: cloud migration, performance, architecture",
            interview_type: InterviewType::Technical,
            yaml: include_str!("../../scripts/aws-migration.yaml"),
        },
        BuiltinScript {
            name: "behavioral-basics",
            description: "Behavioral round with the HR director",
            interview_type: InterviewType::Behavioral,
            yaml: include_str!("../../scripts/behavioral-basics.yaml"),
        },
        BuiltinScript {
            name: "quick-demo",
            description: "Two short system-design turns with fast timings",
            interview_type: InterviewType::SystemDesign,
            yaml: include_str!("../../scripts/quick-demo.yaml"),
        },
    ]
});

/// Looks up a script by exact name.
#[must_use]
pub fn find_script(name: &str) -> Option<&'static BuiltinScript> {
    BUILTIN_SCRIPTS.iter().find(|s| s.name == name)
}

/// Looks up a script, suggesting a close name when there is no match.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownScript`] when no script has that name.
pub fn require_script(name: &str) -> Result<&'static BuiltinScript, ConfigError> {
    find_script(name).ok_or_else(|| ConfigError::UnknownScript {
        name: name.to_string(),
        suggestion: suggest_script(name),
    })
}

/// Lists scripts, optionally only those of one interview type.
#[must_use]
pub fn list_scripts(interview_type: Option<InterviewType>) -> Vec<&'static BuiltinScript> {
    BUILTIN_SCRIPTS
        .iter()
        .filter(|s| interview_type.is_none_or(|t| s.interview_type == t))
        .collect()
}

/// Closest script name within a Damerau-Levenshtein distance of 3.
#[must_use]
pub fn suggest_script(input: &str) -> Option<String> {
    BUILTIN_SCRIPTS
        .iter()
        .map(|s| (s.name, strsim::damerau_levenshtein(input, s.name)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(name, _)| name.to_string())
}

/// All script names in registry order.
#[must_use]
pub fn script_names() -> Vec<&'static str> {
    BUILTIN_SCRIPTS.iter().map(|s| s.name).collect()
}
