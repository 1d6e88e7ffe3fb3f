//! Script loader
//!
//! Loading runs as a fixed pipeline:
//! 1. Size check and UTF-8 BOM removal
//! 2. Environment variable expansion on the raw text
//! 3. YAML parsing
//! 4. Deserialization to [`ScriptConfig`]
//! 5. Validation (all issues collected)
//! 6. Freeze with `Arc`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_yaml::Value;

use crate::config::schema::ScriptConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

// ============================================================================
// Public API
// ============================================================================

/// Options for the script loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Size limits.
    pub limits: ConfigLimits,

    /// Treat validation warnings as errors.
    pub strict: bool,
}

/// Size limits guarding against oversized scripts.
///
/// Each limit can be overridden by an environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLimits {
    /// Maximum number of turns (`SENSEI_MAX_TURNS`).
    pub max_turns: usize,

    /// Maximum script size in bytes (`SENSEI_MAX_SCRIPT_SIZE`).
    pub max_script_size: usize,

    /// Maximum length of a question or answer in characters
    /// (`SENSEI_MAX_TEXT_LEN`).
    pub max_text_len: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_turns: env_or("SENSEI_MAX_TURNS", 500),
            max_script_size: env_or("SENSEI_MAX_SCRIPT_SIZE", 1024 * 1024),
            max_text_len: env_or("SENSEI_MAX_TEXT_LEN", 10_000),
        }
    }
}

/// A loaded, validated and frozen script.
#[derive(Debug)]
pub struct LoadResult {
    /// The script.
    pub script: Arc<ScriptConfig>,

    /// Non-fatal issues found while loading.
    pub warnings: Vec<LoadWarning>,
}

/// Non-fatal issue found while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Where the issue was found.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({location})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Script loader.
#[derive(Debug, Default)]
pub struct ScriptLoader {
    options: LoaderOptions,
}

impl ScriptLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Loads a script file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is too large, if an
    /// environment reference is unclosed or required but unset, if YAML
    /// parsing or deserialization fails, or if validation reports errors.
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        self.check_size(size)?;

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        self.load_str(&raw, path)
    }

    /// Loads a script from text; `origin` labels it in errors.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus file access.
    pub fn load_str(&self, raw: &str, origin: &Path) -> Result<LoadResult, ConfigError> {
        self.check_size(raw.len())?;
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let mut env = EnvSubstitution::default();
        let expanded = env.substitute(raw, origin)?;
        let mut warnings = env.warnings;

        let root: Value = serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
            path: origin.to_path_buf(),
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })?;
        if root.is_null() {
            return Err(ConfigError::ParseError {
                path: origin.to_path_buf(),
                line: None,
                message: "script is empty".to_string(),
            });
        }

        let script: ScriptConfig =
            serde_yaml::from_value(root).map_err(|e| ConfigError::ParseError {
                path: origin.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: format!("invalid script: {e}"),
            })?;

        let mut result = Validator::new().validate(&script, &self.options.limits);
        if self.options.strict {
            result.promote_warnings();
        }
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: origin.display().to_string(),
                errors: result.errors,
            });
        }

        warnings.extend(result.warnings.into_iter().map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        }));

        Ok(LoadResult {
            script: Arc::new(script),
            warnings,
        })
    }

    fn check_size(&self, size: usize) -> Result<(), ConfigError> {
        let max = self.options.limits.max_script_size;
        if size > max {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{size} bytes"),
                expected: format!("at most {max} bytes"),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Environment Variable Substitution
// ============================================================================

/// Expands environment references in raw script text before parsing.
///
/// - `${VAR}` expands to the value, or an empty string plus a warning
/// - `${VAR:-default}` falls back to `default`
/// - `${VAR:?message}` fails when unset
/// - `$$` is a literal `$`
#[derive(Debug, Default)]
struct EnvSubstitution {
    warnings: Vec<LoadWarning>,
}

impl EnvSubstitution {
    fn substitute(&mut self, raw: &str, origin: &Path) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos + 1..];
            if let Some(after) = tail.strip_prefix('$') {
                out.push('$');
                rest = after;
            } else if let Some(body_start) = tail.strip_prefix('{') {
                let end = closing_brace(body_start).ok_or_else(|| ConfigError::ParseError {
                    path: origin.to_path_buf(),
                    line: None,
                    message: format!(
                        "unclosed environment variable reference: ${{{}",
                        body_start.lines().next().unwrap_or_default()
                    ),
                })?;
                self.expand(&body_start[..end], origin, &mut out)?;
                rest = &body_start[end + 1..];
            } else {
                out.push('$');
                rest = tail;
            }
        }
        out.push_str(rest);
        Ok(out)
    }

    fn expand(&mut self, spec: &str, origin: &Path, out: &mut String) -> Result<(), ConfigError> {
        let split = [spec.find(":-"), spec.find(":?")]
            .into_iter()
            .flatten()
            .min();
        let (name, fallback) = split.map_or((spec, None), |i| (&spec[..i], Some(&spec[i..])));

        if let Ok(value) = std::env::var(name) {
            out.push_str(&value);
            return Ok(());
        }
        match fallback {
            Some(f) if f.starts_with(":-") => out.push_str(&f[2..]),
            Some(f) => {
                return Err(ConfigError::EnvVarNotSet {
                    var: name.to_string(),
                    location: f[2..].to_string(),
                });
            }
            None => self.warnings.push(LoadWarning {
                message: format!("environment variable '{name}' is not set, using empty string"),
                location: Some(origin.display().to_string()),
            }),
        }
        Ok(())
    }
}

/// Byte index of the `}` closing a `${` body, honouring nested braces.
fn closing_brace(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            '\n' => return None,
            _ => {}
        }
    }
    None
}

/// Parses an environment variable, falling back to `default`.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Path label used for scripts that do not come from a file.
#[must_use]
pub fn builtin_origin(name: &str) -> PathBuf {
    PathBuf::from(format!("builtin:{name}"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn expand(raw: &str) -> Result<(String, Vec<LoadWarning>), ConfigError> {
        let mut sub = EnvSubstitution::default();
        let out = sub.substitute(raw, Path::new("test.yaml"))?;
        Ok((out, sub.warnings))
    }

    #[test]
    fn env_substitution_set_variable() {
        let (out, _) = expand("path: ${PATH}").unwrap();
        assert!(!out.contains("${PATH}"));
        assert!(out.len() > "path: ".len());
    }

    #[test]
    fn env_substitution_default() {
        let (out, warnings) = expand("title: ${SENSEI_TEST_UNSET_TITLE_Q1:-Mock run}").unwrap();
        assert_eq!(out, "title: Mock run");
        assert!(warnings.is_empty());
    }

    #[test]
    fn env_substitution_required_missing() {
        match expand("seed: ${SENSEI_TEST_UNSET_SEED_Q2:?seed required}") {
            Err(ConfigError::EnvVarNotSet { var, location }) => {
                assert_eq!(var, "SENSEI_TEST_UNSET_SEED_Q2");
                assert_eq!(location, "seed required");
            }
            other => panic!("expected EnvVarNotSet, got {other:?}"),
        }
    }

    #[test]
    fn env_substitution_escaped_dollar() {
        let (out, _) = expand("answer: saved $$2M a year").unwrap();
        assert_eq!(out, "answer: saved $2M a year");
    }

    #[test]
    fn env_substitution_bare_dollar_is_kept() {
        let (out, _) = expand("answer: cost $5").unwrap();
        assert_eq!(out, "answer: cost $5");
    }

    #[test]
    fn env_substitution_missing_warns() {
        let (out, warnings) = expand("title: ${SENSEI_TEST_UNSET_WARN_Q3}").unwrap();
        assert_eq!(out, "title: ");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("SENSEI_TEST_UNSET_WARN_Q3"));
    }

    #[test]
    fn env_substitution_unclosed_is_error() {
        assert!(matches!(
            expand("title: ${OOPS\nturns: []"),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn load_str_parses_and_freezes() {
        let yaml = "turns:\n  - question: Hi\n    answer: Hello there\n";
        let result = ScriptLoader::with_defaults()
            .load_str(yaml, Path::new("inline.yaml"))
            .unwrap();
        assert_eq!(result.script.turns.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn load_str_strips_bom() {
        let yaml = "\u{feff}turns:\n  - question: Hi\n    answer: Hello\n";
        assert!(
            ScriptLoader::with_defaults()
                .load_str(yaml, Path::new("bom.yaml"))
                .is_ok()
        );
    }

    #[test]
    fn load_str_rejects_empty_document() {
        let err = ScriptLoader::with_defaults()
            .load_str("", Path::new("empty.yaml"))
            .unwrap_err();
        assert!(err.to_string().contains("script is empty"));
    }

    #[test]
    fn load_str_rejects_malformed_yaml() {
        let err = ScriptLoader::with_defaults()
            .load_str("turns: [unclosed", Path::new("bad.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn empty_turns_is_a_warning_unless_strict() {
        let yaml = "turns: []\n";
        let result = ScriptLoader::with_defaults()
            .load_str(yaml, Path::new("empty-turns.yaml"))
            .unwrap();
        assert_eq!(result.warnings.len(), 1);

        let strict = ScriptLoader::new(LoaderOptions {
            strict: true,
            ..LoaderOptions::default()
        });
        assert!(matches!(
            strict.load_str(yaml, Path::new("empty-turns.yaml")),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn oversized_script_is_rejected() {
        let loader = ScriptLoader::new(LoaderOptions {
            limits: ConfigLimits {
                max_script_size: 16,
                ..ConfigLimits::default()
            },
            strict: false,
        });
        let err = loader
            .load_str("turns: []\n# padding padding\n", Path::new("big.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn huge_durations_load_without_overflow() {
        let yaml = "timing:\n  question_reveal: 300000000000years\n  answer_reveal: 300000000000years\nturns:\n  - question: Hi\n    answer: Hello\n";
        let result = ScriptLoader::with_defaults()
            .load_str(yaml, Path::new("huge.yaml"))
            .unwrap();
        assert_eq!(result.script.timing.cycle(), std::time::Duration::MAX);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "turns:\n  - question: Why Rust?\n    answer: Ownership.").unwrap();
        let result = ScriptLoader::with_defaults().load(file.path()).unwrap();
        assert_eq!(result.script.turns[0].question, "Why Rust?");
    }

    #[test]
    fn load_missing_file() {
        let err = ScriptLoader::with_defaults()
            .load(Path::new("/nonexistent/script.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn limits_default() {
        let limits = ConfigLimits::default();
        assert!(limits.max_turns > 0);
        assert!(limits.max_script_size > 0);
    }
}
