//! Script validation
//!
//! Semantic checks on a deserialized [`ScriptConfig`]. Every issue is
//! collected rather than stopping at the first one. Quirks the sequencer
//! clamps on its own (empty turn list, zero durations) are warnings;
//! only limit violations are errors.

use crate::config::loader::ConfigLimits;
use crate::config::schema::{ScriptConfig, ScriptedTurn};
use crate::error::{Severity, ValidationIssue};

/// Titles longer than this many characters are flagged.
const MAX_TITLE_LEN: usize = 120;

// ============================================================================
// Public API
// ============================================================================

/// Result of script validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turns every warning into an error.
    pub fn promote_warnings(&mut self) {
        for mut issue in self.warnings.drain(..) {
            issue.severity = Severity::Error;
            self.errors.push(issue);
        }
    }
}

/// Script validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `script` against `limits`.
    pub fn validate(&mut self, script: &ScriptConfig, limits: &ConfigLimits) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_session(script);
        self.validate_timing(script);
        self.validate_analysis(script);
        self.validate_turns(script, limits);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn validate_session(&mut self, script: &ScriptConfig) {
        let title = script.session.title.trim();
        if title.is_empty() {
            self.add_warning("session.title", "title is empty");
        } else if title.chars().count() > MAX_TITLE_LEN {
            self.add_warning(
                "session.title",
                format!("title is unusually long (> {MAX_TITLE_LEN} characters)"),
            );
        }
        if script.session.max_duration.is_some_and(|d| d.is_zero()) {
            self.add_warning(
                "session.max_duration",
                "zero time limit ends the session immediately",
            );
        }
    }

    fn validate_timing(&mut self, script: &ScriptConfig) {
        let timing = &script.timing;
        for (field, value) in [
            ("timing.question_reveal", timing.question_reveal),
            ("timing.answer_reveal", timing.answer_reveal),
        ] {
            if value.is_zero() {
                self.add_warning(field, "zero duration reveals the whole text at once");
            }
        }
        if timing.cycle().is_zero() {
            self.add_warning(
                "timing",
                "all durations are zero; turns advance one millisecond apart",
            );
        }
    }

    fn validate_analysis(&mut self, script: &ScriptConfig) {
        let analysis = &script.analysis;
        if analysis.interval.is_zero() {
            self.add_warning("analysis.interval", "zero interval disables live analysis");
        }
        if analysis.feedback_delay >= script.timing.after_answer {
            self.add_warning(
                "analysis.feedback_delay",
                "feedback delay is not shorter than timing.after_answer; feedback will never show",
            );
        }
    }

    fn validate_turns(&mut self, script: &ScriptConfig, limits: &ConfigLimits) {
        if script.turns.is_empty() {
            self.add_warning("turns", "script has no turns; the session stays idle");
            return;
        }
        if script.turns.len() > limits.max_turns {
            self.add_error(
                "turns",
                format!(
                    "too many turns: {} (limit {})",
                    script.turns.len(),
                    limits.max_turns
                ),
            );
        }
        for (i, turn) in script.turns.iter().enumerate() {
            self.validate_turn(i, turn, limits);
        }
    }

    fn validate_turn(&mut self, index: usize, turn: &ScriptedTurn, limits: &ConfigLimits) {
        for (field, text) in [("question", &turn.question), ("answer", &turn.answer)] {
            let path = format!("turns[{index}].{field}");
            if text.trim().is_empty() {
                self.add_warning(&path, format!("{field} is blank"));
            }
            let len = text.chars().count();
            if len > limits.max_text_len {
                self.add_error(
                    &path,
                    format!("{field} is too long: {len} characters (limit {})", limits.max_text_len),
                );
            }
        }
        if turn.expected_duration.is_some_and(|d| d.is_zero()) {
            self.add_warning(
                format!("turns[{index}].expected_duration"),
                "expected duration is zero",
            );
        }
        let blank_hint = [
            &turn.hints.tips,
            &turn.hints.key_phrases,
            &turn.hints.avoid_phrases,
            &turn.hints.body_language,
        ]
        .into_iter()
        .flatten()
        .any(|h| h.trim().is_empty());
        if blank_hint {
            self.add_warning(format!("turns[{index}].hints"), "hint list contains a blank entry");
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn add_error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
        });
    }
}
