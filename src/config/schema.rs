//! Script schema types
//!
//! A script describes one mock-interview session: the scripted turns, the
//! timing of every reveal and pause, the cosmetic analysis settings and
//! the session metadata shown in the sidebar. Scripts are deserialized
//! from YAML and frozen behind an `Arc` before a session starts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Top-Level Script
// ============================================================================

/// Root configuration for a scripted interview session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ScriptConfig {
    /// Session metadata
    #[serde(default)]
    pub session: SessionSettings,

    /// Reveal and pause durations
    #[serde(default)]
    pub timing: Timing,

    /// Cosmetic live-analysis settings
    #[serde(default)]
    pub analysis: AnalysisSettings,

    /// Script-level feedback lists, indexed cyclically by turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feedback: Vec<Vec<String>>,

    /// Ordered scripted turns
    #[serde(default)]
    pub turns: Vec<ScriptedTurn>,
}

impl ScriptConfig {
    /// Returns the turn at `index`, wrapping around the list.
    ///
    /// Returns `None` only for an empty script.
    #[must_use]
    pub fn turn(&self, index: usize) -> Option<&ScriptedTurn> {
        if self.turns.is_empty() {
            return None;
        }
        self.turns.get(index % self.turns.len())
    }
}

// ============================================================================
// Session Metadata
// ============================================================================

/// Session-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct SessionSettings {
    /// Title shown in the header
    #[serde(default = "default_title")]
    pub title: String,

    /// Kind of interview being practiced
    #[serde(default)]
    pub interview_type: InterviewType,

    /// Interviewer persona
    #[serde(default)]
    pub persona: PersonaId,

    /// Whether the recording indicator starts switched on
    #[serde(default = "default_true")]
    pub auto_record: bool,

    /// End the session once this much (unpaused) time has elapsed
    #[serde(
        default,
        with = "optional_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_duration: Option<Duration>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            interview_type: InterviewType::default(),
            persona: PersonaId::default(),
            auto_record: true,
            max_duration: None,
        }
    }
}

fn default_title() -> String {
    "Mock interview".to_string()
}

const fn default_true() -> bool {
    true
}

/// Kind of interview being practiced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    /// Technical skills and problem-solving
    #[default]
    Technical,
    /// Past experiences and soft skills
    Behavioral,
    /// Architecture and scaling knowledge
    SystemDesign,
    /// Alignment with company values
    Cultural,
}

impl InterviewType {
    /// Returns the human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Technical => "Technical",
            Self::Behavioral => "Behavioral",
            Self::SystemDesign => "System Design",
            Self::Cultural => "Cultural Fit",
        }
    }

    /// Returns a one-line description of the interview focus.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Technical => "Focus on technical skills and problem-solving",
            Self::Behavioral => "Assess past experiences and soft skills",
            Self::SystemDesign => "Evaluate architecture and scaling knowledge",
            Self::Cultural => "Determine alignment with company values",
        }
    }
}

/// Identifier of a built-in interviewer persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaId {
    /// Senior tech lead focused on technical depth
    #[default]
    Technical,
    /// HR director focused on behaviour
    Hr,
    /// Engineering manager assessing leadership
    Manager,
}

/// Display details of an interviewer persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    /// Interviewer name
    pub name: &'static str,
    /// Job title
    pub role: &'static str,
    /// Interview style
    pub style: &'static str,
    /// Looping avatar clip
    pub video: &'static str,
}

impl PersonaId {
    /// Returns the persona's display details.
    #[must_use]
    pub const fn profile(self) -> Persona {
        match self {
            Self::Technical => Persona {
                name: "Dr. Alex Chen",
                role: "Senior Tech Lead",
                style: "Technical depth",
                video: "int.mp4",
            },
            Self::Hr => Persona {
                name: "Sarah Johnson",
                role: "HR Director",
                style: "Behavioral focus",
                video: "int_hr.mp4",
            },
            Self::Manager => Persona {
                name: "Michael Rodriguez",
                role: "Engineering Manager",
                style: "Leadership assessment",
                video: "int_manager.mp4",
            },
        }
    }
}

// ============================================================================
// Timing
// ============================================================================

/// Named durations driving the dialogue cycle.
///
/// All fields accept humantime strings (`"7300ms"`, `"1s"`, `"2m"`) or a
/// plain integer number of milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Timing {
    /// Total time to reveal a question
    #[serde(default = "Timing::default_question_reveal", with = "duration")]
    pub question_reveal: Duration,

    /// Total time to reveal an answer
    #[serde(default = "Timing::default_answer_reveal", with = "duration")]
    pub answer_reveal: Duration,

    /// Gap between the end of the question and the start of the answer
    #[serde(default = "Timing::default_after_question", with = "duration")]
    pub after_question: Duration,

    /// Gap between the end of the answer and the next turn
    #[serde(default = "Timing::default_after_answer", with = "duration")]
    pub after_answer: Duration,

    /// Delay from turn start to the first hint character (`None` disables hints)
    #[serde(
        default = "Timing::default_hints_start",
        with = "optional_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub hints_start: Option<Duration>,

    /// Delay per hint character
    #[serde(default = "Timing::default_hint_char_delay", with = "duration")]
    pub hint_char_delay: Duration,

    /// Offset between the start of consecutive hint categories
    #[serde(default = "Timing::default_hint_category_stagger", with = "duration")]
    pub hint_category_stagger: Duration,

    /// How long the "typing hints" indicator stays on
    #[serde(default = "Timing::default_hints_typing_window", with = "duration")]
    pub hints_typing_window: Duration,
}

impl Timing {
    const fn default_question_reveal() -> Duration {
        Duration::from_millis(7300)
    }

    const fn default_answer_reveal() -> Duration {
        Duration::from_millis(9800)
    }

    const fn default_after_question() -> Duration {
        Duration::from_secs(1)
    }

    const fn default_after_answer() -> Duration {
        Duration::from_secs(4)
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn default_hints_start() -> Option<Duration> {
        Some(Duration::from_millis(8100))
    }

    const fn default_hint_char_delay() -> Duration {
        Duration::from_millis(5)
    }

    const fn default_hint_category_stagger() -> Duration {
        Duration::from_secs(1)
    }

    const fn default_hints_typing_window() -> Duration {
        Duration::from_secs(5)
    }

    /// Total length of one turn (both reveals and both pauses), saturating.
    #[must_use]
    pub fn cycle(&self) -> Duration {
        self.question_reveal
            .saturating_add(self.after_question)
            .saturating_add(self.answer_reveal)
            .saturating_add(self.after_answer)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            question_reveal: Self::default_question_reveal(),
            answer_reveal: Self::default_answer_reveal(),
            after_question: Self::default_after_question(),
            after_answer: Self::default_after_answer(),
            hints_start: Self::default_hints_start(),
            hint_char_delay: Self::default_hint_char_delay(),
            hint_category_stagger: Self::default_hint_category_stagger(),
            hints_typing_window: Self::default_hints_typing_window(),
        }
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Settings for the cosmetic live-analysis walk and post-answer feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct AnalysisSettings {
    /// Seed for the metrics random walk
    #[serde(default)]
    pub seed: u64,

    /// Interval between analysis ticks while the candidate answers (zero disables)
    #[serde(default = "AnalysisSettings::default_interval", with = "duration")]
    pub interval: Duration,

    /// Delay after the answer ends before feedback is shown
    #[serde(default = "AnalysisSettings::default_feedback_delay", with = "duration")]
    pub feedback_delay: Duration,

    /// How long the "analysis complete" notice stays visible
    #[serde(default = "AnalysisSettings::default_notice_duration", with = "duration")]
    pub notice_duration: Duration,
}

impl AnalysisSettings {
    const fn default_interval() -> Duration {
        Duration::from_secs(2)
    }

    const fn default_feedback_delay() -> Duration {
        Duration::from_secs(3)
    }

    const fn default_notice_duration() -> Duration {
        Duration::from_secs(5)
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            interval: Self::default_interval(),
            feedback_delay: Self::default_feedback_delay(),
            notice_duration: Self::default_notice_duration(),
        }
    }
}

// ============================================================================
// Turns
// ============================================================================

/// One scripted question/answer pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ScriptedTurn {
    /// Interviewer's question
    pub question: String,

    /// Candidate's scripted answer
    pub answer: String,

    /// Question category
    #[serde(default)]
    pub category: QuestionCategory,

    /// Question difficulty
    #[serde(default)]
    pub difficulty: Difficulty,

    /// Tone the answer should aim for
    #[serde(default)]
    pub sentiment_target: SentimentTarget,

    /// Suggested answer length
    #[serde(
        default,
        with = "optional_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_duration: Option<Duration>,

    /// Sidebar hints revealed during the turn
    #[serde(default, skip_serializing_if = "TurnHints::is_empty")]
    pub hints: TurnHints,

    /// Feedback shown after the answer (overrides script-level feedback)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feedback: Vec<String>,
}

/// Question category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    /// Technical knowledge
    #[default]
    Technical,
    /// Past behaviour
    Behavioral,
    /// Hypothetical situations
    Situational,
}

/// Question difficulty tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Warm-up question
    Easy,
    /// Standard question
    #[default]
    Medium,
    /// Deep-dive question
    Hard,
}

/// Target tone for the candidate's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentTarget {
    /// Upbeat
    Positive,
    /// Matter-of-fact
    Neutral,
    /// Assured
    #[default]
    Confident,
}

/// Hint lists for one turn, revealed in the sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct TurnHints {
    /// Content tips
    #[serde(default)]
    pub tips: Vec<String>,
    /// Phrases worth using
    #[serde(default)]
    pub key_phrases: Vec<String>,
    /// Phrases to avoid
    #[serde(default)]
    pub avoid_phrases: Vec<String>,
    /// Body-language tips
    #[serde(default)]
    pub body_language: Vec<String>,
}

impl TurnHints {
    /// Returns `true` when no category has any entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tips.is_empty()
            && self.key_phrases.is_empty()
            && self.avoid_phrases.is_empty()
            && self.body_language.is_empty()
    }
}

// ============================================================================
// Duration (de)serialization
// ============================================================================

/// Parses a duration from a humantime string or a millisecond count.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Millis(u64),
    Text(String),
}

impl RawDuration {
    fn into_duration<E: serde::de::Error>(self) -> Result<Duration, E> {
        match self {
            Self::Millis(ms) => Ok(Duration::from_millis(ms)),
            Self::Text(text) => humantime::parse_duration(text.trim())
                .map_err(|e| E::custom(format!("invalid duration '{text}': {e}"))),
        }
    }
}

fn format_duration(value: Duration) -> String {
    humantime::format_duration(value).to_string()
}

mod duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::RawDuration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        RawDuration::deserialize(deserializer)?.into_duration()
    }
}

mod optional_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::RawDuration;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&super::format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<RawDuration>::deserialize(deserializer)?
            .map(RawDuration::into_duration)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_script_uses_defaults() {
        let yaml = r#"
turns:
  - question: "Tell me about yourself."
    answer: "I build distributed systems."
"#;
        let script: ScriptConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(script.turns.len(), 1);
        assert_eq!(script.timing, Timing::default());
        assert_eq!(script.session.title, "Mock interview");
        assert!(script.session.auto_record);
        assert_eq!(script.turns[0].difficulty, Difficulty::Medium);
    }

    #[test]
    fn durations_accept_text_and_millis() {
        let yaml = r"
timing:
  question_reveal: 300ms
  answer_reveal: 200
  after_question: 1s
  after_answer: 2m
";
        let script: ScriptConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(script.timing.question_reveal, Duration::from_millis(300));
        assert_eq!(script.timing.answer_reveal, Duration::from_millis(200));
        assert_eq!(script.timing.after_question, Duration::from_secs(1));
        assert_eq!(script.timing.after_answer, Duration::from_secs(120));
    }

    #[test]
    fn invalid_duration_is_rejected() {
        let yaml = "timing:\n  question_reveal: soon\n";
        let err = serde_yaml::from_str::<ScriptConfig>(yaml).unwrap_err();
        assert!(err.to_string().contains("invalid duration"), "{err}");
    }

    #[test]
    fn hints_start_can_be_disabled() {
        let yaml = "timing:\n  hints_start: null\n";
        let script: ScriptConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(script.timing.hints_start, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let yaml = "turns:\n  - question: q\n    answer: a\n    mood: happy\n";
        assert!(serde_yaml::from_str::<ScriptConfig>(yaml).is_err());
    }

    #[test]
    fn turn_lookup_wraps() {
        let script = ScriptConfig {
            turns: vec![
                ScriptedTurn {
                    question: "one".into(),
                    ..ScriptedTurn::default()
                },
                ScriptedTurn {
                    question: "two".into(),
                    ..ScriptedTurn::default()
                },
            ],
            ..ScriptConfig::default()
        };
        assert_eq!(script.turn(3).unwrap().question, "two");
        assert!(ScriptConfig::default().turn(0).is_none());
    }

    #[test]
    fn timing_cycle_sums_all_phases() {
        let timing = Timing {
            question_reveal: Duration::from_millis(300),
            answer_reveal: Duration::from_millis(200),
            after_question: Duration::from_millis(100),
            after_answer: Duration::from_millis(100),
            ..Timing::default()
        };
        assert_eq!(timing.cycle(), Duration::from_millis(700));
    }

    #[test]
    fn persona_profiles() {
        assert_eq!(PersonaId::Hr.profile().name, "Sarah Johnson");
        assert_eq!(PersonaId::default().profile().role, "Senior Tech Lead");
        assert_eq!(InterviewType::SystemDesign.label(), "System Design");
    }

    #[test]
    fn serialization_round_trips_durations_as_text() {
        let script = ScriptConfig::default();
        let yaml = serde_yaml::to_string(&script).unwrap();
        assert!(yaml.contains("question_reveal: 7s 300ms"), "{yaml}");
        let parsed: ScriptConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.timing, script.timing);
    }
}
