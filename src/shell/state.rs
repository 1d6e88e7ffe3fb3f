//! Shell toggles.
//!
//! Purely presentational switches. None of them feeds back into the
//! sequencer's timing.

use std::time::Duration;

use serde::Serialize;

/// Notice text shown after saving notes.
pub const NOTES_SAVED_NOTICE: &str = "Notes saved successfully";

/// How long the notes-saved notice stays up.
pub const NOTES_SAVED_TTL: Duration = Duration::from_secs(3);

/// A switchable shell element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    Mic,
    Video,
    Recording,
    Sidebar,
    Hints,
    Analytics,
    Notes,
    DarkMode,
    Settings,
}

impl Toggle {
    /// Lower-case name for logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mic => "mic",
            Self::Video => "video",
            Self::Recording => "recording",
            Self::Sidebar => "sidebar",
            Self::Hints => "hints",
            Self::Analytics => "analytics",
            Self::Notes => "notes",
            Self::DarkMode => "dark_mode",
            Self::Settings => "settings",
        }
    }
}

/// State of the presentation shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellState {
    /// Microphone is live
    pub mic_on: bool,
    /// Camera is on (only after access was granted)
    pub video_on: bool,
    /// Recording indicator is shown
    pub recording: bool,
    /// Sidebar is hidden
    pub sidebar_collapsed: bool,
    /// Hint panel is shown in the sidebar
    pub hints_visible: bool,
    /// Live scores and performance metrics are shown
    pub analytics_visible: bool,
    /// Notes panel is shown
    pub notes_visible: bool,
    /// Dark palette
    pub dark_mode: bool,
    /// Settings line is shown
    pub settings_visible: bool,
    /// Last saved notes (kept in memory only)
    pub notes: String,
    /// New feedback has not been looked at yet
    pub has_unread: bool,
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ShellState {
    /// Initial shell state; recording starts as `auto_record` says.
    #[must_use]
    pub const fn new(auto_record: bool) -> Self {
        Self {
            mic_on: true,
            video_on: false,
            recording: auto_record,
            sidebar_collapsed: false,
            hints_visible: true,
            analytics_visible: false,
            notes_visible: false,
            dark_mode: false,
            settings_visible: false,
            notes: String::new(),
            has_unread: false,
        }
    }

    const fn slot(&mut self, toggle: Toggle) -> &mut bool {
        match toggle {
            Toggle::Mic => &mut self.mic_on,
            Toggle::Video => &mut self.video_on,
            Toggle::Recording => &mut self.recording,
            Toggle::Sidebar => &mut self.sidebar_collapsed,
            Toggle::Hints => &mut self.hints_visible,
            Toggle::Analytics => &mut self.analytics_visible,
            Toggle::Notes => &mut self.notes_visible,
            Toggle::DarkMode => &mut self.dark_mode,
            Toggle::Settings => &mut self.settings_visible,
        }
    }

    /// Flips `toggle` and returns its new value.
    pub const fn toggle(&mut self, toggle: Toggle) -> bool {
        let slot = self.slot(toggle);
        *slot = !*slot;
        *slot
    }

    /// Sets `toggle` to `value`.
    pub const fn set(&mut self, toggle: Toggle, value: bool) {
        *self.slot(toggle) = value;
    }

    /// Stores notes in memory.
    pub fn save_notes(&mut self, text: impl Into<String>) {
        self.notes = text.into();
    }

    /// Clears the unread-feedback marker.
    pub const fn mark_read(&mut self) {
        self.has_unread = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let shell = ShellState::new(false);
        assert!(shell.mic_on);
        assert!(!shell.video_on);
        assert!(!shell.recording);
        assert!(shell.hints_visible);
        assert!(!shell.analytics_visible);
        assert!(!shell.has_unread);
    }

    #[test]
    fn toggle_flips_and_reports() {
        let mut shell = ShellState::default();
        assert!(!shell.toggle(Toggle::Mic));
        assert!(shell.toggle(Toggle::Mic));
        assert!(shell.toggle(Toggle::DarkMode));
        assert!(shell.dark_mode);
    }

    #[test]
    fn set_is_idempotent() {
        let mut shell = ShellState::default();
        shell.set(Toggle::Video, true);
        shell.set(Toggle::Video, true);
        assert!(shell.video_on);
    }

    #[test]
    fn notes_are_kept_in_memory() {
        let mut shell = ShellState::default();
        shell.save_notes("mention the rollback plan");
        assert_eq!(shell.notes, "mention the rollback plan");
    }
}
