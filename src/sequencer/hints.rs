//! Sidebar hint reveal.
//!
//! Each hint category is typed out character by character. Categories
//! start a fixed stagger apart; within a category items are typed one
//! after another.

use std::time::Duration;

use serde::Serialize;

use crate::config::schema::TurnHints;

use super::reveal::{char_prefix, duration_ms};

/// One of the four hint lists shown in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HintCategory {
    /// Content tips
    Tips,
    /// Phrases worth using
    KeyPhrases,
    /// Phrases to avoid
    AvoidPhrases,
    /// Body-language tips
    BodyLanguage,
}

impl HintCategory {
    /// Categories in reveal order.
    pub const ALL: [Self; 4] = [
        Self::Tips,
        Self::KeyPhrases,
        Self::AvoidPhrases,
        Self::BodyLanguage,
    ];

    /// Sidebar heading.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tips => "Tips",
            Self::KeyPhrases => "Key phrases",
            Self::AvoidPhrases => "Avoid",
            Self::BodyLanguage => "Body language",
        }
    }

    fn source(self, hints: &TurnHints) -> &[String] {
        match self {
            Self::Tips => &hints.tips,
            Self::KeyPhrases => &hints.key_phrases,
            Self::AvoidPhrases => &hints.avoid_phrases,
            Self::BodyLanguage => &hints.body_language,
        }
    }
}

/// Revealed hint text, one string per scripted item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HintBoard {
    tips: Vec<String>,
    key_phrases: Vec<String>,
    avoid_phrases: Vec<String>,
    body_language: Vec<String>,
}

impl HintBoard {
    /// An empty board shaped like `hints`.
    #[must_use]
    pub fn blank_for(hints: &TurnHints) -> Self {
        let blank = |items: &[String]| vec![String::new(); items.len()];
        Self {
            tips: blank(&hints.tips),
            key_phrases: blank(&hints.key_phrases),
            avoid_phrases: blank(&hints.avoid_phrases),
            body_language: blank(&hints.body_language),
        }
    }

    /// Revealed items for `category`.
    #[must_use]
    pub fn items(&self, category: HintCategory) -> &[String] {
        match category {
            HintCategory::Tips => &self.tips,
            HintCategory::KeyPhrases => &self.key_phrases,
            HintCategory::AvoidPhrases => &self.avoid_phrases,
            HintCategory::BodyLanguage => &self.body_language,
        }
    }

    fn items_mut(&mut self, category: HintCategory) -> &mut Vec<String> {
        match category {
            HintCategory::Tips => &mut self.tips,
            HintCategory::KeyPhrases => &mut self.key_phrases,
            HintCategory::AvoidPhrases => &mut self.avoid_phrases,
            HintCategory::BodyLanguage => &mut self.body_language,
        }
    }

    /// Reveals the first `chars` characters of `source` item `item`.
    ///
    /// Returns `false` if the item does not exist or nothing changed.
    pub fn reveal(
        &mut self,
        source: &TurnHints,
        category: HintCategory,
        item: usize,
        chars: usize,
    ) -> bool {
        let Some(text) = category.source(source).get(item) else {
            return false;
        };
        let Some(slot) = self.items_mut(category).get_mut(item) else {
            return false;
        };
        let revealed = char_prefix(text, chars);
        if *slot == revealed {
            return false;
        }
        *slot = revealed;
        true
    }

    /// Returns `true` when no character has been revealed yet.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        HintCategory::ALL
            .iter()
            .all(|c| self.items(*c).iter().all(String::is_empty))
    }
}

/// One character step of the hint reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintStep {
    /// Offset from the hint start
    pub offset_ms: u64,
    /// Category being typed
    pub category: HintCategory,
    /// Item within the category
    pub item: usize,
    /// Characters visible after this step
    pub chars: usize,
}

/// Computes every character step for `hints`.
#[must_use]
pub fn plan(hints: &TurnHints, char_delay: Duration, stagger: Duration) -> Vec<HintStep> {
    let char_ms = duration_ms(char_delay);
    let stagger_ms = duration_ms(stagger);
    let mut steps = Vec::new();

    for (slot, category) in (0u64..).zip(HintCategory::ALL) {
        let start = stagger_ms.saturating_mul(slot);
        let mut typed = 0u64;
        for (item, text) in category.source(hints).iter().enumerate() {
            for chars in 1..=text.chars().count() {
                typed += 1;
                steps.push(HintStep {
                    offset_ms: start.saturating_add(char_ms.saturating_mul(typed)),
                    category,
                    item,
                    chars,
                });
            }
        }
    }

    steps.sort_by_key(|s| s.offset_ms);
    steps
}
