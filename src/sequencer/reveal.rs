//! Token-by-token text reveal.
//!
//! A text of `W` whitespace-delimited tokens revealed over `D`
//! milliseconds has `W + 1` states: state `k` shows the first `k` tokens
//! joined by single spaces and becomes visible at offset `k * D / W`.

use std::time::Duration;

/// Splits `text` into whitespace-delimited tokens.
#[must_use]
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
#[must_use]
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Precomputed reveal schedule for one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealPlan {
    tokens: Vec<String>,
    duration_ms: u64,
}

impl RevealPlan {
    /// Builds the plan for revealing `text` over `duration`.
    #[must_use]
    pub fn new(text: &str, duration: Duration) -> Self {
        Self {
            tokens: tokenize(text).into_iter().map(str::to_owned).collect(),
            duration_ms: duration_ms(duration),
        }
    }

    /// Number of tokens `W`.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Total reveal duration in milliseconds.
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Text of state `k` (clamped to `W`).
    #[must_use]
    pub fn prefix(&self, k: usize) -> String {
        let k = k.min(self.tokens.len());
        self.tokens[..k].join(" ")
    }

    /// Offset of state `k` from the start of the reveal.
    ///
    /// State 0 is always at offset zero, including for empty text.
    #[must_use]
    pub fn offset_ms(&self, k: usize) -> u64 {
        let w = self.tokens.len();
        if w == 0 {
            return 0;
        }
        let k = k.min(w) as u128;
        let scaled = k * u128::from(self.duration_ms) / w as u128;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    /// The non-empty states `(k, offset)` for `k` in `1..=W`.
    pub fn steps(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        (1..=self.tokens.len()).map(|k| (k, self.offset_ms(k)))
    }

    /// The fully revealed text.
    #[must_use]
    pub fn full_text(&self) -> String {
        self.prefix(self.tokens.len())
    }
}

/// Returns the first `chars` characters of `text`.
#[must_use]
pub fn char_prefix(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn three_tokens_over_300ms() {
        let plan = RevealPlan::new("A B C", Duration::from_millis(300));
        assert_eq!(plan.token_count(), 3);
        let steps: Vec<_> = plan.steps().collect();
        assert_eq!(steps, vec![(1, 100), (2, 200), (3, 300)]);
        assert_eq!(plan.prefix(0), "");
        assert_eq!(plan.prefix(2), "A B");
    }

    #[test]
    fn single_token_has_one_step() {
        let plan = RevealPlan::new("Hello", Duration::from_millis(500));
        assert_eq!(plan.steps().collect::<Vec<_>>(), vec![(1, 500)]);
    }

    #[test]
    fn empty_text_has_only_the_empty_state() {
        let plan = RevealPlan::new("   ", Duration::from_millis(500));
        assert_eq!(plan.token_count(), 0);
        assert_eq!(plan.steps().count(), 0);
        assert_eq!(plan.offset_ms(0), 0);
        assert_eq!(plan.full_text(), "");
    }

    #[test]
    fn whitespace_is_normalized() {
        let plan = RevealPlan::new("  one\ttwo\n three ", Duration::ZERO);
        assert_eq!(plan.full_text(), "one two three");
        assert!(plan.steps().all(|(_, offset)| offset == 0));
    }

    #[test]
    fn prefix_clamps_past_the_end() {
        let plan = RevealPlan::new("X Y", Duration::from_millis(200));
        assert_eq!(plan.prefix(10), "X Y");
        assert_eq!(plan.offset_ms(10), 200);
    }

    #[test]
    fn char_prefix_respects_multibyte() {
        assert_eq!(char_prefix("héllo", 2), "hé");
        assert_eq!(char_prefix("hi", 10), "hi");
    }

    proptest! {
        #[test]
        fn reveal_has_w_plus_one_monotonic_prefix_states(
            words in proptest::collection::vec("[a-z]{1,8}", 0..40),
            duration in 0u64..100_000,
        ) {
            let text = words.join(" ");
            let plan = RevealPlan::new(&text, Duration::from_millis(duration));
            let states: Vec<String> = (0..=plan.token_count()).map(|k| plan.prefix(k)).collect();

            prop_assert_eq!(states.len(), words.len() + 1);
            prop_assert_eq!(states.last().unwrap(), &text);
            for pair in states.windows(2) {
                prop_assert!(pair[1].starts_with(&pair[0]));
                prop_assert_ne!(&pair[0], &pair[1]);
            }

            let mut last = 0;
            for (_, offset) in plan.steps() {
                prop_assert!(offset >= last);
                prop_assert!(offset <= duration);
                last = offset;
            }
            if !words.is_empty() {
                prop_assert_eq!(plan.offset_ms(words.len()), duration);
            }
        }
    }
}
