//! Spread types: drawn cards and positional labels.
//!
//! A spread is an ordered sequence of [`CardDraw`]s. The declared spread size
//! selects a fixed set of positional labels (Past/Present/Future and friends);
//! sizes without a label set, or cards past the end of one, fall back to
//! literal `Position N` labels.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Spread sizes accepted by the non-streaming interpretation endpoint.
pub const VALID_SPREAD_SIZES: [usize; 6] = [1, 3, 6, 9, 10, 12];

/// A single drawn card as received over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDraw {
    /// Free-form card name; meaning lookup is case-insensitive.
    pub card: String,
    /// Whether the card was drawn reversed.
    #[serde(default)]
    pub reversed: bool,
}

impl CardDraw {
    pub fn new(card: impl Into<String>, reversed: bool) -> Self {
        Self {
            card: card.into(),
            reversed,
        }
    }

    /// Orientation word used in prompts ("Upright" / "Reversed").
    pub fn orientation(&self) -> &'static str {
        if self.reversed {
            "Reversed"
        } else {
            "Upright"
        }
    }
}

/// Positional label lists keyed by spread size.
static SPREAD_LABELS: Lazy<Vec<(usize, Vec<&'static str>)>> = Lazy::new(|| {
    vec![
        (1, vec!["Single Card"]),
        (3, vec!["Past", "Present", "Future"]),
        (
            6,
            vec![
                "Past",
                "Present",
                "Future",
                "Hidden Influences",
                "External Factors",
                "Outcome",
            ],
        ),
        (
            9,
            vec![
                "Present Situation",
                "Immediate Influence",
                "Hidden Influences",
                "Past Influence",
                "Recent Past",
                "Future Influence",
                "The Querent's Role",
                "External Factors",
                "Outcome/Advice",
            ],
        ),
        (
            10,
            vec![
                "Present Position",
                "Immediate Influence",
                "Goal or Destiny",
                "Distant Past",
                "Recent Past",
                "Future Influence",
                "The Questioner",
                "External Factors",
                "Inner Emotions",
                "Final Result",
            ],
        ),
        (
            12,
            vec![
                "Past Influences",
                "Present Situation",
                "Immediate Influences",
                "Distant Past",
                "Recent Past",
                "Near Future",
                "Far Future",
                "External Influences",
                "Emotional State",
                "The Querent's Role",
                "Outcome/Advice",
                "Final Outcome",
            ],
        ),
    ]
});

/// Check whether a declared spread size is one of the known layouts.
pub fn is_valid_spread_size(size: usize) -> bool {
    VALID_SPREAD_SIZES.contains(&size)
}

/// Label for position `index` (0-based) in a spread of the given declared
/// size. Unknown sizes and positions past the label list get `Position N`.
pub fn position_label(spread_size: usize, index: usize) -> String {
    let labels = SPREAD_LABELS
        .iter()
        .find(|(size, _)| *size == spread_size)
        .map(|(_, labels)| labels.as_slice());

    match labels.and_then(|l| l.get(index)) {
        Some(label) => (*label).to_string(),
        None => format!("Position {}", index + 1),
    }
}
