//! Prompt construction for interpretation requests.
//!
//! [`build_prompt`] is a pure function: the same spread, meanings, and config
//! always produce the same string. The meanings map is pre-populated by the
//! caller (the router resolves every card before building the prompt); lookup
//! here is by exact lowercase key and missing entries fall back to a literal
//! placeholder rather than erroring.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::meanings::CardMeaning;
use crate::spread::{position_label, CardDraw};

/// Placeholder meaning used when the map lacks a card entry.
const NO_MEANING: &str = "No specific meaning available";

/// Configurable prompt fragments.
///
/// Two variants of the instruction block exist in the wild: one ends with a
/// length constraint, one does not. The closing sentence is configuration,
/// not contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Optional closing instruction appended after the fixed instruction
    /// block (e.g. length guidance).
    pub closing_instruction: Option<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            closing_instruction: Some(
                "Keep the interpretation concise but meaningful (2-4 paragraphs).".to_string(),
            ),
        }
    }
}

/// Render a spread into the user prompt sent to the model.
pub fn build_prompt(
    cards: &[CardDraw],
    spread_size: usize,
    meanings: &HashMap<String, CardMeaning>,
    config: &PromptConfig,
) -> String {
    let mut prompt = format!(
        "Please interpret this {}-card tarot reading:\n\n",
        spread_size
    );

    for (i, draw) in cards.iter().enumerate() {
        let label = position_label(spread_size, i);
        let meaning = meanings
            .get(&draw.card.to_lowercase())
            .map(|m| m.for_orientation(draw.reversed))
            .unwrap_or(NO_MEANING);

        prompt.push_str(&format!(
            "**{}**: {} ({})\n",
            label,
            draw.card,
            draw.orientation()
        ));
        prompt.push_str(&format!("Meaning: {}\n\n", meaning));
    }

    prompt.push_str("\nProvide a cohesive interpretation that:\n");
    prompt.push_str("1. Considers how the cards relate to each other\n");
    prompt.push_str("2. Takes into account the position meanings in the spread\n");
    prompt.push_str("3. Offers practical guidance and spiritual insight\n");
    prompt.push_str("4. Addresses the overall narrative of the reading\n");

    if let Some(closing) = &config.closing_instruction {
        prompt.push('\n');
        prompt.push_str(closing);
    }

    prompt
}
