//! Fixed card-meaning tables and fallback rules.
//!
//! The 22 major arcana carry fixed upright/reversed strings. Minor arcana
//! meanings are derived from an ordered suit scan plus an ordered rank rule
//! list; rank priority is explicit (ace > page > knight > queen > king >
//! numbered default) so the containment checks cannot drift.

use once_cell::sync::Lazy;

use super::CardMeaning;

/// Fixed meanings for the 22 major arcana, keyed by lowercase name.
pub static MAJOR_ARCANA: Lazy<Vec<(&'static str, CardMeaning)>> = Lazy::new(|| {
    let m = |upright: &str, reversed: &str| CardMeaning {
        upright: upright.to_string(),
        reversed: reversed.to_string(),
    };
    vec![
        (
            "the fool",
            m(
                "New beginnings, innocence, spontaneity, free spirit, adventure",
                "Recklessness, taken advantage of, inconsideration, naivety",
            ),
        ),
        (
            "the magician",
            m(
                "Manifestation, resourcefulness, power, inspired action, skill",
                "Manipulation, poor planning, untapped talents, illusion",
            ),
        ),
        (
            "the high priestess",
            m(
                "Intuition, sacred knowledge, divine feminine, subconscious mind",
                "Secrets, disconnected from intuition, withdrawal, silence",
            ),
        ),
        (
            "the empress",
            m(
                "Femininity, beauty, nature, nurturing, abundance, creativity",
                "Creative block, dependence on others, smothering, emptiness",
            ),
        ),
        (
            "the emperor",
            m(
                "Authority, establishment, structure, father figure, control",
                "Domination, excessive control, lack of discipline, inflexibility",
            ),
        ),
        (
            "the hierophant",
            m(
                "Spiritual wisdom, religious beliefs, conformity, tradition, institutions",
                "Personal beliefs, freedom, challenging the status quo, rebellion",
            ),
        ),
        (
            "the lovers",
            m(
                "Love, harmony, relationships, values alignment, choices",
                "Self-love, disharmony, imbalance, misalignment of values",
            ),
        ),
        (
            "the chariot",
            m(
                "Control, willpower, success, action, determination, victory",
                "Self-discipline, opposition, lack of direction, aggression",
            ),
        ),
        (
            "strength",
            m(
                "Strength, courage, persuasion, influence, compassion, inner power",
                "Inner strength, self-doubt, low energy, raw emotion, insecurity",
            ),
        ),
        (
            "the hermit",
            m(
                "Soul searching, introspection, being alone, inner guidance, solitude",
                "Isolation, loneliness, withdrawal, paranoia, exile",
            ),
        ),
        (
            "wheel of fortune",
            m(
                "Good luck, karma, life cycles, destiny, turning point, change",
                "Bad luck, resistance to change, breaking cycles, setbacks",
            ),
        ),
        (
            "justice",
            m(
                "Justice, fairness, truth, cause and effect, law, accountability",
                "Unfairness, lack of accountability, dishonesty, legal issues",
            ),
        ),
        (
            "the hanged man",
            m(
                "Pause, surrender, letting go, new perspectives, sacrifice",
                "Delays, resistance, stalling, indecision, stagnation",
            ),
        ),
        (
            "death",
            m(
                "Endings, change, transformation, transition, letting go, release",
                "Resistance to change, personal transformation, inner purging",
            ),
        ),
        (
            "temperance",
            m(
                "Balance, moderation, patience, purpose, meaning, harmony",
                "Imbalance, excess, self-healing, re-alignment, extremes",
            ),
        ),
        (
            "the devil",
            m(
                "Shadow self, attachment, addiction, restriction, sexuality, materialism",
                "Releasing limiting beliefs, exploring dark thoughts, detachment",
            ),
        ),
        (
            "the tower",
            m(
                "Sudden change, upheaval, chaos, revelation, awakening, disruption",
                "Personal transformation, fear of change, averting disaster",
            ),
        ),
        (
            "the star",
            m(
                "Hope, faith, purpose, renewal, spirituality, inspiration, serenity",
                "Lack of faith, despair, self-trust, disconnection, discouragement",
            ),
        ),
        (
            "the moon",
            m(
                "Illusion, fear, anxiety, subconscious, intuition, dreams",
                "Release of fear, repressed emotion, inner confusion, clarity",
            ),
        ),
        (
            "the sun",
            m(
                "Positivity, fun, warmth, success, vitality, joy, confidence",
                "Inner child, feeling down, overly optimistic, unrealistic expectations",
            ),
        ),
        (
            "judgement",
            m(
                "Judgement, rebirth, inner calling, absolution, reflection, reckoning",
                "Self-doubt, inner critic, ignoring the call, lack of self-awareness",
            ),
        ),
        (
            "the world",
            m(
                "Completion, integration, accomplishment, travel, fulfillment, success",
                "Seeking personal closure, short-cuts, delays, incomplete goals",
            ),
        ),
    ]
});

/// Suit themes scanned in order; only the first matching suit applies.
pub const SUIT_THEMES: [(&str, &str); 4] = [
    ("cups", "emotions, feelings, relationships, connections"),
    ("pentacles", "material world, finances, career, manifestation"),
    ("swords", "thoughts, intellect, communication, conflict"),
    ("wands", "inspiration, energy, action, passion, creativity"),
];

/// Rank clauses checked in priority order; the first rank substring found in
/// the card name wins.
pub const RANK_CLAUSES: [(&str, &str, &str); 5] = [
    (
        "ace",
        "A new beginning or opportunity in this area.",
        "Missed opportunity or delayed start.",
    ),
    (
        "page",
        "A message, new learning, or youthful energy.",
        "Immaturity, lack of commitment, or delayed news.",
    ),
    (
        "knight",
        "Action, movement, pursuit of goals.",
        "Hasty action, delays, or frustration.",
    ),
    (
        "queen",
        "Nurturing, mature feminine energy, mastery.",
        "Dependency, manipulation, or self-care needed.",
    ),
    (
        "king",
        "Mastery, control, mature masculine energy.",
        "Domination, control issues, or lack of authority.",
    ),
];

/// Clause applied to suited cards with no rank substring (numbered cards).
pub const NUMBERED_CLAUSE: (&str, &str) = (
    "Development and progression in this area.",
    "Challenges or setbacks in this area.",
);

/// Look up a fixed major-arcana meaning by lowercase name.
pub fn major_arcana_meaning(lower_name: &str) -> Option<CardMeaning> {
    MAJOR_ARCANA
        .iter()
        .find(|(name, _)| *name == lower_name)
        .map(|(_, meaning)| meaning.clone())
}

/// Derive a meaning for a suited (minor arcana) card name, if it contains a
/// suit substring.
pub fn suit_meaning(lower_name: &str) -> Option<CardMeaning> {
    let (_, theme) = SUIT_THEMES
        .iter()
        .find(|(suit, _)| lower_name.contains(suit))?;

    let (upright_clause, reversed_clause) = RANK_CLAUSES
        .iter()
        .find(|(rank, _, _)| lower_name.contains(rank))
        .map(|(_, up, rev)| (*up, *rev))
        .unwrap_or(NUMBERED_CLAUSE);

    Some(CardMeaning {
        upright: format!("This card relates to {}. {}", theme, upright_clause),
        reversed: format!("Blocked or internalized {}. {}", theme, reversed_clause),
    })
}

/// Generic meaning for a card matching neither the major arcana nor a suit.
/// References the card name verbatim as given by the caller.
pub fn generic_meaning(card_name: &str) -> CardMeaning {
    CardMeaning {
        upright: format!(
            "{} represents an important aspect of your reading that requires reflection.",
            card_name
        ),
        reversed: format!(
            "{} reversed suggests internal processing or blocked energy in this area.",
            card_name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_arcana_has_22_entries() {
        assert_eq!(MAJOR_ARCANA.len(), 22);
    }

    #[test]
    fn test_major_arcana_lookup() {
        let fool = major_arcana_meaning("the fool").unwrap();
        assert!(fool.upright.starts_with("New beginnings"));
        assert!(major_arcana_meaning("the fool's errand").is_none());
    }

    #[test]
    fn test_suit_rank_priority() {
        // "ace" outranks "king" regardless of position in the name.
        let meaning = suit_meaning("king ace of cups").unwrap();
        assert!(meaning.upright.contains("A new beginning or opportunity"));
    }

    #[test]
    fn test_first_suit_wins() {
        // Pathological name containing two suit tokens: scan order decides.
        let meaning = suit_meaning("cups of wands").unwrap();
        assert!(meaning.upright.contains("emotions, feelings"));
    }

    #[test]
    fn test_numbered_card_clause() {
        let meaning = suit_meaning("seven of swords").unwrap();
        assert!(meaning.upright.ends_with("Development and progression in this area."));
        assert!(meaning.reversed.ends_with("Challenges or setbacks in this area."));
    }

    #[test]
    fn test_generic_meaning_names_card_verbatim() {
        let meaning = generic_meaning("The Mystery Card");
        assert!(meaning.upright.starts_with("The Mystery Card represents"));
        assert!(meaning.reversed.starts_with("The Mystery Card reversed"));
    }
}
