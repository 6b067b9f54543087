//! Category emoji inference
//!
//! Keyword groups are tested in a fixed priority order against the
//! lowercased category name; the first group with a keyword contained in
//! the name wins. "Chá de frutas" therefore resolves to tea, not fruit.
//!
//! Short English keywords (`words`) only match at the start of a word, so
//! "Steak" is not tea and "Donuts" is not a nut.

/// Emoji used when no keyword group matches
pub const DEFAULT_EMOJI: &str = "📦";

struct KeywordGroup {
    emoji: &'static str,
    /// Matched anywhere in the name
    keywords: &'static [&'static str],
    /// Matched at the start of a word
    words: &'static [&'static str],
}

impl KeywordGroup {
    fn matches(&self, lower: &str) -> bool {
        self.keywords.iter().any(|kw| lower.contains(kw))
            || lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| self.words.iter().any(|w| word.starts_with(w)))
    }
}

/// Priority order: first match wins.
const GROUPS: &[KeywordGroup] = &[
    // seed
    KeywordGroup {
        emoji: "🌱",
        keywords: &["semente", "seed", "semilla"],
        words: &[],
    },
    // grain
    KeywordGroup {
        emoji: "🌾",
        keywords: &["grão", "grao", "trigo", "grain", "grano", "cereal"],
        words: &[],
    },
    // flour
    KeywordGroup {
        emoji: "🥡",
        keywords: &["farinha", "flour", "harina"],
        words: &[],
    },
    // tea
    KeywordGroup {
        emoji: "🍵",
        keywords: &["chá", "infusão", "infusion", "infusión"],
        words: &["tea"],
    },
    // spice
    KeywordGroup {
        emoji: "🌶\u{FE0F}",
        keywords: &[
            "tempero",
            "pimenta",
            "especiaria",
            "condimento",
            "spice",
            "pepper",
            "especia",
        ],
        words: &[],
    },
    // fruit
    KeywordGroup {
        emoji: "🍑",
        keywords: &["fruta", "damasco", "fruit"],
        words: &[],
    },
    // nut
    KeywordGroup {
        emoji: "🌰",
        keywords: &[
            "castanha",
            "noze",
            "amendoa",
            "amêndoa",
            "walnut",
            "almond",
            "frutos secos",
            "nuez",
            "almendra",
        ],
        words: &["nuts"],
    },
    // oil
    KeywordGroup {
        emoji: "🫗",
        keywords: &["óleo", "oleo", "azeite", "aceite"],
        words: &["oil"],
    },
    // supplement
    KeywordGroup {
        emoji: "💪",
        keywords: &["suplemento", "supplement", "whey"],
        words: &[],
    },
    // sweet
    KeywordGroup {
        emoji: "🍫",
        keywords: &["doce", "chocolate", "sweet", "dulce", "candy"],
        words: &[],
    },
    // snack
    KeywordGroup {
        emoji: "🍿",
        keywords: &["snack", "salgadinho", "petisco", "aperitivo"],
        words: &[],
    },
    // capsule
    KeywordGroup {
        emoji: "💊",
        keywords: &["encap", "cápsula", "capsula", "capsule"],
        words: &[],
    },
];

/// Best-guess emoji for a category name, [`DEFAULT_EMOJI`] when nothing matches.
pub fn infer_emoji(category_name: &str) -> &'static str {
    let lower = category_name.to_lowercase();
    GROUPS
        .iter()
        .find(|group| group.matches(&lower))
        .map(|group| group.emoji)
        .unwrap_or(DEFAULT_EMOJI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portuguese_categories() {
        assert_eq!(infer_emoji("Sementes"), "🌱");
        assert_eq!(infer_emoji("Grãos"), "🌾");
        assert_eq!(infer_emoji("Farinhas"), "🥡");
        assert_eq!(infer_emoji("Chás"), "🍵");
        assert_eq!(infer_emoji("Temperos"), "🌶\u{FE0F}");
        assert_eq!(infer_emoji("Frutas Secas"), "🍑");
        assert_eq!(infer_emoji("Castanhas e Nozes"), "🌰");
        assert_eq!(infer_emoji("Óleos e Azeites"), "🫗");
        assert_eq!(infer_emoji("Suplementos"), "💪");
        assert_eq!(infer_emoji("Doces"), "🍫");
        assert_eq!(infer_emoji("Encapsulados"), "💊");
    }

    #[test]
    fn test_other_languages() {
        assert_eq!(infer_emoji("Chia Seeds"), "🌱");
        assert_eq!(infer_emoji("Harinas"), "🥡");
        assert_eq!(infer_emoji("Green Tea"), "🍵");
        assert_eq!(infer_emoji("Frutos secos"), "🌰");
        assert_eq!(infer_emoji("Snacks"), "🍿");
        assert_eq!(infer_emoji("Capsules"), "💊");
    }

    #[test]
    fn test_first_group_wins() {
        // tea is evaluated before fruit
        assert_eq!(infer_emoji("chá de frutas"), "🍵");
        // grain is evaluated before sweet
        assert_eq!(infer_emoji("Cereal com Chocolate"), "🌾");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(infer_emoji("CHÁS"), infer_emoji("chás"));
        assert_eq!(infer_emoji("TEMPEROS"), "🌶\u{FE0F}");
    }

    #[test]
    fn test_short_english_keywords_need_word_start() {
        assert_eq!(infer_emoji("Steak"), DEFAULT_EMOJI);
        assert_eq!(infer_emoji("Donuts"), DEFAULT_EMOJI);
        assert_eq!(infer_emoji("Boiled Eggs"), DEFAULT_EMOJI);
        assert_eq!(infer_emoji("Herbal Teas"), "🍵");
        assert_eq!(infer_emoji("Mixed Nuts"), "🌰");
        assert_eq!(infer_emoji("Coconut Oil"), "🫗");
        assert_eq!(infer_emoji("Walnuts"), "🌰");
    }

    #[test]
    fn test_fallback() {
        for name in ["Utensílios", "Embalagens", "", "Mel"] {
            assert_eq!(infer_emoji(name), DEFAULT_EMOJI);
        }
    }
}
