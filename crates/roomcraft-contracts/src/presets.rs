//! Convenience style labels and canned transformation instructions.

pub const STYLE_PRESETS: &[&str] = &[
    "Modern Minimalist",
    "Cozy Bohemian",
    "Industrial Loft",
    "Scandinavian",
    "Contemporary",
    "Rustic Farmhouse",
    "Mid-Century Modern",
    "Coastal",
    "Traditional",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickStyle {
    pub name: &'static str,
    pub instruction: &'static str,
}

pub const QUICK_STYLES: &[QuickStyle] = &[
    QuickStyle {
        name: "Cozy Reading Nook",
        instruction: "Transform into a cozy reading nook with warm lighting, comfortable seating, built-in bookshelves filled with books, a plush reading chair with ottoman, soft ambient lighting, and warm earth tones",
    },
    QuickStyle {
        name: "Minimalist Zen",
        instruction: "Create a minimalist zen space with natural materials, neutral colors, plants, clean lines, uncluttered surfaces, and calming atmosphere",
    },
    QuickStyle {
        name: "Creative Studio",
        instruction: "Design a creative studio with organized storage, good natural lighting, inspiring artwork, comfortable workspace, and vibrant accent colors",
    },
    QuickStyle {
        name: "Coffee Bar Corner",
        instruction: "Set up a stylish coffee bar corner with open shelving, cafe-style lighting, coffee equipment display, and cozy seating area",
    },
    QuickStyle {
        name: "Home Gym",
        instruction: "Transform into a home gym with rubber flooring, wall-mounted mirrors, organized equipment storage, motivational decor, and proper ventilation",
    },
    QuickStyle {
        name: "Gaming Setup",
        instruction: "Create a gaming setup with ergonomic furniture, RGB lighting, cable management, display mounting, and comfortable seating",
    },
    QuickStyle {
        name: "Meditation Space",
        instruction: "Design a meditation space with soft lighting, comfortable floor cushions, natural elements, calming colors, and minimal distractions",
    },
    QuickStyle {
        name: "Kids Play Area",
        instruction: "Transform into a kids play area with colorful storage, soft flooring, educational displays, creative stations, and safety features",
    },
];

const STYLE_KEYWORDS: &[(&str, &str)] = &[
    ("modern", "modern"),
    ("minimalist", "minimalist"),
    ("contemporary", "contemporary"),
    ("industrial", "industrial"),
    ("bohemian", "bohemian"),
    ("scandinavian", "scandinavian"),
    ("rustic", "rustic"),
    ("farmhouse", "farmhouse"),
    ("traditional", "traditional"),
    ("mid-century", "mid-century modern"),
    ("coastal", "coastal"),
    ("vintage", "vintage"),
];

pub fn quick_style(name: &str) -> Option<&'static QuickStyle> {
    let wanted = name.trim();
    QUICK_STYLES
        .iter()
        .find(|style| style.name.eq_ignore_ascii_case(wanted))
}

/// Derives a style label from a free-text instruction.
///
/// Keywords are checked in table order, so "modern farmhouse" yields
/// `modern`. Without a keyword the first word is used.
pub fn infer_style(instruction: &str) -> String {
    let lowered = instruction.to_lowercase();
    for (keyword, style) in STYLE_KEYWORDS {
        if lowered.contains(keyword) {
            return (*style).to_string();
        }
    }
    instruction
        .split_whitespace()
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| "custom".to_string())
}

#[cfg(test)]
mod tests {
    use super::{infer_style, quick_style, QUICK_STYLES, STYLE_PRESETS};

    #[test]
    fn infer_style_prefers_table_order() {
        assert_eq!(infer_style("Modern farmhouse kitchen"), "modern");
        assert_eq!(infer_style("a Mid-Century den"), "mid-century modern");
        assert_eq!(infer_style("Cozy bohemian bedroom"), "bohemian");
    }

    #[test]
    fn infer_style_falls_back_to_first_word_then_custom() {
        assert_eq!(infer_style("Japandi calm office"), "Japandi");
        assert_eq!(infer_style("   "), "custom");
    }

    #[test]
    fn quick_style_lookup_is_case_insensitive() {
        let nook = quick_style("cozy reading nook").expect("preset");
        assert!(nook.instruction.contains("bookshelves"));
        assert!(quick_style("Ballroom").is_none());
        assert_eq!(QUICK_STYLES.len(), 8);
        assert!(STYLE_PRESETS.contains(&"Scandinavian"));
    }
}
