use serde::{Deserialize, Serialize};

/// Visual category derived from free-form condition text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Sunny,
    Rainy,
    Snowy,
    Cloudy,
    #[default]
    Neutral,
}

/// Keyword groups, tested in this order. First hit wins.
const KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Sunny, &["sun", "clear"]),
    (Category::Rainy, &["rain", "drizzle"]),
    (Category::Snowy, &["snow", "ice"]),
    (Category::Cloudy, &["cloud", "overcast"]),
];

/// Case-insensitive substring classification of a condition string.
pub fn classify_condition(text: &str) -> Category {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or_default()
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Rainy => "rainy",
            Self::Snowy => "snowy",
            Self::Cloudy => "cloudy",
            Self::Neutral => "neutral",
        }
    }

    /// Glyph shown on forecast cards.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Sunny => "☀",
            Self::Rainy => "☂",
            Self::Snowy => "❄",
            Self::Cloudy => "☁",
            Self::Neutral => "~",
        }
    }
}
