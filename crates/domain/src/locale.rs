use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported response locales. Set once at session creation; never changes
/// mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    En,
    PtBr,
    Es,
    Fr,
    De,
    Zh,
    Ja,
    Ko,
    It,
    Ru,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::PtBr => "pt_br",
            Locale::Es => "es",
            Locale::Fr => "fr",
            Locale::De => "de",
            Locale::Zh => "zh",
            Locale::Ja => "ja",
            Locale::Ko => "ko",
            Locale::It => "it",
            Locale::Ru => "ru",
        }
    }

    /// Locales with a fully localized prompt-section table (§4.6). All
    /// others fall back to the English table plus a localized bookend.
    pub fn has_full_prompt_sections(&self) -> bool {
        matches!(self, Locale::En | Locale::PtBr)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::En
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_english() {
        assert_eq!(Locale::default(), Locale::En);
    }

    #[test]
    fn only_en_and_pt_br_have_full_sections() {
        assert!(Locale::En.has_full_prompt_sections());
        assert!(Locale::PtBr.has_full_prompt_sections());
        assert!(!Locale::Es.has_full_prompt_sections());
        assert!(!Locale::Ru.has_full_prompt_sections());
    }
}
