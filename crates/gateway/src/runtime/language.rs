//! Post-stream check that the model actually responded in the session's
//! locale. Best-effort: short or low-confidence text is never flagged, and
//! a mismatch is logged rather than failing the turn — a wrong guess here
//! would be worse than a missed one.

use forge_domain::error::tool_error;
use forge_domain::locale::Locale;
use serde_json::Value;

const MIN_CHECKED_LEN: usize = 50;

fn expected_iso_code(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "eng",
        Locale::PtBr => "por",
        Locale::Es => "spa",
        Locale::Fr => "fra",
        Locale::De => "deu",
        Locale::Zh => "cmn",
        Locale::Ja => "jpn",
        Locale::Ko => "kor",
        Locale::It => "ita",
        Locale::Ru => "rus",
    }
}

fn display_tag(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "en",
        Locale::PtBr => "pt-BR",
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

/// Returns `Some(LANGUAGE_MISMATCH envelope)` if `text` is confidently
/// detected as a language other than `locale`. Returns `None` for text
/// under 50 chars, undetectable text, low-confidence detection, or a match.
pub fn check_response_language(text: &str, locale: Locale) -> Option<Value> {
    if text.chars().count() < MIN_CHECKED_LEN {
        return None;
    }

    let info = whatlang::detect(text)?;
    if !info.is_reliable() {
        return None;
    }

    let detected = info.lang().code();
    if detected == expected_iso_code(locale) {
        return None;
    }

    Some(tool_error(
        "LANGUAGE_MISMATCH",
        format!(
            "response appears to be in a different language than the session locale ({})",
            display_tag(locale)
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EN_TEXT: &str = "The development of artificial intelligence has fundamentally changed \
         how we approach complex problem-solving in modern organizations. \
         This represents a paradigm shift in knowledge creation.";

    const PT_TEXT: &str = "O desenvolvimento da inteligencia artificial mudou fundamentalmente \
         a forma como abordamos a resolucao de problemas complexos nas \
         organizacoes modernas. Isso representa uma mudanca de paradigma \
         na criacao de conhecimento.";

    #[test]
    fn passes_when_english_matches_en_locale() {
        assert!(check_response_language(EN_TEXT, Locale::En).is_none());
    }

    #[test]
    fn passes_when_portuguese_matches_pt_br_locale() {
        assert!(check_response_language(PT_TEXT, Locale::PtBr).is_none());
    }

    #[test]
    fn flags_portuguese_text_against_en_locale_when_confident() {
        // Enforcement is best-effort: only assert the shape when the
        // detector is confident enough to return a result at all.
        if let Some(result) = check_response_language(PT_TEXT, Locale::En) {
            assert_eq!(result["status"], "error");
            assert_eq!(result["error_code"], "LANGUAGE_MISMATCH");
        }
    }

    #[test]
    fn skips_short_text_under_fifty_chars() {
        assert!(check_response_language("Bonjour le monde!", Locale::En).is_none());
    }

    #[test]
    fn skips_empty_text() {
        assert!(check_response_language("", Locale::En).is_none());
    }

    #[test]
    fn skips_text_at_the_boundary() {
        let text = "a".repeat(49);
        assert!(check_response_language(&text, Locale::PtBr).is_none());
    }
}
