//! Answer comparison helpers.
//!
//! Stored answers often carry an explanation after the answer itself
//! ("Париж. Столица Франции", "Луна (спутник Земли)"); only the part before
//! the first period or opening parenthesis takes part in the comparison.
//! An answer that starts with a delimiter ("(Анна) Ахматова") is kept whole.

/// Returns the answer without its explanatory suffix, trimmed.
pub fn strip_explanation(text: &str) -> String {
    let end = text.find(['.', '(']).unwrap_or(text.len());
    let head = text[..end].trim();
    if head.is_empty() {
        text.trim().to_string()
    } else {
        head.to_string()
    }
}

/// Lowercases and collapses whitespace runs to single spaces.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical form used on both sides of a comparison.
pub fn canonical_answer(text: &str) -> String {
    normalize_text(&strip_explanation(text))
}

/// An empty canonical form never matches, even another empty one.
pub fn answers_match(expected: &str, given: &str) -> bool {
    let expected = canonical_answer(expected);
    !expected.is_empty() && expected == canonical_answer(given)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_after_period_or_parenthesis() {
        assert_eq!(strip_explanation("Париж. Столица Франции"), "Париж");
        assert_eq!(strip_explanation("Луна (спутник Земли)"), "Луна");
        assert_eq!(strip_explanation("  Пушкин  "), "Пушкин");
        assert_eq!(strip_explanation("А. С. Пушкин"), "А");
        assert_eq!(strip_explanation(""), "");
        assert_eq!(strip_explanation(". всё объяснение"), ". всё объяснение");
    }

    #[test]
    fn leading_delimiter_keeps_whole_answer() {
        assert_eq!(strip_explanation(" (Анна) Ахматова "), "(Анна) Ахматова");
        assert_eq!(strip_explanation("...и ружьё выстрелит"), "...и ружьё выстрелит");
        assert_eq!(strip_explanation("  . "), ".");
        assert_eq!(canonical_answer("(Анна) АХМАТОВА"), "(анна) ахматова");
    }

    #[test]
    fn bare_delimiters_do_not_match_leading_delimiter_answers() {
        assert!(!answers_match("(Анна) Ахматова", "."));
        assert!(!answers_match("(Анна) Ахматова", "("));
        assert!(!answers_match("...и ружьё выстрелит", "."));
        assert!(answers_match("(Анна) Ахматова", "(анна)   ахматова"));
    }

    #[test]
    fn empty_answers_never_match() {
        assert!(!answers_match("", ""));
        assert!(!answers_match("   ", "\n"));
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_text("  Братья \n  КАРАМАЗОВЫ\t"), "братья карамазовы");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \n\t "), "");
    }

    #[test]
    fn canonical_form_is_idempotent() {
        let samples = [
            "Париж. столица Франции",
            "  ПАРИЖ  ",
            "Луна (спутник)",
            "Война  и\nмир",
            "",
            "(только скобки)",
            "ЁЛКА.",
            "(Анна) Ахматова",
            ". всё объяснение",
            " .(",
        ];
        for sample in samples {
            let once = canonical_answer(sample);
            assert_eq!(canonical_answer(&once), once, "sample {sample:?}");
        }
    }

    #[test]
    fn comparison_ignores_case_spacing_and_explanation() {
        assert!(answers_match("Париж. столица Франции", "  ПАРИЖ  "));
        assert!(answers_match("  ПАРИЖ  ", "Париж. столица Франции"));
        assert!(answers_match("Война и мир", "война   И\nМИР."));
        assert!(!answers_match("Париж", "Лондон"));
        assert!(!answers_match("Париж", ""));
    }
}
