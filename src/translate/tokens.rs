//! Placeholder shielding and skip rules
//!
//! Template variables like `{{visitor.name}}`, `%HOST%` or `#company#` must
//! survive translation verbatim. They are swapped for `[[T0]]`, `[[T1]]`, …
//! before the provider sees the text and put back afterwards.

use once_cell::sync::Lazy;
use regex::Regex;

/// Applied in this order; earlier patterns number their placeholders first
static TOKEN_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"\{\{[^}]+\}\}").unwrap(),
        Regex::new(r"%[A-Za-z0-9_]+%").unwrap(),
        Regex::new(r"#[^#]+#").unwrap(),
    ]
});

static PLACEHOLDERS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\[\[T\d+\]\])+$").unwrap());

static MOCK_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([A-Za-z]{2}(?:-[A-Za-z]{2})?)\]\s+").unwrap());

/// Replace tokens with numbered placeholders. Returns the shielded text and
/// `(placeholder, original)` pairs.
pub fn extract_tokens(text: &str) -> (String, Vec<(String, String)>) {
    let mut placeholders = Vec::new();
    let mut shielded = text.to_string();
    for pattern in TOKEN_PATTERNS.iter() {
        shielded = pattern
            .replace_all(&shielded, |caps: &regex::Captures| {
                let key = format!("[[T{}]]", placeholders.len());
                placeholders.push((key.clone(), caps[0].to_string()));
                key
            })
            .into_owned();
    }
    (shielded, placeholders)
}

pub fn restore_tokens(text: &str, placeholders: &[(String, String)]) -> String {
    placeholders
        .iter()
        .fold(text.to_string(), |acc, (key, original)| acc.replace(key, original))
}

/// Remove a leading `"[<code>] "` left by an earlier mock run, only when the
/// code matches the target language.
pub fn strip_mock_prefix<'a>(text: &'a str, target: &str) -> &'a str {
    match MOCK_PREFIX.captures(text) {
        Some(caps) if caps[1].eq_ignore_ascii_case(target) => &text[caps[0].len()..],
        _ => text,
    }
}

pub fn looks_like_url_or_html(text: &str) -> bool {
    text.contains("http://")
        || text.contains("https://")
        || (text.contains('<') && text.contains('>'))
}

/// Blank, or nothing but placeholder tokens
pub fn is_only_tokens_or_whitespace(text: &str) -> bool {
    if text.trim().is_empty() {
        return true;
    }
    let (shielded, _) = extract_tokens(text);
    let leftover: String = shielded.chars().filter(|c| *c != ' ' && *c != '\n').collect();
    PLACEHOLDERS_ONLY.is_match(&leftover)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_and_restore() {
        let (shielded, tokens) = extract_tokens("Hi {{visitor.name}}, %HOST% is at #desk#");
        assert_eq!(shielded, "Hi [[T0]], [[T1]] is at [[T2]]");
        assert_eq!(tokens.len(), 3);
        assert_eq!(
            restore_tokens("Hola [[T0]], [[T1]] está en [[T2]]", &tokens),
            "Hola {{visitor.name}}, %HOST% está en #desk#"
        );
    }

    #[test]
    fn test_text_without_tokens_is_untouched() {
        let (shielded, tokens) = extract_tokens("Welcome");
        assert_eq!(shielded, "Welcome");
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_strip_mock_prefix_only_for_matching_code() {
        assert_eq!(strip_mock_prefix("[es] Welcome", "es"), "Welcome");
        assert_eq!(strip_mock_prefix("[ES] Welcome", "es"), "Welcome");
        assert_eq!(strip_mock_prefix("[fr] Welcome", "es"), "[fr] Welcome");
        assert_eq!(strip_mock_prefix("[pt-BR] Olá", "pt-br"), "Olá");
        assert_eq!(strip_mock_prefix("[note] keep", "es"), "[note] keep");
    }

    #[test]
    fn test_skip_rules() {
        assert!(looks_like_url_or_html("See https://example.com"));
        assert!(looks_like_url_or_html("<b>Bold</b>"));
        assert!(!looks_like_url_or_html("a < b"));

        assert!(is_only_tokens_or_whitespace("   "));
        assert!(is_only_tokens_or_whitespace("{{name}} %HOST%"));
        assert!(!is_only_tokens_or_whitespace("Hello {{name}}"));
    }
}
