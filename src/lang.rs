//! Language label → language code
//!
//! Choice labels are free text ("Spanish", "Español", "简体中文"). The code
//! sent to the translator comes from the explicit map first, then a
//! built-in table of names and endonyms, then the label's first two letters.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

use crate::error::{Result, SislocError};

static KNOWN_LANGUAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        // English
        ("english", "en"),
        ("en-us", "en-US"),
        ("us english", "en-US"),
        ("american english", "en-US"),
        ("en-gb", "en-GB"),
        ("british english", "en-GB"),
        ("uk english", "en-GB"),
        ("canadian english", "en-CA"),
        ("australian english", "en-AU"),
        // Spanish
        ("spanish", "es"),
        ("español", "es"),
        ("espanol", "es"),
        ("castellano", "es"),
        ("es-mx", "es-MX"),
        ("mexican spanish", "es-MX"),
        ("latin american spanish", "es-419"),
        // French
        ("french", "fr"),
        ("français", "fr"),
        ("francais", "fr"),
        ("canadian french", "fr-CA"),
        ("fr-ca", "fr-CA"),
        // Portuguese
        ("portuguese", "pt"),
        ("português", "pt"),
        ("portugues", "pt"),
        ("brazilian portuguese", "pt-BR"),
        ("pt-br", "pt-BR"),
        ("european portuguese", "pt-PT"),
        // Germanic
        ("german", "de"),
        ("deutsch", "de"),
        ("swiss german", "de-CH"),
        ("dutch", "nl"),
        ("nederlands", "nl"),
        ("flemish", "nl-BE"),
        ("vlaams", "nl-BE"),
        ("swedish", "sv"),
        ("svenska", "sv"),
        ("norwegian", "no"),
        ("norsk", "no"),
        ("bokmål", "nb"),
        ("nynorsk", "nn"),
        ("danish", "da"),
        ("dansk", "da"),
        ("icelandic", "is"),
        ("íslenska", "is"),
        // Romance, other
        ("italian", "it"),
        ("italiano", "it"),
        ("romanian", "ro"),
        ("română", "ro"),
        ("catalan", "ca"),
        ("català", "ca"),
        // Finno-Ugric and Baltic
        ("finnish", "fi"),
        ("suomi", "fi"),
        ("hungarian", "hu"),
        ("magyar", "hu"),
        ("estonian", "et"),
        ("eesti", "et"),
        ("latvian", "lv"),
        ("latviešu", "lv"),
        ("lithuanian", "lt"),
        ("lietuvių", "lt"),
        // Slavic
        ("polish", "pl"),
        ("polski", "pl"),
        ("czech", "cs"),
        ("čeština", "cs"),
        ("slovak", "sk"),
        ("slovenčina", "sk"),
        ("slovenian", "sl"),
        ("slovenščina", "sl"),
        ("bulgarian", "bg"),
        ("български", "bg"),
        ("serbian", "sr"),
        ("srpski", "sr"),
        ("српски", "sr"),
        ("croatian", "hr"),
        ("hrvatski", "hr"),
        ("bosnian", "bs"),
        ("macedonian", "mk"),
        ("ukrainian", "uk"),
        ("українська", "uk"),
        ("belarusian", "be"),
        ("russian", "ru"),
        ("русский", "ru"),
        // Mediterranean and Middle East
        ("greek", "el"),
        ("ελληνικά", "el"),
        ("albanian", "sq"),
        ("shqip", "sq"),
        ("turkish", "tr"),
        ("türkçe", "tr"),
        ("turkce", "tr"),
        ("arabic", "ar"),
        ("العربية", "ar"),
        ("persian", "fa"),
        ("farsi", "fa"),
        ("فارسی", "fa"),
        ("dari", "fa-AF"),
        ("pashto", "ps"),
        ("kurdish", "ku"),
        ("hebrew", "he"),
        ("עברית", "he"),
        ("yiddish", "yi"),
        // Caucasus and Central Asia
        ("armenian", "hy"),
        ("georgian", "ka"),
        ("azerbaijani", "az"),
        ("azeri", "az"),
        ("kazakh", "kk"),
        ("uzbek", "uz"),
        ("mongolian", "mn"),
        // South Asia
        ("hindi", "hi"),
        ("हिंदी", "hi"),
        ("urdu", "ur"),
        ("اردو", "ur"),
        ("bengali", "bn"),
        ("bangla", "bn"),
        ("punjabi", "pa"),
        ("gujarati", "gu"),
        ("marathi", "mr"),
        ("tamil", "ta"),
        ("தமிழ்", "ta"),
        ("telugu", "te"),
        ("kannada", "kn"),
        ("malayalam", "ml"),
        ("sinhala", "si"),
        ("nepali", "ne"),
        // Southeast Asia
        ("burmese", "my"),
        ("khmer", "km"),
        ("lao", "lo"),
        ("thai", "th"),
        ("ไทย", "th"),
        ("vietnamese", "vi"),
        ("tiếng việt", "vi"),
        ("tieng viet", "vi"),
        ("indonesian", "id"),
        ("bahasa indonesia", "id"),
        ("malay", "ms"),
        ("bahasa melayu", "ms"),
        ("filipino", "fil"),
        ("tagalog", "fil"),
        // East Asia
        ("japanese", "ja"),
        ("日本語", "ja"),
        ("korean", "ko"),
        ("한국어", "ko"),
        ("chinese", "zh"),
        ("中文", "zh"),
        ("simplified chinese", "zh-CN"),
        ("简体中文", "zh-CN"),
        ("traditional chinese", "zh-TW"),
        ("繁體中文", "zh-TW"),
        ("cantonese", "zh-HK"),
        ("粵語", "zh-HK"),
        // Africa
        ("afrikaans", "af"),
        ("swahili", "sw"),
        ("kiswahili", "sw"),
        ("amharic", "am"),
        ("somali", "so"),
        ("hausa", "ha"),
        ("yoruba", "yo"),
        ("igbo", "ig"),
        ("zulu", "zu"),
        ("xhosa", "xh"),
        // Americas and Pacific
        ("haitian creole", "ht"),
        ("kreyòl ayisyen", "ht"),
        ("maori", "mi"),
        ("te reo māori", "mi"),
        ("samoan", "sm"),
        ("tongan", "to"),
        ("fijian", "fj"),
    ]
    .into_iter()
    .collect()
});

/// Explicit label → code overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageMap {
    entries: BTreeMap<String, String>,
}

impl Default for LanguageMap {
    fn default() -> Self {
        Self {
            entries: [("English".to_string(), "en".to_string())].into(),
        }
    }
}

impl LanguageMap {
    /// Parse JSON object text (`{"Spanish":"es"}`) or CSV (`Spanish:es,French:fr`).
    /// Entries are merged over the default map.
    pub fn parse(text: &str) -> Result<Self> {
        let mut map = Self::default();
        let text = text.trim();
        if text.is_empty() {
            return Ok(map);
        }

        if text.starts_with('{') {
            let parsed: BTreeMap<String, serde_json::Value> =
                serde_json::from_str(text).map_err(|e| SislocError::Config {
                    reason: format!("language map is not a JSON object: {}", e),
                })?;
            for (label, code) in parsed {
                let code = match code {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                map.insert(label, code);
            }
            return Ok(map);
        }

        for part in text.split(',').filter(|p| !p.trim().is_empty()) {
            let Some((label, code)) = part.split_once(':') else {
                return Err(SislocError::Config {
                    reason: format!("language map entry '{}' is not 'Label:code'", part.trim()),
                });
            };
            map.insert(label, code);
        }
        Ok(map)
    }

    pub fn insert(&mut self, label: impl AsRef<str>, code: impl AsRef<str>) {
        let (label, code) = (label.as_ref().trim(), code.as_ref().trim());
        if !label.is_empty() && !code.is_empty() {
            self.entries.insert(label.to_string(), code.to_string());
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Code for a choice label, or `None` when nothing sensible can be inferred
    pub fn code_for(&self, label: &str) -> Option<String> {
        if let Some(code) = self.get(label) {
            return Some(code.to_string());
        }
        let normalized = label.trim().to_lowercase();
        if let Some(code) = KNOWN_LANGUAGES.get(normalized.as_str()) {
            return Some((*code).to_string());
        }
        let prefix: String = normalized.chars().take(2).collect();
        (prefix.chars().count() == 2).then_some(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_and_csv() {
        let json = LanguageMap::parse(r#"{"Spanish": "es-MX", "Klingon": "tlh"}"#).unwrap();
        assert_eq!(json.get("Spanish"), Some("es-MX"));
        assert_eq!(json.get("English"), Some("en"));

        let csv = LanguageMap::parse("Spanish:es, French : fr,").unwrap();
        assert_eq!(csv.get("French"), Some("fr"));
        assert_eq!(csv.len(), 3);

        assert!(LanguageMap::parse("Spanish=es").is_err());
        assert!(LanguageMap::parse("{not json").is_err());
    }

    #[test]
    fn test_explicit_entry_wins() {
        let map = LanguageMap::parse("Spanish:es-419").unwrap();
        assert_eq!(map.code_for("Spanish").as_deref(), Some("es-419"));
    }

    #[test]
    fn test_builtin_table() {
        let map = LanguageMap::default();
        assert_eq!(map.code_for("Español").as_deref(), Some("es"));
        assert_eq!(map.code_for(" Brazilian Portuguese ").as_deref(), Some("pt-BR"));
        assert_eq!(map.code_for("简体中文").as_deref(), Some("zh-CN"));
    }

    #[test]
    fn test_prefix_fallback_and_failure() {
        let map = LanguageMap::default();
        assert_eq!(map.code_for("Esperanto").as_deref(), Some("es"));
        assert_eq!(map.code_for("X"), None);
        assert_eq!(map.code_for(""), None);
    }
}
