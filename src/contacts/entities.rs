//! Rank and name extraction from a contacts question

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Rank patterns, most specific first. The first that matches wins.
static RANK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(lt\s*col|lieutenant\s*colonel)\b",
        r"\b(col|colonel)\b",
        r"\b(gen|general)\b",
        r"\b(maj|major)\b",
        r"\b(capt|captain)\b",
        r"\b(sgt|sergeant)(\s*maj|\s*major)?\b",
        r"\b(cpl|corporal)\b",
        r"\b(pvt|private)\b",
        r"\b(adm|admiral)\b",
        r"\b(cmdr|commander)\b",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).expect("rank pattern"))
    .collect()
});

/// Two or more consecutive capitalised words
static CAPITALISED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+)+)").expect("name pattern"));

static QUESTION_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(what|is|the|of|for|by|phone|number|address|contact)\b")
        .expect("question words pattern")
});

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(\{.*\})").expect("json object pattern"));

/// Rank and name a question is about, when it names someone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entities {
    pub rank: Option<String>,
    pub name: Option<String>,
}

impl Entities {
    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.rank.is_none() && self.name.is_none()
    }
}

/// Prompt asking the model for `{"rank", "name"}` JSON
pub fn extraction_prompt(question: &str) -> String {
    format!(
        r#"Extract the military rank and name from the following query:
"{question}"

Military ranks can appear in many forms, including:
- Full forms (e.g., "Lieutenant Colonel")
- Abbreviated forms (e.g., "Lt Col", "Capt", "Sgt Maj")
- With or without periods (e.g., "Lt." vs "Lt")

Respond in this exact JSON format only, with no additional text:
{{
    "rank": "extracted rank or null if none found",
    "name": "extracted name or null if none found"
}}

If no rank is detected, return null for rank.
If no name is detected, return null for name."#
    )
}

/// Parse the model's reply to [`extraction_prompt`].
///
/// Returns `None` when no JSON object can be found or parsed, so the caller
/// can fall back to [`extract_with_patterns`].
pub fn parse_model_entities(reply: &str) -> Option<Entities> {
    let json = JSON_OBJECT.captures(reply)?.get(1)?.as_str();
    let value: Value = serde_json::from_str(json).ok()?;
    Some(Entities {
        rank: entity_field(&value, "rank"),
        name: entity_field(&value, "name"),
    })
}

fn entity_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() && s != "null" => Some(s.clone()),
        _ => None,
    }
}

/// Pattern-based extraction used when the model is unavailable
pub fn extract_with_patterns(question: &str) -> Entities {
    let mut remainder = question.to_string();
    let mut rank = None;
    let lowered = question.to_lowercase();

    for pattern in RANK_PATTERNS.iter() {
        if let Some(found) = pattern.find(&lowered) {
            rank = Some(found.as_str().to_string());
            remainder = pattern.replace_all(&remainder, "").trim().to_string();
            break;
        }
    }

    let name = CAPITALISED_NAME
        .captures(&remainder)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            let stripped = QUESTION_WORDS.replace_all(&remainder, "");
            let words: Vec<&str> = stripped.split_whitespace().collect();
            (!words.is_empty()).then(|| words.join(" "))
        });

    Entities { rank, name }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_entities() {
        let reply = "Sure! {\"rank\": \"Lt Col\", \"name\": \"John Smith\"} hope that helps";
        assert_eq!(
            parse_model_entities(reply),
            Some(Entities {
                rank: Some("Lt Col".to_string()),
                name: Some("John Smith".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_model_entities_null_values() {
        let reply = r#"{"rank": null, "name": "null"}"#;
        assert_eq!(parse_model_entities(reply), Some(Entities::default()));
        let reply = r#"{"rank": "", "name": "Jane Roe"}"#;
        assert_eq!(
            parse_model_entities(reply),
            Some(Entities {
                rank: None,
                name: Some("Jane Roe".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_model_entities_garbage() {
        assert_eq!(parse_model_entities("no json here"), None);
        assert_eq!(parse_model_entities("{not: valid}"), None);
    }

    #[test]
    fn test_patterns_rank_and_capitalised_name() {
        let entities = extract_with_patterns("What is the phone number of Lt Col John Smith?");
        assert_eq!(entities.rank.as_deref(), Some("lt col"));
        assert_eq!(entities.name.as_deref(), Some("John Smith"));
    }

    #[test]
    fn test_patterns_specific_rank_first() {
        // "lieutenant colonel" must not be read as plain "colonel"
        let entities = extract_with_patterns("address for Lieutenant Colonel Mary Jones");
        assert_eq!(entities.rank.as_deref(), Some("lieutenant colonel"));
        assert_eq!(entities.name.as_deref(), Some("Mary Jones"));

        let entities = extract_with_patterns("call Sgt Tom Brown");
        assert_eq!(entities.rank.as_deref(), Some("sgt"));
        assert_eq!(entities.name.as_deref(), Some("Tom Brown"));
    }

    #[test]
    fn test_patterns_fallback_name_from_remaining_words() {
        let entities = extract_with_patterns("phone number of smith");
        assert_eq!(entities.rank, None);
        assert_eq!(entities.name.as_deref(), Some("smith"));
    }

    #[test]
    fn test_patterns_nothing_found() {
        let entities = extract_with_patterns("what is the phone number");
        assert!(entities.is_empty());
    }

    #[test]
    fn test_extraction_prompt_embeds_question() {
        let prompt = extraction_prompt("who is Capt Doe?");
        assert!(prompt.contains("\"who is Capt Doe?\""));
        assert!(prompt.contains("\"rank\": \"extracted rank or null if none found\""));
    }
}
