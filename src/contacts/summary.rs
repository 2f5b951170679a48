//! Natural-language rendering of contact query results

use serde_json::{Map, Value};
use std::fmt::Write;

/// Row count at which the result list is assumed to be truncated by `LIMIT`
const TRUNCATED_ROWS: usize = 10;

/// Which contact fields to list for a multi-row answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldSelection {
    rank: bool,
    phone: bool,
    address: bool,
}

impl FieldSelection {
    /// Fields the question asks about, or all of them if it names none
    fn for_question(question: &str) -> Self {
        let q = question.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| q.contains(w));
        let selection = Self {
            rank: mentions(&["rank", "position"]),
            phone: mentions(&["phone", "contact", "call"]),
            address: mentions(&["address", "location", "where"]),
        };
        if selection.rank || selection.phone || selection.address {
            selection
        } else {
            Self {
                rank: true,
                phone: true,
                address: true,
            }
        }
    }
}

/// Describe query results as a sentence or a numbered list
pub fn summarize(question: &str, rows: &[Map<String, Value>]) -> String {
    match rows {
        [] => format!(
            "I searched for information about {question}, but couldn't find any matching records in the database."
        ),
        [row] if row.contains_key("name") => single_contact(row),
        _ => contact_list(question, rows),
    }
}

fn single_contact(row: &Map<String, Value>) -> String {
    let mut out = String::from("I found one contact that matches your query. ");
    out.push_str(&display(&row["name"]));
    if let Some(rank) = row.get("rank") {
        let _ = write!(out, " has the rank of {}.", display(rank));
    }
    if let Some(phone) = row.get("phone_number") {
        let _ = write!(out, " Their phone number is {}.", display(phone));
    }
    if let Some(address) = row.get("address") {
        let _ = write!(out, " They are located at {}.", display(address));
    }
    out
}

fn contact_list(question: &str, rows: &[Map<String, Value>]) -> String {
    let fields = FieldSelection::for_question(question);
    let mut out = format!("I found {} contacts that match your query:", rows.len());
    if rows.len() == TRUNCATED_ROWS {
        out.push_str(" (showing up to 10 results)");
    }

    for (i, row) in rows.iter().enumerate() {
        let name = row.get("name").map_or_else(|| "Unknown".to_string(), display);
        let _ = write!(out, "\n\n{}. {name}", i + 1);
        if fields.rank {
            if let Some(rank) = row.get("rank") {
                let _ = write!(out, " - {}", display(rank));
            }
        }
        if fields.phone {
            if let Some(phone) = row.get("phone_number") {
                let _ = write!(out, "\n   Phone: {}", display(phone));
            }
        }
        if fields.address {
            if let Some(address) = row.get("address") {
                let _ = write!(out, "\n   Address: {}", display(address));
            }
        }
    }
    out
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_no_rows() {
        assert_eq!(
            summarize("Capt Doe", &[]),
            "I searched for information about Capt Doe, but couldn't find any matching records in the database."
        );
    }

    #[test]
    fn test_single_row_sentence() {
        let rows = [row(json!({
            "name": "John Smith",
            "rank": "Colonel",
            "phone_number": "555-0100",
            "address": null
        }))];
        assert_eq!(
            summarize("phone of Col Smith", &rows),
            "I found one contact that matches your query. John Smith has the rank of Colonel. \
             Their phone number is 555-0100. They are located at None."
        );
    }

    #[test]
    fn test_single_row_only_selected_columns() {
        let rows = [row(json!({"name": "John Smith", "phone_number": "555-0100"}))];
        assert_eq!(
            summarize("phone of Smith", &rows),
            "I found one contact that matches your query. John Smith Their phone number is 555-0100."
        );
    }

    #[test]
    fn test_single_row_without_name_is_listed() {
        let rows = [row(json!({"total": 3}))];
        assert_eq!(
            summarize("how many?", &rows),
            "I found 1 contacts that match your query:\n\n1. Unknown"
        );
    }

    #[test]
    fn test_list_follows_question_keywords() {
        let rows = [
            row(json!({"name": "A", "rank": "Major", "phone_number": "1", "address": "X"})),
            row(json!({"name": "B", "rank": "Major", "phone_number": "2", "address": "Y"})),
        ];
        assert_eq!(
            summarize("phone numbers of majors", &rows),
            "I found 2 contacts that match your query:\n\n1. A\n   Phone: 1\n\n2. B\n   Phone: 2"
        );
        assert_eq!(
            summarize("list majors", &rows),
            "I found 2 contacts that match your query:\
             \n\n1. A - Major\n   Phone: 1\n   Address: X\
             \n\n2. B - Major\n   Phone: 2\n   Address: Y"
        );
    }

    #[test]
    fn test_ten_rows_notes_truncation() {
        let rows: Vec<_> = (0..10).map(|i| row(json!({"name": format!("N{i}")}))).collect();
        let summary = summarize("everyone", &rows);
        assert!(summary.starts_with(
            "I found 10 contacts that match your query: (showing up to 10 results)\n\n1. N0"
        ));
        assert!(summary.ends_with("\n\n10. N9"));
    }
}
