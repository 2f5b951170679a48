//! Prompt for turning a contacts question into SQL

use super::entities::Entities;
use std::fmt::Write;

const SCHEMA_CONTEXT: &str = "Table: Contacts
Columns:
- id (INT, PRIMARY KEY, AUTO_INCREMENT)
- name (VARCHAR(100))
- rank (VARCHAR(50))
- phone_number (VARCHAR(15))
- address (TEXT)";

const SECURITY_CONSTRAINTS: &str = r#"
CRITICAL SECURITY CONSTRAINTS:
- You MUST use ONLY SELECT statements
- You MUST ONLY query the Contacts table
- You MUST ONLY reference columns that exist in the schema (id, name, rank, phone_number, address)
- You MUST include a "LIMIT 10" clause at the end of your query
- You MUST NOT use any DDL or DML commands (CREATE, INSERT, UPDATE, DELETE, DROP, ALTER, etc.)

Return ONLY the raw SQL query with NO markdown formatting, NO backticks, and NO explanations.
"#;

/// Build the SQL generation prompt, steering the model towards `LIKE`
/// filters on any rank or name already extracted from the question
pub fn sql_prompt(question: &str, entities: &Entities) -> String {
    let mut prompt = format!(
        "Given the following database schema:\n{SCHEMA_CONTEXT}\n\n\
         Generate a SQL query to answer this question: \"{question}\"\n\n\
         ADDITIONAL INFORMATION:\n"
    );

    match (&entities.rank, &entities.name) {
        (Some(rank), Some(name)) => {
            let _ = write!(
                prompt,
                "- I've identified that the user is looking for someone with:\n  \
                 * Rank: \"{rank}\"\n  \
                 * Name: \"{name}\"\n\
                 - Use LIKE conditions for both rank and name to allow for partial matches\n\
                 - For example: WHERE rank LIKE '%{rank}%' AND name LIKE '%{name}%'\n"
            );
        }
        (Some(rank), None) => {
            let _ = write!(
                prompt,
                "- I've identified that the user is looking for someone with rank: \"{rank}\"\n\
                 - Use a LIKE condition: WHERE rank LIKE '%{rank}%'\n"
            );
        }
        (None, Some(name)) => {
            let _ = write!(
                prompt,
                "- I've identified that the user is looking for someone with name: \"{name}\"\n\
                 - Use a LIKE condition: WHERE name LIKE '%{name}%'\n"
            );
        }
        (None, None) => {}
    }

    prompt.push_str(SECURITY_CONSTRAINTS);
    prompt
}
