//! Guarding of LLM-written SQL
//!
//! The model is asked for a read-only query against `Contacts`, but its
//! output is untrusted. Everything here is plain string inspection on the
//! query text; nothing reaches SQLite until `validate_and_sanitize_sql`
//! accepts it.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const MAX_ROWS: u64 = 10;

const ALLOWED_TABLES: &[&str] = &["contacts"];
const VALID_COLUMNS: &[&str] = &["id", "name", "rank", "phone_number", "address", "*"];
const AGGREGATES: &[&str] = &["count", "sum", "avg", "min", "max"];

const DANGEROUS_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "create", "truncate", "rename",
    "replace", "exec", "execute", "xp_", "sp_", "syscolumns", "information_schema",
    "--", ";--", "/*", "union", "into outfile", "load_file",
];

// Lazy so the first clause keyword ends the table list
static FROM_TABLES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)from\s+([a-zA-Z0-9_,\s]+?)\s*(?:where|group by|having|order by|limit|;|$)")
        .expect("table list pattern")
});
static FUNCTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-zA-Z0-9_]+)\s*\(").expect("function name pattern"));
static FUNCTION_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([a-zA-Z0-9_*]+)\)").expect("function argument pattern"));
static LIMIT_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)limit\s+(\d+)").expect("limit pattern"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SqlGuardError {
    #[error("Only SELECT queries are allowed")]
    NotSelect,
    #[error("Unsafe SQL detected: {0} operations are not allowed")]
    Unsafe(&'static str),
    #[error("Could not identify target tables in the query")]
    NoTables,
    #[error("Unauthorized table in query: {0}")]
    UnauthorizedTable(String),
    #[error("Could not identify selected columns in the query")]
    NoColumns,
    #[error("Invalid column referenced: {0}")]
    InvalidColumn(String),
}

/// Strip markdown fencing the model added despite being told not to.
///
/// A leading fence drops its first line (the language tag) and everything
/// from the last fence on; any stray backticks left after that are removed.
pub fn clean_sql_query(raw: &str) -> String {
    let mut sql = raw.trim();
    if sql.starts_with("```") {
        if let Some(first_line_end) = sql.find('\n') {
            if let Some(code) = sql
                .rfind("```")
                .filter(|&code_end| code_end > first_line_end)
                .and_then(|code_end| sql.get(first_line_end + 1..code_end))
            {
                sql = code.trim();
            }
        }
    }
    sql.replace('`', "")
}

/// Make sure extracted rank/name filters appear in the query.
///
/// Conditions are spliced in textually in front of an existing `WHERE`, or
/// as a new `WHERE` before `LIMIT`. Queries with neither are left alone.
pub fn ensure_entities_in_query(sql: &str, rank: Option<&str>, name: Option<&str>) -> String {
    let mut sql = sql.to_string();
    let mut sql_upper = sql.to_uppercase();

    if (rank.is_some() || name.is_some()) && !sql_upper.contains("WHERE") && sql_upper.contains("LIMIT") {
        sql = sql.replace("LIMIT", "WHERE 1=1 LIMIT");
        sql_upper = sql.to_uppercase();
    }

    for (column, value) in [("rank", rank), ("name", name)] {
        let Some(value) = value else { continue };
        if sql.to_lowercase().contains(column) {
            continue;
        }
        let escaped = value.replace('\'', "''");
        let condition = format!("{column} LIKE '%{escaped}%'");
        if sql_upper.contains("WHERE") {
            sql = sql.replace("WHERE", &format!("WHERE {condition} AND"));
        } else if sql_upper.contains("LIMIT") {
            sql = sql.replace("LIMIT", &format!("WHERE {condition} LIMIT"));
        }
    }

    sql
}

/// Reject anything but a bounded read of known columns from `Contacts`, and
/// cap the row count at [`MAX_ROWS`].
pub fn validate_and_sanitize_sql(sql: &str) -> Result<String, SqlGuardError> {
    let sql = sql.trim();
    let sql_lower = sql.to_lowercase();

    if !sql_lower.starts_with("select") {
        return Err(SqlGuardError::NotSelect);
    }

    let padded = format!(" {sql_lower} ");
    for &keyword in DANGEROUS_KEYWORDS {
        if padded.contains(&format!(" {keyword} ")) || sql_lower.starts_with(&format!("{keyword} ")) {
            return Err(SqlGuardError::Unsafe(keyword));
        }
    }

    let tables = FROM_TABLES
        .captures(&sql_lower)
        .and_then(|c| c.get(1))
        .ok_or(SqlGuardError::NoTables)?;
    for table in tables.as_str().split(',').map(str::trim) {
        if !ALLOWED_TABLES.contains(&table) {
            return Err(SqlGuardError::UnauthorizedTable(table.to_string()));
        }
    }

    for column in selected_columns(&sql_lower)? {
        if column != "*" && !VALID_COLUMNS.contains(&column.as_str()) {
            return Err(SqlGuardError::InvalidColumn(column));
        }
    }

    Ok(enforce_limit(sql, &sql_lower))
}

/// Column names from the select list. Aggregates unwrap to their argument
/// and `AS` aliases are dropped; other function calls keep the function name
/// so they fail the column check.
fn selected_columns(sql_lower: &str) -> Result<Vec<String>, SqlGuardError> {
    let section = sql_lower
        .split("select ")
        .nth(1)
        .and_then(|rest| rest.split(" from ").next())
        .ok_or(SqlGuardError::NoColumns)?;

    if section.trim() == "*" {
        return Ok(vec!["*".to_string()]);
    }

    let mut columns = Vec::new();
    for item in section.split(',') {
        let mut column = item.trim().to_string();
        if column.contains('(') {
            let function = FUNCTION_NAME.captures(&column).and_then(|c| c.get(1));
            match function {
                Some(f) if !AGGREGATES.contains(&f.as_str()) => {
                    column = f.as_str().to_string();
                }
                _ => {
                    if let Some(arg) = FUNCTION_ARG.captures(&column).and_then(|c| c.get(1)) {
                        column = arg.as_str().to_string();
                    }
                }
            }
        }
        if let Some((before_alias, _)) = column.split_once(" as ") {
            column = before_alias.trim().to_string();
        }
        columns.push(column);
    }
    Ok(columns)
}

fn enforce_limit(sql: &str, sql_lower: &str) -> String {
    if !sql_lower.contains("limit") {
        return match sql.strip_suffix(';') {
            Some(body) => format!("{body} LIMIT {MAX_ROWS};"),
            None => format!("{sql} LIMIT {MAX_ROWS}"),
        };
    }

    let too_large = LIMIT_VALUE
        .captures(sql_lower)
        .and_then(|c| c.get(1))
        // Anything that overflows u64 is certainly too large
        .is_some_and(|v| v.as_str().parse::<u64>().map_or(true, |n| n > MAX_ROWS));

    if too_large {
        LIMIT_VALUE
            .replace_all(sql, format!("LIMIT {MAX_ROWS}").as_str())
            .into_owned()
    } else {
        sql.to_string()
    }
}
