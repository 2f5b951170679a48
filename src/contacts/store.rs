//! SQLite storage for the `Contacts` table

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use serde_json::{Map, Number, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS Contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(100),
    rank VARCHAR(50),
    phone_number VARCHAR(15),
    address TEXT
);
";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A contact to insert; every field except the id is optional in the table
#[derive(Debug, Clone, Default)]
pub struct NewContact {
    pub name: Option<String>,
    pub rank: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

/// Thread-safe contacts database handle
#[derive(Clone)]
pub struct ContactStore {
    conn: Arc<Mutex<Connection>>,
}

impl ContactStore {
    /// Open or create the database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    #[allow(dead_code)] // Used in tests
    pub fn insert(&self, contact: &NewContact) -> StoreResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO Contacts (name, rank, phone_number, address) VALUES (?1, ?2, ?3, ?4)",
            params![
                contact.name,
                contact.rank,
                contact.phone_number,
                contact.address
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn count(&self) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM Contacts", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Run an already-validated SELECT and return each row as a JSON object
    /// keyed by column name
    pub fn run_select(&self, sql: &str) -> StoreResult<Vec<Map<String, Value>>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([])?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let mut object = Map::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                object.insert(column.clone(), json_value(row.get_ref(i)?));
            }
            results.push(object);
        }
        Ok(results)
    }
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<{} bytes>", bytes.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, rank: &str, phone: &str) -> NewContact {
        NewContact {
            name: Some(name.to_string()),
            rank: Some(rank.to_string()),
            phone_number: Some(phone.to_string()),
            address: None,
        }
    }

    #[test]
    fn test_insert_and_select() {
        let store = ContactStore::open_in_memory().unwrap();
        let id = store.insert(&contact("John Smith", "Colonel", "555-0100")).unwrap();
        store.insert(&contact("Mary Jones", "Captain", "555-0101")).unwrap();
        assert_eq!(id, 1);
        assert_eq!(store.count().unwrap(), 2);

        let rows = store
            .run_select("SELECT name, phone_number, address FROM Contacts WHERE rank LIKE '%Col%'")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], Value::from("John Smith"));
        assert_eq!(rows[0]["phone_number"], Value::from("555-0100"));
        assert_eq!(rows[0]["address"], Value::Null);
    }

    #[test]
    fn test_select_aggregate_and_aliases() {
        let store = ContactStore::open_in_memory().unwrap();
        store.insert(&contact("A B", "Major", "1")).unwrap();
        store.insert(&contact("C D", "Major", "2")).unwrap();

        let rows = store.run_select("SELECT COUNT(*) AS total FROM Contacts").unwrap();
        assert_eq!(rows[0]["total"], Value::from(2));

        let rows = store.run_select("SELECT rank, name FROM Contacts LIMIT 1").unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains_key("rank"));
        assert!(rows[0].contains_key("name"));
        assert!(!rows[0].contains_key("phone_number"));
    }

    #[test]
    fn test_bad_sql_is_store_error() {
        let store = ContactStore::open_in_memory().unwrap();
        assert!(matches!(
            store.run_select("SELECT nope FROM Contacts"),
            Err(StoreError::Sqlite(_))
        ));
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.db");
        {
            let store = ContactStore::open(&path).unwrap();
            store.insert(&contact("John Smith", "Colonel", "555-0100")).unwrap();
        }
        let store = ContactStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}
