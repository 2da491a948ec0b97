//! Client storage binding and repository specialization.
//!
//! # Responsibility
//! - Map the client record onto its SQLite table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Column shape follows migration `0001_init.sql`.

use crate::model::client::{Client, ClientId};
use crate::model::ValidationError;
use crate::repo::entity_repo::{EntityBinding, SqliteRepository, StoreResult};
use rusqlite::{params, Connection, Row};

const CLIENT_SELECT_SQL: &str = "SELECT id, name, email FROM clients";

/// Client-facing repository handle.
///
/// Placeholder specialization: client-specific queries land here once they
/// exist.
pub type ClientRepository = SqliteRepository<Client>;

impl EntityBinding for Client {
    type Key = ClientId;

    fn key(&self) -> ClientId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Client::validate(self)
    }

    fn table() -> &'static str {
        "clients"
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO clients (id, name, email) VALUES (?1, ?2, ?3);",
            params![self.id, self.name.as_str(), self.email.as_deref()],
        )
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "UPDATE clients SET name = ?1, email = ?2 WHERE id = ?3;",
            params![self.name.as_str(), self.email.as_deref(), self.id],
        )
    }

    fn delete(conn: &Connection, key: &ClientId) -> rusqlite::Result<usize> {
        conn.execute("DELETE FROM clients WHERE id = ?1;", [*key])
    }

    fn exists(conn: &Connection, key: &ClientId) -> rusqlite::Result<bool> {
        let found: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM clients WHERE id = ?1);",
            [*key],
            |row| row.get(0),
        )?;
        Ok(found == 1)
    }

    fn fetch(conn: &Connection, key: &ClientId) -> StoreResult<Option<Client>> {
        let mut stmt = conn.prepare(&format!("{CLIENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([*key])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_client_row(row)?));
        }
        Ok(None)
    }

    fn fetch_all(conn: &Connection) -> StoreResult<Vec<Client>> {
        let mut stmt = conn.prepare(&format!("{CLIENT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut clients = Vec::new();

        while let Some(row) = rows.next()? {
            clients.push(parse_client_row(row)?);
        }

        Ok(clients)
    }
}

fn parse_client_row(row: &Row<'_>) -> StoreResult<Client> {
    Ok(Client {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
    })
}
