use rusqlite::Connection;

const CREATE_PERSONS: &str = "
    CREATE TABLE IF NOT EXISTS persons (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        name          TEXT    NOT NULL,
        age           INTEGER NOT NULL,
        gender        TEXT    NOT NULL,
        location      TEXT    NOT NULL,
        photo         TEXT    NOT NULL,
        registered_at TEXT    NOT NULL
    )";

/// Create the `persons` table if it does not exist yet.
pub fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_PERSONS)?;
    tracing::debug!("persons schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn).unwrap();
        init(&conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'persons'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }
}
