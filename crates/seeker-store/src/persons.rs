use crate::{schema, Result, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;

/// A stored missing-person record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registrant {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub location: String,
    /// File name relative to the upload directory.
    pub photo: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRegistrant {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub location: String,
    pub photo: String,
}

const COLUMNS: &str = "id, name, age, gender, location, photo, registered_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Registrant> {
    Ok(Registrant {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        location: row.get(4)?,
        photo: row.get(5)?,
        registered_at: row.get(6)?,
    })
}

pub fn insert(conn: &Connection, new: &NewRegistrant) -> rusqlite::Result<Registrant> {
    let registered_at = Utc::now();
    conn.execute(
        "INSERT INTO persons (name, age, gender, location, photo, registered_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![new.name, new.age, new.gender, new.location, new.photo, registered_at],
    )?;
    Ok(Registrant {
        id: conn.last_insert_rowid(),
        name: new.name.clone(),
        age: new.age,
        gender: new.gender.clone(),
        location: new.location.clone(),
        photo: new.photo.clone(),
        registered_at,
    })
}

/// All registrants in registration order.
pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Registrant>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM persons ORDER BY id"))?;
    let rows = stmt.query_map([], from_row)?;
    rows.collect()
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Registrant>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM persons WHERE id = ?1"),
        [id],
        from_row,
    )
    .optional()
}

/// Delete a registrant and hand back the removed row.
pub fn remove(conn: &Connection, id: i64) -> rusqlite::Result<Option<Registrant>> {
    let Some(existing) = get(conn, id)? else {
        return Ok(None);
    };
    conn.execute("DELETE FROM persons WHERE id = ?1", [id])?;
    Ok(Some(existing))
}

pub fn count(conn: &Connection) -> rusqlite::Result<u64> {
    conn.query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))
}

/// Synchronous store over one SQLite connection.
pub struct PersonStore {
    conn: Connection,
}

impl PersonStore {
    /// Open (or create) the database file and bootstrap the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        schema::init(&conn)?;
        tracing::debug!(path = %path.display(), "person store opened");
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        Ok(Self { conn })
    }

    pub fn insert(&self, new: &NewRegistrant) -> Result<Registrant> {
        Ok(insert(&self.conn, new)?)
    }

    pub fn list(&self) -> Result<Vec<Registrant>> {
        Ok(list(&self.conn)?)
    }

    pub fn get(&self, id: i64) -> Result<Registrant> {
        get(&self.conn, id)?.ok_or(StoreError::NotFound(id))
    }

    pub fn remove(&self, id: i64) -> Result<Registrant> {
        remove(&self.conn, id)?.ok_or(StoreError::NotFound(id))
    }

    pub fn count(&self) -> Result<u64> {
        Ok(count(&self.conn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_person(name: &str, photo: &str) -> NewRegistrant {
        NewRegistrant {
            name: name.into(),
            age: 34,
            gender: "female".into(),
            location: "Harbour district".into(),
            photo: photo.into(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = PersonStore::in_memory().unwrap();
        let added = store.insert(&new_person("Ada", "ada.jpg")).unwrap();
        assert_eq!(added.id, 1);

        let fetched = store.get(added.id).unwrap();
        assert_eq!(fetched.name, "Ada");
        assert_eq!(fetched.age, 34);
        assert_eq!(fetched.photo, "ada.jpg");
        assert_eq!(fetched.registered_at, added.registered_at);
    }

    #[test]
    fn test_list_in_registration_order() {
        let store = PersonStore::in_memory().unwrap();
        for name in ["first", "second", "third"] {
            store.insert(&new_person(name, &format!("{name}.png"))).unwrap();
        }
        let names: Vec<String> = store.list().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_remove() {
        let store = PersonStore::in_memory().unwrap();
        let a = store.insert(&new_person("a", "a.png")).unwrap();
        let b = store.insert(&new_person("b", "b.png")).unwrap();

        let removed = store.remove(a.id).unwrap();
        assert_eq!(removed.photo, "a.png");
        assert!(matches!(store.get(a.id), Err(StoreError::NotFound(id)) if id == a.id));
        assert!(matches!(store.remove(a.id), Err(StoreError::NotFound(_))));
        assert_eq!(store.list().unwrap(), vec![b]);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = PersonStore::in_memory().unwrap();
        let a = store.insert(&new_person("a", "a.png")).unwrap();
        store.remove(a.id).unwrap();
        let b = store.insert(&new_person("b", "b.png")).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database").join("persons.db");
        {
            let store = PersonStore::open(&path).unwrap();
            store.insert(&new_person("kept", "kept.png")).unwrap();
        }
        let reopened = PersonStore::open(&path).unwrap();
        assert_eq!(reopened.list().unwrap()[0].name, "kept");
    }
}
