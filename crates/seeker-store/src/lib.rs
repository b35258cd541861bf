//! Registrant records and their photos.
//!
//! A single SQLite table holds the records; photos live as files in an
//! upload directory and the table stores their file names.

pub mod persons;
pub mod schema;
pub mod uploads;

pub use persons::{NewRegistrant, PersonStore, Registrant};
pub use uploads::Uploads;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("registrant {0} not found")]
    NotFound(i64),
    #[error("invalid photo file name: {0:?}")]
    InvalidPhotoName(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
