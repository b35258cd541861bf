//! Multipart form parsing and registration validation.

use crate::error::AppError;
use axum::body::Bytes;
use axum::extract::Multipart;
use std::collections::HashMap;

const MAX_AGE: u32 = 150;

/// A file part of a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied file name; empty when the file input was left blank.
    pub file_name: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn is_empty(&self) -> bool {
        self.file_name.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct FormData {
    texts: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl FormData {
    /// Drain a multipart body. Parts with a file name are files, the rest text.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    form.files.insert(name, Upload { file_name, bytes });
                }
                None => {
                    let text = field.text().await?;
                    form.texts.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> &str {
        self.texts.get(name).map(String::as_str).unwrap_or("")
    }

    /// The named file, unless it is missing or was submitted blank.
    pub fn file(&self, name: &str) -> Option<&Upload> {
        self.files.get(name).filter(|u| !u.is_empty())
    }

    #[cfg(test)]
    pub fn with_text(mut self, name: &str, value: &str) -> Self {
        self.texts.insert(name.into(), value.into());
        self
    }

    #[cfg(test)]
    pub fn with_file(mut self, name: &str, file_name: &str, bytes: &'static [u8]) -> Self {
        self.files.insert(
            name.into(),
            Upload { file_name: file_name.into(), bytes: Bytes::from_static(bytes) },
        );
        self
    }
}

/// A registration submission that passed validation.
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub location: String,
    pub photo: Upload,
}

impl Registration {
    /// Validate the `/database` form. The error is a message for the operator.
    pub fn from_form(form: &FormData) -> Result<Self, String> {
        let name = form.text("name").trim();
        if name.is_empty() {
            return Err("name is required".into());
        }

        let raw_age = form.text("age").trim();
        let age = match raw_age.parse::<u32>() {
            Ok(age) if age <= MAX_AGE => age,
            _ => return Err(format!("age must be a whole number between 0 and {MAX_AGE}")),
        };

        let photo = form.file("photo").ok_or("a photo is required")?.clone();

        Ok(Self {
            name: name.to_string(),
            age,
            gender: form.text("gender").trim().to_string(),
            location: form.text("location").trim().to_string(),
            photo,
        })
    }
}
