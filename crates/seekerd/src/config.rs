use seeker_core::{CosineVerifier, EuclideanVerifier, Verifier};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "seeker.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// How two face encodings are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyMetric {
    Cosine,
    Euclidean,
}

impl FromStr for VerifyMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" => Ok(Self::Euclidean),
            other => Err(format!("unknown verify metric {other:?}")),
        }
    }
}

/// Service configuration: defaults, then `seeker.toml`, then `SEEKER_*` variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listen address (default: 127.0.0.1:5000).
    pub bind: SocketAddr,
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Directory where registrant photos are stored and served from.
    pub upload_dir: PathBuf,
    /// Directory containing det_10g.onnx and w600k_r50.onnx.
    pub model_dir: PathBuf,
    pub verify_metric: VerifyMetric,
    /// Minimum cosine similarity for a verified match.
    pub similarity_threshold: f32,
    /// Maximum Euclidean distance for a verified match.
    pub distance_tolerance: f32,
    /// Request body limit for uploads.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            db_path: PathBuf::from("database/persons.db"),
            upload_dir: PathBuf::from("static/uploads"),
            model_dir: seeker_core::default_model_dir(),
            verify_metric: VerifyMetric::Cosine,
            similarity_threshold: 0.40,
            distance_tolerance: 1.10,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load from `$SEEKER_CONFIG` (must exist) or `./seeker.toml` (optional),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("SEEKER_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Override fields from `SEEKER_*` variables. Unparseable values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        override_parsed(&lookup, "SEEKER_BIND", &mut self.bind);
        override_parsed(&lookup, "SEEKER_DB_PATH", &mut self.db_path);
        override_parsed(&lookup, "SEEKER_UPLOAD_DIR", &mut self.upload_dir);
        override_parsed(&lookup, "SEEKER_MODEL_DIR", &mut self.model_dir);
        override_parsed(&lookup, "SEEKER_VERIFY_METRIC", &mut self.verify_metric);
        override_parsed(&lookup, "SEEKER_SIMILARITY_THRESHOLD", &mut self.similarity_threshold);
        override_parsed(&lookup, "SEEKER_DISTANCE_TOLERANCE", &mut self.distance_tolerance);
        override_parsed(&lookup, "SEEKER_MAX_UPLOAD_BYTES", &mut self.max_upload_bytes);
    }

    pub fn verifier(&self) -> Box<dyn Verifier + Send> {
        match self.verify_metric {
            VerifyMetric::Cosine => Box::new(CosineVerifier {
                threshold: self.similarity_threshold,
            }),
            VerifyMetric::Euclidean => Box::new(EuclideanVerifier {
                tolerance: self.distance_tolerance,
            }),
        }
    }
}

fn override_parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.parse() {
        Ok(v) => *slot = v,
        Err(_) => tracing::warn!(key, value = %raw, "ignoring unparseable config value"),
    }
}
