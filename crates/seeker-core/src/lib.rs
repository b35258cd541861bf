//! Face detection, encoding and registrant matching.
//!
//! Uses SCRFD for face detection and ArcFace for face encoding, both running
//! via ONNX Runtime for CPU inference. The matching loop is model-agnostic:
//! it only sees the [`FaceEncoder`] and [`Verifier`] traits.

pub mod alignment;
pub mod detector;
pub mod encoder;
pub mod matching;
pub mod photo;
pub mod recognizer;
pub mod types;

pub use detector::FaceDetector;
pub use encoder::{EncodeError, FaceEncoder, OnnxFaceEncoder};
pub use matching::{identify, Candidate, Identification};
pub use photo::{Photo, PhotoError};
pub use recognizer::FaceRecognizer;
pub use types::{BoundingBox, CosineVerifier, Embedding, EuclideanVerifier, Verification, Verifier};

use std::path::PathBuf;

/// Model directory: `$SEEKER_MODEL_DIR`, else `/usr/share/seeker/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("SEEKER_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/usr/share/seeker/models"))
}
