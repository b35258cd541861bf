use crate::detector::{DetectorError, FaceDetector};
use crate::photo::Photo;
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::Embedding;
use std::path::Path;
use thiserror::Error;

pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";
pub const RECOGNIZER_MODEL_FILE: &str = "w600k_r50.onnx";

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// Turns a photo into the encoding of its most prominent face.
pub trait FaceEncoder {
    /// `Ok(None)` when the photo contains no face.
    fn encode(&mut self, photo: &Photo) -> Result<Option<Embedding>, EncodeError>;
}

impl<E: FaceEncoder + ?Sized> FaceEncoder for Box<E> {
    fn encode(&mut self, photo: &Photo) -> Result<Option<Embedding>, EncodeError> {
        (**self).encode(photo)
    }
}

/// SCRFD detection followed by ArcFace recognition.
pub struct OnnxFaceEncoder {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxFaceEncoder {
    pub fn load(detector_path: &str, recognizer_path: &str) -> Result<Self, EncodeError> {
        let detector = FaceDetector::load(detector_path)?;
        let recognizer = FaceRecognizer::load(recognizer_path)?;
        Ok(Self { detector, recognizer })
    }

    /// Load both models by their standard file names from `dir`.
    pub fn from_model_dir(dir: &Path) -> Result<Self, EncodeError> {
        let path = |file: &str| dir.join(file).to_string_lossy().into_owned();
        Self::load(&path(DETECTOR_MODEL_FILE), &path(RECOGNIZER_MODEL_FILE))
    }
}

impl FaceEncoder for OnnxFaceEncoder {
    fn encode(&mut self, photo: &Photo) -> Result<Option<Embedding>, EncodeError> {
        let faces = self.detector.detect(photo)?;
        let Some(face) = faces.first() else {
            return Ok(None);
        };
        tracing::debug!(
            faces = faces.len(),
            confidence = face.confidence,
            "encoding most confident face"
        );
        Ok(Some(self.recognizer.extract(photo, face)?))
    }
}
