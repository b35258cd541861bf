use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, with optional facial landmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

/// Face encoding (512-dimensional for ArcFace).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Model version that produced this encoding (e.g., "w600k_r50").
    pub model_version: Option<String>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, model_version: None }
    }

    /// Cosine similarity in [-1, 1]. Higher = more similar; 0 when either vector is zero.
    pub fn similarity(&self, other: &Embedding) -> f32 {
        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self.values.iter().zip(other.values.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom > 0.0 { dot / denom } else { 0.0 }
    }

    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// Outcome of comparing two face encodings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verification {
    pub verified: bool,
    /// Similarity or distance, depending on the verifier.
    pub score: f32,
}

/// Decides whether two encodings belong to the same person.
pub trait Verifier {
    fn verify(&self, known: &Embedding, unknown: &Embedding) -> Verification;
}

/// Verified when cosine similarity reaches `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct CosineVerifier {
    pub threshold: f32,
}

impl Verifier for CosineVerifier {
    fn verify(&self, known: &Embedding, unknown: &Embedding) -> Verification {
        let score = known.similarity(unknown);
        Verification { verified: score >= self.threshold, score }
    }
}

/// Verified when Euclidean distance stays within `tolerance`.
///
/// For L2-normalized encodings, distance `d` and cosine similarity `s` are
/// related by `d = sqrt(2 - 2s)`.
#[derive(Debug, Clone, Copy)]
pub struct EuclideanVerifier {
    pub tolerance: f32,
}

impl Verifier for EuclideanVerifier {
    fn verify(&self, known: &Embedding, unknown: &Embedding) -> Verification {
        let score = known.euclidean_distance(unknown);
        Verification { verified: score <= self.tolerance, score }
    }
}

impl<V: Verifier + ?Sized> Verifier for Box<V> {
    fn verify(&self, known: &Embedding, unknown: &Embedding) -> Verification {
        (**self).verify(known, unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = Embedding::new(vec![1.0, 0.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0, 0.0]);
        assert!((a.similarity(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![0.0, 1.0]);
        assert!(a.similarity(&b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![-1.0, 0.0]);
        assert!((a.similarity(&b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0]);
        assert_eq!(a.similarity(&b), 0.0);
    }

    #[test]
    fn test_euclidean_distance() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![3.0, 4.0]);
        assert!((a.euclidean_distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_verifier() {
        let verifier = CosineVerifier { threshold: 0.999 };
        let a = Embedding::new(vec![0.6, 0.8]);
        let v = verifier.verify(&a, &a);
        assert!(v.verified, "identical encodings must verify");

        let b = Embedding::new(vec![0.8, 0.6]);
        let v = CosineVerifier { threshold: 0.99 }.verify(&a, &b);
        assert!(!v.verified);
        assert!((v.score - 0.96).abs() < 1e-5);
    }

    #[test]
    fn test_euclidean_verifier() {
        let verifier = EuclideanVerifier { tolerance: 0.5 };
        let a = Embedding::new(vec![1.0, 0.0]);
        let near = Embedding::new(vec![0.9, 0.1]);
        let far = Embedding::new(vec![0.0, 1.0]);

        assert!(verifier.verify(&a, &near).verified);
        let v = verifier.verify(&a, &far);
        assert!(!v.verified);
        assert!((v.score - 2f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_boxed_verifier_delegates() {
        let verifier: Box<dyn Verifier + Send> = Box::new(CosineVerifier { threshold: 0.5 });
        let a = Embedding::new(vec![1.0, 0.0]);
        assert!(verifier.verify(&a, &a).verified);
    }
}
