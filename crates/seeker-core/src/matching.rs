//! Linear search of a registrant gallery for the person in a probe photo.

use crate::encoder::{EncodeError, FaceEncoder};
use crate::photo::Photo;
use crate::types::Verifier;
use std::path::PathBuf;

/// A gallery entry: whatever identifies the person, plus their photo on disk.
#[derive(Debug, Clone)]
pub struct Candidate<T> {
    pub subject: T,
    pub photo: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Identification<T> {
    /// The probe photo contains no detectable face.
    NoFaceInProbe,
    /// First candidate, in gallery order, whose photo verified against the probe.
    Verified { subject: T, score: f32 },
    NotFound {
        /// Candidates whose photo produced an encoding and was compared.
        compared: usize,
        /// Candidates dropped because their photo was unreadable, faceless or failed to encode.
        skipped: usize,
    },
}

impl<T> Identification<T> {
    /// Add candidates that were dropped before the scan to the skipped count.
    pub fn with_skipped(self, extra: usize) -> Self {
        match self {
            Self::NotFound { compared, skipped } => Self::NotFound {
                compared,
                skipped: skipped + extra,
            },
            other => other,
        }
    }
}

/// Scan `candidates` in order and stop at the first verified face.
///
/// The probe is encoded once; failure there is returned. Failures on a
/// candidate photo are logged and the scan moves on.
pub fn identify<T, E, V>(
    encoder: &mut E,
    verifier: &V,
    probe: &Photo,
    candidates: impl IntoIterator<Item = Candidate<T>>,
) -> Result<Identification<T>, EncodeError>
where
    E: FaceEncoder + ?Sized,
    V: Verifier + ?Sized,
{
    let Some(unknown) = encoder.encode(probe)? else {
        return Ok(Identification::NoFaceInProbe);
    };

    let mut compared = 0;
    let mut skipped = 0;

    for candidate in candidates {
        let photo = match Photo::open(&candidate.photo) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(photo = %candidate.photo.display(), error = %e, "skipping candidate: photo unreadable");
                skipped += 1;
                continue;
            }
        };

        let known = match encoder.encode(&photo) {
            Ok(Some(embedding)) => embedding,
            Ok(None) => {
                tracing::debug!(photo = %candidate.photo.display(), "skipping candidate: no face in photo");
                skipped += 1;
                continue;
            }
            Err(e) => {
                tracing::warn!(photo = %candidate.photo.display(), error = %e, "skipping candidate: encoding failed");
                skipped += 1;
                continue;
            }
        };

        compared += 1;
        let verification = verifier.verify(&known, &unknown);
        tracing::debug!(
            photo = %candidate.photo.display(),
            score = verification.score,
            verified = verification.verified,
            "compared candidate"
        );

        if verification.verified {
            return Ok(Identification::Verified {
                subject: candidate.subject,
                score: verification.score,
            });
        }
    }

    Ok(Identification::NotFound { compared, skipped })
}
