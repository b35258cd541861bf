use seeker_core::{identify, Candidate, EncodeError, FaceEncoder, Identification, Photo, PhotoError, Verifier};
use seeker_store::Registrant;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("uploaded image is not readable: {0}")]
    Photo(#[from] PhotoError),
    #[error("face encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("engine thread exited")]
    ChannelClosed,
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Gallery = Vec<Candidate<Registrant>>;

/// Messages sent from HTTP handlers to the engine thread.
enum EngineRequest {
    Identify {
        probe: Vec<u8>,
        gallery: Gallery,
        reply: oneshot::Sender<Result<Identification<Registrant>, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Decode the probe photo and scan `gallery` for the person in it.
    pub async fn identify(
        &self,
        probe: Vec<u8>,
        gallery: Gallery,
    ) -> Result<Identification<Registrant>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Identify {
                probe,
                gallery,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// A handle whose engine thread has already exited.
    #[cfg(test)]
    pub(crate) fn disconnected() -> Self {
        let (tx, _rx) = mpsc::channel(1);
        Self { tx }
    }
}

/// Spawn the engine on a dedicated OS thread that owns the encoder.
///
/// Requests are served one at a time in arrival order.
pub fn spawn_engine<E, V>(mut encoder: E, verifier: V) -> Result<EngineHandle, EngineError>
where
    E: FaceEncoder + Send + 'static,
    V: Verifier + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(8);

    std::thread::Builder::new()
        .name("seeker-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Identify {
                        probe,
                        gallery,
                        reply,
                    } => {
                        let result = run_identify(&mut encoder, &verifier, &probe, gallery);
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}

fn run_identify<E: FaceEncoder, V: Verifier>(
    encoder: &mut E,
    verifier: &V,
    probe: &[u8],
    gallery: Gallery,
) -> Result<Identification<Registrant>, EngineError> {
    let started = std::time::Instant::now();
    let probe = Photo::decode(probe)?;
    let size = gallery.len();

    let outcome = identify(encoder, verifier, &probe, gallery)?;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        Identification::Verified { subject, score } => {
            tracing::info!(id = subject.id, score, gallery = size, elapsed_ms, "identify: verified");
        }
        Identification::NoFaceInProbe => {
            tracing::info!(elapsed_ms, "identify: no face in probe");
        }
        Identification::NotFound { compared, skipped } => {
            tracing::info!(compared, skipped, gallery = size, elapsed_ms, "identify: not found");
        }
    }
    Ok(outcome)
}
