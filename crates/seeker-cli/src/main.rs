use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use seeker_core::{identify, Candidate, CosineVerifier, Identification, OnnxFaceEncoder, Photo};
use seeker_store::{NewRegistrant, PersonStore, Registrant, Uploads};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "seeker", about = "Missing person registry CLI", version)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "SEEKER_DB_PATH", default_value = "database/persons.db")]
    db: PathBuf,
    /// Directory holding registrant photos
    #[arg(long, global = true, env = "SEEKER_UPLOAD_DIR", default_value = "static/uploads")]
    uploads: PathBuf,
    /// Directory containing the ONNX face models
    #[arg(long, global = true, env = "SEEKER_MODEL_DIR")]
    models: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a missing person with a reference photo
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=150))]
        age: u32,
        #[arg(short, long, default_value = "")]
        gender: String,
        /// Where the person was last seen
        #[arg(short, long, default_value = "")]
        location: String,
        photo: PathBuf,
    },
    /// List registered persons
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Remove a registrant and their photo
    Remove { id: i64 },
    /// Search the registry for the person in a photo
    Find {
        photo: PathBuf,
        /// Minimum cosine similarity for a match
        #[arg(short, long, default_value_t = 0.40)]
        threshold: f32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = PersonStore::open(&cli.db)
        .with_context(|| format!("opening database {}", cli.db.display()))?;
    let uploads = Uploads::new(&cli.uploads)?;

    match cli.command {
        Commands::Register {
            name,
            age,
            gender,
            location,
            photo,
        } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                bail!("name is required");
            }
            let bytes = std::fs::read(&photo).with_context(|| format!("reading {}", photo.display()))?;
            Photo::decode(&bytes).with_context(|| format!("{} is not a readable image", photo.display()))?;

            let original = photo.file_name().and_then(|n| n.to_str()).unwrap_or("photo");
            let stored = uploads.save(original, &bytes)?;
            let added = match store.insert(&NewRegistrant {
                name,
                age,
                gender: gender.trim().to_string(),
                location: location.trim().to_string(),
                photo: stored.clone(),
            }) {
                Ok(added) => added,
                Err(e) => {
                    if let Err(cleanup) = uploads.remove(&stored) {
                        tracing::warn!(photo = %stored, error = %cleanup, "failed to remove orphaned photo");
                    }
                    return Err(e.into());
                }
            };
            println!("Registered #{} {} ({})", added.id, added.name, added.photo);
        }
        Commands::List { json } => {
            let persons = store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&persons)?);
            } else if persons.is_empty() {
                println!("No persons registered");
            } else {
                for p in &persons {
                    println!("{}", table_row(p));
                }
            }
        }
        Commands::Remove { id } => {
            let removed = store.remove(id)?;
            if let Err(e) = uploads.remove(&removed.photo) {
                tracing::warn!(id, error = %e, "photo file was not removed");
            }
            println!("Removed #{} {}", removed.id, removed.name);
        }
        Commands::Find { photo, threshold } => {
            let model_dir = cli.models.unwrap_or_else(seeker_core::default_model_dir);
            let probe = Photo::open(&photo)?;
            let mut encoder = OnnxFaceEncoder::from_model_dir(&model_dir)
                .with_context(|| format!("loading face models from {}", model_dir.display()))?;
            let (candidates, unusable) = gallery(&store, &uploads)?;
            let verifier = CosineVerifier { threshold };

            match identify(&mut encoder, &verifier, &probe, candidates)?.with_skipped(unusable) {
                Identification::Verified { subject, score } => {
                    println!("Match (similarity {score:.3})");
                    println!("{}", table_row(&subject));
                }
                Identification::NoFaceInProbe => println!("No face detected in {}", photo.display()),
                Identification::NotFound { compared, skipped } => {
                    println!("Person not found ({compared} compared, {skipped} skipped)")
                }
            }
        }
    }

    Ok(())
}

/// Every registrant with a usable photo name, plus how many were left out.
fn gallery(store: &PersonStore, uploads: &Uploads) -> Result<(Vec<Candidate<Registrant>>, usize)> {
    let mut out = Vec::new();
    let mut unusable = 0;
    for person in store.list()? {
        match uploads.path(&person.photo) {
            Ok(photo) => out.push(Candidate { subject: person, photo }),
            Err(e) => {
                tracing::warn!(id = person.id, error = %e, "skipping registrant");
                unusable += 1;
            }
        }
    }
    Ok((out, unusable))
}

fn table_row(p: &Registrant) -> String {
    format!(
        "{:>4}  {:<24} {:>3}  {:<8} {:<20} {}",
        p.id,
        p.name,
        p.age,
        dash(&p.gender),
        dash(&p.location),
        p.registered_at.format("%Y-%m-%d %H:%M"),
    )
}

fn dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}
