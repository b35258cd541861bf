use crate::api;
use crate::config::Config;
use crate::engine::{EngineHandle, Gallery};
use crate::error::AppError;
use crate::forms::{FormData, Registration};
use crate::views::{self, Notice, SearchResult};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use seeker_core::{Candidate, Identification, Photo};
use seeker_store::uploads::sanitize_filename;
use seeker_store::{persons, NewRegistrant, Registrant, Uploads};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: tokio_rusqlite::Connection,
    pub uploads: Uploads,
    pub engine: EngineHandle,
}

pub fn router(state: AppState) -> Router {
    let photos = ServeDir::new(state.uploads.dir());
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/about", get(about))
        .route("/database", get(database).post(register))
        .route("/database/{id}/delete", post(remove))
        .route("/dashboard", get(dashboard).post(search))
        .route("/api/status", get(api::status))
        .route("/api/persons", get(api::list_persons))
        .route("/api/identify", post(api::identify))
        .nest_service("/static/uploads", photos)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<String> {
    Html(views::index())
}

async fn about() -> Html<String> {
    Html(views::about())
}

pub(crate) async fn list_registrants(state: &AppState) -> Result<Vec<Registrant>, AppError> {
    Ok(state.db.call(|conn| Ok(persons::list(conn)?)).await?)
}

async fn render_database(
    state: &AppState,
    status: StatusCode,
    notice: Option<Notice>,
) -> Result<Response, AppError> {
    let persons = list_registrants(state).await?;
    Ok((status, Html(views::database(&persons, notice.as_ref()))).into_response())
}

async fn database(State(state): State<AppState>) -> Result<Response, AppError> {
    render_database(&state, StatusCode::OK, None).await
}

async fn register(State(state): State<AppState>, multipart: Multipart) -> Result<Response, AppError> {
    let form = FormData::read(multipart).await?;
    let reg = match Registration::from_form(&form) {
        Ok(reg) => reg,
        Err(msg) => {
            tracing::debug!(reason = %msg, "registration rejected");
            return render_database(&state, StatusCode::BAD_REQUEST, Some(Notice::Error(msg))).await;
        }
    };

    if sanitize_filename(&reg.photo.file_name).is_none() {
        let msg = format!("photo file name {:?} has no usable characters", reg.photo.file_name);
        return render_database(&state, StatusCode::BAD_REQUEST, Some(Notice::Error(msg))).await;
    }

    if !decodes(reg.photo.bytes.clone()).await? {
        let msg = "uploaded photo is not a readable image".to_string();
        return render_database(&state, StatusCode::BAD_REQUEST, Some(Notice::Error(msg))).await;
    }

    let uploads = state.uploads.clone();
    let photo = reg.photo;
    let stored = tokio::task::spawn_blocking(move || uploads.save(&photo.file_name, &photo.bytes)).await??;

    let new = NewRegistrant {
        name: reg.name,
        age: reg.age,
        gender: reg.gender,
        location: reg.location,
        photo: stored.clone(),
    };
    let added = match state.db.call(move |conn| Ok(persons::insert(conn, &new)?)).await {
        Ok(added) => added,
        Err(e) => {
            if let Err(cleanup) = state.uploads.remove(&stored) {
                tracing::warn!(photo = %stored, error = %cleanup, "failed to remove orphaned photo");
            }
            return Err(e.into());
        }
    };

    tracing::info!(id = added.id, name = %added.name, photo = %added.photo, "registrant added");
    let notice = Notice::Info(format!("Registered {}.", added.name));
    render_database(&state, StatusCode::OK, Some(notice)).await
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response, AppError> {
    let removed = state
        .db
        .call(move |conn| Ok(persons::remove(conn, id)?))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("registrant {id} not found")))?;

    let uploads = state.uploads.clone();
    let photo = removed.photo.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || uploads.remove(&photo)).await? {
        tracing::warn!(id, photo = %removed.photo, error = %e, "registrant removed but photo was not");
    }
    tracing::info!(id, name = %removed.name, "registrant removed");
    Ok(Redirect::to("/database").into_response())
}

async fn dashboard() -> Html<String> {
    Html(views::dashboard(None))
}

async fn search(State(state): State<AppState>, multipart: Multipart) -> Result<Html<String>, AppError> {
    let form = FormData::read(multipart).await?;
    let Some(upload) = form.file("image") else {
        return Ok(Html(views::dashboard(None)));
    };

    let html = match identify_upload(&state, upload.bytes.clone()).await? {
        Identification::Verified { subject, score } => {
            views::dashboard(Some(&SearchResult::Match { person: &subject, score }))
        }
        Identification::NoFaceInProbe => {
            views::dashboard(Some(&SearchResult::Message(views::NO_FACE_MESSAGE)))
        }
        Identification::NotFound { .. } => {
            views::dashboard(Some(&SearchResult::Message(views::NOT_FOUND_MESSAGE)))
        }
    };
    Ok(Html(html))
}

/// Scan every registrant for the face in `probe`.
pub(crate) async fn identify_upload(
    state: &AppState,
    probe: Bytes,
) -> Result<Identification<Registrant>, AppError> {
    let mut gallery: Gallery = Vec::new();
    let mut unusable = 0;
    for r in list_registrants(state).await? {
        match state.uploads.path(&r.photo) {
            Ok(photo) => gallery.push(Candidate { subject: r, photo }),
            Err(e) => {
                tracing::warn!(id = r.id, error = %e, "skipping registrant with unusable photo name");
                unusable += 1;
            }
        }
    }

    let outcome = state.engine.identify(probe.to_vec(), gallery).await?;
    Ok(outcome.with_skipped(unusable))
}

/// Whether `bytes` decode as an image, checked off the async runtime.
async fn decodes(bytes: Bytes) -> Result<bool, AppError> {
    Ok(tokio::task::spawn_blocking(move || Photo::decode(&bytes).is_ok()).await?)
}
