//! JSON endpoints mirroring the HTML pages.

use crate::config::VerifyMetric;
use crate::error::AppError;
use crate::forms::FormData;
use crate::routes::{identify_upload, list_registrants, AppState};
use crate::views;
use axum::extract::{Multipart, State};
use axum::Json;
use seeker_core::Identification;
use seeker_store::{persons, Registrant};
use serde::Serialize;

#[derive(Serialize)]
pub struct PersonView {
    #[serde(flatten)]
    person: Registrant,
    photo_url: String,
}

impl From<Registrant> for PersonView {
    fn from(person: Registrant) -> Self {
        Self {
            photo_url: views::photo_url(&person),
            person,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IdentifyResponse {
    Verified { score: f32, person: PersonView },
    NoFace,
    NotFound { compared: usize, skipped: usize },
}

impl From<Identification<Registrant>> for IdentifyResponse {
    fn from(outcome: Identification<Registrant>) -> Self {
        match outcome {
            Identification::Verified { subject, score } => Self::Verified {
                score,
                person: subject.into(),
            },
            Identification::NoFaceInProbe => Self::NoFace,
            Identification::NotFound { compared, skipped } => Self::NotFound { compared, skipped },
        }
    }
}

pub async fn status(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let registrants = state.db.call(|conn| Ok(persons::count(conn)?)).await?;
    let config = &state.config;
    let threshold = match config.verify_metric {
        VerifyMetric::Cosine => config.similarity_threshold,
        VerifyMetric::Euclidean => config.distance_tolerance,
    };
    Ok(Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "registrants": registrants,
        "verify_metric": config.verify_metric,
        "threshold": threshold,
    })))
}

pub async fn list_persons(State(state): State<AppState>) -> Result<Json<Vec<PersonView>>, AppError> {
    let all = list_registrants(&state).await?;
    Ok(Json(all.into_iter().map(PersonView::from).collect()))
}

pub async fn identify(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<IdentifyResponse>, AppError> {
    let form = FormData::read(multipart).await?;
    let upload = form
        .file("image")
        .ok_or_else(|| AppError::BadRequest("an image file is required".into()))?;
    let outcome = identify_upload(&state, upload.bytes.clone()).await?;
    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::engine::EngineHandle;
    use crate::routes::tests::{
        multipart, png, register_person, send, test_app, test_app_with, Part, BLACK, GREEN, RED,
    };
    use axum::body::Body;
    use seeker_store::{persons, NewRegistrant};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;

    async fn json(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(app, req).await;
        (status, serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_status_counts_registrants() {
        let t = test_app().await;
        register_person(&t.app, "One", RED).await;

        let (status, body) = json(&t.app, Request::get("/api/status").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["registrants"], 1);
        assert_eq!(body["verify_metric"], "cosine");
    }

    #[tokio::test]
    async fn test_persons_lists_with_photo_url() {
        let t = test_app().await;
        register_person(&t.app, "Kai", GREEN).await;

        let (_, body) = json(&t.app, Request::get("/api/persons").body(Body::empty()).unwrap()).await;
        let list = body.as_array().expect("array");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["name"], "Kai");
        assert_eq!(list[0]["age"], 29);
        let url = list[0]["photo_url"].as_str().unwrap();
        assert!(url.starts_with("/static/uploads/") && url.ends_with("_face.png"));
    }

    #[tokio::test]
    async fn test_identify_outcomes() {
        let t = test_app().await;
        register_person(&t.app, "Kai", GREEN).await;

        let (status, body) =
            json(&t.app, multipart("/api/identify", vec![Part::File("image", "q.png", png(GREEN))])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "verified");
        assert_eq!(body["person"]["name"], "Kai");

        let (_, body) = json(&t.app, multipart("/api/identify", vec![Part::File("image", "q.png", png(BLACK))])).await;
        assert_eq!(body["outcome"], "no_face");

        let (_, body) = json(&t.app, multipart("/api/identify", vec![Part::File("image", "q.png", png(RED))])).await;
        assert_eq!(body["outcome"], "not_found");
        assert_eq!(body["compared"], 1);
        assert_eq!(body["skipped"], 0);
    }

    #[tokio::test]
    async fn test_identify_counts_unusable_photo_names_as_skipped() {
        let t = test_app().await;
        register_person(&t.app, "Kai", GREEN).await;
        t.state
            .db
            .call(|conn| {
                let bad = NewRegistrant {
                    name: "Broken".into(),
                    age: 40,
                    gender: String::new(),
                    location: String::new(),
                    photo: "../outside.png".into(),
                };
                Ok(persons::insert(conn, &bad)?)
            })
            .await
            .unwrap();

        let probe = png([10, 10, 240]);
        let (status, body) = json(&t.app, multipart("/api/identify", vec![Part::File("image", "q.png", probe)])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "not_found");
        assert_eq!(body["compared"], 1);
        assert_eq!(body["skipped"], 1);
    }

    #[tokio::test]
    async fn test_identify_with_engine_gone() {
        let t = test_app_with(Config::default(), EngineHandle::disconnected()).await;
        let req = multipart("/api/identify", vec![Part::File("image", "q.png", png(RED))]);
        let (status, _) = send(&t.app, req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_identify_requires_image() {
        let t = test_app().await;
        let (status, _) = send(&t.app, multipart("/api/identify", vec![Part::Text("q", "x")])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
