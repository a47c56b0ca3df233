use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    extract::State,
    extract::rejection::JsonRejection,
    http::HeaderMap,
};
use petplates_engine::{
    GenerateRequest, PassTicket, RecipesResponse, ScoredItem, ScoredRecipe, ScoringSession,
};
use tokio::sync::Mutex;

use super::AppState;
use crate::error::AppError;

/// Identifies the caller whose recommend passes supersede each other.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

type Sessions = Arc<Mutex<HashMap<String, ScoringSession>>>;

/// POST /api/recipes/generate
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<RecipesResponse<ScoredRecipe>>, AppError> {
    let Json(request) = payload?;
    let response = state.engine.generate(request)?;

    if let Some(insufficient) = &response.stats.insufficient {
        tracing::info!("{insufficient}");
    }

    Ok(Json(response))
}

/// POST /api/recipes/recommend
///
/// Ranks the registry's recipes for the pet. A newer request from the same
/// caller cancels this one, which then answers 409. The caller is the
/// `x-client-id` header, else the pet id, else the profile itself.
pub async fn recommend(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<RecipesResponse<ScoredItem>>, AppError> {
    let Json(request) = payload?;
    let key = session_key(&headers, &request);

    let ticket = {
        let mut sessions = state.sessions.lock().await;
        sessions.entry(key.clone()).or_default().begin()
    };
    let _release = SessionRelease {
        sessions: state.sessions.clone(),
        key,
        ticket: ticket.clone(),
    };

    let response = state
        .engine
        .recommend(request, &ticket, |progress| {
            tracing::debug!(
                scored = progress.scored_count,
                total = progress.total_count,
                percent = progress.progress_percent,
                "Scoring progress"
            );
        })
        .await?;

    Ok(Json(response))
}

fn session_key(headers: &HeaderMap, request: &GenerateRequest) -> String {
    let client = headers
        .get(CLIENT_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match (client, &request.pet_profile.id) {
        (Some(client), _) => format!("client:{client}"),
        (None, Some(pet)) => format!("pet:{pet}"),
        (None, None) => format!("profile:{}", request.pet_profile.profile_hash()),
    }
}

/// Drops the caller's session once its latest pass ends, including when the
/// handler future is dropped mid-pass.
struct SessionRelease {
    sessions: Sessions,
    key: String,
    ticket: PassTicket,
}

impl Drop for SessionRelease {
    fn drop(&mut self) {
        if let Ok(mut sessions) = self.sessions.try_lock() {
            release(&mut sessions, &self.key, &self.ticket);
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let sessions = self.sessions.clone();
        let key = std::mem::take(&mut self.key);
        let ticket = self.ticket.clone();
        runtime.spawn(async move {
            release(&mut *sessions.lock().await, &key, &ticket);
        });
    }
}

fn release(sessions: &mut HashMap<String, ScoringSession>, key: &str, ticket: &PassTicket) {
    if ticket.is_current() {
        sessions.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use petplates_shared::{PetProfile, Species};

    use super::*;

    fn request(pet_id: Option<&str>, weight_kg: f64) -> GenerateRequest {
        GenerateRequest::new(PetProfile {
            id: pet_id.map(str::to_string),
            weight_kg,
            ..PetProfile::new(Species::Dogs)
        })
    }

    #[test]
    fn client_header_wins_over_profile() {
        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_ID_HEADER, HeaderValue::from_static("tab-7"));

        assert_eq!(session_key(&headers, &request(Some("rex"), 12.0)), "client:tab-7");
        assert_eq!(
            session_key(&headers, &request(None, 12.0)),
            session_key(&headers, &request(None, 30.0))
        );
    }

    #[test]
    fn falls_back_to_pet_then_profile() {
        let headers = HeaderMap::new();
        assert_eq!(session_key(&headers, &request(Some("rex"), 12.0)), "pet:rex");

        let key = session_key(&headers, &request(None, 12.0));
        assert!(key.starts_with("profile:"));
        assert_ne!(key, session_key(&headers, &request(None, 30.0)));

        let mut blank = HeaderMap::new();
        blank.insert(CLIENT_ID_HEADER, HeaderValue::from_static("  "));
        assert_eq!(session_key(&blank, &request(Some("rex"), 12.0)), "pet:rex");
    }

    #[tokio::test]
    async fn release_keeps_newer_sessions() {
        let sessions: Sessions = Arc::default();
        let session = ScoringSession::new();
        let older = session.begin();
        let newer = session.begin();
        sessions.lock().await.insert("client:a".to_string(), session);

        drop(SessionRelease {
            sessions: sessions.clone(),
            key: "client:a".to_string(),
            ticket: older,
        });
        assert!(sessions.lock().await.contains_key("client:a"));

        drop(SessionRelease {
            sessions: sessions.clone(),
            key: "client:a".to_string(),
            ticket: newer,
        });
        assert!(sessions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn release_runs_when_pass_is_abandoned() {
        let state = AppState::new(
            crate::routes::tests::test_config(),
            petplates_registry::Registry::builtin().unwrap(),
        );

        let mut pass = Box::pin(recommend(
            State(state.clone()),
            HeaderMap::new(),
            Ok(Json(request(Some("rex"), 12.0))),
        ));
        let mut cx = std::task::Context::from_waker(std::task::Waker::noop());
        assert!(pass.as_mut().poll(&mut cx).is_pending());
        assert_eq!(state.sessions.lock().await.len(), 1);

        drop(pass);
        assert!(state.sessions.lock().await.is_empty());
    }
}
