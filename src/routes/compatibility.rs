use axum::{Json, extract::State, extract::rejection::JsonRejection};
use petplates_engine::{Engine, ScoredItem};
use petplates_registry::RecipeTemplate;
use petplates_shared::{PetProfile, invalid};
use serde::Deserialize;

use super::AppState;
use crate::error::AppError;

/// Either a registry recipe id or an inline recipe.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub pet_profile: PetProfile,
    #[serde(default)]
    pub recipe_id: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipeTemplate>,
}

/// POST /api/compatibility/score
pub async fn score(
    State(state): State<AppState>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<ScoredItem>, AppError> {
    let Json(request) = payload?;

    Ok(Json(score_request(&state.engine, &request)?))
}

fn score_request(engine: &Engine, request: &ScoreRequest) -> petplates_shared::Result<ScoredItem> {
    match (&request.recipe_id, &request.recipe) {
        (Some(id), _) => engine.score_by_id(&request.pet_profile, id),
        (None, Some(recipe)) => engine.score_one(&request.pet_profile, recipe),
        (None, None) => invalid!("Either recipeId or recipe is required"),
    }
}
