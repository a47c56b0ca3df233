use axum::http::StatusCode;
use serde_json::json;

mod helpers;

#[tokio::test]
async fn test_health_and_ready() -> anyhow::Result<()> {
    let (status, body) = helpers::get_json(helpers::test_app()?, "/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = helpers::get_json(helpers::test_app()?, "/ready").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["ingredients"], 64);
    assert_eq!(body["recipes"], 22);

    Ok(())
}

#[tokio::test]
async fn test_generate_recipes() -> anyhow::Result<()> {
    let request = json!({
        "petProfile": { "name": "Rex", "species": "dog", "age": 4, "weightKg": 20.0 },
        "count": 3
    });

    let (status, body) =
        helpers::post_json(helpers::test_app()?, "/api/recipes/generate", request.to_string())
            .await?;
    assert_eq!(status, StatusCode::OK);

    let recipes = body["recipes"].as_array().cloned().unwrap_or_default();
    assert_eq!(recipes.len(), 3);
    assert_eq!(body["stats"]["produced"], 3);
    assert!(body["stats"]["message"].as_str().is_some());
    assert!(body["stats"].get("insufficient").is_none());

    for recipe in recipes {
        assert_eq!(recipe["category"], "dogs");
        assert!(recipe["id"].as_str().is_some());
        let score = recipe["compatibility"]["score"].as_u64().unwrap_or(u64::MAX);
        assert!(score <= 100);
    }

    Ok(())
}

#[tokio::test]
async fn test_generate_reports_insufficient_candidates() -> anyhow::Result<()> {
    let request = json!({
        "petProfile": {
            "species": "cat",
            "allergies": ["chicken", "turkey", "beef", "fish", "lamb", "egg", "rabbit", "cheese"]
        }
    });

    let (status, body) =
        helpers::post_json(helpers::test_app()?, "/api/recipes/generate", request.to_string())
            .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipes"], json!([]));
    assert_eq!(body["stats"]["insufficient"]["species"], "cats");
    assert_eq!(
        body["stats"]["insufficient"]["missing"][0]["category"],
        "protein"
    );

    Ok(())
}

#[tokio::test]
async fn test_generate_rejects_bad_input() -> anyhow::Result<()> {
    let missing_species = json!({ "petProfile": { "name": "Rex" } });
    let (status, body) = helpers::post_json(
        helpers::test_app()?,
        "/api/recipes/generate",
        missing_species.to_string(),
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "malformed_request");
    assert!(body["message"].as_str().is_some());

    let (status, body) =
        helpers::post_json(helpers::test_app()?, "/api/recipes/generate", "{not json").await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "malformed_request");

    let zero_weight = json!({ "petProfile": { "species": "dog", "weightKg": 0 } });
    let (status, body) = helpers::post_json(
        helpers::test_app()?,
        "/api/recipes/generate",
        zero_weight.to_string(),
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    Ok(())
}

#[tokio::test]
async fn test_recommend_ranks_catalog() -> anyhow::Result<()> {
    let request = json!({ "petProfile": { "species": "dog", "allergies": ["chicken"] } });

    let (status, body) =
        helpers::post_json(helpers::test_app()?, "/api/recipes/recommend", request.to_string())
            .await?;
    assert_eq!(status, StatusCode::OK);

    let recipes = body["recipes"].as_array().cloned().unwrap_or_default();
    assert_eq!(recipes.len(), 6);
    assert!(
        recipes
            .iter()
            .all(|r| r["recipeId"] != "dog-chicken-rice" && r["recipeId"] != "dog-puppy-egg-rice")
    );

    let pre_jitter = recipes
        .iter()
        .map(|r| r["score"].as_i64().unwrap_or(0) - r["jitter"].as_i64().unwrap_or(0))
        .collect::<Vec<_>>();
    assert!(pre_jitter.windows(2).all(|w| w[0] >= w[1]), "{pre_jitter:?}");

    Ok(())
}

#[tokio::test]
async fn test_recommend_edited_profile_supersedes_same_client() -> anyhow::Result<()> {
    let app = helpers::test_app_with(|config| config.scheduler.chunk_size = 1)?;
    let first = json!({ "petProfile": { "species": "dog", "weightKg": 12.0 } });
    let edited = json!({
        "petProfile": { "species": "dog", "weightKg": 14.5, "allergies": ["beef"] }
    });

    let pending = tokio::spawn(helpers::post_json_as(
        app.clone(),
        "/api/recipes/recommend",
        "kitchen-tab",
        first.to_string(),
    ));
    tokio::task::yield_now().await;

    let (status, body) = helpers::post_json_as(
        app,
        "/api/recipes/recommend",
        "kitchen-tab",
        edited.to_string(),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["recipes"].as_array().cloned().unwrap_or_default().is_empty());

    let (status, body) = pending.await??;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "superseded");

    Ok(())
}

#[tokio::test]
async fn test_score_catalog_recipe() -> anyhow::Result<()> {
    let request = json!({
        "petProfile": { "species": "dog", "age": "adult" },
        "recipeId": "dog-chicken-rice"
    });

    let (status, body) = helpers::post_json(
        helpers::test_app()?,
        "/api/compatibility/score",
        request.to_string(),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipeId"], "dog-chicken-rice");
    assert_eq!(body["score"], 51);
    assert_eq!(body["grade"], "F");
    assert_eq!(body["compatibility"], "poor");
    assert_eq!(body["factors"][0], json!({"kind": "base", "score": 40}));

    Ok(())
}

#[tokio::test]
async fn test_score_inline_recipe() -> anyhow::Result<()> {
    let request = json!({
        "petProfile": { "species": "cat", "age": 12, "healthConcerns": ["Kidney Disease"] },
        "recipe": {
            "id": "custom-cat-cod",
            "name": "Custom Cod Plate",
            "species": "cats",
            "ingredients": [
                { "key": "cod", "grams": 80.0 },
                { "key": "pumpkin", "grams": 20.0 }
            ],
            "healthConcerns": ["kidney-disease"],
            "ageGroups": ["senior"]
        }
    });

    let (status, body) = helpers::post_json(
        helpers::test_app()?,
        "/api/compatibility/score",
        request.to_string(),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipeId"], "custom-cat-cod");
    assert_eq!(body["score"], 62);

    Ok(())
}

#[tokio::test]
async fn test_score_errors() -> anyhow::Result<()> {
    let unknown = json!({ "petProfile": { "species": "dog" }, "recipeId": "nope" });
    let (status, body) =
        helpers::post_json(helpers::test_app()?, "/api/compatibility/score", unknown.to_string())
            .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let neither = json!({ "petProfile": { "species": "dog" } });
    let (status, body) =
        helpers::post_json(helpers::test_app()?, "/api/compatibility/score", neither.to_string())
            .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(
        body["message"],
        "Validation error: Either recipeId or recipe is required"
    );

    let mismatch = json!({ "petProfile": { "species": "cat" }, "recipeId": "dog-chicken-rice" });
    let (status, body) =
        helpers::post_json(helpers::test_app()?, "/api/compatibility/score", mismatch.to_string())
            .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["message"],
        "Validation error: Recipe `dog-chicken-rice` is for dogs, not cats"
    );

    Ok(())
}
