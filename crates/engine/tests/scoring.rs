use petplates_engine::{
    ChunkedScorer, Compatibility, CompatibilityScorer, Factor, Grade, PassTicket, ScoringError,
    ScoringWeights,
};
use petplates_registry::{RecipeIngredient, RecipeTemplate, Registry};
use petplates_shared::{AgeGroup, PetAge, PetProfile, Species};

mod helpers;

fn template(registry: &Registry, id: &str) -> anyhow::Result<RecipeTemplate> {
    registry
        .recipe(id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("missing recipe {id}"))
}

#[test]
fn test_health_bonus_is_capped() -> anyhow::Result<()> {
    let registry = Registry::builtin()?;
    let weights = ScoringWeights::default();
    let scorer = CompatibilityScorer::new(&registry, &weights);
    let pet = PetProfile {
        health_concerns: vec![
            "Pancreatitis".to_string(),
            "Weight Management".to_string(),
            "digestive-health".to_string(),
        ],
        ..helpers::pet(Species::Dogs)
    };

    let item = scorer.score(&template(&registry, "dog-turkey-sweet-potato")?, &pet)?;

    assert!(item.factors.iter().any(|f| matches!(
        f,
        Factor::HealthMatch { matched, score: 30, .. } if matched.len() == 3
    )));
    assert_eq!(item.score, 81);
    assert_eq!(item.factor_total(), 81);
    assert!(!item.factors.iter().any(|f| matches!(f, Factor::Clamp { .. })));
    assert_eq!(item.grade, Grade::CPlus);
    assert_eq!(item.compatibility, Compatibility::Fair);

    Ok(())
}

#[test]
fn test_floor_is_recorded_as_clamp() -> anyhow::Result<()> {
    let registry = Registry::builtin()?;
    let weights = ScoringWeights::default();
    let scorer = CompatibilityScorer::new(&registry, &weights);
    let pet = PetProfile {
        age: PetAge::Group(AgeGroup::Baby),
        health_concerns: [
            "kidney-disease",
            "heart-disease",
            "joint-mobility",
            "skin-coat",
            "urinary-support",
            "dental-health",
            "allergies",
            "diabetes",
            "liver-support",
            "anxiety",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect(),
        ..helpers::pet_with_allergies(Species::Dogs, &["turkey"])
    };

    let item = scorer.score(&template(&registry, "dog-turkey-sweet-potato")?, &pet)?;

    // 40 + 0 - 30 + 8 - 7 - 25 = -14, raised to the floor of 20
    assert_eq!(item.score, 20);
    assert_eq!(item.factor_total(), 20);
    assert_eq!(item.factors.last(), Some(&Factor::Clamp { score: 34 }));
    assert_eq!(item.grade, Grade::F);

    Ok(())
}

#[test]
fn test_nutrition_target_in_range() -> anyhow::Result<()> {
    let registry = Registry::builtin()?;
    let weights = ScoringWeights::default();
    let scorer = CompatibilityScorer::new(&registry, &weights);

    let item = scorer.score(
        &template(&registry, "dog-lamb-oats")?,
        &helpers::pet(Species::Dogs),
    )?;

    assert!(item.factors.iter().any(|f| matches!(
        f,
        Factor::NutritionTarget {
            protein_in_range: true,
            fat_in_range: true,
            score: 10,
            ..
        }
    )));
    assert_eq!(item.score, 68);
    assert_eq!(item.factor_total(), 68);

    Ok(())
}

#[test]
fn test_nutrition_target_needs_nutrition() -> anyhow::Result<()> {
    let registry = Registry::builtin()?;
    let weights = ScoringWeights::default();
    let scorer = CompatibilityScorer::new(&registry, &weights);

    let item = scorer.score(
        &template(&registry, "dog-beef-pumpkin")?,
        &helpers::pet(Species::Dogs),
    )?;

    assert!(
        !item
            .factors
            .iter()
            .any(|f| matches!(f, Factor::NutritionTarget { .. }))
    );

    Ok(())
}

#[tokio::test]
async fn test_unscorable_recipes_are_reported_once() -> anyhow::Result<()> {
    let registry = Registry::builtin()?;
    let weights = ScoringWeights::default();
    let scorer = ChunkedScorer::new(&registry, &weights, 4);

    let mut recipes = registry.recipes()[..10].to_vec();
    recipes.push(RecipeTemplate {
        id: "dog-mystery-stew".to_string(),
        name: "Mystery Stew".to_string(),
        species: Species::Dogs,
        ingredients: vec![RecipeIngredient {
            key: "moon-cheese".to_string(),
            grams: 100.0,
        }],
        nutrition: None,
        health_concerns: Vec::new(),
        age_groups: Vec::new(),
    });

    let ranking = scorer
        .run(
            &PassTicket::detached(),
            &recipes,
            &helpers::pet(Species::Dogs),
            |_| {},
        )
        .await?;

    assert_eq!(ranking.items.len(), 8);
    assert!(ranking.items.iter().all(|i| i.recipe_id.starts_with("dog-")));
    assert!(
        !ranking
            .items
            .iter()
            .any(|i| i.recipe_id == "dog-mystery-stew")
    );

    let skipped = ranking
        .anomalies
        .iter()
        .map(ScoringError::recipe_id)
        .collect::<Vec<_>>();
    assert_eq!(
        skipped,
        vec!["cat-chicken-pumpkin", "cat-salmon-greens", "dog-mystery-stew"]
    );
    assert!(matches!(
        ranking.anomalies[2],
        ScoringError::UnknownIngredient { ref ingredient, .. } if ingredient == "moon-cheese"
    ));

    let scores = ranking
        .items
        .iter()
        .map(|i| i.pre_jitter_score())
        .collect::<Vec<_>>();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");

    Ok(())
}
