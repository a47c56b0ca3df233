use std::sync::Arc;

use petplates_registry::{RecipeTemplate, Registry};
use petplates_shared::{Error, PetProfile, Result, Species, invalid};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    builder::{self, BuilderSettings, GeneratedRecipe, GenerationConstraints, InsufficientCandidates},
    filter::{self, CandidateSet},
    jitter::{Ranked, apply_score_tie_break_jitter},
    organic::{count_message, count_subtext, make_count_organic},
    scheduler::{ChunkedScorer, DEFAULT_CHUNK_SIZE, PassTicket, Progress},
    scoring::{CompatibilityScorer, ScorableRecipe, ScoredItem, ScoringWeights},
};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub weights: ScoringWeights,
    pub builder: BuilderSettings,
    pub chunk_size: usize,
    pub presentation_variation: bool,
    pub default_count: usize,
    pub max_count: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            builder: BuilderSettings::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            presentation_variation: false,
            default_count: 10,
            max_count: 50,
        }
    }
}

#[derive(Validate, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[validate(nested)]
    pub pet_profile: PetProfile,
    /// Capped by `EngineSettings::max_count`.
    #[validate(range(min = 1))]
    pub count: Option<usize>,
    pub species: Option<Species>,
}

impl GenerateRequest {
    pub fn new(pet_profile: PetProfile) -> Self {
        Self {
            pet_profile,
            count: None,
            species: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

/// A generated recipe with its compatibility for the requesting pet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRecipe {
    #[serde(flatten)]
    pub recipe: GeneratedRecipe,
    pub compatibility: ScoredItem,
}

impl Ranked for ScoredRecipe {
    fn key(&self) -> &str {
        self.compatibility.key()
    }

    fn score(&self) -> u8 {
        self.compatibility.score
    }

    fn apply_jitter(&mut self, delta: i8) {
        self.compatibility.apply_jitter(delta);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub candidate_ingredients: usize,
    pub candidate_recipes: usize,
    pub excluded: usize,
    pub requested: usize,
    pub produced: usize,
    pub anomalies: Vec<String>,
    pub display_count: usize,
    pub message: String,
    pub subtext: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insufficient: Option<InsufficientCandidates>,
}

impl Stats {
    fn new(candidates: &CandidateSet<'_>, requested: usize) -> Self {
        Self {
            candidate_ingredients: candidates.ingredients.len(),
            candidate_recipes: candidates.recipes.len(),
            excluded: candidates.excluded_count(),
            requested,
            ..Default::default()
        }
    }

    fn produced(mut self, produced: usize, species: Species) -> Self {
        self.produced = produced;
        self.display_count = make_count_organic(produced);
        self.message = count_message(self.display_count);
        self.subtext = count_subtext(self.display_count, pet_noun(species));
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipesResponse<T> {
    pub recipes: Vec<T>,
    pub stats: Stats,
}

/// Entry point for generation, recommendation and single scoring requests.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(registry: Arc<Registry>, settings: EngineSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Builds new recipes for the pet from safe ingredients.
    ///
    /// When a required ingredient category cannot be filled the response is
    /// empty and `stats.insufficient` says which categories fell short.
    #[tracing::instrument(skip_all, fields(species))]
    pub fn generate(&self, request: GenerateRequest) -> Result<RecipesResponse<ScoredRecipe>> {
        let (pet, count) = self.prepare(request)?;
        tracing::Span::current().record("species", tracing::field::display(pet.species));

        let candidates = filter::filter(&self.registry, &pet);
        let constraints =
            GenerationConstraints::for_pet(&self.registry, &pet, self.settings.builder.clone());
        let generation = builder::generate(&candidates, &constraints, count);

        let scorer = CompatibilityScorer::new(&self.registry, &self.settings.weights);
        let mut recipes = Vec::with_capacity(generation.recipes.len());
        let mut anomalies = Vec::new();
        for recipe in generation.recipes {
            match scorer.score(&recipe, &pet) {
                Ok(compatibility) => recipes.push(ScoredRecipe {
                    recipe,
                    compatibility,
                }),
                Err(err) => anomalies.push(err.to_string()),
            }
        }

        recipes.sort_by(|a, b| {
            b.compatibility
                .score
                .cmp(&a.compatibility.score)
                .then_with(|| a.recipe.id.cmp(&b.recipe.id))
        });
        let recipes = apply_score_tie_break_jitter(recipes, &pet.profile_hash());

        let mut stats = Stats::new(&candidates, count).produced(recipes.len(), pet.species);
        stats.anomalies = anomalies;
        stats.insufficient = generation.shortfall;

        Ok(RecipesResponse { recipes, stats })
    }

    /// Ranks the registry's recipe templates for the pet.
    ///
    /// Scoring runs in chunks and reports progress through `on_progress`.
    /// Fails with a conflict if `ticket` is superseded before the ranking is
    /// complete.
    #[tracing::instrument(skip_all, fields(species))]
    pub async fn recommend<F>(
        &self,
        request: GenerateRequest,
        ticket: &PassTicket,
        on_progress: F,
    ) -> Result<RecipesResponse<ScoredItem>>
    where
        F: FnMut(Progress),
    {
        let limit = request.count;
        let (pet, _) = self.prepare(request)?;
        tracing::Span::current().record("species", tracing::field::display(pet.species));

        let candidates = filter::filter(&self.registry, &pet);
        let scorer = ChunkedScorer::new(
            &self.registry,
            &self.settings.weights,
            self.settings.chunk_size,
        );
        let ranking = scorer
            .run(ticket, &candidates.recipes, &pet, on_progress)
            .await?;

        let mut recipes = ranking.items;
        if let Some(limit) = limit {
            recipes.truncate(limit);
        }

        let requested = limit.unwrap_or(candidates.recipes.len());
        let mut stats = Stats::new(&candidates, requested).produced(recipes.len(), pet.species);
        stats.anomalies = ranking.anomalies.iter().map(ToString::to_string).collect();

        Ok(RecipesResponse { recipes, stats })
    }

    /// Scores one recipe for the pet, with presentation variation when enabled.
    pub fn score_one<R: ScorableRecipe + ?Sized>(
        &self,
        pet: &PetProfile,
        recipe: &R,
    ) -> Result<ScoredItem> {
        pet.validate()?;

        let scorer = CompatibilityScorer::new(&self.registry, &self.settings.weights);
        let item = if self.settings.presentation_variation {
            scorer.score_with_variation(recipe, pet, &mut rand::rng())?
        } else {
            scorer.score(recipe, pet)?
        };

        Ok(item)
    }

    pub fn score_by_id(&self, pet: &PetProfile, recipe_id: &str) -> Result<ScoredItem> {
        let recipe: &RecipeTemplate = self
            .registry
            .recipe(recipe_id)
            .ok_or_else(|| Error::NotFound(format!("recipe `{recipe_id}`")))?;

        self.score_one(pet, recipe)
    }

    fn prepare(&self, request: GenerateRequest) -> Result<(PetProfile, usize)> {
        request.validate()?;

        let mut pet = request.pet_profile;
        if let Some(species) = request.species {
            pet.species = species;
        }

        let max_count = self.settings.max_count;
        let count = match request.count {
            Some(count) if count > max_count => {
                invalid!("count must be between 1 and {max_count}, got {count}")
            }
            Some(count) => count,
            None => self.settings.default_count.min(max_count),
        };

        Ok((pet, count))
    }
}

fn pet_noun(species: Species) -> &'static str {
    match species {
        Species::Dogs => "dog",
        Species::Cats => "cat",
        Species::Birds => "bird",
        Species::Reptiles => "reptile",
        Species::PocketPets => "pocket pet",
    }
}
