use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use petplates_registry::Registry;
use petplates_shared::PetProfile;
use serde::Serialize;

use crate::{
    error::{PassError, ScoringError},
    jitter::apply_score_tie_break_jitter,
    scoring::{CompatibilityScorer, ScorableRecipe, ScoredItem, ScoringWeights},
};

pub const DEFAULT_CHUNK_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub scored_count: usize,
    pub total_count: usize,
    pub progress_percent: u8,
    pub currently_scoring_name: Option<String>,
}

/// Hands out pass tickets. Beginning a pass supersedes every earlier one.
#[derive(Debug, Clone, Default)]
pub struct ScoringSession {
    generation: Arc<AtomicU64>,
}

impl ScoringSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> PassTicket {
        let pass = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        PassTicket {
            pass,
            generation: self.generation.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PassTicket {
    pass: u64,
    generation: Arc<AtomicU64>,
}

impl PassTicket {
    /// A ticket not tied to any session. Never superseded.
    pub fn detached() -> Self {
        ScoringSession::new().begin()
    }

    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.pass
    }

    pub fn ensure_current(&self) -> Result<(), PassError> {
        if self.is_current() {
            Ok(())
        } else {
            Err(PassError::Superseded)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub items: Vec<ScoredItem>,
    #[serde(skip)]
    pub anomalies: Vec<ScoringError>,
}

/// Scores a recipe list in fixed-size chunks, yielding between chunks.
pub struct ChunkedScorer<'a> {
    scorer: CompatibilityScorer<'a>,
    chunk_size: usize,
}

impl<'a> ChunkedScorer<'a> {
    pub fn new(registry: &'a Registry, weights: &'a ScoringWeights, chunk_size: usize) -> Self {
        Self {
            scorer: CompatibilityScorer::new(registry, weights),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Scores every recipe, reporting progress after each chunk.
    ///
    /// The result is sorted by score then recipe id and tie-break jittered
    /// with the pet's profile hash. Recipes that fail to score are left out of
    /// `items` and listed in `anomalies`. Returns [`PassError::Superseded`] as
    /// soon as a newer pass begins on the ticket's session.
    pub async fn run<R, F>(
        &self,
        ticket: &PassTicket,
        recipes: &[R],
        pet: &PetProfile,
        mut on_progress: F,
    ) -> Result<Ranking, PassError>
    where
        R: ScorableRecipe,
        F: FnMut(Progress),
    {
        let total_count = recipes.len();
        let mut items = Vec::with_capacity(total_count);
        let mut anomalies = Vec::new();
        let mut scored_count = 0;

        for chunk in recipes.chunks(self.chunk_size) {
            ticket.ensure_current()?;

            for recipe in chunk {
                match self.scorer.score(recipe, pet) {
                    Ok(item) => items.push(item),
                    Err(err) => anomalies.push(err),
                }
            }

            scored_count += chunk.len();
            on_progress(Progress {
                scored_count,
                total_count,
                progress_percent: percent(scored_count, total_count),
                currently_scoring_name: chunk.last().map(|r| r.name().to_string()),
            });

            tokio::task::yield_now().await;
        }

        if !anomalies.is_empty() {
            let ids = anomalies
                .iter()
                .map(ScoringError::recipe_id)
                .collect::<Vec<_>>();
            tracing::warn!(
                count = anomalies.len(),
                recipes = ?ids,
                "Recipes skipped during scoring"
            );
        }

        items.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.recipe_id.cmp(&b.recipe_id))
        });
        let items = apply_score_tie_break_jitter(items, &pet.profile_hash());

        ticket.ensure_current()?;

        Ok(Ranking { items, anomalies })
    }
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100) / total).min(100) as u8
}
