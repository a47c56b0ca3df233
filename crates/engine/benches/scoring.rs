use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use petplates_engine::{
    BuilderSettings, CompatibilityScorer, Engine, EngineSettings, GenerateRequest, ScoringWeights,
    jitter::apply_score_tie_break_jitter,
};
use petplates_registry::Registry;
use petplates_shared::{PetProfile, Species};

fn bench_pet() -> PetProfile {
    PetProfile {
        health_concerns: vec!["joint-mobility".to_string(), "skin-coat".to_string()],
        allergies: vec!["beef".to_string()],
        ..PetProfile::new(Species::Dogs)
    }
}

fn bench_score_templates(c: &mut Criterion) {
    let Ok(registry) = Registry::builtin() else {
        return;
    };
    let weights = ScoringWeights::default();
    let scorer = CompatibilityScorer::new(&registry, &weights);
    let pet = bench_pet();
    let recipes = registry.recipes_for(Species::Dogs).collect::<Vec<_>>();

    c.bench_function("score_dog_templates", |b| {
        b.iter(|| {
            for recipe in &recipes {
                let _ = black_box(scorer.score(*recipe, black_box(&pet)));
            }
        })
    });
}

fn bench_tie_break_jitter(c: &mut Criterion) {
    let Ok(registry) = Registry::builtin() else {
        return;
    };
    let weights = ScoringWeights::default();
    let scorer = CompatibilityScorer::new(&registry, &weights);
    let pet = PetProfile::new(Species::Dogs);
    let scored = registry
        .recipes_for(Species::Dogs)
        .filter_map(|r| scorer.score(r, &pet).ok())
        .collect::<Vec<_>>();
    let items = scored.iter().cycle().take(200).cloned().collect::<Vec<_>>();
    let seed = pet.profile_hash();

    c.bench_function("tie_break_jitter_200", |b| {
        b.iter(|| black_box(apply_score_tie_break_jitter(items.clone(), &seed)))
    });
}

fn bench_generate(c: &mut Criterion) {
    let Ok(registry) = Registry::builtin() else {
        return;
    };
    let engine = Engine::new(
        Arc::new(registry),
        EngineSettings {
            builder: BuilderSettings {
                seed: Some(42),
                ..Default::default()
            },
            ..Default::default()
        },
    );

    c.bench_function("generate_10_dog_recipes", |b| {
        b.iter(|| {
            let request = GenerateRequest::new(bench_pet()).with_count(10);
            black_box(engine.generate(request))
        })
    });
}

criterion_group!(
    benches,
    bench_score_templates,
    bench_tie_break_jitter,
    bench_generate
);
criterion_main!(benches);
