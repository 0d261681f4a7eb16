use approx::assert_relative_eq;
use gailrisk::pattern::{PatternIndex, PatternIndexer};
use gailrisk::{
    HazardIntegrator, InputRecoder, Race, RawRiskFactors, Response, RiskMode, RiskModelError,
    RiskTableRepository,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;
use tempfile::tempdir;

const SWEEP: usize = 2_000;

fn random_response(rng: &mut StdRng) -> Response {
    match rng.gen_range(0..3) {
        0 => Response::Yes,
        1 => Response::No,
        _ => Response::Unknown,
    }
}

fn random_factors(rng: &mut StdRng) -> RawRiskFactors {
    let current_age: f64 = rng.gen_range(20.0..85.0);
    let projection_age = current_age + rng.gen_range(0.5..(90.0 - current_age));
    RawRiskFactors {
        current_age,
        projection_age,
        menarche: rng.gen_range(0..=2),
        first_birth: rng.gen_range(0..=3),
        relatives: rng.gen_bool(0.8).then(|| rng.gen_range(0..=6)),
        ever_had_biopsy: random_response(rng),
        biopsy_count: rng.gen_bool(0.8).then(|| rng.gen_range(0..=6)),
        hyperplasia: random_response(rng),
        race: rng.gen_range(1..=12),
    }
}

fn zero_risk(current_age: f64, projection_age: f64, race: u8) -> RawRiskFactors {
    RawRiskFactors {
        current_age,
        projection_age,
        menarche: 0,
        first_birth: 0,
        relatives: Some(0),
        ever_had_biopsy: Response::No,
        biopsy_count: None,
        hyperplasia: Response::Unknown,
        race,
    }
}

#[test]
fn risks_are_probabilities_and_relative_risk_is_their_ratio() {
    let engine = HazardIntegrator::bcrat().unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..SWEEP {
        let raw = random_factors(&mut rng);
        let result = engine.project(&raw).unwrap();
        assert!((0.0..=1.0).contains(&result.absolute_risk), "{raw:?}");
        assert!((0.0..=1.0).contains(&result.average_risk), "{raw:?}");
        if result.average_risk > 0.0 {
            assert_relative_eq!(
                result.relative_risk,
                result.absolute_risk / result.average_risk,
                max_relative = 1e-6
            );
        }
    }
}

#[test]
fn risk_grows_with_projection_age() {
    let engine = HazardIntegrator::bcrat().unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..SWEEP {
        let mut raw = random_factors(&mut rng);
        let shorter = engine.project(&raw).unwrap().absolute_risk;
        raw.projection_age = rng.gen_range(raw.projection_age..=90.0);
        let longer = engine.project(&raw).unwrap().absolute_risk;
        assert!(longer >= shorter - 1e-15, "{raw:?}: {longer} < {shorter}");
    }
}

#[test]
fn risk_composes_across_age_fifty() {
    let engine = HazardIntegrator::bcrat().unwrap();
    let mut rng = StdRng::seed_from_u64(50);
    for _ in 0..500 {
        let mut raw = random_factors(&mut rng);
        raw.current_age = rng.gen_range(20.0..49.5);
        raw.projection_age = rng.gen_range(50.5..90.0);

        let whole = InputRecoder::recode(&raw, RiskMode::Absolute).unwrap();
        let mut before = raw.clone();
        before.projection_age = 50.0;
        let before = InputRecoder::recode(&before, RiskMode::Absolute).unwrap();
        let mut after = raw.clone();
        after.current_age = 50.0;
        let after = InputRecoder::recode(&after, RiskMode::Absolute).unwrap();

        let composed = engine.risk(&before).unwrap()
            + engine.survival(&before).unwrap() * engine.risk(&after).unwrap();
        assert_relative_eq!(
            engine.risk(&whole).unwrap(),
            composed,
            max_relative = 1e-10
        );
    }
}

#[test]
fn repeated_projections_are_bit_identical() {
    let engine = HazardIntegrator::bcrat().unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        let raw = random_factors(&mut rng);
        let first = engine.project(&raw).unwrap();
        let second = engine.project(&raw).unwrap();
        assert_eq!(first.absolute_risk.to_bits(), second.absolute_risk.to_bits());
        assert_eq!(first.average_risk.to_bits(), second.average_risk.to_bits());
    }
}

#[test]
fn concurrent_callers_match_serial_results() {
    let engine = HazardIntegrator::bcrat().unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let inputs: Vec<RawRiskFactors> = (0..500).map(|_| random_factors(&mut rng)).collect();
    let serial: Vec<f64> = inputs
        .iter()
        .map(|raw| engine.project(raw).unwrap().absolute_risk)
        .collect();
    let parallel: Vec<f64> = inputs
        .par_iter()
        .map(|raw| engine.project(raw).unwrap().absolute_risk)
        .collect();
    assert_eq!(serial, parallel);
}

#[test]
fn biopsy_with_hyperplasia_before_forty_is_above_average() {
    let engine = HazardIntegrator::bcrat().unwrap();
    let raw = RawRiskFactors {
        current_age: 35.0,
        projection_age: 40.0,
        menarche: 2,
        first_birth: 0,
        relatives: Some(0),
        ever_had_biopsy: Response::Yes,
        biopsy_count: Some(1),
        hyperplasia: Response::Yes,
        race: Race::WhiteOther.code(),
    };
    let result = engine.project(&raw).unwrap();
    assert!(result.absolute_risk > 0.0 && result.absolute_risk < 0.05);
    assert!(result.relative_risk > 1.0);
}

#[test]
fn last_band_is_finite_for_every_race() {
    let engine = HazardIntegrator::bcrat().unwrap();
    for race in Race::ALL {
        let result = engine.project(&zero_risk(85.0, 90.0, race.code())).unwrap();
        assert!(result.absolute_risk.is_finite());
        assert!(result.absolute_risk >= 0.0);
    }
}

#[test]
fn unsupported_race_code_is_rejected() {
    let engine = HazardIntegrator::bcrat().unwrap();
    assert!(matches!(
        engine.project(&zero_risk(40.0, 45.0, 13)),
        Err(RiskModelError::UnknownRace(13))
    ));
}

#[test]
fn inverted_intervals_are_rejected_for_every_race_and_pattern() {
    let engine = HazardIntegrator::bcrat().unwrap();
    let hyperplasia = [Response::Yes, Response::No, Response::Unknown];
    for race in Race::ALL {
        for pattern in PatternIndex::all() {
            let categories = PatternIndexer::decode(pattern);
            let current_age = if categories.age_indicator == 1 { 60.0 } else { 40.0 };
            for answer in hyperplasia {
                let mut raw = zero_risk(current_age, current_age, race.code());
                raw.menarche = categories.menarche;
                raw.first_birth = categories.first_birth;
                raw.relatives = Some(u32::from(categories.relatives));
                raw.ever_had_biopsy = Response::Yes;
                raw.biopsy_count = Some(u32::from(categories.biopsy_count));
                raw.hyperplasia = answer;
                assert!(
                    matches!(
                        engine.project(&raw),
                        Err(RiskModelError::InvalidAgeRange { .. })
                    ),
                    "{raw:?}"
                );
                raw.projection_age = current_age - 5.0;
                assert!(
                    matches!(
                        engine.project(&raw),
                        Err(RiskModelError::InvalidAgeRange { .. })
                    ),
                    "{raw:?}"
                );
            }
        }
    }
}

#[test]
fn reloaded_tables_reproduce_identical_risks() {
    let repository = RiskTableRepository::bcrat().unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("tables.toml");
    repository.save(&path).unwrap();

    let embedded = HazardIntegrator::new(Arc::new(repository)).unwrap();
    let reloaded = HazardIntegrator::new(Arc::new(RiskTableRepository::load(&path).unwrap())).unwrap();

    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..200 {
        let raw = random_factors(&mut rng);
        assert_eq!(embedded.project(&raw).unwrap(), reloaded.project(&raw).unwrap());
    }
}

#[test]
fn malformed_table_file_fails_construction() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tables.toml");
    let mut tables = RiskTableRepository::bcrat().unwrap().to_tables();
    tables.races[6].mortality.truncate(10);
    std::fs::write(&path, toml::to_string_pretty(&tables).unwrap()).unwrap();
    assert!(matches!(
        RiskTableRepository::load(&path),
        Err(RiskModelError::TableShapeMismatch {
            table: "mortality",
            race: 7,
            ..
        })
    ));
}
