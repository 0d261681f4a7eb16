//! Piecewise competing-risks integration over the age bands.
//!
//! Within a band the breast cancer hazard `λ·exp(β)` and the competing mortality `μ` are
//! constant, so the probability of an event in a band of width `Δ`, given survival to
//! its start, is `(1 - exp(-(λe^β + μ)Δ)) · λe^β / (λe^β + μ)`. Bands are accumulated in
//! ascending order against a running all-cause survival product.

use crate::error::RiskModelError;
use crate::pattern::PatternIndexer;
use crate::predictor::{LinearPredictorBuilder, LinearPredictorTable, WorkingPredictors};
use crate::recode::{InputRecoder, RawRiskFactors, RiskMode, RiskQuery};
use crate::tables::{AttributableRisk, Race, RaceProfile, RiskTableRepository};
use log::debug;
use serde::Serialize;
use std::sync::Arc;

/// Absolute and population-average risk for one interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskResult {
    pub race: Race,
    pub current_age: f64,
    pub projection_age: f64,
    pub absolute_risk: f64,
    pub average_risk: f64,
    pub relative_risk: f64,
}

impl RiskResult {
    /// Length of the projection window in years.
    pub fn risk_period(&self) -> f64 {
        self.projection_age - self.current_age
    }
}

/// Cumulative event probability and all-cause survival over an interval.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Accumulated {
    risk: f64,
    survival: f64,
}

/// Engine entry point. Holds the shared tables plus one predictor table per race and is
/// safe to share across threads.
#[derive(Debug, Clone)]
pub struct HazardIntegrator {
    tables: Arc<RiskTableRepository>,
    /// Indexed by race code minus one.
    predictors: Vec<LinearPredictorTable>,
}

impl HazardIntegrator {
    pub fn new(tables: Arc<RiskTableRepository>) -> Result<Self, RiskModelError> {
        let predictors = tables
            .profiles()
            .iter()
            .map(|profile| LinearPredictorBuilder::build(profile.coefficients()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tables, predictors })
    }

    /// Integrator over the embedded BCRAT tables.
    pub fn bcrat() -> Result<Self, RiskModelError> {
        Self::new(Arc::new(RiskTableRepository::bcrat()?))
    }

    pub fn tables(&self) -> &Arc<RiskTableRepository> {
        &self.tables
    }

    pub fn predictors(&self, race: Race) -> &LinearPredictorTable {
        &self.predictors[usize::from(race.code()) - 1]
    }

    /// Probability of an invasive breast cancer diagnosis over the query interval.
    pub fn risk(&self, query: &RiskQuery) -> Result<f64, RiskModelError> {
        let accumulated = self.integrate(query)?;
        if !(accumulated.risk.is_finite() && (0.0..=1.0).contains(&accumulated.risk)) {
            return Err(RiskModelError::RiskOutOfRange {
                value: accumulated.risk,
            });
        }
        Ok(accumulated.risk)
    }

    /// Probability of surviving both breast cancer and competing causes over the interval.
    pub fn survival(&self, query: &RiskQuery) -> Result<f64, RiskModelError> {
        Ok(self.integrate(query)?.survival)
    }

    /// Recodes `raw` for both modes and integrates each.
    pub fn project(&self, raw: &RawRiskFactors) -> Result<RiskResult, RiskModelError> {
        let absolute_query = InputRecoder::recode(raw, RiskMode::Absolute)?;
        let average_query = InputRecoder::recode(raw, RiskMode::PopulationAverage)?;
        let absolute_risk = self.risk(&absolute_query)?;
        let average_risk = self.risk(&average_query)?;
        let relative_risk = if average_risk == 0.0 {
            0.0
        } else {
            absolute_risk / average_risk
        };

        debug!(
            "Projection {} [{}, {}): absolute={:.6} average={:.6} relative={:.4}",
            absolute_query.race(),
            raw.current_age,
            raw.projection_age,
            absolute_risk,
            average_risk,
            relative_risk
        );

        Ok(RiskResult {
            race: absolute_query.race(),
            current_age: raw.current_age,
            projection_age: raw.projection_age,
            absolute_risk,
            average_risk,
            relative_risk,
        })
    }

    fn rates_for(&self, query: &RiskQuery) -> (&RaceProfile, AttributableRisk) {
        match query.mode() {
            RiskMode::Absolute => {
                let profile = self.tables.profile(query.race());
                (profile, profile.attributable_risk())
            }
            RiskMode::PopulationAverage => self.tables.population_reference(query.race()),
        }
    }

    /// First and last band touched by `[current, projection]`.
    fn support(&self, current: f64, projection: f64) -> Result<(usize, usize), RiskModelError> {
        let bands = self.tables.boundaries();
        let invalid = RiskModelError::InvalidAgeRange {
            current,
            projection,
        };
        if !(current.is_finite() && projection.is_finite() && projection > current) {
            return Err(invalid);
        }
        match (bands.band_starting_at(current), bands.band_ending_at(projection)) {
            (Some(first), Some(last)) if first <= last => Ok((first, last)),
            _ => Err(invalid),
        }
    }

    fn integrate(&self, query: &RiskQuery) -> Result<Accumulated, RiskModelError> {
        let current = query.current_age();
        let projection = query.projection_age();
        let (first, last) = self.support(current, projection)?;

        let pattern = PatternIndexer::index(&query.categories())?;
        let working: WorkingPredictors = self
            .predictors(query.race())
            .working_copy(pattern, query.hyperplasia_multiplier());
        let (profile, attributable_risk) = self.rates_for(query);
        let incidence = profile.incidence();
        let mortality = profile.mortality();
        let bands = self.tables.boundaries();

        let mut risk = 0.0;
        let mut survival = 1.0;
        for band in first..=last {
            let lower_edge = bands.lower(band);
            let start = current.max(lower_edge);
            let end = projection.min(bands.upper(band));
            let width = end - start;

            let cancer_hazard = incidence[band]
                * attributable_risk.for_band(lower_edge)
                * working.for_band(lower_edge).exp();
            let hazard = cancer_hazard + mortality[band];
            let band_survival = (-hazard * width).exp();
            if hazard > 0.0 {
                risk += survival * (1.0 - band_survival) * cancer_hazard / hazard;
            }
            survival *= band_survival;
        }

        Ok(Accumulated { risk, survival })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recode::Response;
    use approx::assert_abs_diff_eq;

    fn raw(current_age: f64, projection_age: f64, race: u8) -> RawRiskFactors {
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
    fn single_band_matches_closed_form() {
        let engine = HazardIntegrator::bcrat().unwrap();
        let query = InputRecoder::recode(&raw(41.0, 44.0, 1), RiskMode::Absolute).unwrap();
        let white = engine.tables().profile(Race::WhiteOther);
        let lambda = white.incidence()[4] * white.attributable_risk().below_50;
        let mu = white.mortality()[4];
        let hazard = lambda + mu;
        let expected = (1.0 - (-hazard * 3.0).exp()) * lambda / hazard;
        assert_abs_diff_eq!(engine.risk(&query).unwrap(), expected, epsilon = 1e-15);
        assert_abs_diff_eq!(
            engine.survival(&query).unwrap(),
            (-hazard * 3.0).exp(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn hyperplasia_biopsy_scenario_is_elevated() {
        let engine = HazardIntegrator::bcrat().unwrap();
        let input = RawRiskFactors {
            current_age: 35.0,
            projection_age: 40.0,
            menarche: 2,
            first_birth: 0,
            relatives: Some(0),
            ever_had_biopsy: Response::Yes,
            biopsy_count: Some(1),
            hyperplasia: Response::Yes,
            race: 1,
        };
        let result = engine.project(&input).unwrap();
        assert!(result.absolute_risk > 0.0 && result.absolute_risk < 0.05);
        assert!(result.relative_risk > 1.0);
        assert_eq!(result.risk_period(), 5.0);
    }

    #[test]
    fn oldest_band_is_finite_for_every_race() {
        let engine = HazardIntegrator::bcrat().unwrap();
        for race in Race::ALL {
            let result = engine.project(&raw(85.0, 90.0, race.code())).unwrap();
            assert!(result.absolute_risk.is_finite());
            assert!(result.absolute_risk >= 0.0);
        }
    }

    #[test]
    fn ages_outside_the_tables_are_rejected() {
        let engine = HazardIntegrator::bcrat().unwrap();
        for (current, projection) in [(19.0, 25.0), (85.0, 91.0), (90.0, 95.0)] {
            let query =
                InputRecoder::recode(&raw(current, projection, 1), RiskMode::Absolute).unwrap();
            assert!(matches!(
                engine.risk(&query),
                Err(RiskModelError::InvalidAgeRange { .. })
            ));
        }
    }

    #[test]
    fn baseline_relative_risk_against_own_average_tables() {
        // White average tables carry no attributable-risk scaling, so a baseline White
        // woman sits below the population average.
        let engine = HazardIntegrator::bcrat().unwrap();
        let result = engine.project(&raw(40.0, 45.0, 1)).unwrap();
        assert!(result.relative_risk < 1.0);

        let average = engine.project(&raw(40.0, 45.0, 4)).unwrap();
        assert_abs_diff_eq!(average.relative_risk, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn crossing_fifty_uses_both_pattern_halves() {
        let engine = HazardIntegrator::bcrat().unwrap();
        let mut input = raw(45.0, 55.0, 2);
        input.ever_had_biopsy = Response::Yes;
        input.biopsy_count = Some(3);
        let query = InputRecoder::recode(&input, RiskMode::Absolute).unwrap();
        let pattern = PatternIndexer::index(&query.categories()).unwrap();
        let predictors = engine.predictors(Race::AfricanAmerican);
        assert_ne!(
            predictors.centered_at(pattern),
            predictors.centered_at(pattern.mirror())
        );

        let aa = engine.tables().profile(Race::AfricanAmerican);
        let ar = aa.attributable_risk();
        let young = ar.below_50 * aa.incidence()[5] * predictors.centered_at(pattern).exp();
        let old = ar.from_50 * aa.incidence()[6] * predictors.centered_at(pattern.mirror()).exp();
        let h5 = young + aa.mortality()[5];
        let h6 = old + aa.mortality()[6];
        let expected = (1.0 - (-h5 * 5.0).exp()) * young / h5
            + (-h5 * 5.0).exp() * (1.0 - (-h6 * 5.0).exp()) * old / h6;
        assert_abs_diff_eq!(engine.risk(&query).unwrap(), expected, epsilon = 1e-15);
    }

    #[test]
    fn integrator_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HazardIntegrator>();
    }
}
