//! Per-race linear predictors over the 216 covariate patterns.

use crate::error::RiskModelError;
use crate::pattern::{AGE_HALF, PATTERN_COUNT, PatternIndex, design_vector};
use crate::recode::HYPERPLASIA_NEUTRAL;
use crate::tables::{AGE_INDICATOR_THRESHOLD, COEFFICIENT_COUNT};
use ndarray::{Array1, Array2, ArrayView1, s};

/// Raw and baseline-centered log relative risks for every covariate pattern of one race.
///
/// `raw[k]` is the design row of pattern `k + 1` dotted with the coefficients. The
/// centered value removes the intercept (and, for the age-50-and-over half, the age
/// coefficient) so that `exp(centered[k])` multiplies the tabulated baseline incidence.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearPredictorTable {
    raw: Array1<f64>,
    centered: Array1<f64>,
}

pub struct LinearPredictorBuilder;

impl LinearPredictorBuilder {
    /// The 216 x 8 design matrix, one row per pattern in index order.
    pub fn design_matrix() -> Array2<f64> {
        let mut design = Array2::zeros((PATTERN_COUNT, COEFFICIENT_COUNT));
        for (pattern, mut row) in PatternIndex::all().zip(design.rows_mut()) {
            for (cell, value) in row.iter_mut().zip(design_vector(pattern)) {
                *cell = value;
            }
        }
        design
    }

    pub fn build(coefficients: ArrayView1<'_, f64>) -> Result<LinearPredictorTable, RiskModelError> {
        if coefficients.len() != COEFFICIENT_COUNT {
            return Err(RiskModelError::TableShapeMismatch {
                table: "coefficients",
                race: 0,
                expected: COEFFICIENT_COUNT,
                found: coefficients.len(),
            });
        }

        let raw = Self::design_matrix().dot(&coefficients);
        let mut centered = raw.clone();
        let intercept = coefficients[0];
        let age_term = coefficients[1];
        centered
            .slice_mut(s![..AGE_HALF])
            .mapv_inplace(|value| value - intercept);
        centered
            .slice_mut(s![AGE_HALF..])
            .mapv_inplace(|value| value - intercept - age_term);

        Ok(LinearPredictorTable { raw, centered })
    }
}

impl LinearPredictorTable {
    pub fn raw(&self) -> ArrayView1<'_, f64> {
        self.raw.view()
    }

    pub fn centered(&self) -> ArrayView1<'_, f64> {
        self.centered.view()
    }

    #[inline]
    pub fn centered_at(&self, pattern: PatternIndex) -> f64 {
        self.centered[pattern.offset()]
    }

    /// Call-local copy of the centered predictors with the hyperplasia adjustment folded
    /// in at `pattern` and at its mirror. The shared table is never touched.
    pub fn working_copy(&self, pattern: PatternIndex, hyperplasia_multiplier: f64) -> WorkingPredictors {
        let mut values = self.centered.clone();
        if hyperplasia_multiplier != HYPERPLASIA_NEUTRAL {
            let shift = hyperplasia_multiplier.ln();
            values[pattern.offset()] += shift;
            values[pattern.mirror().offset()] += shift;
        }
        WorkingPredictors { pattern, values }
    }
}

/// Predictors for a single query.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingPredictors {
    pattern: PatternIndex,
    values: Array1<f64>,
}

impl WorkingPredictors {
    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    /// Predictor from the age-below-50 half of the query's pattern pair.
    pub fn below_50(&self) -> f64 {
        let lower = if self.pattern.is_age_50_or_over() {
            self.pattern.mirror()
        } else {
            self.pattern
        };
        self.values[lower.offset()]
    }

    /// Predictor from the age-50-and-over half of the query's pattern pair.
    pub fn from_50(&self) -> f64 {
        let upper = if self.pattern.is_age_50_or_over() {
            self.pattern
        } else {
            self.pattern.mirror()
        };
        self.values[upper.offset()]
    }

    /// Predictor for the band whose lower edge is `band_lower_age`.
    #[inline]
    pub fn for_band(&self, band_lower_age: f64) -> f64 {
        if band_lower_age < AGE_INDICATOR_THRESHOLD {
            self.below_50()
        } else {
            self.from_50()
        }
    }
}
