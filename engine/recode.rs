//! Cleaning of raw risk factors into the canonical categories the model is indexed by.

use crate::error::RiskModelError;
use crate::tables::{AGE_INDICATOR_THRESHOLD, Race};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relative hazard for atypical hyperplasia found on biopsy.
pub const HYPERPLASIA_PRESENT: f64 = 1.82;
/// Relative hazard when biopsies were taken and showed no atypical hyperplasia.
pub const HYPERPLASIA_ABSENT: f64 = 0.93;
pub const HYPERPLASIA_NEUTRAL: f64 = 1.0;

/// Largest biopsy count the model accepts.
pub const MAX_BIOPSY_COUNT: u32 = 30;
/// Largest affected-relative count accepted for the non-Asian groups.
pub const MAX_RELATIVE_COUNT: u32 = 31;
/// Highest menarche category (under 12).
pub const MAX_MENARCHE_CATEGORY: u8 = 2;
/// Highest first-birth category (30 or older).
pub const MAX_FIRST_BIRTH_CATEGORY: u8 = 3;

/// A yes/no answer that may also be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Yes,
    No,
    #[default]
    Unknown,
}

impl FromStr for Response {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Ok(Response::Yes),
            "no" | "n" => Ok(Response::No),
            "unknown" | "u" | "" => Ok(Response::Unknown),
            other => Err(format!("expected yes, no or unknown, got '{other}'")),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Yes => write!(f, "yes"),
            Response::No => write!(f, "no"),
            Response::Unknown => write!(f, "unknown"),
        }
    }
}

/// Whether a query asks for the individual's risk or the race's population baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskMode {
    Absolute,
    PopulationAverage,
}

/// Risk factors as collected, before any cleaning.
///
/// `menarche` and `first_birth` are already categories (0-2 and 0-3). Counts are raw,
/// with `None` standing for "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRiskFactors {
    pub current_age: f64,
    pub projection_age: f64,
    pub menarche: u8,
    pub first_birth: u8,
    pub relatives: Option<u32>,
    pub ever_had_biopsy: Response,
    pub biopsy_count: Option<u32>,
    pub hyperplasia: Response,
    pub race: u8,
}

/// The five factors that select a covariate pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CovariateCategories {
    pub age_indicator: u8,
    pub menarche: u8,
    pub biopsy_count: u8,
    pub first_birth: u8,
    pub relatives: u8,
}

impl CovariateCategories {
    /// Zero-risk categories for every factor except the age indicator.
    pub fn baseline(age_indicator: u8) -> Self {
        Self {
            age_indicator,
            menarche: 0,
            biopsy_count: 0,
            first_birth: 0,
            relatives: 0,
        }
    }
}

/// Fully recoded, immutable input for one integration.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskQuery {
    current_age: f64,
    projection_age: f64,
    race: Race,
    mode: RiskMode,
    categories: CovariateCategories,
    ever_had_biopsy: bool,
    hyperplasia: Response,
    hyperplasia_multiplier: f64,
}

impl RiskQuery {
    pub fn current_age(&self) -> f64 {
        self.current_age
    }

    pub fn projection_age(&self) -> f64 {
        self.projection_age
    }

    pub fn race(&self) -> Race {
        self.race
    }

    pub fn mode(&self) -> RiskMode {
        self.mode
    }

    pub fn categories(&self) -> CovariateCategories {
        self.categories
    }

    pub fn ever_had_biopsy(&self) -> bool {
        self.ever_had_biopsy
    }

    /// Hyperplasia answer after biopsy cleaning.
    pub fn hyperplasia(&self) -> Response {
        self.hyperplasia
    }

    pub fn hyperplasia_multiplier(&self) -> f64 {
        self.hyperplasia_multiplier
    }
}

/// Applies the model's input-cleaning rules.
pub struct InputRecoder;

impl InputRecoder {
    pub fn recode(raw: &RawRiskFactors, mode: RiskMode) -> Result<RiskQuery, RiskModelError> {
        let current_age = raw.current_age;
        let projection_age = raw.projection_age;
        if !current_age.is_finite() || !projection_age.is_finite() || projection_age <= current_age
        {
            return Err(RiskModelError::InvalidAgeRange {
                current: current_age,
                projection: projection_age,
            });
        }

        let race = Race::from_code(raw.race)?;
        let menarche = Self::check_category("menarche", raw.menarche, MAX_MENARCHE_CATEGORY)?;
        let first_birth =
            Self::check_category("first_birth", raw.first_birth, MAX_FIRST_BIRTH_CATEGORY)?;
        let age_indicator = u8::from(current_age >= AGE_INDICATOR_THRESHOLD);
        let (ever_had_biopsy, biopsy_count, hyperplasia) =
            Self::clean_biopsy(raw.ever_had_biopsy, raw.biopsy_count, raw.hyperplasia)?;
        let relatives = Self::clean_relatives(raw.relatives, race)?;

        let mut categories = CovariateCategories {
            age_indicator,
            menarche,
            biopsy_count,
            first_birth,
            relatives,
        };

        // Legacy African American coding: menarche code 2 means unknown menarche and
        // no live birth.
        if race == Race::AfricanAmerican && categories.menarche == 2 {
            categories.menarche = 1;
            categories.first_birth = 0;
        }

        let hyperplasia_multiplier = match mode {
            RiskMode::Absolute => Self::hyperplasia_multiplier(hyperplasia),
            RiskMode::PopulationAverage => {
                categories = CovariateCategories::baseline(age_indicator);
                HYPERPLASIA_NEUTRAL
            }
        };

        Ok(RiskQuery {
            current_age,
            projection_age,
            race,
            mode,
            categories,
            ever_had_biopsy,
            hyperplasia,
            hyperplasia_multiplier,
        })
    }

    fn check_category(factor: &'static str, value: u8, max: u8) -> Result<u8, RiskModelError> {
        if value > max {
            return Err(RiskModelError::InvalidRiskFactor {
                factor,
                value: u32::from(value),
            });
        }
        Ok(value)
    }

    /// Returns `(ever had biopsy, biopsy-count category, hyperplasia)` after cleaning.
    pub fn clean_biopsy(
        ever_had_biopsy: Response,
        count: Option<u32>,
        hyperplasia: Response,
    ) -> Result<(bool, u8, Response), RiskModelError> {
        let had_biopsy = ever_had_biopsy == Response::Yes;
        if !had_biopsy {
            return Ok((false, 0, Response::Unknown));
        }
        let category = match count.unwrap_or(1) {
            n @ 0..=1 => n as u8,
            2..=MAX_BIOPSY_COUNT => 2,
            other => {
                return Err(RiskModelError::InvalidRiskFactor {
                    factor: "biopsy_count",
                    value: other,
                });
            }
        };
        Ok((true, category, hyperplasia))
    }

    pub fn clean_relatives(count: Option<u32>, race: Race) -> Result<u8, RiskModelError> {
        match count.unwrap_or(0) {
            0 => Ok(0),
            1 => Ok(1),
            _ if race.is_asian_subgroup() => Ok(1),
            2..=MAX_RELATIVE_COUNT => Ok(2),
            other => Err(RiskModelError::InvalidRiskFactor {
                factor: "relatives",
                value: other,
            }),
        }
    }

    pub fn hyperplasia_multiplier(hyperplasia: Response) -> f64 {
        match hyperplasia {
            Response::Yes => HYPERPLASIA_PRESENT,
            Response::No => HYPERPLASIA_ABSENT,
            Response::Unknown => HYPERPLASIA_NEUTRAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawRiskFactors {
        RawRiskFactors {
            current_age: 40.0,
            projection_age: 45.0,
            menarche: 1,
            first_birth: 2,
            relatives: Some(1),
            ever_had_biopsy: Response::Yes,
            biopsy_count: Some(1),
            hyperplasia: Response::No,
            race: 1,
        }
    }

    #[test]
    fn unknown_biopsy_history_counts_as_none() {
        let cleaned =
            InputRecoder::clean_biopsy(Response::Unknown, Some(3), Response::Yes).unwrap();
        assert_eq!(cleaned, (false, 0, Response::Unknown));
    }

    #[test]
    fn biopsy_without_count_counts_as_one() {
        let cleaned = InputRecoder::clean_biopsy(Response::Yes, None, Response::Yes).unwrap();
        assert_eq!(cleaned, (true, 1, Response::Yes));
    }

    #[test]
    fn several_biopsies_collapse_to_two_plus() {
        for count in 2..=30 {
            let (_, category, _) =
                InputRecoder::clean_biopsy(Response::Yes, Some(count), Response::No).unwrap();
            assert_eq!(category, 2);
        }
        assert!(matches!(
            InputRecoder::clean_biopsy(Response::Yes, Some(31), Response::No),
            Err(RiskModelError::InvalidRiskFactor {
                factor: "biopsy_count",
                value: 31
            })
        ));
    }

    #[test]
    fn relatives_are_capped_for_asian_subgroups() {
        assert_eq!(InputRecoder::clean_relatives(None, Race::WhiteOther).unwrap(), 0);
        assert_eq!(InputRecoder::clean_relatives(Some(1), Race::Hispanic).unwrap(), 1);
        assert_eq!(InputRecoder::clean_relatives(Some(5), Race::WhiteOther).unwrap(), 2);
        assert_eq!(InputRecoder::clean_relatives(Some(5), Race::Japanese).unwrap(), 1);
        assert_eq!(InputRecoder::clean_relatives(Some(40), Race::OtherAsian).unwrap(), 1);
        assert!(InputRecoder::clean_relatives(Some(32), Race::AfricanAmerican).is_err());
    }

    #[test]
    fn hyperplasia_multipliers() {
        assert_eq!(InputRecoder::hyperplasia_multiplier(Response::Yes), 1.82);
        assert_eq!(InputRecoder::hyperplasia_multiplier(Response::No), 0.93);
        assert_eq!(InputRecoder::hyperplasia_multiplier(Response::Unknown), 1.0);
    }

    #[test]
    fn recode_builds_categories() {
        let query = InputRecoder::recode(&raw(), RiskMode::Absolute).unwrap();
        assert_eq!(
            query.categories(),
            CovariateCategories {
                age_indicator: 0,
                menarche: 1,
                biopsy_count: 1,
                first_birth: 2,
                relatives: 1,
            }
        );
        assert_eq!(query.hyperplasia_multiplier(), HYPERPLASIA_ABSENT);
        assert!(query.ever_had_biopsy());
        assert_eq!(query.race(), Race::WhiteOther);
    }

    #[test]
    fn age_indicator_switches_at_fifty() {
        let mut input = raw();
        input.current_age = 50.0;
        input.projection_age = 55.0;
        let query = InputRecoder::recode(&input, RiskMode::Absolute).unwrap();
        assert_eq!(query.categories().age_indicator, 1);

        input.current_age = 49.9;
        let query = InputRecoder::recode(&input, RiskMode::Absolute).unwrap();
        assert_eq!(query.categories().age_indicator, 0);
    }

    #[test]
    fn african_american_legacy_menarche_code() {
        let mut input = raw();
        input.race = 2;
        input.menarche = 2;
        input.first_birth = 3;
        let query = InputRecoder::recode(&input, RiskMode::Absolute).unwrap();
        assert_eq!(query.categories().menarche, 1);
        assert_eq!(query.categories().first_birth, 0);

        input.race = 5;
        let query = InputRecoder::recode(&input, RiskMode::Absolute).unwrap();
        assert_eq!(query.categories().menarche, 2);
        assert_eq!(query.categories().first_birth, 3);
    }

    #[test]
    fn population_average_uses_baseline_pattern() {
        let mut input = raw();
        input.hyperplasia = Response::Yes;
        input.current_age = 60.0;
        input.projection_age = 65.0;
        let query = InputRecoder::recode(&input, RiskMode::PopulationAverage).unwrap();
        assert_eq!(query.categories(), CovariateCategories::baseline(1));
        assert_eq!(query.hyperplasia_multiplier(), HYPERPLASIA_NEUTRAL);
        assert_eq!(query.mode(), RiskMode::PopulationAverage);
    }

    #[test]
    fn no_biopsy_forces_unknown_hyperplasia() {
        let mut input = raw();
        input.ever_had_biopsy = Response::No;
        input.hyperplasia = Response::Yes;
        let query = InputRecoder::recode(&input, RiskMode::Absolute).unwrap();
        assert_eq!(query.hyperplasia(), Response::Unknown);
        assert_eq!(query.hyperplasia_multiplier(), HYPERPLASIA_NEUTRAL);
        assert_eq!(query.categories().biopsy_count, 0);
    }

    #[test]
    fn out_of_range_categories_are_rejected_as_risk_factors() {
        let mut input = raw();
        input.menarche = 5;
        assert!(matches!(
            InputRecoder::recode(&input, RiskMode::Absolute),
            Err(RiskModelError::InvalidRiskFactor {
                factor: "menarche",
                value: 5
            })
        ));

        let mut input = raw();
        input.first_birth = 4;
        assert!(matches!(
            InputRecoder::recode(&input, RiskMode::PopulationAverage),
            Err(RiskModelError::InvalidRiskFactor {
                factor: "first_birth",
                value: 4
            })
        ));

        input.first_birth = MAX_FIRST_BIRTH_CATEGORY;
        input.menarche = MAX_MENARCHE_CATEGORY;
        assert!(InputRecoder::recode(&input, RiskMode::Absolute).is_ok());
    }

    #[test]
    fn inverted_ages_are_rejected() {
        let mut input = raw();
        input.projection_age = input.current_age;
        assert!(matches!(
            InputRecoder::recode(&input, RiskMode::Absolute),
            Err(RiskModelError::InvalidAgeRange { .. })
        ));
        input.projection_age = f64::NAN;
        assert!(InputRecoder::recode(&input, RiskMode::Absolute).is_err());
    }

    #[test]
    fn responses_parse_from_text() {
        assert_eq!("Yes".parse::<Response>().unwrap(), Response::Yes);
        assert_eq!(" no ".parse::<Response>().unwrap(), Response::No);
        assert_eq!("unknown".parse::<Response>().unwrap(), Response::Unknown);
        assert!("maybe".parse::<Response>().is_err());
    }
}
