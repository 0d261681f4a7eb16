//! Questionnaire-level risk assessment built on the hazard integrator.
//!
//! A questionnaire is validated, mapped to model categories, and projected twice: over
//! the next five years and over the remaining lifetime (to age 90 or fifty years ahead,
//! whichever comes first). The five-year relative risk decides the risk category and
//! the accompanying guidance.

use crate::error::AssessmentError;
use crate::integrator::{HazardIntegrator, RiskResult};
use crate::recode::{RawRiskFactors, Response};
use crate::tables::Race;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const MIN_AGE: u32 = 35;
pub const MAX_AGE: u32 = 85;
pub const SHORT_TERM_YEARS: u32 = 5;
pub const LIFETIME_YEARS: u32 = 50;
pub const LIFETIME_HORIZON: u32 = 90;

/// Relative-risk threshold from which a woman is considered high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 1.67;

const MENARCHE_RANGE: std::ops::RangeInclusive<u32> = 7..=17;
const FIRST_BIRTH_RANGE: std::ops::RangeInclusive<u32> = 10..=55;
const MAX_RELATIVES: u32 = 10;
const BIOPSY_RANGE: std::ops::RangeInclusive<u32> = 1..=30;
const ASIAN_SUBGROUP_RANGE: std::ops::RangeInclusive<u8> = 7..=12;

/// Race/ethnicity as asked on the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceGroup {
    White,
    AfricanAmerican,
    Hispanic,
    AsianPacificIslander,
    Other,
}

impl FromStr for RaceGroup {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "white" => Ok(RaceGroup::White),
            "african_american" | "black" => Ok(RaceGroup::AfricanAmerican),
            "hispanic" => Ok(RaceGroup::Hispanic),
            "asian_pacific_islander" | "asian" => Ok(RaceGroup::AsianPacificIslander),
            "other" => Ok(RaceGroup::Other),
            other => Err(format!(
                "unknown race group '{other}'; expected white, african_american, hispanic, asian_pacific_islander or other"
            )),
        }
    }
}

/// Answers collected from the person being assessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    /// Prior breast cancer, DCIS, LCIS, or chest radiotherapy.
    pub has_breast_cancer_history: bool,
    /// Known BRCA1/BRCA2 mutation or hereditary syndrome.
    #[serde(default)]
    pub has_genetic_mutation: Response,
    pub age: u32,
    pub race: RaceGroup,
    /// Race code 7-12, only for `asian_pacific_islander`.
    #[serde(default)]
    pub asian_subgroup: Option<u8>,
    #[serde(default)]
    pub ever_had_biopsy: Response,
    #[serde(default)]
    pub number_of_biopsies: Option<u32>,
    #[serde(default)]
    pub has_atypical_hyperplasia: Response,
    pub age_at_menarche: u32,
    /// `None` when there has been no live birth.
    #[serde(default)]
    pub age_at_first_birth: Option<u32>,
    #[serde(default)]
    pub num_first_degree_relatives: u32,
}

impl Questionnaire {
    pub fn validate(&self) -> Result<(), AssessmentError> {
        if self.has_breast_cancer_history {
            return Err(AssessmentError::Ineligible(
                "the model only applies to women without a history of breast cancer, DCIS, LCIS or chest radiotherapy".to_string(),
            ));
        }
        if self.has_genetic_mutation == Response::Yes {
            return Err(AssessmentError::Ineligible(
                "the model is not recommended for carriers of a BRCA1/BRCA2 mutation; consult a genetic counsellor".to_string(),
            ));
        }
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(AssessmentError::Invalid(format!(
                "age {} is outside {MIN_AGE}-{MAX_AGE}",
                self.age
            )));
        }
        if !MENARCHE_RANGE.contains(&self.age_at_menarche) {
            return Err(AssessmentError::Invalid(format!(
                "age at menarche {} is outside 7-17",
                self.age_at_menarche
            )));
        }
        if let Some(first_birth) = self.age_at_first_birth {
            if !FIRST_BIRTH_RANGE.contains(&first_birth) {
                return Err(AssessmentError::Invalid(format!(
                    "age at first live birth {first_birth} is outside 10-55"
                )));
            }
            if first_birth >= self.age {
                return Err(AssessmentError::Invalid(format!(
                    "age at first live birth {first_birth} must be below the current age {}",
                    self.age
                )));
            }
        }
        if self.num_first_degree_relatives > MAX_RELATIVES {
            return Err(AssessmentError::Invalid(format!(
                "{} affected first-degree relatives exceeds the maximum of {MAX_RELATIVES}",
                self.num_first_degree_relatives
            )));
        }
        if let Some(count) = self.number_of_biopsies {
            if self.ever_had_biopsy != Response::Yes {
                return Err(AssessmentError::Invalid(format!(
                    "{count} biopsies given but ever_had_biopsy is '{}'",
                    self.ever_had_biopsy
                )));
            }
            if !BIOPSY_RANGE.contains(&count) {
                return Err(AssessmentError::Invalid(format!(
                    "number of biopsies {count} is outside 1-30"
                )));
            }
        }
        if let Some(subgroup) = self.asian_subgroup {
            if self.race != RaceGroup::AsianPacificIslander {
                return Err(AssessmentError::Invalid(
                    "an Asian subgroup can only be given for asian_pacific_islander".to_string(),
                ));
            }
            if !ASIAN_SUBGROUP_RANGE.contains(&subgroup) {
                return Err(AssessmentError::Invalid(format!(
                    "Asian subgroup code {subgroup} is outside 7-12"
                )));
            }
        }
        Ok(())
    }

    /// Model race code for the questionnaire's answers.
    pub fn race_code(&self) -> u8 {
        match (self.race, self.asian_subgroup) {
            (RaceGroup::AsianPacificIslander, Some(subgroup)) => subgroup,
            (RaceGroup::AsianPacificIslander, None) => Race::OtherAsian.code(),
            (RaceGroup::White | RaceGroup::Other, _) => Race::WhiteOther.code(),
            (RaceGroup::AfricanAmerican, _) => Race::AfricanAmerican.code(),
            (RaceGroup::Hispanic, _) => Race::Hispanic.code(),
        }
    }

    /// Model inputs for the interval from the current age to `projection_age`.
    pub fn risk_factors(&self, projection_age: u32) -> RawRiskFactors {
        RawRiskFactors {
            current_age: f64::from(self.age),
            projection_age: f64::from(projection_age),
            menarche: menarche_category(self.age_at_menarche),
            first_birth: first_birth_category(self.age_at_first_birth),
            relatives: Some(self.num_first_degree_relatives),
            ever_had_biopsy: self.ever_had_biopsy,
            biopsy_count: self.number_of_biopsies,
            hyperplasia: self.has_atypical_hyperplasia,
            race: self.race_code(),
        }
    }

    pub fn short_term_projection_age(&self) -> u32 {
        self.age + SHORT_TERM_YEARS
    }

    pub fn lifetime_projection_age(&self) -> u32 {
        (self.age + LIFETIME_YEARS).min(LIFETIME_HORIZON)
    }
}

/// 14 or older: 0, 12-13: 1, younger: 2.
pub fn menarche_category(age_at_menarche: u32) -> u8 {
    match age_at_menarche {
        14.. => 0,
        12..=13 => 1,
        _ => 2,
    }
}

/// Under 20: 0, 20-24: 1, 25-29 or no live birth: 2, 30 and over: 3.
pub fn first_birth_category(age_at_first_birth: Option<u32>) -> u8 {
    match age_at_first_birth {
        None => 2,
        Some(0..=19) => 0,
        Some(20..=24) => 1,
        Some(25..=29) => 2,
        Some(_) => 3,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
}

impl RiskCategory {
    pub fn from_relative_risk(relative_risk: f64) -> Self {
        if relative_risk < 1.0 {
            RiskCategory::Low
        } else if relative_risk < HIGH_RISK_THRESHOLD {
            RiskCategory::Moderate
        } else {
            RiskCategory::High
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskCategory::Low => write!(f, "low"),
            RiskCategory::Moderate => write!(f, "moderate"),
            RiskCategory::High => write!(f, "high"),
        }
    }
}

pub fn interpretation(result: &RiskResult, category: RiskCategory) -> String {
    let lead = format!(
        "Your risk is {:.2} times the average (probability of a diagnosis in the next 5 years: {:.2}%).",
        result.relative_risk,
        result.absolute_risk * 100.0
    );
    let guidance = match category {
        RiskCategory::Low => {
            "This is below average, but the recommended screening should still be followed."
        }
        RiskCategory::Moderate => {
            "This is within the normal range. Standard screening guidelines are recommended."
        }
        RiskCategory::High => {
            "This is above average. Discuss prevention and closer screening with your physician."
        }
    };
    format!("{lead} {guidance}")
}

pub fn recommendations(category: RiskCategory, age: u32, relative_risk: f64) -> Vec<String> {
    let mut advice = Vec::new();
    if age >= 40 {
        advice.push("Annual or biennial mammography as advised by your physician".to_string());
    } else {
        advice.push("Annual clinical breast examination".to_string());
    }
    advice.extend(
        [
            "Monthly breast self-examination",
            "Maintain a healthy weight and exercise regularly",
            "Limit alcohol consumption",
            "Eat a diet rich in fruit and vegetables",
        ]
        .map(String::from),
    );

    if category == RiskCategory::High || relative_risk >= HIGH_RISK_THRESHOLD {
        advice.extend(
            [
                "Referral to an oncologist or a high-risk breast clinic",
                "Consider annual breast MRI in addition to mammography",
                "Genetic counselling if there is a strong family history",
                "Discuss chemoprevention such as tamoxifen or raloxifene",
            ]
            .map(String::from),
        );
    }
    if age >= 50 && category != RiskCategory::Low {
        advice.push("Clinical breast examination every 6 months".to_string());
    }
    if age < 40 && category == RiskCategory::High {
        advice.push("Start screening before age 40 as advised by your physician".to_string());
    }
    advice
}

/// Full result for one questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub age: u32,
    pub race: Race,
    pub five_year: RiskResult,
    pub lifetime: RiskResult,
    pub category: RiskCategory,
    pub interpretation: String,
    pub recommendations: Vec<String>,
}

pub fn assess(
    engine: &HazardIntegrator,
    questionnaire: &Questionnaire,
) -> Result<RiskAssessment, AssessmentError> {
    questionnaire.validate()?;
    let five_year =
        engine.project(&questionnaire.risk_factors(questionnaire.short_term_projection_age()))?;
    let lifetime =
        engine.project(&questionnaire.risk_factors(questionnaire.lifetime_projection_age()))?;
    let category = RiskCategory::from_relative_risk(five_year.relative_risk);

    Ok(RiskAssessment {
        age: questionnaire.age,
        race: five_year.race,
        five_year,
        lifetime,
        category,
        interpretation: interpretation(&five_year, category),
        recommendations: recommendations(category, questionnaire.age, five_year.relative_risk),
    })
}

/// Assesses every questionnaire in parallel. Results keep the input order.
pub fn assess_batch(
    engine: &HazardIntegrator,
    questionnaires: &[Questionnaire],
) -> Vec<Result<RiskAssessment, AssessmentError>> {
    questionnaires
        .par_iter()
        .enumerate()
        .map(|(row, questionnaire)| {
            assess(engine, questionnaire).inspect_err(|e| {
                log::warn!("Questionnaire {} rejected: {}", row + 1, e);
            })
        })
        .collect()
}

/// Assesses questionnaires as read from a file, keeping unreadable rows in place as
/// failures.
pub fn assess_records(
    engine: &HazardIntegrator,
    records: Vec<Result<Questionnaire, AssessmentError>>,
) -> Vec<Result<RiskAssessment, AssessmentError>> {
    records
        .into_par_iter()
        .enumerate()
        .map(|(row, record)| {
            record
                .and_then(|questionnaire| assess(engine, &questionnaire))
                .inspect_err(|e| {
                    log::warn!("Questionnaire {} rejected: {}", row + 1, e);
                })
        })
        .collect()
}

/// Reads questionnaires from a CSV file with one header row named after the fields.
///
/// Only an unreadable file or header fails the whole read; a row that does not
/// deserialize is returned as an error in its position.
pub fn read_questionnaires(
    path: impl AsRef<Path>,
) -> Result<Vec<Result<Questionnaire, AssessmentError>>, AssessmentError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    reader.headers()?;
    let records = reader
        .deserialize()
        .map(|record| record.map_err(AssessmentError::from))
        .collect();
    Ok(records)
}

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    row: usize,
    status: &'a str,
    race: String,
    age: Option<u32>,
    absolute_risk_5_year: Option<f64>,
    average_risk_5_year: Option<f64>,
    relative_risk_5_year: Option<f64>,
    absolute_risk_lifetime: Option<f64>,
    average_risk_lifetime: Option<f64>,
    relative_risk_lifetime: Option<f64>,
    lifetime_projection_age: Option<f64>,
    category: Option<RiskCategory>,
    message: String,
}

/// Writes one tab-separated line per questionnaire, failures included.
pub fn write_report(
    path: impl AsRef<Path>,
    results: &[Result<RiskAssessment, AssessmentError>],
) -> Result<(), AssessmentError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;
    for (index, result) in results.iter().enumerate() {
        let row = match result {
            Ok(assessment) => ReportRow {
                row: index + 1,
                status: "ok",
                race: assessment.race.name().to_string(),
                age: Some(assessment.age),
                absolute_risk_5_year: Some(assessment.five_year.absolute_risk),
                average_risk_5_year: Some(assessment.five_year.average_risk),
                relative_risk_5_year: Some(assessment.five_year.relative_risk),
                absolute_risk_lifetime: Some(assessment.lifetime.absolute_risk),
                average_risk_lifetime: Some(assessment.lifetime.average_risk),
                relative_risk_lifetime: Some(assessment.lifetime.relative_risk),
                lifetime_projection_age: Some(assessment.lifetime.projection_age),
                category: Some(assessment.category),
                message: String::new(),
            },
            Err(e) => ReportRow {
                row: index + 1,
                status: match e {
                    AssessmentError::Ineligible(_) => "ineligible",
                    _ => "invalid",
                },
                race: String::new(),
                age: None,
                absolute_risk_5_year: None,
                average_risk_5_year: None,
                relative_risk_5_year: None,
                absolute_risk_lifetime: None,
                average_risk_lifetime: None,
                relative_risk_lifetime: None,
                lifetime_projection_age: None,
                category: None,
                message: e.to_string(),
            },
        };
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
