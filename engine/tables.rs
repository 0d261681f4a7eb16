//! Race-specific model tables and the repository that owns them.
//!
//! The repository is assembled once, validated eagerly, and then only read. Every
//! projection borrows the same repository, so nothing in here carries interior
//! mutability.

use crate::constants::*;
use crate::error::RiskModelError;
use itertools::Itertools;
use log::{info, warn};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Number of piecewise-constant age bands.
pub const BAND_COUNT: usize = 14;
/// Number of coefficients in the relative-risk design layout.
pub const COEFFICIENT_COUNT: usize = 8;
/// Age at which the regression model switches to its age-50-and-over half.
pub const AGE_INDICATOR_THRESHOLD: f64 = 50.0;

/// The twelve race/ethnicity groups the model is calibrated for.
///
/// Codes follow the published model: 1-3 are the individual-risk groups, 4-6 their
/// "average woman" counterparts, and 7-12 the Asian and Pacific Islander subgroups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Race {
    WhiteOther,
    AfricanAmerican,
    Hispanic,
    WhiteAverage,
    AfricanAmericanAverage,
    HispanicAverage,
    Chinese,
    Japanese,
    Filipino,
    Hawaiian,
    OtherPacificIslander,
    OtherAsian,
}

impl Race {
    pub const ALL: [Race; 12] = [
        Race::WhiteOther,
        Race::AfricanAmerican,
        Race::Hispanic,
        Race::WhiteAverage,
        Race::AfricanAmericanAverage,
        Race::HispanicAverage,
        Race::Chinese,
        Race::Japanese,
        Race::Filipino,
        Race::Hawaiian,
        Race::OtherPacificIslander,
        Race::OtherAsian,
    ];

    pub fn from_code(code: u8) -> Result<Self, RiskModelError> {
        match code {
            1..=12 => Ok(Self::ALL[usize::from(code) - 1]),
            other => Err(RiskModelError::UnknownRace(other)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Race::WhiteOther => 1,
            Race::AfricanAmerican => 2,
            Race::Hispanic => 3,
            Race::WhiteAverage => 4,
            Race::AfricanAmericanAverage => 5,
            Race::HispanicAverage => 6,
            Race::Chinese => 7,
            Race::Japanese => 8,
            Race::Filipino => 9,
            Race::Hawaiian => 10,
            Race::OtherPacificIslander => 11,
            Race::OtherAsian => 12,
        }
    }

    pub fn is_asian_subgroup(self) -> bool {
        self.code() >= 7
    }

    /// The group whose incidence, mortality and attributable risk describe the average
    /// woman of this race. Asian subgroups are their own reference.
    pub fn population_reference(self) -> Race {
        match self {
            Race::WhiteOther | Race::WhiteAverage => Race::WhiteAverage,
            Race::AfricanAmerican | Race::AfricanAmericanAverage => Race::AfricanAmericanAverage,
            Race::Hispanic | Race::HispanicAverage => Race::HispanicAverage,
            asian => asian,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Race::WhiteOther => "White/Other",
            Race::AfricanAmerican => "African American",
            Race::Hispanic => "Hispanic",
            Race::WhiteAverage => "Average White/Other",
            Race::AfricanAmericanAverage => "Average African American",
            Race::HispanicAverage => "Average Hispanic",
            Race::Chinese => "Chinese",
            Race::Japanese => "Japanese",
            Race::Filipino => "Filipino",
            Race::Hawaiian => "Hawaiian",
            Race::OtherPacificIslander => "Other Pacific Islander",
            Race::OtherAsian => "Other Asian",
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// One minus the attributable risk, for bands below 50 and for bands from 50 onward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributableRisk {
    pub below_50: f64,
    pub from_50: f64,
}

impl AttributableRisk {
    fn from_pair(pair: (f64, f64)) -> Self {
        Self {
            below_50: pair.0,
            from_50: pair.1,
        }
    }

    /// Scalar applied to the incidence of a band starting at `band_lower_age`.
    #[inline]
    pub fn for_band(&self, band_lower_age: f64) -> f64 {
        if band_lower_age < AGE_INDICATOR_THRESHOLD {
            self.below_50
        } else {
            self.from_50
        }
    }
}

/// Strictly increasing age edges; band `b` is the half-open interval `[edge b, edge b+1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeBoundaryTable {
    edges: Array1<f64>,
}

impl AgeBoundaryTable {
    pub fn new(edges: Vec<f64>) -> Result<Self, RiskModelError> {
        if edges.len() != BAND_COUNT + 1 {
            return Err(RiskModelError::TableShapeMismatch {
                table: "age_boundaries",
                race: 0,
                expected: BAND_COUNT + 1,
                found: edges.len(),
            });
        }
        let increasing = edges.iter().all(|edge| edge.is_finite())
            && edges.iter().tuple_windows().all(|(lo, hi)| lo < hi);
        if !increasing {
            return Err(RiskModelError::NonMonotonicBoundaries);
        }
        Ok(Self {
            edges: Array1::from(edges),
        })
    }

    pub fn edges(&self) -> ArrayView1<'_, f64> {
        self.edges.view()
    }

    pub fn band_count(&self) -> usize {
        self.edges.len() - 1
    }

    #[inline]
    pub fn lower(&self, band: usize) -> f64 {
        self.edges[band]
    }

    #[inline]
    pub fn upper(&self, band: usize) -> f64 {
        self.edges[band + 1]
    }

    pub fn first_age(&self) -> f64 {
        self.edges[0]
    }

    pub fn last_age(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Band holding an interval that starts at `age`: the first edge strictly above
    /// `age` closes it. `None` when `age` is before the first edge or at/after the last.
    pub fn band_starting_at(&self, age: f64) -> Option<usize> {
        let breach = self.edges.iter().position(|&edge| age < edge)?;
        breach.checked_sub(1)
    }

    /// Band holding an interval that ends at `age`: the first edge at or above `age`
    /// closes it. `None` when `age` is at/before the first edge or after the last.
    pub fn band_ending_at(&self, age: f64) -> Option<usize> {
        let breach = self.edges.iter().position(|&edge| age <= edge)?;
        breach.checked_sub(1)
    }
}

/// Immutable tables for one race.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceProfile {
    race: Race,
    mortality: Array1<f64>,
    incidence: Array1<f64>,
    coefficients: Array1<f64>,
    attributable_risk: AttributableRisk,
}

impl RaceProfile {
    pub fn race(&self) -> Race {
        self.race
    }

    /// Competing (non-breast-cancer) mortality per band.
    pub fn mortality(&self) -> ArrayView1<'_, f64> {
        self.mortality.view()
    }

    /// Baseline breast cancer incidence per band, before attributable-risk scaling.
    pub fn incidence(&self) -> ArrayView1<'_, f64> {
        self.incidence.view()
    }

    pub fn coefficients(&self) -> ArrayView1<'_, f64> {
        self.coefficients.view()
    }

    pub fn attributable_risk(&self) -> AttributableRisk {
        self.attributable_risk
    }
}

/// Plain description of a full table set; this is the TOML file layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTables {
    pub age_boundaries: Vec<f64>,
    pub asian_population_attributable_risk: AttributableRisk,
    pub races: Vec<RaceTables>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceTables {
    /// Race code, 1-12.
    pub race: u8,
    pub mortality: Vec<f64>,
    pub incidence: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub attributable_risk: AttributableRisk,
}

impl RiskTables {
    /// The published BCRAT tables.
    pub fn bcrat() -> Self {
        let white_average_mortality = per_100k(&MORTALITY_WHITE_AVERAGE_PER_100K);
        let white_average_incidence = per_100k(&INCIDENCE_WHITE_AVERAGE_PER_100K);
        let hispanic_mortality = per_100k(&MORTALITY_HISPANIC_PER_100K);
        let hispanic_incidence = per_100k(&INCIDENCE_HISPANIC_PER_100K);

        let races = vec![
            race_tables(
                Race::WhiteOther,
                per_100k(&MORTALITY_WHITE_PER_100K),
                per_100k(&INCIDENCE_WHITE_PER_100K),
                &COEFFICIENTS_WHITE,
                ATTRIBUTABLE_WHITE,
            ),
            race_tables(
                Race::AfricanAmerican,
                MORTALITY_AFRICAN_AMERICAN.to_vec(),
                INCIDENCE_AFRICAN_AMERICAN.to_vec(),
                &COEFFICIENTS_AFRICAN_AMERICAN,
                ATTRIBUTABLE_AFRICAN_AMERICAN,
            ),
            race_tables(
                Race::Hispanic,
                hispanic_mortality.clone(),
                hispanic_incidence.clone(),
                &COEFFICIENTS_WHITE,
                ATTRIBUTABLE_HISPANIC,
            ),
            race_tables(
                Race::WhiteAverage,
                white_average_mortality,
                white_average_incidence,
                &COEFFICIENTS_WHITE,
                ATTRIBUTABLE_AVERAGE,
            ),
            race_tables(
                Race::AfricanAmericanAverage,
                MORTALITY_AFRICAN_AMERICAN.to_vec(),
                INCIDENCE_AFRICAN_AMERICAN.to_vec(),
                &COEFFICIENTS_AFRICAN_AMERICAN,
                ATTRIBUTABLE_AVERAGE,
            ),
            race_tables(
                Race::HispanicAverage,
                hispanic_mortality,
                hispanic_incidence,
                &COEFFICIENTS_WHITE,
                ATTRIBUTABLE_AVERAGE,
            ),
            asian_tables(Race::Chinese, &MORTALITY_CHINESE, &INCIDENCE_CHINESE),
            asian_tables(Race::Japanese, &MORTALITY_JAPANESE, &INCIDENCE_JAPANESE),
            asian_tables(Race::Filipino, &MORTALITY_FILIPINO, &INCIDENCE_FILIPINO),
            asian_tables(Race::Hawaiian, &MORTALITY_HAWAIIAN, &INCIDENCE_HAWAIIAN),
            asian_tables(
                Race::OtherPacificIslander,
                &MORTALITY_OTHER_PACIFIC_ISLANDER,
                &INCIDENCE_OTHER_PACIFIC_ISLANDER,
            ),
            asian_tables(
                Race::OtherAsian,
                &MORTALITY_OTHER_ASIAN,
                &INCIDENCE_OTHER_ASIAN,
            ),
        ];

        Self {
            age_boundaries: AGE_BOUNDARIES.to_vec(),
            asian_population_attributable_risk: AttributableRisk::from_pair(
                ATTRIBUTABLE_ASIAN_POPULATION,
            ),
            races,
        }
    }
}

fn per_100k(rates: &[f64; BAND_COUNT]) -> Vec<f64> {
    rates.iter().map(|rate| rate * PER_100K).collect()
}

fn race_tables(
    race: Race,
    mortality: Vec<f64>,
    incidence: Vec<f64>,
    coefficients: &[f64; COEFFICIENT_COUNT],
    attributable_risk: (f64, f64),
) -> RaceTables {
    RaceTables {
        race: race.code(),
        mortality,
        incidence,
        coefficients: coefficients.to_vec(),
        attributable_risk: AttributableRisk::from_pair(attributable_risk),
    }
}

fn asian_tables(
    race: Race,
    mortality: &[f64; BAND_COUNT],
    incidence: &[f64; BAND_COUNT],
) -> RaceTables {
    race_tables(
        race,
        mortality.to_vec(),
        incidence.to_vec(),
        &COEFFICIENTS_ASIAN,
        ATTRIBUTABLE_ASIAN,
    )
}

/// Owner of the age boundaries and all twelve race profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskTableRepository {
    boundaries: AgeBoundaryTable,
    /// Indexed by race code minus one.
    profiles: Vec<RaceProfile>,
    asian_population_attributable_risk: AttributableRisk,
}

impl RiskTableRepository {
    /// Builds the repository from the embedded BCRAT constants.
    pub fn bcrat() -> Result<Self, RiskModelError> {
        Self::from_tables(RiskTables::bcrat())
    }

    /// Validates a table set and assembles the repository from it.
    pub fn from_tables(tables: RiskTables) -> Result<Self, RiskModelError> {
        let boundaries = AgeBoundaryTable::new(tables.age_boundaries)?;
        let asian_population_attributable_risk = validated_attributable_risk(
            tables.asian_population_attributable_risk,
            0,
        )?;

        let mut slots: Vec<Option<RaceProfile>> = vec![None; Race::ALL.len()];
        for entry in tables.races {
            let race = Race::from_code(entry.race)?;
            let slot = &mut slots[usize::from(race.code()) - 1];
            if slot.is_some() {
                return Err(RiskModelError::DuplicateRace(race.code()));
            }
            *slot = Some(RaceProfile {
                race,
                mortality: validated_rates("mortality", race, entry.mortality, BAND_COUNT)?,
                incidence: validated_rates("incidence", race, entry.incidence, BAND_COUNT)?,
                coefficients: validated_coefficients(race, entry.coefficients)?,
                attributable_risk: validated_attributable_risk(
                    entry.attributable_risk,
                    race.code(),
                )?,
            });
        }

        let profiles = slots
            .into_iter()
            .zip(Race::ALL)
            .map(|(slot, race)| slot.ok_or(RiskModelError::MissingRace(race.code())))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Risk tables ready: {} races over ages {}-{}",
            profiles.len(),
            boundaries.first_age(),
            boundaries.last_age()
        );

        Ok(Self {
            boundaries,
            profiles,
            asian_population_attributable_risk,
        })
    }

    /// Exports the repository back into its plain description.
    pub fn to_tables(&self) -> RiskTables {
        RiskTables {
            age_boundaries: self.boundaries.edges().to_vec(),
            asian_population_attributable_risk: self.asian_population_attributable_risk,
            races: self
                .profiles
                .iter()
                .map(|profile| RaceTables {
                    race: profile.race.code(),
                    mortality: profile.mortality.to_vec(),
                    incidence: profile.incidence.to_vec(),
                    coefficients: profile.coefficients.to_vec(),
                    attributable_risk: profile.attributable_risk,
                })
                .collect(),
        }
    }

    /// Writes the tables to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RiskModelError> {
        let toml_string = toml::to_string_pretty(&self.to_tables())?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads and validates tables from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RiskModelError> {
        let path = path.as_ref();
        warn!(
            "Loading risk tables from {}; the embedded BCRAT tables are not used",
            path.display()
        );
        let toml_string = fs::read_to_string(path)?;
        let tables: RiskTables = toml::from_str(&toml_string)?;
        Self::from_tables(tables)
    }

    pub fn boundaries(&self) -> &AgeBoundaryTable {
        &self.boundaries
    }

    pub fn profiles(&self) -> &[RaceProfile] {
        &self.profiles
    }

    pub fn profile(&self, race: Race) -> &RaceProfile {
        &self.profiles[usize::from(race.code()) - 1]
    }

    pub fn profile_for(&self, race_code: u8) -> Result<&RaceProfile, RiskModelError> {
        Race::from_code(race_code).map(|race| self.profile(race))
    }

    pub fn asian_population_attributable_risk(&self) -> AttributableRisk {
        self.asian_population_attributable_risk
    }

    /// Incidence/mortality source and attributable-risk pair for the average woman of
    /// `race`. Asian subgroups keep their own rates and share one population pair.
    pub fn population_reference(&self, race: Race) -> (&RaceProfile, AttributableRisk) {
        if race.is_asian_subgroup() {
            (
                self.profile(race),
                self.asian_population_attributable_risk,
            )
        } else {
            let reference = self.profile(race.population_reference());
            (reference, reference.attributable_risk)
        }
    }
}

fn validated_rates(
    table: &'static str,
    race: Race,
    values: Vec<f64>,
    expected: usize,
) -> Result<Array1<f64>, RiskModelError> {
    if values.len() != expected {
        return Err(RiskModelError::TableShapeMismatch {
            table,
            race: race.code(),
            expected,
            found: values.len(),
        });
    }
    if let Some((position, &value)) = values
        .iter()
        .enumerate()
        .find(|(_, value)| !value.is_finite() || **value < 0.0)
    {
        return Err(RiskModelError::InvalidTableValue {
            table,
            race: race.code(),
            position,
            value,
        });
    }
    Ok(Array1::from(values))
}

fn validated_coefficients(race: Race, values: Vec<f64>) -> Result<Array1<f64>, RiskModelError> {
    if values.len() != COEFFICIENT_COUNT {
        return Err(RiskModelError::TableShapeMismatch {
            table: "coefficients",
            race: race.code(),
            expected: COEFFICIENT_COUNT,
            found: values.len(),
        });
    }
    if let Some((position, &value)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(RiskModelError::InvalidTableValue {
            table: "coefficients",
            race: race.code(),
            position,
            value,
        });
    }
    Ok(Array1::from(values))
}

fn validated_attributable_risk(
    pair: AttributableRisk,
    race_code: u8,
) -> Result<AttributableRisk, RiskModelError> {
    for (position, value) in [pair.below_50, pair.from_50].into_iter().enumerate() {
        if !(value.is_finite() && value > 0.0 && value <= 1.0) {
            return Err(RiskModelError::InvalidTableValue {
                table: "attributable_risk",
                race: race_code,
                position,
                value,
            });
        }
    }
    Ok(pair)
}
