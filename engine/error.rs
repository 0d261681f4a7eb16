use thiserror::Error;

/// Errors raised while building the risk tables or evaluating a projection.
///
/// `InvalidAgeRange`, `UnknownRace` and `InvalidRiskFactor` reject a single request.
/// The remaining variants mean the tables or the design layout no longer agree with the
/// model and are never recovered from by clamping.
#[derive(Error, Debug)]
pub enum RiskModelError {
    #[error(
        "Age interval [{current}, {projection}] is not supported: the projection age must exceed the current age and both must lie within the tabulated age bands."
    )]
    InvalidAgeRange { current: f64, projection: f64 },

    #[error("Race code {0} is not one of the 12 supported race/ethnicity groups.")]
    UnknownRace(u8),

    #[error("Risk factor '{factor}' has unsupported value {value}.")]
    InvalidRiskFactor { factor: &'static str, value: u32 },

    #[error(
        "Covariate pattern is out of range (age={age_indicator}, menarche={menarche}, biopsies={biopsy_count}, first birth={first_birth}, relatives={relatives})."
    )]
    PatternOutOfRange {
        age_indicator: u8,
        menarche: u8,
        biopsy_count: u8,
        first_birth: u8,
        relatives: u8,
    },

    #[error("Pattern index {0} lies outside [1, 216].")]
    PatternIndexOutOfRange(usize),

    #[error("Table '{table}' for race code {race} has {found} entries, expected {expected}.")]
    TableShapeMismatch {
        table: &'static str,
        race: u8,
        expected: usize,
        found: usize,
    },

    #[error("Age boundaries must be finite and strictly increasing.")]
    NonMonotonicBoundaries,

    #[error("Table '{table}' for race code {race} holds an invalid value {value} at position {position}.")]
    InvalidTableValue {
        table: &'static str,
        race: u8,
        position: usize,
        value: f64,
    },

    #[error("Race code {0} appears more than once in the table set.")]
    DuplicateRace(u8),

    #[error("Race code {0} has no tables in the table set.")]
    MissingRace(u8),

    #[error("Projected risk {value} is not a probability; the tables or coefficients are inconsistent.")]
    RiskOutOfRange { value: f64 },

    #[error("Failed to read or write table file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML table file: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize tables to TOML format: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Errors raised while validating or assessing a questionnaire.
#[derive(Error, Debug)]
pub enum AssessmentError {
    #[error("The risk model does not apply: {0}")]
    Ineligible(String),

    #[error("Invalid questionnaire: {0}")]
    Invalid(String),

    #[error(transparent)]
    Model(#[from] RiskModelError),

    #[error("Failed to read or write questionnaire CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
