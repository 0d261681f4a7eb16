#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

//! Competing-risks projection of absolute breast cancer risk (Gail model 2).
//!
//! Flow: [`tables`] owns the race-specific tables, [`recode`] cleans raw answers into
//! categories, [`pattern`] indexes them, [`predictor`] turns coefficients into per-pattern
//! log relative risks, and [`integrator`] accumulates risk over the age bands.
//! [`assessment`] wraps the engine for questionnaire-level requests.

mod constants;

pub mod assessment;
pub mod error;
pub mod integrator;
pub mod pattern;
pub mod predictor;
pub mod recode;
pub mod tables;

pub use error::{AssessmentError, RiskModelError};
pub use integrator::{HazardIntegrator, RiskResult};
pub use recode::{InputRecoder, RawRiskFactors, Response, RiskMode, RiskQuery};
pub use tables::{Race, RiskTableRepository, RiskTables};
