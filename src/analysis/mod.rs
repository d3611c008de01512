//! Local shaping of detection results.
//!
//! The model service returns raw boxes and counts; everything derived
//! from them (overlap suppression, maturity mapping, recommendations,
//! breakdowns) is computed here.

pub mod brood;
pub mod queen;
