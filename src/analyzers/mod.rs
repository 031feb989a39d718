//! Bottleneck ranking and optimization advice.
//!
//! Rows are grouped by stage, averaged, ranked by descending mean cycle
//! time, and each top stage is turned into a text recommendation.

pub mod bottleneck;
pub mod recommend;
pub mod types;
pub mod utility;

