//! Attendance effort and fundamento ranking for volleyball squads.
//!
//! [`effort`] and [`ranking`] are pure functions over caller-supplied records;
//! [`db`] is the Postgres adapter the CLI uses to feed them.

pub mod config;
pub mod db;
pub mod effort;
pub mod models;
pub mod ranking;
pub mod report;
pub mod telemetry;

pub use effort::{compute_effort_index, EffortCalculator, EffortError};
pub use ranking::{compute_fundamento_ranking, RankingOptions, RankingWindow};
