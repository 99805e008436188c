use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::effort::{EffortCalculator, DEFAULT_EFFORT_WINDOW};
use crate::ranking::{RankingOptions, DEFAULT_MINIMUM_ATTEMPTS, DEFAULT_WEIGHT_BOUND};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("DATABASE_URL must be set to a Postgres instance")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub scoring: ScoringConfig,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn url(&self) -> Result<&str, ConfigError> {
        self.url.as_deref().ok_or(ConfigError::MissingDatabaseUrl)
    }
}

/// Tunables for both scoring components.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub effort_window: usize,
    pub minimum_attempts: usize,
    pub weight_bound: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            effort_window: DEFAULT_EFFORT_WINDOW,
            minimum_attempts: DEFAULT_MINIMUM_ATTEMPTS,
            weight_bound: DEFAULT_WEIGHT_BOUND,
        }
    }
}

impl ScoringConfig {
    pub fn effort_calculator(&self) -> EffortCalculator {
        // Window is validated on load, so this only falls back for hand-built configs.
        EffortCalculator::new(self.effort_window).unwrap_or_default()
    }

    pub fn ranking_options(&self) -> RankingOptions {
        RankingOptions {
            minimum_attempts: self.minimum_attempts,
            weight_bound: self.weight_bound,
            ..RankingOptions::default()
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let effort_window: usize = parse_var("SQUAD_PULSE_EFFORT_WINDOW", DEFAULT_EFFORT_WINDOW)?;
        if effort_window == 0 {
            return Err(ConfigError::Invalid {
                name: "SQUAD_PULSE_EFFORT_WINDOW",
                expected: "window of at least 1",
                value: "0".to_string(),
            });
        }

        let weight_bound: f64 = parse_var("SQUAD_PULSE_WEIGHT_BOUND", DEFAULT_WEIGHT_BOUND)?;
        if !weight_bound.is_finite() || weight_bound <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "SQUAD_PULSE_WEIGHT_BOUND",
                expected: "positive number",
                value: weight_bound.to_string(),
            });
        }

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                max_connections: parse_var("SQUAD_PULSE_DB_MAX_CONNECTIONS", 5)?,
            },
            scoring: ScoringConfig {
                effort_window,
                minimum_attempts: parse_var("SQUAD_PULSE_MIN_ATTEMPTS", DEFAULT_MINIMUM_ATTEMPTS)?,
                weight_bound,
            },
            log_level: env::var("SQUAD_PULSE_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected: std::any::type_name::<T>(),
            value,
        }),
        Err(_) => Ok(default),
    }
}
