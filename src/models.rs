use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Why an athlete missed a session. Only meaningful when the record is an absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JustificationType {
    #[default]
    None,
    Personal,
    Academic,
    Logistic,
    Health,
}

impl JustificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JustificationType::None => "none",
            JustificationType::Personal => "personal",
            JustificationType::Academic => "academic",
            JustificationType::Logistic => "logistic",
            JustificationType::Health => "health",
        }
    }
}

impl fmt::Display for JustificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown justification type '{0}'")]
pub struct ParseJustificationError(pub String);

impl FromStr for JustificationType {
    type Err = ParseJustificationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(JustificationType::None),
            "personal" => Ok(JustificationType::Personal),
            "academic" => Ok(JustificationType::Academic),
            "logistic" | "logistics" | "transport" => Ok(JustificationType::Logistic),
            "health" | "medical" => Ok(JustificationType::Health),
            _ => Err(ParseJustificationError(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub present: bool,
    pub justification: JustificationType,
}

impl AttendanceRecord {
    pub fn present() -> Self {
        Self {
            present: true,
            justification: JustificationType::None,
        }
    }

    pub fn absent(justification: JustificationType) -> Self {
        Self {
            present: false,
            justification,
        }
    }
}

/// Volleyball skill category an evaluation is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fundamento {
    Serve,
    Reception,
    Set,
    Attack,
    Block,
    Defense,
}

impl Fundamento {
    pub const ALL: [Fundamento; 6] = [
        Fundamento::Serve,
        Fundamento::Reception,
        Fundamento::Set,
        Fundamento::Attack,
        Fundamento::Block,
        Fundamento::Defense,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Fundamento::Serve => "serve",
            Fundamento::Reception => "reception",
            Fundamento::Set => "set",
            Fundamento::Attack => "attack",
            Fundamento::Block => "block",
            Fundamento::Defense => "defense",
        }
    }
}

impl fmt::Display for Fundamento {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown fundamento '{0}'")]
pub struct ParseFundamentoError(pub String);

impl FromStr for Fundamento {
    type Err = ParseFundamentoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "serve" | "saque" => Ok(Fundamento::Serve),
            "reception" | "recepcao" | "recepção" => Ok(Fundamento::Reception),
            "set" | "levantamento" => Ok(Fundamento::Set),
            "attack" | "ataque" => Ok(Fundamento::Attack),
            "block" | "bloqueio" => Ok(Fundamento::Block),
            "defense" | "defesa" => Ok(Fundamento::Defense),
            _ => Err(ParseFundamentoError(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationEvent {
    pub athlete_id: Uuid,
    pub athlete_name: String,
    pub team: String,
    pub fundamento: Fundamento,
    pub weight: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub athlete_id: Uuid,
    pub name: String,
    pub efficiency_percent: f64,
    pub total_attempts: usize,
    pub rank: usize,
}

#[derive(Debug, Clone)]
pub struct Athlete {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub team: String,
}

/// An attendance row as stored, before it is reduced to an [`AttendanceRecord`].
#[derive(Debug, Clone)]
pub struct AttendanceRow {
    pub athlete_id: Uuid,
    pub session_date: NaiveDate,
    pub present: bool,
    pub justification: JustificationType,
}

impl From<&AttendanceRow> for AttendanceRecord {
    fn from(row: &AttendanceRow) -> Self {
        AttendanceRecord {
            present: row.present,
            justification: row.justification,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AthleteEffort {
    pub athlete_id: Uuid,
    pub name: String,
    pub sessions: usize,
    /// `None` when the athlete has no attendance history.
    pub effort_index: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fundamento_parses_english_and_portuguese_labels() {
        assert_eq!("Serve".parse::<Fundamento>().unwrap(), Fundamento::Serve);
        assert_eq!("recepção".parse::<Fundamento>().unwrap(), Fundamento::Reception);
        assert_eq!(" BLOQUEIO ".parse::<Fundamento>().unwrap(), Fundamento::Block);
        assert!("libero".parse::<Fundamento>().is_err());
    }

    #[test]
    fn justification_defaults_to_none_when_blank() {
        assert_eq!(
            "".parse::<JustificationType>().unwrap(),
            JustificationType::None
        );
        assert_eq!(
            "Medical".parse::<JustificationType>().unwrap(),
            JustificationType::Health
        );
        assert!("overslept".parse::<JustificationType>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for fundamento in Fundamento::ALL {
            assert_eq!(
                fundamento.to_string().parse::<Fundamento>().unwrap(),
                fundamento
            );
        }
    }
}
