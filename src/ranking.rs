use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::{EvaluationEvent, RankingEntry};

pub const DEFAULT_MINIMUM_ATTEMPTS: usize = 5;
pub const DEFAULT_WEIGHT_BOUND: f64 = 3.0;

/// Inclusive time window applied to `recorded_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl RankingWindow {
    /// Window ending at `now` and reaching back `days` (at least one).
    pub fn trailing_days(days: i64, now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::days(days.max(1)),
            end: now,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingOptions {
    pub minimum_attempts: usize,
    pub top_k: Option<usize>,
    /// Largest magnitude a single event weight is expected to carry.
    pub weight_bound: f64,
    pub window: Option<RankingWindow>,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            minimum_attempts: DEFAULT_MINIMUM_ATTEMPTS,
            top_k: None,
            weight_bound: DEFAULT_WEIGHT_BOUND,
            window: None,
        }
    }
}

impl RankingOptions {
    pub fn has_valid_bound(&self) -> bool {
        self.weight_bound.is_finite() && self.weight_bound > 0.0
    }
}

/// Map a mean weight from [-bound, bound] onto [0, 100].
/// Undefined inputs (NaN mean, non-positive bound) map to 0.
pub fn efficiency_percent(mean_weight: f64, weight_bound: f64) -> f64 {
    if !(weight_bound.is_finite() && weight_bound > 0.0) {
        return 0.0;
    }

    let percent = ((mean_weight + weight_bound) / (2.0 * weight_bound)) * 100.0;
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}

struct Tally {
    name: String,
    attempts: usize,
    raw_sum: f64,
}

/// Build the leaderboard for events already narrowed to one team and fundamento.
///
/// Non-finite weights are skipped and do not count as attempts. A bound that is
/// not a positive finite number yields an empty ranking.
pub fn compute_fundamento_ranking(
    events: &[EvaluationEvent],
    options: &RankingOptions,
) -> Vec<RankingEntry> {
    if !options.has_valid_bound() {
        return Vec::new();
    }

    let mut tallies: HashMap<Uuid, Tally> = HashMap::new();

    for event in events {
        if !event.weight.is_finite() {
            continue;
        }
        if let Some(window) = &options.window {
            if !window.contains(event.recorded_at) {
                continue;
            }
        }

        let tally = tallies.entry(event.athlete_id).or_insert_with(|| Tally {
            name: event.athlete_name.clone(),
            attempts: 0,
            raw_sum: 0.0,
        });
        tally.attempts += 1;
        tally.raw_sum += event.weight;
    }

    let mut entries: Vec<RankingEntry> = tallies
        .into_iter()
        .filter(|(_, tally)| tally.attempts >= options.minimum_attempts)
        .map(|(athlete_id, tally)| {
            let mean_weight = tally.raw_sum / tally.attempts as f64;
            RankingEntry {
                athlete_id,
                name: tally.name,
                efficiency_percent: efficiency_percent(mean_weight, options.weight_bound),
                total_attempts: tally.attempts,
                rank: 0,
            }
        })
        .collect();

    entries.sort_by(compare_entries);

    if let Some(top_k) = options.top_k {
        entries.truncate(top_k);
    }

    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index + 1;
    }

    entries
}

fn compare_entries(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    b.efficiency_percent
        .total_cmp(&a.efficiency_percent)
        .then_with(|| b.total_attempts.cmp(&a.total_attempts))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.athlete_id.cmp(&b.athlete_id))
}
