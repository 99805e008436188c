use std::cmp::Ordering;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{AthleteEffort, Fundamento, RankingEntry};

pub const REPORT_TOP_K: usize = 3;

pub fn effort_label(effort_index: f64) -> &'static str {
    if effort_index >= 0.5 {
        "committed"
    } else if effort_index >= 0.0 {
        "steady"
    } else {
        "at risk"
    }
}

/// Highest index first; athletes without history go last, by name.
pub fn sort_efforts(efforts: &mut [AthleteEffort]) {
    efforts.sort_by(|a, b| match (a.effort_index, b.effort_index) {
        (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
}

pub fn format_ranking_line(entry: &RankingEntry) -> String {
    format!(
        "{}. {} {:.1}% across {} attempts",
        entry.rank, entry.name, entry.efficiency_percent, entry.total_attempts
    )
}

pub fn build_report(
    team: &str,
    since: NaiveDate,
    efforts: &[AthleteEffort],
    rankings: &[(Fundamento, Vec<RankingEntry>)],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Squad Pulse Report");
    let _ = writeln!(output, "Generated for {} (evaluations since {})", team, since);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance Effort");

    if efforts.is_empty() {
        let _ = writeln!(output, "No athletes registered for this team.");
    } else {
        let mut ordered = efforts.to_vec();
        sort_efforts(&mut ordered);
        for effort in ordered.iter() {
            match effort.effort_index {
                Some(index) => {
                    let _ = writeln!(
                        output,
                        "- {}: {:+.2} ({}) over {} sessions",
                        effort.name,
                        index,
                        effort_label(index),
                        effort.sessions
                    );
                }
                None => {
                    let _ = writeln!(output, "- {}: no attendance data", effort.name);
                }
            }
        }
    }

    for (fundamento, entries) in rankings {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Top {} - {}", REPORT_TOP_K, fundamento);

        if entries.is_empty() {
            let _ = writeln!(output, "Not enough data for a ranking yet.");
        } else {
            for entry in entries.iter().take(REPORT_TOP_K) {
                let _ = writeln!(output, "{}", format_ranking_line(entry));
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn effort(name: &str, effort_index: Option<f64>) -> AthleteEffort {
        AthleteEffort {
            athlete_id: Uuid::new_v4(),
            name: name.to_string(),
            sessions: if effort_index.is_some() { 10 } else { 0 },
            effort_index,
        }
    }

    #[test]
    fn labels_follow_thresholds() {
        assert_eq!(effort_label(1.0), "committed");
        assert_eq!(effort_label(0.5), "committed");
        assert_eq!(effort_label(0.0), "steady");
        assert_eq!(effort_label(-0.1), "at risk");
    }

    #[test]
    fn missing_history_sorts_last() {
        let mut efforts = vec![
            effort("Eva", None),
            effort("Ana", Some(0.2)),
            effort("Bia", Some(0.9)),
        ];
        sort_efforts(&mut efforts);
        let names: Vec<_> = efforts.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Bia", "Ana", "Eva"]);
    }

    #[test]
    fn report_marks_empty_rankings_and_missing_data() {
        let since = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let entry = RankingEntry {
            athlete_id: Uuid::new_v4(),
            name: "Ana".to_string(),
            efficiency_percent: 83.333,
            total_attempts: 7,
            rank: 1,
        };
        let report = build_report(
            "sub-17",
            since,
            &[effort("Ana", Some(0.75)), effort("Eva", None)],
            &[
                (Fundamento::Serve, vec![entry]),
                (Fundamento::Block, Vec::new()),
            ],
        );

        assert!(report.contains("Generated for sub-17 (evaluations since 2026-02-01)"));
        assert!(report.contains("- Ana: +0.75 (committed) over 10 sessions"));
        assert!(report.contains("- Eva: no attendance data"));
        assert!(report.contains("1. Ana 83.3% across 7 attempts"));
        assert!(report.contains("## Top 3 - block\nNot enough data"));
    }
}
