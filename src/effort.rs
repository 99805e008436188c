use thiserror::Error;

use crate::models::{AttendanceRecord, JustificationType};

pub const DEFAULT_EFFORT_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffortError {
    /// No attendance history. Distinct from a neutral 0.0 index.
    #[error("effort index is not computable without attendance records")]
    NotComputable,
    #[error("effort window must cover at least one record")]
    InvalidWindow,
}

/// Score a single session: attendance counts fully, logistic absences half,
/// other justified absences nothing, unjustified absences against.
pub fn record_score(record: &AttendanceRecord) -> f64 {
    if record.present {
        return 1.0;
    }

    match record.justification {
        JustificationType::Logistic => 0.5,
        JustificationType::Academic | JustificationType::Personal | JustificationType::Health => {
            0.0
        }
        JustificationType::None => -1.0,
    }
}

/// Average the per-session scores of every record given, clamped to [-1, 1].
pub fn compute_effort_index(records: &[AttendanceRecord]) -> Result<f64, EffortError> {
    if records.is_empty() {
        return Err(EffortError::NotComputable);
    }

    let total: f64 = records.iter().map(record_score).sum();
    Ok((total / records.len() as f64).clamp(-1.0, 1.0))
}

/// Effort index over the most recent `window` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffortCalculator {
    window: usize,
}

impl EffortCalculator {
    pub fn new(window: usize) -> Result<Self, EffortError> {
        if window == 0 {
            return Err(EffortError::InvalidWindow);
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// `records` must be ordered most recent first.
    pub fn compute(&self, records: &[AttendanceRecord]) -> Result<f64, EffortError> {
        let considered = &records[..records.len().min(self.window)];
        compute_effort_index(considered)
    }

    /// Index to store on a profile: `None` when there is no history.
    pub fn stored_index(&self, records: &[AttendanceRecord]) -> Option<f64> {
        self.compute(records).ok()
    }
}

impl Default for EffortCalculator {
    fn default() -> Self {
        Self {
            window: DEFAULT_EFFORT_WINDOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_history_is_not_computable() {
        assert_eq!(compute_effort_index(&[]), Err(EffortError::NotComputable));
        assert_eq!(
            EffortCalculator::default().compute(&[]),
            Err(EffortError::NotComputable)
        );
    }

    #[test]
    fn perfect_and_worst_attendance_hit_the_bounds() {
        let present = vec![AttendanceRecord::present(); 10];
        let skipped = vec![AttendanceRecord::absent(JustificationType::None); 10];

        assert_eq!(compute_effort_index(&present), Ok(1.0));
        assert_eq!(compute_effort_index(&skipped), Ok(-1.0));
    }

    #[test]
    fn logistic_absences_count_half() {
        let mut records = vec![AttendanceRecord::present(); 5];
        records.extend(vec![AttendanceRecord::absent(JustificationType::Logistic); 5]);

        let index = compute_effort_index(&records).unwrap();
        assert!(approx(index, 0.75));
    }

    #[test]
    fn justified_absences_are_neutral() {
        let records = vec![
            AttendanceRecord::absent(JustificationType::Academic),
            AttendanceRecord::absent(JustificationType::Personal),
            AttendanceRecord::absent(JustificationType::Health),
        ];
        assert_eq!(compute_effort_index(&records), Ok(0.0));
    }

    #[test]
    fn divides_by_records_present_not_window() {
        let records = vec![
            AttendanceRecord::present(),
            AttendanceRecord::absent(JustificationType::None),
            AttendanceRecord::present(),
            AttendanceRecord::present(),
        ];
        let index = EffortCalculator::default().compute(&records).unwrap();
        assert!(approx(index, 0.5));
    }

    #[test]
    fn calculator_only_reads_the_most_recent_window() {
        let mut records = vec![AttendanceRecord::present(); 3];
        records.extend(vec![AttendanceRecord::absent(JustificationType::None); 7]);

        let calculator = EffortCalculator::new(3).unwrap();
        assert_eq!(calculator.compute(&records), Ok(1.0));
        assert_eq!(calculator.window(), 3);
    }

    #[test]
    fn stored_index_is_empty_without_history() {
        let calculator = EffortCalculator::default();
        assert_eq!(calculator.stored_index(&[]), None);

        let records = vec![
            AttendanceRecord::present(),
            AttendanceRecord::absent(JustificationType::Logistic),
        ];
        assert_eq!(calculator.stored_index(&records), Some(0.75));
    }

    #[test]
    fn zero_window_is_rejected() {
        assert_eq!(EffortCalculator::new(0), Err(EffortError::InvalidWindow));
    }

    #[test]
    fn every_small_history_stays_in_range() {
        let kinds = [
            AttendanceRecord::present(),
            AttendanceRecord::absent(JustificationType::None),
            AttendanceRecord::absent(JustificationType::Personal),
            AttendanceRecord::absent(JustificationType::Academic),
            AttendanceRecord::absent(JustificationType::Logistic),
            AttendanceRecord::absent(JustificationType::Health),
        ];

        for len in 1..=10 {
            for offset in 0..kinds.len() {
                let records: Vec<_> = (0..len)
                    .map(|i| kinds[(i * 7 + offset) % kinds.len()])
                    .collect();
                let index = compute_effort_index(&records).unwrap();
                assert!((-1.0..=1.0).contains(&index), "{index} out of range");
            }
        }
    }
}
