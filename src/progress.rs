//! Incremental progress statistics. [`fold`] absorbs one graded attempt into
//! a per-student, per-passage summary without rescanning attempt history;
//! [`summarize`] rolls a student's summaries up into dashboard totals.

use serde::Serialize;

use crate::db::models::ProgressModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }
}

/// Cross-passage rollup for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub verses_attempted: i64,
    pub verses_memorized: i64,
    pub average_best_score: f64,
    pub total_attempts: i64,
    pub completion_rate: f64,
}

/// Fold one attempt into the running summary.
///
/// `is_memorized` always reflects the latest attempt only; a failing attempt
/// clears it even when earlier attempts passed. `first_memorized_at` is the
/// opposite: written on the first passing attempt and never touched again.
/// The trend compares the new score against the previous `latest_score`,
/// nothing older.
pub fn fold(
    previous: Option<&ProgressModel>,
    student_id: i64,
    passage_id: i64,
    score: f64,
    is_passing: bool,
    now: &str,
) -> ProgressModel {
    match previous {
        Some(prev) => {
            let total = prev.total_attempts + 1;
            let trend = if score > prev.latest_score {
                Trend::Improving
            } else if score < prev.latest_score {
                Trend::Declining
            } else {
                Trend::Stable
            };

            ProgressModel {
                student_id,
                passage_id,
                total_attempts: total,
                best_score: prev.best_score.max(score),
                latest_score: score,
                average_score: (prev.average_score * prev.total_attempts as f64 + score)
                    / total as f64,
                is_memorized: is_passing,
                first_memorized_at: prev
                    .first_memorized_at
                    .clone()
                    .or_else(|| is_passing.then(|| now.to_string())),
                trend: trend.as_str().to_string(),
                last_attempt_at: now.to_string(),
            }
        }
        None => ProgressModel {
            student_id,
            passage_id,
            total_attempts: 1,
            best_score: score,
            latest_score: score,
            average_score: score,
            is_memorized: is_passing,
            first_memorized_at: is_passing.then(|| now.to_string()),
            trend: Trend::Stable.as_str().to_string(),
            last_attempt_at: now.to_string(),
        },
    }
}

/// Roll per-passage summaries up into one student-level summary. Percentages
/// and the mean best score are rounded to one decimal place for display.
pub fn summarize(rows: &[ProgressModel]) -> StudentSummary {
    if rows.is_empty() {
        return StudentSummary {
            verses_attempted: 0,
            verses_memorized: 0,
            average_best_score: 0.0,
            total_attempts: 0,
            completion_rate: 0.0,
        };
    }

    let attempted = rows.len() as i64;
    let memorized = rows.iter().filter(|r| r.is_memorized).count() as i64;
    let best_sum: f64 = rows.iter().map(|r| r.best_score).sum();
    let attempts: i64 = rows.iter().map(|r| r.total_attempts).sum();

    StudentSummary {
        verses_attempted: attempted,
        verses_memorized: memorized,
        average_best_score: round1(best_sum / attempted as f64),
        total_attempts: attempts,
        completion_rate: round1(memorized as f64 * 100.0 / attempted as f64),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
