/// Analysis result types — the stable output contract rendered by the
/// dashboard.
///
/// An `AnalysisResult` is constructed once per analysis call and never
/// mutated. It deliberately carries no timestamp: identical snapshots must
/// produce identical results, ordering included. The service layer stamps
/// its response envelopes instead.
use crate::analysis::platform::Platform;
use crate::model::conflict::{Conflict, Severity};
use serde::{Deserialize, Serialize};

/// Overall health of the analysed host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    NeedsAttention,
    Critical,
}

impl HealthStatus {
    /// Derive the status from a conflict list: critical dominates, any
    /// remaining conflict needs attention, otherwise healthy.
    pub fn from_conflicts(conflicts: &[Conflict]) -> Self {
        if conflicts.iter().any(|c| c.severity == Severity::Critical) {
            Self::Critical
        } else if conflicts.is_empty() {
            Self::Healthy
        } else {
            Self::NeedsAttention
        }
    }

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::NeedsAttention => "needs_attention",
            Self::Critical => "critical",
        }
    }
}

/// Recommendation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A single prioritized fix recommendation.
///
/// `title` is drawn from a fixed vocabulary — the dashboard keys its
/// "learn more" documentation links off the exact string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Headline numbers for the dashboard summary row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub platform_detected: Platform,
    pub status: HealthStatus,
    /// Count of containers in the input snapshot, including those with no
    /// mounts and those not implicated in any conflict.
    pub containers_analyzed: usize,
}

/// The complete result of one analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub platform: Platform,
    pub summary: Summary,
    /// Sorted severity-descending, then by involved container ids.
    pub conflicts: Vec<Conflict>,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::conflict::Conflict;

    #[test]
    fn status_from_empty_conflicts_is_healthy() {
        assert_eq!(HealthStatus::from_conflicts(&[]), HealthStatus::Healthy);
    }

    #[test]
    fn status_critical_dominates() {
        let conflicts = vec![
            Conflict::permission_mismatch("/d".into(), vec!["a".into()], "modes differ".into()),
            Conflict::destination_collision(
                "/d".into(),
                vec!["a".into(), "b".into()],
                vec!["/x".into(), "/y".into()],
                "/x".into(),
            ),
        ];
        assert_eq!(
            HealthStatus::from_conflicts(&conflicts),
            HealthStatus::Critical
        );
    }

    #[test]
    fn status_needs_attention_without_critical() {
        let conflicts = vec![Conflict::permission_mismatch(
            "/d".into(),
            vec!["a".into()],
            "modes differ".into(),
        )];
        assert_eq!(
            HealthStatus::from_conflicts(&conflicts),
            HealthStatus::NeedsAttention
        );
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_value(HealthStatus::NeedsAttention).unwrap();
        assert_eq!(json, "needs_attention");
    }
}
