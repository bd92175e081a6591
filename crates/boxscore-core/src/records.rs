// Canonical and derived record types shared by the store and the pipeline.

use serde::Serialize;
use std::fmt;

/// Which box-score table a source or record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StatKind {
    Batting,
    Pitching,
}

impl StatKind {
    /// Prefix used by raw source file names (`batting_2025.csv`).
    pub fn file_prefix(self) -> &'static str {
        match self {
            StatKind::Batting => "batting",
            StatKind::Pitching => "pitching",
        }
    }

    /// Canonical table name in the store.
    pub fn canonical_table(self) -> &'static str {
        match self {
            StatKind::Batting => "batting_stats",
            StatKind::Pitching => "pitching_stats",
        }
    }

    /// Derived-metric table name in the store.
    pub fn metrics_table(self) -> &'static str {
        match self {
            StatKind::Batting => "batting_metrics",
            StatKind::Pitching => "pitching_metrics",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.file_prefix())
    }
}

/// One player's season line from a batting export, keyed by
/// `(player, season, team)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalBattingRecord {
    pub player: String,
    pub season: i32,
    pub team: String,
    pub avg: Option<f64>,
    pub ab: Option<f64>,
    pub r: Option<f64>,
    pub h: Option<f64>,
    pub hr: Option<f64>,
    pub rbi: Option<f64>,
    pub obp: Option<f64>,
    pub slg: Option<f64>,
}

/// One player's season line from a pitching export, keyed by
/// `(player, season, team)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalPitchingRecord {
    pub player: String,
    pub season: i32,
    pub team: String,
    pub era: Option<f64>,
    /// Win-loss record as printed in the source (e.g. `"5-2"`).
    pub w_l: Option<String>,
    pub app: Option<i64>,
    pub ip: Option<f64>,
    pub so: Option<i64>,
    pub hr: Option<i64>,
}

/// A canonical batting line extended with derived rate metrics and the
/// season-scoped baselines used to compute them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedBattingMetric {
    #[serde(flatten)]
    pub base: CanonicalBattingRecord,
    pub ops: Option<f64>,
    pub iso: Option<f64>,
    pub ops_plus: Option<f64>,
    pub runs_per_ab: Option<f64>,
    pub hr_rate: Option<f64>,
    pub rbi_rate: Option<f64>,
    pub league_ops: Option<f64>,
    pub min_ab: f64,
}

/// A canonical pitching line extended with derived rate metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedPitchingMetric {
    #[serde(flatten)]
    pub base: CanonicalPitchingRecord,
    pub k9: Option<f64>,
    pub hr9: Option<f64>,
    pub k_per_ip: Option<f64>,
    pub k_hr_ratio: Option<f64>,
}

/// A player's total for one counting stat summed across every loaded season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerTotal {
    pub player: String,
    pub total: f64,
    pub seasons: u32,
}
