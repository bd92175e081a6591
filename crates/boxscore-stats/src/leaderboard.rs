// Leaderboards over the derived metric tables.
//
// Qualification is already applied by the derivation step; ranking here only
// drops rows without a value for the requested metric. Ties keep the input
// order (the derived table's insertion order) because the sort is stable.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use boxscore_core::records::{DerivedBattingMetric, DerivedPitchingMetric, StatKind};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaderboardError {
    #[error("unknown {kind} metric `{name}`")]
    UnknownMetric { kind: StatKind, name: String },
}

/// Ranking direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub player: String,
    pub season: i32,
    pub team: String,
    pub metric_value: f64,
    /// At-bats for batting boards, innings pitched for pitching boards.
    pub qualifying_denominator: Option<f64>,
}

/// Options for a single leaderboard request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaderboardQuery {
    /// Rows to return; `None` means the configured default.
    pub limit: Option<usize>,
    /// Overrides the metric's natural direction.
    pub order: Option<SortOrder>,
    /// Restrict candidates to one season.
    pub season: Option<i32>,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattingMetric {
    Avg,
    Ab,
    R,
    H,
    Hr,
    Rbi,
    Obp,
    Slg,
    Ops,
    Iso,
    OpsPlus,
    RunsPerAb,
    HrRate,
    RbiRate,
}

impl BattingMetric {
    pub const ALL: &'static [BattingMetric] = &[
        BattingMetric::Avg,
        BattingMetric::Ab,
        BattingMetric::R,
        BattingMetric::H,
        BattingMetric::Hr,
        BattingMetric::Rbi,
        BattingMetric::Obp,
        BattingMetric::Slg,
        BattingMetric::Ops,
        BattingMetric::Iso,
        BattingMetric::OpsPlus,
        BattingMetric::RunsPerAb,
        BattingMetric::HrRate,
        BattingMetric::RbiRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BattingMetric::Avg => "avg",
            BattingMetric::Ab => "ab",
            BattingMetric::R => "r",
            BattingMetric::H => "h",
            BattingMetric::Hr => "hr",
            BattingMetric::Rbi => "rbi",
            BattingMetric::Obp => "obp",
            BattingMetric::Slg => "slg",
            BattingMetric::Ops => "ops",
            BattingMetric::Iso => "iso",
            BattingMetric::OpsPlus => "ops_plus",
            BattingMetric::RunsPerAb => "runs_per_ab",
            BattingMetric::HrRate => "hr_rate",
            BattingMetric::RbiRate => "rbi_rate",
        }
    }

    /// Every batting metric reads higher-is-better.
    pub fn default_order(self) -> SortOrder {
        SortOrder::Descending
    }

    pub fn value(self, m: &DerivedBattingMetric) -> Option<f64> {
        match self {
            BattingMetric::Avg => m.base.avg,
            BattingMetric::Ab => m.base.ab,
            BattingMetric::R => m.base.r,
            BattingMetric::H => m.base.h,
            BattingMetric::Hr => m.base.hr,
            BattingMetric::Rbi => m.base.rbi,
            BattingMetric::Obp => m.base.obp,
            BattingMetric::Slg => m.base.slg,
            BattingMetric::Ops => m.ops,
            BattingMetric::Iso => m.iso,
            BattingMetric::OpsPlus => m.ops_plus,
            BattingMetric::RunsPerAb => m.runs_per_ab,
            BattingMetric::HrRate => m.hr_rate,
            BattingMetric::RbiRate => m.rbi_rate,
        }
    }
}

impl FromStr for BattingMetric {
    type Err = LeaderboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_metric_name(s);
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| LeaderboardError::UnknownMetric {
                kind: StatKind::Batting,
                name: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchingMetric {
    Era,
    App,
    Ip,
    So,
    Hr,
    K9,
    Hr9,
    KPerIp,
    KHrRatio,
}

impl PitchingMetric {
    pub const ALL: &'static [PitchingMetric] = &[
        PitchingMetric::Era,
        PitchingMetric::App,
        PitchingMetric::Ip,
        PitchingMetric::So,
        PitchingMetric::Hr,
        PitchingMetric::K9,
        PitchingMetric::Hr9,
        PitchingMetric::KPerIp,
        PitchingMetric::KHrRatio,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PitchingMetric::Era => "era",
            PitchingMetric::App => "app",
            PitchingMetric::Ip => "ip",
            PitchingMetric::So => "so",
            PitchingMetric::Hr => "hr",
            PitchingMetric::K9 => "k9",
            PitchingMetric::Hr9 => "hr9",
            PitchingMetric::KPerIp => "k_per_ip",
            PitchingMetric::KHrRatio => "k_hr_ratio",
        }
    }

    /// ERA and home runs allowed are lower-is-better.
    pub fn default_order(self) -> SortOrder {
        match self {
            PitchingMetric::Era | PitchingMetric::Hr | PitchingMetric::Hr9 => SortOrder::Ascending,
            _ => SortOrder::Descending,
        }
    }

    pub fn value(self, m: &DerivedPitchingMetric) -> Option<f64> {
        let count = |v: Option<i64>| v.map(|n| n as f64);
        match self {
            PitchingMetric::Era => m.base.era,
            PitchingMetric::App => count(m.base.app),
            PitchingMetric::Ip => m.base.ip,
            PitchingMetric::So => count(m.base.so),
            PitchingMetric::Hr => count(m.base.hr),
            PitchingMetric::K9 => m.k9,
            PitchingMetric::Hr9 => m.hr9,
            PitchingMetric::KPerIp => m.k_per_ip,
            PitchingMetric::KHrRatio => m.k_hr_ratio,
        }
    }
}

impl FromStr for PitchingMetric {
    type Err = LeaderboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_metric_name(s);
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| LeaderboardError::UnknownMetric {
                kind: StatKind::Pitching,
                name: s.to_string(),
            })
    }
}

impl fmt::Display for BattingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for PitchingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accept `OPS+`, `ops-plus`, `K/9` and similar spellings.
fn normalize_metric_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace('+', "_plus")
        .replace('/', "")
        .replace(['-', ' '], "_")
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Rank rows by `value`, dropping rows where it is `None`. The sort is
/// stable, so equal values keep their input order.
fn rank<T>(
    rows: &[T],
    value: impl Fn(&T) -> Option<f64>,
    entry: impl Fn(&T, f64) -> LeaderboardEntry,
    order: SortOrder,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let mut scored: Vec<(&T, f64)> = rows
        .iter()
        .filter_map(|row| value(row).map(|v| (row, v)))
        .collect();

    scored.sort_by(|a, b| {
        let cmp = a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal);
        match order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        }
    });
    scored.truncate(limit);
    scored.into_iter().map(|(row, v)| entry(row, v)).collect()
}

/// Top batting rows for `metric`.
pub fn batting_leaders(
    rows: &[DerivedBattingMetric],
    metric: BattingMetric,
    query: &LeaderboardQuery,
    default_top_n: usize,
) -> Vec<LeaderboardEntry> {
    let season = query.season;
    rank(
        rows,
        |m| {
            if season.is_some_and(|s| s != m.base.season) {
                return None;
            }
            metric.value(m)
        },
        |m, v| LeaderboardEntry {
            player: m.base.player.clone(),
            season: m.base.season,
            team: m.base.team.clone(),
            metric_value: v,
            qualifying_denominator: m.base.ab,
        },
        query.order.unwrap_or(metric.default_order()),
        query.limit.unwrap_or(default_top_n),
    )
}

/// Top pitching rows for `metric`.
pub fn pitching_leaders(
    rows: &[DerivedPitchingMetric],
    metric: PitchingMetric,
    query: &LeaderboardQuery,
    default_top_n: usize,
) -> Vec<LeaderboardEntry> {
    let season = query.season;
    rank(
        rows,
        |m| {
            if season.is_some_and(|s| s != m.base.season) {
                return None;
            }
            metric.value(m)
        },
        |m, v| LeaderboardEntry {
            player: m.base.player.clone(),
            season: m.base.season,
            team: m.base.team.clone(),
            metric_value: v,
            qualifying_denominator: m.base.ip,
        },
        query.order.unwrap_or(metric.default_order()),
        query.limit.unwrap_or(default_top_n),
    )
}
