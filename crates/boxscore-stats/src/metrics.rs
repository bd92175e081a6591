// Derived batting and pitching metrics.
//
// Both derivations are pure functions of the full canonical table. League
// baselines and qualification thresholds are computed per season.

use std::collections::BTreeMap;

use boxscore_core::config::QualificationConfig;
use boxscore_core::records::{
    CanonicalBattingRecord, CanonicalPitchingRecord, DerivedBattingMetric, DerivedPitchingMetric,
};
use tracing::debug;

/// Innings per regulation game, the scale for K/9 and HR/9.
const INNINGS_PER_GAME: f64 = 9.0;

/// OPS+ scale: a league-average hitter scores 100.
const OPS_PLUS_SCALE: f64 = 100.0;

/// Drop non-finite values so they never reach storage or presentation.
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// `numerator / denominator`, or `None` when either side is missing, the
/// denominator is zero, or the result is not finite.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    finite(n / d)
}

/// Per-season mean of the present values, or `None` for a season with none.
fn season_means(values: impl Iterator<Item = (i32, Option<f64>)>) -> BTreeMap<i32, Option<f64>> {
    let mut acc: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    let mut seasons: BTreeMap<i32, Option<f64>> = BTreeMap::new();
    for (season, value) in values {
        seasons.entry(season).or_insert(None);
        if let Some(v) = value {
            let slot = acc.entry(season).or_insert((0.0, 0));
            slot.0 += v;
            slot.1 += 1;
        }
    }
    for (season, (sum, count)) in acc {
        seasons.insert(season, finite(sum / count as f64));
    }
    seasons
}

/// Per-season maximum of a playing-time measure.
fn season_max(values: impl Iterator<Item = (i32, f64)>) -> BTreeMap<i32, f64> {
    let mut max: BTreeMap<i32, f64> = BTreeMap::new();
    for (season, value) in values {
        max.entry(season)
            .and_modify(|m| *m = m.max(value))
            .or_insert(value);
    }
    max
}

// ---------------------------------------------------------------------------
// Batting
// ---------------------------------------------------------------------------

/// Derive the batting metric table from every canonical batting row.
///
/// Rows without positive at-bats are excluded. `league_ops` is the mean OPS
/// over the remaining rows of the season; the at-bat threshold is
/// `min_ab_ratio` times the season's most at-bats and is applied last.
pub fn derive_batting(
    records: &[CanonicalBattingRecord],
    qualification: &QualificationConfig,
) -> Vec<DerivedBattingMetric> {
    let eligible: Vec<(&CanonicalBattingRecord, f64)> = records
        .iter()
        .filter_map(|r| r.ab.filter(|ab| *ab > 0.0).map(|ab| (r, ab)))
        .collect();

    let ops_of = |r: &CanonicalBattingRecord| -> Option<f64> { finite(r.obp? + r.slg?) };

    let league_ops = season_means(eligible.iter().map(|(r, _)| (r.season, ops_of(*r))));
    let min_ab: BTreeMap<i32, f64> = season_max(eligible.iter().map(|(r, ab)| (r.season, *ab)))
        .into_iter()
        .map(|(season, max)| (season, max * qualification.min_ab_ratio))
        .collect();

    let mut derived = Vec::with_capacity(eligible.len());
    let mut excluded = 0usize;
    for (r, ab) in eligible {
        let threshold = min_ab.get(&r.season).copied().unwrap_or(0.0);
        if ab < threshold {
            excluded += 1;
            continue;
        }

        let ops = ops_of(r);
        let league = league_ops.get(&r.season).copied().flatten();
        let ab = Some(ab);
        derived.push(DerivedBattingMetric {
            base: r.clone(),
            ops,
            iso: r.slg.zip(r.avg).and_then(|(slg, avg)| finite(slg - avg)),
            ops_plus: ratio(ops, league).and_then(|v| finite(v * OPS_PLUS_SCALE)),
            runs_per_ab: ratio(r.r, ab),
            hr_rate: ratio(r.hr, ab),
            rbi_rate: ratio(r.rbi, ab),
            league_ops: league,
            min_ab: threshold,
        });
    }

    debug!(
        "derived {} batting rows from {} canonical, {excluded} below the at-bat threshold",
        derived.len(),
        records.len()
    );
    derived
}

// ---------------------------------------------------------------------------
// Pitching
// ---------------------------------------------------------------------------

/// Derive the pitching metric table from every canonical pitching row.
///
/// Rows without positive innings are excluded. When `enforce_min_ip` is set,
/// rows below `min_ip_ratio` of the season's most innings are dropped too.
pub fn derive_pitching(
    records: &[CanonicalPitchingRecord],
    qualification: &QualificationConfig,
) -> Vec<DerivedPitchingMetric> {
    let eligible: Vec<(&CanonicalPitchingRecord, f64)> = records
        .iter()
        .filter_map(|r| r.ip.filter(|ip| *ip > 0.0).map(|ip| (r, ip)))
        .collect();

    let min_ip: BTreeMap<i32, f64> = if qualification.enforce_min_ip {
        season_max(eligible.iter().map(|(r, ip)| (r.season, *ip)))
            .into_iter()
            .map(|(season, max)| (season, max * qualification.min_ip_ratio))
            .collect()
    } else {
        BTreeMap::new()
    };

    let mut derived = Vec::with_capacity(eligible.len());
    let mut excluded = 0usize;
    for (r, ip) in eligible {
        if min_ip.get(&r.season).is_some_and(|threshold| ip < *threshold) {
            excluded += 1;
            continue;
        }

        let so = r.so.map(|v| v as f64);
        let hr = r.hr.map(|v| v as f64);
        let ip = Some(ip);
        derived.push(DerivedPitchingMetric {
            base: r.clone(),
            k9: ratio(so, ip).and_then(|v| finite(v * INNINGS_PER_GAME)),
            hr9: ratio(hr, ip).and_then(|v| finite(v * INNINGS_PER_GAME)),
            k_per_ip: ratio(so, ip),
            k_hr_ratio: ratio(so, hr),
        });
    }

    debug!(
        "derived {} pitching rows from {} canonical, {excluded} below the innings threshold",
        derived.len(),
        records.len()
    );
    derived
}
