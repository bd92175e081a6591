// Stage orchestration: load raw sources, derive metrics, query leaderboards.
//
// Source-level problems (unreadable, empty, nothing usable after
// normalization) skip that season and are reported. Storage failures abort
// the invocation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use boxscore_core::config::Config;
use boxscore_core::db::{Database, SeasonReplace};
use boxscore_core::records::StatKind;
use tracing::{info, warn};

use crate::leaderboard::{
    batting_leaders, pitching_leaders, BattingMetric, LeaderboardEntry, LeaderboardQuery,
    PitchingMetric,
};
use crate::metrics::{derive_batting, derive_pitching};
use crate::normalize::{normalize_batting, normalize_pitching, AliasTable, Provenance};
use crate::source::{discover_sources, read_table, SeasonSource, SourceError};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A season that was replaced in the canonical store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSeason {
    pub kind: StatKind,
    pub season: i32,
    pub outcome: SeasonReplace,
}

/// A source that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSource {
    pub kind: StatKind,
    pub season: i32,
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<LoadedSeason>,
    pub skipped: Vec<SkippedSource>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeriveReport {
    pub batting_rows: usize,
    pub pitching_rows: usize,
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Discover every source under the configured raw directory and load it.
pub fn load_raw_dir(db: &Database, config: &Config) -> Result<LoadReport> {
    let sources = discover_sources(&config.paths.raw_dir).with_context(|| {
        format!(
            "failed to list raw sources in {}",
            config.paths.raw_dir.display()
        )
    })?;
    if sources.is_empty() {
        warn!("no season sources found in {}", config.paths.raw_dir.display());
    }
    load_sources(db, config, &sources)
}

/// Normalize and load each source in order. Returns an error only when the
/// store itself fails.
pub fn load_sources(db: &Database, config: &Config, sources: &[SeasonSource]) -> Result<LoadReport> {
    let aliases = AliasTable::from_config(config);
    let mut report = LoadReport::default();

    for source in sources {
        info!("Loading {} {}", source.kind, source.season);
        match load_source(db, config, &aliases, source) {
            Ok(outcome) => {
                info!(
                    "Loaded {} {}: {} rows ({} duplicates skipped)",
                    source.kind, source.season, outcome.inserted, outcome.duplicates
                );
                report.loaded.push(LoadedSeason {
                    kind: source.kind,
                    season: source.season,
                    outcome,
                });
            }
            Err(LoadError::Source(e)) => {
                warn!("Skipping {} {}: {}", source.kind, source.season, e);
                report.skipped.push(SkippedSource {
                    kind: source.kind,
                    season: source.season,
                    path: source.path.clone(),
                    reason: e.to_string(),
                });
            }
            Err(LoadError::Store(e)) => return Err(e),
        }
    }

    Ok(report)
}

enum LoadError {
    Source(SourceError),
    Store(anyhow::Error),
}

fn load_source(
    db: &Database,
    config: &Config,
    aliases: &AliasTable,
    source: &SeasonSource,
) -> Result<SeasonReplace, LoadError> {
    let table = read_table(&source.path).map_err(LoadError::Source)?;
    let provenance = Provenance {
        season: source.season,
        team: config.team.name.clone(),
    };
    let no_usable_rows = || {
        LoadError::Source(SourceError::Empty {
            path: source.path.clone(),
        })
    };

    let stored = match source.kind {
        StatKind::Batting => {
            let rows = normalize_batting(&table, &provenance, aliases);
            if rows.is_empty() {
                return Err(no_usable_rows());
            }
            db.replace_batting_season(source.season, &rows)
        }
        StatKind::Pitching => {
            let rows = normalize_pitching(&table, &provenance, aliases);
            if rows.is_empty() {
                return Err(no_usable_rows());
            }
            db.replace_pitching_season(source.season, &rows)
        }
    };
    stored.map_err(LoadError::Store)
}

// ---------------------------------------------------------------------------
// Derive
// ---------------------------------------------------------------------------

/// Recompute both derived tables from the current canonical tables.
pub fn derive_all(db: &Database, config: &Config) -> Result<DeriveReport> {
    let batting = db.load_batting().context("failed to read canonical batting")?;
    let derived_batting = derive_batting(&batting, &config.qualification);
    let batting_rows = db
        .replace_batting_metrics(&derived_batting)
        .context("failed to write batting metrics")?;
    info!("Batting metrics: {batting_rows} rows from {} canonical", batting.len());

    let pitching = db.load_pitching().context("failed to read canonical pitching")?;
    let derived_pitching = derive_pitching(&pitching, &config.qualification);
    let pitching_rows = db
        .replace_pitching_metrics(&derived_pitching)
        .context("failed to write pitching metrics")?;
    info!("Pitching metrics: {pitching_rows} rows from {} canonical", pitching.len());

    Ok(DeriveReport {
        batting_rows,
        pitching_rows,
    })
}

// ---------------------------------------------------------------------------
// Leaderboards
// ---------------------------------------------------------------------------

/// Batting leaderboard read from the derived table.
pub fn batting_leaderboard(
    db: &Database,
    config: &Config,
    metric: BattingMetric,
    query: &LeaderboardQuery,
) -> Result<Vec<LeaderboardEntry>> {
    let rows = db.load_batting_metrics()?;
    Ok(batting_leaders(
        &rows,
        metric,
        query,
        config.leaderboard.default_top_n,
    ))
}

/// Pitching leaderboard read from the derived table.
pub fn pitching_leaderboard(
    db: &Database,
    config: &Config,
    metric: PitchingMetric,
    query: &LeaderboardQuery,
) -> Result<Vec<LeaderboardEntry>> {
    let rows = db.load_pitching_metrics()?;
    Ok(pitching_leaders(
        &rows,
        metric,
        query,
        config.leaderboard.default_top_n,
    ))
}
