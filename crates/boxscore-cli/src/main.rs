// Box-score pipeline entry point.
//
// Subcommands map onto pipeline stages:
// - load:    raw CSV exports -> canonical tables
// - derive:  canonical tables -> derived metric tables
// - run:     load, then derive
// - leaders: ranked view over a derived table
// - career:  career totals over canonical batting
// - seasons: seasons currently stored

use std::path::PathBuf;

use anyhow::Context;
use boxscore_core::config::{self, Config};
use boxscore_core::db::{CareerStat, Database};
use boxscore_core::records::StatKind;
use boxscore_stats::leaderboard::{
    BattingMetric, LeaderboardEntry, LeaderboardQuery, PitchingMetric, SortOrder,
};
use boxscore_stats::pipeline;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "boxscore")]
#[command(about = "Load college baseball box-score exports and rank player seasons")]
struct Cli {
    /// Directory containing config/boxscore.toml (default: current directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every batting_<year>.csv / pitching_<year>.csv into the store
    Load {
        /// Override the configured raw data directory
        #[arg(long)]
        raw_dir: Option<PathBuf>,
    },
    /// Recompute the derived metric tables
    Derive,
    /// Load, then derive
    Run {
        #[arg(long)]
        raw_dir: Option<PathBuf>,
    },
    /// Print a leaderboard for one metric
    Leaders {
        #[arg(value_enum)]
        table: Table,
        /// Metric name, e.g. ops, ops_plus, iso, era, k9
        metric: String,
        /// Rows to show (default from config)
        #[arg(long)]
        top: Option<usize>,
        /// Only rank this season
        #[arg(long)]
        season: Option<i32>,
        /// Lowest first
        #[arg(long, conflicts_with = "desc")]
        asc: bool,
        /// Highest first
        #[arg(long)]
        desc: bool,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Career totals for a counting stat (ab, r, h, hr, rbi)
    Career {
        stat: String,
        #[arg(long)]
        top: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// List the seasons present in the canonical tables
    Seasons,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Table {
    Batting,
    Pitching,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let base_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    let mut config = config::load_config(&base_dir).context("failed to load configuration")?;

    let db_path = config.db_path();
    let db_path_str = db_path
        .to_str()
        .with_context(|| format!("database path is not valid UTF-8: {}", db_path.display()))?;
    let db = Database::open(db_path_str).context("failed to open database")?;
    info!("Database opened at {}", db_path.display());

    match cli.command {
        Command::Load { raw_dir } => {
            override_raw_dir(&mut config, raw_dir);
            run_load(&db, &config)?;
        }
        Command::Derive => run_derive(&db, &config)?,
        Command::Run { raw_dir } => {
            override_raw_dir(&mut config, raw_dir);
            run_load(&db, &config)?;
            run_derive(&db, &config)?;
        }
        Command::Leaders {
            table,
            metric,
            top,
            season,
            asc,
            desc,
            json,
        } => {
            let order = match (asc, desc) {
                (true, _) => Some(SortOrder::Ascending),
                (_, true) => Some(SortOrder::Descending),
                _ => None,
            };
            let query = LeaderboardQuery {
                limit: top,
                order,
                season,
            };
            let (label, entries) = match table {
                Table::Batting => {
                    let metric: BattingMetric = metric.parse()?;
                    let entries = pipeline::batting_leaderboard(&db, &config, metric, &query)?;
                    (format!("{metric}"), entries)
                }
                Table::Pitching => {
                    let metric: PitchingMetric = metric.parse()?;
                    let entries = pipeline::pitching_leaderboard(&db, &config, metric, &query)?;
                    (format!("{metric}"), entries)
                }
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_leaderboard(&label, table, &entries);
            }
        }
        Command::Career { stat, top, json } => {
            let stat: CareerStat = stat.parse()?;
            let limit = top.unwrap_or(config.leaderboard.default_top_n);
            let totals = db.career_batting_totals(stat, limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else {
                println!("{:<4} {:<28} {:>8} {:>8}", "#", "Player", "Total", "Seasons");
                for (i, t) in totals.iter().enumerate() {
                    println!("{:<4} {:<28} {:>8} {:>8}", i + 1, t.player, t.total, t.seasons);
                }
            }
        }
        Command::Seasons => {
            for kind in [StatKind::Batting, StatKind::Pitching] {
                let seasons = db.seasons(kind)?;
                let listed: Vec<String> = seasons.iter().map(i32::to_string).collect();
                println!("{:<8} {}", kind, listed.join(" "));
            }
        }
    }

    Ok(())
}

fn override_raw_dir(config: &mut Config, raw_dir: Option<PathBuf>) {
    if let Some(dir) = raw_dir {
        config.paths.raw_dir = dir;
    }
}

fn run_load(db: &Database, config: &Config) -> anyhow::Result<()> {
    let report = pipeline::load_raw_dir(db, config)?;
    for loaded in &report.loaded {
        println!(
            "loaded   {:<8} {}  {} rows",
            loaded.kind, loaded.season, loaded.outcome.inserted
        );
    }
    for skipped in &report.skipped {
        println!(
            "skipped  {:<8} {}  {}",
            skipped.kind, skipped.season, skipped.reason
        );
    }
    Ok(())
}

fn run_derive(db: &Database, config: &Config) -> anyhow::Result<()> {
    let report = pipeline::derive_all(db, config)?;
    println!(
        "derived  batting {} rows, pitching {} rows",
        report.batting_rows, report.pitching_rows
    );
    Ok(())
}

fn print_leaderboard(metric: &str, table: Table, entries: &[LeaderboardEntry]) {
    let denominator = match table {
        Table::Batting => "AB",
        Table::Pitching => "IP",
    };
    println!(
        "{:<4} {:<28} {:>6} {:<8} {:>10} {:>7}",
        "#", "Player", "Season", "Team", metric, denominator
    );
    for (i, e) in entries.iter().enumerate() {
        let qual = e
            .qualifying_denominator
            .map(|v| format!("{v:.1}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<4} {:<28} {:>6} {:<8} {:>10.3} {:>7}",
            i + 1,
            e.player,
            e.season,
            e.team,
            e.metric_value,
            qual
        );
    }
}

/// Log to stderr so stdout carries only results.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("boxscore=info,boxscore_core=info,boxscore_stats=info,warn")
        }))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_leaders_with_options() {
        let cli = Cli::try_parse_from([
            "boxscore", "leaders", "batting", "ops", "--top", "5", "--season", "2025", "--json",
        ])
        .unwrap();
        match cli.command {
            Command::Leaders {
                table,
                metric,
                top,
                season,
                asc,
                desc,
                json,
            } => {
                assert_eq!(table, Table::Batting);
                assert_eq!(metric, "ops");
                assert_eq!(top, Some(5));
                assert_eq!(season, Some(2025));
                assert!(!asc && !desc);
                assert!(json);
            }
            other => panic!("expected Leaders, got {other:?}"),
        }
    }

    #[test]
    fn asc_and_desc_conflict() {
        let result = Cli::try_parse_from([
            "boxscore", "leaders", "pitching", "era", "--asc", "--desc",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn config_dir_is_global() {
        let cli = Cli::try_parse_from(["boxscore", "derive", "--config-dir", "/tmp/box"]).unwrap();
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/box")));
        assert!(matches!(cli.command, Command::Derive));
    }

    #[test]
    fn raw_dir_override_replaces_configured_path() {
        let mut config = config::parse_config(config::DEFAULT_CONFIG).unwrap();
        override_raw_dir(&mut config, Some(PathBuf::from("elsewhere")));
        assert_eq!(config.paths.raw_dir, PathBuf::from("elsewhere"));
        override_raw_dir(&mut config, None);
        assert_eq!(config.paths.raw_dir, PathBuf::from("elsewhere"));
    }
}
