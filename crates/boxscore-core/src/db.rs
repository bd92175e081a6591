// SQLite persistence layer for canonical and derived box-score tables.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use anyhow::{ensure, Context, Result};
use rusqlite::{params, Connection, Row, Transaction};
use tracing::{debug, warn};

use crate::records::{
    CanonicalBattingRecord, CanonicalPitchingRecord, CareerTotal, DerivedBattingMetric,
    DerivedPitchingMetric, StatKind,
};

/// Outcome of replacing one season of a canonical table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeasonReplace {
    /// Rows removed from the previous load of the season.
    pub removed: usize,
    /// Rows written by this load.
    pub inserted: usize,
    /// Rows skipped because an earlier row in the batch had the same
    /// `(player, season, team)` key.
    pub duplicates: usize,
}

/// Counting stats that can be summed into career totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CareerStat {
    Ab,
    R,
    H,
    Hr,
    Rbi,
}

impl CareerStat {
    fn column(self) -> &'static str {
        match self {
            CareerStat::Ab => "ab",
            CareerStat::R => "r",
            CareerStat::H => "h",
            CareerStat::Hr => "hr",
            CareerStat::Rbi => "rbi",
        }
    }
}

impl FromStr for CareerStat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ab" => Ok(CareerStat::Ab),
            "r" => Ok(CareerStat::R),
            "h" => Ok(CareerStat::H),
            "hr" => Ok(CareerStat::Hr),
            "rbi" => Ok(CareerStat::Rbi),
            other => anyhow::bail!("unknown career stat `{other}` (expected ab, r, h, hr or rbi)"),
        }
    }
}

/// SQLite-backed store for the four season-partitioned tables.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS batting_stats (
                player TEXT NOT NULL,
                season INTEGER NOT NULL,
                team   TEXT NOT NULL,
                avg    REAL,
                ab     REAL,
                r      REAL,
                h      REAL,
                hr     REAL,
                rbi    REAL,
                obp    REAL,
                slg    REAL,
                UNIQUE(player, season, team)
            );

            CREATE TABLE IF NOT EXISTS pitching_stats (
                player TEXT NOT NULL,
                season INTEGER NOT NULL,
                team   TEXT NOT NULL,
                era    REAL,
                w_l    TEXT,
                app    INTEGER,
                ip     REAL,
                so     INTEGER,
                hr     INTEGER,
                UNIQUE(player, season, team)
            );

            CREATE INDEX IF NOT EXISTS idx_batting_player ON batting_stats(player);
            CREATE INDEX IF NOT EXISTS idx_batting_season ON batting_stats(season);
            CREATE INDEX IF NOT EXISTS idx_pitching_player ON pitching_stats(player);
            CREATE INDEX IF NOT EXISTS idx_pitching_season ON pitching_stats(season);

            CREATE TABLE IF NOT EXISTS batting_metrics (
                player      TEXT NOT NULL,
                season      INTEGER NOT NULL,
                team        TEXT NOT NULL,
                avg         REAL,
                ab          REAL,
                r           REAL,
                h           REAL,
                hr          REAL,
                rbi         REAL,
                obp         REAL,
                slg         REAL,
                ops         REAL,
                iso         REAL,
                ops_plus    REAL,
                runs_per_ab REAL,
                hr_rate     REAL,
                rbi_rate    REAL,
                league_ops  REAL,
                min_ab      REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS pitching_metrics (
                player     TEXT NOT NULL,
                season     INTEGER NOT NULL,
                team       TEXT NOT NULL,
                era        REAL,
                w_l        TEXT,
                app        INTEGER,
                ip         REAL,
                so         INTEGER,
                hr         INTEGER,
                k9         REAL,
                hr9        REAL,
                k_per_ip   REAL,
                k_hr_ratio REAL
            );

            CREATE INDEX IF NOT EXISTS idx_batting_metrics_season ON batting_metrics(season);
            CREATE INDEX IF NOT EXISTS idx_pitching_metrics_season ON pitching_metrics(season);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Run a read-only closure against the underlying connection. Intended
    /// for ad-hoc `SELECT` queries over the persisted tables.
    pub fn read_with<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = self.conn();
        f(&conn).context("read query failed")
    }

    // ------------------------------------------------------------------
    // Canonical tables
    // ------------------------------------------------------------------

    /// Replace every batting row of `season` with `rows` in one transaction.
    ///
    /// All rows must carry `season`. On any failure the transaction rolls
    /// back and the previously loaded season is left untouched.
    pub fn replace_batting_season(
        &self,
        season: i32,
        rows: &[CanonicalBattingRecord],
    ) -> Result<SeasonReplace> {
        ensure!(
            rows.iter().all(|r| r.season == season),
            "batting batch for season {season} contains rows from another season"
        );

        self.replace_season_with(StatKind::Batting, season, |tx| {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO batting_stats
                        (player, season, team, avg, ab, r, h, hr, rbi, obp, slg)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                     ON CONFLICT(player, season, team) DO NOTHING",
                )
                .context("failed to prepare batting insert")?;

            let mut outcome = SeasonReplace::default();
            for rec in rows {
                let changed = stmt
                    .execute(params![
                        rec.player, rec.season, rec.team, rec.avg, rec.ab, rec.r, rec.h, rec.hr,
                        rec.rbi, rec.obp, rec.slg,
                    ])
                    .with_context(|| format!("failed to insert batting row for {}", rec.player))?;
                if changed == 0 {
                    warn!(
                        "duplicate batting row for {} in season {season}, keeping the first",
                        rec.player
                    );
                    outcome.duplicates += 1;
                } else {
                    outcome.inserted += 1;
                }
            }
            Ok(outcome)
        })
    }

    /// Replace every pitching row of `season` with `rows` in one transaction.
    pub fn replace_pitching_season(
        &self,
        season: i32,
        rows: &[CanonicalPitchingRecord],
    ) -> Result<SeasonReplace> {
        ensure!(
            rows.iter().all(|r| r.season == season),
            "pitching batch for season {season} contains rows from another season"
        );

        self.replace_season_with(StatKind::Pitching, season, |tx| {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO pitching_stats
                        (player, season, team, era, w_l, app, ip, so, hr)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT(player, season, team) DO NOTHING",
                )
                .context("failed to prepare pitching insert")?;

            let mut outcome = SeasonReplace::default();
            for rec in rows {
                let changed = stmt
                    .execute(params![
                        rec.player, rec.season, rec.team, rec.era, rec.w_l, rec.app, rec.ip,
                        rec.so, rec.hr,
                    ])
                    .with_context(|| format!("failed to insert pitching row for {}", rec.player))?;
                if changed == 0 {
                    warn!(
                        "duplicate pitching row for {} in season {season}, keeping the first",
                        rec.player
                    );
                    outcome.duplicates += 1;
                } else {
                    outcome.inserted += 1;
                }
            }
            Ok(outcome)
        })
    }

    /// Delete-then-insert wrapper shared by both canonical tables. Dropping
    /// the transaction without commit rolls it back.
    fn replace_season_with<F>(&self, kind: StatKind, season: i32, insert: F) -> Result<SeasonReplace>
    where
        F: FnOnce(&Transaction<'_>) -> Result<SeasonReplace>,
    {
        let table = kind.canonical_table();
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .with_context(|| format!("failed to begin {table} transaction for season {season}"))?;

        let removed = tx
            .execute(
                &format!("DELETE FROM {table} WHERE season = ?1"),
                params![season],
            )
            .with_context(|| format!("failed to clear {table} season {season}"))?;

        let mut outcome = insert(&tx)
            .with_context(|| format!("failed to replace {table} season {season}"))?;
        outcome.removed = removed;

        tx.commit()
            .with_context(|| format!("failed to commit {table} season {season}"))?;
        debug!(
            "replaced {table} season {season}: removed {}, inserted {}",
            outcome.removed, outcome.inserted
        );
        Ok(outcome)
    }

    /// Load the whole canonical batting table, ordered by season then load order.
    pub fn load_batting(&self) -> Result<Vec<CanonicalBattingRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT player, season, team, avg, ab, r, h, hr, rbi, obp, slg
                 FROM batting_stats ORDER BY season, rowid",
            )
            .context("failed to prepare load_batting query")?;

        let rows = stmt
            .query_map([], batting_from_row)
            .context("failed to query batting_stats")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map batting rows")?;
        Ok(rows)
    }

    /// Load the whole canonical pitching table, ordered by season then load order.
    pub fn load_pitching(&self) -> Result<Vec<CanonicalPitchingRecord>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT player, season, team, era, w_l, app, ip, so, hr
                 FROM pitching_stats ORDER BY season, rowid",
            )
            .context("failed to prepare load_pitching query")?;

        let rows = stmt
            .query_map([], pitching_from_row)
            .context("failed to query pitching_stats")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map pitching rows")?;
        Ok(rows)
    }

    /// Distinct seasons present in a canonical table, ascending.
    pub fn seasons(&self, kind: StatKind) -> Result<Vec<i32>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT DISTINCT season FROM {} ORDER BY season",
                kind.canonical_table()
            ))
            .context("failed to prepare seasons query")?;
        let seasons = stmt
            .query_map([], |row| row.get(0))
            .context("failed to query seasons")?
            .collect::<std::result::Result<Vec<i32>, _>>()
            .context("failed to map season rows")?;
        Ok(seasons)
    }

    /// Sum a counting stat per player across every loaded batting season,
    /// highest total first. Players with no recorded value are left out.
    pub fn career_batting_totals(&self, stat: CareerStat, limit: usize) -> Result<Vec<CareerTotal>> {
        let column = stat.column();
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT player, SUM({column}) AS total, COUNT(DISTINCT season) AS seasons
                 FROM batting_stats
                 WHERE {column} IS NOT NULL
                 GROUP BY player
                 ORDER BY total DESC, player ASC
                 LIMIT ?1"
            ))
            .context("failed to prepare career totals query")?;

        let totals = stmt
            .query_map(params![limit as i64], |row| {
                Ok(CareerTotal {
                    player: row.get(0)?,
                    total: row.get(1)?,
                    seasons: row.get(2)?,
                })
            })
            .context("failed to query career totals")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map career total rows")?;
        Ok(totals)
    }

    // ------------------------------------------------------------------
    // Derived tables
    // ------------------------------------------------------------------

    /// Overwrite the derived batting table with `rows` in one transaction.
    pub fn replace_batting_metrics(&self, rows: &[DerivedBattingMetric]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin batting_metrics transaction")?;
        tx.execute("DELETE FROM batting_metrics", [])
            .context("failed to clear batting_metrics")?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO batting_metrics
                        (player, season, team, avg, ab, r, h, hr, rbi, obp, slg,
                         ops, iso, ops_plus, runs_per_ab, hr_rate, rbi_rate, league_ops, min_ab)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                             ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                )
                .context("failed to prepare batting_metrics insert")?;
            for m in rows {
                let b = &m.base;
                stmt.execute(params![
                    b.player, b.season, b.team, b.avg, b.ab, b.r, b.h, b.hr, b.rbi, b.obp, b.slg,
                    m.ops, m.iso, m.ops_plus, m.runs_per_ab, m.hr_rate, m.rbi_rate, m.league_ops,
                    m.min_ab,
                ])
                .with_context(|| format!("failed to insert batting metrics for {}", b.player))?;
            }
        }
        tx.commit().context("failed to commit batting_metrics")?;
        Ok(rows.len())
    }

    /// Overwrite the derived pitching table with `rows` in one transaction.
    pub fn replace_pitching_metrics(&self, rows: &[DerivedPitchingMetric]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin pitching_metrics transaction")?;
        tx.execute("DELETE FROM pitching_metrics", [])
            .context("failed to clear pitching_metrics")?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO pitching_metrics
                        (player, season, team, era, w_l, app, ip, so, hr,
                         k9, hr9, k_per_ip, k_hr_ratio)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                )
                .context("failed to prepare pitching_metrics insert")?;
            for m in rows {
                let b = &m.base;
                stmt.execute(params![
                    b.player, b.season, b.team, b.era, b.w_l, b.app, b.ip, b.so, b.hr, m.k9,
                    m.hr9, m.k_per_ip, m.k_hr_ratio,
                ])
                .with_context(|| format!("failed to insert pitching metrics for {}", b.player))?;
            }
        }
        tx.commit().context("failed to commit pitching_metrics")?;
        Ok(rows.len())
    }

    /// Load the derived batting table in insertion order.
    pub fn load_batting_metrics(&self) -> Result<Vec<DerivedBattingMetric>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT player, season, team, avg, ab, r, h, hr, rbi, obp, slg,
                        ops, iso, ops_plus, runs_per_ab, hr_rate, rbi_rate, league_ops, min_ab
                 FROM batting_metrics ORDER BY rowid",
            )
            .context("failed to prepare load_batting_metrics query")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(DerivedBattingMetric {
                    base: batting_from_row(row)?,
                    ops: row.get(11)?,
                    iso: row.get(12)?,
                    ops_plus: row.get(13)?,
                    runs_per_ab: row.get(14)?,
                    hr_rate: row.get(15)?,
                    rbi_rate: row.get(16)?,
                    league_ops: row.get(17)?,
                    min_ab: row.get(18)?,
                })
            })
            .context("failed to query batting_metrics")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map batting_metrics rows")?;
        Ok(rows)
    }

    /// Load the derived pitching table in insertion order.
    pub fn load_pitching_metrics(&self) -> Result<Vec<DerivedPitchingMetric>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT player, season, team, era, w_l, app, ip, so, hr,
                        k9, hr9, k_per_ip, k_hr_ratio
                 FROM pitching_metrics ORDER BY rowid",
            )
            .context("failed to prepare load_pitching_metrics query")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(DerivedPitchingMetric {
                    base: pitching_from_row(row)?,
                    k9: row.get(9)?,
                    hr9: row.get(10)?,
                    k_per_ip: row.get(11)?,
                    k_hr_ratio: row.get(12)?,
                })
            })
            .context("failed to query pitching_metrics")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map pitching_metrics rows")?;
        Ok(rows)
    }
}

fn batting_from_row(row: &Row<'_>) -> rusqlite::Result<CanonicalBattingRecord> {
    Ok(CanonicalBattingRecord {
        player: row.get(0)?,
        season: row.get(1)?,
        team: row.get(2)?,
        avg: row.get(3)?,
        ab: row.get(4)?,
        r: row.get(5)?,
        h: row.get(6)?,
        hr: row.get(7)?,
        rbi: row.get(8)?,
        obp: row.get(9)?,
        slg: row.get(10)?,
    })
}

fn pitching_from_row(row: &Row<'_>) -> rusqlite::Result<CanonicalPitchingRecord> {
    Ok(CanonicalPitchingRecord {
        player: row.get(0)?,
        season: row.get(1)?,
        team: row.get(2)?,
        era: row.get(3)?,
        w_l: row.get(4)?,
        app: row.get(5)?,
        ip: row.get(6)?,
        so: row.get(7)?,
        hr: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn batter(player: &str, season: i32, ab: f64) -> CanonicalBattingRecord {
        CanonicalBattingRecord {
            player: player.to_string(),
            season,
            team: "MSST".to_string(),
            avg: Some(0.300),
            ab: Some(ab),
            r: Some(30.0),
            h: Some(60.0),
            hr: Some(8.0),
            rbi: Some(40.0),
            obp: Some(0.380),
            slg: Some(0.480),
        }
    }

    fn pitcher(player: &str, season: i32) -> CanonicalPitchingRecord {
        CanonicalPitchingRecord {
            player: player.to_string(),
            season,
            team: "MSST".to_string(),
            era: Some(3.25),
            w_l: Some("6-3".to_string()),
            app: Some(15),
            ip: Some(72.1),
            so: Some(80),
            hr: Some(6),
        }
    }

    fn batting_count(db: &Database, season: i32) -> i64 {
        db.read_with(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM batting_stats WHERE season = ?1",
                params![season],
                |row| row.get(0),
            )
        })
        .unwrap()
    }

    // ------------------------------------------------------------------
    // Schema / open
    // ------------------------------------------------------------------

    #[test]
    fn open_creates_tables_and_indexes() {
        let db = test_db();
        let names: Vec<String> = db
            .read_with(|conn| {
                conn.prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'index')")?
                    .query_map([], |row| row.get(0))?
                    .collect()
            })
            .unwrap();

        for expected in [
            "batting_stats",
            "pitching_stats",
            "batting_metrics",
            "pitching_metrics",
            "idx_batting_player",
            "idx_batting_season",
            "idx_pitching_player",
            "idx_pitching_season",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn open_is_idempotent_on_existing_file() {
        let dir = std::env::temp_dir().join("boxscore_db_reopen");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("stats.db");
        let path_str = path.to_str().unwrap();

        {
            let db = Database::open(path_str).unwrap();
            db.replace_batting_season(2024, &[batter("A", 2024, 100.0)]).unwrap();
        }
        let db = Database::open(path_str).unwrap();
        assert_eq!(db.load_batting().unwrap().len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    // ------------------------------------------------------------------
    // Season replace
    // ------------------------------------------------------------------

    #[test]
    fn reloading_a_season_is_idempotent() {
        let db = test_db();
        let rows = vec![batter("A", 2024, 100.0), batter("B", 2024, 80.0)];

        db.replace_batting_season(2024, &rows).unwrap();
        let first = db.load_batting().unwrap();
        let outcome = db.replace_batting_season(2024, &rows).unwrap();
        let second = db.load_batting().unwrap();

        assert_eq!(first, second);
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.inserted, 2);
        assert_eq!(batting_count(&db, 2024), 2);
    }

    #[test]
    fn replacing_one_season_leaves_others_alone() {
        let db = test_db();
        db.replace_batting_season(2023, &[batter("A", 2023, 90.0)]).unwrap();
        db.replace_batting_season(2024, &[batter("A", 2024, 100.0), batter("B", 2024, 50.0)])
            .unwrap();

        db.replace_batting_season(2024, &[batter("C", 2024, 10.0)]).unwrap();

        assert_eq!(batting_count(&db, 2023), 1);
        let rows = db.load_batting().unwrap();
        let players_2024: Vec<&str> = rows
            .iter()
            .filter(|r| r.season == 2024)
            .map(|r| r.player.as_str())
            .collect();
        assert_eq!(players_2024, vec!["C"]);
    }

    #[test]
    fn duplicate_keys_in_batch_keep_first_row() {
        let db = test_db();
        let mut second = batter("A", 2024, 10.0);
        second.hr = Some(99.0);
        let outcome = db
            .replace_batting_season(2024, &[batter("A", 2024, 100.0), second])
            .unwrap();

        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.duplicates, 1);
        let rows = db.load_batting().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hr, Some(8.0));
    }

    #[test]
    fn rejects_rows_from_another_season() {
        let db = test_db();
        let err = db
            .replace_batting_season(2024, &[batter("A", 2023, 100.0)])
            .unwrap_err();
        assert!(err.to_string().contains("another season"));
        assert!(db.load_batting().unwrap().is_empty());
    }

    #[test]
    fn failed_insert_rolls_back_the_whole_season() {
        let db = test_db();
        db.replace_batting_season(2024, &[batter("A", 2024, 100.0)]).unwrap();

        db.read_with(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_boom BEFORE INSERT ON batting_stats
                 WHEN NEW.player = 'Boom'
                 BEGIN SELECT RAISE(ABORT, 'boom'); END;",
            )
        })
        .unwrap();

        let result =
            db.replace_batting_season(2024, &[batter("B", 2024, 50.0), batter("Boom", 2024, 1.0)]);
        assert!(result.is_err());

        let rows = db.load_batting().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player, "A");
    }

    #[test]
    fn pitching_season_round_trip_preserves_nulls() {
        let db = test_db();
        let mut p = pitcher("Ace", 2025);
        p.w_l = None;
        p.hr = None;
        db.replace_pitching_season(2025, &[p.clone(), pitcher("Closer", 2025)])
            .unwrap();

        let rows = db.load_pitching().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], p);
        assert_eq!(rows[1].w_l.as_deref(), Some("6-3"));
    }

    #[test]
    fn seasons_lists_distinct_values() {
        let db = test_db();
        db.replace_pitching_season(2025, &[pitcher("A", 2025)]).unwrap();
        db.replace_pitching_season(2023, &[pitcher("A", 2023), pitcher("B", 2023)])
            .unwrap();
        assert_eq!(db.seasons(StatKind::Pitching).unwrap(), vec![2023, 2025]);
        assert!(db.seasons(StatKind::Batting).unwrap().is_empty());
    }

    // ------------------------------------------------------------------
    // Career totals
    // ------------------------------------------------------------------

    #[test]
    fn career_totals_sum_across_seasons() {
        let db = test_db();
        let mut a24 = batter("A", 2024, 100.0);
        a24.hr = Some(10.0);
        let mut a25 = batter("A", 2025, 100.0);
        a25.hr = Some(12.0);
        let mut b25 = batter("B", 2025, 100.0);
        b25.hr = Some(15.0);
        let mut c25 = batter("C", 2025, 100.0);
        c25.hr = None;

        db.replace_batting_season(2024, &[a24]).unwrap();
        db.replace_batting_season(2025, &[a25, b25, c25]).unwrap();

        let totals = db.career_batting_totals(CareerStat::Hr, 10).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].player, "A");
        assert!((totals[0].total - 22.0).abs() < f64::EPSILON);
        assert_eq!(totals[0].seasons, 2);
        assert_eq!(totals[1].player, "B");

        let top1 = db.career_batting_totals(CareerStat::Hr, 1).unwrap();
        assert_eq!(top1.len(), 1);
    }

    #[test]
    fn career_stat_parses_known_names() {
        assert_eq!("HR".parse::<CareerStat>().unwrap(), CareerStat::Hr);
        assert_eq!(" rbi ".parse::<CareerStat>().unwrap(), CareerStat::Rbi);
        assert!("ops".parse::<CareerStat>().is_err());
    }

    // ------------------------------------------------------------------
    // Derived tables
    // ------------------------------------------------------------------

    #[test]
    fn metrics_replace_overwrites_previous_contents() {
        let db = test_db();
        let metric = |player: &str| DerivedBattingMetric {
            base: batter(player, 2024, 100.0),
            ops: Some(0.860),
            iso: Some(0.180),
            ops_plus: Some(100.0),
            runs_per_ab: Some(0.3),
            hr_rate: Some(0.08),
            rbi_rate: Some(0.4),
            league_ops: Some(0.860),
            min_ab: 40.0,
        };

        db.replace_batting_metrics(&[metric("A"), metric("B")]).unwrap();
        db.replace_batting_metrics(&[metric("C")]).unwrap();

        let rows = db.load_batting_metrics().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], metric("C"));
    }

    #[test]
    fn pitching_metrics_round_trip_keeps_null_ratio() {
        let db = test_db();
        let m = DerivedPitchingMetric {
            base: pitcher("Ace", 2025),
            k9: Some(9.5),
            hr9: Some(0.7),
            k_per_ip: Some(1.05),
            k_hr_ratio: None,
        };
        db.replace_pitching_metrics(std::slice::from_ref(&m)).unwrap();
        assert_eq!(db.load_pitching_metrics().unwrap(), vec![m]);
    }
}
