// Schema normalization: raw export tables into canonical records.
//
// Header vocabulary drifts between seasons and sources ("OB%", "OnBase",
// "ob_pct", ...). Every header goes through `clean_header` and then an
// explicit `AliasTable`; nothing downstream looks at raw header text.

use std::collections::{BTreeMap, HashMap};

use boxscore_core::config::Config;
use boxscore_core::records::{CanonicalBattingRecord, CanonicalPitchingRecord};
use tracing::debug;

use crate::source::RawTable;

// ---------------------------------------------------------------------------
// Canonical field lists
// ---------------------------------------------------------------------------

pub const PLAYER: &str = "player";
pub const SEASON: &str = "season";
pub const TEAM: &str = "team";

/// Batting columns in storage order.
pub const BATTING_FIELDS: &[&str] = &[
    PLAYER, SEASON, TEAM, "avg", "ab", "r", "h", "hr", "rbi", "obp", "slg",
];
pub const BATTING_NUMERIC: &[&str] = &["avg", "ab", "r", "h", "hr", "rbi", "obp", "slg"];

/// Pitching columns in storage order.
pub const PITCHING_FIELDS: &[&str] = &[PLAYER, SEASON, TEAM, "era", "w_l", "app", "ip", "so", "hr"];
pub const PITCHING_NUMERIC: &[&str] = &["era", "app", "ip", "so", "hr"];

/// Source summary rows that are not players.
const NON_PLAYER_ROWS: &[&str] = &["Totals", "Opponents"];

/// Cell text that means "no player" once trimmed (compared case-insensitively).
const NULL_PLAYER_TOKENS: &[&str] = &["nan", "none", "null"];

/// Fallback identity header, only used when no `player` column exists.
const PLAYER_FALLBACK: &str = "name";

// ---------------------------------------------------------------------------
// Alias table
// ---------------------------------------------------------------------------

/// Synonym groups resolving cleaned header names to canonical field names.
///
/// Lookups ignore underscores, so `ob_pct`, `obpct` and `OB-PCT` all land on
/// the same entry.
#[derive(Debug, Clone)]
pub struct AliasTable {
    lookup: HashMap<String, String>,
}

impl AliasTable {
    /// The built-in synonym groups.
    pub fn builtin() -> Self {
        let groups: &[(&str, &[&str])] = &[
            ("obp", &["ob_pct", "ob", "onbasepct", "onbase"]),
            ("slg", &["slg_pct", "slug", "slugging"]),
            ("app", &["app_gs"]),
            ("w_l", &["wl"]),
        ];
        let mut table = Self {
            lookup: HashMap::new(),
        };
        for (canonical, aliases) in groups {
            table.insert(canonical, aliases.iter().copied());
        }
        table
    }

    /// Built-in groups plus any `[aliases]` from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::builtin().with_extra(&config.aliases)
    }

    /// Merge extra synonym groups. Later entries win on conflicts.
    pub fn with_extra(mut self, extra: &BTreeMap<String, Vec<String>>) -> Self {
        for (canonical, aliases) in extra {
            let canonical = clean_header(canonical);
            self.insert(&canonical, aliases.iter().map(String::as_str));
        }
        self
    }

    fn insert<'a>(&mut self, canonical: &str, aliases: impl Iterator<Item = &'a str>) {
        self.lookup
            .insert(squash(canonical), canonical.to_string());
        for alias in aliases {
            self.lookup
                .insert(squash(&clean_header(alias)), canonical.to_string());
        }
    }

    /// Canonical name for an already-cleaned header, if it is a known synonym.
    pub fn resolve(&self, cleaned: &str) -> Option<&str> {
        self.lookup.get(&squash(cleaned)).map(String::as_str)
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn squash(name: &str) -> String {
    name.chars().filter(|c| *c != '_').collect()
}

/// Lower-case, drop `%`, trim, and turn runs of `-`, space or `_` into a
/// single `_` with none at either end.
pub fn clean_header(raw: &str) -> String {
    let lowered = raw.to_lowercase().replace('%', "");
    let mut out = String::with_capacity(lowered.len());
    let mut pending_sep = false;
    for c in lowered.trim().chars() {
        if c == '-' || c == '_' || c.is_whitespace() {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.push(c);
    }
    out
}

/// Map each raw header (in column order) to its canonical name.
///
/// `name` is promoted to `player` only when no column already resolves to
/// `player`.
pub fn normalize_headers(raw_headers: &[String], aliases: &AliasTable) -> Vec<(String, String)> {
    let mut mapped: Vec<(String, String)> = raw_headers
        .iter()
        .map(|raw| {
            let cleaned = clean_header(raw);
            let canonical = aliases
                .resolve(&cleaned)
                .map(str::to_string)
                .unwrap_or(cleaned);
            (raw.clone(), canonical)
        })
        .collect();

    let has_player = mapped.iter().any(|(_, c)| c == PLAYER);
    if !has_player {
        if let Some(entry) = mapped.iter_mut().find(|(_, c)| c == PLAYER_FALLBACK) {
            entry.1 = PLAYER.to_string();
        }
    }
    mapped
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A single cell after (optional) numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

/// An ordered field-name to cell mapping for one source row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Cell)>,
}

impl Row {
    pub fn get(&self, field: &str) -> Option<&Cell> {
        self.fields.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    /// Set a field, replacing any existing value in place.
    pub fn set(&mut self, field: &str, cell: Cell) {
        match self.fields.iter_mut().find(|(k, _)| k == field) {
            Some(slot) => slot.1 = cell,
            None => self.fields.push((field.to_string(), cell)),
        }
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.get(field) {
            Some(Cell::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        match self.get(field) {
            Some(Cell::Number(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
}

/// Build rows keyed by canonical header. When two columns map to the same
/// name the leftmost one wins.
pub fn to_rows(table: &RawTable, headers: &[(String, String)]) -> Vec<Row> {
    table
        .rows
        .iter()
        .map(|cells| {
            let mut row = Row::default();
            for ((_, canonical), cell) in headers.iter().zip(cells) {
                if row.get(canonical).is_none() {
                    row.fields.push((canonical.clone(), Cell::Text(cell.clone())));
                }
            }
            row
        })
        .collect()
}

/// Trim player names; drop rows whose name is blank or a textual null.
/// Returns the number of rows dropped.
pub fn trim_player_name(rows: &mut Vec<Row>) -> usize {
    let before = rows.len();
    rows.retain_mut(|row| {
        let Some(name) = row.text(PLAYER) else {
            return false;
        };
        let trimmed = name.trim();
        if trimmed.is_empty()
            || NULL_PLAYER_TOKENS
                .iter()
                .any(|t| trimmed.eq_ignore_ascii_case(t))
        {
            return false;
        }
        let trimmed = trimmed.to_string();
        row.set(PLAYER, Cell::Text(trimmed));
        true
    });
    before - rows.len()
}

/// Drop team summary rows (`Totals`, `Opponents`). Exact, case-sensitive.
pub fn filter_non_player_rows(rows: &mut Vec<Row>) -> usize {
    let before = rows.len();
    rows.retain(|row| {
        !row
            .text(PLAYER)
            .is_some_and(|p| NON_PLAYER_ROWS.contains(&p))
    });
    before - rows.len()
}

/// Parse a cell as a finite real. Blank, free-text and non-finite values
/// yield `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce the listed fields to numbers in place. Unparsable cells become
/// `Missing`. Returns how many non-blank cells failed to parse.
pub fn coerce_numeric(rows: &mut [Row], fields: &[&str]) -> usize {
    let mut failures = 0;
    for row in rows.iter_mut() {
        for field in fields {
            let coerced = match row.get(field) {
                Some(Cell::Text(s)) => match parse_number(s) {
                    Some(v) => Cell::Number(v),
                    None => {
                        if !s.trim().is_empty() {
                            failures += 1;
                        }
                        Cell::Missing
                    }
                },
                _ => continue,
            };
            row.set(field, coerced);
        }
    }
    failures
}

/// Keep only `wanted` fields, reordered to match. Absent fields stay absent.
pub fn project_columns(rows: &mut [Row], wanted: &[&str]) {
    for row in rows.iter_mut() {
        let mut projected = Vec::with_capacity(wanted.len());
        for field in wanted {
            if let Some(pos) = row.fields.iter().position(|(k, _)| k == field) {
                projected.push(row.fields.swap_remove(pos));
            }
        }
        row.fields = projected;
    }
}

/// Season and team attached to every row of one source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub season: i32,
    pub team: String,
}

pub fn stamp_provenance(rows: &mut [Row], provenance: &Provenance) {
    for row in rows.iter_mut() {
        row.set(SEASON, Cell::Number(f64::from(provenance.season)));
        row.set(TEAM, Cell::Text(provenance.team.clone()));
    }
}

/// Drop batting rows with neither `obp` nor `slg`. Returns rows dropped.
pub fn drop_rows_without_rate_stats(rows: &mut Vec<Row>) -> usize {
    let before = rows.len();
    rows.retain(|row| row.number("obp").is_some() || row.number("slg").is_some());
    before - rows.len()
}

// ---------------------------------------------------------------------------
// Table-level entry points
// ---------------------------------------------------------------------------

/// Header mapping, player cleanup, provenance, projection and coercion
/// shared by both table kinds.
fn normalize_common(
    table: &RawTable,
    provenance: &Provenance,
    aliases: &AliasTable,
    wanted: &[&str],
    numeric: &[&str],
) -> Vec<Row> {
    let headers = normalize_headers(&table.headers, aliases);

    let missing: Vec<&str> = wanted
        .iter()
        .copied()
        .filter(|f| *f != SEASON && *f != TEAM)
        .filter(|f| !headers.iter().any(|(_, c)| c == f))
        .collect();
    if !missing.is_empty() {
        debug!(
            "season {}: source has no column for {}",
            provenance.season,
            missing.join(", ")
        );
    }

    let mut rows = to_rows(table, &headers);
    let unnamed = trim_player_name(&mut rows);
    let summary = filter_non_player_rows(&mut rows);
    stamp_provenance(&mut rows, provenance);
    project_columns(&mut rows, wanted);
    let failures = coerce_numeric(&mut rows, numeric);

    debug!(
        "season {}: dropped {unnamed} unnamed and {summary} summary rows, {failures} cells not numeric",
        provenance.season
    );
    rows
}

/// Normalize one raw batting table into canonical records.
pub fn normalize_batting(
    table: &RawTable,
    provenance: &Provenance,
    aliases: &AliasTable,
) -> Vec<CanonicalBattingRecord> {
    let mut rows = normalize_common(table, provenance, aliases, BATTING_FIELDS, BATTING_NUMERIC);
    let incomplete = drop_rows_without_rate_stats(&mut rows);
    if incomplete > 0 {
        debug!(
            "season {}: dropped {incomplete} batting rows with neither obp nor slg",
            provenance.season
        );
    }

    rows.iter()
        .filter_map(|row| {
            Some(CanonicalBattingRecord {
                player: row.text(PLAYER)?.to_string(),
                season: provenance.season,
                team: provenance.team.clone(),
                avg: row.number("avg"),
                ab: row.number("ab"),
                r: row.number("r"),
                h: row.number("h"),
                hr: row.number("hr"),
                rbi: row.number("rbi"),
                obp: row.number("obp"),
                slg: row.number("slg"),
            })
        })
        .collect()
}

/// Normalize one raw pitching table into canonical records.
pub fn normalize_pitching(
    table: &RawTable,
    provenance: &Provenance,
    aliases: &AliasTable,
) -> Vec<CanonicalPitchingRecord> {
    let rows = normalize_common(table, provenance, aliases, PITCHING_FIELDS, PITCHING_NUMERIC);
    let whole = |v: f64| v.round() as i64;

    rows.iter()
        .filter_map(|row| {
            Some(CanonicalPitchingRecord {
                player: row.text(PLAYER)?.to_string(),
                season: provenance.season,
                team: provenance.team.clone(),
                era: row.number("era"),
                w_l: row
                    .text("w_l")
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                app: row.number("app").map(whole),
                ip: row.number("ip"),
                so: row.number("so").map(whole),
                hr: row.number("hr").map(whole),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
