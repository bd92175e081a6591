// Raw season exports: file discovery and CSV reading.
//
// Exports are named `batting_<year>.csv` / `pitching_<year>.csv`. Headers are
// kept exactly as written; normalization happens downstream.

use std::io::Read;
use std::path::{Path, PathBuf};

use boxscore_core::records::StatKind;
use thiserror::Error;
use tracing::warn;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A source table as read from disk: one header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One discovered raw export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonSource {
    pub kind: StatKind,
    pub season: i32,
    pub path: PathBuf,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{path} contains no data rows")]
    Empty { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

fn read_table_from_reader<R: Read>(rdr: R) -> Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(rdr);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        // Ragged rows are padded or cut to the header width.
        cells.resize(headers.len(), String::new());
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push(cells);
    }
    Ok(RawTable { headers, rows })
}

/// Read a raw CSV export. A file with a header row but no data rows is
/// reported as [`SourceError::Empty`].
pub fn read_table(path: &Path) -> Result<RawTable, SourceError> {
    let file = std::fs::File::open(path).map_err(|e| SourceError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let table = read_table_from_reader(file).map_err(|e| SourceError::Csv {
        path: path.to_path_buf(),
        source: e,
    })?;
    if table.is_empty() {
        return Err(SourceError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Parse `batting_2025.csv`-style file names into a kind and season.
pub fn parse_source_name(file_name: &str) -> Option<(StatKind, i32)> {
    let stem = file_name.strip_suffix(".csv")?;
    let (prefix, year) = stem.split_once('_')?;
    let kind = match prefix {
        "batting" => StatKind::Batting,
        "pitching" => StatKind::Pitching,
        _ => return None,
    };
    let season = year.parse::<i32>().ok()?;
    Some((kind, season))
}

/// List every recognizable season export in `raw_dir`, sorted by kind then
/// season. Files with the right prefix but an unparsable year are skipped
/// with a warning.
pub fn discover_sources(raw_dir: &Path) -> Result<Vec<SeasonSource>, SourceError> {
    let entries = std::fs::read_dir(raw_dir).map_err(|e| SourceError::Io {
        path: raw_dir.to_path_buf(),
        source: e,
    })?;

    let mut sources = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SourceError::Io {
            path: raw_dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match parse_source_name(name) {
            Some((kind, season)) => sources.push(SeasonSource { kind, season, path }),
            None if name.ends_with(".csv")
                && (name.starts_with("batting_") || name.starts_with("pitching_")) =>
            {
                warn!("skipping {}: cannot read a season from the file name", path.display());
            }
            None => {}
        }
    }

    sources.sort_by(|a, b| (a.kind, a.season).cmp(&(b.kind, b.season)));
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_headers_and_rows() {
        let data = "\
Player,AVG,AB,OB%
\"Smith, John\",.310,200,.400
Doe Jane,.250,120,.330";
        let table = read_table_from_reader(data.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["Player", "AVG", "AB", "OB%"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], "Smith, John");
        assert_eq!(table.rows[1][3], ".330");
    }

    #[test]
    fn ragged_rows_are_padded_and_blank_rows_dropped() {
        let data = "Player,AVG,AB\nSmith,.310\n,,\nDoe,.250,120,extra";
        let table = read_table_from_reader(data.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["Smith", ".310", ""]);
        assert_eq!(table.rows[1], vec!["Doe", ".250", "120"]);
    }

    #[test]
    fn header_only_file_is_empty_source() {
        let dir = std::env::temp_dir().join("boxscore_source_header_only");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("batting_2024.csv");
        fs::write(&path, "Player,AVG,AB\n").unwrap();

        assert!(matches!(read_table(&path), Err(SourceError::Empty { .. })));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("boxscore_source_does_not_exist.csv");
        assert!(matches!(read_table(&path), Err(SourceError::Io { .. })));
    }

    #[test]
    fn parses_source_names() {
        assert_eq!(
            parse_source_name("batting_2025.csv"),
            Some((StatKind::Batting, 2025))
        );
        assert_eq!(
            parse_source_name("pitching_2019.csv"),
            Some((StatKind::Pitching, 2019))
        );
        assert_eq!(parse_source_name("batting_latest.csv"), None);
        assert_eq!(parse_source_name("fielding_2025.csv"), None);
        assert_eq!(parse_source_name("batting_2025.xml"), None);
    }

    #[test]
    fn discovery_sorts_by_kind_then_season() {
        let dir = std::env::temp_dir().join("boxscore_source_discovery");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for name in [
            "pitching_2024.csv",
            "batting_2025.csv",
            "batting_2023.csv",
            "batting_notayear.csv",
            "notes.txt",
        ] {
            fs::write(dir.join(name), "Player\nA\n").unwrap();
        }

        let sources = discover_sources(&dir).unwrap();
        let found: Vec<(StatKind, i32)> = sources.iter().map(|s| (s.kind, s.season)).collect();
        assert_eq!(
            found,
            vec![
                (StatKind::Batting, 2023),
                (StatKind::Batting, 2025),
                (StatKind::Pitching, 2024),
            ]
        );

        let _ = fs::remove_dir_all(&dir);
    }
}
