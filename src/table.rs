//! Delimited tables: parse, project, re-serialize.
//!
//! A [`Table`] keeps the header order of its source file and stores every
//! field as an opaque string. Rank, counts and URLs all pass through
//! untouched, so re-serializing a parsed file reproduces its values exactly.
//!
//! ## Projection
//!
//! The public copy of a table only carries whitelisted columns, possibly
//! renamed. For key resources:
//!
//! | archive column | public column |
//! |---|---|
//! | `rank` | `rank` |
//! | `id` | `id` |
//! | `type` | `type` |
//! | `url` | `url` |
//! | `count` | `broadcast_by_mps` |
//! | `groups` | `bcing_mps_group` |
//!
//! Everything else is dropped from the public copy and kept in the archive.
//!
//! ## Serialization
//!
//! Comma-delimited, `\n`-terminated, fields quoted only when they contain a
//! delimiter, quote or newline. The header row is always written.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One record: column name → value, in column order.
pub type Row = IndexMap<String, String>;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Source table not found: {0}")]
    SourceMissing(PathBuf),
    #[error("Could not parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Apply `rule` to every row.
    pub fn project(&self, rule: &ProjectionRule) -> Table {
        let rows = self.rows.iter().map(|row| rule.apply(row)).collect();
        Table {
            columns: rule.target_columns(),
            rows,
        }
    }

    /// Serialize to CSV text.
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        if !self.columns.is_empty() {
            writer.write_record(&self.columns)?;
            for row in &self.rows {
                writer.write_record(
                    self.columns
                        .iter()
                        .map(|c| row.get(c).map(String::as_str).unwrap_or("")),
                )?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        // Every field came from a `String`, so the buffer is valid UTF-8.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Parse CSV text. `origin` only labels errors.
pub fn parse_table(text: &[u8], origin: &Path) -> Result<Table, TableError> {
    let parse_error = |e: csv::Error| TableError::Parse {
        path: origin.to_path_buf(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text);

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(String::from)
        .collect();

    let mut columns: Vec<String> = Vec::with_capacity(headers.len());
    for h in &headers {
        if !columns.contains(h) {
            columns.push(h.clone());
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        // Duplicate header names: the last value wins.
        let row: Row = headers
            .iter()
            .cloned()
            .zip(record.iter().map(String::from))
            .collect();
        rows.push(row);
    }

    Ok(Table { columns, rows })
}

/// Read and parse the CSV file at `path`.
pub fn read_table(path: &Path) -> Result<Table, TableError> {
    if !path.is_file() {
        return Err(TableError::SourceMissing(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|e| TableError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_table(&bytes, path)
}

/// Ordered whitelist of `source → target` column renames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionRule {
    mapping: Vec<(String, String)>,
}

impl ProjectionRule {
    pub fn new<S: Into<String>, T: Into<String>>(mapping: impl IntoIterator<Item = (S, T)>) -> Self {
        Self {
            mapping: mapping
                .into_iter()
                .map(|(s, t)| (s.into(), t.into()))
                .collect(),
        }
    }

    /// The public-safe projection of the key resources table.
    pub fn key_resources() -> Self {
        Self::new([
            ("rank", "rank"),
            ("id", "id"),
            ("type", "type"),
            ("url", "url"),
            ("count", "broadcast_by_mps"),
            ("groups", "bcing_mps_group"),
        ])
    }

    pub fn target_columns(&self) -> Vec<String> {
        self.mapping.iter().map(|(_, t)| t.clone()).collect()
    }

    /// Project one row. A source column missing from `row` becomes `""`.
    pub fn apply(&self, row: &Row) -> Row {
        self.mapping
            .iter()
            .map(|(source, target)| {
                (
                    target.clone(),
                    row.get(source).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KEY_RESOURCES_CSV: &str = "\
rank,id,type,url,count,groups,text
1,x,url,http://a,5,G1,first
2,1234567890,tweet,https://twitter.com/i/status/1234567890,12,\"G1,G2\",\"says \"\"hi\"\"\"
";

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn origin() -> &'static Path {
        Path::new("key_resources.csv")
    }

    #[test]
    fn parse_keeps_header_order_and_strings() {
        let table = parse_table(KEY_RESOURCES_CSV.as_bytes(), origin()).unwrap();
        assert_eq!(
            table.columns(),
            &["rank", "id", "type", "url", "count", "groups", "text"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0]["rank"], "1");
        assert_eq!(table.rows()[1]["groups"], "G1,G2");
        assert_eq!(table.rows()[1]["text"], "says \"hi\"");
        let keys: Vec<&str> = table.rows()[0].keys().map(String::as_str).collect();
        assert_eq!(keys, table.columns());
    }

    #[test]
    fn reserialize_reproduces_source() {
        let table = parse_table(KEY_RESOURCES_CSV.as_bytes(), origin()).unwrap();
        assert_eq!(table.to_csv().unwrap(), KEY_RESOURCES_CSV);
    }

    #[test]
    fn values_are_not_coerced() {
        let csv = "rank,count\n01,5.0\n";
        let table = parse_table(csv.as_bytes(), origin()).unwrap();
        assert_eq!(table.rows()[0]["rank"], "01");
        assert_eq!(table.to_csv().unwrap(), csv);
    }

    #[test]
    fn projection_renames_and_drops() {
        let source = row(&[
            ("rank", "1"),
            ("id", "x"),
            ("type", "url"),
            ("url", "http://a"),
            ("count", "5"),
            ("groups", "G1"),
        ]);
        let projected = ProjectionRule::key_resources().apply(&source);
        assert_eq!(
            projected,
            row(&[
                ("rank", "1"),
                ("id", "x"),
                ("type", "url"),
                ("url", "http://a"),
                ("broadcast_by_mps", "5"),
                ("bcing_mps_group", "G1"),
            ])
        );
        assert_eq!(projected.len(), 6);
    }

    #[test]
    fn projected_table_drops_unlisted_columns() {
        let table = parse_table(KEY_RESOURCES_CSV.as_bytes(), origin()).unwrap();
        let public = table.project(&ProjectionRule::key_resources());

        assert_eq!(
            public.columns(),
            &["rank", "id", "type", "url", "broadcast_by_mps", "bcing_mps_group"]
        );
        assert!(public.rows().iter().all(|r| !r.contains_key("text")));
        // Archive copy still has everything.
        assert!(table.columns().contains(&"text".to_string()));
        assert_eq!(
            public.to_csv().unwrap().lines().next(),
            Some("rank,id,type,url,broadcast_by_mps,bcing_mps_group")
        );
    }

    #[test]
    fn projection_fills_missing_source_column_with_empty() {
        let projected = ProjectionRule::key_resources().apply(&row(&[("rank", "3")]));
        assert_eq!(projected["rank"], "3");
        assert_eq!(projected["bcing_mps_group"], "");
    }

    #[test]
    fn ragged_record_is_parse_error() {
        let err = parse_table(b"a,b\n1,2,3\n", origin()).unwrap_err();
        assert!(matches!(err, TableError::Parse { .. }));
    }

    #[test]
    fn invalid_utf8_is_parse_error() {
        let err = parse_table(b"a,b\n\xff\xfe,2\n", origin()).unwrap_err();
        assert!(matches!(err, TableError::Parse { .. }));
    }

    #[test]
    fn empty_input_is_empty_table() {
        let table = parse_table(b"", origin()).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
        assert_eq!(table.to_csv().unwrap(), "");
    }

    #[test]
    fn header_only_table_keeps_header() {
        let table = parse_table(b"rank,id\n", origin()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.to_csv().unwrap(), "rank,id\n");
    }

    #[test]
    fn read_table_missing_file_is_source_missing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("key_resources.csv");
        assert!(matches!(
            read_table(&path),
            Err(TableError::SourceMissing(p)) if p == path
        ));
    }
}
