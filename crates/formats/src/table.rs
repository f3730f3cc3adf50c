use std::collections::HashMap;
use std::io::Read;

pub const DEFAULT_KEY_COLUMN: &str = "ReturnName";

#[derive(Debug)]
pub enum TableError {
    Csv(csv::Error),
    MissingKeyColumn { key: String, header: Vec<String> },
    DuplicateKey { key: String, line: u64 },
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::Csv(e) => write!(f, "CSV parse error: {e}"),
            TableError::MissingKeyColumn { key, header } => {
                write!(f, "key column {key:?} not in header {header:?}")
            }
            TableError::DuplicateKey { key, line } => {
                write!(f, "duplicate key {key:?} on line {line}")
            }
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for TableError {
    fn from(e: csv::Error) -> Self {
        TableError::Csv(e)
    }
}

/// Demand values keyed by region name, one column per scenario.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DemandTable {
    key_column: String,
    scenarios: Vec<String>,
    rows: Vec<(String, Vec<f64>)>,
    index: HashMap<String, usize>,
    bad_cells: usize,
}

impl DemandTable {
    pub fn from_csv_str(text: &str, key_column: &str) -> Result<Self, TableError> {
        Self::from_reader(text.as_bytes(), key_column)
    }

    /// Reads a headed CSV. Scenario columns are every header except the key,
    /// in header order. Short rows read their missing cells as empty.
    pub fn from_reader<R: Read>(reader: R, key_column: &str) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let key_pos = header
            .iter()
            .position(|h| h == key_column)
            .ok_or_else(|| TableError::MissingKeyColumn {
                key: key_column.to_string(),
                header: header.clone(),
            })?;
        let value_cols: Vec<usize> = (0..header.len()).filter(|&i| i != key_pos).collect();
        let scenarios: Vec<String> = value_cols.iter().map(|&i| header[i].clone()).collect();

        let mut rows = Vec::new();
        let mut index = HashMap::new();
        let mut bad_cells = 0usize;
        for record in rdr.records() {
            let record = record?;
            let key = record.get(key_pos).unwrap_or_default().to_string();
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            if index.contains_key(&key) {
                return Err(TableError::DuplicateKey { key, line });
            }

            let values: Vec<f64> = value_cols
                .iter()
                .map(|&i| {
                    let cell = record.get(i).unwrap_or_default();
                    parse_cell(cell).unwrap_or_else(|| {
                        tracing::warn!(key = %key, column = %header[i], cell, "non-numeric cell read as 0");
                        bad_cells += 1;
                        0.0
                    })
                })
                .collect();

            index.insert(key.clone(), rows.len());
            rows.push((key, values));
        }

        Ok(Self {
            key_column: key_column.to_string(),
            scenarios,
            rows,
            index,
            bad_cells,
        })
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn scenarios(&self) -> &[String] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells that were neither blank nor numeric.
    pub fn bad_cells(&self) -> usize {
        self.bad_cells
    }

    pub fn row(&self, key: &str) -> Option<&[f64]> {
        self.index.get(key).map(|&i| self.rows[i].1.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(|(k, _)| k.as_str())
    }
}

/// Numeric reading of a cell: blank is zero, otherwise a float literal.
/// `None` for anything else.
pub fn parse_cell(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    // Rust also accepts "inf" and "nan" spellings; a CSV cell saying so is not a number.
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::{DemandTable, TableError, parse_cell};
    use pretty_assertions::assert_eq;

    const CSV: &str = "ReturnName,Core,High,Low\n\
                       Leeds 001,10,12.5,8\n\
                       Leeds 002,0, ,-3\n\
                       Leeds 003,abc,1e3\n";

    #[test]
    fn scenarios_are_header_minus_key() {
        let table = DemandTable::from_csv_str(CSV, "ReturnName").unwrap();
        assert_eq!(table.scenarios(), &["Core", "High", "Low"]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn key_column_need_not_be_first() {
        let table = DemandTable::from_csv_str("Core,Zone,High\n1,A,2\n", "Zone").unwrap();
        assert_eq!(table.scenarios(), &["Core", "High"]);
        assert_eq!(table.row("A"), Some(&[1.0, 2.0][..]));
    }

    #[test]
    fn cells_parse_like_unary_plus() {
        let table = DemandTable::from_csv_str(CSV, "ReturnName").unwrap();
        assert_eq!(table.row("Leeds 001"), Some(&[10.0, 12.5, 8.0][..]));
        assert_eq!(table.row("Leeds 002"), Some(&[0.0, 0.0, -3.0][..]));
        // Non-numeric and missing trailing cells.
        assert_eq!(table.row("Leeds 003"), Some(&[0.0, 1000.0, 0.0][..]));
        assert_eq!(table.bad_cells(), 1);
        assert_eq!(table.row("Leeds 004"), None);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = DemandTable::from_csv_str("ReturnName,Core\nA,1\nA,2\n", "ReturnName").unwrap_err();
        match err {
            TableError::DuplicateKey { key, line } => {
                assert_eq!(key, "A");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_key_column_is_an_error() {
        assert!(matches!(
            DemandTable::from_csv_str("Name,Core\nA,1\n", "ReturnName"),
            Err(TableError::MissingKeyColumn { .. })
        ));
    }

    #[test]
    fn cell_parsing_edge_cases() {
        assert_eq!(parse_cell("  42 "), Some(42.0));
        assert_eq!(parse_cell(""), Some(0.0));
        assert_eq!(parse_cell("-0.5"), Some(-0.5));
        assert_eq!(parse_cell("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_cell("inf"), None);
        assert_eq!(parse_cell("NaN"), None);
        assert_eq!(parse_cell("12px"), None);
    }
}
