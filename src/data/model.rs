use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// FieldValue – a single cell in a survey column
// ---------------------------------------------------------------------------

/// A dynamically-typed survey cell mirroring common spreadsheet dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `FieldValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put FieldValue in BTreeSet --

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use FieldValue::*;
        fn discriminant(v: &FieldValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for FieldValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::String(s) => s.hash(state),
            FieldValue::Integer(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::Bool(b) => b.hash(state),
            FieldValue::Null => {}
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{v:.2}")
                }
            }
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl FieldValue {
    /// Try to interpret the value as an `f64` for numeric analysis.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Case-insensitive "Yes" containment, the survey's convention for
    /// boolean-ish answer columns ("Yes", "Yes - CCP", ...).
    pub fn contains_yes(&self) -> bool {
        match self {
            FieldValue::String(s) => s.to_ascii_lowercase().contains("yes"),
            FieldValue::Bool(b) => *b,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// SurveyRecord – one respondent (one row of the source table)
// ---------------------------------------------------------------------------

/// A single survey response. Columns vary between editions, so the row is
/// a dynamic column → value map rather than a fixed struct.
#[derive(Debug, Clone, Default)]
pub struct SurveyRecord {
    pub fields: BTreeMap<String, FieldValue>,
}

impl SurveyRecord {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    /// Numeric view of a column; `None` for missing or non-numeric cells.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        self.fields.get(column).and_then(FieldValue::as_f64)
    }
}

// ---------------------------------------------------------------------------
// SurveyDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed column indices.
#[derive(Debug, Clone, Default)]
pub struct SurveyDataset {
    /// All responses (rows).
    pub records: Vec<SurveyRecord>,
    /// Ordered list of column names.
    pub column_names: Vec<String>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<FieldValue>>,
}

impl SurveyDataset {
    /// Build column indices from the loaded records.
    pub fn from_records(records: Vec<SurveyRecord>) -> Self {
        let mut column_names_set: BTreeSet<String> = BTreeSet::new();
        let mut unique_values: BTreeMap<String, BTreeSet<FieldValue>> = BTreeMap::new();

        for rec in &records {
            for (col, val) in &rec.fields {
                column_names_set.insert(col.clone());
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        let column_names: Vec<String> = column_names_set.into_iter().collect();
        SurveyDataset {
            records,
            column_names,
            unique_values,
        }
    }

    /// Number of responses.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Extract paired `(x, y)` observations for two numeric columns over the
    /// given row indices. Rows where either cell is missing or non-numeric
    /// are dropped, so the result is ready for analysis.
    pub fn numeric_pairs(&self, indices: &[usize], x_col: &str, y_col: &str) -> Vec<(f64, f64)> {
        indices
            .iter()
            .filter_map(|&i| {
                let rec = self.records.get(i)?;
                let x = rec.numeric(x_col)?;
                let y = rec.numeric(y_col)?;
                Some((x, y))
            })
            .collect()
    }

    /// Columns whose value set is small enough to behave as a category
    /// (filter widgets, factor encoding). Purely numeric wide columns such
    /// as salary are excluded.
    pub fn categorical_columns(&self, max_cardinality: usize) -> Vec<String> {
        self.column_names
            .iter()
            .filter(|col| {
                self.unique_values
                    .get(*col)
                    .map(|vals| vals.len() <= max_cardinality)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, FieldValue)]) -> SurveyRecord {
        SurveyRecord {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn numeric_pairs_drops_missing_cells() {
        let ds = SurveyDataset::from_records(vec![
            record(&[
                ("Experience", FieldValue::Float(5.0)),
                ("SalaryUSD", FieldValue::Float(90_000.0)),
            ]),
            record(&[
                ("Experience", FieldValue::Null),
                ("SalaryUSD", FieldValue::Float(80_000.0)),
            ]),
            record(&[
                ("Experience", FieldValue::Integer(10)),
                ("SalaryUSD", FieldValue::String("prefer not to say".into())),
            ]),
            record(&[
                ("Experience", FieldValue::Integer(12)),
                ("SalaryUSD", FieldValue::Integer(120_000)),
            ]),
        ]);
        let indices: Vec<usize> = (0..ds.len()).collect();
        let pairs = ds.numeric_pairs(&indices, "Experience", "SalaryUSD");
        assert_eq!(pairs, vec![(5.0, 90_000.0), (12.0, 120_000.0)]);
    }

    #[test]
    fn contains_yes_is_case_insensitive() {
        assert!(FieldValue::String("Yes".into()).contains_yes());
        assert!(FieldValue::String("yes - CCP".into()).contains_yes());
        assert!(!FieldValue::String("No".into()).contains_yes());
        assert!(!FieldValue::Null.contains_yes());
    }

    #[test]
    fn categorical_columns_respect_cardinality() {
        let records: Vec<SurveyRecord> = (0..50)
            .map(|i| {
                record(&[
                    (
                        "Member",
                        FieldValue::String(if i % 2 == 0 { "Yes" } else { "No" }.into()),
                    ),
                    ("SalaryUSD", FieldValue::Float(50_000.0 + i as f64 * 1000.0)),
                ])
            })
            .collect();
        let ds = SurveyDataset::from_records(records);
        let cats = ds.categorical_columns(10);
        assert_eq!(cats, vec!["Member".to_string()]);
    }
}
