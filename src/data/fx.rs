use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use super::columns;
use super::model::{FieldValue, SurveyDataset};

// ---------------------------------------------------------------------------
// Built-in rate table (quick path)
// ---------------------------------------------------------------------------

/// Static USD-per-unit rates for the currencies that actually occur in the
/// survey. Used when no ISO/FX tables have been loaded.
pub const BUILTIN_RATES_TO_USD: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 1.08),
    ("GBP", 1.27),
    ("CAD", 0.74),
    ("AUD", 0.66),
    ("INR", 0.012),
    ("IDR", 0.000065),
    ("JPY", 0.0067),
    ("CNY", 0.14),
    ("SGD", 0.74),
];

/// Look up the built-in USD-per-unit rate for a currency code.
pub fn builtin_rate(code: &str) -> Option<f64> {
    let code = code.trim().to_ascii_uppercase();
    BUILTIN_RATES_TO_USD
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, r)| *r)
}

// ---------------------------------------------------------------------------
// Table-driven path: ISO mapping + per-year FX rates
// ---------------------------------------------------------------------------

/// Loaded currency reference tables.
///
/// * `iso` maps the free-text currency answers ("US Dollar", "Euro", ...)
///   to ISO codes.
/// * `fx` maps (ISO code, survey year) to a units-per-USD rate, so the
///   conversion divides where the built-in table multiplies.
#[derive(Debug, Clone, Default)]
pub struct CurrencyTables {
    pub iso: BTreeMap<String, String>,
    pub fx: BTreeMap<(String, i64), f64>,
}

impl CurrencyTables {
    /// Load the ISO mapping table: CSV with `CountryCurrency` and `ISO`
    /// columns.
    pub fn load_iso_csv(&mut self, path: &Path) -> Result<usize> {
        let mut reader = csv::Reader::from_path(path).context("opening ISO table")?;
        let headers = reader.headers().context("reading ISO headers")?.clone();
        let name_idx = headers
            .iter()
            .position(|h| h == "CountryCurrency")
            .context("ISO table missing 'CountryCurrency' column")?;
        let iso_idx = headers
            .iter()
            .position(|h| h == "ISO")
            .context("ISO table missing 'ISO' column")?;

        let mut count = 0;
        for (row_no, result) in reader.records().enumerate() {
            let row = result.with_context(|| format!("ISO table row {row_no}"))?;
            let name = row.get(name_idx).unwrap_or("").trim();
            let iso = row.get(iso_idx).unwrap_or("").trim();
            if name.is_empty() || iso.is_empty() {
                continue;
            }
            self.iso
                .insert(normalize_currency(name), iso.to_ascii_uppercase());
            count += 1;
        }
        Ok(count)
    }

    /// Load the FX table: wide CSV with a `Currency` column holding ISO
    /// codes and one column per survey year holding units-per-USD rates.
    /// Melted here into (ISO, year) → rate, matching the long format the
    /// conversion joins against.
    pub fn load_fx_csv(&mut self, path: &Path) -> Result<usize> {
        let mut reader = csv::Reader::from_path(path).context("opening FX table")?;
        let headers = reader.headers().context("reading FX headers")?.clone();
        let iso_idx = headers
            .iter()
            .position(|h| h == "Currency")
            .context("FX table missing 'Currency' column")?;

        let year_columns: Vec<(usize, i64)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != iso_idx)
            .filter_map(|(i, h)| h.trim().parse::<i64>().ok().map(|y| (i, y)))
            .collect();

        let mut count = 0;
        for (row_no, result) in reader.records().enumerate() {
            let row = result.with_context(|| format!("FX table row {row_no}"))?;
            let iso = row.get(iso_idx).unwrap_or("").trim().to_ascii_uppercase();
            if iso.is_empty() {
                continue;
            }
            for &(col, year) in &year_columns {
                if let Some(rate) = row.get(col).and_then(|s| s.trim().parse::<f64>().ok()) {
                    self.fx.insert((iso.clone(), year), rate);
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    pub fn is_loaded(&self) -> bool {
        !self.iso.is_empty() && !self.fx.is_empty()
    }
}

fn normalize_currency(s: &str) -> String {
    s.trim().to_ascii_uppercase()
}

// ---------------------------------------------------------------------------
// Coverage check
// ---------------------------------------------------------------------------

/// One gap in currency coverage: a (year, key) group and how many rows it
/// affects. `key` is the raw currency text for unmapped rows and the ISO
/// code for missing-FX rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageGap {
    pub year: i64,
    pub key: String,
    pub count: usize,
}

/// Result of running the table-driven conversion: which rows could not be
/// mapped to an ISO code, and which mapped rows had no FX rate for their
/// survey year.
#[derive(Debug, Clone, Default)]
pub struct CurrencyCheck {
    pub unmapped: Vec<CoverageGap>,
    pub missing_fx: Vec<CoverageGap>,
}

impl CurrencyCheck {
    pub fn is_clean(&self) -> bool {
        self.unmapped.is_empty() && self.missing_fx.is_empty()
    }

    /// Write one gap list as a CSV table.
    pub fn export_csv(gaps: &[CoverageGap], key_header: &str, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path).context("creating export file")?;
        writer.write_record(["SurveyYear", key_header, "Count"])?;
        for gap in gaps {
            writer.write_record([
                gap.year.to_string(),
                gap.key.clone(),
                gap.count.to_string(),
            ])?;
        }
        writer.flush().context("flushing export file")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Derive `SalaryUSD` using the built-in rate table:
/// `SalaryUSD = CurrentSalaryAmount × rate`. Rows with an unknown currency
/// or missing amount get a `Null` salary and fall out during cleaning.
pub fn apply_builtin_rates(ds: &SurveyDataset) -> SurveyDataset {
    let records = ds
        .records
        .iter()
        .map(|rec| {
            let mut out = rec.clone();
            let usd = rec.numeric(columns::SALARY_AMOUNT).and_then(|amount| {
                let code = match rec.get(columns::CURRENCY) {
                    Some(FieldValue::String(s)) => s.clone(),
                    // Blank currency: no rate, the row falls out in cleaning.
                    Some(FieldValue::Null) | None => return None,
                    Some(other) => other.to_string(),
                };
                builtin_rate(&code).map(|rate| amount * rate)
            });
            out.fields.insert(
                columns::SALARY_USD.to_string(),
                usd.map(FieldValue::Float).unwrap_or(FieldValue::Null),
            );
            out
        })
        .collect();
    SurveyDataset::from_records(records)
}

/// Derive `SalaryUSD` through the loaded ISO/FX tables:
/// `SalaryUSD = CurrentSalaryAmount ÷ fx_rate(iso, year)`. Returns the
/// converted dataset together with the coverage report.
pub fn convert_with_tables(
    ds: &SurveyDataset,
    tables: &CurrencyTables,
) -> (SurveyDataset, CurrencyCheck) {
    let mut unmapped: BTreeMap<(i64, String), usize> = BTreeMap::new();
    let mut missing_fx: BTreeMap<(i64, String), usize> = BTreeMap::new();

    let records: Vec<_> = ds
        .records
        .iter()
        .map(|rec| {
            let mut out = rec.clone();
            let year = rec
                .numeric(columns::SURVEY_YEAR)
                .map(|y| y as i64)
                .unwrap_or(0);

            let raw_currency = match rec.get(columns::CURRENCY) {
                Some(FieldValue::String(s)) => s.clone(),
                Some(FieldValue::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };

            let usd = match tables.iso.get(&normalize_currency(&raw_currency)) {
                None => {
                    *unmapped.entry((year, raw_currency)).or_default() += 1;
                    None
                }
                Some(iso) => match tables.fx.get(&(iso.clone(), year)) {
                    None => {
                        *missing_fx.entry((year, iso.clone())).or_default() += 1;
                        None
                    }
                    Some(&rate) if rate > 0.0 => {
                        rec.numeric(columns::SALARY_AMOUNT).map(|a| a / rate)
                    }
                    Some(_) => None,
                },
            };

            out.fields.insert(
                columns::SALARY_USD.to_string(),
                usd.map(FieldValue::Float).unwrap_or(FieldValue::Null),
            );
            out
        })
        .collect();

    let to_gaps = |m: BTreeMap<(i64, String), usize>| {
        m.into_iter()
            .map(|((year, key), count)| CoverageGap { year, key, count })
            .collect()
    };

    (
        SurveyDataset::from_records(records),
        CurrencyCheck {
            unmapped: to_gaps(unmapped),
            missing_fx: to_gaps(missing_fx),
        },
    )
}
