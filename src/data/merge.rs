use thiserror::Error;

use super::columns;
use super::model::{FieldValue, SurveyDataset, SurveyRecord};

// ---------------------------------------------------------------------------
// Two-edition merge: normalize column names, tag the survey year, concat
// ---------------------------------------------------------------------------

/// The column subset shared between the 2015 and 2023 editions. Everything
/// outside this list is edition-specific noise and is not carried into the
/// combined dataset.
pub const SHARED_COLUMNS: &[&str] = &[
    "Member",
    "EmploymentStatus",
    "WorkFunction",
    "Industry",
    "JobSatisfaction",
    "LevelOfEducation",
    "YearsOfExperience",
    "Age",
    "Sex",
    "AACECertified",
    "CurrentSalaryAmount",
    "CurrentSalaryCurrency",
    "SameEmployer",
    "WorkHours",
    "Travel",
    "ProjectSize",
];

/// Old → new column names, unifying the editions' vocabularies.
pub const RENAME_MAP: &[(&str, &str)] = &[
    ("YearsOfExperience", columns::EXPERIENCE),
    ("LevelOfEducation", columns::EDUCATION),
    ("Sex", columns::GENDER),
];

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("edition {year} is empty")]
    EmptyEdition { year: u16 },
    #[error("edition {year} is missing required column '{column}'")]
    MissingColumn { year: u16, column: &'static str },
}

/// Normalize one edition: keep the shared columns, apply the rename map,
/// tag every row with `SurveyYear`, and derive the boolean membership and
/// certification flags.
///
/// Certification differs between editions: 2015 answers live in
/// `AACECertified`, while 2023 additionally lists held certificates in
/// `CertType*` columns. A respondent counts as certified when either signal
/// is present.
pub fn normalize_edition(ds: &SurveyDataset, year: u16) -> Result<SurveyDataset, MergeError> {
    if ds.is_empty() {
        return Err(MergeError::EmptyEdition { year });
    }
    for required in ["YearsOfExperience", "CurrentSalaryAmount"] {
        if !ds.column_names.iter().any(|c| c == required) {
            return Err(MergeError::MissingColumn {
                year,
                column: required,
            });
        }
    }

    let cert_type_columns: Vec<&String> = ds
        .column_names
        .iter()
        .filter(|c| c.starts_with("CertType"))
        .collect();

    let records: Vec<SurveyRecord> = ds
        .records
        .iter()
        .map(|rec| {
            let mut out = SurveyRecord::default();

            for &col in SHARED_COLUMNS {
                let Some(val) = rec.get(col) else { continue };
                let name = RENAME_MAP
                    .iter()
                    .find(|(from, _)| *from == col)
                    .map(|(_, to)| *to)
                    .unwrap_or(col);
                out.fields.insert(name.to_string(), val.clone());
            }

            out.fields.insert(
                columns::SURVEY_YEAR.to_string(),
                FieldValue::Integer(year as i64),
            );

            let is_member = rec
                .get("Member")
                .map(FieldValue::contains_yes)
                .unwrap_or(false);
            let is_certified = rec
                .get("AACECertified")
                .map(FieldValue::contains_yes)
                .unwrap_or(false)
                || cert_type_columns
                    .iter()
                    .any(|c| rec.get(c).map(|v| !v.is_null()).unwrap_or(false));

            out.fields
                .insert(columns::IS_MEMBER.to_string(), FieldValue::Bool(is_member));
            out.fields.insert(
                columns::IS_CERTIFIED.to_string(),
                FieldValue::Bool(is_certified),
            );

            out
        })
        .collect();

    Ok(SurveyDataset::from_records(records))
}

/// Merge several normalized editions into one combined dataset.
pub fn merge_editions(editions: &[(u16, SurveyDataset)]) -> Result<SurveyDataset, MergeError> {
    let mut combined = Vec::new();
    for (year, ds) in editions {
        let normalized = normalize_edition(ds, *year)?;
        log::info!(
            "Edition {year}: {} records, {} columns after normalization",
            normalized.len(),
            normalized.column_names.len()
        );
        combined.extend(normalized.records);
    }
    Ok(SurveyDataset::from_records(combined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record(pairs: &[(&str, FieldValue)]) -> SurveyRecord {
        SurveyRecord {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    fn edition_2015() -> SurveyDataset {
        SurveyDataset::from_records(vec![record(&[
            ("Member", FieldValue::String("Yes".into())),
            ("AACECertified", FieldValue::String("No".into())),
            ("YearsOfExperience", FieldValue::Integer(9)),
            ("CurrentSalaryAmount", FieldValue::Float(85_000.0)),
            ("Sex", FieldValue::String("F".into())),
            ("UnrelatedColumn", FieldValue::String("dropped".into())),
        ])])
    }

    fn edition_2023() -> SurveyDataset {
        SurveyDataset::from_records(vec![record(&[
            ("Member", FieldValue::String("No".into())),
            ("AACECertified", FieldValue::Null),
            ("CertTypeCCP", FieldValue::String("CCP".into())),
            ("YearsOfExperience", FieldValue::Integer(15)),
            ("CurrentSalaryAmount", FieldValue::Float(130_000.0)),
            ("Sex", FieldValue::String("M".into())),
        ])])
    }

    #[test]
    fn rename_map_and_year_tag_are_applied() {
        let merged = merge_editions(&[(2015, edition_2015()), (2023, edition_2023())]).unwrap();
        assert_eq!(merged.len(), 2);

        let first = &merged.records[0];
        assert_eq!(first.numeric(columns::EXPERIENCE), Some(9.0));
        assert_eq!(
            first.get(columns::GENDER),
            Some(&FieldValue::String("F".into()))
        );
        assert_eq!(
            first.get(columns::SURVEY_YEAR),
            Some(&FieldValue::Integer(2015))
        );
        assert!(first.get("UnrelatedColumn").is_none());
        assert!(first.get("Sex").is_none());
    }

    #[test]
    fn certification_flag_covers_both_edition_shapes() {
        let merged = merge_editions(&[(2015, edition_2015()), (2023, edition_2023())]).unwrap();
        // 2015: AACECertified = "No"
        assert_eq!(
            merged.records[0].get(columns::IS_CERTIFIED),
            Some(&FieldValue::Bool(false))
        );
        // 2023: AACECertified null but a CertType column is populated
        assert_eq!(
            merged.records[1].get(columns::IS_CERTIFIED),
            Some(&FieldValue::Bool(true))
        );
    }

    #[test]
    fn missing_salary_column_is_an_error() {
        let ds = SurveyDataset::from_records(vec![SurveyRecord {
            fields: BTreeMap::from([(
                "YearsOfExperience".to_string(),
                FieldValue::Integer(3),
            )]),
        }]);
        let err = normalize_edition(&ds, 2015).unwrap_err();
        assert!(matches!(err, MergeError::MissingColumn { year: 2015, .. }));
    }
}
