use std::collections::{BTreeMap, BTreeSet};

use super::model::{FieldValue, SurveyDataset};

// ---------------------------------------------------------------------------
// Filter predicate: which unique values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// If a column is absent from the map it means "no filter" (show all).
pub type FilterState = BTreeMap<String, BTreeSet<FieldValue>>;

/// Initialise a [`FilterState`] with all values selected (i.e., show
/// everything). Only categorical columns get filter entries; wide numeric
/// columns (salary, age) are constrained by the panel's sanity bounds
/// instead.
pub fn init_filter_state(dataset: &SurveyDataset, max_cardinality: usize) -> FilterState {
    dataset
        .categorical_columns(max_cardinality)
        .into_iter()
        .filter_map(|col| {
            dataset
                .unique_values
                .get(&col)
                .map(|vals| (col, vals.clone()))
        })
        .collect()
}

/// Return indices of records that pass all active filters.
///
/// A record passes a column filter when:
/// * The column is not present in `filters` → passes (no constraint)
/// * The filter set for that column is empty → nothing selected → fails
/// * The record's value for that column is in the selected set → passes
pub fn filtered_indices(dataset: &SurveyDataset, filters: &FilterState) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            for (col, selected) in filters {
                if selected.is_empty() {
                    // Nothing selected for this column → hide everything
                    return false;
                }
                // Check all unique values are selected → no effective filter
                if let Some(all_vals) = dataset.unique_values.get(col) {
                    if selected.len() == all_vals.len() {
                        continue; // everything selected, no filtering needed
                    }
                }
                match rec.fields.get(col) {
                    Some(val) => {
                        if !selected.contains(val) {
                            return false;
                        }
                    }
                    None => {
                        // record doesn't have this column → include only if Null is selected
                        if !selected.contains(&FieldValue::Null) {
                            return false;
                        }
                    }
                }
            }
            true
        })
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Cohort split
// ---------------------------------------------------------------------------

/// A named subgroup of the visible records, analysed independently with its
/// own frozen baseline.
#[derive(Debug, Clone)]
pub struct Cohort {
    /// Display label, e.g. "Member = true".
    pub label: String,
    /// The grouping value this cohort corresponds to.
    pub value: FieldValue,
    /// Record indices belonging to the cohort.
    pub indices: Vec<usize>,
}

/// Split the visible records into cohorts by the values of `column`,
/// preserving the column's value order. With `column = None` the whole
/// visible set becomes a single cohort.
pub fn cohorts(
    dataset: &SurveyDataset,
    visible: &[usize],
    column: Option<&str>,
) -> Vec<Cohort> {
    let Some(col) = column else {
        return vec![Cohort {
            label: "All respondents".to_string(),
            value: FieldValue::Null,
            indices: visible.to_vec(),
        }];
    };

    let mut groups: BTreeMap<FieldValue, Vec<usize>> = BTreeMap::new();
    for &i in visible {
        let val = dataset.records[i]
            .fields
            .get(col)
            .cloned()
            .unwrap_or(FieldValue::Null);
        groups.entry(val).or_default().push(i);
    }

    groups
        .into_iter()
        .map(|(value, indices)| Cohort {
            label: format!("{col} = {value}"),
            value,
            indices,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SurveyRecord;

    fn dataset() -> SurveyDataset {
        let records = [
            ("Yes", 80_000.0),
            ("No", 70_000.0),
            ("Yes", 95_000.0),
            ("No", 65_000.0),
        ]
        .iter()
        .map(|(member, salary)| {
            let mut rec = SurveyRecord::default();
            rec.fields.insert(
                "Member".to_string(),
                FieldValue::String(member.to_string()),
            );
            rec.fields
                .insert("SalaryUSD".to_string(), FieldValue::Float(*salary));
            rec
        })
        .collect();
        SurveyDataset::from_records(records)
    }

    #[test]
    fn deselecting_a_value_hides_its_rows() {
        let ds = dataset();
        let mut filters = init_filter_state(&ds, 32);
        filters
            .get_mut("Member")
            .unwrap()
            .remove(&FieldValue::String("No".into()));

        let visible = filtered_indices(&ds, &filters);
        assert_eq!(visible, vec![0, 2]);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let ds = dataset();
        let mut filters = init_filter_state(&ds, 32);
        filters.insert("Member".to_string(), BTreeSet::new());
        assert!(filtered_indices(&ds, &filters).is_empty());
    }

    #[test]
    fn cohort_split_preserves_value_grouping() {
        let ds = dataset();
        let visible: Vec<usize> = (0..ds.len()).collect();
        let groups = cohorts(&ds, &visible, Some("Member"));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].value, FieldValue::String("No".into()));
        assert_eq!(groups[0].indices, vec![1, 3]);
        assert_eq!(groups[1].indices, vec![0, 2]);

        let all = cohorts(&ds, &visible, None);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].indices.len(), 4);
    }
}
