/// Data layer: core types, loading, merging, currency conversion, filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SurveyDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  merge    │  normalize editions, tag SurveyYear, derive flags
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   fx      │  currency → SalaryUSD, coverage checks
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply value predicates → visible indices, cohorts
///   └──────────┘
/// ```

pub mod filter;
pub mod fx;
pub mod loader;
pub mod merge;
pub mod model;

/// Canonical column names used after edition normalization.
pub mod columns {
    pub const SURVEY_YEAR: &str = "SurveyYear";
    pub const EXPERIENCE: &str = "Experience";
    pub const EDUCATION: &str = "Education";
    pub const GENDER: &str = "Gender";
    pub const SALARY_AMOUNT: &str = "CurrentSalaryAmount";
    pub const CURRENCY: &str = "CurrentSalaryCurrency";
    pub const SALARY_USD: &str = "SalaryUSD";
    pub const IS_MEMBER: &str = "IsMember";
    pub const IS_CERTIFIED: &str = "IsCertified";
}
