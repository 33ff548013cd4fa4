use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dto::job_dto::FilterPatch;
use crate::models::job::{EmploymentType, Job};

/// Active, client-only filter criteria.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFilters {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<Vec<EmploymentType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

impl JobFilters {
    /// Each field present in `patch` replaces the current one.
    pub fn merged(&self, patch: FilterPatch) -> JobFilters {
        JobFilters {
            employment_type: patch.employment_type.or_else(|| self.employment_type.clone()),
            location: patch.location.or_else(|| self.location.clone()),
            keyword: patch.keyword.or_else(|| self.keyword.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.types().is_none() && self.locations().is_none() && self.normalized_keyword().is_none()
    }

    fn types(&self) -> Option<&[EmploymentType]> {
        self.employment_type.as_deref().filter(|t| !t.is_empty())
    }

    fn locations(&self) -> Option<&[String]> {
        self.location.as_deref().filter(|l| !l.is_empty())
    }

    fn normalized_keyword(&self) -> Option<String> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase)
    }
}

/// How the keyword predicate combines with the type and location predicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMode {
    /// Type, location and keyword must all match.
    #[default]
    Combined,
    /// A set keyword decides on its own, ignoring type and location.
    ShortCircuit,
}

impl FromStr for KeywordMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "combined" | "and" => Ok(KeywordMode::Combined),
            "short_circuit" | "legacy" => Ok(KeywordMode::ShortCircuit),
            other => Err(format!(
                "expected `combined` or `short_circuit`, got `{}`",
                other
            )),
        }
    }
}

impl fmt::Display for KeywordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordMode::Combined => f.write_str("combined"),
            KeywordMode::ShortCircuit => f.write_str("short_circuit"),
        }
    }
}

fn keyword_matches(job: &Job, keyword: &str) -> bool {
    job.title.to_lowercase().contains(keyword)
        || job.company.to_lowercase().contains(keyword)
        || job.description.to_lowercase().contains(keyword)
}

pub fn matches(job: &Job, filters: &JobFilters, mode: KeywordMode) -> bool {
    let keyword = filters.normalized_keyword();

    if mode == KeywordMode::ShortCircuit {
        if let Some(keyword) = &keyword {
            return keyword_matches(job, keyword);
        }
    }

    if let Some(types) = filters.types() {
        if !types.contains(&job.employment_type) {
            return false;
        }
    }

    if let Some(locations) = filters.locations() {
        if !locations.iter().any(|loc| job.location.contains(loc.as_str())) {
            return false;
        }
    }

    match keyword {
        Some(keyword) => keyword_matches(job, &keyword),
        None => true,
    }
}

/// The visible subset of `jobs` under `filters`, in the original order.
pub fn apply_filters(jobs: &[Job], filters: &JobFilters, mode: KeywordMode) -> Vec<Job> {
    jobs.iter()
        .filter(|job| matches(job, filters, mode))
        .cloned()
        .collect()
}
