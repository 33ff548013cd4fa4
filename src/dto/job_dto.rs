use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::application::ApplicationStatus;
use crate::models::job::{EmploymentType, Job};
use crate::store::filter::JobFilters;
use crate::utils::validation::non_blank;

/// A job as submitted by an admin, before the service assigns `id` and `posted_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewJob {
    #[validate(custom(function = "non_blank"))]
    pub title: String,
    #[validate(custom(function = "non_blank"))]
    pub company: String,
    #[validate(custom(function = "non_blank"))]
    pub location: String,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub salary: String,
    #[validate(custom(function = "non_blank"))]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub deadline: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

/// Full replacement body for an existing job; `id` travels in the query string.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord<'a> {
    pub title: &'a str,
    pub company: &'a str,
    pub location: &'a str,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    pub salary: &'a str,
    pub description: &'a str,
    pub requirements: &'a [String],
    pub responsibilities: &'a [String],
    pub benefits: &'a [String],
    pub posted_date: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub logo: Option<&'a str>,
    pub featured: Option<bool>,
}

impl<'a> From<&'a Job> for JobRecord<'a> {
    fn from(job: &'a Job) -> Self {
        Self {
            title: &job.title,
            company: &job.company,
            location: &job.location,
            employment_type: job.employment_type,
            salary: &job.salary,
            description: &job.description,
            requirements: &job.requirements,
            responsibilities: &job.responsibilities,
            benefits: &job.benefits,
            posted_date: job.posted_date,
            deadline: job.deadline,
            logo: job.logo.as_deref(),
            featured: job.featured,
        }
    }
}

/// Partial filter update. Every provided field replaces the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPatch {
    #[serde(rename = "type")]
    pub employment_type: Option<Vec<EmploymentType>>,
    pub location: Option<Vec<String>>,
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListResponse {
    pub items: Vec<Job>,
    pub total: usize,
    pub filters: JobFilters,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_jobs: usize,
    pub featured_jobs: usize,
    pub total_applications: usize,
    pub applications_by_status: BTreeMap<ApplicationStatus, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptionsResponse {
    pub types: Vec<EmploymentType>,
    pub locations: Vec<String>,
}
