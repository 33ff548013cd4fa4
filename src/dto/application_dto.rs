use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::application::{Application, ApplicationStatus};
use crate::utils::validation::{error_with_message, field_messages, FieldErrors, EMAIL_SHAPE};

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
pub const RESUME_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

/// An application before the service assigns `id` and `submitted_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub resume: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

/// The admin-mutable columns of an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationUpdate {
    pub status: ApplicationStatus,
    pub notes: Option<String>,
}

impl From<&Application> for ApplicationUpdate {
    fn from(app: &Application) -> Self {
        Self {
            status: app.status,
            notes: app.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationReviewPayload {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ResumeFile {
    fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// Applicant-entered data for one job application.
#[derive(Debug, Clone, Default, Validate)]
pub struct ApplicationForm {
    #[validate(custom(function = "full_name_present"))]
    pub full_name: String,
    #[validate(
        custom(function = "email_present"),
        regex(path = *EMAIL_SHAPE, code = "email", message = "Please enter a valid email address")
    )]
    pub email: String,
    #[validate(custom(function = "phone_present"))]
    pub phone: String,
    pub resume_file: Option<ResumeFile>,
    pub resume_reference: Option<String>,
    pub cover_letter: Option<String>,
}

fn full_name_present(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error_with_message("required", "Full name is required"));
    }
    Ok(())
}

fn email_present(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error_with_message("required", "Email is required"));
    }
    Ok(())
}

fn phone_present(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error_with_message("required", "Phone number is required"));
    }
    Ok(())
}

impl ApplicationForm {
    /// Runs every field check and returns all failures at once.
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => field_messages(&e),
        };

        match &self.resume_file {
            Some(file) => {
                if file.bytes.len() > MAX_RESUME_BYTES {
                    errors.insert("resume".into(), "Maximum file size: 5MB".into());
                } else if !file
                    .extension()
                    .is_some_and(|ext| RESUME_EXTENSIONS.contains(&ext.as_str()))
                {
                    errors.insert("resume".into(), "Resume must be a PDF, DOC or DOCX file".into());
                }
            }
            None => {
                let has_reference = self
                    .resume_reference
                    .as_deref()
                    .is_some_and(|r| !r.trim().is_empty());
                if !has_reference {
                    errors.insert("resume".into(), "Resume is required".into());
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn cover_letter(&self) -> Option<String> {
        self.cover_letter
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSubmitted {
    pub application: Application,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormRejected {
    pub errors: FieldErrors,
}
