use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dto::application_dto::{ApplicationForm, NewApplication, ResumeFile};
use crate::error::{Error, Result};
use crate::models::{Application, ApplicationStatus};
use crate::services::notice_service::NoticeService;
use crate::services::remote::StorageService;
use crate::services::session_service::SessionHolder;
use crate::store::job_store::JobStore;
use crate::utils::token::object_key_for;
use crate::utils::validation::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("The application form has errors")]
    Invalid(FieldErrors),

    #[error("Failed to upload resume: {0}")]
    Upload(#[source] Error),

    #[error("The application could not be submitted")]
    NotSubmitted,
}

/// Validates an application form, stores the resume and hands the result to the [`JobStore`].
#[derive(Clone)]
pub struct ApplicationSubmitter {
    storage: Arc<dyn StorageService>,
    store: JobStore,
    session: SessionHolder,
    notices: NoticeService,
    bucket: String,
}

impl ApplicationSubmitter {
    pub fn new(
        storage: Arc<dyn StorageService>,
        store: JobStore,
        session: SessionHolder,
        notices: NoticeService,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            store,
            session,
            notices,
            bucket: bucket.into(),
        }
    }

    pub async fn submit(
        &self,
        job_id: Uuid,
        form: ApplicationForm,
    ) -> std::result::Result<Application, SubmissionError> {
        if let Err(errors) = form.check() {
            warn!(%job_id, fields = ?errors.keys().collect::<Vec<_>>(), "Application form rejected");
            self.notices.error("Please correct the errors in the form");
            return Err(SubmissionError::Invalid(errors));
        }

        let resume = match &form.resume_file {
            Some(file) => self.upload_resume(file).await.map_err(|e| {
                error!(%job_id, error = %e, "Resume upload failed");
                self.notices.error("Failed to upload resume. Please try again.");
                SubmissionError::Upload(e)
            })?,
            None => form
                .resume_reference
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        };

        let application = NewApplication {
            job_id,
            full_name: form.full_name.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone.trim().to_string(),
            resume,
            cover_letter: form.cover_letter(),
            status: ApplicationStatus::Pending,
            user_id: self.session.current_user().map(|u| u.id),
        };

        self.store
            .add_application(application)
            .await
            .ok_or(SubmissionError::NotSubmitted)
    }

    /// Uploads `file` under a random key and returns its public URL.
    pub async fn upload_resume(&self, file: &ResumeFile) -> Result<String> {
        self.ensure_bucket().await?;

        let key = object_key_for(&file.file_name);
        self.storage
            .upload(&self.bucket, &key, file.bytes.clone(), file.content_type.clone())
            .await?;
        info!(bucket = %self.bucket, %key, size = file.bytes.len(), "Resume uploaded");

        Ok(self.storage.public_url(&self.bucket, &key))
    }

    async fn ensure_bucket(&self) -> Result<()> {
        if self.storage.bucket_exists(&self.bucket).await? {
            return Ok(());
        }
        info!(bucket = %self.bucket, "Creating resume bucket");
        match self.storage.create_bucket(&self.bucket, false).await {
            Ok(()) => Ok(()),
            // Lost a race with another creator.
            Err(Error::Remote { status: 409, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::remote::{MockAuthService, MockDataService, MockStorageService};
    use crate::services::session_service::RoleRequirement;
    use crate::store::filter::KeywordMode;
    use bytes::Bytes;

    fn form_with_file(file_name: &str, size: usize) -> ApplicationForm {
        ApplicationForm {
            full_name: "John Doe".into(),
            email: "john.doe@example.com".into(),
            phone: "555-123-4567".into(),
            resume_file: Some(ResumeFile {
                file_name: file_name.into(),
                content_type: Some("application/pdf".into()),
                bytes: Bytes::from(vec![0u8; size]),
            }),
            resume_reference: None,
            cover_letter: Some("  ".into()),
        }
    }

    fn submitter(storage: MockStorageService, data: MockDataService) -> (ApplicationSubmitter, NoticeService) {
        let notices = NoticeService::new();
        let data = Arc::new(data);
        let store = JobStore::new(data.clone(), notices.clone(), KeywordMode::Combined);
        let session = SessionHolder::new(
            Arc::new(MockAuthService::new()),
            data,
            notices.clone(),
            RoleRequirement::AnyRole,
        );
        let submitter = ApplicationSubmitter::new(Arc::new(storage), store, session, notices.clone(), "resumes");
        (submitter, notices)
    }

    #[tokio::test]
    async fn invalid_form_makes_no_calls() {
        let mut storage = MockStorageService::new();
        storage.expect_bucket_exists().times(0);
        storage.expect_upload().times(0);
        let mut data = MockDataService::new();
        data.expect_insert_application().times(0);
        let (submitter, notices) = submitter(storage, data);

        let mut form = form_with_file("resume.exe", 10);
        form.email = "not-an-email".into();
        let err = submitter.submit(Uuid::new_v4(), form).await.unwrap_err();

        let SubmissionError::Invalid(errors) = err else {
            panic!("expected field errors");
        };
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("resume"));
        assert_eq!(notices.len(), 1);
    }

    #[tokio::test]
    async fn missing_bucket_is_created_private() {
        let mut storage = MockStorageService::new();
        storage.expect_bucket_exists().times(1).returning(|_| Ok(false));
        storage
            .expect_create_bucket()
            .withf(|bucket, public| bucket == "resumes" && !*public)
            .times(1)
            .returning(|_, _| Ok(()));
        storage
            .expect_upload()
            .withf(|bucket, path, _, _| bucket == "resumes" && path.ends_with(".pdf"))
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        storage
            .expect_public_url()
            .returning(|bucket, path| format!("https://files.example.com/{}/{}", bucket, path));
        let (submitter, _) = submitter(storage, MockDataService::new());

        let file = form_with_file("cv.PDF", 1024).resume_file.unwrap();
        let url = submitter.upload_resume(&file).await.unwrap();
        assert!(url.starts_with("https://files.example.com/resumes/"));
        assert!(url.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn existing_bucket_is_reused() {
        let mut storage = MockStorageService::new();
        storage.expect_bucket_exists().returning(|_| Ok(true));
        storage.expect_create_bucket().times(0);
        storage.expect_upload().returning(|_, _, _, _| Ok(()));
        storage
            .expect_public_url()
            .returning(|_, path| format!("https://files.example.com/{}", path));
        let (submitter, _) = submitter(storage, MockDataService::new());

        let file = form_with_file("cv.docx", 10).resume_file.unwrap();
        assert!(submitter.upload_resume(&file).await.is_ok());
    }

    #[tokio::test]
    async fn upload_failure_stops_submission() {
        let mut storage = MockStorageService::new();
        storage.expect_bucket_exists().returning(|_| Ok(true));
        storage.expect_upload().returning(|_, _, _, _| {
            Err(Error::Remote {
                status: 413,
                message: "Payload too large".into(),
            })
        });
        let mut data = MockDataService::new();
        data.expect_insert_application().times(0);
        let (submitter, notices) = submitter(storage, data);

        let err = submitter
            .submit(Uuid::new_v4(), form_with_file("cv.pdf", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Upload(_)));
        assert_eq!(notices.drain()[0].message, "Failed to upload resume. Please try again.");
    }
}
