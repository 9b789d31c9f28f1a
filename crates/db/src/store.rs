//! PostgreSQL implementation of the [`Store`] port.

use async_trait::async_trait;
use lightdesk_core::dialogue::Draft;
use lightdesk_core::error::CoreError;
use lightdesk_core::ports::{PortError, Store};
use lightdesk_core::submission::{
    LastPointer, NewSubmission, NewUploadRecord, Submission, SubmissionPatch, UploadRecord,
    YearMonth,
};
use lightdesk_core::types::{DbId, UserId};

use crate::models::submission::{CreateSubmission, SubmissionRow, UpdateSubmission};
use crate::repositories::{DraftRepo, SubmissionRepo, UploadRecordRepo, UserLastRepo};
use crate::DbPool;

fn storage(err: sqlx::Error) -> PortError {
    PortError::Storage(err.to_string())
}

fn to_domain(row: SubmissionRow) -> Result<Submission, PortError> {
    Submission::try_from(row).map_err(PortError::from)
}

/// [`Store`] backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn save_draft(&self, user_id: UserId, draft: &Draft) -> Result<(), PortError> {
        let payload = draft.to_json()?;
        DraftRepo::upsert(&self.pool, user_id, draft.state.as_str(), &payload)
            .await
            .map_err(storage)
    }

    async fn load_draft(&self, user_id: UserId) -> Result<Option<Draft>, PortError> {
        let Some(row) = DraftRepo::find(&self.pool, user_id).await.map_err(storage)? else {
            return Ok(None);
        };
        Ok(Some(Draft::from_json(row.payload)?))
    }

    async fn delete_draft(&self, user_id: UserId) -> Result<(), PortError> {
        DraftRepo::delete(&self.pool, user_id).await.map_err(storage)?;
        Ok(())
    }

    async fn insert_submission(&self, input: &NewSubmission) -> Result<Submission, PortError> {
        let row = SubmissionRepo::create(&self.pool, &CreateSubmission::from(input))
            .await
            .map_err(storage)?;
        to_domain(row)
    }

    async fn commit_submission(&self, input: &NewSubmission) -> Result<Submission, PortError> {
        let row = SubmissionRepo::commit(&self.pool, &CreateSubmission::from(input))
            .await
            .map_err(storage)?;
        tracing::info!(submission_id = row.id, user_id = row.user_id, "Submission committed");
        to_domain(row)
    }

    async fn patch_submission(
        &self,
        id: DbId,
        patch: &SubmissionPatch,
    ) -> Result<Submission, PortError> {
        let row = SubmissionRepo::update(&self.pool, id, &UpdateSubmission::from(patch))
            .await
            .map_err(storage)?
            .ok_or(CoreError::NotFound {
                entity: "submission",
                id,
            })?;
        to_domain(row)
    }

    async fn get_submission(&self, id: DbId) -> Result<Option<Submission>, PortError> {
        SubmissionRepo::find_by_id(&self.pool, id)
            .await
            .map_err(storage)?
            .map(to_domain)
            .transpose()
    }

    async fn get_last_submission_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Submission>, PortError> {
        SubmissionRepo::find_last_by_user(&self.pool, user_id)
            .await
            .map_err(storage)?
            .map(to_domain)
            .transpose()
    }

    async fn list_submissions_by_month(
        &self,
        month: YearMonth,
    ) -> Result<Vec<Submission>, PortError> {
        SubmissionRepo::list_by_month(&self.pool, month)
            .await
            .map_err(storage)?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn delete_submission(&self, id: DbId) -> Result<bool, PortError> {
        SubmissionRepo::delete(&self.pool, id).await.map_err(storage)
    }

    async fn count_submissions(&self) -> Result<i64, PortError> {
        SubmissionRepo::count(&self.pool).await.map_err(storage)
    }

    async fn upsert_last_pointer(
        &self,
        user_id: UserId,
        submission_id: Option<DbId>,
        folder_path: &str,
    ) -> Result<(), PortError> {
        UserLastRepo::upsert(&self.pool, user_id, submission_id, folder_path)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn get_last_pointer(&self, user_id: UserId) -> Result<Option<LastPointer>, PortError> {
        Ok(UserLastRepo::find(&self.pool, user_id)
            .await
            .map_err(storage)?
            .map(LastPointer::from))
    }

    async fn save_upload_record(&self, input: &NewUploadRecord) -> Result<UploadRecord, PortError> {
        UploadRecordRepo::create(&self.pool, input)
            .await
            .map(UploadRecord::from)
            .map_err(storage)
    }

    async fn list_upload_records(&self, user_id: UserId) -> Result<Vec<UploadRecord>, PortError> {
        Ok(UploadRecordRepo::list_by_user(&self.pool, user_id)
            .await
            .map_err(storage)?
            .into_iter()
            .map(UploadRecord::from)
            .collect())
    }

    async fn get_upload_record(&self, id: DbId) -> Result<Option<UploadRecord>, PortError> {
        Ok(UploadRecordRepo::find_by_id(&self.pool, id)
            .await
            .map_err(storage)?
            .map(UploadRecord::from))
    }
}
