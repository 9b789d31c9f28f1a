//! Repository for the `submissions` table.

use lightdesk_core::submission::YearMonth;
use lightdesk_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::submission::{CreateSubmission, SubmissionRow, UpdateSubmission};

/// Column list for `submissions` queries.
const COLUMNS: &str = "\
    id, user_id, org, role, name, phone, event_date, event_title, \
    venue, night_mount, mount_who, techs_count, extra_equipment, plugs, \
    power_type, power_count, power_where, dimmer_needed, dimmer_text, \
    sfx, sfx_other, operator, console_help, console_model, folder_path, \
    created_at, updated_at";

const INSERT: &str = "\
    INSERT INTO submissions \
        (user_id, org, role, name, phone, event_date, event_title, \
         venue, night_mount, mount_who, techs_count, extra_equipment, plugs, \
         power_type, power_count, power_where, dimmer_needed, dimmer_text, \
         sfx, sfx_other, operator, console_help, console_model, folder_path) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
            $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)";

/// Most rows returned by a month listing.
const MONTH_LIMIT: i64 = lightdesk_core::submission::MONTH_LIST_LIMIT;

fn bind_insert<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, SubmissionRow, sqlx::postgres::PgArguments>,
    input: &'q CreateSubmission,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, SubmissionRow, sqlx::postgres::PgArguments> {
    query
        .bind(input.user_id)
        .bind(&input.org)
        .bind(&input.role)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.event_date)
        .bind(&input.event_title)
        .bind(&input.venue)
        .bind(&input.night_mount)
        .bind(&input.mount_who)
        .bind(input.techs_count)
        .bind(&input.extra_equipment)
        .bind(&input.plugs)
        .bind(&input.power_type)
        .bind(input.power_count)
        .bind(Json(&input.power_where))
        .bind(&input.dimmer_needed)
        .bind(&input.dimmer_text)
        .bind(Json(&input.sfx))
        .bind(&input.sfx_other)
        .bind(&input.operator)
        .bind(&input.console_help)
        .bind(&input.console_model)
        .bind(&input.folder_path)
}

/// Provides CRUD operations for submissions.
pub struct SubmissionRepo;

impl SubmissionRepo {
    /// Insert a submission, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSubmission) -> Result<SubmissionRow, sqlx::Error> {
        let query = format!("{INSERT} RETURNING {COLUMNS}");
        bind_insert(sqlx::query_as::<_, SubmissionRow>(&query), input)
            .fetch_one(pool)
            .await
    }

    /// Insert a submission, point the owner's `user_last` row at it and
    /// delete the owner's draft, all in one transaction.
    pub async fn commit(pool: &PgPool, input: &CreateSubmission) -> Result<SubmissionRow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("{INSERT} RETURNING {COLUMNS}");
        let row = bind_insert(sqlx::query_as::<_, SubmissionRow>(&query), input)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO user_last (user_id, submission_id, folder_path) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 submission_id = EXCLUDED.submission_id, \
                 folder_path   = EXCLUDED.folder_path, \
                 updated_at    = NOW()",
        )
        .bind(row.user_id)
        .bind(row.id)
        .bind(&row.folder_path)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM drafts WHERE user_id = $1")
            .bind(row.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Find a submission by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SubmissionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM submissions WHERE id = $1");
        sqlx::query_as::<_, SubmissionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The user's most recent submission.
    pub async fn find_last_by_user(
        pool: &PgPool,
        user_id: i64,
    ) -> Result<Option<SubmissionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM submissions \
             WHERE user_id = $1 ORDER BY id DESC LIMIT 1"
        );
        sqlx::query_as::<_, SubmissionRow>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Submissions whose `DD.MM.YYYY` event date falls in the given month,
    /// ordered by date then id.
    pub async fn list_by_month(
        pool: &PgPool,
        month: YearMonth,
    ) -> Result<Vec<SubmissionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM submissions \
             WHERE substr(event_date, 4, 2) = $1 AND substr(event_date, 7, 4) = $2 \
             ORDER BY event_date ASC, id ASC \
             LIMIT $3"
        );
        sqlx::query_as::<_, SubmissionRow>(&query)
            .bind(month.month_key())
            .bind(month.year_key())
            .bind(MONTH_LIMIT)
            .fetch_all(pool)
            .await
    }

    /// Update a submission. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSubmission,
    ) -> Result<Option<SubmissionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE submissions SET
                org = COALESCE($2, org),
                role = COALESCE($3, role),
                name = COALESCE($4, name),
                phone = COALESCE($5, phone),
                event_date = COALESCE($6, event_date),
                event_title = COALESCE($7, event_title),
                venue = COALESCE($8, venue),
                night_mount = COALESCE($9, night_mount),
                mount_who = COALESCE($10, mount_who),
                techs_count = COALESCE($11, techs_count),
                extra_equipment = COALESCE($12, extra_equipment),
                plugs = COALESCE($13, plugs),
                power_type = COALESCE($14, power_type),
                power_count = COALESCE($15, power_count),
                power_where = COALESCE($16, power_where),
                dimmer_needed = COALESCE($17, dimmer_needed),
                dimmer_text = COALESCE($18, dimmer_text),
                sfx_other = COALESCE($19, sfx_other),
                operator = COALESCE($20, operator),
                console_help = COALESCE($21, console_help),
                console_model = COALESCE($22, console_model),
                folder_path = COALESCE($23, folder_path),
                sfx = COALESCE($24, sfx),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SubmissionRow>(&query)
            .bind(id)
            .bind(&input.org)
            .bind(&input.role)
            .bind(&input.name)
            .bind(&input.phone)
            .bind(&input.event_date)
            .bind(&input.event_title)
            .bind(&input.venue)
            .bind(&input.night_mount)
            .bind(&input.mount_who)
            .bind(input.techs_count)
            .bind(&input.extra_equipment)
            .bind(&input.plugs)
            .bind(&input.power_type)
            .bind(input.power_count)
            .bind(input.power_where.as_ref().map(Json))
            .bind(&input.dimmer_needed)
            .bind(&input.dimmer_text)
            .bind(&input.sfx_other)
            .bind(&input.operator)
            .bind(&input.console_help)
            .bind(&input.console_model)
            .bind(&input.folder_path)
            .bind(input.sfx.as_ref().map(Json))
            .fetch_optional(pool)
            .await
    }

    /// Delete a submission by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Total number of submissions.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM submissions")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
