use crate::db::models::{Member, Organization};
use crate::db::StoreError;
use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;

pub async fn find_by_normalized_name<'e>(
    executor: impl SqliteExecutor<'e>,
    name_normalized: &str,
) -> Result<Option<Organization>, StoreError> {
    let organization = sqlx::query_as::<_, Organization>(
        "SELECT id, name, name_normalized, expert FROM organization WHERE name_normalized = ?",
    )
    .bind(name_normalized)
    .fetch_optional(executor)
    .await?;

    Ok(organization)
}

pub async fn find_member<'e>(
    executor: impl SqliteExecutor<'e>,
    organization_id: i64,
    user_id: i64,
) -> Result<Option<Member>, StoreError> {
    let member = sqlx::query_as::<_, Member>(
        r#"
        SELECT id, organization_id, user_id, read_only, last_seen
        FROM organization_member
        WHERE organization_id = ? AND user_id = ?
        "#,
    )
    .bind(organization_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(member)
}

pub async fn touch_member_seen<'e>(
    executor: impl SqliteExecutor<'e>,
    member_id: i64,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    sqlx::query("UPDATE organization_member SET last_seen = ? WHERE id = ?")
        .bind(now)
        .bind(member_id)
        .execute(executor)
        .await?;

    Ok(())
}
