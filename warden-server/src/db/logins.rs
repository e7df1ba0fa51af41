use crate::db::StoreError;
use sqlx::SqliteExecutor;

/// Appends a row to the login audit log
pub async fn record<'e>(executor: impl SqliteExecutor<'e>, user_id: i64) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO login (user_id) VALUES (?)")
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(())
}

#[cfg(test)]
pub async fn count_for_user<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
) -> Result<i64, StoreError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM login WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(executor)
        .await?;

    Ok(count)
}
