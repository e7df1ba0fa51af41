//! Consent records and the scopes users approved for clients.

use crate::db::models::GrantedScope;
use crate::db::StoreError;
use sqlx::{SqliteConnection, SqliteExecutor};

/// Returns the id of the grant a user gave a client, if any
pub async fn find_grant<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
    client_id: i64,
) -> Result<Option<i64>, StoreError> {
    let grant: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM access_grant WHERE user_id = ? AND client_id = ?")
            .bind(user_id)
            .bind(client_id)
            .fetch_optional(executor)
            .await?;

    Ok(grant.map(|(id,)| id))
}

pub async fn has_grant<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
    client_id: i64,
) -> Result<bool, StoreError> {
    Ok(find_grant(executor, user_id, client_id).await?.is_some())
}

/// Records the consent of a user and returns the grant id.
///
/// A concurrent insert for the same user and client is absorbed by the unique constraint and
/// yields the existing grant.
pub async fn create_grant<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
    client_id: i64,
) -> Result<i64, StoreError> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO access_grant (user_id, client_id) VALUES (?, ?)
        ON CONFLICT (user_id, client_id) DO UPDATE SET user_id = excluded.user_id
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(client_id)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

pub async fn create_granted_scopes(
    conn: &mut SqliteConnection,
    grant_id: i64,
    scopes: &[GrantedScope],
) -> Result<(), StoreError> {
    for scope in scopes {
        sqlx::query(
            r#"INSERT INTO access_grant_scope (access_grant_id, "key", value) VALUES (?, ?, ?) ON CONFLICT DO NOTHING"#,
        )
        .bind(grant_id)
        .bind(&scope.key)
        .bind(&scope.value)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Replaces the scopes of a single grant
pub async fn replace_granted_scopes(
    conn: &mut SqliteConnection,
    grant_id: i64,
    scopes: &[GrantedScope],
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM access_grant_scope WHERE access_grant_id = ?")
        .bind(grant_id)
        .execute(&mut *conn)
        .await?;

    create_granted_scopes(conn, grant_id, scopes).await
}

/// Scopes a user approved for a client, empty without a grant
pub async fn granted_scopes<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
    client_id: i64,
) -> Result<Vec<GrantedScope>, StoreError> {
    let scopes = sqlx::query_as::<_, GrantedScope>(
        r#"
        SELECT s."key", s.value
        FROM access_grant_scope s
        JOIN access_grant g ON g.id = s.access_grant_id
        WHERE g.user_id = ? AND g.client_id = ?
        ORDER BY s.id
        "#,
    )
    .bind(user_id)
    .bind(client_id)
    .fetch_all(executor)
    .await?;

    Ok(scopes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::test_utils::seed;

    const REDIRECT_URI: &str = "https://app.example.com/callback";

    fn entries(scopes: &[GrantedScope]) -> Vec<String> {
        scopes.iter().map(GrantedScope::token_entry).collect()
    }

    #[tokio::test]
    async fn test_grant_is_unique_per_user_and_client() {
        let db = Database::in_memory().await.unwrap();
        let user = seed::user(&db, "jane@example.com", "secret-password").await;
        let client = seed::client(&db, None, "reader", REDIRECT_URI, false, &[]).await;

        assert!(!has_grant(db.pool(), user.id, client.id).await.unwrap());
        let first = create_grant(db.pool(), user.id, client.id).await.unwrap();
        let second = create_grant(db.pool(), user.id, client.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            find_grant(db.pool(), user.id, client.id).await.unwrap(),
            Some(first)
        );

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM access_grant")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_replace_granted_scopes() {
        let db = Database::in_memory().await.unwrap();
        let user = seed::user(&db, "jane@example.com", "secret-password").await;
        let client = seed::client(&db, None, "reader", REDIRECT_URI, false, &[]).await;
        let grant = create_grant(db.pool(), user.id, client.id).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        create_granted_scopes(&mut tx, grant, &[GrantedScope::new("articles", "")])
            .await
            .unwrap();
        replace_granted_scopes(
            &mut tx,
            grant,
            &[GrantedScope::new("lists", ""), GrantedScope::new("pinned", "5")],
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let scopes = granted_scopes(db.pool(), user.id, client.id).await.unwrap();
        assert_eq!(entries(&scopes), vec!["lists", "pinned:5"]);
    }

    #[tokio::test]
    async fn test_granted_scopes_belong_to_one_user() {
        let db = Database::in_memory().await.unwrap();
        let alice = seed::user(&db, "alice@example.com", "secret-password").await;
        let bob = seed::user(&db, "bob@example.com", "secret-password").await;
        let client =
            seed::client(&db, None, "reader", REDIRECT_URI, false, &[("organization", "r")]).await;

        let mut tx = db.pool().begin().await.unwrap();
        let alice_grant = create_grant(&mut *tx, alice.id, client.id).await.unwrap();
        create_granted_scopes(&mut tx, alice_grant, &[GrantedScope::new("articles", "")])
            .await
            .unwrap();
        let bob_grant = create_grant(&mut *tx, bob.id, client.id).await.unwrap();
        create_granted_scopes(
            &mut tx,
            bob_grant,
            &[GrantedScope::new("lists", ""), GrantedScope::new("tags", "")],
        )
        .await
        .unwrap();
        replace_granted_scopes(&mut tx, bob_grant, &[GrantedScope::new("lists", "")])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let pool = db.pool();
        assert_eq!(
            entries(&granted_scopes(pool, alice.id, client.id).await.unwrap()),
            vec!["articles"]
        );
        assert_eq!(
            entries(&granted_scopes(pool, bob.id, client.id).await.unwrap()),
            vec!["lists"]
        );
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_no_rows() {
        let db = Database::in_memory().await.unwrap();
        let user = seed::user(&db, "jane@example.com", "secret-password").await;
        let client = seed::client(&db, None, "reader", REDIRECT_URI, false, &[]).await;

        {
            let mut tx = db.pool().begin().await.unwrap();
            let grant = create_grant(&mut *tx, user.id, client.id).await.unwrap();
            create_granted_scopes(&mut tx, grant, &[GrantedScope::new("articles", "")])
                .await
                .unwrap();
        }

        assert!(!has_grant(db.pool(), user.id, client.id).await.unwrap());
        assert!(granted_scopes(db.pool(), user.id, client.id)
            .await
            .unwrap()
            .is_empty());
    }
}
