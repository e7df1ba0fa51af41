use crate::db::models::{Client, GrantedScope};
use crate::db::StoreError;
use sqlx::{SqliteConnection, SqliteExecutor};

const CLIENT_COLUMNS: &str =
    "id, organization_id, name, client_id, client_secret, redirect_uri, trusted";

/// Finds a client by its public id and exact (normalized) redirect URI
pub async fn find_by_client_id_and_redirect_uri<'e>(
    executor: impl SqliteExecutor<'e>,
    client_id: &str,
    redirect_uri: &str,
) -> Result<Option<Client>, StoreError> {
    let client = sqlx::query_as::<_, Client>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM client WHERE client_id = ? AND redirect_uri = ?"
    ))
    .bind(client_id)
    .bind(redirect_uri)
    .fetch_optional(executor)
    .await?;

    Ok(client)
}

pub async fn find_by_credentials<'e>(
    executor: impl SqliteExecutor<'e>,
    client_id: &str,
    client_secret: &str,
) -> Result<Option<Client>, StoreError> {
    let client = sqlx::query_as::<_, Client>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM client WHERE client_id = ? AND client_secret = ?"
    ))
    .bind(client_id)
    .bind(client_secret)
    .fetch_optional(executor)
    .await?;

    Ok(client)
}

pub async fn find_by_client_id<'e>(
    executor: impl SqliteExecutor<'e>,
    client_id: &str,
) -> Result<Option<Client>, StoreError> {
    let client = sqlx::query_as::<_, Client>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM client WHERE client_id = ?"
    ))
    .bind(client_id)
    .fetch_optional(executor)
    .await?;

    Ok(client)
}

pub async fn find_by_organization_and_name<'e>(
    executor: impl SqliteExecutor<'e>,
    organization_id: i64,
    name: &str,
) -> Result<Option<Client>, StoreError> {
    let client = sqlx::query_as::<_, Client>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM client WHERE organization_id = ? AND name = ?"
    ))
    .bind(organization_id)
    .bind(name)
    .fetch_optional(executor)
    .await?;

    Ok(client)
}

pub async fn list_for_organization<'e>(
    executor: impl SqliteExecutor<'e>,
    organization_id: i64,
) -> Result<Vec<Client>, StoreError> {
    let clients = sqlx::query_as::<_, Client>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM client WHERE organization_id = ? ORDER BY name"
    ))
    .bind(organization_id)
    .fetch_all(executor)
    .await?;

    Ok(clients)
}

/// A client about to be registered
#[derive(Debug, Clone)]
pub struct NewClient<'a> {
    pub organization_id: Option<i64>,
    pub name: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub redirect_uri: Option<&'a str>,
    pub trusted: bool,
}

/// Inserts a client together with its scopes, returns the row id
pub async fn insert(
    conn: &mut SqliteConnection,
    client: &NewClient<'_>,
    scopes: &[GrantedScope],
) -> Result<i64, StoreError> {
    let id = sqlx::query(
        r#"
        INSERT INTO client (organization_id, name, client_id, client_secret, redirect_uri, trusted)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(client.organization_id)
    .bind(client.name)
    .bind(client.client_id)
    .bind(client.client_secret)
    .bind(client.redirect_uri)
    .bind(client.trusted)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for scope in scopes {
        sqlx::query(
            r#"INSERT INTO scope (client_id, "key", value) VALUES (?, ?, ?) ON CONFLICT DO NOTHING"#,
        )
        .bind(id)
        .bind(&scope.key)
        .bind(&scope.value)
        .execute(&mut *conn)
        .await?;
    }

    Ok(id)
}

/// Scopes registered with a client, independent of any user grant
pub async fn registered_scopes<'e>(
    executor: impl SqliteExecutor<'e>,
    client_id: i64,
) -> Result<Vec<GrantedScope>, StoreError> {
    let scopes = sqlx::query_as::<_, GrantedScope>(
        r#"SELECT "key", value FROM scope WHERE client_id = ? ORDER BY id"#,
    )
    .bind(client_id)
    .fetch_all(executor)
    .await?;

    Ok(scopes)
}

/// Deletes a client of an organization with its scopes and grants.
///
/// Returns false if no such client exists.
pub async fn delete(
    conn: &mut SqliteConnection,
    organization_id: i64,
    id: i64,
) -> Result<bool, StoreError> {
    sqlx::query("DELETE FROM scope WHERE client_id = (SELECT id FROM client WHERE id = ? AND organization_id = ?)")
        .bind(id)
        .bind(organization_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM access_grant_scope WHERE access_grant_id IN (SELECT g.id FROM access_grant g JOIN client c ON c.id = g.client_id WHERE c.id = ? AND c.organization_id = ?)")
        .bind(id)
        .bind(organization_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM access_grant WHERE client_id = (SELECT id FROM client WHERE id = ? AND organization_id = ?)")
        .bind(id)
        .bind(organization_id)
        .execute(&mut *conn)
        .await?;

    let deleted = sqlx::query("DELETE FROM client WHERE id = ? AND organization_id = ?")
        .bind(id)
        .bind(organization_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(deleted > 0)
}
