use crate::config::WardenConfig;
use crate::create_app;
use crate::db::models::User;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::header::{CONTENT_TYPE, COOKIE, LOCATION};
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

/// Test fixture running the complete application against an in-memory database.
///
/// Every fixture owns its own database, so tests can seed data without stepping on each
/// other. Requests are sent straight to the router, no socket is opened.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///     let user = seed::user(&fixture.state.db, "jane@example.com", "secret-password").await;
///
///     let response = fixture
///         .get_with_cookie("/login", &fixture.session_cookie(&user))
///         .await;
///
///     response.assert_ok();
///     assert!(response.body.contains("Your login was successful."));
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// State shared with the router, use it to seed and inspect the database
    pub state: AppState,
    /// Configuration the state was built from
    pub config: WardenConfig,
}

impl TestFixture {
    /// Creates a fixture with the default test configuration.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Creates a fixture after letting `customize` adjust the test configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let fixture =
    ///     TestFixture::with_config(|config| config.reconsent_on_scope_change = true).await;
    /// ```
    pub async fn with_config(customize: impl FnOnce(&mut WardenConfig)) -> Self {
        let mut config = WardenConfig::for_test();
        customize(&mut config);

        let state = AppState::for_testing(&config).await;
        Self::from_state(state).await
    }

    /// Creates a fixture around a prepared state, e.g. one with fake SSO providers.
    pub async fn from_state(state: AppState) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let config = (*state.config).clone();
        let app = create_app(state.clone()).await;

        Self { app, state, config }
    }

    /// Initializes the test logger, repeated calls are ignored.
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Session cookie of `user` as sent by a browser, e.g. `access_token=<token>`.
    pub fn session_cookie(&self, user: &User) -> String {
        format!(
            "{}={}",
            self.config.cookie.name,
            seed::user_token(&self.state, user)
        )
    }

    /// `Authorization` header value carrying a session token of `user`.
    pub fn bearer(&self, user: &User) -> String {
        format!("Bearer {}", seed::user_token(&self.state, user))
    }

    /// Creates a request builder with the given headers.
    ///
    /// Use it with [`TestFixture::send`] when none of the shortcuts fit.
    pub fn request_builder(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        headers: &[(&str, &str)],
    ) -> http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri.as_ref());
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder
    }

    pub async fn get_with_headers(
        &self,
        uri: impl AsRef<str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri, headers)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    pub async fn get_with_cookie(&self, uri: impl AsRef<str>, cookie: &str) -> TestResponse {
        self.get_with_headers(uri, &[(COOKIE.as_str(), cookie)])
            .await
    }

    /// Sends a form as a browser would, `body` must already be url-encoded.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let response = fixture
    ///     .post_form("/login", "email=jane%40example.com&password=secret")
    ///     .await;
    /// ```
    pub async fn post_form(&self, uri: impl AsRef<str>, body: &str) -> TestResponse {
        self.post_form_with_headers(uri, body, &[]).await
    }

    pub async fn post_form_with_cookie(
        &self,
        uri: impl AsRef<str>,
        body: &str,
        cookie: &str,
    ) -> TestResponse {
        self.post_form_with_headers(uri, body, &[(COOKIE.as_str(), cookie)])
            .await
    }

    pub async fn post_form_with_headers(
        &self,
        uri: impl AsRef<str>,
        body: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let request = self
            .request_builder(Method::POST, uri, headers)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a POST request with a JSON body and custom headers.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let response = fixture
    ///     .post_json(
    ///         "/api/v1/clients",
    ///         &json!({ "name": "Reader" }),
    ///         &[("Authorization", &bearer), ("Organization", "acme")],
    ///     )
    ///     .await;
    /// response.assert_status(StatusCode::CREATED);
    /// ```
    pub async fn post_json<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(Method::POST, uri, headers)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json_body))
            .expect("Failed to build request");

        self.send(request).await
    }

    pub async fn delete_with_headers(
        &self,
        uri: impl AsRef<str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let request = self
            .request_builder(Method::DELETE, uri, headers)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and collects the complete response.
    ///
    /// The body is kept as text and, if it parses, as JSON.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !bytes.is_empty() {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };
        let body = String::from_utf8_lossy(&bytes).into_owned();

        TestResponse {
            status,
            headers,
            body,
            json,
        }
    }

    /// Polls `condition` until it holds, used to await background tasks.
    ///
    /// # Panics
    ///
    /// Panics if the condition doesn't hold within two seconds.
    pub async fn wait_until(&self, condition: impl Fn() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Condition not met within two seconds");
    }
}

/// Response of a test request.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as text
    pub body: String,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics with the response body if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {} but got {} with body: {}",
            expected, self.status, self.body
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Target of a redirect.
    ///
    /// # Panics
    ///
    /// Panics if the response has no `Location` header.
    pub fn location(&self) -> &str {
        self.headers
            .get(LOCATION)
            .expect("Response has no Location header")
            .to_str()
            .expect("Location header is not valid text")
    }

    /// Converts the JSON body to the specified type.
    ///
    /// # Panics
    ///
    /// Panics if deserialization fails.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}

/// Rows for tests, inserted directly into the database.
pub mod seed {
    use crate::auth::hash_password;
    use crate::db::models::{normalize_name, Client, GrantedScope, Member, Organization, User};
    use crate::db::{clients, grants, organizations, users, Database};
    use crate::state::AppState;
    use chrono::{DateTime, Utc};
    use url::Url;

    /// A local user, see [`user_with`]
    #[derive(Debug, Clone, Default)]
    pub struct NewUser<'a> {
        pub email: &'a str,
        pub password: &'a str,
        pub reset_password: bool,
        /// Defaults to English
        pub language: Option<&'a str>,
    }

    /// Creates an active local user with a password.
    pub async fn user(db: &Database, email: &str, password: &str) -> User {
        user_with(
            db,
            NewUser {
                email,
                password,
                ..Default::default()
            },
        )
        .await
    }

    pub async fn user_with(db: &Database, new_user: NewUser<'_>) -> User {
        let hash = hash_password(new_user.password).expect("Failed to hash password");
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (email, password_hash, reset_password, language) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(new_user.email)
        .bind(hash)
        .bind(new_user.reset_password)
        .bind(new_user.language.unwrap_or("en"))
        .fetch_one(db.pool())
        .await
        .expect("Failed to insert user");

        users::find_by_id(db.pool(), id)
            .await
            .expect("Failed to load user")
            .expect("User not found")
    }

    pub async fn organization(db: &Database, name: &str, expert: bool) -> Organization {
        let normalized = normalize_name(name);
        sqlx::query("INSERT INTO organization (name, name_normalized, expert) VALUES (?, ?, ?)")
            .bind(name)
            .bind(&normalized)
            .bind(expert)
            .execute(db.pool())
            .await
            .expect("Failed to insert organization");

        organizations::find_by_normalized_name(db.pool(), &normalized)
            .await
            .expect("Failed to load organization")
            .expect("Organization not found")
    }

    pub async fn member(
        db: &Database,
        organization_id: i64,
        user_id: i64,
        read_only: bool,
    ) -> Member {
        sqlx::query(
            "INSERT INTO organization_member (organization_id, user_id, read_only) VALUES (?, ?, ?)",
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(read_only)
        .execute(db.pool())
        .await
        .expect("Failed to insert member");

        organizations::find_member(db.pool(), organization_id, user_id)
            .await
            .expect("Failed to load member")
            .expect("Member not found")
    }

    /// Registers a client named after its capitalized id, with `<client_id>-secret` as secret.
    pub async fn client(
        db: &Database,
        organization_id: Option<i64>,
        client_id: &str,
        redirect_uri: &str,
        trusted: bool,
        scopes: &[(&str, &str)],
    ) -> Client {
        let mut chars = client_id.chars();
        let name = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        let secret = format!("{client_id}-secret");
        let redirect_uri = Url::parse(redirect_uri)
            .expect("Invalid redirect uri")
            .to_string();
        let scopes: Vec<GrantedScope> = scopes
            .iter()
            .map(|(key, value)| GrantedScope::new(*key, *value))
            .collect();

        let mut conn = db.pool().acquire().await.expect("Failed to acquire connection");
        clients::insert(
            &mut conn,
            &clients::NewClient {
                organization_id,
                name: &name,
                client_id,
                client_secret: &secret,
                redirect_uri: Some(&redirect_uri),
                trusted,
            },
            &scopes,
        )
        .await
        .expect("Failed to insert client");

        clients::find_by_client_id(&mut *conn, client_id)
            .await
            .expect("Failed to load client")
            .expect("Client not found")
    }

    /// Records the consent of a user together with the approved scopes.
    pub async fn grant(db: &Database, user_id: i64, client_id: i64, scopes: &[(&str, &str)]) {
        let scopes: Vec<GrantedScope> = scopes
            .iter()
            .map(|(key, value)| GrantedScope::new(*key, *value))
            .collect();

        let mut conn = db.pool().acquire().await.expect("Failed to acquire connection");
        let grant = grants::create_grant(&mut *conn, user_id, client_id)
            .await
            .expect("Failed to insert grant");
        grants::create_granted_scopes(&mut conn, grant, &scopes)
            .await
            .expect("Failed to insert granted scopes");
    }

    /// Sets the failed login counter of a user and the start of its window.
    pub async fn login_attempts(
        db: &Database,
        user_id: i64,
        attempts: i64,
        window_start: DateTime<Utc>,
    ) {
        sqlx::query("UPDATE users SET login_attempts = ?, last_login_attempt = ? WHERE id = ?")
            .bind(attempts)
            .bind(window_start)
            .bind(user_id)
            .execute(db.pool())
            .await
            .expect("Failed to update login attempts");
    }

    /// Session token of `user`, as issued on a password login.
    pub fn user_token(state: &AppState, user: &User) -> String {
        state
            .tokens
            .issue(user.id, &user.language, Vec::new(), false)
            .expect("Failed to issue token")
            .token
    }
}
