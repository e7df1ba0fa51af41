use crate::api::{clients, health, organization, token, user};
use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const TOKEN_TAG: &str = "Token API";
pub(crate) const ORGANIZATION_TAG: &str = "Organization API";
pub(crate) const CLIENTS_TAG: &str = "Clients API";
pub(crate) const USER_TAG: &str = "User API";

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::ready_check,
        token::issue_token_handler,
        token::token_info_handler,
        organization::organization_handler,
        clients::list_clients_handler,
        clients::create_client_handler,
        clients::delete_client_handler,
        user::get_user_handler,
        user::update_password_handler,
        user::update_profile_handler,
    ),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = TOKEN_TAG, description = "Client credentials exchange and token introspection"),
        (name = ORGANIZATION_TAG, description = "Organization of the caller"),
        (name = CLIENTS_TAG, description = "API clients of an expert organization"),
        (name = USER_TAG, description = "Account of the signed in user"),
    ),
    info(
        title = "Warden API",
        description = "Authorization and scope enforcement service",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;

#[cfg(test)]
mod tests {
    use crate::test_utils::TestFixture;

    #[tokio::test]
    async fn test_openapi_document_lists_api_routes() {
        let fixture = TestFixture::new().await;
        let response = fixture.get_with_headers("/openapi.json", &[]).await;

        response.assert_ok();
        let paths = response.json["paths"].as_object().unwrap();
        for path in [
            "/health",
            "/ready",
            "/api/v1/auth/token",
            "/api/v1/organization",
            "/api/v1/clients",
            "/api/v1/clients/{id}",
            "/api/v1/auth/user",
            "/api/v1/auth/user/password",
            "/api/v1/auth/user/data",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert_eq!(response.json["info"]["title"], "Warden API");
    }
}
