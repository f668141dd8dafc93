use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::models::{AuthError, LoginRequest, RegisterRequest};
use auth_cell::services::{password, AuthService};
use identity_cell::models::ContactDetails;
use identity_cell::IdentityError;
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

fn config_for(mock_server: &MockServer) -> AppConfig {
    TestConfig::with_store_url(&mock_server.uri()).to_app_config()
}

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: Some(email.to_string()),
        password: Some("Str0ng-passphrase".to_string()),
        full_name: Some("New User".to_string()),
        ..Default::default()
    }
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: Some(email.to_string()),
        password: Some(password.to_string()),
    }
}

/// Identity row carrying a real argon2 hash for `password`.
fn row_with_password(id: Uuid, email: &str, role: Role, password: &str) -> serde_json::Value {
    let mut row = MockStoreResponses::identity_row(id, Some(email), None, role);
    row["password_hash"] = json!(password::hash_password(password).unwrap());
    row
}

#[tokio::test]
async fn register_creates_identity_and_signs_token() {
    let mock_server = MockServer::start().await;
    let identity_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/identities"))
        .and(query_param("email", "eq.new@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/identities"))
        .and(body_partial_json(json!({
            "email": "new@example.com",
            "full_name": "New User",
            "role": "patient"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::patient_row(identity_id, "new@example.com")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server);
    let service = AuthService::new(&config);
    let session = service
        .register(register_request("new@example.com"))
        .await
        .expect("registration should succeed");

    assert_eq!(session.user.id, identity_id);
    assert_eq!(session.user.role, Role::Patient);

    let token_user = validate_token(&session.token, &config.jwt_secret)
        .expect("freshly signed token should validate");
    assert_eq!(token_user.id, identity_id);
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/identities"))
        .and(query_param("email", "eq.taken@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::patient_row(Uuid::new_v4(), "taken@example.com")
        ])))
        .mount(&mock_server)
        .await;

    let service = AuthService::new(&config_for(&mock_server));
    let result = service.register(register_request("taken@example.com")).await;

    assert_matches!(result, Err(AuthError::EmailExists));
}

#[tokio::test]
async fn register_requires_all_fields() {
    let mock_server = MockServer::start().await;
    let service = AuthService::new(&config_for(&mock_server));

    let mut missing_password = register_request("new@example.com");
    missing_password.password = None;
    let result = service.register(missing_password).await;
    assert_matches!(result, Err(AuthError::MissingFields));

    let mut blank_name = register_request("new@example.com");
    blank_name.full_name = Some("".to_string());
    let result = service.register(blank_name).await;
    assert_matches!(result, Err(AuthError::MissingFields));
}

#[tokio::test]
async fn doctor_registration_forces_doctor_role() {
    let mock_server = MockServer::start().await;
    let identity_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/identities"))
        .and(query_param("email", "eq.doc@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/identities"))
        .and(body_partial_json(json!({ "role": "doctor" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::doctor_row(identity_id, "doc@example.com")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut request = register_request("doc@example.com");
    // The payload role must not be able to demote a doctor sign-up.
    request.role = Some(Role::Patient);

    let service = AuthService::new(&config_for(&mock_server));
    let session = service
        .register_doctor(request)
        .await
        .expect("doctor registration should succeed");

    assert_eq!(session.user.role, Role::Doctor);
}

#[tokio::test]
async fn login_accepts_valid_credentials() {
    let mock_server = MockServer::start().await;
    let identity_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/identities"))
        .and(query_param("email", "eq.known@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row_with_password(identity_id, "known@example.com", Role::Patient, "open sesame")
        ])))
        .mount(&mock_server)
        .await;

    let service = AuthService::new(&config_for(&mock_server));
    let session = service
        .login(login_request("known@example.com", "open sesame"))
        .await
        .expect("login should succeed");

    assert_eq!(session.user.id, identity_id);
    assert_eq!(session.token.split('.').count(), 3);
}

#[tokio::test]
async fn login_hides_whether_email_exists() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/identities"))
        .and(query_param("email", "eq.ghost@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/identities"))
        .and(query_param("email", "eq.known@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row_with_password(Uuid::new_v4(), "known@example.com", Role::Patient, "right-password")
        ])))
        .mount(&mock_server)
        .await;

    let service = AuthService::new(&config_for(&mock_server));

    let unknown = service
        .login(login_request("ghost@example.com", "whatever"))
        .await
        .expect_err("unknown email should fail");
    let wrong = service
        .login(login_request("known@example.com", "wrong-password"))
        .await
        .expect_err("wrong password should fail");

    assert_matches!(&unknown, AuthError::InvalidCredentials);
    assert_matches!(&wrong, AuthError::InvalidCredentials);
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn doctor_login_rejects_patient_account() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/identities"))
        .and(query_param("email", "eq.pat@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::patient_row(Uuid::new_v4(), "pat@example.com")
        ])))
        .mount(&mock_server)
        .await;

    let service = AuthService::new(&config_for(&mock_server));
    let result = service
        .login_doctor(login_request("pat@example.com", "whatever"))
        .await;

    // The role refusal comes before any password handling.
    assert_matches!(result, Err(AuthError::NotADoctor));
}

#[tokio::test]
async fn login_rejects_placeholder_credential() {
    let mock_server = MockServer::start().await;

    let mut row =
        MockStoreResponses::patient_row(Uuid::new_v4(), "walkin@example.com");
    row["password_hash"] = json!(format!("unusable:{}", Uuid::new_v4()));

    Mock::given(method("GET"))
        .and(path("/rest/v1/identities"))
        .and(query_param("email", "eq.walkin@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    let service = AuthService::new(&config_for(&mock_server));
    let result = service
        .login(login_request("walkin@example.com", "anything"))
        .await;

    assert_matches!(result, Err(AuthError::InvalidCredentials));
}

#[tokio::test]
async fn login_requires_stored_password() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/identities"))
        .and(query_param("email", "eq.nopass@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::patient_row(Uuid::new_v4(), "nopass@example.com")
        ])))
        .mount(&mock_server)
        .await;

    let service = AuthService::new(&config_for(&mock_server));
    let result = service
        .login(login_request("nopass@example.com", "anything"))
        .await;

    assert_matches!(result, Err(AuthError::PasswordlessAccount));
}

#[tokio::test]
async fn login_requires_both_credentials() {
    let mock_server = MockServer::start().await;
    let service = AuthService::new(&config_for(&mock_server));

    let result = service
        .login(LoginRequest {
            email: Some("known@example.com".to_string()),
            password: None,
        })
        .await;

    assert_matches!(result, Err(AuthError::MissingCredentials));
}

#[test]
fn admin_password_gate_matches_configured_value() {
    let config = TestConfig::default().to_app_config();
    let service = AuthService::new(&config);

    assert!(service.verify_admin_password("test-admin-password").is_ok());
    assert_matches!(
        service.verify_admin_password("wrong"),
        Err(AuthError::InvalidAdminPassword)
    );
}

#[test]
fn unconfigured_admin_password_never_matches() {
    let mut config = TestConfig::default().to_app_config();
    config.admin_password = String::new();
    let service = AuthService::new(&config);

    assert_matches!(
        service.verify_admin_password(""),
        Err(AuthError::InvalidAdminPassword)
    );
}

#[tokio::test]
async fn contact_resolution_reports_created_flag() {
    let mock_server = MockServer::start().await;
    let new_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/identities"))
        .and(query_param("email", "eq.fresh@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/identities"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::patient_row(new_id, "fresh@example.com")
        ])))
        .mount(&mock_server)
        .await;

    let contact = ContactDetails {
        email: Some("fresh@example.com".to_string()),
        full_name: Some("Fresh Person".to_string()),
        ..Default::default()
    };

    let service = AuthService::new(&config_for(&mock_server));
    let resolved = service.resolve_contact(contact).await.unwrap();

    assert!(resolved.created);
    assert_eq!(resolved.identity.id, new_id);
}

#[tokio::test]
async fn contact_resolution_requires_email_or_phone() {
    let mock_server = MockServer::start().await;
    let service = AuthService::new(&config_for(&mock_server));

    let result = service.resolve_contact(ContactDetails::default()).await;

    assert_matches!(
        result,
        Err(AuthError::Identity(IdentityError::MissingContact))
    );
}
