//! HTTP-contract tests: each client runs against a local mock server that
//! verifies the exact requests going over the wire.

use std::io::Write;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use corpus_bot::config::SheetsConfig;
use corpus_bot::error::{ChannelError, SearchError, SheetsError};
use corpus_bot::search::{HttpSearchClient, SearchProvider};
use corpus_bot::sheets::{RowSink, SheetsClient, SheetsEndpoints};
use corpus_bot::telegram::api::{InlineButton, TelegramApi, Transport};

// ── Telegram API ────────────────────────────────────────────────────

fn telegram(server: &MockServer) -> TelegramApi {
    TelegramApi::with_base_url(SecretString::from("123:ABC"), server.uri())
}

#[tokio::test]
async fn reply_posts_send_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .and(body_json(json!({"chat_id": 7, "text": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    telegram(&server).reply(7, "hello").await.unwrap();
}

#[tokio::test]
async fn long_reply_is_split_into_chunks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(2)
        .mount(&server)
        .await;

    let long = "a".repeat(5000);
    telegram(&server).reply(7, &long).await.unwrap();
}

#[tokio::test]
async fn reply_with_keyboard_includes_markup() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .and(body_json(json!({
            "chat_id": 7,
            "text": "Please select an action:",
            "reply_markup": {
                "inline_keyboard": [[
                    {"text": "Submit Data Point", "callback_data": "submit_data"},
                    {"text": "Cancel", "callback_data": "cancel_submission"},
                ]]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let keyboard = vec![vec![
        InlineButton::new("Submit Data Point", "submit_data"),
        InlineButton::new("Cancel", "cancel_submission"),
    ]];
    telegram(&server)
        .reply_with_keyboard(7, "Please select an action:", &keyboard)
        .await
        .unwrap();
}

#[tokio::test]
async fn edit_message_posts_edit_message_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/editMessageText"))
        .and(body_json(json!({
            "chat_id": 7,
            "message_id": 42,
            "text": "Data successfully added to the dataset!"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    telegram(&server)
        .edit_message(7, 42, "Data successfully added to the dataset!")
        .await
        .unwrap();
}

#[tokio::test]
async fn answer_callback_posts_query_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/answerCallbackQuery"))
        .and(body_json(json!({"callback_query_id": "cb-9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    telegram(&server).answer_callback("cb-9").await.unwrap();
}

#[tokio::test]
async fn send_failure_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request: chat not found"))
        .mount(&server)
        .await;

    let err = telegram(&server).reply(7, "hello").await.unwrap_err();
    match err {
        ChannelError::SendFailed { chat_id, reason } => {
            assert_eq!(chat_id, 7);
            assert!(reason.contains("400"), "reason was: {reason}");
        }
        other => panic!("expected SendFailed, got {other}"),
    }
}

#[tokio::test]
async fn health_check_hits_get_me() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bot123:ABC/getMe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    telegram(&server).health_check().await.unwrap();
}

#[tokio::test]
async fn health_check_fails_on_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bot123:ABC/getMe"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(matches!(
        telegram(&server).health_check().await,
        Err(ChannelError::HealthCheckFailed(_))
    ));
}

// ── Sheets client ───────────────────────────────────────────────────

fn write_credentials() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"client_id": "cid", "client_secret": "shh", "refresh_token": "1//r", "type": "authorized_user"}}"#
    )
    .unwrap();
    file
}

fn sheets_config(credentials: &tempfile::NamedTempFile) -> SheetsConfig {
    SheetsConfig {
        credentials_file: credentials.path().to_path_buf(),
        spreadsheet_name: "AI Training Dataset".into(),
        worksheet_name: "Sheet1".into(),
    }
}

fn endpoints(server: &MockServer) -> SheetsEndpoints {
    SheetsEndpoints {
        token_url: format!("{}/token", server.uri()),
        drive_url: server.uri(),
        sheets_url: server.uri(),
    }
}

async fn mount_happy_google(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("pageSize", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"id": "sheet-123", "name": "AI Training Dataset"}]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sheets": [
                {"properties": {"title": "Sheet1"}},
                {"properties": {"title": "Notes"}}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn connect_resolves_spreadsheet_and_appends_row() {
    let server = MockServer::start().await;
    mount_happy_google(&server).await;

    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-123/values/Sheet1:append"))
        .and(query_param("valueInputOption", "USER_ENTERED"))
        .and(header("authorization", "Bearer at-1"))
        .and(body_json(json!({"values": [["alpha", "beta"]]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = write_credentials();
    let client =
        SheetsClient::connect_with_endpoints(&sheets_config(&credentials), endpoints(&server))
            .await
            .unwrap();

    assert_eq!(client.spreadsheet_id(), "sheet-123");
    client
        .append_row(&["alpha".to_string(), "beta".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn access_token_is_reused_until_expiry() {
    let server = MockServer::start().await;
    mount_happy_google(&server).await;

    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-123/values/Sheet1:append"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let credentials = write_credentials();
    let client =
        SheetsClient::connect_with_endpoints(&sheets_config(&credentials), endpoints(&server))
            .await
            .unwrap();

    client.append_row(&["one".to_string()]).await.unwrap();
    client.append_row(&["two".to_string()]).await.unwrap();

    // One token exchange serves connect and both appends.
    let token_calls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/token")
        .count();
    assert_eq!(token_calls, 1);
}

#[tokio::test]
async fn connect_fails_when_spreadsheet_is_missing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
        .mount(&server)
        .await;

    let credentials = write_credentials();
    let err =
        SheetsClient::connect_with_endpoints(&sheets_config(&credentials), endpoints(&server))
            .await
            .unwrap_err();
    assert!(matches!(err, SheetsError::SpreadsheetNotFound(name) if name == "AI Training Dataset"));
}

#[tokio::test]
async fn connect_fails_when_worksheet_is_missing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-1",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"id": "sheet-123", "name": "AI Training Dataset"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sheets": [{"properties": {"title": "SomethingElse"}}]
        })))
        .mount(&server)
        .await;

    let credentials = write_credentials();
    let err =
        SheetsClient::connect_with_endpoints(&sheets_config(&credentials), endpoints(&server))
            .await
            .unwrap_err();
    assert!(matches!(err, SheetsError::WorksheetNotFound { .. }));
}

#[tokio::test]
async fn connect_fails_on_rejected_token_exchange() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let credentials = write_credentials();
    let err =
        SheetsClient::connect_with_endpoints(&sheets_config(&credentials), endpoints(&server))
            .await
            .unwrap_err();
    assert!(matches!(err, SheetsError::TokenExchange(_)));
}

#[tokio::test]
async fn append_failure_surfaces_status() {
    let server = MockServer::start().await;
    mount_happy_google(&server).await;

    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-123/values/Sheet1:append"))
        .respond_with(ResponseTemplate::new(403).set_body_string("insufficient permissions"))
        .mount(&server)
        .await;

    let credentials = write_credentials();
    let client =
        SheetsClient::connect_with_endpoints(&sheets_config(&credentials), endpoints(&server))
            .await
            .unwrap();

    let err = client.append_row(&["x".to_string()]).await.unwrap_err();
    match err {
        SheetsError::AppendFailed(reason) => assert!(reason.contains("403"), "was: {reason}"),
        other => panic!("expected AppendFailed, got {other}"),
    }
}

// ── Search client ───────────────────────────────────────────────────

#[tokio::test]
async fn search_posts_queries_and_parses_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(json!({"queries": ["rust"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"results": [
                {"source_title": "The Rust Language", "url": "https://rust-lang.org", "snippet": "A language"}
            ]}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpSearchClient::new(format!("{}/search", server.uri()), None);
    let sets = client.search(&["rust".to_string()]).await.unwrap();

    assert_eq!(sets.len(), 1);
    assert_eq!(
        sets[0].results[0].source_title.as_deref(),
        Some("The Rust Language")
    );
}

#[tokio::test]
async fn search_sends_bearer_key_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("authorization", "Bearer seekrit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpSearchClient::new(
        format!("{}/search", server.uri()),
        Some(SecretString::from("seekrit")),
    );
    client.search(&["q".to_string()]).await.unwrap();
}

#[tokio::test]
async fn search_failure_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = HttpSearchClient::new(format!("{}/search", server.uri()), None);
    let err = client.search(&["q".to_string()]).await.unwrap_err();
    assert!(matches!(err, SearchError::RequestFailed(_)));
}

#[tokio::test]
async fn search_rejects_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = HttpSearchClient::new(format!("{}/search", server.uri()), None);
    let err = client.search(&["q".to_string()]).await.unwrap_err();
    assert!(matches!(err, SearchError::InvalidResponse(_)));
}
