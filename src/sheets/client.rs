//! Google Sheets client — spreadsheet resolution and row appends.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SheetsConfig;
use crate::error::SheetsError;
use crate::sheets::RowSink;
use crate::sheets::auth::{TokenManager, UserCredentials};

/// Service endpoints. Tests point these at a local mock server.
#[derive(Debug, Clone)]
pub struct SheetsEndpoints {
    pub token_url: String,
    pub drive_url: String,
    pub sheets_url: String,
}

impl Default for SheetsEndpoints {
    fn default() -> Self {
        Self {
            token_url: "https://oauth2.googleapis.com/token".into(),
            drive_url: "https://www.googleapis.com".into(),
            sheets_url: "https://sheets.googleapis.com".into(),
        }
    }
}

/// A connected spreadsheet handle: resolved spreadsheet id plus a verified
/// worksheet to append into.
#[derive(Debug)]
pub struct SheetsClient {
    client: reqwest::Client,
    auth: TokenManager,
    endpoints: SheetsEndpoints,
    spreadsheet_id: String,
    worksheet: String,
}

impl SheetsClient {
    /// Connect at startup: authenticate, resolve the spreadsheet by title,
    /// and verify the worksheet exists.
    pub async fn connect(config: &SheetsConfig) -> Result<Self, SheetsError> {
        Self::connect_with_endpoints(config, SheetsEndpoints::default()).await
    }

    pub async fn connect_with_endpoints(
        config: &SheetsConfig,
        endpoints: SheetsEndpoints,
    ) -> Result<Self, SheetsError> {
        let credentials = UserCredentials::load(&config.credentials_file)?;
        let client = reqwest::Client::new();
        let auth = TokenManager::new(client.clone(), credentials, endpoints.token_url.clone());

        // The first token fetch doubles as the authentication check.
        let token = auth.bearer_token().await?;

        let spreadsheet_id =
            resolve_spreadsheet_id(&client, &endpoints, &token, &config.spreadsheet_name).await?;
        verify_worksheet(&client, &endpoints, &token, &spreadsheet_id, config).await?;

        tracing::info!(
            spreadsheet = %config.spreadsheet_name,
            worksheet = %config.worksheet_name,
            "Successfully connected to Google Sheets"
        );

        Ok(Self {
            client,
            auth,
            endpoints,
            spreadsheet_id,
            worksheet: config.worksheet_name.clone(),
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }
}

/// Look the spreadsheet up by title through the Drive files API.
async fn resolve_spreadsheet_id(
    client: &reqwest::Client,
    endpoints: &SheetsEndpoints,
    token: &str,
    title: &str,
) -> Result<String, SheetsError> {
    #[derive(Deserialize)]
    struct FileList {
        #[serde(default)]
        files: Vec<DriveFile>,
    }

    #[derive(Deserialize)]
    struct DriveFile {
        id: String,
    }

    let query = format!(
        "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
        title.replace('\'', "\\'")
    );

    let list: FileList = client
        .get(format!("{}/drive/v3/files", endpoints.drive_url))
        .bearer_auth(token)
        .query(&[
            ("q", query.as_str()),
            ("fields", "files(id,name)"),
            ("pageSize", "1"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    list.files
        .into_iter()
        .next()
        .map(|f| f.id)
        .ok_or_else(|| SheetsError::SpreadsheetNotFound(title.to_string()))
}

/// Confirm the configured worksheet (tab) exists in the spreadsheet.
async fn verify_worksheet(
    client: &reqwest::Client,
    endpoints: &SheetsEndpoints,
    token: &str,
    spreadsheet_id: &str,
    config: &SheetsConfig,
) -> Result<(), SheetsError> {
    #[derive(Deserialize)]
    struct SpreadsheetMeta {
        #[serde(default)]
        sheets: Vec<SheetEntry>,
    }

    #[derive(Deserialize)]
    struct SheetEntry {
        properties: SheetProperties,
    }

    #[derive(Deserialize)]
    struct SheetProperties {
        title: String,
    }

    let meta: SpreadsheetMeta = client
        .get(format!(
            "{}/v4/spreadsheets/{spreadsheet_id}",
            endpoints.sheets_url
        ))
        .bearer_auth(token)
        .query(&[("fields", "sheets.properties.title")])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if meta
        .sheets
        .iter()
        .any(|s| s.properties.title == config.worksheet_name)
    {
        Ok(())
    } else {
        Err(SheetsError::WorksheetNotFound {
            spreadsheet: config.spreadsheet_name.clone(),
            worksheet: config.worksheet_name.clone(),
        })
    }
}

#[async_trait]
impl RowSink for SheetsClient {
    async fn append_row(&self, row: &[String]) -> Result<(), SheetsError> {
        let token = self.auth.bearer_token().await?;
        let range = urlencoding::encode(&self.worksheet);
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{range}:append",
            self.endpoints.sheets_url, self.spreadsheet_id
        );

        let body = serde_json::json!({"values": [row]});
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(SheetsError::AppendFailed(format!(
                "values:append returned {status}: {detail}"
            )));
        }

        tracing::info!(columns = row.len(), "Appended row to dataset sheet");
        Ok(())
    }
}
