//! The QC tracking spreadsheet.
//!
//! One row per assessment, keyed by the assessment id in column A. Rows are
//! appended on submission and updated in place as the record progresses.

use std::sync::Arc;

use async_trait::async_trait;
use blusanta_core::types::DbId;
use serde::Deserialize;

use crate::auth::{AccessTokenSource, SCOPE_SPREADSHEETS};
use crate::error::CloudResult;
use crate::http::{ensure_success, parse_response, required_env};

const SERVICE: &str = "Google Sheets";
const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4";
const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Data rows start below the header row.
const FIRST_DATA_ROW: usize = 2;

// ---------------------------------------------------------------------------
// Row updates
// ---------------------------------------------------------------------------

/// Columns the backend writes after the initial append. The remaining
/// columns belong to reviewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetColumn {
    FinalVideoUrl,
    VideoGeneratedOn,
    Regenerated,
}

impl SheetColumn {
    pub fn letter(self) -> &'static str {
        match self {
            Self::FinalVideoUrl => "N",
            Self::VideoGeneratedOn => "O",
            Self::Regenerated => "S",
        }
    }
}

/// Partial update of one row. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetUpdate {
    pub final_video_url: Option<String>,
    pub video_generated_on: Option<String>,
    pub regenerated: Option<String>,
}

impl SheetUpdate {
    pub fn cells(&self) -> Vec<(SheetColumn, &str)> {
        [
            (SheetColumn::FinalVideoUrl, &self.final_video_url),
            (SheetColumn::VideoGeneratedOn, &self.video_generated_on),
            (SheetColumn::Regenerated, &self.regenerated),
        ]
        .into_iter()
        .filter_map(|(col, value)| value.as_deref().map(|v| (col, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cells().is_empty()
    }
}

#[async_trait]
pub trait QcSheet: Send + Sync {
    /// Append a full row after the last data row.
    async fn append_row(&self, values: Vec<String>) -> CloudResult<()>;

    /// Update the row whose column A equals `assessment_id`.
    ///
    /// Returns `false` when no such row exists.
    async fn update_by_assessment_id(
        &self,
        assessment_id: DbId,
        update: &SheetUpdate,
    ) -> CloudResult<bool>;
}

// ---------------------------------------------------------------------------
// Google Sheets API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    pub sheet_name: String,
}

impl SheetConfig {
    /// | Env var          | Default  |
    /// |------------------|----------|
    /// | `SPREADSHEET_ID` | required |
    /// | `SHEET_NAME`     | `Sheet1` |
    pub fn from_env() -> CloudResult<Self> {
        Ok(Self {
            spreadsheet_id: required_env("SPREADSHEET_ID")?,
            sheet_name: std::env::var("SHEET_NAME")
                .unwrap_or_else(|_| DEFAULT_SHEET_NAME.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

pub struct GoogleSheetsClient {
    client: reqwest::Client,
    tokens: Arc<dyn AccessTokenSource>,
    config: SheetConfig,
    api_base: String,
}

impl GoogleSheetsClient {
    pub fn new(
        client: reqwest::Client,
        tokens: Arc<dyn AccessTokenSource>,
        config: SheetConfig,
    ) -> Self {
        Self {
            client,
            tokens,
            config,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.api_base,
            self.config.spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    async fn bearer(&self) -> CloudResult<String> {
        self.tokens.access_token(&[SCOPE_SPREADSHEETS]).await
    }

    /// 1-based sheet row holding `assessment_id`.
    async fn find_row(&self, assessment_id: DbId) -> CloudResult<Option<usize>> {
        let range = format!("{}!A{FIRST_DATA_ROW}:A", self.config.sheet_name);
        let response = self
            .client
            .get(self.values_url(&range))
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;
        let ids: ValueRange = parse_response(SERVICE, response).await?;
        Ok(row_for_id(&ids.values, assessment_id))
    }
}

fn row_for_id(column_a: &[Vec<String>], assessment_id: DbId) -> Option<usize> {
    let needle = assessment_id.to_string();
    column_a
        .iter()
        .position(|row| row.first().map(|v| v.trim()) == Some(needle.as_str()))
        .map(|index| index + FIRST_DATA_ROW)
}

#[async_trait]
impl QcSheet for GoogleSheetsClient {
    async fn append_row(&self, values: Vec<String>) -> CloudResult<()> {
        let url = format!("{}:append", self.values_url(&self.config.sheet_name));
        let response = self
            .client
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(self.bearer().await?)
            .json(&serde_json::json!({ "values": [values] }))
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }

    async fn update_by_assessment_id(
        &self,
        assessment_id: DbId,
        update: &SheetUpdate,
    ) -> CloudResult<bool> {
        let Some(row) = self.find_row(assessment_id).await? else {
            return Ok(false);
        };
        let data: Vec<_> = update
            .cells()
            .into_iter()
            .map(|(column, value)| {
                serde_json::json!({
                    "range": format!("{}!{}{row}", self.config.sheet_name, column.letter()),
                    "values": [[value]],
                })
            })
            .collect();
        if data.is_empty() {
            return Ok(true);
        }

        let url = format!(
            "{}/spreadsheets/{}/values:batchUpdate",
            self.api_base, self.config.spreadsheet_id
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(self.bearer().await?)
            .json(&serde_json::json!({ "valueInputOption": "RAW", "data": data }))
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        Ok(true)
    }
}
