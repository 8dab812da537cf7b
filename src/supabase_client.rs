use crate::errors::AppError;
use crate::models::{IntakeRecord, NewIntakeRecord, RESPONSES_TABLE};
use crate::store::ResponseStore;
use async_trait::async_trait;
use std::time::Duration;

/// Client for the hosted PostgREST API in front of `calculator_responses`.
#[derive(Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    /// Creates a new `SupabaseClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Project URL, e.g. `https://xyz.supabase.co`.
    /// * `api_key` - The anon key, sent both as `apikey` and as bearer token.
    pub fn new(base_url: String, api_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Supabase client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, RESPONSES_TABLE)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn error_for_status(
        response: reqwest::Response,
        action: &str,
    ) -> Result<reqwest::Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(AppError::ExternalApiError(format!(
            "Supabase {} failed {}: {}",
            action, status, error_text
        )))
    }
}

#[async_trait]
impl ResponseStore for SupabaseClient {
    async fn insert(&self, record: &NewIntakeRecord) -> Result<IntakeRecord, AppError> {
        let url = self.table_url();
        tracing::info!("Inserting intake response into {}", RESPONSES_TABLE);

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(&[record])
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Supabase request failed: {}", e)))?;

        let response = Self::error_for_status(response, "insert").await?;

        let mut rows: Vec<IntakeRecord> = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Supabase response: {}", e))
        })?;

        if rows.is_empty() {
            return Err(AppError::ExternalApiError(
                "Supabase insert returned no rows".to_string(),
            ));
        }
        let stored = rows.swap_remove(0);

        tracing::info!("✓ Stored intake response {}", stored.id);
        Ok(stored)
    }

    async fn list_newest_first(&self) -> Result<Vec<IntakeRecord>, AppError> {
        let url = self.table_url();
        tracing::debug!("Fetching intake responses: {}", url);

        let response = self
            .authorized(self.client.get(&url))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Supabase request failed: {}", e)))?;

        let response = Self::error_for_status(response, "select").await?;

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Supabase response: {}", e))
        })
    }
}
