//! Profile lookups over the provider's PostgREST interface.

use async_trait::async_trait;
use authgate_core::auth::{AuthError, Profile, ProfileRepository, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use url::Url;

use crate::error::AuthError as ShellError;

/// Reads `GET /rest/v1/{table}?id=eq.{id}&select=*`.
#[derive(Debug, Clone)]
pub struct PostgrestProfiles {
    http: reqwest::Client,
    table_url: Url,
}

impl PostgrestProfiles {
    /// # Errors
    ///
    /// Returns `Config` if the key is not a valid header value or the table
    /// URL cannot be built.
    pub fn new(
        supabase_url: &Url,
        anon_key: &str,
        table: &str,
    ) -> std::result::Result<Self, ShellError> {
        let base = supabase_url.as_str().trim_end_matches('/');
        let table_url = Url::parse(&format!("{base}/rest/v1/{table}"))
            .map_err(|e| ShellError::Config(format!("invalid profiles URL: {e}")))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            "apikey",
            HeaderValue::from_str(anon_key)
                .map_err(|e| ShellError::Config(format!("invalid API key header: {e}")))?,
        );
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|e| ShellError::Http(e.to_string()))?;

        Ok(Self { http, table_url })
    }
}

#[async_trait]
impl ProfileRepository for PostgrestProfiles {
    async fn get_profile(&self, user_id: &str, access_token: &str) -> Result<Option<Profile>> {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{user_id}"))
            .append_pair("select", "*");

        let resp = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Storage(format!(
                "profile lookup failed ({}): {body}",
                status.as_u16()
            )));
        }

        let rows: Vec<Profile> = resp
            .json()
            .await
            .map_err(|e| AuthError::Storage(format!("invalid profile row: {e}")))?;
        Ok(rows.into_iter().next())
    }
}
