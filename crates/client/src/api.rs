//! REST client for the OKR API gateway.
//!
//! Every collection follows the same CRUD shape (`GET` list with query
//! parameters, `GET`/`PUT`/`DELETE` by id, `POST` to create), so one generic
//! [`Resource`] handle serves all of them. Users decode through the
//! team-member adapter into the canonical [`TeamMember`].

use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use okr_core::check_in::CheckIn;
use okr_core::competency::Competency;
use okr_core::cycle::Cycle;
use okr_core::evaluation::Evaluation;
use okr_core::objective::Objective;
use okr_core::pdi::Pdi;
use okr_core::settings::OrganizationSettings;
use okr_core::team::{RawTeamMember, TeamMember};

use crate::config::ClientConfig;
use crate::dashboard::{
    BackendFigures, RemoteDashboardMetrics, RemoteDepartmentProgress, RemoteMonthlyProgress,
};
use crate::error::ClientError;
use crate::query::ListQuery;

/// HTTP client for one API gateway.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiClient {
    /// Build a client with the configured request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone()))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- collections ----

    pub fn users(&self) -> Resource<'_, RawTeamMember, TeamMember> {
        Resource::new(self, "/api/users")
    }

    pub fn objectives(&self) -> Resource<'_, Objective> {
        Resource::new(self, "/api/objectives")
    }

    pub fn check_ins(&self) -> Resource<'_, CheckIn> {
        Resource::new(self, "/api/check-ins")
    }

    pub fn evaluations(&self) -> Resource<'_, Evaluation> {
        Resource::new(self, "/api/evaluations")
    }

    pub fn competencies(&self) -> Resource<'_, Competency> {
        Resource::new(self, "/api/competencies")
    }

    pub fn pdis(&self) -> Resource<'_, Pdi> {
        Resource::new(self, "/api/pdis")
    }

    pub fn cycles(&self) -> Resource<'_, Cycle> {
        Resource::new(self, "/api/cycles")
    }

    // ---- dashboard ----

    /// The cycle the backend considers current.
    pub async fn current_cycle(&self) -> Result<Cycle, ClientError> {
        self.get_json("/api/dashboard/current-cycle", &[]).await
    }

    pub async fn dashboard_metrics(
        &self,
        cycle_id: Option<&str>,
    ) -> Result<RemoteDashboardMetrics, ClientError> {
        self.get_json("/api/dashboard/metrics", &cycle_param(cycle_id))
            .await
    }

    pub async fn department_progress(
        &self,
        cycle_id: Option<&str>,
    ) -> Result<Vec<RemoteDepartmentProgress>, ClientError> {
        self.get_json("/api/dashboard/department-progress", &cycle_param(cycle_id))
            .await
    }

    pub async fn monthly_progress(
        &self,
        cycle_id: Option<&str>,
    ) -> Result<Vec<RemoteMonthlyProgress>, ClientError> {
        self.get_json("/api/dashboard/monthly-progress", &cycle_param(cycle_id))
            .await
    }

    /// Fetch the metrics, department and monthly aggregates concurrently.
    pub async fn backend_figures(
        &self,
        cycle_id: Option<&str>,
    ) -> Result<BackendFigures, ClientError> {
        let (metrics, departments, monthly) = tokio::try_join!(
            self.dashboard_metrics(cycle_id),
            self.department_progress(cycle_id),
            self.monthly_progress(cycle_id),
        )?;
        Ok(BackendFigures {
            metrics,
            departments,
            monthly,
        })
    }

    // ---- settings ----

    pub async fn settings(&self) -> Result<OrganizationSettings, ClientError> {
        self.get_json("/api/settings", &[]).await
    }

    /// Replace the organization settings. Invalid settings are rejected
    /// locally before any request is sent.
    pub async fn update_settings(
        &self,
        settings: &OrganizationSettings,
    ) -> Result<OrganizationSettings, ClientError> {
        settings.ensure_valid()?;
        let response = self
            .client
            .put(self.url("/api/settings"))
            .json(settings)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ClientError> {
        tracing::debug!(path, "GET");
        let response = self.client.get(self.url(path)).query(query).send().await?;
        Self::parse_response(response).await
    }

    /// Return the response unchanged on a 2xx status, otherwise an
    /// [`ClientError::Api`] carrying the body's `detail` message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
        tracing::warn!(status = status.as_u16(), %detail, "API request failed");
        Err(ClientError::Api {
            status: status.as_u16(),
            detail,
        })
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

fn cycle_param(cycle_id: Option<&str>) -> Vec<(String, String)> {
    cycle_id
        .map(|id| vec![("cycle_id".to_string(), id.to_string())])
        .unwrap_or_default()
}

/// The `detail` of a JSON error body. Validation errors carry a list
/// instead of a string; it is passed through as JSON text.
fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// Typed handle on one REST collection. `W` is the wire shape, `T` the
/// value handed to callers.
#[derive(Debug)]
pub struct Resource<'a, W, T = W> {
    api: &'a ApiClient,
    path: &'static str,
    _marker: PhantomData<fn() -> (W, T)>,
}

impl<'a, W, T> Resource<'a, W, T>
where
    W: DeserializeOwned,
    T: From<W>,
{
    fn new(api: &'a ApiClient, path: &'static str) -> Self {
        Self {
            api,
            path,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}{}/{}", self.api.api_url, self.path, id)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<T>, ClientError> {
        let items: Vec<W> = self.api.get_json(self.path, &query.pairs()).await?;
        tracing::debug!(path = self.path, count = items.len(), "Listed collection");
        Ok(items.into_iter().map(T::from).collect())
    }

    pub async fn get(&self, id: &str) -> Result<T, ClientError> {
        let response = self.api.client.get(self.item_url(id)).send().await?;
        let item: W = ApiClient::parse_response(response).await?;
        Ok(item.into())
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<T, ClientError> {
        tracing::debug!(path = self.path, "POST");
        let response = self
            .api
            .client
            .post(self.api.url(self.path))
            .json(body)
            .send()
            .await?;
        let item: W = ApiClient::parse_response(response).await?;
        Ok(item.into())
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        tracing::debug!(path = self.path, id, "PUT");
        let response = self
            .api
            .client
            .put(self.item_url(id))
            .json(body)
            .send()
            .await?;
        let item: W = ApiClient::parse_response(response).await?;
        Ok(item.into())
    }

    /// Delete by id. The API answers `204 No Content`.
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        tracing::debug!(path = self.path, id, "DELETE");
        let response = self.api.client.delete(self.item_url(id)).send().await?;
        ApiClient::check_status(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_detail_reads_string_detail() {
        assert_eq!(
            error_detail(r#"{"detail":"Objective not found"}"#).as_deref(),
            Some("Objective not found")
        );
    }

    #[test]
    fn error_detail_passes_validation_lists_through() {
        let detail = error_detail(r#"{"detail":[{"loc":["body","weight"],"msg":"bad"}]}"#).unwrap();
        assert!(detail.contains("weight"));
    }

    #[test]
    fn error_detail_ignores_non_json() {
        assert!(error_detail("<html>502</html>").is_none());
        assert!(error_detail("").is_none());
    }

    #[test]
    fn base_url_is_normalized() {
        let api = ApiClient::with_client(reqwest::Client::new(), "http://localhost:8000/");
        assert_eq!(api.api_url(), "http://localhost:8000");
        assert_eq!(api.objectives().item_url("o1"), "http://localhost:8000/api/objectives/o1");
        assert_eq!(api.check_ins().path(), "/api/check-ins");
    }
}
