//! Persistence collaborator: visit storage behind a trait seam.
//!
//! The remote service owns the records; this crate only ever sends full
//! creation payloads, fetches, and changed-fields-only patches. The trait
//! exists so the orchestrator can be exercised against an in-memory double
//! without a network.

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config;
use crate::lifecycle::VisitPatch;
use crate::models::{NewVisit, SessionContext, VisitRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot reach the visit service at {0}")]
    Connection(String),

    #[error("Visit service request timed out")]
    Timeout,

    #[error("Visit service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unreadable response from the visit service: {0}")]
    Decode(String),

    /// The service acknowledged the PUT but reported zero affected rows.
    #[error("The update was not applied")]
    WriteNotApplied,
}

/// Acknowledgment for `POST /visits`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAck {
    pub id: String,
}

/// Acknowledgment for `PUT /visits/{id}`; `affected_rows` confirms the
/// write took effect.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub affected_rows: u32,
}

/// The persistence operations the scheduling core needs.
#[allow(async_fn_in_trait)]
pub trait VisitStore {
    async fn create(&self, visit: &NewVisit) -> Result<CreateAck, StoreError>;
    async fn fetch(&self, id: &str) -> Result<VisitRecord, StoreError>;
    async fn update(&self, id: &str, patch: &VisitPatch) -> Result<UpdateAck, StoreError>;
    async fn list_by_consultant(
        &self,
        consultant_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<VisitRecord>, StoreError>;
    async fn list_today(&self) -> Result<Vec<VisitRecord>, StoreError>;
    async fn list_this_week(&self) -> Result<Vec<VisitRecord>, StoreError>;
    async fn list_this_month(&self) -> Result<Vec<VisitRecord>, StoreError>;
}

/// REST implementation over HTTPS with bearer-token auth.
pub struct HttpVisitStore {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpVisitStore {
    pub fn new(base_url: &str, token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config::HTTP_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        }
    }

    /// Store pointed at the configured base URL, authenticated as the
    /// session's bearer token.
    pub fn from_session(session: &SessionContext) -> Self {
        Self::new(&config::persistence_base_url(), &session.token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_connect() {
            StoreError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Decode(e.to_string())
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_list(&self, path: &str) -> Result<Vec<VisitRecord>, StoreError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

impl VisitStore for HttpVisitStore {
    async fn create(&self, visit: &NewVisit) -> Result<CreateAck, StoreError> {
        debug!(college = %visit.college_name, date = %visit.visit_date, "creating visit");
        let response = self
            .client
            .post(self.url("/visits"))
            .bearer_auth(&self.token)
            .json(visit)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn fetch(&self, id: &str) -> Result<VisitRecord, StoreError> {
        let response = self
            .client
            .get(self.url(&format!("/visits/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn update(&self, id: &str, patch: &VisitPatch) -> Result<UpdateAck, StoreError> {
        debug!(visit = id, "submitting visit patch");
        let response = self
            .client
            .put(self.url(&format!("/visits/{id}")))
            .bearer_auth(&self.token)
            .json(patch)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn list_by_consultant(
        &self,
        consultant_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<VisitRecord>, StoreError> {
        let response = self
            .client
            .get(self.url("/visits/by-consultant"))
            .query(&[
                ("consultantId", consultant_id),
                ("date", &date.to_string()),
            ])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn list_today(&self) -> Result<Vec<VisitRecord>, StoreError> {
        self.get_list("/visits/today").await
    }

    async fn list_this_week(&self) -> Result<Vec<VisitRecord>, StoreError> {
        self.get_list("/visits/this-week").await
    }

    async fn list_this_month(&self) -> Result<Vec<VisitRecord>, StoreError> {
        self.get_list("/visits/this-month").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let store = HttpVisitStore::new("https://api.example.edu/", "tok");
        assert_eq!(store.url("/visits"), "https://api.example.edu/visits");
        assert_eq!(store.url("/visits/v-1"), "https://api.example.edu/visits/v-1");
    }

    #[test]
    fn acks_accept_camel_case_bodies() {
        let create: CreateAck = serde_json::from_str(r#"{"id":"v-42"}"#).unwrap();
        assert_eq!(create.id, "v-42");
        let update: UpdateAck = serde_json::from_str(r#"{"affectedRows":1}"#).unwrap();
        assert_eq!(update.affected_rows, 1);
    }
}
