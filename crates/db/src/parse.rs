//! REST client for a Parse-compatible hosted backend.

use std::time::Duration;

use async_trait::async_trait;
use pagepilot_core::types::{ObjectId, Record};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ParseConfig;
use crate::error::DbError;
use crate::query::Query;
use crate::store::{Datastore, FindResult};

/// HTTP client for one Parse application.
pub struct ParseClient {
    client: reqwest::Client,
    config: ParseConfig,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    results: Vec<Record>,
    #[serde(default)]
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    object_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

impl ParseClient {
    pub fn new(config: ParseConfig) -> Result<Self, DbError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn class_url(&self, class_name: &str) -> String {
        format!("{}/classes/{}", self.config.server_url, class_name)
    }

    fn object_url(&self, class_name: &str, object_id: &str) -> String {
        format!("{}/classes/{}/{}", self.config.server_url, class_name, object_id)
    }

    /// Attach application credentials. `master` adds the master key, which
    /// schema operations require.
    fn authed(&self, builder: reqwest::RequestBuilder, master: bool) -> reqwest::RequestBuilder {
        let builder = builder
            .header("X-Parse-Application-Id", &self.config.app_id)
            .header("X-Parse-REST-API-Key", &self.config.rest_key);
        match (&self.config.master_key, master) {
            (Some(key), true) => builder.header("X-Parse-Master-Key", key),
            _ => builder,
        }
    }

    /// Return the response unchanged on 2xx, or an [`DbError::Api`] with the
    /// Parse error code and message on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, DbError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let parsed: Option<ErrorBody> = serde_json::from_str(&text).ok();
        let (code, message) = match parsed {
            Some(ErrorBody { code, error: Some(msg) }) => (code, msg),
            Some(ErrorBody { code, error: None }) => (code, text),
            None => (None, text),
        };
        Err(DbError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DbError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl Datastore for ParseClient {
    async fn find(&self, class_name: &str, query: &Query) -> Result<FindResult, DbError> {
        let request = self
            .client
            .get(self.class_url(class_name))
            .query(&query.to_params());
        let response = self.authed(request, false).send().await?;
        let body: FindResponse = Self::parse_response(response).await?;
        tracing::debug!(class_name, rows = body.results.len(), "Datastore find");
        Ok(FindResult {
            results: body.results,
            count: body.count,
        })
    }

    async fn get(&self, class_name: &str, object_id: &str) -> Result<Option<Record>, DbError> {
        let request = self.client.get(self.object_url(class_name, object_id));
        let response = self.authed(request, false).send().await?;
        match Self::parse_response::<Record>(response).await {
            Ok(row) => Ok(Some(row)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, class_name: &str, fields: Record) -> Result<ObjectId, DbError> {
        let request = self.client.post(self.class_url(class_name)).json(&fields);
        let response = self.authed(request, false).send().await?;
        let body: CreateResponse = Self::parse_response(response).await?;
        tracing::debug!(class_name, object_id = %body.object_id, "Datastore create");
        Ok(body.object_id)
    }

    async fn update(
        &self,
        class_name: &str,
        object_id: &str,
        fields: Record,
    ) -> Result<(), DbError> {
        let request = self
            .client
            .put(self.object_url(class_name, object_id))
            .json(&fields);
        let response = self.authed(request, false).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn delete(&self, class_name: &str, object_id: &str) -> Result<bool, DbError> {
        let request = self.client.delete(self.object_url(class_name, object_id));
        let response = self.authed(request, false).send().await?;
        match Self::ensure_success(response).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_class(
        &self,
        class_name: &str,
        fields: &serde_json::Map<String, Value>,
    ) -> Result<(), DbError> {
        if self.config.master_key.is_none() {
            return Err(DbError::InvalidQuery(
                "Schema changes require PARSE_MASTER_KEY".to_string(),
            ));
        }
        let body = json!({ "className": class_name, "fields": fields });
        let request = self
            .client
            .post(format!("{}/schemas/{}", self.config.server_url, class_name))
            .json(&body);
        let response = self.authed(request, true).send().await?;
        Self::ensure_success(response).await?;
        tracing::info!(class_name, "Datastore class created");
        Ok(())
    }
}
