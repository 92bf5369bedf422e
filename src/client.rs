#![doc = "HTTP implementation of the record store against a Kinto attachments server."]
//
//! # KintoClient
//!
//! Bridges the [`RecordStore`] trait to the server's REST API:
//!
//! | operation                  | request                                               |
//! |----------------------------|-------------------------------------------------------|
//! | `fetch_records`            | `GET {collection}/records` (follows `Next-Page`)      |
//! | `fetch_bucket`             | `GET {bucket}`                                        |
//! | `create_bucket`            | `PUT {bucket}` with `{permissions}`                   |
//! | `patch_bucket_permissions` | `PATCH {bucket}` with `{permissions}`                 |
//! | `create_collection`        | `POST {bucket}/collections` with `{data, permissions}` |
//! | `upload_attachment`        | `POST {records}/{id}/attachment?gzipped=true`         |
//!
//! One `reqwest::Client` is shared by every call and each request carries
//! HTTP basic auth. There is no retry and no timeout beyond reqwest's
//! defaults.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::config::{CollectionRef, Credentials};
use crate::contract::{AttachmentUpload, Bucket, Permissions, RecordStore, RemoteRecord};
use crate::error::SyncError;

#[derive(Deserialize)]
struct RecordList {
    data: Vec<RemoteRecord>,
}

#[derive(Serialize)]
struct PermissionsBody<'a> {
    permissions: &'a Permissions,
}

pub struct KintoClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl KintoClient {
    pub fn new(credentials: Credentials) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Request {
                url: String::new(),
                source: e,
            })?;
        info!(username = %credentials.username, "Initialized KintoClient");
        Ok(Self { http, credentials })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }

    /// Sends `request`, turning network failures and non-success statuses
    /// into errors.
    async fn send(
        &self,
        method: &'static str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<Response, SyncError> {
        let response = request.send().await.map_err(|e| {
            error!(method, url, error = ?e, "Request failed");
            SyncError::Request {
                url: url.to_string(),
                source: e,
            }
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(method, url, status = status.as_u16(), "Request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(method, url, status = status.as_u16(), %body, "Server returned an error status");
        Err(SyncError::Transport {
            method,
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn json_body<T: serde::de::DeserializeOwned>(
        url: &str,
        response: Response,
    ) -> Result<T, SyncError> {
        let bytes = response.bytes().await.map_err(|e| SyncError::Request {
            url: url.to_string(),
            source: e,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RecordStore for KintoClient {
    async fn fetch_records(
        &self,
        collection: &CollectionRef,
    ) -> Result<Vec<RemoteRecord>, SyncError> {
        let mut records = Vec::new();
        let mut next = Some(collection.records_url());

        while let Some(url) = next.take() {
            let response = self
                .send("GET", &url, self.request(Method::GET, &url))
                .await?;
            next = response
                .headers()
                .get("Next-Page")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let page: RecordList = Self::json_body(&url, response).await?;
            debug!(url = %url, count = page.data.len(), "Fetched page of records");
            records.extend(page.data);
        }

        info!(count = records.len(), collection = %collection.collection, "Fetched remote records");
        Ok(records)
    }

    async fn fetch_bucket(&self, collection: &CollectionRef) -> Result<Option<Bucket>, SyncError> {
        let url = collection.bucket_url();
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(|e| SyncError::Request {
                url: url.to_string(),
                source: e,
            })?;

        if !response.status().is_success() {
            info!(url, status = response.status().as_u16(), "Bucket not readable, treating as absent");
            return Ok(None);
        }
        let bucket: Bucket = Self::json_body(url, response).await?;
        Ok(Some(bucket))
    }

    async fn create_bucket(
        &self,
        collection: &CollectionRef,
        permissions: &Permissions,
    ) -> Result<(), SyncError> {
        let url = collection.bucket_url();
        let body = PermissionsBody { permissions };
        self.send("PUT", url, self.request(Method::PUT, url).json(&body))
            .await?;
        info!(bucket = %collection.bucket, "Bucket created");
        Ok(())
    }

    async fn patch_bucket_permissions(
        &self,
        collection: &CollectionRef,
        permissions: &Permissions,
    ) -> Result<(), SyncError> {
        let url = collection.bucket_url();
        let body = PermissionsBody { permissions };
        self.send("PATCH", url, self.request(Method::PATCH, url).json(&body))
            .await?;
        info!(bucket = %collection.bucket, "Bucket permissions updated");
        Ok(())
    }

    async fn create_collection(
        &self,
        collection: &CollectionRef,
        permissions: &Permissions,
    ) -> Result<Value, SyncError> {
        let url = collection.collections_url();
        let body = json!({
            "data": { "id": collection.collection },
            "permissions": permissions,
        });
        let response = self
            .send("POST", &url, self.request(Method::POST, &url).json(&body))
            .await?;
        Self::json_body(&url, response).await
    }

    async fn upload_attachment(
        &self,
        collection: &CollectionRef,
        upload: AttachmentUpload,
    ) -> Result<Value, SyncError> {
        let url = collection.attachment_url(&upload.record_id);
        let part = Part::bytes(upload.content)
            .file_name(upload.filename)
            .mime_str(&upload.mimetype)
            .map_err(|e| SyncError::Request {
                url: url.clone(),
                source: e,
            })?;
        let form = Form::new()
            .text("data", upload.data)
            .text("permissions", upload.permissions)
            .part("attachment", part);

        let response = self
            .send("POST", &url, self.request(Method::POST, &url).multipart(form))
            .await?;
        Self::json_body(&url, response).await
    }
}
