//! Cloud document store over the Firestore REST API
//!
//! Layout: `users/{uid}/workouts/{id}` and `users/{uid}/progress/{id}`. Each
//! document holds the JSON of one record in a single `payload` string field;
//! creation order comes from the server's `createTime`.

use super::{Collection, Document, StoreError, StoreResult, UserScope, WorkoutStore};
use crate::config::CloudConfig;
use appfitness_shared::{ProgressEntry, WorkoutRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const PAYLOAD_FIELD: &str = "payload";
const PAGE_SIZE: &str = "300";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteDocument {
    #[serde(default)]
    fields: HashMap<String, RemoteValue>,
    create_time: Option<DateTime<Utc>>,
    // passed back verbatim as a write precondition
    update_time: Option<String>,
}

#[derive(Debug, Serialize)]
struct WriteDocument {
    fields: HashMap<&'static str, RemoteValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RemoteDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    error: RemoteErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorDetail {
    #[serde(default)]
    message: String,
}

impl RemoteDocument {
    fn into_document<D: Document>(self) -> StoreResult<D> {
        let payload = self
            .fields
            .get(PAYLOAD_FIELD)
            .and_then(|v| v.string_value.as_deref())
            .ok_or_else(|| StoreError::Remote {
                status: 200,
                message: "document has no payload field".to_string(),
            })?;
        let mut doc: D = serde_json::from_str(payload)?;
        doc.set_created_at(self.create_time);
        Ok(doc)
    }
}

impl WriteDocument {
    fn from_document<D: Document>(doc: &D) -> StoreResult<Self> {
        let mut body = doc.clone();
        body.set_created_at(None);
        let mut fields = HashMap::new();
        fields.insert(
            PAYLOAD_FIELD,
            RemoteValue {
                string_value: Some(serde_json::to_string(&body)?),
            },
        );
        Ok(Self { fields })
    }
}

/// Store backed by a remote Firestore database
#[derive(Clone)]
pub struct CloudStore {
    client: Client,
    documents_url: String,
    api_key: SecretString,
}

impl CloudStore {
    pub fn new(config: &CloudConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                config.base_url.trim_end_matches('/'),
                config.project_id
            ),
            api_key: config.api_key.clone(),
        })
    }

    fn collection_url(&self, collection: Collection, scope: &UserScope) -> String {
        format!("{}/users/{}/{}", self.documents_url, scope.user_id, collection)
    }

    fn document_url(&self, collection: Collection, scope: &UserScope, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection, scope), id)
    }

    fn request(&self, method: Method, url: &str, scope: &UserScope) -> RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(token) = &scope.id_token {
            request = request.bearer_auth(token.expose_secret());
        }
        let key = self.api_key.expose_secret();
        if !key.is_empty() {
            request = request.query(&[("key", key.as_str())]);
        }
        request
    }

    async fn list<D: Document>(&self, scope: &UserScope) -> StoreResult<Vec<D>> {
        let url = self.collection_url(D::COLLECTION, scope);
        let mut remote = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .request(Method::GET, &url, scope)
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ListResponse = check(request.send().await?).await?.json().await?;
            remote.extend(page.documents);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        let mut docs = remote
            .into_iter()
            .map(RemoteDocument::into_document)
            .collect::<StoreResult<Vec<D>>>()?;
        docs.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        debug!(collection = %D::COLLECTION, count = docs.len(), "Listed remote documents");
        Ok(docs)
    }

    async fn create<D: Document>(&self, scope: &UserScope, doc: &D) -> StoreResult<D> {
        let url = self.collection_url(D::COLLECTION, scope);
        let response = self
            .request(Method::POST, &url, scope)
            .query(&[("documentId", doc.id())])
            .json(&WriteDocument::from_document(doc)?)
            .send()
            .await?;

        let created: RemoteDocument = check(response).await?.json().await?;
        created.into_document()
    }

    async fn delete(&self, collection: Collection, scope: &UserScope, id: &str) -> StoreResult<bool> {
        let url = self.document_url(collection, scope, id);
        let response = self
            .request(Method::DELETE, &url, scope)
            .query(&[("currentDocument.exists", "true")])
            .send()
            .await?;

        match check(response).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Map a non-success response to a store error
async fn check(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<RemoteErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => status.canonical_reason().unwrap_or_default().to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            warn!(status = status.as_u16(), "Remote store rejected credentials");
            Err(StoreError::Unauthorized)
        }
        StatusCode::NOT_FOUND => Err(StoreError::NotFound(message)),
        StatusCode::CONFLICT => Err(StoreError::AlreadyExists(message)),
        _ => Err(StoreError::Remote {
            status: status.as_u16(),
            message,
        }),
    }
}

#[async_trait]
impl WorkoutStore for CloudStore {
    async fn list_workouts(&self, scope: &UserScope) -> StoreResult<Vec<WorkoutRecord>> {
        self.list(scope).await
    }

    async fn add_workout(
        &self,
        scope: &UserScope,
        record: &WorkoutRecord,
    ) -> StoreResult<WorkoutRecord> {
        self.create(scope, record).await
    }

    async fn delete_workout(&self, scope: &UserScope, id: &str) -> StoreResult<bool> {
        self.delete(Collection::Workouts, scope, id).await
    }

    async fn list_progress(&self, scope: &UserScope) -> StoreResult<Vec<ProgressEntry>> {
        self.list(scope).await
    }

    async fn add_progress(
        &self,
        scope: &UserScope,
        entry: &ProgressEntry,
    ) -> StoreResult<ProgressEntry> {
        self.create(scope, entry).await
    }

    async fn delete_progress(&self, scope: &UserScope, id: &str) -> StoreResult<bool> {
        self.delete(Collection::Progress, scope, id).await
    }

    /// Read-modify-write guarded by the document's update time, so a
    /// concurrent change makes this write fail instead of being lost.
    async fn update_progress_photos(
        &self,
        scope: &UserScope,
        id: &str,
        photos: &[String],
    ) -> StoreResult<ProgressEntry> {
        let url = self.document_url(Collection::Progress, scope, id);

        let current: RemoteDocument = check(self.request(Method::GET, &url, scope).send().await?)
            .await?
            .json()
            .await?;
        let update_time = current.update_time.clone();
        let mut entry: ProgressEntry = current.into_document()?;
        entry.photos = photos.to_vec();

        let mut request = self
            .request(Method::PATCH, &url, scope)
            .query(&[("updateMask.fieldPaths", PAYLOAD_FIELD)]);
        if let Some(update_time) = &update_time {
            request = request.query(&[("currentDocument.updateTime", update_time.as_str())]);
        }

        let updated: RemoteDocument = check(
            request
                .json(&WriteDocument::from_document(&entry)?)
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;

        let mut stored: ProgressEntry = updated.into_document()?;
        if stored.created_at.is_none() {
            stored.created_at = entry.created_at;
        }
        Ok(stored)
    }
}
