//! Firestore REST adapter for the comments collection.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::application::repos::{CommentsRepo, RepoError};
use crate::config::FirestoreSettings;
use crate::domain::comments::Comment;
use crate::infra::error::InfraError;
use crate::infra::relay::user_agent;

const SOURCE: &str = "visuopost::store::firestore";

#[derive(Clone, Debug)]
pub struct FirestoreComments {
    client: Client,
    run_query_url: Url,
    collection_url: Url,
    collection: String,
}

impl FirestoreComments {
    pub fn new(settings: &FirestoreSettings, collection: &str) -> Result<Self, InfraError> {
        let documents = format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            settings.base_url.as_str().trim_end_matches('/'),
            settings.project_id
        );

        let mut run_query_url = parse_endpoint(&format!("{documents}:runQuery"))?;
        let mut collection_url = parse_endpoint(&format!("{documents}/{collection}"))?;
        if let Some(key) = settings.api_key.as_deref() {
            run_query_url.query_pairs_mut().append_pair("key", key);
            collection_url.query_pairs_mut().append_pair("key", key);
        }

        let client = Client::builder()
            .user_agent(user_agent())
            .build()
            .map_err(|err| InfraError::configuration(format!("firestore http client: {err}")))?;

        Ok(Self {
            client,
            run_query_url,
            collection_url,
            collection: collection.to_string(),
        })
    }

    fn list_query(&self, post_id: &str) -> serde_json::Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "postId" },
                        "op": "EQUAL",
                        "value": { "stringValue": post_id }
                    }
                }
            }
        })
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, InfraError> {
    Url::parse(raw)
        .map_err(|err| InfraError::configuration(format!("invalid firestore url `{raw}`: {err}")))
}

/// Request URLs carry the API key, so they are dropped from transport errors.
fn transport_error(err: reqwest::Error) -> RepoError {
    RepoError::from_persistence(err.without_url())
}

async fn ensure_success(response: Response) -> Result<Response, RepoError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(RepoError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CommentsRepo for FirestoreComments {
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, RepoError> {
        let response = self
            .client
            .post(self.run_query_url.clone())
            .json(&self.list_query(post_id))
            .send()
            .await
            .map_err(transport_error)?;

        let bytes = ensure_success(response)
            .await?
            .bytes()
            .await
            .map_err(transport_error)?;

        let entries: Vec<QueryEntry> = serde_json::from_slice(&bytes)
            .map_err(|err| RepoError::protocol(format!("runQuery response: {err}")))?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| entry.document)
            .filter_map(|document| {
                let name = document.name.clone();
                let comment = document.into_comment();
                if comment.is_none() {
                    warn!(
                        target = SOURCE,
                        document = name.as_deref().unwrap_or("unknown"),
                        "skipping comment document with missing fields"
                    );
                }
                comment
            })
            .collect())
    }

    async fn append_comment(&self, comment: &Comment) -> Result<(), RepoError> {
        let response = self
            .client
            .post(self.collection_url.clone())
            .json(&WriteDocument::from_comment(comment))
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct QueryEntry {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    fields: HashMap<String, FieldValue>,
}

impl Document {
    fn into_comment(mut self) -> Option<Comment> {
        Some(Comment {
            post_id: self.take_text("postId")?,
            name: self.take_text("name")?,
            text: self.take_text("text")?,
            date: self.take_text("date").unwrap_or_default(),
        })
    }

    fn take_text(&mut self, field: &str) -> Option<String> {
        self.fields.remove(field).and_then(FieldValue::into_text)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp_value: Option<String>,
}

impl FieldValue {
    fn string(value: &str) -> Self {
        Self {
            string_value: Some(value.to_string()),
            timestamp_value: None,
        }
    }

    fn into_text(self) -> Option<String> {
        self.string_value.or(self.timestamp_value)
    }
}

#[derive(Debug, Serialize)]
struct WriteDocument {
    fields: HashMap<&'static str, FieldValue>,
}

impl WriteDocument {
    fn from_comment(comment: &Comment) -> Self {
        let fields = HashMap::from([
            ("postId", FieldValue::string(&comment.post_id)),
            ("name", FieldValue::string(&comment.name)),
            ("text", FieldValue::string(&comment.text)),
            ("date", FieldValue::string(&comment.date)),
        ]);
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key: Option<&str>) -> FirestoreSettings {
        FirestoreSettings {
            base_url: Url::parse("https://firestore.googleapis.com").expect("url"),
            project_id: "visuopost".to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    #[test]
    fn endpoints_carry_project_collection_and_key() {
        let repo = FirestoreComments::new(&settings(Some("k-1")), "comments").expect("repo");
        assert_eq!(
            repo.run_query_url.as_str(),
            "https://firestore.googleapis.com/v1/projects/visuopost/databases/(default)/documents:runQuery?key=k-1"
        );
        assert_eq!(
            repo.collection_url.as_str(),
            "https://firestore.googleapis.com/v1/projects/visuopost/databases/(default)/documents/comments?key=k-1"
        );

        let keyless = FirestoreComments::new(&settings(None), "comments").expect("repo");
        assert!(keyless.collection_url.query().is_none());
    }

    #[test]
    fn list_query_filters_on_post_id() {
        let repo = FirestoreComments::new(&settings(None), "comments").expect("repo");
        let query = repo.list_query("post-2");
        assert_eq!(
            query["structuredQuery"]["from"][0]["collectionId"],
            "comments"
        );
        let filter = &query["structuredQuery"]["where"]["fieldFilter"];
        assert_eq!(filter["field"]["fieldPath"], "postId");
        assert_eq!(filter["op"], "EQUAL");
        assert_eq!(filter["value"]["stringValue"], "post-2");
    }

    #[test]
    fn write_document_uses_string_fields() {
        let comment = Comment {
            post_id: "post-1".to_string(),
            name: "Alice".to_string(),
            text: "Great post!".to_string(),
            date: "2025-04-17T10:00:00.000Z".to_string(),
        };
        let value = serde_json::to_value(WriteDocument::from_comment(&comment)).expect("json");
        assert_eq!(
            value,
            json!({
                "fields": {
                    "postId": { "stringValue": "post-1" },
                    "name": { "stringValue": "Alice" },
                    "text": { "stringValue": "Great post!" },
                    "date": { "stringValue": "2025-04-17T10:00:00.000Z" }
                }
            })
        );
    }

    #[test]
    fn query_entries_decode_documents_and_read_time_only_rows() {
        let body = json!([
            {
                "document": {
                    "name": "projects/visuopost/databases/(default)/documents/comments/a",
                    "fields": {
                        "postId": { "stringValue": "post-1" },
                        "name": { "stringValue": "Alice" },
                        "text": { "stringValue": "Great post!" },
                        "date": { "timestampValue": "2025-04-17T10:00:00Z" }
                    }
                },
                "readTime": "2025-04-17T10:00:01Z"
            },
            {
                "document": {
                    "name": "projects/visuopost/databases/(default)/documents/comments/b",
                    "fields": { "postId": { "stringValue": "post-1" } }
                }
            },
            { "readTime": "2025-04-17T10:00:01Z" }
        ]);

        let entries: Vec<QueryEntry> = serde_json::from_value(body).expect("decode");
        let comments: Vec<_> = entries
            .into_iter()
            .filter_map(|entry| entry.document)
            .filter_map(Document::into_comment)
            .collect();

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].name, "Alice");
        assert_eq!(comments[0].date, "2025-04-17T10:00:00Z");
    }
}
