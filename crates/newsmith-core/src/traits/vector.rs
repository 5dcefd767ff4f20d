// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector-store port: two named collections with metadata filters.
//!
//! The filter language is deliberately minimal: equality on metadata keys
//! plus the literal `$gte` operator on `published_at`. Anything else is
//! rejected at construction rather than silently ignored.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::NewsmithError;
use crate::traits::CallOptions;

/// The two collections the pipeline writes to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Articles,
    Videos,
}

/// One item stored in a collection: id, display document, reconstruction
/// metadata, and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub document: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub embedding: Vec<f32>,
}

/// One similarity-search hit. `similarity = max(0, 1 - distance)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityHit {
    pub id: String,
    pub document: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub similarity: f32,
    pub distance: f32,
}

/// Converts a raw distance into the similarity reported to callers.
pub fn similarity_from_distance(distance: f32) -> f32 {
    (1.0 - distance).max(0.0)
}

/// Metadata filter for similarity queries: equality clauses and an
/// optional recency bound on `published_at`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub equals: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_after: Option<DateTime<Utc>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.equals.insert(key.into(), value.into());
        self
    }

    pub fn published_after(mut self, cutoff: DateTime<Utc>) -> Self {
        self.published_after = Some(cutoff);
        self
    }

    /// Parses the wire form (`{"key": value, "published_at": {"$gte": ts}}`).
    /// Unknown `$` operators and `$gte` on any key other than
    /// `published_at` are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, NewsmithError> {
        let object = value.as_object().ok_or_else(|| {
            NewsmithError::validation("FILTER_NOT_OBJECT", "filter must be a JSON object")
        })?;

        let mut filter = Filter::new();
        for (key, clause) in object {
            match clause.as_object() {
                Some(ops) => {
                    for (op, operand) in ops {
                        if op != "$gte" {
                            return Err(NewsmithError::validation(
                                "FILTER_UNKNOWN_OPERATOR",
                                format!("unsupported filter operator {op:?}"),
                            ));
                        }
                        if key != "published_at" {
                            return Err(NewsmithError::validation(
                                "FILTER_GTE_UNSUPPORTED_KEY",
                                format!("$gte is only supported on published_at, got {key:?}"),
                            ));
                        }
                        let raw = operand.as_str().ok_or_else(|| {
                            NewsmithError::validation(
                                "FILTER_GTE_NOT_TIMESTAMP",
                                "$gte operand must be an RFC 3339 timestamp",
                            )
                        })?;
                        let cutoff = DateTime::parse_from_rfc3339(raw)
                            .map_err(|e| {
                                NewsmithError::validation(
                                    "FILTER_GTE_NOT_TIMESTAMP",
                                    format!("$gte operand is not RFC 3339: {e}"),
                                )
                            })?
                            .with_timezone(&Utc);
                        filter.published_after = Some(cutoff);
                    }
                }
                None => {
                    filter.equals.insert(key.clone(), clause.clone());
                }
            }
        }
        Ok(filter)
    }

    /// Whether a record's metadata satisfies this filter. Used by in-memory
    /// implementations; remote stores translate the filter natively.
    pub fn matches(&self, metadata: &BTreeMap<String, serde_json::Value>) -> bool {
        for (key, expected) in &self.equals {
            if metadata.get(key) != Some(expected) {
                return false;
            }
        }
        if let Some(cutoff) = self.published_after {
            let published = metadata
                .get("published_at")
                .and_then(|v| v.as_str())
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc));
            match published {
                Some(ts) if ts >= cutoff => {}
                _ => return false,
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty() && self.published_after.is_none()
    }
}

/// Port to the vector store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Stores records into a collection. Callers guarantee the record set
    /// is non-empty and each record carries a non-empty embedding.
    async fn store(
        &self,
        collection: Collection,
        records: Vec<VectorRecord>,
        opts: &CallOptions,
    ) -> Result<(), NewsmithError>;

    /// Returns the `top_k` nearest records, most similar first.
    async fn query_similar(
        &self,
        collection: Collection,
        embedding: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
        opts: &CallOptions,
    ) -> Result<Vec<SimilarityHit>, NewsmithError>;

    /// Deletes records by id. Unknown ids are ignored.
    async fn delete(
        &self,
        collection: Collection,
        ids: &[String],
        opts: &CallOptions,
    ) -> Result<(), NewsmithError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn similarity_is_clamped_at_zero() {
        assert_eq!(similarity_from_distance(0.25), 0.75);
        assert_eq!(similarity_from_distance(1.6), 0.0);
    }

    #[test]
    fn filter_parses_equality_and_gte() {
        let filter = Filter::from_json(&json!({
            "category": "business",
            "published_at": {"$gte": "2026-08-01T00:00:00Z"}
        }))
        .unwrap();
        assert_eq!(filter.equals.get("category"), Some(&json!("business")));
        assert!(filter.published_after.is_some());
    }

    #[test]
    fn filter_rejects_unknown_operator() {
        let err = Filter::from_json(&json!({"views": {"$lt": 5}})).unwrap_err();
        assert_eq!(err.code, "FILTER_UNKNOWN_OPERATOR");
    }

    #[test]
    fn filter_rejects_gte_on_other_keys() {
        let err =
            Filter::from_json(&json!({"views": {"$gte": "2026-08-01T00:00:00Z"}})).unwrap_err();
        assert_eq!(err.code, "FILTER_GTE_UNSUPPORTED_KEY");
    }

    #[test]
    fn filter_matches_metadata() {
        let filter = Filter::new()
            .eq("category", "business")
            .published_after("2026-08-01T00:00:00Z".parse().unwrap());

        let mut metadata = BTreeMap::new();
        metadata.insert("category".to_string(), json!("business"));
        metadata.insert("published_at".to_string(), json!("2026-08-02T01:00:00Z"));
        assert!(filter.matches(&metadata));

        metadata.insert("published_at".to_string(), json!("2026-07-01T00:00:00Z"));
        assert!(!filter.matches(&metadata));

        metadata.remove("published_at");
        assert!(!filter.matches(&metadata));
    }

    #[test]
    fn collection_names_are_wire_stable() {
        assert_eq!(Collection::Articles.to_string(), "articles");
        assert_eq!(Collection::Videos.to_string(), "videos");
    }
}
