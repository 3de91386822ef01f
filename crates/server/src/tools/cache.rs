//! cache_invalidate tool implementation.
//!
//! Deletes cache entries of one kind by exact key, key prefix, or key list.
//! Keys are full cache keys, version token included (e.g. `v1:osm-123`).

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swingset_core::{CacheKind, Error};

use super::{Services, json_result};

/// Parameters for the cache_invalidate tool. Exactly one selector is required.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInvalidateParams {
    /// Cache to invalidate: "insights" or "images".
    pub kind: CacheKind,

    /// Delete this exact key.
    #[serde(default)]
    pub key: Option<String>,

    /// Delete every key starting with this prefix (e.g. "v1:" for a whole version).
    #[serde(default)]
    pub prefix: Option<String>,

    /// Delete each of these keys.
    #[serde(default)]
    pub keys: Option<Vec<String>>,
}

/// Output from the cache_invalidate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInvalidateOutput {
    /// Number of entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_invalidate tool.
pub async fn invalidate_impl(services: &Services, params: CacheInvalidateParams) -> Result<CallToolResult, McpError> {
    let cache = services.cache_for(params.kind);

    let deleted = match (params.key, params.prefix, params.keys) {
        (Some(key), None, None) => u64::from(cache.delete(&key).await?),
        (None, Some(prefix), None) => cache.delete_by_pattern(&prefix).await?,
        (None, None, Some(keys)) => cache.bulk_delete(&keys).await?,
        _ => {
            return Err(Error::InvalidInput("Exactly one of key, prefix, or keys must be specified".to_string()).into());
        }
    };

    tracing::info!(kind = params.kind.as_str(), deleted, "cache invalidated");
    json_result(&CacheInvalidateOutput { deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{decode, fixture};

    async fn seed(services: &Services, kind: CacheKind, keys: &[&str]) {
        for key in keys {
            services.cache_for(kind).set(key, &serde_json::json!({"name": key})).await;
        }
    }

    fn params(kind: CacheKind) -> CacheInvalidateParams {
        CacheInvalidateParams { kind, key: None, prefix: None, keys: None }
    }

    #[tokio::test]
    async fn test_invalidate_by_key() {
        let fx = fixture().await;
        seed(&fx.services, CacheKind::Insights, &["v1:a", "v1:b"]).await;

        let result = invalidate_impl(&fx.services, CacheInvalidateParams { key: Some("v1:a".into()), ..params(CacheKind::Insights) })
            .await
            .unwrap();
        let output: CacheInvalidateOutput = decode(&result);
        assert_eq!(output.deleted, 1);

        let missing = invalidate_impl(&fx.services, CacheInvalidateParams { key: Some("v1:a".into()), ..params(CacheKind::Insights) })
            .await
            .unwrap();
        assert_eq!(decode::<CacheInvalidateOutput>(&missing).deleted, 0);
    }

    #[tokio::test]
    async fn test_invalidate_by_prefix_respects_kind() {
        let fx = fixture().await;
        seed(&fx.services, CacheKind::Insights, &["v1:a", "v1:b", "v2:a"]).await;
        seed(&fx.services, CacheKind::Images, &["v1:a"]).await;

        let result = invalidate_impl(&fx.services, CacheInvalidateParams { prefix: Some("v1:".into()), ..params(CacheKind::Insights) })
            .await
            .unwrap();
        assert_eq!(decode::<CacheInvalidateOutput>(&result).deleted, 2);

        let remaining: Option<serde_json::Value> = fx.services.images_cache.get("v1:a").await;
        assert!(remaining.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_by_keys() {
        let fx = fixture().await;
        seed(&fx.services, CacheKind::Images, &["v1:a", "v1:b", "v1:c"]).await;

        let keys = vec!["v1:a".to_string(), "v1:c".to_string(), "v1:zzz".to_string()];
        let result = invalidate_impl(&fx.services, CacheInvalidateParams { keys: Some(keys), ..params(CacheKind::Images) })
            .await
            .unwrap();
        assert_eq!(decode::<CacheInvalidateOutput>(&result).deleted, 2);
    }

    #[tokio::test]
    async fn test_invalidate_requires_one_selector() {
        let fx = fixture().await;
        assert!(invalidate_impl(&fx.services, params(CacheKind::Insights)).await.is_err());

        let both = CacheInvalidateParams { key: Some("v1:a".into()), prefix: Some("v1:".into()), ..params(CacheKind::Insights) };
        let err = invalidate_impl(&fx.services, both).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_invalidate_empty_prefix_rejected() {
        let fx = fixture().await;
        let result = invalidate_impl(&fx.services, CacheInvalidateParams { prefix: Some(String::new()), ..params(CacheKind::Insights) }).await;
        assert!(result.is_err());
    }
}
