//! # Upstream Forwarding
//!
//! Translates a sanitized batch to the admin API's product-priority call:
//!
//! ```json
//! {"params":{"products":[{"productId":5235,"productPriorityInMenuNodes":[
//!   {"productMenuNodeId":440,"productPriority":10,"shopId":1,"productMenuTreeId":1}]}]}}
//! ```
//!
//! sent as `PUT {upstream}/products/products` with `Authorization: Basic <key>`.

use crate::config::GatewayConfig;
use menurank_core::{MenuRankError, PriorityUpdateBatch};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Path of the priority update call under the upstream base.
pub const PRODUCTS_PATH: &str = "/products/products";

// =============================================================================
// UPSTREAM SHAPE
// =============================================================================

/// Upstream product id; numeric ids are sent as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProductId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNodePriority {
    pub product_menu_node_id: u64,
    pub product_priority: i64,
    pub shop_id: u32,
    pub product_menu_tree_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPriorities {
    pub product_id: ProductId,
    pub product_priority_in_menu_nodes: Vec<MenuNodePriority>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamParams {
    pub products: Vec<ProductPriorities>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamRequest {
    pub params: UpstreamParams,
}

impl From<&PriorityUpdateBatch> for UpstreamRequest {
    fn from(batch: &PriorityUpdateBatch) -> Self {
        let products = batch
            .updates
            .iter()
            .map(|update| ProductPriorities {
                product_id: match update.entry_id.as_number() {
                    Some(n) => ProductId::Number(n),
                    None => ProductId::Text(update.entry_id.to_string()),
                },
                product_priority_in_menu_nodes: update
                    .category_assignments
                    .iter()
                    .map(|a| MenuNodePriority {
                        product_menu_node_id: a.node_id,
                        product_priority: a.priority,
                        shop_id: a.shop_id,
                        product_menu_tree_id: a.tree_id,
                    })
                    .collect(),
            })
            .collect();

        Self {
            params: UpstreamParams { products },
        }
    }
}

// =============================================================================
// FORWARDER
// =============================================================================

/// What happened upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardOutcome {
    /// `None` when nothing was sent (dry run).
    pub status: Option<u16>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct Forwarder {
    http: reqwest::Client,
    upstream: Option<String>,
    dry_run: bool,
}

impl Forwarder {
    pub fn new(config: &GatewayConfig) -> Result<Self, MenuRankError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MenuRankError::Config(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            upstream: config.upstream.clone(),
            dry_run: config.dry_run,
        })
    }

    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Send `request` upstream, authenticating with `key`.
    ///
    /// Non-2xx responses and network failures are `Transport` errors.
    pub async fn forward(&self, request: &UpstreamRequest, key: &str) -> Result<ForwardOutcome, MenuRankError> {
        if self.dry_run {
            let body = serde_json::to_string(request).unwrap_or_default();
            tracing::info!(products = request.params.products.len(), %body, "Dry run: not forwarding");
            return Ok(ForwardOutcome {
                status: None,
                body: None,
            });
        }

        let upstream = self
            .upstream
            .as_deref()
            .ok_or_else(|| MenuRankError::Config("No upstream configured".to_string()))?;
        let url = format!("{}{}", upstream, PRODUCTS_PATH);

        tracing::info!(products = request.params.products.len(), "Forwarding to {}", url);
        let resp = self
            .http
            .put(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", key))
            .json(request)
            .send()
            .await
            .map_err(|e| MenuRankError::Transport(format!("{}: {}", url, e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| MenuRankError::Transport(format!("Reading upstream response: {}", e)))?;

        match status.as_u16() {
            401 | 403 => tracing::error!(status = status.as_u16(), "Upstream rejected the API key"),
            404 => tracing::error!("Upstream endpoint not found: {}", url),
            400 => tracing::error!(body = %text, "Upstream rejected the payload"),
            _ => {}
        }

        if !status.is_success() {
            return Err(MenuRankError::Transport(format!(
                "Upstream returned {}: {}",
                status.as_u16(),
                text
            )));
        }

        Ok(ForwardOutcome {
            status: Some(status.as_u16()),
            body: serde_json::from_str(&text).ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menurank_core::{CategoryAssignmentUpdate, EntryId, PriorityUpdate};
    use serde_json::json;

    #[test]
    fn batch_translates_to_upstream_shape() {
        let batch = PriorityUpdateBatch {
            updates: vec![
                PriorityUpdate {
                    entry_id: EntryId::from("5235"),
                    category_assignments: vec![CategoryAssignmentUpdate {
                        node_id: 440,
                        priority: 10,
                        shop_id: 1,
                        tree_id: 2,
                    }],
                },
                PriorityUpdate {
                    entry_id: EntryId::from("A-7"),
                    category_assignments: Vec::new(),
                },
            ],
        };

        let request = UpstreamRequest::from(&batch);
        assert_eq!(
            serde_json::to_value(&request).expect("serialize"),
            json!({
                "params": { "products": [
                    { "productId": 5235, "productPriorityInMenuNodes": [
                        { "productMenuNodeId": 440, "productPriority": 10, "shopId": 1, "productMenuTreeId": 2 }
                    ]},
                    { "productId": "A-7", "productPriorityInMenuNodes": [] }
                ]}
            })
        );
    }
}
