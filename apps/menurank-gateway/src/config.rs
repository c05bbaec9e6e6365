//! # Gateway Configuration
//!
//! Read from the environment:
//! - `MENURANK_GATEWAY_UPSTREAM`: admin API base, e.g. `https://shop.example/api/admin/v5`
//! - `MENURANK_GATEWAY_UPSTREAM_KEY`: key used when a request carries no `x-api-key`
//! - `MENURANK_GATEWAY_DRY_RUN`: `1`/`true` logs batches instead of forwarding
//! - `MENURANK_GATEWAY_TIMEOUT_SECS`: upstream timeout (default 60)

use menurank_core::MenuRankError;

/// Default upstream timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub upstream: Option<String>,
    pub upstream_key: Option<String>,
    pub dry_run: bool,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            upstream: None,
            upstream_key: None,
            dry_run: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, MenuRankError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MenuRankError> {
        let lookup = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let dry_run = match lookup("MENURANK_GATEWAY_DRY_RUN").as_deref() {
            None | Some("0" | "false" | "no") => false,
            Some("1" | "true" | "yes") => true,
            Some(other) => {
                return Err(MenuRankError::Config(format!(
                    "MENURANK_GATEWAY_DRY_RUN must be true or false, got '{}'",
                    other
                )));
            }
        };

        let timeout_secs = match lookup("MENURANK_GATEWAY_TIMEOUT_SECS") {
            Some(v) => v.parse().map_err(|_| {
                MenuRankError::Config(format!("Invalid MENURANK_GATEWAY_TIMEOUT_SECS '{}'", v))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            upstream: lookup("MENURANK_GATEWAY_UPSTREAM").map(|u| u.trim_end_matches('/').to_string()),
            upstream_key: lookup("MENURANK_GATEWAY_UPSTREAM_KEY"),
            dry_run,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// An upstream is required unless running dry.
    pub fn validate(&self) -> Result<(), MenuRankError> {
        if self.upstream.is_none() && !self.dry_run {
            return Err(MenuRankError::Config(
                "MENURANK_GATEWAY_UPSTREAM is required unless MENURANK_GATEWAY_DRY_RUN is set"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
