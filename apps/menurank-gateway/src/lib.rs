//! # menurank-gateway
//!
//! Allowlisting proxy between the menurank server and the shop admin API.
//! Only entry ids, menu node ids, priorities, shop ids and tree ids pass.

pub mod allowlist;
pub mod config;
pub mod forward;
pub mod server;

pub use allowlist::{FieldViolation, Sanitized, sanitize};
pub use config::GatewayConfig;
pub use forward::{Forwarder, UpstreamRequest};
pub use server::{GatewayReport, GatewayState, create_router, run_server};
