//! # menurank
//!
//! HTTP session server and CLI around `menurank-core`.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  apps/menurank (THE BINARY)              │
//! │                                                          │
//! │  ┌───────────┐   ┌────────────┐   ┌──────────────────┐   │
//! │  │   CLI     │   │  HTTP API  │   │  Source/Gateway  │   │
//! │  │  (clap)   │   │  (axum)    │   │  (reqwest)       │   │
//! │  └─────┬─────┘   └─────┬──────┘   └────────┬─────────┘   │
//! │        └───────────────┼───────────────────┘             │
//! │                        ▼                                 │
//! │                ┌───────────────┐                         │
//! │                │ menurank-core │                         │
//! │                └───────────────┘                         │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
