//! # Merger Dashboard
//!
//! Terminal console for the merger-integration platform.
//!
//! The platform merges the books of three firms (ZZZ Accounting, AAA
//! Accounting, BBB Construction) behind one REST backend: a document index
//! with retrieval-augmented question answering, a unified client database,
//! and a health endpoint covering the vector store, the LLM host, the cache,
//! and the warehouse. This crate is the operator-facing client for that
//! backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌─────────────┐   ┌──────────┐
//! │  mdash   │──▶│ page state   │──▶│  Backend    │──▶│ REST API │
//! │ CLI/shell│   │ Request<T>   │   │ (ApiClient) │   │ :5001    │
//! └──────────┘   └──────┬───────┘   └─────────────┘   └──────────┘
//!                       ▼
//!                  ┌──────────┐
//!                  │  render  │──▶ stdout
//!                  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! mdash dashboard --watch        # status cards, health refreshed every 30s
//! mdash clients "acme"           # search the merged client database
//! mdash ask "What are the payment terms for clients?"
//! mdash shell                    # interactive session
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | Tracing subscriber setup |
//! | [`models`] | Backend request/response types |
//! | [`api`] | HTTP client and the [`api::Backend`] trait |
//! | [`request`] | Async request-state container |
//! | [`poll`] | Cancellable repeating timer |
//! | [`chat`] | Knowledge-base transcript |
//! | [`search`] | Client search |
//! | [`dashboard`] | Health and index status |
//! | [`docs`] | Document search, stats, and ingest |
//! | [`reports`] | Reports catalog |
//! | [`nav`] | Pages and sidebar |
//! | [`render`] | Text rendering |
//! | [`shell`] | Interactive shell |

pub mod api;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod docs;
pub mod logging;
pub mod models;
pub mod nav;
pub mod poll;
pub mod render;
pub mod reports;
pub mod request;
pub mod search;
pub mod shell;
