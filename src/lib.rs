//! # dossier
//!
//! A person-scoped document management service: uploaded files are stored
//! on disk under one directory per person, cataloged in SQLite, and (when
//! an external summarization API is configured) described automatically
//! from their extracted text.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────────┐   ┌──────────┐
//! │  Upload  │──▶│ Extract ─▶ Summarize  │──▶│  SQLite   │
//! │ (HTTP)   │   │  (PDF / OCR / skip)   │   │ catalog   │
//! └──────────┘   └───────────────────────┘   └────┬─────┘
//!                                                 │
//!                             ┌───────────────────┤
//!                             ▼                   ▼
//!                        ┌──────────┐       ┌──────────┐
//!                        │   CLI    │       │   HTTP   │
//!                        │(dossier) │       │  (JSON)  │
//!                        └──────────┘       └──────────┘
//! ```
//!
//! Every description failure is absorbed into placeholder text; an upload
//! succeeds whether or not extraction or the external service cooperate.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`storage`] | On-disk upload layout |
//! | [`extract`] | PDF and OCR text extraction |
//! | [`summarize`] | External summarization client |
//! | [`describe`] | The description pipeline |
//! | [`catalog`] | Row operations and delete semantics |
//! | [`search`] | Listing and search projection |
//! | [`ingest`] | Upload orchestration |
//! | [`server`] | JSON HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod catalog;
pub mod config;
pub mod db;
pub mod describe;
pub mod extract;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod search;
pub mod server;
pub mod storage;
pub mod summarize;
