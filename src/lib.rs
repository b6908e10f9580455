//! Multi-lane vector embeddings and semantic search for a content catalog.
//!
//! Every catalog record is projected into four texts, called lanes, and each
//! lane gets its own embedding vector:
//!
//! | Lane | Source |
//! |------|--------|
//! | **title** | the record title |
//! | **description** | the record description |
//! | **content** | code snippets, their explanations, key concepts, htmx attributes and the demo explanation, composed into headed sections |
//! | **key_concepts** | the key concept list |
//!
//! Searches rank records against one lane, or against all lanes combined with
//! fixed weights, with optional category and complexity filters.
//!
//! # Architecture
//!
//! - **Storage**: SQLite, with vectors stored as float32 blobs and scored by
//!   [sqlite-vec](https://github.com/asg017/sqlite-vec)'s cosine distance
//! - **Embeddings**: remote HTTP models (Gemini `embedContent` by default, or any
//!   OpenAI-compatible `/v1/embeddings` endpoint). Document and query texts
//!   are embedded with different task intents.
//! - **Pipeline**: sequential and paced. Lanes that already hold vectors are
//!   skipped, and results are committed in atomic batches.
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and vector-dimension changes
//! - [`embedding`]: the embedding provider trait and its HTTP implementations
//! - [`catalog`]: records, lane normalization, the embedding pipeline, and search
//! - [`error`]: the error kinds shared by every component

pub mod catalog;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
