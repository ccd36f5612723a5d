//! sheetstage - Pure-Rust XLSX ingestion of movie watch-lists into a document store
//!
//! This crate reads the first worksheet of an Excel package (XLSX), maps each
//! data row onto a fixed column contract, keeps the rows that carry an id and a
//! positive movie id, and upserts the resulting batch into a document store.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("movies.xlsx")?;
//!
//!     // Parse the first worksheet into a batch of movie records
//!     let movies = sheetstage::parse_movies(&bytes)?;
//!
//!     for movie in &movies {
//!         println!("{} ({})", movie.id, movie.movie_id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # End-to-end Ingest
//!
//! ```rust,no_run
//! use sheetstage::{BlobLocator, FsBlobStore, IngestBuilder, InMemoryDocumentStore};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Container and database names come from the environment
//!     let ingestor = IngestBuilder::from_env()?.build()?;
//!
//!     let blobs = FsBlobStore::new("/var/blobs");
//!     let documents = InMemoryDocumentStore::new();
//!
//!     let outcome = ingestor.ingest(
//!         &blobs,
//!         &documents,
//!         &BlobLocator::Name("movies.xlsx".to_string()),
//!     )?;
//!     println!("{} movies, all upserted: {}", outcome.stats.accepted, outcome.upserted_all);
//!     Ok(())
//! }
//! ```
//!
//! # Column Contract
//!
//! | Column | Field | Rule |
//! |--------|-------|------|
//! | A | `id` | required, non-blank |
//! | B | `movieId` | integer, required > 0 |
//! | C | `title` | as-is |
//! | D | `rating` | as-is |
//! | E | `review` | as-is |
//! | F | `year` | integer, kept only if > 0 |
//!
//! Row 1 is the header and is always skipped.

mod api;
mod assembler;
mod builder;
mod decoder;
mod error;
mod mapper;
mod parser;
mod security;
mod store;
mod types;

// 公開API
pub use api::{BlobLocator, IngestOutcome};
pub use assembler::BatchStats;
pub use builder::{
    parse_movies, parse_movies_with_stats, IngestBuilder, Ingestor, ENV_DATABASE,
    ENV_MOVIES_CONTAINER, ENV_UPLOADS_CONTAINER,
};
pub use error::IngestError;
pub use parser::Workbook;
pub use store::{
    upsert_batch, BlobStore, DocumentStore, FsBlobStore, InMemoryBlobStore, InMemoryDocumentStore,
};
pub use types::MovieRecord;
