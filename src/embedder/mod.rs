//! C2: batched vector generation against an external embedding model
//! (§4.2). Grounded on the provider-trait pattern in
//! `uar::file_processing::provider::FileProcessor`: a narrow async trait
//! plus one or more implementations behind it.

mod fixed;
mod http;

pub use fixed::FixedEmbedder;
pub use http::{EmbedderHttpConfig, HttpEmbedder};

use async_trait::async_trait;

use crate::error::EmbedderError;

/// Contract: `embed(texts) -> one vector per text, length D each`.
/// Implementations are responsible for batching, retry/backoff, and
/// surfacing permanent failures per §4.2.
#[async_trait]
pub trait EmbedderClient: Send + Sync + std::fmt::Debug {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Dimension of the vectors this embedder produces.
    fn dimensions(&self) -> usize;
}
