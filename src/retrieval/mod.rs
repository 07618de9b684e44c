// Retrieval service
// The only path into the session store: ingestion and nearest-chunk lookup


use std::sync::Arc;
use tracing::{debug, info};

use crate::{DocQaError, Result};
use crate::config::{Config, RetrievalConfig};
use crate::documents::DocumentType;
use crate::embeddings::EmbeddingProvider;
use crate::embeddings::chunking::{ChunkingConfig, normalize_text, prepare_chunks};
use crate::store::{IndexEntry, SearchHit, SessionInfo, SessionStore, UserId};

/// Orchestrates normalize, chunk, embed and index for ingestion, and
/// normalize, embed and search for retrieval.
pub struct RetrievalService {
    store: SessionStore,
    embedder: Arc<dyn EmbeddingProvider>,
    chunking: ChunkingConfig,
    retrieval: RetrievalConfig,
}

impl RetrievalService {
    #[inline]
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        chunking: ChunkingConfig,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            embedder,
            chunking,
            retrieval,
        }
    }

    #[inline]
    pub fn from_config(embedder: Arc<dyn EmbeddingProvider>, config: &Config) -> Self {
        Self::new(embedder, config.chunking, config.retrieval)
    }

    /// Number of chunks returned by [`Self::retrieve_default`]
    #[inline]
    pub fn default_top_k(&self) -> usize {
        self.retrieval.top_k
    }

    /// Normalize, chunk and embed `raw_text`, then append it to the user's session.
    ///
    /// Never clears first: call [`Self::clear`] (or use
    /// [`Self::replace_document`]) when the text belongs to a new document. The
    /// whole batch is embedded before the store is touched, so a provider
    /// failure leaves the session as it was. Returns the number of chunks added.
    #[inline]
    pub fn ingest(
        &self,
        user_id: &UserId,
        raw_text: &str,
        doc_type: DocumentType,
    ) -> Result<usize> {
        let chunks = prepare_chunks(raw_text, &self.chunking);
        if chunks.is_empty() {
            info!("Document for user {} has no indexable text", user_id);
            return Ok(0);
        }

        debug!(
            "Embedding {} chunks for user {} ({} document)",
            chunks.len(),
            user_id,
            doc_type
        );

        let embeddings = self.embedder.embed(&chunks)?;
        if embeddings.len() != chunks.len() {
            return Err(DocQaError::EmbeddingUnavailable(format!(
                "expected {} vectors, provider returned {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let count = chunks.len();
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| IndexEntry { text, embedding })
            .collect();

        self.store.add(user_id, entries, doc_type)?;

        info!("Ingested {} chunks for user {}", count, user_id);
        Ok(count)
    }

    /// Clear the user's session, then ingest `raw_text` as its only document
    #[inline]
    pub fn replace_document(
        &self,
        user_id: &UserId,
        raw_text: &str,
        doc_type: DocumentType,
    ) -> Result<usize> {
        self.clear(user_id);
        self.ingest(user_id, raw_text, doc_type)
    }

    #[inline]
    pub fn clear(&self, user_id: &UserId) {
        self.store.clear(user_id);
    }

    /// Texts of the `k` chunks nearest to `query`, best first.
    ///
    /// Returns an empty list when the user has no session.
    #[inline]
    pub fn retrieve(&self, user_id: &UserId, query: &str, k: usize) -> Result<Vec<String>> {
        Ok(self
            .retrieve_with_scores(user_id, query, k)?
            .into_iter()
            .map(|hit| hit.text)
            .collect())
    }

    /// [`Self::retrieve`] with the configured `top_k`
    #[inline]
    pub fn retrieve_default(&self, user_id: &UserId, query: &str) -> Result<Vec<String>> {
        self.retrieve(user_id, query, self.retrieval.top_k)
    }

    #[inline]
    pub fn retrieve_with_scores(
        &self,
        user_id: &UserId,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        if !self.store.contains(user_id) {
            debug!("No document loaded for user {}", user_id);
            return Ok(Vec::new());
        }

        let query = normalize_text(query);
        let query_vector = self.embedder.embed_query(&query)?;
        let hits = self.store.search(user_id, &query_vector, k)?;

        debug!(
            "Retrieved {} chunks for user {} (k = {})",
            hits.len(),
            user_id,
            k
        );
        Ok(hits)
    }

    /// Every chunk of the user's document, in document order
    #[inline]
    pub fn get_chunks(&self, user_id: &UserId) -> Vec<String> {
        self.store.chunks(user_id)
    }

    #[inline]
    pub fn full_text(&self, user_id: &UserId) -> String {
        self.store.full_text(user_id)
    }

    #[inline]
    pub fn document_type(&self, user_id: &UserId) -> Option<DocumentType> {
        self.store.document_type(user_id)
    }

    #[inline]
    pub fn session_info(&self, user_id: &UserId) -> Option<SessionInfo> {
        self.store.session_info(user_id)
    }

    #[inline]
    pub fn has_document(&self, user_id: &UserId) -> bool {
        self.store.contains(user_id)
    }
}
