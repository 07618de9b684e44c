
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info};

use super::{IndexEntry, SearchHit, SessionInfo, UserId, UserSession, l2_distance};
use crate::documents::DocumentType;
use crate::{DocQaError, Result};

/// Registry of per-user sessions.
///
/// Sessions are immutable snapshots behind `Arc`. Searches clone the snapshot
/// under a short read lock and score it without holding any lock. `add` and
/// `clear` are the only mutators: they serialize on a per-user writer lock,
/// build the next session outside the map lock, and only swap the `Arc` under
/// the write guard, so a reader sees either the whole old session or the whole
/// new one and writers for different users never wait on each other's copies.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, Arc<UserSession>>>,
    // Entries are never removed, so two writers for one user always share a lock.
    writers: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl SessionStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append chunk/embedding pairs to a user's session, creating it if needed.
    ///
    /// The batch is validated before anything is written: every vector must be
    /// non-empty and share the width of the existing session (or of the first
    /// vector, for a new session). An empty batch changes nothing.
    #[inline]
    pub fn add(
        &self,
        user_id: &UserId,
        entries: Vec<IndexEntry>,
        doc_type: DocumentType,
    ) -> Result<()> {
        let Some(first) = entries.first() else {
            debug!("Ignoring empty batch for user {}", user_id);
            return Ok(());
        };
        let batch_dimension = first.embedding.len();
        if batch_dimension == 0 {
            return Err(DocQaError::EmbeddingUnavailable(
                "provider returned zero-width vectors".to_string(),
            ));
        }
        if let Some(bad) = entries
            .iter()
            .find(|entry| entry.embedding.len() != batch_dimension)
        {
            return Err(DocQaError::DimensionMismatch {
                expected: batch_dimension,
                actual: bad.embedding.len(),
            });
        }

        let added = entries.len();
        let writer = self.writer(user_id);
        let _guard = writer.lock().unwrap_or_else(PoisonError::into_inner);

        let next = match self.snapshot(user_id) {
            Some(current) => {
                if current.dimension != batch_dimension {
                    return Err(DocQaError::DimensionMismatch {
                        expected: current.dimension,
                        actual: batch_dimension,
                    });
                }
                let mut combined = Vec::with_capacity(current.entries.len() + added);
                combined.extend(current.entries.iter().cloned());
                combined.extend(entries);
                debug!(
                    "Appended {} chunks for user {} ({} total)",
                    added,
                    user_id,
                    combined.len()
                );
                UserSession {
                    doc_type,
                    dimension: current.dimension,
                    entries: combined,
                    created_at: current.created_at,
                }
            }
            None => {
                info!(
                    "Created session for user {} with {} chunks ({} dimensions)",
                    user_id, added, batch_dimension
                );
                UserSession {
                    doc_type,
                    dimension: batch_dimension,
                    entries,
                    created_at: Utc::now(),
                }
            }
        };

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id.clone(), Arc::new(next));

        Ok(())
    }

    /// Up to `k` nearest chunks by ascending L2 distance; ties keep insertion order.
    ///
    /// A user without a session gets an empty result.
    #[inline]
    pub fn search(&self, user_id: &UserId, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        let Some(session) = self.snapshot(user_id) else {
            debug!("No session for user {}, returning no results", user_id);
            return Ok(Vec::new());
        };

        if query.len() != session.dimension {
            return Err(DocQaError::DimensionMismatch {
                expected: session.dimension,
                actual: query.len(),
            });
        }

        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = session
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, l2_distance(&entry.embedding, query)))
            .collect();

        // Stable sort, so equal distances stay in insertion order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, distance)| SearchHit {
                text: session.entries[position].text.clone(),
                position,
                distance,
            })
            .collect())
    }

    /// Drop a user's session. Clearing an unknown user is a no-op.
    #[inline]
    pub fn clear(&self, user_id: &UserId) {
        let writer = self.writer(user_id);
        let _guard = writer.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id);

        if removed.is_some() {
            info!("Cleared session for user {}", user_id);
        }
    }

    /// All chunk texts for a user, in insertion order
    #[inline]
    pub fn chunks(&self, user_id: &UserId) -> Vec<String> {
        self.snapshot(user_id)
            .map(|session| session.texts().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// All chunks joined with a single space
    #[inline]
    pub fn full_text(&self, user_id: &UserId) -> String {
        self.snapshot(user_id)
            .map(|session| session.texts().collect::<Vec<_>>().join(" "))
            .unwrap_or_default()
    }

    #[inline]
    pub fn document_type(&self, user_id: &UserId) -> Option<DocumentType> {
        self.snapshot(user_id).map(|session| session.doc_type)
    }

    #[inline]
    pub fn session_info(&self, user_id: &UserId) -> Option<SessionInfo> {
        self.snapshot(user_id).map(|session| session.info())
    }

    #[inline]
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(user_id)
    }

    /// Number of users with a live session
    #[inline]
    pub fn user_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The lock that serializes `add` and `clear` for one user
    fn writer(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut writers = self.writers.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(writers.entry(user_id.clone()).or_default())
    }

    /// Current snapshot of a user's session
    #[inline]
    pub fn snapshot(&self, user_id: &UserId) -> Option<Arc<UserSession>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .map(Arc::clone)
    }
}
