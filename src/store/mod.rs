// Per-user index store
// One flat L2 index and its chunk texts per user, kept in memory only


pub mod registry;

pub use registry::SessionStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::documents::DocumentType;

/// Opaque user identity. Chat front ends usually have integer ids, others strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for UserId {
    #[inline]
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for UserId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for UserId {
    #[inline]
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for UserId {
    #[inline]
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    #[inline]
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A chunk and its embedding, stored as one row of the flat index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub text: String,
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    #[inline]
    pub fn new(text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            embedding,
        }
    }
}

/// Everything ingested for one user
#[derive(Debug, Clone, PartialEq)]
pub struct UserSession {
    pub doc_type: DocumentType,
    pub dimension: usize,
    pub entries: Vec<IndexEntry>,
    pub created_at: DateTime<Utc>,
}

impl UserSession {
    /// Chunk texts in insertion order
    #[inline]
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.text.as_str())
    }

    #[inline]
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            doc_type: self.doc_type,
            chunk_count: self.entries.len(),
            dimension: self.dimension,
            created_at: self.created_at,
        }
    }
}

/// One search result: the chunk text, its row and its distance from the query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub text: String,
    pub position: usize,
    pub distance: f32,
}

/// Summary of a user's session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub doc_type: DocumentType,
    pub chunk_count: usize,
    pub dimension: usize,
    pub created_at: DateTime<Utc>,
}

/// Euclidean distance between two vectors of equal length
#[inline]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
