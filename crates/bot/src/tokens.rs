//! One-shot download tokens.
//!
//! Remote paths are too long for the 64-byte callback payload limit, so
//! file buttons carry a short random token instead. Each token resolves
//! once; the cache is bounded and drops the oldest entries first.

use std::collections::{HashMap, VecDeque};

use tokio::sync::Mutex;

/// Default number of live tokens.
pub const DEFAULT_CAPACITY: usize = 1_000;

/// What a token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadEntry {
    pub path: String,
    pub file_name: String,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, DownloadEntry>,
    order: VecDeque<String>,
}

/// Bounded one-shot token cache shared by every chat worker.
pub struct DownloadTokens {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl Default for DownloadTokens {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DownloadTokens {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Register a file and return its token (32 hex characters).
    pub async fn issue(&self, path: impl Into<String>, file_name: impl Into<String>) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let mut inner = self.inner.lock().await;
        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        inner.entries.insert(
            token.clone(),
            DownloadEntry {
                path: path.into(),
                file_name: file_name.into(),
            },
        );
        inner.order.push_back(token.clone());
        token
    }

    /// Resolve and consume a token.
    pub async fn take(&self, token: &str) -> Option<DownloadEntry> {
        let mut inner = self.inner.lock().await;
        let entry = inner.entries.remove(token)?;
        inner.order.retain(|t| t != token);
        Some(entry)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_resolves_once() {
        let tokens = DownloadTokens::default();
        let token = tokens.issue("Festival/Shared files/map.pdf", "map.pdf").await;
        assert_eq!(token.len(), 32);

        let entry = tokens.take(&token).await.unwrap();
        assert_eq!(entry.file_name, "map.pdf");
        assert!(tokens.take(&token).await.is_none());
    }

    #[tokio::test]
    async fn oldest_tokens_are_evicted() {
        let tokens = DownloadTokens::new(2);
        let first = tokens.issue("a", "a").await;
        let second = tokens.issue("b", "b").await;
        let third = tokens.issue("c", "c").await;

        assert_eq!(tokens.len().await, 2);
        assert!(tokens.take(&first).await.is_none());
        assert!(tokens.take(&second).await.is_some());
        assert!(tokens.take(&third).await.is_some());
    }

    #[tokio::test]
    async fn unknown_token_is_none() {
        let tokens = DownloadTokens::default();
        assert!(tokens.take("deadbeef").await.is_none());
    }
}
