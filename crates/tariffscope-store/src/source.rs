//! The candidate-source boundary and caller-side wrappers around it.
//!
//! A candidate source returns every leaf whose canonical code starts with a
//! branch prefix and has the schedule's finest granularity. It is the only
//! I/O-bound step of an analysis, so caching and timeouts live here rather
//! than in the engine.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tariffscope_core::{LeafEntry, canonical_code};
use tokio::sync::RwLock;
use tracing::debug;

use crate::StoreError;

/// Source of leaf entries for a branch of the schedule.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// All leaves under `branch_prefix`, without de-duplication or further
    /// filtering by the engine.
    async fn fetch_leaves_under_branch(
        &self,
        branch_prefix: &str,
    ) -> Result<Vec<LeafEntry>, StoreError>;
}

#[async_trait]
impl<S: CandidateSource + ?Sized> CandidateSource for Arc<S> {
    async fn fetch_leaves_under_branch(
        &self,
        branch_prefix: &str,
    ) -> Result<Vec<LeafEntry>, StoreError> {
        (**self).fetch_leaves_under_branch(branch_prefix).await
    }
}

/// Memoises successful lookups by canonical branch prefix.
///
/// Failures are never cached, so a transient upstream error is retried on
/// the next call.
pub struct Memoized<S> {
    inner: S,
    cache: RwLock<HashMap<String, Vec<LeafEntry>>>,
}

impl<S: CandidateSource> Memoized<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached branches.
    pub async fn cached_branches(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Drop every cached branch (e.g. after the schedule was revised).
    pub async fn invalidate(&self) {
        self.cache.write().await.clear();
    }
}

#[async_trait]
impl<S: CandidateSource> CandidateSource for Memoized<S> {
    async fn fetch_leaves_under_branch(
        &self,
        branch_prefix: &str,
    ) -> Result<Vec<LeafEntry>, StoreError> {
        let key = canonical_code(branch_prefix);
        if let Some(hit) = self.cache.read().await.get(&key) {
            debug!(branch = %key, "candidate cache hit");
            return Ok(hit.clone());
        }

        let leaves = self.inner.fetch_leaves_under_branch(&key).await?;
        self.cache.write().await.insert(key, leaves.clone());
        Ok(leaves)
    }
}

/// Bounds every lookup of the wrapped source by a wall-clock timeout.
pub struct Timed<S> {
    inner: S,
    timeout: Duration,
}

impl<S: CandidateSource> Timed<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<S: CandidateSource> CandidateSource for Timed<S> {
    async fn fetch_leaves_under_branch(
        &self,
        branch_prefix: &str,
    ) -> Result<Vec<LeafEntry>, StoreError> {
        match tokio::time::timeout(
            self.timeout,
            self.inner.fetch_leaves_under_branch(branch_prefix),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                branch: canonical_code(branch_prefix),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and fails for branch "9999".
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CandidateSource for Counting {
        async fn fetch_leaves_under_branch(
            &self,
            branch_prefix: &str,
        ) -> Result<Vec<LeafEntry>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if branch_prefix == "9999" {
                return Err(StoreError::Upstream {
                    branch: branch_prefix.into(),
                    message: "service unavailable".into(),
                });
            }
            Ok(vec![LeafEntry::new(
                format!("{branch_prefix}000000"),
                "Test entry",
                "Free",
            )])
        }
    }

    struct Slow;

    #[async_trait]
    impl CandidateSource for Slow {
        async fn fetch_leaves_under_branch(
            &self,
            _branch_prefix: &str,
        ) -> Result<Vec<LeafEntry>, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn memoized_hits_cache_by_canonical_prefix() {
        let source = Memoized::new(Counting {
            calls: AtomicUsize::new(0),
        });

        let first = source.fetch_leaves_under_branch("8211").await.unwrap();
        let second = source.fetch_leaves_under_branch("82.11").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.cached_branches().await, 1);
    }

    #[tokio::test]
    async fn memoized_does_not_cache_failures() {
        let source = Memoized::new(Counting {
            calls: AtomicUsize::new(0),
        });

        assert!(source.fetch_leaves_under_branch("9999").await.is_err());
        assert!(source.fetch_leaves_under_branch("9999").await.is_err());
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.cached_branches().await, 0);
    }

    #[tokio::test]
    async fn invalidate_clears_cache() {
        let source = Memoized::new(Counting {
            calls: AtomicUsize::new(0),
        });
        source.fetch_leaves_under_branch("8211").await.unwrap();
        source.invalidate().await;
        source.fetch_leaves_under_branch("8211").await.unwrap();
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn timed_expires_as_timeout_error() {
        let source = Timed::new(Slow, Duration::from_millis(20));
        let result = source.fetch_leaves_under_branch("8211.91").await;
        match result {
            Err(StoreError::Timeout { branch, secs }) => {
                assert_eq!(branch, "821191");
                assert_eq!(secs, 0);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timed_passes_through_success() {
        let source = Timed::new(
            Counting {
                calls: AtomicUsize::new(0),
            },
            Duration::from_secs(5),
        );
        let leaves = source.fetch_leaves_under_branch("8211").await.unwrap();
        assert_eq!(leaves.len(), 1);
    }

    #[tokio::test]
    async fn arc_source_delegates() {
        let source: Arc<dyn CandidateSource> = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let leaves = source.fetch_leaves_under_branch("6109").await.unwrap();
        assert_eq!(leaves[0].code, "6109000000");
    }
}
