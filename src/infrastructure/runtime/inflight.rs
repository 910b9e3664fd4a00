//! At-most-one-outstanding-request per key
//!
//! The first caller for a key spawns the work; callers arriving while it is
//! outstanding await the same shared handle and receive a clone of its
//! output. The work runs on its own task, so it completes even when every
//! caller has gone away, and it removes its entry when it finishes so the
//! next call starts fresh.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

type Pending<K, V> = Arc<Mutex<HashMap<K, Entry<V>>>>;

struct Entry<V> {
    id: u64,
    shared: Shared<BoxFuture<'static, V>>,
}

pub struct InFlight<K, V>
where
    V: Clone,
{
    pending: Pending<K, V>,
    next_id: AtomicU64,
}

/// Drops the entry for `key` once its task ends, unless a newer run replaced it
struct Release<K, V>
where
    K: Eq + Hash,
{
    pending: Pending<K, V>,
    key: K,
    id: u64,
}

impl<K, V> Drop for Release<K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.get(&self.key).is_some_and(|entry| entry.id == self.id) {
            pending.remove(&self.key);
        }
    }
}

impl<K, V> InFlight<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Run `start()` for `key`, or join the request already outstanding.
    ///
    /// `start` is only invoked when no request for `key` is pending. Must be
    /// called inside a Tokio runtime.
    pub async fn run<F, Fut>(&self, key: K, start: F) -> V
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = V> + Send + 'static,
    {
        let shared = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            match pending.get(&key) {
                Some(existing) => {
                    log::debug!("joining in-flight request");
                    existing.shared.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let release = Release {
                        pending: Arc::clone(&self.pending),
                        key: key.clone(),
                        id,
                    };
                    let work = start();
                    let task = tokio::spawn(async move {
                        let _release = release;
                        work.await
                    });
                    let shared = async move {
                        match task.await {
                            Ok(out) => out,
                            Err(err) => std::panic::resume_unwind(err.into_panic()),
                        }
                    }
                    .boxed()
                    .shared();
                    pending.insert(
                        key,
                        Entry {
                            id,
                            shared: shared.clone(),
                        },
                    );
                    shared
                }
            }
        };

        shared.await
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl<K, V> Default for InFlight<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_run() {
        let inflight: Arc<InFlight<String, u64>> = Arc::new(InFlight::new());
        let starts = Arc::new(AtomicUsize::new(0));

        let call = |inflight: Arc<InFlight<String, u64>>, starts: Arc<AtomicUsize>| async move {
            inflight
                .run("k".to_string(), move || {
                    starts.fetch_add(1, Ordering::SeqCst);
                    async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        7
                    }
                })
                .await
        };

        let (a, b) = tokio::join!(
            call(Arc::clone(&inflight), Arc::clone(&starts)),
            call(Arc::clone(&inflight), Arc::clone(&starts))
        );
        assert_eq!((a, b), (7, 7));
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert!(!inflight.is_pending(&"k".to_string()));

        call(Arc::clone(&inflight), Arc::clone(&starts)).await;
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn different_keys_run_independently() {
        let inflight: InFlight<u8, u8> = InFlight::new();
        let (a, b) = tokio::join!(
            inflight.run(1, || async { 1 }),
            inflight.run(2, || async { 2 })
        );
        assert_eq!((a, b), (1, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn work_finishes_after_its_only_caller_is_dropped() {
        let inflight: Arc<InFlight<u8, u8>> = Arc::new(InFlight::new());
        let done = Arc::new(AtomicUsize::new(0));

        let caller = {
            let inflight = Arc::clone(&inflight);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                inflight
                    .run(1, move || async move {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        done.fetch_add(1, Ordering::SeqCst);
                        9
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        caller.abort();
        assert!(inflight.is_pending(&1));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert!(!inflight.is_pending(&1));
    }
}
