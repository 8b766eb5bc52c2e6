//! Live query results
//!
//! A [`LiveQuery`] re-runs its storage query every time the repository
//! publishes a new revision and pushes the result to its subscribers. A read
//! therefore reflects every write that completed before it, eventually; the
//! refresh itself runs asynchronously on the tokio runtime.

use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::errors::StorageError;

/// Current value of a live query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// The first load has not finished yet
    Loading,
    /// Result of the most recent load
    Ready(T),
    /// The most recent load failed
    Failed(String),
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            QueryState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            QueryState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Continuously updated result of a repository read
///
/// The background refresh task lives as long as this handle. Receivers
/// obtained from [`LiveQuery::subscribe`] stop receiving updates once the
/// handle is dropped.
#[derive(Debug)]
pub struct LiveQuery<T> {
    receiver: watch::Receiver<QueryState<T>>,
    task: JoinHandle<()>,
}

impl<T> LiveQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start a live query driven by `revisions`
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn<F, Fut>(name: &'static str, mut revisions: watch::Receiver<u64>, query: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, StorageError>> + Send + 'static,
    {
        let (sender, receiver) = watch::channel(QueryState::Loading);

        let task = tokio::spawn(async move {
            loop {
                // Mark the revision as seen before reading, so a write that
                // lands during the query triggers another round
                let revision = *revisions.borrow_and_update();

                let state = match query().await {
                    Ok(value) => QueryState::Ready(value),
                    Err(e) => {
                        warn!("Live query {} failed at revision {}: {}", name, revision, e);
                        QueryState::Failed(e.to_string())
                    }
                };

                if sender.send(state).is_err() {
                    break;
                }
                debug!("Live query {} refreshed at revision {}", name, revision);

                tokio::select! {
                    changed = revisions.changed() => {
                        if changed.is_err() {
                            debug!("Live query {} stopped: repository dropped", name);
                            break;
                        }
                    }
                    _ = sender.closed() => break,
                }
            }
        });

        Self { receiver, task }
    }

    /// Snapshot of the current state
    pub fn current(&self) -> QueryState<T> {
        self.receiver.borrow().clone()
    }

    /// Current value, if the last load succeeded
    pub fn value(&self) -> Option<T> {
        self.receiver.borrow().ready().cloned()
    }

    /// Wait until the state changes after the last one seen through this handle
    ///
    /// Returns `false` once no further updates can arrive.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Wait until the state satisfies `predicate`
    ///
    /// Returns `None` if the query stops before that happens.
    pub async fn wait_for<P>(&mut self, mut predicate: P) -> Option<QueryState<T>>
    where
        P: FnMut(&QueryState<T>) -> bool,
    {
        self.receiver.wait_for(|state| predicate(state)).await.ok().map(|state| state.clone())
    }

    /// Wait until a successfully loaded value satisfies `predicate`
    pub async fn wait_for_value<P>(&mut self, mut predicate: P) -> Option<T>
    where
        P: FnMut(&T) -> bool,
    {
        self.wait_for(|state| state.ready().map_or(false, &mut predicate))
            .await
            .and_then(QueryState::into_ready)
    }

    /// Additional receiver for push-style consumers
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.receiver.clone()
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
