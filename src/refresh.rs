//! Single-flight coordination of token refreshes.
//!
//! A [`RefreshCoordinator`] is either idle or has exactly one refresh running.
//! Callers arriving while a refresh runs attach to it instead of starting
//! another, and every attached caller receives the same outcome.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;

use crate::error::RefreshError;

pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

type Outcome<T> = Option<Result<T, RefreshError>>;

enum State<T> {
    Idle,
    Refreshing(watch::Receiver<Outcome<T>>),
}

pub struct RefreshCoordinator<T = ()> {
    state: Arc<Mutex<State<T>>>,
    timeout: Duration,
}

impl<T> RefreshCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Idle)),
            timeout,
        }
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*lock(&self.state), State::Refreshing(_))
    }

    /// Runs `refresh_fn` unless a refresh is already in flight, in which case
    /// the in-flight outcome is awaited instead.
    ///
    /// The refresh runs on its own task: a caller that stops waiting does not
    /// cancel it for the others. Refreshes exceeding the timeout resolve as
    /// [`RefreshError::TimedOut`].
    pub async fn coordinate<F, Fut>(&self, refresh_fn: F) -> Result<T, RefreshError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RefreshError>> + Send + 'static,
    {
        let mut rx = {
            let mut state = lock(&self.state);
            let in_flight = match &*state {
                State::Refreshing(rx) => Some(rx.clone()),
                State::Idle => None,
            };
            match in_flight {
                Some(rx) => {
                    tracing::debug!("joining in-flight refresh");
                    rx
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    *state = State::Refreshing(rx.clone());
                    self.spawn_refresh(tx, refresh_fn());
                    rx
                }
            }
        };

        let settled = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| RefreshError::Abandoned)?;
        settled.clone().unwrap_or(Err(RefreshError::Abandoned))
    }

    fn spawn_refresh<Fut>(&self, tx: watch::Sender<Outcome<T>>, fut: Fut)
    where
        Fut: Future<Output = Result<T, RefreshError>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let timeout = self.timeout;
        tokio::spawn(async move {
            tracing::debug!("refresh started");
            let mut task = tokio::spawn(fut);
            let outcome = match tokio::time::timeout(timeout, &mut task).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, "refresh task did not complete");
                    Err(RefreshError::Abandoned)
                }
                Err(_) => {
                    task.abort();
                    // A refresh already past its last await runs to completion
                    // despite the abort; its outcome wins over the timeout.
                    match task.await {
                        Ok(outcome) => {
                            tracing::debug!("refresh completed at its deadline");
                            outcome
                        }
                        Err(_) => Err(RefreshError::TimedOut(timeout)),
                    }
                }
            };
            match &outcome {
                Ok(_) => tracing::debug!("refresh succeeded"),
                Err(err) => tracing::warn!(error = %err, "refresh failed"),
            }

            // Back to idle and publish under one lock, so no caller can attach
            // to a refresh that will never report.
            let mut state = lock(&state);
            *state = State::Idle;
            tx.send_replace(Some(outcome));
        });
    }
}

impl<T> Default for RefreshCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_TIMEOUT)
    }
}

fn lock<T>(state: &Mutex<State<T>>) -> MutexGuard<'_, State<T>> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}
