//! Fetch lifecycle for one view.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::{PollConfig, StaleDataPolicy, ViewState};
use crate::api::{ApiError, DashboardApi};
use crate::session::Session;

/// A remote data set a view displays.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Parameter selecting which variant of the data to fetch (time range,
    /// page size, playlist id...). `()` for fixed resources.
    type Key: Clone + PartialEq + Debug + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    /// Used in logs and in the generic failure message.
    fn name(&self) -> &str;

    /// Whether the fetch needs the signed-in user's id.
    fn requires_subject(&self) -> bool {
        false
    }

    /// Shown when the server gives no message of its own.
    fn failure_message(&self) -> String {
        format!("Failed to load {}", self.name())
    }

    async fn fetch(
        &self,
        api: &dyn DashboardApi,
        key: &Self::Key,
        subject: Option<&str>,
    ) -> Result<Self::Output, ApiError>;
}

/// Owns the view state and poll timer of one resource.
///
/// Must be started from within a tokio runtime. Dropping the controller
/// stops it.
pub struct PollingController<R: Resource> {
    resource: Arc<R>,
    api: Arc<dyn DashboardApi>,
    session: Session,
    policy: StaleDataPolicy,
    shared: Arc<Shared<R::Output>>,
    running: Option<Running<R>>,
}

struct Running<R: Resource> {
    fetcher: Arc<Fetcher<R>>,
    timer: JoinHandle<()>,
    config: PollConfig,
}

impl<R: Resource> PollingController<R> {
    pub fn new(
        resource: R,
        api: Arc<dyn DashboardApi>,
        session: Session,
        policy: StaleDataPolicy,
    ) -> Self {
        let (state, _) = watch::channel(ViewState::Idle);
        Self {
            resource: Arc::new(resource),
            api,
            session,
            policy,
            shared: Arc::new(Shared {
                ledger: Mutex::new(Ledger::default()),
                state,
            }),
            running: None,
        }
    }

    /// Begin fetching `key` on the given schedule.
    ///
    /// Calling again with the key already running does nothing. A different
    /// key cancels the current run, discards whatever it still has in
    /// flight, and starts over from `Loading` (or `Idle` when the first
    /// fetch is deferred).
    pub fn start(&mut self, key: R::Key, config: PollConfig) {
        if let Some(running) = &self.running
            && running.fetcher.key == key
        {
            tracing::debug!(target: "poll", "{}: already polling {:?}", self.resource.name(), key);
            return;
        }

        if let Some(previous) = self.running.take() {
            previous.timer.abort();
        }

        let initial = if config.immediate() {
            ViewState::Loading
        } else {
            ViewState::Idle
        };
        let generation = self.shared.begin_generation(initial);

        tracing::info!(
            target: "poll",
            "{}: polling {:?} every {:?} (generation {})",
            self.resource.name(),
            key,
            config.interval(),
            generation
        );

        let fetcher = Arc::new(Fetcher {
            resource: Arc::clone(&self.resource),
            api: Arc::clone(&self.api),
            session: self.session.clone(),
            shared: Arc::clone(&self.shared),
            policy: self.policy,
            key,
            generation,
        });
        let timer = spawn_timer(Arc::clone(&fetcher), config);

        self.running = Some(Running {
            fetcher,
            timer,
            config,
        });
    }

    /// Cancel the timer and ignore any response still in flight.
    ///
    /// In-flight requests are not aborted; their results are dropped when
    /// they arrive. The current state is left as it is.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        running.timer.abort();
        self.shared.end_generation();
        tracing::debug!(target: "poll", "{}: stopped", self.resource.name());
    }

    /// Fetch once now, outside the schedule. No-op when stopped.
    pub fn refresh(&self) {
        if let Some(running) = &self.running {
            running.fetcher.issue();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Key of the current run.
    pub fn key(&self) -> Option<&R::Key> {
        self.running.as_ref().map(|r| &r.fetcher.key)
    }

    pub fn config(&self) -> Option<PollConfig> {
        self.running.as_ref().map(|r| r.config)
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ViewState<R::Output> {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ViewState<R::Output>> {
        self.shared.state.subscribe()
    }

    /// Wait until the current run has a result (data or error).
    ///
    /// Returns the current state immediately when the controller is stopped.
    pub async fn settled(&self) -> ViewState<R::Output> {
        if !self.is_running() {
            return self.state();
        }
        let mut updates = self.subscribe();
        match updates.wait_for(ViewState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }
}

impl<R: Resource> Drop for PollingController<R> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Generation bookkeeping plus the published state.
///
/// Both live behind the ledger lock so the staleness check and the state
/// write happen atomically.
struct Shared<T> {
    ledger: Mutex<Ledger>,
    state: watch::Sender<ViewState<T>>,
}

#[derive(Default)]
struct Ledger {
    generation: u64,
    /// Last sequence handed out; monotonic across generations
    issued: u64,
    /// Sequence of the newest committed result
    committed: u64,
}

impl<T: Clone> Shared<T> {
    fn begin_generation(&self, initial: ViewState<T>) -> u64 {
        let mut ledger = self.ledger.lock();
        ledger.generation += 1;
        self.state.send_replace(initial);
        ledger.generation
    }

    fn end_generation(&self) {
        self.ledger.lock().generation += 1;
    }

    /// Sequence number for a new fetch, or `None` if `generation` is over.
    fn issue(&self, generation: u64) -> Option<u64> {
        let mut ledger = self.ledger.lock();
        if ledger.generation != generation {
            return None;
        }
        ledger.issued += 1;
        self.state.send_if_modified(|state| {
            if state.is_idle() {
                *state = ViewState::Loading;
                true
            } else {
                false
            }
        });
        Some(ledger.issued)
    }

    /// Apply a finished fetch. Returns `false` if it was superseded.
    fn commit(
        &self,
        generation: u64,
        sequence: u64,
        outcome: Result<T, String>,
        policy: StaleDataPolicy,
    ) -> bool {
        let mut ledger = self.ledger.lock();
        if ledger.generation != generation || sequence <= ledger.committed {
            return false;
        }
        ledger.committed = sequence;

        self.state.send_modify(|state| {
            *state = match outcome {
                Ok(data) => ViewState::Success(data),
                Err(message) => ViewState::Error {
                    message,
                    occurred_at: Utc::now(),
                    last_good: match policy {
                        StaleDataPolicy::Retain => state.data().cloned(),
                        StaleDataPolicy::Discard => None,
                    },
                },
            };
        });
        true
    }
}

/// Everything one run needs to issue fetches.
struct Fetcher<R: Resource> {
    resource: Arc<R>,
    api: Arc<dyn DashboardApi>,
    session: Session,
    shared: Arc<Shared<R::Output>>,
    policy: StaleDataPolicy,
    key: R::Key,
    generation: u64,
}

impl<R: Resource> Fetcher<R> {
    fn issue(self: &Arc<Self>) {
        let Some(sequence) = self.shared.issue(self.generation) else {
            return;
        };

        let subject = self.session.subject_id();
        if self.resource.requires_subject() && subject.is_none() {
            self.finish(sequence, Err(ApiError::MissingSubject));
            return;
        }

        let fetcher = Arc::clone(self);
        tokio::spawn(async move {
            let result = fetcher
                .resource
                .fetch(fetcher.api.as_ref(), &fetcher.key, subject.as_deref())
                .await;
            fetcher.finish(sequence, result);
        });
    }

    fn finish(&self, sequence: u64, result: Result<R::Output, ApiError>) {
        let name = self.resource.name();
        let outcome = result.map_err(|e| {
            // A rejected credential matters even if this response is stale
            if e.is_unauthorized() {
                self.session.invalidate();
            }
            tracing::warn!(target: "poll", "{}: fetch failed: {}", name, e);
            e.user_message(&self.resource.failure_message())
        });

        if !self
            .shared
            .commit(self.generation, sequence, outcome, self.policy)
        {
            tracing::debug!(
                target: "poll",
                "{}: discarded superseded response (generation {}, sequence {})",
                name,
                self.generation,
                sequence
            );
        }
    }
}

fn spawn_timer<R: Resource>(fetcher: Arc<Fetcher<R>>, config: PollConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = config.interval();
        let first = if config.immediate() {
            Instant::now()
        } else {
            Instant::now() + period
        };
        let mut ticker = tokio::time::interval_at(first, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            fetcher.issue();
        }
    })
}
