//! One search at a time.
//!
//! Every search owns a session handle. Starting a search cancels the
//! previous handle and replaces it, and every state update first checks
//! that the handle doing the update is still the current one. A stream that
//! keeps producing data after it was superseded can therefore never touch
//! the new search's state.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use tokio_util::sync::CancellationToken;

use crate::{
    app::{AppError, MemeBackend},
    curated::curated_memes,
    memes::Meme,
};

use super::{
    decoder::EventReader,
    fallback::fallback_matches,
    state::{SearchState, Transition},
};

/// How a call to [`SearchController::start_search`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The server finished. An empty list means nothing matched.
    Completed(Vec<Meme>),
    /// The remote search failed and bundled memes were substituted.
    Fallback { error: String, results: Vec<Meme> },
    /// [`SearchController::cancel`] was called.
    Cancelled,
    /// A newer search replaced this one.
    Superseded,
}

/// Receives every change of the visible search state.
///
/// Callbacks run synchronously on the search task, outside of any lock.
pub trait SessionObserver: Send + Sync {
    /// `None` means the state was cleared.
    fn on_state(&self, _state: Option<&SearchState>) {}

    fn on_outcome(&self, _outcome: &SearchOutcome) {}
}

pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Emits search progress as structured `tracing` events.
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_state(&self, state: Option<&SearchState>) {
        match state {
            Some(state) => tracing::debug!(
                stage = %state.stage,
                message = %state.message,
                thinking_chars = state.thinking_text.chars().count(),
                expanded_query = state.expanded_query.as_deref().unwrap_or_default(),
                "search progress"
            ),
            None => tracing::debug!("search state cleared"),
        }
    }

    fn on_outcome(&self, outcome: &SearchOutcome) {
        match outcome {
            SearchOutcome::Completed(results) => {
                tracing::info!(results = results.len(), "search completed")
            }
            SearchOutcome::Fallback { error, results } => {
                tracing::warn!(%error, results = results.len(), "search failed, using fallback")
            }
            SearchOutcome::Cancelled => tracing::info!("search cancelled"),
            SearchOutcome::Superseded => tracing::debug!("search superseded"),
        }
    }
}

/// Identity of one search, compared by pointer.
struct SessionHandle {
    token: CancellationToken,
    /// Set before the token is cancelled when a newer search took over.
    superseded: AtomicBool,
}

impl SessionHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            superseded: AtomicBool::new(false),
        }
    }

    fn stop(&self, superseded: bool) {
        self.superseded.store(superseded, Ordering::SeqCst);
        self.token.cancel();
    }

    /// Outcome for a session that was stopped. The visible state was already
    /// handled by whoever stopped it.
    fn interrupted(&self) -> SearchOutcome {
        if self.superseded.load(Ordering::SeqCst) {
            SearchOutcome::Superseded
        } else {
            SearchOutcome::Cancelled
        }
    }
}

#[derive(Default)]
struct Shared {
    current: Option<Arc<SessionHandle>>,
    visible: Option<SearchState>,
}

/// Drives streaming searches against a [`MemeBackend`].
///
/// Cheap to clone; clones share the current session, so one clone may
/// cancel a search another clone is awaiting.
#[derive(Clone)]
pub struct SearchController {
    backend: Arc<dyn MemeBackend>,
    observer: Arc<dyn SessionObserver>,
    shared: Arc<Mutex<Shared>>,
}

impl SearchController {
    pub fn new(backend: Arc<dyn MemeBackend>) -> Self {
        Self {
            backend,
            observer: Arc::new(NoopObserver),
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Snapshot of the visible state, `None` when no search is running.
    pub fn state(&self) -> Option<SearchState> {
        self.lock().visible.clone()
    }

    pub fn is_searching(&self) -> bool {
        self.lock().current.is_some()
    }

    /// Run a streaming search until it finishes, fails, is cancelled or is
    /// superseded. Any search still running is cancelled first.
    pub async fn start_search(&self, query: &str, limit: usize) -> SearchOutcome {
        let session = Arc::new(SessionHandle::new());

        let initial = SearchState::new();
        {
            let mut shared = self.lock();
            if let Some(previous) = shared.current.replace(session.clone()) {
                previous.stop(true);
            }
            shared.visible = Some(initial.clone());
        }
        self.observer.on_state(Some(&initial));

        let outcome = self.run(&session, query, limit).await;
        self.observer.on_outcome(&outcome);
        outcome
    }

    /// Stop the running search, if any, and clear the visible state.
    ///
    /// Returns false when nothing was running.
    pub fn cancel(&self) -> bool {
        let cancelled = {
            let mut shared = self.lock();
            match shared.current.take() {
                Some(session) => {
                    session.stop(false);
                    shared.visible = None;
                    true
                }
                None => false,
            }
        };

        if cancelled {
            self.observer.on_state(None);
        }
        cancelled
    }

    async fn run(&self, session: &Arc<SessionHandle>, query: &str, limit: usize) -> SearchOutcome {
        let opened = tokio::select! {
            biased;
            _ = session.token.cancelled() => return session.interrupted(),
            opened = self.backend.search_stream(query, limit) => opened,
        };

        let mut reader = match opened {
            Ok(stream) => EventReader::new(stream),
            Err(err) => return self.fail(session, query, err),
        };

        let mut state = SearchState::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = session.token.cancelled() => return session.interrupted(),
                next = reader.next_event() => next,
            };

            let event = match next {
                Ok(Some(event)) => event,
                Ok(None) => return self.fail(session, query, AppError::StreamEnded),
                Err(err) => return self.fail(session, query, err),
            };
            log::trace!("{} event, stage {}", event.event_type, event.stage);

            match state.apply(&event) {
                Transition::Ignored => {}
                Transition::Completed(results) => {
                    return self.finish(session, SearchOutcome::Completed(results))
                }
                Transition::Failed(error) => {
                    return self.fallback(session, query, error);
                }
                Transition::Thought | Transition::Progressed => {
                    if !self.publish(session, &state) {
                        return session.interrupted();
                    }
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(shared: &Shared, session: &Arc<SessionHandle>) -> bool {
        shared
            .current
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, session))
    }

    fn publish(&self, session: &Arc<SessionHandle>, state: &SearchState) -> bool {
        {
            let mut shared = self.lock();
            if !Self::is_current(&shared, session) {
                return false;
            }
            shared.visible = Some(state.clone());
        }
        self.observer.on_state(Some(state));
        true
    }

    /// End the session and clear the visible state, unless a newer session
    /// already took over.
    fn finish(&self, session: &Arc<SessionHandle>, outcome: SearchOutcome) -> SearchOutcome {
        {
            let mut shared = self.lock();
            if !Self::is_current(&shared, session) {
                return session.interrupted();
            }
            shared.current = None;
            shared.visible = None;
        }
        self.observer.on_state(None);
        outcome
    }

    fn fail(&self, session: &Arc<SessionHandle>, query: &str, err: AppError) -> SearchOutcome {
        self.fallback(session, query, err.to_string())
    }

    fn fallback(&self, session: &Arc<SessionHandle>, query: &str, error: String) -> SearchOutcome {
        // a cancelled transport is not a failure
        if session.token.is_cancelled() {
            log::debug!("ignoring error from cancelled search: {error}");
            return session.interrupted();
        }

        log::warn!("search for {query:?} failed, showing bundled memes: {error}");
        let results = fallback_matches(query, curated_memes());
        self.finish(session, SearchOutcome::Fallback { error, results })
    }
}
