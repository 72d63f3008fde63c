use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use gutenshelf_core::{Debouncer, ParamsUpdate, SearchParameters};
use gutenshelf_core::debounce::DEFAULT_DEBOUNCE;

use crate::browse::state::{BrowseState, FetchTicket, Phase};
use crate::source::CatalogSource;

/// Drives a [`BrowseState`] against a [`CatalogSource`].
///
/// Every parameter change spawns one fetch on the current tokio runtime.
/// Fetches are never cancelled; the state only accepts the result of the
/// most recently issued one, so a slow response cannot overwrite a newer
/// query. Observers follow changes through [`BrowseController::subscribe`].
#[derive(Clone)]
pub struct BrowseController {
    source: Arc<dyn CatalogSource>,
    state: Arc<watch::Sender<BrowseState>>,
    search_debounce: Arc<Mutex<Debouncer<String>>>,
}

impl BrowseController {
    /// Start browsing `params`. Must be called inside a tokio runtime; the
    /// first fetch is already in flight when this returns.
    pub fn new(source: Arc<dyn CatalogSource>, params: SearchParameters) -> Self {
        Self::with_debounce(source, params, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(
        source: Arc<dyn CatalogSource>,
        params: SearchParameters,
        debounce: Duration,
    ) -> Self {
        let (tx, _rx) = watch::channel(BrowseState::new(params));
        let controller = Self {
            source,
            state: Arc::new(tx),
            search_debounce: Arc::new(Mutex::new(Debouncer::new(debounce))),
        };
        controller.reload();
        controller
    }

    pub fn subscribe(&self) -> watch::Receiver<BrowseState> {
        self.state.subscribe()
    }

    /// Current state. Don't hold the guard across an `.await`.
    pub fn state(&self) -> watch::Ref<'_, BrowseState> {
        self.state.borrow()
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase()
    }

    // ─── Parameter changes ───────────────────────────────────

    pub fn update_parameters(&self, update: ParamsUpdate) {
        let mut ticket = None;
        self.state.send_modify(|s| ticket = Some(s.update_parameters(update)));
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
        }
    }

    /// Returns `false` (and does nothing) when `page` is out of range.
    pub fn go_to_page(&self, page: u32) -> bool {
        self.run_optional(|s| s.go_to_page(page))
    }

    pub fn next_page(&self) -> bool {
        self.run_optional(BrowseState::next_page)
    }

    pub fn previous_page(&self) -> bool {
        self.run_optional(BrowseState::previous_page)
    }

    /// Fetch the current parameters again.
    pub fn reload(&self) {
        let mut ticket = None;
        self.state.send_modify(|s| ticket = Some(s.reload()));
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
        }
    }

    pub fn set_subject_filter(&self, subjects: Vec<String>) {
        self.state.send_modify(|s| s.set_subject_filter(subjects));
    }

    fn run_optional(&self, f: impl FnOnce(&mut BrowseState) -> Option<FetchTicket>) -> bool {
        let mut ticket = None;
        self.state.send_if_modified(|s| {
            ticket = f(s);
            ticket.is_some()
        });
        match ticket {
            Some(ticket) => {
                self.spawn_fetch(ticket);
                true
            }
            None => false,
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        tracing::debug!(
            version = ticket.version,
            source = source.name(),
            search = %ticket.params.search,
            page = ticket.params.page,
            "issuing search"
        );

        tokio::spawn(async move {
            let result = source.search(&ticket.params).await;
            state.send_if_modified(|s| match result {
                Ok(page) => s.apply_success(&ticket, page),
                Err(e) => s.apply_failure(&ticket, e),
            });
        });
    }

    // ─── Search input ────────────────────────────────────────

    /// Typed search text: applied once input has been quiet for the
    /// debounce delay. Each call restarts the wait.
    pub fn type_search(&self, text: impl Into<String>) {
        let deadline = self.debounce().trigger(text.into(), Instant::now().into_std());

        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(Instant::from_std(deadline)).await;
            let due = this.debounce().poll(Instant::now().into_std());
            if let Some(text) = due {
                this.update_parameters(ParamsUpdate::search(text));
            }
        });
    }

    /// Explicit submit: drops any pending typed text and searches now.
    pub fn submit_search(&self, text: impl Into<String>) {
        self.cancel_pending_search();
        self.update_parameters(ParamsUpdate::search(text));
    }

    pub fn cancel_pending_search(&self) -> Option<String> {
        self.debounce().cancel()
    }

    pub fn has_pending_search(&self) -> bool {
        self.debounce().is_pending()
    }

    fn debounce(&self) -> MutexGuard<'_, Debouncer<String>> {
        self.search_debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until the latest fetch has been applied.
    pub async fn wait_settled(&self) -> Phase {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|s| s.phase().is_settled()).await {
            Ok(state) => state.phase(),
            // The sender lives in `self`, so the channel can't close here.
            Err(_) => self.phase(),
        }
    }
}
