//! Paginated, search-filtered view of the remote records.
//!
//! The controller owns the filter text, page, total, loading flag and rows,
//! and publishes them as a [`ListSnapshot`] on a watch channel. A refresh runs
//! on mount, on every page change and whenever the debounced filter settles on
//! a value that has not been requested yet. Each refresh is tagged with a
//! generation; a response is applied only if no newer refresh was issued in
//! the meantime.

use std::{
    sync::{Arc, Mutex, PoisonError, Weak},
    time::Duration,
};

use shared::{
    domain::{Record, RecordId},
    protocol::{total_pages, ListQuery, PAGE_SIZE},
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info};

use crate::{
    confirm::{ConfirmController, ConfirmOptions},
    debounce::Debounced,
    gateway::RecordGateway,
    notify::{Notice, Notifier},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot {
    pub filter_text: String,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub loading: bool,
    pub rows: Vec<Record>,
    /// Generation of the most recently issued refresh.
    pub generation: u64,
    /// Query of the most recently issued refresh.
    pub requested: Option<ListQuery>,
}

impl Default for ListSnapshot {
    fn default() -> Self {
        Self {
            filter_text: String::new(),
            page: 1,
            limit: PAGE_SIZE,
            total: 0,
            loading: false,
            rows: Vec::new(),
            generation: 0,
            requested: None,
        }
    }
}

impl ListSnapshot {
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, self.limit)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer refresh was issued before this one answered.
    Stale,
    Failed,
    /// The settled filter had already been requested.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    Deleted,
    Failed,
}

pub fn delete_confirmation() -> ConfirmOptions {
    ConfirmOptions::default()
        .with_title("Hapus data ini?")
        .with_confirm_label("Hapus")
        .destructive()
}

pub struct ListController {
    gateway: Arc<dyn RecordGateway>,
    notifier: Arc<dyn Notifier>,
    filter: Debounced<String>,
    view: watch::Sender<ListSnapshot>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl ListController {
    pub fn new(
        gateway: Arc<dyn RecordGateway>,
        notifier: Arc<dyn Notifier>,
        quiet: Duration,
    ) -> Arc<Self> {
        let (view, _) = watch::channel(ListSnapshot::default());
        Arc::new(Self {
            gateway,
            notifier,
            filter: Debounced::new(String::new(), quiet),
            view,
            watcher: Mutex::new(None),
        })
    }

    /// Loads the first page and starts following the debounced filter.
    pub async fn mount(self: &Arc<Self>) -> RefreshOutcome {
        let settled = self.filter.subscribe();
        let task = tokio::spawn(follow_filter(Arc::downgrade(self), settled));
        if let Some(previous) = self.watcher_slot().replace(task) {
            previous.abort();
        }
        self.refresh().await
    }

    /// Stops following the filter. Also happens on drop.
    pub fn unmount(&self) {
        if let Some(task) = self.watcher_slot().take() {
            task.abort();
        }
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.view.subscribe()
    }

    /// The filter value refreshes are issued with.
    pub fn debounced_filter(&self) -> String {
        self.filter.current()
    }

    /// Updates the displayed filter text. Fetching waits for the debounce.
    pub fn set_filter_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.view.send_if_modified(|view| {
            if view.filter_text == text {
                return false;
            }
            view.filter_text = text.clone();
            true
        });
        self.filter.set(text);
    }

    /// Moves to `page` and refreshes. Callers keep `page` within
    /// `1..=total_pages`; nothing is clamped here.
    pub async fn set_page(&self, page: u32) -> RefreshOutcome {
        self.run(|view| {
            view.page = page;
            true
        })
        .await
    }

    /// `None` when already on the last page.
    pub async fn next_page(&self) -> Option<RefreshOutcome> {
        let snapshot = self.snapshot();
        if !snapshot.has_next() {
            return None;
        }
        Some(self.set_page(snapshot.page + 1).await)
    }

    /// `None` when already on the first page.
    pub async fn prev_page(&self) -> Option<RefreshOutcome> {
        let snapshot = self.snapshot();
        if !snapshot.has_prev() {
            return None;
        }
        Some(self.set_page(snapshot.page - 1).await)
    }

    /// Empties the filter and lands on page 1 with a single refresh.
    pub async fn clear_filter(&self) -> RefreshOutcome {
        self.run(|view| {
            view.filter_text.clear();
            view.page = 1;
            self.filter.flush(String::new());
            true
        })
        .await
    }

    /// Refetches the current page. Failures become one error notice and
    /// leave the previous rows and total in place.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.run(|_| true).await
    }

    /// Asks for confirmation, deletes, then refreshes the current page.
    ///
    /// The page is not stepped back when the delete empties it.
    pub async fn delete_record(&self, confirm: &ConfirmController, id: RecordId) -> DeleteOutcome {
        if !confirm.confirm(delete_confirmation()).await {
            debug!(id = id.0, "list: delete cancelled");
            return DeleteOutcome::Cancelled;
        }

        match self.gateway.delete(id).await {
            Ok(()) => {
                info!(id = id.0, "list: record deleted");
                self.notifier.notify(Notice::success("Berhasil dihapus"));
                self.refresh().await;
                DeleteOutcome::Deleted
            }
            Err(err) => {
                self.notifier
                    .notify(Notice::error(format!("Gagal hapus: {err}")));
                DeleteOutcome::Failed
            }
        }
    }

    async fn run(&self, prepare: impl FnOnce(&mut ListSnapshot) -> bool) -> RefreshOutcome {
        match self.issue(prepare) {
            Some((generation, query)) => self.fetch(generation, query).await,
            None => RefreshOutcome::Skipped,
        }
    }

    /// Applies `prepare` and bumps the generation in one step, so a
    /// concurrent issuer always sees either both or neither.
    fn issue(&self, prepare: impl FnOnce(&mut ListSnapshot) -> bool) -> Option<(u64, ListQuery)> {
        let mut issued = None;
        self.view.send_if_modified(|view| {
            if !prepare(view) {
                return false;
            }
            view.generation += 1;
            view.loading = true;
            let query = ListQuery {
                q: self.filter.current(),
                page: view.page,
                limit: view.limit,
            };
            view.requested = Some(query.clone());
            issued = Some((view.generation, query));
            true
        });
        issued
    }

    async fn fetch(&self, generation: u64, query: ListQuery) -> RefreshOutcome {
        debug!(generation, q = %query.q, page = query.page, "list: refreshing");
        match self.gateway.list(&query).await {
            Ok(result) => {
                let total = result.total;
                let applied = self.view.send_if_modified(|view| {
                    if view.generation != generation {
                        return false;
                    }
                    view.rows = result.rows;
                    view.total = result.total;
                    view.loading = false;
                    true
                });
                if applied {
                    debug!(generation, total, "list: refreshed");
                    RefreshOutcome::Applied
                } else {
                    debug!(generation, "list: discarding stale response");
                    RefreshOutcome::Stale
                }
            }
            Err(err) => {
                self.notifier
                    .notify(Notice::error(format!("Gagal memuat data: {err}")));
                self.view.send_if_modified(|view| {
                    if view.generation != generation {
                        return false;
                    }
                    view.loading = false;
                    true
                });
                RefreshOutcome::Failed
            }
        }
    }

    fn watcher_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.watcher.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ListController {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Issues a refresh for every newly settled filter. Fetches run on their own
/// tasks so a slow response never holds back a later filter.
async fn follow_filter(weak: Weak<ListController>, mut settled: watch::Receiver<String>) {
    while settled.changed().await.is_ok() {
        let value = settled.borrow_and_update().clone();
        let Some(controller) = weak.upgrade() else {
            return;
        };
        let issued = controller.issue(|view| {
            let already_requested = view
                .requested
                .as_ref()
                .is_some_and(|query| query.q == value);
            !already_requested
        });
        if let Some((generation, query)) = issued {
            tokio::spawn(async move {
                controller.fetch(generation, query).await;
            });
        }
    }
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;
