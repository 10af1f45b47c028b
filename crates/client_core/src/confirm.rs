//! Modal confirmation as an awaitable yes/no.
//!
//! [`ConfirmController::confirm`] opens the dialog and hands back a
//! [`Confirmation`] future. Whatever closes the dialog (affirm, cancel,
//! backdrop, Escape) resolves it exactly once. The controller is an explicit
//! instance owned by one place in the view tree, not ambient state.

use std::{
    future::Future,
    pin::Pin,
    sync::{Mutex, PoisonError},
    task::{Context, Poll},
};

use tokio::sync::{oneshot, watch};
use tracing::debug;

pub const DEFAULT_TITLE: &str = "Konfirmasi";
pub const DEFAULT_DESCRIPTION: &str = "Apakah Anda yakin?";
pub const DEFAULT_CONFIRM_LABEL: &str = "Ya, lanjut";
pub const DEFAULT_CANCEL_LABEL: &str = "Batal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmOptions {
    pub title: String,
    pub description: Option<String>,
    pub confirm_label: String,
    pub cancel_label: String,
    pub destructive: bool,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: Some(DEFAULT_DESCRIPTION.to_string()),
            confirm_label: DEFAULT_CONFIRM_LABEL.to_string(),
            cancel_label: DEFAULT_CANCEL_LABEL.to_string(),
            destructive: false,
        }
    }
}

impl ConfirmOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn without_description(mut self) -> Self {
        self.description = None;
        self
    }

    pub fn with_confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }

    pub fn with_cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = label.into();
        self
    }

    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }
}

/// UI gestures that close an open dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogInput {
    Affirm,
    Cancel,
    Backdrop,
    Escape,
}

impl DialogInput {
    pub fn outcome(self) -> bool {
        matches!(self, Self::Affirm)
    }
}

struct PendingDecision {
    options: ConfirmOptions,
    waiters: Vec<oneshot::Sender<bool>>,
}

pub struct ConfirmController {
    pending: Mutex<Option<PendingDecision>>,
    view: watch::Sender<Option<ConfirmOptions>>,
}

impl Default for ConfirmController {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmController {
    pub fn new() -> Self {
        let (view, _) = watch::channel(None);
        Self {
            pending: Mutex::new(None),
            view,
        }
    }

    /// Opens the dialog with `options`.
    ///
    /// While a dialog is already open this only replaces the displayed
    /// options; the caller joins the open decision and gets the same answer
    /// as the first caller when the dialog closes.
    pub fn confirm(&self, options: ConfirmOptions) -> Confirmation {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.lock();
        match pending.as_mut() {
            Some(decision) => {
                debug!(title = %options.title, "confirm: replacing options of open dialog");
                decision.options = options.clone();
                decision.waiters.push(tx);
            }
            None => {
                debug!(title = %options.title, "confirm: opening dialog");
                *pending = Some(PendingDecision {
                    options: options.clone(),
                    waiters: vec![tx],
                });
            }
        }
        self.view.send_replace(Some(options));
        Confirmation { rx }
    }

    /// Feeds a gesture to the dialog. Returns `false` when nothing was open.
    pub fn dispatch(&self, input: DialogInput) -> bool {
        self.close(input.outcome(), input)
    }

    pub fn affirm(&self) -> bool {
        self.dispatch(DialogInput::Affirm)
    }

    pub fn cancel(&self) -> bool {
        self.dispatch(DialogInput::Cancel)
    }

    /// What to render: `None` while closed.
    pub fn view(&self) -> Option<ConfirmOptions> {
        self.view.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        self.view.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ConfirmOptions>> {
        self.view.subscribe()
    }

    fn close(&self, outcome: bool, input: DialogInput) -> bool {
        let decision = {
            let mut pending = self.lock();
            let Some(decision) = pending.take() else {
                return false;
            };
            self.view.send_replace(None);
            decision
        };

        debug!(
            ?input,
            outcome,
            title = %decision.options.title,
            waiters = decision.waiters.len(),
            "confirm: dialog closed"
        );
        for waiter in decision.waiters {
            let _ = waiter.send(outcome);
        }
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<PendingDecision>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolves to the dialog's answer. A controller dropped while the dialog is
/// open resolves its waiters with `false`.
#[must_use = "the dialog answer is only observable by awaiting the confirmation"]
pub struct Confirmation {
    rx: oneshot::Receiver<bool>,
}

impl Future for Confirmation {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|answer| answer.unwrap_or(false))
    }
}

#[cfg(test)]
#[path = "tests/confirm_tests.rs"]
mod tests;
