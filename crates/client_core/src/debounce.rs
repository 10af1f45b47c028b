//! Last-value-wins debouncing of a changing input.

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle};

pub const DEFAULT_DEBOUNCE_MS: u64 = 400;
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(DEFAULT_DEBOUNCE_MS);

/// Publishes the input only after it has stayed unchanged for the whole quiet
/// period. Every new input restarts the timer and replaces the pending value.
///
/// The timer task is aborted when this value is dropped, so nothing is
/// published after the owner is gone. Must be created inside a tokio runtime.
pub struct Debounced<T> {
    input: watch::Sender<T>,
    output: Arc<watch::Sender<T>>,
    quiet: Duration,
    task: JoinHandle<()>,
}

impl<T> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, quiet: Duration) -> Self {
        let (input, input_rx) = watch::channel(initial.clone());
        let (output, _) = watch::channel(initial);
        let output = Arc::new(output);
        let task = tokio::spawn(settle(input_rx, Arc::clone(&output), quiet));
        Self {
            input,
            output,
            quiet,
            task,
        }
    }

    pub fn set(&self, value: T) {
        self.input.send_replace(value);
    }

    /// Publishes `value` now and drops whatever was pending.
    ///
    /// Returns whether the settled value changed.
    pub fn flush(&self, value: T) -> bool {
        self.input.send_replace(value.clone());
        publish(&self.output, value)
    }

    /// Latest settled value.
    pub fn current(&self) -> T {
        self.output.borrow().clone()
    }

    /// Latest raw input, settled or not.
    pub fn pending(&self) -> T {
        self.input.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.subscribe()
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn settle<T>(mut input: watch::Receiver<T>, output: Arc<watch::Sender<T>>, quiet: Duration)
where
    T: Clone + PartialEq,
{
    loop {
        if input.changed().await.is_err() {
            return;
        }
        loop {
            tokio::select! {
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                () = tokio::time::sleep(quiet) => break,
            }
        }
        let settled = input.borrow_and_update().clone();
        publish(&output, settled);
    }
}

fn publish<T: PartialEq>(output: &watch::Sender<T>, value: T) -> bool {
    output.send_if_modified(|current| {
        if *current == value {
            return false;
        }
        *current = value;
        true
    })
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
