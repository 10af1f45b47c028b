//! Interactive list view: search, paging and delete from one prompt.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use client_core::{
    BroadcastNotifier, ConfirmController, DeleteOutcome, ListController, RecordGateway,
};
use shared::domain::RecordId;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
    task::JoinHandle,
};
use tracing::debug;

use crate::console;

const HELP: &str = "s <teks> cari | c hapus pencarian | n berikut | p sebelumnya | \
g <n> ke halaman | r muat ulang | d <id> hapus | h bantuan | q keluar";

#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    Search(String),
    ClearSearch,
    Next,
    Prev,
    Goto(u32),
    Refresh,
    Delete(RecordId),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<BrowseCommand, String> {
    let line = line.trim_start();
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    let command = match head {
        "s" => BrowseCommand::Search(rest.to_string()),
        "c" => BrowseCommand::ClearSearch,
        "n" => BrowseCommand::Next,
        "p" => BrowseCommand::Prev,
        "g" => BrowseCommand::Goto(
            rest.trim()
                .parse()
                .map_err(|_| format!("halaman tidak valid: {rest:?}"))?,
        ),
        "r" | "" => BrowseCommand::Refresh,
        "d" => BrowseCommand::Delete(rest.parse().map_err(|err| format!("{err}"))?),
        "h" | "?" => BrowseCommand::Help,
        "q" => BrowseCommand::Quit,
        other => return Err(format!("perintah tidak dikenal: {other:?} ({HELP})")),
    };
    Ok(command)
}

pub async fn run(gateway: Arc<dyn RecordGateway>, quiet: Duration) -> Result<()> {
    let notifier = Arc::new(BroadcastNotifier::default());
    let list = ListController::new(gateway, notifier.clone(), quiet);
    let confirm = Arc::new(ConfirmController::new());
    let renderer = spawn_renderer(&list, &confirm, &notifier);

    println!("{HELP}");
    list.mount().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if confirm.is_open() {
            confirm.dispatch(console::dialog_input(&line));
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        debug!(?command, "browse: command");

        match command {
            BrowseCommand::Search(text) => list.set_filter_text(text),
            BrowseCommand::ClearSearch => {
                let list = list.clone();
                tokio::spawn(async move { list.clear_filter().await });
            }
            BrowseCommand::Next => {
                let list = list.clone();
                tokio::spawn(async move {
                    if list.next_page().await.is_none() {
                        println!("  sudah di halaman terakhir");
                    }
                });
            }
            BrowseCommand::Prev => {
                let list = list.clone();
                tokio::spawn(async move {
                    if list.prev_page().await.is_none() {
                        println!("  sudah di halaman pertama");
                    }
                });
            }
            BrowseCommand::Goto(page) => {
                let last = list.snapshot().total_pages();
                if !(1..=last).contains(&page) {
                    eprintln!("halaman harus 1..={last}");
                    continue;
                }
                let list = list.clone();
                tokio::spawn(async move { list.set_page(page).await });
            }
            BrowseCommand::Refresh => {
                let list = list.clone();
                tokio::spawn(async move { list.refresh().await });
            }
            BrowseCommand::Delete(id) => {
                let list = list.clone();
                let confirm = confirm.clone();
                tokio::spawn(async move {
                    if list.delete_record(&confirm, id).await == DeleteOutcome::Cancelled {
                        println!("  dibatalkan");
                    }
                });
            }
            BrowseCommand::Help => println!("{HELP}"),
            BrowseCommand::Quit => break,
        }
    }

    list.unmount();
    renderer.abort();
    Ok(())
}

/// Redraws the table whenever a refresh settles, and shows dialogs and
/// notices as they arrive.
fn spawn_renderer(
    list: &ListController,
    confirm: &ConfirmController,
    notifier: &BroadcastNotifier,
) -> JoinHandle<()> {
    let mut snapshots = list.subscribe();
    let mut dialog = confirm.subscribe();
    let mut notices = notifier.subscribe();

    tokio::spawn(async move {
        let mut shown = 0;
        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    if !snapshot.loading && snapshot.generation != shown {
                        shown = snapshot.generation;
                        console::print_snapshot(&snapshot);
                    }
                }
                changed = dialog.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let options = dialog.borrow_and_update().clone();
                    if let Some(options) = options {
                        console::print_dialog(&options);
                    }
                }
                notice = notices.recv() => match notice {
                    Ok(notice) => console::print_notice(&notice),
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "browse: notices dropped"),
                    Err(RecvError::Closed) => break,
                },
            }
        }
    })
}
