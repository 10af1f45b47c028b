//! Plain-text rendering for the terminal.

use client_core::{ConfirmOptions, DialogInput, ListSnapshot, Notice, NoticeLevel, Notifier};
use shared::domain::Record;

/// Prints notices as they happen.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        print_notice(&notice);
    }
}

pub fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Success => println!("[ok] {}", notice.message),
        NoticeLevel::Error => eprintln!("[error] {}", notice.message),
    }
}

pub fn print_rows(rows: &[Record]) {
    if rows.is_empty() {
        println!("  (tidak ada data)");
        return;
    }
    println!("  {:>5}  {:<8}  {:<24}  {:<8}  minat", "id", "npm", "nama", "kelas");
    for row in rows {
        println!(
            "  {:>5}  {:<8}  {:<24}  {:<8}  {}",
            row.id,
            row.npm,
            truncate(&row.nama, 24),
            row.kelas,
            row.interests().join(", ")
        );
    }
}

pub fn print_record(record: &Record, image_url: Option<String>) {
    println!("id     : {}", record.id);
    println!("npm    : {}", record.npm);
    println!("nama   : {}", record.nama);
    println!("kelas  : {}", record.kelas);
    println!("minat  : {}", record.minat.as_deref().unwrap_or("-"));
    match image_url {
        Some(url) => println!("profile: {url}"),
        None => println!("profile: -"),
    }
}

pub fn print_page_footer(page: u32, total_pages: u32, total: u64) {
    println!("  halaman {page} dari {total_pages} ({total} data)");
}

pub fn print_snapshot(snapshot: &ListSnapshot) {
    if !snapshot.filter_text.is_empty() {
        println!("  cari: {:?}", snapshot.filter_text);
    }
    print_rows(&snapshot.rows);
    print_page_footer(snapshot.page, snapshot.total_pages(), snapshot.total);
}

pub fn print_dialog(options: &ConfirmOptions) {
    let marker = if options.destructive { "!" } else { "?" };
    println!("[{marker}] {}", options.title);
    if let Some(description) = &options.description {
        println!("    {description}");
    }
    println!(
        "    y = {}, enter = {}, esc = tutup",
        options.confirm_label, options.cancel_label
    );
}

/// Maps a typed answer onto the dialog's inputs. Anything unrecognised
/// cancels.
pub fn dialog_input(line: &str) -> DialogInput {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "ya" | "yes" => DialogInput::Affirm,
        "esc" | "escape" => DialogInput::Escape,
        _ => DialogInput::Cancel,
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_map_to_dialog_inputs() {
        assert_eq!(dialog_input("Y"), DialogInput::Affirm);
        assert_eq!(dialog_input(" ya "), DialogInput::Affirm);
        assert_eq!(dialog_input("esc"), DialogInput::Escape);
        assert_eq!(dialog_input(""), DialogInput::Cancel);
        assert_eq!(dialog_input("n"), DialogInput::Cancel);
    }

    #[test]
    fn long_names_are_cut_to_width() {
        assert_eq!(truncate("Budi", 8), "Budi");
        assert_eq!(truncate("Budi Santoso", 8), "Budi Sa~");
    }
}
