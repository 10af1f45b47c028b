use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    list::delete_confirmation, load_settings, ConfirmController, DeleteOutcome,
    HttpRecordGateway, ListController, Notifier, ProfileImage, RecordEditor, RecordForm,
    RecordGateway, SubmitError,
};
use shared::{
    domain::RecordId,
    protocol::{total_pages, ListQuery, PAGE_SIZE},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod browse;
mod console;

use console::ConsoleNotifier;

#[derive(Parser, Debug)]
#[command(name = "mahasiswa", about = "Kelola data mahasiswa dari terminal")]
struct Cli {
    /// Overrides `server_url` from client.toml and the environment.
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Checks that the server answers.
    Ping,
    List {
        #[arg(short, long, default_value = "")]
        q: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    Show {
        id: RecordId,
    },
    Create(FormArgs),
    Update {
        id: RecordId,
        #[command(flatten)]
        form: FormArgs,
    },
    Delete {
        id: RecordId,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Interactive list with search and paging.
    Browse,
}

#[derive(Args, Debug)]
struct FormArgs {
    #[arg(long)]
    npm: Option<String>,
    #[arg(long)]
    nama: Option<String>,
    #[arg(long)]
    kelas: Option<String>,
    /// Comma separated, e.g. "AI, Web".
    #[arg(long)]
    minat: Option<String>,
    /// Image uploaded as the profile picture.
    #[arg(long)]
    profile: Option<PathBuf>,
}

impl FormArgs {
    async fn apply(self, form: &mut RecordForm) -> Result<()> {
        if let Some(npm) = self.npm {
            form.npm = npm;
        }
        if let Some(nama) = self.nama {
            form.nama = nama;
        }
        if let Some(kelas) = self.kelas {
            form.kelas = kelas;
        }
        if let Some(minat) = self.minat {
            form.minat = minat;
        }
        if let Some(path) = self.profile {
            form.image = Some(read_image(&path).await?);
        }
        Ok(())
    }
}

async fn read_image(path: &std::path::Path) -> Result<ProfileImage> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image '{}'", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("image path has no usable file name")?
        .to_string();
    let mime_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string());
    Ok(ProfileImage {
        filename,
        mime_type,
        bytes,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,mahasiswa=info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    info!(server_url = %settings.server_url, "mahasiswa: using server");

    let http = Arc::new(HttpRecordGateway::with_timeout(
        &settings.server_url,
        settings.request_timeout(),
    )?);
    let gateway: Arc<dyn RecordGateway> = http.clone();
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);

    match cli.command {
        Command::Ping => {
            http.health().await?;
            println!("server {} ok", http.base_url());
        }
        Command::List { q, page } => {
            let page = page.max(1);
            let result = gateway.list(&ListQuery::new(q, page)).await?;
            console::print_rows(&result.rows);
            console::print_page_footer(page, total_pages(result.total, PAGE_SIZE), result.total);
        }
        Command::Show { id } => {
            let record = gateway.get(id).await?;
            let image_url = record.profile.as_deref().map(|p| http.image_url(p));
            console::print_record(&record, image_url);
        }
        Command::Create(args) => {
            let editor = RecordEditor::create(gateway, notifier);
            let mut form = RecordForm::default();
            args.apply(&mut form).await?;
            submit(&editor, &form, &http).await?;
        }
        Command::Update { id, form: args } => {
            let (editor, mut form) = RecordEditor::edit(gateway, notifier, id).await?;
            args.apply(&mut form).await?;
            submit(&editor, &form, &http).await?;
        }
        Command::Delete { id, yes } => {
            delete(gateway, notifier, id, yes, settings.debounce()).await?;
        }
        Command::Browse => browse::run(gateway, settings.debounce()).await?,
    }

    Ok(())
}

async fn submit(editor: &RecordEditor, form: &RecordForm, http: &HttpRecordGateway) -> Result<()> {
    match editor.submit(form).await {
        Ok(record) => {
            let image_url = record.profile.as_deref().map(|p| http.image_url(p));
            console::print_record(&record, image_url);
            Ok(())
        }
        Err(SubmitError::Validation(errors)) => {
            for error in &errors.0 {
                eprintln!("  {error}");
            }
            bail!("form tidak valid")
        }
        Err(err @ SubmitError::Gateway(_)) => Err(err.into()),
    }
}

/// Runs the same confirm-then-delete flow as the list view. The answer comes
/// from `--yes` or from one line of stdin.
async fn delete(
    gateway: Arc<dyn RecordGateway>,
    notifier: Arc<dyn Notifier>,
    id: RecordId,
    yes: bool,
    quiet: std::time::Duration,
) -> Result<()> {
    let list = ListController::new(gateway, notifier, quiet);
    let confirm = ConfirmController::new();
    let mut dialog = confirm.subscribe();

    let answer = async {
        if dialog.wait_for(Option::is_some).await.is_err() {
            return anyhow::Ok(());
        }
        if yes {
            confirm.affirm();
        } else {
            let options = confirm.view().unwrap_or_else(delete_confirmation);
            console::print_dialog(&options.with_description(format!("Data {id} akan dihapus.")));
            let line = BufReader::new(tokio::io::stdin())
                .lines()
                .next_line()
                .await?
                .unwrap_or_default();
            confirm.dispatch(console::dialog_input(&line));
        }
        Ok(())
    };

    let (outcome, answered) = tokio::join!(list.delete_record(&confirm, id), answer);
    answered?;

    match outcome {
        DeleteOutcome::Deleted => {
            console::print_snapshot(&list.snapshot());
            Ok(())
        }
        DeleteOutcome::Cancelled => {
            println!("dibatalkan");
            Ok(())
        }
        DeleteOutcome::Failed => bail!("record {id} tidak dihapus"),
    }
}
