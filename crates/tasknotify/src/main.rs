use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tasknotify_core::diff::diff_fields;
use tasknotify_core::fixture::{
    DEFAULT_ARTICLE_PATH, FixturePages, MemorySink, MemoryWatchlist, content_revision_id,
};
use tasknotify_core::hooks::{HookState, SavedPageEdit, on_page_content_save};
use tasknotify_core::notify::NotificationEvent;
use tasknotify_core::presentation::{
    RenderedNotification, locate_new_assignees, render_notification,
};
use tasknotify_core::structure::{PageStructure, TemplateFieldSet, task_template_fields};
use tasknotify_core::user::{StaticUserDirectory, UserDirectory};

#[derive(Debug, Parser)]
#[command(
    name = "tasknotify",
    version,
    about = "Replay task-page edits against fixture pages and inspect the notifications they raise"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Print the task template fields of a page file")]
    Inspect(InspectArgs),
    #[command(about = "Print the fields that changed between two page files")]
    Diff(DiffArgs),
    #[command(about = "Run the save hook for one edit and print the fired event")]
    Simulate(SimulateArgs),
    #[command(about = "Evaluate a stored event for a viewer against fixture pages")]
    Render(RenderArgs),
}

#[derive(Debug, Args)]
struct InspectArgs {
    file: PathBuf,
}

#[derive(Debug, Args)]
struct DiffArgs {
    old: PathBuf,
    new: PathBuf,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    #[arg(long, value_name = "TITLE")]
    page: String,
    #[arg(long, value_name = "FILE", help = "Previous page text; omit for a new page")]
    old: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    new: PathBuf,
    #[arg(long, value_name = "NAME")]
    editor: String,
    #[arg(long, value_name = "FILE", help = "TOML user directory")]
    users: PathBuf,
    #[arg(
        long = "category",
        value_name = "NAME",
        help = "Category the page belongs to (repeatable)"
    )]
    categories: Vec<String>,
}

#[derive(Debug, Args)]
struct RenderArgs {
    #[arg(long, value_name = "FILE", help = "Stored notification event JSON")]
    event: PathBuf,
    #[arg(long, value_name = "NAME", help = "Viewer the notification is rendered for")]
    user: String,
    #[arg(long, value_name = "DIR", help = "Directory of .wiki fixture pages")]
    pages: PathBuf,
    #[arg(long, value_name = "FILE", help = "TOML user directory")]
    users: PathBuf,
    #[arg(long, value_name = "PATH", default_value = DEFAULT_ARTICLE_PATH)]
    article_path: String,
}

#[derive(Debug, Serialize)]
struct SimulateReport {
    fired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<NotificationEvent>,
    recipients: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RenderReport {
    can_render: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<RenderedNotification>,
    watches: Vec<(u64, String)>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect(args) => run_inspect(&args),
        Commands::Diff(args) => run_diff(&args),
        Commands::Simulate(args) => run_simulate(&args),
        Commands::Render(args) => run_render(&args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TASKNOTIFY_LOG")
        .unwrap_or_else(|_| EnvFilter::new("tasknotify=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn run_inspect(args: &InspectArgs) -> Result<()> {
    let fields = read_task_fields(&args.file)?;
    print_json(&fields)
}

fn run_diff(args: &DiffArgs) -> Result<()> {
    let previous = read_task_fields(&args.old)?;
    let current = read_task_fields(&args.new)?;
    print_json(&diff_fields(&previous, &current))
}

fn run_simulate(args: &SimulateArgs) -> Result<()> {
    let directory = StaticUserDirectory::load(&args.users)?;
    let Some(editor) = directory.user_by_name(&args.editor) else {
        bail!("editor is not a known user: {}", args.editor);
    };

    let previous_text = match &args.old {
        Some(path) => Some(read_page(path)?),
        None => None,
    };
    let new_text = read_page(&args.new)?;

    let edit = SavedPageEdit {
        title: args.page.clone(),
        categories: args.categories.clone(),
        previous_text,
        revision_id: content_revision_id(&new_text),
        new_text,
        editor,
    };

    let mut state = HookState::new();
    let mut sink = MemorySink::default();
    let event = on_page_content_save(&mut state, &edit, &directory, &mut sink)?;

    let recipients = event
        .as_ref()
        .map(|event| {
            locate_new_assignees(event, &directory)
                .into_iter()
                .map(|user| user.name)
                .collect()
        })
        .unwrap_or_default();

    print_json(&SimulateReport {
        fired: event.is_some(),
        event,
        recipients,
    })
}

fn run_render(args: &RenderArgs) -> Result<()> {
    let content = fs::read_to_string(&args.event)
        .with_context(|| format!("failed to read {}", args.event.display()))?;
    let event: NotificationEvent = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", args.event.display()))?;

    let directory = StaticUserDirectory::load(&args.users)?;
    let Some(viewer) = directory.user_by_name(&args.user) else {
        bail!("viewer is not a known user: {}", args.user);
    };

    let pages = FixturePages::scan(&args.pages, &args.article_path)?;
    tracing::debug!(pages = pages.len(), "fixture pages loaded");

    let mut watchlist = MemoryWatchlist::default();
    let notification = render_notification(&event, &viewer, &pages, &directory, &mut watchlist);

    print_json(&RenderReport {
        can_render: notification.is_some(),
        notification,
        watches: watchlist.watches,
    })
}

fn read_page(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_task_fields(path: &Path) -> Result<TemplateFieldSet> {
    let content = read_page(path)?;
    let structure = PageStructure::parse(&content);
    Ok(task_template_fields(Some(&structure)))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}
