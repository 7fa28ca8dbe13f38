//! notebook: command-line front end for the notebook client.
//!
//! Each invocation drives one session: the command is mapped onto view
//! transitions, draft edits and uploads, and session notifications are
//! printed to stderr while note text goes to stdout.

mod practice;
mod render;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use notebook_client::{ClientConfig, HttpAiService, HttpNoteStore};
use notebook_core::{Generated, Note, NoteId, UploadFile};
use notebook_session::{
    ArtifactKind, Draft, DraftField, SessionConfig, SessionController, SessionEvent, Theme,
    UploadOutcome,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "notebook")]
#[command(author, version, about = "Notes with AI summaries, quizzes and mind maps")]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (default: ~/.config/notebook/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all notes
    List,

    /// Show a note with its summary, quiz and mind map
    Show { id: NoteId },

    /// Create a note
    New {
        #[arg(short, long, default_value = "")]
        title: String,

        #[arg(short, long, conflicts_with = "content_file")]
        content: Option<String>,

        /// Read the content from a file
        #[arg(long)]
        content_file: Option<PathBuf>,

        /// Generate a summary before saving
        #[arg(long)]
        summarize: bool,

        /// Generate a quiz before saving
        #[arg(long)]
        quiz: bool,

        /// Generate a mind map before saving
        #[arg(long)]
        mindmap: bool,
    },

    /// Edit a note's title or content
    Edit {
        id: NoteId,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long, conflicts_with = "content_file")]
        content: Option<String>,

        #[arg(long)]
        content_file: Option<PathBuf>,
    },

    /// Delete a note
    Delete { id: NoteId },

    /// Generate and save a summary for a note
    Summarize { id: NoteId },

    /// Generate and save a quiz for a note
    Quiz { id: NoteId },

    /// Generate and save a mind map for a note
    Mindmap { id: NoteId },

    /// Answer a note's quiz and get a score
    Practice { id: NoteId },

    /// Create a note from a PDF document
    Upload {
        file: PathBuf,

        /// Title to use instead of the one suggested by extraction
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Reopen the note created by the last upload, if it was recent
    Resume,

    /// Check whether the AI service is reachable
    Status,

    /// Show or change the display theme
    Theme {
        #[arg(value_enum)]
        choice: Option<ThemeChoice>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeChoice {
    Light,
    Dark,
    Toggle,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// Environment variables:
//   LOG_FORMAT  - "json" or "text" (default: "text")
//   LOG_FILE    - path to log file (optional, daily rotation)
//   LOG_ANSI    - "true"/"false" override ANSI colors
//   RUST_LOG    - standard env filter (default: "notebook=warn")
fn init_tracing() -> Option<WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "notebook=warn".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(path) = &log_file {
        let path = Path::new(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("notebook.log");
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(log_ansi.unwrap_or(false)),
                )
                .init();
        }
        return Some(guard);
    }

    // Console output shares stderr with notifications; stdout is for notes.
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        let mut layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
        if let Some(ansi) = log_ansi {
            layer = layer.with_ansi(ansi);
        }
        registry.with(layer).init();
    }
    None
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client_config = match &cli.config {
        Some(path) => ClientConfig::from_file(path),
        None => ClientConfig::load(),
    }
    .context("Failed to load configuration")?;

    let mut session_config = SessionConfig::from_env();
    session_config.max_upload_bytes = client_config.max_upload_bytes;
    if session_config.state_path.is_none() {
        session_config.state_path = SessionConfig::default_state_path();
    }

    let store = HttpNoteStore::new(&client_config)?;
    let ai = HttpAiService::new(&client_config)?;
    info!(
        notes = %client_config.notes_base_url,
        ai = %client_config.ai_base_url,
        "Session starting"
    );

    let controller = SessionController::new(Arc::new(store), Arc::new(ai), session_config);
    let printer = spawn_notification_printer(controller.subscribe());

    let result = execute(&controller, cli.command).await;

    // Dropping the controller closes the event bus so the printer drains and exits.
    drop(controller);
    let _ = printer.await;
    result
}

fn spawn_notification_printer(mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::Notification(n)) => eprintln!("[{}] {}", n.level, n.message),
                Ok(event) => debug!(event = event.event_type(), "Session event"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Notification printer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

async fn execute(c: &SessionController, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::List => {
            // The session opens on the list view; rendering it is a refresh.
            c.cache().refresh().await?;
            print!("{}", render::note_list(&c.cache().all()));
        }
        Commands::Show { id } => {
            c.view_note(id).await?;
            let note = c
                .viewed_note()
                .with_context(|| format!("Note #{} is no longer shown", id))?;
            print!("{}", render::note_detail(&note));
        }
        Commands::New {
            title,
            content,
            content_file,
            summarize,
            quiz,
            mindmap,
        } => {
            let content = read_content(content, content_file)?.unwrap_or_default();
            c.new_note().await?;
            c.update_field(DraftField::Title, title)?;
            c.update_field(DraftField::Content, content)?;

            let requested = [
                (summarize, ArtifactKind::Summary),
                (quiz, ArtifactKind::Quiz),
                (mindmap, ArtifactKind::Mindmap),
            ];
            for (_, kind) in requested.into_iter().filter(|(wanted, _)| *wanted) {
                c.generate(kind).await?;
            }
            c.save().await?;
        }
        Commands::Edit {
            id,
            title,
            content,
            content_file,
        } => {
            let content = read_content(content, content_file)?;
            if title.is_none() && content.is_none() {
                bail!("Nothing to change: pass --title, --content or --content-file");
            }
            c.edit_note(id).await?;
            if let Some(title) = title {
                c.update_field(DraftField::Title, title)?;
            }
            if let Some(content) = content {
                c.update_field(DraftField::Content, content)?;
            }
            c.save().await?;
        }
        Commands::Delete { id } => {
            c.view_note(id).await?;
            c.delete_viewed_note().await?;
        }
        Commands::Summarize { id } => generate_for(c, id, ArtifactKind::Summary).await?,
        Commands::Quiz { id } => generate_for(c, id, ArtifactKind::Quiz).await?,
        Commands::Mindmap { id } => generate_for(c, id, ArtifactKind::Mindmap).await?,
        Commands::Practice { id } => {
            c.view_note(id).await?;
            let quiz = c
                .viewed_note()
                .and_then(|n| n.quiz)
                .filter(|q| q.question_count() > 0)
                .with_context(|| {
                    format!("Note #{} has no quiz. Create one with `notebook quiz {}`", id, id)
                })?;
            let answers = practice::read_answers(&quiz, &mut io::stdin().lock(), &mut io::stdout())?;
            print!("\n{}", render::score_text(&quiz.grade(&answers)));
        }
        Commands::Upload { file, title } => {
            let upload = UploadFile::from_path(&file)
                .with_context(|| format!("Cannot read {}", file.display()))?;
            c.new_note().await?;
            if let Some(title) = title {
                c.update_field(DraftField::Title, title)?;
            }
            match c.upload(upload).await? {
                UploadOutcome::Persisted { note_id } => println!("Created note #{}", note_id),
                UploadOutcome::Rejected => bail!("Another document is still being processed"),
                UploadOutcome::Failed(e) | UploadOutcome::PersistFailed(e) => return Err(e.into()),
            }
        }
        Commands::Resume => match c.resume().await? {
            Some(_) => {
                let draft = c.draft().context("Resumed note is not open")?;
                print!("{}", render::note_detail(&draft_as_note(draft)));
            }
            None => println!("Nothing to resume."),
        },
        Commands::Status => {
            if c.backend_status().await? {
                println!("AI service: online");
            } else {
                bail!("AI service: offline");
            }
        }
        Commands::Theme { choice } => {
            let theme = match choice {
                None => c.theme(),
                Some(ThemeChoice::Light) => {
                    c.set_theme(Theme::Light);
                    Theme::Light
                }
                Some(ThemeChoice::Dark) => {
                    c.set_theme(Theme::Dark);
                    Theme::Dark
                }
                Some(ThemeChoice::Toggle) => c.toggle_theme(),
            };
            println!("{}", theme);
        }
    }
    Ok(())
}

/// Open note `id` in the editor, generate `kind`, save and print it.
async fn generate_for(c: &SessionController, id: NoteId, kind: ArtifactKind) -> anyhow::Result<()> {
    c.edit_note(id).await?;
    let generated = c.generate(kind).await?;
    c.save().await?;

    match generated {
        Generated::Summary(summary) => println!("{}", summary),
        Generated::Quiz(quiz) => print!("{}", render::quiz_text(&quiz, false)),
        Generated::Mindmap(mindmap) => print!("{}", render::mindmap_text(&mindmap)),
    }
    Ok(())
}

fn read_content(content: Option<String>, file: Option<PathBuf>) -> anyhow::Result<Option<String>> {
    match (content, file) {
        (Some(content), _) => Ok(Some(content)),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("Cannot read {}", path.display())),
        (None, None) => Ok(None),
    }
}

fn draft_as_note(draft: Draft) -> Note {
    Note {
        id: draft.note_id,
        title: draft.title,
        content: draft.content,
        summary: draft.summary,
        quiz: draft.quiz,
        mindmap: draft.mindmap,
    }
}
