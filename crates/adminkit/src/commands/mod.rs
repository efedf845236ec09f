//! Command dispatch: bridges CLI args -> core requests -> output formatting.

pub mod config_cmd;
pub mod export;
pub mod records;
pub mod util;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use adminkit_api::{DataProvider, MemoryDataProvider};
use adminkit_core::{Admin, CrudRequest, Effect, MutationOutcome, ResponseData};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cli::{Command, GlobalOpts};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

// ── Session ─────────────────────────────────────────────────────────

/// One CLI invocation: the runtime over a JSON-file-backed provider.
pub struct Session {
    pub admin: Admin,
    provider: Arc<MemoryDataProvider>,
    data_file: PathBuf,
    undo_window: Option<Duration>,
}

impl Session {
    /// Load the data file (a missing file is an empty store).
    pub fn open(settings: Settings) -> Result<Self, CliError> {
        let provider = if settings.data_file.exists() {
            load_data_file(&settings.data_file)?
        } else {
            debug!(path = %settings.data_file.display(), "data file absent, starting empty");
            MemoryDataProvider::new()
        };
        let provider = Arc::new(provider);
        let data: Arc<dyn DataProvider> = provider.clone();

        Ok(Self {
            admin: Admin::new(settings.admin, data),
            provider,
            data_file: settings.data_file,
            undo_window: settings.undo_window,
        })
    }

    /// Write the provider's contents back to the data file.
    pub fn persist(&self) -> Result<(), CliError> {
        if let Some(parent) = self.data_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.provider.to_json())?;
        std::fs::write(&self.data_file, json)?;
        debug!(path = %self.data_file.display(), "data file written");
        Ok(())
    }
}

fn load_data_file(path: &Path) -> Result<MemoryDataProvider, CliError> {
    let data_file_err = |source: Box<dyn std::error::Error + Send + Sync>| CliError::DataFile {
        path: path.display().to_string(),
        source,
    };
    let text = std::fs::read_to_string(path).map_err(|e| data_file_err(Box::new(e)))?;
    let value = serde_json::from_str(&text).map_err(|e| data_file_err(Box::new(e)))?;
    MemoryDataProvider::from_json(value).map_err(|e| data_file_err(Box::new(e)))
}

// ── Dispatch ────────────────────────────────────────────────────────

/// Dispatch a data-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => records::list(session, args, global).await,
        Command::Show { resource, id } => records::show(session, &resource, &id, global).await,
        Command::Create { resource, payload } => {
            records::create(session, &resource, &payload, global).await
        }
        Command::Update {
            resource,
            id,
            payload,
        } => records::update(session, &resource, &id, &payload, global).await,
        Command::UpdateMany {
            resource,
            ids,
            payload,
        } => records::update_many(session, &resource, &ids, &payload, global).await,
        Command::Delete { resource, id } => records::delete(session, &resource, &id, global).await,
        Command::DeleteMany { resource, ids } => {
            records::delete_many(session, &resource, &ids, global).await
        }
        Command::Export(args) => export::handle(session, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

// ── Mutations ───────────────────────────────────────────────────────

/// Run a mutation in the configured mode, then persist the data file.
///
/// Undoable mutations open the undo window first. Returns `None` when the
/// user undid the change.
pub async fn submit(
    session: &Session,
    request: CrudRequest,
    global: &GlobalOpts,
) -> Result<Option<ResponseData>, CliError> {
    let color = output::should_color(&global.color);
    let mut effects = session.admin.effects();

    let outcome = session.admin.mutate(request).await?;
    report_effects(&mut effects, color, global.quiet);

    let settlement = match outcome {
        MutationOutcome::Settled(settlement) => settlement,
        MutationOutcome::Pending(token) => {
            if !keep_change(session.undo_window, global).await? {
                session.admin.undo_token(token).await?;
                report_effects(&mut effects, color, global.quiet);
                if !global.quiet {
                    eprintln!("Change undone");
                }
                return Ok(None);
            }
            session.admin.complete_token(token).await?
        }
    };
    report_effects(&mut effects, color, global.quiet);

    let data = settlement.into_result()?;
    session.persist()?;
    Ok(Some(data))
}

/// Print queued notifications; other effects are only logged.
fn report_effects(effects: &mut broadcast::Receiver<Arc<Effect>>, color: bool, quiet: bool) {
    loop {
        match effects.try_recv() {
            Ok(effect) => match effect.as_ref() {
                Effect::Notify(notification) => {
                    output::print_notification(notification, color, quiet);
                }
                Effect::Redirect { path } => debug!(path = %path, "redirect"),
                other => debug!(effect = ?other, "effect"),
            },
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "effects lagged"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

// ── Undo window ─────────────────────────────────────────────────────

/// Decide whether an undoable change is kept.
///
/// With a window, a countdown runs and Ctrl-C undoes. Without one, the
/// user is asked (`--yes` keeps).
async fn keep_change(window: Option<Duration>, global: &GlobalOpts) -> Result<bool, CliError> {
    let Some(window) = window else {
        return util::confirm("Keep this change?", global.yes);
    };

    let total = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
    let bar = if global.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(total)
    };
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:30.cyan/blue}] {eta} left") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message("Press Ctrl-C to undo");

    let deadline = Instant::now() + window;
    let progress = async {
        let mut tick = tokio::time::interval(Duration::from_millis(100));
        loop {
            tick.tick().await;
            let left = deadline.saturating_duration_since(Instant::now());
            let elapsed = window.saturating_sub(left);
            bar.set_position(u64::try_from(elapsed.as_millis()).unwrap_or(total));
        }
    };

    let keep = tokio::select! {
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => false,
            Err(e) => {
                warn!(error = %e, "cannot listen for Ctrl-C, keeping the change");
                tokio::time::sleep_until(deadline).await;
                true
            }
        },
        () = tokio::time::sleep_until(deadline) => true,
        _ = progress => true,
    };
    bar.finish_and_clear();
    Ok(keep)
}
