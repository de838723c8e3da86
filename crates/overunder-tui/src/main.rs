// Over-Under Contests client entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open the local draft store
// 4. Build the HTTP transport
// 5. Load the entry form and contest list
// 6. Attach autosave to the entry form
// 7. Create mpsc channels and spawn the app logic task
// 8. Run the TUI until the user quits
// 9. Cleanup on exit

use std::path::Path;
use std::sync::Arc;

use overunder_core::autosave::{Autosave, AutosaveConfig};
use overunder_core::config;
use overunder_core::countdown::CountdownOptions;
use overunder_core::form::{EntryForm, EntryFormDefinition};
use overunder_core::search::load_contests;
use overunder_core::store::DraftStore;
use overunder_core::transport::{EntryTransport, HttpTransport};
use overunder_tui::app;
use overunder_tui::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Over-under client starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!("Config loaded: server={}", config.server.base_url);

    // 3. Open the draft store
    let store = Arc::new(DraftStore::open(&config.db_path).context("failed to open draft store")?);
    info!("Draft store opened at {}", config.db_path);

    // 4. HTTP transport
    let transport: Arc<dyn EntryTransport> =
        Arc::new(HttpTransport::from_config(&config).context("failed to build HTTP client")?);

    // 5. Entry form and contest list; both are optional
    let mut form = match EntryFormDefinition::from_json_file(Path::new(&config.data_paths.entry_form)) {
        Ok(definition) => {
            let form = EntryForm::new(definition);
            info!(
                "Loaded entry form \"{}\" with {} questions",
                form.contest_name(),
                form.question_count()
            );
            Some(form)
        }
        Err(e) => {
            warn!("No entry form loaded: {e:#}");
            None
        }
    };

    let contests = load_contests(Path::new(&config.data_paths.contests)).unwrap_or_else(|e| {
        warn!("No contest list loaded: {e:#}");
        Vec::new()
    });
    info!("Loaded {} contests", contests.len());

    // 6. Autosave
    let autosave = Autosave::attach(
        form.as_mut(),
        AutosaveConfig::from(&config.autosave),
        transport.clone(),
        store,
    );
    if autosave.restored_draft() {
        info!("Restored local draft");
    }

    let app_state = app::AppState::new(
        form,
        autosave,
        transport,
        contests,
        config.search.debounce_delay(),
    );

    // 7. Channels and app task
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 8. TUI; blocks until the user quits
    info!("Application ready");
    if let Err(e) = tui::run(ui_rx, cmd_tx, CountdownOptions::from(&config.countdown)).await {
        error!("TUI error: {}", e);
    }

    // 9. Wait for the app task; its shutdown flushes the draft and awaits
    //    the unload beacon. Bounded so an unresponsive server cannot hang exit.
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Over-under client shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("overunder.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("overunder_tui=info,overunder_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
