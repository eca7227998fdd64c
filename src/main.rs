// src/main.rs

use clap::{Parser, Subcommand};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use outpost_rs_recon::app::{App, FilterField, Mode, TaskField};
use outpost_rs_recon::client::ApiClient;
use outpost_rs_recon::config::Config;
use outpost_rs_recon::core::gateway::{self, GatewayState};
use outpost_rs_recon::core::models::DomainListResponse;
use outpost_rs_recon::core::orchestrator::Orchestrator;
use outpost_rs_recon::core::registry::TaskRegistry;
use outpost_rs_recon::core::store::DomainStore;
use outpost_rs_recon::{logging, ui};

#[derive(Parser)]
#[command(name = "outpost-rs-recon", about = "Domain reconnaissance dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the backend: registry, store, orchestrator and query gateway.
    Serve {
        /// Socket address to bind, overrides OUTPOST_BIND.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Run the operator dashboard against a server.
    Dash {
        /// Server base URL, overrides OUTPOST_SERVER.
        #[arg(long)]
        server: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            logging::initialize_logging(false)?;
            serve(config).await
        }
        Command::Dash { server } => {
            if let Some(server) = server {
                config.server_url = server.trim_end_matches('/').to_string();
            }
            // The terminal belongs to the TUI, logs go to a file.
            logging::initialize_logging(true)?;
            dash(config).await
        }
    }
}

/// Wires up the backend and serves the protocol until interrupted.
async fn serve(config: Config) -> color_eyre::Result<()> {
    let (registry, wakeups) = TaskRegistry::new();
    let registry = Arc::new(registry);
    let store = Arc::new(DomainStore::new());

    let orchestrator = Orchestrator::new(registry.clone(), store.clone(), config.fofa.clone());
    tokio::spawn(orchestrator.run(wakeups));

    let router = gateway::router(GatewayState { registry, store });
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(bind = %config.bind, "Gateway listening.");
    axum::serve(listener, router).await?;
    Ok(())
}

/// Messages flowing from the request tasks back into the dashboard loop.
enum AppEvent {
    List {
        seq: u64,
        result: Result<DomainListResponse, String>,
    },
    TaskInfo(Result<String, String>),
    Submitted(Result<String, String>),
    Deleted(Result<(), String>),
}

/// Runs the dashboard event loop.
async fn dash(config: Config) -> color_eyre::Result<()> {
    let client = Arc::new(
        ApiClient::new(&config.server_url).map_err(|e| color_eyre::eyre::eyre!(e))?,
    );

    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut app = App::new(config.page_len);
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    // The status poll is a repeating task with an explicit cancellation
    // handle. Each round trip completes before the next tick is awaited, so
    // polls never pile up behind a slow server.
    let poll_handle = tokio::spawn({
        let client = client.clone();
        let tx = tx.clone();
        let period = Duration::from_secs(config.poll_secs.max(1));
        async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(AppEvent::TaskInfo(client.task_status().await)).is_err() {
                    break;
                }
            }
        }
    });

    // Initial page load.
    trigger_list(&mut app, &client, &tx);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut app, key.code, &client, &tx);
                }
            }
        }

        while let Ok(event) = rx.try_recv() {
            handle_app_event(&mut app, event, &client, &tx);
        }
    }

    // --- Restore Terminal ---
    poll_handle.abort();
    stdout().execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Issues one listing request for the current page and filters. Local
/// validation failures surface immediately, without a network call.
fn trigger_list(app: &mut App, client: &Arc<ApiClient>, tx: &mpsc::UnboundedSender<AppEvent>) {
    match app.current_query() {
        Ok(query) => {
            let seq = app.next_seq();
            app.list_in_flight = true;
            app.notice = None;
            let client = client.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = client.list_domains(&query).await;
                let _ = tx.send(AppEvent::List { seq, result });
            });
        }
        Err(msg) => app.notice = Some(msg),
    }
}

fn handle_app_event(
    app: &mut App,
    event: AppEvent,
    client: &Arc<ApiClient>,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match event {
        AppEvent::List { seq, result } => {
            app.list_in_flight = false;
            match result {
                Ok(response) => {
                    if !app.apply_list(seq, response) {
                        debug!(seq, "Discarded stale list response.");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "List request failed.");
                    app.notice = Some("domain list request failed".to_string());
                }
            }
        }
        AppEvent::TaskInfo(result) => match result {
            Ok(summary) => app.task_info = summary,
            // A failed poll keeps the stale summary on screen; the next tick
            // is the only retry.
            Err(e) => warn!(error = %e, "Status poll failed."),
        },
        AppEvent::Submitted(result) => match result {
            Ok(task_id) => {
                app.notice = Some(format!("task created: {task_id}"));
                app.mode = Mode::Browse;
                app.reset_task_form();
            }
            Err(e) => {
                warn!(error = %e, "Task submission failed.");
                app.notice = Some("task submission failed".to_string());
            }
        },
        AppEvent::Deleted(result) => match result {
            Ok(()) => {
                app.notice = Some("domain deleted".to_string());
                trigger_list(app, client, tx);
            }
            Err(e) => {
                warn!(error = %e, "Delete failed.");
                app.notice = Some("delete failed".to_string());
            }
        },
    }
}

fn handle_key(
    app: &mut App,
    key: KeyCode,
    client: &Arc<ApiClient>,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match app.mode {
        Mode::Browse => handle_browse_key(app, key, client, tx),
        Mode::Filter(field) => handle_filter_key(app, field, key, client, tx),
        Mode::TaskForm => handle_form_key(app, key, client, tx),
    }
}

fn handle_browse_key(
    app: &mut App,
    key: KeyCode,
    client: &Arc<ApiClient>,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match key {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('n') => {
            app.reset_task_form();
            app.task_form.field = Some(TaskField::Target);
            app.mode = Mode::TaskForm;
        }
        KeyCode::Char('f') => app.mode = Mode::Filter(FilterField::Org),
        KeyCode::Char('r') | KeyCode::Enter => trigger_list(app, client, tx),
        KeyCode::Char('d') => {
            if let Some(id) = app.selected_row_id() {
                let client = client.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(AppEvent::Deleted(client.delete_domain(id).await));
                });
            }
        }
        KeyCode::Up => app.select_prev_row(),
        KeyCode::Down => app.select_next_row(),
        KeyCode::Left => {
            if app.prev_page() {
                trigger_list(app, client, tx);
            }
        }
        KeyCode::Right => {
            if app.next_page() {
                trigger_list(app, client, tx);
            }
        }
        _ => {}
    }
}

fn handle_filter_key(
    app: &mut App,
    field: FilterField,
    key: KeyCode,
    client: &Arc<ApiClient>,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match key {
        KeyCode::Esc => app.mode = Mode::Browse,
        KeyCode::Tab => app.mode = Mode::Filter(field.next()),
        KeyCode::Enter => {
            // Committing a filter change restarts pagination from the top.
            app.mode = Mode::Browse;
            app.reset_page();
            trigger_list(app, client, tx);
        }
        KeyCode::Char(c) => {
            if let Some(value) = app.active_filter_mut() {
                value.push(c);
            }
        }
        KeyCode::Backspace => {
            if let Some(value) = app.active_filter_mut() {
                value.pop();
            }
        }
        _ => {}
    }
}

fn handle_form_key(
    app: &mut App,
    key: KeyCode,
    client: &Arc<ApiClient>,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match key {
        KeyCode::Esc => {
            app.mode = Mode::Browse;
            app.reset_task_form();
        }
        KeyCode::Tab => {
            app.task_form.field = match app.task_form.field {
                Some(TaskField::Target) => Some(TaskField::Org),
                Some(TaskField::Org) => None,
                None => Some(TaskField::Target),
            };
        }
        KeyCode::Enter => submit_task(app, client, tx),
        KeyCode::Char(c) => match app.task_form.field {
            Some(TaskField::Target) => app.task_form.target.push(c),
            Some(TaskField::Org) => {
                if c.is_ascii_digit() {
                    app.task_form.org.push(c);
                }
            }
            // In the flags section the digit keys toggle the scanners.
            None => {
                if let Some(digit) = c.to_digit(10) {
                    app.task_form.toggle_option(digit as u8);
                }
            }
        },
        KeyCode::Backspace => match app.task_form.field {
            Some(TaskField::Target) => {
                app.task_form.target.pop();
            }
            Some(TaskField::Org) => {
                app.task_form.org.pop();
            }
            None => {}
        },
        _ => {}
    }
}

/// Validates and submits the task form. The empty-target check runs here,
/// before anything touches the network.
fn submit_task(app: &mut App, client: &Arc<ApiClient>, tx: &mpsc::UnboundedSender<AppEvent>) {
    let target_text = app.task_form.target_text();
    if target_text.is_empty() {
        app.notice = Some("at least one target is required".to_string());
        return;
    }
    let org_id = match app.task_form.org.trim() {
        "" => 0,
        raw => match raw.parse::<u64>() {
            Ok(id) => id,
            Err(_) => {
                app.notice = Some("org id must be a number".to_string());
                return;
            }
        },
    };

    let options = app.task_form.options;
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.submit_task(&target_text, org_id, &options).await;
        let _ = tx.send(AppEvent::Submitted(result));
    });
}
