//! # Path Planning Scene Editor
//!
//! Desktop editor for preparing path planning scenes and watching a remote
//! particle-swarm optimizer solve them. The operator places circular
//! obstacles, a start and a goal on a square field; the editor sends the
//! scene to the optimizer over HTTP and draws the path snapshots the
//! optimizer pushes back over a Socket.IO channel.
//!
//! ## Architecture
//!
//! - **UI thread**: egui/eframe window rendering the published views
//! - **Embassy executor thread**: `editor_task` owns the scene controller and
//!   processes UI commands and push events one at a time
//! - **Push listener thread**: keeps the WebSocket connected and forwards
//!   decoded events
//!
//! Communication uses bounded `embassy_sync` channels in both directions.
//! Loading/connection status and alerts travel through `embassy_sync`
//! signals instead, so a full refresh queue can never swallow them.

use anyhow::Context;
use eframe::egui;
use embassy_executor::{Executor, Spawner};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use env_logger::Builder;
use log::LevelFilter;
use std::path::PathBuf;
use std::thread;

mod common;
mod remote;
mod scene;
mod ui;

use common::{DEFAULT_CONFIG_FILE, EditorConfig};
use remote::PushEvent;
use ui::{AppState, EditorStatus, UICommand, UIInbox, UIOutbox, UIRefreshState};

pub const UI_REFRESH_QUEUE_SIZE: usize = 100;
pub type UIRefreshQueue = embassy_sync::channel::Channel<CriticalSectionRawMutex, UIRefreshState, UI_REFRESH_QUEUE_SIZE>;
pub type UIRefreshQueueReceiver = embassy_sync::channel::Receiver<'static, CriticalSectionRawMutex, UIRefreshState, UI_REFRESH_QUEUE_SIZE>;
pub type UIRefreshQueueSender = embassy_sync::channel::Sender<'static, CriticalSectionRawMutex, UIRefreshState, UI_REFRESH_QUEUE_SIZE>;

pub type StatusSignal = embassy_sync::signal::Signal<CriticalSectionRawMutex, EditorStatus>;
pub type AlertSignal = embassy_sync::signal::Signal<CriticalSectionRawMutex, String>;

const UI_COMMAND_QUEUE_SIZE: usize = 100;
pub type UICommandQueue = embassy_sync::channel::Channel<CriticalSectionRawMutex, UICommand, UI_COMMAND_QUEUE_SIZE>;
pub type UICommandQueueReceiver = embassy_sync::channel::Receiver<'static, CriticalSectionRawMutex, UICommand, UI_COMMAND_QUEUE_SIZE>;
pub type UICommandQueueSender = embassy_sync::channel::Sender<'static, CriticalSectionRawMutex, UICommand, UI_COMMAND_QUEUE_SIZE>;

const PUSH_QUEUE_SIZE: usize = 100;
pub type PushQueue = embassy_sync::channel::Channel<CriticalSectionRawMutex, PushEvent, PUSH_QUEUE_SIZE>;
pub type PushQueueReceiver = embassy_sync::channel::Receiver<'static, CriticalSectionRawMutex, PushEvent, PUSH_QUEUE_SIZE>;
pub type PushQueueSender = embassy_sync::channel::Sender<'static, CriticalSectionRawMutex, PushEvent, PUSH_QUEUE_SIZE>;

fn embassy_init(spawner: Spawner, config: EditorConfig, outbox: UIOutbox, ui_command_rx: UICommandQueueReceiver, push_rx: PushQueueReceiver) {
    let _ = spawner.spawn(scene::task::editor_task(config, outbox, ui_command_rx, push_rx));
}

fn main() -> anyhow::Result<()> {
    // Logging setup; RUST_LOG overrides the defaults below
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("pso_path_editor"), LevelFilter::Debug)
        .parse_default_env()
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = EditorConfig::load_or_default(&config_path)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Could not load configuration from {}", config_path.display()))?;

    log::info!("Starting up, optimizer at {}", config.backend.url);

    // INTENTIONAL LEAK: the channels live for the whole process and embassy needs 'static endpoints.
    let ui_refresh_channel: &'static UIRefreshQueue = Box::leak(Box::new(UIRefreshQueue::new()));
    let ui_command_channel: &'static UICommandQueue = Box::leak(Box::new(UICommandQueue::new()));
    let push_channel: &'static PushQueue = Box::leak(Box::new(PushQueue::new()));
    let status_signal: &'static StatusSignal = Box::leak(Box::new(StatusSignal::new()));
    let alert_signal: &'static AlertSignal = Box::leak(Box::new(AlertSignal::new()));

    let outbox = UIOutbox {
        refresh_tx: ui_refresh_channel.sender(),
        status: status_signal,
        alerts: alert_signal,
    };
    let inbox = UIInbox {
        refresh_rx: ui_refresh_channel.receiver(),
        status: status_signal,
        alerts: alert_signal,
    };
    let ui_command_tx = ui_command_channel.sender();
    let ui_command_rx = ui_command_channel.receiver();
    let push_tx: PushQueueSender = push_channel.sender();
    let push_rx = push_channel.receiver();

    // Spawn Embassy executor on a dedicated background thread
    let task_config = config.clone();
    let _embassy_handle = thread::Builder::new()
        .name("embassy-executor".to_string())
        .spawn(move || {
            // Leak the executor to satisfy the 'static lifetime required by run()
            let executor: &'static mut Executor = Box::leak(Box::new(Executor::new()));
            executor.run(|spawner| embassy_init(spawner, task_config, outbox, ui_command_rx, push_rx));
        })
        .context("failed to spawn embassy thread")?;

    // The push listener blocks on its socket, so it gets a plain thread
    let backend = config.backend.clone();
    let _listener_handle = thread::Builder::new()
        .name("push-listener".to_string())
        .spawn(move || {
            remote::listener::run_push_listener(&backend, |event| embassy_futures::block_on(push_tx.send(event)));
        })
        .context("failed to spawn push listener thread")?;

    // Start the GUI on the main thread (required on macOS)
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 820.0]).with_title("UAV Path Planning"),
        ..Default::default()
    };
    eframe::run_native(
        "UAV Path Planning",
        native_options,
        Box::new(move |cc| Ok(Box::new(AppState::new(inbox, ui_command_tx, &config, cc.storage)))),
    )
    .map_err(|e| anyhow::anyhow!("UI terminated with an error: {}", e))
}
