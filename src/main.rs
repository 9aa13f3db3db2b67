use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::sync::mpsc;

use team_chat::common::ChatCommand;
use team_chat::config::{self, AppConfig};
use team_chat::network::{ChatClient, HttpChatApi};
use team_chat::session::Session;
use team_chat::sync::ChatCoordinator;
use team_chat::ui::ChatApp;
use team_chat::ui::format::format_time;

#[derive(Parser)]
#[command(name = "team_chat", version, about = "Team chat client with background polling")]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Bearer token (overrides CHAT_TOKEN)
    #[arg(long)]
    token: Option<String>,
    /// Username used to mark own messages (overrides CHAT_USERNAME)
    #[arg(long)]
    username: Option<String>,
    /// Backend base URL (overrides CHAT_API_URL and the config file)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Print incoming messages to stdout until Ctrl-C (no UI)
    Tail,
    /// Write the default config file and exit
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    if cli.mode == Some(Mode::InitConfig) {
        config::save_config(&cli.config, &AppConfig::default())?;
        println!("Wrote default config to {}", cli.config);
        return Ok(());
    }

    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env_overrides();
    if let Some(url) = cli.api_url.clone() {
        app_config.api_base_url = url;
    }

    let mut session = Session::from_env();
    if let Some(token) = cli.token.clone() {
        session.token = token;
    }
    if let Some(username) = cli.username.clone() {
        session.username = username;
    }

    let coordinator = build_coordinator(&app_config, session.clone())?;

    if cli.mode == Some(Mode::Tail) {
        run_tail(coordinator).await;
        return Ok(());
    }

    run_window(coordinator, session).await
}

fn build_coordinator(
    app_config: &AppConfig,
    session: Session,
) -> Result<ChatCoordinator, Box<dyn Error>> {
    let api = HttpChatApi::new(
        &app_config.api_base_url,
        &session.token,
        app_config.request_timeout(),
    )?;
    log::info!(
        "Using chat backend {} (poll every {} ms)",
        app_config.api_base_url,
        app_config.poll_interval_ms
    );
    Ok(ChatCoordinator::new(
        Arc::new(api),
        session,
        app_config.poll_interval(),
    ))
}

async fn run_tail(mut coordinator: ChatCoordinator) {
    if let Err(err) = coordinator.initialize().await {
        eprintln!("{err}");
        if !coordinator.is_polling() {
            return;
        }
    }

    for message in coordinator.sorted_messages() {
        print_message(&message);
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = coordinator.next_notification() => {
                let Some(event) = event else { break };
                for message in coordinator.on_notification(event) {
                    print_message(&message);
                }
            }
        }
    }

    coordinator.teardown();
}

fn print_message(message: &team_chat::common::ChatMessage) {
    let time = format_time(message.sent_time(), chrono::Utc::now());
    println!("[{time:>6}] {}: {}", message.username, message.message);
}

async fn run_window(
    coordinator: ChatCoordinator,
    session: Session,
) -> Result<(), Box<dyn Error>> {
    // UI -> chat task
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // chat task -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    let chat_task = tokio::spawn(ChatClient::new(coordinator, event_tx, cmd_rx).run());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Team Chat")
            .with_inner_size([420.0, 640.0]),
        ..Default::default()
    };
    let ui_cmd_tx = cmd_tx.clone();

    let result = eframe::run_native(
        "Team Chat",
        options,
        Box::new(move |cc| Ok(Box::new(ChatApp::new(cc, session, ui_cmd_tx, event_rx)))),
    );

    // Window closed: stop polling before the runtime goes away.
    if cmd_tx.send(ChatCommand::Shutdown).await.is_err() {
        log::debug!("Chat task already stopped");
    }
    if let Err(err) = chat_task.await {
        log::error!("Chat task terminated: {err}");
    }

    result.map_err(|err| err.to_string().into())
}
