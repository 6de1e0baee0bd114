use anyhow::Result;
use clap::Parser;

mod app;
mod backend;
mod config;
mod dispatch;
mod handler;
mod health;
mod transcript;
mod tui;
mod ui;

use app::App;
use backend::BackendClient;
use config::Config;
use dispatch::Dispatcher;
use health::HealthMonitor;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "agent-chat")]
#[command(about = "Terminal chat client for the agent-routing backend")]
struct Cli {
    /// Backend base URL (overrides config file and AGENT_CHAT_URL)
    #[arg(long)]
    url: Option<String>,
}

fn init_logging() -> Result<()> {
    // The TUI owns stderr, so logs go to a file and only when asked for
    if std::env::var_os("RUST_LOG").is_some() {
        let log_file = std::fs::File::create("agent-chat.log")?;
        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(log_file)))
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let base_url = cli.url.unwrap_or_else(|| config.base_url());
    let backend = BackendClient::new(&base_url, config.chat_timeout());

    let (monitor, mut health_rx) = HealthMonitor::spawn(
        {
            let backend = backend.clone();
            move || {
                let backend = backend.clone();
                async move { backend.check_health().await }
            }
        },
        config.health_interval(),
    );

    let dispatcher = Dispatcher::new(backend, monitor.poke_sender());
    let mut app = App::new(dispatcher);
    let mut events = EventHandler::new();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app, &mut events, &mut health_rx).await;

    monitor.stop();
    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    app: &mut App,
    events: &mut EventHandler,
    health_rx: &mut tokio::sync::mpsc::UnboundedReceiver<health::HealthUpdate>,
) -> Result<()> {
    loop {
        // Probe results arrive between ticks; a closed channel just stops
        // producing and must not wake the loop.
        app.drain_health_updates(health_rx);

        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }

        app.poll_in_flight().await;

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
