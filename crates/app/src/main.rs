//! `signaldesk` terminal client.
//!
//! Submits market analyses to the workflow engine and follows each job
//! until it finishes, asks the chat workflow about a symbol, or lists
//! past analyses. Configuration is read from the environment (see
//! [`AppConfig::from_env`]); a `.env` file in the working directory is
//! loaded first.
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default: info for
//! the `signaldesk_*` crates). Rendered output goes to stdout.

use anyhow::Context;
use signaldesk_app::app::App;
use signaldesk_app::cli::{usage, Command};
use signaldesk_app::config::AppConfig;
use signaldesk_app::render;
use signaldesk_core::request::AnalysisRequest;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str =
    "signaldesk=info,signaldesk_app=info,signaldesk_backend=info,signaldesk_workflows=info,signaldesk_sync=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(args.as_slice()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{}", usage());
            std::process::exit(2);
        }
    };
    if command == Command::Help {
        println!("{}", usage());
        return Ok(());
    }

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let app = App::connect(&config)
        .await
        .context("Failed to connect to the backend")?;

    let result = match command {
        Command::Analyze(request) => analyze(&app, request).await,
        Command::Chat { symbol } => chat(&app, &symbol).await,
        Command::Logs => logs(&app).await,
        Command::Help => Ok(()),
    };

    app.sign_out().await;
    result
}

async fn analyze(app: &App, request: AnalysisRequest) -> anyhow::Result<()> {
    let mut screen = app.analysis_screen();
    let job_id = screen
        .submit(&request)
        .await
        .context("Could not start the analysis")?;
    println!(
        "Analysis {job_id} submitted for {} ({}, risk {}, gain {}).",
        request.pair, request.style, request.risk, request.gain
    );

    let mut rx = screen.watch();
    let mut last_rendered = String::new();
    let finished = loop {
        let progress = render::render_progress(&rx.borrow_and_update());
        if progress != last_rendered {
            println!("{progress}\n");
            last_rendered = progress;
        }
        if rx.borrow().is_terminal() {
            break true;
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break false;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(job_id = %job_id, "Cancelled by user");
                screen.cancel();
                println!("Cancelled.");
                break false;
            }
        }
    };

    if finished {
        println!("{}", render::render_outcome(&screen.view()));
    }
    screen.close().await;
    Ok(())
}

async fn chat(app: &App, symbol: &str) -> anyhow::Result<()> {
    let mut screen = app.chat_screen();
    let outcome = screen.ask(symbol).await;
    println!("{}", render::render_chat(screen.transcript()));
    outcome.map(|_| ()).context("Chat request failed")
}

async fn logs(app: &App) -> anyhow::Result<()> {
    let mut screen = app.history_screen();
    let entries = screen.refresh().await.context("Could not load history")?;
    println!("{}", render::render_history(entries));
    Ok(())
}
