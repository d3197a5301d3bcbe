use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use appgate::backend::BackendRegistry;
use appgate::cli::{self, AppCommands};
use appgate::config::{self, Config};
use appgate::models::application::{ModelList, NewApplication};
use appgate::registry::Registry;
use appgate::store::sqlite::SqliteStore;
use appgate::{api, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "appgate=debug,tower_http=debug".into()),
    );
    let json_logs = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::App { command }) => handle_app_command(&cfg, command).await,
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    let state = AppState::initialize(cfg, BackendRegistry::with_defaults()).await?;
    tracing::info!(
        bindings = ?state.dispatcher.backends().bindings(),
        token_ttl_hours = state.config.token_ttl_hours,
        "gateway initialized"
    );

    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("appgate listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn handle_app_command(cfg: &Config, cmd: AppCommands) -> anyhow::Result<()> {
    let store = SqliteStore::connect(&cfg.database_url).await?;
    store.migrate().await?;
    let registry = Registry::new(store);

    match cmd {
        AppCommands::List => {
            let apps = registry.list().await?;
            if apps.is_empty() {
                println!("No applications found.");
            } else {
                println!(
                    "{:<38} {:<24} {:<10} {:<8} {}",
                    "KEY", "NAME", "BINDING", "ACTIVE", "MODELS"
                );
                for a in apps {
                    let models = if a.allowed_models.is_empty() {
                        "*".to_string()
                    } else {
                        a.allowed_models.join(",")
                    };
                    println!(
                        "{:<38} {:<24} {:<10} {:<8} {}",
                        a.key, a.name, a.binding, a.active, models
                    );
                }
            }
        }
        AppCommands::Create {
            name,
            binding,
            host,
            service_key,
            models,
            key,
            inactive,
            welcome_message,
        } => {
            let payload = NewApplication {
                key,
                host_address: host,
                service_key,
                models: models.map(ModelList::Csv),
                active: !inactive,
                welcome_message,
                ..NewApplication::new(name.clone(), binding.clone())
            };
            let key = registry.create(payload).await?;
            println!(
                "Application created:\n  Name:     {}\n  Key:      {}\n  Binding:  {}\n  Active:   {}",
                name, key, binding, !inactive
            );
        }
        AppCommands::Delete { key } => {
            registry.delete(&key).await?;
            println!("Application deleted.");
        }
    }
    Ok(())
}
