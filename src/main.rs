use std::sync::Arc;

mod api;
mod config;
mod db;
mod error;
mod models;
mod queue;
mod scheduler;

use anyhow::Context;
use api::{create_router, AppState};
use config::Config;
use db::Repository;
use error::{AppError, Result};
use models::{NewUser, Role};
use queue::RabbitPublisher;
use scheduler::SchedulerService;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging (info by default, RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    let config = Config::load().context("Failed to load configuration")?;
    let repo = Arc::new(
        Repository::new(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path))?,
    );
    let publisher = Arc::new(RabbitPublisher::new(config.broker.clone())?);
    if config.broker.dry_run {
        tracing::warn!("Broker dry run enabled: messages are validated but not sent");
    }

    // --add-admin <username> <email>: bootstrap the first admin and exit
    if args.len() >= 4 && args[1] == "--add-admin" {
        let user = repo
            .create_user(NewUser {
                username: args[2].clone(),
                email: args[3].clone(),
                role: Role::Admin,
                subscription_id: 2,
            })
            .await?;
        println!("Created admin user {} (id {})", user.username, user.id);
        return Ok(());
    }

    let no_scheduler = args.iter().any(|arg| arg == "--no-scheduler");
    let listen_addr = config.listen_addr.clone();
    let scheduler_enabled = config.scheduler.enabled && !no_scheduler;
    let state = AppState::new(repo, publisher, config);

    // --tick "<cron>": run one cycle headless and exit
    if args.len() >= 3 && args[1] == "--tick" {
        match state.scheduler.tick(&args[2]).await? {
            Some(report) => {
                println!(
                    "{}: published {}, failed {}",
                    report.trigger.name(),
                    report.published,
                    report.failed.len()
                );
                for failure in &report.failed {
                    println!("  {}: {}", failure.item, failure.error);
                }
            }
            None => println!("No job registered for \"{}\"", args[2]),
        }
        return Ok(());
    }

    if scheduler_enabled {
        SchedulerService::new(Arc::clone(&state.scheduler)).start();
    } else {
        tracing::info!("Scheduler disabled");
    }

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;
    tracing::info!("Listening on {}", listen_addr);

    axum::serve(listener, create_router(state))
        .await
        .map_err(AppError::from)?;

    Ok(())
}
