//! Application entry point and runtime initialization.

use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

mod api;
mod config;
mod creds;
mod model;
mod report;
mod worker;

use config::Config;
use creds::{Credential, FileCredentialStore};
use model::Role;
use worker::{WorkerCmd, WorkerEvent};

/// Initialize file logging and keep the async guard alive.
fn init_logging() -> Result<WorkerGuard> {
    let log_file = "fieldreport.log";
    // Log to a file so stdout stays free for the item listing.
    let file_appender = tracing_appender::rolling::never(".", log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
    tracing::info!("logging to {}", log_file);
    Ok(guard)
}

/// Resolve the engineer credential: the remembered cache first, then the
/// environment, the way the login screen pre-fills before asking the user.
async fn resolve_credential(store: &FileCredentialStore) -> Option<Credential> {
    if let Some(cached) = store.load(Role::Engineer).await {
        tracing::info!("using remembered credentials for {}", cached.username);
        return Some(cached);
    }
    let username = std::env::var("FIELDREPORT_USERNAME").ok()?;
    let password = std::env::var("FIELDREPORT_PASSWORD").ok()?;
    Some(Credential {
        username,
        password,
        remember_me: std::env::var("FIELDREPORT_REMEMBER").is_ok(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_logging()?;
    tracing::info!("app starting");

    let cfg_path = PathBuf::from("config.toml");
    let cfg = Config::load_or_default(&cfg_path)?;

    let creds = FileCredentialStore::new("credentials.json");
    let Some(credential) = resolve_credential(&creds).await else {
        eprintln!(
            "no credentials: set FIELDREPORT_USERNAME / FIELDREPORT_PASSWORD \
             (and FIELDREPORT_REMEMBER=1 to cache them)"
        );
        return Ok(());
    };

    // Command/event channels to the background worker.
    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, mut rx_ev) = mpsc::channel::<WorkerEvent>(256);
    tokio::spawn(worker::run(rx_cmd, tx_ev, cfg, creds));

    tx_cmd
        .send(WorkerCmd::Login {
            role: Role::Engineer,
            credential: credential.clone(),
        })
        .await?;
    tx_cmd
        .send(WorkerCmd::RefreshWorkItems {
            role: Role::Engineer,
            username: credential.username.clone(),
            password: credential.password.clone(),
        })
        .await?;

    // Drain events until the listing (or a failure) arrives.
    while let Some(ev) = rx_ev.recv().await {
        match ev {
            WorkerEvent::LoginSucceeded {
                role,
                already_processed,
            } => {
                if already_processed {
                    tracing::info!("backend reported a duplicate login, continuing");
                }
                println!("logged in as {} ({})", credential.username, role.as_str());
            }
            WorkerEvent::WorkItemsLoaded(items) => {
                if items.is_empty() {
                    println!("no work items found");
                } else {
                    println!("{} assigned work item(s):", items.len());
                    for item in &items {
                        println!(
                            "  {}  {}  [{}]",
                            item.id,
                            item.client_name,
                            item.status().as_str()
                        );
                    }
                }
                break;
            }
            WorkerEvent::Error(msg) => {
                eprintln!("error: {msg}");
                break;
            }
            WorkerEvent::Log(msg) => tracing::info!("{msg}"),
            _ => {}
        }
    }

    tracing::info!("app exiting");
    Ok(())
}
