mod commands;
mod config;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    spawn_controller, ControllerHandle, FetchMode, ListController, ListParams,
    RemoteCollectionClient, RuntimeOptions,
};
use shared::protocol::{SortOption, StatusFilter};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::{
    commands::{parse_line, ReplAction, HELP},
    config::{load_settings, Settings},
    render::{position, render, RenderOptions},
};

/// Browse the character collection from the terminal.
#[derive(Parser, Debug)]
#[command(name = "browser", version)]
struct Args {
    /// Config file; defaults to ./browser.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_url: Option<String>,
    /// eager or single-page.
    #[arg(long)]
    mode: Option<FetchMode>,
    #[arg(long, default_value_t = SortOption::NameAsc)]
    sort: SortOption,
    #[arg(long, default_value_t = StatusFilter::All)]
    status: StatusFilter,
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
    /// Cards per local page in eager mode.
    #[arg(long)]
    page_size: Option<usize>,
    /// Print the first settled listing and exit.
    #[arg(long)]
    once: bool,
}

impl Args {
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(api_url) = &self.api_url {
            settings.api_url = api_url.clone();
        }
        if let Some(mode) = self.mode {
            settings.fetch_mode = mode;
        }
        if let Some(page_size) = self.page_size.filter(|size| *size > 0) {
            settings.page_size = page_size;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    args.apply_to(&mut settings);

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    let client = RemoteCollectionClient::with_timeout(&settings.api_url, settings.request_timeout())
        .context("invalid collection URL")?;
    info!(url = %client.collection_url(), mode = %settings.fetch_mode, "starting browser");

    let controller = ListController::with_params(
        settings.fetch_mode,
        ListParams {
            sort: args.sort,
            status_filter: args.status,
            page: args.page,
        },
    );
    let (handle, task) = spawn_controller(
        controller,
        Arc::new(client),
        RuntimeOptions {
            fetch_timeout: settings.fetch_timeout(),
            ..RuntimeOptions::default()
        },
    );
    let render_options = RenderOptions {
        mode: settings.fetch_mode,
        page_size: settings.page_size,
    };

    let outcome = if args.once {
        print_once(&handle, &render_options).await
    } else {
        interactive(&handle, &render_options).await
    };

    // The runtime may already be gone if every fetch path failed hard.
    let _ = handle.shutdown().await;
    task.await.context("list controller task panicked")?;
    outcome
}

async fn print_once(handle: &ControllerHandle, options: &RenderOptions) -> Result<()> {
    let snapshot = handle
        .wait_for(|snapshot| snapshot.phase.is_settled())
        .await
        .context("list controller stopped before loading finished")?;
    print!("{}", render(&snapshot, options));
    if let Some(error) = snapshot.error {
        bail!(error);
    }
    Ok(())
}

async fn interactive(handle: &ControllerHandle, options: &RenderOptions) -> Result<()> {
    let mut snapshots = handle.snapshots();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut status = String::new();

    print!("{}", render(&snapshots.borrow_and_update(), options));
    println!("Type 'help' for commands.");

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!("list controller stopped");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print!("{}", render(&snapshot, options));
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let here = position(&handle.snapshot(), options);
                match parse_line(&line, here) {
                    Ok(None) => {}
                    Ok(Some(ReplAction::Help)) => println!("{HELP}"),
                    Ok(Some(ReplAction::Quit)) => break,
                    Ok(Some(ReplAction::Dispatch(command))) => {
                        if !handle.try_dispatch(command, &mut status) {
                            eprintln!("{status}");
                        }
                    }
                    Err(message) => eprintln!("{message}"),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_settings() {
        let args = Args::parse_from([
            "browser",
            "--api-url",
            "http://localhost:8080/api/character",
            "--mode",
            "single-page",
            "--page-size",
            "5",
            "--status",
            "dead",
            "--sort",
            "date-desc",
        ]);
        let mut settings = Settings::default();
        args.apply_to(&mut settings);

        assert_eq!(settings.api_url, "http://localhost:8080/api/character");
        assert_eq!(settings.fetch_mode, FetchMode::SinglePage);
        assert_eq!(settings.page_size, 5);
        assert_eq!(args.status, StatusFilter::Dead);
        assert_eq!(args.sort, SortOption::DateDesc);
        assert_eq!(args.page, 1);
    }

    #[test]
    fn rejects_page_zero_and_unknown_mode() {
        assert!(Args::try_parse_from(["browser", "--page", "0"]).is_err());
        assert!(Args::try_parse_from(["browser", "--mode", "lazy"]).is_err());
    }

    #[test]
    fn absent_flags_keep_settings() {
        let args = Args::parse_from(["browser"]);
        let mut settings = Settings::default();
        args.apply_to(&mut settings);
        assert_eq!(settings, Settings::default());
        assert!(!args.once);
    }
}
