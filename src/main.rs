mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use renderdoc_fetch::config::{
    apply_settings, default_request, load_settings, settings_from_env, APP_NAME,
};
use renderdoc_fetch::download::HttpDownloader;
use renderdoc_fetch::install::{ensure_installed, library_path};
use renderdoc_fetch::platform::OsProfile;
use renderdoc_fetch::probe::installation_state;
use renderdoc_fetch::types::{InstallRequest, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli)?;

    match cli.command {
        Commands::Version => {
            println!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));
        }

        Commands::Path => {
            let (request, profile) = resolve(&cli)?;
            println!("{}", library_path(&request, profile).display());
        }

        Commands::Status => {
            let (request, profile) = resolve(&cli)?;
            let state = installation_state(&request.installation_root, profile, &request.version);
            let label = if state.present { "installed" } else { "missing" };
            println!("RenderDoc {}: {}", request.version, label);
            println!("  Library: {}", state.library_path.display());
        }

        Commands::Install => {
            let (request, profile) = resolve(&cli)?;
            let downloader =
                HttpDownloader::new(request.download_timeout)?.with_progress(!cli.quiet);

            match ensure_installed(&request, profile, &downloader).await {
                Ok(outcome) => {
                    if !outcome.did_work {
                        tracing::info!("Nothing to do, RenderDoc {} is up to date", request.version);
                    }
                    println!("{}", outcome.library_path.display());
                }
                Err(e) => {
                    tracing::error!("Failed to install RenderDoc {}: {}", request.version, e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn resolve(cli: &Cli) -> Result<(InstallRequest, &'static OsProfile)> {
    let request = build_request(cli)?;
    let profile = OsProfile::for_host()?;
    tracing::debug!("Install request: {:?}", request);
    Ok((request, profile))
}

/// Defaults, then the settings file, then the environment, then flags.
fn build_request(cli: &Cli) -> Result<InstallRequest> {
    let mut request = default_request(&cli.build_dir);

    if let Some(path) = &cli.config {
        let settings = load_settings(path)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        apply_settings(&mut request, &settings);
    }

    apply_settings(&mut request, &settings_from_env());

    let flags = Settings {
        version: cli.renderdoc_version.clone(),
        installation_dir: cli.install_dir.clone(),
        download_dir: cli.download_dir.clone(),
        offline: cli.offline.then_some(true),
        download_timeout_secs: cli.timeout,
    };
    apply_settings(&mut request, &flags);

    Ok(request)
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use std::io::IsTerminal;
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}
