//! subscout - passive subdomain discovery
//!
//! Hosts go to stdout, logs and statistics to stderr.

mod cli;

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use subscout_core::{ProviderConfig, ResultKind, Session};
use subscout_engine::{Agent, HttpSession, SourceRegistry};

use cli::Args;

#[derive(Serialize)]
struct HostLine<'a> {
    host: &'a str,
    source: &'a str,
}

fn init_tracing(args: &Args) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // Load .env file if present (provider keys via SUBSCOUT_<NAME>_KEYS)
    dotenvy::dotenv().ok();

    // RUST_LOG takes precedence
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let base = if args.silent { "error" } else { "info" };
        let mut filter = EnvFilter::new(base);
        if args.verbose {
            for directive in [
                "subscout=debug",
                "subscout_core=debug",
                "subscout_engine=debug",
                "subscout_sources=debug",
            ] {
                if let Ok(directive) = directive.parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }
        filter
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .compact()
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(args.verbose);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

fn load_provider_config(args: &Args, registry: &SourceRegistry) -> Result<ProviderConfig> {
    let path = args.provider_config.clone().or_else(ProviderConfig::default_path);

    let mut config = match &path {
        Some(path) => ProviderConfig::load_or_default(path)
            .with_context(|| format!("Failed to load provider config {}", path.display()))?,
        None => ProviderConfig::new(),
    };
    config.merge_env(registry.names());
    Ok(config)
}

fn list_sources(registry: &SourceRegistry) {
    println!("Available sources ({}), * requires an API key:", registry.len());
    for info in registry.list() {
        let key = if info.needs_key { "*" } else { "" };
        let mut flags = Vec::new();
        if info.is_default {
            flags.push("default");
        }
        if info.has_recursive_support {
            flags.push("recursive");
        }
        println!("  {:<16}{:<2} {}", info.name, key, flags.join(", "));
    }
}

async fn enumerate_domain(
    args: &Args,
    agent: &Agent,
    session: Arc<dyn Session>,
    cancel: &CancellationToken,
    domain: &str,
) -> Result<usize> {
    let mut rx = agent.enumerate_with_timeout(cancel, domain, session, args.max_time());
    let mut seen = HashSet::new();
    let mut stdout = std::io::stdout().lock();

    while let Some(result) = rx.recv().await {
        match &result.kind {
            ResultKind::Subdomain(host) => {
                if !seen.insert(host.clone()) {
                    continue;
                }
                if args.json {
                    let line = serde_json::to_string(&HostLine {
                        host,
                        source: &result.source,
                    })?;
                    writeln!(stdout, "{}", line)?;
                } else {
                    writeln!(stdout, "{}", host)?;
                }
            }
            ResultKind::Error(error) => {
                warn!(source = %result.source, error = %error, "[Enumerate] Source failed");
            }
        }
    }
    stdout.flush()?;

    info!(domain, found = seen.len(), "[Enumerate] Unique subdomains found");
    Ok(seen.len())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let registry = SourceRegistry::with_all_sources();

    if args.list_sources {
        list_sources(&registry);
        return Ok(());
    }

    let provider_config = load_provider_config(&args, &registry)?;
    registry.apply_provider_config(&provider_config);

    let agent = Agent::new(&registry, &args.selection());
    if agent.is_empty() {
        anyhow::bail!("No sources selected");
    }

    let session: Arc<dyn Session> = Arc::new(
        HttpSession::new(&args.session_config()).context("Failed to create HTTP session")?,
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("[Main] Interrupted, stopping enumeration");
                cancel.cancel();
            }
        });
    }

    for domain in &args.domains {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            continue;
        }
        if cancel.is_cancelled() {
            break;
        }

        let outcome = enumerate_domain(&args, &agent, session.clone(), &cancel, &domain).await;
        // sources stopped by the deadline may still be returning
        agent.wait_finished().await;
        outcome?;

        if args.stats {
            eprintln!();
            eprint!("{}", agent.statistics().render_table());
        }
    }

    Ok(())
}
