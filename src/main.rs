//! `rtd`: inspect, test and run a routing rule set.
//!
//! # Architecture Overview
//!
//! ```text
//!   rules.toml ──▶ config::loader ──▶ config::validation ──▶ routing::builder
//!                        ▲                                        │
//!     file change ───────┤                                        ▼
//!     SIGHUP ────────────┘                               routing::store (ArcSwap)
//!                                                                 │
//!   request + candidate peers ──▶ routing::evaluator ◀────────────┘
//!                                        │
//!                                        ▼
//!                              scores ──▶ routing::ranking ──▶ caller sends
//! ```

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use diameter_rtd::config::loader::load_repository;
use diameter_rtd::lifecycle::{load_initial, Reloader, Shutdown};
use diameter_rtd::observability::{logging, metrics};
use diameter_rtd::routing::{rank, AttributeMap, Criteria, PeerInfo, RankPolicy};

#[derive(Parser)]
#[command(name = "rtd")]
#[command(about = "Score-based next-hop selection rules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a rules file
    Check { config: PathBuf },
    /// Print the rule set as built
    Dump {
        config: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Score candidate peers for a message
    Score {
        config: PathBuf,
        /// Candidate peer, as IDENTITY or IDENTITY@REALM
        #[arg(short, long = "peer", required = true)]
        peers: Vec<String>,
        /// Message attribute, as CRITERIA=VALUE (e.g. origin_host=client.example.com)
        #[arg(short, long = "attr")]
        attrs: Vec<String>,
        /// Show every candidate, ignoring the configured score floor
        #[arg(long)]
        raw: bool,
    },
    /// Keep the rules live, reloading on file change and SIGHUP
    Run { config: PathBuf },
}

fn parse_peer(arg: &str) -> PeerInfo {
    match arg.split_once('@') {
        Some((identity, realm)) => PeerInfo::new(identity).with_realm(realm),
        None => PeerInfo::new(arg),
    }
}

fn parse_attrs(args: &[String]) -> Result<AttributeMap, Box<dyn Error>> {
    let mut message = AttributeMap::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| format!("attribute '{}' is not CRITERIA=VALUE", arg))?;
        let criteria: Criteria = key.parse()?;
        if criteria == Criteria::All {
            return Err("'all' is not a message attribute".into());
        }
        message.insert(criteria, value);
    }
    Ok(message)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            logging::init_logging("warn");
            let (_, repo) = load_repository(&config)?;
            println!(
                "{}: ok ({} targets, {} rules)",
                config.display(),
                repo.target_count(),
                repo.rule_count()
            );
        }
        Commands::Dump { config, json } => {
            logging::init_logging("warn");
            let (_, repo) = load_repository(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&repo.dump())?);
            } else {
                print!("{}", repo);
            }
        }
        Commands::Score {
            config,
            peers,
            attrs,
            raw,
        } => {
            logging::init_logging("warn");
            let (settings, repo) = load_repository(&config)?;
            let message = parse_attrs(&attrs)?;
            let candidates: Vec<PeerInfo> = peers.iter().map(|p| parse_peer(p)).collect();

            let scored = diameter_rtd::routing::evaluate(&repo, &message, &candidates);
            let ranked = if raw {
                rank(scored)
            } else {
                RankPolicy::from(&settings.ranking).apply(scored)
            };
            for c in ranked {
                match &c.peer.realm {
                    Some(realm) => println!("{:>6}  {}@{}", c.score, c.peer.identity, realm),
                    None => println!("{:>6}  {}", c.score, c.peer.identity),
                }
            }
        }
        Commands::Run { config: path } => {
            // One read of the file drives logging, metrics and the first rule set.
            let (settings, store) = load_initial(&path)?;
            logging::init_logging(&settings.observability.log_level);
            tracing::info!(
                path = ?path,
                rules = store.get_for_read().map_or(0, |repo| repo.rule_count()),
                "rtd v{} starting",
                env!("CARGO_PKG_VERSION")
            );

            if settings.observability.metrics_enabled {
                match settings.observability.metrics_address.parse() {
                    Ok(addr) => {
                        metrics::init_metrics(addr)?;
                        if let Some(repo) = store.get_for_read() {
                            metrics::record_repository(repo.target_count(), repo.rule_count());
                        }
                    }
                    Err(_) => tracing::error!(
                        metrics_address = %settings.observability.metrics_address,
                        "Failed to parse metrics address"
                    ),
                }
            }

            let shutdown = Shutdown::new();
            let reloader = Reloader::spawn(store, path, &settings, &shutdown)?;

            shutdown.trigger_on_signal().await;
            reloader.join().await;
            tracing::info!("Shutdown complete");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_peer() {
        assert_eq!(parse_peer("a.node"), PeerInfo::new("a.node"));
        assert_eq!(
            parse_peer("a.node@example.com"),
            PeerInfo::new("a.node").with_realm("example.com")
        );
    }

    #[test]
    fn test_parse_attrs() {
        assert!(parse_attrs(&["oh=client.example.com".into(), "app=16777251".into()]).is_ok());
        assert!(parse_attrs(&["oh".into()]).is_err());
        assert!(parse_attrs(&["all=x".into()]).is_err());
        assert!(parse_attrs(&["colour=blue".into()]).is_err());
    }
}
