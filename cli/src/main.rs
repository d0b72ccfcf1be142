//! Mirror trading shell
//!
//! Command-line front end: market data, live ticker, assistant chat, contract
//! payloads for an external wallet, confirmations and local settings.

mod commands;
mod config;
mod console;

use clap::{Args, Parser, Subcommand, ValueEnum};
use config::AppConfig;
use mirror_core::{parse_token_list, RuleSet};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mirror", version, about = "Mirror trading shell")]
struct Cli {
    /// Fullnode URL (overrides MIRROR_NODE_URL)
    #[arg(long, global = true)]
    node_url: Option<String>,

    /// Directory holding the local database (overrides MIRROR_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Top coins by market cap
    Stats {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Live ticker, refreshed until Ctrl-C
    Ticker {
        /// Fetch a single snapshot and exit
        #[arg(long)]
        once: bool,
    },
    /// Talk to the trading assistant
    Chat,
    /// Print the wallet payload for a contract call
    Payload {
        #[command(subcommand)]
        call: PayloadCall,
    },
    /// Wait for a submitted transaction to be committed
    Confirm { hash: String },
    /// Whether an account is registered as a follower on chain
    Status { follower: String },
    /// Saved follow rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },
    /// Submissions made from this machine
    History {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long)]
        account: Option<String>,
    },
    /// Show or change the color theme
    Theme { action: Option<ThemeAction> },
    /// Show or change notification preferences
    Notifications {
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        show_success: Option<bool>,
    },
}

#[derive(Subcommand, Debug)]
enum PayloadCall {
    /// follow_leader(leader, max_trade_size, tokens, delay, stop_loss, enabled)
    Follow {
        leader: String,
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// unfollow_leader(leader)
    Unfollow { leader: String },
    /// update_rules(max_trade_size, tokens, delay, stop_loss)
    Update {
        #[command(flatten)]
        rules: RuleArgs,
    },
}

#[derive(Subcommand, Debug)]
enum RulesAction {
    Show,
    Save {
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Restore the default rules
    Reset,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ThemeAction {
    Toggle,
    Light,
    Dark,
}

/// Rule overrides applied on top of the saved draft
#[derive(Args, Debug, Default, Clone)]
struct RuleArgs {
    #[arg(long)]
    max_trade_size: Option<f64>,
    /// Comma separated, e.g. APT,USDC
    #[arg(long)]
    tokens: Option<String>,
    #[arg(long)]
    delay: Option<u64>,
    #[arg(long)]
    stop_loss: Option<f64>,
    #[arg(long)]
    enabled: Option<bool>,
}

impl RuleArgs {
    fn apply(&self, mut rules: RuleSet) -> RuleSet {
        if let Some(v) = self.max_trade_size {
            rules.max_trade_size = v;
        }
        if let Some(ref tokens) = self.tokens {
            rules.allowed_tokens = parse_token_list(tokens);
        }
        if let Some(v) = self.delay {
            rules.delay_seconds = v;
        }
        if let Some(v) = self.stop_loss {
            rules.stop_loss_percent = v;
        }
        if let Some(v) = self.enabled {
            rules.enabled = v;
        }
        rules
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mirror_cli=info,mirror_engine=info,mirror_networking=info,mirror_persistence=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(url) = cli.node_url {
        config.node_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    tracing::debug!("Using data directory {}", config.data_dir.display());

    commands::run(cli.command, config).await
}
