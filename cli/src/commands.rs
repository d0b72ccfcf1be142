//! Subcommand handlers

use crate::config::AppConfig;
use crate::console::{self, ConsoleNotifier};
use crate::{Command, PayloadCall, RulesAction, ThemeAction};
use anyhow::{Context, Result};
use mirror_core::{
    AccountAddress, LeaderAddress, Notice, NotificationConfig, RuleSet, Theme, TxHash,
};
use mirror_engine::submitter::{build_follow_payload, build_unfollow_payload, build_update_payload};
use mirror_engine::{
    load_statistics, spawn_ticker_poller, ChatSession, FilteredNotifier, HttpTickerSource,
    Notifier, TickerSource,
};
use mirror_networking::api::follow_status;
use mirror_networking::{MarketDataClient, NodeClient};
use mirror_persistence::{sqlite, Database, MarketCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const MARKET_CACHE_TTL: Duration = Duration::from_secs(60);

/// Shared pieces every command may need
struct Session {
    config: AppConfig,
    db: Database,
    theme: Theme,
    notifier: Arc<FilteredNotifier<ConsoleNotifier>>,
}

impl Session {
    async fn open(config: AppConfig) -> Result<Self> {
        let db_path = config.db_path();
        let db = Database::connect(&db_path)
            .await
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;

        let theme = sqlite::load_theme(db.pool()).await?;
        let notif_config = sqlite::load_notification_config(db.pool()).await?;
        let notifier = Arc::new(FilteredNotifier::new(
            ConsoleNotifier::new(theme),
            notif_config,
        ));

        Ok(Self {
            config,
            db,
            theme,
            notifier,
        })
    }

    fn market_client(&self) -> Result<MarketDataClient> {
        let cache = Arc::new(MarketCache::new(MARKET_CACHE_TTL));
        Ok(MarketDataClient::new_with_cache(&self.config.market_api, cache)?)
    }

    /// Fullnode client, checked reachable before use
    async fn node_client(&self) -> Result<NodeClient> {
        let node = NodeClient::new(&self.config.node_url)?
            .with_timing(self.config.confirm_poll, self.config.confirm_timeout);
        let ledger = node
            .ledger_info()
            .await
            .with_context(|| format!("fullnode {} is unreachable", node.api_base()))?;
        info!(
            "Connected to chain {} at ledger version {}",
            ledger.chain_id, ledger.ledger_version
        );
        Ok(node)
    }
}

pub async fn run(command: Command, config: AppConfig) -> Result<()> {
    let session = Session::open(config).await?;

    match command {
        Command::Stats { limit } => stats(&session, limit).await,
        Command::Ticker { once } => ticker(&session, once).await,
        Command::Chat => chat().await,
        Command::Payload { call } => payload(&session, call).await,
        Command::Confirm { hash } => confirm(&session, &hash).await,
        Command::Status { follower } => status(&session, &follower).await,
        Command::Rules { action } => rules(&session, action.unwrap_or(RulesAction::Show)).await,
        Command::History { limit, account } => history(&session, limit, account.as_deref()).await,
        Command::Theme { action } => theme(&session, action).await,
        Command::Notifications {
            enabled,
            show_success,
        } => notifications(&session, enabled, show_success).await,
    }
}

async fn stats(session: &Session, limit: u32) -> Result<()> {
    let client = session.market_client()?;
    let coins = load_statistics(&client, limit, session.notifier.as_ref()).await?;
    print!("{}", console::render_markets(&coins));
    Ok(())
}

async fn ticker(session: &Session, once: bool) -> Result<()> {
    let client = Arc::new(session.market_client()?);
    let source = Arc::new(HttpTickerSource::new(client, &session.config.ticker_url));

    if once {
        let quotes = source.fetch().await.context("ticker fetch failed")?;
        let snapshot = mirror_core::TickerSnapshot {
            quotes,
            fetched_at: None,
            stale: false,
        };
        print!("{}", console::render_ticker(&snapshot));
        return Ok(());
    }

    let notifier: Arc<dyn Notifier> = session.notifier.clone();
    let handle = spawn_ticker_poller(source, session.config.ticker_interval, notifier);
    let mut rx = handle.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                print!("{}", console::render_ticker(&snapshot));
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

async fn chat() -> Result<()> {
    let mut chat = ChatSession::new();
    for message in chat.messages() {
        println!("bot> {}\n", message.text);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if matches!(line, "exit" | "quit") {
            break;
        }
        if let Some(reply) = chat.send(line) {
            println!("bot> {}\n", reply.text);
        }
    }
    Ok(())
}

async fn payload(session: &Session, call: PayloadCall) -> Result<()> {
    let contract = session.config.contract();
    let draft = sqlite::load_rules_draft(session.db.pool()).await?;

    let payload = match call {
        PayloadCall::Follow { leader, rules } => {
            let leader = LeaderAddress::parse(&leader)?;
            build_follow_payload(&contract, &leader, &rules.apply(draft))?
        }
        PayloadCall::Unfollow { leader } => {
            build_unfollow_payload(&contract, &LeaderAddress::parse(&leader)?)
        }
        PayloadCall::Update { rules } => build_update_payload(&contract, &rules.apply(draft))?,
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

async fn confirm(session: &Session, hash: &str) -> Result<()> {
    let node = session.node_client().await?;
    let hash = TxHash::new(hash.trim());
    info!("Waiting up to {:?} for {}", node.confirm_timeout(), hash);

    match node.wait_for_transaction(&hash).await {
        Ok(confirmation) => {
            session
                .notifier
                .notify(Notice::success(format!("Transaction {} confirmed", hash)));
            println!("{}", serde_json::to_string_pretty(&confirmation)?);
            Ok(())
        }
        Err(e) => {
            session
                .notifier
                .notify(Notice::failure("Transaction failed", &e));
            Err(e.into())
        }
    }
}

async fn status(session: &Session, follower: &str) -> Result<()> {
    let node = session.node_client().await?;
    let follower = AccountAddress::new(follower.trim());
    let contract = session.config.contract();

    let registered = follow_status::is_following(&node, &contract, &follower).await?;
    if registered {
        println!("{} is following a leader", follower.short());
    } else {
        println!("{} is not following anyone", follower.short());
    }
    Ok(())
}

async fn rules(session: &Session, action: RulesAction) -> Result<()> {
    let pool = session.db.pool();
    let rules = match action {
        RulesAction::Show => sqlite::load_rules_draft(pool).await?,
        RulesAction::Save { rules } => {
            let updated = rules.apply(sqlite::load_rules_draft(pool).await?);
            updated.validate()?;
            sqlite::save_rules_draft(pool, &updated).await?;
            info!("Saved rule draft");
            updated
        }
        RulesAction::Reset => {
            let defaults = RuleSet::default();
            sqlite::save_rules_draft(pool, &defaults).await?;
            defaults
        }
    };
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(())
}

async fn history(session: &Session, limit: u32, account: Option<&str>) -> Result<()> {
    let rows = sqlite::recent_submissions(session.db.pool(), account, limit).await?;
    print!("{}", console::render_history(&rows));
    Ok(())
}

async fn theme(session: &Session, action: Option<ThemeAction>) -> Result<()> {
    let next = match action {
        None => session.theme,
        Some(ThemeAction::Toggle) => session.theme.toggle(),
        Some(ThemeAction::Light) => Theme::Light,
        Some(ThemeAction::Dark) => Theme::Dark,
    };
    if next != session.theme {
        sqlite::save_theme(session.db.pool(), next).await?;
    }
    println!("{}", next.as_str());
    Ok(())
}

async fn notifications(
    session: &Session,
    enabled: Option<bool>,
    show_success: Option<bool>,
) -> Result<()> {
    let mut config: NotificationConfig = session.notifier.config();
    if enabled.is_some() || show_success.is_some() {
        if let Some(v) = enabled {
            config.enabled = v;
        }
        if let Some(v) = show_success {
            config.show_success = v;
        }
        sqlite::save_notification_config(session.db.pool(), &config).await?;
        session.notifier.set_config(config.clone());
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
