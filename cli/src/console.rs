//! Terminal rendering for notices, market rows and the submission journal

use mirror_core::{MarketCoin, Notice, Severity, Theme, TickerSnapshot};
use mirror_engine::Notifier;
use mirror_persistence::sqlite::SubmissionRow;

/// Prints notices to stderr so stdout stays machine-readable
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    theme: Theme,
}

impl ConsoleNotifier {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        eprintln!("{}", render_notice(&notice, self.theme));
    }
}

pub fn render_notice(notice: &Notice, theme: Theme) -> String {
    let marker = match notice.severity {
        Severity::Success => "[ok]",
        Severity::Info => "[i]",
        Severity::Error => "[!]",
    };
    let line = format!("{} {}: {}", marker, notice.title, notice.description);
    paint(&line, notice.severity, theme)
}

/// ANSI colors, tuned per theme
fn paint(text: &str, severity: Severity, theme: Theme) -> String {
    let code = match (severity, theme) {
        (Severity::Success, Theme::Dark) => "92",
        (Severity::Success, Theme::Light) => "32",
        (Severity::Error, Theme::Dark) => "91",
        (Severity::Error, Theme::Light) => "31",
        (Severity::Info, Theme::Dark) => "96",
        (Severity::Info, Theme::Light) => "34",
    };
    format!("\x1b[{}m{}\x1b[0m", code, text)
}

pub fn render_markets(coins: &[MarketCoin]) -> String {
    let mut out = format!(
        "{:<4} {:<24} {:<8} {:>14} {:>20}\n",
        "#", "Name", "Symbol", "Price (USD)", "Market Cap"
    );
    for (i, coin) in coins.iter().enumerate() {
        out.push_str(&format!(
            "{:<4} {:<24} {:<8} {:>14.4} {:>20.0}\n",
            i + 1,
            truncate(&coin.name, 24),
            coin.ticker(),
            coin.current_price,
            coin.market_cap
        ));
    }
    out
}

pub fn render_ticker(snapshot: &TickerSnapshot) -> String {
    let mut out = String::new();
    if snapshot.stale {
        out.push_str("(stale: last poll failed)\n");
    }
    if snapshot.quotes.is_empty() {
        out.push_str("no quotes yet\n");
        return out;
    }
    for q in &snapshot.quotes {
        let arrow = if q.is_up() { "+" } else { "" };
        out.push_str(&format!(
            "{:<16} {:>12.2} {:>14.0} {}{:.2}%\n",
            q.asset, q.price, q.volume, arrow, q.change
        ));
    }
    out
}

pub fn render_history(rows: &[SubmissionRow]) -> String {
    if rows.is_empty() {
        return "no submissions recorded\n".to_string();
    }
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            "#{:<5} {:<20} {:<10} {:<16} {}{}\n",
            row.id,
            row.created_at.as_deref().unwrap_or("-"),
            row.status,
            row.function,
            row.tx_hash.as_deref().unwrap_or("-"),
            row.error
                .as_deref()
                .map(|e| format!("  ({})", e))
                .unwrap_or_default()
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::{Error, TickerQuote};

    #[test]
    fn test_notice_colors_follow_theme() {
        let notice = Notice::failure("Failed to follow leader", &Error::UserRejected);
        let dark = render_notice(&notice, Theme::Dark);
        let light = render_notice(&notice, Theme::Light);
        assert!(dark.starts_with("\x1b[91m[!] Signing Failed"));
        assert!(light.starts_with("\x1b[31m"));
    }

    #[test]
    fn test_render_markets() {
        let coins = vec![MarketCoin {
            id: "bitcoin".into(),
            name: "Bitcoin".into(),
            symbol: Some("btc".into()),
            current_price: 64000.5,
            market_cap: 1.2e12,
            price_change_percentage_24h: None,
            total_volume: None,
        }];
        let out = render_markets(&coins);
        assert_eq!(out.lines().count(), 2);
        assert!(out.lines().nth(1).unwrap().contains("Bitcoin"));
    }

    #[test]
    fn test_render_stale_ticker() {
        let snapshot = TickerSnapshot {
            quotes: vec![TickerQuote {
                asset: "NSE_RELIANCE".into(),
                price: 2950.0,
                volume: 10.0,
                change: 1.25,
                timestamp: String::new(),
            }],
            fetched_at: None,
            stale: true,
        };
        let out = render_ticker(&snapshot);
        assert!(out.starts_with("(stale"));
        assert!(out.contains("+1.25%"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Bitcoin", 24), "Bitcoin");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
