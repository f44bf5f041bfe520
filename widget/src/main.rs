//! bitcoinprices command line
//!
//! Fetches the configured rate table and prints each BTC amount given on the
//! command line in every configured currency.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bitcoinprices_common::parse_amount;
use bitcoinprices_fx::{CurrencyConverter, HttpRateSource, PriceFormatter, RateSource, RateStore};
use bitcoinprices_widget::WidgetConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let config = WidgetConfig::from_env();
    config.validate()?;
    let url = config
        .url
        .clone()
        .context("BITCOINPRICES_URL must point at the rate data")?;

    let amounts = std::env::args()
        .skip(1)
        .map(|arg| parse_amount(&arg).with_context(|| format!("invalid amount: {}", arg)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let source = HttpRateSource::new(url)?;
    let store = RateStore::new();
    store.replace(source.fetch().await?);

    if let Some(snapshot) = store.snapshot_info() {
        info!(
            source = %snapshot.source,
            currencies = snapshot.currencies.len(),
            fetched_at = %snapshot.fetched_at,
            "Market data loaded"
        );
    }

    let base = config.price_original_currency.clone();
    let converter = CurrencyConverter::new(store, base.clone(), config.market_rate_variable.clone());
    let formatter = PriceFormatter::new(base.clone(), config.symbols.clone());

    for amount in amounts {
        let rendered = config
            .currencies
            .iter()
            .map(|currency| -> anyhow::Result<String> {
                let converted = converter.convert(amount, &base, currency)?;
                Ok(formatter.format(converted, currency, true))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        println!("{}", rendered.join(" | "));
    }

    Ok(())
}
