//! Configuration shapes and loaders for the arbitrage strategy.
//!
//! The core never opens files or reads environment variables itself; these
//! are pure functions of an in-memory string, matching how configuration
//! loading elsewhere in this codebase only ever consumes an already-read
//! profile.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::market_data::MarketDataSource;
use crate::strategy::LegsFile;
use crate::strategy::arbitrage::ArbitrageParameters;

/// Parses the legs file from an in-memory TOML string.
pub fn legs_file_from_toml_str(contents: &str) -> Result<LegsFile> {
    toml::from_str(contents).context("failed to parse legs file TOML")
}

/// Parses the `key1=value1;key2=value2` parameter string into
/// [`ArbitrageParameters`].
///
/// Recognized keys: `market_data_source`, `max_age` (nanoseconds),
/// `threshold`, `quantity_0`, `min_position_0`, `max_position_0`,
/// `publish_source`. All are required; unknown keys are rejected.
pub fn parse_params(params: &str) -> Result<ArbitrageParameters> {
    let mut market_data_source = None;
    let mut max_age = None;
    let mut threshold = None;
    let mut quantity_0 = None;
    let mut min_position_0 = None;
    let mut max_position_0 = None;
    let mut publish_source = None;

    for entry in params.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("malformed parameter entry (expected key=value): {entry:?}"))?;
        let key = key.trim();
        let value = value.trim();
        match key {
            "market_data_source" => {
                market_data_source = Some(parse_market_data_source(value)?);
            }
            "max_age" => {
                let ns: u64 = value
                    .parse()
                    .with_context(|| format!("invalid max_age value: {value:?}"))?;
                max_age = Some(Duration::from_nanos(ns));
            }
            "threshold" => {
                threshold = Some(value.parse().with_context(|| format!("invalid threshold value: {value:?}"))?);
            }
            "quantity_0" => {
                quantity_0 = Some(value.parse().with_context(|| format!("invalid quantity_0 value: {value:?}"))?);
            }
            "min_position_0" => {
                min_position_0 =
                    Some(value.parse().with_context(|| format!("invalid min_position_0 value: {value:?}"))?);
            }
            "max_position_0" => {
                max_position_0 =
                    Some(value.parse().with_context(|| format!("invalid max_position_0 value: {value:?}"))?);
            }
            "publish_source" => {
                publish_source =
                    Some(value.parse().with_context(|| format!("invalid publish_source value: {value:?}"))?);
            }
            other => anyhow::bail!("unrecognized parameter key: {other:?}"),
        }
    }

    Ok(ArbitrageParameters {
        market_data_source: market_data_source.context("missing required parameter: market_data_source")?,
        max_age: max_age.context("missing required parameter: max_age")?,
        threshold: threshold.context("missing required parameter: threshold")?,
        quantity_0: quantity_0.context("missing required parameter: quantity_0")?,
        min_position_0: min_position_0.context("missing required parameter: min_position_0")?,
        max_position_0: max_position_0.context("missing required parameter: max_position_0")?,
        publish_source: publish_source.context("missing required parameter: publish_source")?,
    })
}

fn parse_market_data_source(value: &str) -> Result<MarketDataSource> {
    match value {
        "TOP_OF_BOOK" => Ok(MarketDataSource::TopOfBook),
        "MARKET_BY_PRICE" => Ok(MarketDataSource::MarketByPrice),
        "MARKET_BY_ORDER" => Ok(MarketDataSource::MarketByOrder),
        other => anyhow::bail!("unrecognized market_data_source: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_legs_file() {
        let toml_str = r#"
            strategy_id = "arb-1"

            [[legs]]
            source = 0
            account = "acct-a"
            exchange = "EX0"
            symbol = "SYM0"
            position_effect = "Open"
            margin_mode = "Cross"
            time_in_force = "Ioc"

            [[legs]]
            source = 1
            account = "acct-b"
            exchange = "EX1"
            symbol = "SYM1"
            position_effect = "Open"
            margin_mode = "Cross"
            time_in_force = "Ioc"
        "#;
        let legs_file = legs_file_from_toml_str(toml_str).unwrap();
        assert_eq!(legs_file.strategy_id, "arb-1");
        assert_eq!(legs_file.legs.len(), 2);
        assert_eq!(legs_file.legs[0].symbol, "SYM0");
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(legs_file_from_toml_str("not valid toml =====").is_err());
    }

    #[test]
    fn parses_params_string() {
        let parsed = parse_params(
            "market_data_source=TOP_OF_BOOK;max_age=1000;threshold=0.5;quantity_0=1;min_position_0=-10;max_position_0=10;publish_source=0",
        )
        .unwrap();
        assert_eq!(parsed.market_data_source, MarketDataSource::TopOfBook);
        assert_eq!(parsed.max_age, Duration::from_nanos(1000));
        assert_eq!(parsed.threshold, 0.5);
        assert_eq!(parsed.quantity_0, 1.0);
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = parse_params("threshold=0.5").unwrap_err();
        assert!(err.to_string().contains("missing required parameter"));
    }

    #[test]
    fn unknown_key_is_an_error() {
        let err = parse_params("bogus=1").unwrap_err();
        assert!(err.to_string().contains("unrecognized parameter key"));
    }
}
