//! Funding-Rate Arbitrage Engine
//! Mission: Surface perp markets whose funding pays the most, fast
//!
//! Pipeline: fetch snapshot -> parse records -> threshold filter -> rank.
//! Every stage after the fetch is pure, so a request can never leave
//! partial state behind.

use anyhow::Result;
use serde_json::Value;
use tracing::{info, warn};

use crate::models::MarketData;
use crate::scrapers::HyperliquidClient;

/// Minimum USD notional open interest for a market to qualify ($50M)
pub const DEFAULT_MIN_USD_OPEN_INTEREST: f64 = 50_000_000.0;

/// Result of one full pipeline run.
#[derive(Debug, Clone)]
pub struct FundingScan {
    /// Markets above the threshold, sorted by funding rate descending.
    pub markets: Vec<MarketData>,
    /// Parsed record count before filtering.
    pub total_markets: usize,
    /// Record count after filtering.
    pub filtered_markets: usize,
    /// First element of `markets`, when any survived the filter.
    pub highest_funding_rate: Option<MarketData>,
}

/// Funding arbitrage detection engine
pub struct FundingEngine {
    client: HyperliquidClient,
    min_usd_open_interest: f64,
}

impl FundingEngine {
    pub fn new(client: HyperliquidClient, min_usd_open_interest: f64) -> Self {
        Self {
            client,
            min_usd_open_interest,
        }
    }

    /// Scan Hyperliquid for funding arbitrage candidates.
    ///
    /// This is the main entry point: one upstream fetch, then the pure
    /// parse/filter/rank stages. Errors surface to the caller; the HTTP
    /// layer owns converting them into a failure envelope.
    pub async fn scan_opportunities(&self) -> Result<FundingScan> {
        let snapshot = self.client.fetch_meta_and_asset_ctxs().await?;

        let all_markets = parse_market_data(&snapshot);
        let total_markets = all_markets.len();

        let (markets, highest_funding_rate) =
            filter_and_rank(all_markets, self.min_usd_open_interest);

        info!(
            "Found {} markets with >${:.0}M USD open interest out of {} total",
            markets.len(),
            self.min_usd_open_interest / 1_000_000.0,
            total_markets
        );

        Ok(FundingScan {
            filtered_markets: markets.len(),
            total_markets,
            highest_funding_rate,
            markets,
        })
    }
}

/// Parse the raw "metaAndAssetCtxs" snapshot into market records.
///
/// The universe and asset-context arrays align positionally; surplus
/// context entries past the end of the universe are ignored. A snapshot
/// with fewer than two top-level elements yields no records. A record
/// that fails numeric conversion is dropped on its own, never the batch.
pub fn parse_market_data(snapshot: &Value) -> Vec<MarketData> {
    let Some(elements) = snapshot.as_array() else {
        return Vec::new();
    };
    if elements.len() < 2 {
        return Vec::new();
    }

    let universe = elements[0]
        .get("universe")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let asset_contexts = elements[1]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut markets = Vec::with_capacity(asset_contexts.len().min(universe.len()));

    for (i, ctx) in asset_contexts.iter().enumerate() {
        let Some(entry) = universe.get(i) else {
            break;
        };
        let Some(symbol) = entry.get("name").and_then(Value::as_str) else {
            warn!("Universe entry {} has no name, skipping", i);
            continue;
        };

        match parse_asset_ctx(symbol, ctx) {
            Ok(market) => markets.push(market),
            Err(e) => {
                warn!("Error parsing data for {}: {}", symbol, e);
                continue;
            }
        }
    }

    markets
}

fn parse_asset_ctx(symbol: &str, ctx: &Value) -> Result<MarketData> {
    if !ctx.is_object() {
        anyhow::bail!("asset context is not an object");
    }

    let mark_price = ctx_field_f64(ctx, "markPx")?;
    let funding_rate = ctx_field_f64(ctx, "funding")?;
    let open_interest = ctx_field_f64(ctx, "openInterest")?;
    let premium = ctx_field_f64(ctx, "premium")?;
    let day_volume = ctx_field_f64(ctx, "dayNtlVlm")?;
    let prev_day_price = ctx_field_f64(ctx, "prevDayPx")?;

    let price_change_24h = if prev_day_price > 0.0 && mark_price > 0.0 {
        (mark_price - prev_day_price) / prev_day_price * 100.0
    } else {
        0.0
    };

    Ok(MarketData {
        symbol: symbol.to_string(),
        mark_price,
        funding_rate,
        open_interest,
        premium,
        day_volume,
        price_change_24h,
    })
}

/// Coerce one string-or-null context field to f64.
///
/// Two-stage rule: a missing, null, or empty field defaults to zero; a
/// present value that does not parse as a number is a conversion error
/// (the caller drops that record).
fn ctx_field_f64(ctx: &Value, key: &str) -> Result<f64> {
    match ctx.get(key) {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| anyhow::anyhow!("non-numeric {}: {:?}", key, s)),
        Some(Value::Number(n)) => Ok(n.as_f64().unwrap_or(0.0)),
        Some(other) => anyhow::bail!("unexpected type for {}: {}", key, other),
    }
}

/// Filter by USD notional open interest and rank by funding rate.
///
/// The sort is stable, so markets with equal funding rates keep their
/// snapshot order. Returns the kept records plus the top earner.
pub fn filter_and_rank(
    markets: Vec<MarketData>,
    min_usd_open_interest: f64,
) -> (Vec<MarketData>, Option<MarketData>) {
    let mut filtered: Vec<MarketData> = markets
        .into_iter()
        .filter(|m| m.usd_open_interest() > min_usd_open_interest)
        .collect();

    filtered.sort_by(|a, b| {
        b.funding_rate
            .partial_cmp(&a.funding_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let highest = filtered.first().cloned();
    (filtered, highest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(mark: &str, funding: &str, oi: &str, prev: &str) -> Value {
        json!({
            "markPx": mark,
            "funding": funding,
            "openInterest": oi,
            "premium": "0",
            "dayNtlVlm": "1000000",
            "prevDayPx": prev,
        })
    }

    fn snapshot(names: &[&str], ctxs: Vec<Value>) -> Value {
        let universe: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
        json!([{ "universe": universe }, ctxs])
    }

    #[test]
    fn short_snapshot_yields_no_records() {
        assert!(parse_market_data(&json!([])).is_empty());
        assert!(parse_market_data(&json!([{ "universe": [] }])).is_empty());
        assert!(parse_market_data(&json!({"universe": []})).is_empty());
    }

    #[test]
    fn scenario_a_btc_kept_and_ranked() {
        let snap = snapshot(
            &["BTC"],
            vec![ctx("50000", "0.01", "2000", "49000")],
        );
        let all = parse_market_data(&snap);
        assert_eq!(all.len(), 1);
        assert!((all[0].price_change_24h - 2.0408163265306123).abs() < 1e-9);
        assert_eq!(all[0].usd_open_interest(), 100_000_000.0);

        let (filtered, highest) = filter_and_rank(all, DEFAULT_MIN_USD_OPEN_INTEREST);
        assert_eq!(filtered.len(), 1);
        assert_eq!(highest.unwrap().symbol, "BTC");
    }

    #[test]
    fn scenario_b_thin_market_filtered_out() {
        let snap = snapshot(&["BTC"], vec![ctx("50000", "0.01", "100", "49000")]);
        let all = parse_market_data(&snap);
        assert_eq!(all.len(), 1);

        let (filtered, highest) = filter_and_rank(all, DEFAULT_MIN_USD_OPEN_INTEREST);
        assert!(filtered.is_empty());
        assert!(highest.is_none());
    }

    #[test]
    fn scenario_c_surplus_context_ignored() {
        let snap = snapshot(
            &["BTC"],
            vec![
                ctx("50000", "0.01", "2000", "49000"),
                ctx("3000", "0.02", "50000", "2900"),
            ],
        );
        let all = parse_market_data(&snap);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].symbol, "BTC");
    }

    #[test]
    fn malformed_record_is_dropped_alone() {
        let snap = snapshot(
            &["BTC", "ETH", "SOL"],
            vec![
                ctx("50000", "0.01", "2000", "49000"),
                ctx("not-a-number", "0.02", "50000", "2900"),
                ctx("150", "0.03", "1000000", "140"),
            ],
        );
        let all = parse_market_data(&snap);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].symbol, "BTC");
        assert_eq!(all[1].symbol, "SOL");
    }

    #[test]
    fn non_object_context_is_skipped() {
        let snap = json!([
            { "universe": [{ "name": "BTC" }, { "name": "ETH" }] },
            ["garbage", ctx("3000", "0.02", "50000", "2900")],
        ]);
        let all = parse_market_data(&snap);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].symbol, "ETH");
    }

    #[test]
    fn missing_and_null_fields_default_to_zero() {
        let snap = json!([
            { "universe": [{ "name": "BTC" }] },
            [{ "markPx": "50000", "funding": null, "prevDayPx": "" }],
        ]);
        let all = parse_market_data(&snap);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].funding_rate, 0.0);
        assert_eq!(all[0].open_interest, 0.0);
        assert_eq!(all[0].day_volume, 0.0);
        // prev_day_price defaulted to 0 -> no derived change
        assert_eq!(all[0].price_change_24h, 0.0);
    }

    #[test]
    fn price_change_zero_when_either_price_nonpositive() {
        let snap = snapshot(
            &["A", "B"],
            vec![
                ctx("0", "0.01", "10", "49000"),
                ctx("50000", "0.01", "10", "0"),
            ],
        );
        let all = parse_market_data(&snap);
        assert_eq!(all[0].price_change_24h, 0.0);
        assert_eq!(all[1].price_change_24h, 0.0);
    }

    #[test]
    fn filter_is_monotonic_in_threshold() {
        let markets: Vec<MarketData> = (0..10)
            .map(|i| MarketData {
                symbol: format!("M{}", i),
                mark_price: 100.0,
                funding_rate: 0.001 * i as f64,
                open_interest: 1_000.0 * (i + 1) as f64,
                premium: 0.0,
                day_volume: 0.0,
                price_change_24h: 0.0,
            })
            .collect();

        let mut previous = usize::MAX;
        for threshold in [0.0, 100_000.0, 500_000.0, 1_000_000.0, f64::MAX] {
            let (kept, _) = filter_and_rank(markets.clone(), threshold);
            assert!(kept.len() <= previous);
            previous = kept.len();
        }
    }

    #[test]
    fn ranking_is_descending_and_stable_on_ties() {
        let make = |symbol: &str, funding: f64| MarketData {
            symbol: symbol.to_string(),
            mark_price: 1_000.0,
            funding_rate: funding,
            open_interest: 100_000.0,
            premium: 0.0,
            day_volume: 0.0,
            price_change_24h: 0.0,
        };

        let markets = vec![
            make("LOW", 0.001),
            make("TIE1", 0.02),
            make("HIGH", 0.05),
            make("TIE2", 0.02),
        ];

        let (kept, highest) = filter_and_rank(markets, 0.0);
        let order: Vec<&str> = kept.iter().map(|m| m.symbol.as_str()).collect();
        assert_eq!(order, vec!["HIGH", "TIE1", "TIE2", "LOW"]);
        assert_eq!(highest.unwrap().symbol, "HIGH");
    }

    #[test]
    fn highest_matches_first_kept_record() {
        let (kept, highest) = filter_and_rank(Vec::new(), 0.0);
        assert!(kept.is_empty());
        assert!(highest.is_none());
    }
}
