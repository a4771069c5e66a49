//! Raw trade payloads to uniform, typed records.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::constants::{DROPPED_FIELDS, REQUIRED_FIELDS};
use crate::error::{Error, Result};
use crate::feed::models::{numeric, RawTrade};

/// A trade with every field the pipeline relies on present and parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTrade {
    pub name: String,
    pub wallet_address: String,
    pub event_slug: String,
    pub price: f64,
    pub size: f64,
    pub cost: f64,
    pub event_time_utc: DateTime<Utc>,
    /// Same instant in the configured local zone, pinned to that zone's
    /// offset at the time of the trade.
    pub event_time_local: DateTime<FixedOffset>,
    pub transaction_hash: Option<String>,
    pub title: Option<String>,
    pub outcome: Option<String>,
    pub side: Option<String>,
    pub asset: Option<String>,
    pub condition_id: Option<String>,
}

/// Normalizes one fetched page.
///
/// Fails only when a required field is absent from every record in the
/// batch. Individual records with unusable values are dropped.
pub fn normalize_batch(mut trades: Vec<RawTrade>, local_tz: Tz) -> Result<Vec<NormalizedTrade>> {
    if trades.is_empty() {
        return Ok(Vec::new());
    }

    let mut unknown = BTreeSet::new();
    for trade in &mut trades {
        for field in DROPPED_FIELDS {
            trade.extra.remove(*field);
        }
        unknown.extend(trade.extra.keys().cloned());
    }
    if !unknown.is_empty() {
        debug!("Ignoring unrecognized trade fields: {:?}", unknown);
    }

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !trades.iter().any(|t| t.has_field(field)))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::Schema { missing });
    }

    let total = trades.len();
    let records: Vec<NormalizedTrade> = trades
        .into_iter()
        .filter_map(|trade| normalize_trade(trade, local_tz))
        .collect();

    if records.len() < total {
        debug!("Dropped {} of {} trades with unusable values", total - records.len(), total);
    }

    Ok(records)
}

fn normalize_trade(trade: RawTrade, local_tz: Tz) -> Option<NormalizedTrade> {
    let price = trade.price.as_ref().and_then(numeric)?;
    let size = trade.size.as_ref().and_then(numeric)?;
    let cost = price * size;
    if !cost.is_finite() {
        return None;
    }

    let event_time_utc = utc_from_unix_seconds(trade.unix_seconds()?)?;
    let event_time_local = to_fixed_local(event_time_utc, local_tz);

    Some(NormalizedTrade {
        name: trade.name.flatten()?,
        wallet_address: trade.proxy_wallet.flatten()?,
        event_slug: trade.event_slug.flatten()?,
        price,
        size,
        cost,
        event_time_utc,
        event_time_local,
        transaction_hash: non_empty(trade.transaction_hash),
        title: trade.title,
        outcome: trade.outcome,
        side: trade.side,
        asset: trade.asset,
        condition_id: trade.condition_id,
    })
}

pub fn utc_from_unix_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let millis = (seconds * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

/// Converts into `tz` and freezes the resulting offset, so storage keeps
/// the local wall clock together with an unambiguous instant.
pub fn to_fixed_local(instant: DateTime<Utc>, tz: Tz) -> DateTime<FixedOffset> {
    let local = instant.with_timezone(&tz);
    let offset = local.offset().fix();
    instant.with_timezone(&offset)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Los_Angeles;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawTrade {
        serde_json::from_value(value).unwrap()
    }

    fn trade(name: &str, price: serde_json::Value, size: serde_json::Value, ts: serde_json::Value) -> RawTrade {
        raw(json!({
            "name": name,
            "proxyWallet": format!("0x{}", name),
            "eventSlug": "election",
            "price": price,
            "size": size,
            "timestamp": ts,
            "transactionHash": format!("0xtx-{}", name),
            "title": "Who wins?",
            "outcome": "Yes",
            "side": "BUY",
            "asset": "42",
            "conditionId": "0xcond",
            "profileImage": "https://example.com/a.png"
        }))
    }

    #[test]
    fn test_empty_batch_is_not_an_error() {
        let out = normalize_batch(Vec::new(), Los_Angeles).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_derived_fields() {
        let out = normalize_batch(vec![trade("alice", json!(0.5), json!(1600), json!(1704067200))], Los_Angeles).unwrap();

        assert_eq!(out.len(), 1);
        let t = &out[0];
        assert_eq!(t.wallet_address, "0xalice");
        assert_eq!(t.cost, 800.0);
        assert_eq!(t.event_time_utc.timestamp(), 1704067200);
        // January: Pacific Standard Time.
        assert_eq!(t.event_time_local.offset().local_minus_utc(), -8 * 3600);
        assert_eq!(t.event_time_local.to_rfc3339(), "2023-12-31T16:00:00-08:00");
        assert_eq!(t.event_time_local, t.event_time_utc);
        assert_eq!(t.transaction_hash.as_deref(), Some("0xtx-alice"));
        assert_eq!(t.condition_id.as_deref(), Some("0xcond"));
    }

    #[test]
    fn test_daylight_saving_offset() {
        let out = normalize_batch(vec![trade("bob", json!(1), json!(1), json!(1719835200))], Los_Angeles).unwrap();
        // July: Pacific Daylight Time.
        assert_eq!(out[0].event_time_local.offset().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let out = normalize_batch(vec![trade("carol", json!("0.25"), json!("400"), json!("1704067200"))], Los_Angeles).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].cost, 100.0);
    }

    #[test]
    fn test_unusable_records_are_dropped() {
        let batch = vec![
            trade("ok", json!(0.5), json!(10), json!(1704067200)),
            trade("bad_price", json!("n/a"), json!(10), json!(1704067200)),
            trade("bad_size", json!(0.5), json!(null), json!(1704067200)),
            trade("bad_ts", json!(0.5), json!(10), json!("yesterday")),
        ];

        let out = normalize_batch(batch, Los_Angeles).unwrap();

        let names: Vec<&str> = out.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ok"]);
    }

    #[test]
    fn test_empty_display_name_is_kept() {
        let out = normalize_batch(vec![trade("", json!(0.8), json!(1000), json!(1704067200))], Los_Angeles).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "");
        assert_eq!(out[0].cost, 800.0);
        assert_eq!(out[0].transaction_hash.as_deref(), Some("0xtx-"));
    }

    #[test]
    fn test_all_null_column_is_not_a_schema_error() {
        let mut batch = vec![
            trade("alice", json!(0.5), json!(10), json!(1704067200)),
            trade("bob", json!(0.5), json!(10), json!(1704067200)),
        ];
        for t in &mut batch {
            t.event_slug = Some(None);
        }

        let out = normalize_batch(batch, Los_Angeles).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_required_field_is_schema_error() {
        let batch = vec![raw(json!({
            "name": "alice",
            "proxyWallet": "0xa",
            "price": 0.5,
            "size": 10,
            "timestamp": 1704067200
        }))];

        let err = normalize_batch(batch, Los_Angeles).unwrap_err();
        match err {
            Error::Schema { missing } => assert_eq!(missing, vec!["eventSlug".to_string()]),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_field_present_in_some_records_is_not_missing() {
        let mut partial = trade("dave", json!(0.5), json!(10), json!(1704067200));
        partial.event_slug = None;
        let batch = vec![partial, trade("erin", json!(0.5), json!(10), json!(1704067200))];

        let out = normalize_batch(batch, Los_Angeles).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "erin");
    }

    #[test]
    fn test_output_only_contains_complete_records() {
        let batch = vec![
            trade("a", json!(0.1), json!(1), json!(1704067200)),
            trade("b", json!(null), json!(1), json!(1704067200)),
            trade("c", json!(0.3), json!("x"), json!(1704067200)),
            trade("d", json!(0.4), json!(2), json!(null)),
            trade("e", json!("1e400"), json!(2), json!(1704067200)),
        ];

        let out = normalize_batch(batch, Los_Angeles).unwrap();

        assert_eq!(out.len(), 1);
        for t in &out {
            assert!(t.price.is_finite() && t.size.is_finite() && t.cost.is_finite());
        }
    }
}
