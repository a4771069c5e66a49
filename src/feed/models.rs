use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// One trade object as returned by the data API.
///
/// Every field is optional: the feed is not versioned and keys come and go.
/// Presence of the required subset is checked by the normalizer.
/// Numeric fields stay as raw JSON values since the API has served both
/// numbers and numeric strings for them.
///
/// Required fields use `Option<Option<_>>` (or `Some(Value::Null)`) so that
/// a key sent as `null` still counts as present for the schema check.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrade {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub proxy_wallet: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub event_slug: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub price: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub size: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub condition_id: Option<String>,
    /// Anything else the API sent along.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Marks a key as seen even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl RawTrade {
    /// Whether the payload carried `field` (by its wire name).
    ///
    /// Required fields count as present even when `null`; for the rest a
    /// `null` is the same as an absent key.
    pub fn has_field(&self, field: &str) -> bool {
        match field {
            "name" => self.name.is_some(),
            "proxyWallet" => self.proxy_wallet.is_some(),
            "eventSlug" => self.event_slug.is_some(),
            "price" => self.price.is_some(),
            "size" => self.size.is_some(),
            "timestamp" => self.timestamp.is_some(),
            "transactionHash" => self.transaction_hash.is_some(),
            "title" => self.title.is_some(),
            "outcome" => self.outcome.is_some(),
            "side" => self.side.is_some(),
            "asset" => self.asset.is_some(),
            "conditionId" => self.condition_id.is_some(),
            other => self.extra.get(other).map_or(false, |v| !v.is_null()),
        }
    }

    /// Unix seconds of the trade, if the timestamp can be read as a number.
    pub fn unix_seconds(&self) -> Option<f64> {
        self.timestamp.as_ref().and_then(numeric)
    }
}

/// Reads a JSON number or numeric string as `f64`.
pub fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    parsed.is_finite().then_some(parsed)
}
