use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::domain::{DayKey, UnitCode};

/// Every rate published for one (day, base unit) pair. Built whole from one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub day: DayKey,
    pub base: UnitCode,
    rates: HashMap<UnitCode, f64>,
}

impl RateEntry {
    pub fn new(day: DayKey, base: UnitCode, rates: HashMap<UnitCode, f64>) -> Self {
        Self { day, base, rates }
    }

    /// Parses the API body `{ "date": "...", "<base>": { "<unit>": <rate>, ... } }`.
    /// Entries whose key is not a usable unit code or whose value is not a number are skipped.
    pub fn from_api_body(day: DayKey, base: &UnitCode, body: &serde_json::Value) -> Result<Self> {
        let nested = body
            .get(base.as_str())
            .and_then(|v| v.as_object())
            .ok_or_else(|| {
                anyhow!("response for {} on {} has no '{}' rate table", base, day, base)
            })?;

        let rates = nested
            .iter()
            .filter_map(|(code, value)| {
                let code = UnitCode::new(code).ok()?;
                let rate = value.as_f64()?;
                Some((code, rate))
            })
            .collect();

        Ok(Self::new(day, base.clone(), rates))
    }

    pub fn rate(&self, unit: &UnitCode) -> Option<f64> {
        self.rates.get(unit).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Unit code → display name, sorted by code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitCatalog {
    units: BTreeMap<UnitCode, String>,
}

impl UnitCatalog {
    pub fn new(units: BTreeMap<UnitCode, String>) -> Self {
        Self { units }
    }

    pub fn from_api_body(body: &serde_json::Value) -> Result<Self> {
        let object = body
            .as_object()
            .context("catalog response is not a JSON object")?;

        let units = object
            .iter()
            .filter_map(|(code, name)| {
                let code = UnitCode::new(code).ok()?;
                let name = name.as_str().unwrap_or_default().to_string();
                Some((code, name))
            })
            .collect();

        Ok(Self { units })
    }

    pub fn name(&self, code: &UnitCode) -> Option<&str> {
        self.units.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &UnitCode) -> bool {
        self.units.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &UnitCode> {
        self.units.keys()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// "USD (US Dollar)" style label; bare upper-case code when the name is blank.
    pub fn label(&self, code: &UnitCode) -> String {
        match self.name(code) {
            Some(name) if !name.is_empty() => format!("{} ({})", code.display_label(), name),
            _ => code.display_label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn code(s: &str) -> UnitCode {
        UnitCode::new(s).unwrap()
    }

    #[test]
    fn parses_nested_rate_table() {
        let day: DayKey = "2025-11-22".parse().unwrap();
        let body = json!({
            "date": "2025-11-22",
            "gbp": { "usd": 1.2567, "eur": 1.1834, "BTC": 0.0000147, "junk": "n/a" }
        });

        let entry = RateEntry::from_api_body(day, &code("gbp"), &body).unwrap();
        assert_eq!(entry.rate(&code("usd")), Some(1.2567));
        assert_eq!(entry.rate(&code("btc")), Some(0.0000147));
        assert_eq!(entry.rate(&code("junk")), None);
        assert_eq!(entry.len(), 3);
    }

    #[test]
    fn missing_base_table_is_an_error() {
        let day: DayKey = "2025-11-22".parse().unwrap();
        let body = json!({ "date": "2025-11-22", "usd": { "gbp": 0.79 } });
        assert!(RateEntry::from_api_body(day, &code("gbp"), &body).is_err());
    }

    #[test]
    fn catalog_labels() {
        let body = json!({ "usd": "US Dollar", "xyz": "" });
        let catalog = UnitCatalog::from_api_body(&body).unwrap();
        assert_eq!(catalog.label(&code("usd")), "USD (US Dollar)");
        assert_eq!(catalog.label(&code("xyz")), "XYZ");
        assert!(UnitCatalog::from_api_body(&json!([1, 2])).is_err());
    }
}
