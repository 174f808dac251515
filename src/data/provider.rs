use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use crate::config::{RATE_API, RateApiConfig};
use crate::domain::{DayKey, RateEntry, UnitCatalog, UnitCode};

#[cfg(debug_assertions)]
use crate::config::DF;

/// Abstract interface for the currency-rate service.
/// Both calls must be safe to repeat with identical arguments.
#[async_trait]
pub trait CurrencyApi: Send + Sync {
    /// Unit code → display name for every unit the service knows.
    async fn fetch_catalog(&self) -> Result<UnitCatalog>;

    /// Every rate quoted against `base` on `day`.
    async fn fetch_rates(&self, day: DayKey, base: &UnitCode) -> Result<RateEntry>;
}

pub struct HttpCurrencyApi {
    client: reqwest::Client,
    config: RateApiConfig,
}

impl HttpCurrencyApi {
    pub fn new(config: RateApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(RATE_API.client.user_agent)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("build reqwest client")?;

        Ok(Self { client, config })
    }

    fn rates_url(&self, day: DayKey, base: &UnitCode) -> String {
        format!(
            "{}@{}/{}/currencies/{}.json",
            self.config.base_url.trim_end_matches('/'),
            day,
            RATE_API.endpoints.api_version,
            base
        )
    }

    fn catalog_url(&self) -> String {
        format!(
            "{}@{}/{}/currencies.json",
            self.config.base_url.trim_end_matches('/'),
            RATE_API.endpoints.catalog_tag,
            RATE_API.endpoints.api_version
        )
    }

    /// GET with linear backoff. Client errors (4xx) are final: the date simply has no data.
    async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        let mut attempt = 0;
        loop {
            #[cfg(debug_assertions)]
            if DF.log_fetch {
                log::debug!("FETCH: GET {} (attempt {})", url, attempt + 1);
            }

            let response = self
                .client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status());

            match response {
                Ok(resp) => {
                    return resp
                        .json::<serde_json::Value>()
                        .await
                        .with_context(|| format!("decode JSON from {}", url));
                }
                Err(e) => {
                    let client_error = e.status().is_some_and(|s| s.is_client_error());
                    if client_error || attempt >= self.config.retries {
                        bail!("GET {} failed after {} attempt(s): {}", url, attempt + 1, e);
                    }
                    attempt += 1;

                    let wait = Duration::from_millis(self.config.backoff_ms * u64::from(attempt));
                    log::warn!(
                        "Request to {} failed ({}). Retrying in {:.1}s...",
                        url,
                        e,
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

#[async_trait]
impl CurrencyApi for HttpCurrencyApi {
    async fn fetch_catalog(&self) -> Result<UnitCatalog> {
        let body = self.get_json(&self.catalog_url()).await?;
        UnitCatalog::from_api_body(&body)
    }

    async fn fetch_rates(&self, day: DayKey, base: &UnitCode) -> Result<RateEntry> {
        let body = self.get_json(&self.rates_url(day, base)).await?;
        RateEntry::from_api_body(day, base, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_embed_date_and_base() {
        let config = RateApiConfig::with_base_url("https://example.test/api/");
        let api = HttpCurrencyApi::new(config).unwrap();
        let day: DayKey = "2025-01-03".parse().unwrap();
        let base = UnitCode::new("GBP").unwrap();

        assert_eq!(
            api.rates_url(day, &base),
            "https://example.test/api@2025-01-03/v1/currencies/gbp.json"
        );
        assert_eq!(
            api.catalog_url(),
            "https://example.test/api@latest/v1/currencies.json"
        );
    }
}
