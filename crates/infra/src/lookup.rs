//! Country metadata lookup used to decorate the dashboard's country
//! distribution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryMetadata {
    pub flag_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no metadata for country '{0}'")]
    UnknownCountry(String),

    #[error("country lookup request failed: {0}")]
    Network(String),

    #[error("country lookup response unreadable: {0}")]
    Parse(String),
}

#[async_trait]
pub trait CountryLookup: Send + Sync {
    async fn lookup(&self, country: &str) -> Result<CountryMetadata, LookupError>;
}

#[async_trait]
impl<S> CountryLookup for Arc<S>
where
    S: CountryLookup + ?Sized,
{
    async fn lookup(&self, country: &str) -> Result<CountryMetadata, LookupError> {
        (**self).lookup(country).await
    }
}

#[derive(Debug, Deserialize)]
struct RestCountry {
    flags: RestFlags,
}

#[derive(Debug, Deserialize)]
struct RestFlags {
    png: Option<String>,
    svg: Option<String>,
}

/// REST Countries client: `GET {base}/name/{country}?fields=flags`.
#[derive(Debug, Clone)]
pub struct RestCountriesLookup {
    client: reqwest::Client,
    base_url: String,
}

impl RestCountriesLookup {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

fn first_flag(countries: Vec<RestCountry>, country: &str) -> Result<CountryMetadata, LookupError> {
    countries
        .into_iter()
        .find_map(|c| c.flags.png.or(c.flags.svg))
        .map(|flag_url| CountryMetadata { flag_url })
        .ok_or_else(|| LookupError::UnknownCountry(country.to_string()))
}

#[async_trait]
impl CountryLookup for RestCountriesLookup {
    async fn lookup(&self, country: &str) -> Result<CountryMetadata, LookupError> {
        let url = format!("{}/name/{}", self.base_url, country);
        let resp = self
            .client
            .get(&url)
            .query(&[("fields", "flags")])
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::UnknownCountry(country.to_string()));
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| LookupError::Network(e.to_string()))?;
        let countries: Vec<RestCountry> = resp
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;
        first_flag(countries, country)
    }
}

/// Fixed table of flags. Used in tests and when running offline.
#[derive(Debug, Clone, Default)]
pub struct StaticCountryLookup {
    flags: HashMap<String, String>,
}

impl StaticCountryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, country: &str, flag_url: &str) -> Self {
        self.flags.insert(country.to_lowercase(), flag_url.to_string());
        self
    }
}

#[async_trait]
impl CountryLookup for StaticCountryLookup {
    async fn lookup(&self, country: &str) -> Result<CountryMetadata, LookupError> {
        self.flags
            .get(&country.to_lowercase())
            .map(|flag_url| CountryMetadata {
                flag_url: flag_url.clone(),
            })
            .ok_or_else(|| LookupError::UnknownCountry(country.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rest_countries_payload() {
        let body = r#"[{"flags":{"png":"https://flagcdn.com/w320/pe.png","svg":"https://flagcdn.com/pe.svg","alt":"flag"}}]"#;
        let countries: Vec<RestCountry> = serde_json::from_str(body).unwrap();
        let meta = first_flag(countries, "Peru").unwrap();
        assert_eq!(meta.flag_url, "https://flagcdn.com/w320/pe.png");
    }

    #[test]
    fn empty_payload_is_unknown_country() {
        assert_eq!(
            first_flag(Vec::new(), "Atlantis"),
            Err(LookupError::UnknownCountry("Atlantis".to_string()))
        );
    }

    #[tokio::test]
    async fn static_lookup_is_case_insensitive() {
        let lookup = StaticCountryLookup::new().with("Peru", "pe.png");
        assert_eq!(lookup.lookup("PERU").await.unwrap().flag_url, "pe.png");
        assert!(lookup.lookup("Chile").await.is_err());
    }
}
