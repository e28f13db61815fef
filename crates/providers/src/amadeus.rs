//! Amadeus flight offers source.
//!
//! OAuth client-credentials flow with a cached bearer token, then the
//! `/v2/shopping/flight-offers` search. Offers the API returns in shapes we
//! cannot read are skipped with a warning rather than failing the search.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use fareflow_core::config::{AmadeusConfig, SearchConfig};
use fareflow_core::domain::flight::RawOffer;

use crate::flights::{FlightSource, SearchQuery, SourceError};

const SOURCE_NAME: &str = "Amadeus";

/// Tokens nominally last 30 minutes; refresh five minutes early.
const TOKEN_LIFETIME_SECS: i64 = 25 * 60;

pub struct AmadeusSource {
    http: reqwest::Client,
    api_key: SecretString,
    api_secret: SecretString,
    token_url: String,
    offers_url: String,
    timeout_secs: u64,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<Offer>,
}

#[derive(Debug, Deserialize)]
struct Offer {
    #[serde(default)]
    itineraries: Vec<Itinerary>,
    price: Option<OfferPrice>,
}

#[derive(Debug, Deserialize)]
struct Itinerary {
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    departure: Endpoint,
    arrival: Endpoint,
    #[serde(rename = "carrierCode")]
    carrier_code: String,
    number: String,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    at: String,
}

#[derive(Debug, Deserialize)]
struct OfferPrice {
    total: String,
}

impl AmadeusSource {
    pub fn new(config: &AmadeusConfig, search: &SearchConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(search.http_timeout_secs))
            .build()
            .map_err(|error| SourceError::Unavailable {
                source: SOURCE_NAME.to_owned(),
                detail: format!("http client build failed: {error}"),
            })?;

        let base = config.base_url.trim_end_matches('/');
        Ok(Self {
            http,
            api_key: config.api_key.clone().unwrap_or_else(|| String::new().into()),
            api_secret: config.api_secret.clone().unwrap_or_else(|| String::new().into()),
            token_url: format!("{base}/v1/security/oauth2/token"),
            offers_url: format!("{base}/v2/shopping/flight-offers"),
            timeout_secs: search.http_timeout_secs,
            token: Mutex::new(None),
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> SourceError {
        if error.is_timeout() {
            SourceError::Timeout { source: SOURCE_NAME.to_owned(), timeout_secs: self.timeout_secs }
        } else {
            SourceError::Unavailable { source: SOURCE_NAME.to_owned(), detail: error.to_string() }
        }
    }

    async fn bearer_token(&self) -> Result<String, SourceError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.api_key.expose_secret()),
            ("client_secret", self.api_secret.expose_secret()),
        ];
        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|error| self.transport_error(error))?;

        if !response.status().is_success() {
            return Err(SourceError::Unavailable {
                source: SOURCE_NAME.to_owned(),
                detail: format!("token request returned {}", response.status()),
            });
        }

        let token: TokenResponse =
            response.json().await.map_err(|error| self.transport_error(error))?;
        debug!(event_name = "amadeus.token_refreshed", "access token refreshed");

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Utc::now() + chrono::Duration::seconds(TOKEN_LIFETIME_SECS),
        });
        Ok(token.access_token)
    }
}

#[async_trait]
impl FlightSource for AmadeusSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawOffer>, SourceError> {
        let token = self.bearer_token().await?;

        let max = query.max_results.to_string();
        let params = [
            ("originLocationCode", query.from_code.as_str()),
            ("destinationLocationCode", query.to_code.as_str()),
            ("departureDate", query.date.as_str()),
            ("adults", "1"),
            ("max", max.as_str()),
        ];
        let response = self
            .http
            .get(&self.offers_url)
            .bearer_auth(token)
            .query(&params)
            .send()
            .await
            .map_err(|error| self.transport_error(error))?;

        if !response.status().is_success() {
            return Err(SourceError::Unavailable {
                source: SOURCE_NAME.to_owned(),
                detail: format!("offer search returned {}", response.status()),
            });
        }

        let body: OffersResponse =
            response.json().await.map_err(|error| self.transport_error(error))?;
        let offers = body
            .data
            .iter()
            .filter_map(|offer| match map_offer(offer) {
                Some(mapped) => Some(mapped),
                None => {
                    warn!(event_name = "amadeus.offer_skipped", "offer missing required fields");
                    None
                }
            })
            .collect();
        Ok(offers)
    }
}

/// Maps one API offer onto the internal shape, or `None` when any required
/// field is missing or unreadable.
fn map_offer(offer: &Offer) -> Option<RawOffer> {
    let itinerary = offer.itineraries.first()?;
    let segment = itinerary.segments.first()?;
    let price = offer.price.as_ref()?.total.parse::<f64>().ok()?;

    Some(RawOffer {
        airline: segment.carrier_code.clone(),
        flight_code: format!("{}-{}", segment.carrier_code, segment.number),
        departure_time: clock_time(&segment.departure.at),
        price: price as i64,
        duration: leg_duration(&segment.departure.at, &segment.arrival.at)
            .unwrap_or_else(|| "N/A".to_owned()),
        stops: (itinerary.segments.len().saturating_sub(1)) as u32,
        source: SOURCE_NAME.to_owned(),
    })
}

/// "HH:MM" slice of an ISO timestamp like "2026-09-05T10:30:00".
fn clock_time(timestamp: &str) -> String {
    timestamp.get(11..16).unwrap_or_default().to_owned()
}

/// "H:MM:SS" elapsed between two ISO timestamps.
fn leg_duration(departure: &str, arrival: &str) -> Option<String> {
    let parse = |raw: &str| -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(&format!("{raw}+00:00")))
            .ok()
    };
    let elapsed = parse(arrival)? - parse(departure)?;
    let minutes = elapsed.num_minutes();
    if minutes < 0 {
        return None;
    }
    Some(format!("{}:{:02}:00", minutes / 60, minutes % 60))
}
