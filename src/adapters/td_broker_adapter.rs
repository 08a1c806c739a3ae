//! TD Ameritrade REST broker adapter.
//!
//! Market data is requested with the app key (`CLIENT_ID`); order routes need
//! the bearer token stored in the `JSON_PATH` credentials file. Token refresh
//! and the OAuth login flow are not handled here: when no token is present,
//! order calls fail with the authorization URL to visit.

use crate::domain::error::RobotError;
use crate::domain::market::{BarSpec, BarType};
use crate::domain::ohlcv::PriceBar;
use crate::domain::settings::Settings;
use crate::domain::trade::{OrderPayload, OrderStatus};
use crate::ports::broker_port::BrokerPort;
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

const AUTH_URL: &str = "https://auth.tdameritrade.com/auth";
/// How many bar lengths back `latest_bars` looks for the newest candle.
const LATEST_LOOKBACK_BARS: i32 = 15;

#[derive(Debug, Deserialize)]
struct Credentials {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceHistoryResponse {
    #[serde(default)]
    candles: Vec<Candle>,
    #[serde(default)]
    empty: bool,
}

#[derive(Debug, Deserialize)]
struct Candle {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
    /// Epoch milliseconds.
    datetime: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    status: String,
}

pub struct TdBroker {
    client: Client,
    base_url: String,
    client_id: String,
    redirect_uri: String,
    access_token: Option<String>,
}

impl TdBroker {
    pub fn from_settings(settings: &Settings) -> Result<Self, RobotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.broker.timeout_secs))
            .build()?;

        let access_token = read_access_token(&settings.credentials_path)?;
        if access_token.is_none() {
            tracing::warn!(
                path = %settings.credentials_path.display(),
                "no access token found, order routes will be unavailable"
            );
        }

        Ok(Self {
            client,
            base_url: settings.broker.base_url.clone(),
            client_id: settings.client_id.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            access_token,
        })
    }

    /// URL the account holder visits to grant the app access.
    pub fn authorization_url(&self) -> String {
        let client_id = format!("{}@AMER.OAUTHAP", self.client_id);
        Url::parse_with_params(
            AUTH_URL,
            [
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", client_id.as_str()),
            ],
        )
        .map(String::from)
        .unwrap_or_else(|_| AUTH_URL.to_string())
    }

    fn token(&self) -> Result<&str, RobotError> {
        self.access_token
            .as_deref()
            .ok_or_else(|| RobotError::Broker {
                reason: format!(
                    "not authenticated; authorize at {} and save the token file",
                    self.authorization_url()
                ),
            })
    }

    fn price_history_url(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bar: BarSpec,
    ) -> Result<Url, RobotError> {
        let (period_type, frequency_type) = match bar.bar_type {
            BarType::Minute => ("day", "minute"),
            BarType::Daily => ("month", "daily"),
            BarType::Weekly => ("year", "weekly"),
            BarType::Monthly => ("year", "monthly"),
        };
        let url = format!("{}/marketdata/{}/pricehistory", self.base_url, symbol);
        Url::parse_with_params(
            &url,
            [
                ("apikey", self.client_id.clone()),
                ("periodType", period_type.to_string()),
                ("frequencyType", frequency_type.to_string()),
                ("frequency", bar.size.to_string()),
                ("startDate", start.timestamp_millis().to_string()),
                ("endDate", end.timestamp_millis().to_string()),
                ("needExtendedHoursData", "false".to_string()),
            ],
        )
        .map_err(|e| RobotError::Broker {
            reason: format!("invalid price history url {url}: {e}"),
        })
    }
}

fn read_access_token(path: &Path) -> Result<Option<String>, RobotError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let credentials: Credentials = serde_json::from_str(&content)?;
    Ok(credentials.access_token.filter(|t| !t.is_empty()))
}

fn parse_price_history(symbol: &str, body: &str) -> Result<Vec<PriceBar>, RobotError> {
    let resp: PriceHistoryResponse = serde_json::from_str(body).map_err(|e| RobotError::Broker {
        reason: format!("unexpected price history for {symbol}: {e}"),
    })?;
    if resp.empty {
        return Ok(Vec::new());
    }

    let mut bars = Vec::with_capacity(resp.candles.len());
    for candle in resp.candles {
        let timestamp = DateTime::from_timestamp_millis(candle.datetime).ok_or_else(|| {
            RobotError::Broker {
                reason: format!("invalid candle timestamp {}", candle.datetime),
            }
        })?;
        bars.push(PriceBar {
            symbol: symbol.to_string(),
            timestamp,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
        });
    }
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

/// The order id is the last path segment of the `Location` header.
fn order_id_from_location(location: &str) -> Option<String> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn broker_error(status: StatusCode, body: &str) -> RobotError {
    RobotError::Broker {
        reason: format!("HTTP {status}: {}", body.trim()),
    }
}

impl BrokerPort for TdBroker {
    fn historical_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bar: BarSpec,
    ) -> Result<Vec<PriceBar>, RobotError> {
        let url = self.price_history_url(symbol, start, end, bar)?;
        tracing::debug!(%symbol, %start, %end, "requesting price history");

        let resp = self.client.get(url).send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(broker_error(status, &body));
        }
        parse_price_history(symbol, &body)
    }

    fn latest_bars(
        &mut self,
        symbols: &[String],
        bar: BarSpec,
    ) -> Result<Vec<PriceBar>, RobotError> {
        let end = Utc::now();
        let start = bar
            .duration()
            .and_then(|d| d.checked_mul(LATEST_LOOKBACK_BARS))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| RobotError::BarOutOfRange {
                bar: bar.to_string(),
            })?;

        let mut latest = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let newest = self
                .historical_bars(symbol, start, end, bar)?
                .pop()
                .ok_or_else(|| RobotError::NoData {
                    symbol: symbol.clone(),
                })?;
            latest.push(newest);
        }
        Ok(latest)
    }

    fn place_order(&mut self, account: &str, order: &OrderPayload) -> Result<String, RobotError> {
        let url = format!("{}/accounts/{}/orders", self.base_url, account);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.token()?)
            .json(order)
            .send()?;

        let status = resp.status();
        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text()?;

        if !status.is_success() {
            return Err(RobotError::OrderRejected {
                symbol: order
                    .order_leg_collection
                    .first()
                    .map(|leg| leg.instrument.symbol.clone())
                    .unwrap_or_default(),
                reason: format!("HTTP {status}: {}", body.trim()),
            });
        }

        location
            .as_deref()
            .and_then(order_id_from_location)
            .ok_or_else(|| RobotError::Broker {
                reason: "order accepted but no order id returned".into(),
            })
    }

    fn order_status(&self, account: &str, order_id: &str) -> Result<OrderStatus, RobotError> {
        let url = format!("{}/accounts/{}/orders/{}", self.base_url, account, order_id);
        let resp = self.client.get(&url).bearer_auth(self.token()?).send()?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(broker_error(status, &body));
        }
        let order: OrderResponse = serde_json::from_str(&body)?;
        Ok(OrderStatus::from_broker(&order.status))
    }
}
