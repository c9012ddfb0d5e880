// src/connectors/binance.rs
use crate::config::AppConfig;
use crate::connectors::messages::{
    ApiError, ExchangeInfo, FuturesBalance, FuturesOrderResponse, PositionRisk, PriceTicker,
    RawKline, ServerTime, NO_CHANGE_MARGIN_TYPE, NO_CHANGE_POSITION_SIDE,
};
use crate::connectors::traits::ExchangeGateway;
use crate::error::{EngineError, Result};
use crate::types::{
    Candle, Interval, MarginType, OrderConfirmation, OrderIntent, Position, SymbolFilters,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, info};

type HmacSha256 = Hmac<Sha256>;

/// USDT-M futures REST client.
pub struct BinanceFuturesClient {
    api_key: String,
    secret_key: String,
    http_client: Client,
    base_rest_url: String,
    recv_window_ms: u64,
}

impl BinanceFuturesClient {
    pub fn new(
        api_key: String,
        secret_key: String,
        base_rest_url: String,
        recv_window_ms: u64,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| EngineError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            secret_key,
            http_client,
            base_rest_url: base_rest_url.trim_end_matches('/').to_string(),
            recv_window_ms,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.api_key.clone(),
            config.secret_key.clone(),
            config.base_url.clone(),
            config.recv_window_ms,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn sign_and_build_query(&self, params: Vec<(&str, String)>) -> Result<String> {
        let mut params = params;
        params.push(("recvWindow", self.recv_window_ms.to_string()));
        let timestamp = Utc::now().timestamp_millis().to_string();
        params.push(("timestamp", timestamp));

        let query_string = serde_urlencoded::to_string(&params)?;

        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| EngineError::Configuration(format!("invalid secret key: {}", e)))?;
        mac.update(query_string.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!("{}&signature={}", query_string, signature))
    }

    async fn send_signed_request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: Vec<(&str, String)>,
    ) -> Result<T> {
        let full_query = self.sign_and_build_query(params)?;
        let url = format!("{}{}?{}", self.base_rest_url, endpoint, full_query);

        let response = self
            .http_client
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await?;

        Self::read_response(response).await
    }

    async fn send_public_request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Vec<(&str, String)>,
    ) -> Result<T> {
        let url = if params.is_empty() {
            format!("{}{}", self.base_rest_url, endpoint)
        } else {
            let query = serde_urlencoded::to_string(&params)?;
            format!("{}{}?{}", self.base_rest_url, endpoint, query)
        };

        let response = self.http_client.get(&url).send().await?;
        Self::read_response(response).await
    }

    async fn read_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }
        Err(classify_failure(status, &body))
    }
}

/// Maps a non-2xx answer onto the engine's taxonomy.
fn classify_failure(status: StatusCode, body: &str) -> EngineError {
    let auth_or_throttle = matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    ) || status.as_u16() == 418;

    if status.is_server_error() || auth_or_throttle {
        return EngineError::Connectivity(format!("HTTP {}: {}", status, body));
    }

    match serde_json::from_str::<ApiError>(body) {
        Ok(api) => EngineError::Exchange {
            code: api.code,
            msg: api.msg,
        },
        Err(_) => EngineError::Connectivity(format!("HTTP {}: {}", status, body)),
    }
}

/// Converts kline rows into candles, oldest first, checking ordering.
///
/// Binance returns the candle still forming as the last row; it is kept so the
/// crossover can read the one that just closed at `len - 2`. Close times are
/// never compared against the local clock.
fn to_candles(rows: Vec<RawKline>) -> Result<Vec<Candle>> {
    let mut candles: Vec<Candle> = Vec::with_capacity(rows.len());

    for row in rows {
        let close_time = Utc
            .timestamp_millis_opt(row.close_time_ms())
            .single()
            .ok_or_else(|| EngineError::Decode(format!("bad close time {}", row.close_time_ms())))?;

        if let Some(prev) = candles.last() {
            if close_time <= prev.close_time {
                return Err(EngineError::Decode(format!(
                    "klines out of order at {}",
                    close_time
                )));
            }
        }
        candles.push(Candle {
            close_time,
            close_price: row.close(),
        });
    }
    Ok(candles)
}

#[async_trait]
impl ExchangeGateway for BinanceFuturesClient {
    async fn server_time(&self) -> Result<DateTime<Utc>> {
        let resp: ServerTime = self.send_public_request("/fapi/v1/time", vec![]).await?;
        Utc.timestamp_millis_opt(resp.server_time)
            .single()
            .ok_or_else(|| EngineError::Decode(format!("bad server time {}", resp.server_time)))
    }

    async fn recent_candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let params = vec![
            ("symbol", symbol.to_string()),
            ("interval", interval.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        let rows: Vec<RawKline> = self.send_public_request("/fapi/v1/klines", params).await?;
        to_candles(rows)
    }

    async fn account_balance(&self, asset: &str) -> Result<Decimal> {
        let balances: Vec<FuturesBalance> = self
            .send_signed_request(Method::GET, "/fapi/v2/balance", vec![])
            .await?;

        // An asset the account never held is simply a zero balance.
        Ok(balances
            .into_iter()
            .find(|b| b.asset == asset)
            .map(|b| b.balance)
            .unwrap_or(Decimal::ZERO))
    }

    async fn current_price(&self, symbol: &str) -> Result<Decimal> {
        let ticker: PriceTicker = self
            .send_public_request("/fapi/v1/ticker/price", vec![("symbol", symbol.to_string())])
            .await?;
        debug!(symbol = %ticker.symbol, price = %ticker.price, "Ticker");
        Ok(ticker.price)
    }

    async fn position(&self, symbol: &str) -> Result<Position> {
        let rows: Vec<PositionRisk> = self
            .send_signed_request(
                Method::GET,
                "/fapi/v2/positionRisk",
                vec![("symbol", symbol.to_string())],
            )
            .await?;

        Ok(rows
            .into_iter()
            .find(|p| p.symbol == symbol)
            .map(|p| Position::new(p.position_amt))
            .unwrap_or_else(Position::flat))
    }

    async fn submit_market_order(
        &self,
        symbol: &str,
        intent: &OrderIntent,
    ) -> Result<OrderConfirmation> {
        let client_order_id = uuid::Uuid::new_v4().to_string();
        let mut params = vec![
            ("symbol", symbol.to_string()),
            ("side", intent.side.as_str().to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", intent.quantity.normalize().to_string()),
            ("newClientOrderId", client_order_id.clone()),
            ("newOrderRespType", "RESULT".to_string()),
        ];
        if intent.reduce_only {
            params.push(("reduceOnly", "true".to_string()));
        }

        info!(
            side = %intent.side,
            qty = %intent.quantity,
            reduce_only = intent.reduce_only,
            client_order_id = %client_order_id,
            "🚀 Sending MARKET order for {}",
            symbol
        );

        let resp: FuturesOrderResponse = self
            .send_signed_request(Method::POST, "/fapi/v1/order", params)
            .await
            .map_err(|e| match e {
                EngineError::Exchange { code, msg } => {
                    EngineError::OrderRejected(format!("{} ({})", msg, code))
                }
                other => other,
            })?;

        Ok(OrderConfirmation {
            order_id: resp.order_id.to_string(),
            client_order_id: resp.client_order_id,
            symbol: resp.symbol,
            status: resp.status,
            executed_qty: resp.executed_qty,
            avg_price: resp.avg_price,
        })
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        let _: serde_json::Value = self
            .send_signed_request(
                Method::POST,
                "/fapi/v1/leverage",
                vec![
                    ("symbol", symbol.to_string()),
                    ("leverage", leverage.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn set_margin_type(&self, symbol: &str, margin_type: MarginType) -> Result<()> {
        let result: Result<serde_json::Value> = self
            .send_signed_request(
                Method::POST,
                "/fapi/v1/marginType",
                vec![
                    ("symbol", symbol.to_string()),
                    ("marginType", margin_type.as_str().to_string()),
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(EngineError::Exchange { code, .. }) if code == NO_CHANGE_MARGIN_TYPE => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn set_position_mode(&self, one_way: bool) -> Result<()> {
        let dual_side = if one_way { "false" } else { "true" };
        let result: Result<serde_json::Value> = self
            .send_signed_request(
                Method::POST,
                "/fapi/v1/positionSide/dual",
                vec![("dualSidePosition", dual_side.to_string())],
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(EngineError::Exchange { code, .. }) if code == NO_CHANGE_POSITION_SIDE => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn symbol_filters(&self, symbol: &str) -> Result<SymbolFilters> {
        let info: ExchangeInfo = self
            .send_public_request("/fapi/v1/exchangeInfo", vec![])
            .await?;

        let listing = info
            .symbols
            .iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| {
                EngineError::Configuration(format!("symbol {} is not listed on futures", symbol))
            })?;

        let step_size = listing.market_step_size().ok_or_else(|| {
            EngineError::Configuration(format!("{} has no lot size filter", symbol))
        })?;
        let min_notional = listing.min_notional().ok_or_else(|| {
            EngineError::Configuration(format!("{} has no MIN_NOTIONAL filter", symbol))
        })?;

        Ok(SymbolFilters {
            step_size: step_size.normalize(),
            min_notional,
        })
    }
}
