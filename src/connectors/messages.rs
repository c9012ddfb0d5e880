// src/connectors/messages.rs
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::Deserialize;

/// "No need to change margin type."
pub const NO_CHANGE_MARGIN_TYPE: i64 = -4046;
/// "No need to change position side."
pub const NO_CHANGE_POSITION_SIDE: i64 = -4059;

/// Error body returned by the futures REST API, e.g. `{"code":-2019,"msg":"Margin is insufficient."}`
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: i64,
    pub msg: String,
}

/// GET /fapi/v1/time
#[derive(Debug, Deserialize)]
pub struct ServerTime {
    #[serde(rename = "serverTime")]
    pub server_time: i64,
}

/// One row of GET /fapi/v1/klines. Binance sends a positional array:
/// `[open_time, open, high, low, close, volume, close_time, quote_volume,
///   trades, taker_base, taker_quote, ignore]`
#[derive(Debug, Deserialize)]
pub struct RawKline(
    pub i64,
    pub Decimal,
    pub Decimal,
    pub Decimal,
    pub Decimal,
    pub Decimal,
    pub i64,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
    IgnoredAny,
);

impl RawKline {
    pub fn close(&self) -> Decimal {
        self.4
    }

    pub fn close_time_ms(&self) -> i64 {
        self.6
    }
}

/// Entry of GET /fapi/v2/balance
#[derive(Debug, Deserialize)]
pub struct FuturesBalance {
    pub asset: String,
    pub balance: Decimal,
}

/// GET /fapi/v1/ticker/price
#[derive(Debug, Deserialize)]
pub struct PriceTicker {
    pub symbol: String,
    pub price: Decimal,
}

/// Entry of GET /fapi/v2/positionRisk (one-way mode: one entry per symbol)
#[derive(Debug, Deserialize)]
pub struct PositionRisk {
    pub symbol: String,
    #[serde(rename = "positionAmt")]
    pub position_amt: Decimal,
}

/// POST /fapi/v1/order
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesOrderResponse {
    pub order_id: u64,
    pub client_order_id: String,
    pub symbol: String,
    pub status: String,
    #[serde(default)]
    pub executed_qty: Decimal,
    #[serde(default)]
    pub avg_price: Decimal,
}

/// GET /fapi/v1/exchangeInfo (only the parts we read)
#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub filters: Vec<SymbolFilterEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFilterEntry {
    pub filter_type: String,
    pub step_size: Option<Decimal>,
    pub notional: Option<Decimal>,
}

impl SymbolInfo {
    fn filter(&self, filter_type: &str) -> Option<&SymbolFilterEntry> {
        self.filters.iter().find(|f| f.filter_type == filter_type)
    }

    /// Market orders are bound by MARKET_LOT_SIZE; older listings only carry LOT_SIZE.
    pub fn market_step_size(&self) -> Option<Decimal> {
        self.filter("MARKET_LOT_SIZE")
            .and_then(|f| f.step_size)
            .or_else(|| self.filter("LOT_SIZE").and_then(|f| f.step_size))
    }

    pub fn min_notional(&self) -> Option<Decimal> {
        self.filter("MIN_NOTIONAL").and_then(|f| f.notional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_kline_row() {
        let body = r#"[[1699999200000,"57.1200","57.9800","56.8000","57.5500","123456.7",1700002799999,"7098765.43",45210,"61234.5","3523456.1","0"]]"#;
        let rows: Vec<RawKline> = serde_json::from_str(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].close(), dec!(57.55));
        assert_eq!(rows[0].close_time_ms(), 1_700_002_799_999);
    }

    #[test]
    fn test_parse_position_risk() {
        let body = r#"[{"symbol":"SOLUSDT","positionAmt":"2.50","entryPrice":"101.3","markPrice":"103.0","unRealizedProfit":"4.25","leverage":"2","marginType":"isolated","positionSide":"BOTH"}]"#;
        let rows: Vec<PositionRisk> = serde_json::from_str(body).unwrap();
        assert_eq!(rows[0].symbol, "SOLUSDT");
        assert_eq!(rows[0].position_amt, dec!(2.5));
    }

    #[test]
    fn test_exchange_info_filters() {
        let body = r#"{"symbols":[{"symbol":"SOLUSDT","filters":[
            {"filterType":"PRICE_FILTER","minPrice":"0.4200","maxPrice":"6857","tickSize":"0.0100"},
            {"filterType":"LOT_SIZE","stepSize":"1","minQty":"1","maxQty":"1000000"},
            {"filterType":"MARKET_LOT_SIZE","stepSize":"0.01","minQty":"0.01","maxQty":"5000"},
            {"filterType":"MIN_NOTIONAL","notional":"5"}
        ]}]}"#;
        let info: ExchangeInfo = serde_json::from_str(body).unwrap();
        let sol = &info.symbols[0];
        assert_eq!(sol.market_step_size(), Some(dec!(0.01)));
        assert_eq!(sol.min_notional(), Some(dec!(5)));
    }

    #[test]
    fn test_step_size_falls_back_to_lot_size() {
        let body = r#"{"symbol":"XYZUSDT","filters":[{"filterType":"LOT_SIZE","stepSize":"0.001"}]}"#;
        let info: SymbolInfo = serde_json::from_str(body).unwrap();
        assert_eq!(info.market_step_size(), Some(dec!(0.001)));
        assert_eq!(info.min_notional(), None);
    }

    #[test]
    fn test_parse_order_response() {
        let body = r#"{"orderId":8389765,"symbol":"SOLUSDT","status":"NEW","clientOrderId":"abc","price":"0","avgPrice":"0.00000","origQty":"18","executedQty":"0","type":"MARKET","reduceOnly":false,"side":"BUY"}"#;
        let resp: FuturesOrderResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.order_id, 8389765);
        assert_eq!(resp.status, "NEW");
        assert!(resp.avg_price.is_zero());
    }
}
