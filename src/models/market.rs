// src/models/market.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Cotação já convertida para unidades brasileiras, pronta para o ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketQuote {
    #[schema(example = "SOJA CHICAGO")]
    pub name: String,
    pub value: f64,
    pub previous_value: f64,
    #[schema(example = "R$/sc")]
    pub unit: String,
    #[schema(example = "commodity")]
    pub category: String,
    #[schema(example = "SOJA")]
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

// Cotação bruta devolvida pelo provedor (centavos para commodities de Chicago/NY)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuote {
    pub symbol: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub regular_market_change: Option<f64>,
    #[serde(default)]
    pub regular_market_time: Option<i64>,
}
