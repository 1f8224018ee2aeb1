// src/handlers/market.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{config::AppState, models::market::MarketQuote};

// GET /api/yahoo-finance
#[utoipa::path(
    get,
    path = "/api/yahoo-finance",
    tag = "Market",
    responses(
        (status = 200, description = "Cotações em R$ (cache de 5 minutos; lista de contingência se o provedor falhar)", body = Vec<MarketQuote>)
    )
)]
pub async fn get_market_quotes(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.market_data_service.get_quotes().await)
}
