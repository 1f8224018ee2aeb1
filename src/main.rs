//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppConfig, AppState};
use crate::docs::ApiDoc;
use crate::middleware::auth::{auth_guard, tenant_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logger: RUST_LOG ou "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar
    let config = AppConfig::from_env()?;
    let server_addr = config.server_addr.clone();
    let app_state = AppState::new(config)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas que só exigem usuário autenticado
    let user_routes = Router::new()
        .route("/users/me", get(handlers::auth::get_me))
        .route(
            "/organizations",
            post(handlers::organizations::create_organization)
                .get(handlers::organizations::list_my_organizations),
        )
        .route("/invitations/accept", post(handlers::organizations::accept_invitation))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let organization_routes = Router::new()
        .route("/current", get(handlers::organizations::get_current_organization))
        .route(
            "/invitations",
            post(handlers::organizations::create_invitation)
                .get(handlers::organizations::list_invitations),
        )
        .route("/invitations/{id}", delete(handlers::organizations::cancel_invitation))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let safra_routes = Router::new()
        .route("/", post(handlers::safras::create_safra).get(handlers::safras::list_safras))
        .route(
            "/{id}",
            get(handlers::safras::get_safra)
                .put(handlers::safras::update_safra)
                .delete(handlers::safras::delete_safra),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let property_routes = Router::new()
        .route(
            "/",
            post(handlers::properties::create_property).get(handlers::properties::list_properties),
        )
        .route(
            "/{id}",
            get(handlers::properties::get_property)
                .put(handlers::properties::update_property)
                .delete(handlers::properties::delete_property),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let debt_routes = Router::new()
        // Bancos / tradings
        .route(
            "/bank",
            post(handlers::debts::create_bank_debt).get(handlers::debts::list_bank_debts),
        )
        .route(
            "/bank/{id}",
            get(handlers::debts::get_bank_debt)
                .put(handlers::debts::update_bank_debt)
                .delete(handlers::debts::delete_bank_debt),
        )
        // Fornecedores
        .route(
            "/suppliers",
            post(handlers::debts::create_supplier_debt).get(handlers::debts::list_supplier_debts),
        )
        .route(
            "/suppliers/{id}",
            get(handlers::debts::get_supplier_debt)
                .put(handlers::debts::update_supplier_debt)
                .delete(handlers::debts::delete_supplier_debt),
        )
        // Terras
        .route(
            "/land",
            post(handlers::debts::create_land_debt).get(handlers::debts::list_land_debts),
        )
        .route(
            "/land/{id}",
            get(handlers::debts::get_land_debt)
                .put(handlers::debts::update_land_debt)
                .delete(handlers::debts::delete_land_debt),
        )
        // Arrendamentos
        .route("/leases", post(handlers::debts::create_lease).get(handlers::debts::list_leases))
        .route(
            "/leases/{id}",
            get(handlers::debts::get_lease)
                .put(handlers::debts::update_lease)
                .delete(handlers::debts::delete_lease),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let liquidity_routes = Router::new()
        .route(
            "/",
            post(handlers::liquidity::create_liquidity).get(handlers::liquidity::list_liquidity),
        )
        .route(
            "/{id}",
            get(handlers::liquidity::get_liquidity)
                .put(handlers::liquidity::update_liquidity)
                .delete(handlers::liquidity::delete_liquidity),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let price_routes = Router::new()
        .route(
            "/commodities",
            post(handlers::prices::create_commodity_price).get(handlers::prices::list_commodity_prices),
        )
        .route(
            "/commodities/{id}",
            get(handlers::prices::get_commodity_price)
                .put(handlers::prices::update_commodity_price)
                .delete(handlers::prices::delete_commodity_price),
        )
        .route(
            "/exchange-rates",
            post(handlers::prices::create_exchange_rate).get(handlers::prices::list_exchange_rates),
        )
        .route(
            "/exchange-rates/{id}",
            get(handlers::prices::get_exchange_rate)
                .put(handlers::prices::update_exchange_rate)
                .delete(handlers::prices::delete_exchange_rate),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let production_routes = Router::new()
        .route(
            "/cultures",
            post(handlers::production::create_culture).get(handlers::production::list_cultures),
        )
        .route("/cultures/{id}", delete(handlers::production::delete_culture))
        .route(
            "/systems",
            post(handlers::production::create_system).get(handlers::production::list_systems),
        )
        .route("/systems/{id}", delete(handlers::production::delete_system))
        .route(
            "/cycles",
            post(handlers::production::create_cycle).get(handlers::production::list_cycles),
        )
        .route("/cycles/{id}", delete(handlers::production::delete_cycle))
        .route(
            "/areas",
            post(handlers::production::create_area).get(handlers::production::list_areas),
        )
        .route("/areas/{id}", delete(handlers::production::delete_area))
        .route(
            "/productivities",
            post(handlers::production::create_productivity)
                .get(handlers::production::list_productivities),
        )
        .route("/productivities/{id}", delete(handlers::production::delete_productivity))
        .route(
            "/costs",
            post(handlers::production::create_cost).get(handlers::production::list_costs),
        )
        .route("/costs/{id}", delete(handlers::production::delete_cost))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let report_routes = Router::new()
        .route("/liabilities", get(handlers::reports::total_liabilities))
        .route("/debt-details", get(handlers::reports::debt_details))
        .route("/cultures", get(handlers::reports::culture_projections))
        .route("/dre", get(handlers::reports::dre))
        .route("/cash-flow", get(handlers::reports::cash_flow))
        .route("/balance-sheet", get(handlers::reports::balance_sheet))
        .route("/debt-position", get(handlers::reports::debt_position))
        .route("/rating/{safra_id}", get(handlers::reports::rating))
        // Exportações e envio por e-mail
        .route("/excel", get(handlers::exports::export_excel))
        .route("/excel/email", post(handlers::exports::email_excel))
        .route("/rating/email", post(handlers::exports::email_rating))
        .route("/rating/{safra_id}/pdf", get(handlers::exports::export_rating_pdf))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/api/yahoo-finance", get(handlers::market::get_market_quotes))
        .nest("/api/auth", auth_routes)
        .nest("/api", user_routes)
        .nest("/api/organizations", organization_routes)
        .nest("/api/safras", safra_routes)
        .nest("/api/properties", property_routes)
        .nest("/api/debts", debt_routes)
        .nest("/api/liquidity", liquidity_routes)
        .nest("/api/prices", price_routes)
        .nest("/api/production", production_routes)
        .nest("/api/reports", report_routes)
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", server_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
