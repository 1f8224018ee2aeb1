// src/services/market_data.rs
//
// Proxy de cotações de mercado. Busca os símbolos no provedor, converte as
// commodities de centavos de dólar para unidades brasileiras e guarda o
// resultado por alguns minutos. Nunca devolve erro: sem provedor, vale a
// lista fixa de contingência.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use moka::sync::Cache;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    common::error::AppError,
    models::market::{MarketQuote, RawQuote},
};

pub const SYMBOLS: &[&str] = &[
    "USDBRL=X", "^BVSP", "DI1F25.SA", "DI1F26.SA", "ZS=F", "ZC=F", "ZW=F", "CT=F", "KC=F", "LE=F",
];

const USD_BRL: &str = "USDBRL=X";
// Dólar usado nas conversões quando o provedor não traz USDBRL
const DOLAR_CONVERSAO_PADRAO: f64 = 5.10;

struct SymbolConfig {
    name: &'static str,
    unit: &'static str,
    category: &'static str,
    code: &'static str,
}

fn symbol_config(symbol: &str) -> Option<SymbolConfig> {
    let (name, unit, category, code) = match symbol {
        "USDBRL=X" => ("USD/BRL", "R$", "currency", "USD"),
        "^BVSP" => ("IBOVESPA", "pts", "index", "IBOV"),
        "DI1F25.SA" => ("DI JAN/25", "% a.a.", "interest", "DI25"),
        "DI1F26.SA" => ("DI JAN/26", "% a.a.", "interest", "DI26"),
        "ZS=F" => ("SOJA CHICAGO", "¢/bu", "commodity", "SOJA"),
        "ZC=F" => ("MILHO CHICAGO", "¢/bu", "commodity", "MILHO"),
        "ZW=F" => ("TRIGO CHICAGO", "¢/bu", "commodity", "TRIGO"),
        "CT=F" => ("ALGODÃO NY", "¢/lb", "commodity", "ALGODAO"),
        "KC=F" => ("CAFÉ NY", "¢/lb", "commodity", "CAFE"),
        "LE=F" => ("BOI CHICAGO", "¢/lb", "commodity", "BOI"),
        _ => return None,
    };
    Some(SymbolConfig { name, unit, category, code })
}

/// Fator e unidade de destino para commodities cotadas em centavos de dólar.
/// Saca = 60 kg; arroba = 15 kg.
fn conversion(symbol: &str) -> Option<(f64, &'static str)> {
    match symbol {
        "ZS=F" | "ZW=F" => Some((2.2046, "R$/sc")),
        "ZC=F" => Some((2.362, "R$/sc")),
        "KC=F" => Some((132.28, "R$/sc")),
        "LE=F" | "CT=F" => Some((33.07, "R$/@")),
        _ => None,
    }
}

/// Converte uma cotação bruta para o formato do ticker.
pub fn convert_quote(raw: &RawQuote, dolar: f64) -> MarketQuote {
    let (name, unit, category, code) = match symbol_config(&raw.symbol) {
        Some(c) => (c.name.to_string(), c.unit, c.category, c.code.to_string()),
        None => (
            raw.short_name.clone().unwrap_or_else(|| raw.symbol.clone()),
            "",
            "other",
            raw.symbol.clone(),
        ),
    };

    let mut value = raw.regular_market_price.unwrap_or(0.0);
    let mut previous = value - raw.regular_market_change.unwrap_or(0.0);
    let mut unit = unit.to_string();

    if let Some((factor, target)) = conversion(&raw.symbol) {
        value = value / 100.0 * dolar * factor;
        previous = previous / 100.0 * dolar * factor;
        unit = target.to_string();
    }

    let change = value - previous;
    let change_percent = if previous != 0.0 { change / previous * 100.0 } else { 0.0 };

    MarketQuote {
        name,
        value,
        previous_value: previous,
        unit,
        category: category.to_string(),
        code,
        symbol: Some(raw.symbol.clone()),
        change: Some(change),
        change_percent: Some(change_percent),
        timestamp: raw.regular_market_time,
    }
}

/// Converte o lote inteiro usando o USDBRL do próprio lote.
pub fn convert_quotes(raw: &[RawQuote]) -> Vec<MarketQuote> {
    let dolar = raw
        .iter()
        .find(|q| q.symbol == USD_BRL)
        .and_then(|q| q.regular_market_price)
        .filter(|p| *p > 0.0)
        .unwrap_or(DOLAR_CONVERSAO_PADRAO);

    raw.iter().map(|q| convert_quote(q, dolar)).collect()
}

/// Lista de contingência, já em unidades brasileiras.
pub fn fallback_quotes() -> Vec<MarketQuote> {
    let item = |name: &str, value: f64, previous_value: f64, unit: &str, category: &str, code: &str| MarketQuote {
        name: name.to_string(),
        value,
        previous_value,
        unit: unit.to_string(),
        category: category.to_string(),
        code: code.to_string(),
        symbol: None,
        change: None,
        change_percent: None,
        timestamp: None,
    };

    vec![
        item("USD/BRL", 5.12, 5.10, "R$", "currency", "USD"),
        item("IBOVESPA", 125432.0, 125000.0, "pts", "index", "IBOV"),
        item("SOJA CHICAGO", 129.75, 129.20, "R$/sc", "commodity", "SOJA"),
        item("MILHO CHICAGO", 56.35, 56.10, "R$/sc", "commodity", "MILHO"),
        item("CAFÉ NY", 1235.50, 1230.25, "R$/sc", "commodity", "CAFE"),
        item("BOI CHICAGO", 308.75, 307.50, "R$/@", "commodity", "BOI"),
        item("ALGODÃO NY", 138.25, 137.80, "R$/@", "commodity", "ALGODAO"),
    ]
}

// ---
// Caches (injetados pelo AppState)
// ---

const QUOTES_KEY: &str = "quotes";

#[derive(Clone)]
pub struct QuoteCache {
    cache: Cache<&'static str, Arc<Vec<MarketQuote>>>,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { cache }
    }

    pub fn get(&self) -> Option<Arc<Vec<MarketQuote>>> {
        self.cache.get(QUOTES_KEY)
    }

    pub fn insert(&self, quotes: Vec<MarketQuote>) {
        self.cache.insert(QUOTES_KEY, Arc::new(quotes));
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

// Renovamos o token um minuto antes de vencer
const TOKEN_MARGIN: Duration = Duration::from_secs(60);
const TOKEN_KEY: &str = "access_token";

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct TokenCache {
    cache: Cache<&'static str, CachedToken>,
}

impl TokenCache {
    pub fn new() -> Self {
        // O TTL do cache é só um teto; a validade real vem do `expires_in`
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(24 * 60 * 60))
            .build();
        Self { cache }
    }

    pub fn get(&self) -> Option<String> {
        self.cache
            .get(TOKEN_KEY)
            .filter(|t| Instant::now() + TOKEN_MARGIN < t.expires_at)
            .map(|t| t.value)
    }

    pub fn insert(&self, value: String, expires_in: Duration) {
        let token = CachedToken { value, expires_at: Instant::now() + expires_in };
        self.cache.insert(TOKEN_KEY, token);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

// ---
// Provedor de cotações
// ---

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quotes(&self, symbols: &[&str]) -> Result<Vec<RawQuote>, AppError>;
}

#[derive(Debug, Clone)]
pub struct YahooFinanceConfig {
    pub base_url: String,
    pub token_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResult,
}

#[derive(Deserialize)]
struct QuoteResult {
    #[serde(default)]
    result: Vec<RawQuote>,
}

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    config: YahooFinanceConfig,
    tokens: TokenCache,
}

impl YahooFinanceClient {
    pub fn new(config: YahooFinanceConfig, tokens: TokenCache) -> Result<Self, AppError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, config, tokens })
    }

    // Token OAuth2 (client credentials), reaproveitado até perto do vencimento
    async fn access_token(&self) -> Result<Option<String>, AppError> {
        let (Some(url), Some(id), Some(secret)) = (
            self.config.token_url.as_deref(),
            self.config.client_id.as_deref(),
            self.config.client_secret.as_deref(),
        ) else {
            return Ok(None);
        };

        if let Some(token) = self.tokens.get() {
            return Ok(Some(token));
        }

        let res = self
            .client
            .post(url)
            .basic_auth(id, Some(secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(AppError::UpstreamError(format!("token recusado (status {})", status)));
        }

        let body: TokenResponse = res.json().await?;
        self.tokens
            .insert(body.access_token.clone(), Duration::from_secs(body.expires_in));

        tracing::info!("🔑 Token do provedor de cotações renovado");
        Ok(Some(body.access_token))
    }
}

#[async_trait]
impl QuoteProvider for YahooFinanceClient {
    async fn fetch_quotes(&self, symbols: &[&str]) -> Result<Vec<RawQuote>, AppError> {
        let url = format!("{}/v7/finance/quote", self.config.base_url.trim_end_matches('/'));

        let mut req = self.client.get(&url).query(&[("symbols", symbols.join(","))]);
        if let Some(token) = self.access_token().await? {
            req = req.bearer_auth(token);
        }

        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.tokens.invalidate_all();
            }
            return Err(AppError::UpstreamError(format!("cotações indisponíveis (status {})", status)));
        }

        let body: QuoteEnvelope = res.json().await?;
        Ok(body.quote_response.result)
    }
}

#[derive(Clone)]
pub struct MarketDataService {
    provider: Arc<dyn QuoteProvider>,
    cache: QuoteCache,
}

impl MarketDataService {
    pub fn new(provider: Arc<dyn QuoteProvider>, cache: QuoteCache) -> Self {
        Self { provider, cache }
    }

    /// Sempre devolve uma lista não vazia.
    pub async fn get_quotes(&self) -> Vec<MarketQuote> {
        if let Some(cached) = self.cache.get() {
            return cached.as_ref().clone();
        }

        match self.provider.fetch_quotes(SYMBOLS).await {
            Ok(raw) if !raw.is_empty() => {
                let quotes = convert_quotes(&raw);
                self.cache.insert(quotes.clone());
                quotes
            }
            Ok(_) => {
                tracing::warn!("⚠️ Provedor de cotações respondeu sem dados, usando contingência");
                fallback_quotes()
            }
            Err(e) => {
                tracing::warn!("⚠️ Falha ao buscar cotações ({}), usando contingência", e);
                fallback_quotes()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raw(symbol: &str, price: f64, change: f64) -> RawQuote {
        RawQuote {
            symbol: symbol.to_string(),
            short_name: None,
            regular_market_price: Some(price),
            regular_market_change: Some(change),
            regular_market_time: Some(1_700_000_000),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn soy_is_converted_from_cents_per_bushel_to_reais_per_sack() {
        let q = convert_quote(&raw("ZS=F", 1000.0, 10.0), 5.0);

        assert_eq!(q.unit, "R$/sc");
        assert!(close(q.value, 10.0 * 5.0 * 2.2046));
        assert!(close(q.previous_value, 9.9 * 5.0 * 2.2046));
        assert!(close(q.change_percent.unwrap_or_default(), 10.0 / 990.0 * 100.0));
    }

    #[test]
    fn cattle_and_cotton_go_to_arroba() {
        let boi = convert_quote(&raw("LE=F", 200.0, 0.0), 5.0);
        let algodao = convert_quote(&raw("CT=F", 80.0, 0.0), 5.0);

        assert_eq!(boi.unit, "R$/@");
        assert!(close(boi.value, 2.0 * 5.0 * 33.07));
        assert!(close(algodao.value, 0.8 * 5.0 * 33.07));
    }

    #[test]
    fn corn_and_coffee_factors() {
        let milho = convert_quote(&raw("ZC=F", 450.0, 0.0), 5.0);
        let cafe = convert_quote(&raw("KC=F", 250.0, 0.0), 5.0);

        assert!(close(milho.value, 4.5 * 5.0 * 2.362));
        assert!(close(cafe.value, 2.5 * 5.0 * 132.28));
    }

    #[test]
    fn batch_uses_its_own_dollar_or_the_fallback_rate() {
        let com_dolar = convert_quotes(&[raw("USDBRL=X", 5.0, 0.0), raw("ZW=F", 100.0, 0.0)]);
        assert!(close(com_dolar[1].value, 1.0 * 5.0 * 2.2046));
        assert_eq!(com_dolar[0].unit, "R$");

        let sem_dolar = convert_quotes(&[raw("ZW=F", 100.0, 0.0)]);
        assert!(close(sem_dolar[0].value, 1.0 * 5.10 * 2.2046));
    }

    #[test]
    fn unknown_symbols_keep_their_own_name() {
        let mut r = raw("XYZ", 10.0, 1.0);
        r.short_name = Some("Xyz Corp".into());

        let q = convert_quote(&r, 5.0);

        assert_eq!(q.name, "Xyz Corp");
        assert_eq!(q.category, "other");
        assert_eq!(q.code, "XYZ");
        assert!(close(q.previous_value, 9.0));
    }

    struct FakeProvider {
        calls: AtomicUsize,
        result: Option<Vec<RawQuote>>,
    }

    #[async_trait]
    impl QuoteProvider for FakeProvider {
        async fn fetch_quotes(&self, _symbols: &[&str]) -> Result<Vec<RawQuote>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .ok_or_else(|| AppError::UpstreamError("fora do ar".into()))
        }
    }

    fn service(result: Option<Vec<RawQuote>>) -> (MarketDataService, Arc<FakeProvider>) {
        let provider = Arc::new(FakeProvider { calls: AtomicUsize::new(0), result });
        let service = MarketDataService::new(provider.clone(), QuoteCache::new(Duration::from_secs(300)));
        (service, provider)
    }

    #[tokio::test]
    async fn upstream_failure_returns_the_fallback_list() {
        let (service, _) = service(None);

        let quotes = service.get_quotes().await;

        assert_eq!(quotes, fallback_quotes());
        assert!(!quotes.is_empty());
    }

    #[tokio::test]
    async fn empty_upstream_answer_also_falls_back() {
        let (service, _) = service(Some(vec![]));
        assert_eq!(service.get_quotes().await.len(), 7);
    }

    #[tokio::test]
    async fn successful_fetch_is_cached() {
        let (service, provider) = service(Some(vec![raw("USDBRL=X", 5.2, 0.1)]));

        let first = service.get_quotes().await;
        let second = service.get_quotes().await;

        assert_eq!(first, second);
        assert_eq!(first[0].code, "USD");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        service.cache.invalidate_all();
        service.get_quotes().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn expired_tokens_are_not_reused() {
        let tokens = TokenCache::new();
        tokens.insert("curto".into(), Duration::from_secs(30));
        assert_eq!(tokens.get(), None);

        tokens.insert("longo".into(), Duration::from_secs(3600));
        assert_eq!(tokens.get().as_deref(), Some("longo"));
    }
}
