// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        DebtRepository, LiquidityRepository, OrganizationRepository, PriceRepository,
        ProductionRepository, PropertyRepository, SafraRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        debt_details_service::DebtDetailsService,
        email_service::{EmailService, SmtpConfig, SmtpMailer},
        export_service::ExportService,
        liabilities_service::LiabilitiesService,
        market_data::{MarketDataService, QuoteCache, TokenCache, YahooFinanceClient, YahooFinanceConfig},
        organization_service::OrganizationService,
        pdf_report_service::PdfReportService,
        projection_service::ProjectionService,
        rating_service::RatingService,
        report_data::ReportDataLoader,
    },
};

const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

// Configuração lida do ambiente (.env opcional)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    /// Taxa USD/BRL usada quando a safra não tem taxa nem cotação de fechamento
    pub taxa_cambio_padrao: Decimal,
    pub yahoo: YahooFinanceConfig,
    pub market_cache_ttl: Duration,
    pub smtp: SmtpConfig,
    pub email_fallback_delay: Duration,
    pub pdf_fonts_dir: String,
    pub pdf_font_family: String,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{} deve ser definida", name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(name) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} inválida: '{}'", name, raw)),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        // O .env é opcional (em produção as variáveis vêm do ambiente)
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            server_addr: optional("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
            taxa_cambio_padrao: parsed("TAXA_CAMBIO_PADRAO", Decimal::new(550, 2))?,
            yahoo: YahooFinanceConfig {
                base_url: optional("YAHOO_FINANCE_BASE_URL").unwrap_or_else(|| DEFAULT_YAHOO_BASE_URL.to_string()),
                token_url: optional("YAHOO_FINANCE_TOKEN_URL"),
                client_id: optional("YAHOO_FINANCE_CLIENT_ID"),
                client_secret: optional("YAHOO_FINANCE_CLIENT_SECRET"),
            },
            market_cache_ttl: Duration::from_secs(parsed("MARKET_CACHE_TTL_SECS", 300)?),
            smtp: SmtpConfig {
                host: optional("SMTP_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: parsed("SMTP_PORT", 587)?,
                username: optional("SMTP_USERNAME"),
                password: optional("SMTP_PASSWORD"),
                from: optional("EMAIL_FROM").unwrap_or_else(|| "Relatórios <nao-responda@localhost>".to_string()),
            },
            email_fallback_delay: Duration::from_millis(parsed("EMAIL_FALLBACK_DELAY_MS", 1000)?),
            pdf_fonts_dir: optional("PDF_FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()),
            pdf_font_family: optional("PDF_FONT_FAMILY").unwrap_or_else(|| "Roboto".to_string()),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,

    // Repositórios
    pub organization_repo: OrganizationRepository,
    pub safra_repo: SafraRepository,
    pub property_repo: PropertyRepository,
    pub debt_repo: DebtRepository,
    pub liquidity_repo: LiquidityRepository,
    pub price_repo: PriceRepository,
    pub production_repo: ProductionRepository,

    // Serviços
    pub auth_service: AuthService,
    pub organization_service: OrganizationService,
    pub liabilities_service: LiabilitiesService,
    pub debt_details_service: DebtDetailsService,
    pub projection_service: ProjectionService,
    pub rating_service: RatingService,
    pub export_service: ExportService,
    pub pdf_report_service: PdfReportService,
    pub email_service: EmailService,
    pub market_data_service: MarketDataService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let taxa = config.taxa_cambio_padrao;

        let user_repo = UserRepository::new(db_pool.clone());
        let organization_repo = OrganizationRepository::new(db_pool.clone());
        let auth_service = AuthService::new(user_repo, config.jwt_secret.clone(), db_pool.clone());
        let organization_service = OrganizationService::new(organization_repo.clone(), db_pool.clone());

        let loader = ReportDataLoader::new(db_pool.clone());
        let projection_service = ProjectionService::new(loader.clone(), taxa);
        let rating_service = RatingService::new(projection_service.clone());

        // Caches explícitos, donos do estado
        let quote_cache = QuoteCache::new(config.market_cache_ttl);
        let yahoo = YahooFinanceClient::new(config.yahoo.clone(), TokenCache::new())
            .context("Falha ao montar o cliente de cotações")?;
        let market_data_service = MarketDataService::new(Arc::new(yahoo), quote_cache);

        let mailer = SmtpMailer::new(&config.smtp).context("Configuração SMTP inválida")?;
        let email_service = EmailService::new(Arc::new(mailer), config.email_fallback_delay);

        Ok(Self {
            organization_repo,
            safra_repo: SafraRepository,
            property_repo: PropertyRepository,
            debt_repo: DebtRepository,
            liquidity_repo: LiquidityRepository,
            price_repo: PriceRepository,
            production_repo: ProductionRepository,
            auth_service,
            organization_service,
            liabilities_service: LiabilitiesService::new(loader.clone(), taxa),
            debt_details_service: DebtDetailsService::new(loader.clone(), taxa),
            projection_service,
            rating_service,
            export_service: ExportService::new(loader, taxa),
            pdf_report_service: PdfReportService::new(config.pdf_fonts_dir.clone(), config.pdf_font_family.clone()),
            email_service,
            market_data_service,
            db_pool,
            config: Arc::new(config),
        })
    }
}
