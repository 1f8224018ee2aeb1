// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Organizations ---
        handlers::organizations::create_organization,
        handlers::organizations::list_my_organizations,
        handlers::organizations::get_current_organization,
        handlers::organizations::create_invitation,
        handlers::organizations::list_invitations,
        handlers::organizations::cancel_invitation,
        handlers::organizations::accept_invitation,

        // --- Safras ---
        handlers::safras::list_safras,
        handlers::safras::get_safra,
        handlers::safras::create_safra,
        handlers::safras::update_safra,
        handlers::safras::delete_safra,

        // --- Properties ---
        handlers::properties::list_properties,
        handlers::properties::get_property,
        handlers::properties::create_property,
        handlers::properties::update_property,
        handlers::properties::delete_property,

        // --- Debts ---
        handlers::debts::list_bank_debts,
        handlers::debts::get_bank_debt,
        handlers::debts::create_bank_debt,
        handlers::debts::update_bank_debt,
        handlers::debts::delete_bank_debt,
        handlers::debts::list_supplier_debts,
        handlers::debts::get_supplier_debt,
        handlers::debts::create_supplier_debt,
        handlers::debts::update_supplier_debt,
        handlers::debts::delete_supplier_debt,
        handlers::debts::list_land_debts,
        handlers::debts::get_land_debt,
        handlers::debts::create_land_debt,
        handlers::debts::update_land_debt,
        handlers::debts::delete_land_debt,
        handlers::debts::list_leases,
        handlers::debts::get_lease,
        handlers::debts::create_lease,
        handlers::debts::update_lease,
        handlers::debts::delete_lease,

        // --- Liquidity ---
        handlers::liquidity::list_liquidity,
        handlers::liquidity::get_liquidity,
        handlers::liquidity::create_liquidity,
        handlers::liquidity::update_liquidity,
        handlers::liquidity::delete_liquidity,

        // --- Prices ---
        handlers::prices::list_commodity_prices,
        handlers::prices::get_commodity_price,
        handlers::prices::create_commodity_price,
        handlers::prices::update_commodity_price,
        handlers::prices::delete_commodity_price,
        handlers::prices::list_exchange_rates,
        handlers::prices::get_exchange_rate,
        handlers::prices::create_exchange_rate,
        handlers::prices::update_exchange_rate,
        handlers::prices::delete_exchange_rate,

        // --- Production ---
        handlers::production::list_cultures,
        handlers::production::create_culture,
        handlers::production::delete_culture,
        handlers::production::list_systems,
        handlers::production::create_system,
        handlers::production::delete_system,
        handlers::production::list_cycles,
        handlers::production::create_cycle,
        handlers::production::delete_cycle,
        handlers::production::list_areas,
        handlers::production::create_area,
        handlers::production::delete_area,
        handlers::production::list_productivities,
        handlers::production::create_productivity,
        handlers::production::delete_productivity,
        handlers::production::list_costs,
        handlers::production::create_cost,
        handlers::production::delete_cost,

        // --- Reports ---
        handlers::reports::total_liabilities,
        handlers::reports::debt_details,
        handlers::reports::culture_projections,
        handlers::reports::dre,
        handlers::reports::cash_flow,
        handlers::reports::balance_sheet,
        handlers::reports::debt_position,
        handlers::reports::rating,

        // --- Exports ---
        handlers::exports::export_excel,
        handlers::exports::export_rating_pdf,
        handlers::exports::email_excel,
        handlers::exports::email_rating,

        // --- Market ---
        handlers::market::get_market_quotes,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Organizations ---
            models::organization::FuncaoMembro,
            models::organization::StatusConvite,
            models::organization::Organizacao,
            models::organization::MinhaOrganizacao,
            models::organization::Membership,
            models::organization::Convite,
            handlers::organizations::CreateOrganizationPayload,
            handlers::organizations::CreateInvitationPayload,
            handlers::organizations::AcceptInvitationPayload,

            // --- Cadastros ---
            models::safra::Safra,
            models::property::TipoPropriedade,
            models::property::Propriedade,
            handlers::safras::SafraPayload,
            handlers::properties::PropriedadePayload,

            // --- Debts ---
            models::debts::Moeda,
            models::debts::TipoDivida,
            models::debts::ModalidadeDivida,
            models::debts::DividaBancaria,
            models::debts::DividaFornecedor,
            models::debts::AquisicaoTerra,
            models::debts::Arrendamento,
            handlers::debts::DividaBancariaPayload,
            handlers::debts::DividaFornecedorPayload,
            handlers::debts::AquisicaoTerraPayload,
            handlers::debts::ArrendamentoPayload,

            // --- Liquidity ---
            models::liquidity::CategoriaCaixa,
            models::liquidity::CaixaDisponibilidade,
            handlers::liquidity::CaixaPayload,

            // --- Prices ---
            models::prices::TipoCotacao,
            models::prices::PrecoCommodity,
            models::prices::CotacaoCambio,
            handlers::prices::PrecoPayload,
            handlers::prices::CotacaoPayload,

            // --- Production ---
            models::production::ItemCadastro,
            models::production::AreaPlantio,
            models::production::Produtividade,
            models::production::CustoProducao,
            handlers::production::CadastroPayload,
            handlers::production::AreaPayload,
            handlers::production::ProdutividadePayload,
            handlers::production::CustoPayload,

            // --- Reports ---
            models::reports::ReportFilter,
            models::reports::LiabilitiesPoint,
            models::reports::LiabilitiesResponse,
            models::reports::DebtDetail,
            models::reports::DebtDetailsResponse,
            models::reports::CultureProjection,
            models::reports::ConsolidatedProjection,
            models::reports::CultureProjectionsResponse,
            models::reports::DreLinha,
            models::reports::FluxoCaixaLinha,
            models::reports::BalancoLinha,
            models::reports::DebtPositionLinha,
            models::reports::RatingMetricCode,
            models::reports::RatingMetric,
            models::reports::RatingResult,

            // --- Exports ---
            models::exports::ExportedFile,
            models::exports::EmailReportPayload,
            models::exports::EmailDeliveryResult,
            models::exports::EmailDeliveryReport,

            // --- Market ---
            models::market::MarketQuote,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Organizations", description = "Organizações, membros e convites"),
        (name = "Safras", description = "Safras (eixo de tempo dos números)"),
        (name = "Properties", description = "Propriedades rurais"),
        (name = "Debts", description = "Bancos, fornecedores, terras e arrendamentos"),
        (name = "Liquidity", description = "Caixa e disponibilidades"),
        (name = "Prices", description = "Preços de commodities e câmbio"),
        (name = "Production", description = "Culturas, áreas, produtividades e custos"),
        (name = "Reports", description = "Passivos, projeções e rating"),
        (name = "Exports", description = "Excel, PDF e envio por e-mail"),
        (name = "Market", description = "Cotações de mercado")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_main_routes_and_the_jwt_scheme() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/yahoo-finance",
            "/api/reports/liabilities",
            "/api/reports/rating/{safra_id}/pdf",
            "/api/debts/bank/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "rota ausente: {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
