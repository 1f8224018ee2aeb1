// src/models/reports.rs

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::debts::Moeda;

// ---
// Filtro comum dos relatórios
// ---
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ReportFilter {
    /// Considera apenas safras com `ano_inicio >= ano_inicio_min`
    pub ano_inicio_min: Option<i32>,
    /// Considera apenas safras com `ano_inicio <= ano_inicio_max`
    pub ano_inicio_max: Option<i32>,
    /// Safra destacada na resposta
    pub safra_id: Option<Uuid>,
}

// =====================================================================
//  PASSIVOS TOTAIS (gráfico)
// =====================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LiabilitiesPoint {
    #[schema(example = "2024/25")]
    pub safra: String,
    pub bancos_tradings: Decimal,
    pub outros: Decimal,
    /// bancos_tradings + outros
    pub total: Decimal,
    /// max(0, total - caixa)
    pub liquido: Decimal,
    /// Compromissos de arrendamento; fora do total
    pub arrendamentos: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct LiabilitiesResponse {
    pub data: Vec<LiabilitiesPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safra_destaque: Option<String>,
}

// =====================================================================
//  DETALHAMENTO DAS DÍVIDAS
// =====================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DebtDetail {
    /// Primeiro id do grupo
    pub id: Uuid,
    pub nome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banco: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fornecedor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_hectares: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moeda: Option<Moeda>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxa_juros: Option<Decimal>,
    /// Valores em BRL por nome de safra
    pub valores_por_ano: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct DebtDetailsResponse {
    pub bancos: Vec<DebtDetail>,
    pub terras: Vec<DebtDetail>,
    pub fornecedores: Vec<DebtDetail>,
    pub arrendamentos: Vec<DebtDetail>,
}

// =====================================================================
//  PROJEÇÕES
// =====================================================================

// Projeção de uma cultura/sistema numa safra
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CultureProjection {
    pub safra: String,
    pub cultura: String,
    pub sistema: String,
    /// ha
    pub area: Decimal,
    /// sc/ha (média ponderada pela área)
    pub produtividade: Decimal,
    pub producao: Decimal,
    /// R$/sc
    pub preco: Decimal,
    pub receita: Decimal,
    pub custo_total: Decimal,
    pub ebitda: Decimal,
    /// %
    pub margem_ebitda: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ConsolidatedProjection {
    pub safra: String,
    pub area: Decimal,
    pub receita: Decimal,
    pub custo_total: Decimal,
    pub ebitda: Decimal,
    pub margem_ebitda: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct CultureProjectionsResponse {
    pub projecoes: Vec<CultureProjection>,
    pub consolidado: Vec<ConsolidatedProjection>,
}

// Demonstração de resultado (DRE)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DreLinha {
    pub safra: String,
    pub receita_bruta: Decimal,
    pub custos_producao: Decimal,
    pub lucro_bruto: Decimal,
    pub despesas_arrendamento: Decimal,
    pub ebitda: Decimal,
    pub margem_ebitda: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FluxoCaixaLinha {
    pub safra: String,
    pub receitas: Decimal,
    pub custos: Decimal,
    pub arrendamentos: Decimal,
    pub servico_divida: Decimal,
    pub fluxo_liquido: Decimal,
    pub fluxo_acumulado: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BalancoLinha {
    pub safra: String,
    pub ativo_circulante: Decimal,
    pub ativo_nao_circulante: Decimal,
    pub ativo_total: Decimal,
    pub passivo_circulante: Decimal,
    pub passivo_nao_circulante: Decimal,
    pub passivo_total: Decimal,
    pub patrimonio_liquido: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DebtPositionLinha {
    pub safra: String,
    pub bancos: Decimal,
    pub terras: Decimal,
    pub fornecedores: Decimal,
    pub endividamento_total: Decimal,
    pub caixas_disponibilidades: Decimal,
    pub divida_liquida: Decimal,
    /// Redução do endividamento frente à safra anterior (negativo = aumento)
    pub reducao_valor: Option<Decimal>,
    pub reducao_percentual: Option<Decimal>,
    pub receita: Decimal,
    pub ebitda: Decimal,
    pub divida_receita: Option<Decimal>,
    pub divida_ebitda: Option<Decimal>,
    pub divida_liquida_receita: Option<Decimal>,
    pub divida_liquida_ebitda: Option<Decimal>,
    pub taxa_cambio: Decimal,
    pub divida_dolar: Decimal,
    pub divida_liquida_dolar: Decimal,
    /// Dívida / ativos, em %
    pub ltv: Decimal,
}

// =====================================================================
//  RATING
// =====================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatingMetricCode {
    Ltv,
    DividaEbitda,
    MargemEbitda,
    LiquidezCorrente,
    DividaFaturamento,
    DividaPatrimonioLiquido,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RatingMetric {
    pub codigo: RatingMetricCode,
    pub nome: String,
    pub valor: Decimal,
    pub pontuacao: Decimal,
    pub nivel: String,
    pub peso: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingResult {
    pub safra_id: Uuid,
    pub safra: String,
    pub metrics: Vec<RatingMetric>,
    pub pontuacao_total: Decimal,
    pub classificacao: String,
    pub descricao: String,
}
