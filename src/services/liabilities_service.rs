// src/services/liabilities_service.rs
//
// Passivos totais por safra: bancos/tradings, outros (terras + fornecedores),
// caixa e dívida líquida. Arrendamentos saem num campo à parte.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    models::reports::{LiabilitiesPoint, LiabilitiesResponse, ReportFilter},
    services::report_data::{ReportDataLoader, ReportDataset},
};

/// Cálculo puro sobre os dados já carregados.
pub fn compute_liabilities(
    data: &ReportDataset,
    filter: &ReportFilter,
    default_rate: Decimal,
) -> LiabilitiesResponse {
    let lookup = data.lookup(default_rate);
    let totals = data.totals_by_safra(&lookup);

    let points = data
        .safras_ordenadas()
        .into_iter()
        .filter(|s| filter.ano_inicio_min.is_none_or(|min| s.ano_inicio >= min))
        .filter(|s| filter.ano_inicio_max.is_none_or(|max| s.ano_inicio <= max))
        .map(|s| {
            let t = totals.get(&s.nome).copied().unwrap_or_default();
            let total = t.endividamento();
            LiabilitiesPoint {
                safra: s.nome.clone(),
                bancos_tradings: t.bancos,
                outros: t.outros(),
                total,
                liquido: total.saturating_sub(t.caixa).max(Decimal::ZERO),
                arrendamentos: t.arrendamentos,
            }
        })
        .collect();

    let safra_destaque = filter
        .safra_id
        .and_then(|id| data.safras.iter().find(|s| s.id == id))
        .map(|s| s.nome.clone());

    LiabilitiesResponse { data: points, safra_destaque }
}

#[derive(Clone)]
pub struct LiabilitiesService {
    loader: ReportDataLoader,
    default_rate: Decimal,
}

impl LiabilitiesService {
    pub fn new(loader: ReportDataLoader, default_rate: Decimal) -> Self {
        Self { loader, default_rate }
    }

    /// Nunca falha: erro de banco vira `{ data: [] }` e fica no log.
    pub async fn total_liabilities(&self, org_id: Uuid, filter: &ReportFilter) -> LiabilitiesResponse {
        match self.loader.load_debts(org_id).await {
            Ok(data) => compute_liabilities(&data, filter, self.default_rate),
            Err(e) => {
                tracing::error!("🔥 Falha ao calcular passivos da organização {}: {}", org_id, e);
                LiabilitiesResponse::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            debts::{ModalidadeDivida, Moeda},
            liquidity::CategoriaCaixa,
        },
        services::report_data::fixtures::*,
    };
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn dataset() -> ReportDataset {
        let s24 = safra("2024/25", 2024, Some(dec!(5.00)));
        let s25 = safra("2025/26", 2025, None);
        let (id24, id25) = (s24.id.to_string(), s25.id.to_string());

        ReportDataset {
            bancarias: vec![
                bancaria("Banco do Brasil", ModalidadeDivida::Custeio, Moeda::Brl, json!({ &id24: 1000, &id25: 500 })),
                bancaria("Rabobank", ModalidadeDivida::Investimentos, Moeda::Usd, json!({ &id24: 100, &id25: 100 })),
            ],
            fornecedores: vec![fornecedor("Agro Insumos", Moeda::Brl, json!({ &id24: 200 }))],
            terras: vec![terra("Fazenda Boa Vista", Some(s25.id), Some(dec!(300)), None)],
            arrendamentos: vec![arrendamento("Fazenda Arrendada", dec!(100), json!({ &id24: 50 }))],
            caixa: vec![caixa(CategoriaCaixa::CaixaBancos, Moeda::Brl, json!({ &id24: 5000, &id25: 100 }))],
            safras: vec![s25, s24],
            ..Default::default()
        }
    }

    #[test]
    fn mixes_brl_and_usd_with_the_safra_rate() {
        let resp = compute_liabilities(&dataset(), &ReportFilter::default(), dec!(5.50));

        assert_eq!(resp.data.len(), 2);
        let p24 = &resp.data[0];
        assert_eq!(p24.safra, "2024/25");
        // 1000 + 100 * 5.00
        assert_eq!(p24.bancos_tradings, dec!(1500));
        assert_eq!(p24.outros, dec!(200));
        assert_eq!(p24.total, dec!(1700));
        assert_eq!(p24.arrendamentos, dec!(50));

        let p25 = &resp.data[1];
        // 500 + 100 * 5.50 (taxa padrão)
        assert_eq!(p25.bancos_tradings, dec!(1050));
        assert_eq!(p25.outros, dec!(300));
        assert_eq!(p25.liquido, dec!(1250));
    }

    #[test]
    fn net_debt_is_never_negative() {
        let resp = compute_liabilities(&dataset(), &ReportFilter::default(), dec!(5.50));

        // caixa 5000 > total 1700
        assert_eq!(resp.data[0].liquido, Decimal::ZERO);
        assert!(resp.data.iter().all(|p| p.liquido >= Decimal::ZERO));
    }

    #[test]
    fn unknown_safra_ids_contribute_nothing() {
        let mut data = dataset();
        let estranha = Uuid::new_v4().to_string();
        data.bancarias.push(bancaria("Fantasma", ModalidadeDivida::Outros, Moeda::Brl, json!({ estranha: 999999 })));

        let resp = compute_liabilities(&data, &ReportFilter::default(), dec!(5.50));
        let total: Decimal = resp.data.iter().map(|p| p.total).sum();

        assert_eq!(total, dec!(1700) + dec!(1350));
    }

    #[test]
    fn absurd_usd_values_are_skipped_instead_of_panicking() {
        let mut data = dataset();
        let id24 = data.safras.iter().find(|s| s.nome == "2024/25").map(|s| s.id.to_string()).unwrap_or_default();
        data.bancarias.push(bancaria("Gigante", ModalidadeDivida::Outros, Moeda::Usd, json!({ &id24: 5e28 })));
        data.fornecedores.push(fornecedor("Quase no teto", Moeda::Usd, json!({ &id24: "9999999999999999.99" })));
        data.safras.iter_mut().for_each(|s| s.taxa_cambio_usd = Some(dec!(10000000000000)));

        let resp = compute_liabilities(&data, &ReportFilter::default(), dec!(5.50));

        assert_eq!(resp.data.len(), 2);
        // 1000 + 100 USD; as duas entradas gigantes ficam de fora
        assert_eq!(resp.data[0].bancos_tradings, dec!(1000) + dec!(100) * dec!(10000000000000));
        assert_eq!(resp.data[0].outros, dec!(200));
    }

    #[test]
    fn filter_by_year_range_and_highlight() {
        let data = dataset();
        let destaque = data.safras.iter().find(|s| s.nome == "2025/26").map(|s| s.id);
        let filter = ReportFilter { ano_inicio_min: Some(2025), ano_inicio_max: None, safra_id: destaque };

        let resp = compute_liabilities(&data, &filter, dec!(5.50));

        assert_eq!(resp.data.len(), 1);
        assert_eq!(resp.data[0].safra, "2025/26");
        assert_eq!(resp.safra_destaque.as_deref(), Some("2025/26"));
    }

    #[test]
    fn land_flow_map_wins_over_single_value() {
        let mut data = dataset();
        let id24 = data.safras.iter().find(|s| s.nome == "2024/25").map(|s| s.id);
        data.terras = vec![terra(
            "Fazenda Nova",
            id24,
            Some(dec!(999)),
            Some(json!({ id24.map(|i| i.to_string()).unwrap_or_default(): 40 })),
        )];

        let resp = compute_liabilities(&data, &ReportFilter::default(), dec!(5.50));

        assert_eq!(resp.data[0].outros, dec!(240));
        assert_eq!(resp.data[1].outros, Decimal::ZERO);
    }
}
