// src/services/debt_details_service.rs
//
// Detalhamento das dívidas por categoria. Linhas com a mesma chave de
// agrupamento são somadas; os valores saem em BRL, indexados pelo nome da safra.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::{
        safra_values::{parse_safra_values, SafraLookup},
    },
    models::{
        debts::Moeda,
        reports::{DebtDetail, DebtDetailsResponse},
    },
    services::report_data::{ReportDataLoader, ReportDataset},
};

// Agrupa preservando a ordem da primeira aparição
#[derive(Default)]
struct Grouped {
    index: HashMap<String, usize>,
    rows: Vec<DebtDetail>,
}

impl Grouped {
    fn entry(&mut self, key: &str, init: impl FnOnce() -> DebtDetail) -> &mut DebtDetail {
        let pos = match self.index.get(key) {
            Some(pos) => *pos,
            None => {
                self.rows.push(init());
                self.index.insert(key.to_string(), self.rows.len() - 1);
                self.rows.len() - 1
            }
        };
        &mut self.rows[pos]
    }

    fn into_rows(self) -> Vec<DebtDetail> {
        self.rows
    }
}

fn empty_detail(id: Uuid, nome: &str) -> DebtDetail {
    DebtDetail {
        id,
        nome: nome.to_string(),
        banco: None,
        fornecedor: None,
        area_hectares: None,
        tipo: None,
        moeda: None,
        taxa_juros: None,
        valores_por_ano: BTreeMap::new(),
    }
}

fn add_values(
    target: &mut BTreeMap<String, Decimal>,
    lookup: &SafraLookup,
    raw: &Value,
    moeda: Moeda,
) {
    for (safra_id, valor) in parse_safra_values(raw) {
        if let Some(nome) = lookup.name_of(&safra_id) {
            lookup.add_brl(target.entry(nome.to_string()).or_default(), valor, moeda, nome);
        }
    }
}

pub fn compute_debt_details(data: &ReportDataset, default_rate: Decimal) -> DebtDetailsResponse {
    if data.safras.is_empty() {
        return DebtDetailsResponse::default();
    }
    let lookup = data.lookup(default_rate);

    // --- Bancos: "instituição - modalidade" ---
    let mut bancos = Grouped::default();
    for divida in &data.bancarias {
        let chave = format!("{} - {}", divida.instituicao_bancaria, divida.modalidade.label());
        let detail = bancos.entry(&chave, || DebtDetail {
            banco: Some(divida.instituicao_bancaria.clone()),
            tipo: Some(divida.modalidade.label().to_string()),
            moeda: Some(divida.moeda),
            taxa_juros: Some(Decimal::ZERO),
            ..empty_detail(divida.id, &chave)
        });

        add_values(&mut detail.valores_por_ano, &lookup, &divida.fluxo_pagamento_anual, divida.moeda);

        // Fica a maior taxa do grupo
        if let Some(taxa) = divida.taxa_real {
            if detail.taxa_juros.is_none_or(|atual| taxa > atual) {
                detail.taxa_juros = Some(taxa);
            }
        }
    }

    // --- Terras: por fazenda ---
    let mut terras = Grouped::default();
    for terra in &data.terras {
        let detail = terras.entry(&terra.nome_fazenda, || DebtDetail {
            area_hectares: Some(Decimal::ZERO),
            tipo: Some("Aquisição de Terra".to_string()),
            moeda: Some(terra.moeda),
            ..empty_detail(terra.id, &terra.nome_fazenda)
        });

        let fluxo = terra
            .fluxo_pagamento_anual
            .as_ref()
            .filter(|f| !parse_safra_values(f).is_empty());

        match fluxo {
            Some(fluxo) => add_values(&mut detail.valores_por_ano, &lookup, fluxo, terra.moeda),
            None => {
                if let (Some(safra_id), Some(valor)) = (terra.safra_id, terra.valor_total) {
                    if let Some(nome) = lookup.name_of(&safra_id.to_string()) {
                        let slot = detail.valores_por_ano.entry(nome.to_string()).or_default();
                        lookup.add_brl(slot, valor, terra.moeda, nome);
                    }
                }
            }
        }

        // Fica a maior área do grupo
        if let Some(ha) = terra.hectares {
            if detail.area_hectares.is_none_or(|atual| ha > atual) {
                detail.area_hectares = Some(ha);
            }
        }
    }

    // --- Fornecedores: por nome ---
    let mut fornecedores = Grouped::default();
    for fornecedor in &data.fornecedores {
        let detail = fornecedores.entry(&fornecedor.nome, || DebtDetail {
            fornecedor: Some(fornecedor.nome.clone()),
            tipo: fornecedor.categoria.clone(),
            moeda: Some(fornecedor.moeda),
            ..empty_detail(fornecedor.id, &fornecedor.nome)
        });
        add_values(&mut detail.valores_por_ano, &lookup, &fornecedor.valores_por_safra, fornecedor.moeda);
    }

    // --- Arrendamentos: por fazenda, áreas somadas, sempre em BRL ---
    let mut arrendamentos = Grouped::default();
    for arrendamento in &data.arrendamentos {
        let detail = arrendamentos.entry(&arrendamento.nome_fazenda, || DebtDetail {
            area_hectares: Some(Decimal::ZERO),
            tipo: Some(
                arrendamento
                    .tipo_pagamento
                    .clone()
                    .unwrap_or_else(|| "Arrendamento".to_string()),
            ),
            ..empty_detail(arrendamento.id, &arrendamento.nome_fazenda)
        });

        add_values(&mut detail.valores_por_ano, &lookup, &arrendamento.custos_por_safra, Moeda::Brl);

        if let Some(area) = arrendamento.area_arrendada.filter(|a| *a > Decimal::ZERO) {
            detail.area_hectares = Some(detail.area_hectares.unwrap_or_default().saturating_add(area));
        }
    }

    DebtDetailsResponse {
        bancos: bancos.into_rows(),
        terras: terras.into_rows(),
        fornecedores: fornecedores.into_rows(),
        arrendamentos: arrendamentos.into_rows(),
    }
}

#[derive(Clone)]
pub struct DebtDetailsService {
    loader: ReportDataLoader,
    default_rate: Decimal,
}

impl DebtDetailsService {
    pub fn new(loader: ReportDataLoader, default_rate: Decimal) -> Self {
        Self { loader, default_rate }
    }

    /// Mesmo contrato dos passivos: erro de banco fica no log e a resposta sai vazia.
    pub async fn debt_details(&self, org_id: Uuid) -> DebtDetailsResponse {
        match self.loader.load_debts(org_id).await {
            Ok(data) => compute_debt_details(&data, self.default_rate),
            Err(e) => {
                tracing::error!("🔥 Falha ao detalhar dívidas da organização {}: {}", org_id, e);
                DebtDetailsResponse::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::debts::ModalidadeDivida, services::report_data::fixtures::*};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn groups_bank_debts_by_institution_and_modality() {
        let s = safra("2024/25", 2024, Some(dec!(5)));
        let id = s.id.to_string();

        let mut a = bancaria("Sicredi", ModalidadeDivida::Custeio, Moeda::Brl, json!({ &id: 100 }));
        a.taxa_real = Some(dec!(8.5));
        let mut b = bancaria("Sicredi", ModalidadeDivida::Custeio, Moeda::Usd, json!({ &id: 10 }));
        b.taxa_real = Some(dec!(11));
        let c = bancaria("Sicredi", ModalidadeDivida::Investimentos, Moeda::Brl, json!({ &id: 7 }));
        let first_id = a.id;

        let data = ReportDataset { safras: vec![s], bancarias: vec![a, b, c], ..Default::default() };
        let resp = compute_debt_details(&data, dec!(5.50));

        assert_eq!(resp.bancos.len(), 2);
        let custeio = &resp.bancos[0];
        assert_eq!(custeio.nome, "Sicredi - Custeio");
        assert_eq!(custeio.id, first_id);
        assert_eq!(custeio.taxa_juros, Some(dec!(11)));
        assert_eq!(custeio.valores_por_ano["2024/25"], dec!(150));
    }

    #[test]
    fn leases_sum_area_and_default_their_type() {
        let s = safra("2024/25", 2024, None);
        let id = s.id.to_string();
        let data = ReportDataset {
            safras: vec![s],
            arrendamentos: vec![
                arrendamento("Fazenda Sul", dec!(100), json!({ &id: 10 })),
                arrendamento("Fazenda Sul", dec!(50), json!({ &id: 5 })),
            ],
            ..Default::default()
        };

        let resp = compute_debt_details(&data, dec!(5.50));

        assert_eq!(resp.arrendamentos.len(), 1);
        let sul = &resp.arrendamentos[0];
        assert_eq!(sul.area_hectares, Some(dec!(150)));
        assert_eq!(sul.tipo.as_deref(), Some("Arrendamento"));
        assert_eq!(sul.valores_por_ano["2024/25"], dec!(15));
    }

    #[test]
    fn land_and_suppliers_are_keyed_by_safra_name() {
        let s = safra("2025/26", 2025, None);
        let id = s.id;
        let data = ReportDataset {
            terras: vec![terra("Fazenda Norte", Some(id), Some(dec!(1000)), None)],
            fornecedores: vec![fornecedor("Adubos SA", Moeda::Usd, json!({ id.to_string(): 2 }))],
            safras: vec![s],
            ..Default::default()
        };

        let resp = compute_debt_details(&data, dec!(5.50));

        assert_eq!(resp.terras[0].valores_por_ano["2025/26"], dec!(1000));
        assert_eq!(resp.fornecedores[0].fornecedor.as_deref(), Some("Adubos SA"));
        assert_eq!(resp.fornecedores[0].valores_por_ano["2025/26"], dec!(11));
    }

    #[tokio::test]
    async fn database_failure_degrades_to_empty_details() {
        let service = DebtDetailsService::new(unreachable_loader(), dec!(5.50));

        let resp = service.debt_details(Uuid::new_v4()).await;

        assert!(resp.bancos.is_empty() && resp.terras.is_empty());
        assert!(resp.fornecedores.is_empty() && resp.arrendamentos.is_empty());
    }

    #[test]
    fn no_safras_means_no_details() {
        let resp = compute_debt_details(&ReportDataset::default(), dec!(5.50));
        assert!(resp.bancos.is_empty() && resp.terras.is_empty());
    }
}
