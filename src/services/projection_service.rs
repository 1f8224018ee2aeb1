// src/services/projection_service.rs
//
// Projeções por safra a partir das áreas, produtividades, custos e preços
// cadastrados, cruzadas com o endividamento.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        safra_values::{parse_safra_values, SafraLookup},
    },
    models::{
        production::AreaPlantio,
        reports::{
            BalancoLinha, ConsolidatedProjection, CultureProjection, CultureProjectionsResponse,
            DebtPositionLinha, DreLinha, FluxoCaixaLinha,
        },
        safra::Safra,
    },
    services::report_data::{ReportDataLoader, ReportDataset, SafraTotals},
};

const CEM: Decimal = Decimal::ONE_HUNDRED;

/// `num / den * 100`, zero quando não há base ou o resultado sai da faixa.
pub(crate) fn percent(num: Decimal, den: Decimal) -> Decimal {
    num.checked_div(den)
        .and_then(|q| q.checked_mul(CEM))
        .map(|v| v.round_dp(2))
        .unwrap_or_default()
}

fn ratio(num: Decimal, den: Decimal) -> Option<Decimal> {
    if den > Decimal::ZERO {
        num.checked_div(den).map(|v| v.round_dp(2))
    } else {
        None
    }
}

// Soma que satura no limite do `Decimal`
fn soma(valores: impl Iterator<Item = Decimal>) -> Decimal {
    valores.fold(Decimal::ZERO, Decimal::saturating_add)
}

fn value_at(raw: &serde_json::Value, safra: &Safra) -> Decimal {
    parse_safra_values(raw)
        .get(&safra.id.to_string())
        .copied()
        .unwrap_or_default()
}

#[derive(Debug, Default, Clone, Copy)]
struct Acumulado {
    area: Decimal,
    producao: Decimal,
    receita: Decimal,
    custo: Decimal,
}

// Contexto de cálculo: nomes e taxas resolvidos uma vez só
struct Projetor<'a> {
    data: &'a ReportDataset,
    lookup: SafraLookup,
    culturas: HashMap<Uuid, &'a str>,
    sistemas: HashMap<Uuid, &'a str>,
}

impl<'a> Projetor<'a> {
    fn new(data: &'a ReportDataset, default_rate: Decimal) -> Self {
        Self {
            data,
            lookup: data.lookup(default_rate),
            culturas: data.culturas.iter().map(|c| (c.id, c.nome.as_str())).collect(),
            sistemas: data.sistemas.iter().map(|s| (s.id, s.nome.as_str())).collect(),
        }
    }

    // Produtividade da mesma propriedade primeiro, depois a geral da cultura/sistema
    fn produtividade(&self, area: &AreaPlantio, safra: &Safra) -> Decimal {
        let candidatas: Vec<_> = self
            .data
            .produtividades
            .iter()
            .filter(|p| p.cultura_id == area.cultura_id && p.sistema_id == area.sistema_id)
            .collect();

        candidatas
            .iter()
            .find(|p| p.propriedade_id == Some(area.propriedade_id))
            .or_else(|| candidatas.iter().find(|p| p.propriedade_id.is_none()))
            .or_else(|| candidatas.first())
            .map(|p| value_at(&p.produtividades_por_safra, safra))
            .unwrap_or_default()
    }

    // Preço por cultura+sistema, depois só cultura; preços em dólar viram reais
    fn preco(&self, area: &AreaPlantio, safra: &Safra) -> Decimal {
        let precos = &self.data.precos;
        let escolhido = precos
            .iter()
            .find(|p| p.cultura_id == Some(area.cultura_id) && p.sistema_id == Some(area.sistema_id))
            .or_else(|| {
                precos
                    .iter()
                    .find(|p| p.cultura_id == Some(area.cultura_id) && p.sistema_id.is_none())
            })
            .or_else(|| precos.iter().find(|p| p.cultura_id == Some(area.cultura_id)));

        let Some(preco) = escolhido else {
            return Decimal::ZERO;
        };

        let valor = parse_safra_values(&preco.precos_por_safra)
            .get(&safra.id.to_string())
            .copied()
            .unwrap_or(preco.current_price);

        let unit = preco.unit.trim().to_uppercase();
        if unit.starts_with("US$") || unit.starts_with("USD") {
            valor.saturating_mul(self.lookup.rate_for(&safra.nome))
        } else {
            valor
        }
    }

    // Soma das categorias de custo (R$/ha) que valem para a área
    fn custo_ha(&self, area: &AreaPlantio, safra: &Safra) -> Decimal {
        soma(
            self.data
                .custos
                .iter()
                .filter(|c| c.cultura_id == area.cultura_id && c.sistema_id == area.sistema_id)
                .filter(|c| c.propriedade_id.is_none_or(|p| p == area.propriedade_id))
                .map(|c| value_at(&c.custos_por_safra, safra)),
        )
    }

    fn cultures(&self) -> CultureProjectionsResponse {
        let safras = self.data.safras_ordenadas();
        let mut projecoes = Vec::new();
        let mut consolidado = Vec::new();

        for safra in &safras {
            let mut grupos: BTreeMap<(&str, &str), Acumulado> = BTreeMap::new();

            for area in &self.data.areas {
                let ha = value_at(&area.areas_por_safra, safra);
                if ha <= Decimal::ZERO {
                    continue;
                }

                let producao = ha.saturating_mul(self.produtividade(area, safra));
                let cultura = self.culturas.get(&area.cultura_id).copied().unwrap_or("CULTURA");
                let sistema = self.sistemas.get(&area.sistema_id).copied().unwrap_or("SISTEMA");

                let acc = grupos.entry((cultura, sistema)).or_default();
                acc.area = acc.area.saturating_add(ha);
                acc.producao = acc.producao.saturating_add(producao);
                acc.receita = acc.receita.saturating_add(producao.saturating_mul(self.preco(area, safra)));
                acc.custo = acc.custo.saturating_add(ha.saturating_mul(self.custo_ha(area, safra)));
            }

            let mut total = Acumulado::default();
            for ((cultura, sistema), acc) in grupos {
                total.area = total.area.saturating_add(acc.area);
                total.receita = total.receita.saturating_add(acc.receita);
                total.custo = total.custo.saturating_add(acc.custo);

                let ebitda = acc.receita.saturating_sub(acc.custo);
                projecoes.push(CultureProjection {
                    safra: safra.nome.clone(),
                    cultura: cultura.to_string(),
                    sistema: sistema.to_string(),
                    area: acc.area,
                    produtividade: ratio(acc.producao, acc.area).unwrap_or_default(),
                    producao: acc.producao,
                    preco: ratio(acc.receita, acc.producao).unwrap_or_default(),
                    receita: acc.receita,
                    custo_total: acc.custo,
                    ebitda,
                    margem_ebitda: percent(ebitda, acc.receita),
                });
            }

            let ebitda = total.receita.saturating_sub(total.custo);
            consolidado.push(ConsolidatedProjection {
                safra: safra.nome.clone(),
                area: total.area,
                receita: total.receita,
                custo_total: total.custo,
                ebitda,
                margem_ebitda: percent(ebitda, total.receita),
            });
        }

        CultureProjectionsResponse { projecoes, consolidado }
    }
}

// ---
// Demonstrativos derivados
// ---

fn totals_for(totals: &HashMap<String, SafraTotals>, safra: &str) -> SafraTotals {
    totals.get(safra).copied().unwrap_or_default()
}

fn dre(consolidado: &[ConsolidatedProjection], totals: &HashMap<String, SafraTotals>) -> Vec<DreLinha> {
    consolidado
        .iter()
        .map(|c| {
            let arrendamento = totals_for(totals, &c.safra).arrendamentos;
            let lucro_bruto = c.receita.saturating_sub(c.custo_total);
            let ebitda = lucro_bruto.saturating_sub(arrendamento);
            DreLinha {
                safra: c.safra.clone(),
                receita_bruta: c.receita,
                custos_producao: c.custo_total,
                lucro_bruto,
                despesas_arrendamento: arrendamento,
                ebitda,
                margem_ebitda: percent(ebitda, c.receita),
            }
        })
        .collect()
}

fn fluxo_caixa(dre: &[DreLinha], totals: &HashMap<String, SafraTotals>) -> Vec<FluxoCaixaLinha> {
    // O acumulado parte do caixa da primeira safra
    let mut acumulado = dre
        .first()
        .map(|d| totals_for(totals, &d.safra).caixa_bancos)
        .unwrap_or_default();

    dre.iter()
        .map(|d| {
            let servico_divida = totals_for(totals, &d.safra).endividamento();
            let fluxo_liquido = d
                .receita_bruta
                .saturating_sub(d.custos_producao)
                .saturating_sub(d.despesas_arrendamento)
                .saturating_sub(servico_divida);
            acumulado = acumulado.saturating_add(fluxo_liquido);
            FluxoCaixaLinha {
                safra: d.safra.clone(),
                receitas: d.receita_bruta,
                custos: d.custos_producao,
                arrendamentos: d.despesas_arrendamento,
                servico_divida,
                fluxo_liquido,
                fluxo_acumulado: acumulado,
            }
        })
        .collect()
}

fn balanco(
    safras: &[&Safra],
    totals: &HashMap<String, SafraTotals>,
    valor_imoveis: Decimal,
) -> Vec<BalancoLinha> {
    safras
        .iter()
        .enumerate()
        .map(|(i, safra)| {
            let atual = totals_for(totals, &safra.nome);
            let passivo_circulante = atual.endividamento();
            let passivo_nao_circulante = soma(
                safras[i + 1..]
                    .iter()
                    .map(|s| totals_for(totals, &s.nome).endividamento()),
            );

            let ativo_total = atual.caixa.saturating_add(valor_imoveis);
            let passivo_total = passivo_circulante.saturating_add(passivo_nao_circulante);

            BalancoLinha {
                safra: safra.nome.clone(),
                ativo_circulante: atual.caixa,
                ativo_nao_circulante: valor_imoveis,
                ativo_total,
                passivo_circulante,
                passivo_nao_circulante,
                passivo_total,
                patrimonio_liquido: ativo_total.saturating_sub(passivo_total),
            }
        })
        .collect()
}

fn posicao_divida(
    safras: &[&Safra],
    totals: &HashMap<String, SafraTotals>,
    dre: &[DreLinha],
    lookup: &SafraLookup,
    valor_imoveis: Decimal,
) -> Vec<DebtPositionLinha> {
    let mut anterior: Option<Decimal> = None;

    safras
        .iter()
        .map(|safra| {
            let t = totals_for(totals, &safra.nome);
            let total = t.endividamento();
            let liquida = total.saturating_sub(t.caixa).max(Decimal::ZERO);

            let (receita, ebitda) = dre
                .iter()
                .find(|d| d.safra == safra.nome)
                .map(|d| (d.receita_bruta, d.ebitda))
                .unwrap_or_default();

            let reducao_valor = anterior.map(|prev| prev.saturating_sub(total));
            let reducao_percentual = anterior
                .filter(|prev| *prev > Decimal::ZERO)
                .map(|prev| percent(prev.saturating_sub(total), prev));
            anterior = Some(total);

            let taxa = lookup.rate_for(&safra.nome);
            let ativos = t.caixa.saturating_add(valor_imoveis);

            DebtPositionLinha {
                safra: safra.nome.clone(),
                bancos: t.bancos,
                terras: t.terras,
                fornecedores: t.fornecedores,
                endividamento_total: total,
                caixas_disponibilidades: t.caixa,
                divida_liquida: liquida,
                reducao_valor,
                reducao_percentual,
                receita,
                ebitda,
                divida_receita: ratio(total, receita),
                divida_ebitda: ratio(total, ebitda),
                divida_liquida_receita: ratio(liquida, receita),
                divida_liquida_ebitda: ratio(liquida, ebitda),
                taxa_cambio: taxa,
                divida_dolar: ratio(total, taxa).unwrap_or_default(),
                divida_liquida_dolar: ratio(liquida, taxa).unwrap_or_default(),
                ltv: percent(total, ativos),
            }
        })
        .collect()
}

// ---
// Conjunto completo de projeções de uma organização
// ---
#[derive(Debug, Clone, Default)]
pub struct Projections {
    pub culturas: CultureProjectionsResponse,
    pub dre: Vec<DreLinha>,
    pub fluxo_caixa: Vec<FluxoCaixaLinha>,
    pub balanco: Vec<BalancoLinha>,
    pub posicao_divida: Vec<DebtPositionLinha>,
}

pub fn compute_projections(data: &ReportDataset, default_rate: Decimal) -> Projections {
    let projetor = Projetor::new(data, default_rate);
    let culturas = projetor.cultures();

    let totals = data.totals_by_safra(&projetor.lookup);
    let safras = data.safras_ordenadas();
    let valor_imoveis = soma(data.propriedades.iter().filter_map(|p| p.valor_atual));

    let dre = dre(&culturas.consolidado, &totals);
    let fluxo_caixa = fluxo_caixa(&dre, &totals);
    let balanco = balanco(&safras, &totals, valor_imoveis);
    let posicao_divida = posicao_divida(&safras, &totals, &dre, &projetor.lookup, valor_imoveis);

    Projections { culturas, dre, fluxo_caixa, balanco, posicao_divida }
}

#[derive(Clone)]
pub struct ProjectionService {
    loader: ReportDataLoader,
    default_rate: Decimal,
}

impl ProjectionService {
    pub fn new(loader: ReportDataLoader, default_rate: Decimal) -> Self {
        Self { loader, default_rate }
    }

    pub async fn projections(&self, org_id: Uuid) -> Result<Projections, AppError> {
        let data = self.loader.load_full(org_id).await?;
        Ok(compute_projections(&data, self.default_rate))
    }

    /// Dados carregados junto com as projeções, para quem precisa dos dois (rating, PDF).
    pub async fn load_with_projections(&self, org_id: Uuid) -> Result<(ReportDataset, Projections), AppError> {
        let data = self.loader.load_full(org_id).await?;
        let projections = compute_projections(&data, self.default_rate);
        Ok((data, projections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            debts::{ModalidadeDivida, Moeda},
            liquidity::CategoriaCaixa,
            prices::PrecoCommodity,
            production::{CustoProducao, ItemCadastro, Produtividade},
            property::{Propriedade, TipoPropriedade},
        },
        services::report_data::fixtures::*,
    };
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn item(nome: &str) -> ItemCadastro {
        ItemCadastro { id: Uuid::new_v4(), organizacao_id: Uuid::nil(), nome: nome.into(), created_at: Utc::now() }
    }

    struct Cenario {
        data: ReportDataset,
        s24: String,
    }

    // Soja sequeiro, 1000 ha nas duas safras, 60 sc/ha, R$ 120/sc, R$ 4000/ha
    fn cenario() -> Cenario {
        let s24 = safra("2024/25", 2024, Some(dec!(5)));
        let s25 = safra("2025/26", 2025, Some(dec!(5)));
        let (id24, id25) = (s24.id.to_string(), s25.id.to_string());
        let soja = item("SOJA");
        let sequeiro = item("SEQUEIRO");
        let fazenda = Uuid::new_v4();

        let area = AreaPlantio {
            id: Uuid::new_v4(),
            organizacao_id: Uuid::nil(),
            propriedade_id: fazenda,
            cultura_id: soja.id,
            sistema_id: sequeiro.id,
            ciclo_id: Uuid::new_v4(),
            areas_por_safra: json!({ &id24: 1000, &id25: 1000 }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let produtividade = Produtividade {
            id: Uuid::new_v4(),
            organizacao_id: Uuid::nil(),
            propriedade_id: None,
            cultura_id: soja.id,
            sistema_id: sequeiro.id,
            produtividades_por_safra: json!({ &id24: 60, &id25: 60 }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let custo = |categoria: &str, valor: i64| CustoProducao {
            id: Uuid::new_v4(),
            organizacao_id: Uuid::nil(),
            propriedade_id: None,
            cultura_id: soja.id,
            sistema_id: sequeiro.id,
            categoria: categoria.into(),
            custos_por_safra: json!({ &id24: valor, &id25: valor }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let preco = PrecoCommodity {
            id: Uuid::new_v4(),
            organizacao_id: Uuid::nil(),
            commodity_type: "SOJA_SEQUEIRO".into(),
            cultura_id: Some(soja.id),
            sistema_id: Some(sequeiro.id),
            unit: "R$/sc".into(),
            current_price: dec!(100),
            precos_por_safra: json!({ &id24: 120 }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let propriedade = Propriedade {
            id: fazenda,
            organizacao_id: Uuid::nil(),
            nome: "Fazenda Sol".into(),
            tipo: TipoPropriedade::Propria,
            area_total: dec!(1200),
            area_cultivada: Some(dec!(1000)),
            valor_atual: Some(dec!(20000000)),
            cidade: None,
            estado: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let data = ReportDataset {
            custos: vec![custo("FERTILIZANTES", 2500), custo("SEMENTES", 1500)],
            areas: vec![area],
            produtividades: vec![produtividade],
            precos: vec![preco],
            propriedades: vec![propriedade],
            culturas: vec![soja],
            sistemas: vec![sequeiro],
            bancarias: vec![bancaria(
                "Banco do Brasil",
                ModalidadeDivida::Custeio,
                Moeda::Brl,
                json!({ &id24: 1000000, &id25: 500000 }),
            )],
            arrendamentos: vec![arrendamento("Fazenda Vizinha", dec!(200), json!({ &id24: 300000 }))],
            caixa: vec![caixa(CategoriaCaixa::CaixaBancos, Moeda::Brl, json!({ &id24: 2000000, &id25: 0 }))],
            safras: vec![s24, s25],
            ..Default::default()
        };

        Cenario { data, s24: id24 }
    }

    #[test]
    fn culture_projection_multiplies_area_productivity_and_price() {
        let p = compute_projections(&cenario().data, dec!(5.50));

        let soja24 = &p.culturas.projecoes[0];
        assert_eq!(soja24.cultura, "SOJA");
        assert_eq!(soja24.producao, dec!(60000));
        assert_eq!(soja24.receita, dec!(7200000));
        assert_eq!(soja24.custo_total, dec!(4000000));
        assert_eq!(soja24.ebitda, dec!(3200000));
        assert_eq!(soja24.margem_ebitda, dec!(44.44));

        // Sem preço na safra: usa o preço atual
        let soja25 = &p.culturas.projecoes[1];
        assert_eq!(soja25.preco, dec!(100));
        assert_eq!(p.culturas.consolidado[1].receita, dec!(6000000));
    }

    #[test]
    fn dollar_prices_are_converted_with_the_safra_rate() {
        let mut c = cenario();
        c.data.precos[0].unit = "US$/sc".into();
        c.data.precos[0].precos_por_safra = json!({ c.s24.clone(): 20 });

        let p = compute_projections(&c.data, dec!(5.50));

        assert_eq!(p.culturas.projecoes[0].preco, dec!(100));
    }

    #[test]
    fn dre_subtracts_leases_from_gross_profit() {
        let p = compute_projections(&cenario().data, dec!(5.50));

        let d24 = &p.dre[0];
        assert_eq!(d24.lucro_bruto, dec!(3200000));
        assert_eq!(d24.despesas_arrendamento, dec!(300000));
        assert_eq!(d24.ebitda, dec!(2900000));
    }

    #[test]
    fn cash_flow_accumulates_from_initial_cash() {
        let p = compute_projections(&cenario().data, dec!(5.50));

        // 7.2M - 4M - 0.3M - 1M
        assert_eq!(p.fluxo_caixa[0].fluxo_liquido, dec!(1900000));
        assert_eq!(p.fluxo_caixa[0].fluxo_acumulado, dec!(3900000));
        // 6M - 4M - 0 - 0.5M
        assert_eq!(p.fluxo_caixa[1].fluxo_liquido, dec!(1500000));
        assert_eq!(p.fluxo_caixa[1].fluxo_acumulado, dec!(5400000));
    }

    #[test]
    fn balance_sheet_splits_current_and_long_term_debt() {
        let p = compute_projections(&cenario().data, dec!(5.50));

        let b24 = &p.balanco[0];
        assert_eq!(b24.passivo_circulante, dec!(1000000));
        assert_eq!(b24.passivo_nao_circulante, dec!(500000));
        assert_eq!(b24.ativo_total, dec!(22000000));
        assert_eq!(b24.patrimonio_liquido, dec!(20500000));

        let b25 = &p.balanco[1];
        assert_eq!(b25.passivo_nao_circulante, Decimal::ZERO);
    }

    #[test]
    fn debt_position_tracks_reduction_and_ratios() {
        let p = compute_projections(&cenario().data, dec!(5.50));

        let d24 = &p.posicao_divida[0];
        assert_eq!(d24.divida_liquida, Decimal::ZERO);
        assert_eq!(d24.reducao_valor, None);
        assert_eq!(d24.divida_dolar, dec!(200000));

        let d25 = &p.posicao_divida[1];
        assert_eq!(d25.reducao_valor, Some(dec!(500000)));
        assert_eq!(d25.reducao_percentual, Some(dec!(50)));
        assert_eq!(d25.divida_receita, Some(dec!(0.08)));
    }

    #[test]
    fn values_at_the_top_of_the_range_saturate_instead_of_panicking() {
        let mut c = cenario();
        let teto = "9999999999999999.99";
        c.data.areas[0].areas_por_safra = json!({ &c.s24: teto });
        c.data.produtividades[0].produtividades_por_safra = json!({ &c.s24: teto });
        c.data.precos[0].precos_por_safra = json!({ &c.s24: teto });

        let p = compute_projections(&c.data, dec!(5.50));

        assert_eq!(p.culturas.consolidado[0].receita, Decimal::MAX);
        assert!(p.dre[0].margem_ebitda <= CEM);
        assert_eq!(percent(Decimal::MAX, dec!(0.0001)), Decimal::ZERO);
    }

    #[test]
    fn empty_dataset_yields_empty_projections() {
        let p = compute_projections(&ReportDataset::default(), dec!(5.50));
        assert!(p.dre.is_empty() && p.balanco.is_empty());
        assert_eq!(percent(Decimal::ONE, Decimal::ZERO), Decimal::ZERO);
    }
}
