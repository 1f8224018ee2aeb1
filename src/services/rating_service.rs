// src/services/rating_service.rs
//
// Rating de crédito de uma safra: seis indicadores pontuados por faixa e
// combinados numa média ponderada.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        reports::{RatingMetric, RatingMetricCode, RatingResult},
        safra::Safra,
    },
    services::projection_service::{percent, ProjectionService, Projections},
};

// Dívida sem denominador positivo leva o indicador ao pior extremo
const SEM_BASE: Decimal = Decimal::from_parts(999, 0, 0, false, 0);
const LIQUIDEZ_SEM_PASSIVO: Decimal = Decimal::from_parts(99999, 0, 0, false, 2);

// Faixa `min <= valor < max`; limites ausentes são infinitos
struct Faixa {
    min: Option<Decimal>,
    max: Option<Decimal>,
    pontuacao: u32,
    nivel: &'static str,
}

const fn d(num: i64, scale: u32) -> Decimal {
    Decimal::from_parts(num as u32, 0, 0, false, scale)
}

const fn faixa(min: Option<Decimal>, max: Option<Decimal>, pontuacao: u32, nivel: &'static str) -> Faixa {
    Faixa { min, max, pontuacao, nivel }
}

const LIQUIDEZ_CORRENTE: &[Faixa] = &[
    faixa(Some(d(2, 0)), None, 100, "Excelente"),
    faixa(Some(d(15, 1)), Some(d(2, 0)), 85, "Muito bom"),
    faixa(Some(d(12, 1)), Some(d(15, 1)), 70, "Bom"),
    faixa(Some(d(1, 0)), Some(d(12, 1)), 55, "Regular"),
    faixa(Some(d(8, 1)), Some(d(1, 0)), 35, "Fraco"),
    faixa(None, Some(d(8, 1)), 15, "Crítico"),
];

const DIVIDA_EBITDA: &[Faixa] = &[
    faixa(None, Some(d(1, 0)), 100, "Excelente"),
    faixa(Some(d(1, 0)), Some(d(2, 0)), 85, "Muito bom"),
    faixa(Some(d(2, 0)), Some(d(3, 0)), 70, "Bom"),
    faixa(Some(d(3, 0)), Some(d(4, 0)), 50, "Regular"),
    faixa(Some(d(4, 0)), Some(d(5, 0)), 30, "Fraco"),
    faixa(Some(d(5, 0)), None, 10, "Crítico"),
];

const DIVIDA_FATURAMENTO: &[Faixa] = &[
    faixa(None, Some(d(3, 1)), 100, "Excelente"),
    faixa(Some(d(3, 1)), Some(d(5, 1)), 85, "Muito bom"),
    faixa(Some(d(5, 1)), Some(d(7, 1)), 70, "Bom"),
    faixa(Some(d(7, 1)), Some(d(1, 0)), 50, "Regular"),
    faixa(Some(d(1, 0)), Some(d(15, 1)), 30, "Fraco"),
    faixa(Some(d(15, 1)), None, 10, "Crítico"),
];

const DIVIDA_PATRIMONIO_LIQUIDO: &[Faixa] = &[
    faixa(None, Some(d(3, 1)), 100, "Excelente"),
    faixa(Some(d(3, 1)), Some(d(5, 1)), 85, "Muito bom"),
    faixa(Some(d(5, 1)), Some(d(8, 1)), 70, "Bom"),
    faixa(Some(d(8, 1)), Some(d(12, 1)), 50, "Regular"),
    faixa(Some(d(12, 1)), Some(d(2, 0)), 30, "Fraco"),
    faixa(Some(d(2, 0)), None, 10, "Crítico"),
];

// LTV em %
const LTV: &[Faixa] = &[
    faixa(None, Some(d(20, 0)), 100, "Excelente"),
    faixa(Some(d(20, 0)), Some(d(35, 0)), 85, "Muito bom"),
    faixa(Some(d(35, 0)), Some(d(50, 0)), 70, "Bom"),
    faixa(Some(d(50, 0)), Some(d(65, 0)), 50, "Regular"),
    faixa(Some(d(65, 0)), Some(d(80, 0)), 30, "Fraco"),
    faixa(Some(d(80, 0)), None, 10, "Crítico"),
];

// Margem EBITDA em %
const MARGEM_EBITDA: &[Faixa] = &[
    faixa(Some(d(35, 0)), None, 100, "Excelente"),
    faixa(Some(d(25, 0)), Some(d(35, 0)), 85, "Muito bom"),
    faixa(Some(d(20, 0)), Some(d(25, 0)), 70, "Bom"),
    faixa(Some(d(15, 0)), Some(d(20, 0)), 50, "Regular"),
    faixa(Some(d(10, 0)), Some(d(15, 0)), 30, "Fraco"),
    faixa(None, Some(d(10, 0)), 10, "Crítico"),
];

impl RatingMetricCode {
    pub fn nome(&self) -> &'static str {
        match self {
            RatingMetricCode::Ltv => "LTV",
            RatingMetricCode::DividaEbitda => "Dívida / EBITDA",
            RatingMetricCode::MargemEbitda => "Margem EBITDA",
            RatingMetricCode::LiquidezCorrente => "Liquidez Corrente",
            RatingMetricCode::DividaFaturamento => "Dívida / Faturamento",
            RatingMetricCode::DividaPatrimonioLiquido => "Dívida / Patrimônio Líquido",
        }
    }

    pub fn peso(&self) -> u32 {
        match self {
            RatingMetricCode::Ltv => 15,
            RatingMetricCode::DividaEbitda => 20,
            RatingMetricCode::MargemEbitda => 15,
            RatingMetricCode::LiquidezCorrente => 10,
            RatingMetricCode::DividaFaturamento => 20,
            RatingMetricCode::DividaPatrimonioLiquido => 15,
        }
    }

    fn faixas(&self) -> &'static [Faixa] {
        match self {
            RatingMetricCode::Ltv => LTV,
            RatingMetricCode::DividaEbitda => DIVIDA_EBITDA,
            RatingMetricCode::MargemEbitda => MARGEM_EBITDA,
            RatingMetricCode::LiquidezCorrente => LIQUIDEZ_CORRENTE,
            RatingMetricCode::DividaFaturamento => DIVIDA_FATURAMENTO,
            RatingMetricCode::DividaPatrimonioLiquido => DIVIDA_PATRIMONIO_LIQUIDO,
        }
    }

    /// Pontuação (0-100) e nível da faixa em que o valor cai.
    pub fn score(&self, valor: Decimal) -> (u32, &'static str) {
        self.faixas()
            .iter()
            .find(|f| f.min.is_none_or(|min| valor >= min) && f.max.is_none_or(|max| valor < max))
            .map(|f| (f.pontuacao, f.nivel))
            .unwrap_or((0, "Sem dados"))
    }
}

/// Classe de rating e descrição para a pontuação final.
pub fn classify(pontuacao: Decimal) -> (&'static str, &'static str) {
    const CLASSES: &[(i64, &str, &str)] = &[
        (90, "AAA", "Excelente capacidade de pagamento e gestão financeira excepcional"),
        (85, "AA", "Ótima capacidade de pagamento e gestão financeira muito sólida"),
        (80, "A", "Boa capacidade de pagamento e gestão financeira sólida"),
        (75, "BBB", "Capacidade de pagamento adequada com gestão financeira satisfatória"),
        (70, "BB", "Capacidade de pagamento moderada com alguns pontos de atenção"),
        (65, "B", "Capacidade de pagamento limitada requerendo monitoramento"),
        (60, "CCC", "Capacidade de pagamento vulnerável com riscos significativos"),
        (55, "CC", "Capacidade de pagamento muito vulnerável com alto risco"),
        (50, "C", "Capacidade de pagamento extremamente vulnerável"),
    ];

    CLASSES
        .iter()
        .find(|(min, _, _)| pontuacao >= Decimal::from(*min))
        .map(|(_, classe, descricao)| (*classe, *descricao))
        .unwrap_or(("D", "Situação crítica com alto risco de inadimplência"))
}

fn divide_or_worst(num: Decimal, den: Decimal) -> Decimal {
    if den <= Decimal::ZERO {
        if num > Decimal::ZERO { SEM_BASE } else { Decimal::ZERO }
    } else {
        num.checked_div(den).map(|v| v.round_dp(2)).unwrap_or(SEM_BASE)
    }
}

fn liquidez(ativo: Decimal, passivo: Decimal) -> Decimal {
    if passivo > Decimal::ZERO {
        (ativo / passivo).round_dp(2)
    } else if ativo > Decimal::ZERO {
        LIQUIDEZ_SEM_PASSIVO
    } else {
        Decimal::ZERO
    }
}

/// Rating de uma safra a partir das projeções já calculadas.
pub fn compute_rating(
    safras: &[Safra],
    projections: &Projections,
    safra_id: Uuid,
) -> Result<RatingResult, AppError> {
    let safra = safras
        .iter()
        .find(|s| s.id == safra_id)
        .ok_or(AppError::ResourceNotFound("Safra"))?;

    let (receita, ebitda) = projections
        .dre
        .iter()
        .find(|d| d.safra == safra.nome)
        .map(|d| (d.receita_bruta, d.ebitda))
        .unwrap_or_default();

    let divida = projections
        .posicao_divida
        .iter()
        .find(|p| p.safra == safra.nome)
        .map(|p| p.endividamento_total)
        .unwrap_or_default();

    // LTV: parcelas de terras da safra avaliada em diante sobre o valor dos imóveis, até 100%
    let terras_em_aberto = projections
        .posicao_divida
        .iter()
        .filter(|p| {
            safras
                .iter()
                .any(|s| s.nome == p.safra && s.ano_inicio >= safra.ano_inicio)
        })
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.terras));

    let balanco = projections.balanco.iter().find(|b| b.safra == safra.nome);
    let (ativo_circulante, passivo_circulante, imoveis, patrimonio) = balanco
        .map(|b| (b.ativo_circulante, b.passivo_circulante, b.ativo_nao_circulante, b.patrimonio_liquido))
        .unwrap_or_default();

    let valores = [
        (RatingMetricCode::LiquidezCorrente, liquidez(ativo_circulante, passivo_circulante)),
        (RatingMetricCode::DividaEbitda, divide_or_worst(divida, ebitda)),
        (RatingMetricCode::DividaFaturamento, divide_or_worst(divida, receita)),
        (RatingMetricCode::DividaPatrimonioLiquido, divide_or_worst(divida, patrimonio)),
        (RatingMetricCode::Ltv, percent(terras_em_aberto, imoveis).min(Decimal::ONE_HUNDRED)),
        (RatingMetricCode::MargemEbitda, percent(ebitda, receita)),
    ];

    let metrics: Vec<RatingMetric> = valores
        .into_iter()
        .map(|(codigo, valor)| {
            let (pontuacao, nivel) = codigo.score(valor);
            RatingMetric {
                codigo,
                nome: codigo.nome().to_string(),
                valor,
                pontuacao: Decimal::from(pontuacao),
                nivel: nivel.to_string(),
                peso: Decimal::from(codigo.peso()),
            }
        })
        .collect();

    let soma_pesos: Decimal = metrics.iter().map(|m| m.peso).sum();
    let soma: Decimal = metrics.iter().map(|m| m.pontuacao * m.peso).sum();
    let pontuacao_total = if soma_pesos.is_zero() {
        Decimal::ZERO
    } else {
        (soma / soma_pesos).round_dp(2)
    };

    let (classificacao, descricao) = classify(pontuacao_total);

    Ok(RatingResult {
        safra_id: safra.id,
        safra: safra.nome.clone(),
        metrics,
        pontuacao_total,
        classificacao: classificacao.to_string(),
        descricao: descricao.to_string(),
    })
}

#[derive(Clone)]
pub struct RatingService {
    projections: ProjectionService,
}

impl RatingService {
    pub fn new(projections: ProjectionService) -> Self {
        Self { projections }
    }

    pub async fn rating(&self, org_id: Uuid, safra_id: Uuid) -> Result<RatingResult, AppError> {
        let (data, projections) = self.projections.load_with_projections(org_id).await?;
        let result = compute_rating(&data.safras, &projections, safra_id)?;

        tracing::info!(
            "📊 Rating da safra {} para organização {}: {} ({})",
            result.safra,
            org_id,
            result.classificacao,
            result.pontuacao_total
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::reports::{BalancoLinha, DebtPositionLinha, DreLinha},
        services::report_data::fixtures::safra,
    };
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(RatingMetricCode::LiquidezCorrente, dec!(2.0), 100)]
    #[case(RatingMetricCode::LiquidezCorrente, dec!(1.99), 85)]
    #[case(RatingMetricCode::LiquidezCorrente, dec!(0.5), 15)]
    #[case(RatingMetricCode::DividaEbitda, dec!(0.99), 100)]
    #[case(RatingMetricCode::DividaEbitda, dec!(3), 50)]
    #[case(RatingMetricCode::DividaEbitda, dec!(999), 10)]
    #[case(RatingMetricCode::DividaFaturamento, dec!(0.7), 50)]
    #[case(RatingMetricCode::DividaPatrimonioLiquido, dec!(1.2), 30)]
    #[case(RatingMetricCode::Ltv, dec!(0), 100)]
    #[case(RatingMetricCode::Ltv, dec!(80), 10)]
    #[case(RatingMetricCode::MargemEbitda, dec!(24.99), 70)]
    #[case(RatingMetricCode::MargemEbitda, dec!(-5), 10)]
    fn threshold_bands(#[case] codigo: RatingMetricCode, #[case] valor: Decimal, #[case] esperado: u32) {
        assert_eq!(codigo.score(valor).0, esperado);
    }

    #[rstest]
    #[case(dec!(100), "AAA")]
    #[case(dec!(90), "AAA")]
    #[case(dec!(89.99), "AA")]
    #[case(dec!(75), "BBB")]
    #[case(dec!(50), "C")]
    #[case(dec!(49.99), "D")]
    fn classification(#[case] pontuacao: Decimal, #[case] classe: &str) {
        assert_eq!(classify(pontuacao).0, classe);
    }

    // Os seis indicadores quantitativos somam 95; a nota final divide pela soma dos pesos
    #[test]
    fn weights_of_the_quantitative_indicators() {
        let codigos = [
            RatingMetricCode::Ltv,
            RatingMetricCode::DividaEbitda,
            RatingMetricCode::MargemEbitda,
            RatingMetricCode::LiquidezCorrente,
            RatingMetricCode::DividaFaturamento,
            RatingMetricCode::DividaPatrimonioLiquido,
        ];
        assert_eq!(codigos.iter().map(|c| c.peso()).sum::<u32>(), 95);
    }

    fn projections_for(nome: &str, receita: Decimal, ebitda: Decimal, divida: Decimal) -> Projections {
        let imoveis = dec!(10000000);
        let caixa = dec!(2000000);
        Projections {
            dre: vec![DreLinha {
                safra: nome.into(),
                receita_bruta: receita,
                custos_producao: receita - ebitda,
                lucro_bruto: ebitda,
                despesas_arrendamento: Decimal::ZERO,
                ebitda,
                margem_ebitda: percent(ebitda, receita),
            }],
            balanco: vec![BalancoLinha {
                safra: nome.into(),
                ativo_circulante: caixa,
                ativo_nao_circulante: imoveis,
                ativo_total: caixa + imoveis,
                passivo_circulante: divida,
                passivo_nao_circulante: Decimal::ZERO,
                passivo_total: divida,
                patrimonio_liquido: caixa + imoveis - divida,
            }],
            posicao_divida: vec![DebtPositionLinha {
                safra: nome.into(),
                bancos: divida,
                terras: Decimal::ZERO,
                fornecedores: Decimal::ZERO,
                endividamento_total: divida,
                caixas_disponibilidades: caixa,
                divida_liquida: Decimal::ZERO,
                reducao_valor: None,
                reducao_percentual: None,
                receita,
                ebitda,
                divida_receita: None,
                divida_ebitda: None,
                divida_liquida_receita: None,
                divida_liquida_ebitda: None,
                taxa_cambio: dec!(5),
                divida_dolar: divida / dec!(5),
                divida_liquida_dolar: Decimal::ZERO,
                ltv: Decimal::ZERO,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn healthy_farm_gets_top_rating() {
        let s = safra("2024/25", 2024, None);
        let p = projections_for("2024/25", dec!(10000000), dec!(4000000), dec!(1000000));

        let r = compute_rating(std::slice::from_ref(&s), &p, s.id).unwrap();

        // liquidez 2.0, dív/ebitda 0.25, dív/fat 0.1, dív/PL 0.09, LTV 10%, margem 40%
        assert_eq!(r.pontuacao_total, dec!(100));
        assert_eq!(r.classificacao, "AAA");
        assert_eq!(r.metrics.len(), 6);
    }

    #[test]
    fn no_ebitda_pushes_debt_ratio_to_worst_band() {
        let s = safra("2024/25", 2024, None);
        let p = projections_for("2024/25", dec!(10000000), Decimal::ZERO, dec!(1000000));

        let r = compute_rating(std::slice::from_ref(&s), &p, s.id).unwrap();
        let divida_ebitda = r
            .metrics
            .iter()
            .find(|m| m.codigo == RatingMetricCode::DividaEbitda)
            .unwrap();

        assert_eq!(divida_ebitda.valor, dec!(999));
        assert_eq!(divida_ebitda.pontuacao, dec!(10));
        assert!(r.pontuacao_total < dec!(90));
    }

    #[test]
    fn debt_free_safra_without_revenue_is_not_critical() {
        let s = safra("2024/25", 2024, None);

        let r = compute_rating(std::slice::from_ref(&s), &Projections::default(), s.id).unwrap();

        for codigo in [
            RatingMetricCode::DividaEbitda,
            RatingMetricCode::DividaFaturamento,
            RatingMetricCode::DividaPatrimonioLiquido,
        ] {
            let m = r.metrics.iter().find(|m| m.codigo == codigo).unwrap();
            assert_eq!(m.valor, Decimal::ZERO);
            assert_eq!(m.pontuacao, dec!(100));
        }
    }

    #[test]
    fn ltv_uses_outstanding_land_debt_and_is_capped() {
        let anterior = safra("2023/24", 2023, None);
        let atual = safra("2024/25", 2024, None);
        let seguinte = safra("2025/26", 2025, None);
        let safras = [anterior.clone(), atual.clone(), seguinte.clone()];

        let mut p = projections_for("2024/25", dec!(10000000), dec!(4000000), dec!(1000000));
        let base = p.posicao_divida[0].clone();
        p.posicao_divida[0].terras = dec!(1000000);
        p.posicao_divida.push(DebtPositionLinha { safra: "2025/26".into(), terras: dec!(2000000), ..base.clone() });
        p.posicao_divida.push(DebtPositionLinha { safra: "2023/24".into(), terras: dec!(9000000), ..base });

        let ltv = |r: &RatingResult| r.metrics.iter().find(|m| m.codigo == RatingMetricCode::Ltv).unwrap().valor;

        // (1M + 2M) / 10M; a safra anterior fica de fora
        let r = compute_rating(&safras, &p, atual.id).unwrap();
        assert_eq!(ltv(&r), dec!(30));

        p.posicao_divida[1].terras = dec!(50000000);
        let r = compute_rating(&safras, &p, atual.id).unwrap();
        assert_eq!(ltv(&r), dec!(100));
        assert_eq!(r.metrics.iter().find(|m| m.codigo == RatingMetricCode::Ltv).unwrap().pontuacao, dec!(10));
    }

    #[test]
    fn unknown_safra_is_not_found() {
        let p = Projections::default();
        let r = compute_rating(&[], &p, Uuid::new_v4());
        assert!(matches!(r, Err(AppError::ResourceNotFound("Safra"))));
    }

    #[test]
    fn liquidity_without_liabilities() {
        assert_eq!(liquidez(dec!(10), Decimal::ZERO), dec!(999.99));
        assert_eq!(liquidez(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }
}
