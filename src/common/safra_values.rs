// src/common/safra_values.rs
//
// Os valores financeiros e produtivos ficam em mapas JSONB `{ safraId: valor }`.
// Alguns registros antigos gravaram o mapa como string JSON; os dois formatos
// são aceitos aqui.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::models::{debts::Moeda, safra::Safra};

/// Converte um valor JSON (número ou string numérica) em `Decimal`.
pub fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
                .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))
        }
        Value::String(s) => {
            let trimmed = s.trim();
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .ok()
        }
        _ => None,
    }
}

/// Maior valor aceito num mapa por safra (faixa de um NUMERIC(18,2)).
pub fn max_safra_value() -> Decimal {
    Decimal::new(999_999_999_999_999_999, 2)
}

/// Lê um mapa por safra. Entradas não numéricas ou fora da faixa são ignoradas.
pub fn parse_safra_values(raw: &Value) -> BTreeMap<String, Decimal> {
    match raw {
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| value_to_decimal(v).map(|d| (k.clone(), d)))
            .filter(|(k, d)| {
                let dentro = d.abs() <= max_safra_value();
                if !dentro {
                    tracing::warn!("⚠️ Valor fora da faixa ignorado na safra {}: {}", k, d);
                }
                dentro
            })
            .collect(),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(inner @ Value::Object(_)) => parse_safra_values(&inner),
            _ => BTreeMap::new(),
        },
        _ => BTreeMap::new(),
    }
}

/// Remove as entradas zeradas (ou inválidas) antes de persistir um mapa editado.
pub fn strip_zero_entries(raw: &Value) -> Value {
    let cleaned = parse_safra_values(raw)
        .into_iter()
        .filter(|(_, v)| !v.is_zero())
        .map(|(k, v)| (k, decimal_to_value(v)))
        .collect::<serde_json::Map<String, Value>>();
    Value::Object(cleaned)
}

// Número JSON quando ele representa o `Decimal` sem perda; senão a string exata
fn decimal_to_value(valor: Decimal) -> Value {
    let texto = valor.normalize().to_string();
    let numero = serde_json::from_str::<serde_json::Number>(&texto)
        .ok()
        .map(Value::Number)
        .filter(|n| value_to_decimal(n) == Some(valor));
    numero.unwrap_or(Value::String(texto))
}

/// Mapa vazio, padrão dos payloads que omitem os valores por safra.
pub fn empty_safra_map() -> Value {
    Value::Object(serde_json::Map::new())
}

// ---
// SafraLookup: id -> nome e nome -> taxa USD/BRL
// ---
#[derive(Debug, Clone)]
pub struct SafraLookup {
    names: HashMap<Uuid, String>,
    rates: HashMap<String, Decimal>,
    default_rate: Decimal,
}

impl SafraLookup {
    /// Ordem da taxa: `taxa_cambio_usd` da safra, cotação DOLAR_FECHAMENTO
    /// cadastrada para a safra e, por fim, a taxa padrão configurada.
    pub fn new(
        safras: &[Safra],
        fechamento: Option<&BTreeMap<String, Decimal>>,
        default_rate: Decimal,
    ) -> Self {
        let mut names = HashMap::with_capacity(safras.len());
        let mut rates = HashMap::with_capacity(safras.len());

        for safra in safras {
            names.insert(safra.id, safra.nome.clone());

            let from_fechamento = fechamento
                .and_then(|m| m.get(&safra.id.to_string()))
                .copied()
                .filter(|r| r.is_sign_positive() && !r.is_zero());

            let rate = safra
                .taxa_cambio_usd
                .filter(|r| r.is_sign_positive() && !r.is_zero())
                .or(from_fechamento)
                .unwrap_or(default_rate);

            rates.insert(safra.nome.clone(), rate);
        }

        Self { names, rates, default_rate }
    }

    /// Nome da safra a partir da chave do mapa. Ids desconhecidos retornam `None`.
    pub fn name_of(&self, safra_key: &str) -> Option<&str> {
        let id = Uuid::parse_str(safra_key.trim()).ok()?;
        self.names.get(&id).map(String::as_str)
    }

    pub fn rate_for(&self, safra_name: &str) -> Decimal {
        self.rates.get(safra_name).copied().unwrap_or(self.default_rate)
    }

    /// Valor em reais. `None` quando a conversão estoura a faixa do `Decimal`.
    pub fn to_brl(&self, value: Decimal, moeda: Moeda, safra_name: &str) -> Option<Decimal> {
        match moeda {
            Moeda::Brl => Some(value),
            Moeda::Usd => value.checked_mul(self.rate_for(safra_name)),
        }
    }

    /// Soma em `acc` o valor convertido. Estouro de faixa é registrado e a entrada descartada.
    pub fn add_brl(&self, acc: &mut Decimal, value: Decimal, moeda: Moeda, safra_name: &str) {
        match self
            .to_brl(value, moeda, safra_name)
            .and_then(|brl| acc.checked_add(brl))
        {
            Some(total) => *acc = total,
            None => tracing::warn!(
                "⚠️ Valor descartado por estouro na safra {}: {} {:?}",
                safra_name,
                value,
                moeda
            ),
        }
    }

    pub fn default_rate(&self) -> Decimal {
        self.default_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn safra(nome: &str, ano: i32, taxa: Option<Decimal>) -> Safra {
        Safra {
            id: Uuid::new_v4(),
            organizacao_id: Uuid::nil(),
            nome: nome.to_string(),
            ano_inicio: ano,
            ano_fim: ano + 1,
            taxa_cambio_usd: taxa,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn parses_object_maps_with_numbers_and_strings() {
        let parsed = parse_safra_values(&json!({ "a": 10.5, "b": "20", "c": null, "d": "x" }));

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["a"], dec!(10.5));
        assert_eq!(parsed["b"], dec!(20));
    }

    #[test]
    fn parses_json_encoded_string_maps() {
        let parsed = parse_safra_values(&json!("{\"a\": 1500, \"b\": 0}"));

        assert_eq!(parsed["a"], dec!(1500));
        assert_eq!(parsed["b"], Decimal::ZERO);
    }

    #[test]
    fn garbage_yields_empty_map() {
        assert!(parse_safra_values(&json!("não é json")).is_empty());
        assert!(parse_safra_values(&json!([1, 2, 3])).is_empty());
        assert!(parse_safra_values(&Value::Null).is_empty());
    }

    #[test]
    fn strip_zero_entries_drops_zeros() {
        let cleaned = strip_zero_entries(&json!({ "a": 0, "b": 12.5, "c": "0.00" }));
        assert_eq!(cleaned, json!({ "b": 12.5 }));
    }

    #[test]
    fn strip_zero_entries_keeps_every_digit() {
        let cleaned = strip_zero_entries(&json!({ "a": "1234567890123456.78" }));

        assert_eq!(cleaned["a"], json!("1234567890123456.78"));
        assert_eq!(parse_safra_values(&cleaned)["a"], dec!(1234567890123456.78));
    }

    #[test]
    fn rate_prefers_safra_then_fechamento_then_default() {
        let s1 = safra("2023/24", 2023, Some(dec!(4.95)));
        let s2 = safra("2024/25", 2024, None);
        let s3 = safra("2025/26", 2025, None);
        let fechamento = BTreeMap::from([(s2.id.to_string(), dec!(5.30))]);

        let lookup = SafraLookup::new(&[s1.clone(), s2.clone(), s3.clone()], Some(&fechamento), dec!(5.50));

        assert_eq!(lookup.rate_for("2023/24"), dec!(4.95));
        assert_eq!(lookup.rate_for("2024/25"), dec!(5.30));
        assert_eq!(lookup.rate_for("2025/26"), dec!(5.50));
        assert_eq!(lookup.rate_for("desconhecida"), dec!(5.50));
        assert_eq!(lookup.name_of(&s2.id.to_string()), Some("2024/25"));
        assert_eq!(lookup.name_of(&Uuid::new_v4().to_string()), None);
        assert_eq!(lookup.name_of("lixo"), None);
    }

    #[test]
    fn converts_usd_with_the_safra_rate() {
        let s = safra("2024/25", 2024, Some(dec!(5)));
        let lookup = SafraLookup::new(&[s], None, dec!(5.50));

        assert_eq!(lookup.to_brl(dec!(100), Moeda::Usd, "2024/25"), Some(dec!(500)));
        assert_eq!(lookup.to_brl(dec!(100), Moeda::Brl, "2024/25"), Some(dec!(100)));
    }

    #[test]
    fn conversion_overflow_yields_none() {
        let s = safra("2024/25", 2024, Some(dec!(10000000000000)));
        let lookup = SafraLookup::new(&[s], None, dec!(5.50));

        assert_eq!(lookup.to_brl(dec!(50000000000000000000000000000), Moeda::Usd, "2024/25"), None);
        assert_eq!(lookup.to_brl(max_safra_value(), Moeda::Usd, "2024/25"), None);
    }

    #[test]
    fn add_brl_skips_entries_that_overflow() {
        let s = safra("2024/25", 2024, Some(dec!(10000000000000)));
        let lookup = SafraLookup::new(&[s], None, dec!(5.50));
        let mut acc = dec!(10);

        lookup.add_brl(&mut acc, dec!(50000000000000000000000000000), Moeda::Usd, "2024/25");
        assert_eq!(acc, dec!(10));

        lookup.add_brl(&mut acc, dec!(2), Moeda::Usd, "2024/25");
        assert_eq!(acc, dec!(20000000000010));

        let mut cheio = Decimal::MAX;
        lookup.add_brl(&mut cheio, dec!(1), Moeda::Brl, "2024/25");
        assert_eq!(cheio, Decimal::MAX);
    }

    #[test]
    fn out_of_range_entries_are_dropped() {
        let parsed = parse_safra_values(&json!({ "a": 5e28, "b": "-1e20", "c": 10 }));

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["c"], dec!(10));
    }
}
