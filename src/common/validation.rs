// src/common/validation.rs

use rust_decimal::Decimal;
use serde_json::Value;
use validator::ValidationError;

use crate::common::safra_values::{max_safra_value, value_to_decimal};

// ---
// Validações customizadas usadas pelos payloads
// ---
pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

/// Mapa `{ safraId: valor }` com valores numéricos, não negativos e na faixa de um NUMERIC(18,2).
pub fn validate_safra_map(val: &Value) -> Result<(), ValidationError> {
    let Value::Object(map) = val else {
        let mut err = ValidationError::new("safra_map");
        err.message = Some("Informe um objeto { safraId: valor }.".into());
        return Err(err);
    };

    for (safra_id, raw) in map {
        match value_to_decimal(raw) {
            Some(v) if !v.is_sign_negative() && v <= max_safra_value() => {}
            Some(v) if !v.is_sign_negative() => {
                let mut err = ValidationError::new("range");
                err.add_param("safraId".into(), safra_id);
                err.add_param("max".into(), &max_safra_value().to_string());
                err.message = Some("Valor por safra acima do máximo permitido.".into());
                return Err(err);
            }
            _ => {
                let mut err = ValidationError::new("safra_map");
                err.add_param("safraId".into(), safra_id);
                err.message = Some("Os valores por safra devem ser números não negativos.".into());
                return Err(err);
            }
        }
    }
    Ok(())
}

/// Ano final da safra não pode ser anterior ao inicial.
pub fn validate_year_order(ano_inicio: i32, ano_fim: i32) -> Result<(), ValidationError> {
    if ano_fim < ano_inicio {
        let mut err = ValidationError::new("ano_fim");
        err.message = Some("O ano final deve ser maior ou igual ao ano inicial.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn negative_decimals_are_rejected() {
        assert!(validate_not_negative(&dec!(0)).is_ok());
        assert!(validate_not_negative(&dec!(10.5)).is_ok());
        assert!(validate_not_negative(&dec!(-0.01)).is_err());
    }

    #[test]
    fn safra_maps_need_numeric_non_negative_values() {
        assert!(validate_safra_map(&json!({})).is_ok());
        assert!(validate_safra_map(&json!({ "a": 10, "b": "2.5" })).is_ok());
        assert!(validate_safra_map(&json!({ "a": -1 })).is_err());
        assert!(validate_safra_map(&json!({ "a": "abc" })).is_err());
        assert!(validate_safra_map(&json!([1, 2])).is_err());
    }

    #[test]
    fn safra_map_values_are_capped() {
        assert!(validate_safra_map(&json!({ "a": "9999999999999999.99" })).is_ok());

        let err = validate_safra_map(&json!({ "a": 5e28 })).unwrap_err();
        assert_eq!(err.code, "range");
        assert!(validate_safra_map(&json!({ "a": "10000000000000000" })).is_err());
    }

    #[test]
    fn year_order() {
        assert!(validate_year_order(2024, 2025).is_ok());
        assert!(validate_year_order(2024, 2024).is_ok());
        assert!(validate_year_order(2025, 2024).is_err());
    }
}
