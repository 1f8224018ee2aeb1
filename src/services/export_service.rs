// src/services/export_service.rs
//
// Planilha Excel com os cadastros financeiros da organização e o resumo de
// passivos. O arquivo volta em base64 ou segue anexado por e-mail.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::{error::AppError, safra_values::parse_safra_values},
    models::{
        exports::ExportedFile,
        reports::{LiabilitiesResponse, ReportFilter},
        safra::Safra,
    },
    services::{
        liabilities_service::compute_liabilities,
        report_data::{ReportDataLoader, ReportDataset},
    },
};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Empacota os bytes gerados no formato da resposta.
pub fn encode_file(filename: String, content_type: &str, bytes: &[u8]) -> ExportedFile {
    ExportedFile {
        filename,
        content_type: content_type.to_string(),
        data: STANDARD.encode(bytes),
    }
}

/// `Fazenda São João` -> `fazenda_sao_joao`
pub fn file_stem(nome: &str) -> String {
    let stem: String = nome
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            c if c.is_ascii_alphanumeric() => c,
            _ => '_',
        })
        .collect();

    let parts: Vec<&str> = stem.split('_').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        "organizacao".to_string()
    } else {
        parts.join("_")
    }
}

fn num(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

struct Formats {
    header: Format,
    money: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            money: Format::new().set_num_format("#,##0.00"),
        }
    }
}

// Cabeçalho fixo + uma coluna por safra
fn write_header(
    ws: &mut Worksheet,
    fixed: &[&str],
    safras: &[&Safra],
    fmt: &Formats,
) -> Result<(), AppError> {
    for (col, titulo) in fixed.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, *titulo, &fmt.header)?;
        ws.set_column_width(col as u16, 20)?;
    }
    for (i, safra) in safras.iter().enumerate() {
        let col = (fixed.len() + i) as u16;
        ws.write_string_with_format(0, col, &safra.nome, &fmt.header)?;
        ws.set_column_width(col, 14)?;
    }
    Ok(())
}

fn write_safra_values(
    ws: &mut Worksheet,
    row: u32,
    first_col: usize,
    raw: &Value,
    safras: &[&Safra],
    fmt: &Formats,
) -> Result<(), AppError> {
    let valores = parse_safra_values(raw);
    for (i, safra) in safras.iter().enumerate() {
        if let Some(v) = valores.get(&safra.id.to_string()) {
            ws.write_number_with_format(row, (first_col + i) as u16, num(*v), &fmt.money)?;
        }
    }
    Ok(())
}

fn write_opt_number(ws: &mut Worksheet, row: u32, col: u16, value: Option<Decimal>, fmt: &Format) -> Result<(), AppError> {
    if let Some(v) = value {
        ws.write_number_with_format(row, col, num(v), fmt)?;
    }
    Ok(())
}

/// Monta o .xlsx em memória.
pub fn build_workbook(
    data: &ReportDataset,
    passivos: &LiabilitiesResponse,
    organizacao: &str,
) -> Result<Vec<u8>, AppError> {
    let fmt = Formats::new();
    let safras = data.safras_ordenadas();
    let mut workbook = Workbook::new();

    // --- Safras ---
    let ws = workbook.add_worksheet().set_name("Safras")?;
    ws.write_string_with_format(0, 0, organizacao, &fmt.header)?;
    for (col, titulo) in ["Safra", "Ano Início", "Ano Fim", "Taxa Câmbio USD"].iter().enumerate() {
        ws.write_string_with_format(1, col as u16, *titulo, &fmt.header)?;
    }
    for (i, safra) in safras.iter().enumerate() {
        let row = 2 + i as u32;
        ws.write_string(row, 0, &safra.nome)?;
        ws.write_number(row, 1, safra.ano_inicio)?;
        ws.write_number(row, 2, safra.ano_fim)?;
        write_opt_number(ws, row, 3, safra.taxa_cambio_usd, &fmt.money)?;
    }

    // --- Propriedades ---
    let ws = workbook.add_worksheet().set_name("Propriedades")?;
    let titulos = ["Nome", "Tipo", "Área Total (ha)", "Área Cultivada (ha)", "Valor Atual", "Cidade", "Estado"];
    write_header(ws, &titulos, &[], &fmt)?;
    for (i, p) in data.propriedades.iter().enumerate() {
        let row = 1 + i as u32;
        ws.write_string(row, 0, &p.nome)?;
        ws.write_string(row, 1, format!("{:?}", p.tipo).to_uppercase())?;
        ws.write_number_with_format(row, 2, num(p.area_total), &fmt.money)?;
        write_opt_number(ws, row, 3, p.area_cultivada, &fmt.money)?;
        write_opt_number(ws, row, 4, p.valor_atual, &fmt.money)?;
        ws.write_string(row, 5, p.cidade.as_deref().unwrap_or_default())?;
        ws.write_string(row, 6, p.estado.as_deref().unwrap_or_default())?;
    }

    // --- Dívidas bancárias ---
    let ws = workbook.add_worksheet().set_name("Dívidas Bancárias")?;
    let titulos = ["Instituição", "Tipo", "Modalidade", "Moeda", "Indexador", "Taxa (%)"];
    write_header(ws, &titulos, &safras, &fmt)?;
    for (i, d) in data.bancarias.iter().enumerate() {
        let row = 1 + i as u32;
        ws.write_string(row, 0, &d.instituicao_bancaria)?;
        ws.write_string(row, 1, d.tipo.label())?;
        ws.write_string(row, 2, d.modalidade.label())?;
        ws.write_string(row, 3, d.moeda.label())?;
        ws.write_string(row, 4, d.indexador.as_deref().unwrap_or_default())?;
        write_opt_number(ws, row, 5, d.taxa_real, &fmt.money)?;
        write_safra_values(ws, row, titulos.len(), &d.fluxo_pagamento_anual, &safras, &fmt)?;
    }

    // --- Fornecedores ---
    let ws = workbook.add_worksheet().set_name("Fornecedores")?;
    let titulos = ["Fornecedor", "Categoria", "Moeda"];
    write_header(ws, &titulos, &safras, &fmt)?;
    for (i, f) in data.fornecedores.iter().enumerate() {
        let row = 1 + i as u32;
        ws.write_string(row, 0, &f.nome)?;
        ws.write_string(row, 1, f.categoria.as_deref().unwrap_or_default())?;
        ws.write_string(row, 2, f.moeda.label())?;
        write_safra_values(ws, row, titulos.len(), &f.valores_por_safra, &safras, &fmt)?;
    }

    // --- Terras ---
    let ws = workbook.add_worksheet().set_name("Terras")?;
    let titulos = ["Fazenda", "Hectares", "Safra", "Valor Total", "Moeda"];
    write_header(ws, &titulos, &safras, &fmt)?;
    for (i, t) in data.terras.iter().enumerate() {
        let row = 1 + i as u32;
        let safra_nome = t
            .safra_id
            .and_then(|id| data.safras.iter().find(|s| s.id == id))
            .map(|s| s.nome.as_str())
            .unwrap_or_default();
        ws.write_string(row, 0, &t.nome_fazenda)?;
        write_opt_number(ws, row, 1, t.hectares, &fmt.money)?;
        ws.write_string(row, 2, safra_nome)?;
        write_opt_number(ws, row, 3, t.valor_total, &fmt.money)?;
        ws.write_string(row, 4, t.moeda.label())?;
        if let Some(fluxo) = &t.fluxo_pagamento_anual {
            write_safra_values(ws, row, titulos.len(), fluxo, &safras, &fmt)?;
        }
    }

    // --- Arrendamentos ---
    let ws = workbook.add_worksheet().set_name("Arrendamentos")?;
    let titulos = ["Fazenda", "Área (ha)", "Pagamento"];
    write_header(ws, &titulos, &safras, &fmt)?;
    for (i, a) in data.arrendamentos.iter().enumerate() {
        let row = 1 + i as u32;
        ws.write_string(row, 0, &a.nome_fazenda)?;
        write_opt_number(ws, row, 1, a.area_arrendada, &fmt.money)?;
        ws.write_string(row, 2, a.tipo_pagamento.as_deref().unwrap_or("Arrendamento"))?;
        write_safra_values(ws, row, titulos.len(), &a.custos_por_safra, &safras, &fmt)?;
    }

    // --- Caixa ---
    let ws = workbook.add_worksheet().set_name("Caixa")?;
    let titulos = ["Nome", "Categoria", "Moeda"];
    write_header(ws, &titulos, &safras, &fmt)?;
    for (i, c) in data.caixa.iter().enumerate() {
        let row = 1 + i as u32;
        ws.write_string(row, 0, &c.nome)?;
        ws.write_string(row, 1, c.categoria.label())?;
        ws.write_string(row, 2, c.moeda.label())?;
        write_safra_values(ws, row, titulos.len(), &c.valores_por_safra, &safras, &fmt)?;
    }

    // --- Passivos totais (em BRL) ---
    let ws = workbook.add_worksheet().set_name("Passivos Totais")?;
    let titulos = ["Safra", "Bancos/Tradings", "Outros", "Total", "Dívida Líquida", "Arrendamentos"];
    write_header(ws, &titulos, &[], &fmt)?;
    for (i, p) in passivos.data.iter().enumerate() {
        let row = 1 + i as u32;
        ws.write_string(row, 0, &p.safra)?;
        for (col, valor) in [p.bancos_tradings, p.outros, p.total, p.liquido, p.arrendamentos].into_iter().enumerate() {
            ws.write_number_with_format(row, 1 + col as u16, num(valor), &fmt.money)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[derive(Clone)]
pub struct ExportService {
    loader: ReportDataLoader,
    default_rate: Decimal,
}

impl ExportService {
    pub fn new(loader: ReportDataLoader, default_rate: Decimal) -> Self {
        Self { loader, default_rate }
    }

    pub async fn excel(&self, org_id: Uuid, organizacao: &str) -> Result<ExportedFile, AppError> {
        let data = self.loader.load_full(org_id).await?;
        let passivos = compute_liabilities(&data, &ReportFilter::default(), self.default_rate);

        let bytes = build_workbook(&data, &passivos, organizacao)?;
        let filename = format!("{}_{}.xlsx", file_stem(organizacao), Utc::now().format("%Y-%m-%d"));

        tracing::info!("📄 Planilha {} gerada ({} bytes)", filename, bytes.len());
        Ok(encode_file(filename, XLSX_CONTENT_TYPE, &bytes))
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

    #[test]
    fn workbook_is_a_zip_container() {
        let s = safra("2024/25", 2024, Some(dec!(5)));
        let id = s.id.to_string();
        let data = ReportDataset {
            bancarias: vec![bancaria("Banco do Brasil", ModalidadeDivida::Custeio, Moeda::Brl, json!({ &id: 1000 }))],
            fornecedores: vec![fornecedor("Agro Insumos", Moeda::Usd, json!({ &id: 10 }))],
            caixa: vec![caixa(CategoriaCaixa::CaixaBancos, Moeda::Brl, json!({ &id: 50 }))],
            safras: vec![s],
            ..Default::default()
        };
        let passivos = compute_liabilities(&data, &ReportFilter::default(), dec!(5.50));

        let bytes = build_workbook(&data, &passivos, "Fazenda Modelo").unwrap();

        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn empty_organization_still_exports() {
        let bytes = build_workbook(&ReportDataset::default(), &LiabilitiesResponse::default(), "Vazia");
        assert!(bytes.is_ok());
    }

    #[test]
    fn file_names_are_ascii_slugs() {
        assert_eq!(file_stem("Fazenda São João"), "fazenda_sao_joao");
        assert_eq!(file_stem("  Agro & Cia.  "), "agro_cia");
        assert_eq!(file_stem("***"), "organizacao");
    }

    #[test]
    fn encoded_file_is_base64() {
        let file = encode_file("a.xlsx".into(), XLSX_CONTENT_TYPE, b"PK");
        assert_eq!(file.data, "UEs=");
    }
}
