// src/services/pdf_report_service.rs

use chrono::Utc;
use genpdf::{elements, style, Element};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    common::error::AppError,
    models::{exports::ExportedFile, reports::RatingResult},
    services::export_service::{encode_file, file_stem},
};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::ExportError(e.to_string())
}

fn fmt_decimal(value: Decimal) -> String {
    format!("{:.2}", value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[derive(Clone)]
pub struct PdfReportService {
    fonts_dir: String,
    font_family: String,
}

impl PdfReportService {
    pub fn new(fonts_dir: String, font_family: String) -> Self {
        Self { fonts_dir, font_family }
    }

    /// Relatório de rating de uma safra, em PDF.
    pub fn rating_pdf(&self, organizacao: &str, rating: &RatingResult) -> Result<ExportedFile, AppError> {
        // 1. Fonte da pasta configurada
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, &self.font_family, None).map_err(|_| {
            AppError::FontNotFound(format!("Fonte {} não encontrada em {}", self.font_family, self.fonts_dir))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Rating {} - {}", rating.safra, organizacao));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(elements::Paragraph::new(organizacao).styled(style::Style::new().bold().with_font_size(18)));
        doc.push(elements::Paragraph::new(format!("Data: {}", Utc::now().format("%d/%m/%Y"))));
        doc.push(elements::Break::new(1.5));

        doc.push(
            elements::Paragraph::new(format!("RATING DE CRÉDITO - SAFRA {}", rating.safra))
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        doc.push(
            elements::Paragraph::new(format!(
                "Classificação: {} ({} pontos)",
                rating.classificacao,
                fmt_decimal(rating.pontuacao_total)
            ))
            .styled(style::Style::new().bold().with_font_size(12)),
        );
        doc.push(elements::Paragraph::new(rating.descricao.as_str()).styled(style::Style::new().italic()));
        doc.push(elements::Break::new(2));

        // --- INDICADORES ---
        // Pesos das colunas: Indicador (4), Valor (2), Nível (2), Pontos (1), Peso (1)
        let mut table = elements::TableLayout::new(vec![4, 2, 2, 1, 1]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Indicador").styled(bold))
            .element(elements::Paragraph::new("Valor").styled(bold))
            .element(elements::Paragraph::new("Nível").styled(bold))
            .element(elements::Paragraph::new("Pontos").styled(bold))
            .element(elements::Paragraph::new("Peso").styled(bold))
            .push()
            .map_err(pdf_error)?;

        for metric in &rating.metrics {
            table
                .row()
                .element(elements::Paragraph::new(metric.nome.as_str()))
                .element(elements::Paragraph::new(fmt_decimal(metric.valor)))
                .element(elements::Paragraph::new(metric.nivel.as_str()))
                .element(elements::Paragraph::new(fmt_decimal(metric.pontuacao)))
                .element(elements::Paragraph::new(format!("{}%", metric.peso)))
                .push()
                .map_err(pdf_error)?;
        }

        doc.push(table);
        doc.push(elements::Break::new(2));

        let mut rodape = elements::Paragraph::new("Pontuação = média ponderada dos indicadores (0 a 100)");
        rodape.set_alignment(genpdf::Alignment::Right);
        doc.push(rodape.styled(style::Style::new().italic().with_font_size(8)));

        // 2. Renderiza em memória
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;

        let filename = format!(
            "rating_{}_{}.pdf",
            file_stem(organizacao),
            file_stem(&rating.safra)
        );
        tracing::info!("📄 PDF {} gerado ({} bytes)", filename, buffer.len());

        Ok(encode_file(filename, PDF_CONTENT_TYPE, &buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn rating() -> RatingResult {
        RatingResult {
            safra_id: Uuid::new_v4(),
            safra: "2024/25".into(),
            metrics: vec![],
            pontuacao_total: Decimal::from(80),
            classificacao: "A".into(),
            descricao: "Boa capacidade de pagamento e gestão financeira sólida".into(),
        }
    }

    #[test]
    fn missing_fonts_are_reported() {
        let service = PdfReportService::new("./nao-existe".into(), "Roboto".into());

        let result = service.rating_pdf("Fazenda Modelo", &rating());

        assert!(matches!(result, Err(AppError::FontNotFound(_))));
    }

    #[test]
    fn decimals_are_printed_with_two_places() {
        assert_eq!(fmt_decimal(Decimal::new(12345, 3)), "12.35");
        assert_eq!(fmt_decimal(Decimal::from(7)), "7.00");
        assert_eq!(fmt_decimal(Decimal::new(12325, 3)), "12.33");
        assert_eq!(fmt_decimal(Decimal::new(-12345, 3)), "-12.35");
    }
}
