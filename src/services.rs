pub mod auth;
pub mod debt_details_service;
pub mod email_service;
pub mod export_service;
pub mod liabilities_service;
pub mod market_data;
pub mod organization_service;
pub mod pdf_report_service;
pub mod projection_service;
pub mod rating_service;
pub mod report_data;
