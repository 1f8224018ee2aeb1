pub mod user_repo;
pub use user_repo::UserRepository;
pub mod organization_repo;
pub use organization_repo::OrganizationRepository;
pub mod safra_repo;
pub use safra_repo::SafraRepository;
pub mod property_repo;
pub use property_repo::PropertyRepository;
pub mod debt_repo;
pub use debt_repo::DebtRepository;
pub mod liquidity_repo;
pub use liquidity_repo::LiquidityRepository;
pub mod price_repo;
pub use price_repo::PriceRepository;
pub mod production_repo;
pub use production_repo::ProductionRepository;
