pub mod auth;
pub mod debts;
pub mod exports;
pub mod liquidity;
pub mod market;
pub mod organizations;
pub mod prices;
pub mod production;
pub mod properties;
pub mod reports;
pub mod safras;
