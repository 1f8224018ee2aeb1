pub mod auth;
pub mod debts;
pub mod exports;
pub mod liquidity;
pub mod market;
pub mod organization;
pub mod prices;
pub mod production;
pub mod property;
pub mod reports;
pub mod safra;
