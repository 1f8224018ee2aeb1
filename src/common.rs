pub mod db_utils;
pub mod error;
pub mod safra_values;
pub mod validation;
