pub mod config;
pub mod db;
pub mod redemption_codes;
