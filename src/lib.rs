pub mod accounts;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod henrik;
pub mod http;
pub mod inventory;
pub mod logging;
pub mod riot;
pub mod session;
pub mod store;
pub mod validation;

#[cfg(test)]
mod testing;
