//! Rent transaction lookup server
//!
//! Searches the four rent tables and enriches each page with apartment
//! appraisal prices, officetel standard prices and dong/ho unit labels, each
//! fetched with one batched query per administrative scope.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod startup;
pub mod state;

pub use error::{Error, Result};
