pub mod health;
pub mod regions;
pub mod search;
pub mod units;
