//! Request handlers, one module per resource

pub mod approvals;
pub mod audit;
pub mod claims;
pub mod deductions;
pub mod health;
pub mod matching;
pub mod reports;
