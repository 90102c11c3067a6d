//! Request and response bodies
//!
//! Every body is camelCase JSON. Requests validate with `validator` before
//! they reach the engine; responses are flat views of the domain records.

pub mod approvals;
pub mod audit;
pub mod claims;
pub mod common;
pub mod deductions;
pub mod matching;
pub mod reports;
