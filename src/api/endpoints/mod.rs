//! Route handlers.

pub mod analyze;
pub mod health;
pub mod page;
pub mod report;
