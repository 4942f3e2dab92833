//! Route handlers for the REST API.

pub mod drafts;
pub mod health;
pub mod sessions;
pub mod wizards;
