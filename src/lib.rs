//! Composer - multi-step entity wizards with resumable drafts
//!
//! A wizard collects one entity across an ordered list of steps. Each step
//! submits a partial value that is merged into the aggregate; in-progress
//! values are kept as drafts, and the final step submits the aggregate to the
//! remote entity API.

pub mod api;
pub mod config;
pub mod drafts;
pub mod entities;
pub mod error;
pub mod logging;
pub mod rest;
pub mod wizard;
