//! Flight Time Limitation compliance engine for airline crew rosters.
//!
//! This crate decodes roster exports into normalized duty records and
//! checks them against EASA flight duty period tables, operator rules for
//! augmented and cabin crew, standby and reserve caps, and minimum rest
//! between duties.

#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod ingest;
pub mod logging;
pub mod models;
