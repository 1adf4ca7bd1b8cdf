//! Spreadsheet backend — append-only dataset rows into Google Sheets.

pub mod auth;
pub mod client;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SheetsError;

pub use client::{SheetsClient, SheetsEndpoints};

/// Destination for completed dataset rows.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Append one row. Either the whole row lands or none of it.
    async fn append_row(&self, row: &[String]) -> Result<(), SheetsError>;
}

/// Spreadsheet backend status, fixed at startup.
///
/// A failed connection stays `Unavailable` for the process lifetime; each
/// subsequent finish action reports the failure to the user instead of
/// attempting to reconnect.
#[derive(Clone)]
pub enum SheetsBackend {
    Available(Arc<dyn RowSink>),
    Unavailable,
}

impl SheetsBackend {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}
