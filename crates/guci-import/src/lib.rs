//! Storing parsed cards for guci.
//!
//! Connects the [`guci_text`] parser to any [`guci_core::store::CardStore`]:
//! the card sink (identity, duplicate merging, rollback), the free-text
//! import entry point, single-card edits, and legacy data migration.
//!
//! # Importing
//!
//! ```rust,ignore
//! let options = ImportOptions::default();
//! let report =
//!   guci_import::import_from_text(&store, text, &options, None).await?;
//! println!("{}", report.stats);
//! ```

pub mod error;
pub mod import;
pub mod manage;
pub mod migrate;
pub mod sink;

pub use error::{Error, Result};
pub use import::{ImportOptions, ImportReport, ImportStats, import_from_text};
pub use manage::{delete_card, edit_card};
pub use migrate::{MigrationStats, migrate_legacy};
pub use sink::{CardSink, SubmitOutcome};

#[cfg(test)]
mod tests;
