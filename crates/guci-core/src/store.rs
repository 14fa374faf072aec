//! The `CardStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `guci-store-sqlite`).
//! Higher layers (`guci-import`, `guci-cli`) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use crate::card::{Card, CardId};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`CardStore::search`].
#[derive(Debug, Clone, Default)]
pub struct CardQuery {
  /// Case-insensitive substring matched against keyword, definition, source,
  /// quote and notes.
  pub text:   Option<String>,
  /// Returned cards must carry all of these tags.
  pub tags:   Vec<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a card store backend.
///
/// Writes become durable on [`CardStore::persist`]; callers that need
/// all-or-nothing behaviour undo their own writes when `persist` fails.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait CardStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// All cards, sorted by keyword then creation time.
  fn list_cards(
    &self,
  ) -> impl Future<Output = Result<Vec<Card>, Self::Error>> + Send + '_;

  /// Retrieve a card by id. Returns `None` if not found.
  fn get_card<'a>(
    &'a self,
    id: &'a CardId,
  ) -> impl Future<Output = Result<Option<Card>, Self::Error>> + Send + 'a;

  /// First card whose trimmed keyword and source equal the arguments.
  fn find_by<'a>(
    &'a self,
    keyword: &'a str,
    source: &'a str,
  ) -> impl Future<Output = Result<Option<Card>, Self::Error>> + Send + 'a;

  /// First card whose trimmed keyword and definition equal the arguments.
  /// This is the exact-duplicate key used when importing.
  fn find_duplicate<'a>(
    &'a self,
    keyword: &'a str,
    definition: &'a str,
  ) -> impl Future<Output = Result<Option<Card>, Self::Error>> + Send + 'a;

  /// Search for cards matching `query`.
  fn search<'a>(
    &'a self,
    query: &'a CardQuery,
  ) -> impl Future<Output = Result<Vec<Card>, Self::Error>> + Send + 'a;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert a new card. Returns an error if the id is already taken.
  fn insert<'a>(
    &'a self,
    card: &'a Card,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Replace the stored card with the same id. Returns `false` if no such
  /// card exists.
  fn update<'a>(
    &'a self,
    card: &'a Card,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Delete a card. Returns `false` if no such card exists.
  fn delete<'a>(
    &'a self,
    id: &'a CardId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Make preceding writes durable. Backends may also arm a backup of the
  /// saved state here.
  fn persist(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
