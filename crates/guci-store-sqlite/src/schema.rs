//! SQL schema for the guci SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS cards (
    card_id     TEXT PRIMARY KEY,
    keyword     TEXT NOT NULL,
    definition  TEXT NOT NULL,
    source      TEXT NOT NULL DEFAULT '',
    quote       TEXT NOT NULL DEFAULT '',
    notes       TEXT NOT NULL DEFAULT '',
    tags        TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    created_at  TEXT NOT NULL,               -- RFC 3339 UTC, fixed width
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS cards_keyword_idx ON cards(keyword);
CREATE INDEX IF NOT EXISTS cards_dedup_idx   ON cards(keyword, definition);

PRAGMA user_version = 1;
";

/// Column list shared by every `SELECT` that decodes into a `RawCard`.
pub const CARD_COLUMNS: &str = "card_id, keyword, definition, source, quote, \
                                notes, tags, created_at, updated_at";
