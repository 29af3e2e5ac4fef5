//! SQLite backend for the donation engine.
//!
//! The schema lives in `migrations/` and is applied with [`SqliteDatabase::run_migrations`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
