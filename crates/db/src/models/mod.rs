//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` struct matching the database row
//! and, where the table is written through more than one path, the DTOs
//! used for inserts and patches. Conversion into the domain types of
//! `lightdesk_core` lives next to the row struct.

pub mod draft;
pub mod submission;
pub mod upload_record;
pub mod user_last;
