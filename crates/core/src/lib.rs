//! Core business logic for Mediref.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and orchestration live here.
//!
//! # Modules
//!
//! - `attachment` - Owner-scoped attachment lifecycle (upload, list, download
//!   tickets, soft delete, classification edits)
//! - `storage` - Object storage gateway over Apache OpenDAL

pub mod attachment;
pub mod storage;
