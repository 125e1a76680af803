//! Flinch Core
//!
//! This crate contains the shared building blocks of the Flinch framework:
//! hashed collections, stable name hashing and logging setup.

pub mod alloc;
pub mod hash;
pub mod logging;
