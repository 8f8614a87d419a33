//! Adapter implementations.
//!
//! This module provides the in-process [`memory::MemoryAdapter`]; the
//! Supabase-backed adapter lives in the `hera-supabase` crate.

pub mod memory;

pub use self::memory::MemoryAdapter;
