//! Supabase adapter for HERA playbook runs.
//!
//! Forwards staged buffers, audit events, and entity lookups to
//! Supabase/PostgREST RPC functions over HTTP.
//!
//! This crate provides:
//! - Env-driven connection configuration
//! - A PostgREST RPC client with retrying calls
//! - An [`hera_playbooks::Adapter`] implementation over the RPC surface

pub mod adapter;
pub mod client;
pub mod config;

pub use adapter::SupabaseAdapter;
pub use client::RpcClient;
pub use config::SupabaseConfig;
