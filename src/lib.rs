//! inbox-digest — unread mail fetching with AI enrichment.
//!
//! The core is two subsystems: a recursive multipart body extractor
//! (`mail::codec`) and a batched enrichment correlator (`enrich`).
//! Everything around them — OAuth redirects, sessions, routing, UI —
//! is a caller concern behind the transport traits.

pub mod auth;
pub mod config;
pub mod enrich;
pub mod error;
pub mod mail;
