//! Fixtures for the rdao end-to-end tests
//!
//! `build.rs` runs rdao-codegen over `domain/`, `vo/` and `svc.rs`
//! (configured in `[package.metadata.rdao-codegen]`); the generated DAOs
//! and client are compiled in below.

pub mod domain;
pub mod svc;
pub mod vo;

pub mod dao {
    include!(concat!(env!("OUT_DIR"), "/dao/mod.rs"));
}

pub mod client {
    include!(concat!(env!("OUT_DIR"), "/client/client.rs"));
}

/// `CREATE TABLE` script generated for the domain tables
pub const SCHEMA_SQL: &str = include_str!(concat!(env!("OUT_DIR"), "/schema.sql"));
