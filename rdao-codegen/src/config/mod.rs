//! Configuration for rdao-codegen

pub mod defaults;
mod settings;

pub use settings::{CodegenConfig, CollisionPolicy};
