//! Code generation module

mod client_generator;
mod code_generator;
mod dao_generator;
mod ddl_generator;
mod naming;
mod renderer;

pub use client_generator::{render_client, render_interface};
pub use code_generator::*;
pub use dao_generator::{render_dao, render_daos};
pub use ddl_generator::render_ddl;
pub use naming::*;
pub use renderer::{format_rust, Renderer, GENERATED_HEADER};
