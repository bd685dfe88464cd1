//! DDL generator - `CREATE TABLE` statements for the generated tables

use crate::config::CodegenConfig;
use crate::error::Result;
use crate::schema::Table;

use super::code_generator::Artifact;
use super::renderer::{Renderer, DDL_TEMPLATE};

pub fn render_ddl(
    renderer: &Renderer,
    tables: &[Table],
    config: &CodegenConfig,
) -> Result<Artifact> {
    let content = renderer.render(DDL_TEMPLATE, minijinja::context! { tables => tables })?;
    Ok(Artifact::new(config.output_ddl_file.clone(), content))
}
