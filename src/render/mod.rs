mod core;
mod locate;
mod stack;
mod value;

use std::io;
use std::sync::Arc;

use crate::compile::CompiledTemplate;
use crate::render::core::Executor;
use crate::render::stack::Stack;
use crate::requirements::Requirements;
use crate::{Engine, Result, Value};

/// Renders the main template, substituting the layout for `$Layout` if one is
/// given, and injects the collected requirements into the output.
pub(crate) fn to_string(
    engine: &Engine,
    templates: &[Arc<CompiledTemplate>],
    context: Value,
    requirements: &mut dyn Requirements,
) -> Result<String> {
    let name = templates.first().map(|t| t.name()).unwrap_or_default();
    tracing::debug!(template = name, layouts = templates.len().saturating_sub(1), "render start");

    let out = Executor {
        engine,
        templates,
        stack: Stack::new(context),
        requirements,
    }
    .render()?;

    tracing::debug!(template = name, bytes = out.len(), "render finish");
    Ok(out)
}

/// Renders to the given writer. Nothing is written if rendering fails.
pub(crate) fn to_writer<W>(
    engine: &Engine,
    templates: &[Arc<CompiledTemplate>],
    context: Value,
    requirements: &mut dyn Requirements,
    mut writer: W,
) -> Result<()>
where
    W: io::Write,
{
    let out = to_string(engine, templates, context, requirements)?;
    writer.write_all(out.as_bytes())?;
    Ok(())
}
