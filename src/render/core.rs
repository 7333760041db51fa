use std::sync::Arc;

use crate::compile::CompiledTemplate;
use crate::error::Location;
use crate::render::locate::locate;
use crate::render::stack::Stack;
use crate::render::value::compare;
use crate::requirements::Requirements;
use crate::types::chunk::{Chunk, ChunkKind, RequireKind};
use crate::{Engine, Error, ErrorKind, Result, Value};

/// Walks chunk trees against a context stack.
pub struct Executor<'render> {
    pub engine: &'render Engine,

    /// The main template and, optionally, the layout it is substituted into.
    pub templates: &'render [Arc<CompiledTemplate>],

    pub stack: Stack,

    pub requirements: &'render mut dyn Requirements,
}

impl<'render> Executor<'render> {
    /// Renders the main template and injects the collected requirements.
    pub fn render(mut self) -> Result<String> {
        let templates = self.templates;
        let main = match templates.first() {
            Some(main) => main,
            None => return Ok(String::new()),
        };

        let mut out = String::new();
        self.render_chunk(main.root(), &mut out)?;

        let out = self.requirements.inject_into_head(out);
        Ok(self.requirements.inject_into_body(out))
    }

    fn render_chunk(&mut self, chunk: &Chunk, out: &mut String) -> Result<()> {
        match &chunk.kind {
            ChunkKind::Literal(text) => out.push_str(text),

            ChunkKind::Block(chunks) => {
                for chunk in chunks {
                    self.render_chunk(chunk, out)?;
                }
            }

            ChunkKind::BaseTag => {
                let url = self.engine.config.base_url();
                out.push_str(&format!(
                    r#"<base href="{url}"><!--[if lte IE 6]></base><![endif]-->"#
                ));
            }

            ChunkKind::Include(template) => {
                self.render_chunk(template.root(), out)?;
            }

            ChunkKind::With { context, body } => {
                let context = self.eval(context)?;
                self.stack.push(context);
                self.render_chunk(body, out)?;
                self.stack.pop()?;
            }

            ChunkKind::Loop { context, body } => {
                let items = match self.eval(context)? {
                    Value::None => return Ok(()),
                    Value::List(list) => list,
                    Value::Object(object) => match object.items() {
                        Some(items) => items,
                        None => return Err(err_loop_context("object", &chunk.location)),
                    },
                    value => return Err(err_loop_context(value.human(), &chunk.location)),
                };
                for item in items {
                    self.stack.push(item);
                    self.render_chunk(body, out)?;
                    self.stack.pop()?;
                }
            }

            ChunkKind::If {
                condition,
                then_part,
                else_part,
            } => {
                let value = self.eval(condition)?;
                let part = match self.as_bool(&value, &chunk.location)? {
                    true => Some(then_part),
                    false => else_part.as_ref(),
                };
                if let Some(part) = part {
                    self.render_chunk(part, out)?;
                }
            }

            ChunkKind::Layout => self.render_layout(out)?,

            ChunkKind::Require { kind, path } => match kind {
                RequireKind::Css => self.requirements.add_css(path),
                RequireKind::ThemedCss => {
                    let css_url = self.engine.config.css_url();
                    self.requirements.add_css(&format!("{css_url}{path}.css"));
                }
                RequireKind::Javascript => self.requirements.add_javascript(path),
            },

            _ => {
                let value = self.eval(chunk)?;
                out.push_str(&value.to_string());
            }
        }
        Ok(())
    }

    /// Renders the layout template, if there is one.
    fn render_layout(&mut self, out: &mut String) -> Result<()> {
        let templates = self.templates;
        if let Some(layout) = templates.get(1) {
            self.render_chunk(layout.root(), out)?;
        }
        Ok(())
    }

    /// Evaluates an expression chunk.
    fn eval(&mut self, chunk: &Chunk) -> Result<Value> {
        match &chunk.kind {
            ChunkKind::VarFunc {
                name,
                args,
                chained,
            } => self.eval_var_func(name, args.as_deref(), chained.as_deref()),

            ChunkKind::Number(value) => Ok(value.clone()),

            ChunkKind::String(s) => Ok(Value::String(s.clone())),

            ChunkKind::Not(operand) => {
                let value = self.eval(operand)?;
                Ok(Value::Bool(!self.as_bool(&value, &operand.location)?))
            }

            ChunkKind::Or(operands) => self.eval_bool_op(operands, true),

            ChunkKind::And(operands) => self.eval_bool_op(operands, false),

            ChunkKind::Compare { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                Ok(Value::Bool(compare(*op, &lhs, &rhs)))
            }

            ChunkKind::Layout => {
                let mut out = String::new();
                self.render_layout(&mut out)?;
                Ok(Value::String(out))
            }

            _ => Err(Error::render(
                ErrorKind::EvalType,
                "cannot evaluate a non-expression chunk",
                &chunk.location,
            )),
        }
    }

    /// Evaluates operands left to right until one of them is `stop_on`.
    fn eval_bool_op(&mut self, operands: &[Chunk], stop_on: bool) -> Result<Value> {
        for operand in operands {
            let value = self.eval(operand)?;
            if self.as_bool(&value, &operand.location)? == stop_on {
                return Ok(Value::Bool(stop_on));
            }
        }
        Ok(Value::Bool(!stop_on))
    }

    fn eval_var_func(
        &mut self,
        name: &str,
        args: Option<&[Chunk]>,
        chained: Option<&Chunk>,
    ) -> Result<Value> {
        let value = match name {
            "Top" => self.stack.bottom().clone(),
            "Up" => self.stack.up().clone(),
            _ => {
                let args = args
                    .unwrap_or_default()
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>>>()?;
                let value = locate(self.stack.top(), name, &args);
                tracing::trace!(name, depth = self.stack.len(), value = value.human(), "resolved");
                value
            }
        };

        match chained {
            Some(chained) => {
                self.stack.push(value);
                let result = self.eval(chained);
                self.stack.pop()?;
                result
            }
            None => Ok(value),
        }
    }

    fn as_bool(&self, value: &Value, location: &Location) -> Result<bool> {
        value.as_bool().ok_or_else(|| {
            Error::render(
                ErrorKind::Coercion,
                format!("cannot treat {} as bool", value.human()),
                location,
            )
        })
    }
}

fn err_loop_context(human: &str, location: &Location) -> Error {
    Error::render(
        ErrorKind::EvalType,
        format!("loop context must be a list, found {human}"),
        location,
    )
}
