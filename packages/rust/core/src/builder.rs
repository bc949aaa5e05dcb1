//! Step segmentation: one pass over the cells, opening a step at each new heading.

use tracing::{debug, trace};

use nbsteps_markdown::{SourceKind, detect, is_same_title};
use nbsteps_notebook::{Cell, CodeCell, MarkdownCell};
use nbsteps_shared::{Block, Result, Step};

use crate::context::ExportContext;
use crate::materializer::{self, Directive};

/// Builds the ordered step list from notebook cells.
///
/// Blocks always go to the last step; a placeholder step is opened on demand
/// when content arrives before any heading.
#[derive(Debug)]
pub struct StepBuilder {
    language: String,
    placeholder_title: String,
    steps: Vec<Step>,
}

impl StepBuilder {
    pub fn new(language: impl Into<String>, placeholder_title: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            placeholder_title: placeholder_title.into(),
            steps: Vec::new(),
        }
    }

    /// Route one cell into the step list.
    pub fn push_cell(&mut self, cell: &Cell, ctx: &mut ExportContext) -> Result<()> {
        match cell {
            Cell::Markdown(md) => {
                self.push_markdown(md, ctx);
                Ok(())
            }
            Cell::Code(code) => self.push_code(code, ctx),
            Cell::Raw(_) => {
                trace!("skipping raw cell");
                Ok(())
            }
        }
    }

    /// Drop an unused leading placeholder and renumber from 1.
    pub fn finish(mut self) -> Vec<Step> {
        if self.steps.first().is_some_and(|s| s.blocks.is_empty()) {
            let dropped = self.steps.remove(0);
            debug!(title = %dropped.title, "dropped empty leading step");
        }
        for (i, step) in self.steps.iter_mut().enumerate() {
            step.index = i + 1;
        }
        self.steps
    }

    fn push_markdown(&mut self, cell: &MarkdownCell, ctx: &mut ExportContext) {
        let source = cell.source.text();
        ctx.all_text.push(source.clone());

        let body = match detect(&source, SourceKind::MarkdownSource) {
            Some(heading) => {
                if !is_same_title(&heading.title, ctx.last_title()) {
                    self.open_step(heading.title, ctx);
                }
                heading.remainder
            }
            None => source,
        };

        let step = self.current(ctx);
        if !body.trim().is_empty() {
            step.blocks.push(Block::Markdown { content: body });
        }
    }

    fn push_code(&mut self, cell: &CodeCell, ctx: &mut ExportContext) -> Result<()> {
        let source = cell.source.text();
        let code = source.trim_end();
        let language = self.language.clone();
        let step = self.current(ctx);
        if !code.is_empty() {
            step.blocks.push(Block::Code {
                language,
                content: code.to_string(),
            });
        }

        for output in &cell.outputs {
            for directive in materializer::materialize(output, cell.execution_count, ctx)? {
                match directive {
                    Directive::OpenStep(title) => self.open_step(title, ctx),
                    Directive::Emit(block) => self.current(ctx).blocks.push(block),
                }
            }
        }
        Ok(())
    }

    fn open_step(&mut self, title: String, ctx: &mut ExportContext) {
        ctx.accept_title(&title);
        let index = self.steps.len() + 1;
        debug!(index, title = %title, "opened step");
        self.steps.push(Step::new(index, title));
    }

    /// The step receiving blocks, opening the placeholder if none exists yet.
    fn current(&mut self, ctx: &mut ExportContext) -> &mut Step {
        if self.steps.is_empty() {
            let title = self.placeholder_title.clone();
            self.open_step(title, ctx);
        }
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }
}

/// Run a whole cell list through a fresh [`StepBuilder`].
pub fn build_steps(
    cells: &[Cell],
    language: &str,
    placeholder_title: &str,
    ctx: &mut ExportContext,
) -> Result<Vec<Step>> {
    let mut builder = StepBuilder::new(language, placeholder_title);
    for cell in cells {
        builder.push_cell(cell, ctx)?;
    }
    Ok(builder.finish())
}
