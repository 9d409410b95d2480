/// Structural rewrite passes run between validation and SQL generation.
///
/// Each pass takes a tree by value and returns the rewritten tree, so passes
/// compose into a pipeline. A pass that finds nothing to do returns its
/// input unchanged.
pub mod exists_ordering;
pub mod row_number_paging;

use crate::config::CompilerConfig;
use crate::error::Result;
use crate::ir::SelectExpression;
use crate::sql::DialectCapabilities;

pub use exists_ordering::ExistsOrderingCleanup;
pub use row_number_paging::RowNumberPagingPass;

/// A single rewrite over a statement tree.
///
/// Passes must be pure: the same input always yields the same output.
pub trait RewritePass: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn transform(&self, select: SelectExpression) -> Result<SelectExpression>;
}

/// Ordered list of passes.
#[derive(Default)]
pub struct RewritePipeline {
    passes: Vec<Box<dyn RewritePass>>,
}

impl RewritePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Passes required by a configuration and target dialect.
    ///
    /// Paging emulation runs when requested or when the dialect has no
    /// paging syntax of its own; EXISTS ordering cleanup always runs.
    pub fn for_config(config: &CompilerConfig, capabilities: &DialectCapabilities) -> Self {
        let mut pipeline = Self::new();
        if !capabilities.has_native_paging() {
            pipeline.add_pass(Box::new(RowNumberPagingPass::without_native_paging()));
        } else if config.row_number_paging {
            pipeline.add_pass(Box::new(RowNumberPagingPass::new()));
        }
        pipeline.add_pass(Box::new(ExistsOrderingCleanup));
        pipeline
    }

    pub fn add_pass(&mut self, pass: Box<dyn RewritePass>) {
        self.passes.push(pass);
    }

    pub fn run(&self, select: SelectExpression) -> Result<SelectExpression> {
        let mut current = select;
        for pass in &self.passes {
            tracing::trace!(pass = pass.name(), "running rewrite pass");
            current = pass.transform(current)?;
        }
        Ok(current)
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}
