pub mod compiler;
pub mod config;
pub mod error;
pub mod execution;
pub mod ir;
pub mod rewrite;
pub mod sql;

pub use compiler::{CompiledQuery, QueryCompiler};
pub use config::CompilerConfig;
pub use error::{CompileError, ExecutionError, IrError};
