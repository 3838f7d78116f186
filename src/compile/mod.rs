pub mod command;
pub mod compiler;

pub use command::{ts_compile, CompileCommand};
pub use compiler::{Compiler, UnknownCompiler};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("failed to start {compiler}: {source}")]
    Spawn {
        compiler: Compiler,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to forward compiler output: {0}")]
    Output(#[source] std::io::Error),
    #[error("{compiler} compilation failure")]
    Failed {
        compiler: Compiler,
        code: Option<i32>,
    },
}
