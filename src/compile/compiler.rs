use std::{fmt, path::Path, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

/// TypeScript compiler binaries shipped in `node_modules/typescript/bin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compiler {
    Tsc,
    Ngc,
}

impl Compiler {
    pub const ALL: [Compiler; 2] = [Compiler::Tsc, Compiler::Ngc];

    pub fn binary_name(&self) -> &'static str {
        match self {
            Compiler::Tsc => "tsc",
            Compiler::Ngc => "ngc",
        }
    }

    /// `<package_root>/node_modules/typescript/bin/<binary>`
    pub fn script_path(&self, package_root: &Path) -> PathBuf {
        package_root
            .join("node_modules")
            .join("typescript")
            .join("bin")
            .join(self.binary_name())
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown compiler '{0}' (expected tsc or ngc)")]
pub struct UnknownCompiler(pub String);

impl FromStr for Compiler {
    type Err = UnknownCompiler;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "tsc" => Ok(Compiler::Tsc),
            "ngc" => Ok(Compiler::Ngc),
            other => Err(UnknownCompiler(other.to_string())),
        }
    }
}
