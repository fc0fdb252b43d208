//! Compiler configuration.
//!
//! Options are plain data passed by reference into every resolution
//! call; nothing reads ambient state. Unknown fields in serialized
//! options are ignored so older compilers accept newer configs.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use strata_model::OutputMode;

/// Resolves block identifiers to human-readable labels for debug output.
pub trait Importer: Send + Sync {
    /// Label for a block's source in debug listings.
    fn debug_identifier(&self, identifier: &str) -> String {
        identifier.to_string()
    }
}

/// Importer that echoes identifiers unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultImporter;

impl Importer for DefaultImporter {}

/// Read-only compiler options.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CompilerOptions {
    /// Naming scheme for rewritten selectors.
    pub output_mode: OutputMode,
    /// Hook used to label source files in debug output.
    #[serde(skip, default = "default_importer")]
    pub importer: Arc<dyn Importer>,
}

fn default_importer() -> Arc<dyn Importer> {
    Arc::new(DefaultImporter)
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::default(),
            importer: default_importer(),
        }
    }
}

impl fmt::Debug for CompilerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerOptions")
            .field("output_mode", &self.output_mode)
            .finish_non_exhaustive()
    }
}
