//! Per-request generation annotations.

use std::path::PathBuf;

/// Why the renderer is being asked to (re)produce a cached page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GenerateMode {
    #[default]
    None,
    ForceGenerating,
    AutoGenerating,
    BatchGenerating,
}

impl GenerateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerateMode::None => "none",
            GenerateMode::ForceGenerating => "force",
            GenerateMode::AutoGenerating => "auto",
            GenerateMode::BatchGenerating => "batch",
        }
    }
}

/// Request extension: the page must be regenerated and written to `cache_file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageGeneration {
    pub mode: GenerateMode,
    pub cache_file: PathBuf,
}

/// Request extension marking a batch regeneration request.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchRequest;

/// Response extension: the rendered body was persisted to this artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWritten(pub PathBuf);
