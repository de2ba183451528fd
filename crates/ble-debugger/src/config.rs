use anyhow::Context;
use frame_decoder::{load_tables_dir, OpcodeTableSpec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerConfig {
    /// Master switch for event emission. Requests and decoding work either way.
    pub enabled: bool,
    /// Mirror every event to the console through `tracing`.
    pub console: bool,
    /// Number of events the in-memory log keeps.
    pub history_capacity: usize,
    /// Directory of extra opcode tables (`*.yml` / `*.yaml`).
    pub decoder_dir: Option<PathBuf>,
    /// Extra opcode tables, registered after the built-in ones.
    pub decoders: Vec<OpcodeTableSpec>,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            console: true,
            history_capacity: 500,
            decoder_dir: None,
            decoders: Vec::new(),
        }
    }
}

impl DebuggerConfig {
    /// Inline tables followed by the ones found in `decoder_dir`.
    pub fn table_specs(&self) -> anyhow::Result<Vec<OpcodeTableSpec>> {
        let mut specs = self.decoders.clone();
        if let Some(dir) = &self.decoder_dir {
            specs.extend(load_tables_dir(dir)?);
        }
        Ok(specs)
    }
}

pub fn load_config_file(path: impl AsRef<Path>) -> anyhow::Result<DebuggerConfig> {
    let path = path.as_ref();
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading config: {}", path.display()))?;
    let cfg: DebuggerConfig =
        serde_yaml::from_str(&raw).with_context(|| format!("parsing config: {}", path.display()))?;
    Ok(cfg)
}
