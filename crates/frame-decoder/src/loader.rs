use crate::OpcodeTableSpec;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

pub fn load_table_file(path: impl AsRef<Path>) -> anyhow::Result<OpcodeTableSpec> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading opcode table: {}", path.display()))?;
    let spec: OpcodeTableSpec = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing opcode table: {}", path.display()))?;
    Ok(spec)
}

/// Load every `*.yml`/`*.yaml` table in `dir`, in file-name order.
pub fn load_tables_dir(dir: impl AsRef<Path>) -> anyhow::Result<Vec<OpcodeTableSpec>> {
    let mut entries: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir.as_ref())
        .with_context(|| format!("listing opcode tables: {}", dir.as_ref().display()))?
    {
        let path = entry?.path();
        if let Some(ext) = path.extension() {
            if ext == "yml" || ext == "yaml" {
                entries.push(path);
            }
        }
    }
    entries.sort();
    entries.iter().map(|p| load_table_file(p)).collect()
}
