use std::{
    fmt,
    fs::File,
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use tracing::{debug, info, warn};

use crate::CredentialBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Ca,
    Cert,
    Key,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Ca => "ca",
            Field::Cert => "cert",
            Field::Key => "key",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CredentialBundle {
    pub fn get(&self, field: Field) -> Option<&[u8]> {
        match field {
            Field::Ca => self.ca.as_deref(),
            Field::Cert => self.cert.as_deref(),
            Field::Key => self.key.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
struct Output {
    field: Field,
    path: PathBuf,
    skip_if_empty: bool,
}

/// Which bundle field goes to which file, in write order.
#[derive(Debug, Clone, Default)]
pub struct OutputMap {
    outputs: Vec<Output>,
}

impl OutputMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always writes `field` to `path`, even when `path` is empty.
    pub fn with(mut self, field: Field, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(Output {
            field,
            path: path.into(),
            skip_if_empty: false,
        });
        self
    }

    /// Writes `field` to `path` unless `path` is empty.
    pub fn with_optional(mut self, field: Field, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(Output {
            field,
            path: path.into(),
            skip_if_empty: true,
        });
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &Path)> {
        self.outputs.iter().map(|o| (o.field, o.path.as_path()))
    }

    /// Writes every mapped field. Stops at the first failure; files already
    /// written are left in place.
    pub fn write(&self, bundle: &CredentialBundle) -> anyhow::Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.outputs.len());
        for output in &self.outputs {
            if output.skip_if_empty && output.path.as_os_str().is_empty() {
                debug!(field = %output.field, "no output path, skipping");
                continue;
            }

            let data = bundle.get(output.field).unwrap_or_else(|| {
                warn!(field = %output.field, "not present in kubeconfig, writing empty file");
                &[][..]
            });
            write_file(&output.path, data)
                .with_context(|| format!("Writing {} to {}", output.field, output.path.display()))?;
            info!(field = %output.field, path = %output.path.display(), "wrote");
            written.push(output.path.clone());
        }
        Ok(written)
    }
}

/// Creates or truncates `path` and writes `data` verbatim.
pub fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.flush()
}

/// One run: load the kubeconfig, then write the mapped outputs.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub kubeconfig: PathBuf,
    pub outputs: OutputMap,
}

impl Extraction {
    pub fn run(&self) -> anyhow::Result<Vec<PathBuf>> {
        debug!(kubeconfig = %self.kubeconfig.display());
        for (field, path) in self.outputs.iter() {
            debug!(%field, path = %path.display());
        }

        let bundle = CredentialBundle::load(&self.kubeconfig)?;
        self.outputs.write(&bundle)
    }
}
