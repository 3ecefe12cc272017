pub mod bundle;
pub mod clean;
pub mod direct;
pub mod exec;
pub mod expand;
pub mod extract;
pub mod logging;

use std::path::{Path, PathBuf};

use anyhow::Context as _;

pub use bundle::{kubeconfig_path, CredentialBundle};
pub use expand::expand_env;
pub use extract::{write_file, Extraction, Field, OutputMap};
pub use logging::Logging;

pub const DEFAULT_KUBECONFIG: &str = "$HOME/.kube/config";
pub const DEFAULT_CA_OUTPUT: &str = "./ca.crt";

pub fn kube_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(Path::new(&home).join(".kube"))
}
