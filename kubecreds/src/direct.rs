use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context as _};
use serde::*;
use serde_yaml::Value as YamlValue;

use crate::exec::ExecConfig;

/// Treats an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// region: Context
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ContextSpec {
    pub user: String,
    pub namespace: Option<String>,
    pub cluster: String,
    pub extensions: Option<YamlValue>,
}
#[derive(Serialize, Deserialize, Debug)]
pub struct Context {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: ContextSpec,
}
// endregion

// region: Cluster
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClusterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_authority_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_authority: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_skip_tls_verify: Option<bool>,
    pub server: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<YamlValue>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct Cluster {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cluster: ClusterSpec,
}

// endregion

// region: User
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_certificate_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_key: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_key_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecConfig>,
}

impl UserSpec {
    pub fn has_client_cert(&self) -> bool {
        self.client_certificate.is_some()
            || self.client_certificate_data.is_some()
            || self.client_key.is_some()
            || self.client_key_data.is_some()
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct User {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: UserSpec,
}
// endregion

// region: Common
#[derive(Serialize, Deserialize, Debug)]
pub enum ApiVersion {
    #[serde(rename = "v1")]
    V1,
}
#[derive(Serialize, Deserialize, Debug)]
pub enum Kind {
    Config,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct KubeConfig {
    pub kind: Option<Kind>,
    #[serde(rename = "apiVersion")]
    pub api_version: Option<ApiVersion>,
    #[serde(deserialize_with = "null_as_default")]
    pub contexts: Vec<Context>,
    #[serde(deserialize_with = "null_as_default")]
    pub current_context: String,
    #[serde(deserialize_with = "null_as_default")]
    pub clusters: Vec<Cluster>,
    pub preferences: YamlValue,
    #[serde(deserialize_with = "null_as_default")]
    pub users: Vec<User>,
}

impl KubeConfig {
    pub fn read_from(path: impl AsRef<Path>) -> anyhow::Result<KubeConfig> {
        let contents = fs::read_to_string(path).context("Opening kube config")?;
        KubeConfig::parse(&contents)
    }

    pub fn parse(contents: &str) -> anyhow::Result<KubeConfig> {
        if contents.trim().is_empty() {
            bail!("invalid configuration: no configuration has been provided");
        }
        serde_yaml::from_str(contents).context("Parsing kube config")
    }
}
// endregion
