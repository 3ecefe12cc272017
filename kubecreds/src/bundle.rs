use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context as _};
use base64::Engine as _;
use tracing::{debug, warn};

use crate::{
    clean::{self, ActiveEntries},
    exec::ClusterInfo,
    kube_dir,
};

/// Credential material resolved from the current context of a kubeconfig.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialBundle {
    pub ca: Option<Vec<u8>>,
    pub cert: Option<Vec<u8>>,
    pub key: Option<Vec<u8>>,
}

/// Loads inline `*-data` (base64) or the referenced file, never both.
fn load_material(
    what: &str,
    data: Option<&str>,
    path: Option<&Path>,
    base_dir: &Path,
) -> anyhow::Result<Option<Vec<u8>>> {
    match (data, path) {
        (Some(_), Some(_)) => bail!("{what}-data and {what} are both specified"),
        (Some(data), None) => {
            let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(compact)
                .with_context(|| format!("Decoding {what}-data"))?;
            Ok(Some(bytes))
        }
        (None, Some(path)) => {
            let path = base_dir.join(path);
            debug!(path = %path.display(), "reading {what}");
            let bytes = fs::read(&path)
                .with_context(|| format!("Reading {what} {}", path.display()))?;
            Ok(Some(bytes))
        }
        (None, None) => Ok(None),
    }
}

impl CredentialBundle {
    /// Reads the kubeconfig at `path` and resolves its current context.
    ///
    /// An empty path falls back to `~/.kube/config`. Relative file references
    /// inside the kubeconfig resolve against the kubeconfig's directory.
    pub fn load(path: &Path) -> anyhow::Result<CredentialBundle> {
        let path = if path.as_os_str().is_empty() {
            let fallback = kube_dir()?.join("config");
            warn!(
                path = %fallback.display(),
                "no kubeconfig given, using default"
            );
            fallback
        } else {
            path.to_path_buf()
        };

        let kc = clean::read_config(&path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        CredentialBundle::resolve(&kc.active()?, &base_dir)
    }

    pub fn resolve(active: &ActiveEntries<'_>, base_dir: &Path) -> anyhow::Result<CredentialBundle> {
        debug!(
            context = active.context,
            cluster = active.cluster_name,
            user = active.user_name,
            "resolving credentials"
        );
        let cluster = active.cluster;
        let user = active.user;

        let ca = load_material(
            "certificate-authority",
            cluster.certificate_authority_data.as_deref(),
            cluster.certificate_authority.as_deref(),
            base_dir,
        )
        .with_context(|| format!("Loading cluster {:?}", active.cluster_name))?;
        if ca.is_some() && cluster.insecure_skip_tls_verify == Some(true) {
            bail!(
                "specifying a root certificates file with the insecure flag is not allowed for cluster {:?}",
                active.cluster_name
            );
        }

        let user_context = || format!("Loading user {:?}", active.user_name);
        let mut cert = load_material(
            "client-certificate",
            user.client_certificate_data.as_deref(),
            user.client_certificate.as_deref(),
            base_dir,
        )
        .with_context(user_context)?;
        let mut key = load_material(
            "client-key",
            user.client_key_data.as_deref(),
            user.client_key.as_deref(),
            base_dir,
        )
        .with_context(user_context)?;
        match (&cert, &key) {
            (Some(_), None) => bail!(
                "client-key-data or client-key must be specified for {:?} to use the clientCert authentication method",
                active.user_name
            ),
            (None, Some(_)) => bail!(
                "client-certificate-data or client-certificate must be specified for {:?} to use the clientCert authentication method",
                active.user_name
            ),
            _ => {}
        }

        if let (Some(exec), false) = (&user.exec, user.has_client_cert()) {
            let info = ClusterInfo {
                server: &cluster.server,
                certificate_authority_data: ca.as_deref(),
            };
            let status = exec
                .run(base_dir, Some(info))
                .with_context(user_context)?;
            if let Some((plugin_cert, plugin_key)) = status.cert_pair() {
                cert = Some(plugin_cert);
                key = Some(plugin_key);
            }
        }

        Ok(CredentialBundle { ca, cert, key })
    }
}

/// Expands a kubeconfig path given on the command line.
pub fn kubeconfig_path(raw: &str) -> PathBuf {
    PathBuf::from(crate::expand_env(raw))
}
