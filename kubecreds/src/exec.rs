//! Exec credential plugins.
//!
//! A user entry may name an external command that prints an `ExecCredential`
//! object on stdout. The plugin runs once, synchronously, with stdin closed.

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::{bail, Context as _};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

pub const API_V1BETA1: &str = "client.authentication.k8s.io/v1beta1";
pub const API_V1: &str = "client.authentication.k8s.io/v1";

const EXEC_INFO_ENV: &str = "KUBERNETES_EXEC_INFO";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecConfig {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<ExecEnvVar>>,
    pub api_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_hint: Option<String>,
    pub provide_cluster_info: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive_mode: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExecEnvVar {
    pub name: String,
    pub value: String,
}

/// Cluster details handed to plugins that set `provideClusterInfo`.
#[derive(Debug, Clone, Copy)]
pub struct ClusterInfo<'a> {
    pub server: &'a str,
    pub certificate_authority_data: Option<&'a [u8]>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ExecCredential {
    api_version: Option<String>,
    kind: Option<String>,
    status: Option<ExecCredentialStatus>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecCredentialStatus {
    pub token: Option<String>,
    pub client_certificate_data: Option<String>,
    pub client_key_data: Option<String>,
}

impl ExecCredentialStatus {
    pub fn cert_pair(&self) -> Option<(Vec<u8>, Vec<u8>)> {
        match (&self.client_certificate_data, &self.client_key_data) {
            (Some(cert), Some(key)) => Some((cert.as_bytes().to_vec(), key.as_bytes().to_vec())),
            _ => None,
        }
    }
}

impl ExecConfig {
    /// Resolves the command against `base_dir` when it is a relative path
    /// with a directory component. Bare names are looked up on `PATH`.
    fn resolved_command(&self, base_dir: &Path) -> PathBuf {
        let command = Path::new(&self.command);
        if command.is_relative() && command.components().count() > 1 {
            base_dir.join(command)
        } else {
            command.to_path_buf()
        }
    }

    fn exec_info(&self, cluster: Option<ClusterInfo<'_>>) -> serde_json::Value {
        let mut spec = json!({ "interactive": false });
        if let (true, Some(cluster)) = (self.provide_cluster_info, cluster) {
            let mut info = json!({ "server": cluster.server });
            if let Some(ca) = cluster.certificate_authority_data {
                use base64::Engine as _;
                info["certificate-authority-data"] =
                    json!(base64::engine::general_purpose::STANDARD.encode(ca));
            }
            spec["cluster"] = info;
        }
        json!({
            "apiVersion": self.api_version,
            "kind": "ExecCredential",
            "spec": spec,
        })
    }

    pub fn run(
        &self,
        base_dir: &Path,
        cluster: Option<ClusterInfo<'_>>,
    ) -> anyhow::Result<ExecCredentialStatus> {
        if self.command.is_empty() {
            bail!("exec plugin: command must be specified");
        }
        if self.api_version != API_V1BETA1 && self.api_version != API_V1 {
            bail!(
                "exec plugin: invalid apiVersion {:?}",
                self.api_version
            );
        }
        if self.interactive_mode.as_deref() == Some("Always") {
            bail!("exec plugin cannot support interactive mode");
        }

        let command = self.resolved_command(base_dir);
        debug!(command = %command.display(), "running exec credential plugin");

        let mut cmd = Command::new(&command);
        cmd.args(self.args.iter().flatten())
            .envs(
                self.env
                    .iter()
                    .flatten()
                    .map(|var| (var.name.as_str(), var.value.as_str())),
            )
            .env(EXEC_INFO_ENV, self.exec_info(cluster).to_string())
            .stdin(Stdio::null())
            .stderr(Stdio::inherit());

        let output = cmd.output().with_context(|| match &self.install_hint {
            Some(hint) => format!(
                "exec plugin: failed to run {}\n\n{hint}",
                command.display()
            ),
            None => format!("exec plugin: failed to run {}", command.display()),
        })?;
        if !output.status.success() {
            bail!("exec plugin {} failed: {}", command.display(), output.status);
        }

        let credential: ExecCredential = serde_json::from_slice(&output.stdout)
            .context("exec plugin: decoding stdout")?;
        if credential.kind.as_deref() != Some("ExecCredential") {
            bail!(
                "exec plugin returned kind {:?}, expected \"ExecCredential\"",
                credential.kind.unwrap_or_default()
            );
        }
        let returned = credential.api_version.unwrap_or_default();
        if returned != self.api_version {
            bail!(
                "exec plugin is configured to use API version {}, plugin returned version {returned}",
                self.api_version
            );
        }

        let status = credential
            .status
            .context("exec plugin didn't return a status field")?;
        match (&status.client_certificate_data, &status.client_key_data) {
            (Some(_), None) | (None, Some(_)) => {
                bail!("exec plugin returned only certificate or private key, not both")
            }
            (None, None) if status.token.is_none() => {
                bail!("exec plugin didn't return a token or cert/key pair")
            }
            _ => {}
        }

        Ok(status)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn plugin(script: &str) -> ExecConfig {
        ExecConfig {
            command: "sh".to_string(),
            args: Some(vec!["-c".to_string(), script.to_string()]),
            api_version: API_V1BETA1.to_string(),
            ..Default::default()
        }
    }

    fn printing(body: &str) -> ExecConfig {
        plugin(&format!("cat <<'EOF'\n{body}\nEOF"))
    }

    #[test]
    fn returns_cert_pair() {
        let status = printing(
            r#"{"apiVersion":"client.authentication.k8s.io/v1beta1","kind":"ExecCredential",
"status":{"clientCertificateData":"CERT PEM","clientKeyData":"KEY PEM"}}"#,
        )
        .run(Path::new("."), None)
        .unwrap();

        let (cert, key) = status.cert_pair().unwrap();
        assert_eq!(cert, b"CERT PEM");
        assert_eq!(key, b"KEY PEM");
    }

    #[test]
    fn token_only_has_no_cert_pair() {
        let status = printing(
            r#"{"apiVersion":"client.authentication.k8s.io/v1beta1","kind":"ExecCredential","status":{"token":"t"}}"#,
        )
        .run(Path::new("."), None)
        .unwrap();
        assert!(status.cert_pair().is_none());
    }

    #[test]
    fn rejects_incomplete_status() {
        for (body, needle) in [
            (
                r#"{"apiVersion":"client.authentication.k8s.io/v1beta1","kind":"ExecCredential","status":{"clientCertificateData":"c"}}"#,
                "not both",
            ),
            (
                r#"{"apiVersion":"client.authentication.k8s.io/v1beta1","kind":"ExecCredential","status":{}}"#,
                "token or cert/key pair",
            ),
            (
                r#"{"apiVersion":"client.authentication.k8s.io/v1beta1","kind":"ExecCredential"}"#,
                "status field",
            ),
            (
                r#"{"apiVersion":"client.authentication.k8s.io/v1","kind":"ExecCredential","status":{"token":"t"}}"#,
                "plugin returned version",
            ),
        ] {
            let err = printing(body).run(Path::new("."), None).unwrap_err();
            assert!(err.to_string().contains(needle), "{err}");
        }
    }

    #[test]
    fn passes_env_and_exec_info() {
        let mut config = plugin(
            r#"printf '{"apiVersion":"client.authentication.k8s.io/v1beta1","kind":"ExecCredential","status":{"token":"%s|%s"}}' "$GREETING" "$(printf %s "$KUBERNETES_EXEC_INFO" | tr -d '"')""#,
        );
        config.env = Some(vec![ExecEnvVar {
            name: "GREETING".to_string(),
            value: "hello".to_string(),
        }]);
        config.provide_cluster_info = true;

        let status = config
            .run(
                Path::new("."),
                Some(ClusterInfo {
                    server: "https://c1",
                    certificate_authority_data: None,
                }),
            )
            .unwrap();

        let token = status.token.unwrap();
        assert!(token.starts_with("hello|"), "{token}");
        assert!(token.contains("server:https://c1"), "{token}");
        assert!(token.contains("interactive:false"), "{token}");
    }

    #[test]
    fn failing_plugin_is_an_error() {
        let err = plugin("exit 3").run(Path::new("."), None).unwrap_err();
        assert!(err.to_string().contains("failed"), "{err}");
    }

    #[test]
    fn missing_command_mentions_install_hint() {
        let config = ExecConfig {
            command: "definitely-not-a-real-plugin-binary".to_string(),
            api_version: API_V1.to_string(),
            install_hint: Some("install it from the vendor".to_string()),
            ..Default::default()
        };
        let err = config.run(Path::new("."), None).unwrap_err();
        assert!(format!("{err:#}").contains("install it from the vendor"));
    }

    #[test]
    fn relative_command_resolves_against_kubeconfig_dir() {
        let config = ExecConfig {
            command: "bin/plugin".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.resolved_command(Path::new("/etc/kube")),
            PathBuf::from("/etc/kube/bin/plugin")
        );
        let bare = ExecConfig {
            command: "plugin".to_string(),
            ..Default::default()
        };
        assert_eq!(bare.resolved_command(Path::new("/etc/kube")), PathBuf::from("plugin"));
    }
}
