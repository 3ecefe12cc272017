use std::{collections::BTreeMap, path::Path};

use anyhow::{bail, Context as _};

use crate::direct;
pub use crate::direct::{ClusterSpec, ContextSpec, UserSpec};

/// Name-indexed view of a kubeconfig.
#[derive(Debug, Clone)]
pub struct KubeConfig {
    pub contexts: BTreeMap<String, ContextSpec>,
    pub current_context: String,
    pub clusters: BTreeMap<String, ClusterSpec>,
    pub users: BTreeMap<String, UserSpec>,
}

/// The entries selected by `current-context`.
#[derive(Debug, Clone, Copy)]
pub struct ActiveEntries<'a> {
    pub context: &'a str,
    pub cluster_name: &'a str,
    pub cluster: &'a ClusterSpec,
    pub user_name: &'a str,
    pub user: &'a UserSpec,
}

impl From<direct::KubeConfig> for KubeConfig {
    fn from(kc: direct::KubeConfig) -> Self {
        Self {
            current_context: kc.current_context,
            contexts: kc
                .contexts
                .into_iter()
                .map(|ctx| (ctx.name, ctx.context))
                .collect(),
            clusters: kc
                .clusters
                .into_iter()
                .map(|cls| (cls.name, cls.cluster))
                .collect(),
            users: kc
                .users
                .into_iter()
                .map(|usr| (usr.name, usr.user))
                .collect(),
        }
    }
}

impl KubeConfig {
    pub fn active(&self) -> anyhow::Result<ActiveEntries<'_>> {
        let current = self.current_context.as_str();
        if current.is_empty() {
            bail!("invalid configuration: no configuration has been provided");
        }

        let context = self
            .contexts
            .get(current)
            .with_context(|| format!("context was not found for specified context: {current}"))?;

        if context.cluster.is_empty() {
            bail!("cluster was not specified for context {current:?}");
        }
        let cluster = self.clusters.get(&context.cluster).with_context(|| {
            format!(
                "cluster {:?} was not found for context {current:?}",
                context.cluster
            )
        })?;
        if cluster.server.is_empty() {
            bail!("no server found for cluster {:?}", context.cluster);
        }

        if context.user.is_empty() {
            bail!("user was not specified for context {current:?}");
        }
        let user = self.users.get(&context.user).with_context(|| {
            format!("user {:?} was not found for context {current:?}", context.user)
        })?;

        Ok(ActiveEntries {
            context: current,
            cluster_name: &context.cluster,
            cluster,
            user_name: &context.user,
            user,
        })
    }
}

pub fn read_config(path: &Path) -> anyhow::Result<KubeConfig> {
    direct::KubeConfig::read_from(path).map(KubeConfig::from)
}
