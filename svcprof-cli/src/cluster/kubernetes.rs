//! Kubernetes-backed control plane access

use k8s_openapi::api::core::v1::ConfigMap;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use snafu::{OptionExt, ResultExt};
use tracing::debug;

use super::{
    CONFIG_MAP_NAME, ClusterError, ConnectSnafu, ControlPlane, ControlPlaneValues, FetchSnafu,
    InferConfigSnafu, KubeconfigSnafu, MissingValuesSnafu, ParseValuesSnafu, ReadKubeconfigSnafu, VALUES_KEY,
};
use crate::config::GlobalConfig;

/// Reads the control plane configuration through the Kubernetes API.
///
/// Construction does no I/O; the kubeconfig is loaded and the client built on
/// the first fetch.
#[derive(Debug, Clone)]
pub struct KubeControlPlane {
    config: GlobalConfig,
}

impl KubeControlPlane {
    pub fn new(config: &GlobalConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Client configuration from the selected kubeconfig and context, with
    /// impersonation applied.
    ///
    /// Without `--kubeconfig` or `--context` the usual inference applies:
    /// `$KUBECONFIG` or `~/.kube/config`, then the in-cluster service account.
    async fn kube_config(&self) -> Result<Config, ClusterError> {
        let options = KubeConfigOptions {
            context: self.config.context.clone(),
            ..KubeConfigOptions::default()
        };

        let mut config = match (&self.config.kubeconfig, &self.config.context) {
            (Some(path), _) => {
                let kubeconfig = Kubeconfig::read_from(path).context(ReadKubeconfigSnafu { path })?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .context(KubeconfigSnafu)?
            }
            (None, Some(_)) => Config::from_kubeconfig(&options)
                .await
                .context(KubeconfigSnafu)?,
            (None, None) => Config::infer().await.context(InferConfigSnafu)?,
        };

        if let Some(user) = &self.config.impersonate {
            config.auth_info.impersonate = Some(user.clone());
        }
        if !self.config.impersonate_groups.is_empty() {
            config.auth_info.impersonate_groups = Some(self.config.impersonate_groups.clone());
        }

        Ok(config)
    }

    async fn client(&self) -> Result<Client, ClusterError> {
        let config = self.kube_config().await?;
        debug!(cluster_url = %config.cluster_url, "connecting to the Kubernetes API");
        Client::try_from(config).context(ConnectSnafu)
    }
}

impl ControlPlane for KubeControlPlane {
    async fn fetch_configuration(
        &self,
        namespace: &str,
    ) -> Result<ControlPlaneValues, ClusterError> {
        let client = self.client().await?;
        let config_maps: Api<ConfigMap> = Api::namespaced(client, namespace);
        let config_map = config_maps
            .get(CONFIG_MAP_NAME)
            .await
            .context(FetchSnafu {
                namespace,
                name: CONFIG_MAP_NAME,
            })?;
        parse_values(&config_map, namespace)
    }
}

fn parse_values(config_map: &ConfigMap, namespace: &str) -> Result<ControlPlaneValues, ClusterError> {
    let raw = config_map
        .data
        .as_ref()
        .and_then(|data| data.get(VALUES_KEY))
        .context(MissingValuesSnafu {
            namespace,
            name: CONFIG_MAP_NAME,
            key: VALUES_KEY,
        })?;

    if raw.trim().is_empty() {
        return Ok(ControlPlaneValues::default());
    }
    serde_yaml::from_str(raw).context(ParseValuesSnafu)
}
