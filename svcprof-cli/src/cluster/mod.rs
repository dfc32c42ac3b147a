//! Cluster domain discovery
//!
//! The generated profile is named `<service>.<namespace>.svc.<cluster domain>`.
//! The domain defaults to [`DEFAULT_CLUSTER_DOMAIN`]; when cluster access is
//! requested it is read from the control plane's configuration instead.
//!
//! Failure policy:
//! - cluster access disabled: the default, without touching the control plane
//! - fetch fails, times out or is cancelled: the error is returned, no fallback
//! - fetch succeeds with an empty domain: the default
//! - fetch succeeds with a domain: that domain

mod kubernetes;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use snafu::Snafu;
use tracing::{debug, info};

pub use kubernetes::KubeControlPlane;

pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";
pub const DEFAULT_CONTROL_PLANE_NAMESPACE: &str = "linkerd";

/// ConfigMap holding the control plane's install values.
pub const CONFIG_MAP_NAME: &str = "linkerd-config";
/// Key of [`CONFIG_MAP_NAME`] whose YAML document carries `clusterDomain`.
pub const VALUES_KEY: &str = "values";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClusterError {
    #[snafu(display("failed to load kubeconfig: {source}"))]
    Kubeconfig {
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("failed to infer Kubernetes configuration: {source}"))]
    InferConfig {
        source: kube::config::InferConfigError,
    },

    #[snafu(display("failed to read kubeconfig {}: {source}", path.display()))]
    ReadKubeconfig {
        path: PathBuf,
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("failed to connect to the Kubernetes API: {source}"))]
    Connect { source: kube::Error },

    #[snafu(display("failed to fetch ConfigMap {namespace}/{name}: {source}"))]
    Fetch {
        namespace: String,
        name: String,
        source: kube::Error,
    },

    #[snafu(display("ConfigMap {namespace}/{name} has no {key:?} entry"))]
    MissingValues {
        namespace: String,
        name: String,
        key: String,
    },

    #[snafu(display("failed to parse control plane values: {source}"))]
    ParseValues { source: serde_yaml::Error },

    #[snafu(display("timed out after {}s waiting for the control plane", after.as_secs_f64()))]
    Timeout { after: Duration },

    #[snafu(display("cancelled while waiting for the control plane"))]
    Cancelled,
}

/// The subset of the control plane's install values this tool reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneValues {
    #[serde(default)]
    pub cluster_domain: String,
}

/// Source of the live control plane configuration.
pub trait ControlPlane {
    fn fetch_configuration(
        &self,
        namespace: &str,
    ) -> impl Future<Output = Result<ControlPlaneValues, ClusterError>>;
}

/// Resolves the cluster domain used to qualify the service name.
///
/// The fetch is bounded by `deadline` and abandoned as soon as `cancel`
/// completes.
pub async fn resolve_cluster_domain<P, C>(
    ignore_cluster: bool,
    control_plane: &P,
    namespace: &str,
    deadline: Duration,
    cancel: C,
) -> Result<String, ClusterError>
where
    P: ControlPlane,
    C: Future<Output = ()>,
{
    if ignore_cluster {
        debug!("cluster access disabled, using {DEFAULT_CLUSTER_DOMAIN}");
        return Ok(DEFAULT_CLUSTER_DOMAIN.to_string());
    }

    let values = tokio::select! {
        fetched = tokio::time::timeout(deadline, control_plane.fetch_configuration(namespace)) => {
            match fetched {
                Ok(values) => values?,
                Err(_) => return TimeoutSnafu { after: deadline }.fail(),
            }
        }
        () = cancel => return CancelledSnafu.fail(),
    };

    if values.cluster_domain.is_empty() {
        info!("control plane reports no cluster domain, using {DEFAULT_CLUSTER_DOMAIN}");
        Ok(DEFAULT_CLUSTER_DOMAIN.to_string())
    } else {
        debug!(cluster_domain = %values.cluster_domain, "resolved cluster domain");
        Ok(values.cluster_domain)
    }
}
