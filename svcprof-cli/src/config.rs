//! Invocation-wide settings
//!
//! Kubernetes connection settings and the control plane location are parsed
//! once from global flags and handed to whichever component needs them.

use std::path::PathBuf;

use clap::Args;
use kube::config::Kubeconfig;
use tracing::debug;

use crate::cluster::DEFAULT_CONTROL_PLANE_NAMESPACE;

/// Namespace used when neither `--namespace` nor the kubeconfig names one.
pub const FALLBACK_NAMESPACE: &str = "default";

#[derive(Debug, Clone, Args)]
pub struct GlobalConfig {
    /// Path to the kubeconfig file to use for CLI requests
    #[arg(long, global = true, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Name of the kubeconfig context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Username to impersonate for Kubernetes operations
    #[arg(long = "as", global = true, value_name = "USER")]
    pub impersonate: Option<String>,

    /// Group to impersonate for Kubernetes operations (repeatable)
    #[arg(long = "as-group", global = true, value_name = "GROUP")]
    pub impersonate_groups: Vec<String>,

    /// Namespace in which the control plane is installed
    #[arg(
        short = 'L',
        long,
        global = true,
        env = "SVCPROF_CONTROL_PLANE_NAMESPACE",
        default_value = DEFAULT_CONTROL_PLANE_NAMESPACE
    )]
    pub control_plane_namespace: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            impersonate: None,
            impersonate_groups: Vec::new(),
            control_plane_namespace: DEFAULT_CONTROL_PLANE_NAMESPACE.to_string(),
        }
    }
}

impl GlobalConfig {
    /// Namespace of the selected (or current) kubeconfig context.
    ///
    /// Falls back to [`FALLBACK_NAMESPACE`] when no kubeconfig can be read or
    /// the context sets no namespace.
    pub fn default_namespace(&self) -> String {
        let kubeconfig = match &self.kubeconfig {
            Some(path) => Kubeconfig::read_from(path),
            None => Kubeconfig::read(),
        };

        match kubeconfig {
            Ok(kubeconfig) => context_namespace(&kubeconfig, self.context.as_deref())
                .unwrap_or_else(|| FALLBACK_NAMESPACE.to_string()),
            Err(err) => {
                debug!("no usable kubeconfig ({err}), using namespace {FALLBACK_NAMESPACE}");
                FALLBACK_NAMESPACE.to_string()
            }
        }
    }
}

fn context_namespace(kubeconfig: &Kubeconfig, context: Option<&str>) -> Option<String> {
    let name = context.or(kubeconfig.current_context.as_deref())?;
    kubeconfig
        .contexts
        .iter()
        .find(|named| named.name == name)?
        .context
        .as_ref()?
        .namespace
        .clone()
}
