//! `profile` command: output service profile config for Kubernetes
//!
//! Validates the options, optionally asks the control plane for its cluster
//! domain, runs the selected generator and writes the artifact to stdout.

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use snafu::ResultExt;
use tracing::debug;

use crate::cluster::{ControlPlane, KubeControlPlane, resolve_cluster_domain};
use crate::config::GlobalConfig;
use crate::error::{ClusterAccessSnafu, GenerationSnafu, ProfileError, WriteSnafu};
use crate::options::{OutputFormat, ProfileOptions, ProfileRequest, Strategy};
use crate::output::write_profile;
use crate::profiles::{openapi, proto, template};

pub const DEFAULT_CLUSTER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Args, Clone)]
#[command(
    after_help = "Examples:\n  \
  # Output a basic template to apply after modification.\n  \
  svcprof profile -n emojivoto --template web-svc\n\n  \
  # Generate a profile from an OpenAPI specification.\n  \
  svcprof profile -n emojivoto --open-api web-svc.swagger web-svc\n\n  \
  # Generate a profile from a protobuf definition.\n  \
  svcprof profile -n emojivoto --proto Voting.proto vote-svc"
)]
pub struct ProfileArgs {
    /// Output a service profile template
    #[arg(long)]
    pub template: bool,

    /// Output a service profile based on the given OpenAPI spec file
    #[arg(long = "open-api", value_name = "FILE")]
    pub open_api: Option<PathBuf>,

    /// Output a service profile based on the given Protobuf spec file
    #[arg(long, value_name = "FILE")]
    pub proto: Option<PathBuf>,

    /// Namespace of the service
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Output a service profile through offline generation
    #[arg(long)]
    pub ignore_cluster: bool,

    /// Output format. One of: yaml, json
    #[arg(short, long, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,

    /// Seconds to wait for the control plane configuration
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_CLUSTER_TIMEOUT_SECS)]
    pub cluster_timeout: u64,

    /// Name of the service
    #[arg(value_name = "SERVICE")]
    pub service: String,
}

impl ProfileArgs {
    /// Flag values as [`ProfileOptions`], filling in the kubeconfig namespace
    /// when none was given.
    pub fn to_options(&self, config: &GlobalConfig) -> ProfileOptions {
        let namespace = match self.namespace.as_deref() {
            Some(namespace) if !namespace.is_empty() => namespace.to_string(),
            _ => config.default_namespace(),
        };

        ProfileOptions {
            name: self.service.clone(),
            namespace,
            template: self.template,
            open_api: self.open_api.clone(),
            proto: self.proto.clone(),
            ignore_cluster: self.ignore_cluster,
            output: self.output,
        }
    }
}

/// Handle the profile command
pub async fn handle_profile_command(
    args: &ProfileArgs,
    config: &GlobalConfig,
) -> Result<(), ProfileError> {
    let request = args.to_options(config).validate()?;
    let control_plane = KubeControlPlane::new(config);
    let deadline = Duration::from_secs(args.cluster_timeout);

    let mut artifact = Vec::new();
    generate_profile(
        &request,
        &control_plane,
        &config.control_plane_namespace,
        deadline,
        interrupted(),
        &mut artifact,
    )
    .await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&artifact).context(WriteSnafu)?;
    stdout.flush().context(WriteSnafu)
}

/// Resolves the cluster domain, runs the selected generator and writes the
/// result to `sink`.
///
/// Nothing is written unless every earlier step succeeded.
pub async fn generate_profile<P, C, W>(
    request: &ProfileRequest,
    control_plane: &P,
    control_plane_namespace: &str,
    deadline: Duration,
    cancel: C,
    sink: &mut W,
) -> Result<(), ProfileError>
where
    P: ControlPlane,
    C: Future<Output = ()>,
    W: Write,
{
    let cluster_domain = resolve_cluster_domain(
        request.ignore_cluster,
        control_plane,
        control_plane_namespace,
        deadline,
        cancel,
    )
    .await
    .context(ClusterAccessSnafu)?;

    debug!(
        strategy = request.strategy.label(),
        service = %request.name,
        namespace = %request.namespace,
        %cluster_domain,
        "generating service profile"
    );

    let profile = match &request.strategy {
        Strategy::Template => {
            let rendered = template::render(
                &request.namespace,
                &request.name,
                &cluster_domain,
                request.output,
            )
            .context(GenerationSnafu)?;
            return sink.write_all(&rendered).context(WriteSnafu);
        }
        Strategy::OpenApi(path) => {
            openapi::render(path, &request.namespace, &request.name, &cluster_domain)
        }
        Strategy::Proto(path) => {
            proto::render(path, &request.namespace, &request.name, &cluster_domain)
        }
    }
    .context(GenerationSnafu)?;

    write_profile(&profile, sink, request.output)
}

/// Completes on Ctrl-C; never completes if the handler cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
