//! Top-level error type for the profile command
//!
//! Every failure of an invocation ends up as one [`ProfileError`] variant so
//! callers can match on the kind instead of inspecting messages.

use snafu::Snafu;

use crate::cluster::ClusterError;
use crate::dns::LabelViolation;
use crate::profiles::GenerateError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProfileError {
    #[snafu(display("You must specify exactly one of --template or --open-api or --proto"))]
    AmbiguousStrategy,

    #[snafu(display("invalid service {name:?}: [{}]", join_violations(reasons)))]
    InvalidName {
        name: String,
        reasons: Vec<LabelViolation>,
    },

    #[snafu(display("invalid namespace {namespace:?}: [{}]", join_violations(reasons)))]
    InvalidNamespace {
        namespace: String,
        reasons: Vec<LabelViolation>,
    },

    #[snafu(display("failed to read control plane configuration: {source}"))]
    ClusterAccess { source: ClusterError },

    #[snafu(display("{source}"))]
    Generation { source: GenerateError },

    #[snafu(display("unknown output format: {format}"))]
    UnknownFormat { format: String },

    #[snafu(display("Error writing Service Profile: {source}"))]
    Serialization {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[snafu(display("{source}"))]
    Write { source: std::io::Error },
}

fn join_violations(reasons: &[LabelViolation]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
