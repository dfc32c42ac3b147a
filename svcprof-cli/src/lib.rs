//! svcprof - service profile generation for service mesh control planes
//!
//! Derives a `ServiceProfile` for one service from exactly one of:
//! - an annotated template (`--template`)
//! - a Swagger 2.0 document (`--open-api`)
//! - a protobuf service definition (`--proto`)
//!
//! The profile is named after the service's fully qualified in-cluster DNS
//! name. Unless `--ignore-cluster` is given, the cluster domain is read from
//! the control plane's configuration.

pub mod cluster;
pub mod commands;
pub mod config;
pub mod dns;
pub mod error;
pub mod options;
pub mod output;
pub mod profiles;

pub use cluster::{ClusterError, ControlPlane, DEFAULT_CLUSTER_DOMAIN, resolve_cluster_domain};
pub use config::GlobalConfig;
pub use error::ProfileError;
pub use options::{OutputFormat, ProfileOptions, ProfileRequest, Strategy};
pub use profiles::{GenerateError, ServiceProfile, ServiceProfileSpec};
