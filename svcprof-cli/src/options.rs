//! Profile command options and their validation
//!
//! [`ProfileOptions`] is the raw, flag-shaped input. [`ProfileOptions::validate`]
//! turns it into a [`ProfileRequest`] whose [`Strategy`] names exactly one
//! generator, so later stages never re-check the flag combination.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use snafu::ensure;

use crate::dns::{dns1035_label_violations, dns1123_label_violations};
use crate::error::{
    AmbiguousStrategySnafu, InvalidNameSnafu, InvalidNamespaceSnafu, ProfileError,
};

/// Encoding of the generated artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yaml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(ProfileError::UnknownFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// The one generation method selected for an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Commented example profile, rendered as text
    Template,
    /// Routes derived from a Swagger 2.0 document
    OpenApi(PathBuf),
    /// Routes derived from the rpcs of a `.proto` file
    Proto(PathBuf),
}

impl Strategy {
    /// Builds the strategy from the three mutually exclusive flags.
    ///
    /// Empty paths count as unset. Anything other than exactly one selection
    /// is rejected with [`ProfileError::AmbiguousStrategy`].
    pub fn from_flags(
        template: bool,
        open_api: Option<&Path>,
        proto: Option<&Path>,
    ) -> Result<Self, ProfileError> {
        let open_api = open_api.filter(|p| !p.as_os_str().is_empty());
        let proto = proto.filter(|p| !p.as_os_str().is_empty());

        match (template, open_api, proto) {
            (true, None, None) => Ok(Self::Template),
            (false, Some(path), None) => Ok(Self::OpenApi(path.to_path_buf())),
            (false, None, Some(path)) => Ok(Self::Proto(path.to_path_buf())),
            _ => AmbiguousStrategySnafu.fail(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::OpenApi(_) => "open-api",
            Self::Proto(_) => "proto",
        }
    }
}

/// User supplied parameters for one profile invocation.
#[derive(Debug, Clone, Default)]
pub struct ProfileOptions {
    pub name: String,
    pub namespace: String,
    pub template: bool,
    pub open_api: Option<PathBuf>,
    pub proto: Option<PathBuf>,
    pub ignore_cluster: bool,
    pub output: OutputFormat,
}

/// Validated form of [`ProfileOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRequest {
    pub name: String,
    pub namespace: String,
    pub strategy: Strategy,
    pub ignore_cluster: bool,
    pub output: OutputFormat,
}

impl ProfileOptions {
    /// Checks the strategy selection, then the service name, then the
    /// namespace, returning the first stage that fails.
    pub fn validate(&self) -> Result<ProfileRequest, ProfileError> {
        let strategy = Strategy::from_flags(
            self.template,
            self.open_api.as_deref(),
            self.proto.as_deref(),
        )?;

        let reasons = dns1035_label_violations(&self.name);
        ensure!(
            reasons.is_empty(),
            InvalidNameSnafu {
                name: self.name.clone(),
                reasons,
            }
        );

        let reasons = dns1123_label_violations(&self.namespace);
        ensure!(
            reasons.is_empty(),
            InvalidNamespaceSnafu {
                namespace: self.namespace.clone(),
                reasons,
            }
        );

        Ok(ProfileRequest {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            strategy,
            ignore_cluster: self.ignore_cluster,
            output: self.output,
        })
    }
}
