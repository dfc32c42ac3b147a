//! Protobuf service definition to `ServiceProfile` translation
//!
//! The file is parsed for syntax only; imports are not resolved, so a
//! definition referring to messages from other files is accepted as is.

use std::fs;
use std::path::Path;

use miette::Diagnostic;
use prost_types::FileDescriptorProto;
use snafu::ResultExt;
use tracing::debug;

use super::{
    GenerateError, ReadInputSnafu, RequestMatch, RouteSpec, ServiceProfile, new_profile,
};

/// Reads the protobuf definition at `path` and derives one route per rpc.
pub fn render(
    path: &Path,
    namespace: &str,
    name: &str,
    cluster_domain: &str,
) -> Result<ServiceProfile, GenerateError> {
    let source = fs::read_to_string(path).context(ReadInputSnafu { path })?;
    let file_name = path.file_name().map_or_else(
        || path.to_string_lossy(),
        |file_name| file_name.to_string_lossy(),
    );
    let descriptor =
        protox_parse::parse(&file_name, &source).map_err(|err| GenerateError::ParseProto {
            path: path.to_path_buf(),
            line: error_line(&err, &source),
            message: err.to_string(),
        })?;

    let definition = ProtoDefinition::from(descriptor);
    let routes = definition.routes();
    debug!(
        services = definition.services.len(),
        routes = routes.len(),
        "derived routes from {}",
        path.display()
    );
    Ok(new_profile(namespace, name, cluster_domain, routes))
}

/// 1-based line of the first labelled span of `err`.
fn error_line(err: &protox_parse::ParseError, source: &str) -> usize {
    let offset = err
        .labels()
        .and_then(|mut labels| labels.next())
        .map_or(0, |label| label.offset());
    let before = source.get(..offset).unwrap_or(source);
    before.matches('\n').count() + 1
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ProtoDefinition {
    package: Option<String>,
    services: Vec<ProtoService>,
}

#[derive(Debug, PartialEq, Eq)]
struct ProtoService {
    name: String,
    rpcs: Vec<String>,
}

impl From<FileDescriptorProto> for ProtoDefinition {
    fn from(file: FileDescriptorProto) -> Self {
        Self {
            package: file.package.filter(|package| !package.is_empty()),
            services: file
                .service
                .into_iter()
                .map(|service| ProtoService {
                    name: service.name.unwrap_or_default(),
                    rpcs: service
                        .method
                        .into_iter()
                        .filter_map(|method| method.name)
                        .collect(),
                })
                .collect(),
        }
    }
}

impl ProtoDefinition {
    /// One `POST /<package>.<Service>/<rpc>` route per rpc, in file order.
    fn routes(&self) -> Vec<RouteSpec> {
        let prefix = self
            .package
            .as_ref()
            .map(|package| format!("{package}."))
            .unwrap_or_default();

        self.services
            .iter()
            .flat_map(|service| {
                let prefix = &prefix;
                service.rpcs.iter().map(move |rpc| RouteSpec {
                    name: rpc.clone(),
                    condition: RequestMatch {
                        method: Some("POST".to_string()),
                        path_regex: Some(regex::escape(&format!(
                            "/{prefix}{}/{rpc}",
                            service.name
                        ))),
                        ..RequestMatch::default()
                    },
                    ..RouteSpec::default()
                })
            })
            .collect()
    }
}
