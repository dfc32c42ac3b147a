//! Swagger 2.0 to `ServiceProfile` translation
//!
//! Each operation of each path becomes one route. Documents may be written in
//! JSON or YAML.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use snafu::ResultExt;
use tracing::debug;

use super::{
    GenerateError, ParseOpenApiSnafu, ReadInputSnafu, RequestMatch, ResponseClass,
    ResponseMatch, RouteSpec, ServiceProfile, StatusRange, new_profile, path_to_regex,
};

const RETRYABLE_EXTENSION: &str = "x-linkerd-retryable";
const TIMEOUT_EXTENSION: &str = "x-linkerd-timeout";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Swagger {
    #[serde(default)]
    base_path: String,
    #[serde(default, deserialize_with = "path_items")]
    paths: BTreeMap<String, PathItem>,
}

/// Decodes the Paths object, leaving out its `x-` vendor extensions.
fn path_items<'de, D>(deserializer: D) -> Result<BTreeMap<String, PathItem>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, Value>::deserialize(deserializer)?
        .into_iter()
        .filter(|(key, _)| !is_extension(key))
        .map(|(key, value)| {
            serde_yaml::from_value(value)
                .map(|item| (key.clone(), item))
                .map_err(|err| D::Error::custom(format!("paths.{key}: {err}")))
        })
        .collect()
}

fn is_extension(key: &str) -> bool {
    key.get(..2)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("x-"))
}

#[derive(Debug, Default, Deserialize)]
struct PathItem {
    delete: Option<Operation>,
    get: Option<Operation>,
    head: Option<Operation>,
    options: Option<Operation>,
    patch: Option<Operation>,
    post: Option<Operation>,
    put: Option<Operation>,
}

impl PathItem {
    fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("DELETE", &self.delete),
            ("GET", &self.get),
            ("HEAD", &self.head),
            ("OPTIONS", &self.options),
            ("PATCH", &self.patch),
            ("POST", &self.post),
            ("PUT", &self.put),
        ]
        .into_iter()
        .filter_map(|(method, operation)| operation.as_ref().map(|op| (method, op)))
    }
}

#[derive(Debug, Default, Deserialize)]
struct Operation {
    #[serde(default)]
    responses: Mapping,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl Operation {
    /// Vendor extension `name`, matched case-insensitively.
    fn extension(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(key, _)| is_extension(key) && key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

/// Reads the Swagger document at `path` and derives a profile from it.
pub fn render(
    path: &Path,
    namespace: &str,
    name: &str,
    cluster_domain: &str,
) -> Result<ServiceProfile, GenerateError> {
    let contents = fs::read_to_string(path).context(ReadInputSnafu { path })?;
    let swagger: Swagger = serde_yaml::from_str(&contents).context(ParseOpenApiSnafu { path })?;
    let profile = swagger_to_profile(&swagger, namespace, name, cluster_domain);
    debug!(
        routes = profile.spec.routes.len(),
        "derived routes from {}",
        path.display()
    );
    Ok(profile)
}

fn swagger_to_profile(
    swagger: &Swagger,
    namespace: &str,
    name: &str,
    cluster_domain: &str,
) -> ServiceProfile {
    let base = swagger.base_path.trim_end_matches('/');
    let mut routes = Vec::new();

    for (relative, item) in &swagger.paths {
        let path = format!("{base}/{}", relative.trim_start_matches('/'));
        let path_regex = path_to_regex(&path);
        for (method, operation) in item.operations() {
            routes.push(route_spec(&path, &path_regex, method, operation));
        }
    }

    new_profile(namespace, name, cluster_domain, routes)
}

fn route_spec(path: &str, path_regex: &str, method: &str, operation: &Operation) -> RouteSpec {
    let retryable = operation.extension(RETRYABLE_EXTENSION);
    let is_retryable = retryable.and_then(Value::as_bool).unwrap_or(false);
    if retryable.is_some() && !is_retryable {
        debug!("{RETRYABLE_EXTENSION} on {method} {path} is not true, route is not retryable");
    }
    let raw_timeout = operation.extension(TIMEOUT_EXTENSION);
    let timeout = raw_timeout.and_then(Value::as_str).map(str::to_string);
    if raw_timeout.is_some() && timeout.is_none() {
        debug!("{TIMEOUT_EXTENSION} on {method} {path} is not a string, ignoring it");
    }

    RouteSpec {
        name: format!("{method} {path}"),
        condition: RequestMatch {
            method: Some(method.to_string()),
            path_regex: Some(path_regex.to_string()),
            ..RequestMatch::default()
        },
        response_classes: response_classes(&operation.responses),
        is_retryable,
        timeout,
    }
}

/// One class per explicit status code, ascending; 5xx codes are failures.
fn response_classes(responses: &Mapping) -> Vec<ResponseClass> {
    let mut statuses: Vec<u32> = responses.keys().filter_map(status_code).collect();
    statuses.sort_unstable();
    statuses.dedup();

    statuses
        .into_iter()
        .map(|status| ResponseClass {
            condition: ResponseMatch {
                status: Some(StatusRange {
                    min: status,
                    max: status,
                }),
                ..ResponseMatch::default()
            },
            is_failure: status >= 500,
        })
        .collect()
}

fn status_code(key: &Value) -> Option<u32> {
    match key {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
