//! `ServiceProfile` resource model and the generators that produce it
//!
//! - [`template`] renders a commented example profile as text
//! - [`openapi`] derives routes from a Swagger 2.0 document
//! - [`proto`] derives routes from the rpcs of a protobuf definition

pub mod openapi;
pub mod proto;
pub mod template;

use std::path::PathBuf;
use std::sync::LazyLock;

use kube::CustomResource;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GenerateError {
    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse OpenAPI spec {}: {source}", path.display()))]
    ParseOpenApi {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[snafu(display("failed to parse protobuf definition {}:{line}: {message}", path.display()))]
    ParseProto {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[snafu(display("failed to render service profile template: {source}"))]
    RenderTemplate { source: tera::Error },

    #[snafu(display("rendered service profile template is not valid YAML: {source}"))]
    TemplateYaml { source: serde_yaml::Error },

    #[snafu(display("failed to convert service profile template to JSON: {source}"))]
    TemplateJson { source: serde_json::Error },
}

/// Routing and metadata for one service, as consumed by the mesh control plane.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[kube(
    group = "linkerd.io",
    version = "v1alpha2",
    kind = "ServiceProfile",
    namespaced,
    schema = "disabled",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProfileSpec {
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_budget: Option<RetryBudget>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    pub name: String,
    pub condition: RequestMatch,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_classes: Vec<ResponseClass>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestMatch {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<RequestMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<RequestMatch>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any: Vec<RequestMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseClass {
    pub condition: ResponseMatch,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_failure: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMatch {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<ResponseMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<ResponseMatch>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any: Vec<ResponseMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusRange>,
}

/// Inclusive range of HTTP status codes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetryBudget {
    pub retry_ratio: f32,
    pub min_retries_per_second: u32,
    pub ttl: String,
}

/// `<name>.<namespace>.svc.<cluster domain>`
pub fn fully_qualified_name(name: &str, namespace: &str, cluster_domain: &str) -> String {
    format!("{name}.{namespace}.svc.{cluster_domain}")
}

/// Builds a profile for `name` in `namespace` carrying `routes`.
pub fn new_profile(
    namespace: &str,
    name: &str,
    cluster_domain: &str,
    routes: Vec<RouteSpec>,
) -> ServiceProfile {
    let mut profile = ServiceProfile::new(
        &fully_qualified_name(name, namespace, cluster_domain),
        ServiceProfileSpec {
            routes,
            retry_budget: None,
        },
    );
    profile.metadata.namespace = Some(namespace.to_string());
    profile
}

static PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\{[^}]*\\\}").expect("path parameter pattern is valid"));

/// Regex matching `path`, with each `{param}` segment matching any
/// non-slash run.
pub fn path_to_regex(path: &str) -> String {
    let escaped = regex::escape(path);
    PATH_PARAM
        .replace_all(&escaped, NoExpand("[^/]*"))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_qualified_name() {
        assert_eq!(
            fully_qualified_name("web-svc", "emojivoto", "cluster.local"),
            "web-svc.emojivoto.svc.cluster.local"
        );
    }

    #[test]
    fn test_new_profile_metadata() {
        let profile = new_profile("ns1", "svc1", "foo.local", Vec::new());
        assert_eq!(profile.metadata.name.as_deref(), Some("svc1.ns1.svc.foo.local"));
        assert_eq!(profile.metadata.namespace.as_deref(), Some("ns1"));
        assert!(profile.spec.routes.is_empty());
    }

    #[test]
    fn test_path_to_regex() {
        assert_eq!(path_to_regex("/books"), "/books");
        assert_eq!(path_to_regex("/books/{id}"), "/books/[^/]*");
        assert_eq!(
            path_to_regex("/v1/{org}/repos/{repo}.git"),
            r"/v1/[^/]*/repos/[^/]*\.git"
        );
    }

    #[test]
    fn test_path_regex_matches_concrete_paths() {
        let re = Regex::new(&format!("^{}$", path_to_regex("/authors/{id}/books"))).unwrap();
        assert!(re.is_match("/authors/42/books"));
        assert!(!re.is_match("/authors/42/7/books"));
    }

    #[test]
    fn test_profile_field_layout() {
        let mut profile = new_profile("ns1", "svc1", "cluster.local", Vec::new());
        profile.spec.routes.push(RouteSpec {
            name: "GET /books".to_string(),
            condition: RequestMatch {
                method: Some("GET".to_string()),
                path_regex: Some("/books".to_string()),
                ..RequestMatch::default()
            },
            ..RouteSpec::default()
        });
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["apiVersion"], "linkerd.io/v1alpha2");
        assert_eq!(value["kind"], "ServiceProfile");
        assert_eq!(value["metadata"]["name"], "svc1.ns1.svc.cluster.local");
        let route = &value["spec"]["routes"][0];
        assert_eq!(route["condition"]["pathRegex"], "/books");
        assert!(route.get("isRetryable").is_none());
        assert!(route.get("responseClasses").is_none());
    }
}
