use assert_cmd::Command;
use std::io::Write;
use tempfile::NamedTempFile;

fn svcprof() -> Command {
    let mut cmd = Command::cargo_bin("svcprof").unwrap();
    // Keep tests independent of any kubeconfig on the host.
    cmd.env("KUBECONFIG", "/nonexistent/svcprof-test-kubeconfig")
        .env_remove("KUBERNETES_SERVICE_HOST")
        .env_remove("KUBERNETES_SERVICE_PORT")
        .env_remove("SVCPROF_CONTROL_PLANE_NAMESPACE")
        .env_remove("RUST_LOG");
    cmd
}

fn fixture(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn stdout_of(cmd: &mut Command) -> String {
    let out = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(out).unwrap()
}

fn stderr_of_failure(cmd: &mut Command) -> String {
    let out = cmd.assert().failure().get_output().clone();
    assert!(out.stdout.is_empty(), "no partial output on failure");
    String::from_utf8(out.stderr).unwrap()
}

#[test]
fn help_lists_profile_flags() {
    let s = stdout_of(svcprof().args(["profile", "--help"]));
    for needle in [
        "--template",
        "--open-api",
        "--proto",
        "--namespace",
        "--ignore-cluster",
        "--output",
    ] {
        assert!(s.contains(needle), "help missing `{needle}`");
    }
}

#[test]
fn template_offline_yaml() {
    let s = stdout_of(svcprof().args([
        "profile",
        "--template",
        "-n",
        "emojivoto",
        "web-svc",
        "--ignore-cluster",
        "-o",
        "yaml",
    ]));
    assert!(s.starts_with("### ServiceProfile for web-svc.emojivoto ###"));
    assert!(s.contains("name: web-svc.emojivoto.svc.cluster.local"));
}

#[test]
fn template_offline_json() {
    let s = stdout_of(svcprof().args([
        "profile",
        "--template",
        "--namespace",
        "emojivoto",
        "--ignore-cluster",
        "--output",
        "json",
        "web-svc",
    ]));
    let value: serde_json::Value = serde_json::from_str(&s).unwrap();
    assert_eq!(value["metadata"]["name"], "web-svc.emojivoto.svc.cluster.local");
}

#[test]
fn namespace_defaults_without_kubeconfig() {
    let s = stdout_of(svcprof().args(["profile", "--template", "--ignore-cluster", "web-svc"]));
    assert!(s.contains("name: web-svc.default.svc.cluster.local"));
}

#[test]
fn open_api_offline() {
    let spec = fixture(
        r#"{"swagger": "2.0", "paths": {"/books/{id}": {"get": {"responses": {"500": {}}}}}}"#,
    );
    let s = stdout_of(
        svcprof()
            .args(["profile", "-n", "ns1", "--ignore-cluster", "--open-api"])
            .arg(spec.path())
            .arg("svc1"),
    );
    let profile: serde_json::Value = serde_yaml::from_str(&s).unwrap();
    assert_eq!(profile["kind"], "ServiceProfile");
    assert_eq!(profile["metadata"]["name"], "svc1.ns1.svc.cluster.local");
    assert_eq!(profile["spec"]["routes"][0]["name"], "GET /books/{id}");
    assert_eq!(
        profile["spec"]["routes"][0]["responseClasses"][0]["isFailure"],
        true
    );
}

#[test]
fn proto_offline_json() {
    let definition = fixture(
        "syntax = \"proto3\";\npackage vote;\nservice Voting {\n  rpc Cast (Ballot) returns (Receipt);\n}\n",
    );
    let s = stdout_of(
        svcprof()
            .args(["profile", "-n", "emojivoto", "--ignore-cluster", "-o", "json", "--proto"])
            .arg(definition.path())
            .arg("voting-svc"),
    );
    let profile: serde_json::Value = serde_json::from_str(&s).unwrap();
    assert_eq!(profile["spec"]["routes"][0]["name"], "Cast");
    assert_eq!(profile["spec"]["routes"][0]["condition"]["method"], "POST");
    assert_eq!(
        profile["spec"]["routes"][0]["condition"]["pathRegex"],
        "/vote\\.Voting/Cast"
    );
}

#[test]
fn ambiguous_strategy_fails() {
    let err = stderr_of_failure(svcprof().args([
        "profile",
        "--template",
        "--open-api",
        "x.json",
        "svc",
    ]));
    assert!(err.contains("exactly one of --template or --open-api or --proto"));
}

#[test]
fn missing_strategy_fails() {
    let err = stderr_of_failure(svcprof().args(["profile", "-n", "ns1", "svc"]));
    assert!(err.contains("exactly one of"));
}

#[test]
fn invalid_service_name_fails_before_cluster_access() {
    // No --ignore-cluster: reaching the cluster would fail with a kubeconfig error.
    let err = stderr_of_failure(svcprof().args(["profile", "--proto", "x.proto", "Svc_Name"]));
    assert!(err.contains("invalid service \"Svc_Name\""), "{err}");
}

#[test]
fn invalid_namespace_fails() {
    let err = stderr_of_failure(svcprof().args([
        "profile",
        "--template",
        "-n",
        "Bad_NS",
        "--ignore-cluster",
        "svc",
    ]));
    assert!(err.contains("invalid namespace \"Bad_NS\""), "{err}");
}

#[test]
fn unreachable_cluster_fails_without_fallback() {
    let err = stderr_of_failure(svcprof().args(["profile", "--template", "-n", "ns1", "svc"]));
    assert!(err.contains("failed to read control plane configuration"), "{err}");
}

#[test]
fn client_config_is_inferred_without_kubeconfig_or_context() {
    let err = stderr_of_failure(svcprof().args(["profile", "--template", "-n", "ns1", "svc"]));
    assert!(err.contains("failed to infer Kubernetes configuration"), "{err}");
}

#[test]
fn explicit_kubeconfig_is_read_directly() {
    let dir = tempfile::tempdir().unwrap();
    let err = stderr_of_failure(
        svcprof()
            .args(["profile", "--template", "-n", "ns1", "svc", "--kubeconfig"])
            .arg(dir.path().join("absent")),
    );
    assert!(err.contains("failed to read kubeconfig"), "{err}");
}

#[test]
fn missing_open_api_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = stderr_of_failure(
        svcprof()
            .args(["profile", "-n", "ns1", "--ignore-cluster", "--open-api"])
            .arg(dir.path().join("absent.json"))
            .arg("svc1"),
    );
    assert!(err.contains("failed to read"), "{err}");
}

#[test]
fn unknown_output_format_fails() {
    svcprof()
        .args(["profile", "--template", "--ignore-cluster", "-o", "toml", "svc"])
        .assert()
        .failure();
}

#[test]
fn exactly_one_service_name() {
    svcprof()
        .args(["profile", "--template", "--ignore-cluster"])
        .assert()
        .failure();
    svcprof()
        .args(["profile", "--template", "--ignore-cluster", "a", "b"])
        .assert()
        .failure();
}
