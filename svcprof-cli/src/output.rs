//! Profile serialization

use std::io::Write;

use snafu::ResultExt;

use crate::error::{ProfileError, SerializationSnafu, WriteSnafu};
use crate::options::OutputFormat;
use crate::profiles::ServiceProfile;

/// Encodes `profile` in the requested format.
pub fn encode_profile(
    profile: &ServiceProfile,
    format: OutputFormat,
) -> Result<Vec<u8>, ProfileError> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(profile)
            .map(String::into_bytes)
            .boxed()
            .context(SerializationSnafu),
        OutputFormat::Json => serde_json::to_vec(profile)
            .boxed()
            .context(SerializationSnafu),
    }
}

/// Encodes `profile` and writes it to `sink` in a single write.
pub fn write_profile<W: Write>(
    profile: &ServiceProfile,
    sink: &mut W,
    format: OutputFormat,
) -> Result<(), ProfileError> {
    let encoded = encode_profile(profile, format)?;
    sink.write_all(&encoded).context(WriteSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{
        RequestMatch, ResponseClass, ResponseMatch, RetryBudget, RouteSpec, StatusRange,
        new_profile,
    };

    fn books_profile() -> ServiceProfile {
        let mut profile = new_profile(
            "ns1",
            "svc1",
            "foo.local",
            vec![RouteSpec {
                name: "GET /books/{id}".to_string(),
                condition: RequestMatch {
                    method: Some("GET".to_string()),
                    path_regex: Some("/books/[^/]*".to_string()),
                    not: Some(Box::new(RequestMatch {
                        method: Some("HEAD".to_string()),
                        ..RequestMatch::default()
                    })),
                    ..RequestMatch::default()
                },
                response_classes: vec![ResponseClass {
                    condition: ResponseMatch {
                        status: Some(StatusRange { min: 500, max: 599 }),
                        ..ResponseMatch::default()
                    },
                    is_failure: true,
                }],
                is_retryable: true,
                timeout: Some("250ms".to_string()),
            }],
        );
        profile.spec.retry_budget = Some(RetryBudget {
            retry_ratio: 0.2,
            min_retries_per_second: 10,
            ttl: "10s".to_string(),
        });
        profile
    }

    #[test]
    fn test_yaml_layout() {
        let yaml = String::from_utf8(encode_profile(&books_profile(), OutputFormat::Yaml).unwrap())
            .unwrap();
        assert!(yaml.starts_with("apiVersion: linkerd.io/v1alpha2\nkind: ServiceProfile\n"));
        assert!(yaml.contains("name: svc1.ns1.svc.foo.local"));
        assert!(yaml.contains("pathRegex:"));
        assert!(yaml.contains("isRetryable: true"));
    }

    #[test]
    fn test_yaml_and_json_decode_to_the_same_profile() {
        let profile = books_profile();
        let yaml = encode_profile(&profile, OutputFormat::Yaml).unwrap();
        let json = encode_profile(&profile, OutputFormat::Json).unwrap();

        let from_yaml: ServiceProfile = serde_yaml::from_slice(&yaml).unwrap();
        let from_json: ServiceProfile = serde_json::from_slice(&json).unwrap();
        assert_eq!(from_yaml, profile);
        assert_eq!(from_json, profile);

        let yaml_value: serde_json::Value = serde_yaml::from_slice(&yaml).unwrap();
        let json_value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(yaml_value, json_value);
    }

    #[test]
    fn test_write_profile_writes_once() {
        struct CountingSink {
            bytes: Vec<u8>,
            writes: usize,
        }
        impl Write for CountingSink {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.writes += 1;
                self.bytes.extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut sink = CountingSink {
            bytes: Vec::new(),
            writes: 0,
        };
        write_profile(&books_profile(), &mut sink, OutputFormat::Json).unwrap();
        assert_eq!(sink.writes, 1);
        let value: serde_json::Value = serde_json::from_slice(&sink.bytes).unwrap();
        assert_eq!(value["spec"]["retryBudget"]["minRetriesPerSecond"], 10);
    }

    #[test]
    fn test_sink_errors_propagate() {
        struct ClosedSink;
        impl Write for ClosedSink {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let err = write_profile(&books_profile(), &mut ClosedSink, OutputFormat::Yaml).unwrap_err();
        assert!(matches!(err, ProfileError::Write { .. }));
        assert_eq!(err.to_string(), "closed");
    }
}
