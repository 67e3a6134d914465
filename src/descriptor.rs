// JNLP launch descriptor: where to fetch the viewer JAR and what to pass it.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{LaunchError, Result};

static CODEBASE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bcodebase\s*=\s*"([^"]*)""#).expect("codebase pattern"));

static JAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<jar\b[^>]*>").expect("jar pattern"));

static HREF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bhref\s*=\s*"([^"]*)""#).expect("href pattern"));

static ARGUMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<argument>(.*?)</argument>").expect("argument pattern"));

/// Parsed view of the server-provided launch document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub base_url: String,
    pub artifact_relative_path: String,
    /// Arguments for the viewer, in document order.
    pub launch_arguments: Vec<String>,
}

impl Descriptor {
    /// Parse a raw JNLP document.
    ///
    /// Requires exactly one `codebase` attribute, exactly one `<jar>` element
    /// and at least one `<argument>` element.
    pub fn parse(raw: &str) -> Result<Self> {
        let codebases: Vec<&str> = CODEBASE_PATTERN
            .captures_iter(raw)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        if codebases.len() != 1 {
            return Err(LaunchError::descriptor(
                "get viewer URL",
                format!("Unable to find codebase (found {})", codebases.len()),
            ));
        }

        let jars: Vec<&str> = JAR_PATTERN.find_iter(raw).map(|m| m.as_str()).collect();
        if jars.len() != 1 {
            return Err(LaunchError::descriptor(
                "get viewer URL",
                format!("Unable to find JAR element (found {})", jars.len()),
            ));
        }
        let href = HREF_PATTERN
            .captures(jars[0])
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| {
                LaunchError::descriptor("get viewer URL", "JAR element has no href attribute")
            })?;

        let launch_arguments: Vec<String> = ARGUMENT_PATTERN
            .captures_iter(raw)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect();
        if launch_arguments.is_empty() {
            return Err(LaunchError::descriptor(
                "get argument list",
                "no argument elements",
            ));
        }

        let descriptor = Self {
            base_url: codebases[0].to_string(),
            artifact_relative_path: href.to_string(),
            launch_arguments,
        };
        info!("Viewer URL: {}", descriptor.artifact_url());
        debug!("viewer arguments={:?}", descriptor.launch_arguments);
        Ok(descriptor)
    }

    /// Download URL of the viewer JAR: codebase, a `/`, then the jar's href.
    pub fn artifact_url(&self) -> String {
        format!("{}/{}", self.base_url, self.artifact_relative_path)
    }
}
