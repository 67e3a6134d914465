use std::path::PathBuf;
use std::time::Duration;

/// Login endpoint of the BMC web interface.
pub const LOGIN_PATH: &str = "/rpc/WEBSES/create.asp";

/// Path of the JViewer launch descriptor (JNLP).
pub const DESCRIPTOR_PATH: &str = "/Java/jviewer.jnlp";

/// Cookie name the BMC expects the session token under.
pub const SESSION_COOKIE_NAME: &str = "SessionCookie";

/// Timeout applied to every request against the management API (2.5 s).
pub const REQUEST_TIMEOUT_MS: u64 = 2500;

/// `HAPI_STATUS` value the BMC reports on a successful login.
pub const LOGIN_SUCCESS_STATUS: u32 = 0;

pub const DEFAULT_USERNAME: &str = "ADMIN";
pub const DEFAULT_PASSWORD: &str = "admin";

/// File name the viewer JAR is cached under when none is given.
pub const DEFAULT_VIEWER_FILE: &str = "JViewer.jar";

/// Runtime used to launch the viewer JAR.
pub const DEFAULT_JAVA: &str = "java";

/// How long to keep forwarding output after the viewer exits. A descendant
/// still holding the pipes open is cut off after this.
pub const OUTPUT_DRAIN_GRACE_MS: u64 = 1000;

/// Prefix for forwarded child stdout.
pub const STDOUT_LABEL: &str = "Viewer STDOUT: ";

/// Prefix for forwarded child stderr.
pub const STDERR_LABEL: &str = "Viewer STDERR: ";

/// Prefix for process-level errors reported while supervising the child.
pub const ERROR_LABEL: &str = "Viewer Error: ";

/// Immutable context for a single launcher run.
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Target BMC: `host`, `host:port` or a full `http://` base URL.
    pub host: String,
    pub username: String,
    pub password: String,
    /// Local path of the cached viewer JAR.
    pub viewer_file: PathBuf,
    /// Re-download the JAR even if a copy exists.
    pub force_download: bool,
    /// Runtime executable the JAR is launched with.
    pub java: PathBuf,
    /// Timeout for the login and descriptor requests.
    pub request_timeout: Duration,
}

impl LaunchConfig {
    /// Base URL every management API path is resolved against.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            viewer_file: PathBuf::from(DEFAULT_VIEWER_FILE),
            force_download: false,
            java: PathBuf::from(DEFAULT_JAVA),
            request_timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
        }
    }
}
