use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use tracing::info;

use ipmi_viewer::config::{
    LaunchConfig, DEFAULT_JAVA, DEFAULT_PASSWORD, DEFAULT_USERNAME, DEFAULT_VIEWER_FILE,
    REQUEST_TIMEOUT_MS,
};

#[derive(Debug, Parser)]
#[command(
    name = "ipmiviewer",
    version,
    about = "Log into a BMC web interface and launch its Java KVM viewer locally"
)]
pub struct Cli {
    /// BMC to connect to: host, host:port or http://host.
    pub server: String,

    /// Username to use for authentication (the default is ADMIN).
    #[arg(short, long, env = "IPMIVIEWER_USERNAME")]
    pub username: Option<String>,

    /// Password to use for authentication (the default is admin).
    #[arg(short, long, env = "IPMIVIEWER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Always download the viewer JAR, even if a copy exists already.
    #[arg(short = 'd', long, visible_alias = "alwaysDownload")]
    pub always_download: bool,

    /// File name of the viewer JAR.
    #[arg(
        short = 'f',
        long,
        visible_alias = "viewerFile",
        env = "IPMIVIEWER_VIEWER_FILE",
        default_value = DEFAULT_VIEWER_FILE
    )]
    pub viewer_file: PathBuf,

    /// Java runtime used to start the viewer.
    #[arg(long, env = "IPMIVIEWER_JAVA", default_value = DEFAULT_JAVA)]
    pub java: PathBuf,
}

impl TryFrom<Cli> for LaunchConfig {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let host = cli.server.trim().to_string();
        if host.is_empty() {
            bail!("server must not be empty");
        }

        let username = cli.username.unwrap_or_else(|| {
            info!("Using the default username: {}", DEFAULT_USERNAME);
            DEFAULT_USERNAME.to_string()
        });
        let password = cli.password.unwrap_or_else(|| {
            info!("Using the default password");
            DEFAULT_PASSWORD.to_string()
        });

        Ok(LaunchConfig {
            host,
            username,
            password,
            viewer_file: cli.viewer_file,
            force_download: cli.always_download,
            java: cli.java,
            request_timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let cli = Cli::try_parse_from(["ipmiviewer", "10.0.0.5"]).unwrap();
        let config = LaunchConfig::try_from(cli).unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.username, "ADMIN");
        assert_eq!(config.password, "admin");
        assert_eq!(config.viewer_file, PathBuf::from("JViewer.jar"));
        assert!(!config.force_download);
    }

    #[test]
    fn test_all_options() {
        let cli = Cli::try_parse_from([
            "ipmiviewer", "bmc.lan", "-u", "root", "-p", "calvin", "-d", "-f", "kvm.jar",
        ])
        .unwrap();
        let config = LaunchConfig::try_from(cli).unwrap();
        assert_eq!(config.username, "root");
        assert_eq!(config.password, "calvin");
        assert!(config.force_download);
        assert_eq!(config.viewer_file, PathBuf::from("kvm.jar"));
    }

    #[test]
    fn test_legacy_long_names() {
        let cli = Cli::try_parse_from([
            "ipmiviewer",
            "bmc.lan",
            "--alwaysDownload",
            "--viewerFile",
            "v.jar",
        ])
        .unwrap();
        assert!(cli.always_download);
        assert_eq!(cli.viewer_file, PathBuf::from("v.jar"));
    }

    #[test]
    fn test_missing_server_is_error() {
        assert!(Cli::try_parse_from(["ipmiviewer"]).is_err());
    }

    #[test]
    fn test_blank_server_rejected() {
        let cli = Cli::try_parse_from(["ipmiviewer", "  "]).unwrap();
        assert!(LaunchConfig::try_from(cli).is_err());
    }
}
