// Exit status of the `ipmiviewer` binary.

mod common;

use std::process::{Command, Stdio};

use tokio::net::TcpListener;

const BIN: &str = env!("CARGO_BIN_EXE_ipmiviewer");

fn viewer_command() -> Command {
    let mut cmd = Command::new(BIN);
    for var in [
        "IPMIVIEWER_USERNAME",
        "IPMIVIEWER_PASSWORD",
        "IPMIVIEWER_VIEWER_FILE",
        "IPMIVIEWER_JAVA",
    ] {
        cmd.env_remove(var);
    }
    cmd.stdout(Stdio::null()).stderr(Stdio::null());
    cmd
}

#[test]
fn test_missing_server_exits_1() {
    let status = viewer_command().status().unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn test_help_exits_1() {
    let status = viewer_command().arg("--help").status().unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn test_version_exits_0() {
    let status = viewer_command().arg("--version").status().unwrap();
    assert_eq!(status.code(), Some(0));
}

#[tokio::test]
async fn test_unreachable_server_exits_1() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let dir = tempfile::tempdir().unwrap();

    let status = viewer_command()
        .arg(addr.to_string())
        .arg("-f")
        .arg(dir.path().join("JViewer.jar"))
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(1));
    assert!(!dir.path().join("JViewer.jar").exists());
}

#[cfg(target_os = "linux")]
mod signals {
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::Duration;

    use super::common::{jnlp_body, login_ok_body, start_mock_bmc, JAR_BYTES, TOKEN};
    use super::BIN;

    /// Alive and not a zombie.
    fn process_alive(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => !stat.contains(") Z "),
            Err(_) => false,
        }
    }

    async fn read_pid(path: &Path) -> u32 {
        for _ in 0..500 {
            if let Ok(text) = std::fs::read_to_string(path) {
                if let Ok(pid) = text.trim().parse() {
                    return pid;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("viewer never started");
    }

    #[tokio::test]
    async fn test_sigterm_kills_viewer_and_exits_0() {
        let bmc = start_mock_bmc(
            login_ok_body(TOKEN),
            |base| jnlp_body(&format!("{}/files", base), "viewer.jar", &["host"]),
            JAR_BYTES.to_vec(),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("viewer.pid");
        let java = dir.path().join("fake-java");
        std::fs::write(
            &java,
            format!(
                "#!/bin/sh\necho $$ > '{}'\necho viewer up\nexec sleep 30\n",
                pid_file.display()
            ),
        )
        .unwrap();
        let mut perms = std::fs::metadata(&java).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&java, perms).unwrap();

        let mut launcher = tokio::process::Command::new(BIN)
            .arg(bmc.host())
            .arg("-f")
            .arg(dir.path().join("JViewer.jar"))
            .arg("--java")
            .arg(&java)
            .env_remove("IPMIVIEWER_JAVA")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .unwrap();

        let viewer_pid = read_pid(&pid_file).await;
        // Give the launcher time to see the viewer's first output.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(process_alive(viewer_pid));

        let launcher_pid = launcher.id().unwrap();
        let sent = std::process::Command::new("kill")
            .arg("-TERM")
            .arg(launcher_pid.to_string())
            .status()
            .unwrap();
        assert!(sent.success());

        let status = tokio::time::timeout(Duration::from_secs(5), launcher.wait())
            .await
            .expect("launcher did not exit after SIGTERM")
            .unwrap();
        assert_eq!(status.code(), Some(0));

        let mut gone = false;
        for _ in 0..200 {
            if !process_alive(viewer_pid) {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(gone, "viewer {} survived the shutdown", viewer_pid);
    }
}
