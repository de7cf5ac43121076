//! Browser windows for browser-window items
//!
//! Each window is its own browser process in app mode with a per-key profile
//! directory, so closing the window ends the process and we can report it.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::{ControllerEvent, WindowHandle};
use crate::geometry::WindowGeometry;
use crate::menu::WindowKey;

pub struct BrowserLauncher {
    program: String,
    profiles_dir: PathBuf,
    events: UnboundedSender<ControllerEvent>,
}

impl BrowserLauncher {
    pub fn new(
        program: impl Into<String>,
        profiles_dir: impl Into<PathBuf>,
        events: UnboundedSender<ControllerEvent>,
    ) -> Self {
        Self {
            program: program.into(),
            profiles_dir: profiles_dir.into(),
            events,
        }
    }

    /// Start a browser process for `key` and report `WindowClosed` when it exits
    pub fn launch(
        &self,
        key: &WindowKey,
        url: &str,
        geometry: WindowGeometry,
    ) -> Result<WindowHandle> {
        let profile = self.profiles_dir.join(profile_dir_name(key));
        std::fs::create_dir_all(&profile).context(format!(
            "Failed to create browser profile dir {}",
            profile.display()
        ))?;

        let mut child = Command::new(&self.program)
            .args(window_args(url, geometry, &profile))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context(format!("Failed to launch browser '{}'", self.program))?;
        let pid = child.id();
        info!(key = %key, pid = ?pid, url = %url, "Launched browser window");

        let handle = WindowHandle {
            key: key.clone(),
            pid,
        };
        let events = self.events.clone();
        let closed = handle.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!(key = %closed.key, %status, "Browser window exited"),
                Err(e) => warn!(key = %closed.key, error = %e, "Failed to wait for browser window"),
            }
            // Receiver is gone during shutdown
            let _ = events.send(ControllerEvent::WindowClosed(closed));
        });

        Ok(handle)
    }
}

/// Whether the process behind a window is still running
pub fn is_running(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

fn profile_dir_name(key: &WindowKey) -> String {
    key.as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn window_args(url: &str, geometry: WindowGeometry, profile: &Path) -> Vec<String> {
    let mut args = vec![
        format!("--app={url}"),
        format!("--user-data-dir={}", profile.display()),
        "--no-first-run".to_string(),
        format!("--window-size={},{}", geometry.width, geometry.height),
    ];
    if geometry.x.is_some() || geometry.y.is_some() {
        args.push(format!(
            "--window-position={},{}",
            geometry.x.unwrap_or(0),
            geometry.y.unwrap_or(0)
        ));
    }
    if geometry.fullscreen {
        args.push("--start-fullscreen".to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SizeAlias, WindowSize};
    use crate::geometry::ScreenSize;

    #[test]
    fn test_default_window_args() {
        let geometry = WindowGeometry::resolve(None, ScreenSize::default());
        let args = window_args("https://example.com", geometry, Path::new("/tmp/p"));
        assert_eq!(
            args,
            vec![
                "--app=https://example.com",
                "--user-data-dir=/tmp/p",
                "--no-first-run",
                "--window-size=1024,728",
            ]
        );
    }

    #[test]
    fn test_fullscreen_window_args() {
        let geometry = WindowGeometry::resolve(
            Some(&WindowSize::Alias(SizeAlias::Fullscreen)),
            ScreenSize {
                width: 1920,
                height: 1080,
            },
        );
        let args = window_args("u", geometry, Path::new("/p"));
        assert!(args.contains(&"--window-position=0,0".to_string()));
        assert!(args.contains(&"--window-size=1920,1080".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--start-fullscreen"));
    }

    #[test]
    fn test_profile_dir_name_is_path_safe() {
        assert_eq!(profile_dir_name(&WindowKey::new("0.2.1")), "0_2_1");
        assert_eq!(profile_dir_name(&WindowKey::new("../docs")), "___docs");
        assert_eq!(profile_dir_name(&WindowKey::new("my-docs")), "my-docs");
    }

    #[tokio::test]
    async fn test_exit_reports_window_closed() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        // `true` ignores its arguments and exits at once
        let launcher = BrowserLauncher::new("true", dir.path(), tx);
        let key = WindowKey::new("docs");

        let geometry = WindowGeometry::resolve(None, ScreenSize::default());
        let handle = launcher.launch(&key, "https://example.com", geometry).unwrap();
        assert_eq!(handle.key, key);
        assert!(handle.pid.is_some());
        assert!(dir.path().join("docs").is_dir());
        assert_eq!(rx.recv().await, Some(ControllerEvent::WindowClosed(handle)));
    }

    #[tokio::test]
    async fn test_missing_browser_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let launcher = BrowserLauncher::new("/nonexistent/browser", dir.path(), tx);
        let result = launcher.launch(
            &WindowKey::new("x"),
            "u",
            WindowGeometry::resolve(None, ScreenSize::default()),
        );
        assert!(result.is_err());
    }
}
