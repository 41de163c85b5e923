//! Platform-aware discovery of the external `rsync` binary.
//!
//! Searches `PATH` first, then falls back to platform-specific locations:
//! on Windows-like hosts, the WSL and Cygwin compatibility layers; on
//! Unix-likes, the standard system bin directories and Homebrew's prefix.
//! When nothing is found, returns an installation instruction block for
//! the current platform, surfaced verbatim by the Driver's error message.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

/// Where a located tool came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolSource {
    /// Found on `PATH`.
    Path,
    /// Found at a native platform install location.
    Native,
    /// Found inside a WSL distribution.
    Wsl,
    /// Found inside a Cygwin installation.
    Cygwin,
    /// Found inside an MSYS2 installation.
    Msys2,
}

/// A located external tool.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolLocation {
    /// Absolute path to the executable.
    pub executable: PathBuf,
    /// Where it was found.
    pub source: ToolSource,
    /// Version string extracted from `--version`, if parseable.
    pub version: Option<String>,
}

/// Unix fallback locations searched after `PATH`.
const UNIX_FALLBACKS: &[&str] = &[
    "/usr/bin/rsync",
    "/usr/local/bin/rsync",
    "/opt/homebrew/bin/rsync",
    "/home/linuxbrew/.linuxbrew/bin/rsync",
];

/// Windows-host fallback locations: WSL's own `/usr/bin/rsync` as seen
/// through `wsl.exe`, then common Cygwin and MSYS2 install prefixes.
const WINDOWS_FALLBACKS: &[(&str, ToolSource)] = &[
    ("C:\\cygwin64\\bin\\rsync.exe", ToolSource::Cygwin),
    ("C:\\cygwin\\bin\\rsync.exe", ToolSource::Cygwin),
    ("C:\\msys64\\usr\\bin\\rsync.exe", ToolSource::Msys2),
];

/// Probes for the `rsync` executable.
pub struct ToolDiscovery {
    tool_name: &'static str,
}

impl Default for ToolDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolDiscovery {
    /// Build a prober for `rsync`.
    #[must_use]
    pub const fn new() -> Self {
        Self { tool_name: "rsync" }
    }

    /// Locate the tool, trying `PATH` then platform fallbacks.
    pub async fn locate(&self) -> Option<ToolLocation> {
        if let Ok(path) = which::which(self.tool_name) {
            let version = Self::query_version(&path).await;
            return Some(ToolLocation {
                executable: path,
                source: ToolSource::Path,
                version,
            });
        }

        if cfg!(target_os = "windows") {
            if let Some(location) = self.locate_via_wsl().await {
                return Some(location);
            }
            for (candidate, source) in WINDOWS_FALLBACKS {
                let path = PathBuf::from(candidate);
                if path.exists() {
                    let version = Self::query_version(&path).await;
                    return Some(ToolLocation {
                        executable: path,
                        source: *source,
                        version,
                    });
                }
            }
        } else {
            for candidate in UNIX_FALLBACKS {
                let path = PathBuf::from(candidate);
                if path.exists() {
                    let version = Self::query_version(&path).await;
                    return Some(ToolLocation {
                        executable: path,
                        source: ToolSource::Native,
                        version,
                    });
                }
            }
        }

        None
    }

    async fn locate_via_wsl(&self) -> Option<ToolLocation> {
        let output = Command::new("wsl.exe")
            .args(["which", self.tool_name])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let path_in_wsl = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if path_in_wsl.is_empty() {
            return None;
        }

        let version = Command::new("wsl.exe")
            .args([self.tool_name, "--version"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .ok()
            .and_then(|out| extract_version(&String::from_utf8_lossy(&out.stdout)));

        Some(ToolLocation {
            executable: PathBuf::from(path_in_wsl),
            source: ToolSource::Wsl,
            version,
        })
    }

    async fn query_version(executable: &std::path::Path) -> Option<String> {
        let output = Command::new(executable)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .ok()?;
        extract_version(&String::from_utf8_lossy(&output.stdout))
    }

    /// Installation instructions for the current platform, shown when
    /// discovery fails entirely.
    #[must_use]
    pub fn install_instructions(&self) -> String {
        if cfg!(target_os = "macos") {
            format!(
                "{} not found. Install it with Homebrew: brew install rsync",
                self.tool_name
            )
        } else if cfg!(target_os = "windows") {
            format!(
                "{} not found. Install the Windows Subsystem for Linux (wsl --install) \
                 and run 'sudo apt install rsync' inside it, or install Cygwin with the \
                 rsync package selected.",
                self.tool_name
            )
        } else {
            format!(
                "{} not found. Install it with your distribution's package manager, \
                 e.g. 'sudo apt install rsync', 'sudo dnf install rsync', or \
                 'sudo pacman -S rsync'.",
                self.tool_name
            )
        }
    }
}

/// Extract the first `N.N.N`-shaped token from rsync's `--version` banner.
fn extract_version(banner: &str) -> Option<String> {
    let first_line = banner.lines().next()?;
    first_line.split_whitespace().find_map(|token| {
        let digits_and_dots = token
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.')
            && token.chars().any(|c| c.is_ascii_digit())
            && token.contains('.');
        digits_and_dots.then(|| token.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_version_from_typical_banner() {
        let banner = "rsync  version 3.2.7  protocol version 31\nCopyright (C) 1996-2022";
        assert_eq!(extract_version(banner), Some("3.2.7".to_string()));
    }

    #[test]
    fn returns_none_for_version_free_banner() {
        let banner = "rsync helper utility\nno version here";
        assert_eq!(extract_version(banner), None);
    }

    #[test]
    fn install_instructions_are_non_empty() {
        let discovery = ToolDiscovery::new();
        assert!(!discovery.install_instructions().is_empty());
    }
}
