//! Platform process enumeration collaborator.
//!
//! The lister is invoked as program + argument vector (no shell) and returns
//! raw tabular text; all parsing happens here.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tokio::time::timeout;

use crate::DetectError;

static RE_APP_BUNDLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/([^/]+)\.app").unwrap());
static RE_EXECUTABLE_EXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(exe|app)$").unwrap());

#[cfg(not(windows))]
pub(crate) async fn list_processes(limit: Duration) -> Result<String, DetectError> {
    let mut cmd = Command::new("ps");
    cmd.args(["-eo", "comm"]);
    run_lister(cmd, limit).await
}

#[cfg(windows)]
pub(crate) async fn list_processes(limit: Duration) -> Result<String, DetectError> {
    let mut cmd = Command::new("wmic");
    cmd.args(["process", "get", "Name", "/format:csv"]);
    run_lister(cmd, limit).await
}

async fn run_lister(mut cmd: Command, limit: Duration) -> Result<String, DetectError> {
    let output = timeout(limit, cmd.kill_on_drop(true).output())
        .await
        .map_err(|_| DetectError::Timeout(limit))?
        .map_err(DetectError::Spawn)?;

    if !output.status.success() {
        return Err(DetectError::Failed(output.status));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(not(windows))]
pub(crate) fn parse_process_output(raw: &str) -> Vec<String> {
    parse_ps(raw)
}

#[cfg(windows)]
pub(crate) fn parse_process_output(raw: &str) -> Vec<String> {
    parse_windows_csv(raw)
}

/// `ps -eo comm`: one command path per line, plus a header row.
fn parse_ps(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains("COMM"))
        .map(extract_app_name)
        .filter(|name| !name.is_empty())
        .collect()
}

/// `wmic process get Name /format:csv`: `Node,Name` rows with a header.
#[cfg_attr(not(windows), allow(dead_code))]
fn parse_windows_csv(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| line.contains(',') && !line.contains("Name"))
        .filter_map(|line| line.split(',').nth(1))
        .filter(|name| !name.is_empty())
        .map(extract_app_name)
        .collect()
}

/// Extract a clean display name from a process path.
///
/// macOS bundle executables report their full path; the app name is either
/// the segment after `.app/Contents/MacOS/` or the `.app` directory name.
fn extract_app_name(process_path: &str) -> String {
    if let Some((_, executable)) = process_path.split_once(".app/Contents/MacOS/") {
        if !executable.is_empty() {
            return executable.to_string();
        }
    }

    if let Some(caps) = RE_APP_BUNDLE.captures(process_path) {
        return caps[1].to_string();
    }

    RE_EXECUTABLE_EXT.replace(process_path, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bundle_executable_name() {
        assert_eq!(
            extract_app_name("/Applications/Safari.app/Contents/MacOS/Safari"),
            "Safari"
        );
    }

    #[test]
    fn extracts_app_directory_name() {
        assert_eq!(
            extract_app_name("/Applications/Visual Studio Code.app/Contents/Frameworks/helper"),
            "Visual Studio Code"
        );
    }

    #[test]
    fn strips_executable_extensions() {
        assert_eq!(extract_app_name("notepad.exe"), "notepad");
        assert_eq!(extract_app_name("Notepad.EXE"), "Notepad");
        assert_eq!(extract_app_name("plain-binary"), "plain-binary");
    }

    #[test]
    fn parse_ps_skips_header_and_blank_lines() {
        let raw = "COMM\n/usr/sbin/syslogd\n/Applications/Figma.app/Contents/MacOS/Figma\n\n";
        let names = parse_ps(raw);
        assert_eq!(names, vec!["/usr/sbin/syslogd".to_string(), "Figma".to_string()]);
    }

    #[test]
    fn parse_windows_csv_takes_name_column() {
        let raw = "Node,Name\r\nHOST,chrome.exe\r\nHOST,code.exe\r\n";
        let names = parse_windows_csv(raw);
        assert_eq!(names, vec!["chrome".to_string(), "code".to_string()]);
    }
}
