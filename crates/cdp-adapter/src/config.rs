use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};
use which::which;

/// Configuration for launching Chromium and tuning the session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CdpConfig {
    pub executable: PathBuf,
    pub user_data_dir: PathBuf,
    pub headless: bool,
    pub no_sandbox: bool,
    pub default_deadline_ms: u64,
    pub window_width: u32,
    pub window_height: u32,
    /// Visible text longer than this is truncated during extraction.
    pub max_text_len: usize,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            executable: default_chrome_path(),
            user_data_dir: default_profile_dir(),
            headless: resolve_headless_default(),
            no_sandbox: false,
            default_deadline_ms: 30_000,
            window_width: 1280,
            window_height: 800,
            max_text_len: 50,
        }
    }
}

fn resolve_headless_default() -> bool {
    // "0", "false", "no", "off" means headful
    match env::var("WEBPROBE_HEADLESS") {
        Ok(value) => parse_headless(&value),
        Err(_) => true,
    }
}

pub(crate) fn parse_headless(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    !matches!(lower.as_str(), "0" | "false" | "no" | "off")
}

fn default_chrome_path() -> PathBuf {
    detect_chrome_executable().unwrap_or_default()
}

fn default_profile_dir() -> PathBuf {
    if let Ok(path) = env::var("WEBPROBE_CHROME_PROFILE") {
        return PathBuf::from(path);
    }

    let default = Path::new("./.webprobe-profile");
    default.into()
}

/// Locate a Chromium-family binary: `WEBPROBE_CHROME`, then `PATH`, then
/// well-known install locations (unless `WEBPROBE_SKIP_OS_PATHS` is set).
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("WEBPROBE_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    let skip_defaults = env::var("WEBPROBE_SKIP_OS_PATHS")
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);

    if !skip_defaults {
        for candidate in os_specific_chrome_paths() {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

pub(crate) fn resolve_chrome_path(cfg: &CdpConfig) -> Option<PathBuf> {
    if !cfg.executable.as_os_str().is_empty() && cfg.executable.exists() {
        return Some(cfg.executable.clone());
    }
    detect_chrome_executable()
}

pub(crate) fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(any(target_os = "macos", target_os = "linux", target_os = "freebsd"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }

    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "linux",
        target_os = "freebsd"
    )))]
    {
        &["chrome"]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let mut paths = Vec::new();
        for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
            if let Ok(value) = env::var(key) {
                let root = PathBuf::from(value.trim());
                paths.push(root.join("Google/Chrome/Application/chrome.exe"));
                paths.push(root.join("Chromium/Application/chrome.exe"));
                paths.push(root.join("Microsoft/Edge/Application/msedge.exe"));
            }
        }
        paths
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }

    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "linux",
        target_os = "freebsd"
    )))]
    {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    fn restore(key: &str, value: Option<String>) {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }

    #[test]
    #[serial]
    fn detects_from_env_var() {
        let dir = tempdir().unwrap();
        let exe_path = dir.path().join("my-chrome");
        fs::write(&exe_path, b"").unwrap();
        let original = env::var("WEBPROBE_CHROME").ok();
        env::set_var("WEBPROBE_CHROME", exe_path.to_string_lossy().to_string());
        let detected = detect_chrome_executable();
        restore("WEBPROBE_CHROME", original);
        assert_eq!(detected, Some(exe_path));
    }

    #[test]
    #[serial]
    fn detects_from_path_entries() {
        let dir = tempdir().unwrap();
        let name = chrome_executable_names()
            .first()
            .expect("chrome executable names must not be empty");
        let exe_path = dir.path().join(name);
        fs::write(&exe_path, b"").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&exe_path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        let original_path = env::var("PATH").ok();
        let original_env = env::var("WEBPROBE_CHROME").ok();
        let skip_flag = env::var("WEBPROBE_SKIP_OS_PATHS").ok();
        env::set_var("WEBPROBE_CHROME", "");
        env::set_var("WEBPROBE_SKIP_OS_PATHS", "1");
        env::set_var("PATH", dir.path());
        let detected = detect_chrome_executable();
        restore("PATH", original_path);
        restore("WEBPROBE_CHROME", original_env);
        restore("WEBPROBE_SKIP_OS_PATHS", skip_flag);
        assert_eq!(detected, Some(exe_path));
    }

    #[test]
    fn headless_flag_parsing() {
        assert!(parse_headless("1"));
        assert!(parse_headless("yes"));
        assert!(!parse_headless("OFF"));
        assert!(!parse_headless(" false "));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg: CdpConfig = serde_json::from_str(r#"{"headless": false, "max_text_len": 80}"#)
            .unwrap();
        assert!(!cfg.headless);
        assert_eq!(cfg.max_text_len, 80);
        assert_eq!(cfg.window_width, 1280);
    }
}
