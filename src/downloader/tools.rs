use serde::Serialize;
use std::process::Command;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ToolType {
    /// Native yt-dlp binary
    YtDlp,
    /// Python interpreter with the yt_dlp module
    PythonYtDlp,
    /// Needed for audio transcoding and video+audio merges
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::PythonYtDlp => "python-yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

/// Locates the external programs the extractor relies on
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    ytdlp_override: Option<String>,
    python_override: Option<String>,
}

impl ToolManager {
    pub fn new(ytdlp_override: Option<String>, python_override: Option<String>) -> Self {
        Self {
            ytdlp_override,
            python_override,
        }
    }

    /// yt-dlp binary to run: explicit path, a common install location, or PATH
    pub fn ytdlp_path(&self) -> String {
        if let Some(path) = &self.ytdlp_override {
            return path.clone();
        }

        self.detect_binary("yt-dlp")
            .unwrap_or_else(|| "yt-dlp".to_string())
    }

    /// Python interpreter: explicit path, `YTDLP_PYTHON`, or python3
    pub fn python_path(&self) -> String {
        if let Some(path) = &self.python_override {
            return path.clone();
        }

        // Allow overriding python interpreter (e.g. venv)
        std::env::var("YTDLP_PYTHON").unwrap_or_else(|_| "python3".to_string())
    }

    pub fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let (path, version) = match tool_type {
            ToolType::YtDlp => {
                let path = self.ytdlp_path();
                let version = self.get_version(&path, &["--version"]);
                (version.as_ref().map(|_| path), version)
            }
            ToolType::PythonYtDlp => {
                let python = self.python_path();
                let version = self.get_version(
                    &python,
                    &["-c", "import yt_dlp.version; print(yt_dlp.version.__version__)"],
                );
                (version.as_ref().map(|_| python), version)
            }
            ToolType::Ffmpeg => {
                let path = self
                    .detect_binary("ffmpeg")
                    .unwrap_or_else(|| "ffmpeg".to_string());
                let version = self
                    .get_version(&path, &["-version"])
                    .and_then(|v| v.lines().next().map(str::to_string));
                (version.as_ref().map(|_| path), version)
            }
        };

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            is_available: path.is_some(),
            version,
            path,
        }
    }

    pub fn get_all_tools(&self) -> Vec<ToolInfo> {
        vec![
            self.get_tool_info(ToolType::YtDlp),
            self.get_tool_info(ToolType::PythonYtDlp),
            self.get_tool_info(ToolType::Ffmpeg),
        ]
    }

    /// Log what is installed; missing tools only degrade some requests
    pub fn log_status(&self) -> Vec<ToolInfo> {
        let tools = self.get_all_tools();

        for tool in &tools {
            match (&tool.path, &tool.version) {
                (Some(path), Some(version)) => {
                    info!(tool = %tool.name, path = %path, version = %version, "tool available")
                }
                _ => warn!(tool = %tool.name, "tool not found"),
            }
        }

        if !tools
            .iter()
            .any(|t| t.is_available && t.tool_type != ToolType::Ffmpeg)
        {
            warn!("no yt-dlp backend installed, downloads will fail until one is");
        }

        tools
    }

    fn detect_binary(&self, binary_name: &str) -> Option<String> {
        // 1. Try common paths first
        let common_paths = [
            format!("/opt/homebrew/bin/{}", binary_name),
            format!("/usr/local/bin/{}", binary_name),
            format!("/usr/bin/{}", binary_name),
        ];

        for path in common_paths {
            if std::path::Path::new(&path).exists() {
                return Some(path);
            }
        }

        // 2. Try PATH
        if let Ok(output) = Command::new("which").arg(binary_name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(path);
                }
            }
        }

        None
    }

    fn get_version(&self, program: &str, args: &[&str]) -> Option<String> {
        match Command::new(program).args(args).output() {
            Ok(output) if output.status.success() => {
                let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if out.is_empty() {
                    None
                } else {
                    Some(out)
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_paths_win() {
        let manager = ToolManager::new(
            Some("/custom/yt-dlp".to_string()),
            Some("/venv/bin/python".to_string()),
        );
        assert_eq!(manager.ytdlp_path(), "/custom/yt-dlp");
        assert_eq!(manager.python_path(), "/venv/bin/python");
    }

    #[test]
    fn test_missing_tool_reported_unavailable() {
        let manager = ToolManager::new(Some("/nonexistent/yt-dlp-7f3a".to_string()), None);
        let info = manager.get_tool_info(ToolType::YtDlp);
        assert!(!info.is_available);
        assert!(info.path.is_none());
        assert_eq!(info.name, "yt-dlp");
    }
}
