// Helper functions for extractor implementations

use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;

use crate::downloader::extractors::ExtractorFailure;

/// Run a command to completion, capturing stdout and stderr.
///
/// Dropping the returned future does not stop the child: once started, an
/// extraction runs to the end and its output is left for the sweeper.
pub async fn run_output(
    program: &str,
    args: &[String],
) -> Result<std::process::Output, ExtractorFailure> {
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => ExtractorFailure::Unavailable(format!("{} not found", program)),
            _ => ExtractorFailure::Unavailable(format!("Failed to start {}: {}", program, e)),
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        ExtractorFailure::Unavailable(format!("Failed to capture stdout from {}", program))
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
        ExtractorFailure::Unavailable(format!("Failed to capture stderr from {}", program))
    })?;

    // Drain both pipes concurrently so a chatty child cannot block on a full pipe
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    let status = child
        .wait()
        .await
        .map_err(|e| ExtractorFailure::Upstream(format!("Failed to wait for {}: {}", program, e)))?;

    let stdout = collect_pipe(stdout_task, "stdout").await?;
    let stderr = collect_pipe(stderr_task, "stderr").await?;

    Ok(std::process::Output {
        status,
        stdout,
        stderr,
    })
}

async fn collect_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
    name: &str,
) -> Result<Vec<u8>, ExtractorFailure> {
    task.await
        .map_err(|e| ExtractorFailure::Upstream(format!("{} task failed: {}", name, e)))?
        .map_err(|e| ExtractorFailure::Upstream(format!("Failed to read {}: {}", name, e)))
}

/// Build proxy arguments for yt-dlp
pub fn get_proxy_args(proxy: Option<&str>) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(proxy) = proxy {
        args.push("--proxy".to_string());
        args.push(proxy.to_string());
    }

    args
}

/// Build timeout arguments for yt-dlp
pub fn get_timeout_args(timeout_secs: u32) -> Vec<String> {
    vec!["--socket-timeout".to_string(), timeout_secs.to_string()]
}

/// Build cookie arguments for yt-dlp
pub fn get_cookie_args(cookies_path: Option<&str>) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(path) = cookies_path {
        args.push("--cookies".to_string());
        args.push(path.to_string());
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_optional_args() {
        assert!(get_proxy_args(None).is_empty());
        assert_eq!(
            get_proxy_args(Some("socks5://127.0.0.1:1080")),
            vec!["--proxy", "socks5://127.0.0.1:1080"]
        );
        assert_eq!(get_timeout_args(15), vec!["--socket-timeout", "15"]);
        assert!(get_cookie_args(None).is_empty());
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let res = run_output("definitely-not-a-real-binary-7f3a", &[]).await;
        assert!(matches!(res, Err(ExtractorFailure::Unavailable(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_output() {
        let args = vec!["-c".to_string(), "echo out; echo err 1>&2".to_string()];
        let out = run_output("sh", &args).await.unwrap();
        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "out");
        assert_eq!(String::from_utf8_lossy(&out.stderr).trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_abandoned_run_still_completes() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("done");
        let args = vec![
            "-c".to_string(),
            format!("sleep 0.3; echo ok > '{}'", marker.display()),
        ];

        // Caller gives up long before the child finishes
        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), run_output("sh", &args)).await;
        assert!(abandoned.is_err());

        for _ in 0..50 {
            if marker.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(marker.exists());
    }
}
