// Retention sweeper - periodic removal of expired artifacts
//
// Age is taken from the file modification time. Files that can't be
// inspected or deleted are logged and left for the next pass.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of one pass over the storage directory
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    dir: PathBuf,
    max_age: Duration,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration, interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
            interval,
        }
    }

    /// Delete every regular file last modified more than `max_age` before `now`.
    pub async fn sweep_once(&self, now: SystemTime) -> SweepReport {
        let mut report = SweepReport::default();

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(dir = %self.dir.display(), "could not read storage directory: {error}");
                return report;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(error) => {
                    warn!("could not read storage directory entry: {error}");
                    report.failed += 1;
                    break;
                }
            };

            let path = entry.path();
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(error) => {
                    warn!(path = %path.display(), "could not inspect file: {error}");
                    report.failed += 1;
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }
            report.scanned += 1;

            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(error) => {
                    warn!(path = %path.display(), "no modification time: {error}");
                    report.failed += 1;
                    continue;
                }
            };

            // Clock skew puts mtime in the future; treat that as fresh
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= self.max_age {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), age_secs = age.as_secs(), "removed expired artifact");
                    report.removed += 1;
                }
                Err(error) => {
                    warn!(path = %path.display(), "could not remove expired artifact: {error}");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Sweep immediately, then every `interval`, until `token` is cancelled.
    pub async fn run(self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            dir = %self.dir.display(),
            max_age_secs = self.max_age.as_secs(),
            interval_secs = self.interval.as_secs(),
            "retention sweeper started"
        );

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.sweep_once(SystemTime::now()).await;
                    if report.removed > 0 || report.failed > 0 {
                        info!(
                            scanned = report.scanned,
                            removed = report.removed,
                            failed = report.failed,
                            "retention sweep finished"
                        );
                    }
                }
            }
        }

        info!("retention sweeper stopped");
    }

    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);
    const MINUTE: Duration = Duration::from_secs(60);

    fn write_aged(dir: &Path, name: &str, age: Duration, now: SystemTime) {
        let path = dir.join(name);
        fs::write(&path, b"data").unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(now - age).unwrap();
    }

    #[tokio::test]
    async fn test_removes_only_expired_files() {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        write_aged(dir.path(), "aaaa1111_fresh.mp4", 59 * MINUTE, now);
        write_aged(dir.path(), "bbbb2222_stale.mp4", 61 * MINUTE, now);

        let sweeper = RetentionSweeper::new(dir.path(), HOUR, 10 * MINUTE);
        let report = sweeper.sweep_once(now).await;

        assert_eq!(
            report,
            SweepReport {
                scanned: 2,
                removed: 1,
                failed: 0
            }
        );
        assert!(dir.path().join("aaaa1111_fresh.mp4").exists());
        assert!(!dir.path().join("bbbb2222_stale.mp4").exists());
    }

    #[tokio::test]
    async fn test_leaves_directories_alone() {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        fs::create_dir(dir.path().join("nested")).unwrap();
        write_aged(dir.path(), "cccc3333_old.mp3", 2 * HOUR, now);

        let report = RetentionSweeper::new(dir.path(), HOUR, MINUTE)
            .sweep_once(now)
            .await;

        assert_eq!(report.removed, 1);
        assert!(dir.path().join("nested").is_dir());
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let sweeper = RetentionSweeper::new(dir.path().join("gone"), HOUR, MINUTE);
        assert_eq!(sweeper.sweep_once(SystemTime::now()).await, SweepReport::default());
    }

    #[tokio::test]
    async fn test_run_sweeps_at_start_and_stops_on_cancel() {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        write_aged(dir.path(), "dddd4444_old.mp4", 2 * HOUR, now);

        let token = CancellationToken::new();
        let handle = RetentionSweeper::new(dir.path(), HOUR, HOUR).spawn(token.clone());

        let stale = dir.path().join("dddd4444_old.mp4");
        for _ in 0..50 {
            if !stale.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!stale.exists());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
