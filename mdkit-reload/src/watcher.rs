use std::{
    path::PathBuf,
    sync::mpsc::{Receiver, channel},
    time::{Duration, Instant},
};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace};

use crate::{
    config::ReloadConfig,
    error::{ReloadError, ReloadResult},
};

/// Watches the configured paths and reports changed files that match the
/// configured extensions.
pub struct ChangeWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<PathBuf>,
}

impl std::fmt::Debug for ChangeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeWatcher").finish_non_exhaustive()
    }
}

impl ChangeWatcher {
    /// Starts watching. Every watch path must exist.
    pub fn new(config: &ReloadConfig) -> ReloadResult<Self> {
        let (tx, rx) = channel();
        let filter = config.clone();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(
                event.kind,
                EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
            ) {
                return;
            }
            for path in event.paths.into_iter().filter(|p| filter.matches(p)) {
                trace!(path = %path.display(), "file changed");
                let _ = tx.send(path);
            }
        })?;

        for path in &config.watch_paths {
            if !path.exists() {
                return Err(ReloadError::MissingPath(path.clone()));
            }
            let mode = if path.is_dir() {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            watcher.watch(path, mode)?;
            debug!(path = %path.display(), "watching");
        }
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Changed files reported since the last call, without duplicates.
    pub fn drain(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.rx.try_iter().collect();
        paths.sort();
        paths.dedup();
        paths
    }
}

/// Collects changes until the tree has been quiet for a while.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_change: Option<Instant>,
    changed: Vec<PathBuf>,
}

impl Debouncer {
    /// A debouncer waiting `window` after the last change.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_change: None,
            changed: Vec::new(),
        }
    }

    /// Records changed files seen at `now`. An empty list changes nothing.
    pub fn record(&mut self, paths: Vec<PathBuf>, now: Instant) {
        if paths.is_empty() {
            return;
        }
        self.last_change = Some(now);
        for path in paths {
            if !self.changed.contains(&path) {
                self.changed.push(path);
            }
        }
    }

    /// Whether changes are waiting.
    pub fn is_pending(&self) -> bool {
        self.last_change.is_some()
    }

    /// Takes the collected changes once the quiet period has passed.
    pub fn ready(&mut self, now: Instant) -> Option<Vec<PathBuf>> {
        let last = self.last_change?;
        if now.saturating_duration_since(last) < self.window {
            return None;
        }
        self.last_change = None;
        Some(std::mem::take(&mut self.changed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_a_quiet_period() {
        let start = Instant::now();
        let ms = Duration::from_millis;
        let mut debouncer = Debouncer::new(ms(300));
        assert_eq!(debouncer.ready(start), None);

        debouncer.record(vec!["a.kv".into()], start);
        debouncer.record(vec!["b.rs".into(), "a.kv".into()], start + ms(200));
        debouncer.record(Vec::new(), start + ms(400));
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.ready(start + ms(450)), None);

        let changed = debouncer.ready(start + ms(500)).unwrap();
        assert_eq!(changed, [PathBuf::from("a.kv"), PathBuf::from("b.rs")]);
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.ready(start + ms(900)), None);
    }

    #[test]
    fn missing_watch_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReloadConfig::default().watch_paths(vec![dir.path().join("nope")]);
        let err = ChangeWatcher::new(&config).unwrap_err();
        assert!(matches!(err, ReloadError::MissingPath(_)));
    }
}
