use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    path::PathBuf,
    sync::{
        Arc,
        mpsc::{Receiver, TryRecvError, channel},
    },
    thread,
    time::Instant,
};

use anyhow::anyhow;
use mdkit_components::context::BuildContext;
use mdkit_ui::Widget;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::ReloadConfig,
    error::{ReloadError, ReloadResult},
    watcher::{ChangeWatcher, Debouncer},
};

type PrepareFn<P> = dyn Fn(&[PathBuf]) -> anyhow::Result<P> + Send + Sync;
type MountFn<P> = dyn FnMut(&BuildContext, P) -> anyhow::Result<Widget>;
type WorkerResult<P> = thread::Result<anyhow::Result<P>>;

/// Counters of a harness, shared with its workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadStats {
    /// Rebuilds started.
    pub generation: u64,
    /// Rebuilds that replaced the root.
    pub reloads: u64,
    /// Rebuilds that failed or timed out.
    pub failures: u64,
    /// Prepare workers still running, including abandoned ones.
    pub running_workers: usize,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

/// Result of one rebuild.
#[derive(Debug)]
pub enum ReloadOutcome {
    /// The root was replaced.
    Reloaded {
        /// Rebuild number.
        generation: u64,
        /// Files whose change triggered the rebuild.
        changed: Vec<PathBuf>,
    },
    /// The old root stays.
    Failed(ReloadError),
}

impl ReloadOutcome {
    /// Whether the root was replaced.
    pub fn is_reloaded(&self) -> bool {
        matches!(self, Self::Reloaded { .. })
    }
}

struct InFlight<P> {
    generation: u64,
    started: Instant,
    changed: Vec<PathBuf>,
    rx: Receiver<WorkerResult<P>>,
}

/// Rebuilds the application root when watched files change.
///
/// The harness lives on the GUI thread; call [`ReloadHarness::poll`] from the
/// frame loop or a clock interval.
pub struct ReloadHarness<P> {
    config: ReloadConfig,
    ctx: BuildContext,
    prepare: Arc<PrepareFn<P>>,
    mount: Box<MountFn<P>>,
    root: Option<Widget>,
    watcher: Option<ChangeWatcher>,
    debouncer: Debouncer,
    in_flight: Option<InFlight<P>>,
    stats: Arc<Mutex<ReloadStats>>,
}

impl<P> std::fmt::Debug for ReloadHarness<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadHarness")
            .field("config", &self.config)
            .field("root", &self.root)
            .field("stats", &*self.stats.lock())
            .finish_non_exhaustive()
    }
}

impl<P: Send + 'static> ReloadHarness<P> {
    /// Creates a harness. Nothing is built until [`ReloadHarness::reload`] or
    /// the first change seen by [`ReloadHarness::poll`].
    pub fn new(
        config: ReloadConfig,
        ctx: BuildContext,
        prepare: impl Fn(&[PathBuf]) -> anyhow::Result<P> + Send + Sync + 'static,
        mount: impl FnMut(&BuildContext, P) -> anyhow::Result<Widget> + 'static,
    ) -> Self {
        let debouncer = Debouncer::new(config.debounce());
        Self {
            config,
            ctx,
            prepare: Arc::new(prepare),
            mount: Box::new(mount),
            root: None,
            watcher: None,
            debouncer,
            in_flight: None,
            stats: Arc::new(Mutex::new(ReloadStats::default())),
        }
    }

    /// Starts the file watcher.
    pub fn watch(&mut self) -> ReloadResult<()> {
        self.watcher = Some(ChangeWatcher::new(&self.config)?);
        info!(paths = ?self.config.watch_paths, "hot reload watching");
        Ok(())
    }

    /// Current root, once a rebuild succeeded.
    pub fn root(&self) -> Option<&Widget> {
        self.root.as_ref()
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> ReloadStats {
        self.stats.lock().clone()
    }

    /// Whether a prepare worker is being waited for.
    pub fn is_building(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Reports changed files from outside the watcher, e.g. dropped files.
    pub fn notify_changed(&mut self, paths: Vec<PathBuf>) {
        self.debouncer.record(paths, Instant::now());
    }

    /// Rebuilds now and waits for the result, up to the build timeout.
    pub fn reload(&mut self) -> ReloadResult<u64> {
        self.in_flight = None;
        let flight = self.spawn(Vec::new())?;
        let result = flight.rx.recv_timeout(self.config.build_timeout());
        let outcome = match result {
            Ok(result) => self.finish(flight.generation, result, flight.changed),
            Err(_) => self.fail(ReloadError::Timeout(self.config.build_timeout())),
        };
        match outcome {
            ReloadOutcome::Reloaded { generation, .. } => Ok(generation),
            ReloadOutcome::Failed(err) => Err(err),
        }
    }

    /// Collects changes, starts a rebuild once they settle and applies a
    /// finished one. Returns the outcome of a rebuild that ended during this
    /// call.
    pub fn poll(&mut self) -> Option<ReloadOutcome> {
        let now = Instant::now();
        if let Some(watcher) = &self.watcher {
            self.debouncer.record(watcher.drain(), now);
        }
        if self.debouncer.is_pending()
            && let Some(stale) = self.in_flight.take()
        {
            debug!(generation = stale.generation, "abandoning rebuild for newer changes");
        }

        if let Some(flight) = self.in_flight.take() {
            return match flight.rx.try_recv() {
                Ok(result) => Some(self.finish(flight.generation, result, flight.changed)),
                Err(TryRecvError::Empty)
                    if flight.started.elapsed() < self.config.build_timeout() =>
                {
                    self.in_flight = Some(flight);
                    None
                }
                Err(TryRecvError::Empty) => {
                    Some(self.fail(ReloadError::Timeout(self.config.build_timeout())))
                }
                Err(TryRecvError::Disconnected) => Some(self.fail(ReloadError::WorkerPanicked)),
            };
        }

        let changed = self.debouncer.ready(now)?;
        match self.spawn(changed) {
            Ok(flight) => {
                self.in_flight = Some(flight);
                None
            }
            Err(err) => Some(self.fail(err)),
        }
    }

    fn spawn(&mut self, changed: Vec<PathBuf>) -> ReloadResult<InFlight<P>> {
        let generation = {
            let mut stats = self.stats.lock();
            stats.generation += 1;
            stats.generation
        };
        debug!(generation, changed = changed.len(), "starting rebuild");
        let (tx, rx) = channel();
        let prepare = self.prepare.clone();
        let stats = self.stats.clone();
        let input = changed.clone();
        stats.lock().running_workers += 1;
        let spawned = thread::Builder::new()
            .name(format!("mdkit-reload-{generation}"))
            .spawn(move || {
                let result = catch_unwind(AssertUnwindSafe(|| prepare(&input)));
                stats.lock().running_workers -= 1;
                let _ = tx.send(result);
            });
        if let Err(err) = spawned {
            self.stats.lock().running_workers -= 1;
            return Err(ReloadError::Prepare(anyhow!("failed to start worker: {err}")));
        }
        Ok(InFlight {
            generation,
            started: Instant::now(),
            changed,
            rx,
        })
    }

    #[instrument(skip(self, result, changed), fields(changed = changed.len()))]
    fn finish(
        &mut self,
        generation: u64,
        result: WorkerResult<P>,
        changed: Vec<PathBuf>,
    ) -> ReloadOutcome {
        let description = match result {
            Ok(Ok(description)) => description,
            Ok(Err(err)) => return self.fail(ReloadError::Prepare(err)),
            Err(_) => return self.fail(ReloadError::WorkerPanicked),
        };
        let window = self.ctx.window.clone();
        let geometry = window
            .as_ref()
            .map(|w| (w.size().get(), w.position().get()));
        let root = match (self.mount)(&self.ctx, description) {
            Ok(root) => root,
            Err(err) => return self.fail(ReloadError::Mount(err)),
        };

        let old = match &window {
            Some(window) => window.set_root(&root),
            None => self.root.take(),
        };
        if let Some(old) = old
            && old != root
        {
            old.destroy();
        }
        if let (Some(window), Some((size, position))) = (&window, geometry) {
            window.size().set(size);
            window.position().set(position);
            window.layout();
        }
        self.root = Some(root);
        self.stats.lock().reloads += 1;
        info!(generation, "reloaded");
        ReloadOutcome::Reloaded {
            generation,
            changed,
        }
    }

    fn fail(&mut self, err: ReloadError) -> ReloadOutcome {
        warn!(error = %err, "reload failed; keeping the current tree");
        let mut stats = self.stats.lock();
        stats.failures += 1;
        stats.last_error = Some(err.to_string());
        ReloadOutcome::Failed(err)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        rc::Rc,
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    use mdkit_components::label::{Label, LabelArgs};
    use mdkit_ui::{PxPosition, PxSize, Window};

    use super::*;

    fn context() -> (BuildContext, Window) {
        let window = Window::new(PxSize::new(800.0, 600.0));
        window.position().set(PxPosition::new(40.0, 30.0));
        (BuildContext::new().with_window(window.clone()), window)
    }

    fn label_mount(ctx: &BuildContext, text: String) -> anyhow::Result<Widget> {
        Ok(Label::new(ctx, LabelArgs::new(text)).into())
    }

    #[test]
    fn reload_swaps_the_root_and_keeps_window_geometry() {
        let (ctx, window) = context();
        let count = Arc::new(AtomicU32::new(0));
        let counter = count.clone();
        let resize = window.clone();
        let mut harness = ReloadHarness::new(
            ReloadConfig::default(),
            ctx,
            move |_| Ok(format!("build {}", counter.fetch_add(1, Ordering::SeqCst))),
            move |ctx, text| {
                resize.size().set(PxSize::new(100.0, 100.0));
                label_mount(ctx, text)
            },
        );
        assert_eq!(harness.reload().unwrap(), 1);
        let first = harness.root().cloned().unwrap();
        assert_eq!(window.root().as_ref(), Some(&first));

        assert_eq!(harness.reload().unwrap(), 2);
        let second = window.root().unwrap();
        assert_ne!(second, first);
        assert_eq!(Label::from_widget(second).unwrap().text(), "build 1");
        assert_eq!(window.size().get(), PxSize::new(800.0, 600.0));
        assert_eq!(window.position().get(), PxPosition::new(40.0, 30.0));
        assert_eq!(harness.stats().reloads, 2);
    }

    #[test]
    fn failures_keep_the_old_tree() {
        let (ctx, window) = context();
        let fail_prepare = Arc::new(AtomicU32::new(0));
        let flag = fail_prepare.clone();
        let fail_mount = Rc::new(std::cell::Cell::new(false));
        let mount_flag = fail_mount.clone();
        let mut harness = ReloadHarness::new(
            ReloadConfig::default(),
            ctx,
            move |_| match flag.load(Ordering::SeqCst) {
                0 => Ok("ok".to_owned()),
                1 => Err(anyhow!("syntax error in main.kv")),
                _ => panic!("builder crashed"),
            },
            move |ctx, text| {
                if mount_flag.get() {
                    anyhow::bail!("unknown widget");
                }
                label_mount(ctx, text)
            },
        );
        harness.reload().unwrap();
        let root = window.root().unwrap();

        fail_prepare.store(1, Ordering::SeqCst);
        assert!(matches!(harness.reload(), Err(ReloadError::Prepare(_))));
        fail_prepare.store(2, Ordering::SeqCst);
        assert!(matches!(harness.reload(), Err(ReloadError::WorkerPanicked)));
        fail_prepare.store(0, Ordering::SeqCst);
        fail_mount.set(true);
        assert!(matches!(harness.reload(), Err(ReloadError::Mount(_))));

        assert_eq!(window.root(), Some(root));
        let stats = harness.stats();
        assert_eq!(stats.failures, 3);
        assert!(stats.last_error.unwrap().contains("unknown widget"));
    }

    #[test]
    fn slow_prepare_times_out() {
        let (ctx, window) = context();
        let mut harness = ReloadHarness::new(
            ReloadConfig::default().build_timeout_ms(20),
            ctx,
            |_| {
                thread::sleep(Duration::from_millis(300));
                Ok("late".to_owned())
            },
            label_mount,
        );
        assert!(matches!(harness.reload(), Err(ReloadError::Timeout(_))));
        assert!(window.root().is_none());
        assert!(harness.root().is_none());
    }

    #[test]
    fn poll_rebuilds_after_changes_settle() {
        let (ctx, window) = context();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = seen.clone();
        let mut harness = ReloadHarness::new(
            ReloadConfig::default().debounce_ms(0),
            ctx,
            move |changed: &[PathBuf]| {
                record.lock().extend_from_slice(changed);
                Ok(changed.len().to_string())
            },
            label_mount,
        );
        assert!(harness.poll().is_none());
        harness.notify_changed(vec!["ui/main.kv".into(), "ui/main.kv".into()]);
        assert!(harness.poll().is_none());
        assert!(harness.is_building());

        let deadline = Instant::now() + Duration::from_secs(5);
        let outcome = loop {
            if let Some(outcome) = harness.poll() {
                break outcome;
            }
            assert!(Instant::now() < deadline, "rebuild never finished");
            thread::sleep(Duration::from_millis(5));
        };
        let ReloadOutcome::Reloaded { changed, .. } = outcome else {
            panic!("expected a reload, got {outcome:?}");
        };
        assert_eq!(changed, [PathBuf::from("ui/main.kv")]);
        assert_eq!(*seen.lock(), [PathBuf::from("ui/main.kv")]);
        let root = window.root().unwrap();
        assert_eq!(Label::from_widget(root).unwrap().text(), "1");
    }
}
