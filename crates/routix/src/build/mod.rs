// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Incremental build session.
//!
//! A session is a single task that owns the routes, tree and extras
//! builders. Callers talk to it through a cloneable [`BuildHandle`]:
//!
//! ```text
//! add/update/remove ──► command channel ──► session ──► parse tasks
//!                                              ▲              │
//!                                              └── parsed ◄───┘
//!                                   deadline ──► build ──► write outputs
//! ```
//!
//! File events spawn a parse task and hold a latch until the parsed item is
//! applied. Every applied change re-arms the debounce deadline; when it
//! expires with no latch held, the dirty outputs are regenerated and
//! written. Errors collected along the way surface through
//! [`BuildHandle::on_idle`].

pub mod codegen;
pub mod extras;
pub mod routes;
pub mod scheduler;
pub mod tree;

use crate::error::{Result, RoutixError};
use crate::item::{FileEvent, RouteItem};
use crate::options::Options;
use crate::parse::parse_file;
use codegen::indent;
use extras::ExtrasBuilder;
use routes::RoutesBuilder;
use scheduler::{BuildState, Invalidated};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use tree::{PutOutcome, TreeBuilder};

/// Accepted items keyed by path relative to the watched directory.
pub type FileMap = Arc<RwLock<HashMap<String, RouteItem>>>;

enum Command {
    Add(FileEvent),
    Update(FileEvent),
    Remove(FileEvent),
    Start,
    OnIdle(oneshot::Sender<Result<()>>),
    Close,
}

struct ParsedFile {
    relative: String,
    generation: u64,
    is_update: bool,
    result: Result<Option<RouteItem>>,
}

/// Cloneable handle to a running build session.
#[derive(Clone)]
pub struct BuildHandle {
    commands: mpsc::UnboundedSender<Command>,
    files: FileMap,
    started: watch::Receiver<bool>,
    changes: watch::Receiver<u64>,
    dir: PathBuf,
}

impl BuildHandle {
    /// Spawns a build session on the current tokio runtime.
    pub fn spawn(options: Options) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (parsed_tx, parsed_rx) = mpsc::unbounded_channel();
        let (started_tx, started) = watch::channel(false);
        let (changes_tx, changes) = watch::channel(0u64);
        let files: FileMap = Arc::default();
        let dir = options.dir.clone();

        let session = Session::new(
            Arc::new(options),
            files.clone(),
            parsed_tx,
            started_tx,
            changes_tx,
        );
        tokio::spawn(session.run(commands_rx, parsed_rx));

        Self {
            commands,
            files,
            started,
            changes,
            dir,
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Build session closed, dropping event");
        }
    }

    /// Reports a new file.
    pub fn add(&self, event: FileEvent) {
        self.send(Command::Add(event));
    }

    /// Reports a modified file.
    pub fn update(&self, event: FileEvent) {
        self.send(Command::Update(event));
    }

    /// Reports a deleted file.
    pub fn remove(&self, event: FileEvent) {
        self.send(Command::Remove(event));
    }

    /// Marks the initial scan complete and triggers the first build.
    pub fn start(&self) {
        self.send(Command::Start);
    }

    /// Stops the session. Pending idle waiters fail with
    /// [`RoutixError::Closed`].
    pub fn close(&self) {
        self.send(Command::Close);
    }

    /// Resolves once the session has started, nothing is pending and no
    /// build runs.
    ///
    /// With a `change_timeout`, first waits up to that long for a change to
    /// be noticed, so that a write made just before the call is taken into
    /// account. Errors collected since the last successful cycle are
    /// returned: a single error as is, several as [`RoutixError::Build`].
    pub async fn on_idle(&self, change_timeout: Option<Duration>) -> Result<()> {
        let mut started = self.started.clone();
        started
            .wait_for(|started| *started)
            .await
            .map_err(|_| RoutixError::Closed)?;

        if let Some(timeout) = change_timeout.filter(|t| !t.is_zero()) {
            let mut changes = self.changes.clone();
            changes.borrow_and_update();
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {}
                _ = changes.changed() => {}
            }
        }

        let (reply, wait) = oneshot::channel();
        self.commands
            .send(Command::OnIdle(reply))
            .map_err(|_| RoutixError::Closed)?;
        wait.await.map_err(|_| RoutixError::Closed)?
    }

    /// Resolves on the next invalidation.
    pub async fn on_change(&self) -> Result<()> {
        let mut changes = self.changes.clone();
        changes.borrow_and_update();
        changes.changed().await.map_err(|_| RoutixError::Closed)
    }

    /// Returns the accepted item for an absolute or dir-relative filename.
    pub fn get(&self, filename: impl AsRef<Path>) -> Option<RouteItem> {
        let filename = filename.as_ref();
        let relative = filename.strip_prefix(&self.dir).unwrap_or(filename);
        let key = posixify(relative);
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// Number of accepted files.
    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no file is accepted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Joins path components with `/` regardless of platform.
pub fn posixify(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

struct Session {
    options: Arc<Options>,
    files: FileMap,
    generations: HashMap<String, u64>,
    routes: Option<RoutesBuilder>,
    tree: Option<TreeBuilder>,
    extras: Option<ExtrasBuilder>,
    last_written: HashMap<PathBuf, String>,
    state: BuildState,
    idle_waiters: Vec<oneshot::Sender<Result<()>>>,
    parsed_tx: mpsc::UnboundedSender<ParsedFile>,
    started_tx: watch::Sender<bool>,
    changes_tx: watch::Sender<u64>,
}

impl Session {
    fn new(
        options: Arc<Options>,
        files: FileMap,
        parsed_tx: mpsc::UnboundedSender<ParsedFile>,
        started_tx: watch::Sender<bool>,
        changes_tx: watch::Sender<u64>,
    ) -> Self {
        let tree = options.has_tree().then(|| TreeBuilder::new(&options));
        let routes = options.has_routes().then(RoutesBuilder::new);
        let extras = options.has_extras().then(|| ExtrasBuilder::new(options.id));
        Self {
            state: BuildState::new(options.build_debounce),
            options,
            files,
            generations: HashMap::new(),
            routes,
            tree,
            extras,
            last_written: HashMap::new(),
            idle_waiters: Vec::new(),
            parsed_tx,
            started_tx,
            changes_tx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut parsed: mpsc::UnboundedReceiver<ParsedFile>,
    ) {
        loop {
            let deadline = self.state.deadline();
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::Close) | None => break,
                    Some(command) => self.handle(command),
                },
                Some(file) = parsed.recv() => self.on_parsed(file),
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_deadline().await;
                }
            }
            self.flush_idle();
        }
        debug!("Build session stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Add(event) => self.on_event(event, false),
            Command::Update(event) => self.on_event(event, true),
            Command::Remove(event) => self.on_remove(event),
            Command::Start => {
                self.state.start(Instant::now());
                self.started_tx.send_replace(true);
                self.notify_change();
            }
            Command::OnIdle(reply) => self.idle_waiters.push(reply),
            Command::Close => {}
        }
    }

    fn next_generation(&mut self, relative: &str) -> u64 {
        let generation = self.generations.entry(relative.to_string()).or_default();
        *generation += 1;
        *generation
    }

    fn on_event(&mut self, event: FileEvent, is_update: bool) {
        let now = Instant::now();
        self.state.input(now);
        if event.is_dir {
            return;
        }

        let relative = event.path;
        let generation = self.next_generation(&relative);
        let previous = if is_update { self.file(&relative) } else { None };

        self.state.latch(now);
        self.notify_change();

        let options = self.options.clone();
        let parsed_tx = self.parsed_tx.clone();
        tokio::spawn(async move {
            let result = parse_file(&options, &relative, previous.as_ref()).await;
            let _ = parsed_tx.send(ParsedFile {
                relative,
                generation,
                is_update,
                result,
            });
        });
    }

    fn on_parsed(&mut self, parsed: ParsedFile) {
        let ParsedFile {
            relative,
            generation,
            is_update,
            result,
        } = parsed;

        let current = self.generations.get(&relative).copied();
        let canceled = if current != Some(generation) {
            debug!(file = %relative, "Dropping stale parse result");
            false
        } else {
            match result {
                Ok(Some(item)) => {
                    let applied = if is_update {
                        self.apply_update(item)
                    } else {
                        self.apply_add(item)
                    };
                    if let Err(err) = applied {
                        self.state.push_error(err);
                    }
                    false
                }
                Ok(None) => true,
                Err(err) => {
                    warn!(file = %relative, error = %err, "Parse failed");
                    self.state.push_error(err);
                    false
                }
            }
        };

        if self.state.release(Instant::now(), canceled) {
            self.notify_change();
        }
    }

    fn on_remove(&mut self, event: FileEvent) {
        let now = Instant::now();
        self.state.input(now);
        if event.is_dir {
            return;
        }
        // cancels any parse still in flight for this file
        self.next_generation(&event.path);

        let removed = self
            .files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&event.path);
        let Some(item) = removed else {
            return;
        };

        self.state.invalidated.build = true;
        self.remove_from_builders(&item);
        if self.state.invalidate_debounced(now) {
            self.notify_change();
        }
    }

    fn file(&self, relative: &str) -> Option<RouteItem> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(relative)
            .cloned()
    }

    fn store(&self, item: &RouteItem) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(item.relative.clone(), item.clone());
    }

    fn apply_add(&mut self, item: RouteItem) -> Result<()> {
        self.store(&item);
        self.insert_into_builders(item, true)
    }

    fn apply_update(&mut self, item: RouteItem) -> Result<()> {
        let previous = self.file(&item.relative);
        self.store(&item);

        if item.rebuild_extras {
            if let Some(extras) = self.extras.as_mut() {
                if extras.update(&item) {
                    self.state.invalidated.extras = true;
                }
            }
        }

        if !item.rebuild {
            return Ok(());
        }
        self.state.invalidated.build = true;

        if let Some(routes) = self.routes.as_mut() {
            routes.update(item.clone(), previous.as_ref());
        }
        let outcome = match self.tree.as_mut() {
            Some(tree) => tree.update(item, previous.as_ref(), &self.options, true)?,
            None => return Ok(()),
        };
        self.apply_outcome(outcome)
    }

    fn insert_into_builders(&mut self, item: RouteItem, allow_resolve: bool) -> Result<()> {
        if let Some(extras) = self.extras.as_mut() {
            if extras.add(&item) {
                self.state.invalidated.extras = true;
            }
        }
        self.state.invalidated.build = true;

        if let Some(routes) = self.routes.as_mut() {
            routes.add(item.clone());
        }
        let outcome = match self.tree.as_mut() {
            Some(tree) => tree.add(item, &self.options, allow_resolve)?,
            None => return Ok(()),
        };
        self.apply_outcome(outcome)
    }

    fn remove_from_builders(&mut self, item: &RouteItem) {
        if let Some(extras) = self.extras.as_mut() {
            if extras.remove(item) {
                self.state.invalidated.extras = true;
            }
        }
        if let Some(routes) = self.routes.as_mut() {
            routes.remove(&item.path);
        }
        if let Some(tree) = self.tree.as_mut() {
            tree.remove(item);
        }
    }

    /// Swaps the items of a resolved conflict. The fresh items are inserted
    /// without a resolver, so a second conflict is an error.
    fn apply_outcome(&mut self, outcome: PutOutcome) -> Result<()> {
        let PutOutcome::Resolved { stale, fresh } = outcome else {
            return Ok(());
        };
        debug!(
            paths = ?fresh.iter().map(|i| i.path.as_str()).collect::<Vec<_>>(),
            "Resolved path conflict"
        );
        for item in &stale {
            self.remove_from_builders(item);
        }
        for item in fresh {
            self.store(&item);
            self.insert_into_builders(item, false)?;
        }
        Ok(())
    }

    fn notify_change(&self) {
        if self.state.is_started() {
            self.changes_tx.send_modify(|n| *n = n.wrapping_add(1));
        }
    }

    async fn on_deadline(&mut self) {
        let Some(flags) = self.state.fire() else {
            return;
        };
        self.state.set_running(true);
        let written = self.build(flags).await;
        self.state.set_running(false);

        if written.is_empty() {
            info!("Nothing changed");
            return;
        }
        let duration = self.state.finish_cycle(Instant::now());
        let targets = written
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        info!("Written: {} ({}ms)", targets, duration.as_millis());
    }

    /// Regenerates dirty outputs. Failures are recorded, the files that
    /// were written are returned.
    async fn build(&mut self, flags: Invalidated) -> Vec<PathBuf> {
        let mut written = Vec::new();
        if flags.build {
            match self.build_routes().await {
                Ok(paths) => written.extend(paths),
                Err(err) => self.state.push_error(err),
            }
        }
        if flags.extras {
            match self.build_extras().await {
                Ok(path) => written.extend(path),
                Err(err) => self.state.push_error(err),
            }
        }
        written
    }

    async fn build_routes(&mut self) -> Result<Vec<PathBuf>> {
        let options = self.options.clone();
        let Some(routes) = self.routes.as_ref() else {
            return Ok(Vec::new());
        };

        let prepared = match self.tree.as_mut() {
            Some(tree) => Some(tree.prepare(&options).await?),
            None => None,
        };
        let generated = routes.generate(&options, prepared.as_ref())?;
        let tree_code = match (self.tree.as_ref(), prepared.as_ref()) {
            (Some(tree), Some(prepared)) => Some(tree.generate(prepared, &generated.index)),
            _ => None,
        };

        let mut outputs = Vec::new();
        let write = &options.write;
        if options.merged {
            if let Some(target) = &write.routes {
                let contents = indent(
                    0,
                    "\n",
                    [
                        generated.code.clone(),
                        tree_code.clone().unwrap_or_default(),
                        "export { f as files, d as dirs, routes, tree }\n".to_string(),
                    ],
                );
                outputs.push((target.clone(), contents));
            }
        } else {
            if let Some(target) = &write.routes {
                let dirs = if prepared.is_some() { " d as dirs," } else { "" };
                let contents = indent(
                    0,
                    "\n",
                    [
                        generated.code.clone(),
                        format!("export {{ f as files,{} routes }}\n", dirs),
                    ],
                );
                outputs.push((target.clone(), contents));
            }
            if let Some(target) = &write.tree {
                let head = match &write.routes {
                    Some(routes) => format!(
                        "import {{ files as f, dirs as d }} from '{}'",
                        routes.display()
                    ),
                    None => generated.code.clone(),
                };
                let contents = indent(
                    0,
                    "\n",
                    [
                        head,
                        tree_code.unwrap_or_default(),
                        "export default tree".to_string(),
                    ],
                );
                outputs.push((target.clone(), contents));
            }
        }

        let mut written = Vec::with_capacity(outputs.len());
        for (target, contents) in outputs {
            if self.write_output(&target, contents).await? {
                written.push(target);
            }
        }
        Ok(written)
    }

    async fn build_extras(&mut self) -> Result<Option<PathBuf>> {
        let Some(target) = self.options.write.extras.clone() else {
            return Ok(None);
        };
        let Some(extras) = self.extras.as_ref() else {
            return Ok(None);
        };
        let contents = indent(
            0,
            "\n",
            [extras.generate()?, "export default extras".to_string()],
        );
        Ok(self.write_output(&target, contents).await?.then_some(target))
    }

    /// Writes `contents` unless `target` already holds them from a previous
    /// build. Returns whether the file was written.
    async fn write_output(&mut self, target: &Path, contents: String) -> Result<bool> {
        if self.last_written.get(target) == Some(&contents) {
            debug!(target = %target.display(), "Output unchanged");
            return Ok(false);
        }
        self.options.writer.write_file(target, &contents).await?;
        self.last_written.insert(target.to_path_buf(), contents);
        Ok(true)
    }

    /// Answers idle waiters. Collected errors go to the first waiter; the
    /// others resolve without error.
    fn flush_idle(&mut self) {
        if self.idle_waiters.is_empty() || !self.state.is_idle() {
            return;
        }
        let mut result = match RoutixError::aggregate(self.state.take_errors()) {
            Some(err) => Err(err),
            None => Ok(()),
        };
        for waiter in self.idle_waiters.drain(..) {
            let _ = waiter.send(std::mem::replace(&mut result, Ok(())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Parse, Parsed};
    use crate::write::MemoryWriter;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn options(writer: &MemoryWriter) -> Options {
        let mut options = Options::new("/src")
            .with_extensions(["js", "md"])
            .with_routes_file("/out/routes.js")
            .with_leading_slash(true)
            .with_writer(Arc::new(writer.clone()));
        options.id = false;
        options
    }

    /// Tags files with the current value of a shared "file contents" counter.
    struct Versioned(Arc<AtomicUsize>);

    #[async_trait]
    impl Parse for Versioned {
        async fn parse(
            &self,
            item: &mut RouteItem,
            _previous: Option<&RouteItem>,
            _options: &Options,
        ) -> Result<Parsed> {
            if item.is_file {
                let version = self.0.load(Ordering::SeqCst);
                item.props.insert("version".into(), json!(version));
            }
            Ok(Parsed::Keep)
        }
    }

    struct CancelAll;

    #[async_trait]
    impl Parse for CancelAll {
        async fn parse(
            &self,
            _item: &mut RouteItem,
            _previous: Option<&RouteItem>,
            _options: &Options,
        ) -> Result<Parsed> {
            Ok(Parsed::Cancel)
        }
    }

    /// Cancels draft files (leading underscore) after a short delay.
    struct SlowDrafts;

    #[async_trait]
    impl Parse for SlowDrafts {
        async fn parse(
            &self,
            item: &mut RouteItem,
            _previous: Option<&RouteItem>,
            _options: &Options,
        ) -> Result<Parsed> {
            if item.relative.starts_with('_') {
                tokio::time::sleep(Duration::from_millis(10)).await;
                return Ok(Parsed::Cancel);
            }
            Ok(Parsed::Keep)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_build_writes_merged_manifest() {
        let writer = MemoryWriter::new();
        let handle = BuildHandle::spawn(options(&writer));
        handle.add(FileEvent::file("a/b.js"));
        handle.add(FileEvent::file("a/c.js"));
        handle.start();
        handle.on_idle(None).await.unwrap();

        let expected = r#"const f /* files */ = [
  { // f[0]
    path: "/a/b",
    import: () => import("/src/a/b.js")
  },
  { // f[1]
    path: "/a/c",
    import: () => import("/src/a/c.js")
  }
]

const d /* dirs */ = [
  { // d[0]
    path: "/a",
    children: () => [f[0], f[1]]
  }
]

for (const g of [f, d])
  for (const x of g) x.children = x.children ? x.children() : []

const routes = [...f, ...d]

const tree = {
  path: "/",
  isRoot: true,
  children: [
    d[0]
  ]
}

export { f as files, d as dirs, routes, tree }
"#;
        assert_eq!(writer.get("/out/routes.js").unwrap(), expected);
        assert_eq!(writer.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_without_files_still_writes() {
        let writer = MemoryWriter::new();
        let handle = BuildHandle::spawn(options(&writer));
        handle.start();
        handle.on_idle(None).await.unwrap();
        let out = writer.get("/out/routes.js").unwrap();
        assert!(out.starts_with("const f /* files */ = []\n\nconst d /* dirs */ = []"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_updates_builds_once() {
        let writer = MemoryWriter::new();
        let contents = Arc::new(AtomicUsize::new(1));
        let options = options(&writer).with_parser(Versioned(contents.clone()));
        let handle = BuildHandle::spawn(options);
        handle.add(FileEvent::file("a.js"));
        handle.start();
        handle.on_idle(None).await.unwrap();
        assert_eq!(writer.write_count(), 1);

        for version in 2..=6 {
            contents.store(version, Ordering::SeqCst);
            handle.update(FileEvent::file("a.js"));
        }
        handle.on_idle(None).await.unwrap();

        assert_eq!(writer.write_count(), 2);
        let out = writer.get("/out/routes.js").unwrap();
        assert!(out.contains("\"version\": 6"));
        assert_eq!(handle.get("/src/a.js").unwrap().props["version"], json!(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_drops_item_and_rebuilds() {
        let writer = MemoryWriter::new();
        let handle = BuildHandle::spawn(options(&writer));
        handle.add(FileEvent::file("a.js"));
        handle.add(FileEvent::file("b.js"));
        handle.start();
        handle.on_idle(None).await.unwrap();

        handle.remove(FileEvent::file("a.js"));
        handle.on_idle(None).await.unwrap();

        let out = writer.get("/out/routes.js").unwrap();
        assert!(!out.contains("\"/a\""));
        assert!(out.contains("\"/b\""));
        assert!(handle.get("a.js").is_none());
        assert_eq!(handle.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_before_parse_settles() {
        let writer = MemoryWriter::new();
        let handle = BuildHandle::spawn(options(&writer));
        handle.start();
        handle.on_idle(None).await.unwrap();

        handle.add(FileEvent::file("a.js"));
        handle.remove(FileEvent::file("a.js"));
        handle.on_idle(None).await.unwrap();

        assert!(handle.is_empty());
        assert!(!writer.get("/out/routes.js").unwrap().contains("\"/a\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_canceled_parse_skips_build() {
        let writer = MemoryWriter::new();
        let handle = BuildHandle::spawn(options(&writer).with_parser(CancelAll));
        handle.start();
        handle.on_idle(None).await.unwrap();
        assert_eq!(writer.write_count(), 1);

        handle.add(FileEvent::file("a.js"));
        handle.on_idle(None).await.unwrap();
        assert_eq!(writer.write_count(), 1);
        assert!(handle.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_canceled_parse_finishing_last_keeps_accepted_file() {
        let writer = MemoryWriter::new();
        let handle = BuildHandle::spawn(options(&writer).with_parser(SlowDrafts));
        handle.start();
        handle.on_idle(None).await.unwrap();
        assert_eq!(writer.write_count(), 1);

        handle.add(FileEvent::file("a.js"));
        handle.add(FileEvent::file("_draft.js"));
        handle.on_idle(None).await.unwrap();

        assert_eq!(writer.write_count(), 2);
        let out = writer.get("/out/routes.js").unwrap();
        assert!(out.contains("path: \"/a\""));
        assert!(!out.contains("_draft"));
        assert!(handle.get("a.js").is_some());
        assert_eq!(handle.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_output_is_not_rewritten() {
        let writer = MemoryWriter::new();
        let contents = Arc::new(AtomicUsize::new(1));
        let options = options(&writer).with_parser(Versioned(contents.clone()));
        let handle = BuildHandle::spawn(options);
        handle.add(FileEvent::file("a.js"));
        handle.start();
        handle.on_idle(None).await.unwrap();
        assert_eq!(writer.write_count(), 1);

        // touched without a content change
        handle.update(FileEvent::file("a.js"));
        handle.on_idle(None).await.unwrap();
        assert_eq!(writer.write_count(), 1);

        contents.store(2, Ordering::SeqCst);
        handle.update(FileEvent::file("a.js"));
        handle.on_idle(None).await.unwrap();
        assert_eq!(writer.write_count(), 2);
        assert!(writer.get("/out/routes.js").unwrap().contains("\"version\": 2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_surfaces_on_idle() {
        let writer = MemoryWriter::new();
        let handle = BuildHandle::spawn(options(&writer));
        handle.add(FileEvent::file("a.js"));
        handle.add(FileEvent::file("a.md"));
        handle.start();

        let err = handle.on_idle(None).await.unwrap_err();
        assert!(matches!(err, RoutixError::Conflict { ref path } if path == "/a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolver_that_keeps_paths_terminates() {
        let writer = MemoryWriter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let options = options(&writer).with_conflict_resolver(
            move |_new: &mut RouteItem, _existing: &mut RouteItem| {
                counted.fetch_add(1, Ordering::SeqCst);
                true
            },
        );
        let handle = BuildHandle::spawn(options);
        handle.add(FileEvent::file("a.js"));
        handle.add(FileEvent::file("a.md"));
        handle.start();

        let err = handle.on_idle(None).await.unwrap_err();
        assert!(matches!(err, RoutixError::Conflict { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolver_renames_both_files() {
        let writer = MemoryWriter::new();
        let options = options(&writer).with_conflict_resolver(
            |new: &mut RouteItem, existing: &mut RouteItem| {
                new.path = format!("{}{}", new.path, new.extension);
                existing.path = format!("{}{}", existing.path, existing.extension);
                true
            },
        );
        let handle = BuildHandle::spawn(options);
        handle.add(FileEvent::file("a.js"));
        handle.add(FileEvent::file("a.md"));
        handle.start();
        handle.on_idle(None).await.unwrap();

        let out = writer.get("/out/routes.js").unwrap();
        assert!(out.contains("path: \"/a.js\""));
        assert!(out.contains("path: \"/a.md\""));
        assert!(!out.contains("path: \"/a\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_split_outputs() {
        let writer = MemoryWriter::new();
        let options = options(&writer)
            .with_tree_file("/out/tree.js")
            .with_extras_file("/out/extras.js");
        let handle = BuildHandle::spawn(options);
        handle.add(FileEvent::file("a.js"));
        handle.start();
        handle.on_idle(None).await.unwrap();

        let routes = writer.get("/out/routes.js").unwrap();
        assert!(routes.ends_with("export { f as files, d as dirs, routes }\n"));
        let tree = writer.get("/out/tree.js").unwrap();
        assert!(tree.starts_with("import { files as f, dirs as d } from '/out/routes.js'\n\nconst tree = {"));
        assert!(tree.ends_with("export default tree"));
        assert_eq!(
            writer.get("/out/extras.js").unwrap(),
            "const extras = {}\n\nexport default extras"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_idle_waits_for_start() {
        let writer = MemoryWriter::new();
        let handle = BuildHandle::spawn(options(&writer));
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.on_idle(None).await })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!waiter.is_finished());

        handle.start();
        waiter.await.unwrap().unwrap();
        assert_eq!(writer.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_fails_pending_waiters() {
        let writer = MemoryWriter::new();
        let handle = BuildHandle::spawn(options(&writer));
        handle.close();
        assert!(matches!(handle.on_idle(None).await, Err(RoutixError::Closed)));
    }
}
