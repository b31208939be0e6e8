//! Reconciliation engine.
//!
//! One reconciliation pass per configured source, in seven phases:
//!
//! 0. Fetch the full remote task set (pagination to exhaustion)
//! 1. Bootstrap the document from scratch if it does not exist
//! 2. Join document lines and remote tasks on the embedded identifier
//! 3. Arbitrate completion conflicts (push per policy, local wins)
//! 4. Re-fetch the remote set, confirming pushes and server-computed
//!    fields
//! 5. Rewrite the raw lines: refresh the frontmatter sync stamp,
//!    re-format identifier-matched lines from remote state, keep
//!    orphaned lines verbatim (conservative deletion), drop completed
//!    lines when the hide filter is on
//! 6. Append remote tasks not seen during the rewrite, grouped into
//!    their sections
//! 7. Write back only when the content materially changed
//!
//! Remote calls are strictly sequential. A failed completion push is
//! logged and skipped; a failed fetch or write aborts this source only.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

use crate::asana::TaskApi;
use crate::document::{line, Document, SectionIndex, SECTION_PREFIX};
use crate::error::Result;
use crate::model::{DisplayOptions, RemoteTask, SyncedSource};
use crate::store::DocumentStore;

use super::guard::WriteGuard;
use super::policy::{ConflictPolicy, Resolution};

/// Frontmatter key holding the last-synced timestamp.
const SYNCED_KEY: &str = "synced:";

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SyncStats {
    /// Task lines inserted into the document.
    pub added: usize,
    /// Task lines replaced with a differing form, or whose task had a
    /// conflict pushed this pass.
    pub updated: usize,
    /// Completion values pushed to the remote.
    pub completion_changes: usize,
}

impl SyncStats {
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.completion_changes == 0
    }
}

/// Result of reconciling one source within a multi-source run.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: String,
    pub result: Result<SyncStats>,
}

/// The bidirectional merge between documents and remote task lists.
pub struct ReconciliationEngine<'a, A: TaskApi> {
    api: &'a A,
    store: &'a DocumentStore,
    options: DisplayOptions,
    policy: ConflictPolicy,
    guard: Arc<WriteGuard>,
}

impl<'a, A: TaskApi> ReconciliationEngine<'a, A> {
    #[must_use]
    pub fn new(
        api: &'a A,
        store: &'a DocumentStore,
        options: DisplayOptions,
        guard: Arc<WriteGuard>,
    ) -> Self {
        Self {
            api,
            store,
            options,
            policy: ConflictPolicy::default(),
            guard,
        }
    }

    /// Override the conflict policy (defaults to local-wins).
    #[must_use]
    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reconcile every source in turn.
    ///
    /// A failure aborts only the source it occurred in; the remaining
    /// sources still run. Outcomes are returned in input order.
    pub async fn sync_all(&self, sources: &[SyncedSource]) -> Vec<SourceOutcome> {
        let mut outcomes = Vec::with_capacity(sources.len());
        for source in sources {
            let result = self.sync_source(source).await;
            if let Err(error) = &result {
                warn!(source = %source.name, %error, "source reconciliation failed");
            }
            outcomes.push(SourceOutcome {
                source: source.name.clone(),
                result,
            });
        }
        outcomes
    }

    /// Run one full reconciliation pass for one source.
    pub async fn sync_source(&self, source: &SyncedSource) -> Result<SyncStats> {
        // Phase 0 — fetch.
        let fetched = self.api.tasks_for(source).await?;
        debug!(source = %source.name, tasks = fetched.len(), "fetched remote tasks");

        // Phase 1 — bootstrap.
        if !self.store.exists(&source.file) {
            return self.bootstrap(source, &fetched);
        }

        // Phase 2 — join.
        let content = self.store.read(&source.file)?;
        let doc = Document::parse(&content);
        let local_by_gid = doc.tasks_by_gid();
        let remote_by_gid: HashMap<&str, &RemoteTask> =
            fetched.iter().map(|t| (t.gid.as_str(), t)).collect();

        let mut stats = SyncStats::default();

        // Phase 3 — conflict arbitration.
        let mut pushed: HashSet<String> = HashSet::new();
        for (gid, local) in &local_by_gid {
            let Some(remote) = remote_by_gid.get(gid.as_str()) else {
                continue;
            };
            if local.completed == remote.completed {
                continue;
            }
            match self.policy.resolve(local.completed) {
                Resolution::PushLocal(value) => {
                    match self.api.set_completed(gid, value).await {
                        Ok(()) => {
                            stats.completion_changes += 1;
                            pushed.insert(gid.clone());
                            info!(source = %source.name, %gid, completed = value, "pushed completion");
                        }
                        Err(error) => {
                            warn!(source = %source.name, %gid, %error, "completion push failed");
                        }
                    }
                }
                Resolution::AcceptRemote => {}
            }
        }

        // Phase 4 — refresh.
        let refreshed = self.api.tasks_for(source).await?;
        let remote_by_gid: HashMap<&str, &RemoteTask> =
            refreshed.iter().map(|t| (t.gid.as_str(), t)).collect();

        // Phase 5 — rewrite.
        let mut matched: HashSet<&str> = HashSet::new();
        let mut new_lines: Vec<String> = Vec::with_capacity(doc.raw_lines.len());
        let stamp = now_stamp();
        let mut stamp_seen = false;

        for (idx, raw) in doc.raw_lines.iter().enumerate() {
            if let Some(span) = doc.frontmatter {
                if idx <= span.end {
                    if idx > 0 && idx < span.end && raw.starts_with(SYNCED_KEY) {
                        new_lines.push(format!("{SYNCED_KEY} {stamp}"));
                        stamp_seen = true;
                    } else if idx == span.end && !stamp_seen {
                        // No stamp line yet: insert one before the
                        // closing delimiter.
                        new_lines.push(format!("{SYNCED_KEY} {stamp}"));
                        new_lines.push(raw.clone());
                    } else {
                        new_lines.push(raw.clone());
                    }
                    continue;
                }
            }

            let Some(gid) = line::parse(raw, idx).and_then(|t| t.gid) else {
                new_lines.push(raw.clone());
                continue;
            };
            let Some(remote) = remote_by_gid.get(gid.as_str()) else {
                // Conservative deletion: the remote stopped reporting
                // this identifier, so the line stays verbatim.
                new_lines.push(raw.clone());
                continue;
            };
            matched.insert(remote.gid.as_str());

            if !self.options.show_completed && remote.completed {
                // Dropped, not counted; the line reappears once the
                // task is reopened.
                continue;
            }

            let formatted = line::format(remote, self.options);
            if formatted != *raw || pushed.contains(gid.as_str()) {
                stats.updated += 1;
            }
            new_lines.push(formatted);
        }

        // Phase 6 — append new tasks.
        let fresh: Vec<&RemoteTask> = refreshed
            .iter()
            .filter(|t| !matched.contains(t.gid.as_str()))
            .filter(|t| self.options.show_completed || !t.completed)
            .collect();
        stats.added += fresh.len();
        self.append_new_tasks(source, &fresh, &mut new_lines);

        // Phase 7 — conditional write.
        if materially_differs(&doc.raw_lines, &new_lines) {
            let resolved = self.store.resolve(&source.file);
            self.guard.mark(&resolved);
            self.store.write(&source.file, &new_lines.join("\n"))?;
            debug!(source = %source.name, "document written");
        } else {
            debug!(source = %source.name, "document unchanged, write skipped");
        }

        Ok(stats)
    }

    /// Materialize a document that does not exist yet.
    fn bootstrap(&self, source: &SyncedSource, fetched: &[RemoteTask]) -> Result<SyncStats> {
        let shown: Vec<&RemoteTask> = fetched
            .iter()
            .filter(|t| self.options.show_completed || !t.completed)
            .collect();

        let mut lines = vec![
            "---".to_string(),
            format!("asana_list: {}", source.list_gid),
            format!("personal: {}", source.personal),
            format!("{SYNCED_KEY} {}", now_stamp()),
            "---".to_string(),
            String::new(),
            format!("# {}", source.name),
        ];

        // Unsectioned tasks sit directly under the header, before any
        // section block, matching where the parser's default bucket
        // ends on later passes.
        let mut groups = group_by_section(&shown, &source.list_gid);
        groups.sort_by_key(|(section, _)| section.is_some());

        for (section, tasks) in groups {
            lines.push(String::new());
            if let Some(name) = section {
                lines.push(format!("{SECTION_PREFIX}{name}"));
            }
            for task in tasks {
                lines.push(line::format(task, self.options));
            }
        }
        lines.push(String::new());

        let resolved = self.store.resolve(&source.file);
        self.guard.mark(&resolved);
        self.store.write(&source.file, &lines.join("\n"))?;
        info!(source = %source.name, tasks = shown.len(), "document bootstrapped");

        Ok(SyncStats {
            added: shown.len(),
            updated: 0,
            completion_changes: 0,
        })
    }

    /// Insert formatted lines for tasks the rewrite did not match.
    ///
    /// Tasks are grouped by their section membership in this source's
    /// list. A group whose heading exists is inserted at that section's
    /// end, never inside another section's span; a group whose heading
    /// is missing appends a new block at document end; tasks with no
    /// section append at document end with no heading.
    fn append_new_tasks(
        &self,
        source: &SyncedSource,
        fresh: &[&RemoteTask],
        new_lines: &mut Vec<String>,
    ) {
        if fresh.is_empty() {
            return;
        }

        // Keep a trailing-newline segment at the very end.
        let doc_end = match new_lines.last() {
            Some(last) if last.is_empty() => new_lines.len() - 1,
            _ => new_lines.len(),
        };
        let index = SectionIndex::build(new_lines, doc_end);

        let mut insertions: Vec<(usize, Vec<String>)> = Vec::new();
        let mut appends: Vec<String> = Vec::new();

        for (section, tasks) in group_by_section(fresh, &source.list_gid) {
            let formatted: Vec<String> = tasks
                .iter()
                .map(|t| line::format(t, self.options))
                .collect();

            match section {
                Some(name) => match index.insertion_point(name) {
                    Some(at) => insertions.push((at, formatted)),
                    None => {
                        appends.push(String::new());
                        appends.push(format!("{SECTION_PREFIX}{name}"));
                        appends.extend(formatted);
                    }
                },
                None => appends.extend(formatted),
            }
        }

        // Appends first (they sit past every insertion point), then
        // section insertions back to front so earlier indices hold.
        new_lines.splice(doc_end..doc_end, appends);
        insertions.sort_by(|a, b| b.0.cmp(&a.0));
        for (at, lines) in insertions {
            new_lines.splice(at..at, lines);
        }
    }
}

/// Current UTC timestamp for the frontmatter stamp.
fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Group tasks by their section name within the given list, preserving
/// remote order and first-appearance section order. Tasks without a
/// matching membership land in the `None` group.
fn group_by_section<'t>(
    tasks: &[&'t RemoteTask],
    list_gid: &str,
) -> Vec<(Option<&'t str>, Vec<&'t RemoteTask>)> {
    let mut groups: Vec<(Option<&str>, Vec<&RemoteTask>)> = Vec::new();
    for &task in tasks {
        let key = task.section_in(list_gid);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(task),
            None => groups.push((key, vec![task])),
        }
    }
    groups
}

/// Whether old and new content differ beyond the sync-stamp line.
///
/// The stamp is refreshed on every rewrite; masking it out of the
/// comparison is what keeps a no-change pass from rewriting the file.
fn materially_differs(old: &[String], new: &[String]) -> bool {
    let mask = |l: &String| {
        if l.starts_with(SYNCED_KEY) {
            SYNCED_KEY
        } else {
            l.as_str()
        }
        .to_string()
    };
    old.len() != new.len()
        || old
            .iter()
            .zip(new.iter())
            .any(|(a, b)| mask(a) != mask(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory remote; completion pushes mutate the task set so the
    /// Phase-4 refresh observes them, as the real API does.
    struct MockApi {
        tasks: Mutex<Vec<RemoteTask>>,
        pushes: Mutex<Vec<(String, bool)>>,
        fail_pushes: bool,
    }

    impl MockApi {
        fn new(tasks: Vec<RemoteTask>) -> Self {
            Self {
                tasks: Mutex::new(tasks),
                pushes: Mutex::new(Vec::new()),
                fail_pushes: false,
            }
        }

        fn pushes(&self) -> Vec<(String, bool)> {
            self.pushes.lock().unwrap().clone()
        }

        fn remove_task(&self, gid: &str) {
            self.tasks.lock().unwrap().retain(|t| t.gid != gid);
        }

        fn add_task(&self, task: RemoteTask) {
            self.tasks.lock().unwrap().push(task);
        }
    }

    impl TaskApi for MockApi {
        async fn tasks_for(&self, _source: &SyncedSource) -> Result<Vec<RemoteTask>> {
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn set_completed(&self, task_gid: &str, completed: bool) -> Result<()> {
            if self.fail_pushes {
                return Err(Error::Api("simulated outage".to_string()));
            }
            self.pushes
                .lock()
                .unwrap()
                .push((task_gid.to_string(), completed));
            if let Some(task) = self
                .tasks
                .lock()
                .unwrap()
                .iter_mut()
                .find(|t| t.gid == task_gid)
            {
                task.completed = completed;
            }
            Ok(())
        }
    }

    fn remote(gid: &str, name: &str, completed: bool, section: Option<&str>) -> RemoteTask {
        RemoteTask {
            gid: gid.to_string(),
            name: name.to_string(),
            completed,
            due_on: None,
            assignee: None,
            notes: None,
            permalink_url: None,
            memberships: section
                .map(|s| {
                    vec![crate::model::Membership {
                        list_gid: "1200".to_string(),
                        section_gid: format!("sec-{s}"),
                        section_name: s.to_string(),
                    }]
                })
                .unwrap_or_default(),
        }
    }

    fn source(dir: &TempDir) -> (SyncedSource, DocumentStore) {
        let store = DocumentStore::new(dir.path());
        let source = SyncedSource {
            list_gid: "1200".to_string(),
            name: "Launch".to_string(),
            file: PathBuf::from("launch.md"),
            personal: false,
        };
        (source, store)
    }

    fn engine<'a>(
        api: &'a MockApi,
        store: &'a DocumentStore,
        options: DisplayOptions,
    ) -> ReconciliationEngine<'a, MockApi> {
        ReconciliationEngine::new(api, store, options, Arc::new(WriteGuard::default()))
    }

    #[tokio::test]
    async fn test_bootstrap_creates_document() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![
            remote("1", "First", false, Some("Doing")),
            remote("2", "Second", true, Some("Doing")),
            remote("3", "Loose", false, None),
        ]);

        let stats = engine(&api, &store, DisplayOptions::default())
            .sync_source(&src)
            .await
            .unwrap();

        assert_eq!(stats.added, 3);
        let content = store.read(Path::new("launch.md")).unwrap();
        assert!(content.starts_with("---\nasana_list: 1200\npersonal: false\nsynced: "));
        assert!(content.contains("# Launch"));
        assert!(content.contains("## Doing\n- [ ] First <!-- id:1 -->\n- [x] Second <!-- id:2 -->"));
        // Unsectioned tasks come before any section block.
        assert!(
            content.find("- [ ] Loose <!-- id:3 -->").unwrap()
                < content.find("## Doing").unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_sync_stamp_is_inserted() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![remote("1", "First", false, None)]);

        store
            .write(
                Path::new("launch.md"),
                "---\nasana_list: 1200\n---\n\n# Launch\n\n- [ ] Stale <!-- id:1 -->\n",
            )
            .unwrap();

        engine(&api, &store, DisplayOptions::default())
            .sync_source(&src)
            .await
            .unwrap();

        let content = store.read(Path::new("launch.md")).unwrap();
        assert!(content.contains("asana_list: 1200\nsynced: "));
        assert!(content.contains("- [ ] First <!-- id:1 -->"));
    }

    #[tokio::test]
    async fn test_bootstrap_honors_hide_completed() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![
            remote("1", "Open", false, None),
            remote("2", "Closed", true, None),
        ]);

        let options = DisplayOptions {
            show_completed: false,
            ..DisplayOptions::default()
        };
        let stats = engine(&api, &store, options).sync_source(&src).await.unwrap();

        assert_eq!(stats.added, 1);
        let content = store.read(Path::new("launch.md")).unwrap();
        assert!(content.contains("Open"));
        assert!(!content.contains("Closed"));
    }

    #[tokio::test]
    async fn test_noop_pass_is_byte_stable() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![remote("1", "First", false, Some("Doing"))]);
        let eng = engine(&api, &store, DisplayOptions::default());

        eng.sync_source(&src).await.unwrap();
        let first = store.read(Path::new("launch.md")).unwrap();

        let stats = eng.sync_source(&src).await.unwrap();
        let second = store.read(Path::new("launch.md")).unwrap();

        assert_eq!(stats, SyncStats::default());
        assert!(stats.is_noop());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_conservative_deletion_keeps_orphaned_line() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![remote("1", "Keep", false, None)]);
        let eng = engine(&api, &store, DisplayOptions::default());

        eng.sync_source(&src).await.unwrap();
        api.remove_task("1");
        let stats = eng.sync_source(&src).await.unwrap();

        assert!(stats.is_noop());
        let content = store.read(Path::new("launch.md")).unwrap();
        assert!(content.contains("- [ ] Keep <!-- id:1 -->"));
    }

    #[tokio::test]
    async fn test_conflict_local_wins() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![remote("1", "Draft", false, None)]);

        store
            .write(
                Path::new("launch.md"),
                "# Launch\n\n- [x] Draft <!-- id:1 -->\n",
            )
            .unwrap();

        let stats = engine(&api, &store, DisplayOptions::default())
            .sync_source(&src)
            .await
            .unwrap();

        assert_eq!(api.pushes(), vec![("1".to_string(), true)]);
        assert_eq!(stats.completion_changes, 1);
        let content = store.read(Path::new("launch.md")).unwrap();
        assert!(content.contains("- [x] Draft <!-- id:1 -->"));
    }

    #[tokio::test]
    async fn test_conflict_example_counts_one_update() {
        // Document shows incomplete, remote shows complete: local wins,
        // one push, the rewritten line is textually identical, and the
        // pass still reports one update.
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![remote("111", "Draft", true, None)]);

        store
            .write(Path::new("launch.md"), "- [ ] Draft <!-- id:111 -->\n")
            .unwrap();

        let stats = engine(&api, &store, DisplayOptions::default())
            .sync_source(&src)
            .await
            .unwrap();

        assert_eq!(api.pushes(), vec![("111".to_string(), false)]);
        assert_eq!(stats.completion_changes, 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(
            store.read(Path::new("launch.md")).unwrap(),
            "- [ ] Draft <!-- id:111 -->\n"
        );
    }

    #[tokio::test]
    async fn test_conflict_remote_wins_policy() {
        // Same fixture as the local-wins test, alternate arbitration:
        // nothing is pushed and the rewrite adopts the remote value.
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![remote("1", "Draft", false, None)]);

        store
            .write(
                Path::new("launch.md"),
                "# Launch\n\n- [x] Draft <!-- id:1 -->\n",
            )
            .unwrap();

        let stats = engine(&api, &store, DisplayOptions::default())
            .with_policy(crate::sync::ConflictPolicy::RemoteWins)
            .sync_source(&src)
            .await
            .unwrap();

        assert!(api.pushes().is_empty());
        assert_eq!(stats.completion_changes, 0);
        assert_eq!(stats.updated, 1);
        let content = store.read(Path::new("launch.md")).unwrap();
        assert!(content.contains("- [ ] Draft <!-- id:1 -->"));
    }

    #[tokio::test]
    async fn test_remote_rename_updates_line() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![remote("1", "Old name", false, None)]);
        let eng = engine(&api, &store, DisplayOptions::default());

        eng.sync_source(&src).await.unwrap();
        api.tasks.lock().unwrap()[0].name = "New name".to_string();
        let stats = eng.sync_source(&src).await.unwrap();

        assert_eq!(stats.updated, 1);
        assert_eq!(stats.completion_changes, 0);
        let content = store.read(Path::new("launch.md")).unwrap();
        assert!(content.contains("- [ ] New name <!-- id:1 -->"));
        assert!(!content.contains("Old name"));
    }

    #[tokio::test]
    async fn test_new_task_inserted_inside_existing_section() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![remote("1", "First", false, Some("Doing"))]);
        let eng = engine(&api, &store, DisplayOptions::default());

        eng.sync_source(&src).await.unwrap();
        // A trailing section must not swallow the insertion.
        let mut content = store.read(Path::new("launch.md")).unwrap();
        content.push_str("\n## Done\n- [x] Shipped\n");
        store.write(Path::new("launch.md"), &content).unwrap();

        api.add_task(remote("2", "Second", false, Some("Doing")));
        let stats = eng.sync_source(&src).await.unwrap();

        assert_eq!(stats.added, 1);
        let content = store.read(Path::new("launch.md")).unwrap();
        let doing = content.find("## Doing").unwrap();
        let second = content.find("- [ ] Second <!-- id:2 -->").unwrap();
        let done = content.find("## Done").unwrap();
        assert!(doing < second && second < done);
    }

    #[tokio::test]
    async fn test_new_task_appended_under_empty_existing_section() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(Vec::new());
        let eng = engine(&api, &store, DisplayOptions::default());

        store
            .write(Path::new("launch.md"), "# Launch\n\n## Backlog\n")
            .unwrap();
        api.add_task(remote("9", "Fresh", false, Some("Backlog")));

        let stats = eng.sync_source(&src).await.unwrap();

        assert_eq!(stats.added, 1);
        let content = store.read(Path::new("launch.md")).unwrap();
        assert!(content.contains("## Backlog\n- [ ] Fresh <!-- id:9 -->\n"));
    }

    #[tokio::test]
    async fn test_new_section_heading_appended_at_end() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![remote("1", "First", false, Some("Doing"))]);
        let eng = engine(&api, &store, DisplayOptions::default());

        eng.sync_source(&src).await.unwrap();
        api.add_task(remote("2", "Elsewhere", false, Some("Review")));
        eng.sync_source(&src).await.unwrap();

        let content = store.read(Path::new("launch.md")).unwrap();
        assert!(content.contains("## Review\n- [ ] Elsewhere <!-- id:2 -->"));
        assert!(content.find("## Doing").unwrap() < content.find("## Review").unwrap());
        assert!(content.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_hide_completed_drops_lines_without_touching_remote() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![
            remote("1", "Open", false, None),
            remote("2", "Closed", true, None),
        ]);

        engine(&api, &store, DisplayOptions::default())
            .sync_source(&src)
            .await
            .unwrap();
        assert!(store
            .read(Path::new("launch.md"))
            .unwrap()
            .contains("Closed"));

        let hidden = DisplayOptions {
            show_completed: false,
            ..DisplayOptions::default()
        };
        let stats = engine(&api, &store, hidden).sync_source(&src).await.unwrap();

        assert_eq!(stats.added, 0);
        assert_eq!(stats.completion_changes, 0);
        let content = store.read(Path::new("launch.md")).unwrap();
        assert!(!content.contains("Closed"));
        assert!(content.contains("Open"));
        // Remote completion state is untouched.
        assert!(api.pushes().is_empty());
        assert!(api.tasks.lock().unwrap().iter().any(|t| t.completed));
    }

    #[tokio::test]
    async fn test_push_failure_does_not_abort_pass() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let mut api = MockApi::new(vec![
            remote("1", "Conflicted", false, None),
            remote("2", "Renamed", false, None),
        ]);
        api.fail_pushes = true;

        store
            .write(
                Path::new("launch.md"),
                "- [x] Conflicted <!-- id:1 -->\n- [ ] Old <!-- id:2 -->\n",
            )
            .unwrap();

        let stats = engine(&api, &store, DisplayOptions::default())
            .sync_source(&src)
            .await
            .unwrap();

        // The failed push is not counted and the rewrite still runs:
        // the conflicted line adopts the remote value and the stale
        // title refreshes.
        assert_eq!(stats.completion_changes, 0);
        let content = store.read(Path::new("launch.md")).unwrap();
        assert!(content.contains("- [ ] Conflicted <!-- id:1 -->"));
        assert!(content.contains("- [ ] Renamed <!-- id:2 -->"));
    }

    #[tokio::test]
    async fn test_sync_all_isolates_source_failures() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());

        struct FlakyApi {
            inner: MockApi,
        }
        impl TaskApi for FlakyApi {
            async fn tasks_for(&self, source: &SyncedSource) -> Result<Vec<RemoteTask>> {
                if source.name == "Broken" {
                    return Err(Error::Api("list is gone".to_string()));
                }
                self.inner.tasks_for(source).await
            }
            async fn set_completed(&self, task_gid: &str, completed: bool) -> Result<()> {
                self.inner.set_completed(task_gid, completed).await
            }
        }

        let api = FlakyApi {
            inner: MockApi::new(vec![remote("1", "Fine", false, None)]),
        };
        let sources = vec![
            SyncedSource {
                list_gid: "bad".to_string(),
                name: "Broken".to_string(),
                file: PathBuf::from("broken.md"),
                personal: false,
            },
            SyncedSource {
                list_gid: "1200".to_string(),
                name: "Launch".to_string(),
                file: PathBuf::from("launch.md"),
                personal: false,
            },
        ];

        let guard = Arc::new(WriteGuard::default());
        let eng = ReconciliationEngine::new(&api, &store, DisplayOptions::default(), guard);
        let outcomes = eng.sync_all(&sources).await;

        assert!(outcomes[0].result.is_err());
        assert_eq!(outcomes[1].result.as_ref().unwrap().added, 1);
        assert!(store.exists(Path::new("launch.md")));
    }

    #[tokio::test]
    async fn test_untagged_lines_and_prose_survive_rewrite() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![remote("1", "Tracked", false, None)]);

        let body = "# Launch\n\nNotes the engine must keep.\n- [ ] Private item\n- [ ] Tracked <!-- id:1 -->\n";
        store.write(Path::new("launch.md"), body).unwrap();

        engine(&api, &store, DisplayOptions::default())
            .sync_source(&src)
            .await
            .unwrap();

        let content = store.read(Path::new("launch.md")).unwrap();
        assert!(content.contains("Notes the engine must keep."));
        assert!(content.contains("- [ ] Private item"));
        assert!(api.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_sync_stamp_refreshes_only_on_material_change() {
        let dir = TempDir::new().unwrap();
        let (src, store) = source(&dir);
        let api = MockApi::new(vec![remote("1", "First", false, None)]);
        let eng = engine(&api, &store, DisplayOptions::default());

        eng.sync_source(&src).await.unwrap();
        let first = store.read(Path::new("launch.md")).unwrap();

        // No remote change: the stamp (and everything else) holds.
        eng.sync_source(&src).await.unwrap();
        assert_eq!(store.read(Path::new("launch.md")).unwrap(), first);

        // A remote change rewrites the document, stamp included.
        api.add_task(remote("2", "Second", false, None));
        eng.sync_source(&src).await.unwrap();
        let third = store.read(Path::new("launch.md")).unwrap();
        assert!(third.contains("Second"));
        assert!(third.contains("synced: "));
    }

    #[test]
    fn test_materially_differs_masks_stamp_line() {
        let old = vec![
            "---".to_string(),
            "synced: 2025-01-01T00:00:00Z".to_string(),
            "---".to_string(),
        ];
        let new = vec![
            "---".to_string(),
            "synced: 2026-01-01T00:00:00Z".to_string(),
            "---".to_string(),
        ];
        assert!(!materially_differs(&old, &new));

        let mut changed = new.clone();
        changed.push("- [ ] extra".to_string());
        assert!(materially_differs(&old, &changed));
    }
}
