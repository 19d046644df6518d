//! Builds aggregate file/folder trees from filesystem paths.
//!
//! Every directory fans out one scan per eligible child and joins all of them
//! before aggregating, so total latency follows tree depth rather than entry
//! count. Results are collected positionally: a folder's children keep the
//! order of its directory listing no matter which scan finishes first.

use futures::future::{join_all, BoxFuture, FutureExt};
use globset::GlobSet;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use super::error::CoreError;
use super::fs::{FileSystem, TokioFileSystem};
use super::ignore::build_globset_from_patterns;
use super::node::{FileNode, FolderNode, Node};
use crate::utils::file_detection::ExtensionFilter;

const PROGRESS_UPDATE_INTERVAL: usize = 25;

/// A snapshot of a running scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    /// Paths stat'ed so far, eligible or not.
    pub entries_visited: usize,
    pub files_matched: usize,
    pub bytes_matched: u64,
    /// The path being visited, `None` for the final report.
    pub current_path: Option<PathBuf>,
}

type ProgressCallback = Arc<dyn Fn(ScanProgress) + Send + Sync>;

struct ProgressTracker {
    callback: ProgressCallback,
    entries_visited: AtomicUsize,
    files_matched: AtomicUsize,
    bytes_matched: AtomicU64,
}

impl ProgressTracker {
    fn snapshot(&self, current_path: Option<PathBuf>) -> ScanProgress {
        ScanProgress {
            entries_visited: self.entries_visited.load(Ordering::Relaxed),
            files_matched: self.files_matched.load(Ordering::Relaxed),
            bytes_matched: self.bytes_matched.load(Ordering::Relaxed),
            current_path,
        }
    }
}

/// Scanner turning paths into [`Node`] trees.
///
/// Filesystem failures never escape: they are logged and the affected path
/// contributes nothing. The only state it carries is the optional progress
/// counters, which are shared between clones.
#[derive(Clone)]
pub struct TreeBuilder {
    fs: Arc<dyn FileSystem>,
    filter: ExtensionFilter,
    ignore_set: GlobSet,
    follow_symlinks: bool,
    progress: Option<Arc<ProgressTracker>>,
}

impl TreeBuilder {
    pub fn new(fs: Arc<dyn FileSystem>, filter: ExtensionFilter) -> Self {
        Self {
            fs,
            filter,
            ignore_set: GlobSet::empty(),
            follow_symlinks: false,
            progress: None,
        }
    }

    /// A builder over the real filesystem with the default allow-list.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(TokioFileSystem::new()), ExtensionFilter::default())
    }

    pub fn with_ignore_patterns(mut self, patterns: &HashSet<String>) -> Result<Self, CoreError> {
        self.ignore_set = build_globset_from_patterns(patterns)?;
        Ok(self)
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Calls `callback` every few visited entries and once more when
    /// [`TreeBuilder::process_paths`] finishes.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ScanProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(ProgressTracker {
            callback: Arc::new(callback),
            entries_visited: AtomicUsize::new(0),
            files_matched: AtomicUsize::new(0),
            bytes_matched: AtomicU64::new(0),
        }));
        self
    }

    /// Scans every path concurrently and returns the non-empty results in input order.
    pub async fn process_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<Node> {
        let scans = paths
            .iter()
            .map(|path| self.build_file_tree(path.as_ref().to_path_buf()));

        let roots: Vec<Node> = join_all(scans).await.into_iter().flatten().collect();
        if let Some(tracker) = &self.progress {
            (tracker.callback)(tracker.snapshot(None));
        }
        tracing::info!(
            "Scanned {} path(s), {} produced eligible content",
            paths.len(),
            roots.len()
        );
        roots
    }

    /// Builds the tree rooted at `path`.
    ///
    /// Returns `None` when the path cannot be read, is an ineligible file, is
    /// ignored, or is a directory without any eligible descendant.
    pub fn build_file_tree(&self, path: PathBuf) -> BoxFuture<'_, Option<Node>> {
        async move {
            if self.ignore_set.is_match(&path) {
                tracing::debug!("Skipping ignored path {}", path.display());
                return None;
            }

            let name = display_name(&path);

            let metadata = match self.fs.stat(&path).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::error!("Failed to stat {}: {}", path.display(), e);
                    return None;
                }
            };

            if metadata.is_symlink && !self.follow_symlinks {
                tracing::debug!("Skipping symlink {}", path.display());
                return None;
            }

            if !metadata.is_directory {
                if self.filter.is_supported_path(&path) {
                    self.record_visit(&path, Some(metadata.size));
                    return Some(FileNode::new(name, path, metadata.size).into());
                }
                self.record_visit(&path, None);
                return None;
            }
            self.record_visit(&path, None);

            let entries = match self.fs.read_dir(&path).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!("Error reading dir {}: {}", path.display(), e);
                    return None;
                }
            };

            let scans = entries
                .into_iter()
                .filter(|entry| !entry.is_file || self.filter.is_supported(&entry.name))
                .map(|entry| {
                    let child_path = self.fs.join(&path, &entry.name);
                    self.build_file_tree(child_path)
                });

            let children: Vec<Node> = join_all(scans).await.into_iter().flatten().collect();

            FolderNode::new(name, path, children).map(Node::Folder)
        }
        .boxed()
    }

    fn record_visit(&self, path: &Path, matched_size: Option<u64>) {
        let Some(tracker) = &self.progress else {
            return;
        };
        if let Some(size) = matched_size {
            tracker.files_matched.fetch_add(1, Ordering::Relaxed);
            tracker.bytes_matched.fetch_add(size, Ordering::Relaxed);
        }
        let visited = tracker.entries_visited.fetch_add(1, Ordering::Relaxed) + 1;
        if visited % PROGRESS_UPDATE_INTERVAL == 0 {
            (tracker.callback)(tracker.snapshot(Some(path.to_path_buf())));
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fs::{DirEntry, EntryMetadata};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tracing_test::traced_test;

    enum MockEntry {
        File { size: u64, delay_ms: u64 },
        Dir { children: Vec<String> },
        Unlistable,
        Link { target_is_dir: bool },
    }

    /// In-memory filesystem with per-entry latency and in-flight tracking.
    #[derive(Default)]
    struct MockFileSystem {
        entries: HashMap<PathBuf, MockEntry>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockFileSystem {
        fn file(mut self, path: &str, size: u64) -> Self {
            self.entries
                .insert(PathBuf::from(path), MockEntry::File { size, delay_ms: 5 });
            self
        }

        fn slow_file(mut self, path: &str, size: u64, delay_ms: u64) -> Self {
            self.entries
                .insert(PathBuf::from(path), MockEntry::File { size, delay_ms });
            self
        }

        fn dir<S: Into<String>>(mut self, path: &str, children: Vec<S>) -> Self {
            let children = children.into_iter().map(Into::into).collect();
            self.entries
                .insert(PathBuf::from(path), MockEntry::Dir { children });
            self
        }

        fn unlistable(mut self, path: &str) -> Self {
            self.entries.insert(PathBuf::from(path), MockEntry::Unlistable);
            self
        }

        fn link(mut self, path: &str, target_is_dir: bool) -> Self {
            self.entries
                .insert(PathBuf::from(path), MockEntry::Link { target_is_dir });
            self
        }

        async fn enter(&self, delay_ms: u64) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        fn not_found(path: &Path) -> CoreError {
            CoreError::io(io::Error::new(io::ErrorKind::NotFound, "no such entry"), path)
        }
    }

    #[async_trait]
    impl FileSystem for MockFileSystem {
        async fn stat(&self, path: &Path) -> Result<EntryMetadata, CoreError> {
            let delay = match self.entries.get(path) {
                Some(MockEntry::File { delay_ms, .. }) => *delay_ms,
                _ => 1,
            };
            self.enter(delay).await;
            match self.entries.get(path) {
                Some(MockEntry::File { size, .. }) => Ok(EntryMetadata {
                    is_directory: false,
                    size: *size,
                    is_symlink: false,
                }),
                Some(MockEntry::Dir { .. }) | Some(MockEntry::Unlistable) => Ok(EntryMetadata {
                    is_directory: true,
                    size: 4096,
                    is_symlink: false,
                }),
                Some(MockEntry::Link { target_is_dir }) => Ok(EntryMetadata {
                    is_directory: *target_is_dir,
                    size: 10,
                    is_symlink: true,
                }),
                None => Err(Self::not_found(path)),
            }
        }

        async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>, CoreError> {
            self.enter(1).await;
            match self.entries.get(path) {
                Some(MockEntry::Dir { children }) => Ok(children
                    .iter()
                    .map(|name| {
                        let child = path.join(name);
                        let is_file =
                            matches!(self.entries.get(&child), Some(MockEntry::File { .. }));
                        DirEntry {
                            name: name.to_string(),
                            is_file,
                        }
                    })
                    .collect()),
                Some(MockEntry::Unlistable) => Err(CoreError::io(
                    io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
                    path,
                )),
                _ => Err(Self::not_found(path)),
            }
        }
    }

    fn builder(fs: MockFileSystem) -> (TreeBuilder, Arc<MockFileSystem>) {
        let fs = Arc::new(fs);
        let builder = TreeBuilder::new(fs.clone(), ExtensionFilter::default());
        (builder, fs)
    }

    fn child_names(node: &Node) -> Vec<&str> {
        node.children().iter().map(Node::name).collect()
    }

    fn assert_rollups(node: &Node) {
        if let Node::Folder(folder) = node {
            assert!(!folder.children.is_empty());
            let size: u64 = folder.children.iter().map(Node::size).sum();
            let count: u64 = folder.children.iter().map(Node::file_count).sum();
            assert_eq!(folder.size, size, "size rollup of {}", folder.name);
            assert_eq!(folder.file_count, count, "count rollup of {}", folder.name);
            folder.children.iter().for_each(assert_rollups);
        }
    }

    #[tokio::test]
    async fn test_single_eligible_file() {
        let (builder, _) = builder(MockFileSystem::default().file("/pics/a.PNG", 12));

        let node = builder.build_file_tree(PathBuf::from("/pics/a.PNG")).await.unwrap();
        match node {
            Node::File(file) => {
                assert_eq!(file.name, "a.PNG");
                assert_eq!(file.extension, "PNG");
                assert_eq!(file.size, 12);
                assert_eq!(file.file_count, 1);
            }
            Node::Folder(_) => panic!("expected a file node"),
        }
    }

    #[tokio::test]
    async fn test_ineligible_file_is_absent() {
        let (builder, _) = builder(MockFileSystem::default().file("/docs/readme.txt", 12));
        assert!(builder
            .build_file_tree(PathBuf::from("/docs/readme.txt"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_nested_rollups() {
        let fs = MockFileSystem::default()
            .dir("/root", vec!["a.png", "sub", "notes.txt"])
            .file("/root/a.png", 10)
            .file("/root/notes.txt", 1000)
            .dir("/root/sub", vec!["b.jpg", "c.jpeg"])
            .file("/root/sub/b.jpg", 20)
            .file("/root/sub/c.jpeg", 30);
        let (builder, _) = builder(fs);

        let root = builder.build_file_tree(PathBuf::from("/root")).await.unwrap();

        assert_eq!(root.size(), 60);
        assert_eq!(root.file_count(), 3);
        assert_eq!(child_names(&root), vec!["a.png", "sub"]);
        assert_rollups(&root);
        match &root {
            Node::Folder(folder) => assert!(!folder.is_open),
            Node::File(_) => panic!("expected a folder"),
        }
    }

    #[tokio::test]
    async fn test_empty_folders_are_pruned() {
        let fs = MockFileSystem::default()
            .dir("/root", vec!["only_text", "empty", "keep"])
            .dir("/root/only_text", vec!["a.txt", "b.md"])
            .file("/root/only_text/a.txt", 1)
            .file("/root/only_text/b.md", 1)
            .dir("/root/empty", vec!["nested"])
            .dir("/root/empty/nested", Vec::<String>::new())
            .dir("/root/keep", vec!["x.png"])
            .file("/root/keep/x.png", 1);
        let (builder, _) = builder(fs);

        let root = builder.build_file_tree(PathBuf::from("/root")).await.unwrap();
        assert_eq!(child_names(&root), vec!["keep"]);

        let (builder, _) = self::builder(
            MockFileSystem::default()
                .dir("/bare", vec!["a.txt", "deep"])
                .file("/bare/a.txt", 1)
                .dir("/bare/deep", vec!["b.txt"])
                .file("/bare/deep/b.txt", 1),
        );
        assert!(builder.build_file_tree(PathBuf::from("/bare")).await.is_none());
    }

    #[tokio::test]
    async fn test_child_order_follows_listing_not_completion() {
        let fs = MockFileSystem::default()
            .dir("/root", vec!["b.png", "a.png", "c.png"])
            .slow_file("/root/b.png", 1, 40)
            .slow_file("/root/a.png", 2, 1)
            .slow_file("/root/c.png", 3, 20);
        let (builder, _) = builder(fs);

        let root = builder.build_file_tree(PathBuf::from("/root")).await.unwrap();
        assert_eq!(child_names(&root), vec!["b.png", "a.png", "c.png"]);
    }

    #[tokio::test]
    async fn test_children_are_scanned_concurrently() {
        let fs = MockFileSystem::default()
            .dir("/root", vec!["a.png", "b.png", "c.png", "d.png"])
            .slow_file("/root/a.png", 1, 30)
            .slow_file("/root/b.png", 1, 30)
            .slow_file("/root/c.png", 1, 30)
            .slow_file("/root/d.png", 1, 30);
        let (builder, fs) = builder(fs);

        builder.build_file_tree(PathBuf::from("/root")).await.unwrap();
        assert!(fs.max_in_flight.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_stat_failure_only_drops_that_child() {
        let fs = MockFileSystem::default()
            .dir("/root", vec!["ghost", "a.png"])
            .file("/root/a.png", 5);
        let (builder, _) = builder(fs);

        let root = builder.build_file_tree(PathBuf::from("/root")).await.unwrap();
        assert_eq!(child_names(&root), vec!["a.png"]);
        assert!(logs_contain("Failed to stat /root/ghost"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unlistable_directory_is_absent() {
        let fs = MockFileSystem::default()
            .dir("/root", vec!["locked", "open"])
            .unlistable("/root/locked")
            .dir("/root/open", vec!["a.png"])
            .file("/root/open/a.png", 5);
        let (builder, _) = builder(fs);

        let root = builder.build_file_tree(PathBuf::from("/root")).await.unwrap();
        assert_eq!(child_names(&root), vec!["open"]);
        assert!(logs_contain("Error reading dir /root/locked"));
    }

    #[tokio::test]
    async fn test_process_paths_keeps_input_order_and_drops_absent() {
        let fs = MockFileSystem::default()
            .slow_file("/z.png", 1, 30)
            .file("/skip.txt", 1)
            .dir("/dir", vec!["m.jpg"])
            .slow_file("/dir/m.jpg", 2, 1);
        let (builder, _) = builder(fs);

        let roots = builder
            .process_paths(&["/z.png", "/missing", "/skip.txt", "/dir"])
            .await;
        let names: Vec<&str> = roots.iter().map(Node::name).collect();
        assert_eq!(names, vec!["z.png", "dir"]);
    }

    #[tokio::test]
    async fn test_ignore_patterns_drop_subtrees() {
        let fs = MockFileSystem::default()
            .dir("/root", vec!["node_modules", "src"])
            .dir("/root/node_modules", vec!["logo.png"])
            .file("/root/node_modules/logo.png", 9)
            .dir("/root/src", vec!["icon.png"])
            .file("/root/src/icon.png", 3);
        let (builder, _) = builder(fs);
        let patterns: HashSet<String> = ["node_modules".to_string()].into_iter().collect();
        let builder = builder.with_ignore_patterns(&patterns).unwrap();

        let root = builder.build_file_tree(PathBuf::from("/root")).await.unwrap();
        assert_eq!(child_names(&root), vec!["src"]);
        assert_eq!(root.size(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_directory_on_disk() {
        use crate::utils::test_helpers::running_as_root;
        use std::os::unix::fs::PermissionsExt;

        if running_as_root() {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("a.png"), b"xx").unwrap();
        std::fs::write(dir.path().join("b.png"), b"yyy").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let root = TreeBuilder::with_defaults()
            .build_file_tree(dir.path().to_path_buf())
            .await;

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        let root = root.unwrap();
        assert_eq!(child_names(&root), vec!["b.png"]);
        assert_eq!(root.size(), 3);
    }

    #[tokio::test]
    async fn test_symlinks_skipped_unless_followed() {
        let fs = MockFileSystem::default()
            .dir("/root", vec!["alias.png", "real.png"])
            .link("/root/alias.png", false)
            .file("/root/real.png", 4);
        let (builder, _) = builder(fs);

        let root = builder.build_file_tree(PathBuf::from("/root")).await.unwrap();
        assert_eq!(child_names(&root), vec!["real.png"]);

        let followed = builder
            .with_follow_symlinks(true)
            .build_file_tree(PathBuf::from("/root"))
            .await
            .unwrap();
        assert_eq!(child_names(&followed), vec!["alias.png", "real.png"]);
        assert_eq!(followed.size(), 14);
    }

    #[tokio::test]
    async fn test_progress_is_reported_and_finishes_with_totals() {
        let names: Vec<String> = (0..30).map(|i| format!("img_{i:02}.png")).collect();
        let mut listing = names.clone();
        listing.push("notes.txt".to_string());
        let mut fs = MockFileSystem::default()
            .dir("/root", listing)
            .file("/root/notes.txt", 100);
        for name in &names {
            fs = fs.file(&format!("/root/{name}"), 2);
        }
        let (builder, _) = builder(fs);

        let reports = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = reports.clone();
        let builder = builder.with_progress(move |progress| sink.lock().unwrap().push(progress));

        let roots = builder.process_paths(&["/root"]).await;
        assert_eq!(roots[0].file_count(), 30);

        let reports = reports.lock().unwrap();
        assert!(reports.len() >= 2, "expected periodic and final reports");
        assert!(reports[0].current_path.is_some());
        assert_eq!(reports[0].entries_visited, PROGRESS_UPDATE_INTERVAL);

        let last = reports.last().unwrap();
        assert_eq!(last.current_path, None);
        // 30 images plus the directory itself; notes.txt is skipped before stat.
        assert_eq!(last.entries_visited, 31);
        assert_eq!(last.files_matched, 30);
        assert_eq!(last.bytes_matched, 60);
    }

    #[tokio::test]
    async fn test_no_progress_without_callback() {
        let (builder, _) = builder(MockFileSystem::default().file("/a.png", 1));
        assert_eq!(builder.process_paths(&["/a.png"]).await.len(), 1);
    }
}
