// Folder upload - Walks a local directory and reads every text file concurrently
use crate::models::UploadedFile;
use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Directories never worth uploading
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target", "__pycache__", ".venv"];

pub struct FolderUpload {
    root: PathBuf,
    include_hidden: bool,
}

impl FolderUpload {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            include_hidden: false,
        }
    }

    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Files under the root, as `(absolute path, relative path)` pairs in walk order.
    /// Relative paths start with the root folder's own name.
    pub fn list(&self) -> Result<Vec<(PathBuf, String)>> {
        if !self.root.is_dir() {
            return Err(anyhow!("Not a directory: {}", self.root.display()));
        }
        let root_name = self
            .root
            .canonicalize()
            .with_context(|| format!("Cannot resolve {}", self.root.display()))?
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("root")
            .to_string();

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || self.keep(e.file_name().to_str()))
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .with_context(|| format!("{} escaped the upload root", entry.path().display()))?;
            let mut relative_path = root_name.clone();
            for part in relative.components() {
                relative_path.push('/');
                relative_path.push_str(&part.as_os_str().to_string_lossy());
            }
            files.push((entry.path().to_path_buf(), relative_path));
        }
        Ok(files)
    }

    fn keep(&self, name: Option<&str>) -> bool {
        let Some(name) = name else {
            return false;
        };
        if SKIPPED_DIRS.contains(&name) {
            return false;
        }
        self.include_hidden || !name.starts_with('.')
    }

    /// Read every listed file concurrently. Results come back in listing order no
    /// matter which read finishes first; unreadable or non-UTF-8 files are skipped.
    pub async fn read_all(&self) -> Result<Vec<UploadedFile>> {
        let listed = self.list()?;
        info!("Reading {} files from {}", listed.len(), self.root.display());

        let reads = listed
            .into_iter()
            .map(|(path, relative_path)| async move {
                match tokio::fs::read(&path).await {
                    Ok(bytes) => match String::from_utf8(bytes) {
                        Ok(content) => Some(UploadedFile::new(relative_path, content)),
                        Err(_) => {
                            warn!("Skipping non-UTF-8 file {}", path.display());
                            None
                        }
                    },
                    Err(e) => {
                        warn!("Could not read {}: {}", path.display(), e);
                        None
                    }
                }
            });

        Ok(join_all(reads).await.into_iter().flatten().collect())
    }
}

/// Read a single source file given on the command line
pub fn read_source_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_tree::{build_file_tree, find_node};
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/util")).unwrap();
        fs::create_dir_all(root.join("node_modules/left-pad")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("src/main.py"), "print('hi')").unwrap();
        fs::write(root.join("src/util/helpers.js"), "export {}").unwrap();
        fs::write(root.join("README.md"), "# readme").unwrap();
        fs::write(root.join("logo.png"), [0x89u8, 0x50, 0xff, 0xfe]).unwrap();
        fs::write(root.join("node_modules/left-pad/index.js"), "x").unwrap();
        fs::write(root.join(".git/HEAD"), "ref").unwrap();
        fs::write(root.join(".env"), "SECRET=1").unwrap();
        dir
    }

    #[test]
    fn test_list_prefixes_root_name_and_skips_noise() {
        let dir = fixture();
        let root_name = dir
            .path()
            .canonicalize()
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();

        let listed = FolderUpload::new(dir.path().to_path_buf()).list().unwrap();
        let relative: Vec<_> = listed.iter().map(|(_, r)| r.clone()).collect();

        assert!(relative.contains(&format!("{}/src/main.py", root_name)));
        assert!(relative.contains(&format!("{}/src/util/helpers.js", root_name)));
        assert!(relative.iter().all(|r| !r.contains("node_modules")));
        assert!(relative.iter().all(|r| !r.contains(".git/")));
        assert!(relative.iter().all(|r| !r.ends_with(".env")));
    }

    #[test]
    fn test_hidden_files_opt_in() {
        let dir = fixture();
        let listed = FolderUpload::new(dir.path().to_path_buf())
            .with_hidden(true)
            .list()
            .unwrap();
        assert!(listed.iter().any(|(_, r)| r.ends_with("/.env")));
        assert!(listed.iter().all(|(_, r)| !r.contains("/.git/")));
    }

    #[tokio::test]
    async fn test_read_all_builds_complete_tree() {
        let dir = fixture();
        let upload = FolderUpload::new(dir.path().to_path_buf());
        let files = upload.read_all().await.unwrap();

        // logo.png is not UTF-8
        assert_eq!(files.len(), 3);
        let root_name = files[0].relative_path.split('/').next().unwrap().to_string();

        let tree = build_file_tree(files);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].file_count(), 3);
        let helpers = find_node(&tree, &format!("{}/src/util/helpers.js", root_name)).unwrap();
        match helpers {
            crate::models::FileNode::File { content, language, .. } => {
                assert_eq!(content, "export {}");
                assert_eq!(language, "javascript");
            }
            other => panic!("expected file, got {:?}", other),
        }
    }

    /// Collects formatted log output for assertions
    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_skipped_binary_file_is_warned() {
        let dir = fixture();
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let files = FolderUpload::new(dir.path().to_path_buf())
            .read_all()
            .await
            .unwrap();
        assert!(files.iter().all(|f| !f.relative_path.ends_with("logo.png")));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "got {:?}", output);
        assert!(output.contains("logo.png"), "got {:?}", output);
    }

    #[test]
    fn test_list_rejects_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(FolderUpload::new(missing).list().is_err());
    }
}
