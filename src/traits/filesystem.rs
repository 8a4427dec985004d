use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Trait for filesystem operations to enable testing with mocks
pub trait FileSystem: Send + Sync {
    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write bytes to a file, replacing any previous content
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Create directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Create a fresh, uniquely named directory under the system temp dir.
    /// The directory is left in place when the process exits.
    fn create_temp_dir(&self) -> Result<PathBuf>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// All regular files below `path` (or `path` itself when it is a file),
    /// sorted for a stable traversal order
    fn walk_files(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Real filesystem implementation using std::fs
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        std::fs::write(path, contents).with_context(|| format!("Failed to write file: {:?}", path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {:?}", path))
    }

    fn create_temp_dir(&self) -> Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix("polaris-")
            .tempdir()
            .context("Failed to create temporary directory")?;

        Ok(dir.keep())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn walk_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        use walkdir::WalkDir;

        let mut paths = Vec::new();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk directory: {:?}", path))?;
            if entry.file_type().is_file() {
                paths.push(entry.path().to_path_buf());
            }
        }

        Ok(paths)
    }
}

/// Mock filesystem implementation for testing (in-memory)
#[allow(dead_code)]
pub struct MockFileSystem {
    files: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
    temp_dirs: Arc<RwLock<Vec<PathBuf>>>,
    fail_writes: bool,
}

#[allow(dead_code)]
impl MockFileSystem {
    /// A temp dir, or any prefix of a stored file
    fn is_dir(&self, path: &Path) -> bool {
        self.temp_dirs.read().unwrap().iter().any(|d| d == path)
            || self
                .files
                .read()
                .unwrap()
                .keys()
                .any(|f| f != path && f.starts_with(path))
    }

    /// Create new empty mock filesystem
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
            temp_dirs: Arc::new(RwLock::new(Vec::new())),
            fail_writes: false,
        }
    }

    /// A filesystem on which every write fails
    pub fn read_only() -> Self {
        Self {
            fail_writes: true,
            ..Self::new()
        }
    }

    /// Seed a file
    pub fn with_file(self, path: &str, contents: &str) -> Self {
        self.files
            .write()
            .unwrap()
            .insert(PathBuf::from(path), contents.as_bytes().to_vec());
        self
    }

    /// Get captured file contents for testing assertions
    pub fn get_file_contents(&self, path: &Path) -> Option<String> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).to_string())
    }

    /// Check if file was written
    pub fn has_file(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }

    /// Temporary directories handed out so far
    pub fn temp_dirs(&self) -> Vec<PathBuf> {
        self.temp_dirs.read().unwrap().clone()
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.get_file_contents(path)
            .with_context(|| format!("File not found in mock filesystem: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if self.fail_writes {
            anyhow::bail!("Failed to write file: {:?}", path);
        }

        self.files
            .write()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, _path: &Path) -> Result<()> {
        // Directories are implied by the files beneath them
        Ok(())
    }

    fn create_temp_dir(&self) -> Result<PathBuf> {
        let mut dirs = self.temp_dirs.write().unwrap();
        let dir = PathBuf::from(format!("/tmp/polaris-mock-{}", dirs.len()));
        dirs.push(dir.clone());
        Ok(dir)
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_dir(path) || self.files.read().unwrap().contains_key(path)
    }

    fn walk_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.files.read().unwrap();

        let mut entries: Vec<PathBuf> = files
            .keys()
            .filter(|f| f.starts_with(path))
            .cloned()
            .collect();

        if entries.is_empty() && !self.is_dir(path) {
            anyhow::bail!("Failed to walk directory: {:?}", path);
        }

        entries.sort();
        Ok(entries)
    }
}
