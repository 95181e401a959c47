// file: src/reader/directory.rs
// description: Directory walking, file filtering and document loading
// reference: https://docs.rs/walkdir

use crate::config::ReaderConfig;
use crate::error::{RagError, Result};
use crate::models::Document;
use crate::parser::{FrontmatterParser, MarkdownNormalizer, MarkdownParser};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

const BINARY_SNIFF_BYTES: usize = 8192;

pub struct DirectoryReader {
    config: ReaderConfig,
    frontmatter: FrontmatterParser,
    normalizer: MarkdownNormalizer,
    markdown: MarkdownParser,
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub size: u64,
    pub modified: u64,
}

impl DirectoryReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self {
            config,
            frontmatter: FrontmatterParser::new(),
            normalizer: MarkdownNormalizer::new(),
            markdown: MarkdownParser::new(),
        }
    }

    /// Reads every eligible file under `root` into a `Document`, ordered by
    /// relative path.
    pub fn load_data(&self, root: &Path) -> Result<Vec<Document>> {
        let files = self.scan_directory(root)?;

        let mut documents = Vec::with_capacity(files.len());
        for file in &files {
            match self.load_file(file)? {
                Some(document) => documents.push(document),
                None => debug!("Skipped binary file: {}", file.relative_path),
            }
        }

        if documents.is_empty() {
            return Err(RagError::Reader(format!(
                "No readable documents found in {}",
                root.display()
            )));
        }

        info!("Loaded {} documents from {}", documents.len(), root.display());
        Ok(documents)
    }

    pub fn scan_directory(&self, root: &Path) -> Result<Vec<ScannedFile>> {
        if !root.exists() {
            return Err(RagError::Reader(format!(
                "Data directory does not exist: {}",
                root.display()
            )));
        }

        if !root.is_dir() {
            return Err(RagError::Reader(format!(
                "Data path is not a directory: {}",
                root.display()
            )));
        }

        info!("Scanning directory: {}", root.display());
        let mut files = Vec::new();
        let max_size = (self.config.max_file_size_mb as u64) * 1024 * 1024;

        let mut walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let exclude_hidden = self.config.exclude_hidden;
        for entry in walker
            .into_iter()
            .filter_entry(|e| !(exclude_hidden && e.depth() > 0 && is_hidden(e)))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative_path = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            if self.should_skip(&relative_path) {
                debug!("Skipping file: {}", relative_path);
                continue;
            }

            if !self.extension_allowed(path) {
                debug!("Skipping by extension: {}", relative_path);
                continue;
            }

            let metadata = entry.metadata().map_err(|e| RagError::Reader(e.to_string()))?;
            let size = metadata.len();

            if max_size > 0 && size > max_size {
                warn!(
                    "Skipping large file ({} MB): {}",
                    size / 1024 / 1024,
                    relative_path
                );
                continue;
            }

            let modified = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0);

            files.push(ScannedFile {
                path: path.to_path_buf(),
                relative_path,
                size,
                modified,
            });
        }

        info!("Found {} files", files.len());
        Ok(files)
    }

    fn load_file(&self, file: &ScannedFile) -> Result<Option<Document>> {
        let bytes = fs::read(&file.path).map_err(|source| RagError::FileOperation {
            path: file.path.clone(),
            source,
        })?;

        let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
        if sniff.contains(&0) {
            return Ok(None);
        }

        let mut content = String::from_utf8_lossy(&bytes).into_owned();
        let mut title = None;

        if is_markdown(&file.path) {
            match self.frontmatter.extract(&file.relative_path, &content) {
                Ok(Some((frontmatter, body))) => {
                    title = frontmatter.title();
                    content = body;
                }
                Ok(None) => {}
                Err(e) => warn!("Keeping raw content of {}: {}", file.relative_path, e),
            }

            content = self.normalizer.normalize(&content);
            if title.is_none() {
                title = self.markdown.title(&content);
            }
        }

        let document = Document::new(
            file.path.display().to_string(),
            file.relative_path.clone(),
            content,
            file.size,
            file.modified,
        )
        .with_title(title);

        Ok(Some(document))
    }

    fn should_skip(&self, relative_path: &str) -> bool {
        for pattern in &self.config.skip_patterns {
            if let Some(suffix) = pattern.strip_prefix('*') {
                if relative_path.ends_with(suffix) {
                    return true;
                }
            } else if relative_path.contains(pattern.as_str()) {
                return true;
            }
        }

        false
    }

    fn extension_allowed(&self, path: &Path) -> bool {
        if self.config.extensions.is_empty() {
            return true;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let ext = e.to_ascii_lowercase();
                self.config
                    .extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
            })
            .unwrap_or(false)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("md") | Some("markdown")
    )
}
