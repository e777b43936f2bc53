use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use itertools::Itertools;

use crate::{
    constants::{MODEL_FILE, MODEL_FILE_STEM},
    core::{domain::SystemEntry, errors::ModelError},
};

const PAUSE_TOGGLE: &str = "###";

/// Parses a `models.txt` listing.
///
/// Blank lines and lines starting with a tab are ignored, `#` starts a
/// comment and a `###` line toggles a region whose names are skipped.
/// Accepted names are numbered from 1 in order.
pub fn parse_system_list(content: &str) -> Vec<SystemEntry> {
    let mut paused = false;
    let mut systems = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() || line.starts_with('\t') {
            continue;
        }
        let line = line.trim();
        if line == PAUSE_TOGGLE {
            paused = !paused;
            continue;
        }
        if paused || line.starts_with('#') {
            continue;
        }
        systems.push(SystemEntry {
            id: systems.len() as u32 + 1,
            name: line.to_string(),
        });
    }
    systems
}

pub async fn read_system_list(path: &Path) -> Result<Vec<SystemEntry>, ModelError> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_system_list(&content))
}

/// A resolved model file and its size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelFile {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Finds model files under a models root. Models found in a zip archive are
/// extracted into `extract_dir` first.
#[derive(Clone, Debug)]
pub struct ModelLocator {
    root: PathBuf,
    extract_dir: PathBuf,
}

impl ModelLocator {
    pub fn new(root: PathBuf, extract_dir: PathBuf) -> Self {
        Self { root, extract_dir }
    }

    #[tracing::instrument(skip(self))]
    pub async fn locate(&self, name: &str) -> Result<ModelFile, ModelError> {
        let root = self.root.clone();
        let extract_dir = self.extract_dir.clone();
        let name = name.to_string();

        let path = tokio::task::spawn_blocking(move || -> Result<PathBuf, ModelError> {
            if let Some(path) = find_in_dir(&root, &name)? {
                return Ok(path);
            }
            if let Some(path) = find_in_archives(&root, &extract_dir, &name)? {
                return Ok(path);
            }
            Err(ModelError::NotFound { name })
        })
        .await
        .map_err(|err| ModelError::Io(io::Error::other(err)))??;

        let bytes = tokio::fs::metadata(&path).await?.len();
        tracing::debug!(path = %path.display(), bytes, "Model located");
        Ok(ModelFile { path, bytes })
    }
}

/// `name.ext` for a single non-empty extension of word characters.
fn has_stem(file_name: &str, stem: &str) -> bool {
    file_name
        .strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}

fn find_in_dir(root: &Path, name: &str) -> io::Result<Option<PathBuf>> {
    let folder = root.join(name);
    if folder.is_dir() {
        let model = folder.join(MODEL_FILE);
        if model.is_file() {
            return Ok(Some(model));
        }
        if let Some(model) = find_file(&folder, MODEL_FILE_STEM)? {
            return Ok(Some(model));
        }
    }
    find_file(root, name)
}

fn find_file(dir: &Path, stem: &str) -> io::Result<Option<PathBuf>> {
    Ok(list_files(dir)?
        .into_iter()
        .find(|path| {
            path.file_name()
                .and_then(|file_name| file_name.to_str())
                .is_some_and(|file_name| has_stem(file_name, stem))
        }))
}

/// Regular files of `dir` sorted by path; a missing directory has none.
fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn find_in_archives(root: &Path, extract_dir: &Path, name: &str) -> Result<Option<PathBuf>, ModelError> {
    let archives = list_files(root)?
        .into_iter()
        .filter(|path| path.extension().is_some_and(|ext| ext == "zip"));

    for archive_path in archives {
        tracing::debug!("Trying archive {}", archive_path.display());
        let mut archive = match File::open(&archive_path)
            .map_err(zip::result::ZipError::Io)
            .and_then(zip::ZipArchive::new)
        {
            Ok(archive) => archive,
            Err(err) => {
                tracing::warn!("Skipping unreadable archive {}: {}", archive_path.display(), err);
                continue;
            }
        };

        let Some(entry_name) = find_entry(archive.file_names(), name) else {
            continue;
        };
        let to_archive_error = |source| ModelError::Archive {
            path: archive_path.clone(),
            source,
        };

        let mut entry = archive.by_name(&entry_name).map_err(to_archive_error)?;
        let file_name = Path::new(&entry_name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(MODEL_FILE));
        let target_dir = extract_dir.join(format!("{}-{}", name, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&target_dir)?;
        let target = target_dir.join(file_name);
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;

        tracing::info!("Extracted {} from {}", entry_name, archive_path.display());
        return Ok(Some(target));
    }

    Ok(None)
}

/// Applies the folder and file rules to the entry names of an archive.
fn find_entry<'a>(entries: impl Iterator<Item = &'a str>, name: &str) -> Option<String> {
    let entries: Vec<&str> = entries.sorted().collect();
    let folder = format!("{name}/");

    let in_folder = |entry: &&str| {
        entry
            .strip_prefix(folder.as_str())
            .is_some_and(|rest| rest == MODEL_FILE)
    };
    let in_folder_any = |entry: &&str| {
        entry
            .strip_prefix(folder.as_str())
            .is_some_and(|rest| has_stem(rest, MODEL_FILE_STEM))
    };
    let at_root = |entry: &&str| has_stem(entry, name);

    entries
        .iter()
        .copied()
        .find(in_folder)
        .or_else(|| entries.iter().copied().find(in_folder_any))
        .or_else(|| entries.iter().copied().find(at_root))
        .map(|entry| entry.to_string())
}
