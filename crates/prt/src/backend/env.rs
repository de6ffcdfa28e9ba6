//! Scene environment file.
//!
//! One setting per line, `key value...`, with `#` starting a comment:
//!
//! ```text
//! # balls scene
//! geometry   balls4.geo
//! output     balls4.rgb
//! resolution 128 128
//! maxlevel   5
//! bundle     8 8
//! ```
//!
//! Only `geometry` is required. Relative paths are resolved against the
//! directory holding the environment file.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use prt_core::SceneError;
use tracing::{debug, warn};

/// Default image size in pixels.
pub const DEFAULT_RESOLUTION: (u32, u32) = (64, 64);
/// Default ray-tree depth.
pub const DEFAULT_MAX_LEVEL: u32 = 5;
/// Deepest ray tree accepted; each level doubles the rays per sample.
pub const MAX_LEVEL_LIMIT: u32 = 16;
/// Default work bundle size in pixels.
pub const DEFAULT_BUNDLE: (u32, u32) = (8, 8);

const KNOWN_KEYS: &[&str] = &["geometry", "output", "resolution", "maxlevel", "bundle"];

/// Parsed environment file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvSettings {
    /// Geometry file.
    pub geometry: PathBuf,
    /// Raw RGB output file.
    pub output: PathBuf,
    /// Image width and height.
    pub resolution: (u32, u32),
    /// Maximum ray-tree depth.
    pub max_level: u32,
    /// Width and height of one unit of work.
    pub bundle: (u32, u32),
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self {
            geometry: PathBuf::new(),
            output: PathBuf::new(),
            resolution: DEFAULT_RESOLUTION,
            max_level: DEFAULT_MAX_LEVEL,
            bundle: DEFAULT_BUNDLE,
        }
    }
}

/// One `key value...` line.
struct Entry {
    line: usize,
    values: Vec<String>,
}

impl EnvSettings {
    /// Read and parse the file at `path`.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let text = fs::read_to_string(path).map_err(|e| SceneError::open(path, e))?;
        Self::parse(path, &text)
    }

    /// Parse `text`, reporting problems against `path`.
    pub fn parse(path: &Path, text: &str) -> Result<Self, SceneError> {
        let mut entries: IndexMap<String, Entry> = IndexMap::new();
        for (idx, raw) in text.lines().enumerate() {
            let content = raw.split_once('#').map_or(raw, |(before, _)| before);
            let mut words = content.split_whitespace();
            let Some(key) = words.next() else {
                continue;
            };
            let key = key.to_ascii_lowercase();
            if !KNOWN_KEYS.contains(&key.as_str()) {
                debug!(key = %key, line = idx + 1, "ignoring unknown setting");
                continue;
            }
            let entry = Entry {
                line: idx + 1,
                values: words.map(str::to_owned).collect(),
            };
            if let Some(previous) = entries.insert(key.clone(), entry) {
                warn!(key = %key, first = previous.line, "setting given twice, last one wins");
            }
        }

        let base = path.parent().unwrap_or(Path::new(""));
        let mut settings = EnvSettings::default();

        let geometry = entries
            .get("geometry")
            .ok_or(SceneError::Missing {
                path: path.to_path_buf(),
                setting: "geometry",
            })?;
        settings.geometry = base.join(single_path(path, "geometry", geometry)?);

        settings.output = match entries.get("output") {
            Some(entry) => base.join(single_path(path, "output", entry)?),
            None => {
                let stem = path.file_stem().unwrap_or_default();
                base.join(Path::new(stem).with_extension("rgb"))
            }
        };
        if let Some(entry) = entries.get("resolution") {
            settings.resolution = pair(path, "resolution", entry)?;
        }
        if let Some(entry) = entries.get("maxlevel") {
            settings.max_level = match entry.values.as_slice() {
                [n] => n
                    .parse()
                    .ok()
                    .filter(|&level| level <= MAX_LEVEL_LIMIT)
                    .ok_or_else(|| {
                        SceneError::malformed(
                            path,
                            entry.line,
                            format!("maxlevel expects an integer in [0, {MAX_LEVEL_LIMIT}]"),
                        )
                    })?,
                _ => {
                    return Err(SceneError::malformed(
                        path,
                        entry.line,
                        "maxlevel expects one value",
                    ))
                }
            };
        }
        if let Some(entry) = entries.get("bundle") {
            settings.bundle = pair(path, "bundle", entry)?;
        }
        Ok(settings)
    }

    /// Number of pixels in the image.
    pub fn pixel_count(&self) -> usize {
        self.resolution.0 as usize * self.resolution.1 as usize
    }
}

fn single_path<'a>(path: &Path, key: &str, entry: &'a Entry) -> Result<&'a str, SceneError> {
    match entry.values.as_slice() {
        [value] => Ok(value.as_str()),
        _ => Err(SceneError::malformed(
            path,
            entry.line,
            format!("{key} expects one path"),
        )),
    }
}

fn pair(path: &Path, key: &str, entry: &Entry) -> Result<(u32, u32), SceneError> {
    let bad = || {
        SceneError::malformed(
            path,
            entry.line,
            format!("{key} expects two positive integers"),
        )
    };
    let [a, b] = entry.values.as_slice() else {
        return Err(bad());
    };
    let a: u32 = a.parse().map_err(|_| bad())?;
    let b: u32 = b.parse().map_err(|_| bad())?;
    if a == 0 || b == 0 {
        return Err(bad());
    }
    Ok((a, b))
}
