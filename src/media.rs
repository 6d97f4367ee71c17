use rand::rngs::StdRng;
use rand::{seq::index, SeedableRng};
use std::path::{Path, PathBuf};

use crate::utils::get_file_extension;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tiff"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "flv", "wmv", "webm"];

/// Media classification, a pure function of the filename extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// A discovered input file, classified once per run
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl MediaFile {
    /// Classify a path by extension, case-insensitive. Unknown extensions
    /// return None and the file is skipped during discovery.
    pub fn classify(path: &Path) -> Option<Self> {
        let ext = get_file_extension(path)?;
        let kind = if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else {
            return None;
        };

        Some(Self {
            path: path.to_path_buf(),
            kind,
        })
    }
}

/// Build the run's RNG, seeded for reproducible mosaics when requested
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Keep a random subset of `count` files; a no-op when the cap is not
/// smaller than the input. Selection keeps the incoming file order.
pub fn sample_files(files: Vec<MediaFile>, count: usize, rng: &mut StdRng) -> Vec<MediaFile> {
    if count >= files.len() {
        return files;
    }

    let mut indices = index::sample(rng, files.len(), count).into_vec();
    indices.sort_unstable();

    let mut picked = Vec::with_capacity(count);
    let mut files = files.into_iter();
    let mut cursor = 0usize;
    for target in indices {
        let file = files.nth(target - cursor).expect("index within bounds");
        cursor = target + 1;
        picked.push(file);
    }
    picked
}
