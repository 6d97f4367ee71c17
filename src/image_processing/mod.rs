pub mod crop;
pub mod detection;
pub mod layout;
pub mod tile;
pub mod video;

use anyhow::Result;
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use walkdir::WalkDir;

use crate::error::{TileError, VideoError};
use crate::media::{MediaFile, MediaKind};
use crate::utils::{verbose_println, warn_println};

use detection::{select_subject, SubjectDetector};
use tile::Tile;

#[derive(Debug, Clone)]
pub struct MosaicConfig {
    pub tile_size: u32,
    pub min_crop: u32,
    pub margin: u32,
    pub target_class: String,
    pub confidence_threshold: f32,
    pub verbose: bool,
    pub parallel_jobs: usize,
}

/// Runs the per-image pipeline: load, locate the subject, derive the crop
/// and normalize the tile, fanned out over a bounded worker pool.
pub struct MosaicEngine {
    config: MosaicConfig,
    detector: Option<SubjectDetector>,
}

impl MosaicEngine {
    pub fn new(config: MosaicConfig, detector: Option<SubjectDetector>) -> Result<Self> {
        // The pool may already exist when tests construct several engines
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_jobs)
            .build_global()
        {
            verbose_println(config.verbose, &format!("Thread pool reused: {}", e));
        }

        Ok(Self { config, detector })
    }

    /// Discover all media files under the input directory, sorted for a
    /// consistent submission order
    pub fn discover_media(&self, input_dir: &Path) -> Result<Vec<MediaFile>> {
        let mut files = Vec::new();

        verbose_println(
            self.config.verbose,
            &format!("Scanning directory: {}", input_dir.display()),
        );

        let walker = WalkDir::new(input_dir).follow_links(false).max_depth(10);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn_println(&format!("Failed to read directory entry: {}", e));
                    continue;
                }
            };
            if !entry.path().is_file() {
                continue;
            }
            if let Some(media) = MediaFile::classify(entry.path()) {
                files.push(media);
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        verbose_println(
            self.config.verbose,
            &format!("Found {} media files", files.len()),
        );
        Ok(files)
    }

    /// Extract one still frame per video into the output directory. Each
    /// video is independent; failures drop only that video.
    pub fn extract_video_frames(
        &self,
        media: &[MediaFile],
        output_dir: &Path,
        rng: &mut StdRng,
        progress: &ProgressBar,
    ) -> Vec<Result<PathBuf, VideoError>> {
        let videos: Vec<&MediaFile> = media
            .iter()
            .filter(|file| file.kind == MediaKind::Video)
            .collect();
        if videos.is_empty() {
            return Vec::new();
        }

        // Pre-drawn seeds keep frame choice reproducible under --seed even
        // though extraction order is not deterministic
        let seeds: Vec<u64> = (0..videos.len()).map(|_| rng.random()).collect();

        videos
            .par_iter()
            .zip(seeds)
            .map(|(video, seed)| {
                let mut rng = StdRng::seed_from_u64(seed);
                let result = video::sample_frame(&video.path, output_dir, &mut rng);
                progress.inc(1);
                result
            })
            .collect()
    }

    /// Process every image path, returning results in submission order
    pub fn process_submission_order(
        &self,
        paths: &[PathBuf],
        progress: &ProgressBar,
    ) -> Vec<Result<Tile, TileError>> {
        paths
            .par_iter()
            .map(|path| {
                let result = self.process_one(path);
                progress.inc(1);
                result
            })
            .collect()
    }

    /// Process every image path, returning results in completion order.
    /// Placement in the single mosaic follows this order, so it varies
    /// between runs.
    pub fn process_completion_order(
        &self,
        paths: &[PathBuf],
        progress: &ProgressBar,
    ) -> Vec<Result<Tile, TileError>> {
        let (sender, receiver) = mpsc::channel();

        paths.par_iter().for_each_with(sender, |sender, path| {
            let result = self.process_one(path);
            progress.inc(1);
            // The receiver outlives the fan-out; a send can only fail if the
            // whole run is being torn down
            let _ = sender.send(result);
        });

        receiver.try_iter().collect()
    }

    /// One pipeline unit: load, locate, crop, normalize
    fn process_one(&self, path: &Path) -> Result<Tile, TileError> {
        let img = image::open(path)
            .map_err(|source| TileError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        let dimensions = img.dimensions();

        let candidates = match &self.detector {
            Some(detector) => match detector.detect(&img) {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn_println(&format!(
                        "Detection failed for {}: {}. Using geometric crop.",
                        path.display(),
                        e
                    ));
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let subject = select_subject(
            &candidates,
            dimensions,
            &self.config.target_class,
            self.config.confidence_threshold,
        );
        if subject.is_none() {
            verbose_println(
                self.config.verbose,
                &format!("No subject found in {}", path.display()),
            );
        }

        let region = crop::derive_crop_region(
            dimensions,
            subject.as_ref().map(|detection| &detection.bbox),
            self.config.min_crop,
            self.config.margin,
        );

        tile::normalize_tile(&img, region, self.config.tile_size, path)
    }
}
