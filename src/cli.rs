use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "photo-mosaic",
    about = "Create a printable photo mosaic from the videos and images in a folder",
    long_about = "
Photo Mosaic - Detection-Guided Mosaic Builder

Scans a folder for images and videos, extracts a random still frame from each
video, crops every picture around its dominant subject and composes the
resulting square tiles into one large mosaic or into a sequence of printable
pages.

Example Usage:
  # Single mosaic, 8 columns
  photo-mosaic -i ~/Photos -o ~/mosaic -l 8

  # A4 pages at 300 DPI, randomized tile order
  photo-mosaic -i ~/Photos -o ~/mosaic -l 6 -p a4 -d 300 -r

  # Limit the mosaic to 50 randomly sampled files, reproducibly
  photo-mosaic -i ~/Photos -o ~/mosaic -l 8 -n 50 --seed 42

  # Focus the crops on the best-scoring dog instead of person (needs the ai feature)
  photo-mosaic -i ~/Photos -o ~/mosaic -l 8 --model mobilenet_ssd.onnx --target-class dog"
)]
pub struct Args {
    /// Input folder containing videos and images
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Output folder for the mosaic pages and extracted video frames
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Number of columns in the mosaic
    #[arg(short = 'l', long = "cols", value_name = "N")]
    pub cols: u32,

    /// Page format for segmented output (e.g. a4, letter); omit for one single mosaic
    #[arg(short = 'p', long = "page-format", value_name = "NAME")]
    pub page_format: Option<String>,

    /// Print resolution used to convert the page format to pixels
    #[arg(short = 'd', long = "dpi", default_value = "300", value_name = "DPI")]
    pub dpi: i64,

    /// Number of files to include (random subset if smaller than the total)
    #[arg(short = 'n', long = "num-images", value_name = "N")]
    pub num_images: Option<i64>,

    /// Randomize the order of tiles in the mosaic
    #[arg(short = 'r', long = "random")]
    pub random: bool,

    /// Tile edge in pixels for single-mosaic mode
    #[arg(long = "tile-size", default_value = "256", value_name = "PX")]
    pub tile_size: u32,

    /// Minimum edge of a subject crop in pixels
    #[arg(long = "min-crop", default_value = "64", value_name = "PX")]
    pub min_crop: u32,

    /// Extra margin added around the detected subject in pixels
    #[arg(long = "margin", default_value = "0", value_name = "PX")]
    pub margin: u32,

    /// Class label the subject locator prefers
    #[arg(long = "target-class", default_value = "person", value_name = "LABEL")]
    pub target_class: String,

    /// Confidence threshold for subject detection (exclusive 0-1 range)
    #[arg(long = "confidence", default_value = "0.5", value_name = "THRESHOLD")]
    pub confidence_threshold: f32,

    /// Seed for the random sampler; omit for a different mosaic every run
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Number of parallel processing jobs (0 = auto-detect CPU cores)
    #[arg(short = 'j', long = "jobs", default_value = "0", value_name = "N")]
    pub jobs: usize,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Optional JSON config file overriding the built-in page size table
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Path to the detection model (requires the ai feature)
    #[arg(long = "model", value_name = "FILE")]
    pub model_path: Option<PathBuf>,
}

impl Args {
    /// Effective worker count handed to the thread pool
    pub fn parallel_jobs(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        }
    }
}


// Default implementation for tests
#[cfg(test)]
impl Default for Args {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            cols: 4,
            page_format: None,
            dpi: 300,
            num_images: None,
            random: false,
            tile_size: 256,
            min_crop: 64,
            margin: 0,
            target_class: "person".to_string(),
            confidence_threshold: 0.5,
            seed: None,
            jobs: 0,
            verbose: false,
            config_file: None,
            model_path: None,
        }
    }
}
