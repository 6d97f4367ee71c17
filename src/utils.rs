use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::cli::Args;
use crate::error::ConfigError;

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg} ({eta})",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    pb
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Validate command line arguments. All failures here abort the run before
/// any file is touched.
pub fn validate_inputs(args: &Args) -> Result<()> {
    if !args.input_dir.exists() {
        return Err(ConfigError::InputNotFound(args.input_dir.clone()).into());
    }
    if !args.input_dir.is_dir() {
        return Err(anyhow::anyhow!(
            "Input path is not a directory: {}",
            args.input_dir.display()
        ));
    }

    if args.dpi <= 0 {
        return Err(ConfigError::InvalidDpi(args.dpi).into());
    }
    if args.cols == 0 {
        return Err(ConfigError::InvalidColumns(args.cols as i64).into());
    }
    if let Some(num_images) = args.num_images {
        if num_images <= 0 {
            return Err(ConfigError::InvalidSampleCount(num_images).into());
        }
    }
    if args.confidence_threshold <= 0.0 || args.confidence_threshold >= 1.0 {
        return Err(ConfigError::InvalidConfidence(args.confidence_threshold).into());
    }

    if args.tile_size == 0 {
        return Err(anyhow::anyhow!("Tile size must be greater than 0"));
    }
    if args.jobs > 32 {
        return Err(anyhow::anyhow!(
            "Job count too high (max 32), got: {}",
            args.jobs
        ));
    }

    Ok(())
}

/// Get file extension in lowercase
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Print verbose information if verbose mode is enabled
pub fn verbose_println(verbose: bool, message: &str) {
    if verbose {
        println!("{} {}", style("[VERBOSE]").dim(), message);
    }
}

/// Print warning message
pub fn warn_println(message: &str) {
    println!("{} {}", style("[WARNING]").yellow().bold(), message);
}

/// Print error message
pub fn error_println(message: &str) {
    eprintln!("{} {}", style("[ERROR]").red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn test_get_file_extension() {
        assert_eq!(
            get_file_extension(Path::new("photo.JPG")),
            Some("jpg".to_string())
        );
        assert_eq!(get_file_extension(Path::new("no_extension")), None);
    }

    #[test]
    fn test_validate_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let valid = Args {
            input_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(validate_inputs(&valid).is_ok());

        let bad_dpi = Args {
            input_dir: dir.path().to_path_buf(),
            dpi: 0,
            ..Default::default()
        };
        assert!(validate_inputs(&bad_dpi).is_err());

        let bad_cols = Args {
            input_dir: dir.path().to_path_buf(),
            cols: 0,
            ..Default::default()
        };
        assert!(validate_inputs(&bad_cols).is_err());

        let bad_sample = Args {
            input_dir: dir.path().to_path_buf(),
            num_images: Some(-1),
            ..Default::default()
        };
        assert!(validate_inputs(&bad_sample).is_err());

        let bad_confidence = Args {
            input_dir: dir.path().to_path_buf(),
            confidence_threshold: 1.0,
            ..Default::default()
        };
        assert!(validate_inputs(&bad_confidence).is_err());

        let missing_input = Args {
            input_dir: dir.path().join("does_not_exist"),
            ..Default::default()
        };
        assert!(validate_inputs(&missing_input).is_err());
    }
}
