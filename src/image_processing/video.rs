//! Frame sampling: pick one random frame of a video and extract it to a
//! still image through the ffmpeg/ffprobe command line tools.

use rand::rngs::StdRng;
use rand::Rng;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::VideoError;

const FALLBACK_FPS: f64 = 25.0;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    nb_frames: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

/// Stream metadata needed to pick and seek a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub frame_count: i64,
    pub fps: f64,
}

/// Extract one uniformly random frame of `video_path` into the output
/// directory and return the still image path.
///
/// The output name is derived from the video filename, so repeated runs
/// overwrite the same file instead of accumulating frames.
pub fn sample_frame(
    video_path: &Path,
    output_dir: &Path,
    rng: &mut StdRng,
) -> Result<PathBuf, VideoError> {
    let info = probe_video(video_path)?;
    if info.frame_count <= 0 {
        return Err(VideoError::FrameCount(video_path.to_path_buf()));
    }

    let frame_index = rng.random_range(0..info.frame_count);
    let timestamp = frame_index as f64 / info.fps;
    let output_path = frame_output_path(video_path, output_dir);

    let output = Command::new("ffmpeg")
        .args(["-y", "-loglevel", "error"])
        .args(["-ss", &format!("{:.3}", timestamp)])
        .arg("-i")
        .arg(video_path)
        .args(["-frames:v", "1", "-q:v", "2"])
        .arg(&output_path)
        .output()
        .map_err(|source| VideoError::Io {
            path: video_path.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(VideoError::decode(
            video_path,
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    if !output_path.exists() {
        return Err(VideoError::decode(
            video_path,
            format!("seek to frame {frame_index} produced no frame"),
        ));
    }

    Ok(output_path)
}

/// Deterministic still-image path for a video: image_from_video_<name>.jpg
pub fn frame_output_path(video_path: &Path, output_dir: &Path) -> PathBuf {
    let file_name = video_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("video");
    output_dir.join(format!("image_from_video_{}.jpg", file_name))
}

/// Probe the first video stream of the file
fn probe_video(video_path: &Path) -> Result<VideoInfo, VideoError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_streams",
            "-of",
            "json",
        ])
        .arg(video_path)
        .output()
        .map_err(|source| VideoError::Io {
            path: video_path.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(VideoError::open(
            video_path,
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_probe_output(&stdout).ok_or_else(|| VideoError::FrameCount(video_path.to_path_buf()))
}

/// Parse ffprobe JSON into frame count and frame rate. Frame count comes
/// from nb_frames when the container records it, else duration x fps.
fn parse_probe_output(json: &str) -> Option<VideoInfo> {
    let probe: ProbeOutput = serde_json::from_str(json).ok()?;
    let stream = probe
        .streams
        .into_iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))?;

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .unwrap_or(FALLBACK_FPS);

    let duration: Option<f64> = stream.duration.as_deref().and_then(|d| d.parse().ok());
    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<i64>().ok())
        .filter(|&n| n > 0)
        .or_else(|| duration.map(|d| (d * fps) as i64))?;

    Some(VideoInfo { frame_count, fps })
}

/// Parse an ffprobe rational like "30000/1001" into frames per second
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let (num, den) = rate.split_once('/')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 || num <= 0.0 {
        return None;
    }
    Some(num / den)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_output_path_keeps_video_name() {
        let path = frame_output_path(Path::new("/videos/holiday.mp4"), Path::new("/out"));
        assert_eq!(path, Path::new("/out/image_from_video_holiday.mp4.jpg"));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("30"), None);
    }

    #[test]
    fn test_parse_probe_with_frame_count() {
        let json = r#"{"streams": [{"codec_type": "video", "nb_frames": "300",
                        "avg_frame_rate": "30/1", "duration": "10.0"}]}"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.frame_count, 300);
        assert_eq!(info.fps, 30.0);
    }

    #[test]
    fn test_parse_probe_falls_back_to_duration() {
        let json = r#"{"streams": [{"codec_type": "video",
                        "avg_frame_rate": "25/1", "duration": "8.5"}]}"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.frame_count, 212);
    }

    #[test]
    fn test_parse_probe_skips_audio_streams() {
        let json = r#"{"streams": [
            {"codec_type": "audio", "duration": "10.0"},
            {"codec_type": "video", "nb_frames": "42", "avg_frame_rate": "24/1"}]}"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.frame_count, 42);
    }

    #[test]
    fn test_parse_probe_without_video_stream() {
        let json = r#"{"streams": [{"codec_type": "audio"}]}"#;
        assert!(parse_probe_output(json).is_none());
    }

    #[test]
    fn test_parse_probe_zero_frames_yields_no_count() {
        // A malformed video reporting zero frames must surface as a
        // frame-count failure, not a panic or a bogus extraction.
        let json = r#"{"streams": [{"codec_type": "video", "nb_frames": "0",
                        "avg_frame_rate": "30/1"}]}"#;
        assert!(parse_probe_output(json).is_none());
    }
}
