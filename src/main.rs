use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::MultiProgress;
use rand::seq::SliceRandom;
use std::path::PathBuf;
use std::time::Instant;

use photo_mosaic::cli::Args;
use photo_mosaic::config::PageSizeTable;
use photo_mosaic::image_processing::detection::SubjectDetector;
use photo_mosaic::image_processing::{layout, tile::Tile, MosaicConfig, MosaicEngine};
use photo_mosaic::media::{self, MediaKind};
use photo_mosaic::utils::{
    create_progress_bar, error_println, format_duration, validate_inputs, verbose_println,
    warn_println,
};

/// Page mode parameters resolved before any processing starts
struct PageSetup {
    width: u32,
    height: u32,
    tile_size: u32,
}

fn main() {
    if let Err(e) = run() {
        error_println(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let start_time = Instant::now();
    let args = Args::parse();

    // Print banner
    println!("{}", style("Photo Mosaic Builder").bold().blue());
    println!(
        "{}",
        style("Detection-guided tiles from images and videos").dim()
    );
    println!();

    validate_inputs(&args)?;

    let page_sizes = PageSizeTable::load(args.config_file.as_deref())?;

    // Resolve the page geometry up front so an unknown format fails before
    // any file is touched
    let page_setup = match &args.page_format {
        Some(format) => {
            let (width, height) = page_sizes.page_size_pixels(format, args.dpi as u32)?;
            let tile_size = width / args.cols;
            if tile_size == 0 {
                return Err(anyhow::anyhow!(
                    "Page width of {}px cannot fit {} columns",
                    width,
                    args.cols
                ));
            }
            Some(PageSetup {
                width,
                height,
                tile_size,
            })
        }
        None => None,
    };
    let tile_size = page_setup
        .as_ref()
        .map(|setup| setup.tile_size)
        .unwrap_or(args.tile_size);

    std::fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    let detector = match &args.model_path {
        Some(path) => Some(SubjectDetector::load(path, args.verbose)?),
        None => {
            verbose_println(
                args.verbose,
                "No detection model specified; using centered crops",
            );
            None
        }
    };

    let config = MosaicConfig {
        tile_size,
        min_crop: args.min_crop,
        margin: args.margin,
        target_class: args.target_class.clone(),
        confidence_threshold: args.confidence_threshold,
        verbose: args.verbose,
        parallel_jobs: args.parallel_jobs(),
    };

    if config.verbose {
        println!("{}", style("Configuration:").bold());
        println!("  Input: {}", args.input_dir.display());
        println!("  Output: {}", args.output_dir.display());
        println!("  Columns: {}", args.cols);
        println!("  Tile size: {}x{}", tile_size, tile_size);
        match &page_setup {
            Some(setup) => println!(
                "  Page: {} at {} DPI ({}x{} px)",
                args.page_format.as_deref().unwrap_or_default(),
                args.dpi,
                setup.width,
                setup.height
            ),
            None => println!("  Page: single mosaic"),
        }
        println!("  Target class: {}", config.target_class);
        println!("  Confidence threshold: {}", config.confidence_threshold);
        println!("  Parallel jobs: {}", config.parallel_jobs);
        println!("  Shuffle order: {}", args.random);
        println!();
    }

    let engine = MosaicEngine::new(config, detector)?;
    let mut rng = media::make_rng(args.seed);

    // Discover and optionally sample the input set
    let mut files = engine.discover_media(&args.input_dir)?;
    println!("Found {} media files", files.len());
    if let Some(num_images) = args.num_images {
        files = media::sample_files(files, num_images as usize, &mut rng);
        verbose_println(
            args.verbose,
            &format!("Sampled down to {} files", files.len()),
        );
    }

    let multi_progress = MultiProgress::new();

    // Stage 1: route videos through the frame sampler
    let video_count = files.iter().filter(|f| f.kind == MediaKind::Video).count();
    let mut image_paths: Vec<PathBuf> = files
        .iter()
        .filter(|file| file.kind == MediaKind::Image)
        .map(|file| file.path.clone())
        .collect();

    let mut video_failures = Vec::new();
    if video_count > 0 {
        let frames_pb = multi_progress.add(create_progress_bar(video_count as u64));
        frames_pb.set_message("Extracting video frames");
        let frame_results =
            engine.extract_video_frames(&files, &args.output_dir, &mut rng, &frames_pb);
        frames_pb.finish_with_message("Video frames extracted");

        for result in frame_results {
            match result {
                Ok(path) => image_paths.push(path),
                Err(e) => {
                    warn_println(&format!("Skipping video: {}", e));
                    video_failures.push(e);
                }
            }
        }
    }

    if image_paths.is_empty() {
        println!(
            "{}",
            style("No valid image files found to create a mosaic").red()
        );
        return Ok(());
    }

    if args.random {
        verbose_println(args.verbose, "Randomizing the order of images");
        image_paths.shuffle(&mut rng);
    }

    // Stage 2: detect, crop and normalize every tile
    let main_progress = multi_progress.add(create_progress_bar(image_paths.len() as u64));
    main_progress.set_message("Processing tiles");

    let results = match &page_setup {
        // Page packing follows submission order; the single mosaic is laid
        // out in completion order
        Some(_) => engine.process_submission_order(&image_paths, &main_progress),
        None => engine.process_completion_order(&image_paths, &main_progress),
    };
    main_progress.finish_with_message("Tiles processed");

    let mut tiles: Vec<Tile> = Vec::with_capacity(results.len());
    let mut tile_failures = Vec::new();
    for result in results {
        match result {
            Ok(tile) => tiles.push(tile),
            Err(e) => tile_failures.push(e),
        }
    }

    if tiles.is_empty() {
        println!();
        println!(
            "{}",
            style("No tiles survived processing - nothing to compose").red()
        );
        return Ok(());
    }

    // Stage 3: compose the output pages
    let written = match &page_setup {
        Some(setup) => layout::compose_pages(
            &tiles,
            args.cols,
            setup.tile_size,
            setup.width,
            setup.height,
            &args.output_dir,
            args.verbose,
        )?,
        None => layout::compose_single(
            &tiles,
            args.cols,
            tile_size,
            layout::MAX_CANVAS_DIM,
            &args.output_dir,
            args.verbose,
        )?,
    };

    // Print results summary
    println!();
    println!("{}", style("Results Summary:").bold().green());
    println!("  Tiles composed: {}", style(tiles.len()).bold().green());
    if !tile_failures.is_empty() {
        println!(
            "  Failed images: {}",
            style(tile_failures.len()).bold().red()
        );
    }
    if !video_failures.is_empty() {
        println!(
            "  Skipped videos: {}",
            style(video_failures.len()).bold().yellow()
        );
    }

    if !tile_failures.is_empty() || !video_failures.is_empty() {
        println!();
        println!("{}", style("Errors encountered:").bold().red());
        for (index, error) in tile_failures
            .iter()
            .map(|e| e.to_string())
            .chain(video_failures.iter().map(|e| e.to_string()))
            .enumerate()
        {
            println!("  {}: {}", style(format!("#{}", index + 1)).dim(), error);
        }
    }

    let total_time = start_time.elapsed();
    println!();
    println!("{}", style("Performance:").bold().blue());
    println!(
        "  Total processing time: {}",
        style(format_duration(total_time)).bold()
    );
    println!(
        "  Average time per tile: {}",
        style(format_duration(total_time / tiles.len() as u32)).dim()
    );

    println!();
    println!("{}", style("Output files:").bold().green());
    for path in &written {
        println!("  {}", path.display());
    }

    Ok(())
}
