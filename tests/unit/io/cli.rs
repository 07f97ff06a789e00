//! Tests for command-line parsing, option validation and the end-to-end run

#[cfg(test)]
mod tests {
    use clap::Parser;
    use image::{Rgb, RgbImage};
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;
    use tessera::MosaicError;
    use tessera::algorithm::alpha::AlphaKind;
    use tessera::analysis::metrics::Metric;
    use tessera::io::cli::{Cli, MosaicRunner, parse_tile_size};
    use tessera::io::configuration::{
        DEFAULT_CACHE_DIR, DEFAULT_NUM_FRAMES, DEFAULT_RANDOM_SIZE, DEFAULT_SEED,
        DEFAULT_TILE_SIZE,
    };

    fn write_library(dir: &Path, count: usize) {
        std::fs::create_dir_all(dir).expect("create library directory");
        for i in 0..count {
            let v = (i * 255 / count.max(1)) as u8;
            RgbImage::from_pixel(10, 10, Rgb([v, 255 - v, v / 3]))
                .save(dir.join(format!("tile{i:02}.png")))
                .expect("save library image");
        }
    }

    fn write_source(path: &Path) {
        RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 100]))
            .save(path)
            .expect("save source image");
    }

    fn path_arg(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    // Tests both accepted tile size spellings and the rejected ones
    // Verified by accepting zero dimensions
    #[test]
    fn test_parse_tile_size() {
        assert!(matches!(parse_tile_size("32,24"), Ok((32, 24))));
        assert!(matches!(parse_tile_size("16x8"), Ok((16, 8))));
        assert!(matches!(parse_tile_size(" 4 , 5 "), Ok((4, 5))));
        assert!(parse_tile_size("0,8").is_err());
        assert!(parse_tile_size("8").is_err());
        assert!(parse_tile_size("a,b").is_err());
    }

    // Tests parsing with only the source image
    // Verified by changing default values to ensure defaults are used
    #[test]
    fn test_cli_parse_minimal_args() {
        let cli = Cli::parse_from(["tessera", "photo.jpg"]);

        assert_eq!(cli.source, PathBuf::from("photo.jpg"));
        assert_eq!(cli.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
        assert_eq!(cli.tile_size, DEFAULT_TILE_SIZE);
        assert_eq!(cli.random_size, DEFAULT_RANDOM_SIZE);
        assert_eq!(cli.seed, DEFAULT_SEED);
        assert_eq!(cli.frames, DEFAULT_NUM_FRAMES);
        assert_eq!(cli.metric, Metric::Average);
        assert_eq!(cli.alpha, AlphaKind::Wave);
        assert_eq!(cli.angles, vec![0.0]);
        assert!(cli.library.is_none());
        assert!(cli.video.is_none());
        assert!(!cli.fast);
        assert!(cli.should_show_progress());
        assert!(cli.validate().is_ok());
    }

    // Tests parsing with most options set
    // Verified by dropping the value delimiter on angles
    #[test]
    fn test_cli_parse_all_args() {
        let cli = Cli::parse_from([
            "tessera",
            "photo.jpg",
            "--library",
            "raw",
            "--metric",
            "palette",
            "--tile-size",
            "16x12",
            "--random-size",
            "3",
            "--fast",
            "--no-refine",
            "--angles=-90,0,90",
            "--sample",
            "500",
            "--tile-alpha",
            "0.7",
            "--stripes",
            "--video",
            "out.gif",
            "--alpha",
            "fireworks",
            "--frames",
            "60",
            "--split-delta",
            "20",
            "--hold-frames",
            "5",
            "--fps",
            "12",
            "--seed",
            "7",
            "--quiet",
        ]);

        assert_eq!(cli.library, Some(PathBuf::from("raw")));
        assert_eq!(cli.metric, Metric::Palette);
        assert_eq!(cli.tile_size, (16, 12));
        assert_eq!(cli.angles, vec![-90.0, 0.0, 90.0]);
        assert_eq!(cli.sample, Some(500));
        assert_eq!(cli.alpha, AlphaKind::Fireworks);
        assert!(!cli.should_show_progress());

        let matching = cli.match_config();
        assert!(matching.fast && !matching.refine);
        assert_eq!(matching.random_size, 3);
        assert!(cli.still_options().stripes);

        let params = cli.alpha_params(5, 4);
        assert_eq!((params.cols, params.rows), (5, 4));
        assert_eq!(params.num_frames, 60);
        assert_eq!(params.split_delta_frames, 20);
        assert_eq!(cli.video_config().total_frames(), 65);
        assert!(cli.validate().is_ok());
    }

    // Tests that unknown labels fail at parse time
    // Verified by falling back to the default metric
    #[test]
    fn test_cli_rejects_unknown_labels() {
        assert!(Cli::try_parse_from(["tessera", "a.png", "--metric", "median"]).is_err());
        assert!(Cli::try_parse_from(["tessera", "a.png", "--alpha", "spiral"]).is_err());
        assert!(Cli::try_parse_from(["tessera", "a.png", "--tile-size", "0x4"]).is_err());
    }

    // Tests option validation
    // Verified by skipping the alpha checks when a video is requested
    #[test]
    fn test_cli_validate_errors() {
        let invalid = [
            vec!["tessera", "a.png", "--random-size", "0"],
            vec!["tessera", "a.png", "--tile-alpha", "1.5"],
            vec!["tessera", "a.png", "--sample", "0"],
            vec!["tessera", "a.png", "--video", "v.gif", "--frames", "10", "--split-delta", "9"],
            vec!["tessera", "a.png", "--video", "v.gif", "--min-alpha", "0.9", "--max-alpha", "0.1"],
            vec!["tessera", "a.png", "--video", "v.gif", "--fps", "0"],
        ];

        for args in invalid {
            let cli = Cli::parse_from(&args);
            assert!(
                matches!(cli.validate(), Err(MosaicError::Configuration { .. })),
                "{args:?} should be rejected"
            );
        }

        let still_only = Cli::parse_from(["tessera", "a.png", "--frames", "1"]);
        assert!(still_only.validate().is_ok());
    }

    // Tests a full run producing the still image and a GIF transition
    // Verified by returning before the video stage
    #[test]
    fn test_runner_end_to_end() {
        let dir = tempdir().expect("temporary directory");
        let raw = dir.path().join("raw");
        let source = dir.path().join("source.png");
        let output = dir.path().join("out").join("mosaic.png");
        let video = dir.path().join("out").join("transition.gif");
        write_library(&raw, 20);
        write_source(&source);

        let cli = Cli::parse_from([
            "tessera".to_string(),
            path_arg(&source),
            "--library".to_string(),
            path_arg(&raw),
            "--cache-dir".to_string(),
            path_arg(&dir.path().join("cache")),
            "--output".to_string(),
            path_arg(&output),
            "--video".to_string(),
            path_arg(&video),
            "--tile-size".to_string(),
            "8,8".to_string(),
            "--frames".to_string(),
            "6".to_string(),
            "--split-delta".to_string(),
            "2".to_string(),
            "--hold-frames".to_string(),
            "1".to_string(),
            "--quiet".to_string(),
        ]);
        let mut runner = MosaicRunner::new(cli);

        let result = runner.run();

        assert!(result.is_ok(), "run failed: {result:?}");
        let still = image::open(&output).expect("still image").into_rgb8();
        assert_eq!(still.dimensions(), (32, 32));
        assert!(video.is_file());
        assert!(dir.path().join("cache").join("tile00_8x8.png").is_file());
    }

    // Tests that the cache alone can feed a second run
    // Verified by requiring --library on every run
    #[test]
    fn test_runner_from_cache() {
        let dir = tempdir().expect("temporary directory");
        let raw = dir.path().join("raw");
        let cache = dir.path().join("cache");
        let source = dir.path().join("source.png");
        write_library(&raw, 16);
        write_source(&source);

        let args = |library: bool, output: &str| {
            let mut args = vec![
                "tessera".to_string(),
                path_arg(&source),
                "--cache-dir".to_string(),
                path_arg(&cache),
                "--output".to_string(),
                path_arg(&dir.path().join(output)),
                "--tile-size".to_string(),
                "8x8".to_string(),
                "--fast".to_string(),
                "--quiet".to_string(),
            ];
            if library {
                args.extend(["--library".to_string(), path_arg(&raw)]);
            }
            args
        };

        let first = MosaicRunner::new(Cli::parse_from(args(true, "first.png"))).run();
        let second = MosaicRunner::new(Cli::parse_from(args(false, "second.png"))).run();

        assert!(first.is_ok() && second.is_ok());
        let a = image::open(dir.path().join("first.png")).expect("first").into_rgb8();
        let b = image::open(dir.path().join("second.png")).expect("second").into_rgb8();
        assert_eq!(a, b);
    }

    // Tests that a short library stops the run before anything is written
    // Verified by filling the remaining cells with repeated tiles
    #[test]
    fn test_runner_insufficient_library() {
        let dir = tempdir().expect("temporary directory");
        let raw = dir.path().join("raw");
        let source = dir.path().join("source.png");
        let output = dir.path().join("mosaic.png");
        write_library(&raw, 3);
        write_source(&source);

        let cli = Cli::parse_from([
            "tessera".to_string(),
            path_arg(&source),
            "--library".to_string(),
            path_arg(&raw),
            "--cache-dir".to_string(),
            path_arg(&dir.path().join("cache")),
            "--output".to_string(),
            path_arg(&output),
            "--tile-size".to_string(),
            "8,8".to_string(),
            "--quiet".to_string(),
        ]);

        let result = MosaicRunner::new(cli).run();

        assert!(matches!(
            result,
            Err(MosaicError::InsufficientLibrary {
                available: 3,
                required: 16
            })
        ));
        assert!(!output.exists());
    }

    // Tests that a sample smaller than the grid is rejected by the composer
    // Verified by sampling after the size check
    #[test]
    fn test_runner_sample_below_grid() {
        let dir = tempdir().expect("temporary directory");
        let raw = dir.path().join("raw");
        let source = dir.path().join("source.png");
        let output = dir.path().join("mosaic.png");
        write_library(&raw, 20);
        write_source(&source);

        let cli = Cli::parse_from([
            "tessera".to_string(),
            path_arg(&source),
            "--library".to_string(),
            path_arg(&raw),
            "--cache-dir".to_string(),
            path_arg(&dir.path().join("cache")),
            "--output".to_string(),
            path_arg(&output),
            "--tile-size".to_string(),
            "8,8".to_string(),
            "--sample".to_string(),
            "10".to_string(),
            "--quiet".to_string(),
        ]);

        let result = MosaicRunner::new(cli).run();

        assert!(matches!(
            result,
            Err(MosaicError::InsufficientLibrary {
                available: 10,
                required: 16
            })
        ));
        assert!(!output.exists());
    }

    // Tests that a run without a library or cache reports the missing cache
    // Verified by creating the cache when loading
    #[test]
    fn test_runner_missing_library() {
        let dir = tempdir().expect("temporary directory");
        let source = dir.path().join("source.png");
        write_source(&source);

        let cli = Cli::parse_from([
            "tessera".to_string(),
            path_arg(&source),
            "--cache-dir".to_string(),
            path_arg(&dir.path().join("nowhere")),
            "--quiet".to_string(),
        ]);
        let mut runner = MosaicRunner::new(cli);
        assert!(runner.cli().quiet);

        assert!(matches!(
            runner.run(),
            Err(MosaicError::LibraryNotFound { .. })
        ));
    }
}
