//! Tests for reading and writing RGB images

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;
    use tessera::MosaicError;
    use tessera::io::image::{read_rgb, write_rgb};

    // Tests that a written PNG reads back pixel for pixel, creating directories
    // Verified by saving to the parent directory path
    #[test]
    fn test_write_then_read() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("nested").join("out.png");
        let image = RgbImage::from_fn(5, 3, |x, y| Rgb([x as u8 * 50, y as u8 * 80, 7]));

        assert!(write_rgb(&path, &image).is_ok());
        let Ok(loaded) = read_rgb(&path) else {
            unreachable!("written image must load");
        };

        assert_eq!(loaded, image);
    }

    // Tests that a missing file reports its own path
    // Verified by reporting the placeholder path
    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("absent.png");

        let result = read_rgb(&path);

        assert!(matches!(&result, Err(MosaicError::ImageLoad { path: p, .. }) if *p == path));
    }

    // Tests that undecodable bytes are a load error
    // Verified by returning a blank image on decode failure
    #[test]
    fn test_read_corrupt_file() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").expect("write test file");

        assert!(matches!(read_rgb(&path), Err(MosaicError::ImageLoad { .. })));
    }

    // Tests that an unknown extension is an export error
    // Verified by defaulting unknown extensions to PNG
    #[test]
    fn test_write_unknown_format() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("out.unknownformat");

        let result = write_rgb(&path, &RgbImage::new(2, 2));

        assert!(matches!(result, Err(MosaicError::ImageExport { .. })));
    }
}
