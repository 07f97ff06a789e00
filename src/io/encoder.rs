//! Frame sinks for the transition video
//!
//! Frames arrive in index order and are written immediately; nothing is
//! buffered beyond the encoder's own state.

use crate::io::error::{MosaicError, Result, WithPath, encoding_error, invalid_option};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, RgbImage};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

/// Destination for rendered frames
pub trait FrameSink {
    /// Append one frame
    ///
    /// # Errors
    ///
    /// Returns an error if the frame size differs from the sink's or the
    /// underlying encoder fails.
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Flush and close the output; further frames are rejected
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder fails to finalize.
    fn finish(&mut self) -> Result<()>;
}

/// Size and rate of the output stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeConfig {
    /// Output file
    pub path: PathBuf,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frames per second
    pub fps: u32,
}

impl EncodeConfig {
    /// Check the stream parameters
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero dimension or frame rate.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid_option(
                "frame_size",
                &format!("{}x{}", self.width, self.height),
                &"must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(invalid_option("fps", &self.fps, &"must be non-zero"));
        }
        Ok(())
    }

    fn check_frame(&self, frame: &RgbImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(encoding_error(&format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_operation(parent, "create directory")?;
    }
    Ok(())
}

/// Open the sink matching the output extension
///
/// `.gif` streams through the GIF encoder; every other extension is handed
/// to ffmpeg.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the sink cannot be
/// opened.
pub fn open_sink(config: EncodeConfig) -> Result<Box<dyn FrameSink>> {
    let is_gif = config
        .path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gif"));

    if is_gif {
        Ok(Box::new(GifSink::create(config)?))
    } else {
        Ok(Box::new(FfmpegSink::spawn(config)?))
    }
}

/// Last byte of every complete GIF stream
const GIF_TRAILER: u8 = 0x3B;

/// Animated GIF output, looping forever
pub struct GifSink {
    config: EncodeConfig,
    encoder: Option<GifEncoder<BufWriter<File>>>,
    file: File,
    delay: Delay,
}

impl GifSink {
    /// Create the output file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the file cannot
    /// be created.
    pub fn create(config: EncodeConfig) -> Result<Self> {
        config.validate()?;
        ensure_parent_dir(&config.path)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&config.path)
            .with_operation(&config.path, "create file")?;
        let check = file.try_clone().with_operation(&config.path, "open file")?;
        let mut encoder = GifEncoder::new(BufWriter::new(file));
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| MosaicError::ImageExport {
                path: config.path.clone(),
                source: e,
            })?;

        Ok(Self {
            delay: Delay::from_numer_denom_ms(1000, config.fps),
            config,
            encoder: Some(encoder),
            file: check,
        })
    }

    fn verify_trailer(&self) -> Result<()> {
        let path = &self.config.path;
        self.file.sync_all().with_operation(path, "sync file")?;
        let length = self.file.metadata().with_operation(path, "read metadata")?.len();
        if length == 0 {
            return Err(encoding_error(&"no frames were written to the GIF"));
        }

        let mut last = [0u8; 1];
        let mut reader = &self.file;
        reader
            .seek(SeekFrom::End(-1))
            .and_then(|_| reader.read_exact(&mut last))
            .with_operation(path, "read file")?;
        if last != [GIF_TRAILER] {
            return Err(encoding_error(&format!(
                "GIF stream in '{}' is incomplete",
                path.display()
            )));
        }
        Ok(())
    }
}

impl FrameSink for GifSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        self.config.check_frame(frame)?;
        let Some(encoder) = self.encoder.as_mut() else {
            return Err(encoding_error(&"GIF sink is already finished"));
        };

        let rgba = DynamicImage::ImageRgb8(frame.clone()).into_rgba8();
        encoder
            .encode_frame(Frame::from_parts(rgba, 0, 0, self.delay))
            .map_err(|e| MosaicError::ImageExport {
                path: self.config.path.clone(),
                source: e,
            })
    }

    fn finish(&mut self) -> Result<()> {
        let Some(encoder) = self.encoder.take() else {
            return Ok(());
        };
        // The trailer write and final flush happen on drop and report no
        // errors, so the file itself is checked afterwards
        drop(encoder);
        self.verify_trailer()
    }
}

/// Whether an `ffmpeg` binary can be run
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// Raw RGB frames piped into an `ffmpeg` child process
///
/// Uses the system binary, producing H.264 in `yuv420p`.
pub struct FfmpegSink {
    config: EncodeConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FfmpegSink {
    /// Spawn ffmpeg for the configured output
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the frame size is
    /// odd, or ffmpeg cannot be started.
    pub fn spawn(config: EncodeConfig) -> Result<Self> {
        config.validate()?;
        if !config.width.is_multiple_of(2) || !config.height.is_multiple_of(2) {
            return Err(invalid_option(
                "frame_size",
                &format!("{}x{}", config.width, config.height),
                &"must be even for yuv420p video output",
            ));
        }
        ensure_parent_dir(&config.path)?;

        let size = format!("{}x{}", config.width, config.height);
        let rate = config.fps.to_string();
        let mut child = Command::new("ffmpeg")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args([
                "-y",
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-s",
                size.as_str(),
                "-r",
                rate.as_str(),
                "-i",
                "pipe:0",
                "-an",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
            ])
            .arg(&config.path)
            .spawn()
            .map_err(|e| encoding_error(&format!("failed to spawn ffmpeg: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| encoding_error(&"failed to open ffmpeg stdin"))?;

        Ok(Self {
            config,
            child: Some(child),
            stdin: Some(stdin),
        })
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        self.config.check_frame(frame)?;
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(encoding_error(&"ffmpeg sink is already finished"));
        };
        stdin
            .write_all(frame.as_raw())
            .map_err(|e| encoding_error(&format!("failed to write frame to ffmpeg: {e}")))
    }

    fn finish(&mut self) -> Result<()> {
        drop(self.stdin.take());
        let Some(child) = self.child.take() else {
            return Ok(());
        };

        let output = child
            .wait_with_output()
            .map_err(|e| encoding_error(&format!("failed to wait for ffmpeg: {e}")))?;
        if !output.status.success() {
            return Err(encoding_error(&format!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(child) = self.child.take() {
            match child.wait_with_output() {
                Ok(output) if !output.status.success() => {
                    tracing::warn!(
                        status = %output.status,
                        stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                        "ffmpeg exited abnormally after an unfinished stream"
                    );
                }
                Ok(_) => {}
                Err(error) => tracing::warn!(%error, "failed to wait for ffmpeg"),
            }
        }
    }
}
