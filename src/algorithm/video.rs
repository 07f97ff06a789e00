//! Frame-by-frame transition from the source image to its mosaic

use crate::algorithm::alpha::AlphaGenerator;
use crate::algorithm::composer::{CellAssignment, composite_cell};
use crate::io::configuration::{DEFAULT_HOLD_FRAMES, DEFAULT_NUM_FRAMES};
use crate::io::encoder::FrameSink;
use crate::io::error::Result;
use crate::io::progress::ProgressManager;
use image::RgbImage;

/// Render one transition frame
///
/// Starts from the source, so pixels outside the grid always show the
/// source. Each cell is composited with the generator's weight for this
/// frame; the generator must already have been updated to `frame_id`.
pub fn render_frame(
    source: &RgbImage,
    assignment: &CellAssignment,
    generator: &dyn AlphaGenerator,
    frame_id: usize,
) -> RgbImage {
    let mut frame = source.clone();
    for (cell, entry) in assignment.iter() {
        let weight = generator.alpha(frame_id, cell);
        composite_cell(
            &mut frame,
            source,
            assignment.grid(),
            cell,
            entry.pixels(),
            weight,
        );
    }
    frame
}

/// Frame counts of a transition video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConfig {
    /// Transition frames
    pub num_frames: usize,
    /// Extra copies of the last transition frame
    pub hold_frames: usize,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            num_frames: DEFAULT_NUM_FRAMES,
            hold_frames: DEFAULT_HOLD_FRAMES,
        }
    }
}

impl VideoConfig {
    /// Frames written in total
    pub const fn total_frames(&self) -> usize {
        self.num_frames + self.hold_frames
    }
}

/// Render the whole transition into a sink
///
/// Frames are written in index order, followed by `hold_frames` copies of
/// the final frame. The sink is finished before returning.
///
/// # Errors
///
/// Returns an error if the sink rejects a frame or fails to finish.
#[tracing::instrument(skip_all, fields(frames = config.num_frames, hold = config.hold_frames))]
pub fn render_video(
    source: &RgbImage,
    assignment: &CellAssignment,
    generator: &mut dyn AlphaGenerator,
    config: &VideoConfig,
    sink: &mut dyn FrameSink,
    progress: &mut ProgressManager,
) -> Result<()> {
    progress.start_stage("frames", config.total_frames());

    let mut last = None;
    for frame_id in 0..config.num_frames {
        generator.update_to_frame(frame_id);
        let frame = render_frame(source, assignment, generator, frame_id);
        sink.write_frame(&frame)?;
        progress.advance();
        last = Some(frame);
    }

    if let Some(frame) = last {
        for _ in 0..config.hold_frames {
            sink.write_frame(&frame)?;
            progress.advance();
        }
    }

    sink.finish()?;
    progress.finish_stage();
    tracing::info!(frames = config.total_frames(), "video written");
    Ok(())
}
