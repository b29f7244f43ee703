use std::path::Path;

use crate::{
    decode, encode,
    error::RetintResult,
    frame::FrameSequence,
    keyout::{self, WHITE_KEY_THRESHOLD},
    scale::{self, SCALE_FACTOR},
    tint,
};

/// Every n-th decoded frame survives decimation.
pub const FRAME_STRIDE: usize = 2;

/// Display delay assigned to every surviving frame.
pub const FRAME_DELAY_MS: u32 = 8;

/// Summary of a completed run.
#[derive(Clone, Copy, Debug)]
pub struct PipelineStats {
    pub source_frames: usize,
    pub kept_frames: usize,
    pub source_size: (u32, u32),
    pub output_size: (u32, u32),
    pub cycle_ms: u64,
}

/// Run the whole transformation: decode, decimate, key out the white
/// background, recolor, retime, downscale, encode.
///
/// Any stage failure aborts the run; there is no retry or partial
/// output policy.
#[tracing::instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn process_gif(input: &Path, output: &Path) -> RetintResult<PipelineStats> {
    let decoded = decode::decode_gif_path(input)?;
    let source_frames = decoded.len();

    let mut seq = keep_every(decoded, FRAME_STRIDE);
    tracing::info!(source_frames, kept = seq.len(), "decimated frames");

    for frame in seq.frames.iter_mut() {
        keyout::key_out_white_in_place(frame, WHITE_KEY_THRESHOLD);
        tint::tint_brand_red_in_place(frame);
    }
    seq.delays_ms = vec![FRAME_DELAY_MS; seq.frames.len()];

    let (src_w, src_h) = seq
        .dimensions()
        .ok_or_else(|| crate::RetintError::validation("no frames survived decimation"))?;
    let (out_w, out_h) = scale::scaled_dimensions(src_w, src_h, SCALE_FACTOR)?;
    tracing::info!(src_w, src_h, out_w, out_h, "resizing frames");

    let mut resized = FrameSequence::with_capacity(seq.len());
    for (frame, delay_ms) in seq.iter() {
        resized.push(scale::resize_frame(frame, out_w, out_h), delay_ms);
    }

    encode::encode_gif_path(&resized, output)?;

    let stats = PipelineStats {
        source_frames,
        kept_frames: resized.len(),
        source_size: (src_w, src_h),
        output_size: (out_w, out_h),
        cycle_ms: resized.cycle_ms(),
    };
    tracing::info!(
        frames = stats.kept_frames,
        cycle_ms = stats.cycle_ms,
        "wrote gif"
    );
    Ok(stats)
}

/// Keep frames at indices 0, stride, 2*stride, … together with their
/// delays. A stride below 2 keeps everything.
pub fn keep_every(seq: FrameSequence, stride: usize) -> FrameSequence {
    let stride = stride.max(1);
    let mut kept = FrameSequence::with_capacity(seq.len().div_ceil(stride));
    for (i, (frame, delay_ms)) in seq.frames.into_iter().zip(seq.delays_ms).enumerate() {
        if i % stride == 0 {
            kept.push(frame, delay_ms);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;

    fn seq_of(n: usize) -> FrameSequence {
        let mut seq = FrameSequence::default();
        for i in 0..n {
            seq.push(
                RgbaImage::from_pixel(2, 2, image::Rgba([i as u8, 0, 0, 255])),
                100,
            );
        }
        seq
    }

    #[test]
    fn keep_every_takes_even_indices() {
        let kept = keep_every(seq_of(5), 2);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept.frames[0].get_pixel(0, 0).0[0], 0);
        assert_eq!(kept.frames[1].get_pixel(0, 0).0[0], 2);
        assert_eq!(kept.frames[2].get_pixel(0, 0).0[0], 4);
    }

    #[test]
    fn keep_every_rounds_up() {
        // ceil(n / 2) surviving frames.
        assert_eq!(keep_every(seq_of(6), 2).len(), 3);
        assert_eq!(keep_every(seq_of(7), 2).len(), 4);
        assert_eq!(keep_every(seq_of(1), 2).len(), 1);
    }

    #[test]
    fn stride_one_keeps_everything() {
        assert_eq!(keep_every(seq_of(4), 1).len(), 4);
    }

    #[test]
    fn kept_delays_travel_with_their_frames() {
        let mut seq = FrameSequence::default();
        for i in 0..4u32 {
            seq.push(RgbaImage::new(1, 1), i * 10);
        }
        let kept = keep_every(seq, 2);
        assert_eq!(kept.delays_ms, vec![0, 20]);
    }
}
