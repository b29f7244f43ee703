use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;
use image::{AnimationDecoder as _, codecs::gif::GifDecoder};

use crate::{
    error::{RetintError, RetintResult},
    frame::FrameSequence,
};

/// Decode an animated GIF from disk into full-size RGBA8 frames.
pub fn decode_gif_path(path: &Path) -> RetintResult<FrameSequence> {
    let file = File::open(path).with_context(|| format!("open gif '{}'", path.display()))?;
    decode_gif(BufReader::new(file))
}

/// Decode an animated GIF from any reader.
///
/// The animation decoder composites each frame onto the logical screen
/// (applying disposal), so every returned frame has the full canvas
/// size. Source delays are kept as whole milliseconds.
pub fn decode_gif(reader: impl std::io::BufRead + std::io::Seek) -> RetintResult<FrameSequence> {
    let decoder = GifDecoder::new(reader).context("read gif header")?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .context("decode gif frames")?;

    if frames.is_empty() {
        return Err(RetintError::decode("gif contains no frames"));
    }

    let mut seq = FrameSequence::with_capacity(frames.len());
    for frame in frames {
        let delay_ms = whole_millis(frame.delay());
        seq.push(frame.into_buffer(), delay_ms);
    }

    tracing::debug!(frames = seq.len(), "decoded gif");
    Ok(seq)
}

fn whole_millis(delay: image::Delay) -> u32 {
    let (num, den) = delay.numer_denom_ms();
    if den == 0 { 0 } else { num / den }
}
