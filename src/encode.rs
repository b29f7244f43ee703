use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::Context as _;
use gif::{DisposalMethod, Encoder, Frame, Repeat};
use image::RgbaImage;

use crate::{
    error::{RetintError, RetintResult},
    frame::FrameSequence,
};

/// Palette slot reserved for transparent pixels in every frame.
pub const TRANSPARENT_INDEX: u8 = 0;

/// Quantizer speed (1 = best, 30 = fastest) for frames that exceed an
/// exact palette.
const QUANTIZE_SPEED: i32 = 10;

pub fn ensure_parent_dir(path: &Path) -> RetintResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Encode the sequence as an animated GIF on disk.
pub fn encode_gif_path(seq: &FrameSequence, path: &Path) -> RetintResult<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("create gif '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    encode_gif(seq, &mut writer)?;
    writer
        .flush()
        .with_context(|| format!("flush gif '{}'", path.display()))?;
    Ok(())
}

/// Encode the sequence as an animated GIF: infinite loop, per-frame
/// delays (GIF stores centiseconds; milliseconds are truncated), full
/// frame images, transparency keyed to palette index 0, and
/// restore-to-background disposal between frames. No frame
/// differencing or palette reuse.
pub fn encode_gif<W: Write>(seq: &FrameSequence, writer: W) -> RetintResult<()> {
    seq.validate()?;

    let (width, height) = seq.dimensions().unwrap_or((0, 0));
    let screen_w = u16::try_from(width)
        .map_err(|_| RetintError::encode(format!("frame width {width} exceeds gif limit")))?;
    let screen_h = u16::try_from(height)
        .map_err(|_| RetintError::encode(format!("frame height {height} exceeds gif limit")))?;

    let mut encoder =
        Encoder::new(writer, screen_w, screen_h, &[]).context("write gif screen descriptor")?;
    encoder
        .set_repeat(Repeat::Infinite)
        .context("write gif loop extension")?;

    for (image, delay_ms) in seq.iter() {
        let mut frame = indexed_frame(image, screen_w, screen_h);
        frame.delay = delay_to_centis(delay_ms);
        frame.dispose = DisposalMethod::Background;
        encoder.write_frame(&frame).context("write gif frame")?;
    }

    Ok(())
}

/// Millisecond delays truncate to the container's centisecond field, so
/// anything under 10 ms encodes as delay 0.
fn delay_to_centis(delay_ms: u32) -> u16 {
    (delay_ms / 10).min(u32::from(u16::MAX)) as u16
}

/// Build an indexed frame whose transparent slot is palette index 0.
///
/// Frames that fit an exact palette (at most 255 distinct opaque
/// colors) are mapped losslessly. Larger frames fall back to the `gif`
/// crate's quantizer and get their transparent slot swapped into
/// index 0 afterwards.
fn indexed_frame(image: &RgbaImage, width: u16, height: u16) -> Frame<'static> {
    match palettize_exact(image) {
        Some((palette, pixels)) => Frame {
            width,
            height,
            transparent: Some(TRANSPARENT_INDEX),
            palette: Some(palette),
            buffer: pixels.into(),
            ..Frame::default()
        },
        None => {
            let mut rgba = image.as_raw().clone();
            let mut frame = Frame::from_rgba_speed(width, height, &mut rgba, QUANTIZE_SPEED);
            move_transparent_to_index_zero(&mut frame);
            frame
        }
    }
}

/// Exact palettization: slot 0 is transparent, every distinct opaque
/// RGB triple gets its own entry. Returns `None` when the frame needs
/// more than 255 opaque entries.
fn palettize_exact(image: &RgbaImage) -> Option<(Vec<u8>, Vec<u8>)> {
    let mut palette = vec![0u8; 3];
    let mut slots: HashMap<[u8; 3], u8> = HashMap::new();
    let mut pixels = Vec::with_capacity(image.width() as usize * image.height() as usize);

    for px in image.as_raw().chunks_exact(4) {
        if px[3] == 0 {
            pixels.push(TRANSPARENT_INDEX);
            continue;
        }
        let rgb = [px[0], px[1], px[2]];
        let idx = match slots.get(&rgb) {
            Some(&idx) => idx,
            None => {
                let next = palette.len() / 3;
                if next > usize::from(u8::MAX) {
                    return None;
                }
                palette.extend_from_slice(&rgb);
                slots.insert(rgb, next as u8);
                next as u8
            }
        };
        pixels.push(idx);
    }

    // GIF color tables hold at least 2 entries; a fully transparent
    // frame would otherwise produce a 1-entry palette.
    if palette.len() < 6 {
        palette.resize(6, 0);
    }

    Some((palette, pixels))
}

/// Rewrite a quantized frame so its transparent slot sits at index 0.
fn move_transparent_to_index_zero(frame: &mut Frame<'_>) {
    let Some(old) = frame.transparent else {
        return;
    };
    if old == TRANSPARENT_INDEX {
        return;
    }

    if let Some(palette) = frame.palette.as_mut() {
        let a = usize::from(TRANSPARENT_INDEX) * 3;
        let b = usize::from(old) * 3;
        if b + 3 <= palette.len() {
            for off in 0..3 {
                palette.swap(a + off, b + off);
            }
        }
    }

    let buffer = frame.buffer.to_mut();
    for px in buffer.iter_mut() {
        if *px == old {
            *px = TRANSPARENT_INDEX;
        } else if *px == TRANSPARENT_INDEX {
            *px = old;
        }
    }

    frame.transparent = Some(TRANSPARENT_INDEX);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> (gif::Decoder<std::io::Cursor<&[u8]>>, Vec<gif::Frame<'static>>) {
        let mut opts = gif::DecodeOptions::new();
        opts.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = opts.read_info(std::io::Cursor::new(bytes)).unwrap();
        let mut frames = Vec::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            frames.push(frame.clone());
        }
        (decoder, frames)
    }

    fn two_color_frame() -> RgbaImage {
        RgbaImage::from_fn(4, 4, |x, _| {
            if x < 2 {
                image::Rgba([210, 10, 10, 255])
            } else {
                image::Rgba([255, 255, 255, 0])
            }
        })
    }

    #[test]
    fn writes_delay_disposal_and_transparent_slot() {
        let mut seq = FrameSequence::default();
        seq.push(two_color_frame(), 8);
        seq.push(two_color_frame(), 80);

        let mut bytes = Vec::new();
        encode_gif(&seq, &mut bytes).unwrap();

        let (decoder, frames) = decode_all(&bytes);
        assert_eq!(decoder.width(), 4);
        assert_eq!(decoder.height(), 4);
        assert_eq!(frames.len(), 2);
        // 8 ms truncates to 0 cs, 80 ms to 8 cs.
        assert_eq!(frames[0].delay, 0);
        assert_eq!(frames[1].delay, 8);
        for frame in &frames {
            assert_eq!(frame.dispose, gif::DisposalMethod::Background);
            assert_eq!(frame.transparent, Some(TRANSPARENT_INDEX));
            assert_eq!((frame.left, frame.top), (0, 0));
            assert_eq!((frame.width, frame.height), (4, 4));
        }
    }

    #[test]
    fn exact_palette_keeps_opaque_colors_losslessly() {
        let image = two_color_frame();
        let (palette, pixels) = palettize_exact(&image).unwrap();
        // Slot 0 transparent, slot 1 the single opaque color.
        assert_eq!(palette.len(), 6);
        assert_eq!(&palette[3..6], &[210, 10, 10]);
        assert_eq!(pixels.len(), 16);
        assert!(pixels.iter().all(|&p| p <= 1));
    }

    #[test]
    fn palette_overflow_falls_back_to_quantizer() {
        // 16x17 image with 271 distinct opaque colors plus one
        // transparent pixel: too many for an exact palette.
        let image = RgbaImage::from_fn(16, 17, |x, y| {
            if (x, y) == (0, 0) {
                image::Rgba([0, 0, 0, 0])
            } else {
                image::Rgba([x as u8, y as u8, x as u8 ^ y as u8, 255])
            }
        });
        assert!(palettize_exact(&image).is_none());

        let frame = indexed_frame(&image, 16, 17);
        assert_eq!(frame.transparent, Some(TRANSPARENT_INDEX));
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let mut bytes = Vec::new();
        assert!(encode_gif(&FrameSequence::default(), &mut bytes).is_err());
    }

    #[test]
    fn oversized_frames_are_rejected() {
        let mut seq = FrameSequence::default();
        seq.push(
            RgbaImage::new(u32::from(u16::MAX) + 1, 1),
            8,
        );
        assert!(encode_gif(&seq, &mut Vec::new()).is_err());
    }

    #[test]
    fn transparent_swap_rewrites_palette_and_buffer() {
        let mut frame = Frame {
            width: 2,
            height: 1,
            transparent: Some(1),
            palette: Some(vec![210, 10, 10, 0, 0, 0]),
            buffer: vec![0u8, 1u8].into(),
            ..Frame::default()
        };
        move_transparent_to_index_zero(&mut frame);
        assert_eq!(frame.transparent, Some(0));
        assert_eq!(frame.palette.as_deref(), Some(&[0, 0, 0, 210, 10, 10][..]));
        assert_eq!(&*frame.buffer, &[1u8, 0u8]);
    }
}
