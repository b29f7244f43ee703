use image::RgbaImage;

use crate::error::{RetintError, RetintResult};

/// An ordered run of RGBA8 frames plus a parallel list of per-frame
/// display delays in milliseconds. Playback order is vector order;
/// frames have no identity beyond their position.
#[derive(Clone, Debug, Default)]
pub struct FrameSequence {
    pub frames: Vec<RgbaImage>,
    pub delays_ms: Vec<u32>,
}

impl FrameSequence {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            frames: Vec::with_capacity(n),
            delays_ms: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, frame: RgbaImage, delay_ms: u32) {
        self.frames.push(frame);
        self.delays_ms.push(delay_ms);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Dimensions of the first frame, if any.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| f.dimensions())
    }

    /// Sum of all frame delays, one playback cycle.
    pub fn cycle_ms(&self) -> u64 {
        self.delays_ms.iter().map(|&d| u64::from(d)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RgbaImage, u32)> {
        self.frames.iter().zip(self.delays_ms.iter().copied())
    }

    /// Check the invariants the encoder relies on: non-empty, one delay
    /// per frame, and uniform frame dimensions.
    pub fn validate(&self) -> RetintResult<()> {
        if self.frames.is_empty() {
            return Err(RetintError::validation("frame sequence is empty"));
        }
        if self.frames.len() != self.delays_ms.len() {
            return Err(RetintError::validation(format!(
                "frame/delay length mismatch: {} frames, {} delays",
                self.frames.len(),
                self.delays_ms.len()
            )));
        }
        let (w, h) = self.frames[0].dimensions();
        for (i, f) in self.frames.iter().enumerate() {
            if f.dimensions() != (w, h) {
                return Err(RetintError::validation(format!(
                    "frame {i} is {}x{}, expected {w}x{h}",
                    f.width(),
                    f.height()
                )));
            }
        }
        Ok(())
    }
}
