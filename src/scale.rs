use image::{RgbaImage, imageops};

use crate::error::{RetintError, RetintResult};

/// Output frames shrink to this fraction of the source dimensions.
pub const SCALE_FACTOR: f64 = 0.6;

/// Target size for a whole sequence, derived once from the source
/// dimensions with floor semantics.
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> RetintResult<(u32, u32)> {
    let w = (f64::from(width) * factor) as u32;
    let h = (f64::from(height) * factor) as u32;
    if w == 0 || h == 0 {
        return Err(RetintError::validation(format!(
            "scaling {width}x{height} by {factor} gives empty {w}x{h} output"
        )));
    }
    Ok((w, h))
}

/// Lanczos3 resample to the shared target size.
pub fn resize_frame(frame: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    imageops::resize(frame, width, height, imageops::FilterType::Lanczos3)
}
