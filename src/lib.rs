#![forbid(unsafe_code)]

pub mod decode;
pub mod encode;
pub mod error;
pub mod frame;
pub mod keyout;
pub mod pipeline;
pub mod scale;
pub mod tint;

pub use error::{RetintError, RetintResult};
pub use frame::FrameSequence;
pub use pipeline::{FRAME_DELAY_MS, FRAME_STRIDE, PipelineStats, process_gif};
