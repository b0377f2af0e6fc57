pub mod frame;
pub mod sampler;

pub use frame::Frame;
pub use sampler::{
    is_supported_container, probe, sample, VideoInfo, MAX_FRAMES, SAMPLE_EVERY_N, SAMPLE_RESIZE,
};
