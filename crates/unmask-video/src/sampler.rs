use std::path::Path;

use ffmpeg_next as ffmpeg;
use ffmpeg_next::{codec, format, frame, media, software::scaling};
use unmask_base::Tensor;

use crate::Frame;

/// Keep every 15th decoded frame by default.
pub const SAMPLE_EVERY_N: usize = 15;
/// Default cap on the number of sampled frames per video.
pub const MAX_FRAMES: usize = 40;
/// Default output size for sampled frames, as `(width, height)`.
pub const SAMPLE_RESIZE: (u32, u32) = (256, 256);

const SUPPORTED_CONTAINERS: [&str; 4] = ["mp4", "mov", "avi", "mkv"];

/// Container-level properties of a video stream, read without decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Frame count as reported by the container, or estimated from the
    /// stream duration when the container does not carry one.
    pub frames: u64,
    pub fps: f64,
}

/// True when the path has a container extension the sampler handles
/// (mp4, mov, avi, mkv), compared case-insensitively.
pub fn is_supported_container(path: impl AsRef<Path>) -> bool {
    match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_CONTAINERS.iter().any(|name| *name == ext)
        }
        None => false,
    }
}

/// Read stream properties from the container header. Returns `None` when
/// the file cannot be opened or has no video stream.
pub fn probe(path: impl AsRef<Path>) -> Option<VideoInfo> {
    ffmpeg::init().ok()?;
    let ictx = format::input(&path).ok()?;
    let stream = ictx.streams().best(media::Type::Video)?;
    let decoder = codec::context::Context::from_parameters(stream.parameters())
        .ok()?
        .decoder()
        .video()
        .ok()?;
    let rate = stream.avg_frame_rate();
    let fps = if rate.denominator() > 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    };
    let mut frames = stream.frames().max(0) as u64;
    if frames == 0 && fps > 0.0 {
        let base = stream.time_base();
        let seconds =
            stream.duration().max(0) as f64 * base.numerator() as f64 / base.denominator() as f64;
        frames = (seconds * fps).round() as u64;
    }
    Some(VideoInfo {
        width: decoder.width(),
        height: decoder.height(),
        frames,
        fps,
    })
}

/// Decode `video_path`, keeping every `every_n`-th frame until `max_frames`
/// frames have been taken, each scaled to `resize` (width, height) BGR24.
///
/// Sampling is best-effort: an unreadable or unsupported input yields an
/// empty vector, and a corrupt packet mid-stream ends the scan with the
/// frames collected up to that point.
pub fn sample(
    video_path: impl AsRef<Path>,
    every_n: usize,
    max_frames: usize,
    resize: (u32, u32),
) -> Vec<Frame> {
    let path = video_path.as_ref();
    if max_frames == 0 {
        return Vec::new();
    }
    match decode_selected(path, every_n, max_frames, resize) {
        Ok(frames) => frames,
        Err(error) => {
            log::warn!("cannot sample {:?}: {}", path, error);
            Vec::new()
        }
    }
}

fn decode_selected(
    path: &Path,
    every_n: usize,
    max_frames: usize,
    resize: (u32, u32),
) -> Result<Vec<Frame>, ffmpeg::Error> {
    ffmpeg::init()?;
    let mut ictx = format::input(&path)?;
    let stream = ictx
        .streams()
        .best(media::Type::Video)
        .ok_or(ffmpeg::Error::StreamNotFound)?;
    let stream_index = stream.index();
    let mut decoder = codec::context::Context::from_parameters(stream.parameters())?
        .decoder()
        .video()?;
    log::debug!(
        "sampling {:?}: {}x{} {:?}, every {} frames, at most {}",
        path,
        decoder.width(),
        decoder.height(),
        decoder.format(),
        every_n.max(1),
        max_frames
    );
    let mut scaler = scaling::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        format::Pixel::BGR24,
        resize.0,
        resize.1,
        scaling::Flags::BILINEAR,
    )?;

    let mut picker = FramePicker::new(every_n, max_frames);
    let mut frames = Vec::new();
    let mut decoded = frame::Video::empty();
    let mut truncated = false;
    'stream: for (stream, packet) in ictx.packets() {
        if stream.index() != stream_index {
            continue;
        }
        if decoder.send_packet(&packet).is_err() {
            // Corrupt packet; keep what was decoded so far.
            truncated = true;
            break;
        }
        while decoder.receive_frame(&mut decoded).is_ok() {
            if let Some(index) = picker.admit() {
                frames.push(to_bgr_frame(&mut scaler, &decoded, resize, index)?);
            }
            if picker.full() {
                break 'stream;
            }
        }
    }
    if !picker.full() && !truncated {
        // Flush frames the decoder is still holding back.
        let _ = decoder.send_eof();
        while decoder.receive_frame(&mut decoded).is_ok() {
            if let Some(index) = picker.admit() {
                frames.push(to_bgr_frame(&mut scaler, &decoded, resize, index)?);
            }
            if picker.full() {
                break;
            }
        }
    }
    Ok(frames)
}

fn to_bgr_frame(
    scaler: &mut scaling::Context,
    decoded: &frame::Video,
    resize: (u32, u32),
    index: u64,
) -> Result<Frame, ffmpeg::Error> {
    let mut bgr = frame::Video::empty();
    scaler.run(decoded, &mut bgr)?;
    let (width, height) = (resize.0 as usize, resize.1 as usize);
    // Drop the per-row stride padding so rows are tightly packed.
    let stride = bgr.stride(0);
    let raw = bgr.data(0);
    let row = width * 3;
    let mut data = Vec::with_capacity(height * row);
    for y in 0..height {
        let start = y * stride;
        data.extend_from_slice(&raw[start..start + row]);
    }
    let pixels =
        Tensor::new(vec![height, width, 3], data).map_err(|_| ffmpeg::Error::InvalidData)?;
    Ok(Frame { pixels, index })
}

/// Tracks which decoded frames to keep: every `every_n`-th frame until
/// `max_frames` have been taken. A stride of zero counts as one.
struct FramePicker {
    every_n: u64,
    max_frames: usize,
    next_index: u64,
    taken: usize,
}

impl FramePicker {
    fn new(every_n: usize, max_frames: usize) -> Self {
        Self {
            every_n: every_n.max(1) as u64,
            max_frames,
            next_index: 0,
            taken: 0,
        }
    }

    /// Consume the next decoded frame position, returning it when the frame
    /// falls on the sampling stride and the cap is not yet reached.
    fn admit(&mut self) -> Option<u64> {
        let index = self.next_index;
        self.next_index += 1;
        if self.taken >= self.max_frames || index % self.every_n != 0 {
            return None;
        }
        self.taken += 1;
        Some(index)
    }

    fn full(&self) -> bool {
        self.taken >= self.max_frames
    }
}
