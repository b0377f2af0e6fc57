use std::fs;
use std::path::PathBuf;

use candle_core::DType;
use candle_nn::{VarBuilder, VarMap};
use ffmpeg_next as ffmpeg;
use ffmpeg_next::{codec, encoder, format, frame, Packet, Rational};
use unmask_infer::meso4::Meso4;
use unmask_infer::{BackendKind, Detector, Device, ModelSpec};
use unmask_video::sample;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 64;

fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("unmask-pipeline-test-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir.join(name)
}

/// Write `count` mid-gray frames into an AVI file with the mpeg4 encoder.
fn write_test_video(path: &PathBuf, count: usize) {
    ffmpeg::init().expect("ffmpeg init");
    let time_base = Rational(1, 25);
    let mut octx = format::output(path).expect("create output");
    let mpeg4 = encoder::find(codec::Id::MPEG4).expect("mpeg4 encoder");
    let mut stream = octx.add_stream(mpeg4).expect("add stream");
    let mut builder = codec::context::Context::new_with_codec(mpeg4)
        .encoder()
        .video()
        .expect("video encoder");
    builder.set_width(WIDTH);
    builder.set_height(HEIGHT);
    builder.set_format(format::Pixel::YUV420P);
    builder.set_time_base(time_base);
    builder.set_frame_rate(Some(Rational(25, 1)));
    builder.set_bit_rate(1_000_000);
    let mut video = builder.open_as(mpeg4).expect("open encoder");
    stream.set_parameters(&video);
    stream.set_time_base(time_base);
    let stream_index = stream.index();
    octx.write_header().expect("write header");

    let mut yuv = frame::Video::new(format::Pixel::YUV420P, WIDTH, HEIGHT);
    for plane in 0..3 {
        let stride = yuv.stride(plane);
        let rows = if plane == 0 { HEIGHT } else { HEIGHT / 2 };
        let cols = if plane == 0 { WIDTH } else { WIDTH / 2 };
        let data = yuv.data_mut(plane);
        for y in 0..rows as usize {
            let start = y * stride;
            data[start..start + cols as usize].fill(128);
        }
    }
    for index in 0..count {
        yuv.set_pts(Some(index as i64));
        video.send_frame(&yuv).expect("send frame");
        drain(&mut video, &mut octx, stream_index, time_base);
    }
    video.send_eof().expect("send eof");
    drain(&mut video, &mut octx, stream_index, time_base);
    octx.write_trailer().expect("write trailer");
}

fn drain(
    video: &mut encoder::Video,
    octx: &mut format::context::Output,
    stream_index: usize,
    time_base: Rational,
) {
    let mut packet = Packet::empty();
    while video.receive_packet(&mut packet).is_ok() {
        packet.set_stream(stream_index);
        packet.rescale_ts(time_base, octx.stream(stream_index).unwrap().time_base());
        packet.write_interleaved(octx).expect("write packet");
    }
}

fn fresh_spec(checkpoint: &str) -> ModelSpec {
    let path = temp_path(checkpoint);
    let varmap = VarMap::new();
    let device = candle_core::Device::Cpu;
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    Meso4::load(vb, (64, 64), 2).expect("build model");
    // from_varmap seeds fresh layers randomly; zero them so the checkpoint
    // scores every frame at the sigmoid midpoint.
    for var in varmap.all_vars() {
        var.set(&var.zeros_like().expect("zeros")).expect("zero var");
    }
    varmap.save(&path).expect("save checkpoint");
    ModelSpec {
        name: "meso4-test".to_string(),
        kind: BackendKind::Torch,
        path,
        input_size: (64, 64),
    }
}

#[test]
fn test_video_to_prediction() {
    let video_path = temp_path("pipeline.avi");
    write_test_video(&video_path, 45);

    let frames = sample(&video_path, 15, 40, (256, 256));
    assert_eq!(frames.len(), 3);

    let detector = Detector::new(&fresh_spec("pipeline.safetensors"), Device::Cpu)
        .expect("load detector");
    let prediction = detector.predict(&frames).expect("predict");

    assert_eq!(prediction.scores.len(), frames.len());
    for score in &prediction.scores {
        assert!((0.0..=1.0).contains(score));
        // Zero-initialized weights produce zero logits, so every frame
        // lands exactly on the decision midpoint.
        assert!((score - 0.5).abs() < 1e-6);
    }
    assert!((prediction.aggregate.mean - 0.5).abs() < 1e-6);
    assert!((prediction.aggregate.median - 0.5).abs() < 1e-6);
    assert_eq!(prediction.aggregate.majority_ratio, 0.0);

    fs::remove_file(&video_path).ok();
}

#[test]
fn test_unreadable_video_yields_zero_prediction() {
    let frames = sample("/nonexistent/clip.mp4", 15, 40, (256, 256));
    assert!(frames.is_empty());

    let detector = Detector::new(&fresh_spec("zero.safetensors"), Device::Cpu)
        .expect("load detector");
    let prediction = detector.predict(&frames).expect("predict");
    assert!(prediction.scores.is_empty());
    assert_eq!(prediction.aggregate.mean, 0.0);
    assert_eq!(prediction.aggregate.median, 0.0);
    assert_eq!(prediction.aggregate.majority_ratio, 0.0);
}
