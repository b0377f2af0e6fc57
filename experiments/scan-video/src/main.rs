use unmask_base::{log, log_fatal};
use unmask_infer::{DetectorRegistry, Device, ModelCatalog};
use unmask_video::{is_supported_container, sample, MAX_FRAMES, SAMPLE_EVERY_N, SAMPLE_RESIZE};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    unmask_base::init_stdout_logger();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        eprintln!("Usage: {} <video> [model-name] [catalog.json]", args[0]);
        std::process::exit(1);
    }
    let video = &args[1];
    let model_name = args.get(2).map(|s| s.as_str()).unwrap_or("meso4");
    let catalog = match args.get(3) {
        Some(path) => ModelCatalog::from_json_file(path)?,
        None => ModelCatalog::builtin(),
    };

    if !is_supported_container(video) {
        log::warn!("unrecognized container extension for {video}, trying anyway");
    }

    #[cfg(feature = "cuda")]
    let device = Device::Cuda { device_id: 0 };
    #[cfg(not(feature = "cuda"))]
    let device = Device::Cpu;
    log::info!("scanning {video} with model {model_name} on {device}");

    let frames = sample(video, SAMPLE_EVERY_N, MAX_FRAMES, SAMPLE_RESIZE);
    if frames.is_empty() {
        log_fatal!("no frames extracted from {video}");
    }
    log::info!("sampled {} frames", frames.len());

    let registry = DetectorRegistry::new(catalog, device);
    let detector = registry.get(model_name)?;

    let prediction = detector.predict(&frames)?;

    let report = serde_json::json!({
        "filename": video,
        "model_used": detector.model_name(),
        "backend": detector.backend_name(),
        "num_frames": frames.len(),
        "frame_scores": prediction.scores,
        "aggregate": prediction.aggregate,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
