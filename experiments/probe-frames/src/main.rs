use unmask_base::{log, log_fatal};
use unmask_video::{probe, sample, MAX_FRAMES, SAMPLE_EVERY_N, SAMPLE_RESIZE};

fn main() {
    unmask_base::init_stdout_logger();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <video>", args[0]);
        std::process::exit(1);
    }
    let video = &args[1];

    let Some(info) = probe(video) else {
        log_fatal!("cannot probe {video}: unreadable or no video stream");
    };
    println!(
        "{}: {}x{}, {:.2} fps, {} frames",
        video, info.width, info.height, info.fps, info.frames
    );

    let frames = sample(video, SAMPLE_EVERY_N, MAX_FRAMES, SAMPLE_RESIZE);
    log::info!(
        "sampled {} of {} frames (every {}, cap {})",
        frames.len(),
        info.frames,
        SAMPLE_EVERY_N,
        MAX_FRAMES
    );
    for frame in &frames {
        println!("frame {:>5}: {}x{}", frame.index, frame.width(), frame.height());
    }
}
