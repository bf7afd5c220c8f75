mod rawvideo;
mod selector;
mod signal;

use rawvideo::{RawFrameReader, RawVideoError, StreamLayout};
use selector::{FrameAllocator, HeapAllocator, SelectorError, SelectorStats, SlideshowSelector};
use signal::{CueSignal, MaxHold, SubtitleSignal};
use slideshow_common::config::Config;
use slideshow_common::cue::load_vtt;
use slideshow_common::frame::{PixelFormat, VideoFrame};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error(transparent)]
    RawVideo(#[from] RawVideoError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    // stdout may carry video, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    let format = match config.stream.pixel_format.parse::<PixelFormat>() {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "unsupported stream.pixel_format");
            std::process::exit(1);
        }
    };
    let layout = match StreamLayout::new(
        config.stream.width,
        config.stream.height,
        format,
        config.stream.fps,
    ) {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, "unsupported stream geometry");
            std::process::exit(1);
        }
    };

    info!(
        width = layout.width,
        height = layout.height,
        format = %layout.format,
        fps = layout.fps,
        input = config.stream.input,
        output = config.stream.output,
        subtitles = config.subtitles.path,
        "starting slideshow filter"
    );

    let cues = match load_vtt(Path::new(&config.subtitles.path)) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to load subtitles");
            std::process::exit(1);
        }
    };
    info!(
        cues = cues.len(),
        dialogue_offset_ms = config.subtitles.dialogue_offset_ms,
        max_hold_ms = ?config.subtitles.max_hold_ms,
        "subtitle cues loaded"
    );
    let mut signal = MaxHold::new(
        CueSignal::new(&cues, config.subtitles.dialogue_offset_ms),
        config.subtitles.max_hold_ms,
    );

    let allocator = HeapAllocator::new(layout.frame_len(), config.stream.max_frame_bytes);
    let mut selector = match SlideshowSelector::open(allocator) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to open slideshow selector");
            std::process::exit(1);
        }
    };

    let input = match rawvideo::open_input(&config.stream.input).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "failed to open input");
            std::process::exit(1);
        }
    };
    let output = match rawvideo::open_output(&config.stream.output).await {
        Ok(w) => w,
        Err(e) => {
            error!(error = %e, "failed to open output");
            std::process::exit(1);
        }
    };

    let reader = RawFrameReader::new(input, layout);
    match run_filter_loop(reader, output, &mut signal, &mut selector).await {
        Ok(stats) => {
            info!(
                frames = stats.frames,
                passed_through = stats.passed_through,
                held = stats.held,
                events = stats.events,
                clone_failures = stats.clone_failures,
                clones = selector.allocator().clones(),
                unreached_cues = signal.inner().remaining(),
                "slideshow filter finished"
            );
        }
        Err(e) => {
            error!(error = %e, "slideshow filter failed");
            std::process::exit(1);
        }
    }
}

/// Pump frames from `reader` through the selector into `output` until the
/// input ends. The selector is closed on a clean end of input.
async fn run_filter_loop<R, W, S, A>(
    mut reader: RawFrameReader<R>,
    output: W,
    signal: &mut S,
    selector: &mut SlideshowSelector<A>,
) -> Result<SelectorStats, FilterError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    S: SubtitleSignal,
    A: FrameAllocator<Frame = VideoFrame>,
{
    let mut writer = BufWriter::new(output);
    info!(signal = signal.name(), "entering frame loop");

    while let Some(frame) = reader.next_frame().await? {
        let events = signal.events_at(frame.pts_ms);
        match selector.process(Some(frame), events) {
            Ok(Some(out)) => rawvideo::write_frame(&mut writer, &out).await?,
            Ok(None) => {}
            // Already logged by the selector; this tick has no output.
            Err(SelectorError::CloneFailure(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let total = reader.frames_read();
        if total % 500 == 0 {
            debug!(total, state = ?selector.state(), "frames processed");
        }
    }

    writer.flush().await.map_err(RawVideoError::Write)?;
    selector.close();
    Ok(selector.stats())
}
