//! FFmpeg-backed decode source and FFmpeg log level control.
//!
//! [`FfmpegSource`] implements [`DecodeSource`] for any file FFmpeg can
//! demux. Creating one only records the path. The container is opened and
//! its streams inspected in [`load_metadata`](DecodeSource::load_metadata),
//! on tokio's blocking pool, so the sampler's metadata timeout also bounds
//! a file that hangs while opening, and an unreadable file fails the run.
//!
//! Seeking goes to the nearest keyframe before the target and then decodes
//! forward until a frame at or after the target is reached, yielding to the
//! scheduler after every packet so the step timeout can interrupt it.
//!
//! # Example
//!
//! ```no_run
//! use stillpick::{FfmpegLogLevel, FfmpegSource, SamplingOptions, Session, StillpickError};
//!
//! # async fn example() -> Result<(), StillpickError> {
//! stillpick::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//!
//! let mut session = Session::new(SamplingOptions::new());
//! session.load(FfmpegSource::new("input.mp4")).await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level,
};

use crate::error::StillpickError;
use crate::raster::RasterTarget;
use crate::source::{DecodeSource, SourceMetadata};

/// Tolerance used when the stream does not report a frame rate.
const DEFAULT_FRAME_TOLERANCE: f64 = 0.02;

/// A [`DecodeSource`] reading a media file through FFmpeg.
pub struct FfmpegSource {
    path: PathBuf,
    decoding: Option<Decoding>,
    current: Option<VideoFrame>,
}

/// The opened container and its chosen video stream.
struct OpenedInput {
    input: Input,
    stream_index: usize,
    time_base: Rational,
    frame_tolerance: f64,
    duration_seconds: Option<f64>,
}

/// Decoder state, available once metadata has loaded.
struct Decoding {
    input: Input,
    stream_index: usize,
    time_base: Rational,
    frame_tolerance: f64,
    decoder: decoder::Video,
    scaler: ScalingContext,
}

impl FfmpegSource {
    /// Create a source for the file at `path`.
    ///
    /// Nothing is read until the sampler loads metadata.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            decoding: None,
            current: None,
        }
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decoding(&mut self) -> Result<&mut Decoding, StillpickError> {
        self.decoding
            .as_mut()
            .ok_or_else(|| StillpickError::SeekFailed("metadata has not been loaded".to_string()))
    }
}

/// Open the container and pick its best video stream. Blocks on file I/O.
fn open_input(path: &Path) -> Result<OpenedInput, StillpickError> {
    let load_error = |reason: String| StillpickError::MetadataLoad { reason };

    ffmpeg_next::init()
        .map_err(|error| load_error(format!("FFmpeg initialisation failed: {error}")))?;
    let input = ffmpeg_next::format::input(&path)
        .map_err(|error| load_error(format!("{}: {error}", path.display())))?;

    let (stream_index, time_base, frame_tolerance) = {
        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| load_error(format!("{}: no video stream", path.display())))?;

        let frame_rate = stream.avg_frame_rate();
        let frame_tolerance = if frame_rate.numerator() > 0 && frame_rate.denominator() > 0 {
            0.5 * f64::from(frame_rate.denominator()) / f64::from(frame_rate.numerator())
        } else {
            DEFAULT_FRAME_TOLERANCE
        };
        (stream.index(), stream.time_base(), frame_tolerance)
    };

    // Container durations are in AV_TIME_BASE (microsecond) units.
    let duration_microseconds = input.duration();
    let duration_seconds =
        (duration_microseconds > 0).then(|| duration_microseconds as f64 / 1_000_000.0);

    Ok(OpenedInput {
        input,
        stream_index,
        time_base,
        frame_tolerance,
        duration_seconds,
    })
}

impl Decoding {
    fn new(opened: OpenedInput) -> Result<Self, StillpickError> {
        let parameters = opened
            .input
            .stream(opened.stream_index)
            .map(|stream| stream.parameters())
            .ok_or_else(|| StillpickError::MetadataLoad {
                reason: "video stream disappeared after opening".to_string(),
            })?;
        let decoder = CodecContext::from_parameters(parameters)?.decoder().video()?;

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ScalingFlags::BILINEAR,
        )?;

        Ok(Self {
            input: opened.input,
            stream_index: opened.stream_index,
            time_base: opened.time_base,
            frame_tolerance: opened.frame_tolerance,
            decoder,
            scaler,
        })
    }

    fn convert(&mut self, decoded: &VideoFrame) -> Result<VideoFrame, StillpickError> {
        let mut picture = VideoFrame::empty();
        self.scaler.run(decoded, &mut picture)?;
        Ok(picture)
    }
}

impl DecodeSource for FfmpegSource {
    async fn load_metadata(&mut self) -> Result<SourceMetadata, StillpickError> {
        log::debug!("Opening video: {}", self.path.display());

        let path = self.path.clone();
        let opened = tokio::task::spawn_blocking(move || open_input(&path))
            .await
            .map_err(|error| StillpickError::MetadataLoad {
                reason: format!("opening task failed: {error}"),
            })??;
        let duration_seconds = opened.duration_seconds;

        let decoding = Decoding::new(opened)?;
        let metadata = SourceMetadata {
            duration_seconds,
            width: decoding.decoder.width(),
            height: decoding.decoder.height(),
        };
        self.decoding = Some(decoding);
        Ok(metadata)
    }

    async fn seek(&mut self, timestamp: Duration) -> Result<(), StillpickError> {
        self.current = None;
        let path = self.path.clone();
        let decoding = self.decoding()?;

        let position = timestamp.as_micros() as i64;
        decoding
            .input
            .seek(position, ..position)
            .map_err(|error| StillpickError::SeekFailed(error.to_string()))?;
        decoding.decoder.flush();

        let target = timestamp.as_secs_f64();
        let mut decoded = VideoFrame::empty();
        let mut reached = None;

        loop {
            let Some((stream, packet)) = decoding.input.packets().next() else {
                break;
            };
            if stream.index() != decoding.stream_index {
                continue;
            }
            if let Err(error) = decoding.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {error}");
                continue;
            }

            while decoding.decoder.receive_frame(&mut decoded).is_ok() {
                let seconds = decoded
                    .pts()
                    .map_or(target, |pts| pts_to_seconds(pts, decoding.time_base));
                if seconds + decoding.frame_tolerance >= target {
                    reached = Some(decoding.convert(&decoded)?);
                    break;
                }
            }
            if reached.is_some() {
                break;
            }

            tokio::task::yield_now().await;
        }

        if reached.is_none() {
            // End of stream: settle for the last frame the decoder still holds.
            decoding.decoder.send_eof()?;
            while decoding.decoder.receive_frame(&mut decoded).is_ok() {
                reached = Some(decoding.convert(&decoded)?);
            }
        }

        match reached {
            Some(picture) => {
                self.current = Some(picture);
                Ok(())
            }
            None => Err(StillpickError::DecodeError(format!(
                "no frame at or after {target:.3}s in {}",
                path.display()
            ))),
        }
    }

    fn has_current_data(&self) -> bool {
        self.current.is_some()
    }

    fn read_picture(&mut self, target: &mut RasterTarget) -> Result<(), StillpickError> {
        let picture = self
            .current
            .as_ref()
            .ok_or_else(|| StillpickError::DecodeError("no picture decoded".to_string()))?;

        if picture.width() != target.width() || picture.height() != target.height() {
            return Err(StillpickError::DecodeError(format!(
                "picture is {}x{}, raster target is {}x{}",
                picture.width(),
                picture.height(),
                target.width(),
                target.height()
            )));
        }

        target.fill_from_rows(picture.data(0), picture.stride(0))
    }

    fn close(&mut self) {
        self.current = None;
        self.decoding = None;
    }
}

fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator())
}

/// Verbosity of FFmpeg's own console output, most quiet first.
///
/// Independent of the `log` facade used by the rest of the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    Quiet,
    Panic,
    Fatal,
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
    Trace,
}

impl From<FfmpegLogLevel> for Level {
    fn from(level: FfmpegLogLevel) -> Self {
        match level {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }
}

impl From<Level> for FfmpegLogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Quiet => FfmpegLogLevel::Quiet,
            Level::Panic => FfmpegLogLevel::Panic,
            Level::Fatal => FfmpegLogLevel::Fatal,
            Level::Error => FfmpegLogLevel::Error,
            Level::Warning => FfmpegLogLevel::Warning,
            Level::Info => FfmpegLogLevel::Info,
            Level::Verbose => FfmpegLogLevel::Verbose,
            Level::Debug => FfmpegLogLevel::Debug,
            Level::Trace => FfmpegLogLevel::Trace,
        }
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    /// Parse a level name as accepted by `--log-level`, e.g. `warning`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "panic" => Ok(FfmpegLogLevel::Panic),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "verbose" => Ok(FfmpegLogLevel::Verbose),
            "debug" => Ok(FfmpegLogLevel::Debug),
            "trace" => Ok(FfmpegLogLevel::Trace),
            other => Err(format!("unknown FFmpeg log level: {other}")),
        }
    }
}

/// Set FFmpeg's console verbosity.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.into());
}

/// Current FFmpeg console verbosity, if FFmpeg reports a known level.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level().ok().map(FfmpegLogLevel::from)
}
