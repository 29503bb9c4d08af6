//! cpal microphone input provider.
//!
//! Opens the default (or a named) input device and delivers normalized mono
//! blocks at the requested capture format. The device rarely speaks
//! 22.05 kHz mono natively, so the stream callback downmixes and resamples
//! before forwarding to the engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, StreamConfig};

use mic_capture_core::models::error::CaptureError;
use mic_capture_core::models::format::CaptureFormat;
use mic_capture_core::models::outcome::InputDevice;
use mic_capture_core::processing::conversion;
use mic_capture_core::traits::input_provider::{BlockCallback, InputProvider, InputStream};

/// Liveness poll interval for the thread that owns the `cpal::Stream`.
const STREAM_POLL: Duration = Duration::from_millis(50);

/// Microphone capture via cpal.
///
/// `cpal::Stream` is not `Send`, so the stream lives on a dedicated thread;
/// the handle returned from [`InputProvider::open_stream`] signals that
/// thread to shut the stream down.
pub struct CpalInputProvider {
    device_name: Option<String>,
}

impl CpalInputProvider {
    /// Capture from the system default microphone.
    pub fn default_device() -> Self {
        Self { device_name: None }
    }

    /// Capture from a specific input device by name.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }
}

impl InputProvider for CpalInputProvider {
    fn is_available(&self) -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn open_stream(
        &self,
        format: CaptureFormat,
        callback: BlockCallback,
    ) -> Result<Box<dyn InputStream>, CaptureError> {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let device_name = self.device_name.clone();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let join = thread::Builder::new()
            .name("cpal-input-stream".into())
            .spawn(move || {
                run_stream_thread(device_name, format, callback, thread_running, ready_tx)
            })
            .map_err(|e| CaptureError::Io(format!("failed to spawn stream thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalStreamHandle {
                running,
                join: Some(join),
            })),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => {
                let _ = join.join();
                Err(CaptureError::DeviceUnavailable)
            }
        }
    }

    fn device_info(&self) -> InputDevice {
        InputDevice {
            name: self
                .device_name
                .clone()
                .unwrap_or_else(|| "default microphone".into()),
            is_default: self.device_name.is_none(),
        }
    }
}

/// Handle to the thread owning the live `cpal::Stream`.
struct CpalStreamHandle {
    running: Arc<AtomicBool>,
    join: Option<thread::JoinHandle<()>>,
}

impl InputStream for CpalStreamHandle {
    fn close(&mut self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.join.take() {
            handle
                .join()
                .map_err(|_| CaptureError::Io("stream thread panicked".into()))?;
        }
        Ok(())
    }
}

impl Drop for CpalStreamHandle {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Thread body owning the stream: resolve device, pick a configuration,
/// build and play the stream, report the handshake, then idle until closed.
fn run_stream_thread(
    device_name: Option<String>,
    format: CaptureFormat,
    callback: BlockCallback,
    running: Arc<AtomicBool>,
    ready_tx: mpsc::SyncSender<Result<(), CaptureError>>,
) {
    let device = match resolve_device(device_name.as_deref()) {
        Ok(device) => device,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    let (config, sample_format) = match select_input_config(&device, format.sample_rate) {
        Ok(selected) => selected,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    let channels = config.channels as usize;
    let device_rate = config.sample_rate.0 as f64;
    let target_rate = f64::from(format.sample_rate);

    let stream_result = match sample_format {
        SampleFormat::F32 => {
            let forward = forwarder(channels, device_rate, target_rate, Arc::clone(&callback));
            device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| forward(data),
                log_stream_error,
                None,
            )
        }
        SampleFormat::I16 => {
            let forward = forwarder(channels, device_rate, target_rate, Arc::clone(&callback));
            device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let samples: Vec<f32> =
                        data.iter().map(|&s| f32::from(s) / 32_768.0).collect();
                    forward(&samples);
                },
                log_stream_error,
                None,
            )
        }
        SampleFormat::U16 => {
            let forward = forwarder(channels, device_rate, target_rate, Arc::clone(&callback));
            device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let samples: Vec<f32> = data
                        .iter()
                        .map(|&s| (f32::from(s) - 32_768.0) / 32_768.0)
                        .collect();
                    forward(&samples);
                },
                log_stream_error,
                None,
            )
        }
        other => {
            let _ = ready_tx.send(Err(CaptureError::Io(format!(
                "unsupported sample format: {other:?}"
            ))));
            return;
        }
    };

    let stream = match stream_result {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(map_build_error(e)));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(map_play_error(e)));
        return;
    }

    log::info!(
        "input stream open: {} Hz, {} channel(s), {:?}",
        config.sample_rate.0,
        config.channels,
        sample_format
    );
    let _ = ready_tx.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        thread::sleep(STREAM_POLL);
    }

    drop(stream);
    log::info!("input stream closed");
}

/// Build the per-block delivery path: downmix to mono, resample to the
/// capture rate, forward to the engine callback.
fn forwarder(
    channels: usize,
    device_rate: f64,
    target_rate: f64,
    callback: BlockCallback,
) -> impl Fn(&[f32]) + Send + 'static {
    move |samples: &[f32]| {
        let mono = conversion::downmix_to_mono(samples, channels);
        let block = conversion::resample_linear(&mono, device_rate, target_rate);
        if !block.is_empty() {
            callback(&block);
        }
    }
}

fn log_stream_error(err: cpal::StreamError) {
    log::error!("audio input stream error: {err}");
}

fn resolve_device(name: Option<&str>) -> Result<cpal::Device, CaptureError> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_input_device()
            .ok_or(CaptureError::DeviceUnavailable),
        Some(wanted) => {
            let devices = host
                .input_devices()
                .map_err(|e| CaptureError::Io(e.to_string()))?;
            for device in devices {
                if device.name().map(|n| n == wanted).unwrap_or(false) {
                    return Ok(device);
                }
            }
            Err(CaptureError::DeviceUnavailable)
        }
    }
}

/// Pick a stream configuration for the device, as close to the capture
/// format as it supports. The actual rate/channel gap is bridged in the
/// stream callback.
fn select_input_config(
    device: &cpal::Device,
    target_rate: u32,
) -> Result<(StreamConfig, SampleFormat), CaptureError> {
    let ranges = device
        .supported_input_configs()
        .map_err(|e| CaptureError::Io(e.to_string()))?;

    let candidates: Vec<CandidateConfig> = ranges
        .map(|range| CandidateConfig {
            channels: range.channels(),
            min_rate: range.min_sample_rate().0,
            max_rate: range.max_sample_rate().0,
            format: range.sample_format(),
        })
        .collect();

    let chosen = pick_candidate(&candidates, target_rate)
        .ok_or_else(|| CaptureError::Io("no supported input configuration".into()))?;

    let config = StreamConfig {
        channels: chosen.channels,
        sample_rate: SampleRate(chosen.rate_for(target_rate)),
        buffer_size: BufferSize::Default,
    };
    Ok((config, chosen.format))
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CandidateConfig {
    channels: u16,
    min_rate: u32,
    max_rate: u32,
    format: SampleFormat,
}

impl CandidateConfig {
    fn covers(&self, rate: u32) -> bool {
        self.min_rate <= rate && rate <= self.max_rate
    }

    /// The target rate when the range covers it, else the nearest edge.
    fn rate_for(&self, target: u32) -> u32 {
        target.clamp(self.min_rate, self.max_rate)
    }
}

/// Rank candidate configurations: a range covering the target rate beats
/// one that needs resampling, fewer channels beat more, and i16 (the native
/// bit depth of the sink) beats f32 beats u16.
fn pick_candidate(candidates: &[CandidateConfig], target_rate: u32) -> Option<CandidateConfig> {
    let mut best: Option<CandidateConfig> = None;
    for &candidate in candidates {
        if format_rank(candidate.format).is_none() {
            continue;
        }
        let better = match best {
            None => true,
            Some(current) => {
                if candidate.covers(target_rate) != current.covers(target_rate) {
                    candidate.covers(target_rate)
                } else if candidate.channels != current.channels {
                    candidate.channels < current.channels
                } else {
                    format_rank(candidate.format) < format_rank(current.format)
                }
            }
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

fn format_rank(format: SampleFormat) -> Option<u8> {
    match format {
        SampleFormat::I16 => Some(0),
        SampleFormat::F32 => Some(1),
        SampleFormat::U16 => Some(2),
        _ => None,
    }
}

fn map_build_error(err: cpal::BuildStreamError) -> CaptureError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
        other => CaptureError::Io(other.to_string()),
    }
}

fn map_play_error(err: cpal::PlayStreamError) -> CaptureError {
    match err {
        cpal::PlayStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
        other => CaptureError::Io(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(channels: u16, min_rate: u32, max_rate: u32, format: SampleFormat) -> CandidateConfig {
        CandidateConfig {
            channels,
            min_rate,
            max_rate,
            format,
        }
    }

    #[test]
    fn prefers_range_covering_the_target_rate() {
        let candidates = [
            candidate(1, 44_100, 48_000, SampleFormat::I16),
            candidate(2, 8_000, 48_000, SampleFormat::I16),
        ];
        let chosen = pick_candidate(&candidates, 22_050).unwrap();
        assert_eq!(chosen, candidates[1]);
        assert_eq!(chosen.rate_for(22_050), 22_050);
    }

    #[test]
    fn prefers_mono_when_coverage_ties() {
        let candidates = [
            candidate(2, 8_000, 48_000, SampleFormat::I16),
            candidate(1, 8_000, 48_000, SampleFormat::I16),
        ];
        assert_eq!(pick_candidate(&candidates, 22_050).unwrap().channels, 1);
    }

    #[test]
    fn prefers_i16_over_f32_when_otherwise_equal() {
        let candidates = [
            candidate(1, 8_000, 48_000, SampleFormat::F32),
            candidate(1, 8_000, 48_000, SampleFormat::I16),
        ];
        assert_eq!(
            pick_candidate(&candidates, 22_050).unwrap().format,
            SampleFormat::I16
        );
    }

    #[test]
    fn skips_unsupported_formats() {
        let candidates = [
            candidate(1, 8_000, 48_000, SampleFormat::F64),
            candidate(2, 8_000, 48_000, SampleFormat::F32),
        ];
        assert_eq!(
            pick_candidate(&candidates, 22_050).unwrap().format,
            SampleFormat::F32
        );
    }

    #[test]
    fn no_usable_candidate_yields_none() {
        assert!(pick_candidate(&[], 22_050).is_none());
        let unsupported = [candidate(1, 8_000, 48_000, SampleFormat::F64)];
        assert!(pick_candidate(&unsupported, 22_050).is_none());
    }

    #[test]
    fn rate_clamps_to_range_edges() {
        let fixed = candidate(1, 44_100, 48_000, SampleFormat::I16);
        assert_eq!(fixed.rate_for(22_050), 44_100);

        let low = candidate(1, 8_000, 16_000, SampleFormat::I16);
        assert_eq!(low.rate_for(22_050), 16_000);
    }

    #[test]
    fn device_not_available_maps_to_device_unavailable() {
        assert_eq!(
            map_build_error(cpal::BuildStreamError::DeviceNotAvailable),
            CaptureError::DeviceUnavailable
        );
        assert_eq!(
            map_play_error(cpal::PlayStreamError::DeviceNotAvailable),
            CaptureError::DeviceUnavailable
        );
    }
}
