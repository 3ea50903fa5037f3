//! Live microphone capture feeding the spectrum analyser.
//!
//! The cpal callback pushes mono f32 samples into a lock-free ring buffer;
//! [`CaptureSource`] drains it on every monitoring tick and analyses the newest window.

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use ringbuf::traits::{Consumer as ConsumerTrait, Producer as ProducerTrait, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::source::SpectrumSource;
use super::spectrum::SpectrumAnalyser;

/// Audio device information
#[derive(Debug, Clone)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// List available input devices
pub fn list_input_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_input_device()
        .and_then(|d| d.name().ok())
        .unwrap_or_default();

    let mut devices = Vec::new();
    for device in host.input_devices().context("Failed to enumerate input devices")? {
        if let Ok(name) = device.name() {
            devices.push(AudioDevice {
                id: name.clone(),
                is_default: name == default_name,
                name,
            });
        }
    }

    Ok(devices)
}

/// Get device by ID (name) or return default
pub fn get_device(device_id: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();

    match device_id {
        Some(id) if id != "default" => {
            for device in host.input_devices().context("Failed to enumerate devices")? {
                if device.name().map(|n| n == id).unwrap_or(false) {
                    return Ok(device);
                }
            }
            anyhow::bail!("Device not found: {}", id);
        }
        _ => host
            .default_input_device()
            .context("No default input device available"),
    }
}

/// Selected audio configuration with both stream config and sample format
pub struct SelectedConfig {
    pub config: StreamConfig,
    pub sample_format: SampleFormat,
}

/// Prefer a mono config; otherwise the device default (downmixed in the callback)
pub fn select_input_config(device: &Device) -> Result<SelectedConfig> {
    if let Ok(supported) = device.supported_input_configs() {
        for config_range in supported {
            if config_range.channels() == 1 {
                let supported_config = config_range.with_max_sample_rate();
                debug!(
                    "Selected mono config: {} Hz, format {:?}",
                    supported_config.sample_rate().0,
                    supported_config.sample_format()
                );
                return Ok(SelectedConfig {
                    config: supported_config.clone().into(),
                    sample_format: supported_config.sample_format(),
                });
            }
        }
    }

    let supported_config = device
        .default_input_config()
        .context("No default input config")?;
    Ok(SelectedConfig {
        config: supported_config.clone().into(),
        sample_format: supported_config.sample_format(),
    })
}

/// One second of audio is plenty; the analyser only looks at the newest window.
pub fn calculate_ring_buffer_capacity(device_sample_rate: u32) -> usize {
    device_sample_rate as usize
}

/// Audio capture handle. Not `Send`: keep it on the thread that created it.
pub struct AudioCapture {
    stream: Stream,
    sample_rate: u32,
    overflow_counter: Arc<AtomicU64>,
    is_running: Arc<AtomicBool>,
}

impl AudioCapture {
    pub fn new(
        device: &Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        mut producer: HeapProd<f32>,
    ) -> Result<Self> {
        let channels = (config.channels as usize).max(1);
        let sample_rate = config.sample_rate.0;
        let overflow_counter = Arc::new(AtomicU64::new(0));
        let overflow = overflow_counter.clone();
        let is_running = Arc::new(AtomicBool::new(false));
        let running = is_running.clone();

        info!(
            "Building input stream: {} Hz, {} channels, format {:?}",
            sample_rate, channels, sample_format
        );

        let error_callback = |err| {
            error!("Audio stream error: {}", err);
        };

        let stream = match sample_format {
            SampleFormat::F32 => device.build_input_stream(
                config,
                move |data: &[f32], _| {
                    if running.load(Ordering::Relaxed) {
                        push_mono(data.chunks(channels).map(|c| c[0]), &mut producer, &overflow);
                    }
                },
                error_callback,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                config,
                move |data: &[i16], _| {
                    if running.load(Ordering::Relaxed) {
                        let mono = data.chunks(channels).map(|c| c[0] as f32 / 32768.0);
                        push_mono(mono, &mut producer, &overflow);
                    }
                },
                error_callback,
                None,
            ),
            SampleFormat::U8 => device.build_input_stream(
                config,
                move |data: &[u8], _| {
                    if running.load(Ordering::Relaxed) {
                        let mono = data.chunks(channels).map(|c| (c[0] as f32 - 128.0) / 128.0);
                        push_mono(mono, &mut producer, &overflow);
                    }
                },
                error_callback,
                None,
            ),
            _ => anyhow::bail!("Unsupported sample format: {:?}", sample_format),
        }
        .context("Failed to build input stream")?;

        Ok(Self {
            stream,
            sample_rate,
            overflow_counter,
            is_running,
        })
    }

    pub fn start(&self) -> Result<()> {
        self.is_running.store(true, Ordering::SeqCst);
        self.stream.play().context("Failed to start audio stream")?;
        info!("Audio capture started");
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        self.is_running.store(false, Ordering::SeqCst);
        self.stream.pause().context("Failed to stop audio stream")?;
        info!("Audio capture stopped");
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn overflow_count(&self) -> u64 {
        self.overflow_counter.load(Ordering::Relaxed)
    }
}

fn push_mono(samples: impl Iterator<Item = f32>, producer: &mut HeapProd<f32>, overflow: &AtomicU64) {
    for sample in samples {
        if producer.try_push(sample).is_err() {
            overflow.fetch_add(1, Ordering::Relaxed);
            break;
        }
    }
}

/// Open a device, start capturing and return the stream handle with its spectrum source.
pub fn open_capture_source(
    device_id: Option<&str>,
    analyser: SpectrumAnalyser,
) -> Result<(AudioCapture, CaptureSource)> {
    let device = get_device(device_id)?;
    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("Using audio device: {}", device_name);

    let selected = select_input_config(&device)?;
    let capacity = calculate_ring_buffer_capacity(selected.config.sample_rate.0);
    let (producer, consumer) = HeapRb::<f32>::new(capacity).split();

    let capture = AudioCapture::new(&device, &selected.config, selected.sample_format, producer)?;
    capture.start()?;
    Ok((capture, CaptureSource::new(consumer, analyser)))
}

/// Spectrum source reading the capture ring buffer
pub struct CaptureSource {
    consumer: HeapCons<f32>,
    window: Vec<f32>,
    analyser: SpectrumAnalyser,
}

impl CaptureSource {
    pub fn new(consumer: HeapCons<f32>, analyser: SpectrumAnalyser) -> Self {
        Self {
            consumer,
            window: Vec::with_capacity(analyser.fft_size() * 2),
            analyser,
        }
    }
}

impl SpectrumSource for CaptureSource {
    fn frequency_data(&mut self) -> Vec<u8> {
        let mut drained = false;
        while let Some(sample) = self.consumer.try_pop() {
            self.window.push(sample);
            drained = true;
        }

        if !drained {
            return Vec::new();
        }

        let keep = self.analyser.fft_size();
        if self.window.len() > keep {
            let excess = self.window.len() - keep;
            self.window.drain(..excess);
        }

        self.analyser.analyse(&self.window)
    }

    fn reset(&mut self) {
        let mut stale = 0usize;
        while self.consumer.try_pop().is_some() {
            stale += 1;
        }
        self.window.clear();
        self.analyser.reset();
        debug!("Capture source reset, dropped {} stale samples", stale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::spectrum::AnalyserConfig;

    #[test]
    fn test_calculate_ring_buffer_capacity() {
        assert_eq!(calculate_ring_buffer_capacity(48000), 48000);
        assert_eq!(calculate_ring_buffer_capacity(16000), 16000);
    }

    #[test]
    fn test_capture_source_without_samples_is_empty() {
        let (_producer, consumer) = HeapRb::<f32>::new(1024).split();
        let mut source = CaptureSource::new(consumer, SpectrumAnalyser::new(AnalyserConfig::default()));
        assert!(source.frequency_data().is_empty());
    }

    #[test]
    fn test_capture_source_keeps_newest_window() {
        let (mut producer, consumer) = HeapRb::<f32>::new(4096).split();
        let mut source = CaptureSource::new(consumer, SpectrumAnalyser::new(AnalyserConfig::default()));
        let overflow = AtomicU64::new(0);
        push_mono(std::iter::repeat(0.0).take(1000), &mut producer, &overflow);

        assert_eq!(source.frequency_data().len(), 128);
        assert_eq!(source.window.len(), 256);
        assert_eq!(overflow.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_reset_drops_audio_buffered_while_idle() {
        let (mut producer, consumer) = HeapRb::<f32>::new(512).split();
        let mut source = CaptureSource::new(consumer, SpectrumAnalyser::new(AnalyserConfig::default()));
        let overflow = AtomicU64::new(0);

        // Ring fills up while nobody samples
        push_mono(std::iter::repeat(0.9).take(1000), &mut producer, &overflow);
        assert_eq!(overflow.load(Ordering::Relaxed), 1);

        source.reset();
        assert!(source.window.is_empty());
        assert!(source.frequency_data().is_empty());

        // Fresh audio is accepted again
        push_mono(std::iter::repeat(0.0).take(300), &mut producer, &overflow);
        assert_eq!(source.frequency_data().len(), 128);
        assert_eq!(source.window.len(), 256);
    }

    #[test]
    fn test_list_devices() {
        // Devices depend on the machine; only check this does not panic
        if let Ok(devices) = list_input_devices() {
            println!("Found {} input devices", devices.len());
        }
    }
}
