#[cfg(feature = "capture")]
pub mod capture;
pub mod clip;
pub mod features;
pub mod source;
pub mod spectrum;

#[cfg(feature = "capture")]
pub use capture::{
    calculate_ring_buffer_capacity, get_device, list_input_devices, select_input_config,
    open_capture_source, AudioCapture, AudioDevice, CaptureSource,
};
pub use clip::{
    analyze_clip, decode_clip, decode_wav, read_wav_file, ClipError, ClipSummary,
    ASSUMED_SAMPLE_RATE,
};
pub use features::{AudioFeatures, MAX_MAGNITUDE};
pub use source::{shared, FixedSource, SharedSource, SpectrumSource, WavSource};
pub use spectrum::{AnalyserConfig, SpectrumAnalyser};
