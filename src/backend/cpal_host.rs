//! Real output devices through cpal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{HostId, SampleFormat, SampleRate, SupportedStreamConfigRange};

use crate::backend::{Backend, RenderCallback, StreamConfig, StreamHandle};
use crate::device::{Api, Device, STANDARD_SAMPLE_RATES};
use crate::error::{Error, Result};

/// Enough room for typical driver buffers without reallocating.
const SCRATCH_SAMPLES: usize = 8192;

#[derive(Clone, Debug)]
struct Entry {
    host: HostId,
    name: String,
}

/// Output devices of every cpal host available on this platform.
///
/// cpal streams are not `Send`, so each stream is built on and owned by its
/// own thread; [`StreamHandle`] parks that thread until the stream is closed.
#[derive(Default)]
pub struct CpalBackend {
    entries: Vec<Entry>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn supported_rates(ranges: &[SupportedStreamConfigRange]) -> Vec<u32> {
    STANDARD_SAMPLE_RATES
        .iter()
        .copied()
        .filter(|&sr| {
            ranges
                .iter()
                .any(|r| r.min_sample_rate().0 <= sr && sr <= r.max_sample_rate().0)
        })
        .collect()
}

impl Backend for CpalBackend {
    fn enumerate(&mut self) -> Vec<Device> {
        self.entries.clear();
        let mut devices = Vec::new();
        let default_host = cpal::default_host().id();

        for host_id in cpal::available_hosts() {
            let Ok(host) = cpal::host_from_id(host_id) else {
                continue;
            };
            let api = Api::from_host_name(host_id.name());
            let host_default = host.default_output_device().and_then(|d| d.name().ok());
            let Ok(outputs) = host.output_devices() else {
                tracing::warn!(host = host_id.name(), "could not list output devices");
                continue;
            };

            for device in outputs {
                let Ok(name) = device.name() else { continue };
                let Ok(config) = device.default_output_config() else { continue };
                let ranges: Vec<SupportedStreamConfigRange> = device
                    .supported_output_configs()
                    .map(|configs| configs.collect())
                    .unwrap_or_default();
                let max_channels = ranges
                    .iter()
                    .map(|r| r.channels() as usize)
                    .max()
                    .unwrap_or(config.channels() as usize);
                let is_api_default = host_default.as_deref() == Some(name.as_str());

                devices.push(Device {
                    index: devices.len(),
                    name: name.clone(),
                    is_default: is_api_default && host_id == default_host,
                    api,
                    api_name: host_id.name().to_owned(),
                    is_api_default,
                    max_channels,
                    sample_rates: supported_rates(&ranges),
                    default_sample_rate: config.sample_rate().0,
                });
                self.entries.push(Entry {
                    host: host_id,
                    name,
                });
            }
        }
        devices
    }

    fn open_stream(
        &mut self,
        device: &Device,
        config: StreamConfig,
        render: RenderCallback,
    ) -> Result<StreamHandle> {
        let entry = self.entries.get(device.index).cloned().ok_or(Error::InvalidDevice)?;
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);

        // Spawn stream on dedicated thread
        let thread = std::thread::Builder::new()
            .name("tactus-cpal-output".into())
            .spawn(move || {
                let stream = match build_stream(&entry, config, render) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(Error::Backend(e.to_string())));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                // stream lives as long as this loop
                while flag.load(Ordering::Acquire) {
                    std::thread::park();
                }
                drop(stream);
            })
            .map_err(|e| Error::Backend(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(StreamHandle::threaded(running, thread)),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(Error::Backend("audio thread exited before the stream started".into()))
            }
        }
    }
}

/// Feeds a device that may have more channels than the session renders.
struct Adapter {
    render: RenderCallback,
    scratch: Vec<f32>,
    channels: usize,
    device_channels: usize,
}

impl Adapter {
    fn fill<T: Copy>(&mut self, data: &mut [T], convert: impl Fn(f32) -> T) {
        let frames = data.len() / self.device_channels;
        // only reallocates if the driver hands over an unusually large buffer
        self.scratch.resize(frames * self.channels, 0.0);
        (self.render)(&mut self.scratch);
        for (frame, src) in data
            .chunks_exact_mut(self.device_channels)
            .zip(self.scratch.chunks_exact(self.channels))
        {
            for (i, out) in frame.iter_mut().enumerate() {
                *out = convert(src.get(i).copied().unwrap_or(0.0));
            }
        }
    }
}

fn build_stream(entry: &Entry, config: StreamConfig, render: RenderCallback) -> Result<cpal::Stream> {
    let backend_err = |e: &dyn std::fmt::Display| Error::Backend(e.to_string());

    let host = cpal::host_from_id(entry.host).map_err(|e| backend_err(&e))?;
    let device = host
        .output_devices()
        .map_err(|e| backend_err(&e))?
        .find(|d| d.name().map(|n| n == entry.name).unwrap_or(false))
        .ok_or(Error::InvalidDevice)?;

    let rate = config.sample_rate;
    let range = device
        .supported_output_configs()
        .map_err(|e| backend_err(&e))?
        .filter(|r| r.channels() as usize >= config.channels)
        .filter(|r| r.min_sample_rate().0 <= rate && rate <= r.max_sample_rate().0)
        .min_by_key(|r| (r.channels(), r.sample_format() != SampleFormat::F32))
        .ok_or(Error::InvalidSampleRate(rate))?;

    let supported = range.with_sample_rate(SampleRate(rate));
    let sample_format = supported.sample_format();
    let stream_config = supported.config();
    let mut adapter = Adapter {
        render,
        scratch: Vec::with_capacity(SCRATCH_SAMPLES * config.channels),
        channels: config.channels,
        device_channels: stream_config.channels as usize,
    };
    let on_error = |err: cpal::StreamError| tracing::error!("cpal stream error: {:?}", err);

    let stream = match sample_format {
        SampleFormat::F32 => device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _| adapter.fill(data, |s| s),
            on_error,
            None,
        ),
        SampleFormat::I16 => device.build_output_stream(
            &stream_config,
            move |data: &mut [i16], _| {
                adapter.fill(data, |s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            },
            on_error,
            None,
        ),
        SampleFormat::U16 => device.build_output_stream(
            &stream_config,
            move |data: &mut [u16], _| {
                adapter.fill(data, |s| ((s.clamp(-1.0, 1.0) + 1.0) * 0.5 * u16::MAX as f32) as u16)
            },
            on_error,
            None,
        ),
        other => {
            return Err(Error::Backend(format!("unsupported sample format: {other:?}")));
        }
    };
    stream.map_err(|e| backend_err(&e))
}
