//! Output device snapshots and the clean-up applied to raw enumerations.
//!
//! A [`Device`] is an immutable description taken when a
//! [`Backend`](crate::backend::Backend) enumerates its outputs. Raw
//! enumerations are noisy, so [`tidy`] drops digital pass-through aliases,
//! restores truncated MME names and shortens host API names before a
//! [`Session`](crate::Session) exposes them.
//!
//! ```
//! use tactus::{Api, Device};
//!
//! let devices = tactus::device::tidy(vec![
//!     Device::new(0, "Speakers", Api::Wasapi).with_api_name("Windows WASAPI"),
//!     Device::new(1, "Realtek Digital Output", Api::Wasapi),
//! ]);
//! assert_eq!(devices.len(), 1);
//! assert_eq!(devices[0].api_name, "WASAPI");
//! ```

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rates probed when asking a device which sample rates it supports.
pub const STANDARD_SAMPLE_RATES: [u32; 13] = [
    8000, 9600, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000, 88200, 96000, 192000,
];

/// Name fragments that mark digital pass-through outputs.
const DIGITAL_MARKERS: [&str; 6] = ["SPDIF", "S/PDIF", "Optic", "optic", "digital", "Digital"];

/// Prefixes removed from host API names.
const API_NAME_PREFIXES: [&str; 1] = ["Windows "];

/// Host audio API a device belongs to.
///
/// Discriminants of the first variants match the classic PortAudio host API
/// type ids so numeric hosts can round-trip them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(i32)]
pub enum Api {
    #[default]
    Unknown = 0,
    DirectSound = 1,
    Mme = 2,
    Asio = 3,
    SoundManager = 4,
    CoreAudio = 5,
    Oss = 7,
    Alsa = 8,
    Al = 9,
    BeOs = 10,
    Wdmks = 11,
    Jack = 12,
    Wasapi = 13,
    AudioScienceHpi = 14,
    WebAudio = 100,
    Oboe = 101,
    AAudio = 102,
    Virtual = 200,
}

impl Api {
    /// Map a host name as reported by the platform layer, e.g. `"ALSA"`.
    pub fn from_host_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "directsound" => Api::DirectSound,
            "mme" => Api::Mme,
            "asio" => Api::Asio,
            "coreaudio" => Api::CoreAudio,
            "oss" => Api::Oss,
            "alsa" => Api::Alsa,
            "jack" => Api::Jack,
            "wasapi" => Api::Wasapi,
            "wdm-ks" | "wdmks" => Api::Wdmks,
            "webaudio" | "emscripten" => Api::WebAudio,
            "oboe" => Api::Oboe,
            "aaudio" => Api::AAudio,
            "virtual" => Api::Virtual,
            _ => Api::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Api::Unknown => "Unknown",
            Api::DirectSound => "Windows DirectSound",
            Api::Mme => "MME",
            Api::Asio => "ASIO",
            Api::SoundManager => "SoundManager",
            Api::CoreAudio => "Core Audio",
            Api::Oss => "OSS",
            Api::Alsa => "ALSA",
            Api::Al => "AL",
            Api::BeOs => "BeOS",
            Api::Wdmks => "Windows WDM-KS",
            Api::Jack => "JACK Audio Connection Kit",
            Api::Wasapi => "Windows WASAPI",
            Api::AudioScienceHpi => "AudioScience HPI",
            Api::WebAudio => "Web Audio",
            Api::Oboe => "Oboe",
            Api::AAudio => "AAudio",
            Api::Virtual => "Virtual",
        }
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of one output device.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Device {
    /// Position in the backend's enumeration
    pub index: usize,
    pub name: String,
    /// Default output of the whole system
    pub is_default: bool,
    pub api: Api,
    pub api_name: String,
    /// Default output of its host API
    pub is_api_default: bool,
    pub max_channels: usize,
    pub sample_rates: Vec<u32>,
    pub default_sample_rate: u32,
}

impl Device {
    /// A stereo 48 kHz device; adjust with the `with_*` builders.
    pub fn new(index: usize, name: impl Into<String>, api: Api) -> Self {
        Self {
            index,
            name: name.into(),
            is_default: false,
            api,
            api_name: api.name().to_owned(),
            is_api_default: false,
            max_channels: 2,
            sample_rates: vec![44100, 48000],
            default_sample_rate: 48000,
        }
    }

    pub fn with_api_name(mut self, api_name: impl Into<String>) -> Self {
        self.api_name = api_name.into();
        self
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self.is_api_default |= is_default;
        self
    }

    pub fn with_api_default(mut self, is_api_default: bool) -> Self {
        self.is_api_default = is_api_default;
        self
    }

    pub fn with_max_channels(mut self, max_channels: usize) -> Self {
        self.max_channels = max_channels;
        self
    }

    pub fn with_sample_rates(mut self, sample_rates: impl Into<Vec<u32>>, default: u32) -> Self {
        self.sample_rates = sample_rates.into();
        self.default_sample_rate = default;
        self
    }

    pub fn supports_sample_rate(&self, sample_rate: u32) -> bool {
        self.sample_rates.contains(&sample_rate)
    }

    fn is_digital(&self) -> bool {
        DIGITAL_MARKERS.iter().any(|m| self.name.contains(m))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}, {} ch, {} Hz)",
            self.index, self.name, self.api_name, self.max_channels, self.default_sample_rate
        )
    }
}

/// Apply every enumeration clean-up, in order.
pub fn tidy(devices: Vec<Device>) -> Vec<Device> {
    let mut devices = remove_digital_devices(correct_mme_names(devices));
    tidy_api_names(&mut devices);
    devices
}

/// MME truncates device names to 31 characters. Replace each MME name with
/// the full name another API reports for the same hardware.
pub fn correct_mme_names(mut devices: Vec<Device>) -> Vec<Device> {
    let full_names: Vec<String> = devices
        .iter()
        .filter(|d| d.api != Api::Mme)
        .map(|d| d.name.clone())
        .collect();
    for device in devices.iter_mut().filter(|d| d.api == Api::Mme) {
        if let Some(full) = full_names
            .iter()
            .filter(|full| full.starts_with(&device.name))
            .max_by_key(|full| full.len())
        {
            device.name = full.clone();
        }
    }
    devices
}

/// Drop outputs whose names mark them as digital pass-through.
pub fn remove_digital_devices(mut devices: Vec<Device>) -> Vec<Device> {
    devices.retain(|d| !d.is_digital());
    devices
}

/// Strip vendor prefixes such as `"Windows "` from API names.
pub fn tidy_api_names(devices: &mut [Device]) {
    for device in devices {
        for prefix in API_NAME_PREFIXES {
            if let Some(pos) = device.api_name.find(prefix) {
                device.api_name.replace_range(pos..pos + prefix.len(), "");
            }
        }
    }
}
