use tactus::device::{correct_mme_names, remove_digital_devices, tidy, tidy_api_names};
use tactus::{Api, Device};

#[test]
fn mme_names_take_the_longest_match() {
    let devices = correct_mme_names(vec![
        Device::new(0, "Speakers (Realtek High Defini", Api::Mme),
        Device::new(1, "Speakers (Realtek High Definition Audio)", Api::Wasapi),
        Device::new(2, "Headphones", Api::Mme),
    ]);
    assert_eq!(devices[0].name, "Speakers (Realtek High Definition Audio)");
    assert_eq!(devices[2].name, "Headphones");
}

#[test]
fn digital_outputs_are_removed() {
    let devices = remove_digital_devices(vec![
        Device::new(0, "SPDIF Out", Api::Alsa),
        Device::new(1, "Optical (optic)", Api::Alsa),
        Device::new(2, "Line Out", Api::Alsa),
    ]);
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].name, "Line Out");
}

#[test]
fn api_names_lose_vendor_prefix() {
    let mut devices = vec![Device::new(0, "Out", Api::DirectSound)];
    tidy_api_names(&mut devices);
    assert_eq!(devices[0].api_name, "DirectSound");
}

#[test]
fn tidy_keeps_indices_of_surviving_devices() {
    let devices = tidy(vec![
        Device::new(0, "S/PDIF", Api::Wasapi),
        Device::new(1, "Speakers", Api::Wasapi).with_default(true),
    ]);
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].index, 1);
    assert!(devices[0].is_default);
    assert!(devices[0].is_api_default);
    assert_eq!(devices[0].api_name, "WASAPI");
}

#[test]
fn host_names_map_to_apis() {
    assert_eq!(Api::from_host_name("ALSA"), Api::Alsa);
    assert_eq!(Api::from_host_name("CoreAudio"), Api::CoreAudio);
    assert_eq!(Api::from_host_name("Wasapi"), Api::Wasapi);
    assert_eq!(Api::from_host_name("Null"), Api::Unknown);
    assert_eq!(Api::Asio as i32, 3);
}

#[test]
fn sample_rate_support_follows_the_probe_list() {
    let device = Device::new(0, "Out", Api::Jack).with_sample_rates(vec![44100, 96000], 96000);
    assert!(device.supports_sample_rate(96000));
    assert!(!device.supports_sample_rate(48000));
    assert_eq!(device.default_sample_rate, 96000);
}
