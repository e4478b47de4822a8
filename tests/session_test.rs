use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rtrb::RingBuffer;
use tactus::backend::{Stepper, VirtualBackend};
use tactus::signals::{Envelope, Scalar};
use tactus::{Api, Device, Error, OpenOptions, Session, MAX_VOICES};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn manual_session() -> (Session, Stepper) {
    init_logging();
    let (backend, stepper) = VirtualBackend::manual();
    let mut session = Session::with_backend(backend);
    session.open().unwrap();
    (session, stepper)
}

/// Poll `done` for up to two seconds.
fn eventually(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    done()
}

#[test]
fn open_defaults_to_the_whole_default_device() {
    let (session, _stepper) = manual_session();
    assert!(session.is_open());
    assert_eq!(session.channel_count(), 8);
    assert_eq!(session.sample_rate(), 48000);
    assert_eq!(session.current_device().map(|d| d.name.as_str()), Some("Virtual Output"));
    assert_eq!(session.default_device().map(|d| d.api), Some(Api::Virtual));
    assert_eq!(session.available_devices().len(), 1);
}

#[test]
fn invalid_device_leaves_session_closed() {
    init_logging();
    let mut session = Session::with_backend(VirtualBackend::new());
    assert_eq!(session.open_index(99), Err(Error::InvalidDevice));
    assert!(!session.is_open());
    assert_eq!(session.channel_count(), 0);
    assert_eq!(session.open_named("Nope", Api::Virtual), Err(Error::InvalidDevice));
    assert_eq!(session.open_api(Api::Jack), Err(Error::InvalidApi));
    assert_eq!(session.play(0, Scalar::new(1.0)), Err(Error::NotOpen));
    assert_eq!(session.close(), Err(Error::NotOpen));
}

#[test]
fn opening_twice_is_rejected() {
    let (mut session, _stepper) = manual_session();
    assert_eq!(session.open(), Err(Error::AlreadyOpen));
    assert!(session.is_open());
}

#[test]
fn unsupported_formats_are_rejected() {
    init_logging();
    let mut session = Session::with_backend(VirtualBackend::new());
    let err = session.open_with(OpenOptions::new().with_channels(9));
    assert_eq!(err, Err(Error::InvalidChannelCount(9)));
    let err = session.open_with(OpenOptions::new().with_channels(0));
    assert_eq!(err, Err(Error::InvalidChannelCount(0)));
    let err = session.open_with(OpenOptions::new().with_sample_rate(12345));
    assert_eq!(err, Err(Error::InvalidSampleRate(12345)));
    assert!(!session.is_open());
}

#[test]
fn failing_stream_leaves_session_closed() {
    init_logging();
    let mut session = Session::with_backend(VirtualBackend::new().with_failing_streams(true));
    assert!(matches!(session.open(), Err(Error::Backend(_))));
    assert!(!session.is_open());
    assert_eq!(session.sample_rate(), 0);
}

#[test]
fn api_default_device_is_preferred() {
    init_logging();
    let backend = VirtualBackend::new().with_devices(vec![
        Device::new(0, "A", Api::Alsa),
        Device::new(1, "B", Api::Alsa).with_api_default(true),
        Device::new(2, "C", Api::Jack).with_default(true),
    ]);
    let mut session = Session::with_backend(backend);
    assert_eq!(session.default_device().map(|d| d.index), Some(2));

    session.open_api(Api::Alsa).unwrap();
    assert_eq!(session.current_device().map(|d| d.name.as_str()), Some("B"));
    assert_eq!(session.channel_count(), 2);
    session.close().unwrap();

    let device = session.available_devices()[0].clone();
    session.open_device(&device).unwrap();
    assert_eq!(session.current_device(), Some(&device));
}

#[test]
fn channels_are_validated() {
    let (mut session, _stepper) = manual_session();
    assert_eq!(
        session.play(8, Scalar::new(1.0)),
        Err(Error::InvalidChannel { channel: 8, count: 8 })
    );
    assert_eq!(session.set_volume(100, 0.5).map_err(|e| e.code()), Err(-4));
    assert!(!session.is_playing(8));
    assert!(session.get_level(8).is_err());
}

#[test]
fn signals_without_length_have_no_waveform() {
    let (mut session, _stepper) = manual_session();
    assert_eq!(session.play(0, Envelope::new(0.0, 1.0)), Err(Error::NoWaveform));
}

#[test]
fn playback_mixes_into_the_right_channel() {
    let (mut session, stepper) = manual_session();
    session.play(2, Scalar::new(0.5) * Envelope::new(1.0, 1.0)).unwrap();
    let out = stepper.render(16);
    assert_eq!(out.len(), 16 * 8);
    for frame in out.chunks_exact(8) {
        assert_eq!(frame[2], 0.5);
        assert_eq!(frame.iter().filter(|&&s| s != 0.0).count(), 1);
    }
    assert!(session.is_playing(2));
    assert!(!session.is_playing(0));
    assert_eq!(session.get_level(2), Ok(0.5));
    assert_eq!(session.buffers_rendered(), 1);
}

#[test]
fn playback_ends_after_the_signal_length() {
    let (mut session, stepper) = manual_session();
    // 10 ms is 480 frames at 48 kHz
    session.play(0, Envelope::new(0.01, 1.0)).unwrap();
    stepper.render(256);
    assert!(session.is_playing(0));
    stepper.render(256);
    assert!(!session.is_playing(0));

    let out = stepper.render(64);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn overflowing_voices_evict_the_first_slot() {
    let (mut session, stepper) = manual_session();
    for i in 0..=MAX_VOICES {
        session.play(0, Scalar::new(i as f64) * Envelope::new(1.0, 1.0)).unwrap();
    }
    let out = stepper.render(1);
    let expected: usize = (1..=MAX_VOICES).sum();
    assert_eq!(out[0], expected as f32);
}

#[test]
fn pause_resume_and_stop() {
    let (mut session, stepper) = manual_session();
    session.play_all(Envelope::new(1.0, 1.0)).unwrap();
    session.pause(1).unwrap();
    let out = stepper.render(4);
    assert_eq!(out[0], 1.0);
    assert_eq!(out[1], 0.0);
    assert!(session.is_paused(1));
    assert!(!session.is_playing(1));

    session.resume_all().unwrap();
    stepper.render(4);
    assert!(session.is_playing(1));

    session.stop(0).unwrap();
    stepper.render(4);
    assert!(!session.is_playing(0));
    assert!(session.is_playing(1));

    session.stop_all().unwrap();
    session.pause_all().unwrap();
    stepper.render(4);
    assert!((0..8).all(|ch| !session.is_playing(ch) && session.is_paused(ch)));
}

#[test]
fn volume_and_pitch_reach_the_audio_thread() {
    let (mut session, stepper) = manual_session();
    session.set_volume(0, 0.25).unwrap();
    session.set_volume(1, 3.0).unwrap();
    session.set_pitch(2, -1.0).unwrap();
    session.set_pitch_all(1.5).unwrap();
    session.set_volume_all(0.5).unwrap();
    session.set_volume(3, 0.0).unwrap();
    stepper.render(8);
    assert_eq!(session.get_volume(0), Ok(0.5));
    assert_eq!(session.get_volume(3), Ok(0.0));
    assert_eq!(session.get_pitch(2), Ok(1.5));

    session.set_volume(1, 3.0).unwrap();
    session.set_pitch(2, -1.0).unwrap();
    stepper.render(8);
    assert_eq!(session.get_volume(1), Ok(1.0));
    assert_eq!(session.get_pitch(2), Ok(0.0));
}

#[test]
fn pitch_scales_playback_time() {
    let (mut session, stepper) = manual_session();
    session.set_pitch(0, 2.0).unwrap();
    stepper.render(1);
    // 10 ms at double speed ends after about 240 frames
    session.play(0, Envelope::new(0.01, 1.0)).unwrap();
    stepper.render(256);
    assert!(!session.is_playing(0));
}

#[test]
fn queries_see_every_earlier_command() {
    let (mut session, stepper) = manual_session();
    let running = Arc::new(AtomicBool::new(true));
    let audio = {
        let running = running.clone();
        std::thread::spawn(move || {
            while running.load(Ordering::Acquire) {
                stepper.render(64);
                std::thread::sleep(Duration::from_micros(200));
            }
        })
    };

    session.set_pitch(3, 2.0).unwrap();
    session.set_volume(3, 0.75).unwrap();
    assert_eq!(session.query_pitch(3), Ok(2.0));
    assert_eq!(session.query_volume(3), Ok(0.75));
    assert_eq!(session.query_level(3), Ok(0.0));
    assert_eq!(session.query_level(9), Err(Error::InvalidChannel { channel: 9, count: 8 }));

    running.store(false, Ordering::Release);
    audio.join().unwrap();
}

#[test]
fn level_queries_report_the_buffer_before_the_queued_commands() {
    let (mut session, stepper) = manual_session();
    session.play(0, Scalar::new(0.5) * Envelope::new(1.0, 1.0)).unwrap();
    stepper.render(16);
    session.stop(0).unwrap();

    let audio = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(5));
        stepper.render(16);
        stepper
    });
    // the stop is applied first, but the reply is read before mixing
    assert_eq!(session.query_level(0), Ok(0.5));
    let _stepper = audio.join().unwrap();
    assert_eq!(session.get_level(0), Ok(0.0));
}

#[test]
fn nan_volume_mutes_the_channel() {
    let (mut session, stepper) = manual_session();
    session.set_volume(0, f64::NAN).unwrap();
    session.play(0, Envelope::new(1.0, 1.0)).unwrap();
    let ramp = stepper.render(16);
    assert!(ramp.iter().all(|s| s.is_finite()));
    assert!(session.get_level(0).unwrap().is_finite());

    let out = stepper.render(16);
    assert!(out.chunks_exact(8).all(|frame| frame[0] == 0.0));
    assert_eq!(session.get_volume(0), Ok(0.0));
    assert_eq!(session.get_level(0), Ok(0.0));
    assert!(session.is_playing(0));
}

#[test]
fn a_full_queue_is_reported() {
    init_logging();
    let (backend, _stepper) = VirtualBackend::manual();
    let mut session = Session::with_backend(backend);
    session.open_with(OpenOptions::new().with_queue_capacity(4)).unwrap();
    for _ in 0..4 {
        session.set_volume(0, 0.5).unwrap();
    }
    assert_eq!(session.set_volume(0, 0.5), Err(Error::QueueFull));
    assert_eq!(Error::QueueFull.code(), -10);
}

#[test]
fn close_stops_the_stream() {
    let (mut session, stepper) = manual_session();
    assert!(stepper.is_running());
    session.close().unwrap();
    assert!(!stepper.is_running());
    assert!(!session.is_open());
    assert!(stepper.render(16).is_empty());
    assert_eq!(session.close(), Err(Error::NotOpen));

    // reopening works after a close
    session.open().unwrap();
    assert!(stepper.is_running());
}

#[test]
fn dropping_the_session_closes_it() {
    let (session, stepper) = manual_session();
    drop(session);
    assert!(!stepper.is_running());
}

#[test]
fn control_panels_are_not_available_on_virtual_devices() {
    init_logging();
    let mut session = Session::with_backend(VirtualBackend::new());
    assert_eq!(session.open_control_panel(0), Err(Error::ControlPanelFail));
    assert_eq!(session.open_control_panel(3), Err(Error::InvalidDevice));
}

#[test]
fn threaded_virtual_device_plays_in_real_time() {
    init_logging();
    let (producer, mut consumer) = RingBuffer::new(1 << 18);
    let backend = VirtualBackend::new()
        .with_buffer_frames(128)
        .with_speed(10.0)
        .with_capture(producer);
    let mut session = Session::with_backend(backend);
    session
        .open_with(OpenOptions::new().with_channels(2).with_sample_rate(8000))
        .unwrap();

    session.play(1, Scalar::new(0.25) * Envelope::new(0.5, 1.0)).unwrap();
    assert!(eventually(|| session.is_playing(1)));
    assert!(eventually(|| !session.is_playing(1)));
    assert!(session.cpu_load() >= 0.0);

    session.close().unwrap();
    let mut heard = false;
    while let Ok(left) = consumer.pop() {
        let Ok(right) = consumer.pop() else { break };
        assert_eq!(left, 0.0);
        heard |= right == 0.25;
    }
    assert!(heard);
}
