use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tactus::backend::VirtualBackend;
use tactus::signals::{Asr, Envelope, Noise, Sequence, Sine, Square};
use tactus::Session;

const SAMPLE_RATE: f64 = 48000.0;

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("Sine * Asr, 480 samples", |b| {
        let cue = Sine::new(175.0) * Asr::new(0.05, 0.1, 0.05, 1.0);
        b.iter(|| {
            let mut acc = 0.0;
            for i in 0..480 {
                acc += cue.sample(black_box(i as f64 / SAMPLE_RATE));
            }
            acc
        })
    });

    c.bench_function("Sequence of 16 cues, 480 samples", |b| {
        let mut seq = Sequence::new();
        for i in 0..16 {
            let carrier = if i % 2 == 0 { Sine::new(150.0) * 1.0 } else { Square::new(250.0) * 0.5 };
            seq.push(carrier * Envelope::new(0.01, 1.0)).advance(0.002);
        }
        let seq = tactus::Signal::from(seq);
        b.iter(|| {
            let mut acc = 0.0;
            for i in 0..480 {
                acc += seq.sample(black_box(i as f64 / SAMPLE_RATE));
            }
            acc
        })
    });

    c.bench_function("render 8 channels x 4 voices, 256 frames", |b| {
        let (backend, stepper) = VirtualBackend::manual();
        let mut session = Session::with_backend(backend);
        if session.open().is_err() {
            return;
        }
        let cue = Sine::new(175.0) * (Noise::new() * 0.1 + 1.0);
        for _ in 0..4 {
            let _ = session.play_all(cue.clone());
        }
        b.iter(|| stepper.render(black_box(256)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
