use attitude_rig::{
    ComplementaryEstimator, HistoryBuffer, Pipeline, PowerSample, RotorModel, SimConfig, Simulation, StateRecord,
};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use nalgebra::Vector3;
use rand::prelude::*;
use rand_pcg::Pcg64;

// Pre-generated sensor data to keep RNG cost out of the measured loop
struct PreGeneratedData {
    samples: Vec<(Vector3<f64>, Vector3<f64>)>,
    index: usize,
}

impl PreGeneratedData {
    fn new(count: usize, seed: u64) -> Self {
        let mut rng = Pcg64::seed_from_u64(seed);
        let samples = (0..count)
            .map(|_| {
                let gyroscope = Vector3::new(
                    rng.random_range(-0.5..0.5),
                    rng.random_range(-0.5..0.5),
                    rng.random_range(-0.5..0.5),
                );
                let accelerometer = Vector3::new(
                    rng.random_range(-0.3..0.3),
                    rng.random_range(-0.3..0.3),
                    -9.80665 + rng.random_range(-0.1..0.1),
                );
                (gyroscope, accelerometer)
            })
            .collect();
        Self { samples, index: 0 }
    }

    fn next(&mut self) -> (Vector3<f64>, Vector3<f64>) {
        let sample = self.samples[self.index];
        self.index = (self.index + 1) % self.samples.len();
        sample
    }
}

/// One full pipeline tick
fn bench_run_tick(c: &mut Criterion) {
    let mut pipeline = Pipeline::new();
    let mut state = StateRecord::default();
    pipeline.initialize(&mut state);
    state.attitude.angular_rate_deg_s = Vector3::new(10.0, -20.0, 90.0);

    c.bench_function("pipeline_run_tick", |b| {
        b.iter(|| pipeline.run_tick(black_box(0.01), &mut state))
    });
}

/// One tick with the rigid-body rotor variant
fn bench_run_tick_physics(c: &mut Criterion) {
    let mut config = SimConfig::default();
    config.rotor.model = RotorModel::Physics;
    let mut pipeline = Pipeline::with_config(&config);
    let mut state = config.initial_state();
    pipeline.initialize(&mut state);

    c.bench_function("pipeline_run_tick_physics", |b| {
        b.iter(|| pipeline.run_tick(black_box(0.01), &mut state))
    });
}

/// Estimator step on varied sensor input
fn bench_estimator_step(c: &mut Criterion) {
    let mut estimator = ComplementaryEstimator::new();
    let mut data = PreGeneratedData::new(1000, 42);

    c.bench_function("estimator_step", |b| {
        b.iter(|| {
            let (gyroscope, accelerometer) = data.next();
            estimator.step(black_box(gyroscope), black_box(accelerometer), black_box(0.01))
        })
    });
}

/// A tick plus history sampling, as the host loop runs it
fn bench_simulation_step(c: &mut Criterion) {
    let mut sim = Simulation::new(SimConfig::default()).unwrap();
    sim.command_rate_deg_s(Vector3::new(0.0, 0.0, 90.0));

    c.bench_function("simulation_step", |b| b.iter(|| sim.step(black_box(0.01))));
}

/// Rate-limited push into a full window
fn bench_history_push(c: &mut Criterion) {
    let mut buffer = HistoryBuffer::new(15.0, 0.0);
    let mut now = 0.0;

    c.bench_function("history_push_and_prune", |b| {
        b.iter(|| {
            now += 0.01;
            buffer.try_push(
                PowerSample {
                    timestamp: now,
                    total_power: 300.0,
                    bus_current: 20.0,
                    energy: now * 300.0,
                },
                black_box(now),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_run_tick,
    bench_run_tick_physics,
    bench_estimator_step,
    bench_simulation_step,
    bench_history_push
);
criterion_main!(benches);
