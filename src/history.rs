//! Time-windowed telemetry history
//!
//! [`HistoryBuffer`] keeps the most recent samples of one telemetry stream.
//! Samples are appended at the back and evicted from the front once they are
//! older than the configured window. Eviction relies on the caller supplying
//! monotonically non-decreasing timestamps: after a simulation-time reset the
//! caller must [`clear`](HistoryBuffer::clear) the buffer. A regression is
//! logged but does not alter the buffer.
//!
//! # Example
//! ```
//! use attitude_rig::{DynamicsSample, HistoryBuffer};
//!
//! let mut buffer = HistoryBuffer::new(1.0, 0.1);
//! let sample = |t: f64| DynamicsSample { timestamp: t, input: 1.0, output: 0.5 };
//!
//! assert!(buffer.try_push(sample(0.0), 0.0));
//! assert!(!buffer.try_push(sample(0.05), 0.05)); // too soon
//! assert!(buffer.try_push(sample(0.1), 0.1));
//!
//! buffer.prune(1.05);
//! assert_eq!(buffer.len(), 1); // the t = 0.0 sample aged out
//! ```

use std::collections::VecDeque;
use std::collections::vec_deque::Iter;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::state::{ROTOR_COUNT, StateRecord};
use crate::types::{EulerAngles, HistorySettings};

/// A sample that carries its own simulation timestamp in seconds
pub trait Timestamped {
    fn timestamp(&self) -> f64;
}

/// Rate-limited, age-windowed sample store
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    samples: VecDeque<T>,
    window_seconds: f64,
    sample_interval: f64,
    last_sample_time: f64,
}

impl<T: Timestamped> HistoryBuffer<T> {
    pub fn new(window_seconds: f64, sample_interval: f64) -> Self {
        Self {
            samples: VecDeque::new(),
            window_seconds,
            sample_interval,
            last_sample_time: f64::NEG_INFINITY,
        }
    }

    pub fn with_settings(settings: HistorySettings) -> Self {
        Self::new(settings.window_seconds, settings.sample_interval)
    }

    /// Insert `sample` only if at least `sample_interval` has passed since the
    /// last accepted sample. Returns whether the sample was stored.
    pub fn try_push(&mut self, sample: T, now: f64) -> bool {
        if now - self.last_sample_time < self.sample_interval {
            if now < self.last_sample_time {
                tracing::warn!(
                    now,
                    last = self.last_sample_time,
                    "history timestamp regressed; buffer needs an explicit clear"
                );
            }
            return false;
        }
        self.push(sample, now);
        true
    }

    /// Insert `sample` unconditionally, bypassing the rate limit.
    pub fn push(&mut self, sample: T, now: f64) {
        self.samples.push_back(sample);
        self.last_sample_time = now;
        self.prune(now);
    }

    /// Evict samples from the front while they are older than the window.
    pub fn prune(&mut self, now: f64) {
        while let Some(front) = self.samples.front() {
            if now - front.timestamp() > self.window_seconds {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Drop every sample and re-arm the rate limiter.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.last_sample_time = f64::NEG_INFINITY;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples from oldest to newest
    pub fn iter(&self) -> Iter<'_, T> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }

    pub fn window_seconds(&self) -> f64 {
        self.window_seconds
    }

    /// Change the retention window. Takes effect on the next prune.
    pub fn set_window_seconds(&mut self, window_seconds: f64) {
        self.window_seconds = window_seconds;
    }

    pub fn sample_interval(&self) -> f64 {
        self.sample_interval
    }

    pub fn last_sample_time(&self) -> f64 {
        self.last_sample_time
    }
}

impl<'a, T> IntoIterator for &'a HistoryBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// True and estimated attitude at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttitudeSample {
    pub timestamp: f64,
    pub truth: EulerAngles,
    pub estimate: EulerAngles,
    pub rate_deg_s: Vector3<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub timestamp: f64,
    pub gyro_rad_s: Vector3<f64>,
    pub accel_mps2: Vector3<f64>,
}

/// Telemetry of a single rotor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotorSample {
    pub timestamp: f64,
    pub rpm: f64,
    pub thrust: f64,
    pub torque: f64,
    pub power: f64,
    pub bus_voltage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    pub timestamp: f64,
    pub total_power: f64,
    pub bus_current: f64,
    pub energy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicsSample {
    pub timestamp: f64,
    pub input: f64,
    pub output: f64,
}

macro_rules! impl_timestamped {
    ($($sample:ty),* $(,)?) => {
        $(
            impl Timestamped for $sample {
                fn timestamp(&self) -> f64 {
                    self.timestamp
                }
            }
        )*
    };
}

impl_timestamped!(
    AttitudeSample,
    SensorSample,
    RotorSample,
    PowerSample,
    DynamicsSample
);

/// One history buffer per telemetry stream
///
/// Sampling is driven by the host after each tick; the pipeline itself never
/// touches history.
#[derive(Debug, Clone)]
pub struct TelemetryHistory {
    pub attitude: HistoryBuffer<AttitudeSample>,
    pub sensor: HistoryBuffer<SensorSample>,
    pub rotors: [HistoryBuffer<RotorSample>; ROTOR_COUNT],
    pub power: HistoryBuffer<PowerSample>,
    pub dynamics: HistoryBuffer<DynamicsSample>,
}

impl TelemetryHistory {
    pub fn new(settings: HistorySettings) -> Self {
        Self {
            attitude: HistoryBuffer::with_settings(settings),
            sensor: HistoryBuffer::with_settings(settings),
            rotors: core::array::from_fn(|_| HistoryBuffer::with_settings(settings)),
            power: HistoryBuffer::with_settings(settings),
            dynamics: HistoryBuffer::with_settings(settings),
        }
    }

    /// Offer the current state to every stream at `state.timing.elapsed`.
    pub fn sample(&mut self, state: &StateRecord) {
        let now = state.timing.elapsed;

        self.attitude.try_push(
            AttitudeSample {
                timestamp: now,
                truth: state.attitude.euler,
                estimate: state.estimator.euler,
                rate_deg_s: state.attitude.angular_rate_deg_s,
            },
            now,
        );
        self.sensor.try_push(
            SensorSample {
                timestamp: now,
                gyro_rad_s: state.sensor.gyro_rad_s,
                accel_mps2: state.sensor.accel_mps2,
            },
            now,
        );
        for (index, buffer) in self.rotors.iter_mut().enumerate() {
            buffer.try_push(
                RotorSample {
                    timestamp: now,
                    rpm: state.rotor.rpm[index],
                    thrust: state.rotor.thrust_newton[index],
                    torque: state.rotor.torque_newton_metre[index],
                    power: state.rotor.power_watt[index],
                    bus_voltage: state.power.bus_voltage,
                },
                now,
            );
        }
        self.power.try_push(
            PowerSample {
                timestamp: now,
                total_power: state.rotor.total_power_watt,
                bus_current: state.power.bus_current,
                energy: state.power.energy_joule,
            },
            now,
        );
        self.dynamics.try_push(
            DynamicsSample {
                timestamp: now,
                input: state.dynamics_state.input,
                output: state.dynamics_state.output,
            },
            now,
        );
    }

    pub fn set_window_seconds(&mut self, window_seconds: f64) {
        self.attitude.set_window_seconds(window_seconds);
        self.sensor.set_window_seconds(window_seconds);
        for buffer in &mut self.rotors {
            buffer.set_window_seconds(window_seconds);
        }
        self.power.set_window_seconds(window_seconds);
        self.dynamics.set_window_seconds(window_seconds);
    }

    pub fn clear(&mut self) {
        self.attitude.clear();
        self.sensor.clear();
        for buffer in &mut self.rotors {
            buffer.clear();
        }
        self.power.clear();
        self.dynamics.clear();
    }
}

impl Default for TelemetryHistory {
    fn default() -> Self {
        Self::new(HistorySettings::default())
    }
}
