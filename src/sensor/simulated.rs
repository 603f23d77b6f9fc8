//! Simulated motion sensor for hosts without motion hardware.
//!
//! Each subscription runs a background thread that emits a synthetic walking
//! waveform once per update interval. Unsubscribing closes the stop channel
//! and joins the thread, so no callback fires after `unsubscribe` returns.

use crate::sensor::source::{SampleCallback, SensorError, SensorSource, SubscriptionHandle};
use crate::sensor::types::{RawSample, SensorKind};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::f64::consts::TAU;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Cadence of the synthetic gait, in steps per second.
const STEP_FREQUENCY_HZ: f64 = 1.8;

/// Standard gravity in g units, as mobile accelerometers report it.
const GRAVITY_G: f64 = 1.0;

struct Worker {
    handle: SubscriptionHandle,
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

/// A sensor that fabricates gait-like readings on a background thread.
pub struct SimulatedSensor {
    kind: SensorKind,
    interval: Duration,
    worker: Option<Worker>,
}

impl SimulatedSensor {
    pub fn new(kind: SensorKind) -> Self {
        Self {
            kind,
            interval: Duration::from_millis(100),
            worker: None,
        }
    }

    /// Check if a subscription is currently running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            drop(worker.stop_tx);
            if worker.thread.join().is_err() {
                tracing::warn!(kind = %self.kind, "simulated sensor thread panicked");
            }
        }
    }
}

/// Synthetic sample at `t` seconds into a walk.
fn waveform(kind: SensorKind, t: f64) -> RawSample {
    let phase = TAU * STEP_FREQUENCY_HZ * t;
    match kind {
        SensorKind::Accelerometer => RawSample::new(
            0.15 * (phase / 2.0).sin(),
            -GRAVITY_G + 0.35 * phase.sin(),
            0.20 * (phase + 0.8).cos(),
        ),
        SensorKind::Gyroscope => RawSample::new(
            0.60 * (phase / 2.0 + 0.3).sin(),
            0.25 * phase.cos(),
            0.40 * (phase / 2.0).cos(),
        ),
    }
}

impl SensorSource for SimulatedSensor {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn is_available(&self) -> bool {
        true
    }

    fn set_update_interval(&mut self, interval: Duration) {
        self.interval = interval.max(Duration::from_millis(1));
    }

    fn subscribe(&mut self, callback: SampleCallback) -> Result<SubscriptionHandle, SensorError> {
        if self.worker.is_some() {
            return Err(SensorError::AlreadySubscribed(self.kind));
        }

        // Nothing is ever sent; dropping the sender is the stop signal.
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let kind = self.kind;
        let interval = self.interval;

        let thread = thread::Builder::new()
            .name(format!("sim-{}", kind.as_str()))
            .spawn(move || {
                let started = Instant::now();
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            callback(waveform(kind, started.elapsed().as_secs_f64()));
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| SensorError::StartFailed(e.to_string()))?;

        let handle = SubscriptionHandle::next();
        tracing::debug!(kind = %self.kind, interval_ms = interval.as_millis() as u64, "simulated sensor subscribed");
        self.worker = Some(Worker {
            handle,
            stop_tx,
            thread,
        });
        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        if self.worker.as_ref().map(|w| w.handle) == Some(handle) {
            self.stop_worker();
            tracing::debug!(kind = %self.kind, "simulated sensor unsubscribed");
        }
    }
}

impl Drop for SimulatedSensor {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_emits_until_unsubscribed() {
        let mut sensor = SimulatedSensor::new(SensorKind::Accelerometer);
        sensor.set_update_interval(Duration::from_millis(5));

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let handle = sensor
            .subscribe(Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        assert!(sensor.is_running());

        thread::sleep(Duration::from_millis(60));
        sensor.unsubscribe(handle);
        assert!(!sensor.is_running());

        let after_stop = seen.load(Ordering::SeqCst);
        assert!(after_stop > 0);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(seen.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_accelerometer_waveform_carries_gravity() {
        let sample = waveform(SensorKind::Accelerometer, 0.0);
        assert!(sample.y < -0.5);
    }

    #[test]
    fn test_double_subscribe_rejected() {
        let mut sensor = SimulatedSensor::new(SensorKind::Gyroscope);
        sensor.subscribe(Box::new(|_| {})).unwrap();
        assert!(matches!(
            sensor.subscribe(Box::new(|_| {})),
            Err(SensorError::AlreadySubscribed(SensorKind::Gyroscope))
        ));
    }
}
