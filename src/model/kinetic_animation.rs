use std::time::Instant;

/// Monotonic-clock capability injected into animation drivers, so decay
/// logic stays deterministic under synthetic time sequences in tests.
pub trait AnimationClock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> f64;
}

/// Wall clock backed by `std::time::Instant`.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationClock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// A gesture velocity sample is stale once it is older than this.
const MAX_START_DELAY_MS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PositionSample {
    position: f64,
    time_ms: f64,
}

fn speed_px_per_ms(newer: PositionSample, older: PositionSample, max_speed: f64) -> f64 {
    let speed = (newer.position - older.position) / (newer.time_ms - older.time_ms);
    speed.signum() * speed.abs().min(max_speed)
}

/// Exponential-decay momentum model driving post-drag scrolling.
///
/// Seeded from up to the last 4 recorded (position, time) samples; the start
/// velocity is a distance-weighted average across up to 3 consecutive
/// same-direction segments. Position follows
/// `pos0 + v * (damping^t - 1) / ln(damping)` until the remaining distance
/// falls below the minimum-move epsilon.
#[derive(Debug, Clone)]
pub struct KineticAnimation {
    min_speed: f64,
    max_speed: f64,
    damping: f64,
    min_move: f64,

    samples: [Option<PositionSample>; 4],
    start: Option<PositionSample>,
    speed_px_per_ms: f64,
    duration_ms: f64,
    terminated: bool,
}

impl KineticAnimation {
    #[must_use]
    pub fn new(min_speed: f64, max_speed: f64, damping: f64, min_move: f64) -> Self {
        Self {
            min_speed,
            max_speed,
            damping,
            min_move,
            samples: [None; 4],
            start: None,
            speed_px_per_ms: 0.0,
            duration_ms: 0.0,
            terminated: false,
        }
    }

    /// Records one drag sample. Samples closer than the minimum move to the
    /// latest one are dropped; a sample at the same instant overwrites it.
    pub fn add_position(&mut self, position: f64, time_ms: f64) {
        if let Some(latest) = self.samples[0] {
            if latest.time_ms == time_ms {
                self.samples[0] = Some(PositionSample { position, time_ms });
                return;
            }
            if (latest.position - position).abs() < self.min_move {
                return;
            }
        }
        self.samples.rotate_right(1);
        self.samples[0] = Some(PositionSample { position, time_ms });
    }

    /// Seeds the decay from the recorded samples, rejecting the gesture when
    /// the speed is too low or the latest sample is too old.
    pub fn start(&mut self, position: f64, time_ms: f64) {
        let (Some(first), Some(second)) = (self.samples[0], self.samples[1]) else {
            return;
        };
        if time_ms - first.time_ms > MAX_START_DELAY_MS {
            return;
        }

        let speed1 = speed_px_per_ms(first, second, self.max_speed);
        let distance1 = first.position - second.position;
        let mut speeds = vec![speed1];
        let mut distances = vec![distance1];
        let mut total_distance = distance1;

        if let Some(third) = self.samples[2] {
            let speed2 = speed_px_per_ms(second, third, self.max_speed);
            if speed2.signum() == speed1.signum() {
                let distance2 = second.position - third.position;
                speeds.push(speed2);
                distances.push(distance2);
                total_distance += distance2;

                if let Some(fourth) = self.samples[3] {
                    let speed3 = speed_px_per_ms(third, fourth, self.max_speed);
                    if speed3.signum() == speed1.signum() {
                        let distance3 = third.position - fourth.position;
                        speeds.push(speed3);
                        distances.push(distance3);
                        total_distance += distance3;
                    }
                }
            }
        }

        let mut speed = 0.0;
        for (segment_speed, segment_distance) in speeds.iter().zip(&distances) {
            speed += segment_distance / total_distance * segment_speed;
        }
        if speed.abs() < self.min_speed {
            return;
        }

        self.start = Some(PositionSample {
            position,
            time_ms,
        });
        self.speed_px_per_ms = speed;
        self.terminated = false;
        // Solve `|v| * damping^t / |ln damping| = min_move` for the stop time.
        let ln_damping = self.damping.ln();
        self.duration_ms =
            (self.min_move * ln_damping.abs() / speed.abs()).ln() / ln_damping;
    }

    /// Position along the decay curve at `time_ms`.
    #[must_use]
    pub fn position(&self, time_ms: f64) -> f64 {
        let Some(start) = self.start else {
            return 0.0;
        };
        let elapsed = self.progress_duration(time_ms);
        start.position
            + self.speed_px_per_ms * (self.damping.powf(elapsed) - 1.0) / self.damping.ln()
    }

    /// True once the decay has run its course, was never seeded, or was
    /// explicitly terminated. Checked at the start of every animation step so
    /// a new gesture can cleanly abandon an animation in flight.
    #[must_use]
    pub fn finished(&self, time_ms: f64) -> bool {
        if self.terminated {
            return true;
        }
        let Some(_) = self.start else {
            return true;
        };
        self.progress_duration(time_ms) >= self.duration_ms
    }

    /// Abandons the animation; subsequent `finished` calls return true.
    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    #[must_use]
    pub fn started(&self) -> bool {
        self.start.is_some()
    }

    fn progress_duration(&self, time_ms: f64) -> f64 {
        let Some(start) = self.start else {
            return self.duration_ms;
        };
        (time_ms - start.time_ms).min(self.duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{AnimationClock, KineticAnimation};

    fn default_animation() -> KineticAnimation {
        // Tuning mirrors interactive scroll: speeds in px/ms.
        KineticAnimation::new(0.2, 7.0, 0.997, 15.0)
    }

    fn seeded(positions: &[(f64, f64)]) -> KineticAnimation {
        let mut animation = default_animation();
        for &(position, time_ms) in positions {
            animation.add_position(position, time_ms);
        }
        animation
    }

    #[test]
    fn slow_gesture_is_rejected() {
        let mut animation = seeded(&[(0.0, 0.0), (16.0, 160.0), (32.0, 320.0)]);
        animation.start(32.0, 330.0);
        assert!(!animation.started());
    }

    #[test]
    fn stale_release_is_rejected() {
        let mut animation = seeded(&[(0.0, 0.0), (100.0, 16.0), (200.0, 32.0)]);
        animation.start(200.0, 32.0 + 51.0);
        assert!(!animation.started());
    }

    #[test]
    fn decay_position_approaches_terminal_point_and_finishes() {
        let mut animation = seeded(&[(0.0, 0.0), (100.0, 16.0), (200.0, 32.0)]);
        animation.start(200.0, 40.0);
        assert!(animation.started());
        assert!(!animation.finished(41.0));

        let early = animation.position(50.0);
        let later = animation.position(300.0);
        assert!(later > early, "same-direction motion continues");

        // Far past the solved duration the position is pinned at the curve end.
        let settled = animation.position(100_000.0);
        let settled_again = animation.position(200_000.0);
        assert!((settled - settled_again).abs() < 1e-9);
        assert!(animation.finished(100_000.0));
    }

    #[test]
    fn terminate_flag_short_circuits_finished() {
        let mut animation = seeded(&[(0.0, 0.0), (100.0, 16.0), (200.0, 32.0)]);
        animation.start(200.0, 40.0);
        assert!(!animation.finished(41.0));
        animation.terminate();
        assert!(animation.finished(41.0));
    }

    #[test]
    fn opposite_direction_segments_are_excluded_from_seeding() {
        // Newest segment moves right; the older leftward segments must not
        // cancel it out.
        let mut animation = seeded(&[(300.0, 0.0), (100.0, 16.0), (200.0, 32.0)]);
        animation.start(200.0, 40.0);
        assert!(animation.started());
        assert!(animation.position(100.0) > 200.0);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = super::SystemClock::new();
        let first = clock.now_ms();
        let second = clock.now_ms();
        assert!(second >= first);
    }
}
