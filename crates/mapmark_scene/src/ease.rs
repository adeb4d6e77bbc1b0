use glam::{dvec2, DVec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// The curves available for position animations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EaseType {
    #[default]
    Linear,
    Cubic,
    Quint,
    Sine,
}

fn linear(t: f64) -> f64 {
    t
}
fn cubic(t: f64) -> f64 {
    (-2.0 * t + 3.0) * t * t
}
fn quint(t: f64) -> f64 {
    (6.0 * t * t - 15.0 * t + 10.0) * t * t * t
}
fn sine(t: f64) -> f64 {
    0.5 - 0.5 * (PI * t).cos()
}

impl EaseType {
    /// indexed by the enum discriminant
    const CURVES: [fn(f64) -> f64; 4] = [linear, cubic, quint, sine];

    /// maps `t` in `[0, 1]` to the eased fraction
    pub fn curve(self) -> fn(f64) -> f64 {
        Self::CURVES[self as usize]
    }
    pub fn ease(self, start: f64, end: f64, t: f64) -> f64 {
        start + (end - start) * self.curve()(t)
    }
}

/// A running (or finished) animation between two positions.
///
/// It knows nothing about markers or the map. It only produces the 2d position for the time elapsed so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Ease {
    origin: DVec2,
    destination: DVec2,
    position: DVec2,
    elapsed: f32,
    duration: f32,
    kind: EaseType,
}

impl Ease {
    /// A duration of zero (or less) finishes immediately at `destination`.
    pub fn new(origin: DVec2, destination: DVec2, duration: f32, kind: EaseType) -> Self {
        let finished = duration.is_nan() || duration <= 0.0;
        Self {
            origin,
            destination,
            position: if finished { destination } else { origin },
            elapsed: 0.0,
            duration: if finished { 0.0 } else { duration },
            kind,
        }
    }
    /// advances the animation by `dt` and returns the new position.
    /// once the duration is reached, the position is exactly the destination.
    pub fn update(&mut self, dt: f32) -> DVec2 {
        if self.finished() {
            return self.position;
        }
        self.elapsed += dt;
        self.position = if self.elapsed >= self.duration {
            self.destination
        } else {
            let t = (self.elapsed / self.duration) as f64;
            dvec2(
                self.kind.ease(self.origin.x, self.destination.x, t),
                self.kind.ease(self.origin.y, self.destination.y, t),
            )
        };
        self.position
    }
    pub fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
    pub fn position(&self) -> DVec2 {
        self.position
    }
    pub fn origin(&self) -> DVec2 {
        self.origin
    }
    pub fn destination(&self) -> DVec2 {
        self.destination
    }
    pub fn kind(&self) -> EaseType {
        self.kind
    }
}
