/// Converts frame times in seconds into the integer millisecond deltas that
/// [`TimedEntity::update`](crate::TimedEntity::update) consumes.
///
/// Fractional milliseconds are carried over to the next frame, so a steady
/// 60 Hz loop neither drifts nor loses time to rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackClock {
    /// Multiplier applied to every frame. Negative values play backwards.
    pub time_scale: f32,
    carry_millis: f64,
    elapsed_millis: i64,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PlaybackClock {
    pub fn new(time_scale: f32) -> Self {
        Self {
            time_scale,
            carry_millis: 0.0,
            elapsed_millis: 0,
        }
    }

    pub fn reset(&mut self) {
        self.carry_millis = 0.0;
        self.elapsed_millis = 0;
    }

    /// Advances by `delta_seconds` of wall-clock time and returns the scaled
    /// delta in whole milliseconds.
    pub fn advance(&mut self, delta_seconds: f32) -> i32 {
        let exact = delta_seconds as f64 * 1000.0 * self.time_scale as f64 + self.carry_millis;
        let whole = exact.trunc();
        self.carry_millis = exact - whole;

        let delta = whole.clamp(i32::MIN as f64, i32::MAX as f64) as i32;
        self.elapsed_millis += i64::from(delta);
        delta
    }

    /// Scaled time handed out so far.
    pub fn elapsed_millis(&self) -> i64 {
        self.elapsed_millis
    }
}
