use foundation::time::Time;

/// Default cap on a single frame step (seconds).
pub const DEFAULT_DT_CAP_S: f64 = 0.05;

/// Metadata for one host-driven frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Clamped step since the previous frame (seconds).
    pub dt_s: f64,
    /// Host timestamp the frame was issued at.
    pub time: Time,
}

/// Turns host timestamps into clamped frame steps.
///
/// `dt` is always measured from the previous timestamp, never assumed
/// constant, and clamped to `[0, dt_cap_s]` so a backgrounded tab or paused
/// host does not produce a jump. The first frame has `dt = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    dt_cap_s: f64,
    last: Option<Time>,
    next_index: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_DT_CAP_S)
    }
}

impl FrameClock {
    pub fn new(dt_cap_s: f64) -> Self {
        let dt_cap_s = if dt_cap_s.is_finite() {
            dt_cap_s.max(0.0)
        } else {
            DEFAULT_DT_CAP_S
        };
        Self {
            dt_cap_s,
            last: None,
            next_index: 0,
        }
    }

    pub fn dt_cap_s(&self) -> f64 {
        self.dt_cap_s
    }

    pub fn advance(&mut self, now: Time) -> Frame {
        let dt_s = match self.last {
            Some(last) if now.0.is_finite() => now.since(last).clamp(0.0, self.dt_cap_s),
            _ => 0.0,
        };
        if now.0.is_finite() {
            self.last = Some(now);
        }
        let frame = Frame {
            index: self.next_index,
            dt_s,
            time: now,
        };
        self.next_index += 1;
        frame
    }

    /// Forget the previous timestamp; the next frame starts with `dt = 0`.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::FrameClock;
    use foundation::time::Time;

    #[test]
    fn first_frame_has_zero_dt() {
        let mut clock = FrameClock::new(0.05);
        let f = clock.advance(Time(12.0));
        assert_eq!(f.index, 0);
        assert_eq!(f.dt_s, 0.0);
    }

    #[test]
    fn dt_follows_timestamps() {
        let mut clock = FrameClock::new(0.05);
        clock.advance(Time(1.0));
        let f = clock.advance(Time(1.016));
        assert!((f.dt_s - 0.016).abs() < 1e-12);
        assert_eq!(f.index, 1);
    }

    #[test]
    fn dt_is_capped_after_a_stall() {
        let mut clock = FrameClock::new(0.05);
        clock.advance(Time(1.0));
        assert_eq!(clock.advance(Time(31.0)).dt_s, 0.05);
    }

    #[test]
    fn backwards_clock_yields_zero() {
        let mut clock = FrameClock::new(0.05);
        clock.advance(Time(5.0));
        assert_eq!(clock.advance(Time(4.0)).dt_s, 0.0);
    }

    #[test]
    fn non_finite_timestamp_keeps_previous_reference() {
        let mut clock = FrameClock::new(0.05);
        clock.advance(Time(2.0));
        let stalled = clock.advance(Time(f64::NAN));
        assert_eq!(stalled.dt_s, 0.0);
        assert!(stalled.time.0.is_nan());
        let f = clock.advance(Time(2.02));
        assert_eq!(f.time, Time(2.02));
        assert!((f.dt_s - 0.02).abs() < 1e-12);
    }

    #[test]
    fn reset_restarts_from_zero_dt() {
        let mut clock = FrameClock::new(1.0);
        clock.advance(Time(1.0));
        clock.reset();
        assert_eq!(clock.advance(Time(1.5)).dt_s, 0.0);
    }
}
