/// Monotonic timestamp in seconds.
///
/// Hosts usually report frame timestamps in milliseconds; use
/// [`Time::from_millis`] at the boundary.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64);

impl Time {
    pub fn from_millis(ms: f64) -> Self {
        Time(ms / 1000.0)
    }

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `earlier`; negative if the clock went backwards.
    pub fn since(self, earlier: Time) -> f64 {
        self.0 - earlier.0
    }
}

#[cfg(test)]
mod tests {
    use super::Time;

    #[test]
    fn millis_are_converted_to_seconds() {
        assert_eq!(Time::from_millis(1500.0), Time(1.5));
        assert_eq!(Time(2.0).since(Time(0.5)), 1.5);
    }
}
