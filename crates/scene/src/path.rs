//! Cumulative arc-length tables for polylines.

use foundation::math::{LonLat, Vec2, great_circle_distance_m, meters_per_deg_lon};

/// Lower bound for a path's total length.
pub const PATH_EPSILON: f64 = 1e-9;

/// How segment lengths are measured. One metric per path.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PathMetric {
    /// Euclidean, for local meters or plane units.
    Planar,
    /// Great-circle meters, for `(lon, lat)` points stored as `(x, y)`.
    Geographic,
}

/// Position and direction at a travelled distance.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathSample {
    pub position: Vec2,
    /// Direction of travel, counter-clockwise from +x (east).
    pub heading_rad: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathIndex {
    points: Vec<Vec2>,
    /// `cumulative[0] = 0`, `cumulative[i] = cumulative[i - 1] + |p[i] - p[i - 1]|`.
    cumulative: Vec<f64>,
    metric: PathMetric,
}

impl PathIndex {
    /// `None` for fewer than two points.
    pub fn planar(points: Vec<Vec2>) -> Option<Self> {
        Self::new(points, PathMetric::Planar)
    }

    pub fn geographic(points: &[LonLat]) -> Option<Self> {
        let points = points.iter().map(|p| Vec2::new(p.lon_deg, p.lat_deg)).collect();
        Self::new(points, PathMetric::Geographic)
    }

    pub fn new(points: Vec<Vec2>, metric: PathMetric) -> Option<Self> {
        if points.len() < 2 || points.iter().any(|p| !p.is_finite()) {
            return None;
        }
        let mut cumulative = Vec::with_capacity(points.len());
        let mut acc = 0.0;
        cumulative.push(acc);
        for pair in points.windows(2) {
            acc += segment_length(metric, pair[0], pair[1]);
            cumulative.push(acc);
        }
        Some(Self {
            points,
            cumulative,
            metric,
        })
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn metric(&self) -> PathMetric {
        self.metric
    }

    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Total length, never below [`PATH_EPSILON`].
    pub fn total_length(&self) -> f64 {
        self.raw_length().max(PATH_EPSILON)
    }

    pub fn is_degenerate(&self) -> bool {
        self.raw_length() < PATH_EPSILON
    }

    fn raw_length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// `d mod total`, always in `[0, total)`.
    pub fn wrap(&self, d: f64) -> f64 {
        if !d.is_finite() {
            return 0.0;
        }
        let total = self.total_length();
        let w = d.rem_euclid(total);
        // rem_euclid can round up to `total` for tiny negative inputs.
        if w >= total { 0.0 } else { w }
    }

    pub fn position_at(&self, d: f64) -> Vec2 {
        self.sample(d).position
    }

    pub fn sample(&self, d: f64) -> PathSample {
        let last = self.points.len() - 1;
        if self.is_degenerate() {
            return PathSample {
                position: self.points[last],
                heading_rad: 0.0,
            };
        }

        let w = self.wrap(d);
        // First vertex strictly beyond `w`; the segment ends there.
        let end = self.cumulative.partition_point(|&c| c <= w).clamp(1, last);
        let start = end - 1;
        let a = self.points[start];
        let b = self.points[end];
        let seg = self.cumulative[end] - self.cumulative[start];
        let t = if seg > 0.0 {
            ((w - self.cumulative[start]) / seg).clamp(0.0, 1.0)
        } else {
            0.0
        };

        PathSample {
            position: a.lerp(b, t),
            heading_rad: self.heading(a, b),
        }
    }

    fn heading(&self, a: Vec2, b: Vec2) -> f64 {
        let d = b - a;
        match self.metric {
            PathMetric::Planar => d.y.atan2(d.x),
            PathMetric::Geographic => {
                let mid_lat = (a.y + b.y) * 0.5;
                let north = d.y * foundation::math::METERS_PER_DEG_LAT;
                north.atan2(d.x * meters_per_deg_lon(mid_lat))
            }
        }
    }
}

fn segment_length(metric: PathMetric, a: Vec2, b: Vec2) -> f64 {
    match metric {
        PathMetric::Planar => (b - a).length(),
        PathMetric::Geographic => {
            great_circle_distance_m(LonLat::new(a.x, a.y), LonLat::new(b.x, b.y))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PATH_EPSILON, PathIndex, PathMetric};
    use foundation::math::{LonLat, Vec2};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn assert_vec_close(a: Vec2, b: Vec2, eps: f64) {
        assert!((a - b).length() <= eps, "expected {a:?} ~= {b:?}");
    }

    fn l_path() -> PathIndex {
        PathIndex::planar(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(3.0, 4.0),
        ])
        .expect("path")
    }

    #[test]
    fn builds_cumulative_table() {
        let p = l_path();
        assert_eq!(p.cumulative(), &[0.0, 3.0, 7.0]);
        assert_eq!(p.total_length(), 7.0);
    }

    #[test]
    fn rejects_short_paths() {
        assert!(PathIndex::planar(vec![]).is_none());
        assert!(PathIndex::planar(vec![Vec2::new(1.0, 1.0)]).is_none());
        assert!(PathIndex::planar(vec![Vec2::new(f64::NAN, 1.0), Vec2::ZERO]).is_none());
    }

    #[test]
    fn interpolates_within_segments() {
        let p = l_path();
        assert_eq!(p.position_at(0.0), Vec2::new(0.0, 0.0));
        assert_eq!(p.position_at(1.5), Vec2::new(1.5, 0.0));
        assert_eq!(p.position_at(3.0), Vec2::new(3.0, 0.0));
        assert_eq!(p.position_at(5.0), Vec2::new(3.0, 2.0));
    }

    #[test]
    fn approaches_last_point_from_below() {
        let p = l_path();
        let near_end = p.position_at(7.0 - 1e-9);
        assert_vec_close(near_end, Vec2::new(3.0, 4.0), 1e-6);
    }

    #[test]
    fn is_periodic() {
        let p = l_path();
        for &d in &[0.0, 0.25, 2.9, 3.1, 6.5] {
            for k in [-3i32, -1, 1, 2, 10] {
                let shifted = d + f64::from(k) * p.total_length();
                assert_vec_close(p.position_at(shifted), p.position_at(d), 1e-9);
            }
        }
    }

    #[test]
    fn wrap_stays_in_range() {
        let p = l_path();
        for &d in &[-1e-20, -7.0, 7.0, 14.0, 1e9, f64::NAN] {
            let w = p.wrap(d);
            assert!((0.0..7.0).contains(&w), "wrap({d}) = {w}");
        }
    }

    #[test]
    fn degenerate_path_returns_its_point() {
        let pt = Vec2::new(2.0, -1.0);
        let p = PathIndex::planar(vec![pt, pt, pt]).expect("path");
        assert!(p.is_degenerate());
        assert_eq!(p.total_length(), PATH_EPSILON);
        for &d in &[0.0, 1.0, -5.0, 1e12] {
            assert_eq!(p.position_at(d), pt);
        }
    }

    #[test]
    fn zero_length_segments_are_skipped() {
        let p = PathIndex::planar(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
        ])
        .expect("path");
        assert_eq!(p.position_at(0.0), Vec2::new(0.0, 0.0));
        assert_eq!(p.position_at(1.0), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn heading_follows_segment() {
        let p = l_path();
        assert_close(p.sample(1.0).heading_rad, 0.0, 1e-12);
        assert_close(p.sample(4.0).heading_rad, std::f64::consts::FRAC_PI_2, 1e-12);
    }

    #[test]
    fn geographic_paths_measure_meters() {
        let p = PathIndex::geographic(&[LonLat::new(72.62, 22.0), LonLat::new(72.62, 22.01)])
            .expect("path");
        assert_eq!(p.metric(), PathMetric::Geographic);
        // ~1.11 km on the sphere.
        assert_close(p.total_length(), 1111.95, 0.5);
        let mid = p.position_at(p.total_length() * 0.5);
        assert_close(mid.y, 22.005, 1e-9);
        assert_close(p.sample(10.0).heading_rad, std::f64::consts::FRAC_PI_2, 1e-9);
    }
}
