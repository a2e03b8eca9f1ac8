use crate::config::SlopeInterval;
use anyhow::bail;
use log::warn;

/// One linear piece of a [SlopeProfile], covering distances up to `end`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SlopeSegment {
    pub end: f64,
    pub offset: f64,
    pub slope: f64,
}

/// Piecewise-linear mapping from distance-to-river to terrain height.
///
/// Built from a list of `(length, slope)` pairs laid end to end, starting at
/// distance 0 with a base height. The result is continuous. Distances below
/// zero or past the last interval extrapolate along the first or last piece.
#[derive(Clone, Debug, PartialEq)]
pub struct SlopeProfile {
    intervals: Vec<SlopeSegment>,
}

impl SlopeProfile {
    pub fn new(
        base_height: f64,
        intervals: &[SlopeInterval],
    ) -> anyhow::Result<Self> {
        if intervals.is_empty() {
            bail!("slope profile needs at least one interval");
        }

        let mut segments = Vec::with_capacity(intervals.len());
        let mut prev_end = 0.0;
        let mut start_height = base_height;
        for (i, interval) in intervals.iter().enumerate() {
            if interval.length.is_nan() || interval.length <= 0.0 {
                bail!(
                    "slope interval {} has non-positive length {}",
                    i,
                    interval.length
                );
            }
            segments.push(SlopeSegment {
                end: prev_end + interval.length,
                offset: start_height - prev_end * interval.slope,
                slope: interval.slope,
            });
            prev_end += interval.length;
            start_height += interval.length * interval.slope;
        }

        let profile = Self {
            intervals: segments,
        };
        if !profile.is_monotonic() {
            warn!(
                "Slope profile {:?} has negative slopes, \
                terrain will dip away from rivers",
                intervals
            );
        }
        Ok(profile)
    }

    pub fn intervals(&self) -> &[SlopeSegment] {
        &self.intervals
    }

    /// Does height never decrease with distance?
    pub fn is_monotonic(&self) -> bool {
        self.intervals.iter().all(|segment| segment.slope >= 0.0)
    }

    pub fn height_at(&self, distance: f64) -> f64 {
        // First interval that reaches the distance
        let i = self
            .intervals
            .partition_point(|segment| segment.end < distance)
            .min(self.intervals.len() - 1);
        let segment = &self.intervals[i];
        distance * segment.slope + segment.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    fn default_profile() -> SlopeProfile {
        let config = WorldConfig::default();
        SlopeProfile::new(config.slope_base_height, &config.slope_profile)
            .unwrap()
    }

    /// Walk the intervals one by one, no search
    fn linear_scan(profile: &SlopeProfile, distance: f64) -> f64 {
        let intervals = profile.intervals();
        let segment = intervals
            .iter()
            .find(|segment| distance <= segment.end)
            .unwrap_or(&intervals[intervals.len() - 1]);
        distance * segment.slope + segment.offset
    }

    #[test]
    fn test_breakpoints() {
        let profile = default_profile();
        let expected = [
            (0.0, -7.0),
            (7.0, 0.0),
            (18.0, 0.77),
            (33.0, 8.27),
            (50.0, 25.27),
            (1050.0, 1525.27),
        ];
        for (distance, height) in expected.iter() {
            assert_approx_eq!(profile.height_at(*distance), *height, 1e-9);
        }
        // Halfway through the first interval
        assert_approx_eq!(profile.height_at(3.5), -3.5, 1e-9);
    }

    #[test]
    fn test_continuous() {
        let profile = default_profile();
        for segment in profile.intervals() {
            let below = profile.height_at(segment.end - 1e-9);
            let above = profile.height_at(segment.end + 1e-9);
            assert_approx_eq!(below, above, 1e-6);
        }
    }

    #[test]
    fn test_extrapolation() {
        let profile = default_profile();
        assert_approx_eq!(profile.height_at(-2.0), -9.0, 1e-9);
        assert_approx_eq!(profile.height_at(1150.0), 1675.27, 1e-9);
    }

    #[test]
    fn test_matches_linear_scan() {
        let profile = default_profile();
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..100 {
            let distance = rng.gen_range(0.0..1200.0);
            assert_eq!(
                profile.height_at(distance),
                linear_scan(&profile, distance),
                "mismatch at {}",
                distance
            );
        }
    }

    #[test]
    fn test_monotonic() {
        assert!(default_profile().is_monotonic());
        let dipping = SlopeProfile::new(
            0.0,
            &[
                SlopeInterval {
                    length: 5.0,
                    slope: 1.0,
                },
                SlopeInterval {
                    length: 5.0,
                    slope: -0.5,
                },
            ],
        )
        .unwrap();
        assert!(!dipping.is_monotonic());
        assert_approx_eq!(dipping.height_at(10.0), 2.5, 1e-9);
    }

    #[test]
    fn test_invalid() {
        assert!(SlopeProfile::new(0.0, &[]).is_err());
        assert!(SlopeProfile::new(
            0.0,
            &[SlopeInterval {
                length: 0.0,
                slope: 1.0
            }]
        )
        .is_err());
    }
}
