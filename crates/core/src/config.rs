mod seed;

pub use self::seed::{salt, Seed};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::{Validate, ValidationError};

/// Configuration that defines a generated world. Two generators built from the
/// same config will always produce identical regions, in any order and on any
/// number of threads.
///
/// Every field has a default (see [WorldConfig::default]), so a config file
/// only has to list the fields it wants to change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_world_shape"))]
pub struct WorldConfig {
    /// RNG seed for all randomized processes. See [Seed] for the accepted
    /// input formats.
    pub seed: Seed,

    /// Multiplier on the cell size of both hex lattices. Larger values mean
    /// bigger basins and longer rivers.
    #[validate(range(min = 0.05, max = 100.0))]
    pub landform_scale: f64,

    /// Bias for geologic activity in the realistic climate mode. Smaller
    /// values push basins towards inactive. Activity is drawn as
    /// `u^(1/geologic_activity)`.
    #[validate(range(min = 0.001, max = 1.0))]
    pub geologic_activity: f64,

    /// Multiplier applied to every basin's temperature
    #[validate(range(min = 0.0))]
    pub global_temperature: f64,

    /// Multiplier applied to every basin's rainfall
    #[validate(range(min = 0.0))]
    pub global_precipitation: f64,

    /// Distance (in blocks) between a pole and the equator. Temperature bands
    /// repeat with a period of twice this value along the z axis.
    #[validate(range(min = 1))]
    pub polar_equator_distance: i32,

    /// How basin climates are drawn
    pub world_climate: WorldClimate,

    /// Temperature band the spawn point (world center) should land in
    pub starting_climate: StartingClimate,

    /// Size of the world along the z axis, in blocks. Used to center the
    /// starting climate band on the middle of the world.
    #[validate(range(min = 1))]
    pub map_size_z: i32,

    /// Number of blocks in a column. Packed column heights only have 9 bits
    /// for terrain height, so this can't go past 512.
    #[validate(range(min = 8, max = 512))]
    pub world_height: i32,

    /// Y level of the ocean surface. Rivers with no remaining depth run at
    /// this level.
    #[validate(range(min = 3))]
    pub sea_level: i32,

    /// Width of one map region, in blocks. Must be a multiple of
    /// `chunk_size`.
    #[validate(range(min = 1))]
    pub region_size: i32,

    /// Width of one chunk, in blocks
    #[validate(range(min = 1))]
    pub chunk_size: i32,

    /// Padding (in blocks) rendered around a region so that rivers just
    /// outside the region still shape its terrain
    #[validate(range(min = 0))]
    pub frame_margin: i32,

    /// Unscaled cell height of the basin lattice, in blocks
    #[validate(range(min = 16))]
    pub basin_cell_height: i32,

    /// Unscaled cell height of the river node lattice, in blocks
    #[validate(range(min = 4))]
    pub river_cell_height: i32,

    /// Distance along the slope profile between a river bed and the river's
    /// water surface
    #[validate(range(min = 0.0))]
    pub channel_depth: f64,

    /// Height of the slope profile at distance zero, relative to sea level
    pub slope_base_height: f64,

    /// Maximum number of drainage networks kept in memory. Zero means the
    /// cache is never evicted.
    pub basin_cache_capacity: usize,

    /// Ordered `(length, slope)` pairs that map distance-to-river onto
    /// terrain height. See [SlopeProfile](crate::SlopeProfile).
    #[validate(custom = "validate_slope_profile")]
    pub slope_profile: Vec<SlopeInterval>,

    /// How accumulated river flow turns into depth
    #[validate(custom = "validate_depth_curve")]
    pub depth_curve: DepthCurve,
}

/// Climate generation modes
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorldClimate {
    /// Temperature follows latitude bands, rainfall and geologic activity are
    /// independent draws
    Realistic,
    /// Temperature and rainfall are averages of several uniform draws, so
    /// they cluster around moderate values with no latitude structure
    Patchy,
}

/// The temperature band that the world center falls into
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StartingClimate {
    Temperate,
    Hot,
    Warm,
    Cool,
    Icy,
}

impl StartingClimate {
    /// Target temperature of the world center, on the `[0, 255]` scale
    pub fn spawn_temperature(self) -> i32 {
        match self {
            Self::Temperate => 127,
            Self::Hot => 212,
            Self::Warm => 174,
            Self::Cool => 76,
            Self::Icy => 34,
        }
    }
}

/// One piece of the slope profile: the next `length` blocks of distance rise
/// at `slope` blocks of height per block.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlopeInterval {
    pub length: f64,
    pub slope: f64,
}

/// Mapping from a river node's accumulated flow to the depth value it gets
/// rasterized with. Both variants are non-increasing in flow: bigger rivers
/// sit lower in the landscape.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DepthCurve {
    /// `max(0, max_height - flow * flow_scale)`
    Linear { max_height: f64, flow_scale: f64 },
    /// `(1 - min(1, flow / saturation_flow))^3 * start_height`
    Cubic {
        start_height: f64,
        saturation_flow: f64,
    },
}

impl DepthCurve {
    /// Depth for a node carrying `flow`
    pub fn depth(self, flow: f32) -> i32 {
        let flow = flow as f64;
        let depth = match self {
            Self::Linear {
                max_height,
                flow_scale,
            } => (max_height - flow * flow_scale).max(0.0),
            Self::Cubic {
                start_height,
                saturation_flow,
            } => {
                let t = 1.0 - (flow / saturation_flow).min(1.0);
                t * t * t * start_height
            }
        };
        depth.round() as i32
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: Seed::default(),
            landform_scale: 1.0,
            geologic_activity: 0.05,
            global_temperature: 1.0,
            global_precipitation: 1.0,
            polar_equator_distance: 50_000,
            world_climate: WorldClimate::Realistic,
            starting_climate: StartingClimate::Temperate,
            map_size_z: 1_024_000,
            world_height: 256,
            sea_level: 110,
            region_size: 512,
            chunk_size: 32,
            frame_margin: 512,
            basin_cell_height: 3500,
            river_cell_height: 64,
            channel_depth: 7.0,
            slope_base_height: -7.0,
            basin_cache_capacity: 0,
            slope_profile: vec![
                SlopeInterval {
                    length: 7.0,
                    slope: 1.0,
                },
                SlopeInterval {
                    length: 11.0,
                    slope: 0.07,
                },
                SlopeInterval {
                    length: 15.0,
                    slope: 0.5,
                },
                SlopeInterval {
                    length: 17.0,
                    slope: 1.0,
                },
                SlopeInterval {
                    length: 1000.0,
                    slope: 1.5,
                },
            ],
            depth_curve: DepthCurve::Cubic {
                start_height: 100.0,
                saturation_flow: 50.0,
            },
        }
    }
}

impl WorldConfig {
    /// Basin lattice cell height after applying the landform scale
    pub fn scaled_basin_cell_height(&self) -> i32 {
        scale(self.basin_cell_height, self.landform_scale)
    }

    /// River lattice cell height after applying the landform scale
    pub fn scaled_river_cell_height(&self) -> i32 {
        scale(self.river_cell_height, self.landform_scale)
    }
}

fn scale(cell_height: i32, landform_scale: f64) -> i32 {
    ((cell_height as f64 * landform_scale).round() as i32).max(2)
}

fn validate_world_shape(config: &WorldConfig) -> Result<(), ValidationError> {
    if config.chunk_size > 0 && config.region_size % config.chunk_size != 0 {
        return Err(ValidationError::new("region_size_not_chunk_multiple"));
    }
    if config.sea_level >= config.world_height - 3 {
        return Err(ValidationError::new("sea_level_above_world"));
    }
    Ok(())
}

fn validate_slope_profile(
    intervals: &[SlopeInterval],
) -> Result<(), ValidationError> {
    if intervals.is_empty() {
        return Err(ValidationError::new("empty_slope_profile"));
    }
    if intervals.iter().any(|interval| {
        interval.length.is_nan()
            || interval.length <= 0.0
            || !interval.slope.is_finite()
    }) {
        return Err(ValidationError::new("invalid_slope_interval"));
    }
    Ok(())
}

fn validate_depth_curve(curve: &DepthCurve) -> Result<(), ValidationError> {
    let valid = match *curve {
        DepthCurve::Linear {
            max_height,
            flow_scale,
        } => max_height >= 0.0 && flow_scale >= 0.0,
        DepthCurve::Cubic {
            start_height,
            saturation_flow,
        } => start_height >= 0.0 && saturation_flow > 0.0,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_depth_curve"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        WorldConfig::default().validate().unwrap();
    }

    #[test]
    fn test_depth_curves_are_monotonic() {
        let curves = [
            DepthCurve::Linear {
                max_height: 139.0,
                flow_scale: 0.5,
            },
            DepthCurve::Cubic {
                start_height: 100.0,
                saturation_flow: 50.0,
            },
        ];
        for curve in curves.iter() {
            let mut prev = curve.depth(0.0);
            for flow in 1..400 {
                let depth = curve.depth(flow as f32);
                assert!(depth <= prev, "{:?} rose at flow {}", curve, flow);
                assert!(depth >= 0, "{:?} went negative at {}", curve, flow);
                prev = depth;
            }
        }
    }

    #[test]
    fn test_depth_curve_values() {
        let cubic = DepthCurve::Cubic {
            start_height: 100.0,
            saturation_flow: 50.0,
        };
        assert_eq!(cubic.depth(0.0), 100);
        assert_eq!(cubic.depth(25.0), 13); // 0.5^3 * 100 = 12.5
        assert_eq!(cubic.depth(50.0), 0);
        assert_eq!(cubic.depth(5000.0), 0);

        let linear = DepthCurve::Linear {
            max_height: 80.0,
            flow_scale: 2.0,
        };
        assert_eq!(linear.depth(1.0), 78);
        assert_eq!(linear.depth(100.0), 0);
    }

    #[test]
    fn test_landform_scale() {
        let config = WorldConfig {
            landform_scale: 2.0,
            ..Default::default()
        };
        assert_eq!(config.scaled_basin_cell_height(), 7000);
        assert_eq!(config.scaled_river_cell_height(), 128);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: WorldConfig = serde_json::from_str(
            r#"{
                "seed": "42",
                "world_climate": "patchy",
                "starting_climate": "icy",
                "depth_curve": {
                    "type": "linear",
                    "max_height": 90.0,
                    "flow_scale": 1.0
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.seed, Seed(42));
        assert_eq!(config.world_climate, WorldClimate::Patchy);
        assert_eq!(config.starting_climate, StartingClimate::Icy);
        assert_eq!(
            config.depth_curve,
            DepthCurve::Linear {
                max_height: 90.0,
                flow_scale: 1.0
            }
        );
        // Everything else falls back to defaults
        assert_eq!(config.region_size, 512);
        assert_eq!(config.slope_profile.len(), 5);
    }
}
