use crate::{
    config::{salt, Seed, WorldClimate, WorldConfig},
    world::hex::{AxialCoord, HexGrid},
};
use derive_more::Display;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Climate of one basin. Every channel is on a `[0, 255]` scale.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    Serialize,
    Deserialize,
)]
#[display(
    fmt = "temp={} rain={} geo={}",
    temperature,
    rainfall,
    geologic_activity
)]
pub struct Climate {
    pub temperature: u8,
    pub rainfall: u8,
    pub geologic_activity: u8,
}

impl Climate {
    /// Pack into the `0x00TTRRGG` layout used by climate maps
    pub fn packed(self) -> u32 {
        (self.temperature as u32) << 16
            | (self.rainfall as u32) << 8
            | self.geologic_activity as u32
    }

    pub fn from_packed(packed: u32) -> Self {
        Self {
            temperature: (packed >> 16) as u8,
            rainfall: (packed >> 8) as u8,
            geologic_activity: packed as u8,
        }
    }
}

/// Generate the climate of one basin. This only depends on the config and the
/// basin's coordinate, so neighboring basins agree on each other's climate no
/// matter which one asks first.
pub fn climate_for(
    seed: Seed,
    config: &WorldConfig,
    basin_grid: &HexGrid,
    coord: AxialCoord,
) -> Climate {
    let mut rng = seed.rng_at(salt::CLIMATE, coord.q, coord.r);
    let (geologic_activity, temperature, rainfall) = match config.world_climate
    {
        WorldClimate::Realistic => {
            let site = basin_grid.jittered_site(seed, coord);
            let geologic_activity = ((rng.gen_range(0..256) as f64 / 255.0)
                .powf(1.0 / config.geologic_activity)
                * 255.0)
                .max(0.0) as i32;
            let temperature = latitude_temperature(config, site.z)
                + rng.gen_range(0..40)
                - 20;
            let rainfall = rng.gen_range(0..256);
            (geologic_activity, temperature, rainfall)
        }
        WorldClimate::Patchy => {
            let geologic_activity = (rng.gen_range(0..256) - 128).max(0) * 2;
            let temperature =
                100 + (rng.gen_range(0..165) + rng.gen_range(0..165)) / 2;
            let bound = 60 + temperature;
            let rainfall = (rng.gen_range(0..bound)
                + rng.gen_range(0..bound)
                + rng.gen_range(0..bound))
                / 3;
            (geologic_activity, temperature, rainfall)
        }
    };

    Climate {
        temperature: to_channel(
            temperature as f64 * config.global_temperature,
        ),
        rainfall: to_channel(rainfall as f64 * config.global_precipitation),
        geologic_activity: to_channel(geologic_activity as f64),
    }
}

/// Temperature from latitude alone. Follows a triangle wave along `z` with a
/// period of two pole-to-equator distances, shifted so that the middle of
/// the map lands on the starting climate's temperature.
fn latitude_temperature(config: &WorldConfig, z: i32) -> i32 {
    let half_range = config.polar_equator_distance as i64;
    let offset_z = (config.starting_climate.spawn_temperature() as f64 / 255.0
        * half_range as f64) as i64
        + half_range
        - config.map_size_z as i64 / 2;
    let band = (z as i64 + offset_z).rem_euclid(2 * half_range) - half_range;
    (band.abs() as f64 / half_range as f64 * 255.0) as i32
}

fn to_channel(value: f64) -> u8 {
    value.max(0.0).min(255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StartingClimate;

    fn grid(config: &WorldConfig) -> HexGrid {
        HexGrid::new(config.scaled_basin_cell_height(), salt::BASIN_GRID)
    }

    #[test]
    fn test_packed() {
        let climate = Climate {
            temperature: 0xab,
            rainfall: 0x12,
            geologic_activity: 0x04,
        };
        assert_eq!(climate.packed(), 0x00ab_1204);
        assert_eq!(Climate::from_packed(climate.packed()), climate);
    }

    #[test]
    fn test_climate_is_deterministic() {
        for world_climate in [WorldClimate::Realistic, WorldClimate::Patchy] {
            let config = WorldConfig {
                world_climate,
                ..Default::default()
            };
            let grid = grid(&config);
            for q in -3..3 {
                for r in -3..3 {
                    let coord = AxialCoord::new(q, r);
                    assert_eq!(
                        climate_for(Seed(42), &config, &grid, coord),
                        climate_for(Seed(42), &config, &grid, coord),
                    );
                }
            }
        }
    }

    #[test]
    fn test_latitude_bands() {
        let config = WorldConfig {
            polar_equator_distance: 1000,
            map_size_z: 0,
            starting_climate: StartingClimate::Temperate,
            ..Default::default()
        };
        // offset_z = 127/255 * 1000 + 1000 = 1498
        assert_eq!(latitude_temperature(&config, -1498), 255);
        assert_eq!(latitude_temperature(&config, -498), 0);
        assert_eq!(latitude_temperature(&config, 502), 255);
        // Negative z wraps the same way as positive z
        assert_eq!(
            latitude_temperature(&config, -5498),
            latitude_temperature(&config, -1498)
        );
    }

    /// The world center should come out near the starting climate
    #[test]
    fn test_starting_climate() {
        for starting in [
            StartingClimate::Hot,
            StartingClimate::Temperate,
            StartingClimate::Icy,
        ] {
            let config = WorldConfig {
                starting_climate: starting,
                ..Default::default()
            };
            let center = config.map_size_z / 2;
            let temperature = latitude_temperature(&config, center);
            assert!(
                (temperature - starting.spawn_temperature()).abs() <= 1,
                "{} gave {}",
                starting,
                temperature
            );
        }
    }

    #[test]
    fn test_global_modifiers() {
        let base = WorldConfig {
            world_climate: WorldClimate::Patchy,
            ..Default::default()
        };
        let frozen = WorldConfig {
            global_temperature: 0.0,
            global_precipitation: 0.0,
            ..base.clone()
        };
        let scorched = WorldConfig {
            global_temperature: 100.0,
            ..base.clone()
        };
        let grid = grid(&base);
        for q in -2..2 {
            let coord = AxialCoord::new(q, 1);
            let climate = climate_for(Seed(9), &frozen, &grid, coord);
            assert_eq!(climate.temperature, 0);
            assert_eq!(climate.rainfall, 0);
            // Patchy temperature is at least 100, so scaling saturates
            let climate = climate_for(Seed(9), &scorched, &grid, coord);
            assert_eq!(climate.temperature, 255);
        }
    }
}
