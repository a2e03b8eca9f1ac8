pub mod basin;
pub mod hex;
mod region;

pub use self::region::{ColumnHeight, RegionHeightMap};
use crate::{
    config::salt,
    render::{HeightMapRenderer, SlopeProfile},
    timed,
    util,
    world::{
        basin::{climate_for, Basin, BasinCache, Climate, DrainageNetwork},
        hex::{
            AxialCoord, AxialCoordIndexMap, AxialCoordSet, CartesianPoint,
            HexGrid, Rect,
        },
    },
    WorldConfig,
};
use anyhow::Context;
use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use log::{debug, info};
use std::sync::Arc;
use validator::Validate;

/// Generates terrain for any map region of one world, on demand.
///
/// Nothing about the world is precomputed. Every region is derived from the
/// config alone, so asking for the same region twice (or from two generators
/// with the same config) gives identical results. The only state kept
/// between calls is a cache of built drainage networks.
///
/// A generator is `Send + Sync` and can be shared between worker threads.
pub struct TerrainGenerator {
    config: WorldConfig,
    basin_grid: HexGrid,
    river_grid: HexGrid,
    slope_profile: SlopeProfile,
    cache: BasinCache,
}

impl TerrainGenerator {
    /// Build a generator from a config. Returns an error if the config is
    /// invalid.
    pub fn new(config: WorldConfig) -> anyhow::Result<Self> {
        info!("Initializing terrain generator with config {:#?}", config);
        config.validate().context("invalid config")?;

        let slope_profile =
            SlopeProfile::new(config.slope_base_height, &config.slope_profile)
                .context("invalid slope profile")?;
        let basin_grid =
            HexGrid::new(config.scaled_basin_cell_height(), salt::BASIN_GRID);
        let river_grid =
            HexGrid::new(config.scaled_river_cell_height(), salt::RIVER_GRID);
        info!(
            "Basin cells are {}x{}, river cells are {}x{}",
            basin_grid.cell_width(),
            basin_grid.cell_height(),
            river_grid.cell_width(),
            river_grid.cell_height()
        );

        Ok(Self {
            cache: BasinCache::new(config.basin_cache_capacity),
            config,
            basin_grid,
            river_grid,
            slope_profile,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn basin_grid(&self) -> &HexGrid {
        &self.basin_grid
    }

    pub fn river_grid(&self) -> &HexGrid {
        &self.river_grid
    }

    pub fn slope_profile(&self) -> &SlopeProfile {
        &self.slope_profile
    }

    pub fn cache(&self) -> &BasinCache {
        &self.cache
    }

    /// The drainage network of a basin, built on first access
    pub fn drainage_network(&self, basin: AxialCoord) -> Arc<DrainageNetwork> {
        self.cache.get_or_build(basin, || {
            timed!(
                format!("Drainage network for basin {}", basin),
                Basin::new(basin).build_drainage_network(
                    self.config.seed,
                    &self.basin_grid,
                    &self.river_grid,
                    self.config.depth_curve,
                )
            )
        })
    }

    /// Block-space area covered by a region, without margin
    pub fn region_bounds(&self, region_x: i32, region_z: i32) -> Rect {
        let size = self.config.region_size;
        Rect::with_size(region_x * size, region_z * size, size, size)
    }

    /// Block-space area rendered for a region: the region plus the frame
    /// margin on every side
    pub fn region_frame(&self, region_x: i32, region_z: i32) -> Rect {
        let bounds = self.region_bounds(region_x, region_z);
        let margin = self.config.frame_margin;
        Rect::new(
            bounds.x1 - margin,
            bounds.z1 - margin,
            bounds.x2 + margin,
            bounds.z2 + margin,
        )
    }

    /// Every basin whose territory reaches into `frame`, sorted by
    /// coordinate. Territories are found by sampling the closest basin site
    /// on a grid much finer than a basin, edges of the frame included.
    pub fn basins_in(&self, frame: Rect) -> Vec<AxialCoord> {
        let step = (self.basin_grid.cell_width() / 8).max(1) as usize;
        let xs = sample_axis(frame.x1, frame.x2, step);
        let zs = sample_axis(frame.z1, frame.z2, step);

        let mut basins = AxialCoordSet::default();
        for &z in &zs {
            for &x in &xs {
                let (_, basin) = self
                    .basin_grid
                    .closest_site(self.config.seed, CartesianPoint::new(x, z));
                basins.insert(basin);
            }
        }
        let mut basins: Vec<_> = basins.into_iter().collect();
        basins.sort();
        basins
    }

    /// Rasterize every river near a region and run the distance transform.
    /// The returned renderer covers the region's frame.
    pub fn render_region(
        &self,
        region_x: i32,
        region_z: i32,
    ) -> HeightMapRenderer {
        let frame = self.region_frame(region_x, region_z);
        self.render_frame(frame, &self.basins_in(frame))
    }

    fn render_frame(
        &self,
        frame: Rect,
        basins: &[AxialCoord],
    ) -> HeightMapRenderer {
        let mut renderer = HeightMapRenderer::new(frame);
        let mut plotted = 0;
        for basin in basins {
            let network = self.drainage_network(*basin);
            for segment in network.segments() {
                if renderer.plot_segment(segment) {
                    plotted += 1;
                }
            }
        }
        debug!("Plotted {} segments into frame {}", plotted, frame);
        timed!("Distance transform", renderer.distance_transform());
        renderer
    }

    /// Generate packed column heights for every chunk of a region
    pub fn generate_region(
        &self,
        region_x: i32,
        region_z: i32,
    ) -> RegionHeightMap {
        timed!(
            format!("Region ({}, {})", region_x, region_z),
            log::Level::Info,
            self.generate_region_inner(region_x, region_z)
        )
    }

    fn generate_region_inner(
        &self,
        region_x: i32,
        region_z: i32,
    ) -> RegionHeightMap {
        let frame = self.region_frame(region_x, region_z);
        let basins = self.basins_in(frame);
        let renderer = self.render_frame(frame, &basins);
        let bounds = self.region_bounds(region_x, region_z);
        let chunk_size = self.config.chunk_size;
        let chunks_per_side = self.config.region_size / chunk_size;

        let mut chunks: IndexMap<_, _, FnvBuildHasher> = IndexMap::default();
        for chunk_z in 0..chunks_per_side {
            for chunk_x in 0..chunks_per_side {
                let mut columns =
                    Vec::with_capacity((chunk_size * chunk_size) as usize);
                for z in 0..chunk_size {
                    for x in 0..chunk_size {
                        columns.push(self.column_height(
                            &renderer,
                            bounds.x1 + chunk_x * chunk_size + x,
                            bounds.z1 + chunk_z * chunk_size + z,
                        ));
                    }
                }
                chunks.insert((chunk_x, chunk_z), columns);
            }
        }

        let climates: AxialCoordIndexMap<Climate> = basins
            .into_iter()
            .map(|basin| {
                let climate = climate_for(
                    self.config.seed,
                    &self.config,
                    &self.basin_grid,
                    basin,
                );
                (basin, climate)
            })
            .collect();

        info!(
            "Generated region ({}, {}): {} chunks, {} basins",
            region_x,
            region_z,
            chunks.len(),
            climates.len()
        );
        RegionHeightMap::new(region_x, region_z, chunk_size, chunks, climates)
    }

    /// Height of a single column, read from a transformed renderer.
    ///
    /// The terrain follows the slope profile at the column's transform value.
    /// The water surface sits where the terrain would be `channel_depth`
    /// further from the river, but never below sea level. A column that no
    /// river reached gets the tallest terrain possible and no water.
    pub fn column_height(
        &self,
        renderer: &HeightMapRenderer,
        x: i32,
        z: i32,
    ) -> ColumnHeight {
        let sea_level = self.config.sea_level;
        let world_height = self.config.world_height;
        let sample = renderer.sample(x, z);
        if !sample.value.is_finite() {
            return ColumnHeight::new(world_height, 0, world_height);
        }

        let terrain = sea_level
            + util::floor_i32(
                self.slope_profile.height_at(sample.value as f64),
            );
        let source = renderer.source_value(x, z) as f64;
        let water_surface = sea_level.max(
            sea_level
                + util::floor_i32(
                    self.slope_profile
                        .height_at(source + self.config.channel_depth),
                ),
        );
        ColumnHeight::new(terrain, water_surface - terrain, world_height)
    }

    /// Climate at any block position, blended from the three basins around
    /// it by barycentric weight
    pub fn climate_at(&self, x: i32, z: i32) -> Climate {
        let seed = self.config.seed;
        let triangle = self.basin_grid.locate(seed, CartesianPoint::new(x, z));
        let climates: Vec<Climate> = triangle
            .vertices()
            .iter()
            .map(|basin| {
                climate_for(seed, &self.config, &self.basin_grid, *basin)
            })
            .collect();
        let blend = |channel: fn(&Climate) -> u8| -> u8 {
            let value: f32 = climates
                .iter()
                .zip(triangle.weights().iter())
                .map(|(climate, weight)| channel(climate) as f32 * weight)
                .sum();
            value.round().max(0.0).min(255.0) as u8
        };
        Climate {
            temperature: blend(|climate| climate.temperature),
            rainfall: blend(|climate| climate.rainfall),
            geologic_activity: blend(|climate| climate.geologic_activity),
        }
    }
}

/// Sample positions along `[start, end)` every `step`, always including the
/// last position
fn sample_axis(start: i32, end: i32, step: usize) -> Vec<i32> {
    let mut positions: Vec<i32> = (start..end).step_by(step).collect();
    if positions.last() != Some(&(end - 1)) && end > start {
        positions.push(end - 1);
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Seed;

    /// A small world so tests stay fast
    fn small_config() -> WorldConfig {
        WorldConfig {
            seed: Seed(42),
            landform_scale: 0.1,
            region_size: 64,
            chunk_size: 16,
            frame_margin: 32,
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config() {
        let config = WorldConfig {
            region_size: 100,
            chunk_size: 32,
            ..Default::default()
        };
        assert!(TerrainGenerator::new(config).is_err());
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TerrainGenerator>();
    }

    #[test]
    fn test_sample_axis() {
        assert_eq!(sample_axis(0, 10, 4), vec![0, 4, 8, 9]);
        assert_eq!(sample_axis(0, 9, 4), vec![0, 4, 8]);
        assert_eq!(sample_axis(-3, -2, 4), vec![-3]);
    }

    #[test]
    fn test_region_frame() {
        let generator = TerrainGenerator::new(small_config()).unwrap();
        assert_eq!(generator.region_bounds(-1, 2), Rect::new(-64, 128, 0, 192));
        assert_eq!(generator.region_frame(-1, 2), Rect::new(-96, 96, 32, 224));
    }

    #[test]
    fn test_basins_in() {
        let generator = TerrainGenerator::new(small_config()).unwrap();
        let grid = generator.basin_grid();
        let frame = Rect::with_size(-2000, -2000, 4000, 4000);
        let basins = generator.basins_in(frame);
        // The frame is several basins wide
        assert!(basins.len() >= 9, "only found {:?}", basins);
        // Every basin whose site is inside the frame was found
        for q in -10..10 {
            for r in -10..10 {
                let coord = AxialCoord::new(q, r);
                let site = grid.jittered_site(Seed(42), coord);
                if frame.contains(site.x, site.z) {
                    assert!(basins.contains(&coord), "missed {}", coord);
                }
            }
        }
    }

    #[test]
    fn test_generate_region() {
        let generator = TerrainGenerator::new(small_config()).unwrap();
        let mut region = generator.generate_region(0, 0);
        assert_eq!(region.len(), 16);
        assert!(!region.climates().is_empty());
        let chunk = region.take_chunk(3, 3).unwrap();
        assert_eq!(chunk.len(), 256);
        for column in chunk {
            assert!(column.terrain_height() >= 3);
            assert!(column.terrain_height() <= 253);
        }
        assert!(region.take_chunk(3, 3).is_none());
        assert_eq!(region.len(), 15);
    }

    #[test]
    fn test_generate_region_is_deterministic() {
        let a = TerrainGenerator::new(small_config()).unwrap();
        let b = TerrainGenerator::new(small_config()).unwrap();
        // Warm up a's cache with a different region first, so the two
        // generators see different access orders
        a.generate_region(1, 1);
        let region_a = a.generate_region(-1, 0);
        let region_b = b.generate_region(-1, 0);
        let chunks_a: Vec<_> = region_a.chunks().collect();
        let chunks_b: Vec<_> = region_b.chunks().collect();
        assert_eq!(chunks_a, chunks_b);
        assert_eq!(region_a.climates(), region_b.climates());
    }

    #[test]
    fn test_unreached_column() {
        let generator = TerrainGenerator::new(small_config()).unwrap();
        let renderer = HeightMapRenderer::new(Rect::with_size(0, 0, 4, 4));
        let column = generator.column_height(&renderer, 1, 1);
        assert_eq!(column.terrain_height(), 253);
        assert_eq!(column.water_depth(), 0);
    }

    #[test]
    fn test_column_on_river() {
        let generator = TerrainGenerator::new(WorldConfig::default()).unwrap();
        let mut renderer = HeightMapRenderer::new(Rect::with_size(0, 0, 32, 1));
        // A river with nothing left to cut, at the left edge
        renderer.plot_point(0, 0, 0);
        renderer.distance_transform();

        // Bed: 7 below sea level, surface at sea level
        let bed = generator.column_height(&renderer, 0, 0);
        assert_eq!(bed.terrain_height(), 103);
        assert_eq!(bed.water_depth(), 7);
        // Riverbank rises one block per block
        let bank = generator.column_height(&renderer, 4, 0);
        assert_eq!(bank.terrain_height(), 107);
        assert_eq!(bank.water_depth(), 3);
        // Dry land past the channel
        let land = generator.column_height(&renderer, 10, 0);
        assert_eq!(land.terrain_height(), 110);
        assert_eq!(land.water_depth(), 0);
    }

    #[test]
    fn test_climate_at_site() {
        let generator = TerrainGenerator::new(small_config()).unwrap();
        let config = generator.config();
        for q in -2..2 {
            let basin = AxialCoord::new(q, 1);
            let site = generator.basin_grid().jittered_site(config.seed, basin);
            assert_eq!(
                generator.climate_at(site.x, site.z),
                climate_for(config.seed, config, generator.basin_grid(), basin)
            );
        }
    }
}
