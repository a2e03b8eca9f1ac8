//! Fluvial is a river-driven terrain generator for voxel worlds. Terrain is
//! never stored: every map region is regenerated on demand from the world
//! config, and comes out identical every time.
//!
//! ```no_run
//! use fluvial::{TerrainGenerator, WorldConfig};
//!
//! let generator = TerrainGenerator::new(WorldConfig::default())?;
//! let mut region = generator.generate_region(0, 0);
//! let chunk = region.take_chunk(0, 0).unwrap();
//! println!("First column: {}", chunk[0]);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## How it works
//!
//! 1. The world is tiled with a coarse, randomly jittered hex lattice. Each
//!    cell is a drainage basin.
//! 2. Each basin is flooded with a finer hex lattice of river nodes. Every
//!    node drains into a random neighbor closer to the basin's center,
//!    which makes a river forest. Flow accumulates downstream.
//! 3. River edges become Bézier segments, with bigger rivers cutting deeper.
//! 4. Segments near a region are rasterized, and a distance transform
//!    gives each column its distance to (and depth of) the nearest river.
//! 5. A piecewise-linear slope profile turns that into terrain height.
//!
//! See [WorldConfig] for everything that can be tuned.

mod config;
pub mod render;
mod util;
mod world;

pub use crate::{
    config::{
        salt, DepthCurve, Seed, SlopeInterval, StartingClimate, WorldClimate,
        WorldConfig,
    },
    render::{HeightMapRenderer, SlopeProfile, TransformSample},
    world::{
        basin::{
            climate_for, Basin, BasinCache, Climate, DrainageNetwork,
            DrainageSegment, RiverNode,
        },
        hex::{
            AxialCoord, AxialCoordIndexMap, AxialCoordMap, AxialCoordSet,
            BarycentricTriangle, CartesianPoint, HexGrid, Rect,
            NEIGHBORHOOD_SIZE,
        },
        ColumnHeight, RegionHeightMap, TerrainGenerator,
    },
};
