//! A basin is one cell of the coarse hex lattice, and the catchment of one
//! river forest. Everything about a basin is derived from its coordinate
//! and the world seed, so basins are never stored, only their built
//! drainage networks (see [BasinCache]).

mod cache;
mod climate;
mod drainage;

pub use self::{cache::*, climate::*, drainage::*};
use crate::{
    config::{DepthCurve, Seed, WorldConfig},
    world::hex::{AxialCoord, AxialCoordIndexMap, HexGrid},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Basin {
    pub coord: AxialCoord,
}

impl Basin {
    pub fn new(coord: AxialCoord) -> Self {
        Self { coord }
    }

    /// Climate of this basin and its 18 closest neighbors, in neighbor table
    /// order (this basin first)
    pub fn climates(
        &self,
        seed: Seed,
        basin_grid: &HexGrid,
        config: &WorldConfig,
    ) -> AxialCoordIndexMap<Climate> {
        basin_grid
            .neighborhood(self.coord)
            .map(|coord| (coord, climate_for(seed, config, basin_grid, coord)))
            .collect()
    }

    pub fn build_drainage_network(
        &self,
        seed: Seed,
        basin_grid: &HexGrid,
        river_grid: &HexGrid,
        depth_curve: DepthCurve,
    ) -> DrainageNetwork {
        DrainageNetwork::build(
            seed,
            self.coord,
            basin_grid,
            river_grid,
            depth_curve,
        )
    }
}
