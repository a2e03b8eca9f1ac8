use crate::world::{basin::Climate, hex::AxialCoordIndexMap};
use derive_more::Display;
use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Height data for one block column, packed into 16 bits: terrain height in
/// the low 9 bits, water depth above the terrain in the high 7.
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
#[display(fmt = "{}+{}", "self.terrain_height()", "self.water_depth()")]
#[serde(transparent)]
pub struct ColumnHeight(pub u16);

impl ColumnHeight {
    pub const WATER_SHIFT: u32 = 9;
    pub const TERRAIN_MASK: u16 = (1 << Self::WATER_SHIFT) - 1;
    pub const MAX_WATER_DEPTH: i32 = 127;
    /// Terrain never gets closer than this to the bottom or top of the world
    pub const WORLD_PADDING: i32 = 3;

    /// Pack a column. Terrain is clamped into the world (with padding on
    /// both ends), water depth into what 7 bits can hold.
    pub fn new(
        terrain_height: i32,
        water_depth: i32,
        world_height: i32,
    ) -> Self {
        let terrain = terrain_height
            .max(Self::WORLD_PADDING)
            .min(world_height - Self::WORLD_PADDING);
        let water = water_depth.max(0).min(Self::MAX_WATER_DEPTH);
        Self(((water as u16) << Self::WATER_SHIFT) | terrain as u16)
    }

    pub fn terrain_height(self) -> i32 {
        (self.0 & Self::TERRAIN_MASK) as i32
    }

    pub fn water_depth(self) -> i32 {
        (self.0 >> Self::WATER_SHIFT) as i32
    }

    /// Y level of the top of the water, or of the terrain if there is none
    pub fn surface_height(self) -> i32 {
        self.terrain_height() + self.water_depth()
    }
}

/// Generated heights for every column of one map region, split into chunks.
/// Chunks are keyed by their position within the region, columns within a
/// chunk are row-major (`z * chunk_size + x`).
#[derive(Clone, Debug, Serialize)]
pub struct RegionHeightMap {
    region_x: i32,
    region_z: i32,
    chunk_size: i32,
    #[serde(serialize_with = "crate::util::map_to_vec_serde::serialize")]
    chunks: IndexMap<(i32, i32), Vec<ColumnHeight>, FnvBuildHasher>,
    /// Climate of every basin that shaped this region
    #[serde(serialize_with = "crate::util::map_to_vec_serde::serialize")]
    climates: AxialCoordIndexMap<Climate>,
}

impl RegionHeightMap {
    pub(crate) fn new(
        region_x: i32,
        region_z: i32,
        chunk_size: i32,
        chunks: IndexMap<(i32, i32), Vec<ColumnHeight>, FnvBuildHasher>,
        climates: AxialCoordIndexMap<Climate>,
    ) -> Self {
        Self {
            region_x,
            region_z,
            chunk_size,
            chunks,
            climates,
        }
    }

    pub fn region_x(&self) -> i32 {
        self.region_x
    }

    pub fn region_z(&self) -> i32 {
        self.region_z
    }

    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    /// Number of chunks that haven't been taken yet
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(
        &self,
    ) -> impl Iterator<Item = ((i32, i32), &[ColumnHeight])> {
        self.chunks
            .iter()
            .map(|(position, columns)| (*position, columns.as_slice()))
    }

    pub fn chunk(&self, chunk_x: i32, chunk_z: i32) -> Option<&[ColumnHeight]> {
        self.chunks.get(&(chunk_x, chunk_z)).map(Vec::as_slice)
    }

    /// Remove a chunk's columns from the map, handing ownership to the caller.
    /// Each chunk can only be taken once.
    pub fn take_chunk(
        &mut self,
        chunk_x: i32,
        chunk_z: i32,
    ) -> Option<Vec<ColumnHeight>> {
        self.chunks.swap_remove(&(chunk_x, chunk_z))
    }

    /// A single column, by block position relative to the region's corner
    pub fn column(&self, x: i32, z: i32) -> Option<ColumnHeight> {
        let chunk = self.chunk(
            x.div_euclid(self.chunk_size),
            z.div_euclid(self.chunk_size),
        )?;
        let index = z.rem_euclid(self.chunk_size) * self.chunk_size
            + x.rem_euclid(self.chunk_size);
        chunk.get(index as usize).copied()
    }

    pub fn climates(&self) -> &AxialCoordIndexMap<Climate> {
        &self.climates
    }

    /// Serialize into JSON. Chunks and climates are written as lists of
    /// `[key, value]` pairs.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> String {
        // Panic here indicates an internal bug in the data format
        serde_json::to_string(self).expect("error serializing region")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_packing() {
        let column = ColumnHeight::new(120, 5, 256);
        assert_eq!(column.0, 5 << 9 | 120);
        assert_eq!(column.terrain_height(), 120);
        assert_eq!(column.water_depth(), 5);
        assert_eq!(column.surface_height(), 125);
        assert_eq!(column.to_string(), "120+5");
    }

    #[test]
    fn test_column_clamping() {
        assert_eq!(ColumnHeight::new(-40, 0, 256).terrain_height(), 3);
        assert_eq!(ColumnHeight::new(9000, 0, 256).terrain_height(), 253);
        assert_eq!(ColumnHeight::new(600, 0, 512).terrain_height(), 509);
        assert_eq!(ColumnHeight::new(100, -3, 256).water_depth(), 0);
        let deep = ColumnHeight::new(100, 400, 256);
        assert_eq!(deep.water_depth(), 127);
        assert_eq!(deep.terrain_height(), 100);
    }

    #[test]
    fn test_take_chunk() {
        let mut chunks = IndexMap::default();
        chunks.insert((0, 0), vec![ColumnHeight(1); 4]);
        chunks.insert((1, 0), vec![ColumnHeight(2); 4]);
        let mut map = RegionHeightMap::new(
            3,
            -1,
            2,
            chunks,
            AxialCoordIndexMap::default(),
        );
        assert_eq!(map.column(3, 1), Some(ColumnHeight(2)));
        assert_eq!(map.column(0, 2), None);

        assert_eq!(map.take_chunk(1, 0), Some(vec![ColumnHeight(2); 4]));
        assert_eq!(map.take_chunk(1, 0), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.column(3, 1), None);
    }

    #[test]
    fn test_serialize() {
        let mut chunks = IndexMap::default();
        chunks.insert((0, 1), vec![ColumnHeight::new(10, 1, 256)]);
        let map = RegionHeightMap::new(
            0,
            0,
            1,
            chunks,
            AxialCoordIndexMap::default(),
        );
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            concat!(
                r#"{"region_x":0,"region_z":0,"chunk_size":1,"#,
                r#""chunks":[[[0,1],[522]]],"climates":[]}"#
            )
        );
    }
}
