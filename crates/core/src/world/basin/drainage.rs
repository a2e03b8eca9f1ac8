use crate::{
    config::{salt, DepthCurve, Seed},
    world::hex::{
        AxialCoord, AxialCoordIndexMap, AxialCoordSet, CartesianPoint,
        HexGrid, Rect,
    },
};
use log::debug;
use rand::Rng;
use std::collections::VecDeque;

/// One site of the river lattice that drains into a basin
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RiverNode {
    /// Jittered site of the node's river cell
    pub position: CartesianPoint,
    /// Number of nodes (this one included) whose water passes through here.
    /// Zero for nodes outside the basin, which never make it into a network.
    pub flow: f32,
    /// The node this one drains into, if any. A node without one is an
    /// outlet.
    pub downstream: Option<AxialCoord>,
    /// Squared distance from `position` to the basin's site. Water only ever
    /// moves towards strictly smaller proximity.
    pub proximity: f64,
}

impl RiverNode {
    fn new(
        seed: Seed,
        basin: AxialCoord,
        basin_grid: &HexGrid,
        river_grid: &HexGrid,
        coord: AxialCoord,
    ) -> Self {
        let position = river_grid.jittered_site(seed, coord);
        let (distance, closest) = basin_grid.closest_site(seed, position);
        let (flow, proximity) = if closest == basin {
            (1.0, distance as f64)
        } else {
            let site = basin_grid.jittered_site(seed, basin);
            (0.0, site.distance_squared(position) as f64)
        };
        Self {
            position,
            flow,
            downstream: None,
            proximity,
        }
    }
}

/// A piece of river, as a quadratic Bézier curve from `a` to `c` pulled
/// towards `b`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DrainageSegment {
    pub a: CartesianPoint,
    pub b: CartesianPoint,
    pub c: CartesianPoint,
    /// Value rasterized along the curve. Smaller means a bigger river.
    pub depth: i32,
    /// Bounding box of the control points, which contains the whole curve
    pub bounds: Rect,
}

impl DrainageSegment {
    pub fn new(
        a: CartesianPoint,
        b: CartesianPoint,
        c: CartesianPoint,
        depth: i32,
    ) -> Self {
        Self {
            a,
            b,
            c,
            depth,
            bounds: Rect::bounding(&[a, b, c]),
        }
    }
}

/// The river forest of a single basin
#[derive(Clone, Debug)]
pub struct DrainageNetwork {
    basin: AxialCoord,
    root: AxialCoord,
    /// Every node in the basin, in discovery order
    nodes: AxialCoordIndexMap<RiverNode>,
    segments: Vec<DrainageSegment>,
}

impl DrainageNetwork {
    /// Build the network for one basin. Deterministic in `(seed, basin)`.
    pub fn build(
        seed: Seed,
        basin: AxialCoord,
        basin_grid: &HexGrid,
        river_grid: &HexGrid,
        depth_curve: DepthCurve,
    ) -> Self {
        let basin_site = basin_grid.jittered_site(seed, basin);
        let root = river_grid.cartesian_to_axial(basin_site);

        let mut nodes =
            discover_nodes(seed, basin, basin_grid, river_grid, root);
        link_downstream(seed, basin, river_grid, &mut nodes);
        accumulate_flow(&mut nodes);
        let segments = emit_segments(&nodes, depth_curve);

        debug!(
            "Basin {}: {} river nodes, {} segments",
            basin,
            nodes.len(),
            segments.len()
        );
        Self {
            basin,
            root,
            nodes,
            segments,
        }
    }

    pub fn basin(&self) -> AxialCoord {
        self.basin
    }

    /// River cell containing the basin's site
    pub fn root(&self) -> AxialCoord {
        self.root
    }

    pub fn nodes(&self) -> &AxialCoordIndexMap<RiverNode> {
        &self.nodes
    }

    pub fn segments(&self) -> &[DrainageSegment] {
        &self.segments
    }

    /// Nodes that don't drain anywhere
    pub fn outlets(&self) -> impl Iterator<Item = (&AxialCoord, &RiverNode)> {
        self.nodes.iter().filter(|(_, node)| node.downstream.is_none())
    }
}

/// Breadth-first flood over the river lattice, starting at the root. A cell
/// is kept iff its site belongs to the basin. Cells outside the basin are
/// looked at once and dropped, which bounds the search to the basin plus a
/// one-cell fringe.
fn discover_nodes(
    seed: Seed,
    basin: AxialCoord,
    basin_grid: &HexGrid,
    river_grid: &HexGrid,
    root: AxialCoord,
) -> AxialCoordIndexMap<RiverNode> {
    let mut nodes = AxialCoordIndexMap::default();
    let mut visited = AxialCoordSet::default();
    let mut queue = VecDeque::new();

    // The root belongs to the basin by definition, even when its own
    // jittered site happens to fall across the border
    let mut root_node =
        RiverNode::new(seed, basin, basin_grid, river_grid, root);
    root_node.flow = 1.0;
    nodes.insert(root, root_node);
    visited.insert(root);
    queue.push_back(root);

    while let Some(coord) = queue.pop_front() {
        for neighbor in river_grid.adjacents(coord) {
            if !visited.insert(neighbor) {
                continue;
            }
            let node =
                RiverNode::new(seed, basin, basin_grid, river_grid, neighbor);
            if node.flow > 0.0 {
                nodes.insert(neighbor, node);
                queue.push_back(neighbor);
            }
        }
    }
    nodes
}

/// Give every node a random downstream neighbor that is strictly closer to
/// the basin site. Proximity strictly decreases along every link, so the
/// result is always a forest.
fn link_downstream(
    seed: Seed,
    basin: AxialCoord,
    river_grid: &HexGrid,
    nodes: &mut AxialCoordIndexMap<RiverNode>,
) {
    let mut rng = seed.rng_at(salt::DRAINAGE, basin.q, basin.r);
    let mut candidates = Vec::with_capacity(6);
    for i in (0..nodes.len()).rev() {
        let (&coord, &node) = match nodes.get_index(i) {
            Some(entry) => entry,
            None => continue,
        };
        if node.downstream.is_some() {
            continue;
        }

        candidates.clear();
        candidates.extend(river_grid.adjacents(coord).filter(|neighbor| {
            nodes.get(neighbor).map_or(false, |other| {
                other.downstream.is_none() && other.proximity < node.proximity
            })
        }));
        if candidates.is_empty() {
            continue;
        }
        let downstream = candidates[rng.gen_range(0..candidates.len())];
        if let Some((_, node)) = nodes.get_index_mut(i) {
            node.downstream = Some(downstream);
        }
    }
}

/// Push every node's flow into its downstream node. Visiting in descending
/// proximity is a topological order of the forest, so a node's flow is final
/// by the time it is pushed.
fn accumulate_flow(nodes: &mut AxialCoordIndexMap<RiverNode>) {
    let mut order: Vec<(usize, f64)> = nodes
        .values()
        .map(|node| node.proximity)
        .enumerate()
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (i, _) in order {
        let node = match nodes.get_index(i) {
            Some((_, node)) => *node,
            None => continue,
        };
        if let Some(downstream) = node.downstream {
            match nodes.get_mut(&downstream) {
                Some(downstream) => downstream.flow += node.flow,
                None => panic!(
                    "river node {:?} drains into missing node {}",
                    node, downstream
                ),
            }
        }
    }
}

/// One segment per chain of three nodes `N -> D -> F`. The curve runs from
/// `N` (or halfway to `D` when `N` is itself a confluence) through `D` to
/// the midpoint of `D` and `F`, so consecutive segments join smoothly.
fn emit_segments(
    nodes: &AxialCoordIndexMap<RiverNode>,
    depth_curve: DepthCurve,
) -> Vec<DrainageSegment> {
    nodes
        .values()
        .filter_map(|node| {
            let down = nodes.get(&node.downstream?)?;
            let further = nodes.get(&down.downstream?)?;
            let a = if node.flow > 1.0 {
                node.position.midpoint(down.position)
            } else {
                node.position
            };
            Some(DrainageSegment::new(
                a,
                down.position,
                down.position.midpoint(further.position),
                depth_curve.depth(node.flow),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::world::hex::AxialCoordMap;

    fn build(seed: u64, basin: AxialCoord) -> DrainageNetwork {
        let config = WorldConfig::default();
        let basin_grid =
            HexGrid::new(config.scaled_basin_cell_height(), salt::BASIN_GRID);
        let river_grid =
            HexGrid::new(config.scaled_river_cell_height(), salt::RIVER_GRID);
        DrainageNetwork::build(
            Seed(seed),
            basin,
            &basin_grid,
            &river_grid,
            config.depth_curve,
        )
    }

    #[test]
    fn test_membership() {
        let config = WorldConfig::default();
        let basin_grid =
            HexGrid::new(config.scaled_basin_cell_height(), salt::BASIN_GRID);
        let basin = AxialCoord::new(1, -2);
        let network = build(7, basin);
        assert!(network.nodes().len() > 100);
        assert_eq!(
            network.nodes().keys().next().copied(),
            Some(network.root())
        );
        for (coord, node) in network.nodes() {
            assert!(node.flow >= 1.0, "{} has no flow", coord);
            if *coord != network.root() {
                assert_eq!(
                    basin_grid.closest_site(Seed(7), node.position).1,
                    basin
                );
            }
        }
    }

    #[test]
    fn test_forest_invariant() {
        let network = build(42, AxialCoord::new(0, 0));
        let nodes = network.nodes();
        for (start, _) in nodes {
            let mut current = *start;
            let mut steps = 0;
            while let Some(downstream) = nodes[&current].downstream {
                assert!(
                    nodes[&downstream].proximity < nodes[&current].proximity
                );
                current = downstream;
                steps += 1;
                assert!(steps <= nodes.len(), "cycle through {}", start);
            }
        }
    }

    #[test]
    fn test_flow_conservation() {
        let network = build(42, AxialCoord::new(-1, 3));
        let nodes = network.nodes();
        let mut upstream_flow: AxialCoordMap<f32> = AxialCoordMap::default();
        for node in nodes.values() {
            if let Some(downstream) = node.downstream {
                *upstream_flow.entry(downstream).or_default() += node.flow;
            }
        }
        for (coord, node) in nodes {
            let expected =
                1.0 + upstream_flow.get(coord).copied().unwrap_or_default();
            assert_eq!(node.flow, expected, "flow mismatch at {}", coord);
        }
        // Every node ends up in exactly one outlet's total
        let total: f32 = network.outlets().map(|(_, node)| node.flow).sum();
        assert_eq!(total, nodes.len() as f32);
    }

    #[test]
    fn test_segments() {
        let network = build(3, AxialCoord::new(2, 2));
        let nodes = network.nodes();
        assert!(!network.segments().is_empty());
        let chains = nodes
            .values()
            .filter(|node| {
                node.downstream
                    .and_then(|d| nodes[&d].downstream)
                    .is_some()
            })
            .count();
        assert_eq!(network.segments().len(), chains);
        for segment in network.segments() {
            assert!(segment.depth >= 0 && segment.depth <= 100);
            assert!(segment.bounds.contains(segment.a.x, segment.a.z));
            assert!(segment.bounds.contains(segment.b.x, segment.b.z));
            assert!(segment.bounds.contains(segment.c.x, segment.c.z));
        }
        // Headwater streams get the full depth
        assert!(network.segments().iter().any(|segment| segment.depth == 94));
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = build(42, AxialCoord::new(1, 1));
        let b = build(42, AxialCoord::new(1, 1));
        assert_eq!(a.nodes(), b.nodes());
        assert_eq!(a.segments(), b.segments());

        let c = build(43, AxialCoord::new(1, 1));
        assert_ne!(a.segments(), c.segments());
    }
}
