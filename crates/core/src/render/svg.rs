use crate::{
    world::{basin::DrainageNetwork, hex::Rect},
    WorldConfig,
};
use svg::{
    node::{
        element::{path::Data, Circle, Group, Path, Rectangle},
        Comment,
    },
    Document,
};

const RIVER_COLOR: &str = "#48c0f0";
const SITE_COLOR: &str = "#1d5e7a";
const FRAME_COLOR: &str = "#e05050";

/// Thickest stroke, used for rivers that have reached zero depth
const MAX_STROKE_WIDTH: f64 = 24.0;
const MIN_STROKE_WIDTH: f64 = 2.0;

/// Render drainage networks as a 2D top-down SVG. One group per basin, one
/// quadratic path per segment. If `frame` is given, it's outlined on top so
/// you can see which part of the networks a region used.
pub fn networks_to_svg<'a>(
    config: &WorldConfig,
    networks: impl IntoIterator<Item = &'a DrainageNetwork>,
    frame: Option<Rect>,
) -> Document {
    let networks: Vec<&DrainageNetwork> = networks.into_iter().collect();
    let max_depth = networks
        .iter()
        .flat_map(|network| network.segments())
        .map(|segment| segment.depth)
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let mut bounds: Option<Rect> = frame;
    let mut document = Document::new()
        .add(Comment::new(format!("\n{:#?}\n", config)));
    for network in &networks {
        for segment in network.segments() {
            bounds = Some(match bounds {
                None => segment.bounds,
                Some(rect) => Rect::new(
                    rect.x1.min(segment.bounds.x1),
                    rect.z1.min(segment.bounds.z1),
                    rect.x2.max(segment.bounds.x2),
                    rect.z2.max(segment.bounds.z2),
                ),
            });
        }
        document = document.add(draw_network(network, max_depth));
    }

    if let Some(frame) = frame {
        document = document.add(
            Rectangle::new()
                .set("x", frame.x1)
                .set("y", frame.z1)
                .set("width", frame.width())
                .set("height", frame.depth())
                .set("fill", "none")
                .set("stroke", FRAME_COLOR)
                .set("stroke-width", MIN_STROKE_WIDTH),
        );
    }

    let view_box = bounds.unwrap_or_else(|| Rect::new(0, 0, 1, 1));
    document.set(
        "viewBox",
        (view_box.x1, view_box.z1, view_box.width(), view_box.depth()),
    )
}

fn draw_network(network: &DrainageNetwork, max_depth: f64) -> Group {
    let mut group = Group::new()
        .set("stroke", RIVER_COLOR)
        .set("stroke-linecap", "round")
        .set("fill", "none")
        .add(Comment::new(format!("basin {}", network.basin())));

    for segment in network.segments() {
        // Shallower depth means more water
        let width = MIN_STROKE_WIDTH
            + (MAX_STROKE_WIDTH - MIN_STROKE_WIDTH)
                * (1.0 - segment.depth as f64 / max_depth);
        let data = Data::new()
            .move_to((segment.a.x, segment.a.z))
            .quadratic_curve_to((
                segment.b.x,
                segment.b.z,
                segment.c.x,
                segment.c.z,
            ));
        group = group.add(
            Path::new()
                .set("d", data)
                .set("stroke-width", width.round()),
        );
    }

    if let Some(root) = network.nodes().get(&network.root()) {
        group = group.add(
            Circle::new()
                .set("cx", root.position.x)
                .set("cy", root.position.z)
                .set("r", MAX_STROKE_WIDTH)
                .set("fill", SITE_COLOR)
                .set("stroke", "none"),
        );
    }
    group
}
