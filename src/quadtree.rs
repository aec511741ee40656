//! Quad-tree tile coverage rendering.
//!
//! The tiler writes one file per quad-tree node; a child tile's filename is
//! its parent's name with the quadrant digit appended (`node`, `node0`,
//! `node03`, ...). Quadrants are numbered 0 north-west, 1 north-east,
//! 2 south-west, 3 south-east.
//!
//! This module walks the on-disk hierarchy and draws one stroked rectangle
//! per present tile into an SVG document, colored from red at the root to
//! green at depth 10, which gives a quick visual of how deep the tree was
//! subdivided where.

use std::path::{Path, PathBuf};

use log::{debug, info};
use svg::node::element;
use svg::Document;

use crate::Result;

/// Geographic bounds of a tile in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lng_min: f64,
    pub lng_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

/// The whole globe, the bounds of the root tile.
pub const WORLD: Bounds = Bounds {
    lng_min: -180.0,
    lng_max: 180.0,
    lat_min: -90.0,
    lat_max: 90.0,
};

impl Bounds {
    /// Bounds of the child tile in the given quadrant (0..=3).
    pub fn quadrant(self, quadrant: u8) -> Bounds {
        let lng_mid = (self.lng_min + self.lng_max) / 2.0;
        let lat_mid = (self.lat_min + self.lat_max) / 2.0;
        match quadrant {
            0 => Bounds { lng_max: lng_mid, lat_min: lat_mid, ..self },
            1 => Bounds { lng_min: lng_mid, lat_min: lat_mid, ..self },
            2 => Bounds { lng_max: lng_mid, lat_max: lat_mid, ..self },
            3 => Bounds { lng_min: lng_mid, lat_max: lat_mid, ..self },
            _ => unreachable!("quadrant out of range"),
        }
    }
}

/// A tile present on disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub depth: u32,
    pub bounds: Bounds,
}

fn child_path(path: &Path, quadrant: u8) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(quadrant.to_string());
    PathBuf::from(name)
}

fn visit(path: &Path, bounds: Bounds, depth: u32, max_depth: u32, tiles: &mut Vec<Tile>) {
    if !path.is_file() {
        return;
    }
    debug!("found tile {} at depth {}", path.display(), depth);
    tiles.push(Tile { depth, bounds });
    if depth >= max_depth {
        return;
    }
    for quadrant in 0..4 {
        visit(
            &child_path(path, quadrant),
            bounds.quadrant(quadrant),
            depth + 1,
            max_depth,
            tiles,
        );
    }
}

/// Collects all tiles reachable from the root tile file `base`.
///
/// Recursion stops at missing files and at `max_depth`, so the walk is
/// bounded even for degenerate hierarchies.
pub fn collect_tiles(base: &Path, max_depth: u32) -> Vec<Tile> {
    let mut tiles = Vec::new();
    visit(base, WORLD, 0, max_depth, &mut tiles);
    tiles
}

/// Stroke color for a tile: red at the root fading to green at depth 10.
fn depth_color(depth: u32) -> String {
    let t = (depth.min(10)) as f64 / 10.0;
    format!(
        "#{:02x}{:02x}00",
        (255.0 * (1.0 - t)).round() as u8,
        (255.0 * t).round() as u8
    )
}

/// Renders tiles into an SVG document, one stroked rectangle each.
///
/// Rectangles are drawn in geographic coordinates; a single group transform
/// maps them onto the viewport with the y axis flipped so north is up.
pub fn render_coverage(tiles: &[Tile], scale: f64) -> Document {
    let width = 360.0 * scale + 1.0;
    let height = 180.0 * scale + 1.0;
    let document = Document::new().set("viewBox", (0.0, 0.0, width, height));

    // svg transformations are applied from right to left
    let mut group = element::Group::new()
        .set(
            "transform",
            format!("scale({0} -{0}) translate(180 -90)", scale),
        )
        .set("fill", "none")
        .set("stroke-width", format!("{:.4}", 20.0 / 180.0));

    for tile in tiles {
        let b = tile.bounds;
        let rect = element::Rectangle::new()
            .set("x", b.lng_min)
            .set("y", b.lat_min)
            .set("width", b.lng_max - b.lng_min)
            .set("height", b.lat_max - b.lat_min)
            .set("stroke", depth_color(tile.depth));
        group = group.add(rect);
    }
    document.add(group)
}

/// Walks the hierarchy under `base` and writes the coverage image.
pub fn render_coverage_file(base: &Path, max_depth: u32, scale: f64, output: &Path) -> Result<()> {
    let tiles = collect_tiles(base, max_depth);
    info!("rendering {} tiles to {}", tiles.len(), output.display());
    let document = render_coverage(&tiles, scale);
    svg::save(output, &document)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn quadrants_partition_the_parent() {
        let nw = WORLD.quadrant(0);
        assert_eq!(
            nw,
            Bounds {
                lng_min: -180.0,
                lng_max: 0.0,
                lat_min: 0.0,
                lat_max: 90.0
            }
        );
        let se = WORLD.quadrant(3);
        assert_eq!(
            se,
            Bounds {
                lng_min: 0.0,
                lng_max: 180.0,
                lat_min: -90.0,
                lat_max: 0.0
            }
        );
        // second level: south-west of north-east
        let sw_of_ne = WORLD.quadrant(1).quadrant(2);
        assert_eq!(
            sw_of_ne,
            Bounds {
                lng_min: 0.0,
                lng_max: 90.0,
                lat_min: 0.0,
                lat_max: 45.0
            }
        );
    }

    #[test]
    fn depth_colors_fade_from_red_to_green() {
        assert_eq!(depth_color(0), "#ff0000");
        assert_eq!(depth_color(5), "#808000");
        assert_eq!(depth_color(10), "#00ff00");
        // clamped beyond depth 10
        assert_eq!(depth_color(25), "#00ff00");
    }

    #[test]
    fn collects_only_present_tiles_up_to_max_depth() {
        let dir = std::env::temp_dir().join(format!("osmtools-quadtree-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let base = dir.join("node");
        for name in ["node", "node0", "node03", "node030", "node2"] {
            fs::write(dir.join(name), b"").unwrap();
        }
        // orphan without a parent chain is never reached
        fs::write(dir.join("node13"), b"").unwrap();

        let tiles = collect_tiles(&base, 10);
        let mut depths: Vec<_> = tiles.iter().map(|t| t.depth).collect();
        depths.sort_unstable();
        assert_eq!(depths, vec![0, 1, 1, 2, 3]);

        let shallow = collect_tiles(&base, 1);
        assert_eq!(shallow.len(), 3);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn writes_the_coverage_image() {
        let dir = std::env::temp_dir().join(format!("osmtools-coverage-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["node", "node1"] {
            fs::write(dir.join(name), b"").unwrap();
        }
        let out = dir.join("coverage.svg");
        render_coverage_file(&dir.join("node"), 4, 10.0, &out).unwrap();

        let doc = fs::read_to_string(&out).unwrap();
        assert_eq!(doc.matches("<rect").count(), 2);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn renders_one_rect_per_tile() {
        let tiles = vec![
            Tile { depth: 0, bounds: WORLD },
            Tile { depth: 1, bounds: WORLD.quadrant(2) },
        ];
        let doc = render_coverage(&tiles, 10.0).to_string();
        assert_eq!(doc.matches("<rect").count(), 2);
        assert!(doc.contains("stroke=\"#ff0000\""));
        assert!(doc.contains("translate(180 -90)"));
    }
}
