//! TerrainField: destructible binary solid/empty mask.
//!
//! Cell `(x, y)` covers the unit square `[x, x+1) × [y, y+1)` in world space.
//! Row 0 is the top of the map; y grows downward.

use bombsite_core::enums::Cell;
use bombsite_core::error::MapConstructionError;
use bombsite_core::state::TerrainRows;
use bombsite_core::types::{CellCoord, DVec2};

const WORD_BITS: usize = 64;

/// Packed terrain mask with an incrementally maintained solid count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainField {
    width: u32,
    height: u32,
    words_per_row: usize,
    /// Row-major bit words, least significant bit = lowest column.
    bits: Vec<u64>,
    solid_count: usize,
}

impl TerrainField {
    /// An all-empty field.
    pub fn empty(width: u32, height: u32) -> Result<Self, MapConstructionError> {
        if width == 0 || height == 0 {
            return Err(MapConstructionError::EmptyTerrain { width, height });
        }
        let words_per_row = (width as usize).div_ceil(WORD_BITS);
        Ok(Self {
            width,
            height,
            words_per_row,
            bits: vec![0; words_per_row * height as usize],
            solid_count: 0,
        })
    }

    /// Build from a row-major flat mask (`true` = solid).
    pub fn from_mask(width: u32, height: u32, mask: &[bool]) -> Result<Self, MapConstructionError> {
        let mut field = Self::empty(width, height)?;
        let expected = width as usize * height as usize;
        if mask.len() != expected {
            return Err(MapConstructionError::MaskSizeMismatch {
                expected,
                actual: mask.len(),
            });
        }
        for (i, &solid) in mask.iter().enumerate() {
            if solid {
                let x = (i % width as usize) as u32;
                let y = (i / width as usize) as u32;
                field.set(x, y, true);
            }
        }
        Ok(field)
    }

    /// Build from per-column surface rows: column `x` is solid from row
    /// `surface[x]` down to the bottom. A surface at or past `height` leaves the
    /// column empty.
    pub fn from_heightfield(
        width: u32,
        height: u32,
        surface: &[u32],
    ) -> Result<Self, MapConstructionError> {
        let mut field = Self::empty(width, height)?;
        if surface.len() != width as usize {
            return Err(MapConstructionError::HeightfieldWidth {
                expected: width as usize,
                actual: surface.len(),
            });
        }
        for (x, &top) in surface.iter().enumerate() {
            for y in top.min(height)..height {
                field.set(x as u32, y, true);
            }
        }
        Ok(field)
    }

    /// Build from ASCII art: `#` is solid, anything else is empty. Blank
    /// leading and trailing lines are ignored.
    pub fn from_ascii(art: &str) -> Result<Self, MapConstructionError> {
        let rows: Vec<&str> = art
            .lines()
            .map(str::trim_end)
            .skip_while(|l| l.is_empty())
            .collect();
        let rows: Vec<&str> = match rows.iter().rposition(|l| !l.is_empty()) {
            Some(last) => rows[..=last].to_vec(),
            None => Vec::new(),
        };
        let width = rows.first().map_or(0, |r| r.chars().count());
        for (i, row) in rows.iter().enumerate() {
            let actual = row.chars().count();
            if actual != width {
                return Err(MapConstructionError::RaggedRows {
                    row: i,
                    expected: width,
                    actual,
                });
            }
        }
        let mut field = Self::empty(width as u32, rows.len() as u32)?;
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    field.set(x as u32, y as u32, true);
                }
            }
        }
        Ok(field)
    }

    /// Rebuild from a packed-row export.
    pub fn from_rows(rows: &TerrainRows) -> Result<Self, MapConstructionError> {
        let mut field = Self::empty(rows.width, rows.height)?;
        if rows.rows.len() != rows.height as usize {
            return Err(MapConstructionError::MaskSizeMismatch {
                expected: rows.height as usize,
                actual: rows.rows.len(),
            });
        }
        for (y, row) in rows.rows.iter().enumerate() {
            if row.len() != field.words_per_row {
                return Err(MapConstructionError::RaggedRows {
                    row: y,
                    expected: field.words_per_row,
                    actual: row.len(),
                });
            }
            for x in 0..field.width {
                let word = row[x as usize / WORD_BITS];
                if word & (1 << (x as usize % WORD_BITS)) != 0 {
                    field.set(x, y as u32, true);
                }
            }
        }
        Ok(field)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn solid_count(&self) -> usize {
        self.solid_count
    }

    /// Contents of the cell containing `point`. Outside the grid is Empty.
    pub fn query(&self, point: DVec2) -> Cell {
        if self.is_solid(point) {
            Cell::Solid
        } else {
            Cell::Empty
        }
    }

    pub fn is_solid(&self, point: DVec2) -> bool {
        if !point.x.is_finite() || !point.y.is_finite() {
            return false;
        }
        self.is_solid_cell(point.x.floor() as i64, point.y.floor() as i64)
    }

    /// Solidity by integer cell address. Outside the grid is empty.
    pub fn is_solid_cell(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.get(x as u32, y as u32)
    }

    /// Top-most solid row in column `x`.
    pub fn surface_y(&self, x: u32) -> Option<u32> {
        if x >= self.width {
            return None;
        }
        (0..self.height).find(|&y| self.get(x, y))
    }

    /// Remove every solid cell whose centre lies within `radius` of `center`.
    /// Returns exactly the cells that changed, in row-major order.
    pub fn carve_circle(&mut self, center: DVec2, radius: f64) -> Vec<CellCoord> {
        self.paint_circle(center, radius, false)
    }

    /// Fill every empty cell whose centre lies within `radius` of `center`.
    /// Returns exactly the cells that changed, in row-major order.
    pub fn deposit_circle(&mut self, center: DVec2, radius: f64) -> Vec<CellCoord> {
        self.paint_circle(center, radius, true)
    }

    /// Whether any solid cell intersects the open disc at `center`.
    pub fn overlaps_circle(&self, center: DVec2, radius: f64) -> bool {
        let Some((x0, y0, x1, y1)) = self.cell_bounds(center, radius) else {
            return false;
        };
        let r2 = radius * radius;
        for y in y0..=y1 {
            for x in x0..=x1 {
                if self.get(x, y) && dist2_to_cell(center, x, y) < r2 {
                    return true;
                }
            }
        }
        false
    }

    /// Outward surface normal for a disc touching the terrain: the normalised sum
    /// of directions from nearby solid cells to the centre. Returns straight up
    /// when the contributions cancel or the centre is buried.
    pub fn contact_normal(&self, center: DVec2, radius: f64) -> DVec2 {
        let reach = radius + 1.0;
        let mut sum = DVec2::ZERO;
        if let Some((x0, y0, x1, y1)) = self.cell_bounds(center, reach) {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    if !self.get(x, y) {
                        continue;
                    }
                    let away = center - closest_point_in_cell(center, x, y);
                    let d = away.length();
                    if d > 1e-9 && d < reach {
                        sum += away / d * (reach - d);
                    }
                }
            }
        }
        sum.try_normalize().unwrap_or(DVec2::new(0.0, -1.0))
    }

    /// Whether `point` lies inside the world extent, which reaches `sky_margin`
    /// cells above the top row.
    pub fn in_extent(&self, point: DVec2, sky_margin: f64) -> bool {
        point.x.is_finite()
            && point.y.is_finite()
            && point.x >= 0.0
            && point.x < self.width as f64
            && point.y >= -sky_margin
            && point.y < self.height as f64
    }

    /// Export the mask packed one bit per cell.
    pub fn to_rows(&self) -> TerrainRows {
        TerrainRows {
            width: self.width,
            height: self.height,
            rows: self
                .bits
                .chunks(self.words_per_row)
                .map(<[u64]>::to_vec)
                .collect(),
        }
    }

    fn paint_circle(&mut self, center: DVec2, radius: f64, solid: bool) -> Vec<CellCoord> {
        let mut changed = Vec::new();
        let Some((x0, y0, x1, y1)) = self.cell_bounds(center, radius) else {
            return changed;
        };
        let r2 = radius * radius;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let cell = CellCoord::new(x, y);
                if self.get(x, y) != solid && cell.center().distance_squared(center) <= r2 {
                    self.set(x, y, solid);
                    changed.push(cell);
                }
            }
        }
        changed
    }

    /// Inclusive cell range covering the disc's bounding box, clipped to the grid.
    fn cell_bounds(&self, center: DVec2, radius: f64) -> Option<(u32, u32, u32, u32)> {
        if !center.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return None;
        }
        let clip = |v: f64, max: u32| -> i64 { (v.floor() as i64).clamp(-1, max as i64) };
        let x0 = clip(center.x - radius, self.width);
        let x1 = clip(center.x + radius, self.width);
        let y0 = clip(center.y - radius, self.height);
        let y1 = clip(center.y + radius, self.height);
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.width as i64 - 1);
        let y1 = y1.min(self.height as i64 - 1);
        if x0 > x1 || y0 > y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    fn index(&self, x: u32, y: u32) -> (usize, u64) {
        debug_assert!(x < self.width && y < self.height, "cell ({x}, {y}) out of range");
        let word = y as usize * self.words_per_row + x as usize / WORD_BITS;
        (word, 1 << (x as usize % WORD_BITS))
    }

    fn get(&self, x: u32, y: u32) -> bool {
        let (word, mask) = self.index(x, y);
        self.bits[word] & mask != 0
    }

    fn set(&mut self, x: u32, y: u32, solid: bool) {
        let (word, mask) = self.index(x, y);
        let was = self.bits[word] & mask != 0;
        if was == solid {
            return;
        }
        if solid {
            self.bits[word] |= mask;
            self.solid_count += 1;
        } else {
            self.bits[word] &= !mask;
            self.solid_count -= 1;
        }
    }
}

fn closest_point_in_cell(p: DVec2, x: u32, y: u32) -> DVec2 {
    let min = DVec2::new(x as f64, y as f64);
    p.clamp(min, min + DVec2::ONE)
}

fn dist2_to_cell(p: DVec2, x: u32, y: u32) -> f64 {
    p.distance_squared(closest_point_in_cell(p, x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32, ground: u32) -> TerrainField {
        TerrainField::from_heightfield(width, height, &vec![ground; width as usize]).unwrap()
    }

    #[test]
    fn test_empty_extent_rejected() {
        assert!(matches!(
            TerrainField::empty(0, 10),
            Err(MapConstructionError::EmptyTerrain { .. })
        ));
        assert!(TerrainField::from_ascii("\n\n").is_err());
    }

    #[test]
    fn test_mask_size_mismatch() {
        assert!(matches!(
            TerrainField::from_mask(4, 4, &[true; 15]),
            Err(MapConstructionError::MaskSizeMismatch {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn test_from_ascii() {
        let field = TerrainField::from_ascii(
            "
....
.##.
####
",
        )
        .unwrap();
        assert_eq!((field.width(), field.height()), (4, 3));
        assert_eq!(field.solid_count(), 6);
        assert_eq!(field.query(DVec2::new(1.5, 1.5)), Cell::Solid);
        assert_eq!(field.query(DVec2::new(0.5, 1.5)), Cell::Empty);
        assert_eq!(field.surface_y(0), Some(2));
        assert_eq!(field.surface_y(2), Some(1));
    }

    #[test]
    fn test_ragged_ascii_rejected() {
        assert!(matches!(
            TerrainField::from_ascii("###\n##\n"),
            Err(MapConstructionError::RaggedRows { row: 1, .. })
        ));
    }

    #[test]
    fn test_query_outside_is_empty() {
        let field = flat(10, 10, 0);
        assert_eq!(field.solid_count(), 100);
        assert_eq!(field.query(DVec2::new(-0.5, 5.0)), Cell::Empty);
        assert_eq!(field.query(DVec2::new(5.0, 10.0)), Cell::Empty);
        assert_eq!(field.query(DVec2::new(f64::NAN, 1.0)), Cell::Empty);
    }

    #[test]
    fn test_carve_reports_changed_cells() {
        let mut field = flat(40, 40, 20);
        let before = field.solid_count();
        let removed = field.carve_circle(DVec2::new(20.0, 20.0), 5.0);
        assert!(!removed.is_empty());
        assert_eq!(field.solid_count(), before - removed.len());
        for c in &removed {
            assert!(c.y >= 20, "carved a cell that was never solid: {c:?}");
            assert!(c.center().distance(DVec2::new(20.0, 20.0)) <= 5.0);
            assert!(!field.is_solid(c.center()));
        }
    }

    #[test]
    fn test_carve_idempotent() {
        let mut once = flat(40, 40, 20);
        once.carve_circle(DVec2::new(15.0, 22.0), 6.5);
        let mut twice = once.clone();
        let second = twice.carve_circle(DVec2::new(15.0, 22.0), 6.5);
        assert!(second.is_empty());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_carve_never_increases_solid_count() {
        let mut field = flat(64, 64, 30);
        let mut prev = field.solid_count();
        for i in 0..20 {
            let c = DVec2::new((i * 7 % 64) as f64, 25.0 + (i % 5) as f64 * 3.0);
            field.carve_circle(c, 1.0 + (i % 4) as f64 * 2.5);
            assert!(field.solid_count() <= prev);
            prev = field.solid_count();
        }
    }

    #[test]
    fn test_carve_clips_at_boundary() {
        let mut field = flat(10, 10, 0);
        let removed = field.carve_circle(DVec2::new(0.0, 0.0), 3.0);
        assert!(!removed.is_empty());
        assert!(removed.iter().all(|c| c.x < 10 && c.y < 10));
        assert!(field.carve_circle(DVec2::new(-50.0, -50.0), 3.0).is_empty());
    }

    #[test]
    fn test_deposit_adds_only_empty_cells() {
        let mut field = flat(30, 30, 20);
        let before = field.solid_count();
        let added = field.deposit_circle(DVec2::new(15.0, 20.0), 4.0);
        assert_eq!(field.solid_count(), before + added.len());
        assert!(added.iter().all(|c| c.y < 20));
        assert!(field.deposit_circle(DVec2::new(15.0, 20.0), 4.0).is_empty());
    }

    #[test]
    fn test_overlaps_circle() {
        let field = flat(20, 20, 10);
        assert!(!field.overlaps_circle(DVec2::new(10.0, 5.0), 4.0));
        assert!(field.overlaps_circle(DVec2::new(10.0, 7.0), 4.0));
        // Touching exactly is not overlapping.
        assert!(!field.overlaps_circle(DVec2::new(10.0, 6.0), 4.0));
    }

    #[test]
    fn test_contact_normal_flat_ground_points_up() {
        let field = flat(20, 20, 10);
        let n = field.contact_normal(DVec2::new(10.0, 7.5), 3.0);
        assert!(n.y < -0.99, "expected up normal, got {n}");
    }

    #[test]
    fn test_contact_normal_wall_points_away() {
        let field = TerrainField::from_ascii(
            "
.....##
.....##
.....##
.....##
",
        )
        .unwrap();
        let n = field.contact_normal(DVec2::new(4.0, 2.0), 1.5);
        assert!(n.x < -0.9, "expected left normal, got {n}");
    }

    #[test]
    fn test_rows_round_trip() {
        let mut field = flat(130, 12, 6);
        field.carve_circle(DVec2::new(64.0, 8.0), 3.0);
        let rows = field.to_rows();
        assert_eq!(rows.rows.len(), 12);
        assert_eq!(rows.rows[0].len(), 3);
        assert_eq!(TerrainField::from_rows(&rows).unwrap(), field);
    }

    #[test]
    fn test_in_extent() {
        let field = flat(10, 10, 5);
        assert!(field.in_extent(DVec2::new(5.0, -100.0), 200.0));
        assert!(!field.in_extent(DVec2::new(5.0, -300.0), 200.0));
        assert!(!field.in_extent(DVec2::new(-0.1, 5.0), 200.0));
        assert!(!field.in_extent(DVec2::new(5.0, 10.0), 200.0));
    }
}
