//! Pin placement and tolerance geometry
//!
//! Node identity in the connectivity graph is exact equality of rounded grid
//! coordinates; proximity (pin near a wire end, junction on a segment) uses the
//! snap tolerance instead.

use std::collections::HashMap;

use crate::library::SymbolLibrary;
use crate::model::{ComponentInstance, PinDef, PinOrientation, Point, SymbolDef};

/// Default snap tolerance for endpoint and junction matching (design units)
pub const SNAP_EPS: f64 = 4.0;

/// Two points are touching when both axis deltas are under the tolerance.
pub fn points_near(a: &Point, b: &Point, tolerance: f64) -> bool {
    (a.x - b.x).abs() < tolerance && (a.y - b.y).abs() < tolerance
}

/// Test if `p` lies on the axis-aligned segment `a`-`b`, within tolerance.
/// Diagonal segments never match.
pub fn point_on_segment(p: &Point, a: &Point, b: &Point, tolerance: f64) -> bool {
    // Horizontal
    if (a.y - b.y).abs() < 1.0 && (p.y - a.y).abs() < tolerance {
        let min_x = a.x.min(b.x);
        let max_x = a.x.max(b.x);
        return p.x >= min_x - tolerance && p.x <= max_x + tolerance;
    }
    // Vertical
    if (a.x - b.x).abs() < 1.0 && (p.x - a.x).abs() < tolerance {
        let min_y = a.y.min(b.y);
        let max_y = a.y.max(b.y);
        return p.y >= min_y - tolerance && p.y <= max_y + tolerance;
    }
    false
}

/// Lead tip of a pin relative to the symbol origin.
pub fn lead_tip(pin: &PinDef) -> (f64, f64) {
    let l = pin.length;
    match pin.orientation {
        Some(PinOrientation::Left) => (pin.x - l, pin.y),
        Some(PinOrientation::Right) => (pin.x + l, pin.y),
        Some(PinOrientation::Up) => (pin.x, pin.y - l),
        Some(PinOrientation::Down) => (pin.x, pin.y + l),
        None => (pin.x, pin.y),
    }
}

/// Absolute electrical contact point of `pin` on a placed component.
///
/// Mirroring flips the x offset across the symbol's vertical center line, then
/// rotation pivots around the symbol center. The result sits on the integer
/// lattice. Without a definition the raw pin offset is used, unrotated.
pub fn pin_position(instance: &ComponentInstance, def: Option<&SymbolDef>, pin: &PinDef) -> Point {
    let origin = instance.position;
    let Some(def) = def else {
        return Point::new((origin.x + pin.x).round(), (origin.y + pin.y).round());
    };

    let cx = def.width / 2.0;
    let cy = def.height / 2.0;

    let (tx, ty) = lead_tip(pin);
    let mut rx = tx - cx;
    let ry = ty - cy;

    if instance.mirrored {
        rx = -rx;
    }

    let (sin_a, cos_a) = (instance.rotation % 360.0).to_radians().sin_cos();
    let rot_x = rx * cos_a - ry * sin_a;
    let rot_y = rx * sin_a + ry * cos_a;

    Point::new(
        (origin.x + cx + rot_x).round(),
        (origin.y + cy + rot_y).round(),
    )
}

/// Resolve a pin through the library.
pub fn resolve_pin_position(
    library: &SymbolLibrary,
    instance: &ComponentInstance,
    pin: &PinDef,
) -> Point {
    pin_position(instance, library.definition_of(instance), pin)
}

/// Uniform-grid bucket index for tolerance queries.
#[derive(Debug)]
pub(crate) struct SpatialIndex<T> {
    cell: f64,
    buckets: HashMap<(i64, i64), Vec<(Point, T)>>,
}

impl<T> SpatialIndex<T> {
    pub(crate) fn new(tolerance: f64) -> Self {
        Self {
            cell: tolerance.max(1.0),
            buckets: HashMap::new(),
        }
    }

    fn cell_of(&self, p: &Point) -> (i64, i64) {
        ((p.x / self.cell).floor() as i64, (p.y / self.cell).floor() as i64)
    }

    pub(crate) fn insert(&mut self, p: Point, item: T) {
        let cell = self.cell_of(&p);
        self.buckets.entry(cell).or_default().push((p, item));
    }

    /// Items whose point is within `tolerance` of `p`.
    pub(crate) fn near(&self, p: &Point, tolerance: f64) -> Vec<&T> {
        let (cx, cy) = self.cell_of(p);
        let reach = (tolerance / self.cell).ceil() as i64;
        let mut found = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                // Cells past the i64 range do not exist
                let (Some(x), Some(y)) = (cx.checked_add(dx), cy.checked_add(dy)) else {
                    continue;
                };
                if let Some(bucket) = self.buckets.get(&(x, y)) {
                    found.extend(
                        bucket
                            .iter()
                            .filter(|(q, _)| points_near(p, q, tolerance))
                            .map(|(_, item)| item),
                    );
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> SymbolLibrary {
        SymbolLibrary::builtin()
    }

    #[test]
    fn test_identity_transform_is_offset_plus_origin() {
        let lib = library();
        let r = ComponentInstance::new("r1", "sym_resistor").at(100.0, 200.0);
        let def = lib.get("sym_resistor").expect("resistor");

        for pin in &def.pins {
            let (tx, ty) = lead_tip(pin);
            let pos = resolve_pin_position(&lib, &r, pin);
            assert_eq!(pos, Point::new(100.0 + tx, 200.0 + ty));
        }

        let p1 = def.pin("p1").expect("p1");
        assert_eq!(resolve_pin_position(&lib, &r, p1), Point::new(120.0, 180.0));
    }

    #[test]
    fn test_zero_length_pin_identity() {
        let def = SymbolDef::new("sym_tp", "TP", 20.0, 20.0).with_pin(PinDef::new("1", 10.0, 20.0));
        let c = ComponentInstance::new("tp1", "sym_tp").at(-40.0, 60.0);
        assert_eq!(pin_position(&c, Some(&def), &def.pins[0]), Point::new(-30.0, 80.0));
    }

    #[test]
    fn test_rotation_pivots_around_center() {
        let lib = library();
        let r = ComponentInstance::new("r1", "sym_resistor").with_rotation(90.0);
        let def = lib.get("sym_resistor").expect("resistor");

        assert_eq!(resolve_pin_position(&lib, &r, &def.pins[0]), Point::new(80.0, 40.0));
        assert_eq!(resolve_pin_position(&lib, &r, &def.pins[1]), Point::new(-40.0, 40.0));

        let r180 = ComponentInstance::new("r2", "sym_resistor").with_rotation(180.0);
        assert_eq!(resolve_pin_position(&lib, &r180, &def.pins[0]), Point::new(20.0, 100.0));
    }

    #[test]
    fn test_mirror_flips_before_rotation() {
        let lib = library();
        let def = lib.get("sym_opamp").expect("opamp");
        let out = def.pin("out").expect("out");

        let plain = ComponentInstance::new("u1", "sym_opamp");
        assert_eq!(resolve_pin_position(&lib, &plain, out), Point::new(100.0, 40.0));

        let mirrored = plain.clone().with_mirror(true);
        assert_eq!(resolve_pin_position(&lib, &mirrored, out), Point::new(0.0, 40.0));

        // Flip then rotate: (-50, 0) rotated 90 degrees is (0, -50).
        let both = mirrored.with_rotation(90.0);
        assert_eq!(resolve_pin_position(&lib, &both, out), Point::new(50.0, -10.0));
    }

    #[test]
    fn test_missing_definition_falls_back_to_raw_offset() {
        let lib = library();
        let c = ComponentInstance::new("x1", "sym_unknown").at(10.0, 10.0).with_rotation(90.0);
        let pin = PinDef::new("1", 5.0, 0.0).with_lead(PinOrientation::Left, 20.0);
        assert_eq!(resolve_pin_position(&lib, &c, &pin), Point::new(15.0, 10.0));
    }

    #[test]
    fn test_point_on_segment() {
        let a = Point::new(0.0, 50.0);
        let b = Point::new(200.0, 50.0);
        assert!(point_on_segment(&Point::new(100.0, 50.0), &a, &b, SNAP_EPS));
        assert!(point_on_segment(&Point::new(100.0, 52.0), &a, &b, SNAP_EPS));
        assert!(!point_on_segment(&Point::new(100.0, 60.0), &a, &b, SNAP_EPS));
        assert!(!point_on_segment(&Point::new(210.0, 50.0), &a, &b, SNAP_EPS));

        let diag_a = Point::new(0.0, 0.0);
        let diag_b = Point::new(100.0, 100.0);
        assert!(!point_on_segment(&Point::new(50.0, 50.0), &diag_a, &diag_b, SNAP_EPS));
    }

    #[test]
    fn test_spatial_index_near() {
        let mut index = SpatialIndex::new(SNAP_EPS);
        index.insert(Point::new(0.0, 0.0), "a");
        index.insert(Point::new(3.0, -3.0), "b");
        index.insert(Point::new(50.0, 0.0), "c");

        let mut hits: Vec<&str> = index.near(&Point::new(1.0, -1.0), SNAP_EPS).into_iter().copied().collect();
        hits.sort();
        assert_eq!(hits, vec!["a", "b"]);
        assert!(index.near(&Point::new(25.0, 0.0), SNAP_EPS).is_empty());
    }

    #[test]
    fn test_spatial_index_at_extreme_coordinates() {
        let mut index = SpatialIndex::new(SNAP_EPS);
        index.insert(Point::new(1e20, 0.0), "far");
        index.insert(Point::new(-1e20, -1e20), "neg");

        assert_eq!(index.near(&Point::new(1e20, 0.0), SNAP_EPS), vec![&"far"]);
        assert_eq!(index.near(&Point::new(-1e20, -1e20), SNAP_EPS), vec![&"neg"]);
        assert!(index.near(&Point::new(0.0, 0.0), SNAP_EPS).is_empty());
    }
}
