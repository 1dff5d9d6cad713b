//! Schematic data model
//!
//! Authored inputs (component instances, wires, junctions, labels, bus entries,
//! sheets) and the derived [`Net`]. Every type derives serde so host applications
//! can load and store designs in whatever format they own.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::core::SchemnetError;

/// A position in design units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Quantize onto the integer lattice used for node identity.
    pub fn grid(&self) -> GridPoint {
        GridPoint {
            x: self.x.round() as i64,
            y: self.y.round() as i64,
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Rounded integer coordinate. Two points are the same graph node exactly when
/// their grid points are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

impl GridPoint {
    pub fn to_point(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Direction a pin's lead extends from its declared origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinOrientation {
    Left,
    Right,
    Up,
    Down,
}

/// Electrical type of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectricalType {
    Input,
    Output,
    Bidirectional,
    Passive,
    PowerIn,
    PowerOut,
    OpenCollector,
    OpenEmitter,
    Unspecified,
}

impl Default for ElectricalType {
    fn default() -> Self {
        ElectricalType::Unspecified
    }
}

impl fmt::Display for ElectricalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElectricalType::Input => write!(f, "input"),
            ElectricalType::Output => write!(f, "output"),
            ElectricalType::Bidirectional => write!(f, "bidirectional"),
            ElectricalType::Passive => write!(f, "passive"),
            ElectricalType::PowerIn => write!(f, "power_in"),
            ElectricalType::PowerOut => write!(f, "power_out"),
            ElectricalType::OpenCollector => write!(f, "open_collector"),
            ElectricalType::OpenEmitter => write!(f, "open_emitter"),
            ElectricalType::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// A pin of a library symbol. Coordinates are relative to the symbol's top-left origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinDef {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub x: f64,
    pub y: f64,
    /// Lead length; the electrical contact is at the lead tip.
    #[serde(default)]
    pub length: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<PinOrientation>,
    #[serde(default)]
    pub electrical_type: ElectricalType,
}

impl PinDef {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            number: None,
            x,
            y,
            length: 0.0,
            orientation: None,
            electrical_type: ElectricalType::Unspecified,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_lead(mut self, orientation: PinOrientation, length: f64) -> Self {
        self.orientation = Some(orientation);
        self.length = length;
        self
    }

    pub fn with_type(mut self, electrical_type: ElectricalType) -> Self {
        self.electrical_type = electrical_type;
        self
    }
}

/// Drawable symbol body primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GraphicPrimitive {
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke_width: Option<f64>,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
    },
    Arc {
        cx: f64,
        cy: f64,
        r: f64,
        start_angle: f64,
        end_angle: f64,
    },
    Polyline {
        points: Vec<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke_width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_size: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        align: Option<String>,
    },
}

/// Semantic hints attached to a library symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolMetadata {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage_domain: Option<String>,
    #[serde(default)]
    pub is_power_source: bool,
    #[serde(default)]
    pub is_power_flag: bool,
    #[serde(default)]
    pub requires_decoupling: bool,
    #[serde(default)]
    pub is_high_speed: bool,
}

/// Library symbol definition; immutable at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDef {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pins: Vec<PinDef>,
    #[serde(default)]
    pub graphics: Vec<GraphicPrimitive>,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SymbolMetadata>,
}

impl SymbolDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            description: None,
            pins: Vec::new(),
            graphics: Vec::new(),
            width,
            height,
            metadata: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_pin(mut self, pin: PinDef) -> Self {
        self.pins.push(pin);
        self
    }

    pub fn pin(&self, pin_id: &str) -> Option<&PinDef> {
        self.pins.iter().find(|p| p.id == pin_id)
    }

    /// Power symbols and power flags live in the "Power" category.
    pub fn is_power_category(&self) -> bool {
        self.category == "Power"
    }
}

/// A placed reference to a library symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstance {
    pub id: String,
    pub symbol_ref: String,
    pub position: Point,
    /// Degrees: 0, 90, 180 or 270.
    #[serde(default)]
    pub rotation: f64,
    /// Horizontal flip, applied before rotation.
    #[serde(default)]
    pub mirrored: bool,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl ComponentInstance {
    pub fn new(id: impl Into<String>, symbol_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol_ref: symbol_ref.into(),
            position: Point::default(),
            rotation: 0.0,
            mirrored: false,
            properties: HashMap::new(),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_mirror(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.properties.insert("reference".to_string(), reference.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.properties.insert("value".to_string(), value.into());
        self
    }

    /// Reference designator ("R1"), empty when unset.
    pub fn reference(&self) -> &str {
        self.properties.get("reference").map(String::as_str).unwrap_or("")
    }

    pub fn value(&self) -> &str {
        self.properties.get("value").map(String::as_str).unwrap_or("")
    }
}

/// Orthogonal polyline. Bus wires carry a bus label and never join signal nets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub id: String,
    pub points: Vec<Point>,
    /// Explicit net tag, e.g. assigned by a generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_tag: Option<String>,
    #[serde(default)]
    pub is_bus: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus_label: Option<String>,
}

impl Wire {
    pub fn new(id: impl Into<String>, points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            id: id.into(),
            points: points.into_iter().map(Point::from).collect(),
            net_tag: None,
            is_bus: false,
            bus_label: None,
        }
    }

    /// A thick bus wire labelled e.g. `DATA[0..7]`.
    pub fn bus(
        id: impl Into<String>,
        label: impl Into<String>,
        points: impl IntoIterator<Item = (f64, f64)>,
    ) -> Self {
        let mut wire = Self::new(id, points);
        wire.is_bus = true;
        wire.bus_label = Some(label.into());
        wire
    }

    pub fn with_net_tag(mut self, tag: impl Into<String>) -> Self {
        self.net_tag = Some(tag.into());
        self
    }

    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Consecutive point pairs.
    pub fn segments(&self) -> impl Iterator<Item = (&Point, &Point)> {
        self.points.windows(2).map(|w| (&w[0], &w[1]))
    }

    /// Check the polyline invariant: at least two points, axis-aligned segments only.
    pub fn validate(&self) -> Result<(), SchemnetError> {
        if self.points.len() < 2 {
            return Err(SchemnetError::InvalidWire {
                wire_id: self.id.clone(),
                reason: format!("expected at least 2 points, found {}", self.points.len()),
            });
        }
        for (a, b) in self.segments() {
            if a.x != b.x && a.y != b.y {
                return Err(SchemnetError::InvalidWire {
                    wire_id: self.id.clone(),
                    reason: format!("diagonal segment {} -> {}", a, b),
                });
            }
        }
        Ok(())
    }
}

/// Explicit connection dot. The only way a wire's interior joins anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub id: String,
    pub position: Point,
}

impl Junction {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            position: Point::new(x, y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelScope {
    #[default]
    Local,
    Global,
}

/// Named point marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetLabel {
    pub id: String,
    pub position: Point,
    pub name: String,
    #[serde(default)]
    pub scope: LabelScope,
}

impl NetLabel {
    pub fn local(id: impl Into<String>, name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            position: Point::new(x, y),
            name: name.into(),
            scope: LabelScope::Local,
        }
    }

    pub fn global(id: impl Into<String>, name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            scope: LabelScope::Global,
            ..Self::local(id, name, x, y)
        }
    }

    pub fn is_global(&self) -> bool {
        self.scope == LabelScope::Global
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrientation {
    #[default]
    Left,
    Right,
}

/// Fan-out from a bus to one member net, `{bus_name}{member_index}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEntry {
    pub id: String,
    /// Member-side connection point.
    pub position: Point,
    pub bus_name: String,
    pub member_index: u32,
    #[serde(default)]
    pub orientation: EntryOrientation,
}

impl BusEntry {
    pub fn new(
        id: impl Into<String>,
        bus_name: impl Into<String>,
        member_index: u32,
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            id: id.into(),
            position: Point::new(x, y),
            bus_name: bus_name.into(),
            member_index,
            orientation: EntryOrientation::Left,
        }
    }

    pub fn member_name(&self) -> String {
        format!("{}{}", self.bus_name, self.member_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
    #[default]
    Bidirectional,
    Passive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSide {
    #[default]
    Left,
    Right,
    Top,
    Bottom,
}

/// Named connection point on a sheet definition's boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetPort {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub direction: PortDirection,
    #[serde(default)]
    pub side: PortSide,
    /// Offset along the sheet edge.
    #[serde(default)]
    pub offset: Point,
}

impl SheetPort {
    pub fn new(id: impl Into<String>, name: impl Into<String>, direction: PortDirection) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            direction,
            side: PortSide::Left,
            offset: Point::default(),
        }
    }
}

/// A placed, sized reference to a [`SheetDef`] on a parent sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetInstance {
    pub id: String,
    pub sheet_def_id: String,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    pub name: String,
    #[serde(default)]
    pub filename: String,
}

impl SheetInstance {
    pub fn new(id: impl Into<String>, sheet_def_id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            sheet_def_id: sheet_def_id.into(),
            position: Point::default(),
            width: 0.0,
            height: 0.0,
            filename: format!("{}.sch", name),
            name,
        }
    }
}

/// Content of one schematic sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sheet {
    pub components: Vec<ComponentInstance>,
    pub wires: Vec<Wire>,
    pub junctions: Vec<Junction>,
    pub labels: Vec<NetLabel>,
    pub bus_entries: Vec<BusEntry>,
    pub ports: Vec<SheetPort>,
    pub sheets: Vec<SheetInstance>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate every wire on the sheet.
    pub fn validate(&self) -> Result<(), SchemnetError> {
        self.wires.iter().try_for_each(Wire::validate)
    }
}

/// Self-contained sub-circuit that sheet instances point at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetDef {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub sheet: Sheet,
}

/// A whole hierarchical design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Design {
    pub root: Sheet,
    pub sheet_defs: Vec<SheetDef>,
}

impl Design {
    pub fn sheet_def(&self, id: &str) -> Option<&SheetDef> {
        self.sheet_defs.iter().find(|d| d.id == id)
    }

    /// Validate every sheet's wires and check that each sheet instance points at
    /// a known definition.
    pub fn validate(&self) -> Result<(), SchemnetError> {
        let sheets = std::iter::once(&self.root).chain(self.sheet_defs.iter().map(|d| &d.sheet));
        for sheet in sheets {
            sheet.validate()?;
            if let Some(instance) = sheet
                .sheets
                .iter()
                .find(|i| self.sheet_def(&i.sheet_def_id).is_none())
            {
                return Err(SchemnetError::UnknownSheetDef(instance.sheet_def_id.clone()));
            }
        }
        Ok(())
    }
}

/// A (component, pin) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinRef {
    pub component_id: String,
    pub pin_id: String,
}

impl PinRef {
    pub fn new(component_id: impl Into<String>, pin_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            pin_id: pin_id.into(),
        }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.component_id, self.pin_id)
    }
}

/// Electrically identical set of pins and wires. Derived, never authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Net {
    pub id: String,
    pub name: String,
    pub pin_refs: Vec<PinRef>,
    pub wire_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_class_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_path: Option<String>,
}

impl Net {
    pub fn has_pins_or_wires(&self) -> bool {
        !self.pin_refs.is_empty() || !self.wire_ids.is_empty()
    }

    /// More than a lone pin: two or more pins, or any wire.
    pub fn connects_anything(&self) -> bool {
        self.pin_refs.len() > 1 || !self.wire_ids.is_empty()
    }

    pub fn contains_pin(&self, pin: &PinRef) -> bool {
        self.pin_refs.iter().any(|p| p == pin)
    }
}
