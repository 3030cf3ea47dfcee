//! In-memory document model: type table, instance array, properties.
//!
//! A `Document` is produced once by [`Document::load_file`] and is read-only
//! afterwards. Instances form a forest; children are stored as id lists into
//! the instance array rather than owning links.

use crate::binary;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Storage-format tag of a property column, in wire declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PropertyFormat {
    Unknown = 0,
    String,
    Bool,
    Int,
    Float,
    Double,
    UDim,
    UDim2,
    Ray,
    Faces,
    Axes,
    BrickColor,
    Color3,
    Vector2,
    Vector3,
    Vector2Int16,
    CFrameMatrix,
    CFrameQuat,
    Enum,
    Ref,
    Vector3Int16,
    NumberSequence,
    ColorSequenceV1,
    NumberRange,
    Rect2D,
    PhysicalProperties,
    Color3Uint8,
    Int64,
    SharedStringDictionaryIndex,
    Bytecode,
    OptionalCFrame,
    UniqueId,
    Font,
    SecurityCapabilities,
    Content,
}

impl PropertyFormat {
    /// Map a wire tag byte to a format, `None` for tags outside the set.
    pub fn from_tag(tag: u8) -> Option<Self> {
        use PropertyFormat::*;
        Some(match tag {
            0 => Unknown,
            1 => String,
            2 => Bool,
            3 => Int,
            4 => Float,
            5 => Double,
            6 => UDim,
            7 => UDim2,
            8 => Ray,
            9 => Faces,
            10 => Axes,
            11 => BrickColor,
            12 => Color3,
            13 => Vector2,
            14 => Vector3,
            15 => Vector2Int16,
            16 => CFrameMatrix,
            17 => CFrameQuat,
            18 => Enum,
            19 => Ref,
            20 => Vector3Int16,
            21 => NumberSequence,
            22 => ColorSequenceV1,
            23 => NumberRange,
            24 => Rect2D,
            25 => PhysicalProperties,
            26 => Color3Uint8,
            27 => Int64,
            28 => SharedStringDictionaryIndex,
            29 => Bytecode,
            30 => OptionalCFrame,
            31 => UniqueId,
            32 => Font,
            33 => SecurityCapabilities,
            34 => Content,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }
}

/// Row-major 3x3 rotation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub m: [f32; 9],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self { m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0] }
    }
}

impl Mat3 {
    pub fn from_rows(r0: Vec3, r1: Vec3, r2: Vec3) -> Self {
        Self { m: [r0.x, r0.y, r0.z, r1.x, r1.y, r1.z, r2.x, r2.y, r2.z] }
    }

    pub fn row(&self, i: usize) -> Vec3 {
        Vec3 { x: self.m[i * 3], y: self.m[i * 3 + 1], z: self.m[i * 3 + 2] }
    }
}

/// A rigid pose: rotation plus translation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CFrame {
    pub rotation: Mat3,
    pub translation: Vec3,
}

/// A coordinate frame plus a validity flag. Absent variants still occupy a
/// column slot; their flag is false.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OptionalCFrame {
    pub frame: CFrame,
    pub has_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color3 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Palette index into the legacy brick color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BrickColor {
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UniqueId {
    pub index: u32,
    pub timestamp: u32,
    pub raw: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumberKeypoint {
    pub time: f32,
    pub value: f32,
    pub envelope: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberSequence {
    pub keypoints: Vec<NumberKeypoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorKeypoint {
    pub time: f32,
    pub color: Color3,
    pub envelope: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorSequence {
    pub keypoints: Vec<ColorKeypoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumberRange {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UDim2 {
    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: i32,
    pub offset_y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect2D {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalProperties {
    pub density: f32,
    pub friction: f32,
    pub elasticity: f32,
    pub friction_weight: f32,
    pub elasticity_weight: f32,
    pub acoustic_absorption: f32,
}

impl Default for PhysicalProperties {
    fn default() -> Self {
        Self {
            density: 0.0,
            friction: 0.0,
            elasticity: 0.0,
            friction_weight: 1.0,
            elasticity_weight: 1.0,
            acoustic_absorption: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FontInfo {
    pub family: String,
    pub weight: u16,
    pub style: u8,
    pub cached_face_id: String,
}

/// Entry of the file-level shared string table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedString {
    pub hash: [u8; 16],
    pub content: String,
}

/// Variant-typed property payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Unsupported storage formats carry no payload
    Unknown,
    String(String),
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Vector2(Vec2),
    Vector3(Vec3),
    Color3(Color3),
    CFrame(CFrame),
    OptionalCFrame(OptionalCFrame),
    BrickColor(BrickColor),
    UniqueId(UniqueId),
    NumberSequence(NumberSequence),
    ColorSequence(ColorSequence),
    NumberRange(NumberRange),
    UDim2(UDim2),
    Rect2D(Rect2D),
    PhysicalProperties(PhysicalProperties),
    Font(FontInfo),
    /// Enumeration index
    Enum(u32),
    /// Absolute instance id, -1 for a null reference
    Ref(i32),
}

/// A single named, typed value attached to an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub(crate) name: String,
    pub(crate) kind: PropertyFormat,
    pub(crate) value: PropertyValue,
}

impl Property {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropertyFormat {
        self.kind
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Textual payload, or `default` on kind mismatch.
    pub fn as_str<'a>(&'a self, default: &'a str) -> &'a str {
        match &self.value {
            PropertyValue::String(s) => s,
            _ => default,
        }
    }

    pub fn as_bool(&self, default: bool) -> bool {
        match self.value {
            PropertyValue::Bool(b) => b,
            _ => default,
        }
    }

    pub fn as_f32(&self, default: f32) -> f32 {
        match self.value {
            PropertyValue::Float(f) => f,
            _ => default,
        }
    }

    pub fn as_vector3(&self, default: Vec3) -> Vec3 {
        match self.value {
            PropertyValue::Vector3(v) => v,
            _ => default,
        }
    }

    /// Coordinate frame view. Tolerates every CFrame kind: the optional
    /// variant yields its inner frame when present and `default` otherwise.
    pub fn as_cframe(&self, default: CFrame) -> CFrame {
        match &self.value {
            PropertyValue::CFrame(cf) => *cf,
            PropertyValue::OptionalCFrame(opt) if opt.has_data => opt.frame,
            _ => default,
        }
    }
}

/// A named object type. Slots are created up front from the header's type
/// count and assigned at most once by INST chunks.
#[derive(Debug, Clone, Default)]
pub struct Type {
    pub(crate) name: String,
}

impl Type {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One object in the scene graph.
#[derive(Debug, Clone)]
pub struct Instance {
    pub(crate) properties: Vec<Property>,
    pub(crate) child_ids: Vec<i32>,
    pub(crate) parent_id: i32,
    pub(crate) id: i32,
    pub(crate) type_index: u32,
    pub(crate) is_service: bool,
    pub(crate) is_service_rooted: bool,
}

impl Default for Instance {
    fn default() -> Self {
        Self {
            properties: Vec::new(),
            child_ids: Vec::new(),
            parent_id: -1,
            id: -1,
            type_index: u32::MAX,
            is_service: false,
            is_service_rooted: false,
        }
    }
}

impl Instance {
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Parent instance id, -1 for a root.
    pub fn parent_id(&self) -> i32 {
        self.parent_id
    }

    pub fn type_index(&self) -> u32 {
        self.type_index
    }

    pub fn is_service(&self) -> bool {
        self.is_service
    }

    /// Meaningful only when [`Instance::is_service`] is set.
    pub fn is_service_rooted(&self) -> bool {
        self.is_service_rooted
    }

    /// Properties in wire order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Ids of child instances, in the order the parent links appeared.
    pub fn child_ids(&self) -> &[i32] {
        &self.child_ids
    }
}

/// Root container: type table, dense instance array, file-level metadata and
/// the shared string dictionary.
#[derive(Debug, Default)]
pub struct Document {
    pub(crate) types: Vec<Type>,
    pub(crate) instances: Vec<Instance>,
    pub(crate) metadata: HashMap<String, String>,
    pub(crate) shared_strings: Vec<SharedString>,
}

impl Document {
    /// Load a binary scene document from disk.
    ///
    /// Paths ending in `x`/`X` belong to the textual sibling format and are
    /// rejected before the file is opened.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Document> {
        let path = path.as_ref();
        let last = path.to_string_lossy().chars().next_back();
        if matches!(last, Some('x') | Some('X')) {
            return Err(Error::UnrecognizedFormat);
        }
        binary::load(path)
    }

    /// All instances, indexed by id.
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// The ordered type table.
    pub fn types(&self) -> &[Type] {
        &self.types
    }

    /// Type name for an instance of this document. Returns an empty string
    /// when the instance does not belong here or its type index is out of
    /// range.
    pub fn type_name(&self, instance: &Instance) -> &str {
        let belongs = usize::try_from(instance.id)
            .ok()
            .and_then(|id| self.instances.get(id))
            .is_some_and(|own| own.type_index == instance.type_index);
        if !belongs {
            return "";
        }
        self.types
            .get(instance.type_index as usize)
            .map(|t| t.name.as_str())
            .unwrap_or("")
    }

    /// File-level metadata pairs from the META chunk.
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Shared string table from the SSTR chunk, in declaration order.
    pub fn shared_strings(&self) -> &[SharedString] {
        &self.shared_strings
    }
}
