//! Runtime primitive values
//!
//! One closed tagged variant per declarable primitive kind. Field storage
//! holds these directly; there is no type-erased base value anywhere.

use glam::{Mat4, Vec2, Vec3, Vec4};
use uuid::Uuid;

use crate::schema::field::PrimitiveType;

/// Axis-aligned rectangle, origin plus extent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// One stored primitive value.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveValue {
    Bool(bool),
    Char(char),
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Vector2(Vec2),
    Vector3(Vec3),
    Vector4(Vec4),
    Rectangle(Rect),
    Matrix(Mat4),
    Guid(Uuid),
    Color(Color),
}

impl PrimitiveValue {
    /// The schema kind this value belongs to.
    pub fn kind(&self) -> PrimitiveType {
        match self {
            PrimitiveValue::Bool(_) => PrimitiveType::Bool,
            PrimitiveValue::Char(_) => PrimitiveType::Char,
            PrimitiveValue::Int8(_) => PrimitiveType::Int8,
            PrimitiveValue::Uint8(_) => PrimitiveType::Uint8,
            PrimitiveValue::Int16(_) => PrimitiveType::Int16,
            PrimitiveValue::Uint16(_) => PrimitiveType::Uint16,
            PrimitiveValue::Int32(_) => PrimitiveType::Int32,
            PrimitiveValue::Uint32(_) => PrimitiveType::Uint32,
            PrimitiveValue::Int64(_) => PrimitiveType::Int64,
            PrimitiveValue::Uint64(_) => PrimitiveType::Uint64,
            PrimitiveValue::Float32(_) => PrimitiveType::Float32,
            PrimitiveValue::Float64(_) => PrimitiveType::Float64,
            PrimitiveValue::String(_) => PrimitiveType::String,
            PrimitiveValue::Vector2(_) => PrimitiveType::Vector2,
            PrimitiveValue::Vector3(_) => PrimitiveType::Vector3,
            PrimitiveValue::Vector4(_) => PrimitiveType::Vector4,
            PrimitiveValue::Rectangle(_) => PrimitiveType::Rectangle,
            PrimitiveValue::Matrix(_) => PrimitiveType::Matrix,
            PrimitiveValue::Guid(_) => PrimitiveType::Guid,
            PrimitiveValue::Color(_) => PrimitiveType::Color,
        }
    }

    /// Canonical default for a primitive kind.
    ///
    /// Numeric kinds default to zero, strings to empty, the matrix to
    /// identity, the GUID to nil, and color to opaque black.
    pub fn default_of(kind: PrimitiveType) -> PrimitiveValue {
        match kind {
            PrimitiveType::Bool => PrimitiveValue::Bool(false),
            PrimitiveType::Char => PrimitiveValue::Char('\0'),
            PrimitiveType::Int8 => PrimitiveValue::Int8(0),
            PrimitiveType::Uint8 => PrimitiveValue::Uint8(0),
            PrimitiveType::Int16 => PrimitiveValue::Int16(0),
            PrimitiveType::Uint16 => PrimitiveValue::Uint16(0),
            PrimitiveType::Int32 => PrimitiveValue::Int32(0),
            PrimitiveType::Uint32 => PrimitiveValue::Uint32(0),
            PrimitiveType::Int64 => PrimitiveValue::Int64(0),
            PrimitiveType::Uint64 => PrimitiveValue::Uint64(0),
            PrimitiveType::Float32 => PrimitiveValue::Float32(0.0),
            PrimitiveType::Float64 => PrimitiveValue::Float64(0.0),
            PrimitiveType::String => PrimitiveValue::String(String::new()),
            PrimitiveType::Vector2 => PrimitiveValue::Vector2(Vec2::ZERO),
            PrimitiveType::Vector3 => PrimitiveValue::Vector3(Vec3::ZERO),
            PrimitiveType::Vector4 => PrimitiveValue::Vector4(Vec4::ZERO),
            PrimitiveType::Rectangle => PrimitiveValue::Rectangle(Rect::default()),
            PrimitiveType::Matrix => PrimitiveValue::Matrix(Mat4::IDENTITY),
            PrimitiveType::Guid => PrimitiveValue::Guid(Uuid::nil()),
            PrimitiveType::Color => PrimitiveValue::Color(Color::BLACK),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrimitiveValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            PrimitiveValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            PrimitiveValue::Float32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrimitiveValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            PrimitiveValue::Vector3(v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! primitive_from {
    ($($native:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$native> for PrimitiveValue {
                fn from(v: $native) -> Self {
                    PrimitiveValue::$variant(v)
                }
            }
        )*
    };
}

primitive_from! {
    bool => Bool,
    char => Char,
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    i64 => Int64,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
    String => String,
    Vec2 => Vector2,
    Vec3 => Vector3,
    Vec4 => Vector4,
    Rect => Rectangle,
    Mat4 => Matrix,
    Uuid => Guid,
    Color => Color,
}

impl From<&str> for PrimitiveValue {
    fn from(v: &str) -> Self {
        PrimitiveValue::String(v.to_string())
    }
}
