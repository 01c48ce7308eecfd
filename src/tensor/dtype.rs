//! Element type tags
//!
//! The numeric encoding of each type is handled by the execution layer; the
//! rewrite core only compares tags.

use std::fmt;

/// Element type of a node's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ElementType {
    /// Boolean
    Boolean,
    /// Brain floating point (16 bit)
    BF16,
    /// IEEE half precision
    F16,
    /// IEEE single precision
    #[default]
    F32,
    /// IEEE double precision
    F64,
    /// Signed 8 bit integer
    I8,
    /// Signed 32 bit integer
    I32,
    /// Signed 64 bit integer
    I64,
    /// Unsigned 8 bit integer
    U8,
}

impl ElementType {
    /// Width of one element in bits
    pub fn bitwidth(self) -> usize {
        match self {
            ElementType::Boolean | ElementType::I8 | ElementType::U8 => 8,
            ElementType::BF16 | ElementType::F16 => 16,
            ElementType::F32 | ElementType::I32 => 32,
            ElementType::F64 | ElementType::I64 => 64,
        }
    }

    /// Size of one element in bytes
    pub fn size(self) -> usize {
        self.bitwidth() / 8
    }

    /// Check if the type is floating point
    pub fn is_real(self) -> bool {
        matches!(
            self,
            ElementType::BF16 | ElementType::F16 | ElementType::F32 | ElementType::F64
        )
    }

    /// Check if the type is signed
    pub fn is_signed(self) -> bool {
        !matches!(self, ElementType::Boolean | ElementType::U8)
    }

    /// Short lowercase name
    pub fn name(self) -> &'static str {
        match self {
            ElementType::Boolean => "boolean",
            ElementType::BF16 => "bf16",
            ElementType::F16 => "f16",
            ElementType::F32 => "f32",
            ElementType::F64 => "f64",
            ElementType::I8 => "i8",
            ElementType::I32 => "i32",
            ElementType::I64 => "i64",
            ElementType::U8 => "u8",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
