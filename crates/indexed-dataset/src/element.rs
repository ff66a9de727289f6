use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// Storage type of every element in the `.bin` file. The discriminant is the
/// code recorded in the index header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    U8,
    I8,
    I16,
    #[default]
    I32,
    I64,
}

impl ElementType {
    pub fn code(self) -> u64 {
        match self {
            ElementType::U8 => 1,
            ElementType::I8 => 2,
            ElementType::I16 => 3,
            ElementType::I32 => 4,
            ElementType::I64 => 5,
        }
    }

    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            1 => Ok(ElementType::U8),
            2 => Ok(ElementType::I8),
            3 => Ok(ElementType::I16),
            4 => Ok(ElementType::I32),
            5 => Ok(ElementType::I64),
            other => Err(DatasetError::UnknownElementType(other)),
        }
    }

    /// Bytes per element.
    pub fn size(self) -> usize {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::I16 => 2,
            ElementType::I32 => 4,
            ElementType::I64 => 8,
        }
    }

    /// Appends `value` little-endian, rejecting values outside the type's range.
    pub(crate) fn write_le(self, value: i64, out: &mut Vec<u8>) -> Result<()> {
        let out_of_range = || DatasetError::ValueOutOfRange {
            value,
            element: self,
        };
        match self {
            ElementType::U8 => out.push(u8::try_from(value).map_err(|_| out_of_range())?),
            ElementType::I8 => out.extend_from_slice(
                &i8::try_from(value).map_err(|_| out_of_range())?.to_le_bytes(),
            ),
            ElementType::I16 => out.extend_from_slice(
                &i16::try_from(value).map_err(|_| out_of_range())?.to_le_bytes(),
            ),
            ElementType::I32 => out.extend_from_slice(
                &i32::try_from(value).map_err(|_| out_of_range())?.to_le_bytes(),
            ),
            ElementType::I64 => out.extend_from_slice(&value.to_le_bytes()),
        }
        Ok(())
    }

    /// Reads one element from the start of `bytes`, which must hold at least
    /// [`size`](Self::size) bytes.
    pub(crate) fn read_le(self, bytes: &[u8]) -> i64 {
        match self {
            ElementType::U8 => i64::from(bytes[0]),
            ElementType::I8 => i64::from(i8::from_le_bytes([bytes[0]])),
            ElementType::I16 => i64::from(i16::from_le_bytes([bytes[0], bytes[1]])),
            ElementType::I32 => {
                i64::from(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            ElementType::I64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[..8]);
                i64::from_le_bytes(raw)
            }
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::U8 => "u8",
            ElementType::I8 => "i8",
            ElementType::I16 => "i16",
            ElementType::I32 => "i32",
            ElementType::I64 => "i64",
        };
        f.write_str(name)
    }
}
