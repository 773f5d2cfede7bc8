use std::{fmt, str::FromStr};

use crate::LayoutError;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SolidityType {
    /// Width in bits.
    Uint(usize),
    /// Width in bits.
    Int(usize),
    Address,
    Bool,
    /// Length in bytes, 1..=32.
    FixedBytes(usize),
    Bytes,
    String,
}

impl SolidityType {
    /// Bytes taken in storage. Dynamic `bytes`/`string` take a whole slot
    /// for their head.
    pub fn size_bytes(&self) -> usize {
        match self {
            SolidityType::Uint(bits) | SolidityType::Int(bits) => bits / 8,
            SolidityType::Address => 20,
            SolidityType::Bool => 1,
            SolidityType::FixedBytes(len) => *len,
            SolidityType::Bytes | SolidityType::String => 32,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, SolidityType::Bytes | SolidityType::String)
    }
}

fn parse_width(name: &str, digits: &str) -> Result<usize, LayoutError> {
    if digits.is_empty() {
        return Ok(256);
    }
    match digits.parse::<usize>() {
        Ok(bits) if bits % 8 == 0 && (8..=256).contains(&bits) => Ok(bits),
        _ => Err(LayoutError::UnknownType(name.to_owned())),
    }
}

impl FromStr for SolidityType {
    type Err = LayoutError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "address" | "address payable" => Ok(SolidityType::Address),
            "bool" => Ok(SolidityType::Bool),
            "bytes" => Ok(SolidityType::Bytes),
            "string" => Ok(SolidityType::String),
            "byte" => Ok(SolidityType::FixedBytes(1)),
            t if t.starts_with("uint") => parse_width(t, &t[4..]).map(SolidityType::Uint),
            t if t.starts_with("int") => parse_width(t, &t[3..]).map(SolidityType::Int),
            t if t.starts_with("bytes") => match t[5..].parse::<usize>() {
                Ok(len) if (1..=32).contains(&len) => Ok(SolidityType::FixedBytes(len)),
                _ => Err(LayoutError::UnknownType(t.to_owned())),
            },
            other => Err(LayoutError::UnknownType(other.to_owned())),
        }
    }
}

impl fmt::Display for SolidityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolidityType::Uint(bits) => write!(f, "uint{bits}"),
            SolidityType::Int(bits) => write!(f, "int{bits}"),
            SolidityType::Address => f.write_str("address"),
            SolidityType::Bool => f.write_str("bool"),
            SolidityType::FixedBytes(len) => write!(f, "bytes{len}"),
            SolidityType::Bytes => f.write_str("bytes"),
            SolidityType::String => f.write_str("string"),
        }
    }
}
