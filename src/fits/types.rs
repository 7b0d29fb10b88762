//! Pixel data types of FITS image HDUs

use std::fmt;

use crate::fits::errors::{FitsError, FitsResult};

/// Element type of an image data unit, as declared by the BITPIX keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitpix {
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl Bitpix {
    /// Map a BITPIX header value to a data type
    pub fn from_code(code: i64) -> FitsResult<Self> {
        match code {
            8 => Ok(Bitpix::U8),
            16 => Ok(Bitpix::I16),
            32 => Ok(Bitpix::I32),
            64 => Ok(Bitpix::I64),
            -32 => Ok(Bitpix::F32),
            -64 => Ok(Bitpix::F64),
            other => Err(FitsError::Unsupported(format!("BITPIX = {}", other))),
        }
    }

    /// The BITPIX header value for this type
    pub fn code(&self) -> i64 {
        match self {
            Bitpix::U8 => 8,
            Bitpix::I16 => 16,
            Bitpix::I32 => 32,
            Bitpix::I64 => 64,
            Bitpix::F32 => -32,
            Bitpix::F64 => -64,
        }
    }

    /// Size of one element in bytes
    pub fn bytes_per_element(&self) -> usize {
        (self.code().unsigned_abs() / 8) as usize
    }
}

impl fmt::Display for Bitpix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
