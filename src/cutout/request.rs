//! Structured cutout requests
//!
//! A request names one HDU and lists pixel ranges in the HDU's natural axis
//! order (NAXIS1 first), 1-based and inclusive, exactly as a user writes
//! them in `[SCI,2][10:20,30:40]`.

use std::fmt;

/// Which HDU a request targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionSpec {
    /// 0-based HDU index
    Index(usize),
    /// EXTNAME; matches the first HDU carrying it
    Name(String),
    /// EXTNAME and 1-based occurrence of that name
    NameOccurrence(String, usize),
}

impl fmt::Display for ExtensionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionSpec::Index(i) => write!(f, "{}", i),
            ExtensionSpec::Name(name) => write!(f, "{}", name),
            ExtensionSpec::NameOccurrence(name, n) => write!(f, "{},{}", name, n),
        }
    }
}

/// Range requested along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRange {
    /// `*`: the whole axis
    All,
    /// `start:end`, 1-based and inclusive; `start > end` flips the axis
    Span { start: i64, end: i64 },
}

impl AxisRange {
    /// Whether the range runs backwards
    pub fn is_inverted(&self) -> bool {
        matches!(self, AxisRange::Span { start, end } if start > end)
    }
}

impl fmt::Display for AxisRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisRange::All => write!(f, "*"),
            AxisRange::Span { start, end } => write!(f, "{}:{}", start, end),
        }
    }
}

/// One pixel cutout: a target HDU and per-axis ranges in user order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelCutoutRequest {
    /// Target HDU
    pub extension: ExtensionSpec,
    /// Ranges for NAXIS1, NAXIS2, ...; axes not listed are taken whole
    pub ranges: Vec<AxisRange>,
}

impl PixelCutoutRequest {
    /// Create a request
    pub fn new(extension: ExtensionSpec, ranges: Vec<AxisRange>) -> Self {
        PixelCutoutRequest { extension, ranges }
    }

    /// Request a whole HDU
    pub fn whole(extension: ExtensionSpec) -> Self {
        PixelCutoutRequest {
            extension,
            ranges: Vec::new(),
        }
    }
}

impl fmt::Display for PixelCutoutRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.extension)?;
        if !self.ranges.is_empty() {
            let ranges: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
            write!(f, "[{}]", ranges.join(","))?;
        }
        Ok(())
    }
}
