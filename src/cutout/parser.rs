//! Parser for cfitsio-style pixel cutout specifications
//!
//! A specification is a run of bracketed groups:
//!
//! ```text
//! [300:800,810:1000]          extension 0, NAXIS1 300..800, NAXIS2 810..1000
//! [SCI,2][80:220,100:150]     second HDU named SCI
//! [1][*,1:50] [ERR]           HDU 1 with NAXIS1 whole, and the first ERR HDU whole
//! ```
//!
//! Ranges are 1-based and inclusive; `start > end` flips the axis and `*`
//! selects the whole axis.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::cutout::request::{AxisRange, ExtensionSpec, PixelCutoutRequest};
use crate::fits::errors::{FitsError, FitsResult};

lazy_static! {
    static ref RANGE: Regex = Regex::new(r"^([+-]?\d+):([+-]?\d+)$").unwrap();
    static ref INDEX: Regex = Regex::new(r"^\d+$").unwrap();
    static ref NAME: Regex = Regex::new(r"^[^\s\[\],:*]([^\[\],:*]*[^\s\[\],:*])?$").unwrap();
}

/// Whether a specification is a pixel/extension cutout
///
/// Sky-region specifications (`CIRCLE ...`, `POLYGON ...`) are not.
pub fn is_pixel_spec(spec: &str) -> bool {
    spec.trim_start().starts_with('[')
}

/// Parse a pixel cutout specification into requests, in the order written
///
/// # Arguments
/// * `spec` - Specification such as `[SCI,2][80:220,100:150]`
///
/// # Returns
/// The requests, or a `Parse` error naming the offending token
pub fn parse(spec: &str) -> FitsResult<Vec<PixelCutoutRequest>> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Err(FitsError::parse(spec, "empty cutout specification"));
    }

    let mut requests = Vec::new();
    let mut pending: Option<ExtensionSpec> = None;
    let mut previous_was_ranges = false;

    for group in split_groups(trimmed)? {
        if is_range_list(group) {
            let ranges = parse_ranges(group)?;
            let extension = match pending.take() {
                Some(extension) => extension,
                None if previous_was_ranges => {
                    return Err(FitsError::parse(
                        &format!("[{}]", group),
                        "range list must follow an extension selector",
                    ));
                }
                None => ExtensionSpec::Index(0),
            };
            requests.push(PixelCutoutRequest::new(extension, ranges));
            previous_was_ranges = true;
        } else {
            let selector = parse_selector(group)?;
            if let Some(whole) = pending.replace(selector) {
                requests.push(PixelCutoutRequest::whole(whole));
            }
            previous_was_ranges = false;
        }
    }

    if let Some(whole) = pending {
        requests.push(PixelCutoutRequest::whole(whole));
    }

    debug!("Parsed '{}' into {} request(s)", spec, requests.len());
    Ok(requests)
}

/// Split `[a][b] [c]` into `["a", "b", "c"]`
fn split_groups(spec: &str) -> FitsResult<Vec<&str>> {
    let mut groups = Vec::new();
    let mut open: Option<usize> = None;

    for (i, c) in spec.char_indices() {
        match (c, open) {
            ('[', None) => open = Some(i),
            ('[', Some(start)) => {
                return Err(FitsError::parse(&spec[start..=i], "nested '['"));
            }
            (']', Some(start)) => {
                let group = spec[start + 1..i].trim();
                if group.is_empty() {
                    return Err(FitsError::parse(&spec[start..=i], "empty group"));
                }
                groups.push(group);
                open = None;
            }
            (']', None) => return Err(FitsError::parse(&spec[..=i], "unmatched ']'")),
            (_, Some(_)) => {}
            (c, None) if c.is_whitespace() => {}
            (_, None) => {
                return Err(FitsError::parse(&spec[i..], "text outside brackets"));
            }
        }
    }

    if let Some(start) = open {
        return Err(FitsError::parse(&spec[start..], "unclosed '['"));
    }

    Ok(groups)
}

/// A group is a range list when it contains a range or is made of wildcards
fn is_range_list(group: &str) -> bool {
    group.contains(':') || group.split(',').all(|t| t.trim() == "*")
}

fn parse_ranges(group: &str) -> FitsResult<Vec<AxisRange>> {
    group.split(',').map(|token| parse_range(token.trim())).collect()
}

fn parse_range(token: &str) -> FitsResult<AxisRange> {
    if token == "*" {
        return Ok(AxisRange::All);
    }

    let captures = RANGE
        .captures(token)
        .ok_or_else(|| FitsError::parse(token, "expected start:end with integer endpoints"))?;

    let endpoint = |i: usize| -> FitsResult<i64> {
        captures[i]
            .parse::<i64>()
            .map_err(|_| FitsError::parse(token, "range endpoint out of range"))
    };

    Ok(AxisRange::Span {
        start: endpoint(1)?,
        end: endpoint(2)?,
    })
}

fn parse_selector(group: &str) -> FitsResult<ExtensionSpec> {
    let parts: Vec<&str> = group.split(',').map(str::trim).collect();

    match parts.as_slice() {
        [index] if INDEX.is_match(index) => index
            .parse::<usize>()
            .map(ExtensionSpec::Index)
            .map_err(|_| FitsError::parse(index, "extension index out of range")),
        [name] if NAME.is_match(name) => Ok(ExtensionSpec::Name(name.to_string())),
        [name, occurrence] if NAME.is_match(name) => match occurrence.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(ExtensionSpec::NameOccurrence(name.to_string(), n)),
            _ => Err(FitsError::parse(occurrence, "occurrence must be a positive integer")),
        },
        _ => Err(FitsError::parse(group, "expected index, name or name,occurrence")),
    }
}
