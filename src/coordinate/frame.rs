//! Linear world coordinate frame of an image HDU
//!
//! Only what a pixel cutout touches is modelled: the reference pixel, the
//! linear transformation (PC matrix and CDELT, or a CD matrix folded into
//! them), the axis types and units, the image shape and any distortion
//! terms. Sky projections are not evaluated here; `pixel_to_world` returns
//! intermediate world coordinates offset by CRVAL, which is enough to check
//! that a cutout keeps every pixel where it was.

use crate::coordinate::distortion::Distortion;
use crate::fits::constants::keywords;
use crate::fits::header::{Card, Header, HeaderValue};

/// WCS description of an image
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateFrame {
    /// 1-based reference pixel per axis
    crpix: Vec<f64>,
    /// World coordinate at the reference pixel
    crval: Vec<f64>,
    /// Increment per axis
    cdelt: Vec<f64>,
    /// Linear transformation matrix, row = world axis, column = pixel axis
    pc: Vec<Vec<f64>>,
    /// Axis types
    ctype: Vec<String>,
    /// Axis units
    cunit: Vec<String>,
    /// Image shape in FITS order (NAXIS1 first)
    shape: Vec<usize>,
    /// Distortion terms
    distortion: Option<Distortion>,
}

impl CoordinateFrame {
    /// Create a linear frame with an identity PC matrix
    pub fn new(crpix: Vec<f64>, crval: Vec<f64>, cdelt: Vec<f64>) -> Self {
        let n = crpix.len();
        CoordinateFrame {
            crpix,
            crval,
            cdelt,
            pc: identity(n),
            ctype: vec![String::new(); n],
            cunit: vec![String::new(); n],
            shape: Vec::new(),
            distortion: None,
        }
    }

    /// Replace the PC matrix
    pub fn with_pc(mut self, pc: Vec<Vec<f64>>) -> Self {
        self.pc = pc;
        self
    }

    /// Attach distortion terms
    pub fn with_distortion(mut self, distortion: Distortion) -> Self {
        self.distortion = Some(distortion);
        self
    }

    /// Build a frame from header keywords
    ///
    /// The axis count is the larger of NAXIS and WCSAXES. A CD matrix is
    /// used only when no PC keyword is present, in which case CDELT is 1.
    ///
    /// # Returns
    /// `None` when the header carries no CTYPEn or CRPIXn keyword
    pub fn from_header(header: &Header) -> Option<CoordinateFrame> {
        let naxis = header.get_i64(keywords::NAXIS).unwrap_or(0).max(0) as usize;
        let wcsaxes = header.get_i64(keywords::WCSAXES).unwrap_or(0).max(0) as usize;
        let n = naxis.max(wcsaxes);

        let has_wcs = (1..=n).any(|i| {
            header.contains(&format!("CTYPE{}", i)) || header.contains(&format!("CRPIX{}", i))
        });
        if !has_wcs {
            return None;
        }

        let axis_f64 = |prefix: &str, default: f64| -> Vec<f64> {
            (1..=n)
                .map(|i| header.get_f64(&format!("{}{}", prefix, i)).unwrap_or(default))
                .collect()
        };
        let axis_str = |prefix: &str| -> Vec<String> {
            (1..=n)
                .map(|i| header.get_str(&format!("{}{}", prefix, i)).unwrap_or("").trim().to_string())
                .collect()
        };

        let has_pc = matrix_keys("PC", n).any(|(_, _, key)| header.contains(&key));
        let has_cd = matrix_keys("CD", n).any(|(_, _, key)| header.contains(&key));

        let (pc, cdelt) = if has_cd && !has_pc {
            let mut cd = vec![vec![0.0; n]; n];
            for (i, j, key) in matrix_keys("CD", n) {
                cd[i][j] = header.get_f64(&key).unwrap_or(0.0);
            }
            (cd, vec![1.0; n])
        } else {
            let mut pc = identity(n);
            for (i, j, key) in matrix_keys("PC", n) {
                if let Some(v) = header.get_f64(&key) {
                    pc[i][j] = v;
                }
            }
            (pc, axis_f64("CDELT", 1.0))
        };

        Some(CoordinateFrame {
            crpix: axis_f64("CRPIX", 0.0),
            crval: axis_f64("CRVAL", 0.0),
            cdelt,
            pc,
            ctype: axis_str("CTYPE"),
            cunit: axis_str("CUNIT"),
            shape: header.axes().unwrap_or_default(),
            distortion: Distortion::from_header(header),
        })
    }

    /// Serialise the frame as header cards
    ///
    /// The PC matrix is written only when it differs from the identity.
    pub fn to_header(&self) -> Header {
        let n = self.naxis();
        let mut header = Header::new();

        header.push(Card::with_comment(
            keywords::WCSAXES,
            HeaderValue::Integer(n as i64),
            "Number of coordinate axes",
        ));
        for i in 0..n {
            header.push(Card::with_comment(
                &format!("CRPIX{}", i + 1),
                HeaderValue::Float(self.crpix[i]),
                "Pixel coordinate of reference point",
            ));
        }
        if self.pc != identity(n) {
            for (i, j, key) in matrix_keys("PC", n) {
                header.push(Card::new(&key, HeaderValue::Float(self.pc[i][j])));
            }
        }
        for i in 0..n {
            header.push(Card::new(&format!("CDELT{}", i + 1), HeaderValue::Float(self.cdelt[i])));
        }
        for i in 0..n {
            if !self.cunit[i].is_empty() {
                header.push(Card::new(&format!("CUNIT{}", i + 1), HeaderValue::Text(self.cunit[i].clone())));
            }
        }
        for i in 0..n {
            if !self.ctype[i].is_empty() {
                header.push(Card::new(&format!("CTYPE{}", i + 1), HeaderValue::Text(self.ctype[i].clone())));
            }
        }
        for i in 0..n {
            header.push(Card::new(&format!("CRVAL{}", i + 1), HeaderValue::Float(self.crval[i])));
        }
        if let Some(distortion) = &self.distortion {
            for card in distortion.to_cards() {
                header.push(card);
            }
        }

        header
    }

    /// Number of WCS axes
    pub fn naxis(&self) -> usize {
        self.crpix.len()
    }

    /// Reference pixel per axis
    pub fn crpix(&self) -> &[f64] {
        &self.crpix
    }

    /// Reference world coordinate per axis
    pub fn crval(&self) -> &[f64] {
        &self.crval
    }

    /// PC matrix
    pub fn pc(&self) -> &[Vec<f64>] {
        &self.pc
    }

    /// Axis types
    pub fn ctype(&self) -> &[String] {
        &self.ctype
    }

    /// Image shape in FITS order
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Record a new image shape (FITS order)
    pub fn set_shape(&mut self, shape: Vec<usize>) {
        self.shape = shape;
    }

    /// Whether distortion terms are attached
    pub fn has_distortion(&self) -> bool {
        self.distortion.is_some()
    }

    /// Distortion terms, if any
    pub fn distortion(&self) -> Option<&Distortion> {
        self.distortion.as_ref()
    }

    /// Reference pixel of one axis (0-based axis index)
    pub fn reference_pixel(&self, axis: usize) -> Option<f64> {
        self.crpix.get(axis).copied()
    }

    /// Set the reference pixel of one axis
    pub fn set_reference_pixel(&mut self, axis: usize, value: f64) {
        if let Some(p) = self.crpix.get_mut(axis) {
            *p = value;
        }
    }

    /// Move the reference pixel of one axis
    pub fn shift_reference_pixel(&mut self, axis: usize, delta: f64) {
        if let Some(p) = self.crpix.get_mut(axis) {
            *p += delta;
        }
    }

    /// Mirror one pixel axis so that source pixel `origin` becomes pixel 1
    ///
    /// New pixel `p'` maps to source pixel `origin + 1 - p'`, so CRPIX becomes
    /// `origin + 1 - CRPIX` and the PC column of that axis changes sign.
    pub fn flip_axis(&mut self, axis: usize, origin: f64) {
        if axis >= self.naxis() {
            return;
        }
        self.crpix[axis] = origin + 1.0 - self.crpix[axis];
        for row in self.pc.iter_mut() {
            if let Some(v) = row.get_mut(axis) {
                *v = -*v;
            }
        }
    }

    /// Linear world coordinates of a 1-based pixel position
    ///
    /// Evaluates `CRVAL + CDELT * PC * (p - CRPIX)`; distortion terms and
    /// projections are not applied.
    pub fn pixel_to_world(&self, pixel: &[f64]) -> Vec<f64> {
        let n = self.naxis();
        let offsets: Vec<f64> = (0..n)
            .map(|j| pixel.get(j).copied().unwrap_or(self.crpix[j]) - self.crpix[j])
            .collect();

        (0..n)
            .map(|i| {
                let intermediate: f64 = (0..n).map(|j| self.pc[i][j] * offsets[j]).sum();
                self.crval[i] + self.cdelt[i] * intermediate
            })
            .collect()
    }
}

fn identity(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

/// `(row, column, "PREFIXi_j")` for every element of an n x n matrix
fn matrix_keys(prefix: &str, n: usize) -> impl Iterator<Item = (usize, usize, String)> + '_ {
    (0..n).flat_map(move |i| (0..n).map(move |j| (i, j, format!("{}{}_{}", prefix, i + 1, j + 1))))
}
