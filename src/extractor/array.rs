//! N-dimensional array data
//!
//! Arrays are kept the way FITS stores them: big-endian elements with the
//! first FITS axis (NAXIS1) varying fastest. Shapes are therefore listed in
//! storage order, slowest axis first, i.e. `(NAXISn, ..., NAXIS1)`.

use byteorder::{BigEndian, ByteOrder};

use crate::fits::errors::{FitsError, FitsResult};
use crate::fits::types::Bitpix;

/// Something a rectangular box of elements can be read from
///
/// Implemented by in-memory arrays and by lazy views over a data unit on
/// disk, so the extraction engine never needs the whole array in memory.
pub trait ArraySource {
    /// Element type
    fn bitpix(&self) -> Bitpix;

    /// Shape in storage order
    fn shape(&self) -> &[usize];

    /// Read a box of elements
    ///
    /// # Arguments
    /// * `start` - 0-based first element per axis, storage order
    /// * `shape` - Extent per axis, storage order
    ///
    /// # Returns
    /// A new array holding the box, or an error if it does not fit the source
    fn read_region(&mut self, start: &[usize], shape: &[usize]) -> FitsResult<NdArray>;
}

/// An owned N-dimensional array of FITS elements
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    /// Element type
    bitpix: Bitpix,
    /// Shape in storage order
    shape: Vec<usize>,
    /// Big-endian element bytes
    data: Vec<u8>,
}

macro_rules! from_values {
    ($name:ident, $ty:ty, $bitpix:expr, $write:path) => {
        /// Build an array from native values in storage order
        pub fn $name(shape: &[usize], values: &[$ty]) -> FitsResult<Self> {
            let size = std::mem::size_of::<$ty>();
            let mut data = vec![0u8; values.len() * size];
            for (chunk, v) in data.chunks_exact_mut(size).zip(values) {
                $write(chunk, *v);
            }
            NdArray::new($bitpix, shape.to_vec(), data)
        }
    };
}

impl NdArray {
    /// Create an array from raw big-endian bytes
    ///
    /// Fails if the byte count does not match the shape and element size.
    pub fn new(bitpix: Bitpix, shape: Vec<usize>, data: Vec<u8>) -> FitsResult<Self> {
        let expected = checked_element_count(&shape)
            .and_then(|n| n.checked_mul(bitpix.bytes_per_element()));
        if expected != Some(data.len()) {
            return Err(FitsError::InvalidShape(format!(
                "{} bytes do not fill shape {:?} of BITPIX {}",
                data.len(),
                shape,
                bitpix
            )));
        }
        Ok(NdArray { bitpix, shape, data })
    }

    /// Create a zero-filled array
    pub fn zeros(bitpix: Bitpix, shape: &[usize]) -> Self {
        let len = element_count(shape) * bitpix.bytes_per_element();
        NdArray {
            bitpix,
            shape: shape.to_vec(),
            data: vec![0u8; len],
        }
    }

    /// Build a BITPIX 8 array from values in storage order
    pub fn from_u8(shape: &[usize], values: &[u8]) -> FitsResult<Self> {
        NdArray::new(Bitpix::U8, shape.to_vec(), values.to_vec())
    }

    from_values!(from_i16, i16, Bitpix::I16, BigEndian::write_i16);
    from_values!(from_i32, i32, Bitpix::I32, BigEndian::write_i32);
    from_values!(from_i64, i64, Bitpix::I64, BigEndian::write_i64);
    from_values!(from_f32, f32, Bitpix::F32, BigEndian::write_f32);
    from_values!(from_f64, f64, Bitpix::F64, BigEndian::write_f64);

    /// Element type
    pub fn bitpix(&self) -> Bitpix {
        self.bitpix
    }

    /// Shape in storage order
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Shape in FITS order (NAXIS1 first)
    pub fn fits_shape(&self) -> Vec<usize> {
        self.shape.iter().rev().copied().collect()
    }

    /// Number of axes
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        element_count(&self.shape)
    }

    /// Whether the array holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw big-endian bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Element at a storage-order index, converted to f64
    pub fn get_f64(&self, index: &[usize]) -> Option<f64> {
        if index.len() != self.shape.len() || index.iter().zip(&self.shape).any(|(i, n)| i >= n) {
            return None;
        }
        let offset: usize = index.iter().zip(strides(&self.shape)).map(|(i, s)| i * s).sum();
        Some(self.value_at(offset))
    }

    /// All elements in storage order, converted to f64
    pub fn to_f64_vec(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.value_at(i)).collect()
    }

    fn value_at(&self, element: usize) -> f64 {
        let size = self.bitpix.bytes_per_element();
        let bytes = &self.data[element * size..(element + 1) * size];
        match self.bitpix {
            Bitpix::U8 => bytes[0] as f64,
            Bitpix::I16 => BigEndian::read_i16(bytes) as f64,
            Bitpix::I32 => BigEndian::read_i32(bytes) as f64,
            Bitpix::I64 => BigEndian::read_i64(bytes) as f64,
            Bitpix::F32 => BigEndian::read_f32(bytes) as f64,
            Bitpix::F64 => BigEndian::read_f64(bytes),
        }
    }

    /// Copy of the array with one storage axis reversed
    pub fn flip_axis(&self, axis: usize) -> NdArray {
        if axis >= self.shape.len() || self.is_empty() {
            return self.clone();
        }

        let size = self.bitpix.bytes_per_element();
        let outer: usize = self.shape[..axis].iter().product();
        let n = self.shape[axis];
        let inner: usize = self.shape[axis + 1..].iter().product::<usize>() * size;

        let mut data = vec![0u8; self.data.len()];
        for o in 0..outer {
            for k in 0..n {
                let src = (o * n + (n - 1 - k)) * inner;
                let dst = (o * n + k) * inner;
                data[dst..dst + inner].copy_from_slice(&self.data[src..src + inner]);
            }
        }

        NdArray {
            bitpix: self.bitpix,
            shape: self.shape.clone(),
            data,
        }
    }
}

impl ArraySource for NdArray {
    fn bitpix(&self) -> Bitpix {
        self.bitpix
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn read_region(&mut self, start: &[usize], shape: &[usize]) -> FitsResult<NdArray> {
        check_region(&self.shape, start, shape)?;

        let size = self.bitpix.bytes_per_element();
        let mut out = NdArray::zeros(self.bitpix, shape);
        let source = &self.data;
        for_each_row(&self.shape, start, shape, |src, dst, len| {
            out.data[dst * size..(dst + len) * size]
                .copy_from_slice(&source[src * size..(src + len) * size]);
            Ok(())
        })?;

        Ok(out)
    }
}

/// Number of elements in a shape; a rank-0 shape holds no data
pub(crate) fn element_count(shape: &[usize]) -> usize {
    checked_element_count(shape).unwrap_or(usize::MAX)
}

/// Number of elements in a shape, or `None` when it does not fit a `usize`
pub(crate) fn checked_element_count(shape: &[usize]) -> Option<usize> {
    if shape.is_empty() {
        return Some(0);
    }
    shape.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))
}

/// Element strides for a storage-order shape
pub(crate) fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for k in (0..shape.len().saturating_sub(1)).rev() {
        strides[k] = strides[k + 1] * shape[k + 1];
    }
    strides
}

/// Verify that a box lies inside a source shape
pub(crate) fn check_region(source_shape: &[usize], start: &[usize], shape: &[usize]) -> FitsResult<()> {
    if start.len() != source_shape.len() || shape.len() != source_shape.len() {
        return Err(FitsError::InvalidShape(format!(
            "region of rank {} read from array of rank {}",
            shape.len(),
            source_shape.len()
        )));
    }

    for (axis, ((s, n), len)) in start.iter().zip(shape).zip(source_shape).enumerate() {
        if s + n > *len {
            return Err(FitsError::InvalidShape(format!(
                "axis {} region {}..{} exceeds length {}",
                axis,
                s,
                s + n,
                len
            )));
        }
    }
    Ok(())
}

/// Visit the contiguous rows of a box, fastest axis innermost
///
/// The callback receives the source element offset of the row, the element
/// offset in the packed destination and the row length in elements.
pub(crate) fn for_each_row<F>(source_shape: &[usize], start: &[usize], shape: &[usize], mut f: F) -> FitsResult<()>
where
    F: FnMut(usize, usize, usize) -> FitsResult<()>,
{
    let rank = shape.len();
    if rank == 0 || shape.iter().any(|&n| n == 0) {
        return Ok(());
    }

    let source_strides = strides(source_shape);
    let row_len = shape[rank - 1];
    let mut index = vec![0usize; rank - 1];
    let mut dst = 0;

    loop {
        let src: usize = index
            .iter()
            .enumerate()
            .map(|(k, i)| (start[k] + i) * source_strides[k])
            .sum::<usize>()
            + start[rank - 1];

        f(src, dst, row_len)?;
        dst += row_len;

        // Odometer over the outer axes
        let mut k = index.len();
        loop {
            if k == 0 {
                return Ok(());
            }
            k -= 1;
            index[k] += 1;
            if index[k] < shape[k] {
                break;
            }
            index[k] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(shape: &[usize]) -> NdArray {
        let n: usize = shape.iter().product();
        let values: Vec<i32> = (0..n as i32).collect();
        NdArray::from_i32(shape, &values).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = NdArray::new(Bitpix::I16, vec![2, 2], vec![0u8; 6]);
        assert!(matches!(result, Err(FitsError::InvalidShape(_))));
    }

    #[test]
    fn test_read_region_2d() {
        let mut array = ramp(&[4, 5]);
        let region = array.read_region(&[1, 2], &[2, 3]).unwrap();
        assert_eq!(region.shape(), &[2, 3]);
        assert_eq!(region.to_f64_vec(), vec![7.0, 8.0, 9.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn test_read_region_3d() {
        let mut array = ramp(&[3, 3, 3]);
        let region = array.read_region(&[1, 0, 2], &[2, 2, 1]).unwrap();
        assert_eq!(region.to_f64_vec(), vec![11.0, 14.0, 20.0, 23.0]);
    }

    #[test]
    fn test_read_region_out_of_bounds() {
        let mut array = ramp(&[4, 5]);
        assert!(array.read_region(&[3, 0], &[2, 5]).is_err());
        assert!(array.read_region(&[0], &[1]).is_err());
    }

    #[test]
    fn test_flip_axis() {
        let array = ramp(&[2, 3]);
        assert_eq!(array.flip_axis(1).to_f64_vec(), vec![2.0, 1.0, 0.0, 5.0, 4.0, 3.0]);
        assert_eq!(array.flip_axis(0).to_f64_vec(), vec![3.0, 4.0, 5.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_typed_values() {
        let array = NdArray::from_f32(&[2], &[1.5, -2.25]).unwrap();
        assert_eq!(array.bitpix(), Bitpix::F32);
        assert_eq!(array.get_f64(&[1]), Some(-2.25));
        assert_eq!(array.get_f64(&[2]), None);
        assert_eq!(array.fits_shape(), vec![2]);
    }
}
