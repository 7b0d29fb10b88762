//! Layout of one header-data unit

use crate::extractor::array::{checked_element_count, element_count};
use crate::fits::constants::{keywords, padded_len, xtension, BLOCK_SIZE};
use crate::fits::errors::{FitsError, FitsResult};
use crate::fits::header::Header;
use crate::fits::types::Bitpix;

/// Header and data location of one HDU
#[derive(Debug, Clone, PartialEq)]
pub struct HduInfo {
    /// 0-based position in the file
    pub index: usize,
    /// Parsed header
    pub header: Header,
    /// Byte offset of the data unit
    pub data_offset: u64,
    /// Element type
    pub bitpix: Bitpix,
    /// Array shape in storage order (NAXISn first)
    pub shape: Vec<usize>,
    /// Data size in bytes, without block padding
    pub data_size: usize,
}

impl HduInfo {
    /// Work out the data layout from a header
    ///
    /// The data size follows the standard rule
    /// `|BITPIX| / 8 * GCOUNT * (PCOUNT + NAXIS1 * ... * NAXISn)`, so the
    /// following HDU can be found even when this one is not an image.
    ///
    /// # Arguments
    /// * `index` - 0-based HDU index
    /// * `header` - Parsed header
    /// * `data_offset` - Byte offset of the first data block
    pub fn from_header(index: usize, header: Header, data_offset: u64) -> FitsResult<HduInfo> {
        let expected = if index == 0 { keywords::SIMPLE } else { keywords::XTENSION };
        if header.cards().first().map(|c| c.key.as_str()) != Some(expected) {
            return Err(FitsError::InvalidHeader(format!(
                "HDU {} does not start with {}",
                index, expected
            )));
        }

        let code = header
            .get_i64(keywords::BITPIX)
            .ok_or_else(|| FitsError::InvalidHeader(format!("HDU {} has no BITPIX", index)))?;
        let bitpix = Bitpix::from_code(code)?;

        let mut shape = header.axes()?;
        let pcount = header.get_i64(keywords::PCOUNT).unwrap_or(0).max(0) as usize;
        let gcount = header.get_i64(keywords::GCOUNT).unwrap_or(1).max(0) as usize;
        let elements = if shape.is_empty() && pcount == 0 {
            Some(0)
        } else {
            checked_element_count(&shape)
        };
        let data_size = elements
            .and_then(|n| n.checked_add(pcount))
            .and_then(|n| n.checked_mul(gcount))
            .and_then(|n| n.checked_mul(bitpix.bytes_per_element()))
            .filter(|n| n.checked_add(BLOCK_SIZE).is_some())
            .ok_or_else(|| {
                FitsError::InvalidHeader(format!("HDU {} data size overflows: axes {:?}", index, shape))
            })?;

        shape.reverse();
        Ok(HduInfo {
            index,
            header,
            data_offset,
            bitpix,
            shape,
            data_size,
        })
    }

    /// EXTNAME, if any
    pub fn extname(&self) -> Option<String> {
        self.header.extname()
    }

    /// Whether the HDU holds an image array that can be cut
    ///
    /// The primary HDU and IMAGE extensions qualify when they carry data;
    /// tables and empty units do not.
    pub fn is_image(&self) -> bool {
        let image_kind = self.index == 0
            || self
                .header
                .get_str(keywords::XTENSION)
                .map_or(false, |x| x.trim().eq_ignore_ascii_case(xtension::IMAGE));
        image_kind && element_count(&self.shape) > 0
    }

    /// Shape in FITS order (NAXIS1 first)
    pub fn fits_shape(&self) -> Vec<usize> {
        self.shape.iter().rev().copied().collect()
    }

    /// Byte offset just past this HDU's padded data
    pub fn next_offset(&self) -> u64 {
        self.data_offset + padded_len(self.data_size) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::header::{Card, HeaderValue};

    fn image_header(first: Card, naxes: &[i64]) -> Header {
        let mut header = Header::from_cards(vec![first, Card::new("BITPIX", HeaderValue::Integer(-32))]);
        header.push(Card::new("NAXIS", HeaderValue::Integer(naxes.len() as i64)));
        for (i, n) in naxes.iter().enumerate() {
            header.push(Card::new(&format!("NAXIS{}", i + 1), HeaderValue::Integer(*n)));
        }
        header
    }

    #[test]
    fn test_primary_layout() {
        let header = image_header(Card::new("SIMPLE", HeaderValue::Logical(true)), &[30, 20]);
        let info = HduInfo::from_header(0, header, 2880).unwrap();
        assert_eq!(info.shape, vec![20, 30]);
        assert_eq!(info.fits_shape(), vec![30, 20]);
        assert_eq!(info.data_size, 30 * 20 * 4);
        assert_eq!(info.next_offset(), 2880 + 2880);
        assert!(info.is_image());
    }

    #[test]
    fn test_empty_primary_is_not_an_image() {
        let header = image_header(Card::new("SIMPLE", HeaderValue::Logical(true)), &[]);
        let info = HduInfo::from_header(0, header, 2880).unwrap();
        assert_eq!(info.data_size, 0);
        assert_eq!(info.next_offset(), 2880);
        assert!(!info.is_image());
    }

    #[test]
    fn test_table_extension_is_skipped_but_sized() {
        let mut header = image_header(Card::new("XTENSION", HeaderValue::Text("BINTABLE".to_string())), &[16, 100]);
        header.set("BITPIX", HeaderValue::Integer(8));
        header.push(Card::new("PCOUNT", HeaderValue::Integer(400)));
        header.push(Card::new("GCOUNT", HeaderValue::Integer(1)));
        let info = HduInfo::from_header(3, header, 0).unwrap();
        assert_eq!(info.data_size, 1600 + 400);
        assert!(!info.is_image());
    }

    #[test]
    fn test_oversized_axes_are_rejected() {
        let header = image_header(
            Card::new("SIMPLE", HeaderValue::Logical(true)),
            &[1 << 40, 1 << 40, 1 << 20],
        );
        assert!(matches!(HduInfo::from_header(0, header, 2880), Err(FitsError::InvalidHeader(_))));
    }

    #[test]
    fn test_wrong_leading_keyword() {
        let header = image_header(Card::new("SIMPLE", HeaderValue::Logical(true)), &[4]);
        assert!(matches!(HduInfo::from_header(1, header, 0), Err(FitsError::InvalidHeader(_))));
    }
}
