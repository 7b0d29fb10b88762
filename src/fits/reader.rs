//! FITS file reader
//!
//! The reader walks HDUs by parsing each header and skipping over the data
//! unit that follows it. Data is never loaded up front: `data_view` hands
//! out an `ArraySource` that reads only the rows of a requested box, merging
//! rows that are adjacent on disk into one read.

use log::{debug, info, warn};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::cutout::source::SubUnitSource;
use crate::extractor::array::{check_region, for_each_row, ArraySource, NdArray};
use crate::fits::constants::BLOCK_SIZE;
use crate::fits::errors::{FitsError, FitsResult};
use crate::fits::hdu::HduInfo;
use crate::fits::header::Header;
use crate::fits::types::Bitpix;
use crate::io::seekable::SeekableReader;
use crate::utils::logger::Logger;

/// Reader over a FITS stream
pub struct FitsReader<'a, R: SeekableReader> {
    /// Underlying stream
    reader: R,
    /// Logger instance
    logger: &'a Logger,
    /// Total stream length in bytes
    stream_len: u64,
    /// Offset of the next header to read
    next_offset: u64,
    /// Index of the next HDU
    next_index: usize,
}

impl<'a> FitsReader<'a, File> {
    /// Opens a FITS file from the given path
    ///
    /// The file is left unbuffered: headers are read a block at a time and
    /// data rows are read exactly, so a buffer would only add read-ahead.
    ///
    /// # Arguments
    /// * `filepath` - Path to the FITS file
    /// * `logger` - Logger for recording operations
    pub fn open(filepath: &str, logger: &'a Logger) -> FitsResult<Self> {
        info!("Opening FITS file: {}", filepath);
        let file = File::open(Path::new(filepath))?;
        FitsReader::new(file, logger)
    }
}

impl<'a, R: SeekableReader> FitsReader<'a, R> {
    /// Creates a reader over any seekable stream positioned anywhere
    pub fn new(mut reader: R, logger: &'a Logger) -> FitsResult<Self> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        debug!("FITS stream of {} bytes", stream_len);

        Ok(FitsReader {
            reader,
            logger,
            stream_len,
            next_offset: 0,
            next_index: 0,
        })
    }

    /// Read the layout of every HDU in the stream
    pub fn hdus(&mut self) -> FitsResult<Vec<HduInfo>> {
        self.rewind()?;
        let mut units = Vec::new();
        while let Some(unit) = self.next_unit()? {
            units.push(unit);
        }
        Ok(units)
    }

    /// Read a whole data unit into memory
    pub fn read_data(&mut self, unit: &HduInfo) -> FitsResult<NdArray> {
        let shape = unit.shape.clone();
        let start = vec![0; shape.len()];
        self.data_view(unit)?.read_region(&start, &shape)
    }

    /// Give the stream back
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<'a, R: SeekableReader> SubUnitSource for FitsReader<'a, R> {
    fn rewind(&mut self) -> FitsResult<()> {
        self.next_offset = 0;
        self.next_index = 0;
        Ok(())
    }

    fn next_unit(&mut self) -> FitsResult<Option<HduInfo>> {
        let remaining = self.stream_len.saturating_sub(self.next_offset);
        if remaining == 0 {
            return Ok(None);
        }
        if remaining < BLOCK_SIZE as u64 {
            if self.next_index == 0 {
                return Err(FitsError::UnexpectedEof);
            }
            warn!("Ignoring {} trailing bytes after HDU {}", remaining, self.next_index - 1);
            return Ok(None);
        }

        self.reader.seek(SeekFrom::Start(self.next_offset))?;
        let (header, consumed) = Header::read_from(&mut self.reader)?;
        let data_offset = self.next_offset + consumed as u64;
        let unit = HduInfo::from_header(self.next_index, header, data_offset)?;

        let data_end = unit.data_offset.checked_add(unit.data_size as u64);
        if data_end.map_or(true, |end| end > self.stream_len) {
            return Err(FitsError::UnexpectedEof);
        }

        self.logger.debug(&format!(
            "HDU {} at {}: EXTNAME {:?}, BITPIX {}, shape {:?}",
            unit.index,
            self.next_offset,
            unit.extname(),
            unit.bitpix,
            unit.fits_shape()
        ));

        self.next_offset = unit.next_offset();
        self.next_index += 1;
        Ok(Some(unit))
    }

    fn data_view<'s>(&'s mut self, unit: &HduInfo) -> FitsResult<Box<dyn ArraySource + 's>> {
        Ok(Box::new(HduDataView {
            reader: &mut self.reader,
            offset: unit.data_offset,
            bitpix: unit.bitpix,
            shape: unit.shape.clone(),
        }))
    }
}

/// Lazy view over one data unit
pub struct HduDataView<'r, R: SeekableReader> {
    /// Stream holding the data unit
    reader: &'r mut R,
    /// Byte offset of the first element
    offset: u64,
    /// Element type
    bitpix: Bitpix,
    /// Shape in storage order
    shape: Vec<usize>,
}

impl<'r, R: SeekableReader> ArraySource for HduDataView<'r, R> {
    fn bitpix(&self) -> Bitpix {
        self.bitpix
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn read_region(&mut self, start: &[usize], shape: &[usize]) -> FitsResult<NdArray> {
        check_region(&self.shape, start, shape)?;

        // (source element, destination element, length) of each contiguous run
        let mut runs: Vec<(usize, usize, usize)> = Vec::new();
        for_each_row(&self.shape, start, shape, |src, dst, len| {
            match runs.last_mut() {
                Some((s, d, n)) if *s + *n == src && *d + *n == dst => *n += len,
                _ => runs.push((src, dst, len)),
            }
            Ok(())
        })?;

        let size = self.bitpix.bytes_per_element();
        let mut out = NdArray::zeros(self.bitpix, shape);
        let buffer = out.as_bytes_mut();
        let mut position = None;

        for (src, dst, len) in runs {
            let target = self.offset + (src * size) as u64;
            if position != Some(target) {
                self.reader.seek(SeekFrom::Start(target))?;
            }
            self.reader.read_exact(&mut buffer[dst * size..(dst + len) * size])?;
            position = Some(target + (len * size) as u64);
        }

        Ok(out)
    }
}
