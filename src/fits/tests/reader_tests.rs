//! Tests for the FITS reader

use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cutout::request::ExtensionSpec;
use crate::cutout::source::SubUnitSource;
use crate::extractor::array::ArraySource;
use crate::fits::constants::BLOCK_SIZE;
use crate::fits::errors::FitsError;
use crate::fits::reader::FitsReader;
use crate::fits::tests::test_utils::{build_fits, fits_cursor, TestHdu};
use crate::fits::types::Bitpix;
use crate::utils::logger::Logger;

fn sample() -> Vec<TestHdu> {
    vec![
        TestHdu::empty_primary(),
        TestHdu::image(Some("SCI"), &[10, 8], 1000),
        TestHdu::table(Some("CAT")),
        TestHdu::image(Some("SCI"), &[6, 5, 4], 2000),
    ]
}

/// Cursor that counts the bytes and seeks asked of it
struct CountingReader {
    inner: Cursor<Vec<u8>>,
    bytes: Arc<AtomicUsize>,
    seeks: Arc<AtomicUsize>,
}

impl Read for CountingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes.fetch_add(n, Ordering::SeqCst);
        Ok(n)
    }
}

impl Seek for CountingReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seeks.fetch_add(1, Ordering::SeqCst);
        self.inner.seek(pos)
    }
}

#[test]
fn test_walks_every_hdu() {
    let logger = Logger::silent();
    let mut reader = FitsReader::new(fits_cursor(&sample()), &logger).unwrap();
    let units = reader.hdus().unwrap();

    assert_eq!(units.len(), 4);
    let names: Vec<Option<String>> = units.iter().map(|u| u.extname()).collect();
    assert_eq!(names, vec![None, Some("SCI".to_string()), Some("CAT".to_string()), Some("SCI".to_string())]);
    assert_eq!(units[1].shape, vec![8, 10]);
    assert_eq!(units[1].bitpix, Bitpix::I16);
    assert_eq!(units[3].fits_shape(), vec![6, 5, 4]);
    assert_eq!(units[1].data_offset, 2 * BLOCK_SIZE as u64);

    let images: Vec<bool> = units.iter().map(|u| u.is_image()).collect();
    assert_eq!(images, vec![false, true, false, true]);
}

#[test]
fn test_lazy_region_matches_full_read() {
    let logger = Logger::silent();
    let mut reader = FitsReader::new(fits_cursor(&sample()), &logger).unwrap();
    let units = reader.hdus().unwrap();
    let cube = &units[3];

    let mut full = reader.read_data(cube).unwrap();
    assert_eq!(full.get_f64(&[3, 4, 5]), Some((2000 + 3 * 30 + 4 * 6 + 5) as f64));

    let start = [1, 2, 1];
    let shape = [2, 3, 4];
    let lazy = reader.data_view(cube).unwrap().read_region(&start, &shape).unwrap();
    let eager = full.read_region(&start, &shape).unwrap();
    assert_eq!(lazy, eager);
}

#[test]
fn test_locate_reads_headers_only() {
    let logger = Logger::silent();
    let mut reader = FitsReader::new(fits_cursor(&sample()), &logger).unwrap();

    let unit = reader.locate(&ExtensionSpec::NameOccurrence("sci".to_string(), 2)).unwrap().unwrap();
    assert_eq!(unit.index, 3);

    let unit = reader.locate(&ExtensionSpec::Index(2)).unwrap().unwrap();
    assert_eq!(unit.extname().as_deref(), Some("CAT"));

    assert!(reader.locate(&ExtensionSpec::Name("ERR".to_string())).unwrap().is_none());
}

#[test]
fn test_truncated_data_unit() {
    let logger = Logger::silent();
    let mut bytes = build_fits(&sample());
    bytes.truncate(bytes.len() - BLOCK_SIZE);

    let mut reader = FitsReader::new(Cursor::new(bytes), &logger).unwrap();
    assert!(matches!(reader.hdus(), Err(FitsError::UnexpectedEof)));
}

#[test]
fn test_trailing_bytes_are_ignored() {
    let logger = Logger::silent();
    let mut bytes = build_fits(&sample());
    bytes.extend_from_slice(&[0u8; 100]);

    let mut reader = FitsReader::new(Cursor::new(bytes), &logger).unwrap();
    assert_eq!(reader.hdus().unwrap().len(), 4);
}

#[test]
fn test_not_a_fits_file() {
    let logger = Logger::silent();
    let mut bytes = format!("{:<80}", "END").into_bytes();
    bytes.resize(BLOCK_SIZE, b' ');

    let mut reader = FitsReader::new(Cursor::new(bytes), &logger).unwrap();
    assert!(matches!(reader.next_unit(), Err(FitsError::InvalidHeader(_))));

    let mut empty = FitsReader::new(Cursor::new(vec![0u8; 10]), &logger).unwrap();
    assert!(matches!(empty.next_unit(), Err(FitsError::UnexpectedEof)));
}

#[test]
fn test_region_reads_only_requested_bytes() {
    let bytes = Arc::new(AtomicUsize::new(0));
    let seeks = Arc::new(AtomicUsize::new(0));
    let counting = CountingReader {
        inner: Cursor::new(build_fits(&[TestHdu::primary_image(&[100, 50], 0)])),
        bytes: Arc::clone(&bytes),
        seeks: Arc::clone(&seeks),
    };

    let logger = Logger::silent();
    let mut reader = FitsReader::new(counting, &logger).unwrap();
    let unit = reader.hdus().unwrap().remove(0);

    // Narrow column band: one read per row, nothing more
    bytes.store(0, Ordering::SeqCst);
    let band = reader.data_view(&unit).unwrap().read_region(&[0, 0], &[50, 10]).unwrap();
    assert_eq!(bytes.load(Ordering::SeqCst), 50 * 10 * 2);
    assert_eq!(band.to_f64_vec()[10], 100.0);

    // Full-width rows are adjacent on disk: one seek, one contiguous read
    bytes.store(0, Ordering::SeqCst);
    seeks.store(0, Ordering::SeqCst);
    let rows = reader.data_view(&unit).unwrap().read_region(&[10, 0], &[10, 100]).unwrap();
    assert_eq!(bytes.load(Ordering::SeqCst), 10 * 100 * 2);
    assert_eq!(seeks.load(Ordering::SeqCst), 1);
    assert_eq!(rows.to_f64_vec()[0], 1000.0);
}
