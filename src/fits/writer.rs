//! FITS file writer
//!
//! Appends image HDUs to a stream. The first HDU written becomes the primary
//! HDU; every later one is an IMAGE extension. Structural keywords are
//! always regenerated from the array being written, the rest of the
//! supplied header is copied after them.

use log::debug;
use std::io::Write;

use crate::cutout::source::OutputSink;
use crate::extractor::array::NdArray;
use crate::fits::constants::{keywords, padded_len, xtension};
use crate::fits::errors::FitsResult;
use crate::fits::header::{Card, Header, HeaderValue};
use crate::fits::keywords::KeywordRules;

/// Append-only writer of image HDUs
pub struct FitsWriter<W: Write> {
    /// Destination stream
    writer: W,
    /// Rules naming the keywords dropped from every header
    rules: KeywordRules,
    /// HDUs written to the stream so far
    units_written: usize,
}

impl<W: Write> FitsWriter<W> {
    /// Creates a writer for an empty stream, using the default keyword rules
    pub fn new(writer: W) -> Self {
        FitsWriter::with_rules(writer, &KeywordRules::default())
    }

    /// Creates a writer for an empty stream with explicit keyword rules
    pub fn with_rules(writer: W, rules: &KeywordRules) -> Self {
        FitsWriter {
            writer,
            rules: rules.clone(),
            units_written: 0,
        }
    }

    /// Number of HDUs in the stream
    pub fn units_written(&self) -> usize {
        self.units_written
    }

    /// Give the stream back
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Build the header written for an array
    ///
    /// # Arguments
    /// * `source` - Header to carry over
    /// * `data` - Array the header will describe
    pub fn build_header(&self, source: &Header, data: &NdArray) -> Header {
        let primary = self.units_written == 0;
        let mut header = Header::new();

        if primary {
            header.push(Card::with_comment(
                keywords::SIMPLE,
                HeaderValue::Logical(true),
                "conforms to FITS standard",
            ));
        } else {
            header.push(Card::with_comment(
                keywords::XTENSION,
                HeaderValue::Text(xtension::IMAGE.to_string()),
                "Image extension",
            ));
        }

        header.push(Card::with_comment(
            keywords::BITPIX,
            HeaderValue::Integer(data.bitpix().code()),
            "array data type",
        ));
        header.push(Card::with_comment(
            keywords::NAXIS,
            HeaderValue::Integer(data.rank() as i64),
            "number of array dimensions",
        ));
        for (i, len) in data.fits_shape().iter().enumerate() {
            header.push(Card::new(&format!("{}{}", keywords::NAXIS, i + 1), HeaderValue::Integer(*len as i64)));
        }

        if primary {
            header.push(Card::new(keywords::EXTEND, HeaderValue::Logical(true)));
        } else {
            header.push(Card::with_comment(keywords::PCOUNT, HeaderValue::Integer(0), "number of parameters"));
            header.push(Card::with_comment(keywords::GCOUNT, HeaderValue::Integer(1), "number of groups"));
        }

        for card in source.iter() {
            if is_structural(&card.key) || self.rules.drops_on_write(&card.key) {
                continue;
            }
            header.push(card.clone());
        }

        header
    }
}

impl<W: Write> OutputSink for FitsWriter<W> {
    fn append(&mut self, header: &Header, data: &NdArray) -> FitsResult<()> {
        let header = self.build_header(header, data);
        self.writer.write_all(&header.to_bytes())?;

        let bytes = data.as_bytes();
        self.writer.write_all(bytes)?;
        let padding = padded_len(bytes.len()) - bytes.len();
        self.writer.write_all(&vec![0u8; padding])?;

        debug!(
            "Wrote HDU {} with shape {:?} ({} data bytes)",
            self.units_written,
            data.fits_shape(),
            bytes.len()
        );
        self.units_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> FitsResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keywords the writer regenerates itself
fn is_structural(key: &str) -> bool {
    match key {
        keywords::SIMPLE
        | keywords::XTENSION
        | keywords::BITPIX
        | keywords::EXTEND
        | keywords::PCOUNT
        | keywords::GCOUNT
        | keywords::END => true,
        _ => key
            .strip_prefix(keywords::NAXIS)
            .map_or(false, |rest| rest.chars().all(|c| c.is_ascii_digit())),
    }
}
