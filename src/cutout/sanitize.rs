//! Header clean-up for a cutout
//!
//! The source header is carried into the output, so anything describing the
//! source array has to be replaced with the cutout's own frame, and keys the
//! rules flag are removed.

use log::debug;

use crate::extractor::CutoutResult;
use crate::fits::constants::keywords;
use crate::fits::header::{Card, Header, HeaderValue};
use crate::fits::keywords::KeywordRules;
use crate::utils::logger::Logger;

/// Rewrites a source header so it describes a cutout
pub struct HeaderSanitizer<'a> {
    /// Keyword lists to apply
    rules: &'a KeywordRules,
    /// Logger for recording operations
    logger: &'a Logger,
}

impl<'a> HeaderSanitizer<'a> {
    /// Create a new sanitizer
    ///
    /// # Arguments
    /// * `rules` - Keyword lists to apply
    /// * `logger` - Logger for recording operations
    pub fn new(rules: &'a KeywordRules, logger: &'a Logger) -> Self {
        HeaderSanitizer { rules, logger }
    }

    /// Sanitise a copy of the source header in place
    ///
    /// # Arguments
    /// * `header` - Header of the source HDU, modified in place
    /// * `result` - The cutout the header will accompany
    pub fn sanitize(&self, header: &mut Header, result: &CutoutResult) {
        for key in &self.rules.sanitize_remove {
            let removed = header.remove_all(key);
            if removed > 0 {
                self.logger.debug(&format!("Removed {} {} card(s)", removed, key));
            }
        }

        if let Some(frame) = &result.frame {
            header.update(&frame.to_header());
            self.rewrite_cd_matrix(header, frame.naxis());
            header.set(keywords::WCSAXES, HeaderValue::Integer(frame.naxis() as i64));
        }

        move_wcsaxes_before_ctype(header);
    }

    /// Turn `CDi_j` into `PCi_j` where no PC element exists, then drop all CD elements
    fn rewrite_cd_matrix(&self, header: &mut Header, naxis: usize) {
        for i in 1..=naxis {
            for j in 1..=naxis {
                let cd = format!("CD{}_{}", i, j);
                let pc = format!("PC{}_{}", i, j);

                let Some(index) = header.index_of(&cd) else {
                    continue;
                };
                if !header.contains(&pc) {
                    let card = header.cards()[index].clone();
                    header.insert(index, Card::with_comment(&pc, card.value, &card.comment));
                    debug!("Renamed {} to {}", cd, pc);
                }
                header.remove_all(&cd);
            }
        }
    }
}

/// Move WCSAXES to just before CTYPE1 when it follows it
fn move_wcsaxes_before_ctype(header: &mut Header) {
    let (Some(wcsaxes), Some(ctype1)) = (header.index_of(keywords::WCSAXES), header.index_of(keywords::CTYPE1)) else {
        return;
    };
    if wcsaxes < ctype1 {
        return;
    }

    let card = header.cards()[wcsaxes].clone();
    header.remove_all(keywords::WCSAXES);
    header.insert(ctype1, card);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::frame::CoordinateFrame;
    use crate::extractor::NdArray;
    use crate::fits::types::Bitpix;

    fn float(key: &str, v: f64) -> Card {
        Card::new(key, HeaderValue::Float(v))
    }

    fn text(key: &str, v: &str) -> Card {
        Card::new(key, HeaderValue::Text(v.to_string()))
    }

    fn result(frame: Option<CoordinateFrame>) -> CutoutResult {
        CutoutResult {
            data: NdArray::zeros(Bitpix::F32, &[4, 5]),
            frame,
        }
    }

    #[test]
    fn test_cd_matrix_becomes_pc() {
        let header = Header::from_cards(vec![
            Card::new("NAXIS", HeaderValue::Integer(2)),
            Card::new("NAXIS1", HeaderValue::Integer(5)),
            Card::new("NAXIS2", HeaderValue::Integer(4)),
            text("CTYPE1", "RA---TAN"),
            text("CTYPE2", "DEC--TAN"),
            float("CRPIX1", 3.0),
            float("CRPIX2", 2.0),
            float("CD1_1", -0.1),
            float("CD1_2", 0.0),
            float("CD2_1", 0.0),
            float("CD2_2", 0.1),
        ]);
        let frame = CoordinateFrame::from_header(&header).unwrap();
        let rules = KeywordRules::empty();
        let logger = Logger::silent();
        let sanitizer = HeaderSanitizer::new(&rules, &logger);

        let mut sanitized = header.clone();
        sanitizer.sanitize(&mut sanitized, &result(Some(frame)));

        assert_eq!(sanitized.get_f64("PC1_1"), Some(-0.1));
        assert_eq!(sanitized.get_f64("PC2_2"), Some(0.1));
        for key in ["CD1_1", "CD1_2", "CD2_1", "CD2_2"] {
            assert!(!sanitized.contains(key), "{} left behind", key);
        }
        assert_eq!(sanitized.get_i64("WCSAXES"), Some(2));
    }

    #[test]
    fn test_cd_rewrite_covers_extra_wcs_axes() {
        let mut header = Header::from_cards(vec![
            Card::new("NAXIS", HeaderValue::Integer(2)),
            Card::new("NAXIS1", HeaderValue::Integer(5)),
            Card::new("NAXIS2", HeaderValue::Integer(4)),
            Card::new("WCSAXES", HeaderValue::Integer(3)),
            text("CTYPE1", "RA---TAN"),
            text("CTYPE2", "DEC--TAN"),
            text("CTYPE3", "WAVE"),
            float("CD1_1", -0.1),
            float("CD2_2", 0.1),
            float("CD3_3", 2.0),
        ]);
        let frame = CoordinateFrame::from_header(&header).unwrap();
        let rules = KeywordRules::empty();
        let logger = Logger::silent();
        HeaderSanitizer::new(&rules, &logger).sanitize(&mut header, &result(Some(frame)));

        assert!(!header.contains("CD3_3"));
        assert_eq!(header.get_f64("PC3_3"), Some(2.0));
        assert_eq!(header.get_i64("WCSAXES"), Some(3));
    }

    #[test]
    fn test_cd_dropped_when_pc_exists() {
        let mut header = Header::from_cards(vec![
            Card::new("NAXIS", HeaderValue::Integer(2)),
            float("PC1_1", 0.5),
            float("CD1_1", 9.0),
        ]);
        let rules = KeywordRules::empty();
        let logger = Logger::silent();
        let sanitizer = HeaderSanitizer::new(&rules, &logger);
        let frame = CoordinateFrame::new(vec![1.0, 1.0], vec![0.0, 0.0], vec![1.0, 1.0])
            .with_pc(vec![vec![0.5, 0.0], vec![0.0, 1.0]]);

        sanitizer.sanitize(&mut header, &result(Some(frame)));
        assert_eq!(header.get_f64("PC1_1"), Some(0.5));
        assert!(!header.contains("CD1_1"));
    }

    #[test]
    fn test_deny_list_removed() {
        let mut header = Header::from_cards(vec![
            text("DQ1", "a"),
            text("OBJECT", "M31"),
            text("DQ2", "b"),
            text("DQ1", "c"),
        ]);
        let rules = KeywordRules::default();
        let logger = Logger::silent();
        HeaderSanitizer::new(&rules, &logger).sanitize(&mut header, &result(None));

        assert_eq!(header.len(), 1);
        assert_eq!(header.get_str("OBJECT"), Some("M31"));
    }

    #[test]
    fn test_wcsaxes_moved_before_ctype1() {
        let mut header = Header::from_cards(vec![
            text("CTYPE1", "RA---TAN"),
            text("CTYPE2", "DEC--TAN"),
            Card::new("WCSAXES", HeaderValue::Integer(2)),
        ]);
        let rules = KeywordRules::empty();
        let logger = Logger::silent();
        HeaderSanitizer::new(&rules, &logger).sanitize(&mut header, &result(None));

        let keys: Vec<&str> = header.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["WCSAXES", "CTYPE1", "CTYPE2"]);
    }

    #[test]
    fn test_frame_overlay_updates_in_place() {
        let mut header = Header::from_cards(vec![
            Card::new("NAXIS", HeaderValue::Integer(2)),
            text("CTYPE1", "RA---TAN"),
            float("CRPIX1", 100.0),
            text("OBJECT", "M31"),
        ]);
        let mut frame = CoordinateFrame::from_header(&header).unwrap();
        frame.shift_reference_pixel(0, -40.0);
        let rules = KeywordRules::empty();
        let logger = Logger::silent();
        HeaderSanitizer::new(&rules, &logger).sanitize(&mut header, &result(Some(frame)));

        assert_eq!(header.index_of("CRPIX1"), Some(3));
        assert_eq!(header.get_f64("CRPIX1"), Some(60.0));
        assert_eq!(header.index_of("WCSAXES"), Some(1));
        assert_eq!(header.get_str("OBJECT"), Some("M31"));
    }
}
