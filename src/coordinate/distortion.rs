//! Non-linear distortion terms attached to a coordinate frame

use lazy_static::lazy_static;
use regex::Regex;

use crate::fits::header::{Card, Header, HeaderValue};

lazy_static! {
    static ref SIP_KEY: Regex = Regex::new(r"^(A|B|AP|BP)_(ORDER|DMAX|\d+_\d+)$").unwrap();
}

/// Simple Imaging Polynomial (SIP) distortion terms
///
/// SIP polynomials are evaluated on pixel offsets from CRPIX, so they do not
/// carry an origin of their own: moving the reference pixel of the frame is
/// all a translation needs. The terms are kept as cards and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Distortion {
    terms: Vec<Card>,
}

impl Distortion {
    /// Collect SIP keywords from a header
    ///
    /// # Returns
    /// `None` when the header has no SIP keywords
    pub fn from_header(header: &Header) -> Option<Distortion> {
        let terms: Vec<Card> = header
            .iter()
            .filter(|c| SIP_KEY.is_match(&c.key) && c.value.as_f64().is_some())
            .cloned()
            .collect();

        if terms.is_empty() {
            None
        } else {
            Some(Distortion { terms })
        }
    }

    /// Polynomial order for `A`, `B`, `AP` or `BP`
    pub fn order(&self, polynomial: &str) -> Option<i64> {
        self.value(&format!("{}_ORDER", polynomial)).and_then(HeaderValue::as_i64)
    }

    fn value(&self, key: &str) -> Option<&HeaderValue> {
        self.terms.iter().find(|c| c.key == key).map(|c| &c.value)
    }

    /// Cards to write back into a header
    pub fn to_cards(&self) -> Vec<Card> {
        self.terms.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_sip_terms_only() {
        let header = Header::from_cards(vec![
            Card::new("CTYPE1", HeaderValue::Text("RA---TAN-SIP".to_string())),
            Card::new("A_ORDER", HeaderValue::Integer(2)),
            Card::new("A_0_2", HeaderValue::Float(1.5e-6)),
            Card::new("B_1_1", HeaderValue::Float(-2.0e-7)),
            Card::new("AB_1_1", HeaderValue::Float(3.0)),
        ]);

        let distortion = Distortion::from_header(&header).unwrap();
        assert_eq!(distortion.order("A"), Some(2));
        assert_eq!(distortion.order("B"), None);

        let keys: Vec<String> = distortion.to_cards().into_iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["A_ORDER", "A_0_2", "B_1_1"]);
    }

    #[test]
    fn test_none_without_terms() {
        let header = Header::from_cards(vec![Card::new("CRPIX1", HeaderValue::Float(1.0))]);
        assert!(Distortion::from_header(&header).is_none());
    }
}
