//! FITS header cards and ordered headers
//!
//! A FITS header is a sequence of 80-character cards stored in 2880-byte
//! blocks and terminated by an `END` card. This module keeps the cards in
//! file order, since several consumers care about where a keyword sits
//! (WCSAXES must precede the other WCS keywords, for example).

use std::fmt;
use std::io::Read;

use log::trace;

use crate::fits::constants::{keywords, BLOCK_SIZE, CARD_SIZE, KEYWORD_SIZE, VALUE_END_COLUMN};
use crate::fits::errors::{FitsError, FitsResult};

/// Longest string value that still leaves room for both quotes on a card
const MAX_STRING_VALUE: usize = CARD_SIZE - KEYWORD_SIZE - 4;

/// The value field of a header card
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    /// `T` or `F`
    Logical(bool),
    /// Integer value
    Integer(i64),
    /// Real value (`E` and `D` exponents are accepted)
    Float(f64),
    /// Quoted character string, trailing blanks removed
    Text(String),
    /// Value kept verbatim, e.g. complex numbers
    Raw(String),
    /// Commentary card or undefined value
    Empty,
}

impl HeaderValue {
    /// Parse an unquoted value token
    fn parse_token(token: &str) -> HeaderValue {
        match token {
            "" => HeaderValue::Empty,
            "T" => HeaderValue::Logical(true),
            "F" => HeaderValue::Logical(false),
            _ => {
                if let Ok(v) = token.parse::<i64>() {
                    HeaderValue::Integer(v)
                } else if let Ok(v) = token.replace(|c: char| c == 'D' || c == 'd', "E").parse::<f64>() {
                    HeaderValue::Float(v)
                } else {
                    HeaderValue::Raw(token.to_string())
                }
            }
        }
    }

    /// Integer view of the value; whole floats are accepted
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Integer(v) => Some(*v),
            HeaderValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Real view of the value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Integer(v) => Some(*v as f64),
            HeaderValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// String view of the value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Logical view of the value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HeaderValue::Logical(b) => Some(*b),
            _ => None,
        }
    }

    /// Render the value field as it appears after `= `
    fn format_field(&self) -> String {
        let width = VALUE_END_COLUMN - KEYWORD_SIZE - 2;
        match self {
            HeaderValue::Logical(b) => format!("{:>width$}", if *b { "T" } else { "F" }),
            HeaderValue::Integer(v) => format!("{:>width$}", v),
            HeaderValue::Float(v) => format!("{:>width$}", format_float(*v)),
            HeaderValue::Text(s) => {
                let mut escaped = s.replace('\'', "''");
                if escaped.len() > MAX_STRING_VALUE {
                    escaped.truncate(MAX_STRING_VALUE);
                }
                format!("'{:<8}'", escaped)
            }
            HeaderValue::Raw(s) => format!("{:>width$}", s),
            HeaderValue::Empty => String::new(),
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Logical(b) => write!(f, "{}", if *b { "T" } else { "F" }),
            HeaderValue::Integer(v) => write!(f, "{}", v),
            HeaderValue::Float(v) => write!(f, "{}", format_float(*v)),
            HeaderValue::Text(s) => write!(f, "'{}'", s),
            HeaderValue::Raw(s) => write!(f, "{}", s),
            HeaderValue::Empty => Ok(()),
        }
    }
}

/// Format a real so that it always carries a decimal point, with an upper-case exponent
fn format_float(v: f64) -> String {
    let mut s = format!("{:?}", v).to_uppercase();
    if let Some(pos) = s.find('E') {
        if !s[..pos].contains('.') {
            s.insert_str(pos, ".0");
        }
    }
    s
}

/// A single header card
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Keyword, upper case, at most 8 characters
    pub key: String,
    /// Value field
    pub value: HeaderValue,
    /// Comment, or the text of a commentary card
    pub comment: String,
    /// Card read without a value indicator; written back as it was read
    verbatim: bool,
}

impl Card {
    /// Create a card without a comment
    pub fn new(key: &str, value: HeaderValue) -> Self {
        Card {
            key: normalize_key(key),
            value,
            comment: String::new(),
            verbatim: false,
        }
    }

    /// Create a card with a comment
    pub fn with_comment(key: &str, value: HeaderValue, comment: &str) -> Self {
        Card {
            key: normalize_key(key),
            value,
            comment: comment.to_string(),
            verbatim: false,
        }
    }

    /// Whether this card carries text rather than a value
    ///
    /// COMMENT, HISTORY and blank-keyword cards, plus any card read without
    /// a `= ` value indicator (CONTINUE, HIERARCH and the like).
    pub fn is_commentary(&self) -> bool {
        self.verbatim
            || (matches!(self.value, HeaderValue::Empty)
                && (self.key.is_empty() || self.key == keywords::COMMENT || self.key == keywords::HISTORY))
    }

    /// Parse one 80-byte card image
    pub fn parse(raw: &[u8]) -> FitsResult<Card> {
        if raw.len() != CARD_SIZE {
            return Err(FitsError::InvalidHeader(format!("card of {} bytes", raw.len())));
        }

        // Anything outside printable ASCII is illegal in a header; treat it as blank
        let text: String = raw
            .iter()
            .map(|&b| if (32..127).contains(&b) { b as char } else { ' ' })
            .collect();

        let key = text[..KEYWORD_SIZE].trim_end().to_string();
        let rest = &text[KEYWORD_SIZE..];

        if !rest.starts_with("= ") || key == keywords::COMMENT || key == keywords::HISTORY {
            return Ok(Card {
                key,
                value: HeaderValue::Empty,
                comment: rest.trim_end().to_string(),
                verbatim: true,
            });
        }

        let (value, comment) = split_value_field(&rest[2..])?;
        trace!("Parsed card {} = {:?}", key, value);

        Ok(Card {
            key,
            value,
            comment,
            verbatim: false,
        })
    }

    /// Render the card as exactly 80 characters
    pub fn to_card_string(&self) -> String {
        let mut line = format!("{:<width$}", self.key, width = KEYWORD_SIZE);

        if self.is_commentary() {
            line.push_str(&self.comment);
        } else {
            line.push_str("= ");
            line.push_str(&self.value.format_field());
            if !self.comment.is_empty() {
                line.push_str(" / ");
                line.push_str(&self.comment);
            }
        }

        line.truncate(CARD_SIZE);
        format!("{:<width$}", line, width = CARD_SIZE)
    }
}

/// Split the text after `= ` into a value and a comment
fn split_value_field(field: &str) -> FitsResult<(HeaderValue, String)> {
    let trimmed = field.trim_start();

    if let Some(body) = trimmed.strip_prefix('\'') {
        let mut value = String::new();
        let mut end = None;
        let mut chars = body.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if c != '\'' {
                value.push(c);
                continue;
            }
            // A doubled quote is an escaped quote
            if let Some(&(_, '\'')) = chars.peek() {
                value.push('\'');
                chars.next();
            } else {
                end = Some(i + 1);
                break;
            }
        }

        let end = end.ok_or_else(|| {
            FitsError::InvalidHeader(format!("unterminated string value: {}", field.trim()))
        })?;

        let comment = body[end..]
            .trim_start()
            .strip_prefix('/')
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        return Ok((HeaderValue::Text(value.trim_end().to_string()), comment));
    }

    let (token, comment) = match trimmed.find('/') {
        Some(i) => (&trimmed[..i], trimmed[i + 1..].trim().to_string()),
        None => (trimmed, String::new()),
    };

    Ok((HeaderValue::parse_token(token.trim()), comment))
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_uppercase()
}

/// An ordered FITS header (the `END` card is implicit)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    /// Create an empty header
    pub fn new() -> Self {
        Header { cards: Vec::new() }
    }

    /// Create a header from cards, in order
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Header { cards }
    }

    /// All cards in order
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the header holds no cards
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Position of the first card with this keyword
    pub fn index_of(&self, key: &str) -> Option<usize> {
        let key = normalize_key(key);
        self.cards.iter().position(|c| c.key == key)
    }

    /// Whether a keyword is present
    pub fn contains(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    /// Value of the first card with this keyword
    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.index_of(key).map(|i| &self.cards[i].value)
    }

    /// Integer value of a keyword
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(HeaderValue::as_i64)
    }

    /// Real value of a keyword
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(HeaderValue::as_f64)
    }

    /// String value of a keyword
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(HeaderValue::as_str)
    }

    /// Set a keyword's value in place, or append it when absent
    pub fn set(&mut self, key: &str, value: HeaderValue) {
        self.set_card(Card::new(key, value));
    }

    /// Set a card in place (keeping the old comment when the new one is blank),
    /// or append it when absent
    pub fn set_card(&mut self, card: Card) {
        match self.index_of(&card.key) {
            Some(i) => {
                let existing = &mut self.cards[i];
                existing.value = card.value;
                if !card.comment.is_empty() {
                    existing.comment = card.comment;
                }
            }
            None => self.cards.push(card),
        }
    }

    /// Insert a card at a position (clamped to the end)
    pub fn insert(&mut self, index: usize, card: Card) {
        let index = index.min(self.cards.len());
        self.cards.insert(index, card);
    }

    /// Append a card without checking for duplicates
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Remove every card with this keyword, returning how many were removed
    pub fn remove_all(&mut self, key: &str) -> usize {
        let key = normalize_key(key);
        let before = self.cards.len();
        self.cards.retain(|c| c.key != key);
        before - self.cards.len()
    }

    /// Overlay another header: existing keywords are updated in place,
    /// new keywords are appended. Commentary cards are not copied.
    pub fn update(&mut self, other: &Header) {
        for card in other.cards.iter().filter(|c| !c.is_commentary()) {
            self.set_card(card.clone());
        }
    }

    /// Axis lengths in FITS order (NAXIS1 first)
    pub fn axes(&self) -> FitsResult<Vec<usize>> {
        let naxis = self
            .get_i64(keywords::NAXIS)
            .ok_or_else(|| FitsError::InvalidHeader("missing NAXIS".to_string()))?;
        if naxis < 0 {
            return Err(FitsError::InvalidHeader(format!("NAXIS = {}", naxis)));
        }

        (1..=naxis)
            .map(|i| {
                let key = format!("{}{}", keywords::NAXIS, i);
                match self.get_i64(&key) {
                    Some(len) if len >= 0 => Ok(len as usize),
                    Some(len) => Err(FitsError::InvalidHeader(format!("{} = {}", key, len))),
                    None => Err(FitsError::InvalidHeader(format!("missing {}", key))),
                }
            })
            .collect()
    }

    /// EXTNAME with trailing blanks removed
    pub fn extname(&self) -> Option<String> {
        self.get_str(keywords::EXTNAME)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Read header blocks until the END card
    ///
    /// # Returns
    /// The header and the number of bytes consumed (a multiple of the block size)
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> FitsResult<(Header, usize)> {
        let mut cards = Vec::new();
        let mut block = vec![0u8; BLOCK_SIZE];
        let mut consumed = 0;

        loop {
            reader.read_exact(&mut block)?;
            consumed += BLOCK_SIZE;

            for raw in block.chunks_exact(CARD_SIZE) {
                let card = Card::parse(raw)?;
                if card.key == keywords::END {
                    return Ok((Header { cards }, consumed));
                }
                // Blank padding cards carry nothing
                if card.key.is_empty() && card.comment.trim().is_empty() {
                    continue;
                }
                cards.push(card);
            }
        }
    }

    /// Serialise the header, END card and block padding
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.cards.len() + 1) * CARD_SIZE);
        for card in &self.cards {
            bytes.extend_from_slice(card.to_card_string().as_bytes());
        }
        bytes.extend_from_slice(format!("{:<width$}", keywords::END, width = CARD_SIZE).as_bytes());

        let padded = crate::fits::constants::padded_len(bytes.len());
        bytes.resize(padded, b' ');
        bytes
    }

    /// Iterate over cards
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for card in &self.cards {
            writeln!(f, "{}", card.to_card_string().trim_end())?;
        }
        Ok(())
    }
}
