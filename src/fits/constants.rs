//! FITS format constants

/// Size of a header or data block in bytes
pub const BLOCK_SIZE: usize = 2880;

/// Size of a single header card in bytes
pub const CARD_SIZE: usize = 80;

/// Width of the keyword field of a card
pub const KEYWORD_SIZE: usize = 8;

/// Number of cards in one header block
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Column (0-based) where a fixed-format value ends
pub const VALUE_END_COLUMN: usize = 30;

/// Reserved and WCS keywords used by the reader, writer and sanitizer
pub mod keywords {
    pub const SIMPLE: &str = "SIMPLE";
    pub const XTENSION: &str = "XTENSION";
    pub const BITPIX: &str = "BITPIX";
    pub const NAXIS: &str = "NAXIS";
    pub const EXTEND: &str = "EXTEND";
    pub const PCOUNT: &str = "PCOUNT";
    pub const GCOUNT: &str = "GCOUNT";
    pub const EXTNAME: &str = "EXTNAME";
    pub const END: &str = "END";
    pub const COMMENT: &str = "COMMENT";
    pub const HISTORY: &str = "HISTORY";

    pub const WCSAXES: &str = "WCSAXES";
    pub const CTYPE1: &str = "CTYPE1";
}

/// XTENSION values
pub mod xtension {
    pub const IMAGE: &str = "IMAGE";
}

/// Round a byte count up to a whole number of blocks
pub fn padded_len(len: usize) -> usize {
    (len + BLOCK_SIZE - 1) / BLOCK_SIZE * BLOCK_SIZE
}
