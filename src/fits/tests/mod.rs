//! Tests for the FITS codec

mod reader_tests;
