//! Hexdump rendering for byte buffers
//!
//! Rows hold eight bytes each:
//!
//! ```text
//! 00000000  48 65 6c 6c  6f 2c 20 44  |Hello, D|
//! 00000008  45 53 46 69  72 65 21 00  |ESFire!.|
//! ```
//!
//! The offset column is the position of the row's first byte, counted from
//! the offset passed by the caller.

use std::fmt::Write;

use derive_more::Display;
use tracing::trace;

/// Bytes shown per row
pub const ROW_LEN: usize = 8;

/// Direction of a traced buffer relative to the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Direction {
    /// Data sent to the card
    #[display(" =>")]
    In,
    /// Data received from the card
    #[display("<= ")]
    Out,
}

/// Render a single row starting at `offset`
///
/// Only the first [`ROW_LEN`] bytes of `bytes` are shown; missing columns of a
/// short row are padded with blanks in both the hex and ASCII columns.
pub fn line(bytes: &[u8], offset: usize) -> String {
    let row = &bytes[..bytes.len().min(ROW_LEN)];
    let mut out = String::with_capacity(48);

    let _ = write!(out, "{offset:08x} ");
    for col in 0..ROW_LEN {
        out.push_str(if col == 4 { "  " } else { " " });
        match row.get(col) {
            Some(b) => {
                let _ = write!(out, "{b:02x}");
            }
            None => out.push_str("  "),
        }
    }

    out.push_str("  |");
    for col in 0..ROW_LEN {
        out.push(match row.get(col) {
            Some(&b) if (0x20..0x7f).contains(&b) => b as char,
            Some(_) => '.',
            None => ' ',
        });
    }
    out.push('|');

    out
}

/// Iterate over the rows of `bytes`, numbering offsets from `base`
pub fn lines(bytes: &[u8], base: usize) -> impl Iterator<Item = String> + '_ {
    bytes
        .chunks(ROW_LEN)
        .enumerate()
        .map(move |(row, chunk)| line(chunk, base.wrapping_add(row * ROW_LEN)))
}

/// Render the whole buffer, rows joined by newlines
///
/// An empty buffer renders as an empty string.
pub fn dump(bytes: &[u8]) -> String {
    dump_at(bytes, 0)
}

/// Render the whole buffer with offsets counted from `base`
pub fn dump_at(bytes: &[u8], base: usize) -> String {
    lines(bytes, base).collect::<Vec<_>>().join("\n")
}

/// Emit a buffer as `trace` events, one per row
pub fn trace_buffer(direction: Direction, label: &str, bytes: &[u8], base: usize) {
    for row in lines(bytes, base) {
        trace!(target: "desfsh::buffer", "{label:>8} {direction} {row}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_row() {
        assert_eq!(
            line(b"Hello, DESFire!", 0),
            "00000000  48 65 6c 6c  6f 2c 20 44  |Hello, D|"
        );
    }

    #[test]
    fn test_partial_row_with_offset() {
        assert_eq!(
            line(b"AB", 0x100),
            "00000100  41 42                     |AB      |"
        );
    }

    #[test]
    fn test_ten_bytes_two_rows() {
        let bytes: Vec<u8> = (0..10).collect();
        let dump = dump(&bytes);

        assert_eq!(dump.lines().count(), 2);
        assert_eq!(
            dump,
            "00000000  00 01 02 03  04 05 06 07  |........|\n\
             00000008  08 09                     |..      |"
        );
    }

    #[test]
    fn test_non_printables() {
        assert_eq!(
            dump(b"Hello, DESFire!\x00\xff"),
            "00000000  48 65 6c 6c  6f 2c 20 44  |Hello, D|\n\
             00000008  45 53 46 69  72 65 21 00  |ESFire!.|\n\
             00000010  ff                        |.       |"
        );
    }

    #[test]
    fn test_threaded_offset() {
        let rows: Vec<_> = lines(&[0u8; 9], 0x20).collect();
        assert!(rows[0].starts_with("00000020 "));
        assert!(rows[1].starts_with("00000028 "));
    }

    #[test]
    fn test_offset_wraps_at_usize_max() {
        let rows: Vec<_> = lines(&[0u8; 16], usize::MAX - 3).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].starts_with("00000004 "));

        trace_buffer(Direction::In, "BUF", &[0u8; 16], usize::MAX);
    }

    #[test]
    fn test_empty() {
        assert_eq!(dump(&[]), "");
    }

    #[test]
    fn test_trace_buffer_runs_without_subscriber() {
        trace_buffer(Direction::Out, "BUF", &[0xde, 0xad, 0xbe, 0xef], 0);
        assert_eq!(Direction::In.to_string(), " =>");
    }
}
