//! SMTP dot-stuffing (RFC 5321 section 4.5.2).
//!
//! On the wire every content line starting with `.` carries one extra `.`.
//! The MTA hands data lines to the filter in that form and expects them back
//! in that form; only the archived copy is unstuffed.

use std::borrow::Cow;

/// The line that terminates message content.
pub const END_OF_DATA: &[u8] = b".";

/// Removes exactly one leading dot.
#[must_use]
pub fn unstuff(line: &[u8]) -> &[u8] {
    line.strip_prefix(b".").unwrap_or(line)
}

/// Adds one leading dot to lines that start with a dot.
#[must_use]
pub fn stuff(line: &[u8]) -> Cow<'_, [u8]> {
    if line.starts_with(b".") {
        Cow::Owned([&b"."[..], line].concat())
    } else {
        Cow::Borrowed(line)
    }
}

/// Returns true for the lone `.` that ends the content.
#[must_use]
pub fn is_end_of_data(line: &[u8]) -> bool {
    line == END_OF_DATA
}
