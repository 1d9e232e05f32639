//! Read identifier normalization
//!
//! Mates of a pair share an identifier once the `/1` or `/2` suffix is
//! removed. Everything after the first whitespace is a free-form description
//! and is not part of the identifier.

use std::fmt;

/// Which end of a pair a read claims to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mate {
    First,
    Second,
}

/// Normalized read identifier used as the join key between files
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadId(String);

impl ReadId {
    /// Normalize a FASTQ header (without the leading `@`)
    pub fn from_header(header: &str) -> Self {
        let token = first_token(header);
        let id = token
            .strip_suffix("/1")
            .or_else(|| token.strip_suffix("/2"))
            .unwrap_or(token);
        ReadId(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ReadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mate label carried by a header, if any
///
/// Recognizes the old Illumina `/1` `/2` suffix and the Casava 1.8
/// description field (`1:N:0:ATCACG`).
pub fn mate_of(header: &str) -> Option<Mate> {
    let token = first_token(header);
    if token.ends_with("/1") {
        return Some(Mate::First);
    }
    if token.ends_with("/2") {
        return Some(Mate::Second);
    }

    let description = header[token.len()..].trim_start();
    let mut fields = description.split(':');
    match (fields.next(), fields.next()) {
        (Some("1"), Some("Y" | "N")) => Some(Mate::First),
        (Some("2"), Some("Y" | "N")) => Some(Mate::Second),
        _ => None,
    }
}

fn first_token(header: &str) -> &str {
    header
        .split(|c: char| c.is_ascii_whitespace())
        .next()
        .unwrap_or("")
}
