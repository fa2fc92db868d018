//! PEM framing used by OpenSSH and legacy PKCS#1 private keys.
//!
//! Only the subset of RFC 7468 that key files actually use is handled:
//! a single `-----BEGIN <label>-----` / `-----END <label>-----` block,
//! optional RFC 1421 style `Key: Value` headers and a Base64 body.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::Zeroizing;

use crate::key::{KeyError, KeyResult};

const BEGIN: &str = "-----BEGIN ";
const END: &str = "-----END ";
const DASHES: &str = "-----";

/// Line width OpenSSH uses for the Base64 body.
pub const OPENSSH_LINE_WIDTH: usize = 70;

/// Decoded PEM block.
#[derive(Debug, Clone)]
pub struct PemContainer {
    label: String,
    options: HashMap<String, String>,
    data: Zeroizing<Vec<u8>>,
}

impl PemContainer {
    /// Create a container around already decoded data.
    pub fn new(label: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            options: HashMap::new(),
            data: Zeroizing::new(data),
        }
    }

    /// Parse a single PEM block.
    ///
    /// The input is treated as Latin-1. Blank lines are ignored anywhere
    /// in the block.
    pub fn parse(input: &[u8]) -> KeyResult<Self> {
        let text: String = input.iter().map(|&b| b as char).collect();
        let mut rows: Vec<&str> = text
            .split(|c| c == '\r' || c == '\n')
            .filter(|row| !row.is_empty())
            .collect();

        if rows.len() < 3 {
            return Err(KeyError::MalformedContainer("expecting an OpenSSH key"));
        }

        let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
            return Err(KeyError::MalformedContainer("expecting an OpenSSH key"));
        };
        let begin = boundary_label(first, BEGIN)
            .ok_or(KeyError::MalformedContainer("missing BEGIN boundary"))?;
        let end =
            boundary_label(last, END).ok_or(KeyError::MalformedContainer("missing END boundary"))?;
        if begin != end {
            return Err(KeyError::MalformedContainer("PEM boundary mismatch"));
        }
        let label = begin.to_string();

        rows.remove(0);
        rows.pop();

        let mut options = HashMap::new();
        let mut body_start = 0;
        for row in &rows {
            match header_option(row) {
                Some((key, value)) => {
                    options.insert(key.to_string(), value.to_string());
                    body_start += 1;
                }
                None => break,
            }
        }

        let body: String = rows[body_start..].concat();
        let data = Zeroizing::new(STANDARD.decode(body.trim())?);
        if data.is_empty() {
            return Err(KeyError::EmptyPayload);
        }

        Ok(Self {
            label,
            options,
            data,
        })
    }

    /// Label between the `BEGIN`/`END` markers, e.g. `OPENSSH PRIVATE KEY`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Header options preceding the body.
    pub fn options(&self) -> &HashMap<String, String> {
        &self.options
    }

    /// Look up a header option by name.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Decoded payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Render the block with the body wrapped at `line_width` columns.
    ///
    /// Header options are not written back.
    pub fn encode(&self, line_width: usize) -> Zeroizing<String> {
        let body = Zeroizing::new(STANDARD.encode(&self.data[..]));
        let mut out = Zeroizing::new(String::with_capacity(body.len() + 2 * self.label.len() + 64));
        out.push_str(BEGIN);
        out.push_str(&self.label);
        out.push_str(DASHES);
        out.push('\n');
        let width = line_width.max(4);
        let mut rest = body.as_str();
        while !rest.is_empty() {
            let (line, tail) = rest.split_at(width.min(rest.len()));
            out.push_str(line);
            out.push('\n');
            rest = tail;
        }
        out.push_str(END);
        out.push_str(&self.label);
        out.push_str(DASHES);
        out.push('\n');
        out
    }
}

fn boundary_label<'a>(row: &'a str, prefix: &str) -> Option<&'a str> {
    let label = row.strip_prefix(prefix)?.strip_suffix(DASHES)?;
    if label.is_empty() || label.contains('-') {
        None
    } else {
        Some(label)
    }
}

fn header_option(row: &str) -> Option<(&str, &str)> {
    let (key, value) = row.split_once(": ")?;
    let valid_key =
        !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid_key && !value.is_empty() {
        Some((key, value))
    } else {
        None
    }
}
