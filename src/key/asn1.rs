//! Minimal DER reader for PKCS#1 style `SEQUENCE { INTEGER, ... }` keys.

use rsa::BigUint;

use super::{KeyError, KeyResult};

const TAG_INTEGER: u8 = 0x02;
const TAG_SEQUENCE: u8 = 0x30;

struct DerReader<'a> {
    input: &'a [u8],
}

impl<'a> DerReader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    fn read_byte(&mut self) -> KeyResult<u8> {
        let (&byte, rest) = self
            .input
            .split_first()
            .ok_or(KeyError::Asn1Decode("unexpected end of data"))?;
        self.input = rest;
        Ok(byte)
    }

    fn read_length(&mut self) -> KeyResult<usize> {
        let first = self.read_byte()?;
        if first & 0x80 == 0 {
            return Ok(first as usize);
        }

        let octets = (first & 0x7f) as usize;
        if octets == 0 {
            return Err(KeyError::Asn1Decode("indefinite length"));
        }
        if octets > 4 {
            return Err(KeyError::Asn1Decode("length field too large"));
        }
        let mut len = 0usize;
        for _ in 0..octets {
            len = (len << 8) | self.read_byte()? as usize;
        }
        Ok(len)
    }

    /// Read one TLV with the given tag and return its contents.
    fn read_tlv(&mut self, tag: u8) -> KeyResult<&'a [u8]> {
        if self.read_byte()? != tag {
            return Err(KeyError::Asn1Decode("unexpected tag"));
        }
        let len = self.read_length()?;
        if len > self.input.len() {
            return Err(KeyError::Asn1Decode("length exceeds input"));
        }
        let (value, rest) = self.input.split_at(len);
        self.input = rest;
        Ok(value)
    }
}

/// Read a SEQUENCE of between `min` and `max` INTEGERs.
///
/// Bytes after the outer SEQUENCE are ignored; decrypted legacy keys
/// carry block padding there.
pub(crate) fn read_integers(input: &[u8], min: usize, max: usize) -> KeyResult<Vec<&[u8]>> {
    let sequence = DerReader::new(input).read_tlv(TAG_SEQUENCE)?;
    let mut reader = DerReader::new(sequence);
    let mut integers = Vec::with_capacity(max);

    while !reader.is_empty() && integers.len() < max {
        let value = reader.read_tlv(TAG_INTEGER)?;
        if value.is_empty() {
            return Err(KeyError::Asn1Decode("empty integer"));
        }
        integers.push(value);
    }

    if integers.len() < min {
        return Err(KeyError::Asn1Decode("not enough integers"));
    }
    Ok(integers)
}

/// Encode an unsigned big-endian magnitude as an SSH `mpint` body.
pub(crate) fn to_mpint(magnitude: &[u8]) -> Vec<u8> {
    let start = magnitude
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(magnitude.len());
    let trimmed = &magnitude[start..];
    let mut out = Vec::with_capacity(trimmed.len() + 1);
    if trimmed.first().is_some_and(|b| b & 0x80 != 0) {
        out.push(0);
    }
    out.extend_from_slice(trimmed);
    out
}

/// `q⁻¹ mod p` for prime `p`, by Fermat's little theorem.
pub(crate) fn crt_coefficient(p: &[u8], q: &[u8]) -> KeyResult<Vec<u8>> {
    let p = BigUint::from_bytes_be(p);
    let q = BigUint::from_bytes_be(q);
    let two = BigUint::from(2u32);
    if p <= two {
        return Err(KeyError::Asn1Decode("invalid prime"));
    }
    let exponent = &p - &two;
    Ok(to_mpint(&q.modpow(&exponent, &p).to_bytes_be()))
}
