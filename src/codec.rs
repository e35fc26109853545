//! BER primitives: tags, lengths and elements, canonical encoders, and decoders.
//!
//! Canonical encoders follow the LDAP subset of X.690: definite lengths only,
//! minimal length octets, minimal two's-complement integers, `0x00`/`0xFF`
//! booleans. An [`Element`] may still carry a declared [`Length`] that disagrees
//! with its content; the builders in [`malform`](crate::malform) rely on that.
//!
//! Two decode paths exist:
//!
//! - [`decode_element`] / [`decode_all`] are strict and return [`CodecError`].
//! - [`read_tag`], [`read_length`] and [`read_header`] are lenient and return
//!   `None` on anything they cannot read. The walker and the response analyzer
//!   use these because they must survive arbitrary bytes.

use crate::malform::LengthFault;
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use std::io::{Cursor, Read};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Negative length: {0}")]
    NegativeLength(i64),
    #[error("Indefinite length is not allowed")]
    IndefiniteLength,
    #[error("Length: {0}")]
    InvalidLength(String),
    #[error("Integer: {0}")]
    InvalidInteger(String),
    #[error("Tag: {0}")]
    InvalidTag(String),
}

/// Constructed bit of the identifier octet.
pub const CONSTRUCTED: u8 = 0x20;
/// Low five bits of the identifier octet announcing a long-form tag number.
pub const LONG_FORM_TAG: u8 = 0x1F;
/// The single length octet of the indefinite form.
pub const INDEFINITE_LENGTH: u8 = 0x80;
/// Terminator of indefinite-length content.
pub const END_OF_CONTENTS: [u8; 2] = [0x00, 0x00];

/// Universal tag numbers used by the protocol.
pub mod universal {
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const ENUMERATED: u32 = 10;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    Universal,
    Application,
    Context,
    Private,
}

impl TagClass {
    pub fn bits(self) -> u8 {
        match self {
            TagClass::Universal => 0x00,
            TagClass::Application => 0x40,
            TagClass::Context => 0x80,
            TagClass::Private => 0xC0,
        }
    }

    pub fn from_octet(octet: u8) -> Self {
        match octet & 0xC0 {
            0x00 => TagClass::Universal,
            0x40 => TagClass::Application,
            0x80 => TagClass::Context,
            _ => TagClass::Private,
        }
    }
}

/// Identifier of an element: class, constructed flag and tag number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    pub class: TagClass,
    pub constructed: bool,
    pub number: u32,
}

impl Tag {
    pub const BOOLEAN: Tag = Tag::universal(universal::BOOLEAN, false);
    pub const INTEGER: Tag = Tag::universal(universal::INTEGER, false);
    pub const OCTET_STRING: Tag = Tag::universal(universal::OCTET_STRING, false);
    pub const NULL: Tag = Tag::universal(universal::NULL, false);
    pub const ENUMERATED: Tag = Tag::universal(universal::ENUMERATED, false);
    pub const SEQUENCE: Tag = Tag::universal(universal::SEQUENCE, true);
    pub const SET: Tag = Tag::universal(universal::SET, true);

    pub const fn new(class: TagClass, constructed: bool, number: u32) -> Self {
        Tag { class, constructed, number }
    }

    pub const fn universal(number: u32, constructed: bool) -> Self {
        Tag::new(TagClass::Universal, constructed, number)
    }

    pub const fn application(number: u32, constructed: bool) -> Self {
        Tag::new(TagClass::Application, constructed, number)
    }

    pub const fn context(number: u32, constructed: bool) -> Self {
        Tag::new(TagClass::Context, constructed, number)
    }

    pub fn with_constructed(self, constructed: bool) -> Self {
        Tag { constructed, ..self }
    }

    /// First identifier octet (class, constructed bit, number or the long-form marker).
    pub fn leading_octet(&self) -> u8 {
        let low = if self.number < 31 { self.number as u8 } else { LONG_FORM_TAG };
        self.class.bits() | if self.constructed { CONSTRUCTED } else { 0 } | low
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2);
        self.write(&mut out);
        out
    }

    /// Short form below 31; otherwise base-128 groups, continuation bit on all but the last.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.leading_octet());
        if self.number < 31 {
            return;
        }
        let mut groups = [0u8; 5];
        let mut n = self.number;
        let mut first = groups.len();
        loop {
            first -= 1;
            groups[first] = (n & 0x7F) as u8;
            n >>= 7;
            if n == 0 {
                break;
            }
        }
        let last = groups.len() - 1;
        for (i, group) in groups.iter().enumerate().skip(first) {
            out.push(if i == last { *group } else { *group | 0x80 });
        }
    }
}

/// Declared length of an element.
///
/// `Definite(n)` need not equal the content size; `Malformed` variants compute their
/// octets from the true content size at encode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Definite(usize),
    Malformed(LengthFault),
}

impl Length {
    pub fn encode(&self, content_len: usize) -> Vec<u8> {
        match self {
            Length::Definite(n) => definite_length(*n),
            Length::Malformed(fault) => fault.encode(content_len),
        }
    }
}

/// Length octets for a caller-supplied length. Negative lengths are a caller bug.
pub fn encode_length(len: i64) -> Result<Vec<u8>, CodecError> {
    if len < 0 {
        return Err(CodecError::NegativeLength(len));
    }
    let mut out = Vec::with_capacity(9);
    write_length(&mut out, len as u64);
    Ok(out)
}

pub fn definite_length(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(9);
    write_length(&mut out, len as u64);
    out
}

pub(crate) fn write_length(out: &mut Vec<u8>, len: u64) {
    if len <= 0x7F {
        out.push(len as u8);
        return;
    }
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, len);
    let skip = (len.leading_zeros() / 8) as usize;
    out.push(0x80 | (buf.len() - skip) as u8);
    out.extend_from_slice(&buf[skip..]);
}

/// Tag and length octets for `content_len` bytes of content that the caller appends.
pub fn encode_header(tag: Tag, length: Length, content_len: usize) -> Vec<u8> {
    let mut out = tag.encode();
    out.extend(length.encode(content_len));
    out
}

/// Tag, declared length and content octets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    pub length: Length,
    pub content: Vec<u8>,
}

impl Element {
    /// Element whose declared length matches its content.
    pub fn new(tag: Tag, content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        Element { tag, length: Length::Definite(content.len()), content }
    }

    /// Content is the concatenated encodings of `children`; `tag` is used as given.
    pub fn with_children<'a>(tag: Tag, children: impl IntoIterator<Item = &'a Element>) -> Self {
        let mut content = Vec::new();
        for child in children {
            child.write(&mut content);
        }
        Element::new(tag, content)
    }

    pub fn with_length(self, length: Length) -> Self {
        Element { length, ..self }
    }

    pub fn with_tag(self, tag: Tag) -> Self {
        Element { tag, ..self }
    }

    pub fn has_canonical_length(&self) -> bool {
        self.length == Length::Definite(self.content.len())
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        self.tag.write(out);
        out.extend(self.length.encode(self.content.len()));
        out.extend_from_slice(&self.content);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.content.len() + 6);
        self.write(&mut out);
        out
    }
}

pub fn boolean(value: bool) -> Element {
    Element::new(Tag::BOOLEAN, [if value { 0xFFu8 } else { 0x00 }])
}

pub fn integer(value: i64) -> Element {
    Element::new(Tag::INTEGER, integer_content(value))
}

pub fn enumerated(value: i64) -> Element {
    Element::new(Tag::ENUMERATED, integer_content(value))
}

pub fn octet_string(value: impl AsRef<[u8]>) -> Element {
    Element::new(Tag::OCTET_STRING, value.as_ref())
}

pub fn null() -> Element {
    Element::new(Tag::NULL, Vec::new())
}

pub fn sequence<'a>(children: impl IntoIterator<Item = &'a Element>) -> Element {
    Element::with_children(Tag::SEQUENCE, children)
}

pub fn set<'a>(children: impl IntoIterator<Item = &'a Element>) -> Element {
    Element::with_children(Tag::SET, children)
}

pub fn context_primitive(number: u32, content: impl AsRef<[u8]>) -> Element {
    Element::new(Tag::context(number, false), content.as_ref())
}

pub fn context_constructed<'a>(number: u32, children: impl IntoIterator<Item = &'a Element>) -> Element {
    Element::with_children(Tag::context(number, true), children)
}

pub fn application_primitive(number: u32, content: impl AsRef<[u8]>) -> Element {
    Element::new(Tag::application(number, false), content.as_ref())
}

pub fn application_constructed<'a>(number: u32, children: impl IntoIterator<Item = &'a Element>) -> Element {
    Element::with_children(Tag::application(number, true), children)
}

/// Minimal two's-complement big-endian octets of `value`.
pub fn integer_content(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let (hi, next) = (bytes[start], bytes[start + 1]);
        let redundant = (hi == 0x00 && next & 0x80 == 0) || (hi == 0xFF && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

pub fn decode_integer(content: &[u8]) -> Result<i64, CodecError> {
    if content.is_empty() {
        return Err(CodecError::InvalidInteger("empty content".to_string()));
    }
    if content.len() > 8 {
        return Err(CodecError::InvalidInteger(format!("{} octets exceed 64 bits", content.len())));
    }
    let mut value: i64 = if content[0] & 0x80 != 0 { -1 } else { 0 };
    for &b in content {
        value = (value << 8) | b as i64;
    }
    Ok(value)
}

/// Decode one element with a definite length that fits in `bytes`.
/// Returns the element and the number of bytes consumed.
pub fn decode_element(bytes: &[u8]) -> Result<(Element, usize), CodecError> {
    let mut r = Cursor::new(bytes);
    let first = r.read_u8()?;
    let mut number = (first & LONG_FORM_TAG) as u32;
    if number == LONG_FORM_TAG as u32 {
        number = 0;
        let mut groups = 0;
        loop {
            let b = r.read_u8()?;
            groups += 1;
            if groups > 5 {
                return Err(CodecError::InvalidTag("tag number exceeds 32 bits".to_string()));
            }
            number = (number << 7) | (b & 0x7F) as u32;
            if b & 0x80 == 0 {
                break;
            }
        }
    }
    let tag = Tag::new(TagClass::from_octet(first), first & CONSTRUCTED != 0, number);

    let lead = r.read_u8()?;
    let len = if lead == INDEFINITE_LENGTH {
        return Err(CodecError::IndefiniteLength);
    } else if lead & 0x80 == 0 {
        lead as u64
    } else {
        let n = (lead & 0x7F) as usize;
        if n > 8 {
            return Err(CodecError::InvalidLength(format!("{} length octets", n)));
        }
        r.read_uint::<BigEndian>(n)?
    };
    let remaining = bytes.len() as u64 - r.position();
    if len > remaining {
        return Err(CodecError::InvalidLength(format!(
            "declared {} bytes, {} available",
            len, remaining
        )));
    }
    let mut content = vec![0u8; len as usize];
    r.read_exact(&mut content)?;
    Ok((Element::new(tag, content), r.position() as usize))
}

/// Decode consecutive elements until `bytes` is exhausted (e.g. constructed content).
pub fn decode_all(bytes: &[u8]) -> Result<Vec<Element>, CodecError> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let (element, consumed) = decode_element(&bytes[offset..])?;
        out.push(element);
        offset += consumed;
    }
    Ok(out)
}

/// Length as declared on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredLength {
    Definite(u64),
    Indefinite,
}

/// Tag and length octets read from the front of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub tag: Tag,
    pub tag_len: usize,
    pub length: DeclaredLength,
    pub length_len: usize,
}

impl Header {
    pub fn len(&self) -> usize {
        self.tag_len + self.length_len
    }
}

pub fn read_tag(buf: &[u8]) -> Option<(Tag, usize)> {
    let first = *buf.first()?;
    let class = TagClass::from_octet(first);
    let constructed = first & CONSTRUCTED != 0;
    if first & LONG_FORM_TAG != LONG_FORM_TAG {
        return Some((Tag::new(class, constructed, (first & LONG_FORM_TAG) as u32), 1));
    }
    let mut number: u32 = 0;
    for (i, &b) in buf.iter().enumerate().skip(1).take(5) {
        number = (number << 7) | (b & 0x7F) as u32;
        if b & 0x80 == 0 {
            return Some((Tag::new(class, constructed, number), i + 1));
        }
    }
    None
}

pub fn read_length(buf: &[u8]) -> Option<(DeclaredLength, usize)> {
    let lead = *buf.first()?;
    if lead == INDEFINITE_LENGTH {
        return Some((DeclaredLength::Indefinite, 1));
    }
    if lead & 0x80 == 0 {
        return Some((DeclaredLength::Definite(lead as u64), 1));
    }
    let n = (lead & 0x7F) as usize;
    if n > 8 || buf.len() < 1 + n {
        return None;
    }
    Some((DeclaredLength::Definite(BigEndian::read_uint(&buf[1..1 + n], n)), 1 + n))
}

pub fn read_header(buf: &[u8]) -> Option<Header> {
    let (tag, tag_len) = read_tag(buf)?;
    let (length, length_len) = read_length(&buf[tag_len..])?;
    Some(Header { tag, tag_len, length, length_len })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_form_tags() {
        assert_eq!(Tag::SEQUENCE.encode(), vec![0x30]);
        assert_eq!(Tag::application(0, true).encode(), vec![0x60]);
        assert_eq!(Tag::context(0, false).encode(), vec![0x80]);
        assert_eq!(Tag::application(99, true).encode(), vec![0x7F, 0x63]);
        assert_eq!(Tag::context(200, false).encode(), vec![0x9F, 0x81, 0x48]);
    }

    #[test]
    fn read_tag_matches_write() {
        for tag in [Tag::INTEGER, Tag::application(23, true), Tag::context(99, false), Tag::context(16_383, true)] {
            let encoded = tag.encode();
            assert_eq!(read_tag(&encoded), Some((tag, encoded.len())));
        }
    }

    #[test]
    fn read_length_rejects_truncated_long_form() {
        assert_eq!(read_length(&[0x82, 0x01]), None);
        assert_eq!(read_length(&[0x82, 0x01, 0x00]), Some((DeclaredLength::Definite(256), 3)));
        assert_eq!(read_length(&[0x80]), Some((DeclaredLength::Indefinite, 1)));
        assert_eq!(read_length(&[]), None);
    }

    #[test]
    fn integer_zero_is_single_octet() {
        assert_eq!(integer_content(0), vec![0x00]);
        assert_eq!(integer_content(-1), vec![0xFF]);
    }
}
