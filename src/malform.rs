//! Deliberately non-conforming encodings.
//!
//! Each builder breaks exactly one BER rule and is otherwise canonical, so a
//! server's reaction can be attributed to that rule.

use crate::codec::{self, definite_length, Element, Length, Tag, CONSTRUCTED, INDEFINITE_LENGTH};
use byteorder::{BigEndian, ByteOrder};

/// Bytes added to the true length by [`LengthFault::TooLong`].
pub const TOO_LONG_EXCESS: usize = 1000;
/// Boolean content octets that are neither `0x00` nor `0xFF`.
pub const INVALID_BOOLEAN_OCTETS: [u8; 5] = [0x01, 0x7F, 0x80, 0xFE, 0x42];
/// Enumerated value outside every LDAP enumeration.
pub const OUT_OF_RANGE_ENUM: i64 = 999_999;
/// Identifier octet announcing a long-form private tag with no number octets.
pub const RESERVED_TAG_OCTET: u8 = 0xFF;
/// Application tag number not assigned by LDAPv3.
pub const UNKNOWN_APPLICATION_TAG: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthFault {
    /// Single `0x80` octet.
    Indefinite,
    /// Half the true length.
    TooShort,
    /// True length plus [`TOO_LONG_EXCESS`].
    TooLong,
    /// `0x84 7F FF FF FF`.
    MaxInt32,
    /// `0x84 FF FF FF FF`.
    Overflow32,
    /// `0x88` followed by eight `0xFF`.
    BeyondPacket64,
}

impl LengthFault {
    pub const ALL: [LengthFault; 6] = [
        LengthFault::Indefinite,
        LengthFault::TooShort,
        LengthFault::TooLong,
        LengthFault::MaxInt32,
        LengthFault::Overflow32,
        LengthFault::BeyondPacket64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LengthFault::Indefinite => "indefinite",
            LengthFault::TooShort => "too_short",
            LengthFault::TooLong => "too_long",
            LengthFault::MaxInt32 => "max_int32",
            LengthFault::Overflow32 => "overflow32",
            LengthFault::BeyondPacket64 => "beyond_packet64",
        }
    }

    /// Length octets for content whose true size is `content_len`.
    pub fn encode(self, content_len: usize) -> Vec<u8> {
        match self {
            LengthFault::Indefinite => vec![INDEFINITE_LENGTH],
            LengthFault::TooShort => definite_length(content_len / 2),
            LengthFault::TooLong => definite_length(content_len + TOO_LONG_EXCESS),
            LengthFault::MaxInt32 => long_form_u32(0x7FFF_FFFF),
            LengthFault::Overflow32 => long_form_u32(0xFFFF_FFFF),
            LengthFault::BeyondPacket64 => {
                let mut out = vec![0x88; 9];
                BigEndian::write_u64(&mut out[1..], u64::MAX);
                out
            }
        }
    }

    /// The length a reader would see, `None` for the indefinite form.
    pub fn declared(self, content_len: usize) -> Option<u64> {
        match self {
            LengthFault::Indefinite => None,
            LengthFault::TooShort => Some((content_len / 2) as u64),
            LengthFault::TooLong => Some((content_len + TOO_LONG_EXCESS) as u64),
            LengthFault::MaxInt32 => Some(0x7FFF_FFFF),
            LengthFault::Overflow32 => Some(0xFFFF_FFFF),
            LengthFault::BeyondPacket64 => Some(u64::MAX),
        }
    }
}

/// Four-octet long-form length octets (`0x84` and the big-endian value), minimal or not.
pub fn long_form_u32(value: u32) -> Vec<u8> {
    let mut out = vec![0x84, 0, 0, 0, 0];
    BigEndian::write_u32(&mut out[1..], value);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagFault {
    /// Replace the identifier with [`RESERVED_TAG_OCTET`].
    InvalidNumber,
    /// Toggle the constructed bit.
    FlipConstructed,
    /// Application tag [`UNKNOWN_APPLICATION_TAG`], constructed.
    UnknownApplication,
}

impl TagFault {
    pub const ALL: [TagFault; 3] = [TagFault::InvalidNumber, TagFault::FlipConstructed, TagFault::UnknownApplication];

    pub fn name(self) -> &'static str {
        match self {
            TagFault::InvalidNumber => "invalid_number",
            TagFault::FlipConstructed => "flip_constructed",
            TagFault::UnknownApplication => "unknown_application",
        }
    }

    /// Identifier octets replacing the one-octet identifier `tag_octet`.
    pub fn apply(self, tag_octet: u8) -> Vec<u8> {
        match self {
            TagFault::InvalidNumber => vec![RESERVED_TAG_OCTET],
            TagFault::FlipConstructed => vec![tag_octet ^ CONSTRUCTED],
            TagFault::UnknownApplication => Tag::application(UNKNOWN_APPLICATION_TAG, true).encode(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerFault {
    /// Two redundant `0x00` octets before a 4-octet value.
    LeadingZeros,
    /// Declared length one greater than the 4 content octets.
    WrongLength,
    /// Zero content octets.
    Empty,
    /// Ten `0x00` octets before a 4-octet value.
    TooManyOctets,
}

impl IntegerFault {
    pub const ALL: [IntegerFault; 4] = [
        IntegerFault::LeadingZeros,
        IntegerFault::WrongLength,
        IntegerFault::Empty,
        IntegerFault::TooManyOctets,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IntegerFault::LeadingZeros => "leading_zeros",
            IntegerFault::WrongLength => "wrong_length",
            IntegerFault::Empty => "empty",
            IntegerFault::TooManyOctets => "too_many_octets",
        }
    }

    /// Faulty INTEGER element around the low 32 bits of `value`.
    pub fn element(self, value: i64) -> Element {
        let four = (value as i32).to_be_bytes();
        match self {
            IntegerFault::LeadingZeros => {
                let mut content = vec![0x00, 0x00];
                content.extend_from_slice(&four);
                Element::new(Tag::INTEGER, content)
            }
            IntegerFault::WrongLength => {
                Element::new(Tag::INTEGER, four).with_length(Length::Definite(four.len() + 1))
            }
            IntegerFault::Empty => Element::new(Tag::INTEGER, Vec::new()),
            IntegerFault::TooManyOctets => {
                let mut content = vec![0x00; 10];
                content.extend_from_slice(&four);
                Element::new(Tag::INTEGER, content)
            }
        }
    }

    pub fn encode(self, value: i64) -> Vec<u8> {
        self.element(value).encode()
    }
}

/// BOOLEAN with an arbitrary content octet.
pub fn boolean_with_octet(octet: u8) -> Element {
    Element::new(Tag::BOOLEAN, [octet])
}

/// INTEGER with caller-supplied content octets, minimal or not.
pub fn integer_with_content(content: impl Into<Vec<u8>>) -> Element {
    Element::new(Tag::INTEGER, content)
}

pub fn enumerated_out_of_range() -> Element {
    codec::enumerated(OUT_OF_RANGE_ENUM)
}

/// OCTET STRING carrying the constructed bit around plain content.
pub fn constructed_octet_string(content: impl Into<Vec<u8>>) -> Element {
    Element::new(Tag::OCTET_STRING.with_constructed(true), content)
}

/// SEQUENCE identifier without the constructed bit (`0x10`) around encoded children.
pub fn primitive_sequence<'a>(children: impl IntoIterator<Item = &'a Element>) -> Element {
    Element::with_children(Tag::SEQUENCE.with_constructed(false), children)
}

/// Encoding of `element` with its identifier replaced by `fault`.
/// Only meaningful for single-octet identifiers.
pub fn with_tag_fault(element: &Element, fault: TagFault) -> Vec<u8> {
    let mut out = fault.apply(element.tag.leading_octet());
    out.extend(element.length.encode(element.content.len()));
    out.extend_from_slice(&element.content);
    out
}
