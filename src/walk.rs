//! Structure-only walk over encoded BER payloads.
//!
//! The walker locates element boundaries (identifier octets, length octets,
//! content span) by reading headers only. It never decodes values and never
//! fails: a header that cannot be read ends the walk, and a declared length that
//! runs past the buffer is clamped to the bytes actually present.
//!
//! ## When to use walk vs codec
//!
//! | Use case | Prefer |
//! |----------|--------|
//! | Bytes one complete message occupies | [`message_extent`] |
//! | Element boundaries of a possibly corrupt payload | [`scan`] / [`BinaryWalker`] |
//! | Replace identifier or length octets in place | [`splice`] |
//! | Full decode of canonical bytes | [codec](crate::codec) |
//!
//! ## Example
//!
//! ```
//! use ldapprobe::walk::scan;
//!
//! let bind = [0x30, 0x0c, 0x02, 0x01, 0x01, 0x60, 0x07, 0x02, 0x01, 0x03, 0x04, 0x00, 0x80, 0x00];
//! let spans = scan(&bind);
//! assert_eq!(spans.len(), 3); // envelope, messageID, bindRequest
//! assert_eq!(spans[2].offset, 5);
//! ```

use crate::codec::{self, DeclaredLength, Tag};
use std::ops::Range;

/// Where one element sits inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSpan {
    /// Offset of the first identifier octet.
    pub offset: usize,
    pub tag: Tag,
    pub tag_len: usize,
    pub length_len: usize,
    pub declared: DeclaredLength,
    /// Content bytes present in the buffer (declared length clamped to what is there).
    pub content_len: usize,
    /// 0 for top-level elements, 1 for their direct children.
    pub depth: usize,
}

impl ElementSpan {
    pub fn tag_range(&self) -> Range<usize> {
        self.offset..self.offset + self.tag_len
    }

    pub fn length_range(&self) -> Range<usize> {
        let start = self.offset + self.tag_len;
        start..start + self.length_len
    }

    pub fn content_range(&self) -> Range<usize> {
        let start = self.offset + self.tag_len + self.length_len;
        start..start + self.content_len
    }

    pub fn end(&self) -> usize {
        self.content_range().end
    }

    /// Declared length reaches past the end of the buffer, or is indefinite.
    pub fn is_truncated(&self) -> bool {
        match self.declared {
            DeclaredLength::Definite(n) => n > self.content_len as u64,
            DeclaredLength::Indefinite => true,
        }
    }
}

/// Iterator over consecutive elements in `data[start..end]`.
pub struct BinaryWalker<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
    depth: usize,
}

impl<'a> BinaryWalker<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BinaryWalker { data, pos: 0, end: data.len(), depth: 0 }
    }

    /// Walk the content of a constructed element found earlier in the same buffer.
    pub fn children(data: &'a [u8], parent: &ElementSpan) -> Self {
        let range = parent.content_range();
        BinaryWalker { data, pos: range.start, end: range.end.min(data.len()), depth: parent.depth + 1 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for BinaryWalker<'a> {
    type Item = ElementSpan;

    fn next(&mut self) -> Option<ElementSpan> {
        if self.pos >= self.end {
            return None;
        }
        let header = codec::read_header(&self.data[self.pos..self.end])?;
        let content_start = self.pos + header.len();
        if content_start > self.end {
            self.pos = self.end;
            return None;
        }
        let available = self.end - content_start;
        let content_len = match header.length {
            DeclaredLength::Definite(n) => n.min(available as u64) as usize,
            DeclaredLength::Indefinite => available,
        };
        let span = ElementSpan {
            offset: self.pos,
            tag: header.tag,
            tag_len: header.tag_len,
            length_len: header.length_len,
            declared: header.length,
            content_len,
            depth: self.depth,
        };
        self.pos = content_start + content_len;
        Some(span)
    }
}

/// Top-level elements and, for constructed ones, their direct children, in byte order.
pub fn scan(data: &[u8]) -> Vec<ElementSpan> {
    let mut spans = Vec::new();
    for top in BinaryWalker::new(data) {
        spans.push(top);
        if top.tag.constructed {
            spans.extend(BinaryWalker::children(data, &top));
        }
    }
    spans
}

/// Bytes one complete element occupies at the start of `data`, or `None` when the
/// header is unreadable, the length is indefinite, or the content is not all present.
pub fn message_extent(data: &[u8]) -> Option<usize> {
    let header = codec::read_header(data)?;
    match header.length {
        DeclaredLength::Definite(n) => {
            let total = (header.len() as u64).checked_add(n)?;
            if total <= data.len() as u64 {
                Some(total as usize)
            } else {
                None
            }
        }
        DeclaredLength::Indefinite => None,
    }
}

/// Copy of `data` with `range` replaced by `replacement`.
pub fn splice(data: &[u8], range: Range<usize>, replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + replacement.len());
    out.extend_from_slice(&data[..range.start]);
    out.extend_from_slice(replacement);
    out.extend_from_slice(&data[range.end..]);
    out
}
