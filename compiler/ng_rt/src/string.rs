//! Immutable strings and bytes.
//!
//! A string stores code points at the narrowest width that holds its
//! largest one:
//!
//! | kind | width | max code point |
//! |------|-------|----------------|
//! | 0    | 1     | `0xFF`         |
//! | 1    | 2     | `0xFFFF`       |
//! | 2    | 4     | `0x10FFFF`     |
//!
//! The content hash covers the UTF-8 encoding, so equal text hashes equally
//! whatever its width. Width-0 strings keep a trailing NUL, and all-ASCII
//! ones convert back to text without copying.

use std::borrow::Cow;
use std::ptr::NonNull;

use crate::hash::content_hash;
use crate::object::{bytes_slice, str_units, trailing, BytesObj, ObjRef, StrObj, TypeTag};
use crate::{RtResult, Runtime};

/// Code-unit width of a string.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrKind {
    Latin1 = 0,
    Ucs2 = 1,
    Ucs4 = 2,
}

impl StrKind {
    /// Narrowest kind that can hold `max_code_point`.
    pub const fn for_max(max_code_point: u32) -> Self {
        if max_code_point <= 0xFF {
            StrKind::Latin1
        } else if max_code_point <= 0xFFFF {
            StrKind::Ucs2
        } else {
            StrKind::Ucs4
        }
    }

    /// Bytes per code unit.
    pub const fn width(self) -> usize {
        1 << self as u8
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => StrKind::Latin1,
            1 => StrKind::Ucs2,
            _ => StrKind::Ucs4,
        }
    }
}

impl Runtime {
    /// Allocate a string holding `text`.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "each code point fits the width chosen for the string"
    )]
    pub fn alloc_str(&mut self, text: &str) -> RtResult<ObjRef> {
        let (len, max) = text
            .chars()
            .fold((0usize, 0u32), |(len, max), ch| (len + 1, max.max(u32::from(ch))));
        let kind = StrKind::for_max(max);
        let ascii = max < 0x80;
        let extra = len * kind.width() + usize::from(kind == StrKind::Latin1);
        let hash = content_hash(self.seed(), text.as_bytes());

        let symbol = self.tag_symbol(TypeTag::Str);
        let ptr = self.emplace(symbol, extra, |mut header| {
            header.flag = ascii;
            header.kind = kind as u8;
            StrObj { header, hash, len }
        })?;

        // SAFETY: `extra` bytes follow the struct; the data offset is
        // 8-aligned, so u16 and u32 writes are aligned.
        unsafe {
            match kind {
                StrKind::Latin1 => {
                    let data = trailing::<_, u8>(ptr);
                    for (i, ch) in text.chars().enumerate() {
                        data.add(i).write(u32::from(ch) as u8);
                    }
                    data.add(len).write(0);
                }
                StrKind::Ucs2 => {
                    let data = trailing::<_, u16>(ptr);
                    for (i, ch) in text.chars().enumerate() {
                        data.add(i).write(u32::from(ch) as u16);
                    }
                }
                StrKind::Ucs4 => {
                    let data = trailing::<_, u32>(ptr);
                    for (i, ch) in text.chars().enumerate() {
                        data.add(i).write(u32::from(ch));
                    }
                }
            }
        }
        Ok(ObjRef::from_object(ptr))
    }

    /// Allocate a string from possibly invalid UTF-8, replacing bad
    /// sequences with U+FFFD.
    pub fn alloc_str_lossy(&mut self, bytes: &[u8]) -> RtResult<ObjRef> {
        self.alloc_str(&String::from_utf8_lossy(bytes))
    }

    pub fn alloc_bytes(&mut self, data: &[u8]) -> RtResult<ObjRef> {
        let hash = content_hash(self.seed(), data);
        let symbol = self.tag_symbol(TypeTag::Bytes);
        let len = data.len();
        let ptr = self.emplace(symbol, len, |header| BytesObj { header, hash, len })?;
        // SAFETY: `len` bytes follow the struct and do not overlap `data`.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), trailing::<_, u8>(ptr), len);
        }
        Ok(ObjRef::from_object(ptr))
    }

    fn str_ptr(&mut self, obj: ObjRef) -> RtResult<NonNull<StrObj>> {
        self.expect::<StrObj>(obj, "str")
    }

    /// Length in code points.
    pub fn str_len(&mut self, obj: ObjRef) -> RtResult<usize> {
        let ptr = self.str_ptr(obj)?;
        // SAFETY: tag checked.
        Ok(unsafe { (*ptr.as_ptr()).len })
    }

    pub fn str_kind(&mut self, obj: ObjRef) -> RtResult<StrKind> {
        self.str_ptr(obj)?;
        Ok(StrKind::from_raw(obj.header().kind))
    }

    pub fn str_is_ascii(&mut self, obj: ObjRef) -> RtResult<bool> {
        self.str_ptr(obj)?;
        Ok(obj.flag())
    }

    pub fn str_hash(&mut self, obj: ObjRef) -> RtResult<i64> {
        let ptr = self.str_ptr(obj)?;
        // SAFETY: tag checked.
        Ok(unsafe { (*ptr.as_ptr()).hash })
    }

    /// Code point at `index`.
    pub fn str_char_at(&mut self, obj: ObjRef, index: usize) -> RtResult<Option<char>> {
        let ptr = self.str_ptr(obj)?;
        // SAFETY: tag checked; the units live as long as the string.
        let (units, kind, len) = unsafe {
            let obj = &*ptr.as_ptr();
            (str_units(ptr), StrKind::from_raw(obj.header.kind), obj.len)
        };
        Ok((index < len).then(|| code_point_at(units, kind, index)))
    }

    /// Text of a string. All-ASCII Latin-1 strings are borrowed in place;
    /// wider ones are re-encoded to UTF-8.
    pub fn to_c_string(&mut self, obj: ObjRef) -> RtResult<Cow<'_, str>> {
        let ptr = self.str_ptr(obj)?;
        // SAFETY: tag checked; the borrow of `self` keeps the object alive
        // because releasing it needs `&mut self`.
        Ok(unsafe { str_text(ptr) })
    }

    pub fn bytes_data(&mut self, obj: ObjRef) -> RtResult<&[u8]> {
        let ptr = self.expect::<BytesObj>(obj, "bytes")?;
        // SAFETY: tag checked; see `to_c_string` for the lifetime.
        Ok(unsafe { bytes_slice(ptr) })
    }

    /// Concatenate two strings into a new one.
    pub fn cat_str(&mut self, a: ObjRef, b: ObjRef) -> RtResult<ObjRef> {
        let mut text = self.to_c_string(a)?.into_owned();
        text.push_str(&self.to_c_string(b)?);
        self.alloc_str(&text)
    }
}

/// # Safety
///
/// `s` must point to a live string.
pub(crate) unsafe fn code_points<'a>(s: NonNull<StrObj>) -> impl Iterator<Item = char> + 'a {
    let kind = StrKind::from_raw((*s.as_ptr()).header.kind);
    let units = str_units(s);
    (0..(*s.as_ptr()).len).map(move |i| code_point_at(units, kind, i))
}

/// Code point `index` of `units`; `index` must be below the length.
fn code_point_at(units: &[u8], kind: StrKind, index: usize) -> char {
    let start = index << kind as u8;
    let raw = &units[start..start + kind.width()];
    let cp = match kind {
        StrKind::Latin1 => u32::from(raw[0]),
        StrKind::Ucs2 => u32::from(u16::from_ne_bytes([raw[0], raw[1]])),
        StrKind::Ucs4 => u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]),
    };
    char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// # Safety
///
/// `s` must point to a live string that outlives `'a`.
pub(crate) unsafe fn str_text<'a>(s: NonNull<StrObj>) -> Cow<'a, str> {
    let obj = &*s.as_ptr();
    if obj.header.flag && obj.header.kind == StrKind::Latin1 as u8 {
        // All units are ASCII, hence valid UTF-8.
        Cow::Borrowed(std::str::from_utf8_unchecked(str_units(s)))
    } else {
        Cow::Owned(code_points(s).collect())
    }
}

#[cfg(test)]
mod tests;
