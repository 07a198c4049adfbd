//! Ranges over the trailing data of replies.
//!
//! `List` covers arrays of fixed-size elements (pointer + length).
//! `VarList` covers arrays whose elements each carry their own size, walked
//! one element at a time.

use std::marker::PhantomData;

use crate::wire::Reader;

/// A list element with a fixed wire size.
pub trait FixedElement: Sized {
    const SIZE: usize;
    /// Decodes one element; `r` starts at the element.
    fn read(r: Reader) -> Self;
}

impl FixedElement for u8 {
    const SIZE: usize = 1;
    fn read(r: Reader) -> Self { r.u8(0) }
}
impl FixedElement for u16 {
    const SIZE: usize = 2;
    fn read(r: Reader) -> Self { r.u16(0) }
}
impl FixedElement for u32 {
    const SIZE: usize = 4;
    fn read(r: Reader) -> Self { r.u32(0) }
}
impl FixedElement for i32 {
    const SIZE: usize = 4;
    fn read(r: Reader) -> Self { r.i32(0) }
}

/// X `RECTANGLE`, as `vek` geometry.
pub type Rectangle = ::vek::Rect<i16, u16>;

impl FixedElement for Rectangle {
    const SIZE: usize = 8;
    fn read(r: Reader) -> Self {
        Rectangle::new(r.i16(0), r.i16(2), r.u16(4), r.u16(6))
    }
}

/// Fixed-size elements, decoded on access.
#[derive(Debug, PartialEq, Eq)]
pub struct List<'a, T> {
    bytes: &'a [u8],
    len: usize,
    _elem: PhantomData<T>,
}

impl<'a, T> Clone for List<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, T> Copy for List<'a, T> {}

impl<'a, T: FixedElement> List<'a, T> {
    /// `count` elements starting at `offset`.
    ///
    /// If the buffer holds fewer, the list is clamped to what is there.
    pub fn new(r: Reader<'a>, offset: usize, count: usize) -> Self {
        let bytes = r.tail(offset).bytes();
        let available = bytes.len() / T::SIZE;
        let len = if count > available {
            warn!("List claims {} elements but the buffer only holds {}", count, available);
            available
        } else {
            count
        };
        Self { bytes: &bytes[..len * T::SIZE], len, _elem: PhantomData }
    }
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn get(&self, i: usize) -> Option<T> {
        if i >= self.len {
            return None;
        }
        Some(T::read(Reader::new(&self.bytes[i * T::SIZE..(i + 1) * T::SIZE])))
    }
    pub fn iter(&self) -> ListIter<'a, T> {
        ListIter { list: *self, next: 0 }
    }
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl<'a, T: FixedElement> IntoIterator for List<'a, T> {
    type Item = T;
    type IntoIter = ListIter<'a, T>;
    fn into_iter(self) -> ListIter<'a, T> {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct ListIter<'a, T> {
    list: List<'a, T>,
    next: usize,
}

impl<'a, T: FixedElement> Iterator for ListIter<'a, T> {
    type Item = T;
    fn next(&mut self) -> Option<T> {
        let item = self.list.get(self.next)?;
        self.next += 1;
        Some(item)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.list.len - self.next;
        (n, Some(n))
    }
}

impl<'a, T: FixedElement> ExactSizeIterator for ListIter<'a, T> {}

/// A list element whose size depends on its own content.
pub trait VarElement<'a>: Sized {
    /// Decodes the element at the start of `r`, and returns it with its
    /// wire size (padding included). `None` if `r` is too short.
    fn parse(r: Reader<'a>) -> Option<(Self, usize)>;
}

/// Variable-size elements, walked front to back.
#[derive(Debug)]
pub struct VarList<'a, T> {
    rest: Reader<'a>,
    remaining: usize,
    _elem: PhantomData<T>,
}

impl<'a, T: VarElement<'a>> VarList<'a, T> {
    pub fn new(r: Reader<'a>, offset: usize, count: usize) -> Self {
        Self { rest: r.tail(offset), remaining: count, _elem: PhantomData }
    }
    /// Elements not yet walked, as announced by the server.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl<'a, T: VarElement<'a>> Iterator for VarList<'a, T> {
    type Item = T;
    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        match T::parse(self.rest) {
            Some((item, size)) => {
                self.remaining -= 1;
                self.rest = self.rest.tail(size);
                Some(item)
            },
            None => {
                warn!("List ended early: {} elements announced but not present", self.remaining);
                self.remaining = 0;
                None
            },
        }
    }
}

/// X `STR`: a length byte followed by that many bytes, unpadded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Str<'a>(pub &'a [u8]);

impl<'a> Str<'a> {
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.0).into_owned()
    }
}

impl<'a> VarElement<'a> for Str<'a> {
    fn parse(r: Reader<'a>) -> Option<(Self, usize)> {
        if r.is_empty() {
            return None;
        }
        let len = r.u8(0) as usize;
        if r.len() < 1 + len {
            return None;
        }
        Some((Str(r.slice(1..1 + len)), 1 + len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_list_is_clamped() {
        let mut bytes = Vec::new();
        for v in &[1_u32, 2, 3] {
            bytes.extend_from_slice(&v.to_ne_bytes());
        }
        let r = Reader::new(&bytes);
        let list = List::<u32>::new(r, 4, 5);
        assert_eq!(list.len(), 2);
        assert_eq!(list.to_vec(), vec![2, 3]);
        assert_eq!(list.get(2), None);
    }

    #[test]
    fn rectangles() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-4_i16).to_ne_bytes());
        bytes.extend_from_slice(&9_i16.to_ne_bytes());
        bytes.extend_from_slice(&100_u16.to_ne_bytes());
        bytes.extend_from_slice(&50_u16.to_ne_bytes());
        let list = List::<Rectangle>::new(Reader::new(&bytes), 0, 1);
        assert_eq!(list.get(0), Some(Rectangle::new(-4, 9, 100, 50)));
    }

    #[test]
    fn strings_walk_and_stop_early() {
        let bytes = [3, b'f', b'o', b'o', 2, b'h', b'i', 9, b'x'];
        let names: Vec<_> = VarList::<Str>::new(Reader::new(&bytes), 0, 3)
            .map(|s| s.to_string_lossy())
            .collect();
        assert_eq!(names, vec!["foo".to_owned(), "hi".to_owned()]);
    }
}
