// Copyright 2020 Steven Bosnick
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE-2.0 or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The two collaborators a [`GroupedSequence`](crate::GroupedSequence) is
//! built from: a forward-only [`Cursor`] and a [`KeyExtractor`].

use std::convert::Infallible;
use std::fmt;

/// A forward-only, single-pass source of records.
///
/// A cursor starts positioned before its first record. Each successful call to
/// [`advance`](Cursor::advance) moves it onto the next record, which is then
/// read through the cursor's own accessors.
pub trait Cursor {
    /// The error raised when the underlying source cannot be read.
    type Error;

    /// Move to the next record, returning `false` once there are no more.
    fn advance(&mut self) -> Result<bool, Self::Error>;
}

impl<C> Cursor for &mut C
where
    C: Cursor + ?Sized,
{
    type Error = C::Error;

    fn advance(&mut self) -> Result<bool, Self::Error> {
        (**self).advance()
    }
}

/// Computes the group key of the record a cursor is positioned on.
///
/// A key of `None` is the null key. Two null keys belong to the same group; a
/// null key never equals a present one.
///
/// Any `FnMut(&C) -> Result<Option<K>, C::Error>` is a key extractor:
///
/// ```
/// use std::convert::Infallible;
/// use std::vec::IntoIter;
///
/// use grouped_cursor::{GroupedSequence, IterCursor};
///
/// fn parity(cursor: &IterCursor<IntoIter<u32>>) -> Result<Option<u32>, Infallible> {
///     Ok(cursor.current().map(|n| n % 2))
/// }
///
/// let cursor = IterCursor::new(vec![1, 3, 2].into_iter());
/// let mut seq = GroupedSequence::new(cursor, parity);
///
/// assert!(seq.next_group().unwrap());
/// assert_eq!(seq.current_key().unwrap(), Some(&1));
/// ```
pub trait KeyExtractor<C>
where
    C: Cursor + ?Sized,
{
    /// The type of the group key.
    type Key: PartialEq;

    /// Compute the key of the current record.
    fn extract(&mut self, cursor: &C) -> Result<Option<Self::Key>, C::Error>;
}

impl<C, K, F> KeyExtractor<C> for F
where
    C: Cursor + ?Sized,
    K: PartialEq,
    F: FnMut(&C) -> Result<Option<K>, C::Error>,
{
    type Key = K;

    fn extract(&mut self, cursor: &C) -> Result<Option<K>, C::Error> {
        self(cursor)
    }
}

/// A [`Cursor`] over the items of an ordinary iterator.
///
/// Iterators cannot fail, so the error type is [`Infallible`]. Once the inner
/// iterator returns `None` it is not polled again.
pub struct IterCursor<I>
where
    I: Iterator,
{
    iter: I,
    current: Option<I::Item>,
    exhausted: bool,
}

impl<I> IterCursor<I>
where
    I: Iterator,
{
    /// Wrap `iter`, positioned before its first item.
    pub fn new(iter: I) -> Self {
        IterCursor {
            iter,
            current: None,
            exhausted: false,
        }
    }

    /// The item the cursor is positioned on, if any.
    pub fn current(&self) -> Option<&I::Item> {
        self.current.as_ref()
    }
}

impl<I> Cursor for IterCursor<I>
where
    I: Iterator,
{
    type Error = Infallible;

    fn advance(&mut self) -> Result<bool, Infallible> {
        if self.exhausted {
            return Ok(false);
        }

        self.current = self.iter.next();
        self.exhausted = self.current.is_none();

        Ok(!self.exhausted)
    }
}

impl<I> fmt::Debug for IterCursor<I>
where
    I: Iterator,
    I::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterCursor")
            .field("current", &self.current)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
