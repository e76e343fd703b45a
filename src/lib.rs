// Copyright 2020 Steven Bosnick
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE-2.0 or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Group-by-group traversal of a cursor whose records are already sorted by a
//! key.
//!
//! Given records ordered by some key, a [`GroupedSequence`] lets a caller
//! consume each run of records with an equal key without keeping track of the
//! last record seen or handling the final group as a special case. It never
//! buffers records; it holds at most one record of lookahead, which is the
//! record the underlying [`Cursor`] is positioned on.
//!
//! ```
//! use grouped_cursor::table::{ColumnKey, Table};
//! use grouped_cursor::GroupedSequence;
//! use serde_json::json;
//!
//! let table = Table::new(
//!     vec!["one".into(), "two".into()],
//!     vec![
//!         vec![json!("a"), json!(1)],
//!         vec![json!("a"), json!(2)],
//!         vec![json!("b"), json!(3)],
//!     ],
//! )
//! .unwrap();
//! let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::index(0));
//!
//! while groups.next_group().unwrap() {
//!     let key = groups.current_key().unwrap().cloned();
//!     while groups.next_in_group().unwrap() {
//!         println!("{:?}: {}", key, groups.cursor().describe_record());
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use std::fmt;

use log::{debug, trace};

pub mod cursor;
mod error;
pub mod logger;
pub mod report;
pub mod table;

pub use cursor::{Cursor, IterCursor, KeyExtractor};
pub use error::{CallOrderError, Error, GroupError, Result, TableError};

/// Where a [`GroupedSequence`] is in its single forward pass.
enum State<K> {
    /// `next_group` has not been called.
    NotStarted,

    /// A group is open. The cursor is on a record of that group; `consumed`
    /// says whether that record has been handed out by `next_in_group`.
    Open { key: Option<K>, consumed: bool },

    /// The open group ended. The cursor is on the first record of the next
    /// group, whose key is `next_key`.
    Pending { key: Option<K>, next_key: Option<K> },

    /// The cursor is exhausted.
    Finished,

    /// A data-access error was raised; the sequence cannot be trusted.
    Poisoned,
}

impl<K> State<K> {
    fn name(&self) -> &'static str {
        use State::*;

        match self {
            NotStarted => "not started",
            Open { .. } => "group open",
            Pending { .. } => "boundary pending",
            Finished => "finished",
            Poisoned => "poisoned",
        }
    }
}

/// A two-level, group-then-record view over a key-sorted [`Cursor`].
///
/// The protocol is:
///
/// 1. call [`next_group`](GroupedSequence::next_group); `false` means there
///    are no more groups,
/// 2. call [`next_in_group`](GroupedSequence::next_in_group) until it returns
///    `false`, reading each record through [`cursor`](GroupedSequence::cursor),
/// 3. go back to 1.
///
/// Calls out of this order fail with a [`CallOrderError`]. Errors from the
/// cursor or the key extractor are returned unchanged as
/// [`GroupError::DataAccess`], after which the sequence must be discarded.
pub struct GroupedSequence<C, X>
where
    C: Cursor,
    X: KeyExtractor<C>,
{
    cursor: C,
    extractor: X,
    state: State<X::Key>,
    groups: usize,
    records: usize,
}

impl<C, X> GroupedSequence<C, X>
where
    C: Cursor,
    X: KeyExtractor<C>,
{
    /// Create a sequence over `cursor`, which must be positioned before its
    /// first record and sorted by the key `extractor` computes.
    pub fn new(cursor: C, extractor: X) -> Self {
        GroupedSequence {
            cursor,
            extractor,
            state: State::NotStarted,
            groups: 0,
            records: 0,
        }
    }

    /// Open the next group, returning `false` once the cursor is exhausted.
    ///
    /// The previous group must have been drained with `next_in_group` (or
    /// [`skip_group`](GroupedSequence::skip_group)) first.
    pub fn next_group(&mut self) -> std::result::Result<bool, GroupError<C::Error>> {
        match std::mem::replace(&mut self.state, State::Poisoned) {
            State::Finished => {
                self.state = State::Finished;
                Ok(false)
            }

            State::NotStarted => {
                if !self.advance()? {
                    debug!("cursor was empty; no groups");
                    self.state = State::Finished;
                    return Ok(false);
                }
                let key = self.extract()?;
                self.open(key);
                Ok(true)
            }

            State::Pending { next_key, .. } => {
                self.open(next_key);
                Ok(true)
            }

            state @ State::Open { .. } => {
                self.state = state;
                Err(CallOrderError::GroupNotExhausted.into())
            }

            State::Poisoned => Err(CallOrderError::Poisoned.into()),
        }
    }

    /// Move to the next record of the open group, returning `false` at the
    /// end of the group.
    ///
    /// After a `true` return the cursor is positioned on the yielded record.
    pub fn next_in_group(&mut self) -> std::result::Result<bool, GroupError<C::Error>> {
        match std::mem::replace(&mut self.state, State::Poisoned) {
            State::Finished => {
                self.state = State::Finished;
                Ok(false)
            }

            State::NotStarted => {
                self.state = State::NotStarted;
                Err(CallOrderError::NotStarted.into())
            }

            state @ State::Pending { .. } => {
                self.state = state;
                Err(CallOrderError::BoundaryPending.into())
            }

            State::Open {
                key,
                consumed: false,
            } => {
                self.state = State::Open {
                    key,
                    consumed: true,
                };
                self.records += 1;
                Ok(true)
            }

            State::Open {
                key,
                consumed: true,
            } => {
                if !self.advance()? {
                    debug!(
                        "cursor exhausted after {} records in {} groups",
                        self.records, self.groups
                    );
                    self.state = State::Finished;
                    return Ok(false);
                }

                let next_key = self.extract()?;
                if next_key == key {
                    self.state = State::Open {
                        key,
                        consumed: true,
                    };
                    self.records += 1;
                    Ok(true)
                } else {
                    trace!("group {} ended at a key boundary", self.groups);
                    self.state = State::Pending { key, next_key };
                    Ok(false)
                }
            }

            State::Poisoned => Err(CallOrderError::Poisoned.into()),
        }
    }

    /// The key of the open group; `None` is the null key.
    ///
    /// Readable from the first successful `next_group` until the cursor is
    /// exhausted, including after `next_in_group` reported the end of a group
    /// that is followed by another one.
    pub fn current_key(&self) -> std::result::Result<Option<&X::Key>, CallOrderError> {
        match &self.state {
            State::Open { key, .. } | State::Pending { key, .. } => Ok(key.as_ref()),
            State::NotStarted => Err(CallOrderError::NotStarted),
            State::Finished => Err(CallOrderError::Finished),
            State::Poisoned => Err(CallOrderError::Poisoned),
        }
    }

    /// Drain the rest of the open group, returning how many records were
    /// skipped.
    ///
    /// Afterwards the sequence is where a `next_in_group` loop that ran to
    /// `false` would leave it.
    pub fn skip_group(&mut self) -> std::result::Result<usize, GroupError<C::Error>> {
        let mut skipped = 0;
        while self.next_in_group()? {
            skipped += 1;
        }

        Ok(skipped)
    }

    /// Whether the cursor has been exhausted.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished)
    }

    /// The underlying cursor, for reading the current record.
    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    /// Give back the underlying cursor.
    pub fn into_inner(self) -> C {
        self.cursor
    }

    fn open(&mut self, key: Option<X::Key>) {
        self.groups += 1;
        trace!("opening group {}", self.groups);
        self.state = State::Open {
            key,
            consumed: false,
        };
    }

    // Both helpers leave `state` as `Poisoned` on error; callers replace it on
    // every other path.
    fn advance(&mut self) -> std::result::Result<bool, GroupError<C::Error>> {
        self.cursor.advance().map_err(GroupError::DataAccess)
    }

    fn extract(&mut self) -> std::result::Result<Option<X::Key>, GroupError<C::Error>> {
        self.extractor
            .extract(&self.cursor)
            .map_err(GroupError::DataAccess)
    }
}

impl<C, X> fmt::Debug for GroupedSequence<C, X>
where
    C: Cursor + fmt::Debug,
    X: KeyExtractor<C>,
    X::Key: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match &self.state {
            State::Open { key, .. } | State::Pending { key, .. } => Some(key),
            _ => None,
        };

        f.debug_struct("GroupedSequence")
            .field("cursor", &self.cursor)
            .field("state", &self.state.name())
            .field("key", &key)
            .field("groups", &self.groups)
            .field("records", &self.records)
            .finish()
    }
}

/// A [`Cursor`] extension that groups the cursor's records by key.
pub trait Grouped: Cursor + Sized {
    /// Group this cursor's records into runs of equal key.
    ///
    /// ```
    /// use std::convert::Infallible;
    /// use std::vec::IntoIter;
    ///
    /// use grouped_cursor::{Grouped, IterCursor};
    ///
    /// fn initial(c: &IterCursor<IntoIter<&'static str>>) -> Result<Option<char>, Infallible> {
    ///     Ok(c.current().and_then(|w| w.chars().next()))
    /// }
    ///
    /// let words = IterCursor::new(vec!["apple", "avocado", "banana"].into_iter());
    /// let mut groups = words.grouped_by(initial);
    ///
    /// let mut firsts = Vec::new();
    /// while groups.next_group().unwrap() {
    ///     firsts.push(*groups.current_key().unwrap().unwrap());
    ///     groups.skip_group().unwrap();
    /// }
    /// assert_eq!(firsts, vec!['a', 'b']);
    /// ```
    fn grouped_by<X>(self, extractor: X) -> GroupedSequence<Self, X>
    where
        X: KeyExtractor<Self>,
    {
        GroupedSequence::new(self, extractor)
    }
}

impl<C> Grouped for C where C: Cursor {}
