// Copyright 2020 Steven Bosnick
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE-2.0 or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use assert_matches::assert_matches;
use serde_json::{json, Value};

use grouped_cursor::table::{ColumnKey, Table, TableCursor};
use grouped_cursor::{CallOrderError, Cursor, GroupError, Grouped, GroupedSequence, TableError};

#[test]
fn empty_table_has_no_groups() {
    let table = Table::empty(vec!["header1".into()]);
    let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::index(0));

    assert!(!groups.next_group().unwrap());
    assert!(!groups.next_group().unwrap());
    assert!(!groups.next_in_group().unwrap());
    assert_matches!(groups.current_key(), Err(CallOrderError::Finished));
}

#[test]
fn next_group_must_be_called_before_next_in_group() {
    let table = sample_table();
    let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::index(0));

    assert_matches!(
        groups.next_in_group(),
        Err(GroupError::CallOrder(CallOrderError::NotStarted))
    );
    assert_matches!(groups.current_key(), Err(CallOrderError::NotStarted));

    // The misuse did not move the cursor.
    assert!(groups.next_group().unwrap());
    assert_eq!(groups.current_key().unwrap().map(String::as_str), Some("a"));
}

#[test]
fn navigate_all_groups_and_records_in_sample() {
    let table = sample_table();
    let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::index(0));

    for (key, records) in [
        ("a", ["a, b, c", "a, d, e"]),
        ("b", ["b, b, c", "b, d, e"]),
        ("c", ["c, b, c", "c, d, e"]),
    ] {
        assert!(groups.next_group().unwrap());
        assert_eq!(groups.current_key().unwrap().map(String::as_str), Some(key));

        for record in records {
            assert!(groups.next_in_group().unwrap());
            assert_eq!(groups.cursor().describe_record(), record);
            assert_eq!(groups.current_key().unwrap().map(String::as_str), Some(key));
        }
        assert!(!groups.next_in_group().unwrap());
    }

    assert!(!groups.next_group().unwrap());
    assert!(groups.is_finished());
}

#[test]
fn groups_by_label() {
    let table = sample_table();
    let mut groups = table.cursor().grouped_by(ColumnKey::named("one"));
    let mut keys = Vec::new();

    while groups.next_group().unwrap() {
        keys.push(groups.current_key().unwrap().cloned());
        groups.skip_group().unwrap();
    }

    assert_eq!(
        keys,
        vec![Some("a".to_owned()), Some("b".to_owned()), Some("c".to_owned())]
    );
}

#[test]
fn every_record_is_yielded_once_in_order() {
    let table = table(&[
        &["a", "1"],
        &["b", "2"],
        &["b", "3"],
        &["b", "4"],
        &["c", "5"],
        &["d", "6"],
        &["d", "7"],
    ]);
    let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::index(0));
    let mut seen = Vec::new();
    let mut sizes = Vec::new();

    while groups.next_group().unwrap() {
        let mut size = 0;
        while groups.next_in_group().unwrap() {
            seen.push(groups.cursor().get_str(1).unwrap().unwrap().to_owned());
            size += 1;
        }
        sizes.push(size);
    }

    assert_eq!(seen, ["1", "2", "3", "4", "5", "6", "7"]);
    assert_eq!(sizes, [1, 3, 1, 2]);
    assert_eq!(seen.len(), table.len());
}

#[test]
fn singleton_group_yields_once() {
    let table = table(&[&["only", "x"]]);
    let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::index(0));

    assert!(groups.next_group().unwrap());
    assert!(groups.next_in_group().unwrap());
    assert!(!groups.next_in_group().unwrap());
    assert!(!groups.next_group().unwrap());
}

#[test]
fn consecutive_null_keys_form_one_group() {
    let table = Table::new(
        vec!["key".into(), "value".into()],
        vec![
            vec![Value::Null, json!("1")],
            vec![Value::Null, json!("2")],
            vec![json!("a"), json!("3")],
            vec![Value::Null, json!("4")],
        ],
    )
    .unwrap();
    let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::index(0));

    assert!(groups.next_group().unwrap());
    assert_eq!(groups.current_key(), Ok(None));
    assert_eq!(groups.skip_group().unwrap(), 2);

    assert!(groups.next_group().unwrap());
    assert_eq!(groups.current_key().unwrap().map(String::as_str), Some("a"));
    assert_eq!(groups.skip_group().unwrap(), 1);

    assert!(groups.next_group().unwrap());
    assert_eq!(groups.current_key(), Ok(None));
    assert_eq!(groups.skip_group().unwrap(), 1);

    assert!(!groups.next_group().unwrap());
}

#[test]
fn next_group_before_group_is_exhausted_is_error() {
    let table = sample_table();
    let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::index(0));

    assert!(groups.next_group().unwrap());
    assert_matches!(
        groups.next_group(),
        Err(GroupError::CallOrder(CallOrderError::GroupNotExhausted))
    );

    assert!(groups.next_in_group().unwrap());
    assert_matches!(
        groups.next_group(),
        Err(GroupError::CallOrder(CallOrderError::GroupNotExhausted))
    );

    // Both records of the first group are still there.
    assert!(groups.next_in_group().unwrap());
    assert_eq!(groups.cursor().describe_record(), "a, d, e");
    assert!(!groups.next_in_group().unwrap());
}

#[test]
fn next_in_group_after_group_end_is_error() {
    let table = sample_table();
    let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::index(0));

    assert!(groups.next_group().unwrap());
    assert_eq!(groups.skip_group().unwrap(), 2);
    assert_matches!(
        groups.next_in_group(),
        Err(GroupError::CallOrder(CallOrderError::BoundaryPending))
    );
    assert_matches!(
        groups.next_in_group(),
        Err(GroupError::CallOrder(CallOrderError::BoundaryPending))
    );

    assert!(groups.next_group().unwrap());
    assert_eq!(groups.current_key().unwrap().map(String::as_str), Some("b"));
}

#[test]
fn key_extraction_failure_is_propagated() {
    let table = Table::new(
        vec!["key".into()],
        vec![vec![json!("a")], vec![json!(17)]],
    )
    .unwrap();
    let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::index(0));

    assert!(groups.next_group().unwrap());
    assert!(groups.next_in_group().unwrap());
    assert_matches!(
        groups.next_in_group(),
        Err(GroupError::DataAccess(TableError::TypeMismatch { index: 0, .. }))
    );

    assert_matches!(
        groups.next_in_group(),
        Err(GroupError::CallOrder(CallOrderError::Poisoned))
    );
    assert_matches!(
        groups.next_group(),
        Err(GroupError::CallOrder(CallOrderError::Poisoned))
    );
    assert_matches!(groups.current_key(), Err(CallOrderError::Poisoned));
}

#[test]
fn unknown_label_is_propagated() {
    let table = sample_table();
    let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::named("four"));

    assert_matches!(
        groups.next_group(),
        Err(GroupError::DataAccess(TableError::ColumnNotFound { label })) if label == "four"
    );
}

/// Fails on the advance after `fail_after` records.
struct FlakyCursor {
    remaining: usize,
    fail_after: usize,
    advances: usize,
}

#[derive(Debug, PartialEq)]
struct Disconnected;

impl Cursor for FlakyCursor {
    type Error = Disconnected;

    fn advance(&mut self) -> Result<bool, Disconnected> {
        self.advances += 1;
        if self.advances > self.fail_after {
            return Err(Disconnected);
        }
        if self.remaining == 0 {
            return Ok(false);
        }
        self.remaining -= 1;
        Ok(true)
    }
}

fn constant_key(_: &&mut FlakyCursor) -> Result<Option<u8>, Disconnected> {
    Ok(Some(0))
}

#[test]
fn cursor_failure_is_propagated_unchanged() {
    let mut cursor = FlakyCursor {
        remaining: 5,
        fail_after: 2,
        advances: 0,
    };
    let mut groups = GroupedSequence::new(&mut cursor, constant_key);

    assert!(groups.next_group().unwrap());
    assert!(groups.next_in_group().unwrap());
    assert!(groups.next_in_group().unwrap());
    assert_matches!(groups.next_in_group(), Err(GroupError::DataAccess(Disconnected)));

    drop(groups);
    assert_eq!(cursor.advances, 3);
}

#[test]
fn cursor_is_advanced_only_when_needed() {
    let mut cursor = FlakyCursor {
        remaining: 2,
        fail_after: usize::MAX,
        advances: 0,
    };
    let mut groups = GroupedSequence::new(&mut cursor, constant_key);

    assert!(groups.next_group().unwrap());
    assert!(groups.next_in_group().unwrap());
    assert_eq!(groups.cursor().advances, 1);
    assert!(groups.next_in_group().unwrap());
    assert_eq!(groups.cursor().advances, 2);
    assert!(!groups.next_in_group().unwrap());
    assert_eq!(groups.cursor().advances, 3);
    assert!(!groups.next_group().unwrap());
    assert!(!groups.next_in_group().unwrap());

    let cursor = groups.into_inner();
    assert_eq!(cursor.advances, 3);
}

fn pair_key(cursor: &&mut FlakyCursor) -> Result<Option<usize>, Disconnected> {
    Ok(Some((cursor.advances + 1) / 2))
}

#[test]
fn opening_the_next_group_reuses_the_lookahead_record() {
    let mut cursor = FlakyCursor {
        remaining: 4,
        fail_after: usize::MAX,
        advances: 0,
    };
    let mut groups = GroupedSequence::new(&mut cursor, pair_key);

    assert!(groups.next_group().unwrap());
    assert_eq!(groups.skip_group().unwrap(), 2);
    assert_eq!(groups.cursor().advances, 3);

    assert!(groups.next_group().unwrap());
    assert_eq!(groups.current_key(), Ok(Some(&2)));
    assert_eq!(groups.cursor().advances, 3);
    assert!(groups.next_in_group().unwrap());
    assert_eq!(groups.cursor().advances, 3);

    assert!(groups.next_in_group().unwrap());
    assert_eq!(groups.cursor().advances, 4);
    assert!(!groups.next_in_group().unwrap());
    assert_eq!(groups.cursor().advances, 5);
    assert!(!groups.next_group().unwrap());
    assert_eq!(groups.cursor().advances, 5);
}

#[test]
fn describes_cursor_position() {
    let table = table(&[&["a", "b"]]);
    let mut cursor: TableCursor<'_> = table.cursor();

    assert_eq!(cursor.describe_record(), "<at beginning>");
    assert!(cursor.advance().unwrap());
    assert_eq!(cursor.describe_record(), "a, b");
    assert!(!cursor.advance().unwrap());
    assert_eq!(cursor.describe_record(), "<at end>");
    assert_matches!(cursor.get_str(0), Err(TableError::NoCurrentRecord));
}

fn sample_table() -> Table {
    table(&[
        // group one
        &["a", "b", "c"],
        &["a", "d", "e"],
        // group two
        &["b", "b", "c"],
        &["b", "d", "e"],
        // group three
        &["c", "b", "c"],
        &["c", "d", "e"],
    ])
}

fn table(rows: &[&[&str]]) -> Table {
    let width = rows.first().map_or(0, |row| row.len());
    let columns = ["one", "two", "three"]
        .iter()
        .take(width)
        .map(|c| c.to_string())
        .collect();
    let rows = rows
        .iter()
        .map(|row| row.iter().map(|cell| json!(cell)).collect())
        .collect();

    Table::new(columns, rows).expect("rows should match the columns")
}
