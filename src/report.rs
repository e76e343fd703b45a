// Copyright 2020 Steven Bosnick
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE-2.0 or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Streaming reports over the groups of a [`Table`].

use std::io::Write;

use clap::ValueEnum;
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;

use crate::table::{ColumnKey, ColumnRef, Table};
use crate::{Error, GroupedSequence, Result};

/// How [`write_groups`] renders each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// A `group <key>` header followed by one indented line per record.
    #[default]
    Text,

    /// One JSON object per line for every record.
    Json,
}

#[derive(Serialize)]
struct RecordLine<'a> {
    group: usize,
    key: Option<&'a str>,
    record: &'a [Value],
}

/// Write every group of `table`, keyed on `column`, to `output`.
///
/// The rows of `table` must already be sorted by `column`. Records are written
/// as they are reached, so no group is held in memory.
pub fn write_groups(
    mut output: impl Write,
    table: &Table,
    column: ColumnRef,
    format: OutputFormat,
) -> Result<()> {
    info!("writing groups keyed on {:?} as {:?}", column, format);
    let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::from(column));
    let mut group = 0;

    while groups.next_group()? {
        group += 1;
        let key = groups.current_key()?.cloned();

        if format == OutputFormat::Text {
            writeln!(output, "group {}", display_key(key.as_deref()))
                .map_err(Error::output_error)?;
        }

        while groups.next_in_group()? {
            let cursor = groups.cursor();
            match format {
                OutputFormat::Text => {
                    writeln!(output, "    {}", cursor.describe_record())
                        .map_err(Error::output_error)?;
                }
                OutputFormat::Json => {
                    let line = RecordLine {
                        group,
                        key: key.as_deref(),
                        record: cursor.row()?,
                    };
                    serde_json::to_writer(&mut output, &line).map_err(Error::encode_error)?;
                    writeln!(output).map_err(Error::output_error)?;
                }
            }
        }
    }

    debug!("wrote {} groups", group);
    Ok(())
}

/// Write one `<key>\t<count>` line per group of `table`, keyed on `column`.
pub fn write_summary(mut output: impl Write, table: &Table, column: ColumnRef) -> Result<()> {
    info!("summarizing groups keyed on {:?}", column);
    let mut groups = GroupedSequence::new(table.cursor(), ColumnKey::from(column));

    while groups.next_group()? {
        let key = groups.current_key()?.cloned();
        let count = groups.skip_group()?;

        writeln!(output, "{}\t{}", display_key(key.as_deref()), count)
            .map_err(Error::output_error)?;
    }

    Ok(())
}

fn display_key(key: Option<&str>) -> &str {
    key.unwrap_or("<null>")
}
