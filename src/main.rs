// Copyright 2020 Steven Bosnick
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE-2.0 or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms

use std::fs::File;
use std::io::{self, prelude::*, stdout, BufWriter};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Error};
use clap::{ArgAction, Args, Parser, Subcommand};
use log::Level;

use grouped_cursor::logger::LoggerBuilder;
use grouped_cursor::report::{write_groups, write_summary, OutputFormat};
use grouped_cursor::table::{ColumnRef, Table};

/// Walk the rows of a key-sorted table group by group.
#[derive(Parser)]
#[command(version, about)]
struct Opt {
    /// Increases the logging level (use multiple times for more detail).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Specifies the output file to use instead of standard out.
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    subcommand: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every group and the records in it.
    ///
    /// The input is a JSON document of the form
    /// `{"columns": ["one", "two"], "rows": [["a", 1], ["b", 2]]}` whose rows
    /// are already sorted by the grouping column. Consecutive rows whose
    /// grouping cell is null form one group, printed as `<null>`.
    Group(GroupOpt),

    /// Print each group key with the number of records in the group.
    Summarize(CommonOpt),
}

#[derive(Args)]
struct CommonOpt {
    /// The column to group on, as a zero-based index or a column label.
    #[arg(short, long, default_value = "0")]
    column: ColumnRef,

    /// The table to read; standard in when omitted.
    input: Option<PathBuf>,
}

#[derive(Args)]
struct GroupOpt {
    #[command(flatten)]
    common: CommonOpt,

    /// How each record is written.
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,
}

impl Command {
    fn run(&self, w: impl Write) -> Result<(), Error> {
        use Command::*;

        match self {
            Group(opt) => {
                let table = opt.common.table()?;
                Ok(write_groups(w, &table, opt.common.column.clone(), opt.format)?)
            }
            Summarize(opt) => {
                let table = opt.table()?;
                Ok(write_summary(w, &table, opt.column.clone())?)
            }
        }
    }
}

impl CommonOpt {
    fn table(&self) -> Result<Table, Error> {
        match &self.input {
            Some(path) => Table::from_path(path)
                .with_context(|| format!("Failed to load table {}", path.display())),
            None => {
                Table::from_reader(io::stdin().lock()).context("Failed to load table from stdin")
            }
        }
    }
}

fn main() -> Result<(), Error> {
    let opt = Opt::parse();

    LoggerBuilder::default()
        .output(Level::Trace, io::stderr())
        .output(Level::Debug, io::stderr())
        .output(Level::Info, io::stderr())
        .verbosity(opt.verbose)
        .init()
        .map_err(|e| anyhow!(e))?;

    match opt.output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            opt.subcommand.run(&mut writer)?;
            writer.flush().context("Failed to flush the output")
        }

        None => {
            let mut writer = BufWriter::new(stdout());
            opt.subcommand.run(&mut writer)?;
            writer.flush().context("Failed to flush the output")
        }
    }
}
