//! `xylene describe`, `frames`, `diff` and `register`: bit-level queries.
//!
//! Each command decodes its inputs, binds them to their part by IDCODE and
//! runs one query from `xylene_core`.

use std::error::Error;

use serde_json::json;
use xylene_common::FrameAddress;
use xylene_core::{
    describe_bit, diff as diff_frames, frame_address, frames_outside, frames_touched,
    read_register, BitMeaning, PhysicalAddress,
};

use crate::report::{bit_text, print_json};
use crate::session::Session;
use crate::{DescribeArgs, DiffArgs, FramesArgs, GlobalArgs, RegisterArgs, ReportFormat};

/// Runs the `xylene describe` command.
pub fn describe(args: &DescribeArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = Session::load(global)?;
    let bs = session.bind_file(&args.file)?;
    let address = PhysicalAddress::new(FrameAddress::from_raw(args.frame), args.word, args.bit);
    let meaning = describe_bit(&bs, address)?;

    match session.format(args.format) {
        ReportFormat::Text => match &meaning {
            BitMeaning::Mapped {
                register,
                description,
                index,
                coordinate,
                value,
            } => {
                println!("{address}: {register}[{index}] = {}", bit_text(*value));
                println!("  at {coordinate}");
                if !description.is_empty() {
                    println!("  {description}");
                }
            }
            BitMeaning::Unmapped { coordinate, value } => {
                println!("{address}: unmapped = {}", bit_text(*value));
                println!("  at {coordinate}");
            }
        },
        ReportFormat::Json => print_json(&meaning)?,
    }
    Ok(0)
}

/// Runs the `xylene frames` command.
pub fn frames(args: &FramesArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = Session::load(global)?;
    let bs = session.bind_file(&args.file)?;
    let touched = frames_touched(&bs);
    let outside = frames_outside(&bs);

    let mut rows = Vec::with_capacity(touched.len());
    for location in &touched {
        rows.push((frame_address(*location, bs.part())?, location));
    }

    match session.format(args.format) {
        ReportFormat::Text => {
            for (address, location) in &rows {
                println!("{address}  {location}");
            }
            for address in &outside {
                println!("{address}  outside {}", bs.part().name());
            }
            if !global.quiet {
                eprintln!("   {} frame(s) of {}", rows.len(), bs.part().name());
                if !outside.is_empty() {
                    eprintln!("   {} frame(s) outside the part", outside.len());
                }
            }
        }
        ReportFormat::Json => {
            let out: Vec<_> = rows
                .iter()
                .map(|(address, location)| json!({ "address": address, "location": location }))
                .chain(
                    outside
                        .iter()
                        .map(|address| json!({ "address": address, "location": null })),
                )
                .collect();
            print_json(&out)?;
        }
    }
    Ok(0)
}

/// Runs the `xylene diff` command.
pub fn diff(args: &DiffArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = Session::load(global)?;
    let old = session.bind_file(&args.old)?;
    let new = session.bind_file(&args.new)?;
    let format = session.format(args.format);

    let mut count = 0usize;
    let mut out = Vec::new();
    for frame in diff_frames(&old, &new)? {
        count += 1;
        match format {
            ReportFormat::Text => {
                let state = match (&frame.old, &frame.new) {
                    (None, _) => "added",
                    (_, None) => "removed",
                    _ => "changed",
                };
                let place = frame
                    .location
                    .map_or_else(|| "outside the part".to_string(), |l| l.to_string());
                let changes = frame.changed_bits();
                println!(
                    "{} {state}: {place} ({} bit(s))",
                    frame.address,
                    changes.len()
                );
                if args.bits {
                    for change in &changes {
                        println!(
                            "    word {} bit {}: {} -> {}",
                            change.word,
                            change.bit,
                            u8::from(change.old),
                            u8::from(change.new)
                        );
                    }
                }
            }
            ReportFormat::Json => {
                let mut value = json!(frame);
                if args.bits {
                    value["changed_bits"] = json!(frame.changed_bits());
                }
                out.push(value);
            }
        }
    }

    match format {
        ReportFormat::Text if !global.quiet => eprintln!("   {count} frame(s) differ"),
        ReportFormat::Text => {}
        ReportFormat::Json => print_json(&out)?,
    }
    Ok(0)
}

/// Runs the `xylene register` command.
pub fn register(args: &RegisterArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = Session::load(global)?;
    let bs = session.bind_file(&args.file)?;
    let value = read_register(&bs, &args.name, args.row.zip(args.column))?;

    match session.format(args.format) {
        ReportFormat::Text => {
            let instance = &value.instance;
            let place = match (instance.row, instance.column) {
                (Some(row), Some(column)) => format!("row {row} column {column}, "),
                _ => String::new(),
            };
            let bits: String = value.bits.iter().rev().map(|b| bit_text(*b)).collect();
            match value.as_u64() {
                Some(v) => println!("{}: 0x{v:X} (0b{bits})", instance.name),
                None => println!("{}: 0b{bits}", instance.name),
            }
            println!("  {place}frame {} bits {}", instance.frame, instance.bits);
        }
        ReportFormat::Json => print_json(&value)?,
    }
    Ok(0)
}
