//! `xylene decode`: decode bitstreams and report anomalies.
//!
//! All inputs are read up front and decoded in parallel; reports are printed
//! in argument order.

use std::error::Error;

use serde_json::json;
use xylene_bitstream::{decode_many, BitstreamContainer};
use xylene_diagnostics::Diagnostics;

use crate::report::{print_json, print_summary, render_diagnostics};
use crate::session::{origin, read_input, Session};
use crate::{DecodeArgs, GlobalArgs, ReportFormat};

/// Runs the `xylene decode` command.
///
/// Returns exit code 1 if any input fails to decode or carries a fatal
/// diagnostic.
pub fn run(args: &DecodeArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = Session::load(global)?;
    let strict = args.strict || session.config.decode.strict;
    let format = session.format(args.format);

    let inputs = args
        .files
        .iter()
        .map(|path| read_input(path))
        .collect::<Result<Vec<_>, _>>()?;
    let options = session.decode_options(strict);
    let results = decode_many(&inputs, &options);

    let mut failed = false;
    let mut reports = Vec::new();
    let mut all_diags = Vec::new();
    for (path, result) in args.files.iter().zip(results) {
        let name = origin(path);
        match result {
            Ok((container, diags)) => {
                failed |= diags.has_fatal();
                match format {
                    ReportFormat::Text => {
                        if !global.quiet {
                            print!("{}", summarize(&name, &container));
                        }
                        render_diagnostics(&diags, &name, global);
                    }
                    ReportFormat::Json => reports.push(to_json(&name, &container, &diags)),
                }
                all_diags.push(diags);
            }
            Err(e) => {
                failed = true;
                match format {
                    ReportFormat::Text => eprintln!("error: {name}: {e}"),
                    ReportFormat::Json => {
                        reports.push(json!({ "file": name, "error": e.to_string() }))
                    }
                }
            }
        }
    }

    match format {
        ReportFormat::Text => print_summary(&all_diags, global),
        ReportFormat::Json => print_json(&reports)?,
    }
    Ok(i32::from(failed))
}

/// Formats the human-readable overview of one container.
fn summarize(name: &str, container: &BitstreamContainer) -> String {
    let header = container.header();
    let mut out = format!("{name}\n");
    if let Some(design) = &header.design {
        out.push_str(&format!("  design:      {design}\n"));
    }
    if let Some(part) = &header.part {
        out.push_str(&format!("  header part: {part}\n"));
    }
    if let (Some(date), Some(time)) = (&header.date, &header.time) {
        out.push_str(&format!("  built:       {date} {time}\n"));
    }
    match container.idcode() {
        Some(idcode) => out.push_str(&format!("  idcode:      {idcode}\n")),
        None => out.push_str("  idcode:      none\n"),
    }
    if let Some(part) = container.part() {
        out.push_str(&format!("  part:        {part}\n"));
    }
    out.push_str(&format!(
        "  sync:        byte 0x{:X}\n",
        container.sync_offset()
    ));
    out.push_str(&format!("  packets:     {}\n", container.packets().len()));
    match container.frame_words() {
        Some(words) => out.push_str(&format!(
            "  frames:      {} x {words} words\n",
            container.frames().len()
        )),
        None => out.push_str(&format!("  frames:      {}\n", container.frames().len())),
    }
    if let Some(crc) = container.stated_checksum() {
        out.push_str(&format!("  crc:         0x{crc:08X}\n"));
    }
    out.push_str(&format!("  fingerprint: {}\n", container.fingerprint()));
    out
}

fn to_json(name: &str, container: &BitstreamContainer, diags: &Diagnostics) -> serde_json::Value {
    json!({
        "file": name,
        "fingerprint": container.fingerprint().to_string(),
        "header": container.header(),
        "sync_offset": container.sync_offset(),
        "idcode": container.idcode().map(|id| id.to_string()),
        "part": container.part().map(|p| p.name().to_string()),
        "packets": container.packets().len(),
        "frame_words": container.frame_words(),
        "frames": container.frames().len(),
        "stated_crc": container.stated_checksum(),
        "diagnostics": diags,
    })
}
