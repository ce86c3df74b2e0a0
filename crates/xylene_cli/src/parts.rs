//! `xylene parts`: list the part database.

use std::error::Error;

use serde_json::json;

use crate::report::print_json;
use crate::session::Session;
use crate::{GlobalArgs, PartsArgs, ReportFormat};

/// Runs the `xylene parts` command.
pub fn run(args: &PartsArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = Session::load(global)?;
    let db = session.require_database()?;

    match session.format(args.format) {
        ReportFormat::Text => {
            println!(
                "{:<16} {:<12} {:<12} {:>8} {:>6} {:>5} {:>9}",
                "PART", "FAMILY", "IDCODE", "FRAMES", "WORDS", "ROWS", "REGISTERS"
            );
            for part in db.list_parts() {
                println!(
                    "{:<16} {:<12} {:<12} {:>8} {:>6} {:>5} {:>9}",
                    part.name(),
                    part.family(),
                    part.idcode().to_string(),
                    part.frame_count(),
                    part.words_per_frame(),
                    part.rows(),
                    part.registers().len()
                );
            }
        }
        ReportFormat::Json => {
            let parts: Vec<_> = db
                .list_parts()
                .map(|part| {
                    json!({
                        "name": part.name(),
                        "family": part.family(),
                        "idcode": part.idcode().to_string(),
                        "frame_count": part.frame_count(),
                        "words_per_frame": part.words_per_frame(),
                        "rows": part.rows(),
                        "major_order": part.major_order(),
                        "registers": part.registers().iter().map(|r| &r.name).collect::<Vec<_>>(),
                    })
                })
                .collect();
            print_json(&parts)?;
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::global_with_db;

    #[test]
    fn lists_parts() {
        let tmp = tempfile::tempdir().unwrap();
        let global = global_with_db(tmp.path());
        let args = PartsArgs {
            format: Some(ReportFormat::Text),
        };
        assert_eq!(run(&args, &global).unwrap(), 0);
    }

    #[test]
    fn needs_a_database() {
        let tmp = tempfile::tempdir().unwrap();
        let mut global = global_with_db(tmp.path());
        global.db = None;
        let args = PartsArgs { format: None };
        if std::env::var_os(xylene_database::DB_ENV_VAR).is_none() {
            assert!(run(&args, &global).is_err());
        }
    }
}
