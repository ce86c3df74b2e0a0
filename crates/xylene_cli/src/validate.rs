//! `xylene validate`: check a bitstream against its part.

use std::error::Error;

use serde_json::json;
use xylene_core::{validate, validate_with_database, ValidationPolicy};

use crate::report::{print_json, print_summary, render_diagnostics};
use crate::session::{origin, Session};
use crate::{GlobalArgs, ReportFormat, ValidateArgs};

/// Runs the `xylene validate` command.
///
/// Returns exit code 1 if validation reports a fatal diagnostic.
pub fn run(args: &ValidateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let session = Session::load(global)?;
    let policy = ValidationPolicy {
        strict: args.strict || session.config.validate.strict,
        scope: session.scope(args.scope),
    };

    let (container, _) = session.decode_file(&args.file)?;
    let diags = match &session.database {
        Some(db) => validate_with_database(&container, db, &policy),
        None => validate(&container, None, &policy),
    };

    let name = origin(&args.file);
    match session.format(args.format) {
        ReportFormat::Text => {
            render_diagnostics(&diags, &name, global);
            print_summary([&diags], global);
        }
        ReportFormat::Json => print_json(&json!({
            "file": name,
            "scope": policy.scope,
            "strict": policy.strict,
            "diagnostics": diags,
        }))?,
    }
    Ok(i32::from(diags.has_fatal()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{global_with_db, write_column};
    use crate::ScopeArg;

    fn args(file: std::path::PathBuf, scope: Option<ScopeArg>, strict: bool) -> ValidateArgs {
        ValidateArgs {
            file,
            strict,
            scope,
            format: Some(ReportFormat::Json),
        }
    }

    #[test]
    fn complete_column_passes() {
        let tmp = tempfile::tempdir().unwrap();
        let global = global_with_db(tmp.path());
        let file = write_column(tmp.path(), "a.bit", 1);
        assert_eq!(run(&args(file, None, true), &global).unwrap(), 0);
    }

    #[test]
    fn device_scope_gaps_fail_only_when_strict() {
        let tmp = tempfile::tempdir().unwrap();
        let global = global_with_db(tmp.path());
        let file = write_column(tmp.path(), "a.bit", 1);
        let lenient = args(file.clone(), Some(ScopeArg::Device), false);
        assert_eq!(run(&lenient, &global).unwrap(), 0);
        let strict = args(file, Some(ScopeArg::Device), true);
        assert_eq!(run(&strict, &global).unwrap(), 1);
    }
}
