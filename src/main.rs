//! `dioc`: compile restricted imperative loops into Diophantine equation
//! systems (§1, §6). The single invocation surface of the compiler; the
//! standalone evaluator ships separately as `dioc-step` (`dioc-interp`),
//! exactly as the teacher ships `cider` apart from its `calyx` binary.

use std::fs;
use std::path::PathBuf;

use argh::FromArgs;

use dioc_frontend::DiocParser;
use dioc_ir::printer::{
    self, estimate_machine_file_size, estimate_report_size, ReportData, WriteSink,
};
use dioc_utils::{DiocResult, Error};

const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024 * 1024;

#[derive(FromArgs)]
/// Compile a restricted imperative loop into a Diophantine equation system.
struct Opts {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Compile(CompileCmd),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "compile")]
/// run the full pipeline and write `report.txt`/`equations.dio`
struct CompileCmd {
    /// path to the input program
    #[argh(positional)]
    input: PathBuf,

    /// directory artifacts are written into (default: `output`)
    #[argh(option, long = "out-dir", default = "PathBuf::from(\"output\")")]
    out_dir: PathBuf,

    /// size safeguard, in bytes (§5; default: 5 GiB)
    #[argh(option, long = "max-bytes", default = "DEFAULT_MAX_BYTES")]
    max_bytes: u64,
}

fn run() -> DiocResult<()> {
    let opts: Opts = argh::from_env();
    match opts.command {
        Command::Compile(cmd) => run_compile(cmd),
    }
}

/// §5: the safeguard compares the *combined* size of both artifacts against
/// the limit, not the larger of the two alone -- a report and a machine
/// file that are each under the limit can still together exceed it.
fn check_size_limit(report_bytes: u64, machine_bytes: u64, max_bytes: u64) -> DiocResult<()> {
    let estimated = report_bytes.saturating_add(machine_bytes);
    if estimated > max_bytes {
        return Err(Error::size_limit(estimated, max_bytes));
    }
    Ok(())
}

fn run_compile(cmd: CompileCmd) -> DiocResult<()> {
    log::info!("reading input program from {}", cmd.input.display());
    let program = DiocParser::parse_file(&cmd.input)?;

    let out = dioc_opt::compile(&program)?;

    let report_data = ReportData {
        state_vars: out.state_vars.clone(),
        input_vars: out.input_vars.clone(),
        unoptimized: &out.unoptimized,
        aliases: &out.aliases,
        optimized: &out.optimized,
        poly_system: &out.poly_system,
    };

    // Estimate both artifacts before opening any file, so a run that would
    // exceed the limit leaves the output directory untouched.
    let report_bytes = estimate_report_size(&report_data);
    let machine_bytes = estimate_machine_file_size(&out.machine_assignments);
    check_size_limit(report_bytes, machine_bytes, cmd.max_bytes)?;

    fs::create_dir_all(&cmd.out_dir)?;

    let report_path = cmd.out_dir.join("report.txt");
    let report_file = fs::File::create(&report_path)?;
    let mut sink = WriteSink::new(report_file);
    printer::render_report(&mut sink, &report_data);
    sink.finish()?;

    let equations_path = cmd.out_dir.join("equations.dio");
    let equations_file = fs::File::create(&equations_path)?;
    let mut sink = WriteSink::new(equations_file);
    printer::render_machine_file(&mut sink, &out.machine_assignments);
    sink.finish()?;

    log::info!(
        "wrote {} and {} ({} witnesses introduced)",
        report_path.display(),
        equations_path.display(),
        out.witness_count
    );
    Ok(())
}

fn main() -> std::process::ExitCode {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("[{}] {e}", e.category());
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_size_under_the_limit_is_accepted() {
        assert!(check_size_limit(3, 4, 10).is_ok());
    }

    #[test]
    fn combined_size_over_the_limit_is_rejected_even_when_neither_artifact_alone_would_trip_it() {
        // Each artifact is under the 5-byte limit on its own (3 and 4), but
        // summed they exceed it -- this is exactly the case a `max` instead
        // of a `+` would let through.
        assert!(check_size_limit(3, 4, 5).is_err());
    }

    #[test]
    fn size_limit_error_reports_the_combined_estimate() {
        let err = check_size_limit(3, 4, 5).unwrap_err();
        assert_eq!(err.category(), "size-limit");
        assert!(err.to_string().contains('7'));
    }
}
