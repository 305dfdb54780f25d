//! `dioc-step`: an interactive stepper for a previously compiled machine
//! equation file (§6), shipped as its own binary exactly as the teacher
//! ships `cider` separately from its `calyx` compiler binary.

use std::collections::BTreeMap;
use std::path::PathBuf;

use argh::FromArgs;
use dioc_interp::Evaluator;
use dioc_utils::{DiocResult, Error, Id};
use rustyline::DefaultEditor;

const SHELL_PROMPT: &str = "dioc-step> ";

#[derive(FromArgs)]
/// Step a compiled `equations.dio` machine file forward, one tick at a time.
struct Opts {
    /// path to the machine equation file
    #[argh(positional)]
    file: PathBuf,

    /// initial state, `name=value,name=value,...`
    #[argh(option, long = "state", default = "String::new()")]
    state: String,

    /// one `name=value,...` input map per step; repeat for multiple steps.
    /// If omitted, reads input maps interactively.
    #[argh(option, long = "input")]
    inputs: Vec<String>,
}

fn parse_bindings(s: &str) -> DiocResult<BTreeMap<Id, i64>> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                Error::evaluation(format!("expected `name=value`, got `{pair}`"))
            })?;
            let value: i64 = value
                .trim()
                .parse()
                .map_err(|_| Error::evaluation(format!("invalid integer in `{pair}`")))?;
            Ok((Id::new(name.trim()), value))
        })
        .collect()
}

fn print_state(state: &BTreeMap<Id, i64>) {
    let rendered = state
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");
    println!("{{{rendered}}}");
}

fn run() -> DiocResult<()> {
    let opts: Opts = argh::from_env();
    log::info!("loading machine equation file from {}", opts.file.display());
    let content = std::fs::read_to_string(&opts.file)
        .map_err(|_| Error::input_not_found(opts.file.to_string_lossy()))?;
    let evaluator = Evaluator::load(&content)?;
    log::debug!("schedule resolved for {} state variable(s)", evaluator.state_vars().len());

    let mut current = parse_bindings(&opts.state)?;
    for v in evaluator.state_vars() {
        current.entry(*v).or_insert(0);
    }

    if !opts.inputs.is_empty() {
        for raw in &opts.inputs {
            let inputs = parse_bindings(raw)?;
            current = evaluator.step(&current, &inputs)?;
            log::debug!("stepped with inputs `{raw}`");
            print_state(&current);
        }
        return Ok(());
    }

    let mut editor = DefaultEditor::new().map_err(|e| Error::evaluation(e.to_string()))?;
    loop {
        match editor.readline(SHELL_PROMPT) {
            Ok(line) => {
                let _ = editor.add_history_entry(line.clone());
                let trimmed = line.trim();
                if trimmed == "quit" || trimmed == "exit" {
                    break;
                }
                match parse_bindings(trimmed).and_then(|inputs| evaluator.step(&current, &inputs))
                {
                    Ok(next) => {
                        current = next;
                        print_state(&current);
                    }
                    Err(e) => eprintln!("[{}] {e}", e.category()),
                }
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("[internal] {e}");
                break;
            }
        }
    }
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
