//! Errors generated by the compiler and evaluator.
use crate::Id;

/// Convenience wrapper to represent success or a meaningful compiler error.
pub type DiocResult<T> = std::result::Result<T, Error>;

/// Errors produced anywhere in the `dioc` pipeline.
#[derive(Clone)]
pub struct Error {
    kind: Box<ErrorKind>,
    post_msg: Option<String>,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(post) = &self.post_msg {
            write!(f, "\n{}", post)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn with_post_msg(mut self, msg: Option<String>) -> Self {
        self.post_msg = msg;
        self
    }

    /// §7 input-not-found: the file named on the command line does not exist.
    pub fn input_not_found<S: ToString>(path: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::InputNotFound(path.to_string())),
            post_msg: None,
        }
    }

    /// §7 input-syntax: the front-end (or our own textual surface syntax)
    /// could not parse the input program.
    pub fn input_syntax<S: ToString>(msg: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::InputSyntax(msg.to_string())),
            post_msg: None,
        }
    }

    /// §7 unsupported-construct: a node kind the Flattener does not
    /// recognize. Callers downgrade this to a `log::warn!` and keep going;
    /// it is still modeled as an `Error` so the warning text is produced by
    /// the same `Display` machinery as every other diagnostic.
    pub fn unsupported_construct<S: ToString>(kind: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::UnsupportedConstruct(kind.to_string())),
            post_msg: None,
        }
    }

    /// §7 cycle: the planner could not find a topological order.
    pub fn cycle(unresolved: Vec<Id>) -> Self {
        Self {
            kind: Box::new(ErrorKind::Cycle(unresolved)),
            post_msg: None,
        }
    }

    /// §7 size-limit: the estimated artifact exceeds the configured cap.
    pub fn size_limit(estimated_bytes: u64, limit_bytes: u64) -> Self {
        Self {
            kind: Box::new(ErrorKind::SizeLimit {
                estimated_bytes,
                limit_bytes,
            }),
            post_msg: None,
        }
    }

    /// §7 evaluation: the evaluator saw an undefined name or a malformed RHS.
    pub fn evaluation<S: ToString>(line: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::Evaluation(line.to_string())),
            post_msg: None,
        }
    }

    /// Internal reduction failure: the polynomial reducer or planner hit an
    /// assumption violation that indicates a bug in an earlier pass rather
    /// than a problem with the user's input.
    pub fn internal<S: ToString>(msg: S) -> Self {
        Self {
            kind: Box::new(ErrorKind::Internal(msg.to_string())),
            post_msg: None,
        }
    }

    /// The one-line error-category label required on stderr by §6/§7.
    pub fn category(&self) -> &'static str {
        self.kind.category()
    }
}

/// Standard error kind for `dioc` errors, one variant per §7 error kind.
#[derive(Clone)]
enum ErrorKind {
    InputNotFound(String),
    InputSyntax(String),
    UnsupportedConstruct(String),
    Cycle(Vec<Id>),
    SizeLimit {
        estimated_bytes: u64,
        limit_bytes: u64,
    },
    Evaluation(String),
    Internal(String),
}

impl ErrorKind {
    fn category(&self) -> &'static str {
        use ErrorKind::*;
        match self {
            InputNotFound(_) => "input-not-found",
            InputSyntax(_) => "input-syntax",
            UnsupportedConstruct(_) => "unsupported-construct",
            Cycle(_) => "cycle",
            SizeLimit { .. } => "size-limit",
            Evaluation(_) => "evaluation",
            Internal(_) => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorKind::*;
        match self {
            InputNotFound(path) => {
                write!(f, "[input-not-found] could not find input file `{path}'")
            }
            InputSyntax(msg) => write!(f, "[input-syntax] {msg}"),
            UnsupportedConstruct(kind) => {
                write!(f, "[unsupported-construct] unrecognized node kind `{kind}', treating as opaque input")
            }
            Cycle(names) => {
                let names = names
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[cycle] dependency cycle among: {names}")
            }
            SizeLimit {
                estimated_bytes,
                limit_bytes,
            } => write!(
                f,
                "[size-limit] estimated artifact size {estimated_bytes} bytes exceeds limit {limit_bytes} bytes"
            ),
            Evaluation(line) => write!(f, "[evaluation] {line}"),
            Internal(msg) => write!(f, "[internal] {msg}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::internal(format!("IO error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_matches_error_kind() {
        assert_eq!(Error::input_not_found("x").category(), "input-not-found");
        assert_eq!(Error::cycle(vec![Id::new("a")]).category(), "cycle");
        assert_eq!(Error::size_limit(10, 5).category(), "size-limit");
    }

    #[test]
    fn display_is_one_line_per_message() {
        let e = Error::evaluation("bad line");
        let rendered = e.to_string();
        assert!(rendered.contains("[evaluation]"));
        assert!(rendered.contains("bad line"));
    }
}
