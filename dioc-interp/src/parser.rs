//! Recursive-descent parser for the machine equation file format and its
//! RHS grammar (§6, §9): `RHS := int | name | op '(' RHS (',' RHS)* ')'`.
//!
//! The source splits call arguments with a regex and then patches the
//! regex to respect parenthesis balance after the naive version breaks on
//! nested calls. A single token reader sidesteps both problems: every atom
//! and every operator is just a maximal run of characters that aren't
//! whitespace, `(`, `)` or `,`, so the same routine reads `x`, `-7`, `C_12`
//! and `==` alike, and nesting falls out of plain recursion.

use dioc_utils::{DiocResult, Error, Id};

/// One parsed right-hand side (§6 RHS grammar).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rhs {
    Const(i64),
    Var(Id),
    Call(String, Vec<Rhs>),
}

impl Rhs {
    /// Every free `Var` name this expression references.
    pub fn free_vars(&self, out: &mut std::collections::BTreeSet<Id>) {
        match self {
            Rhs::Const(_) => {}
            Rhs::Var(n) => {
                out.insert(*n);
            }
            Rhs::Call(_, args) => {
                for a in args {
                    a.free_vars(out);
                }
            }
        }
    }
}

/// One `LHS := RHS` line (§6).
pub struct Line {
    pub lhs: Id,
    pub rhs: Rhs,
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += self.peek().unwrap().len_utf8();
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    /// A maximal run of characters that can't start or end a call: every
    /// atom and every operator token is read this same way.
    fn read_token(&mut self) -> DiocResult<&'a str> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '(' || c == ')' || c == ',' {
                break;
            }
            self.bump();
        }
        if self.pos == start {
            return Err(Error::evaluation(format!(
                "expected a token at byte offset {start} in `{}`",
                self.src
            )));
        }
        Ok(&self.src[start..self.pos])
    }

    fn expect(&mut self, c: char) -> DiocResult<()> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.bump();
            Ok(())
        } else {
            Err(Error::evaluation(format!(
                "expected `{c}` at byte offset {} in `{}`",
                self.pos, self.src
            )))
        }
    }

    fn parse_rhs(&mut self) -> DiocResult<Rhs> {
        let token = self.read_token()?;
        self.skip_ws();
        if self.peek() == Some('(') {
            self.bump();
            let mut args = Vec::new();
            self.skip_ws();
            if self.peek() != Some(')') {
                loop {
                    args.push(self.parse_rhs()?);
                    self.skip_ws();
                    match self.peek() {
                        Some(',') => self.bump(),
                        Some(')') => break,
                        _ => {
                            return Err(Error::evaluation(format!(
                                "expected `,` or `)` after argument to `{token}` in `{}`",
                                self.src
                            )))
                        }
                    }
                }
            }
            self.expect(')')?;
            Ok(Rhs::Call(token.to_string(), args))
        } else if let Ok(n) = token.parse::<i64>() {
            Ok(Rhs::Const(n))
        } else {
            Ok(Rhs::Var(Id::new(token)))
        }
    }

    fn finish(&mut self) -> DiocResult<()> {
        self.skip_ws();
        if self.pos != self.src.len() {
            return Err(Error::evaluation(format!(
                "trailing input after expression: `{}`",
                &self.src[self.pos..]
            )));
        }
        Ok(())
    }
}

/// Parse a single RHS (§6 grammar), requiring the whole string to be consumed.
pub fn parse_rhs(s: &str) -> DiocResult<Rhs> {
    let mut r = Reader::new(s);
    let rhs = r.parse_rhs()?;
    r.finish()?;
    Ok(rhs)
}

/// Parse one non-empty `LHS := RHS` line of a machine equation file (§6).
pub fn parse_line(line: &str) -> DiocResult<Line> {
    let (lhs_str, rhs_str) = line.split_once(" := ").ok_or_else(|| {
        Error::evaluation(format!("malformed equation line (no ` := `): `{line}`"))
    })?;
    let lhs_str = lhs_str.trim();
    if lhs_str.is_empty() {
        return Err(Error::evaluation(format!("empty LHS in line: `{line}`")));
    }
    Ok(Line {
        lhs: Id::new(lhs_str),
        rhs: parse_rhs(rhs_str.trim())?,
    })
}

/// Parse every non-empty line of a whole machine equation file (§6), in
/// file order.
pub fn parse_machine_file(content: &str) -> DiocResult<Vec<Line>> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(parse_line)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_integer_and_name() {
        assert_eq!(parse_rhs("42").unwrap(), Rhs::Const(42));
        assert_eq!(parse_rhs("-7").unwrap(), Rhs::Const(-7));
        assert_eq!(parse_rhs("x").unwrap(), Rhs::Var(Id::new("x")));
    }

    #[test]
    fn parses_nested_calls() {
        let rhs = parse_rhs("if(==(a, b), +(c, 1), neg(c))").unwrap();
        match rhs {
            Rhs::Call(op, args) => {
                assert_eq!(op, "if");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected a call, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unbalanced_parentheses() {
        assert!(parse_rhs("+(a, b").is_err());
    }

    #[test]
    fn parses_whole_machine_file() {
        let content = "C_0 := +(beta, gamma)\nx[t+1] := C_0\n";
        let lines = parse_machine_file(content).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].lhs, Id::new("C_0"));
        assert_eq!(lines[1].lhs, Id::new("x[t+1]"));
    }
}
