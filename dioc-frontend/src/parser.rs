//! Parser for dioc's textual surface syntax (§1), built the same way the
//! teacher's own frontend crate parses its surface syntax: `pest` for
//! tokenizing, `pest_consume` for walking the parse tree into typed AST
//! nodes.

use dioc_ir::BinOp;
use dioc_utils::{DiocResult, Error, Id};
use pest_consume::{match_nodes, Parser};
use std::fs;
use std::path::Path;

use crate::ast::{AssignOp, Expr, Program, Stmt, UpdateOp};

type PResult<T> = std::result::Result<T, pest_consume::Error<Rule>>;
type Node<'i> = pest_consume::Node<'i, Rule, ()>;

#[derive(Parser)]
#[grammar = "syntax.pest"]
pub struct DiocParser;

#[pest_consume::parser]
impl DiocParser {
    fn EOI(_input: Node) -> PResult<()> {
        Ok(())
    }

    fn ident(input: Node) -> PResult<Id> {
        Ok(Id::new(input.as_str()))
    }

    fn integer(input: Node) -> PResult<i64> {
        input
            .as_str()
            .parse()
            .map_err(|e| input.error(format!("invalid integer literal: {e}")))
    }

    fn char_lit(input: Node) -> PResult<i64> {
        let s = input.as_str();
        let c = s[1..s.len() - 1]
            .chars()
            .next()
            .ok_or_else(|| input.error("empty character literal"))?;
        Ok(crate::ast::char_code_point(c))
    }

    fn string_lit(input: Node) -> PResult<String> {
        let s = input.as_str();
        Ok(s[1..s.len() - 1].to_string())
    }

    fn add_op(_input: Node) -> PResult<BinOp> {
        Ok(BinOp::Add)
    }
    fn sub_op(_input: Node) -> PResult<BinOp> {
        Ok(BinOp::Sub)
    }
    fn mul_op(_input: Node) -> PResult<BinOp> {
        Ok(BinOp::Mul)
    }
    fn div_op(_input: Node) -> PResult<BinOp> {
        Ok(BinOp::Div)
    }
    fn eq_op(_input: Node) -> PResult<BinOp> {
        Ok(BinOp::Eq)
    }
    fn ne_op(_input: Node) -> PResult<BinOp> {
        Ok(BinOp::Ne)
    }
    fn le_op(_input: Node) -> PResult<BinOp> {
        Ok(BinOp::Le)
    }
    fn ge_op(_input: Node) -> PResult<BinOp> {
        Ok(BinOp::Ge)
    }
    fn lt_op(_input: Node) -> PResult<BinOp> {
        Ok(BinOp::Lt)
    }
    fn gt_op(_input: Node) -> PResult<BinOp> {
        Ok(BinOp::Gt)
    }
    fn and_op(_input: Node) -> PResult<BinOp> {
        Ok(BinOp::And)
    }
    fn or_op(_input: Node) -> PResult<BinOp> {
        Ok(BinOp::Or)
    }

    fn set_op(_input: Node) -> PResult<AssignOp> {
        Ok(AssignOp::Set)
    }
    fn add_assign_op(_input: Node) -> PResult<AssignOp> {
        Ok(AssignOp::AddAssign)
    }
    fn sub_assign_op(_input: Node) -> PResult<AssignOp> {
        Ok(AssignOp::SubAssign)
    }

    fn inc_op(_input: Node) -> PResult<UpdateOp> {
        Ok(UpdateOp::Inc)
    }
    fn dec_op(_input: Node) -> PResult<UpdateOp> {
        Ok(UpdateOp::Dec)
    }

    fn bin_expr(input: Node) -> PResult<Expr> {
        Ok(match_nodes!(input.into_children();
            [add_op(op), expr(l), expr(r)] => Expr::bin(op, l, r),
            [sub_op(op), expr(l), expr(r)] => Expr::bin(op, l, r),
            [mul_op(op), expr(l), expr(r)] => Expr::bin(op, l, r),
            [div_op(op), expr(l), expr(r)] => Expr::bin(op, l, r),
            [eq_op(op), expr(l), expr(r)] => Expr::bin(op, l, r),
            [ne_op(op), expr(l), expr(r)] => Expr::bin(op, l, r),
            [le_op(op), expr(l), expr(r)] => Expr::bin(op, l, r),
            [ge_op(op), expr(l), expr(r)] => Expr::bin(op, l, r),
            [lt_op(op), expr(l), expr(r)] => Expr::bin(op, l, r),
            [gt_op(op), expr(l), expr(r)] => Expr::bin(op, l, r),
            [and_op(op), expr(l), expr(r)] => Expr::bin(op, l, r),
            [or_op(op), expr(l), expr(r)] => Expr::bin(op, l, r),
        ))
    }

    fn neg_expr(input: Node) -> PResult<Expr> {
        Ok(match_nodes!(input.into_children();
            [expr(e)] => Expr::Neg(Box::new(e)),
        ))
    }

    fn call_expr(input: Node) -> PResult<Expr> {
        Ok(match_nodes!(input.into_children();
            [ident(name)] => Expr::Call(name),
        ))
    }

    fn paren_expr(input: Node) -> PResult<Expr> {
        Ok(match_nodes!(input.into_children();
            [expr(e)] => e,
        ))
    }

    fn expr(input: Node) -> PResult<Expr> {
        Ok(match_nodes!(input.into_children();
            [bin_expr(e)] => e,
            [neg_expr(e)] => e,
            [call_expr(e)] => e,
            [char_lit(n)] => Expr::Constant(n),
            [integer(n)] => Expr::Constant(n),
            [ident(n)] => Expr::Var(n),
            [paren_expr(e)] => e,
        ))
    }

    fn declare_stmt(input: Node) -> PResult<Stmt> {
        Ok(match_nodes!(input.into_children();
            [ident(name), expr(init)] => Stmt::Declare { name, init: Some(init) },
            [ident(name)] => Stmt::Declare { name, init: None },
        ))
    }

    fn assign_stmt(input: Node) -> PResult<Stmt> {
        Ok(match_nodes!(input.into_children();
            [set_op(op), ident(target), expr(value)] => Stmt::Assign { target, op, value },
            [add_assign_op(op), ident(target), expr(value)] => Stmt::Assign { target, op, value },
            [sub_assign_op(op), ident(target), expr(value)] => Stmt::Assign { target, op, value },
        ))
    }

    fn update_stmt(input: Node) -> PResult<Stmt> {
        Ok(match_nodes!(input.into_children();
            [ident(target), inc_op(op)] => Stmt::Update { target, op },
            [ident(target), dec_op(op)] => Stmt::Update { target, op },
        ))
    }

    fn opaque_stmt(input: Node) -> PResult<Stmt> {
        Ok(match_nodes!(input.into_children();
            [string_lit(kind)] => Stmt::Opaque(kind),
        ))
    }

    fn if_stmt(input: Node) -> PResult<Stmt> {
        Ok(match_nodes!(input.into_children();
            [expr(cond), block(then_branch)] => Stmt::If { cond, then_branch, else_branch: None },
            [expr(cond), block(then_branch), block(else_branch)] => {
                Stmt::If { cond, then_branch, else_branch: Some(else_branch) }
            },
        ))
    }

    /// A block mixes statement kinds freely, so rather than force it
    /// through a single `match_nodes!` arity pattern we walk its children
    /// directly and dispatch on each one's rule.
    fn block(input: Node) -> PResult<Vec<Stmt>> {
        let mut out = Vec::new();
        for child in input.into_children() {
            let stmt = match child.as_rule() {
                Rule::if_stmt => DiocParser::if_stmt(child)?,
                Rule::declare_stmt => DiocParser::declare_stmt(child)?,
                Rule::assign_stmt => DiocParser::assign_stmt(child)?,
                Rule::update_stmt => DiocParser::update_stmt(child)?,
                Rule::opaque_stmt => DiocParser::opaque_stmt(child)?,
                Rule::block => Stmt::Block(DiocParser::block(child)?),
                r => unreachable!("unexpected rule {:?} inside block", r),
            };
            out.push(stmt);
        }
        Ok(out)
    }

    fn state_decl(input: Node) -> PResult<Vec<Id>> {
        Ok(match_nodes!(input.into_children();
            [ident(names)..] => names.collect(),
        ))
    }

    fn loop_decl(input: Node) -> PResult<Vec<Stmt>> {
        Ok(match_nodes!(input.into_children();
            [block(body)] => body,
        ))
    }

    fn program(input: Node) -> PResult<Program> {
        Ok(match_nodes!(input.into_children();
            [state_decl(state_vars), loop_decl(body), EOI(_)] => Program { state_vars, body },
        ))
    }
}

impl DiocParser {
    /// Parse a whole program from its textual surface syntax (§1).
    pub fn parse_str(content: &str) -> DiocResult<Program> {
        let parsed = <DiocParser as Parser>::parse(Rule::program, content)
            .map_err(|e| Error::input_syntax(e.to_string()))?;
        let input = parsed
            .single()
            .map_err(|e| Error::input_syntax(e.to_string()))?;
        DiocParser::program(input).map_err(|e| Error::input_syntax(e.to_string()))
    }

    /// Parse a whole program from a file path (§7 input-not-found vs.
    /// input-syntax).
    pub fn parse_file(path: &Path) -> DiocResult<Program> {
        let start = std::time::Instant::now();
        let content = fs::read_to_string(path)
            .map_err(|_| Error::input_not_found(path.to_string_lossy()))?;
        let program = Self::parse_str(&content)?;
        log::info!(
            "parsed `{}` in {}ms",
            path.to_string_lossy(),
            start.elapsed().as_millis()
        );
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identity_program() {
        let prog = DiocParser::parse_str("(program (state x) (loop (block)))").unwrap();
        assert_eq!(prog.state_vars.len(), 1);
        assert!(prog.body.is_empty());
    }

    #[test]
    fn parses_counter_program() {
        let src = "(program (state x) (loop (block (assign = x (+ x 1)))))";
        let prog = DiocParser::parse_str(src).unwrap();
        assert_eq!(prog.body.len(), 1);
        match &prog.body[0] {
            Stmt::Assign { op: AssignOp::Set, .. } => {}
            other => panic!("unexpected stmt: {other:?}"),
        }
    }

    #[test]
    fn parses_conditional_clamp_program() {
        let src = r#"(program
            (state p)
            (loop (block
                (if (&& (== k 'w') (> p 1))
                    (block (update p --))))))"#;
        let prog = DiocParser::parse_str(src).unwrap();
        assert_eq!(prog.body.len(), 1);
    }

    #[test]
    fn rejects_malformed_input() {
        let result = DiocParser::parse_str("(program (state x");
        assert!(result.is_err());
    }
}
