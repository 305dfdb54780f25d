//! Rendering: the machine equation file format (§6), and the human report's
//! math-symbol infix format (§6, §9).
//!
//! Both the real writer and the pre-write size estimate of §5 go through
//! the same [`Sink`] trait and the same recursive renderers, so the two can
//! never drift the way the source's byte-for-byte duplicated size estimator
//! did (§9 "String rendering vs. size estimation").

use dioc_utils::Id;

use crate::assign::AssignmentList;
use crate::expr::{BinOp, Expr};
use crate::fdict::{next_tick_name, AliasTable, FDict};
use crate::poly::{PolyEquation, PolySystem};

/// A write-only destination for rendered text. [`StringSink`] actually
/// materializes the text; [`CountingSink`] only accumulates the byte count,
/// which is all the §5 size safeguard needs.
pub trait Sink {
    fn push_str(&mut self, s: &str);
}

impl Sink for String {
    fn push_str(&mut self, s: &str) {
        String::push_str(self, s);
    }
}

/// A [`Sink`] that discards its input and only counts UTF-8 bytes, so the
/// §5 safeguard can estimate an artifact's size without ever materializing
/// it.
#[derive(Default)]
pub struct CountingSink(u64);

impl CountingSink {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl Sink for CountingSink {
    fn push_str(&mut self, s: &str) {
        self.0 += s.len() as u64;
    }
}

/// A [`Sink`] that writes straight through to any [`std::io::Write`],
/// sticking the first error it sees rather than propagating through every
/// `push_str` call. Callers check [`WriteSink::finish`] once after
/// rendering (§9: the real writer and the size estimate of §5 share these
/// same renderer functions, never two hand-duplicated copies).
pub struct WriteSink<W: std::io::Write> {
    writer: W,
    result: std::io::Result<()>,
}

impl<W: std::io::Write> WriteSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            result: Ok(()),
        }
    }

    pub fn finish(self) -> std::io::Result<()> {
        self.result
    }
}

impl<W: std::io::Write> Sink for WriteSink<W> {
    fn push_str(&mut self, s: &str) {
        if self.result.is_ok() {
            self.result = self.writer.write_all(s.as_bytes());
        }
    }
}

/// `LHS := RHS` with `LHS` carrying a `[t+1]` marker for state variables
/// (§6).
pub fn render_assignment_line(sink: &mut dyn Sink, lhs_name: &str, rhs: &Expr) {
    sink.push_str(lhs_name);
    sink.push_str(" := ");
    render_expr_native(sink, rhs);
    sink.push_str("\n");
}

/// The whole of an [`AssignmentList`] in machine-file form, one line per
/// entry, in the list's own order. Used both for the real `equations.dio`
/// writer (§6) and for its size estimate (§5).
pub fn render_machine_file(sink: &mut dyn Sink, list: &AssignmentList) {
    for a in list.iter() {
        render_assignment_line(sink, &a.lhs.to_string(), &a.rhs);
    }
}

/// `OP(arg, arg, …)`, or a bare name/integer for leaves (§6 RHS grammar).
pub fn render_expr_native(sink: &mut dyn Sink, e: &Expr) {
    match e {
        Expr::Const(n) => sink.push_str(&n.to_string()),
        Expr::Var(v) => sink.push_str(&v.to_string()),
        Expr::Neg(x) => {
            sink.push_str("neg(");
            render_expr_native(sink, x);
            sink.push_str(")");
        }
        Expr::Bin(op, l, r) => {
            sink.push_str(op.token());
            sink.push_str("(");
            render_expr_native(sink, l);
            sink.push_str(", ");
            render_expr_native(sink, r);
            sink.push_str(")");
        }
        Expr::If(c, t, f) => {
            sink.push_str("if(");
            render_expr_native(sink, c);
            sink.push_str(", ");
            render_expr_native(sink, t);
            sink.push_str(", ");
            render_expr_native(sink, f);
            sink.push_str(")");
        }
    }
}

pub fn expr_to_native_string(e: &Expr) -> String {
    let mut s = String::new();
    render_expr_native(&mut s, e);
    s
}

/// Infix rendering with math symbols (§6: "multiplication as ·, equality
/// and comparison with standard math symbols"), used by every report
/// section.
fn render_expr_infix(sink: &mut dyn Sink, e: &Expr) {
    match e {
        Expr::Const(n) => sink.push_str(&n.to_string()),
        Expr::Var(v) => sink.push_str(&render_var_subscripted(*v)),
        Expr::Neg(x) => {
            sink.push_str("(-");
            render_expr_infix(sink, x);
            sink.push_str(")");
        }
        Expr::Bin(op, l, r) => {
            sink.push_str("(");
            render_expr_infix(sink, l);
            sink.push_str(infix_symbol(*op));
            render_expr_infix(sink, r);
            sink.push_str(")");
        }
        Expr::If(c, t, f) => {
            sink.push_str("(");
            render_expr_infix(sink, c);
            sink.push_str(" · ");
            render_expr_infix(sink, t);
            sink.push_str(" + (1 - ");
            render_expr_infix(sink, c);
            sink.push_str(") · ");
            render_expr_infix(sink, f);
            sink.push_str(")");
        }
    }
}

fn infix_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => " + ",
        BinOp::Sub => " - ",
        BinOp::Mul => " · ",
        BinOp::Div => " / ",
        BinOp::Eq => " = ",
        BinOp::Ne => " ≠ ",
        BinOp::Lt => " < ",
        BinOp::Le => " ≤ ",
        BinOp::Gt => " > ",
        BinOp::Ge => " ≥ ",
        BinOp::And => " ∧ ",
        BinOp::Or => " ∨ ",
    }
}

/// Fully expand every alias reference into its definition before rendering
/// infix, for the report's "fully expanded next-state equations" section.
fn render_expr_infix_expanded(sink: &mut dyn Sink, e: &Expr, aliases: &AliasTable) {
    render_expr_infix(sink, &expand_aliases(e, aliases));
}

fn expand_aliases(e: &Expr, aliases: &AliasTable) -> Expr {
    match e {
        Expr::Var(v) => {
            if let Some(n) = alias_index(*v) {
                if let Some(def) = aliases.get(n) {
                    return expand_aliases(def, aliases);
                }
            }
            e.clone()
        }
        Expr::Const(_) => e.clone(),
        Expr::Neg(x) => Expr::neg(expand_aliases(x, aliases)),
        Expr::Bin(op, l, r) => Expr::bin(
            *op,
            expand_aliases(l, aliases),
            expand_aliases(r, aliases),
        ),
        Expr::If(c, t, f) => Expr::if_(
            expand_aliases(c, aliases),
            expand_aliases(t, aliases),
            expand_aliases(f, aliases),
        ),
    }
}

fn alias_index(id: Id) -> Option<usize> {
    let s = id.resolve();
    s.strip_prefix("C_").and_then(|n| n.parse::<usize>().ok())
}

/// Render `C_7` as `C₇` for the report (§6 "aliases with subscripts");
/// every other name renders unchanged.
fn render_var_subscripted(id: Id) -> String {
    let s = id.resolve();
    match alias_index(id) {
        Some(n) => format!("C{}", to_subscript(n)),
        None => s,
    }
}

fn to_subscript(n: usize) -> String {
    const DIGITS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];
    n.to_string()
        .chars()
        .map(|c| DIGITS[c.to_digit(10).unwrap() as usize])
        .collect()
}

/// All the data the six report sections (§6) are built from.
pub struct ReportData<'a> {
    pub state_vars: Vec<Id>,
    pub input_vars: Vec<Id>,
    pub unoptimized: &'a FDict,
    pub aliases: &'a AliasTable,
    pub optimized: &'a FDict,
    pub poly_system: &'a PolySystem,
}

/// The full plain-text human report, in the six-section order of §6.
pub fn render_report(sink: &mut dyn Sink, data: &ReportData) {
    render_summary(sink, data);
    render_expanded_equations(sink, data);
    render_alias_definitions(sink, data);
    render_alias_equations(sink, data);
    render_polynomial_system(sink, data);
    render_master_equation(sink, data);
}

fn render_summary(sink: &mut dyn Sink, data: &ReportData) {
    sink.push_str("=== Executive Summary ===\n");
    let states = data
        .state_vars
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    sink.push_str(&format!("State variables: {{{states}}}\n"));
    if data.input_vars.is_empty() {
        sink.push_str("Input variables: (none detected)\n\n");
    } else {
        let inputs = data
            .input_vars
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        sink.push_str(&format!("Input variables: {{{inputs}}}\n\n"));
    }
}

fn render_expanded_equations(sink: &mut dyn Sink, data: &ReportData) {
    sink.push_str("=== Fully Expanded Next-State Equations ===\n");
    for v in &data.state_vars {
        let expr = data
            .unoptimized
            .get(*v)
            .cloned()
            .unwrap_or_else(|| Expr::var(*v));
        sink.push_str(&next_tick_name(*v));
        sink.push_str(" = ");
        // The unoptimized F-dictionary never references aliases, but we
        // route through the expanding renderer anyway so this section
        // stays correct even if a future pass feeds it a CSE'd tree.
        render_expr_infix_expanded(sink, &expr, data.aliases);
        sink.push_str("\n");
    }
    sink.push_str("\n");
}

fn render_alias_definitions(sink: &mut dyn Sink, data: &ReportData) {
    if data.aliases.is_empty() {
        return;
    }
    sink.push_str("=== Common Subexpression Definitions ===\n");
    for (name, def) in data.aliases.iter() {
        sink.push_str(&render_var_subscripted(name));
        sink.push_str(" = ");
        render_expr_infix(sink, def);
        sink.push_str("\n");
    }
    sink.push_str("\n");
}

fn render_alias_equations(sink: &mut dyn Sink, data: &ReportData) {
    sink.push_str("=== Alias-Referencing Next-State Equations ===\n");
    for v in &data.state_vars {
        let expr = data
            .optimized
            .get(*v)
            .cloned()
            .unwrap_or_else(|| Expr::var(*v));
        sink.push_str(&next_tick_name(*v));
        sink.push_str(" = ");
        render_expr_infix(sink, &expr);
        sink.push_str("\n");
    }
    sink.push_str("\n");
}

fn render_polynomial_system(sink: &mut dyn Sink, data: &ReportData) {
    sink.push_str("=== Pure-Arithmetic Assignment System ===\n");
    for eq in data.poly_system.iter() {
        render_poly_equation(sink, eq);
        sink.push_str("\n");
    }
    sink.push_str("\n");
}

/// `polynomial = 0`, one lowered constraint (§4.3, §3 Glossary "Diophantine
/// system"). The polynomial itself already carries whatever shape its
/// lowering rule produced -- a definition `target - (a * b)`, or a bare
/// constraint like `target * (1 - target)`.
pub fn render_poly_equation(sink: &mut dyn Sink, eq: &PolyEquation) {
    render_expr_infix(sink, &eq.0);
    sink.push_str(" = 0");
}

fn render_master_equation(sink: &mut dyn Sink, data: &ReportData) {
    sink.push_str("=== Sum-of-Squares Master Equation ===\n");
    if data.poly_system.is_empty() {
        sink.push_str("0 = 0\n");
        return;
    }
    let terms: Vec<String> = data
        .poly_system
        .iter()
        .map(|eq| {
            let mut s = String::new();
            s.push_str("(");
            render_expr_infix(&mut s, &eq.0);
            s.push_str(")²");
            s
        })
        .collect();
    sink.push_str(&terms.join(" + \n"));
    sink.push_str(" = 0\n");
}

/// Estimate the byte size of the machine file without materializing it
/// (§5).
pub fn estimate_machine_file_size(list: &AssignmentList) -> u64 {
    let mut c = CountingSink::new();
    render_machine_file(&mut c, list);
    c.bytes()
}

/// Estimate the byte size of the report without materializing it (§5).
pub fn estimate_report_size(data: &ReportData) -> u64 {
    let mut c = CountingSink::new();
    render_report(&mut c, data);
    c.bytes()
}
