//! Renders the code model as C source text.

use std::fmt::{self, Write};

use itertools::Itertools;

use super::{ArrayType, BinOp, Expr, Function, Init, Param, Stmt, Type};
use crate::ScalarKind;

/// Renders the `typedef` declaring `ty`, eg. `typedef float HF_Mat2x3f[2][3];`.
pub fn typedef(ty: &ArrayType) -> String {
    format!(
        "typedef {} {}{};",
        ty.element().c_type(),
        ty.name(),
        ty.dims().iter().map(|d| format!("[{d}]")).join("")
    )
}

/// Renders the prototype of `f`, terminated by `;`.
pub fn declaration(f: &Function) -> String {
    format!("{};", signature(f))
}

/// Renders the definition of `f`, preceded by an empty line.
pub fn definition(f: &Function) -> String {
    let mut out = format!("\n{} {{\n", signature(f));
    block(&mut out, &f.body, 1).expect("writing to a `String` cannot fail");
    out.push_str("}\n");
    out
}

fn signature(f: &Function) -> String {
    let ret = f.ret.map_or("void", ScalarKind::c_type);
    format!("{ret} {}({})", f.name, f.params.iter().map(param).join(", "))
}

fn param(p: &Param) -> String {
    format!("{} {}", type_name(&p.ty), p.name)
}

fn type_name(ty: &Type) -> &str {
    match ty {
        Type::Scalar(kind) => kind.c_type(),
        Type::Array(array) => array.name(),
    }
}

fn block(out: &mut impl Write, stmts: &[Stmt], depth: usize) -> fmt::Result {
    for s in stmts {
        stmt(out, s, depth)?;
    }
    Ok(())
}

fn stmt(out: &mut impl Write, s: &Stmt, depth: usize) -> fmt::Result {
    let indent = "\t".repeat(depth);
    match s {
        Stmt::Declare { ty, names } => {
            writeln!(out, "{indent}{} {};", type_name(ty), names.iter().join(", "))
        }
        Stmt::Let {
            ty,
            name,
            init: Init::Expr(e),
        } => writeln!(out, "{indent}{} {name} = {};", type_name(ty), expr(e)),
        Stmt::Let {
            ty,
            name,
            init: Init::Rows(rows),
        } => {
            writeln!(out, "{indent}{} {name} = {{", type_name(ty))?;
            for row in rows {
                writeln!(out, "{indent}\t{{{}}},", row.iter().map(expr).join(", "))?;
            }
            writeln!(out, "{indent}}};")
        }
        Stmt::Assign { place, value } => {
            writeln!(out, "{indent}{} = {};", expr(place), expr(value))
        }
        Stmt::AddAssign { place, value } => {
            writeln!(out, "{indent}{} += {};", expr(place), expr(value))
        }
        Stmt::Increment(name) => writeln!(out, "{indent}{name}++;"),
        Stmt::Copy {
            dst,
            src,
            element,
            count,
        } => writeln!(
            out,
            "{indent}memcpy({}, {}, sizeof({}) * {count});",
            address(dst),
            address(src),
            element.c_type(),
        ),
        Stmt::For { var, end, body } => {
            writeln!(out, "{indent}for(int {var} = 0; {var} < {end}; {var}++) {{")?;
            block(out, body, depth + 1)?;
            writeln!(out, "{indent}}}")
        }
        Stmt::If { cond, then } => {
            writeln!(out, "{indent}if({}) {{", expr(cond))?;
            block(out, then, depth + 1)?;
            writeln!(out, "{indent}}}")
        }
        Stmt::Continue => writeln!(out, "{indent}continue;"),
        Stmt::Return(None) => writeln!(out, "{indent}return;"),
        Stmt::Return(Some(e)) => writeln!(out, "{indent}return {};", expr(e)),
        Stmt::Expr(e) => writeln!(out, "{indent}{};", expr(e)),
    }
}

/// Renders a `memcpy` operand: array variables decay to pointers, elements need `&`.
fn address(e: &Expr) -> String {
    match e {
        Expr::Index(..) => format!("&{}", expr(e)),
        _ => expr(e),
    }
}

// Binding strength, higher binds tighter (C precedence, restricted to what the model can express).
const PREC_COND: u8 = 1;
const PREC_EQ: u8 = 2;
const PREC_REL: u8 = 3;
const PREC_ADD: u8 = 4;
const PREC_MUL: u8 = 5;
const PREC_UNARY: u8 = 6;
const PREC_POSTFIX: u8 = 7;

fn binop(op: BinOp) -> (&'static str, u8) {
    match op {
        BinOp::Add => ("+", PREC_ADD),
        BinOp::Sub => ("-", PREC_ADD),
        BinOp::Mul => ("*", PREC_MUL),
        BinOp::Div => ("/", PREC_MUL),
        BinOp::Rem => ("%", PREC_MUL),
        BinOp::Eq => ("==", PREC_EQ),
        BinOp::Lt => ("<", PREC_REL),
    }
}

fn precedence(e: &Expr) -> u8 {
    match e {
        Expr::Var(_) | Expr::Index(..) | Expr::Call(..) | Expr::Sqrt(..) => PREC_POSTFIX,
        Expr::Int(v) if *v < 0 => PREC_UNARY,
        Expr::Lit(_, v) if *v < 0.0 => PREC_UNARY,
        Expr::Int(_) | Expr::Lit(..) => PREC_POSTFIX,
        Expr::Cast(..) => PREC_UNARY,
        Expr::Binary(op, ..) => binop(*op).1,
        Expr::Cond(..) => PREC_COND,
    }
}

/// Renders `e` with the parentheses its tree structure requires.
///
/// Binary operators are treated as left-associative: a right operand of equal precedence is
/// parenthesized, so the rendered text evaluates in exactly the order of the tree.
pub fn expr(e: &Expr) -> String {
    match e {
        Expr::Var(name) => name.clone(),
        Expr::Int(v) => v.to_string(),
        Expr::Lit(kind, v) => kind.literal(*v),
        Expr::Index(base, index) => format!("{}[{}]", operand(base, PREC_POSTFIX), expr(index)),
        Expr::Binary(op, lhs, rhs) => {
            let (sym, prec) = binop(*op);
            format!(
                "{} {sym} {}",
                operand(lhs, prec),
                operand(rhs, prec + 1)
            )
        }
        Expr::Cond(cond, then, otherwise) => format!(
            "{} ? {} : {}",
            operand(cond, PREC_COND + 1),
            operand(then, PREC_COND + 1),
            operand(otherwise, PREC_COND)
        ),
        Expr::Cast(kind, e) => format!("({}){}", kind.c_type(), operand(e, PREC_UNARY)),
        Expr::Sqrt(kind, e) => format!("{}({})", kind.sqrt_function(), expr(e)),
        Expr::Call(name, args) => format!("{name}({})", args.iter().map(expr).join(", ")),
    }
}

/// Renders `e`, parenthesized if it binds less tightly than `min`.
fn operand(e: &Expr, min: u8) -> String {
    if precedence(e) < min {
        format!("({})", expr(e))
    } else {
        expr(e)
    }
}
