//! Cyclomatic complexity for Rust function bodies.
//!
//! Counting method per `spec.md` §4.2: base 1; +1 per `if`; +1 per loop
//! (`for`/`while`/`loop`); +1 per match arm (`case`); +1 per `&&`; +1 per
//! `||`. `match` itself contributes nothing beyond its arms — each arm is
//! one `case`, mirroring Go's `select`/`switch` case counting.

use syn::{Block, Expr, Stmt};

pub fn calculate_cyclomatic(block: &Block) -> u32 {
    1 + complexity_of_stmts(&block.stmts)
}

fn complexity_of_stmts(stmts: &[Stmt]) -> u32 {
    stmts.iter().map(complexity_of_stmt).sum()
}

fn complexity_of_stmt(stmt: &Stmt) -> u32 {
    match stmt {
        Stmt::Local(local) => local
            .init
            .as_ref()
            .map(|init| complexity_of_expr(&init.expr))
            .unwrap_or(0),
        Stmt::Expr(expr, _) => complexity_of_expr(expr),
        Stmt::Item(_) | Stmt::Macro(_) => 0,
    }
}

fn complexity_of_expr(expr: &Expr) -> u32 {
    match expr {
        Expr::If(e) => {
            1 + complexity_of_expr(&e.cond)
                + complexity_of_stmts(&e.then_branch.stmts)
                + e.else_branch
                    .as_ref()
                    .map(|(_, eb)| complexity_of_expr(eb))
                    .unwrap_or(0)
        }
        Expr::ForLoop(e) => 1 + complexity_of_expr(&e.expr) + complexity_of_stmts(&e.body.stmts),
        Expr::While(e) => 1 + complexity_of_expr(&e.cond) + complexity_of_stmts(&e.body.stmts),
        Expr::Loop(e) => complexity_of_stmts(&e.body.stmts),
        Expr::Match(e) => {
            complexity_of_expr(&e.expr)
                + e.arms.len() as u32
                + e.arms.iter().map(|a| complexity_of_expr(&a.body)).sum::<u32>()
        }
        Expr::Binary(e) => {
            let op_weight = match e.op {
                syn::BinOp::And(_) | syn::BinOp::Or(_) => 1,
                _ => 0,
            };
            op_weight + complexity_of_expr(&e.left) + complexity_of_expr(&e.right)
        }
        Expr::Block(e) => complexity_of_stmts(&e.block.stmts),
        Expr::Unary(e) => complexity_of_expr(&e.expr),
        Expr::Paren(e) => complexity_of_expr(&e.expr),
        Expr::Group(e) => complexity_of_expr(&e.expr),
        Expr::Return(e) => e.expr.as_deref().map(complexity_of_expr).unwrap_or(0),
        Expr::Closure(e) => complexity_of_expr(&e.body),
        Expr::MethodCall(e) => {
            complexity_of_expr(&e.receiver) + e.args.iter().map(complexity_of_expr).sum::<u32>()
        }
        Expr::Call(e) => {
            complexity_of_expr(&e.func) + e.args.iter().map(complexity_of_expr).sum::<u32>()
        }
        Expr::Assign(e) => complexity_of_expr(&e.left) + complexity_of_expr(&e.right),
        Expr::Reference(e) => complexity_of_expr(&e.expr),
        Expr::Try(e) => complexity_of_expr(&e.expr),
        Expr::Field(e) => complexity_of_expr(&e.base),
        Expr::Tuple(e) => e.elems.iter().map(complexity_of_expr).sum(),
        Expr::Array(e) => e.elems.iter().map(complexity_of_expr).sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complexity_of_fn_src(src: &str) -> u32 {
        let item_fn: syn::ItemFn = syn::parse_str(src).unwrap();
        calculate_cyclomatic(&item_fn.block)
    }

    #[test]
    fn straight_line_function_is_one() {
        assert_eq!(complexity_of_fn_src("fn f() { let x = 1; x; }"), 1);
    }

    #[test]
    fn single_if_adds_one() {
        assert_eq!(complexity_of_fn_src("fn f(x: i32) { if x > 0 { } }"), 2);
    }

    #[test]
    fn if_else_still_adds_only_one_for_the_if() {
        assert_eq!(
            complexity_of_fn_src("fn f(x: i32) { if x > 0 { } else { } }"),
            2
        );
    }

    #[test]
    fn match_adds_one_per_arm() {
        let src = "fn f(x: i32) { match x { 0 => {}, 1 => {}, _ => {} } }";
        assert_eq!(complexity_of_fn_src(src), 1 + 3);
    }

    #[test]
    fn logical_operators_each_add_one() {
        assert_eq!(
            complexity_of_fn_src("fn f(a: bool, b: bool, c: bool) { if a && b || c { } }"),
            1 + 1 + 1 + 1 // base(if already counted) + if + && + ||
        );
    }

    #[test]
    fn nested_loops_accumulate() {
        let src = "fn f() { for i in 0..10 { for j in 0..10 { } } }";
        assert_eq!(complexity_of_fn_src(src), 1 + 1 + 1);
    }
}
