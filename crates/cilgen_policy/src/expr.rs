//! Stack-encoded expression rendering.
//!
//! Boolean conditions and constraint expressions arrive as postfix token
//! sequences. Rendering replays the stack machine with strings: operands
//! push their display text, operators pop and parenthesize. Operand order in
//! a binary composite is fixed by stack position, not by original source
//! order.

use crate::error::{Error, Result};
use cilgen_ast::{ExprToken, SymbolTable};

/// Maximum expression stack depth; deeper expressions are rejected.
pub const COND_EXPR_MAX_DEPTH: usize = 10;

/// Renders a postfix token sequence to parenthesized infix text.
///
/// # Errors
///
/// - [`Error::ExprUnderflow`] if an operator finds too few operands
/// - [`Error::ExprOverflow`] if the stack would exceed
///   [`COND_EXPR_MAX_DEPTH`]
/// - [`Error::MalformedExpr`] if anything other than exactly one value
///   remains after all tokens are consumed
pub fn render_expr(symbols: &SymbolTable, tokens: &[ExprToken]) -> Result<String> {
    let mut stack: Vec<String> = Vec::new();

    for token in tokens {
        match token {
            ExprToken::Op(op) if op.is_unary() => {
                let operand = stack.pop().ok_or(Error::ExprUnderflow {
                    op: op.display(),
                })?;
                stack.push(format!("({} {operand})", op.display()));
            }
            ExprToken::Op(op) => {
                let top = stack.pop();
                let below = stack.pop();
                let (Some(top), Some(below)) = (top, below) else {
                    return Err(Error::ExprUnderflow { op: op.display() });
                };
                stack.push(format!("({top} {} {below})", op.display()));
            }
            operand => {
                if stack.len() >= COND_EXPR_MAX_DEPTH {
                    return Err(Error::ExprOverflow {
                        max: COND_EXPR_MAX_DEPTH,
                    });
                }
                stack.push(operand_text(symbols, operand));
            }
        }
    }

    if stack.len() == 1 {
        Ok(stack.remove(0))
    } else {
        Err(Error::MalformedExpr {
            remaining: stack.len(),
        })
    }
}

fn operand_text(symbols: &SymbolTable, token: &ExprToken) -> String {
    match token {
        ExprToken::Bool(id) | ExprToken::Type(id) | ExprToken::Role(id) | ExprToken::User(id) => {
            symbols.name(*id).to_string()
        }
        ExprToken::Literal(text) => text.clone(),
        ExprToken::Op(_) => unreachable!("operators are handled by the caller"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cilgen_ast::ExprOp;
    use proptest::prelude::*;

    fn lit(s: &str) -> ExprToken {
        ExprToken::Literal(s.to_string())
    }

    #[test]
    fn binary_composite_follows_stack_order() {
        let mut symbols = SymbolTable::new();
        let a = symbols.intern("alpha");
        let b = symbols.intern("beta");

        // Postfix: alpha beta && — beta is on top when && fires.
        let tokens = [
            ExprToken::Bool(a),
            ExprToken::Bool(b),
            ExprToken::Op(ExprOp::And),
        ];
        let rendered = render_expr(&symbols, &tokens).unwrap();
        insta::assert_snapshot!(rendered, @"(beta && alpha)");
    }

    #[test]
    fn unary_not_wraps_single_operand() {
        let symbols = SymbolTable::new();
        let tokens = [lit("u1"), ExprToken::Op(ExprOp::Not)];
        assert_eq!(render_expr(&symbols, &tokens).unwrap(), "(! u1)");
    }

    #[test]
    fn nested_expression_parenthesizes_each_step() {
        let symbols = SymbolTable::new();
        // Postfix: u1 u2 == r1 r2 domby &&
        let tokens = [
            lit("u1"),
            lit("u2"),
            ExprToken::Op(ExprOp::Eq),
            lit("r1"),
            lit("r2"),
            ExprToken::Op(ExprOp::DomBy),
            ExprToken::Op(ExprOp::And),
        ];
        let rendered = render_expr(&symbols, &tokens).unwrap();
        insta::assert_snapshot!(rendered, @"((r2 domby r1) && (u2 == u1))");
    }

    #[test]
    fn operator_without_operands_underflows() {
        let symbols = SymbolTable::new();
        let err = render_expr(&symbols, &[ExprToken::Op(ExprOp::Or)]).unwrap_err();
        assert!(matches!(err, Error::ExprUnderflow { op: "||" }));

        let err = render_expr(&symbols, &[lit("a"), ExprToken::Op(ExprOp::Xor)]).unwrap_err();
        assert!(matches!(err, Error::ExprUnderflow { op: "^" }));
    }

    #[test]
    fn leftover_operands_are_malformed() {
        let symbols = SymbolTable::new();
        let err = render_expr(&symbols, &[lit("a"), lit("b")]).unwrap_err();
        assert!(matches!(err, Error::MalformedExpr { remaining: 2 }));

        let err = render_expr(&symbols, &[]).unwrap_err();
        assert!(matches!(err, Error::MalformedExpr { remaining: 0 }));
    }

    #[test]
    fn depth_bound_is_enforced() {
        let symbols = SymbolTable::new();
        let tokens: Vec<ExprToken> = (0..=COND_EXPR_MAX_DEPTH)
            .map(|i| lit(&format!("b{i}")))
            .collect();
        let err = render_expr(&symbols, &tokens).unwrap_err();
        assert!(matches!(
            err,
            Error::ExprOverflow {
                max: COND_EXPR_MAX_DEPTH
            }
        ));
    }

    #[derive(Debug, Clone)]
    enum Shape {
        Leaf(u8),
        Not(Box<Shape>),
        Bin(bool, Box<Shape>, Box<Shape>),
    }

    fn shapes() -> impl Strategy<Value = Shape> {
        let leaf = (0u8..26).prop_map(Shape::Leaf);
        leaf.prop_recursive(4, 16, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(|s| Shape::Not(Box::new(s))),
                (any::<bool>(), inner.clone(), inner)
                    .prop_map(|(op, a, b)| Shape::Bin(op, Box::new(a), Box::new(b))),
            ]
        })
    }

    fn flatten(shape: &Shape, out: &mut Vec<ExprToken>) {
        match shape {
            Shape::Leaf(n) => out.push(lit(&format!("b{n}"))),
            Shape::Not(inner) => {
                flatten(inner, out);
                out.push(ExprToken::Op(ExprOp::Not));
            }
            Shape::Bin(which, a, b) => {
                flatten(a, out);
                flatten(b, out);
                let op = if *which { ExprOp::And } else { ExprOp::Or };
                out.push(ExprToken::Op(op));
            }
        }
    }

    proptest! {
        #[test]
        fn rendering_is_deterministic(shape in shapes()) {
            let symbols = SymbolTable::new();
            let mut tokens = Vec::new();
            flatten(&shape, &mut tokens);

            let first = render_expr(&symbols, &tokens);
            let second = render_expr(&symbols, &tokens);
            prop_assert_eq!(first.is_ok(), second.is_ok());
            prop_assert_eq!(first.ok(), second.ok());
        }

        #[test]
        fn well_formed_postfix_never_underflows(shape in shapes()) {
            let symbols = SymbolTable::new();
            let mut tokens = Vec::new();
            flatten(&shape, &mut tokens);

            // A well-formed postfix encoding can only fail on depth.
            match render_expr(&symbols, &tokens) {
                Ok(_) => {}
                Err(Error::ExprOverflow { .. }) => {}
                Err(other) => return Err(TestCaseError::fail(format!("unexpected error: {other}"))),
            }
        }
    }
}
