//! Expression AST definitions.

mod expr;

pub use expr::{col, lit, AggExpr, AggFunc, BinaryOp, Expr, SortOrder, UnaryOp};
