//! Expression AST and builders.

use rivulet_core::{DataType, Error, Result, Schema, Value};

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Returns true for the comparison operators.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Returns true for the logical operators.
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Returns true for the arithmetic operators.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

/// Aggregate functions.
///
/// Every function's accumulator merges associatively and commutatively,
/// so per-partition states can be combined in any order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggFunc {
    Count,
    Sum,
    Min,
    Max,
    Mean,
}

/// Sort order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Expression AST node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Column reference, resolved by name against the schema in scope.
    Column(String),
    /// Literal value.
    Literal(Value),
    /// Binary operation.
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Unary operation.
    UnaryOp { op: UnaryOp, expr: Box<Expr> },
    /// Cast to a target type.
    Cast { expr: Box<Expr>, to: DataType },
    /// Renames the expression's output column.
    Alias { expr: Box<Expr>, name: String },
}

/// Creates a column reference expression.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Creates a literal expression.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

impl Expr {
    pub(crate) fn binary(self, op: BinaryOp, right: Expr) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    /// Equality comparison.
    pub fn eq(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Eq, other)
    }

    /// Inequality comparison.
    pub fn ne(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Ne, other)
    }

    /// Less-than comparison.
    pub fn lt(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Lt, other)
    }

    /// Less-than-or-equal comparison.
    pub fn le(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Le, other)
    }

    /// Greater-than comparison.
    pub fn gt(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Gt, other)
    }

    /// Greater-than-or-equal comparison.
    pub fn ge(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Ge, other)
    }

    /// Logical AND.
    pub fn and(self, other: Expr) -> Expr {
        self.binary(BinaryOp::And, other)
    }

    /// Logical OR.
    pub fn or(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Or, other)
    }

    /// Addition.
    pub fn add(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Add, other)
    }

    /// Subtraction.
    pub fn sub(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Sub, other)
    }

    /// Multiplication.
    pub fn mul(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Mul, other)
    }

    /// Division.
    pub fn div(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Div, other)
    }

    /// Logical negation.
    pub fn not(self) -> Expr {
        Expr::UnaryOp {
            op: UnaryOp::Not,
            expr: Box::new(self),
        }
    }

    /// Arithmetic negation.
    pub fn neg(self) -> Expr {
        Expr::UnaryOp {
            op: UnaryOp::Neg,
            expr: Box::new(self),
        }
    }

    /// Null test.
    pub fn is_null(self) -> Expr {
        Expr::UnaryOp {
            op: UnaryOp::IsNull,
            expr: Box::new(self),
        }
    }

    /// Not-null test.
    pub fn is_not_null(self) -> Expr {
        Expr::UnaryOp {
            op: UnaryOp::IsNotNull,
            expr: Box::new(self),
        }
    }

    /// Inclusive range test, `low <= self <= high`.
    pub fn is_between(self, low: Expr, high: Expr) -> Expr {
        self.clone().ge(low).and(self.le(high))
    }

    /// Cast to the given type.
    pub fn cast(self, to: DataType) -> Expr {
        Expr::Cast {
            expr: Box::new(self),
            to,
        }
    }

    /// Renames the output column.
    pub fn alias(self, name: impl Into<String>) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            name: name.into(),
        }
    }

    /// Collects every column name referenced by this expression.
    pub fn collect_columns(&self, out: &mut hashbrown::HashSet<String>) {
        match self {
            Expr::Column(name) => {
                out.insert(name.clone());
            }
            Expr::Literal(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::UnaryOp { expr, .. } | Expr::Cast { expr, .. } | Expr::Alias { expr, .. } => {
                expr.collect_columns(out);
            }
        }
    }

    /// Returns the set of column names this expression references.
    pub fn referenced_columns(&self) -> hashbrown::HashSet<String> {
        let mut out = hashbrown::HashSet::new();
        self.collect_columns(&mut out);
        out
    }

    /// Returns the name this expression's output column gets.
    ///
    /// Aliases name explicitly; bare columns and wrappers around them keep
    /// the column name; computed expressions inherit their leftmost input
    /// name, so `col("fare").mul(lit(2))` still yields a `fare` column
    /// unless aliased.
    pub fn output_name(&self) -> Option<String> {
        match self {
            Expr::Alias { name, .. } => Some(name.clone()),
            Expr::Column(name) => Some(name.clone()),
            Expr::Cast { expr, .. } | Expr::UnaryOp { expr, .. } => expr.output_name(),
            Expr::BinaryOp { left, .. } => left.output_name(),
            Expr::Literal(_) => None,
        }
    }

    /// Returns true if this is a bare (possibly aliased to itself) column
    /// reference.
    pub fn is_bare_column(&self) -> bool {
        match self {
            Expr::Column(_) => true,
            Expr::Alias { expr, name } => {
                matches!(expr.as_ref(), Expr::Column(c) if c == name)
            }
            _ => false,
        }
    }

    /// Resolves this expression's output type against the schema in scope.
    ///
    /// This is where malformed expressions surface: unknown columns and
    /// incompatible operand types are schema errors, never silent wrong
    /// results.
    pub fn resolve_type(&self, schema: &Schema) -> Result<DataType> {
        match self {
            Expr::Column(name) => schema.data_type(name),
            Expr::Literal(value) => value
                .data_type()
                .ok_or_else(|| Error::internal("untyped null literal")),
            Expr::BinaryOp { left, op, right } => {
                let lt = left.resolve_type(schema)?;
                let rt = right.resolve_type(schema)?;
                if op.is_logical() {
                    if lt != DataType::Boolean || rt != DataType::Boolean {
                        return Err(Error::type_mismatch(lt, rt));
                    }
                    return Ok(DataType::Boolean);
                }
                let common = DataType::common_super_type(lt, rt)
                    .ok_or_else(|| Error::type_mismatch(lt, rt))?;
                if op.is_comparison() {
                    Ok(DataType::Boolean)
                } else {
                    if !common.is_numeric() {
                        return Err(Error::type_mismatch(lt, rt));
                    }
                    Ok(common)
                }
            }
            Expr::UnaryOp { op, expr } => {
                let inner = expr.resolve_type(schema)?;
                match op {
                    UnaryOp::Not => {
                        if inner != DataType::Boolean {
                            return Err(Error::type_mismatch(inner, DataType::Boolean));
                        }
                        Ok(DataType::Boolean)
                    }
                    UnaryOp::Neg => {
                        if !inner.is_numeric() {
                            return Err(Error::type_mismatch(inner, DataType::Float64));
                        }
                        Ok(inner)
                    }
                    UnaryOp::IsNull | UnaryOp::IsNotNull => Ok(DataType::Boolean),
                }
            }
            Expr::Cast { expr, to } => {
                let inner = expr.resolve_type(schema)?;
                if inner != *to && DataType::common_super_type(inner, *to).is_none() {
                    return Err(Error::type_mismatch(inner, *to));
                }
                Ok(*to)
            }
            Expr::Alias { expr, .. } => expr.resolve_type(schema),
        }
    }
}

impl core::fmt::Display for Expr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "col({})", name),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::BinaryOp { left, op, right } => {
                let symbol = match op {
                    BinaryOp::Eq => "==",
                    BinaryOp::Ne => "!=",
                    BinaryOp::Lt => "<",
                    BinaryOp::Le => "<=",
                    BinaryOp::Gt => ">",
                    BinaryOp::Ge => ">=",
                    BinaryOp::And => "&&",
                    BinaryOp::Or => "||",
                    BinaryOp::Add => "+",
                    BinaryOp::Sub => "-",
                    BinaryOp::Mul => "*",
                    BinaryOp::Div => "/",
                };
                write!(f, "({} {} {})", left, symbol, right)
            }
            Expr::UnaryOp { op, expr } => match op {
                UnaryOp::Not => write!(f, "!{}", expr),
                UnaryOp::Neg => write!(f, "-{}", expr),
                UnaryOp::IsNull => write!(f, "{}.is_null()", expr),
                UnaryOp::IsNotNull => write!(f, "{}.is_not_null()", expr),
            },
            Expr::Cast { expr, to } => write!(f, "{}.cast({})", expr, to),
            Expr::Alias { expr, name } => write!(f, "{} as {}", expr, name),
        }
    }
}

/// An aggregation over a group.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AggExpr {
    /// The aggregate function.
    pub func: AggFunc,
    /// The aggregated input; `None` means count-rows.
    pub input: Option<Expr>,
    /// Output column name override.
    pub alias: Option<String>,
}

impl AggExpr {
    /// Counts rows in the group.
    pub fn count() -> Self {
        Self {
            func: AggFunc::Count,
            input: None,
            alias: None,
        }
    }

    /// Sums the expression over the group, skipping nulls.
    pub fn sum(input: Expr) -> Self {
        Self {
            func: AggFunc::Sum,
            input: Some(input),
            alias: None,
        }
    }

    /// Minimum over the group, skipping nulls.
    pub fn min(input: Expr) -> Self {
        Self {
            func: AggFunc::Min,
            input: Some(input),
            alias: None,
        }
    }

    /// Maximum over the group, skipping nulls.
    pub fn max(input: Expr) -> Self {
        Self {
            func: AggFunc::Max,
            input: Some(input),
            alias: None,
        }
    }

    /// Arithmetic mean over the group, skipping nulls.
    pub fn mean(input: Expr) -> Self {
        Self {
            func: AggFunc::Mean,
            input: Some(input),
            alias: None,
        }
    }

    /// Renames the output column.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Returns the output column name.
    pub fn output_name(&self) -> Result<String> {
        if let Some(alias) = &self.alias {
            return Ok(alias.clone());
        }
        match &self.input {
            None => Ok("count".into()),
            Some(expr) => expr
                .output_name()
                .ok_or_else(|| Error::internal("aggregate expression needs an alias")),
        }
    }

    /// Resolves the output type against the schema in scope.
    pub fn resolve_type(&self, schema: &Schema) -> Result<DataType> {
        let input_type = match &self.input {
            None => return Ok(DataType::Int64),
            Some(expr) => expr.resolve_type(schema)?,
        };
        match self.func {
            AggFunc::Count => Ok(DataType::Int64),
            AggFunc::Min | AggFunc::Max => Ok(input_type),
            AggFunc::Sum => match input_type {
                // Narrow integers widen so long sums do not overflow.
                DataType::Int32 | DataType::Int64 => Ok(DataType::Int64),
                DataType::Float64 => Ok(DataType::Float64),
                other => Err(Error::type_mismatch(other, DataType::Float64)),
            },
            AggFunc::Mean => {
                if !input_type.is_numeric() {
                    return Err(Error::type_mismatch(input_type, DataType::Float64));
                }
                Ok(DataType::Float64)
            }
        }
    }
}

impl core::fmt::Display for AggExpr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let func = match self.func {
            AggFunc::Count => "count",
            AggFunc::Sum => "sum",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Mean => "mean",
        };
        match &self.input {
            None => write!(f, "{}()", func)?,
            Some(expr) => write!(f, "{}({})", func, expr)?,
        }
        if let Some(alias) = &self.alias {
            write!(f, " as {}", alias)?;
        }
        Ok(())
    }
}
