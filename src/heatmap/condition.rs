//! Subplot conditions: `COLUMN OP VALUE`, parsed and validated up front.
//!
//! Examples:
//!   LATms > 10
//!   TYPE == 'W'
//!   COMM contains kworker

use crate::error::ConditionError;
use crate::trace::Row;
use crate::trace::columns;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\w+)\s*(==|!=|<=|>=|<|>|\s+contains\s+)\s*(.+?)\s*$")
        .expect("condition pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
}

impl CmpOp {
    fn parse(op: &str) -> Option<Self> {
        match op.trim() {
            "==" => Some(CmpOp::Eq),
            "!=" => Some(CmpOp::Ne),
            "<" => Some(CmpOp::Lt),
            "<=" => Some(CmpOp::Le),
            ">" => Some(CmpOp::Gt),
            ">=" => Some(CmpOp::Ge),
            "contains" => Some(CmpOp::Contains),
            _ => None,
        }
    }

    fn is_ordering(self) -> bool {
        matches!(self, CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge)
    }

    fn holds(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
            CmpOp::Contains => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    expr: String,
    column: String,
    op: CmpOp,
    text: String,
    number: Option<f64>,
}

impl Condition {
    pub fn parse(expr: &str) -> Result<Self, ConditionError> {
        let expr = expr.trim();
        let caps = CONDITION_RE
            .captures(expr)
            .ok_or_else(|| ConditionError::Malformed(expr.to_string()))?;

        let column = caps[1].to_string();
        if !columns::is_known(&column) {
            return Err(ConditionError::UnknownColumn {
                column,
                expr: expr.to_string(),
            });
        }
        let op = CmpOp::parse(&caps[2]).ok_or_else(|| ConditionError::Malformed(expr.to_string()))?;

        let raw = &caps[3];
        let (text, quoted) = unquote(raw);
        let number = if quoted { None } else { text.parse::<f64>().ok() };
        if op.is_ordering() && number.is_none() {
            return Err(ConditionError::NotNumeric {
                op: caps[2].trim().to_string(),
                expr: expr.to_string(),
            });
        }

        Ok(Self {
            expr: expr.to_string(),
            column,
            op,
            text: text.to_string(),
            number,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn op(&self) -> CmpOp {
        self.op
    }

    /// Rows without the column never match.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(value) = row.get(&self.column) else {
            return false;
        };

        if self.op == CmpOp::Contains {
            return value.to_string().contains(&self.text);
        }

        match (self.number, value.as_f64()) {
            (Some(expected), Some(actual)) => actual
                .partial_cmp(&expected)
                .is_some_and(|ord| self.op.holds(ord)),
            _ if self.op.is_ordering() => false,
            _ => self.op.holds(value.to_string().as_str().cmp(self.text.as_str())),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expr)
    }
}

fn unquote(raw: &str) -> (&str, bool) {
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return (&raw[1..raw.len() - 1], true);
        }
    }
    (raw, false)
}
