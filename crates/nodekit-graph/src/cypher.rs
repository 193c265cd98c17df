//! Cypher text fragments shared by the compilers.
//!
//! Labels, field names, relationship types, and operators are interpolated
//! into statement text, since the grammar cannot bind them as parameters.
//! Everything interpolated here has been validated first.

use std::fmt;
use std::str::FromStr;

use crate::error::{GraphError, Result};

/// Check that `name` is a plain Cypher identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn validate_identifier(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name)
    } else {
        Err(GraphError::InvalidIdentifier(name.to_string()))
    }
}

/// Render `:A:B` for a label set, or the empty string when there are none.
pub fn label_pattern(labels: &[String]) -> Result<String> {
    let mut out = String::new();
    for label in labels {
        out.push(':');
        out.push_str(validate_identifier(label)?);
    }
    Ok(out)
}

/// Comparison operators allowed in a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
}

impl Operator {
    pub fn as_cypher(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Contains => "CONTAINS",
            Self::StartsWith => "STARTS WITH",
            Self::EndsWith => "ENDS WITH",
            Self::Matches => "=~",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cypher())
    }
}

impl FromStr for Operator {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "=" | "==" => Ok(Self::Eq),
            "<>" | "!=" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "CONTAINS" => Ok(Self::Contains),
            "STARTS WITH" => Ok(Self::StartsWith),
            "ENDS WITH" => Ok(Self::EndsWith),
            "=~" => Ok(Self::Matches),
            _ => Err(GraphError::InvalidOperator(s.to_string())),
        }
    }
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_cypher(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(GraphError::InvalidOperator(s.to_string())),
        }
    }
}

/// How a predicate joins the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Connective {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Test {
    Compare(Operator),
    In,
}

/// One filter condition. The value lives in the compiler's bindings under
/// `param`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Predicate {
    pub connective: Connective,
    pub field: String,
    pub test: Test,
    pub param: String,
}

impl Predicate {
    fn render(&self, variable: &str) -> Result<String> {
        let field = validate_identifier(&self.field)?;
        Ok(match self.test {
            Test::Compare(op) => format!("{variable}.{field} {op} ${}", self.param),
            Test::In => format!("{variable}.{field} IN ${}", self.param),
        })
    }
}

/// Join predicates in insertion order: `AND` by default, `OR` for predicates
/// added through an or-variant. The chain is flat, so Cypher precedence
/// applies (`a AND b OR c` is `(a AND b) OR c`). A leading `OR` predicate
/// gets no connective.
pub(crate) fn render_predicates(variable: &str, predicates: &[Predicate]) -> Result<String> {
    let mut out = String::new();
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            out.push_str(match predicate.connective {
                Connective::And => " AND ",
                Connective::Or => " OR ",
            });
        }
        out.push_str(&predicate.render(variable)?);
    }
    Ok(out)
}

/// ` WHERE ...` or the empty string.
pub(crate) fn where_clause(variable: &str, predicates: &[Predicate]) -> Result<String> {
    if predicates.is_empty() {
        return Ok(String::new());
    }
    Ok(format!(" WHERE {}", render_predicates(variable, predicates)?))
}
