//! Mapping of comparison operators to their search query form.

use crate::compiler::RenderContext;
use crate::error::Error;
use crate::model::{Column, Literal, Operand, Operator};
use std::borrow::Cow;
use std::collections::HashMap;

/// Renders a comparison which does not fit the `column<token>value` form.
pub type RenderFn = fn(&Column, &Operand, &mut RenderContext<'_>) -> Result<String, Error>;

#[derive(Clone, Debug)]
pub enum Rendering {
    /// Infix token placed between the column name and the rendered value.
    Token(Cow<'static, str>),
    Custom(RenderFn),
}

impl Rendering {
    pub const fn token(token: &'static str) -> Self {
        Self::Token(Cow::Borrowed(token))
    }
}

/// The set of operators the compiler understands.
///
/// The default registry covers the ZomboDB query syntax. Registries are plain values, operators
/// can be replaced or removed before handing the registry to a
/// [`Compiler`](crate::compiler::Compiler).
#[derive(Clone, Debug)]
pub struct Registry {
    operators: HashMap<Operator, Rendering>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::zombodb()
    }
}

impl Registry {
    /// A registry without any operators.
    pub fn empty() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    pub fn zombodb() -> Self {
        Self::empty()
            .with(Operator::Eq, Rendering::token(":"))
            .with(Operator::Ne, Rendering::token(" != "))
            .with(Operator::Gt, Rendering::token(" > "))
            .with(Operator::Gte, Rendering::token(" >= "))
            .with(Operator::Lt, Rendering::token(" < "))
            .with(Operator::Lte, Rendering::token(" <= "))
            .with(Operator::Match, Rendering::token(":@"))
            .with(Operator::IsNot, Rendering::token(" != "))
            .with(Operator::Between, Rendering::Custom(between))
            .with(Operator::Like, Rendering::Custom(like))
            .with(Operator::In, Rendering::Custom(in_list))
    }

    #[must_use]
    pub fn with(mut self, operator: Operator, rendering: Rendering) -> Self {
        self.operators.insert(operator, rendering);
        self
    }

    #[must_use]
    pub fn without(mut self, operator: Operator) -> Self {
        self.operators.remove(&operator);
        self
    }

    pub fn get(&self, operator: Operator) -> Result<&Rendering, Error> {
        self.operators
            .get(&operator)
            .ok_or(Error::UnsupportedOperator(operator))
    }
}

/// `column:low /to/ high`, numeric bounds only.
pub fn between(
    column: &Column,
    value: &Operand,
    context: &mut RenderContext<'_>,
) -> Result<String, Error> {
    let (low, high) = match value {
        Operand::List(bounds) => match bounds.as_slice() {
            [low, high] => (low, high),
            _ => {
                return Err(Error::InvalidParameter(format!(
                    "BETWEEN on '{column}' requires exactly two bounds, got {}",
                    bounds.len()
                )))
            }
        },
        _ => {
            return Err(Error::InvalidParameter(format!(
                "BETWEEN on '{column}' requires a pair of bounds"
            )))
        }
    };

    for bound in [low, high] {
        if !bound.is_numeric() {
            return Err(Error::InvalidParameter(format!(
                "BETWEEN on '{column}' requires numeric bounds, got {}",
                bound.kind()
            )));
        }
    }

    Ok(format!(
        "{}:{} /to/ {}",
        column.name,
        context.render_literal(low)?,
        context.render_literal(high)?
    ))
}

/// Regular expression match for patterns, phrase match for everything else.
pub fn like(
    column: &Column,
    value: &Operand,
    context: &mut RenderContext<'_>,
) -> Result<String, Error> {
    match value {
        Operand::Literal(Literal::Pattern(pattern)) => Ok(format!(
            "{}:~\"{}\"",
            column.name,
            pattern.as_str().replace('"', "")
        )),
        // both are rendered quoted already
        Operand::Literal(Literal::Phrase(_)) | Operand::Column(_) => Ok(format!(
            "{}:{}",
            column.name,
            context.render_operand(value)?
        )),
        Operand::Literal(literal) => Ok(format!(
            "{}:\"{}\"",
            column.name,
            context.render_literal(literal)?
        )),
        Operand::List(_) => Err(Error::InvalidParameter(format!(
            "LIKE on '{column}' does not accept a list"
        ))),
    }
}

/// `column:[a,b,c]`, strings or numbers but not both.
pub fn in_list(
    column: &Column,
    value: &Operand,
    context: &mut RenderContext<'_>,
) -> Result<String, Error> {
    let values = match value {
        Operand::List(values) => values,
        _ => {
            return Err(Error::InvalidParameter(format!(
                "IN on '{column}' requires a list of values"
            )))
        }
    };

    let homogeneous = !values.is_empty()
        && (values.iter().all(Literal::is_numeric)
            || values.iter().all(|v| matches!(v, Literal::String(_))));

    if !homogeneous {
        let kinds = values.iter().map(Literal::kind).collect::<Vec<_>>();
        return Err(Error::InvalidParameter(format!(
            "IN on '{column}' requires a non-empty list of only strings or only numbers, got [{}]",
            kinds.join(", ")
        )));
    }

    Ok(format!("{}:{}", column.name, context.render_operand(value)?))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_is_complete() {
        let registry = Registry::default();
        for operator in [
            Operator::Eq,
            Operator::Ne,
            Operator::Gt,
            Operator::Gte,
            Operator::Lt,
            Operator::Lte,
            Operator::Match,
            Operator::Like,
            Operator::Between,
            Operator::In,
            Operator::IsNot,
        ] {
            assert!(registry.get(operator).is_ok(), "missing {operator}");
        }
    }

    #[test]
    fn test_tokens() {
        let registry = Registry::default();
        let token = |operator| match registry.get(operator) {
            Ok(Rendering::Token(token)) => token.to_string(),
            other => panic!("Expected token, was: {other:?}"),
        };

        assert_eq!(":", token(Operator::Eq));
        assert_eq!(" > ", token(Operator::Gt));
        assert_eq!(" <= ", token(Operator::Lte));
        assert_eq!(":@", token(Operator::Match));
    }

    #[test]
    fn test_without() {
        let registry = Registry::default().without(Operator::Match);
        assert!(matches!(
            registry.get(Operator::Match),
            Err(Error::UnsupportedOperator(Operator::Match))
        ));
    }
}
