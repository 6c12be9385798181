use crate::compiler::score_expression;
use crate::error::Error;
use crate::model::{
    Clause, Column, Combinator, Comparison, Direction, Literal, Operand, Operator, Order,
};
use crate::query::Materialized;
use sea_orm::sea_query::{Alias, BinOper, Expr, IntoCondition, Order as SeaOrder, SimpleExpr};
use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, Value};

/// Apply a materialized query to a SeaORM query.
///
/// The search predicate gets added as a custom expression, all remaining parts are translated
/// into their SeaORM counterpart.
pub fn apply<Q>(mut query: Q, materialized: Materialized) -> Result<Q, Error>
where
    Q: QueryFilter + QueryOrder + QuerySelect,
{
    let table = materialized.search.as_ref().map(|search| search.table.clone());

    if let Some(search) = &materialized.search {
        query = query.filter(Expr::cust(search.to_string()));
    }

    for clause in &materialized.filters {
        query = query.filter(translate_clause(clause)?);
    }

    for order in &materialized.order {
        let (expr, order) = translate_order(order, table.as_deref())?;
        query = query.order_by(expr, order);
    }

    if let Some(limit) = materialized.limit {
        query = query.limit(limit);
    }
    if let Some(offset) = materialized.offset {
        query = query.offset(offset);
    }

    Ok(query)
}

/// Translate a relational clause into a condition.
pub fn translate_clause(clause: &Clause) -> Result<Condition, Error> {
    match clause {
        Clause::Comparison(comparison) => Ok(translate_comparison(comparison)?.into_condition()),
        Clause::Group(group) => {
            let mut result = match group.combinator {
                Combinator::And => Condition::all(),
                Combinator::Or => Condition::any(),
            };
            for child in &group.children {
                result = result.add(translate_clause(child)?);
            }
            Ok(result)
        }
        _ => Err(Error::UnsupportedClause(format!(
            "{} can't be translated into a condition",
            clause.kind()
        ))),
    }
}

pub fn translate_comparison(comparison: &Comparison) -> Result<SimpleExpr, Error> {
    let column = column_expr(&comparison.column);
    let value = &comparison.value;

    Ok(match (comparison.operator, value) {
        (Operator::Eq, Operand::Literal(Literal::Null)) => column.is_null(),
        (Operator::Ne | Operator::IsNot, Operand::Literal(Literal::Null)) => column.is_not_null(),
        (Operator::Eq, _) => column.eq(operand(value)?),
        (Operator::Ne, _) => column.ne(operand(value)?),
        (Operator::Gt, _) => column.gt(operand(value)?),
        (Operator::Gte, _) => column.gte(operand(value)?),
        (Operator::Lt, _) => column.lt(operand(value)?),
        (Operator::Lte, _) => column.lte(operand(value)?),
        // `IS NOT` only takes NULL, TRUE or FALSE
        (Operator::IsNot, _) => {
            column.binary(BinOper::Custom("IS DISTINCT FROM"), operand(value)?)
        }
        (Operator::Like, Operand::Literal(Literal::String(pattern))) => {
            column.like(pattern.as_str())
        }
        (Operator::Like, _) => {
            return Err(Error::InvalidParameter(format!(
                "LIKE on '{}' requires a string pattern, got {}",
                comparison.column,
                value_kind(value)
            )))
        }
        (Operator::Between, Operand::List(bounds)) => match bounds.as_slice() {
            [low, high] => column.between(value_of(low)?, value_of(high)?),
            _ => {
                return Err(Error::InvalidParameter(format!(
                    "BETWEEN on '{}' requires exactly two bounds",
                    comparison.column
                )))
            }
        },
        (Operator::In, Operand::List(values)) => column.is_in(
            values
                .iter()
                .map(value_of)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        (Operator::Between | Operator::In, _) => {
            return Err(Error::InvalidParameter(format!(
                "{} on '{}' requires a list, got {}",
                comparison.operator,
                comparison.column,
                value_kind(value)
            )))
        }
        (operator, _) => return Err(Error::UnsupportedOperator(operator)),
    })
}

/// Translate an order, `table` is the search table a score order refers to.
pub fn translate_order(
    order: &Order,
    table: Option<&str>,
) -> Result<(SimpleExpr, SeaOrder), Error> {
    let direction = match order.direction() {
        Direction::Ascending => SeaOrder::Asc,
        Direction::Descending => SeaOrder::Desc,
    };

    let expr = match order {
        Order::Column { column, .. } => column_expr(column).into(),
        Order::Score { .. } => match table {
            Some(table) => Expr::cust(score_expression(table)),
            None => {
                return Err(Error::UnsupportedClause(
                    "Ordering by score requires a search table".into(),
                ))
            }
        },
    };

    Ok((expr, direction))
}

fn column_expr(column: &Column) -> Expr {
    Expr::col((Alias::new(column.table.as_str()), Alias::new(column.name.as_str())))
}

fn operand(operand: &Operand) -> Result<SimpleExpr, Error> {
    match operand {
        Operand::Literal(literal) => Ok(value_of(literal)?.into()),
        Operand::Column(column) => Ok(column_expr(column).into()),
        Operand::List(_) => Err(Error::InvalidParameter(
            "A list can only be used with IN or BETWEEN".into(),
        )),
    }
}

fn value_kind(operand: &Operand) -> &'static str {
    match operand {
        Operand::Literal(literal) => literal.kind(),
        Operand::Column(_) => "column",
        Operand::List(_) => "list",
    }
}

/// Convert a literal into a bind value.
fn value_of(literal: &Literal) -> Result<Value, Error> {
    Ok(match literal {
        Literal::String(value) | Literal::Phrase(value) => Value::from(value.clone()),
        Literal::Integer(value) => Value::from(*value),
        Literal::Float(value) => Value::from(*value),
        Literal::Boolean(value) => Value::from(*value),
        #[cfg(feature = "time")]
        Literal::DateTime(value) => Value::from(
            value
                .format(&::time::format_description::well_known::Rfc3339)
                .map_err(|err| Error::InvalidParameter(err.to_string()))?,
        ),
        _ => {
            return Err(Error::InvalidParameter(format!(
                "{} literal can't be used as a relational value",
                literal.kind()
            )))
        }
    })
}
