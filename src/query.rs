//! Lazy query building, splitting clauses between the search engine and the relational engine.

use crate::compiler::{Compiled, Compiler};
use crate::error::Error;
use crate::model::{Clause, Combinator, Comparison, Group, Order};

/// Accumulates filters, ordering and paging, without compiling anything.
///
/// All methods take and return the query by value, so calls can be chained. Nothing is
/// evaluated before [`Query::materialize`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    filters: Vec<Clause>,
    orders: Vec<Order>,
    limit: Option<u64>,
    offset: Option<u64>,
}

/// The outcome of materializing a [`Query`].
#[derive(Clone, Debug, PartialEq)]
pub struct Materialized {
    /// The search predicate, if any clause targets a search-indexed column.
    pub search: Option<Compiled>,
    /// Predicates for the relational engine, unchanged.
    pub filters: Vec<Clause>,
    /// Ordering for the relational engine.
    ///
    /// This may contain search orders which couldn't be fused into the search query. A
    /// [`Order::Score`] in here must be ordered by
    /// [`score_expression`](crate::compiler::score_expression) of the search table.
    pub order: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Materialized {
    /// The first table referenced by the predicates.
    pub fn table(&self) -> Option<&str> {
        self.search
            .as_ref()
            .map(|search| search.table.as_str())
            .or_else(|| self.filters.iter().find_map(first_table))
    }
}

fn first_table(clause: &Clause) -> Option<&str> {
    match clause {
        Clause::Comparison(comparison) => Some(comparison.column.table.as_str()),
        Clause::Group(group) => group.children.iter().find_map(first_table),
        _ => None,
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Route {
    Search,
    Relational,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, clause: impl Into<Clause>) -> Self {
        self.filters.push(clause.into());
        self
    }

    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Materialize using the default compiler.
    pub fn materialize(self) -> Result<Materialized, Error> {
        self.materialize_with(&Compiler::default())
    }

    pub fn materialize_with(self, compiler: &Compiler) -> Result<Materialized, Error> {
        let mut search = vec![];
        let mut filters = vec![];

        for clause in reflect(self.filters)? {
            match route(&clause)? {
                Route::Search => search.push(clause),
                Route::Relational => filters.push(clause),
            }
        }

        let (search_orders, mut order): (Vec<_>, Vec<_>) =
            self.orders.into_iter().partition(Order::is_search);
        let mut search_orders = search_orders.into_iter();

        let mut limit = self.limit;
        let mut offset = self.offset;

        let compiled = match search.is_empty() {
            true => None,
            false => {
                // only an order together with a limit can be expressed in the search query
                let fused = match limit {
                    Some(_) => search_orders.next(),
                    None => None,
                };

                let compiled = compiler.compile(
                    &search,
                    fused.as_ref(),
                    limit.unwrap_or_default(),
                    offset.unwrap_or_default(),
                )?;

                if fused.is_some() {
                    limit = None;
                    offset = None;
                }

                Some(compiled)
            }
        };

        for demoted in search_orders {
            if compiled.is_none() && matches!(demoted, Order::Score { .. }) {
                return Err(Error::UnsupportedClause(
                    "Ordering by score requires a filter on a search-indexed column".into(),
                ));
            }
            tracing::trace!(?demoted, "Falling back to relational ordering");
            order.push(demoted);
        }

        tracing::debug!(
            search = compiled.is_some(),
            filters = filters.len(),
            order = order.len(),
            limit = ?limit,
            offset = ?offset,
            "Materialized query"
        );

        Ok(Materialized {
            search: compiled,
            filters,
            order,
            limit,
            offset,
        })
    }
}

/// Flatten conjunctions into a single list of clauses.
///
/// Disjunctions are kept as they are, they can't be split between the two engines.
fn reflect(clauses: Vec<Clause>) -> Result<Vec<Clause>, Error> {
    let mut result = Vec::with_capacity(clauses.len());
    reflect_into(clauses, &mut result)?;
    Ok(result)
}

fn reflect_into(clauses: Vec<Clause>, result: &mut Vec<Clause>) -> Result<(), Error> {
    for clause in clauses {
        match clause {
            Clause::Group(Group {
                combinator: Combinator::And,
                children,
            }) => reflect_into(children, result)?,
            clause @ (Clause::Comparison(_) | Clause::Group(_)) => result.push(clause),
            Clause::Literal(literal) => {
                return Err(Error::UnsupportedClause(format!(
                    "{} literal can't be used as a filter",
                    literal.kind()
                )))
            }
            Clause::Column(column) => {
                return Err(Error::UnsupportedClause(format!(
                    "Column '{column}' can't be used as a filter"
                )))
            }
            Clause::Compiled(_) => {
                return Err(Error::UnsupportedClause(
                    "Search clauses are compiled when materializing, and can't be added compiled"
                        .into(),
                ))
            }
        }
    }
    Ok(())
}

/// Decide which engine evaluates a clause.
fn route(clause: &Clause) -> Result<Route, Error> {
    match clause {
        Clause::Comparison(Comparison { column, .. }) => {
            let route = match column.is_search() {
                true => Route::Search,
                false => Route::Relational,
            };
            tracing::trace!(%column, ?route, "Routing comparison");
            Ok(route)
        }
        Clause::Group(group) => {
            let mut routes = group.children.iter().map(route);
            let first = match routes.next() {
                Some(first) => first?,
                None => {
                    return Err(Error::UnsupportedClause(
                        "Empty groups can't be used as a filter".into(),
                    ))
                }
            };
            for next in routes {
                if next? != first {
                    return Err(Error::UnsupportedClause(
                        "A disjunction can't mix search-indexed and relational columns".into(),
                    ));
                }
            }
            Ok(first)
        }
        _ => Err(Error::UnsupportedClause(format!(
            "{} can't be used as a filter",
            clause.kind()
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{and, or, Column, Direction, Literal};
    use pretty_assertions::assert_eq;

    fn price() -> Column {
        Column::search("products", "price")
    }

    fn count() -> Column {
        Column::relational("products", "inventory_count")
    }

    #[test]
    fn test_accumulate_only() {
        let query = Query::new().filter(price().gt(1)).limit(5);

        assert_eq!(
            Query {
                filters: vec![price().gt(1)],
                orders: vec![],
                limit: Some(5),
                offset: None,
            },
            query
        );
    }

    #[test]
    fn test_reflect_flattens_conjunctions() {
        let clauses = reflect(vec![and([
            price().gt(1),
            and([count().gte(50), or([price().lt(5), price().gt(10)])]),
        ])])
        .unwrap();

        assert_eq!(
            vec![
                price().gt(1),
                count().gte(50),
                or([price().lt(5), price().gt(10)])
            ],
            clauses
        );
    }

    #[test]
    fn test_reflect_rejects() {
        assert!(matches!(
            reflect(vec![Clause::from(Literal::raw("beer"))]),
            Err(Error::UnsupportedClause(_))
        ));
        assert!(matches!(
            reflect(vec![Clause::Column(count())]),
            Err(Error::UnsupportedClause(_))
        ));
    }

    #[test]
    fn test_route_nested() {
        assert_eq!(
            Ok(Route::Search),
            route(&or([price().lt(5), and([price().gt(10), price().lt(20)])]))
        );
        assert_eq!(
            Ok(Route::Relational),
            route(&or([count().lt(5), count().gt(10)]))
        );
        assert!(matches!(
            route(&or([price().lt(5), count().gt(10)])),
            Err(Error::UnsupportedClause(_))
        ));
    }

    #[test]
    fn test_demoted_without_limit() {
        let result = Query::new()
            .filter(price().gt(1))
            .order(Order::score(Direction::Descending))
            .materialize()
            .unwrap();

        assert_eq!("price > 1", result.search.unwrap().query);
        assert_eq!(vec![Order::score(Direction::Descending)], result.order);
    }

    #[test]
    fn test_score_without_search() {
        assert!(matches!(
            Query::new()
                .filter(count().gt(1))
                .order(Order::score(Direction::Descending))
                .materialize(),
            Err(Error::UnsupportedClause(_))
        ));
    }

    #[test]
    fn test_search_column_order_without_search() {
        let result = Query::new()
            .filter(count().gt(1))
            .order(price().asc())
            .limit(3)
            .materialize()
            .unwrap();

        assert_eq!(None, result.search);
        assert_eq!(vec![price().asc()], result.order);
        assert_eq!(Some(3), result.limit);
    }

    #[test]
    fn test_table() {
        let result = Query::new().filter(count().gt(1)).materialize().unwrap();
        assert_eq!(Some("products"), result.table());

        let result = Query::new().materialize().unwrap();
        assert_eq!(None, result.table());
    }
}
