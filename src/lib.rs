//! Compile filter, order and limit expressions into [ZomboDB](https://github.com/zombodb/zombodb)
//! search queries.
//!
//! Columns are either search-indexed or plain relational. A [`Query`](query::Query) collects
//! clauses on both kinds, and splits them when being materialized: predicates on search-indexed
//! columns get compiled into a single `zdb('<table>', ctid) ==> '<query>'` predicate, all others
//! are handed back untouched.

pub mod compiler;
pub mod error;
pub mod model;
pub mod query;
pub mod registry;
#[cfg(feature = "sea-orm")]
pub mod sea_orm;

pub mod prelude {
    pub use crate::compiler::{score_expression, Compiled, Compiler};
    pub use crate::error::Error;
    pub use crate::model::*;
    pub use crate::query::{Materialized, Query};
    pub use crate::registry::{Registry, Rendering};
    pub use zdb_query_macros::Table;
}

pub use zdb_query_macros::Table;

pub use ::regex;
