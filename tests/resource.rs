use zdb_query::prelude::*;

/// The `products` table, as indexed by ZomboDB.
#[allow(dead_code)]
#[derive(Table, Clone, Debug)]
struct Products {
    id: i64,
    name: String,
    keywords: Vec<String>,
    #[column(search)]
    short_summary: String,
    #[column(search)]
    long_description: String,
    #[column(search)]
    price: i64,
    inventory_count: i32,
    discontinued: bool,
    availability_date: time::OffsetDateTime,
    #[column(search)]
    author: String,
}

/// A second indexed table.
#[allow(dead_code)]
#[derive(Table, Clone, Debug)]
struct Orders {
    id: i64,
    #[column(search)]
    note: String,
}
