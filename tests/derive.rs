include!("resource.rs");

#[allow(dead_code)]
#[derive(Table)]
struct OrderLines {
    #[column(search)]
    sku: String,
    quantity: u32,
}

#[allow(dead_code)]
#[derive(Table)]
#[table(name = "catalog")]
struct CatalogEntry {
    #[column(search, rename = "title")]
    headline: String,
    #[column(skip)]
    cached: Option<String>,
}

#[test]
fn test_table_name() {
    assert_eq!("products", Products::NAME);
    assert_eq!("order_lines", OrderLines::NAME);
    assert_eq!("catalog", CatalogEntry::NAME);
}

#[test]
fn test_columns() {
    assert_eq!(Column::search("products", "price"), Products::price());
    assert_eq!(
        Column::relational("products", "inventory_count"),
        Products::inventory_count()
    );
    assert_eq!(Column::search("order_lines", "sku"), OrderLines::sku());
    assert_eq!(
        Column::relational("order_lines", "quantity"),
        OrderLines::quantity()
    );
}

#[test]
fn test_rename() {
    assert_eq!(Column::search("catalog", "title"), CatalogEntry::headline());
}

#[test]
fn test_declare() {
    assert_eq!(
        Clause::Literal(Literal::Table("catalog".into())),
        CatalogEntry::declare()
    );
}
