include!("resource.rs");

use pretty_assertions::assert_eq;

#[test]
fn test_search_only() {
    let result = Query::new()
        .filter(Products::price().gt(8900))
        .materialize()
        .unwrap();

    assert_eq!(
        "zdb('products', ctid) ==> 'price > 8900'",
        result.search.unwrap().to_string()
    );
    assert!(result.filters.is_empty());
}

#[test]
fn test_mixed() {
    let result = Query::new()
        .filter(Products::price().gte(1899))
        .filter(Products::inventory_count().gte(50))
        .materialize()
        .unwrap();

    assert_eq!(
        "zdb('products', ctid) ==> 'price >= 1899'",
        result.search.unwrap().to_string()
    );
    assert_eq!(vec![Products::inventory_count().gte(50)], result.filters);
}

#[test]
fn test_mixed_nested() {
    let result = Query::new()
        .filter(and([
            Products::price().lte(10000),
            and([
                Products::inventory_count().lte(50),
                Products::author().eq("foo"),
            ]),
        ]))
        .materialize()
        .unwrap();

    assert_eq!(
        "price <= 10000 and author:foo",
        result.search.unwrap().query
    );
    assert_eq!(vec![Products::inventory_count().lte(50)], result.filters);
}

#[test]
fn test_relational_only() {
    let result = Query::new()
        .filter(Products::discontinued().eq(false))
        .order(Products::inventory_count().desc())
        .limit(10)
        .offset(20)
        .materialize()
        .unwrap();

    assert_eq!(
        Materialized {
            search: None,
            filters: vec![Products::discontinued().eq(false)],
            order: vec![Products::inventory_count().desc()],
            limit: Some(10),
            offset: Some(20),
        },
        result
    );
}

#[test]
fn test_disjunction_search() {
    let result = Query::new()
        .filter(or([
            Products::author().eq("foo"),
            Products::author().eq("bar"),
        ]))
        .filter(Products::inventory_count().gt(0))
        .materialize()
        .unwrap();

    assert_eq!("(author:foo or author:bar)", result.search.unwrap().query);
    assert_eq!(vec![Products::inventory_count().gt(0)], result.filters);
}

#[test]
fn test_disjunction_relational() {
    let clause = or([
        Products::inventory_count().lt(5),
        Products::discontinued().eq(true),
    ]);
    let result = Query::new().filter(clause.clone()).materialize().unwrap();

    assert_eq!(None, result.search);
    assert_eq!(vec![clause], result.filters);
}

#[test]
fn test_disjunction_mixed() {
    let result = Query::new()
        .filter(or([
            Products::author().eq("foo"),
            Products::inventory_count().lt(5),
        ]))
        .materialize();

    assert!(matches!(result, Err(Error::UnsupportedClause(_))));
}

#[test]
fn test_score_order_fused() {
    let result = Query::new()
        .filter(Products::long_description().like("device"))
        .order(Order::score(Direction::Descending))
        .limit(10)
        .offset(0)
        .materialize()
        .unwrap();

    assert_eq!(
        r#"zdb('products', ctid) ==> '#limit(_score desc, 0, 10) long_description:"device"'"#,
        result.search.unwrap().to_string()
    );
    assert!(result.order.is_empty());
    assert_eq!(None, result.limit);
    assert_eq!(None, result.offset);
}

#[test]
fn test_column_order_fused() {
    let result = Query::new()
        .filter(Products::author().eq("foo"))
        .order(Products::price().asc())
        .limit(5)
        .materialize()
        .unwrap();

    assert_eq!("#limit(price asc, 0, 5) author:foo", result.search.unwrap().query);
    assert_eq!(None, result.limit);
}

#[test]
fn test_additional_orders_demoted() {
    let result = Query::new()
        .filter(Products::author().eq("foo"))
        .order(Order::score(Direction::Descending))
        .order(Products::inventory_count().desc())
        .order(Products::price().asc())
        .limit(10)
        .offset(30)
        .materialize()
        .unwrap();

    assert_eq!(
        "#limit(_score desc, 30, 10) author:foo",
        result.search.unwrap().query
    );
    assert_eq!(
        vec![Products::inventory_count().desc(), Products::price().asc()],
        result.order
    );
    assert_eq!(None, result.limit);
    assert_eq!(None, result.offset);
}

#[test]
fn test_relational_order_keeps_limit() {
    let result = Query::new()
        .filter(Products::author().eq("foo"))
        .order(Products::inventory_count().desc())
        .limit(10)
        .materialize()
        .unwrap();

    assert_eq!("author:foo", result.search.unwrap().query);
    assert_eq!(vec![Products::inventory_count().desc()], result.order);
    assert_eq!(Some(10), result.limit);
}

#[test]
fn test_rejects_compiled() {
    let compiled = Compiler::new()
        .compile(&[Products::author().eq("foo")], None, 0, 0)
        .unwrap();
    let result = Query::new().filter(compiled).materialize();

    assert!(matches!(result, Err(Error::UnsupportedClause(_))));
}

#[test]
fn test_rejects_text() {
    let result = Query::new()
        .filter(Literal::raw("author:foo"))
        .materialize();

    assert!(matches!(result, Err(Error::UnsupportedClause(_))));
}

#[test]
fn test_compile_error_propagates() {
    let result = Query::new()
        .filter(Products::price().between(1, "2"))
        .materialize();

    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}

#[test]
fn test_custom_compiler() {
    let registry = Registry::default().with(Operator::Eq, Rendering::token("="));
    let compiler = Compiler::new().with_registry(registry);

    let result = Query::new()
        .filter(Products::author().eq("foo"))
        .materialize_with(&compiler)
        .unwrap();

    assert_eq!("author=foo", result.search.unwrap().query);
}

#[test]
fn test_table() {
    let result = Query::new()
        .filter(Products::inventory_count().gt(1))
        .filter(Products::author().eq("foo"))
        .materialize()
        .unwrap();

    assert_eq!(Some("products"), result.table());
}
