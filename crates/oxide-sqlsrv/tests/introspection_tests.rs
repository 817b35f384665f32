mod common;

use common::{MockClient, config, connect, connect_with, text, unquoted};
use oxide_sqlsrv::Connection;
use oxide_sqlsrv_core::{
    CatalogQuery, DatabaseError, ForeignKeyDescriptor, IndexKind, MetadataSource, NativeError,
    Value,
};

fn catalog_failure() -> Vec<NativeError> {
    vec![NativeError::new("42000", 229, "The SELECT permission was denied")]
}

#[test]
fn test_list_tables_limited_to_prefix() {
    let client = MockClient::new().quoted().respond(
        "sysobjects",
        &["name"],
        vec![vec![text("app_orders")], vec![text("app_users")]],
    );
    let mut conn = connect_with(config().with_prefix("app_"), client);

    let tables = conn.list_tables(true).unwrap();
    assert_eq!(tables, vec!["app_orders", "app_users"]);
    assert_eq!(
        conn.client().statements(),
        vec![
            "SELECT DISTINCT \"name\" FROM \"sysobjects\" WHERE \"type\" = 'U' AND \"name\" LIKE 'app!_%' ESCAPE '!' ORDER BY \"name\""
        ]
    );
}

#[test]
fn test_list_tables_without_prefix_limit() {
    let client = MockClient::new().respond("sysobjects", &["name"], vec![vec![text("users")]]);
    let mut conn = connect_with(config().with_prefix("app_"), client);

    conn.list_tables(false).unwrap();
    assert_eq!(
        conn.client().statements(),
        vec!["SELECT DISTINCT [name] FROM [sysobjects] WHERE [type] = 'U' ORDER BY [name]"]
    );
}

#[test]
fn test_list_tables_failure_is_raised() {
    let client = MockClient::new().fail("sysobjects", catalog_failure());
    let mut conn = connect(client);
    let err = conn.list_tables(false).unwrap_err();
    assert!(matches!(err, DatabaseError::CatalogQuery(CatalogQuery::ListTables)));
    assert_eq!(err.to_string(), "Database.failGetTableList: unable to list tables");
}

#[test]
fn test_list_columns_uses_prefixed_upper_case_name() {
    let client = MockClient::new().respond(
        "INFORMATION_SCHEMA.COLUMNS",
        &["COLUMN_NAME"],
        vec![vec![text("id")], vec![text("Email")]],
    );
    let mut conn = connect_with(config().with_prefix("app_"), client);

    assert_eq!(conn.list_columns("users").unwrap(), vec!["id", "Email"]);
    assert!(conn.client().statements()[0].ends_with("WHERE UPPER(TABLE_NAME) = 'APP_USERS'"));
}

#[test]
fn test_field_exists_is_case_insensitive() {
    let client = MockClient::new().respond(
        "INFORMATION_SCHEMA.COLUMNS",
        &["COLUMN_NAME"],
        vec![vec![text("Email")]],
    );
    let mut conn = connect(client);
    assert!(conn.field_exists("email", "users").unwrap());
    assert!(!conn.field_exists("phone", "users").unwrap());
}

#[test]
fn test_table_exists() {
    let client = MockClient::new().respond("sysobjects", &["name"], vec![vec![text("Users")]]);
    let mut conn = connect(client);
    assert!(conn.table_exists("users").unwrap());
    assert!(!conn.table_exists("orders").unwrap());
}

#[test]
fn test_field_data() {
    let client = MockClient::new().respond(
        "KeyType",
        &[
            "TABLE_NAME",
            "COLUMN_NAME",
            "DATA_TYPE",
            "COLUMN_DEFAULT",
            "CHARACTER_MAXIMUM_LENGTH",
            "NUMERIC_PRECISION",
            "KeyType",
        ],
        vec![
            vec![
                text("users"),
                text("id"),
                text("int"),
                Value::Null,
                Value::Null,
                Value::Int(10),
                Value::Int(1),
            ],
            vec![
                text("users"),
                text("email"),
                text("nvarchar"),
                text("('')"),
                Value::Int(255),
                Value::Null,
                Value::Int(0),
            ],
        ],
    );
    let mut conn = connect(client);

    let fields = conn.field_data("users").unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "id");
    assert_eq!(fields[0].max_length, Some(10));
    assert!(fields[0].primary_key);
    assert_eq!(fields[1].type_name, "nvarchar");
    assert_eq!(fields[1].max_length, Some(255));
    assert_eq!(fields[1].default.as_deref(), Some("('')"));
    assert!(!fields[1].primary_key);
}

#[test]
fn test_field_data_failure_is_raised() {
    let mut conn = connect(MockClient::new().fail("KeyType", catalog_failure()));
    assert!(matches!(
        conn.field_data("users"),
        Err(DatabaseError::CatalogQuery(CatalogQuery::FieldData))
    ));
}

#[test]
fn test_composite_primary_key_folds_into_one_entry() {
    let client = MockClient::new().respond(
        "sys.indexes",
        &["index_name", "index_type", "column_name"],
        vec![
            vec![text("PK__lines__1"), text("PRIMARY"), text("a")],
            vec![text("PK__lines__1"), text("PRIMARY"), text("b")],
            vec![text("ux_lines_sku"), text("UNIQUE"), text("sku")],
        ],
    );
    let mut conn = connect(client);

    let indexes = conn.index_data("lines").unwrap();
    assert_eq!(indexes.len(), 2);
    let primary = &indexes["PRIMARY"];
    assert_eq!(primary.kind, IndexKind::Primary);
    assert_eq!(primary.fields, vec!["a", "b"]);
    assert_eq!(indexes["ux_lines_sku"].kind, IndexKind::Unique);
}

#[test]
fn test_index_data_failure_is_raised() {
    let mut conn = connect(MockClient::new().fail("sys.indexes", catalog_failure()));
    assert!(matches!(
        conn.index_data("lines"),
        Err(DatabaseError::CatalogQuery(CatalogQuery::IndexData))
    ));
}

#[test]
fn test_foreign_keys_are_deduplicated() {
    let row = |name: &str, primary: &str| {
        vec![
            text("dbo.order_lines"),
            text(primary),
            text(name),
            text("order_id, "),
        ]
    };
    let client = MockClient::new().respond(
        "sys.foreign_keys",
        &["foreign_table", "primary_table", "fk_constraint_name", "column_names"],
        vec![
            row("fk_lines_orders", "dbo.orders"),
            row("fk_lines_orders", "dbo.orders"),
            row("fk_lines_products", "dbo.products"),
        ],
    );
    let mut conn = connect(client);

    let keys = conn.foreign_key_data("order_lines").unwrap();
    assert_eq!(
        keys,
        vec![
            ForeignKeyDescriptor {
                constraint_name: "fk_lines_orders".into(),
                referencing_table: "dbo.order_lines".into(),
                referenced_table: "dbo.orders".into(),
            },
            ForeignKeyDescriptor {
                constraint_name: "fk_lines_products".into(),
                referencing_table: "dbo.order_lines".into(),
                referenced_table: "dbo.products".into(),
            },
        ]
    );
    assert!(conn.client().statements()[0].contains("WHERE fk_tab.name = 'order_lines'"));
}

#[test]
fn test_foreign_key_failure_is_raised() {
    let mut conn = connect(MockClient::new().fail("sys.foreign_keys", catalog_failure()));
    assert!(matches!(
        conn.foreign_key_data("order_lines"),
        Err(DatabaseError::CatalogQuery(CatalogQuery::ForeignKeyData))
    ));
}

#[test]
fn test_catalog_query_on_lazy_connection_uses_probed_quotes() {
    let client = MockClient::new()
        .quoted()
        .respond("sysobjects", &["name"], vec![vec![text("users")]]);
    let mut conn = Connection::new(config(), client);

    assert_eq!(conn.list_tables(false).unwrap(), vec!["users"]);
    assert_eq!(
        conn.client().statements(),
        vec!["SELECT DISTINCT \"name\" FROM \"sysobjects\" WHERE \"type\" = 'U' ORDER BY \"name\""]
    );
}

#[test]
fn test_catalog_query_on_lazy_connection_uses_probed_brackets() {
    let mut conn = Connection::new(config(), unquoted(MockClient::new()));
    assert!(conn.list_tables(false).unwrap().is_empty());
    assert_eq!(
        conn.client().statements(),
        vec!["SELECT DISTINCT [name] FROM [sysobjects] WHERE [type] = 'U' ORDER BY [name]"]
    );
}
