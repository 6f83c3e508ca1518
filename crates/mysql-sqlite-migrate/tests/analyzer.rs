//! Schema analysis against real SQLite databases.

use mysql_sqlite_migrate::{DbConnection, SchemaAnalyzer};

async fn connect_memory() -> DbConnection {
    DbConnection::connect("sqlite::memory:")
        .await
        .expect("connect sqlite")
}

async fn seed(conn: &mut DbConnection, statements: &[&str]) {
    for sql in statements {
        conn.execute(sql).await.expect(sql);
    }
}

#[tokio::test]
async fn engine_internal_tables_are_filtered() {
    let mut conn = connect_memory().await;
    seed(
        &mut conn,
        &[
            "CREATE TABLE posts (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT)",
            // Populating an AUTOINCREMENT table materializes
            // sqlite_sequence.
            "INSERT INTO posts (title) VALUES ('hello')",
        ],
    )
    .await;

    let tables = SchemaAnalyzer::analyze(&mut conn).await.unwrap();
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["posts"]);
}

#[tokio::test]
async fn columns_preserve_order_nullability_and_declared_sizes() {
    let mut conn = connect_memory().await;
    seed(
        &mut conn,
        &[
            "CREATE TABLE items (\
               id INTEGER PRIMARY KEY, \
               label VARCHAR(255) NOT NULL, \
               price DECIMAL(10,2), \
               note TEXT DEFAULT 'n/a')",
            "INSERT INTO items (id, label) VALUES (1, 'a'), (2, 'b')",
        ],
    )
    .await;

    let tables = SchemaAnalyzer::analyze(&mut conn).await.unwrap();
    assert_eq!(tables.len(), 1);
    let items = &tables[0];
    assert_eq!(items.row_count, 2);

    let names: Vec<&str> = items.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "label", "price", "note"]);

    let id = &items.columns[0];
    assert!(id.primary_key);
    assert_eq!(id.data_type, "INTEGER");

    let label = &items.columns[1];
    assert!(!label.nullable);
    assert_eq!(label.data_type, "VARCHAR");
    assert_eq!(label.size, 255);

    let price = &items.columns[2];
    assert_eq!(price.data_type, "DECIMAL");
    assert_eq!(price.size, 10);
    assert_eq!(price.decimal_digits, 2);

    let note = &items.columns[3];
    assert!(note.nullable);
    assert_eq!(note.default_value.as_deref(), Some("n/a"));
}

#[tokio::test]
async fn auto_increment_detected_from_creation_statement() {
    let mut conn = connect_memory().await;
    seed(
        &mut conn,
        &[
            "CREATE TABLE with_seq (id INTEGER PRIMARY KEY AUTOINCREMENT, v TEXT)",
            "CREATE TABLE plain_pk (id INTEGER PRIMARY KEY, v TEXT)",
        ],
    )
    .await;

    let tables = SchemaAnalyzer::analyze(&mut conn).await.unwrap();
    let by_name = |name: &str| tables.iter().find(|t| t.name == name).unwrap();

    assert!(by_name("with_seq").columns[0].auto_increment);
    assert!(!by_name("plain_pk").columns[0].auto_increment);
}

#[tokio::test]
async fn indexes_exclude_primary_key_and_carry_positions() {
    let mut conn = connect_memory().await;
    seed(
        &mut conn,
        &[
            // A TEXT primary key is backed by a pk-origin index, which
            // must not surface.
            "CREATE TABLE contacts (email TEXT PRIMARY KEY, first TEXT, last TEXT, phone TEXT)",
            "CREATE INDEX idx_name ON contacts (first, last)",
            "CREATE UNIQUE INDEX uq_phone ON contacts (phone)",
        ],
    )
    .await;

    let tables = SchemaAnalyzer::analyze(&mut conn).await.unwrap();
    let contacts = &tables[0];

    let mut indexes = contacts.indexes.clone();
    indexes.sort_by(|a, b| (&a.name, a.ordinal_position).cmp(&(&b.name, b.ordinal_position)));

    let summary: Vec<(String, String, i32, bool)> = indexes
        .iter()
        .map(|ix| (ix.name.clone(), ix.column.clone(), ix.ordinal_position, ix.unique))
        .collect();

    assert_eq!(
        summary,
        vec![
            ("idx_name".to_string(), "first".to_string(), 1, false),
            ("idx_name".to_string(), "last".to_string(), 2, false),
            ("uq_phone".to_string(), "phone".to_string(), 1, true),
        ]
    );

    // Single-column unique index marks its column.
    let phone = contacts.columns.iter().find(|c| c.name == "phone").unwrap();
    assert!(phone.unique);
    let first = contacts.columns.iter().find(|c| c.name == "first").unwrap();
    assert!(!first.unique);
}

#[tokio::test]
async fn composite_primary_key_membership() {
    let mut conn = connect_memory().await;
    seed(
        &mut conn,
        &["CREATE TABLE post_tags (post_id INTEGER, tag_id INTEGER, PRIMARY KEY (post_id, tag_id))"],
    )
    .await;

    let tables = SchemaAnalyzer::analyze(&mut conn).await.unwrap();
    let table = &tables[0];

    assert!(table.columns[0].primary_key);
    assert!(table.columns[1].primary_key);
    assert!(!table.columns[0].auto_increment);
}

#[tokio::test]
async fn tables_are_listed_in_name_order() {
    let mut conn = connect_memory().await;
    seed(
        &mut conn,
        &[
            "CREATE TABLE zebra (x INTEGER)",
            "CREATE TABLE apple (x INTEGER)",
            "CREATE TABLE mango (x INTEGER)",
        ],
    )
    .await;

    let tables = SchemaAnalyzer::analyze(&mut conn).await.unwrap();
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["apple", "mango", "zebra"]);
}
