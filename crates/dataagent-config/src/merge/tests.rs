use super::*;

#[test]
fn test_deep_merge_scalars() {
    let mut base: toml::Value = toml::from_str(
        r#"
        [server]
        bind_addr = "127.0.0.1"
        port = 8080
    "#,
    )
    .unwrap();

    let overlay: toml::Value = toml::from_str(
        r"
        [server]
        port = 9090
    ",
    )
    .unwrap();

    deep_merge(&mut base, &overlay);

    let table = base.as_table().unwrap();
    let server = table["server"].as_table().unwrap();
    assert_eq!(server["bind_addr"].as_str().unwrap(), "127.0.0.1");
    assert_eq!(server["port"].as_integer().unwrap(), 9090);
}

#[test]
fn test_deep_merge_new_keys() {
    let mut base: toml::Value = toml::from_str(
        r#"
        [server]
        bind_addr = "127.0.0.1"
    "#,
    )
    .unwrap();

    let overlay: toml::Value = toml::from_str(
        r#"
        [mcp]
        max_connections_total = 50
    "#,
    )
    .unwrap();

    deep_merge(&mut base, &overlay);

    let table = base.as_table().unwrap();
    assert!(table.contains_key("server"));
    assert_eq!(
        table["mcp"].as_table().unwrap()["max_connections_total"]
            .as_integer()
            .unwrap(),
        50
    );
}

#[test]
fn test_deep_merge_replaces_arrays_wholesale() {
    let mut base: toml::Value = toml::from_str(
        r#"
        [rules]
        search_paths = ["a", "b"]
    "#,
    )
    .unwrap();

    let overlay: toml::Value = toml::from_str(
        r#"
        [rules]
        search_paths = ["c"]
    "#,
    )
    .unwrap();

    deep_merge(&mut base, &overlay);

    let paths = base.as_table().unwrap()["rules"].as_table().unwrap()["search_paths"]
        .as_array()
        .unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].as_str().unwrap(), "c");
}

#[test]
fn test_deep_merge_tracking_records_layer_per_leaf() {
    let mut base: toml::Value = toml::from_str(
        r#"
        [server]
        bind_addr = "127.0.0.1"
        port = 8080
    "#,
    )
    .unwrap();
    let overlay: toml::Value = toml::from_str(
        r"
        [server]
        port = 9090
    ",
    )
    .unwrap();

    let mut sources = FieldSources::new();
    deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::User, &mut sources);

    assert_eq!(sources.get("server.port"), Some(&ConfigLayer::User));
    assert_eq!(sources.get("server.bind_addr"), None);
}

#[test]
fn test_deep_merge_tracking_records_every_leaf_of_a_new_table() {
    let mut base: toml::Value = toml::from_str("[server]\nbind_addr = \"127.0.0.1\"").unwrap();
    let overlay: toml::Value = toml::from_str(
        r#"
        [mcp]
        max_connections_per_user = 5
        max_connections_total = 50
    "#,
    )
    .unwrap();

    let mut sources = FieldSources::new();
    deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::Workspace, &mut sources);

    assert_eq!(
        sources.get("mcp.max_connections_per_user"),
        Some(&ConfigLayer::Workspace)
    );
    assert_eq!(
        sources.get("mcp.max_connections_total"),
        Some(&ConfigLayer::Workspace)
    );
}
