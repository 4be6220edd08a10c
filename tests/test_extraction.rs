use sqljoins::{
    config::Config,
    extractor::JoinNames,
    parser::Diagnostic,
    scan::JoinScanner,
    test_utils::{EXTRACTION_TESTS_FILE, TestExtractionData},
};

fn default_scanner() -> JoinScanner {
    JoinScanner::from_config(&Config::default()).expect("default config should be valid")
}

#[test]
fn test_extraction() {
    let extraction_tests_file =
        std::fs::read_to_string(EXTRACTION_TESTS_FILE).expect("Cannot open extraction test cases");
    let test_extraction_data: TestExtractionData = toml::from_str(&extraction_tests_file)
        .expect("Cannot parse test cases defined in toml");

    for test in test_extraction_data.tests {
        println!("Testing extraction `{}` for SQL: {}", test.name, &test.sql);

        let mut config = Config::default();
        if let Some(dialect) = &test.dialect {
            config.dialect = dialect.clone();
        }
        let scanner = JoinScanner::from_config(&config).expect("Cannot build scanner");
        let report = scanner.scan_script(&test.sql);
        for diagnostic in &report.diagnostics {
            println!("{}", diagnostic);
        }

        assert_eq!(report.joins.table_names, test.tables, "tables of `{}`", test.name);
        assert_eq!(
            report.joins.column_names, test.columns,
            "columns of `{}`",
            test.name
        );
        if let Some(statements) = test.statements {
            assert_eq!(
                report.statements.len(),
                statements,
                "statements of `{}`",
                test.name
            );
        }
    }
}

#[test]
fn test_dropped_statement_is_reported() {
    let report = default_scanner().scan_script(
        "SELECT * FROM a JOIN b ON\n\nSELECT * FROM c JOIN d ON c.id = d.id\n",
    );
    assert!(matches!(
        report.diagnostics.as_slice(),
        [Diagnostic::Unparseable { statement, retried: false, .. }]
            if statement == "SELECT * FROM a JOIN b ON"
    ));
}

#[test]
fn test_join_without_select_is_reported() {
    let report = default_scanner().scan_script(
        "UPDATE a SET x = 1\nFROM a JOIN b ON a.id = b.id\n\nSELECT * FROM c JOIN d ON c.id = d.id\n",
    );
    assert_eq!(report.joins.table_names, ["c", "d"]);
    assert_eq!(
        report.diagnostics,
        [Diagnostic::UnmatchedJoin {
            line: "FROM a JOIN b ON a.id = b.id".to_owned(),
        }]
    );

    let json = serde_json::to_value(&report.diagnostics).expect("diagnostics should serialize");
    assert_eq!(json[0]["kind"], "unmatched_join");
}

#[test]
fn test_subquery_columns_in_join_condition_are_skipped() {
    let report = default_scanner().scan_script(
        "SELECT * FROM a JOIN b ON EXISTS (SELECT 1 FROM r WHERE r.q = b.y) AND a.id = b.id\n",
    );
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.joins.column_names, ["id", "id"]);
}

#[test]
fn test_scanner_is_reusable() {
    let scanner = default_scanner();
    let unclosed = scanner.scan_script("SELECT IIF(x = 1,\n");
    assert!(unclosed.joins.is_empty());

    let report = scanner.scan_script("SELECT * FROM a JOIN b ON a.id = b.id\n");
    assert_eq!(report.joins.table_names, ["a", "b"]);
    assert_eq!(report.joins.column_names, ["id", "id"]);
}

#[test]
fn test_scan_lines_matches_scan_script() {
    let scanner = default_scanner();
    let lines = ["SELECT *", "FROM a", "JOIN b ON a.id = b.a_id"];
    let from_lines = scanner.scan_lines(lines);
    let from_script = scanner.scan_script(&lines.join("\n"));
    assert_eq!(from_lines.joins, from_script.joins);
    assert_eq!(from_lines.statements, from_script.statements);
}

#[test]
fn test_config_without_stop_functions() {
    let config = Config::from_toml_str("stop_functions = []\n").expect("valid config");
    assert_eq!(config.dialect, "mssql");
    assert!(config.stop_functions.is_empty());

    let scanner = JoinScanner::from_config(&config).expect("valid scanner");
    let report = scanner.scan_script("SELECT * FROM t JOIN y ON IIF(t.a = 1, t.b, t.c) = y.d\n");
    assert_eq!(report.joins.column_names, ["a", "b", "c", "d"]);
}

#[test]
fn test_config_with_other_dialect() {
    let config = Config::from_toml_str(
        r#"
        dialect = "generic"
        stop_patterns = ['WITH\s+\(\s*NOLOCK\s*\)']
        "#,
    )
    .expect("valid config");
    assert_eq!(config.stop_functions, ["IIF"]);

    let scanner = JoinScanner::from_config(&config).expect("valid scanner");
    let report = scanner.scan_script("SELECT * FROM a WITH (NOLOCK) JOIN b ON a.id = b.id\n");
    assert_eq!(report.joins.table_names, ["a", "b"]);
}

#[test]
fn test_invalid_config_is_an_error() {
    assert!(Config::from_toml_str("dialect = 3").is_err());

    let config = Config {
        dialect: "no-such-dialect".to_owned(),
        ..Config::default()
    };
    assert!(JoinScanner::from_config(&config).is_err());

    let config = Config {
        stop_patterns: vec!["(unclosed".to_owned()],
        ..Config::default()
    };
    assert!(JoinScanner::from_config(&config).is_err());
}

#[test]
fn test_join_names_extend_keeps_duplicates() {
    let mut names = JoinNames {
        table_names: vec!["a".to_owned()],
        column_names: vec!["id".to_owned()],
    };
    names.extend(JoinNames {
        table_names: vec!["a".to_owned(), "b".to_owned()],
        column_names: vec!["id".to_owned()],
    });
    assert_eq!(names.table_names, ["a", "a", "b"]);
    assert_eq!(names.column_names, ["id", "id"]);
    assert!(!names.is_empty());
    assert!(JoinNames::default().is_empty());
}

#[test]
fn test_report_serializes_to_json() {
    let report = default_scanner().scan_script("SELECT * FROM a JOIN b ON a.id = b.x\n");
    let json = serde_json::to_value(&report).expect("report should serialize");
    assert_eq!(json["joins"]["table_names"], serde_json::json!(["a", "b"]));
    assert_eq!(json["joins"]["column_names"], serde_json::json!(["id", "x"]));
    assert_eq!(json["diagnostics"], serde_json::json!([]));
}
