//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置加载到各阶段组件的装配
//! - 模拟 e2e 测试（导入 → 过滤 → 导出 → 发送 → 报告）
//! - HTTP 网关端到端测试（wiremock）

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;

    use artifact_store::{ArtifactStore, OutputSerializer, ReportStore};
    use chrono::NaiveDate;
    use contracts::{
        Cell, ContractError, DateRange, DispatchOutcome, DispatchStatus, FailureClass,
        FilterCriteria, RowcastBlueprint, SendAttempt, SourceKind,
    };
    use dispatcher::{DispatchCoordinator, DispatchOptions, ScriptedTransport};
    use filter_engine::{FilterEngine, RowIndexer};
    use ingestion::FormatParser;
    use observability::DispatchMetricsAggregator;

    const CONFIG: &str = r#"
[columns]
neighborhood = "Bairro"
status = "Status"
date = "Data"
phone = "Telefone"
name = "Nome"
"#;

    const CONTACTS: &str = "Nome,Bairro,Status,Data,Telefone\n\
                            Ana,Centro,ativo,05/01/2024,111\n\
                            Bruno,Norte,ativo,10/01/2024,222\n\
                            Clara,Centro,ativo,15/01/2024,333\n\
                            Davi,Centro,inativo,20/01/2024,444\n\
                            Eva,Centro,ativo,25/01/2024,\n\
                            Fabio,Centro,ativo,28/01/2024,666\n";

    fn blueprint(root: &Path) -> RowcastBlueprint {
        let mut blueprint =
            config_loader::ConfigLoader::load_from_str(CONFIG, config_loader::ConfigFormat::Toml)
                .unwrap();
        blueprint.storage.temp_dir = root.join("tmp");
        blueprint.storage.output_dir = root.join("out");
        blueprint
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    /// End-to-end test: CSV -> ArtifactStore -> FilterEngine -> OutputSerializer
    /// -> DispatchCoordinator -> ReportStore
    ///
    /// 验证完整的数据流：
    /// 1. 导入 CSV 并生成数据集 id
    /// 2. 按街区/状态过滤
    /// 3. 写出工作簿并可重新解析
    /// 4. 第三次发送遇到 429，报告归类为 rate_limited
    #[tokio::test]
    async fn test_e2e_csv_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = blueprint(dir.path());
        let source = dir.path().join("contacts.csv");
        std::fs::write(&source, CONTACTS).unwrap();

        let parser = FormatParser::from_config(&blueprint.limits);
        let store = ArtifactStore::new(blueprint.storage.temp_dir(), parser);
        let (id, dataset) = store.ingest(&source, SourceKind::DelimitedText).unwrap();
        assert_eq!(dataset.total_rows(), 6);

        let options = RowIndexer::extract_filter_options(&dataset, &blueprint.columns);
        assert_eq!(options.neighborhoods, vec!["Centro", "Norte"]);
        assert_eq!(options.statuses, vec!["ativo", "inativo"]);

        // Filter
        let engine = FilterEngine::from_config(&blueprint.filters);
        let criteria = FilterCriteria::all()
            .with_neighborhoods(["Centro"])
            .with_statuses(["ativo"]);
        let selected = engine
            .filter(&store.load(id).unwrap(), &blueprint.columns, &criteria)
            .unwrap();
        assert_eq!(selected.total_rows(), 4);
        assert_eq!(selected.headers, dataset.headers);

        // Serialize and read back
        let serializer = OutputSerializer::from_config(&blueprint.storage);
        let artifact = serializer.serialize(&selected.headers, &selected.rows).unwrap();
        let reparsed = parser.parse_path(&artifact, SourceKind::Spreadsheet).unwrap();
        assert_eq!(reparsed.headers, selected.headers);
        assert_eq!(reparsed.total_rows(), 4);

        // Dispatch: Ana ok, Clara ok, Eva skipped, Fabio 429
        let transport = ScriptedTransport::new([
            SendAttempt::Accepted { status: 200 },
            SendAttempt::Accepted { status: 200 },
            SendAttempt::Rejected { status: 429 },
        ]);
        let mut coordinator = DispatchCoordinator::new(transport, DispatchOptions::default());
        let report = coordinator
            .dispatch(&selected, &blueprint.columns, "Olá")
            .await
            .unwrap();

        assert_eq!(report.summary.success_count, 2);
        assert_eq!(report.summary.fail_count, 1);
        assert_eq!(report.summary.skipped_count, 1);
        assert_eq!(
            report.outcome,
            DispatchOutcome::Failed(FailureClass::RateLimited)
        );
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[2].display_name, "Fabio");
        assert_eq!(report.results[2].status, DispatchStatus::Failed);

        let received = coordinator.transport().received();
        assert_eq!(received.len(), 3);
        assert!(received.iter().all(|m| m.message == "Olá"));

        // Report persistence
        let reports = ReportStore::from_config(&blueprint.storage);
        reports.save(&report).unwrap();
        let saved = reports.latest().unwrap().unwrap();
        assert_eq!(saved.summary, report.summary);
        assert_eq!(saved.outcome, report.outcome);

        let mut aggregator = DispatchMetricsAggregator::new();
        aggregator.update(&report);
        let summary = aggregator.summary();
        assert_eq!(summary.total_sent, 2);
        assert_eq!(summary.total_failed, 1);

        // Removal
        store.remove(id).unwrap();
        assert!(matches!(
            store.load(id),
            Err(ContractError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_date_filter_over_reparsed_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = blueprint(dir.path());
        let parser = FormatParser::from_config(&blueprint.limits);

        let headers: Vec<String> = ["Nome", "Bairro", "Status", "Data", "Telefone"]
            .into_iter()
            .map(String::from)
            .collect();
        let rows = vec![
            vec![
                Cell::from("Ana"),
                Cell::from("Centro"),
                Cell::from("ativo"),
                Cell::Date(day(5)),
                Cell::from("111"),
            ],
            vec![
                Cell::from("Bruno"),
                Cell::from("Norte"),
                Cell::from("ativo"),
                Cell::Date(day(20)),
                Cell::from("222"),
            ],
        ];
        let bytes = artifact_store::workbook_bytes(&headers, &rows).unwrap();

        let store = ArtifactStore::new(blueprint.storage.temp_dir(), parser);
        let (_, dataset) = store
            .ingest_bytes(bytes.into(), "contacts.xlsx", SourceKind::Spreadsheet)
            .unwrap();
        assert_eq!(dataset.total_rows(), 2);

        let engine = FilterEngine::from_config(&blueprint.filters);
        let criteria = FilterCriteria::all().with_date_range(DateRange::between(day(1), day(10)));
        let selected = engine
            .filter(&dataset, &blueprint.columns, &criteria)
            .unwrap();
        assert_eq!(selected.total_rows(), 1);
        assert_eq!(selected.rows[0][0], Cell::from("Ana"));

        let single_day = FilterCriteria::all().with_date_range(DateRange::day(day(20)));
        let selected = engine
            .filter(&dataset, &blueprint.columns, &single_day)
            .unwrap();
        assert_eq!(selected.total_rows(), 1);
    }

    #[tokio::test]
    async fn test_missing_phone_column_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = blueprint(dir.path());
        let dataset = contracts::Dataset::new(
            vec!["Nome".into()],
            vec![vec![Cell::from("Ana")]],
        );

        let mut coordinator =
            DispatchCoordinator::new(ScriptedTransport::accepting(), DispatchOptions::default());
        let err = coordinator
            .dispatch(&dataset, &blueprint.columns, "Olá")
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Validation { .. }));
        assert!(coordinator.transport().received().is_empty());
    }
}

#[cfg(test)]
mod gateway_tests {
    use contracts::{
        AuthConfig, Cell, ColumnBindings, Dataset, DispatchOutcome, FailureClass, GatewayConfig,
    };
    use dispatcher::{
        build_client, ClientCredentialsProvider, DispatchCoordinator, DispatchOptions,
        HttpTransport,
    };
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bindings() -> ColumnBindings {
        ColumnBindings {
            neighborhood: "Bairro".into(),
            status: "Status".into(),
            date: "Data".into(),
            phone: "Telefone".into(),
            name: None,
            identifier: Some("Codigo".into()),
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(
            vec!["Codigo".into(), "Telefone".into()],
            vec![
                vec![Cell::from("A1"), Cell::from("111")],
                vec![Cell::from("A2"), Cell::from("222")],
            ],
        )
    }

    /// End-to-end test: client credentials -> HttpTransport -> DispatchCoordinator
    #[tokio::test]
    async fn test_http_dispatch_with_client_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/wp/send"))
            .and(query_param("cid", "client-1"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let gateway = GatewayConfig {
            send_url: format!("{}/wp/send", server.uri()),
            client_id: "client-1".into(),
            request_timeout_ms: 2_000,
            auth: AuthConfig::default(),
        };
        let client = build_client(&gateway).unwrap();
        let tokens = ClientCredentialsProvider::new(
            client.clone(),
            format!("{}/get-token", server.uri()),
            "id",
            "secret",
        );
        let transport = HttpTransport::new(client, &gateway, tokens);
        let mut coordinator =
            DispatchCoordinator::new(transport, DispatchOptions::from_gateway(&gateway));

        let report = coordinator
            .dispatch(&dataset(), &bindings(), "Olá")
            .await
            .unwrap();
        assert_eq!(report.outcome, DispatchOutcome::Success);
        assert_eq!(report.results[0].identifier, "A1");
        assert_eq!(report.results[1].identifier, "A2");
    }

    #[tokio::test]
    async fn test_http_dispatch_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wp/send"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let gateway = GatewayConfig {
            send_url: format!("{}/wp/send", server.uri()),
            client_id: "client-1".into(),
            request_timeout_ms: 2_000,
            auth: AuthConfig::default(),
        };
        let client = build_client(&gateway).unwrap();
        let transport = HttpTransport::new(
            client,
            &gateway,
            dispatcher::StaticTokenProvider::new("tok"),
        );
        let mut coordinator =
            DispatchCoordinator::new(transport, DispatchOptions::from_gateway(&gateway));

        let report = coordinator
            .dispatch(&dataset(), &bindings(), "Olá")
            .await
            .unwrap();
        assert_eq!(report.summary.fail_count, 2);
        assert_eq!(
            report.outcome,
            DispatchOutcome::Failed(FailureClass::UpstreamServerError)
        );
    }
}
