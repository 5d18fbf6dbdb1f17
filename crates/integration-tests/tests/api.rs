use indoc::indoc;
use integration_tests::TestServer;

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let server = TestServer::start("").await;

    let response = server.client.get("/health").await.unwrap();
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(serde_json::json!({"status": "healthy"}), body);
}

#[tokio::test]
async fn health_endpoint_can_be_disabled() {
    let config = indoc! {r#"
        [server.health]
        enabled = false
    "#};

    let server = TestServer::start(config).await;

    let response = server.client.get("/health").await.unwrap();
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn health_endpoint_path_is_configurable() {
    let config = indoc! {r#"
        [server.health]
        path = "/healthz"
    "#};

    let server = TestServer::start(config).await;

    assert_eq!(200, server.client.get("/healthz").await.unwrap().status().as_u16());
    assert_eq!(404, server.client.get("/health").await.unwrap().status().as_u16());
}

#[tokio::test]
async fn clock_date_returns_a_json_string() {
    let server = TestServer::start("").await;

    let response = server.client.get("/clock/date").await.unwrap();
    assert_eq!(200, response.status().as_u16());

    let body: String = response.json().await.unwrap();
    assert!(!body.is_empty());
}

#[tokio::test]
async fn clock_timestamp_returns_epoch_millis_as_a_string() {
    let server = TestServer::start("").await;

    let response = server.client.get("/clock/timestamp").await.unwrap();
    assert_eq!(200, response.status().as_u16());

    let body: String = response.json().await.unwrap();
    assert!(body.parse::<i64>().is_ok());
}

#[tokio::test]
async fn responses_are_unchanged_by_the_client_parameter() {
    let config = indoc! {r#"
        [tracking]
        mode = "log"
    "#};

    let server = TestServer::start(config).await;

    let response = server.client.get("/clock/date?client=alice").await.unwrap();
    assert_eq!(200, response.status().as_u16());

    let body: String = response.json().await.unwrap();
    assert!(!body.is_empty());
}

#[tokio::test]
async fn disabled_tracking_leaves_dispatch_intact() {
    let config = indoc! {r#"
        [tracking]
        mode = "ignore"
    "#};

    let server = TestServer::start(config).await;

    assert_eq!(200, server.client.get("/clock/date").await.unwrap().status().as_u16());
}

#[tokio::test]
async fn an_idle_server_renders_an_empty_report() {
    let server = TestServer::start("").await;

    let response = server.client.get("/stats").await.unwrap();
    assert_eq!(200, response.status().as_u16());

    let body = response.text().await.unwrap();

    insta::assert_snapshot!(body, @r#"
    <html>
    <head>
    <link rel="stylesheet" href="../assets/themes/blue/style.css" type="text/css" media="print, projection, screen" />
    <script src="https://code.jquery.com/jquery-1.9.1.min.js"></script>
    <script type="text/javascript" src="../assets/jquery.tablesorter.min.js"></script>
    </head>
    <body>
    <table id="metrics" class="tablesorter">
    <thead>
    <tr><th>group</th><th>api</th><th>duration unit</th><th>min</th><th>max</th><th>mean</th><th>std_dev</th><th>median</th><th>p75</th><th>p95</th><th>p98</th><th>p99</th><th>p999</th><th>rate unit</th><th>count</th><th>mean</th><th>m1</th><th>m5</th><th>m15</th></tr>
    </thead>
    <tbody>
    </tbody>
    </table>
    <script>
    $(document).ready(function() { $('#metrics').tablesorter({widgets: ['zebra'], sortList: [[4,1]]}); });
    </script>
    </body>
    </html>
    "#);
}

#[tokio::test]
async fn stats_lists_timed_routes() {
    let server = TestServer::start("").await;

    for _ in 0..3 {
        server.client.get("/clock/date").await.unwrap();
    }
    server.client.get("/clock/timestamp").await.unwrap();

    let response = server.client.get("/stats").await.unwrap();
    assert_eq!(200, response.status().as_u16());

    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));

    let body = response.text().await.unwrap();
    assert!(body.contains("<td>apitrack.resources</td><td>clock date</td>"));
    assert!(body.contains("<td>apitrack.resources</td><td>clock timestamp</td>"));
}

#[tokio::test]
async fn stats_omits_its_own_timing_group() {
    let server = TestServer::start("").await;

    server.client.get("/clock/date").await.unwrap();
    server.client.get("/stats").await.unwrap();

    let body = server.client.get("/stats").await.unwrap().text().await.unwrap();

    assert!(body.contains("<td>apitrack.resources</td><td>stats stats</td>"));
    assert!(!body.contains("apitrack.http.filter"));
}

#[tokio::test]
async fn stats_filters_groups_by_class_prefix() {
    let server = TestServer::start("").await;

    server.client.get("/clock/date").await.unwrap();

    let matching = server
        .client
        .get("/stats?class=apitrack.resources")
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(matching.contains("<td>clock date</td>"));

    let unrelated = server
        .client
        .get("/stats?class=com.example")
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!unrelated.contains("<td>clock date</td>"));
}

#[tokio::test]
async fn repeated_class_parameters_keep_the_first_value() {
    let server = TestServer::start("").await;

    server.client.get("/clock/date").await.unwrap();

    let response = server
        .client
        .get("/stats?class=apitrack.resources&class=com.example")
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());

    let body = response.text().await.unwrap();
    assert!(body.contains("<td>clock date</td>"));
}

#[tokio::test]
async fn stats_rejects_other_methods() {
    let server = TestServer::start("").await;

    let response = server.client.post("/stats").await.unwrap();
    assert_eq!(405, response.status().as_u16());
}

#[tokio::test]
async fn unmatched_routes_return_not_found() {
    let server = TestServer::start("").await;

    assert_eq!(404, server.client.get("/nope").await.unwrap().status().as_u16());
}

#[tokio::test]
async fn assets_are_served_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("style.css"), "body {}").unwrap();

    let config = format!("[server.assets]\ndir = \"{}\"\n", dir.path().display());
    let server = TestServer::start(&config).await;

    let response = server.client.get("/assets/style.css").await.unwrap();
    assert_eq!(200, response.status().as_u16());
    assert_eq!("body {}", response.text().await.unwrap());
}
