//! Tests for the breach-scout-cli library module.

use super::*;

#[test]
fn test_cli_parsing() {
    // Test basic command parsing
    let cli = Cli::try_parse_from(["breach-scout", "health", "--deep"]);
    assert!(cli.is_ok());

    let cli = cli.unwrap();
    match cli.command {
        Commands::Health { deep, .. } => assert!(deep),
        _ => panic!("Expected Health command"),
    }
}

#[test]
fn test_search_parsing_with_options() {
    let cli = Cli::try_parse_from([
        "breach-scout",
        "search",
        "alice@example.com",
        "--limit",
        "25",
        "--format",
        "json",
    ])
    .unwrap();

    match cli.command {
        Commands::Search {
            query,
            limit,
            format,
        } => {
            assert_eq!(query, "alice@example.com");
            assert_eq!(limit, Some(25));
            assert_eq!(format, OutputFormat::Json);
        }
        _ => panic!("Expected Search command"),
    }
}

#[test]
fn test_endpoint_joining_strips_trailing_slash() {
    let client = ServiceClient::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();

    assert_eq!(client.endpoint("/health"), "http://localhost:8080/health");
}

#[test]
fn test_service_rejection_prefers_message_field() {
    let error = service_rejection(
        503,
        json!({
            "error": "Service Unavailable",
            "message": "provider unreachable",
            "status": 503
        }),
    );

    match error {
        CliError::ServiceRejected { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "provider unreachable");
        }
        _ => panic!("Expected ServiceRejected"),
    }
}

#[test]
fn test_service_rejection_falls_back_to_error_field() {
    let error = service_rejection(502, json!({ "error": "bad gateway" }));

    match error {
        CliError::ServiceRejected { message, .. } => assert_eq!(message, "bad gateway"),
        _ => panic!("Expected ServiceRejected"),
    }
}

#[test]
fn test_search_text_lists_sources() {
    let body = json!({
        "success": true,
        "searchId": "01ARZ3NDEKTSV4RRFFQ69G5FAV",
        "query": "alice@example.com",
        "resultCount": 1,
        "results": [{
            "sourceName": "Collection One",
            "matchedField": "email",
            "content": "email: alice@example.com\npassword: hunter2\n"
        }]
    });

    let rendered = search_text(&body);

    assert!(rendered.contains("Found 1 result(s) for alice@example.com"));
    assert!(rendered.contains("[1] Collection One"));
    assert!(rendered.contains("Matched field: email"));
    assert!(rendered.contains("    password: hunter2"));
    assert!(rendered.contains("Search ID: 01ARZ3NDEKTSV4RRFFQ69G5FAV"));
}

#[test]
fn test_stats_text() {
    let body = json!({ "totalSearches": 4, "totalResults": 9 });

    assert_eq!(stats_text(&body), "Total searches: 4\nTotal results: 9");
}

#[test]
fn test_health_text_shows_failed_checks() {
    let body = json!({
        "status": "degraded",
        "version": "0.1.0",
        "checks": {
            "report_store": {
                "healthy": false,
                "message": "Report store check failed: permission denied",
                "duration_ms": 3
            }
        }
    });

    let rendered = health_text(&body);

    assert!(rendered.contains("Status: degraded (version 0.1.0)"));
    assert!(rendered.contains("report_store: failed (3 ms)"));
    assert!(rendered.contains("permission denied"));
}
