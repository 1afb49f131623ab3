use super::*;
use crate::report::verify_checksum;

fn sample_result(search_id: SearchId) -> NormalizedResult {
    NormalizedResult {
        search_id,
        source_name: "Collection A".to_string(),
        source_description: String::new(),
        matched_field: "email".to_string(),
        data_type_names: vec!["email".to_string()],
        content: "email: a@b.com\n".to_string(),
        breach_date: None,
    }
}

mod search_store_tests {
    use super::*;

    /// Test a created search can be fetched back
    #[tokio::test]
    async fn test_create_and_get_search() {
        let store = InMemorySearchStore::new();
        let record = SearchRecord::new("a@b.com", 100);

        store
            .create_search(&record)
            .await
            .expect("Create should succeed");

        let fetched = store
            .get_search(&record.id)
            .await
            .expect("Get should succeed")
            .expect("Record should exist");
        assert_eq!(fetched, record, "Fetched record should match");
        assert_eq!(fetched.result_count, 0, "New records start at zero results");
    }

    /// Test creating the same search twice fails
    #[tokio::test]
    async fn test_duplicate_create_fails() {
        let store = InMemorySearchStore::new();
        let record = SearchRecord::new("a@b.com", 100);

        store
            .create_search(&record)
            .await
            .expect("First create should succeed");
        let error = store
            .create_search(&record)
            .await
            .expect_err("Second create should fail");

        assert!(
            matches!(error, StoreError::Backend { .. }),
            "Duplicate create should be a backend error"
        );
    }

    /// Test fetching an unknown search returns None
    #[tokio::test]
    async fn test_get_unknown_search_returns_none() {
        let store = InMemorySearchStore::new();

        let fetched = store
            .get_search(&SearchId::new())
            .await
            .expect("Get should succeed");

        assert!(fetched.is_none(), "Unknown searches should yield None");
    }

    /// Test appended results come back in insertion order
    #[tokio::test]
    async fn test_append_and_fetch_results() {
        let store = InMemorySearchStore::new();
        let record = SearchRecord::new("a@b.com", 100);
        store
            .create_search(&record)
            .await
            .expect("Create should succeed");

        let mut first = sample_result(record.id);
        first.source_name = "Collection A".to_string();
        let mut second = sample_result(record.id);
        second.source_name = "Collection B".to_string();

        store
            .append_results(&record.id, &[first.clone(), second.clone()])
            .await
            .expect("Append should succeed");

        let results = store
            .results_for(&record.id)
            .await
            .expect("Fetch should succeed");
        assert_eq!(results, vec![first, second], "Order should be preserved");
    }

    /// Test appending to an unknown search fails
    #[tokio::test]
    async fn test_append_to_unknown_search_fails() {
        let store = InMemorySearchStore::new();
        let search_id = SearchId::new();

        let error = store
            .append_results(&search_id, &[sample_result(search_id)])
            .await
            .expect_err("Append should fail");

        assert!(
            matches!(error, StoreError::SearchNotFound { .. }),
            "Appending to a missing search should report it as not found"
        );
    }

    /// Test a search with no appended results yields an empty list
    #[tokio::test]
    async fn test_results_for_search_without_results() {
        let store = InMemorySearchStore::new();
        let record = SearchRecord::new("a@b.com", 100);
        store
            .create_search(&record)
            .await
            .expect("Create should succeed");

        let results = store
            .results_for(&record.id)
            .await
            .expect("Fetch should succeed");

        assert!(results.is_empty(), "No results should yield an empty list");
    }

    /// Test the result count can be finalized
    #[tokio::test]
    async fn test_set_result_count() {
        let store = InMemorySearchStore::new();
        let record = SearchRecord::new("a@b.com", 100);
        store
            .create_search(&record)
            .await
            .expect("Create should succeed");

        store
            .set_result_count(&record.id, 7)
            .await
            .expect("Set should succeed");

        let fetched = store
            .get_search(&record.id)
            .await
            .expect("Get should succeed")
            .expect("Record should exist");
        assert_eq!(fetched.result_count, 7, "Count should be updated");
    }

    /// Test setting a count on an unknown search fails
    #[tokio::test]
    async fn test_set_count_on_unknown_search_fails() {
        let store = InMemorySearchStore::new();

        let error = store
            .set_result_count(&SearchId::new(), 7)
            .await
            .expect_err("Set should fail");

        assert!(matches!(error, StoreError::SearchNotFound { .. }));
    }

    /// Test stats aggregate finalized counts across searches
    #[tokio::test]
    async fn test_stats_aggregate_counts() {
        let store = InMemorySearchStore::new();

        let first = SearchRecord::new("a@b.com", 100);
        store.create_search(&first).await.expect("Create");
        store
            .set_result_count(&first.id, 3)
            .await
            .expect("Set count");

        let second = SearchRecord::new("c@d.com", 100);
        store.create_search(&second).await.expect("Create");

        let stats = store.stats().await.expect("Stats should succeed");
        assert_eq!(stats.total_searches, 2, "Both searches should count");
        assert_eq!(
            stats.total_results, 3,
            "Unfinalized searches contribute zero results"
        );
    }
}

mod report_store_tests {
    use super::*;

    /// Test a stored report can be fetched back intact
    #[tokio::test]
    async fn test_store_and_get_report() {
        let store = InMemoryReportStore::new();
        let report_id = ReportId::new();
        let body = "Breach Search Report\nQuery: a@b.com\n";

        let metadata = store
            .store_report(&report_id, body)
            .await
            .expect("Store should succeed");

        assert_eq!(metadata.report_id, report_id);
        assert_eq!(metadata.size_bytes, body.len() as u64);
        assert_eq!(metadata.filename, report_id.to_filename());
        assert!(
            verify_checksum(&Bytes::from(body.to_string()), &metadata.checksum_sha256),
            "Checksum should cover the body"
        );

        let stored = store
            .get_report(&report_id)
            .await
            .expect("Get should succeed")
            .expect("Report should exist");
        assert_eq!(stored.body, body, "Body should round-trip");
        assert_eq!(stored.metadata, metadata, "Metadata should round-trip");
    }

    /// Test fetching an unknown report returns None
    #[tokio::test]
    async fn test_get_unknown_report_returns_none() {
        let store = InMemoryReportStore::new();

        let fetched = store
            .get_report(&ReportId::new())
            .await
            .expect("Get should succeed");

        assert!(fetched.is_none(), "Unknown reports should yield None");
    }

    /// Test the health check always passes for memory storage
    #[tokio::test]
    async fn test_health_check_passes() {
        let store = InMemoryReportStore::new();

        assert!(
            store.health_check().await.is_ok(),
            "Memory storage is always healthy"
        );
    }
}
