use cardlog_core::{ExportFormat, NormalizeOptions, normalize, write_csv_file};
use cardlog_ingest::{ManualFeed, TransactionSource};

const SAVED_RESPONSE: &str = r#"{
  "creditCardTransactions": [
    {"description": "COFFEE SHOP", "amount": 4.50, "transactionDate": "2024-01-02", "postedDate": "2024-01-03"},
    {"description": "ONLINE PAYMENT THANK YOU", "amount": -100.00, "transactionDate": "2024-01-03"},
    {"description": "GROCERY", "amount": 32.10, "transactionDate": "2024-01-01"}
  ],
  "nextKey": null
}"#;

/// Saved response on disk through to both ledger formats.
#[tokio::test]
async fn test_saved_response_to_text_and_csv() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("posted-transactions.json");
    std::fs::write(&json_path, SAVED_RESPONSE).unwrap();

    let payload = ManualFeed::from_file(&json_path).fetch().await.unwrap();
    let txns = normalize(&payload, NormalizeOptions::manual_feed());

    let mut text = Vec::new();
    ExportFormat::Text.render(&mut text, &txns).unwrap();
    assert_eq!(
        String::from_utf8(text).unwrap(),
        "2024-01-02,-4.5,COFFEE SHOP\n2024-01-01,-32.1,GROCERY\n"
    );

    let csv_path = dir.path().join("output.csv");
    write_csv_file(&csv_path, &txns).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(
        csv.lines().collect::<Vec<_>>(),
        vec![
            "date,payment,cost,category,payee",
            "2024-01-02,FNBO Card,-4.5,,COFFEE SHOP",
            "2024-01-01,FNBO Card,-32.1,,GROCERY",
        ]
    );
}

#[tokio::test]
async fn test_empty_history_gives_header_only_csv() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("empty.json");
    std::fs::write(&json_path, r#"{"creditCardTransactions": []}"#).unwrap();

    let payload = ManualFeed::from_file(&json_path).fetch().await.unwrap();
    let txns = normalize(&payload, NormalizeOptions::live_capture());

    let csv_path = dir.path().join("output.csv");
    write_csv_file(&csv_path, &txns).unwrap();
    assert_eq!(
        std::fs::read_to_string(&csv_path).unwrap(),
        "date,payment,cost,category,payee\r\n"
    );
}
