use std::io::Read;

use flate2::read::GzDecoder;

use battlelens_snapshot::decode::decompress;
use battlelens_snapshot::optimize::{
    optimize_snapshot, OptimizeOptions, DETAIL_FILE, INDEX_FILE, TABLE_FILE,
};
use battlelens_snapshot::parse_rows;
use battlelens_snapshot::testing::gzip;

fn read_gz_csv(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut text = String::new();
    GzDecoder::new(std::fs::File::open(path).unwrap())
        .read_to_string(&mut text)
        .unwrap();
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

fn snapshot(rows: usize) -> String {
    let mut csv = String::from(
        "prompt,model,model_1_name,model_2_name,model_1_response,property_description,evidence,unused\n",
    );
    for i in 0..rows {
        csv.push_str(&format!(
            "prompt {i},A,A,B,long answer {i},{},{},zzz\n",
            "d".repeat(600),
            "e".repeat(350)
        ));
    }
    csv
}

#[test]
fn writes_table_detail_and_index() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("full.csv.gz");
    std::fs::write(&input, gzip(snapshot(3).as_bytes())).unwrap();
    let out = dir.path().join("out");

    let report = optimize_snapshot(&input, &out, &OptimizeOptions::default()).unwrap();
    assert_eq!(report.index.total_rows, 3);
    assert_eq!(report.index.detail_rows, 3);
    assert!(report.index.row_id_mapping.is_none());

    let (headers, rows) = read_gz_csv(&out.join(TABLE_FILE));
    assert_eq!(
        headers,
        vec!["prompt", "model", "property_description", "evidence", "row_id"]
    );
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][2].len(), 500);
    assert_eq!(rows[0][3].len(), 300);
    assert_eq!(rows[2][4], "3");

    let (headers, rows) = read_gz_csv(&out.join(DETAIL_FILE));
    assert!(headers.contains(&"model_1_response".to_string()));
    assert!(headers.contains(&"model_2_name".to_string()));
    assert!(!headers.contains(&"unused".to_string()));
    let desc = headers.iter().position(|h| h == "property_description").unwrap();
    assert_eq!(rows[0][desc].len(), 600);

    let index: serde_json::Value =
        serde_json::from_slice(&std::fs::read(out.join(INDEX_FILE)).unwrap()).unwrap();
    assert_eq!(index["table_rows"], 3);
    assert!(index["row_id_mapping"].is_null());
    assert_eq!(index["available_columns"]["table"][0], "prompt");
}

#[test]
fn samples_detail_rows_past_limit() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("full.csv");
    std::fs::write(&input, snapshot(12)).unwrap();

    let options = OptimizeOptions {
        max_detail_rows: 5,
        sample_seed: 42,
    };
    let report = optimize_snapshot(&input, dir.path(), &options).unwrap();
    assert_eq!(report.index.table_rows, 12);
    assert_eq!(report.index.detail_rows, 5);

    let mapping = report.index.row_id_mapping.clone().unwrap();
    assert_eq!(mapping.len(), 5);
    assert!(mapping.windows(2).all(|w| w[0] < w[1]));

    let (headers, rows) = read_gz_csv(&report.detail_file);
    let id_col = headers.iter().position(|h| h == "row_id").unwrap();
    let ids: Vec<u64> = rows.iter().map(|r| r[id_col].parse().unwrap()).collect();
    assert_eq!(ids, mapping);
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = optimize_snapshot(
        &dir.path().join("nope.csv"),
        dir.path(),
        &OptimizeOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}

#[test]
fn row_ids_match_ingestion_when_properties_are_blank() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("full.csv");
    std::fs::write(
        &input,
        "prompt,model,property_description\np0,A,\np1,A,verbose\np2,B,terse\n",
    )
    .unwrap();

    let report = optimize_snapshot(&input, dir.path(), &OptimizeOptions::default()).unwrap();
    assert_eq!(report.index.table_rows, 2);
    assert_eq!(report.index.detail_rows, 2);

    let (headers, rows) = read_gz_csv(&report.table_file);
    let id_col = headers.iter().position(|h| h == "row_id").unwrap();
    let on_disk: Vec<(String, String)> = rows
        .iter()
        .map(|r| (r[id_col].clone(), r[0].clone()))
        .collect();

    let table = decompress(&std::fs::read(&report.table_file).unwrap()).unwrap();
    let ingested: Vec<(String, String)> = parse_rows(&table)
        .unwrap()
        .into_iter()
        .map(|r| (r.row_id.to_string(), r.prompt))
        .collect();

    assert_eq!(
        on_disk,
        vec![("1".to_string(), "p1".to_string()), ("2".to_string(), "p2".to_string())]
    );
    assert_eq!(on_disk, ingested);
}
