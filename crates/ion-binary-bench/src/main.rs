//! Benchmark for Ion binary encoding and cursor traversal.
//!
//! Converts a JSON dataset (or a synthetic one when no file is given) to
//! elements, encodes it, then measures materializing and streaming reads.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use ion_binary::{
    BinaryReader, Decimal, Element, Encoder, IonReader, IonType, Timestamp, decode_elements,
};
use serde::Serialize;
use serde_json::Value as Json;
use uuid::Uuid;

const DECODE_ITERS: u32 = 10;
const SYNTHETIC_RECORDS: usize = 100_000;

// =============================================================================
// JSON CONVERSION
// =============================================================================

fn json_to_element(json: &Json) -> Element {
    match json {
        Json::Null => Element::null(IonType::Null),
        Json::Bool(b) => Element::from(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Element::from(i),
            None => Element::from(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Element::from(s.as_str()),
        Json::Array(items) => Element::list(items.iter().map(json_to_element)),
        Json::Object(fields) => {
            Element::from_fields(fields.iter().map(|(k, v)| (k.as_str(), json_to_element(v))))
        }
    }
}

// =============================================================================
// SYNTHETIC DATA
// =============================================================================

fn synthetic_records(count: usize) -> Vec<Element> {
    let statuses = ["active", "pending", "archived"];
    (0..count)
        .map(|i| {
            let created = Timestamp::builder(2024)
                .month((i % 12) as u8 + 1)
                .day((i % 28) as u8 + 1)
                .hour_minute((i % 24) as u8, (i % 60) as u8)
                .second((i % 60) as u8)
                .offset(Some(0))
                .build()
                .expect("valid synthetic timestamp");
            Element::from_fields([
                ("id", Element::from(Uuid::now_v7().to_string())),
                ("seq", Element::from(i as i64)),
                ("status", Element::symbol(statuses[i % statuses.len()])),
                ("score", Element::from(Decimal::new(i as i64 % 10_000, -2))),
                ("ratio", Element::from(i as f64 / count as f64)),
                ("created", Element::from(created)),
                ("token", Element::blob(Uuid::new_v4().as_bytes().to_vec())),
                (
                    "tags",
                    Element::list([Element::symbol("bench"), Element::symbol(statuses[i % 2])]),
                ),
            ])
            .with_annotations(["record"])
        })
        .collect()
}

// =============================================================================
// TRAVERSAL
// =============================================================================

/// Visits every value, decoding scalars; returns the number of values.
fn traverse<R: IonReader>(reader: &mut R) -> usize {
    let mut count = 0;
    while let Some(ion_type) = reader.next().expect("Failed to read") {
        count += 1;
        if reader.is_null().expect("Failed to read") {
            continue;
        }
        match ion_type {
            IonType::List | IonType::SExp | IonType::Struct => {
                reader.step_in().expect("Failed to step in");
                count += traverse(reader);
                reader.step_out().expect("Failed to step out");
            }
            IonType::Int => {
                reader.int_value().expect("Failed to read int");
            }
            IonType::Float => {
                reader.f64_value().expect("Failed to read float");
            }
            IonType::Decimal => {
                reader.decimal_value().expect("Failed to read decimal");
            }
            IonType::Timestamp => {
                reader.timestamp_value().expect("Failed to read timestamp");
            }
            IonType::String => {
                reader.string_value().expect("Failed to read string");
            }
            IonType::Symbol => {
                reader.symbol_value().expect("Failed to read symbol");
            }
            IonType::Clob | IonType::Blob => {
                reader.lob_value().expect("Failed to read lob");
            }
            IonType::Bool => {
                reader.bool_value().expect("Failed to read bool");
            }
            IonType::Null => {}
        }
    }
    count
}

fn throughput(bytes: usize, time: Duration) -> f64 {
    (bytes as f64 / 1_000_000.0) / time.as_secs_f64()
}

#[derive(Debug, Serialize)]
struct Report {
    source: String,
    top_level_values: usize,
    total_values: usize,
    json_bytes: Option<usize>,
    encoded_bytes: usize,
    symbols: usize,
    encode_ms: f64,
    decode_tree_ms: f64,
    traverse_slice_ms: f64,
    traverse_stream_ms: f64,
}

fn main() {
    let data_path = std::env::args().nth(1);

    let (source, json_bytes, elements) = match &data_path {
        Some(path) => {
            println!("Loading JSON from: {}", path);
            let json_data = fs::read_to_string(path).expect("Failed to read JSON file");
            let parse_start = Instant::now();
            let json: Json = serde_json::from_str(&json_data).expect("Failed to parse JSON");
            println!("Parsed {} bytes in {:?}", json_data.len(), parse_start.elapsed());

            let elements = match &json {
                Json::Array(items) => items.iter().map(json_to_element).collect(),
                other => vec![json_to_element(other)],
            };
            (path.clone(), Some(json_data.len()), elements)
        }
        None => {
            println!("No input file; generating {} synthetic records", SYNTHETIC_RECORDS);
            (
                "synthetic".to_string(),
                None,
                synthetic_records(SYNTHETIC_RECORDS),
            )
        }
    };

    // Benchmark encoding
    let encode_start = Instant::now();
    let mut encoder = Encoder::new();
    for element in &elements {
        encoder.write_element(element).expect("Failed to encode");
    }
    let symbols = encoder.symbol_table().max_id();
    let encoded = encoder.finish().expect("Failed to encode");
    let encode_time = encode_start.elapsed();

    println!("\nEncode: {} bytes in {:?}", encoded.len(), encode_time);
    println!("  Throughput: {:.2} MB/s", throughput(encoded.len(), encode_time));
    println!("  Symbol table max_id: {}", symbols);

    // Benchmark materializing decode
    for _ in 0..3 {
        let _ = decode_elements(&encoded).expect("Failed to decode");
    }
    let decode_start = Instant::now();
    let mut decoded = Vec::new();
    for _ in 0..DECODE_ITERS {
        decoded = decode_elements(&encoded).expect("Failed to decode");
    }
    let decode_time = decode_start.elapsed() / DECODE_ITERS;
    assert_eq!(decoded.len(), elements.len());

    println!(
        "\nDecode to elements: {:?} (avg of {} iterations)",
        decode_time, DECODE_ITERS
    );
    println!("  Throughput: {:.2} MB/s", throughput(encoded.len(), decode_time));

    // Benchmark cursor traversal over a slice
    let traverse_start = Instant::now();
    let mut total_values = 0;
    for _ in 0..DECODE_ITERS {
        let mut reader = BinaryReader::from_slice(&encoded).expect("Failed to open reader");
        total_values = traverse(&mut reader);
    }
    let traverse_time = traverse_start.elapsed() / DECODE_ITERS;

    println!(
        "\nTraverse (slice): {:?} (avg of {} iterations), {} values",
        traverse_time, DECODE_ITERS, total_values
    );
    println!("  Throughput: {:.2} MB/s", throughput(encoded.len(), traverse_time));

    // Benchmark cursor traversal over a stream
    let stream_start = Instant::now();
    for _ in 0..DECODE_ITERS {
        let mut reader = BinaryReader::from_reader(encoded.as_slice()).expect("Failed to open reader");
        assert_eq!(traverse(&mut reader), total_values);
    }
    let stream_time = stream_start.elapsed() / DECODE_ITERS;

    println!(
        "\nTraverse (stream): {:?} (avg of {} iterations)",
        stream_time, DECODE_ITERS
    );
    println!("  Throughput: {:.2} MB/s", throughput(encoded.len(), stream_time));

    // Write output file next to the input
    if let Some(path) = &data_path {
        let input_path = Path::new(path);
        let stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
        let parent = input_path.parent().unwrap_or(Path::new("."));
        let output = parent.join(format!("{}.10n", stem));
        fs::write(&output, &encoded).expect("Failed to write .10n file");
        println!("\nWrote {}", output.display());
    }

    let report = Report {
        source,
        top_level_values: elements.len(),
        total_values,
        json_bytes,
        encoded_bytes: encoded.len(),
        symbols,
        encode_ms: encode_time.as_secs_f64() * 1000.0,
        decode_tree_ms: decode_time.as_secs_f64() * 1000.0,
        traverse_slice_ms: traverse_time.as_secs_f64() * 1000.0,
        traverse_stream_ms: stream_time.as_secs_f64() * 1000.0,
    };

    println!("\n=== Summary ===");
    if let Some(json_len) = json_bytes {
        println!(
            "Size vs JSON: {:.1}%",
            100.0 * encoded.len() as f64 / json_len as f64
        );
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&report).expect("Failed to serialize report")
    );
}
