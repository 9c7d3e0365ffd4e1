//! Simple dumper to inspect Ion binary files.
//!
//! Prints one line per value with its byte span, field name and annotations.

use std::fs::File;
use std::io::BufReader;

use ion_binary::{BinaryReader, IonReader, IonType, SymbolToken};

fn format_token(token: &SymbolToken) -> String {
    match token.as_text() {
        Some(text) => text.to_string(),
        None => format!("${}", token.as_sid().unwrap_or(0)),
    }
}

fn format_scalar<R: IonReader>(reader: &R, ion_type: IonType) -> ion_binary::Result<String> {
    if reader.is_null()? {
        return Ok(format!("null.{}", ion_type));
    }
    Ok(match ion_type {
        IonType::Null => "null".to_string(),
        IonType::Bool => reader.bool_value()?.to_string(),
        IonType::Int => reader.int_value()?.to_string(),
        IonType::Float => format!("{:e}", reader.f64_value()?),
        IonType::Decimal => reader.decimal_value()?.to_string(),
        IonType::Timestamp => reader.timestamp_value()?.to_string(),
        IonType::String => {
            let value = reader.string_value()?;
            let preview: String = value.chars().take(80).collect();
            if value.chars().count() > 80 {
                format!("\"{}...\"", preview)
            } else {
                format!("\"{}\"", preview)
            }
        }
        IonType::Symbol => format_token(&reader.symbol_value()?),
        IonType::Clob => format!("CLOB[{}]", reader.lob_value()?.len()),
        IonType::Blob => format!("BLOB[{}]", reader.lob_value()?.len()),
        IonType::List | IonType::SExp | IonType::Struct => String::new(),
    })
}

fn dump<R: IonReader>(reader: &mut R) -> ion_binary::Result<usize> {
    let mut count = 0;
    while let Some(ion_type) = reader.next()? {
        count += 1;
        let span = reader.current_span()?;
        let indent = "  ".repeat(reader.depth());
        let mut line = format!("{:>10}..{:<10} {}", span.start, span.end, indent);
        if let Some(name) = reader.field_name()? {
            line.push_str(&format!("{}: ", format_token(&name)));
        }
        for annotation in reader.annotations()? {
            line.push_str(&format!("{}::", format_token(&annotation)));
        }

        if ion_type.is_container() && !reader.is_null()? {
            println!("{}{} ({} bytes)", line, ion_type, span.len());
            reader.step_in()?;
            count += dump(reader)?;
            reader.step_out()?;
        } else {
            println!("{}{}", line, format_scalar(reader, ion_type)?);
        }
    }
    Ok(count)
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/sample.10n".to_string());

    let file = File::open(&path).expect("Failed to open file");
    let mut reader = BinaryReader::from_reader(BufReader::new(file)).expect("Failed to open reader");

    match dump(&mut reader) {
        Ok(count) => println!("\n{} values in {}", count, path),
        Err(e) => {
            eprintln!("Error at offset {}: {}", reader.position(), e);
            std::process::exit(1);
        }
    }
}
