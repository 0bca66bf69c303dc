use crate::model::metadata::MetadataRecord;

/// Parses module info text into ordered pairs.
///
/// Lines are trimmed and blank ones skipped. The key ends at the first `=`;
/// the rest of the line is the value, further `=` included. A line without
/// `=` becomes a key with an empty value.
pub fn parse(text: &str) -> MetadataRecord {
    let mut record = MetadataRecord::new();

    for line in text.lines() {
        let logical = line.trim();
        if logical.is_empty() {
            continue;
        }

        match logical.split_once('=') {
            Some((key, value)) => record.push(key, value),
            None => record.push(logical, ""),
        }
    }

    record
}

/// One `key=value` line per pair, each terminated by CRLF.
pub fn serialize(record: &MetadataRecord) -> String {
    let mut out = String::new();
    for (key, value) in record.pairs() {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push_str("\r\n");
    }
    out
}
