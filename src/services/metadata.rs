use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{LocalizeError, Result, TransformError};
use crate::model::diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::model::metadata::MetadataRecord;
use crate::parsers::module_info;
use crate::services::encoding::{self, DecodedText};
use crate::services::transform::ScalarTransform;

pub const ENG_MARKER: &str = "Eng";

const LANGUAGES: &str = "Languages";
const SECTION: &str = "Section";
const TRANSLATED_KEYS: [&str; 2] = ["SmallDescription", "FullDescription"];

/// Adds the English fields to a module info record.
///
/// Returns the record untouched when `Languages` already lists `Eng` and
/// `rewrite` is off. Otherwise every `*Eng` pair is dropped and regenerated:
/// descriptions go through `f` one line at a time, `SectionEng` gets
/// `location`. New pairs are appended after the kept ones, in file order.
pub fn rewrite(
    record: &MetadataRecord,
    location: &str,
    f: &mut dyn ScalarTransform,
    rewrite: bool,
) -> std::result::Result<MetadataRecord, TransformError> {
    let has_eng = record
        .pairs()
        .iter()
        .any(|(k, v)| k == LANGUAGES && v.contains(ENG_MARKER));
    if has_eng {
        if !rewrite {
            return Ok(record.clone());
        }
        info!("English translation already present in module info, regenerating it");
    }

    let mut kept = MetadataRecord::new();
    let mut added: Vec<(String, String)> = Vec::new();

    for (key, value) in record.pairs() {
        if key.ends_with(ENG_MARKER) {
            debug!(key = key.as_str(), "dropping previous translation");
            continue;
        }

        if key == LANGUAGES && !value.contains(ENG_MARKER) {
            kept.push(key.as_str(), format!("{value},{ENG_MARKER}"));
            continue;
        }

        if TRANSLATED_KEYS.contains(&key.as_str()) {
            added.push((format!("{key}{ENG_MARKER}"), f.transform(value)?));
        } else if key == SECTION {
            added.push((format!("{key}{ENG_MARKER}"), location.to_string()));
        }

        kept.push(key.as_str(), value.as_str());
    }

    for (key, value) in added {
        kept.push(key, value);
    }

    Ok(kept)
}

/// Reads and parses a module info file, reporting a shaky encoding guess.
pub fn read_file(path: &Path, sink: &dyn DiagnosticSink) -> Result<(MetadataRecord, DecodedText)> {
    let bytes = fs::read(path).map_err(|e| LocalizeError::io(path, e))?;
    let decoded = encoding::decode(&bytes);

    debug!(
        path = %path.display(),
        encoding = decoded.encoding_name(),
        confidence = decoded.confidence,
        "module info decoded"
    );

    if decoded.is_low_confidence() {
        sink.emit(
            Diagnostic::new(
                DiagnosticKind::LowConfidenceEncoding,
                format!(
                    "detected {} with confidence {:.2}",
                    decoded.encoding_name(),
                    decoded.confidence
                ),
            )
            .with_path(path),
        );
    }

    let record = module_info::parse(&decoded.text);
    Ok((record, decoded))
}

/// Writes `record` in the encoding described by `like`.
pub fn write_file(path: &Path, record: &MetadataRecord, like: &DecodedText) -> Result<()> {
    let text = module_info::serialize(record);
    let bytes = encoding::encode(&text, like.encoding, like.bom);
    fs::write(path, bytes).map_err(|e| LocalizeError::io(path, e))
}

/// Read, [`rewrite`], write back.
pub fn rewrite_file(
    path: &Path,
    location: &str,
    f: &mut dyn ScalarTransform,
    rewrite_existing: bool,
    sink: &dyn DiagnosticSink,
) -> Result<()> {
    let (record, decoded) = read_file(path, sink)?;
    let out = rewrite(&record, location, f, rewrite_existing)?;
    write_file(path, &out, &decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(s: &str) -> std::result::Result<String, TransformError> {
        Ok(s.to_uppercase())
    }

    fn sample() -> MetadataRecord {
        vec![
            ("Name", "TestMod"),
            ("Section", "TestSection"),
            ("Languages", "Rus"),
            ("SmallDescription", "small"),
            ("FullDescription", "line1"),
            ("FullDescription", "line2"),
        ]
        .into_iter()
        .collect()
    }

    fn as_pairs(r: &MetadataRecord) -> Vec<(&str, &str)> {
        r.pairs().iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn adds_english_fields_after_kept_pairs() {
        let out = rewrite(&sample(), "ModSection", &mut upper, false).unwrap();

        assert_eq!(
            as_pairs(&out),
            vec![
                ("Name", "TestMod"),
                ("Section", "TestSection"),
                ("Languages", "Rus,Eng"),
                ("SmallDescription", "small"),
                ("FullDescription", "line1"),
                ("FullDescription", "line2"),
                ("SectionEng", "ModSection"),
                ("SmallDescriptionEng", "SMALL"),
                ("FullDescriptionEng", "LINE1"),
                ("FullDescriptionEng", "LINE2"),
            ]
        );
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let once = rewrite(&sample(), "ModSection", &mut upper, false).unwrap();
        let mut calls = 0;
        let mut counting = |s: &str| {
            calls += 1;
            Ok::<_, TransformError>(s.to_uppercase())
        };
        let twice = rewrite(&once, "ModSection", &mut counting, false).unwrap();

        assert_eq!(once, twice);
        assert_eq!(calls, 0);
    }

    #[test]
    fn rewrite_flag_regenerates_without_duplicates() {
        let once = rewrite(&sample(), "ModSection", &mut upper, false).unwrap();
        let mut lower = |s: &str| Ok::<_, TransformError>(s.to_lowercase());
        let again = rewrite(&once, "Other", &mut lower, true).unwrap();

        assert_eq!(again.values("Languages").collect::<Vec<_>>(), vec!["Rus,Eng"]);
        assert_eq!(again.values("SectionEng").collect::<Vec<_>>(), vec!["Other"]);
        assert_eq!(
            again.values("FullDescriptionEng").collect::<Vec<_>>(),
            vec!["line1", "line2"]
        );
        assert_eq!(again.len(), once.len());
    }

    #[test]
    fn transform_failure_propagates() {
        let mut failing =
            |_: &str| Err::<String, _>(TransformError::Rejected("no".into()));
        assert!(rewrite(&sample(), "S", &mut failing, false).is_err());
    }

    #[test]
    fn record_without_known_keys_only_passes_through() {
        let record: MetadataRecord = vec![("Author", "a"), ("Priority", "2")].into_iter().collect();
        let out = rewrite(&record, "S", &mut upper, false).unwrap();
        assert_eq!(out, record);
    }

    #[test]
    fn shaky_encoding_is_reported_and_file_still_rewritten() {
        use crate::model::diagnostic::CollectingSink;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ModuleInfo.txt");
        fs::write(&path, b"\xEF\xBB\xBFSection=S\xFF\r\nSmallDescription=small\r\n").unwrap();

        let sink = CollectingSink::new();
        rewrite_file(&path, "Cat", &mut upper, false, &sink).unwrap();

        assert_eq!(sink.count(DiagnosticKind::LowConfidenceEncoding), 1);
        let (record, decoded) = read_file(&path, &CollectingSink::new()).unwrap();
        assert!(decoded.bom);
        assert_eq!(record.first("SectionEng"), Some("Cat"));
        assert_eq!(record.first("SmallDescriptionEng"), Some("SMALL"));
    }
}
