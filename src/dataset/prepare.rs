// src/dataset/prepare.rs
//! Raw corpus exports to prepared `ID,Description` corpora.

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use serde_json::Value;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::io::write_prepared;
use super::Dataset;
use crate::models::Document;
use crate::text::Normalizer;

/// Metadata rows at the top of the CVE list export (column header included).
const CVE_PREAMBLE_ROWS: usize = 10;
const RESERVED_PREFIX: &str = "** RESERVED **";
const VHP_TEST_RECORD: &str = "This-is-a-Test";
const MISTAKES_ANSWER_MARKER: &str = "\nanswer: |";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareStats {
    pub rows_read: usize,
    pub written: usize,
    pub skipped_empty: usize,
    pub skipped_reserved: usize,
    pub skipped_test: usize,
}

fn field<'a>(record: &'a csv::StringRecord, index: usize, row: usize) -> Result<&'a str> {
    record
        .get(index)
        .ok_or_else(|| anyhow!("Row {} has no column {}", row, index))
}

fn raw_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input)
}

pub fn prepare_cve<R: Read>(input: R, normalizer: &Normalizer) -> Result<(Vec<Document>, PrepareStats)> {
    let mut stats = PrepareStats::default();
    let mut documents = Vec::new();
    for (row, result) in raw_reader(input).records().enumerate() {
        let record = result.with_context(|| format!("Malformed CVE row {}", row + 1))?;
        if row < CVE_PREAMBLE_ROWS {
            continue;
        }
        stats.rows_read += 1;

        let id = field(&record, 0, row + 1)?;
        let raw = field(&record, 2, row + 1)?;
        if raw.trim_start().starts_with(RESERVED_PREFIX) {
            stats.skipped_reserved += 1;
            continue;
        }
        let description = normalizer.normalize(raw);
        if description.trim().is_empty() {
            stats.skipped_empty += 1;
            continue;
        }
        documents.push(Document::new(id, description));
    }
    stats.written = documents.len();
    Ok((documents, stats))
}

/// Extracts the "mistakes made" answer from a VHP notes JSON document.
pub fn mistakes_made(notes: &str) -> Result<String> {
    let notes: Value = serde_json::from_str(notes).context("Notes column is not valid JSON")?;
    let mistakes = notes
        .get("mistakes")
        .ok_or_else(|| anyhow!("Notes have no 'mistakes' entry"))?;
    match mistakes {
        Value::Null => Ok(String::new()),
        Value::Object(map) => match map.get("answer") {
            Some(Value::String(answer)) => Ok(answer.clone()),
            Some(Value::Null) => Ok(String::new()),
            Some(other) => bail!("Unexpected 'answer' value: {}", other),
            None => bail!("'mistakes' object has no 'answer' key"),
        },
        Value::String(text) => text
            .split(MISTAKES_ANSWER_MARKER)
            .nth(1)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("'mistakes' text has no answer section")),
        other => bail!("Unexpected 'mistakes' value: {}", other),
    }
}

pub fn prepare_vhp<R: Read>(input: R, normalizer: &Normalizer) -> Result<(Vec<Document>, PrepareStats)> {
    let mut stats = PrepareStats::default();
    let mut documents = Vec::new();
    for (row, result) in raw_reader(input).records().enumerate() {
        let record = result.with_context(|| format!("Malformed VHP row {}", row + 1))?;
        if row == 0 {
            continue;
        }
        stats.rows_read += 1;

        let id = field(&record, 1, row + 1)?;
        let mistakes = mistakes_made(field(&record, 8, row + 1)?)
            .with_context(|| format!("Invalid notes for VHP record {}", id))?;
        let raw = format!("{} {}", field(&record, 4, row + 1)?, mistakes);
        let description = normalizer.normalize(&raw);
        if description.trim().is_empty() {
            stats.skipped_empty += 1;
            continue;
        }
        if id == VHP_TEST_RECORD {
            stats.skipped_test += 1;
            continue;
        }
        documents.push(Document::new(id, description));
    }
    stats.written = documents.len();
    Ok((documents, stats))
}

/// Prepares `raw` into `prepared` for the given corpus.
pub fn prepare_dataset(
    dataset: Dataset,
    raw: &Path,
    prepared: &Path,
    normalizer: &Normalizer,
) -> Result<PrepareStats> {
    info!("PREPARING: {}", raw.display());
    let file = File::open(raw).with_context(|| format!("Failed to open {}", raw.display()))?;
    let (documents, stats) = match dataset {
        Dataset::Cve => prepare_cve(file, normalizer)?,
        Dataset::Vhp => prepare_vhp(file, normalizer)?,
    };
    write_prepared(prepared, &documents)?;
    debug!("Prepare stats for {}: {:?}", dataset, stats);
    info!(
        "PREPARED {} descriptions: {} ({} empty, {} reserved, {} test records skipped)",
        stats.written,
        prepared.display(),
        stats.skipped_empty,
        stats.skipped_reserved,
        stats.skipped_test
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cve_export(rows: &[&str]) -> String {
        let mut text = String::new();
        text.push_str("CVE Version 20061101\n");
        for i in 1..CVE_PREAMBLE_ROWS {
            text.push_str(&format!("meta {},,,,,\n", i));
        }
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_prepare_cve() {
        let input = cve_export(&[
            "CVE-1999-0001,Entry,\"Version 1.2.3 allowed remote attacker to crash the system\",refs",
            "CVE-1999-0002,Candidate,\"** RESERVED ** This candidate has been reserved.\",",
            "CVE-1999-0003,Entry,\"The to of\",",
            "CVE-1999-0004,Entry,\"Heap overflow, in parser\",",
        ]);
        let (documents, stats) = prepare_cve(input.as_bytes(), &Normalizer::default()).unwrap();
        assert_eq!(
            documents,
            vec![
                Document::new("CVE-1999-0001", "version VERVER allowed remote attacker crash system"),
                Document::new("CVE-1999-0004", "heap overflow parser"),
            ]
        );
        assert_eq!(stats.rows_read, 4);
        assert_eq!(stats.skipped_reserved, 1);
        assert_eq!(stats.skipped_empty, 1);
    }

    #[test]
    fn test_cve_row_without_description_is_fatal() {
        let input = cve_export(&["CVE-1999-0001,Entry"]);
        assert!(prepare_cve(input.as_bytes(), &Normalizer::default()).is_err());
    }

    #[test]
    fn test_mistakes_made_shapes() {
        assert_eq!(
            mistakes_made(r#"{"mistakes": {"answer": "Missed bounds check"}}"#).unwrap(),
            "Missed bounds check"
        );
        assert_eq!(
            mistakes_made(r#"{"mistakes": "question: |\n  What went wrong?\nanswer: |\n  Unchecked length"}"#)
                .unwrap(),
            "\n  Unchecked length"
        );
        assert_eq!(mistakes_made(r#"{"mistakes": null}"#).unwrap(), "");
        assert!(mistakes_made(r#"{"other": 1}"#).is_err());
        assert!(mistakes_made("not json").is_err());
    }

    #[test]
    fn test_prepare_vhp() {
        let header = "a,id,b,c,description,d,e,f,notes";
        let row1 = r#"x,CVE-2014-0160,,,"Heartbleed reads 64 bytes",,,,"{""mistakes"": {""answer"": ""No length check""}}""#;
        let row2 = r#"x,This-is-a-Test,,,"test entry",,,,"{""mistakes"": null}""#;
        let row3 = r#"x,CVE-2000-0001,,,"the",,,,"{""mistakes"": null}""#;
        let input = format!("{}\n{}\n{}\n{}\n", header, row1, row2, row3);

        let (documents, stats) = prepare_vhp(input.as_bytes(), &Normalizer::default()).unwrap();
        assert_eq!(
            documents,
            vec![Document::new(
                "CVE-2014-0160",
                "heartbleed reads NUMNUM bytes length check"
            )]
        );
        assert_eq!(stats.skipped_test, 1);
        assert_eq!(stats.skipped_empty, 1);
    }

    #[test]
    fn test_prepare_dataset_writes_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("cve.csv");
        let prepared = dir.path().join("cve_prepared.csv");
        std::fs::write(&raw, cve_export(&["CVE-1,Entry,\"SQL injection in login\","])).unwrap();

        let stats = prepare_dataset(Dataset::Cve, &raw, &prepared, &Normalizer::default()).unwrap();
        assert_eq!(stats.written, 1);
        let text = std::fs::read_to_string(&prepared).unwrap();
        assert_eq!(text, "ID,Description\nCVE-1,sql injection login\n");
    }
}
