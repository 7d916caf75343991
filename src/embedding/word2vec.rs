// src/embedding/word2vec.rs
//! Loaders for the word2vec text (`.txt`/`.vec`) and binary (`.bin`) formats.
//!
//! Both formats start with a `vocab_size dimension` header line. Text rows are
//! `word v1 ... vD`; binary rows are the word, one space, then `D` little-endian `f32`s,
//! optionally followed by a newline.

use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use super::{EmbeddingLookup, WordVectors};

fn parse_header(line: &str) -> Result<(usize, usize)> {
    let mut fields = line.split_whitespace();
    let (Some(vocab), Some(dim), None) = (fields.next(), fields.next(), fields.next()) else {
        bail!("Malformed word2vec header: {:?}", line.trim_end());
    };
    let vocab: usize = vocab
        .parse()
        .with_context(|| format!("Invalid vocabulary size in header: {:?}", vocab))?;
    let dim: usize = dim
        .parse()
        .with_context(|| format!("Invalid dimension in header: {:?}", dim))?;
    if dim == 0 {
        bail!("word2vec header declares zero dimensions");
    }
    Ok((vocab, dim))
}

/// Picks the format from the extension: `.bin` is binary, anything else text.
pub fn load_model(path: &Path) -> Result<WordVectors> {
    let start = Instant::now();
    let binary = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("bin"));
    let file = File::open(path)
        .with_context(|| format!("Failed to open embedding model {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let vectors = if binary {
        read_binary(&mut reader)
    } else {
        read_text(&mut reader)
    }
    .with_context(|| format!("Failed to load embedding model {}", path.display()))?;

    info!(
        "🧠 Loaded {} word vectors ({} dimensions) from {} in {:.2?}",
        vectors.len(),
        vectors.dimension(),
        path.display(),
        start.elapsed()
    );
    Ok(vectors)
}

pub fn read_text<R: BufRead>(reader: &mut R) -> Result<WordVectors> {
    let mut lines = reader.lines();
    let header = lines
        .next()
        .context("Empty word2vec file")?
        .context("Failed to read word2vec header")?;
    let (vocab, dim) = parse_header(&header)?;
    let mut vectors = WordVectors::with_capacity(dim, vocab);

    let mut values = Vec::with_capacity(dim);
    let mut rows = 0;
    for (row, line) in lines.enumerate() {
        let line = line.with_context(|| format!("Failed to read word2vec row {}", row + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let word = fields.next().unwrap_or_default().to_string();
        values.clear();
        for field in fields {
            let value: f32 = field
                .parse()
                .with_context(|| format!("Invalid component {:?} for '{}'", field, word))?;
            values.push(value);
        }
        vectors.insert(word, &values)?;
        rows += 1;
    }

    if rows != vocab {
        bail!(
            "word2vec header declares {} words but {} were read",
            vocab,
            rows
        );
    }
    if vectors.len() < rows {
        debug!(
            "{} repeated words kept their first vector",
            rows - vectors.len()
        );
    }
    Ok(vectors)
}

pub fn read_binary<R: BufRead>(reader: &mut R) -> Result<WordVectors> {
    let mut header = String::new();
    reader
        .read_line(&mut header)
        .context("Failed to read word2vec header")?;
    let (vocab, dim) = parse_header(&header)?;
    let mut vectors = WordVectors::with_capacity(dim, vocab);

    let mut word_bytes = Vec::new();
    let mut raw = vec![0u8; dim * 4];
    let mut values = vec![0f32; dim];
    for row in 0..vocab {
        word_bytes.clear();
        reader
            .read_until(b' ', &mut word_bytes)
            .with_context(|| format!("Failed to read word {}", row))?;
        if word_bytes.last() != Some(&b' ') {
            bail!("Unexpected end of file at word {} of {}", row, vocab);
        }
        word_bytes.pop();
        // Rows written with a trailing newline leave it in front of the next word
        let start = word_bytes.iter().take_while(|b| **b == b'\n').count();
        let word = std::str::from_utf8(&word_bytes[start..])
            .with_context(|| format!("Word {} is not valid UTF-8", row))?
            .to_string();

        reader
            .read_exact(&mut raw)
            .with_context(|| format!("Truncated vector for '{}'", word))?;
        for (value, bytes) in values.iter_mut().zip(raw.chunks_exact(4)) {
            *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        vectors.insert(word, &values)?;
    }
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn binary_model(trailing_newline: bool) -> Vec<u8> {
        let mut bytes = b"2 3\n".to_vec();
        for (word, vector) in [("buffer", [1.0f32, 2.0, 3.0]), ("überlauf", [-1.0, 0.5, 0.0])] {
            bytes.extend_from_slice(word.as_bytes());
            bytes.push(b' ');
            for v in vector {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            if trailing_newline {
                bytes.push(b'\n');
            }
        }
        bytes
    }

    #[test]
    fn test_read_text() {
        let mut input = Cursor::new("2 3\nbuffer 1 2 3\noverflow 0.5 0 -1.25\n");
        let vectors = read_text(&mut input).unwrap();
        assert_eq!(vectors.dimension(), 3);
        assert_eq!(vectors.lookup("overflow"), Some(&[0.5f32, 0.0, -1.25][..]));
    }

    #[test]
    fn test_repeated_word_keeps_first_vector() {
        let mut input = Cursor::new("3 2\nbuffer 1 2\noverflow 3 4\nbuffer 5 6\n");
        let vectors = read_text(&mut input).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.lookup("buffer"), Some(&[1.0f32, 2.0][..]));
    }

    #[test]
    fn test_text_rejects_short_rows_and_bad_headers() {
        assert!(read_text(&mut Cursor::new("1 3\nbuffer 1 2\n")).is_err());
        assert!(read_text(&mut Cursor::new("three 3\nbuffer 1 2 3\n")).is_err());
        assert!(read_text(&mut Cursor::new("2 3\nbuffer 1 2 3\n")).is_err());
        assert!(read_text(&mut Cursor::new("")).is_err());
    }

    #[test]
    fn test_read_binary_with_and_without_newlines() {
        for trailing_newline in [false, true] {
            let vectors = read_binary(&mut Cursor::new(binary_model(trailing_newline))).unwrap();
            assert_eq!(vectors.len(), 2);
            assert_eq!(vectors.lookup("buffer"), Some(&[1.0f32, 2.0, 3.0][..]));
            assert_eq!(vectors.lookup("überlauf"), Some(&[-1.0f32, 0.5, 0.0][..]));
        }
    }

    #[test]
    fn test_truncated_binary_fails() {
        let mut bytes = binary_model(false);
        bytes.truncate(bytes.len() - 2);
        assert!(read_binary(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_load_model_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let bin_path = dir.path().join("w2v_cve_100.bin");
        std::fs::write(&bin_path, binary_model(true)).unwrap();
        assert_eq!(load_model(&bin_path).unwrap().len(), 2);

        let txt_path = dir.path().join("w2v_cve_100.txt");
        let mut file = File::create(&txt_path).unwrap();
        writeln!(file, "1 2").unwrap();
        writeln!(file, "xss 0.25 0.75").unwrap();
        drop(file);
        let vectors = load_model(&txt_path).unwrap();
        assert_eq!(vectors.lookup("xss"), Some(&[0.25f32, 0.75][..]));
    }
}
