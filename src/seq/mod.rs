// seq/mod.rs
//
// Thin FASTA/FASTQ adapter: the builder only needs a stream of sequence
// byte-strings per input file, so this module stops there rather than
// modeling headers, qualities, or any other record metadata.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::HibfError;

/// Reads every sequence record's bases (ignoring headers/qualities) from a
/// single FASTA or FASTQ file, auto-detecting gzip by extension and format
/// by the leading record character (`>` FASTA, `@` FASTQ).
pub fn read_sequences(path: &Path) -> Result<Vec<Vec<u8>>, HibfError> {
    let file = File::open(path).map_err(|e| HibfError::UnreadableSequence {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let is_gz = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    parse_records(reader).map_err(|e| HibfError::UnreadableSequence {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn parse_records(mut reader: Box<dyn BufRead>) -> std::io::Result<Vec<Vec<u8>>> {
    let mut first_line = String::new();
    if reader.read_line(&mut first_line)? == 0 {
        return Ok(Vec::new());
    }

    match first_line.trim_start().chars().next() {
        Some('>') => parse_fasta(reader, first_line),
        Some('@') => parse_fastq(reader, first_line),
        _ => Ok(Vec::new()),
    }
}

fn parse_fasta(reader: Box<dyn BufRead>, first_line: String) -> std::io::Result<Vec<Vec<u8>>> {
    let mut sequences = Vec::new();
    let mut current = Vec::new();
    let mut started = false;

    for line in std::iter::once(Ok(first_line)).chain(reader.lines()) {
        let line = line?;
        if line.starts_with('>') {
            if started {
                sequences.push(std::mem::take(&mut current));
            }
            started = true;
        } else {
            current.extend_from_slice(line.trim_end().as_bytes());
        }
    }
    if started {
        sequences.push(current);
    }
    Ok(sequences)
}

fn parse_fastq(reader: Box<dyn BufRead>, first_line: String) -> std::io::Result<Vec<Vec<u8>>> {
    let mut sequences = Vec::new();
    let mut lines = std::iter::once(Ok(first_line)).chain(reader.lines());

    loop {
        let header = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        if !header.starts_with('@') {
            break;
        }
        let seq = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let plus = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        if !plus.starts_with('+') {
            break;
        }
        let _quality = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        sequences.push(seq.trim_end().as_bytes().to_vec());
    }
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str, ext: &str) -> tempfile::TempPath {
        let mut file = tempfile::Builder::new()
            .suffix(ext)
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.into_temp_path()
    }

    #[test]
    fn reads_fasta_multi_line_sequence() {
        let path = write_temp(">seq1\nACGT\nACGT\n>seq2\nGGGG\n", ".fa");
        let records = read_sequences(&path).unwrap();
        assert_eq!(records, vec![b"ACGTACGT".to_vec(), b"GGGG".to_vec()]);
    }

    #[test]
    fn reads_fastq_records() {
        let path = write_temp("@r1\nACGT\n+\nIIII\n@r2\nTTTT\n+\nIIII\n", ".fq");
        let records = read_sequences(&path).unwrap();
        assert_eq!(records, vec![b"ACGT".to_vec(), b"TTTT".to_vec()]);
    }

    #[test]
    fn missing_file_is_unreadable_sequence_error() {
        let result = read_sequences(Path::new("/no/such/file.fa"));
        assert!(matches!(result, Err(HibfError::UnreadableSequence { .. })));
    }
}
