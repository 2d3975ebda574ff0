//! Row-by-row reading of delimited text.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use conduit_core::{Container, Result, Value};
use csv::{ReaderBuilder, StringRecord};

use super::csv_error;
use super::dialect::UTF8_BOM;
use crate::core::Position;

/// Open read handle over one delimited file.
pub(crate) struct DelimitedReader {
    reader: csv::Reader<File>,
    headers: Vec<String>,
    row: StringRecord,
    bom_len: u64,
    file_size: u64,
    consumed_any: bool,
}

impl DelimitedReader {
    /// Opens `path`, skips a leading byte-order mark and reads the header row.
    pub(crate) fn open(path: &Path, delimiter: u8) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        let mut prefix = [0u8; 3];
        let read = read_prefix(&mut file, &mut prefix)?;
        let bom_len = if read == UTF8_BOM.len() && &prefix == UTF8_BOM {
            UTF8_BOM.len() as u64
        } else {
            file.seek(SeekFrom::Start(0))?;
            0
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_owned)
            .collect();

        Ok(Self {
            reader,
            headers,
            row: StringRecord::new(),
            bom_len,
            file_size,
            consumed_any: false,
        })
    }

    /// Reads the next row as a mapping keyed by the header names.
    ///
    /// Short rows fill the missing fields with null; extra cells are ignored.
    pub(crate) fn next_record(&mut self) -> Result<Option<Container>> {
        if !self.reader.read_record(&mut self.row).map_err(csv_error)? {
            return Ok(None);
        }

        self.consumed_any = true;
        let record = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, header)| (header.as_str(), Value::from(self.row.get(idx))))
            .collect();
        Ok(Some(record))
    }

    /// Bytes consumed, including the byte-order mark, over the file size.
    pub(crate) fn position(&self) -> Option<Position> {
        if !self.consumed_any {
            return None;
        }

        let consumed = self.bom_len + self.reader.position().byte();
        Some(Position::new(consumed, self.file_size))
    }
}

/// Reads up to `buf.len()` bytes, stopping early only at end of file.
fn read_prefix(file: &mut File, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn file_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_reads_rows_as_strings() {
        let file = file_with(b"name,legs\nCat,4\n");
        let mut reader = DelimitedReader::open(file.path(), b',').unwrap();

        let record = reader.next_record().unwrap().unwrap();
        assert_eq!(record["name"].as_str(), Some("Cat"));
        assert_eq!(record["legs"].as_str(), Some("4"));
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_short_rows_fill_with_null() {
        let file = file_with(b"a,b,c\n1\n1,2,3,4\n");
        let mut reader = DelimitedReader::open(file.path(), b',').unwrap();

        let short = reader.next_record().unwrap().unwrap();
        assert_eq!(short["a"].as_str(), Some("1"));
        assert!(short["c"].is_null());
        assert_eq!(short.len(), 3);

        let long = reader.next_record().unwrap().unwrap();
        assert_eq!(long.len(), 3);
        assert_eq!(long["c"].as_str(), Some("3"));
    }

    #[test]
    fn test_bom_is_skipped_and_counted() {
        let file = file_with(b"\xEF\xBB\xBFname\tlegs\nCat\t4\n");
        let mut reader = DelimitedReader::open(file.path(), b'\t').unwrap();

        assert_eq!(reader.position(), None);
        let record = reader.next_record().unwrap().unwrap();
        assert_eq!(record.keys().unwrap().collect::<Vec<_>>(), ["name", "legs"]);

        let position = reader.position().unwrap();
        assert_eq!(position.consumed, position.total);
    }

    #[test]
    fn test_empty_file_has_no_records() {
        let file = file_with(b"");
        let mut reader = DelimitedReader::open(file.path(), b',').unwrap();

        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.position(), None);
    }
}
