//! Row-by-row writing of delimited text.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use conduit_core::{Container, Result, Value};
use csv::WriterBuilder;

use super::csv_error;
use super::dialect::{TextEncoding, UTF8_BOM};

/// Open write handle over one delimited file.
///
/// The header row is written with the first non-empty record and fixes the
/// field order; fields first seen later are ignored. Empty records before the
/// header is fixed write nothing.
pub(crate) struct DelimitedWriter {
    writer: csv::Writer<File>,
    fields: Option<Vec<String>>,
}

impl DelimitedWriter {
    /// Creates `path`, and any missing parent directories.
    pub(crate) fn create(path: &Path, delimiter: u8, encoding: TextEncoding) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        if encoding.writes_bom() {
            file.write_all(UTF8_BOM)?;
        }

        let writer = WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(file);

        Ok(Self {
            writer,
            fields: None,
        })
    }

    /// Field order fixed by the first record, if any was written.
    pub(crate) fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    /// Writes one mapping-shaped record.
    pub(crate) fn write(&mut self, record: &Container) -> Result<()> {
        let mapping = record.as_mapping()?;

        if self.fields.is_none() {
            // An empty header would read back as a column named "".
            if mapping.is_empty() {
                return Ok(());
            }

            let fields: Vec<String> = mapping.keys().cloned().collect();
            self.writer.write_record(&fields).map_err(csv_error)?;
            self.fields = Some(fields);
        }

        let row = self
            .fields
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|field| mapping.get(field).map(cell_text).unwrap_or_default());
        self.writer.write_record(row).map_err(csv_error)
    }

    /// Flushes buffered rows to the file.
    pub(crate) fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Renders a value as cell text. Nested containers become compact JSON.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn record(value: serde_json::Value) -> Container {
        Container::try_from(value).unwrap()
    }

    #[test]
    fn test_header_on_first_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/out.csv");

        let mut writer = DelimitedWriter::create(&path, b',', TextEncoding::Utf8).unwrap();
        writer.write(&record(json!({"a": 1}))).unwrap();
        writer.write(&record(json!({"a": 2}))).unwrap();
        writer.write(&record(json!({"b": 5, "a": 3}))).unwrap();
        assert_eq!(writer.fields(), Some(&["a".to_owned()][..]));
        writer.finish().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\n1\n2\n3\n");
    }

    #[test]
    fn test_empty_first_record_does_not_fix_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");

        let mut writer = DelimitedWriter::create(&path, b',', TextEncoding::Utf8).unwrap();
        writer.write(&record(json!({}))).unwrap();
        assert_eq!(writer.fields(), None);

        writer.write(&record(json!({"a": 1}))).unwrap();
        writer.write(&record(json!({}))).unwrap();
        writer.finish().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\n1\n\"\"\n");
    }

    #[test]
    fn test_only_empty_records_leave_file_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");

        let mut writer = DelimitedWriter::create(&path, b',', TextEncoding::Utf8).unwrap();
        writer.write(&record(json!({}))).unwrap();
        writer.finish().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_cells_render_as_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tsv");

        let mut writer = DelimitedWriter::create(&path, b'\t', TextEncoding::Utf8).unwrap();
        writer
            .write(&record(json!({
                "name": "Cat",
                "legs": 4,
                "pet": true,
                "tags": {"colour": "tabby"},
                "owner": null,
            })))
            .unwrap();
        writer.write(&record(json!({"name": "Dog"}))).unwrap();
        writer.finish().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name\tlegs\tpet\ttags\towner");
        assert_eq!(lines[1], "Cat\t4\ttrue\t\"{\"\"colour\"\":\"\"tabby\"\"}\"\t");
        assert_eq!(lines[2], "Dog\t\t\t\t");
    }

    #[test]
    fn test_utf8_sig_writes_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");

        let mut writer = DelimitedWriter::create(&path, b',', TextEncoding::Utf8Sig).unwrap();
        writer.write(&record(json!({"a": "x"}))).unwrap();
        writer.finish().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"\xEF\xBB\xBFa\nx\n");
    }
}
