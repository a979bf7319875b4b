// ============================================================
// Layer 4 - Dataset Loader
// ============================================================
// Reads the support dataset from a CSV file with a header row.
//
// Required columns (any order, extra columns ignored):
//   questions - the customer question
//   answers   - the canned answer text
//   labels    - the answer label
//
// A missing column or an empty cell is a DataFormat error that
// names the offending column and the 1-based data row.
//
// Example:
//   questions,answers,labels
//   What is the interest rate?,12%,rate

use std::{fs::File, io::Read, path::{Path, PathBuf}};

use csv::{ReaderBuilder, StringRecord};

use crate::domain::error::{ChatbotError, ChatbotResult};
use crate::domain::question_record::QuestionRecord;
use crate::domain::traits::RecordSource;

pub const QUESTIONS_COLUMN: &str = "questions";
pub const ANSWERS_COLUMN:   &str = "answers";
pub const LABELS_COLUMN:    &str = "labels";

/// Loads question records from a CSV file.
pub struct CsvRecordLoader {
    path: PathBuf,
}

impl CsvRecordLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Parse records from any reader. Used for files and for
    /// in-memory tables alike.
    pub fn from_reader<R: Read>(reader: R) -> ChatbotResult<Vec<QuestionRecord>> {
        let mut csv = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers = csv
            .headers()
            .map_err(|e| ChatbotError::DataFormat(format!("cannot read header row: {e}")))?
            .clone();

        let q_col = column_index(&headers, QUESTIONS_COLUMN)?;
        let a_col = column_index(&headers, ANSWERS_COLUMN)?;
        let l_col = column_index(&headers, LABELS_COLUMN)?;

        let mut records = Vec::new();
        for (row, result) in csv.records().enumerate() {
            let row = row + 1;
            let record = result
                .map_err(|e| ChatbotError::DataFormat(format!("row {row}: {e}")))?;

            records.push(QuestionRecord::new(
                cell(&record, q_col, QUESTIONS_COLUMN, row)?,
                cell(&record, l_col, LABELS_COLUMN, row)?,
                cell(&record, a_col, ANSWERS_COLUMN, row)?,
            ));
        }

        if records.is_empty() {
            return Err(ChatbotError::DataFormat("dataset has no rows".to_string()));
        }
        Ok(records)
    }
}

impl RecordSource for CsvRecordLoader {
    fn load_all(&self) -> ChatbotResult<Vec<QuestionRecord>> {
        let file = File::open(&self.path).map_err(|e| {
            ChatbotError::DataFormat(format!("cannot open '{}': {e}", self.path.display()))
        })?;
        let records = Self::from_reader(file)?;
        tracing::info!("Loaded {} records from '{}'", records.len(), self.path.display());
        Ok(records)
    }
}

fn column_index(headers: &StringRecord, name: &str) -> ChatbotResult<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| ChatbotError::DataFormat(format!("missing required column '{name}'")))
}

fn cell(record: &StringRecord, col: usize, name: &str, row: usize) -> ChatbotResult<String> {
    match record.get(col) {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(ChatbotError::DataFormat(format!("row {row}: empty '{name}' value"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loads_rows_in_order() {
        let csv = "questions,answers,labels\n\
                   What is the interest rate?,12%,rate\n\
                   How do I apply?,Visit any branch.,apply\n";
        let records = CsvRecordLoader::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(records, vec![
            QuestionRecord::new("What is the interest rate?", "rate", "12%"),
            QuestionRecord::new("How do I apply?", "apply", "Visit any branch."),
        ]);
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let csv = "labels,id,questions,answers\nrate,7,What is the rate?,12%\n";
        let records = CsvRecordLoader::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(records[0], QuestionRecord::new("What is the rate?", "rate", "12%"));
    }

    #[test]
    fn test_quoted_fields_with_commas() {
        let csv = "questions,answers,labels\n\"Fees, charges?\",\"1%, min 500\",fees\n";
        let records = CsvRecordLoader::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(records[0].raw_text, "Fees, charges?");
        assert_eq!(records[0].canonical_answer, "1%, min 500");
    }

    #[test]
    fn test_missing_column_is_data_format_error() {
        let csv = "questions,answers\nWhat?,12%\n";
        let err = CsvRecordLoader::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ChatbotError::DataFormat(m) if m.contains("labels")));
    }

    #[test]
    fn test_empty_cell_is_data_format_error() {
        let csv = "questions,answers,labels\nWhat?,,rate\n";
        let err = CsvRecordLoader::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, ChatbotError::DataFormat(m) if m.contains("row 1")));
    }

    #[test]
    fn test_header_only_is_data_format_error() {
        let csv = "questions,answers,labels\n";
        assert!(CsvRecordLoader::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "questions,answers,labels").unwrap();
        writeln!(file, "Can I prepay?,Yes,prepay").unwrap();
        let records = CsvRecordLoader::new(file.path()).load_all().unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_missing_file_is_data_format_error() {
        let err = CsvRecordLoader::new("/no/such/dataset.csv").load_all().unwrap_err();
        assert!(matches!(err, ChatbotError::DataFormat(_)));
    }
}
