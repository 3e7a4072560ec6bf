//! JTL record parsing
//!
//! One JTL data line is a comma-delimited record with between 11 and 17
//! fields. Only six fixed positions feed the statistics: timestamp (0),
//! elapsed (1), label (2), success flag (7), received bytes (9) and sent
//! bytes (10); everything else is carried through to the output partitions
//! verbatim. A line with the wrong number of columns is a recoverable
//! condition the caller can skip; a line with the right shape but a corrupt
//! numeric field is fatal, since silently dropping it would skew the
//! cumulative statistics.

use thiserror::Error;

/// Minimum number of comma-separated fields in a valid JTL data line.
pub const MIN_COLUMNS: usize = 11;
/// Maximum number of comma-separated fields in a valid JTL data line.
pub const MAX_COLUMNS: usize = 17;

const TIMESTAMP_FIELD: usize = 0;
const ELAPSED_FIELD: usize = 1;
const LABEL_FIELD: usize = 2;
const SUCCESS_FIELD: usize = 7;
const BYTES_FIELD: usize = 9;
const SENT_BYTES_FIELD: usize = 10;

/// One parsed request record. Borrowed from the input line; consumed
/// immediately and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample<'a> {
    /// Request start time, epoch milliseconds.
    pub timestamp: i64,
    /// Request latency in milliseconds.
    pub elapsed: u64,
    /// Logical operation name the sample belongs to.
    pub label: &'a str,
    pub success: bool,
    /// Bytes received in the response.
    pub bytes: u64,
    /// Bytes sent with the request.
    pub sent_bytes: u64,
}

/// Why a line could not be turned into a [`Sample`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// Wrong column count. Recoverable: warn and skip the line.
    #[error("line {line} doesn't have expected number of columns ({found}, expected {MIN_COLUMNS} to {MAX_COLUMNS}): {content}")]
    ColumnCount {
        line: u64,
        found: usize,
        content: String,
    },

    /// A required numeric field is corrupt. Fatal: continuing would poison
    /// the aggregate statistics.
    #[error("line {line} has an invalid {field} value '{value}': {content}")]
    InvalidField {
        line: u64,
        field: &'static str,
        value: String,
        content: String,
    },
}

impl ParseError {
    /// Whether the driver may skip the offending line and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ParseError::ColumnCount { .. })
    }
}

/// Tokenizes delimited JTL lines into [`Sample`]s.
#[derive(Debug, Clone)]
pub struct RecordParser {
    delimiter: char,
}

impl RecordParser {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Parse one data line. `line_number` is 1-based and used only for
    /// diagnostics.
    pub fn parse<'a>(&self, line: &'a str, line_number: u64) -> Result<Sample<'a>, ParseError> {
        // Consecutive delimiters produce empty fields rather than being
        // merged; an over-wide line is detected without collecting the tail.
        let mut fields: [&str; MAX_COLUMNS] = [""; MAX_COLUMNS];
        let mut found = 0usize;
        for field in line.split(self.delimiter) {
            if found == MAX_COLUMNS {
                return Err(self.column_count_error(line, line_number));
            }
            fields[found] = field;
            found += 1;
        }
        if found < MIN_COLUMNS {
            return Err(self.column_count_error(line, line_number));
        }

        let timestamp = self.parse_number::<i64>(fields[TIMESTAMP_FIELD], "timestamp", line, line_number)?;
        let elapsed = self.parse_number::<u64>(fields[ELAPSED_FIELD], "elapsed", line, line_number)?;
        let bytes = self.parse_number::<u64>(fields[BYTES_FIELD], "bytes", line, line_number)?;
        let sent_bytes =
            self.parse_number::<u64>(fields[SENT_BYTES_FIELD], "sentBytes", line, line_number)?;

        Ok(Sample {
            timestamp,
            elapsed,
            label: fields[LABEL_FIELD],
            // Same contract as Java's Boolean.parseBoolean: only a
            // case-insensitive "true" counts as success.
            success: fields[SUCCESS_FIELD].eq_ignore_ascii_case("true"),
            bytes,
            sent_bytes,
        })
    }

    fn column_count_error(&self, line: &str, line_number: u64) -> ParseError {
        ParseError::ColumnCount {
            line: line_number,
            found: line.split(self.delimiter).count(),
            content: line.to_string(),
        }
    }

    fn parse_number<T: std::str::FromStr>(
        &self,
        value: &str,
        field: &'static str,
        line: &str,
        line_number: u64,
    ) -> Result<T, ParseError> {
        value.parse().map_err(|_| ParseError::InvalidField {
            line: line_number,
            field,
            value: value.to_string(),
            content: line.to_string(),
        })
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new(',')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_LINE: &str =
        "1631266224444,343,HTTP Request,200,OK,Thread Group 1-1,text,true,,523,110,1,1,https://localhost:8080/echo,342,0,98";

    #[test]
    fn parses_valid_line() {
        let parser = RecordParser::default();
        let sample = parser.parse(VALID_LINE, 2).unwrap();
        assert_eq!(sample.timestamp, 1631266224444);
        assert_eq!(sample.elapsed, 343);
        assert_eq!(sample.label, "HTTP Request");
        assert!(sample.success);
        assert_eq!(sample.bytes, 523);
        assert_eq!(sample.sent_bytes, 110);
    }

    #[test]
    fn empty_fields_are_not_aggregated() {
        // Field 8 is empty in the fixture line; it still counts as a column.
        let parser = RecordParser::default();
        assert_eq!(VALID_LINE.split(',').count(), 17);
        assert!(parser.parse(VALID_LINE, 2).is_ok());
    }

    #[test]
    fn non_true_success_flag_is_failure() {
        let parser = RecordParser::default();
        let line = "1631266224444,343,HTTP Request,500,Error,Thread Group 1-1,text,false,,523,110";
        let sample = parser.parse(line, 2).unwrap();
        assert!(!sample.success);

        let line = "1631266224444,343,HTTP Request,500,Error,Thread Group 1-1,text,yes,,523,110";
        assert!(!parser.parse(line, 2).unwrap().success);

        let line = "1631266224444,343,HTTP Request,200,OK,Thread Group 1-1,text,TRUE,,523,110";
        assert!(parser.parse(line, 2).unwrap().success);
    }

    #[test]
    fn too_many_columns_is_recoverable() {
        let parser = RecordParser::default();
        let wide = format!("{},extra", VALID_LINE);
        let err = parser.parse(&wide, 42).unwrap_err();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("line 42"));
    }

    #[test]
    fn too_few_columns_is_recoverable() {
        let parser = RecordParser::default();
        let err = parser.parse("1631266224444,343,HTTP Request", 7).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn corrupt_timestamp_is_fatal() {
        let parser = RecordParser::default();
        let line = "not-a-number,343,HTTP Request,200,OK,Thread Group 1-1,text,true,,523,110";
        let err = parser.parse(line, 3).unwrap_err();
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("timestamp"));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn corrupt_elapsed_is_fatal() {
        let parser = RecordParser::default();
        let line = "1631266224444,-,HTTP Request,200,OK,Thread Group 1-1,text,true,,523,110";
        let err = parser.parse(line, 9).unwrap_err();
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("elapsed"));
    }

    #[test]
    fn corrupt_byte_counts_are_fatal() {
        let parser = RecordParser::default();
        let line = "1631266224444,343,HTTP Request,200,OK,Thread Group 1-1,text,true,,oops,110";
        assert!(!parser.parse(line, 5).unwrap_err().is_recoverable());
    }
}
