use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};

use crate::error::{Result, RowError};

pub const DEFAULT_DELIMITER: u8 = b',';

/// One data line keyed by header name. Values are kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: HashMap<String, String>,
    extra: Vec<String>,
}

impl Row {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            extra: Vec::new(),
        }
    }

    /// Trimmed value of `column`, `None` when the column is absent or blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .get(column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn require(&self, column: &str) -> std::result::Result<&str, RowError> {
        self.get(column)
            .ok_or_else(|| RowError::MissingField(column.to_string()))
    }

    /// First non-blank value among `columns`, which are aliases of one field.
    pub fn require_any(&self, columns: &[&str]) -> std::result::Result<&str, RowError> {
        columns
            .iter()
            .find_map(|column| self.get(column))
            .ok_or_else(|| RowError::MissingField(columns.join(" or ")))
    }

    /// Fields beyond the last header.
    pub fn extra(&self) -> &[String] {
        &self.extra
    }
}

/// Header-keyed rows of a decoded CSV document.
#[derive(Debug, Clone, Copy)]
pub struct RowParser {
    delimiter: u8,
}

impl Default for RowParser {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl RowParser {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Reads the header line and returns the remaining lines lazily.
    pub fn parse<'a>(&self, text: &'a str) -> Result<Rows<'a>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.trim().to_string())
            .collect();

        Ok(Rows {
            headers,
            records: reader.into_records(),
            last_line: 1,
        })
    }
}

pub struct Rows<'a> {
    headers: Vec<String>,
    records: StringRecordsIntoIter<&'a [u8]>,
    last_line: u64,
}

impl Rows<'_> {
    fn to_row(&self, record: &StringRecord) -> Row {
        let mut values = HashMap::with_capacity(self.headers.len());
        for (idx, header) in self.headers.iter().enumerate() {
            let value = record.get(idx).unwrap_or_default();
            values.insert(header.clone(), value.to_string());
        }
        let extra = record
            .iter()
            .skip(self.headers.len())
            .map(str::to_string)
            .collect();
        Row { values, extra }
    }
}

impl Iterator for Rows<'_> {
    /// Source line number paired with the row or the reason it is unreadable.
    type Item = (u64, std::result::Result<Row, RowError>);

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.records.next()?;
        let line = match &result {
            Ok(record) => record.position().map(|pos| pos.line()),
            Err(err) => err.position().map(|pos| pos.line()),
        }
        .unwrap_or(self.last_line + 1);
        self.last_line = line;

        let row = result
            .map(|record| self.to_row(&record))
            .map_err(|err| RowError::Malformed(err.to_string()));
        Some((line, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(text: &str) -> Vec<(u64, Row)> {
        RowParser::default()
            .parse(text)
            .unwrap()
            .map(|(line, row)| (line, row.unwrap()))
            .collect()
    }

    #[test]
    fn maps_fields_by_header() {
        let parsed = rows("area_id,area_nm\n1,Moscow\n2,\"Saint Petersburg, city\"\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, 2);
        assert_eq!(parsed[0].1.get("area_id"), Some("1"));
        assert_eq!(parsed[1].0, 3);
        assert_eq!(parsed[1].1.get("area_nm"), Some("Saint Petersburg, city"));
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_keep_the_rest() {
        let parsed = rows("a,b,c\n1\n1,2,3,4,5\n");
        let short = &parsed[0].1;
        assert_eq!(short.get("a"), Some("1"));
        assert_eq!(short.get("b"), None);
        assert!(short.extra().is_empty());

        let long = &parsed[1].1;
        assert_eq!(long.get("c"), Some("3"));
        assert_eq!(long.extra(), &["4".to_string(), "5".to_string()]);
    }

    #[test]
    fn headers_are_trimmed_and_blank_values_are_absent() {
        let parsed = rows(" id , name \n 7 ,   \n");
        let row = &parsed[0].1;
        assert_eq!(row.get("id"), Some("7"));
        assert_eq!(row.get("name"), None);
        assert!(matches!(row.require("name"), Err(RowError::MissingField(f)) if f == "name"));
    }

    #[test]
    fn aliases_resolve_to_first_present_column() {
        let row = Row::from_pairs([("employer_id", ""), ("id", "42")]);
        assert_eq!(row.require_any(&["employer_id", "id"]).unwrap(), "42");

        let err = row.require_any(&["employer_nm", "name"]).unwrap_err();
        assert_eq!(err.to_string(), "missing required field `employer_nm or name`");
    }

    #[test]
    fn empty_document_has_no_rows() {
        assert!(rows("").is_empty());
        assert!(rows("area_id,area_nm\n").is_empty());
    }

    #[test]
    fn honours_custom_delimiter() {
        let parsed: Vec<_> = RowParser::new(b';')
            .parse("id;name\n1;Omsk\n")
            .unwrap()
            .collect();
        let row = parsed[0].1.as_ref().unwrap();
        assert_eq!(row.get("name"), Some("Omsk"));
    }
}
