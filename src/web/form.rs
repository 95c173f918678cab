//! Decoding of `application/x-www-form-urlencoded` query strings and request bodies.

use crate::error::{Error, Result};
use crate::matrix::AttendanceMatrix;
use crate::models::Status;
use chrono::NaiveDate;
use std::fmt::Display;
use std::str::FromStr;
use url::form_urlencoded;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    pairs: Vec<(String, String)>,
}

impl Form {
    pub fn parse(input: &str) -> Self {
        Self {
            pairs: form_urlencoded::parse(input.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    /// The first value of a field, trimmed. Blank values count as missing.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn required(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| Error::validation(format!("missing field '{name}'")))
    }

    pub fn parse_required<T>(&self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        parse_field(name, self.required(name)?)
    }

    pub fn parse_optional<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(name)
            .map(|value| parse_field(name, value))
            .transpose()
    }

    /// Collects the grid cells whose field names have the form `{prefix}{student_id}:{date}`.
    pub fn matrix(&self, prefix: &str) -> Result<AttendanceMatrix> {
        let cells = self
            .pairs
            .iter()
            .filter_map(|(key, value)| Some((key.strip_prefix(prefix)?, key, value)))
            .map(|(cell, key, value)| {
                let (student_id, date) = cell
                    .split_once(':')
                    .ok_or_else(|| Error::validation(format!("malformed grid field '{key}'")))?;
                let status = Status::parse_cell(value)
                    .map_err(|err| Error::validation(err.to_string()))?;
                Ok((
                    parse_field::<i32>(key, student_id)?,
                    parse_field::<NaiveDate>(key, date)?,
                    status,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(AttendanceMatrix::from_cells(cells))
    }
}

fn parse_field<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|err| Error::validation(format!("invalid value '{value}' for '{name}': {err}")))
}

/// The name of the form field holding a grid cell.
pub fn cell_field(prefix: &str, student_id: i32, date: NaiveDate) -> String {
    format!("{prefix}{student_id}:{date}")
}

/// Encodes `params` as a query string.
pub fn encode(params: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_fields() {
        let form = Form::parse("name=Ada+Lovelace&grade=91.5&blank=+&name=Other");
        assert_eq!(form.get("name"), Some("Ada Lovelace"));
        assert_eq!(form.get("blank"), None);
        assert_eq!(form.parse_required::<f64>("grade").unwrap(), 91.5);
        assert_eq!(form.parse_optional::<f64>("blank").unwrap(), None);
        assert!(matches!(form.required("missing"), Err(Error::Validation(_))));
        assert!(matches!(
            form.parse_required::<i32>("name"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn decodes_grid_cells() {
        let query = encode(&[
            (cell_field("cell:", 1, "2024-01-08".parse().unwrap()).as_str(), "Present"),
            (cell_field("cell:", 2, "2024-01-08".parse().unwrap()).as_str(), "Not Recorded"),
            (cell_field("was:", 1, "2024-01-08".parse().unwrap()).as_str(), "Absent"),
            ("start", "2024-01-08"),
        ]);
        let form = Form::parse(&query);
        let date = "2024-01-08".parse().unwrap();

        let edited = form.matrix("cell:").unwrap();
        assert_eq!(edited.cells().count(), 2);
        assert_eq!(edited.get(1, date), Some(Status::Present));
        assert_eq!(edited.get(2, date), None);

        let snapshot = form.matrix("was:").unwrap();
        assert_eq!(snapshot.get(1, date), Some(Status::Absent));
    }

    #[test]
    fn rejects_malformed_cells() {
        let form = Form::parse("cell:1:2024-01-08=Late");
        assert!(matches!(form.matrix("cell:"), Err(Error::Validation(_))));
        let form = Form::parse("cell:x:2024-01-08=Present");
        assert!(matches!(form.matrix("cell:"), Err(Error::Validation(_))));
        let form = Form::parse("cell:1=Present");
        assert!(matches!(form.matrix("cell:"), Err(Error::Validation(_))));
    }

    #[test]
    fn encodes_special_characters() {
        assert_eq!(
            encode(&[("notice", "Student 'Ada' added!")]),
            "notice=Student+%27Ada%27+added%21"
        );
    }
}
