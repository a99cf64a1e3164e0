use std::{fs::File, io::Read, path::Path};

use csv::StringRecord;
use log::debug;

use crate::{FatigueError, Result};

/// A CSV file with a header row, held in memory as strings.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl CsvTable {
    /// Reads a CSV file into memory.
    ///
    /// # Arguments
    /// * `path` - The path to the CSV file.
    ///
    /// # Returns
    /// The table or an error if the file can't be read or isn't well formed CSV.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let table = Self::from_reader(File::open(path)?)?;

        debug!(rows = table.len(), path:% = path.display(); "loaded csv");
        Ok(table)
    }

    /// Reads CSV data, the first record being the header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = reader.headers()?.clone();
        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

        Ok(Self { headers, rows })
    }

    /// Returns the amount of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    /// Returns the raw values of a column.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let index = self.index_of(name)?;
        let column = self
            .rows
            .iter()
            .map(|row| row.get(index).unwrap_or_default())
            .collect();

        Ok(column)
    }

    /// Returns the values of a column parsed as numbers.
    ///
    /// # Returns
    /// The values or an error naming the first data row (1-based) that isn't a number.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f32>> {
        self.column(name)?
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                value.parse::<f32>().map_err(|_| FatigueError::NotNumeric {
                    column: name.to_string(),
                    row: i + 1,
                    value: value.to_string(),
                })
            })
            .collect()
    }

    /// Sets a column to the given numbers, appending it when it doesn't exist yet.
    pub fn set_numeric_column(&mut self, name: &str, values: &[f32]) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(FatigueError::ColumnLength {
                column: name.to_string(),
                got: values.len(),
                expected: self.rows.len(),
            });
        }

        match self.headers.iter().position(|h| h == name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    *row = row
                        .iter()
                        .enumerate()
                        .map(|(i, field)| {
                            if i == index {
                                value.to_string()
                            } else {
                                field.to_string()
                            }
                        })
                        .collect();
                }
            }
            None => {
                self.headers.push_field(name);
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push_field(&value.to_string());
                }
            }
        }

        Ok(())
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| FatigueError::MissingColumn(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "HRS,Soreness\n512,0\n 874 ,1\n1203,2\n";

    fn table() -> CsvTable {
        CsvTable::from_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn reads_headers_and_rows() {
        let table = table();

        assert_eq!(table.len(), 3);
        assert_eq!(table.headers().collect::<Vec<_>>(), ["HRS", "Soreness"]);
        assert_eq!(table.column("Soreness").unwrap(), ["0", "1", "2"]);
    }

    #[test]
    fn numeric_columns_are_trimmed_and_parsed() {
        assert_eq!(
            table().numeric_column("HRS").unwrap(),
            vec![512.0, 874.0, 1203.0]
        );
    }

    #[test]
    fn missing_column() {
        let err = table().numeric_column("BPM").unwrap_err();
        assert!(matches!(err, FatigueError::MissingColumn(c) if c == "BPM"));
    }

    #[test]
    fn non_numeric_value_names_its_row() {
        let table = CsvTable::from_reader("HRS\n1\nfast\n".as_bytes()).unwrap();
        let err = table.numeric_column("HRS").unwrap_err();

        assert!(matches!(err, FatigueError::NotNumeric { row: 2, .. }));
    }

    #[test]
    fn ragged_rows_fail_to_load() {
        assert!(CsvTable::from_reader("HRS,Soreness\n1\n".as_bytes()).is_err());
    }

    #[test]
    fn set_column_appends_then_replaces() {
        let mut table = table();

        table.set_numeric_column("scaled_HRS", &[0.512, 0.874, 1.203]).unwrap();
        assert_eq!(
            table.numeric_column("scaled_HRS").unwrap(),
            vec![0.512, 0.874, 1.203]
        );

        table.set_numeric_column("HRS", &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(table.numeric_column("HRS").unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(table.column("Soreness").unwrap(), ["0", "1", "2"]);

        assert!(table.set_numeric_column("short", &[1.0]).is_err());
    }
}
