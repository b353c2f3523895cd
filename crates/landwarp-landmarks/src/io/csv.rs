use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
};

use glam::Vec3;

use crate::landmark::Landmark;

/// Error types for the landmark CSV module.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LandmarkCsvError {
    /// Error reading or writing file
    #[error("error reading or writing landmark file")]
    Io(#[from] std::io::Error),

    /// Malformed CSV, e.g. an unterminated quote
    #[error("malformed landmark CSV")]
    Csv(#[from] csv::Error),

    /// A row has an unexpected number of columns
    #[error("line {line}: expected 3 or 4 columns, got {count}")]
    InvalidColumnCount {
        /// The 1-based line number.
        line: usize,
        /// The number of columns found.
        count: usize,
    },

    /// A coordinate could not be parsed or is not finite
    #[error("line {line}: {msg}")]
    ParseError {
        /// The 1-based line number.
        line: usize,
        /// Description of the failure.
        msg: String,
    },
}

/// Read a landmark CSV file.
///
/// Each row is either `name,x,y,z` or `x,y,z`. An empty name column marks the
/// landmark as anonymous.
///
/// # Arguments
///
/// * `path` - The path to the CSV file.
///
/// # Returns
///
/// The landmarks, in file order.
pub fn read_landmarks_csv(path: impl AsRef<Path>) -> Result<Vec<Landmark>, LandmarkCsvError> {
    let file = File::open(path)?;
    parse_landmarks_csv(BufReader::new(file))
}

/// Parse landmarks from a reader in the landmark CSV format.
///
/// Fields may be quoted, so names can contain commas and quotes. Blank lines
/// are ignored. If the coordinate columns of the first row are not numbers the
/// row is treated as a header and skipped; later rows must parse.
pub fn parse_landmarks_csv<R: Read>(reader: R) -> Result<Vec<Landmark>, LandmarkCsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut landmarks = Vec::new();
    let mut seen_first_row = false;

    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let is_first_row = !seen_first_row;
        seen_first_row = true;

        if is_first_row && is_header(&record) {
            log::debug!("skipping landmark CSV header: {:?}", record);
            continue;
        }

        let line = record.position().map_or(0, |pos| pos.line() as usize);
        landmarks.push(parse_landmark_record(&record, line)?);
    }

    Ok(landmarks)
}

/// A row whose trailing three columns are not all numbers.
fn is_header(record: &csv::StringRecord) -> bool {
    record
        .iter()
        .rev()
        .take(3)
        .any(|field| field.parse::<f32>().is_err())
}

fn parse_coord(s: &str, line: usize) -> Result<f32, LandmarkCsvError> {
    let value = s.parse::<f32>().map_err(|e| LandmarkCsvError::ParseError {
        line,
        msg: format!("{s}: {e}"),
    })?;

    if !value.is_finite() {
        return Err(LandmarkCsvError::ParseError {
            line,
            msg: format!("{s}: coordinate is not finite"),
        });
    }

    Ok(value)
}

fn parse_landmark_record(
    record: &csv::StringRecord,
    line: usize,
) -> Result<Landmark, LandmarkCsvError> {
    let cols = record.iter().collect::<Vec<_>>();

    let (name, coords) = match cols.as_slice() {
        [x, y, z] => (None, [*x, *y, *z]),
        [name, x, y, z] => {
            let name = (!name.is_empty()).then(|| name.to_string());
            (name, [*x, *y, *z])
        }
        _ => {
            return Err(LandmarkCsvError::InvalidColumnCount {
                line,
                count: cols.len(),
            })
        }
    };

    let position = Vec3::new(
        parse_coord(coords[0], line)?,
        parse_coord(coords[1], line)?,
        parse_coord(coords[2], line)?,
    );

    Ok(Landmark::new(name, position))
}

/// Write landmarks in the landmark CSV format.
///
/// Named landmarks are written as `name,x,y,z`, anonymous ones as `x,y,z`.
/// Names are quoted when needed so they read back unchanged.
pub fn write_landmarks_csv<W: Write>(
    writer: W,
    landmarks: &[Landmark],
) -> Result<(), LandmarkCsvError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(writer);

    for lm in landmarks {
        let p = lm.position;
        let (x, y, z) = (p.x.to_string(), p.y.to_string(), p.z.to_string());
        match &lm.name {
            Some(name) => writer.write_record([name.as_str(), x.as_str(), y.as_str(), z.as_str()])?,
            None => writer.write_record([x.as_str(), y.as_str(), z.as_str()])?,
        }
    }

    writer.flush()?;
    Ok(())
}
