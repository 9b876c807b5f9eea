use std::collections::BTreeMap;

use super::BwfError;

/// Parse the header plus first data row of a bwfmetaedit CSV report.
///
/// Short rows are padded with empty strings so every header column is present.
pub(crate) fn parse_first_row(text: &str) -> Result<BTreeMap<String, String>, BwfError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let record = reader
        .records()
        .next()
        .ok_or(BwfError::EmptyReport)??;
    Ok(headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            (
                name.to_string(),
                record.get(idx).unwrap_or_default().to_string(),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_headers_to_first_row() {
        let text = "FileName,Description,CodingHistory\n\
                    a.wav,\"File content: x; y\",\"A=ANALOGUE\r\nA=PCM\"\n";
        let row = parse_first_row(text).unwrap();
        assert_eq!(row["FileName"], "a.wav");
        assert_eq!(row["Description"], "File content: x; y");
        assert_eq!(row["CodingHistory"], "A=ANALOGUE\r\nA=PCM");
    }

    #[test]
    fn pads_missing_columns_with_empty_strings() {
        let row = parse_first_row("FileName,INAM,ICRD\na.wav\n").unwrap();
        assert_eq!(row["INAM"], "");
        assert_eq!(row["ICRD"], "");
    }

    #[test]
    fn header_only_report_is_an_error() {
        let err = parse_first_row("FileName,INAM\n").unwrap_err();
        assert!(matches!(err, BwfError::EmptyReport));
    }
}
