// CSV helpers shared by bulk import and export

use std::io::Read;
use std::path::Path;

use myadmin_core::store::Row;

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            // Excel on German Windows saves "CSV" as Windows-1252
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            log::debug!("{} is not UTF-8, decoded as Windows-1252", path.display());
            decoded.into_owned()
        }
    };

    // A leading BOM would end up glued to the first header name
    Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
}

/// Pick the field delimiter from the header line.
///
/// Bulk files are comma-separated, but spreadsheet exports in German locales
/// use semicolons. The candidate that splits the header into the most fields wins;
/// ties go to the comma.
pub fn sniff_delimiter(content: &str) -> u8 {
    let header = match content.lines().next() {
        Some(line) => line,
        None => return b',',
    };

    let mut best = b',';
    let mut best_fields = 1usize;
    for &delim in &[b',', b';', b'\t'] {
        let fields = csv::ReaderBuilder::new()
            .delimiter(delim)
            .has_headers(false)
            .flexible(true)
            .from_reader(header.as_bytes())
            .records()
            .next()
            .and_then(|r| r.ok())
            .map(|r| r.len())
            .unwrap_or(1);
        if fields > best_fields {
            best_fields = fields;
            best = delim;
        }
    }
    best
}

/// Write a header row plus rows as comma-separated UTF-8.
pub fn write_table(path: &Path, headers: &[String], rows: &[Row]) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| e.to_string())?;

    writer.write_record(headers).map_err(|e| e.to_string())?;
    for row in rows {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
