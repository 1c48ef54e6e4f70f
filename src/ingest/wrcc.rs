/// WRCC (Western Regional Climate Center) station-normals scraper.
///
/// Retrieves 1981-2010 daily climate normals for a station from the WRCC
/// data portal. The portal serves a fixed-width text table inside a `<pre>`
/// block; each data row carries eleven numeric fields. Note that WRCC has
/// been updating their data portal, so the CGI endpoint may move.
///
/// Portal: https://wrcc.dri.edu

use crate::model::{DailyRecord, DegDayError, Result};

const WRCC_BASE_URL: &str = "https://wrcc.dri.edu";

/// Number of header lines preceding the data rows in the `<pre>` table.
/// This has varied across portal revisions — rows that do not parse as
/// eleven-field data lines are skipped anyway.
const HEADER_LINES: usize = 3;

/// Fields per data row: doy, month, day, tmax, years, tmin, years, precip,
/// years, sdmax, sdmin.
const ROW_FIELD_COUNT: usize = 11;

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// URL of the 1981-2010 daily normals page for a station.
pub fn build_normals_url(station_id: &str) -> String {
    format!("{}/cgi-bin/cliNORM2010t.pl?{}", WRCC_BASE_URL, station_id)
}

/// Fetches and parses one station's daily normals.
pub fn fetch_station_normals(
    client: &reqwest::blocking::Client,
    station_id: &str,
) -> Result<Vec<DailyRecord>> {
    let url = build_normals_url(station_id);
    let response = client
        .get(&url)
        .send()
        .map_err(|e| DegDayError::Request(e.to_string()))?;

    if !response.status().is_success() {
        return Err(DegDayError::HttpStatus(response.status().as_u16()));
    }

    let html = response
        .text()
        .map_err(|e| DegDayError::Request(e.to_string()))?;
    let table = extract_pre_block(&html, station_id)?;
    parse_normals_table(table, station_id)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Pulls the tabular text out of the page's first `<pre>` block.
fn extract_pre_block<'a>(html: &'a str, station_id: &str) -> Result<&'a str> {
    let open = html
        .find("<pre")
        .and_then(|at| html[at..].find('>').map(|end| at + end + 1))
        .ok_or_else(|| DegDayError::NoData(format!("no <pre> table for station {}", station_id)))?;
    let close = html[open..]
        .find("</pre>")
        .map(|at| open + at)
        .ok_or_else(|| DegDayError::Parse(format!("unterminated <pre> for station {}", station_id)))?;
    Ok(&html[open..close])
}

/// Parses the `<pre>` table into daily records.
///
/// Example data row:
///   349 12 14   39.4  26.   31.3  26.  0.637  26.  6.079  6.576
///
/// Lines that do not split into eleven fields (headers, separators, blank
/// lines) are skipped. Within a data row, an unparseable temperature or
/// deviation field becomes `None` — a gap for the missing-value policy, not
/// a fabricated value — while an unreadable day-of-year field is a malformed
/// record.
pub fn parse_normals_table(table: &str, station_id: &str) -> Result<Vec<DailyRecord>> {
    let mut records = Vec::new();
    for (line_no, line) in table.lines().enumerate().skip(HEADER_LINES) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != ROW_FIELD_COUNT {
            continue;
        }
        // A row shaped like data but with an unreadable calendar position
        // cannot be attributed to a day; report rather than guess.
        let doy = parse_count(fields[0]).ok_or_else(|| malformed(station_id, line_no, "doy"))?;
        let month = parse_count(fields[1]).ok_or_else(|| malformed(station_id, line_no, "month"))?;
        let day = parse_count(fields[2]).ok_or_else(|| malformed(station_id, line_no, "day"))?;

        records.push(DailyRecord {
            doy: doy as u16,
            month: month as u8,
            day: day as u8,
            tmax: parse_value(fields[3]),
            num_years_tmax: parse_count(fields[4]).unwrap_or(0),
            tmin: parse_value(fields[5]),
            num_years_tmin: parse_count(fields[6]).unwrap_or(0),
            precip: parse_value(fields[7]),
            num_years_precip: parse_count(fields[8]).unwrap_or(0),
            sdmax: parse_value(fields[9]),
            sdmin: parse_value(fields[10]),
        });
    }
    if records.is_empty() {
        return Err(DegDayError::NoData(format!(
            "no parseable normals rows for station {}",
            station_id
        )));
    }
    Ok(records)
}

/// Parses a measurement field. Missing markers ("--", "-----") and
/// non-numeric text yield `None`.
fn parse_value(field: &str) -> Option<f64> {
    field.parse::<f64>().ok()
}

/// Parses an integer-like field. The portal prints year counts with a
/// trailing decimal point ("26."), so parse through f64.
fn parse_count(field: &str) -> Option<u32> {
    let value = field.parse::<f64>().ok()?;
    if value >= 0.0 { Some(value as u32) } else { None }
}

fn malformed(station_id: &str, line_no: usize, field: &str) -> DegDayError {
    DegDayError::MalformedRecord {
        station: station_id.to_string(),
        line: line_no + 1,
        detail: format!("unreadable {} field", field),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TABLE: &str = "\
 ANCHORAGE INTL AP, ALASKA  (500280)\n\
 Daily Climate Normals 1981-2010\n\
 doy mo dy    maxt  nyrs   mint  nyrs    pcpn nyrs  sdmax  sdmin\n\
   1  1  1   23.3  30.    11.9  30.   0.027  30.  9.755  11.214\n\
   2  1  2   23.6  30.    12.1  30.   0.028  30.  9.827  11.440\n\
 349 12 14   39.4  26.    31.3  26.   0.637  26.  6.079   6.576\n";

    #[test]
    fn test_parse_sample_table() {
        let records = parse_normals_table(SAMPLE_TABLE, "500280").unwrap();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!((first.doy, first.month, first.day), (1, 1, 1));
        assert_eq!(first.tmax, Some(23.3));
        assert_eq!(first.tmin, Some(11.9));
        assert_eq!(first.num_years_tmax, 30);
        assert_eq!(first.sdmin, Some(11.214));

        let last = &records[2];
        assert_eq!((last.doy, last.month, last.day), (349, 12, 14));
        assert_eq!(last.precip, Some(0.637));
    }

    #[test]
    fn test_trailing_dot_year_counts_parse() {
        // WRCC prints counts as "26." — must come through as 26.
        let records = parse_normals_table(SAMPLE_TABLE, "500280").unwrap();
        assert_eq!(records[2].num_years_tmax, 26);
        assert_eq!(records[2].num_years_precip, 26);
    }

    #[test]
    fn test_header_and_short_lines_are_skipped() {
        let table = "\
 header one\n\
 header two\n\
 header three\n\
   1  1  1   23.3  30.    11.9  30.   0.027  30.  9.755  11.214\n\
\n\
 --- separator ---\n";
        let records = parse_normals_table(table, "500280").unwrap();
        assert_eq!(records.len(), 1, "only the data row should survive");
    }

    #[test]
    fn test_missing_temperature_field_becomes_none() {
        // Eleven fields, but tmax is a missing-data marker.
        let table = "\
h\nh\nh\n\
   1  1  1   ----  30.    11.9  30.   0.027  30.  9.755  11.214\n";
        let records = parse_normals_table(table, "500280").unwrap();
        assert_eq!(records[0].tmax, None, "marker must not become a number");
        assert_eq!(records[0].tmin, Some(11.9));
    }

    #[test]
    fn test_unreadable_doy_is_a_malformed_record() {
        let table = "\
h\nh\nh\n\
 bad  1  1   23.3  30.    11.9  30.   0.027  30.  9.755  11.214\n";
        let err = parse_normals_table(table, "500280").unwrap_err();
        match err {
            DegDayError::MalformedRecord { station, line, .. } => {
                assert_eq!(station, "500280");
                assert_eq!(line, 4);
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_table_with_no_data_rows_is_no_data() {
        let err = parse_normals_table("h\nh\nh\nnothing here\n", "500280").unwrap_err();
        assert!(matches!(err, DegDayError::NoData(_)));
    }

    #[test]
    fn test_extract_pre_block() {
        let html = "<html><body><pre class=\"t\">TABLE</pre></body></html>";
        assert_eq!(extract_pre_block(html, "500280").unwrap(), "TABLE");
    }

    #[test]
    fn test_extract_pre_block_missing_is_no_data() {
        let err = extract_pre_block("<html><body>gone</body></html>", "500280").unwrap_err();
        assert!(matches!(err, DegDayError::NoData(_)));
    }

    #[test]
    fn test_normals_url_contains_station_id() {
        let url = build_normals_url("500280");
        assert!(url.starts_with("https://wrcc.dri.edu/"));
        assert!(url.ends_with("cliNORM2010t.pl?500280"));
    }
}
