//! Hourly wind observations scraped from the station page.
//!
//! The page carries one table of measurements per day. Nothing on it
//! has an id or a class, so the table is located by its background
//! color and the fields by fixed cell positions, all kept together in
//! [`STATION_TABLE`]. Field parsing is total: a cell that does not
//! parse drops the field (or the row), never the whole day.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::station::StationSource;

/// km/h in one knot.
const KMH_PER_KNOT: f64 = 1.852;

/// Where the observation fields live inside the station table.
///
/// An upstream layout change breaks this one schema instead of
/// literals scattered through the extraction code.
pub struct TableSchema {
    /// Selector for the data table; the background color is the only
    /// stable marker on the page.
    pub table_selector: &'static str,
    /// Rows with fewer cells are separators or padding, not data.
    pub min_cells: usize,
    pub time_cell: usize,
    pub direction_cell: usize,
    pub speed_cell: usize,
}

pub const STATION_TABLE: TableSchema = TableSchema {
    table_selector: r##"table[bgcolor="#EBFAF7"]"##,
    min_cells: 11,
    time_cell: 0,
    direction_cell: 9,
    speed_cell: 10,
};

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("valid selector"));

/// Mean speed before the unit; the optional parenthesized gust is
/// matched and discarded.
static SPEED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*km/h(?:\s*\(\s*\d+(?:\.\d+)?\s*km/h\s*\))?")
        .expect("valid regex")
});

/// Degrees inside the hover title, e.g. `Direction : </i>Ouest <small>(260°)`.
/// The compass name between the marker and the parenthesis is ignored.
static DIRECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Direction\s*:.*\((\d+(?:\.\d+)?)°").expect("valid regex"));

#[derive(Clone, Debug, Serialize)]
pub struct Observation {
    /// `YYYY-MM-DDTHH:MM` in the station's local day.
    pub time: String,
    /// Mean wind in knots. The wire name is historical and the front
    /// end reads it as-is.
    #[serde(rename = "wind_speed_kmh")]
    pub wind_speed_knots: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction_degrees: Option<f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ObservationSet {
    pub date: NaiveDate,
    pub observations: Vec<Observation>,
}

/// Fetch and extract one day of observations.
pub async fn fetch_day(source: &StationSource, date: NaiveDate) -> anyhow::Result<ObservationSet> {
    let html = source.fetch_day(date).await?;
    Ok(extract(date, &html))
}

/// Extract the observations published on a station page.
///
/// A page without the data table is a normal empty day, not an error:
/// the site serves a bare page for dates it has not measured yet.
pub fn extract(date: NaiveDate, html: &str) -> ObservationSet {
    let document = Html::parse_document(html);
    let table_selector =
        Selector::parse(STATION_TABLE.table_selector).expect("valid selector");

    let Some(table) = document.select(&table_selector).next() else {
        return ObservationSet {
            date,
            observations: Vec::new(),
        };
    };

    let mut observations: Vec<Observation> = table
        .select(&ROW)
        .skip(1) // header row
        .filter_map(candidate)
        .filter_map(|c| assemble(date, c))
        .collect();

    // Zero-padded HH:MM sorts chronologically within a single day.
    observations.sort_by(|a, b| a.time.cmp(&b.time));

    log::debug!(
        "Extracted {} observations for {}",
        observations.len(),
        date
    );

    ObservationSet { date, observations }
}

/// Raw fields of one table row, before parsing.
struct Candidate {
    time_label: String,
    speed_text: String,
    direction_title: Option<String>,
}

fn candidate(row: ElementRef) -> Option<Candidate> {
    let cells: Vec<ElementRef> = row.select(&CELL).collect();
    if cells.len() < STATION_TABLE.min_cells {
        return None;
    }

    let time_label = cell_text(cells[STATION_TABLE.time_cell]);
    if time_label.is_empty() {
        return None;
    }

    let direction_title = cells[STATION_TABLE.direction_cell]
        .select(&IMG)
        .next()
        .and_then(|img| img.value().attr("title"))
        .map(str::to_owned);

    Some(Candidate {
        time_label,
        speed_text: cell_text(cells[STATION_TABLE.speed_cell]),
        direction_title,
    })
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<Vec<_>>().join(" ").trim().to_owned()
}

fn assemble(date: NaiveDate, candidate: Candidate) -> Option<Observation> {
    let speed_kmh = parse_wind_speed_kmh(&candidate.speed_text)?;
    // Rows without a readable time slot cannot be ordered; drop them
    // rather than emit a null timestamp.
    let time = parse_time_label(&candidate.time_label)?;

    Some(Observation {
        time: format!("{}T{}", date, time),
        wind_speed_knots: speed_kmh / KMH_PER_KNOT,
        wind_direction_degrees: candidate
            .direction_title
            .as_deref()
            .and_then(parse_direction_degrees),
    })
}

/// `"7h36"` -> `"07:36"`, `"12h"` -> `"12:00"`. Anything non-numeric
/// around the `h` separator is a miss.
fn parse_time_label(label: &str) -> Option<String> {
    let mut parts = label.splitn(2, 'h');
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = match parts.next().map(str::trim) {
        Some(m) if !m.is_empty() => m.parse().ok()?,
        _ => 0,
    };
    Some(format!("{:02}:{:02}", hour, minute))
}

fn parse_wind_speed_kmh(text: &str) -> Option<f64> {
    SPEED.captures(text)?.get(1)?.as_str().parse().ok()
}

fn parse_direction_degrees(title: &str) -> Option<f64> {
    DIRECTION.captures(title)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 10, 27).unwrap()
    }

    /// A data row shaped like the station page: time in cell 0, the
    /// direction arrow image in cell 9, speed text in cell 10.
    fn data_row(time: &str, direction_title: &str, speed: &str) -> String {
        let mut cells = vec![format!("<td>{}</td>", time)];
        for _ in 1..9 {
            cells.push("<td>-</td>".to_string());
        }
        cells.push(format!(
            r#"<td><img src="dir.png" title="{}"></td>"#,
            direction_title
        ));
        cells.push(format!("<td>{}</td>", speed));
        format!("<tr>{}</tr>", cells.join(""))
    }

    fn page(rows: &[String]) -> String {
        format!(
            r##"<html><body>
            <table bgcolor="#EBFAF7">
            <tr><td>Heure</td><td>Temps</td></tr>
            {}
            </table>
            </body></html>"##,
            rows.join("\n")
        )
    }

    // =========================================================================
    // Field parsers
    // =========================================================================

    #[test]
    fn test_parse_time_label() {
        assert_eq!(parse_time_label("7h36").as_deref(), Some("07:36"));
        assert_eq!(parse_time_label("12h").as_deref(), Some("12:00"));
        assert_eq!(parse_time_label("0h5").as_deref(), Some("00:05"));
        assert_eq!(parse_time_label("23h54").as_deref(), Some("23:54"));
    }

    #[test]
    fn test_parse_time_label_invalid() {
        assert_eq!(parse_time_label(""), None);
        assert_eq!(parse_time_label("h30"), None); // empty hour
        assert_eq!(parse_time_label("abch30"), None);
        assert_eq!(parse_time_label("7hxx"), None);
    }

    #[test]
    fn test_parse_wind_speed_uses_mean_not_gust() {
        assert_eq!(parse_wind_speed_kmh("36 km/h (44 km/h)"), Some(36.0));
    }

    #[test]
    fn test_parse_wind_speed_plain_and_decimal() {
        assert_eq!(parse_wind_speed_kmh("12 km/h"), Some(12.0));
        assert_eq!(parse_wind_speed_kmh("7.4 km/h"), Some(7.4));
    }

    #[test]
    fn test_parse_wind_speed_no_match() {
        assert_eq!(parse_wind_speed_kmh(""), None);
        assert_eq!(parse_wind_speed_kmh("calme"), None);
        assert_eq!(parse_wind_speed_kmh("36 mph"), None);
    }

    #[test]
    fn test_parse_direction_degrees() {
        assert_eq!(
            parse_direction_degrees("Direction : </i>Ouest <small>(260°)"),
            Some(260.0)
        );
        assert_eq!(
            parse_direction_degrees("Direction : Nord-Est (45°)"),
            Some(45.0)
        );
    }

    #[test]
    fn test_parse_direction_degrees_no_match() {
        assert_eq!(parse_direction_degrees("Ouest"), None);
        assert_eq!(parse_direction_degrees("Direction : Ouest"), None);
        assert_eq!(parse_direction_degrees("(260°)"), None); // marker missing
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    #[test]
    fn test_extract_well_formed_row() {
        let html = page(&[data_row(
            "7h36",
            "Direction : </i>Ouest <small>(260°)",
            "36 km/h (44 km/h)",
        )]);
        let set = extract(day(), &html);

        assert_eq!(set.observations.len(), 1);
        let obs = &set.observations[0];
        assert_eq!(obs.time, "2023-10-27T07:36");
        assert_eq!(obs.wind_speed_knots, 36.0 / 1.852);
        assert_eq!(obs.wind_direction_degrees, Some(260.0));
    }

    #[test]
    fn test_extract_skips_short_rows() {
        // Eight cells: plausible content, but not a data row.
        let short_row = format!("<tr>{}</tr>", "<td>8h</td>".repeat(8));
        let html = page(&[
            data_row("7h36", "Direction : Ouest (260°)", "36 km/h"),
            short_row,
        ]);
        let set = extract(day(), &html);

        assert_eq!(set.observations.len(), 1);
        assert_eq!(set.observations[0].time, "2023-10-27T07:36");
    }

    #[test]
    fn test_extract_skips_empty_time_cell() {
        let html = page(&[data_row("  ", "Direction : Ouest (260°)", "36 km/h")]);
        assert!(extract(day(), &html).observations.is_empty());
    }

    #[test]
    fn test_extract_drops_row_without_speed() {
        let html = page(&[
            data_row("7h", "Direction : Ouest (260°)", "n/a"),
            data_row("8h", "Direction : Ouest (250°)", "20 km/h"),
        ]);
        let set = extract(day(), &html);

        assert_eq!(set.observations.len(), 1);
        assert_eq!(set.observations[0].time, "2023-10-27T08:00");
    }

    #[test]
    fn test_extract_drops_row_without_time() {
        // Speed parses but the slot label does not: the row cannot be
        // ordered, so it is dropped.
        let html = page(&[data_row("??", "Direction : Ouest (260°)", "20 km/h")]);
        assert!(extract(day(), &html).observations.is_empty());
    }

    #[test]
    fn test_extract_keeps_row_without_direction() {
        let html = page(&[data_row("7h", "variable", "20 km/h")]);
        let set = extract(day(), &html);

        assert_eq!(set.observations.len(), 1);
        assert_eq!(set.observations[0].wind_direction_degrees, None);
    }

    #[test]
    fn test_extract_sorts_by_time() {
        let html = page(&[
            data_row("22h", "Direction : Ouest (260°)", "30 km/h"),
            data_row("7h36", "Direction : Ouest (255°)", "25 km/h"),
            data_row("12h", "Direction : Ouest (250°)", "20 km/h"),
        ]);
        let times: Vec<String> = extract(day(), &html)
            .observations
            .into_iter()
            .map(|o| o.time)
            .collect();

        assert_eq!(
            times,
            vec![
                "2023-10-27T07:36",
                "2023-10-27T12:00",
                "2023-10-27T22:00"
            ]
        );
    }

    #[test]
    fn test_extract_without_table_is_empty_not_error() {
        let set = extract(day(), "<html><body><p>Pas de données</p></body></html>");
        assert_eq!(set.date, day());
        assert!(set.observations.is_empty());
    }

    #[test]
    fn test_extract_ignores_other_tables() {
        let html = r##"<html><body>
            <table bgcolor="#FFFFFF"><tr><td>nav</td></tr></table>
            </body></html>"##;
        assert!(extract(day(), html).observations.is_empty());
    }

    #[test]
    fn test_wire_format_keeps_legacy_speed_field_name() {
        let set = extract(
            day(),
            &page(&[data_row("7h", "Direction : Ouest (260°)", "36 km/h")]),
        );
        let json = serde_json::to_value(&set).unwrap();

        assert_eq!(json["date"], "2023-10-27");
        let obs = &json["observations"][0];
        assert!(obs.get("wind_speed_kmh").is_some());
        assert!(obs.get("wind_speed_knots").is_none());
        assert_eq!(obs["wind_direction_degrees"], 260.0);
    }
}
