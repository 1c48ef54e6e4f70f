/// SNAP (Scenarios Network for Alaska + Arctic Planning) API client.
///
/// Two endpoints back the bias-correction pipeline:
/// - the community lookup, mapping a place name to coordinates and a SNAP id;
/// - the degree-day endpoint, returning per-year modeled values as a nested
///   model → scenario → year → `{dd}` structure for a coordinate and year
///   range.
///
/// API documentation: https://earthmaps.io/api

use crate::metrics::Metric;
use crate::model::{
    DegDayError, DegreeDayGrid, HISTORICAL_END, HISTORICAL_START, PROJECTION_END,
    PROJECTION_START, Result,
};
use serde::Deserialize;

/// Production host serving the community lookup.
pub const SNAP_PLACES_BASE_URL: &str = "https://earthmaps.io";

/// Host serving the degree-day endpoint.
pub const SNAP_DEGREE_DAYS_BASE_URL: &str = "http://development.earthmaps.io";

// ---------------------------------------------------------------------------
// Community lookup
// ---------------------------------------------------------------------------

/// One entry of the SNAP community registry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Community {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Fetches the full SNAP community registry.
pub fn fetch_communities(
    client: &reqwest::blocking::Client,
    base_url: &str,
) -> Result<Vec<Community>> {
    let url = format!("{}/places/communities", base_url);
    let response = client
        .get(&url)
        .send()
        .map_err(|e| DegDayError::Request(e.to_string()))?;

    if !response.status().is_success() {
        return Err(DegDayError::HttpStatus(response.status().as_u16()));
    }

    response
        .json::<Vec<Community>>()
        .map_err(|e| DegDayError::Parse(e.to_string()))
}

/// Resolves a community by exact name match.
pub fn find_community<'a>(communities: &'a [Community], name: &str) -> Option<&'a Community> {
    communities.iter().find(|c| c.name == name)
}

// ---------------------------------------------------------------------------
// Degree-day grids
// ---------------------------------------------------------------------------

/// URL of the degree-day endpoint for one metric, coordinate, and year range.
pub fn build_degree_days_url(
    base_url: &str,
    metric: Metric,
    lat: f64,
    lon: f64,
    start_year: u16,
    end_year: u16,
) -> String {
    format!(
        "{}/degree_days/{}/{}/{}/{}/{}",
        base_url,
        metric.api_name(),
        lat,
        lon,
        start_year,
        end_year
    )
}

/// Fetches a nested degree-day grid. The response is consumed verbatim —
/// no reshaping, no interpolation.
pub fn fetch_degree_day_grid(
    client: &reqwest::blocking::Client,
    base_url: &str,
    metric: Metric,
    lat: f64,
    lon: f64,
    start_year: u16,
    end_year: u16,
) -> Result<DegreeDayGrid> {
    let url = build_degree_days_url(base_url, metric, lat, lon, start_year, end_year);
    let response = client
        .get(&url)
        .send()
        .map_err(|e| DegDayError::Request(e.to_string()))?;

    if !response.status().is_success() {
        return Err(DegDayError::HttpStatus(response.status().as_u16()));
    }

    response
        .json::<DegreeDayGrid>()
        .map_err(|e| DegDayError::Parse(e.to_string()))
}

/// Fetches the historical reference grid (1981-2010) for one metric.
pub fn fetch_historical_grid(
    client: &reqwest::blocking::Client,
    base_url: &str,
    metric: Metric,
    lat: f64,
    lon: f64,
) -> Result<DegreeDayGrid> {
    fetch_degree_day_grid(
        client,
        base_url,
        metric,
        lat,
        lon,
        HISTORICAL_START,
        HISTORICAL_END,
    )
}

/// Fetches the future projection grid (2020-2099) for one metric.
pub fn fetch_future_grid(
    client: &reqwest::blocking::Client,
    base_url: &str,
    metric: Metric,
    lat: f64,
    lon: f64,
) -> Result<DegreeDayGrid> {
    fetch_degree_day_grid(
        client,
        base_url,
        metric,
        lat,
        lon,
        PROJECTION_START,
        PROJECTION_END,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_days_url_shape() {
        let url = build_degree_days_url(
            SNAP_DEGREE_DAYS_BASE_URL,
            Metric::FreezingIndex,
            64.8378,
            -147.7164,
            1981,
            2010,
        );
        assert_eq!(
            url,
            "http://development.earthmaps.io/degree_days/freezing_index/64.8378/-147.7164/1981/2010"
        );
    }

    #[test]
    fn test_metric_names_in_urls_match_api() {
        for (metric, expected) in [
            (Metric::FreezingIndex, "/degree_days/freezing_index/"),
            (Metric::Heating, "/degree_days/heating/"),
            (Metric::BelowZero, "/degree_days/below_zero/"),
            (Metric::ThawingIndex, "/degree_days/thawing_index/"),
        ] {
            let url = build_degree_days_url("http://x", metric, 60.0, -150.0, 2020, 2099);
            assert!(url.contains(expected), "url {} missing {}", url, expected);
        }
    }

    #[test]
    fn test_community_response_parses() {
        let body = r#"[
            {"id": 24, "name": "Fairbanks", "latitude": 64.8378, "longitude": -147.7164,
             "region": "Alaska", "country": "US"},
            {"id": 53, "name": "Nome", "latitude": 64.5011, "longitude": -165.4064}
        ]"#;
        let communities: Vec<Community> = serde_json::from_str(body).unwrap();
        assert_eq!(communities.len(), 2);
        assert_eq!(communities[0].name, "Fairbanks");
        assert_eq!(communities[1].id, 53);
    }

    #[test]
    fn test_find_community_is_exact_match() {
        let communities = vec![
            Community {
                id: 24,
                name: "Fairbanks".to_string(),
                latitude: 64.8378,
                longitude: -147.7164,
            },
            Community {
                id: 53,
                name: "Nome".to_string(),
                latitude: 64.5011,
                longitude: -165.4064,
            },
        ];
        assert_eq!(find_community(&communities, "Nome").map(|c| c.id), Some(53));
        assert_eq!(find_community(&communities, "nome"), None);
        assert_eq!(find_community(&communities, "Utqiagvik"), None);
    }

    #[test]
    fn test_degree_day_grid_response_parses() {
        let body = r#"{
            "CCSM4": {
                "rcp45": {"2020": {"dd": 3120.0}, "2021": {"dd": 3080.5}},
                "rcp85": {"2020": {"dd": 3050.0}}
            },
            "GFDL-CM3": {
                "rcp45": {"2020": {"dd": 2990.0}}
            }
        }"#;
        let grid: DegreeDayGrid = serde_json::from_str(body).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid["CCSM4"]["rcp45"]["2021"].dd, 3080.5);
        assert_eq!(grid["GFDL-CM3"]["rcp45"].len(), 1);
    }
}
