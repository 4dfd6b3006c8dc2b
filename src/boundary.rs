use geojson::{GeoJson, Value};
use once_cell::sync::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Preferred local copy of the district boundaries.
pub const BOUNDARY_FILE: &str = "data/seoul_districts.json";

/// Fallback source: Seoul administrative district boundaries as GeoJSON.
pub const BOUNDARY_URL: &str =
    "https://raw.githubusercontent.com/southkorea/seoul-maps/master/korea_administrative_boundaries_v1.geojson";

/// One named district boundary. Exterior rings only; a MultiPolygon
/// district contributes several rings under the same name.
#[derive(Clone, Debug)]
pub struct DistrictPolygon {
    pub name: String,
    pub rings: Vec<Vec<(f64, f64)>>,
}

/// Collection of named district polygons. The polygon `name` property is
/// the join key matched (exactly, case-sensitively) against aggregated
/// district names.
#[derive(Clone, Debug, Default)]
pub struct BoundarySet {
    pub polygons: Vec<DistrictPolygon>,
}

impl BoundarySet {
    /// Parse a GeoJSON feature collection into named polygons. Features
    /// without a name or without polygon geometry are skipped. Returns
    /// `None` on malformed payloads; the map degrades, never crashes.
    pub fn parse(text: &str) -> Option<Self> {
        let geojson: GeoJson = match text.parse() {
            Ok(g) => g,
            Err(e) => {
                warn!("boundary payload is not valid GeoJSON: {e}");
                return None;
            }
        };

        let GeoJson::FeatureCollection(fc) = geojson else {
            warn!("boundary payload is not a feature collection");
            return None;
        };

        let mut polygons = Vec::new();
        for feature in fc.features {
            let Some(name) = feature
                .properties
                .as_ref()
                .and_then(|p| p.get("name"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
            else {
                continue;
            };

            let Some(geometry) = feature.geometry else {
                continue;
            };

            let rings = match geometry.value {
                Value::Polygon(rings) => exterior_ring(&rings).into_iter().collect(),
                Value::MultiPolygon(parts) => parts
                    .iter()
                    .filter_map(|rings| exterior_ring(rings))
                    .collect(),
                _ => continue,
            };

            polygons.push(DistrictPolygon { name, rings });
        }

        Some(Self { polygons })
    }

    /// Bounding box over all rings: (min_lon, min_lat, max_lon, max_lat).
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        let mut bbox: Option<(f64, f64, f64, f64)> = None;
        for polygon in &self.polygons {
            for ring in &polygon.rings {
                for &(lon, lat) in ring {
                    bbox = Some(match bbox {
                        None => (lon, lat, lon, lat),
                        Some((min_lon, min_lat, max_lon, max_lat)) => (
                            min_lon.min(lon),
                            min_lat.min(lat),
                            max_lon.max(lon),
                            max_lat.max(lat),
                        ),
                    });
                }
            }
        }
        bbox
    }
}

fn exterior_ring(rings: &[Vec<Vec<f64>>]) -> Option<Vec<(f64, f64)>> {
    rings.first().map(|exterior| {
        exterior
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    })
}

/// Capability for obtaining boundary data. Failures of any kind produce
/// `None` so the dashboard can fall back to table-only output.
pub trait BoundaryProvider {
    /// Human-readable source identifier, for logging.
    fn source(&self) -> String;
    fn load(&self) -> Option<BoundarySet>;
}

/// Reads boundaries from a local GeoJSON file.
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl BoundaryProvider for FileProvider {
    fn source(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Option<BoundarySet> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                warn!("could not read boundary file {}: {e}", self.path.display());
                return None;
            }
        };
        BoundarySet::parse(&text)
    }
}

/// Fetches boundaries over HTTP. Non-2xx responses, network errors, and
/// malformed payloads all collapse to `None`.
pub struct HttpProvider {
    url: String,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl BoundaryProvider for HttpProvider {
    fn source(&self) -> String {
        self.url.clone()
    }

    fn load(&self) -> Option<BoundarySet> {
        let client = match reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("could not build http client: {e}");
                return None;
            }
        };

        let text = match client
            .get(&self.url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
        {
            Ok(text) => text,
            Err(e) => {
                warn!("boundary fetch from {} failed: {e}", self.url);
                return None;
            }
        };

        BoundarySet::parse(&text)
    }
}

/// Pick the boundary source: local file when present, HTTP otherwise.
pub fn default_provider() -> Box<dyn BoundaryProvider> {
    if Path::new(BOUNDARY_FILE).exists() {
        Box::new(FileProvider::new(BOUNDARY_FILE))
    } else {
        Box::new(HttpProvider::new(BOUNDARY_URL))
    }
}

static BOUNDARY_CACHE: OnceCell<Option<BoundarySet>> = OnceCell::new();

/// Load boundaries at most once per process lifetime. Subsequent calls
/// return the cached result regardless of the provider handed in.
pub fn load_once(provider: &dyn BoundaryProvider) -> &'static Option<BoundarySet> {
    BOUNDARY_CACHE.get_or_init(|| {
        let source = provider.source();
        match provider.load() {
            Some(set) => {
                info!("loaded {} district boundaries from {source}", set.polygons.len());
                Some(set)
            }
            None => {
                warn!("boundary data unavailable from {source}; rendering table only");
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(name: &str, origin: (f64, f64)) -> String {
        let (x, y) = origin;
        format!(
            r#"{{"type":"Feature","properties":{{"name":"{name}"}},"geometry":{{"type":"Polygon","coordinates":[[[{x},{y}],[{x1},{y}],[{x1},{y1}],[{x},{y1}],[{x},{y}]]]}}}}"#,
            x1 = x + 0.1,
            y1 = y + 0.1,
        )
    }

    fn collection(features: &[String]) -> String {
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        )
    }

    #[test]
    fn parses_named_polygons() {
        let text = collection(&[
            square("종로구", (126.95, 37.55)),
            square("중구", (126.99, 37.55)),
        ]);
        let set = BoundarySet::parse(&text).unwrap();
        assert_eq!(set.polygons.len(), 2);
        assert_eq!(set.polygons[0].name, "종로구");
        assert_eq!(set.polygons[0].rings[0].len(), 5);
    }

    #[test]
    fn malformed_payload_is_absence() {
        assert!(BoundarySet::parse("not json at all").is_none());
        assert!(BoundarySet::parse(r#"{"type":"Point","coordinates":[0,0]}"#).is_none());
    }

    #[test]
    fn unnamed_features_are_skipped() {
        let text = collection(&[
            r#"{"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}"#.to_string(),
            square("중구", (126.99, 37.55)),
        ]);
        let set = BoundarySet::parse(&text).unwrap();
        assert_eq!(set.polygons.len(), 1);
        assert_eq!(set.polygons[0].name, "중구");
    }

    #[test]
    fn missing_file_degrades_to_none() {
        let provider = FileProvider::new("no_such_dir/boundaries.json");
        assert!(provider.load().is_none());
    }

    #[test]
    fn unreachable_url_degrades_to_none() {
        // Port 1 on loopback refuses immediately.
        let provider = HttpProvider::new("http://127.0.0.1:1/boundaries.json");
        assert!(provider.load().is_none());
    }

    #[test]
    fn bbox_spans_all_rings() {
        let text = collection(&[
            square("종로구", (126.95, 37.55)),
            square("중구", (126.99, 37.60)),
        ]);
        let set = BoundarySet::parse(&text).unwrap();
        let (min_lon, min_lat, max_lon, max_lat) = set.bbox().unwrap();
        assert!(min_lon <= 126.95 && min_lat <= 37.55);
        assert!(max_lon >= 127.09 && max_lat >= 37.70);
    }
}
