//! Offline city/office geocoding and distance utilities (C1).
//!
//! Works without any external API: a static table of known city
//! coordinates, an alias table for alternate spellings, and a
//! normalisation routine robust to messy free-text city strings.
//!
//! Grounded on `examples/original_source/ai/geo.py` (`GeoNormalizer`).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Earth radius used for the Haversine distance, in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

static PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*(г\.|город|city)\s+").unwrap());
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DASH_SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*").unwrap());
static TRASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[^0-9a-zа-яё\-\s]").unwrap());

static CITY_COORDS: Lazy<HashMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    HashMap::from([
        ("астана", (51.1694, 71.4491)),
        ("алматы", (43.2389, 76.8897)),
        ("шымкент", (42.3417, 69.5901)),
        ("караганда", (49.8060, 73.0850)),
        ("усть-каменогорск", (49.9483, 82.6275)),
        ("семей", (50.4111, 80.2275)),
        ("павлодар", (52.2870, 76.9674)),
        ("костанай", (53.2145, 63.6246)),
        ("кокшетау", (53.2833, 69.3833)),
        ("петропавловск", (54.8753, 69.1620)),
        ("орал", (51.2333, 51.3667)),
        ("атырау", (47.1167, 51.8833)),
        ("актау", (43.6532, 51.1975)),
        ("актобе", (50.2839, 57.1660)),
        ("тараз", (42.9000, 71.3667)),
        ("кызылорда", (44.8528, 65.5092)),
    ])
});

static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("нур-султан", "астана"),
        ("нурсултан", "астана"),
        ("nur-sultan", "астана"),
        ("nur sultan", "астана"),
        ("astana", "астана"),
        ("almaty", "алматы"),
        ("shymkent", "шымкент"),
        ("oskemen", "усть-каменогорск"),
        ("ust-kamenogorsk", "усть-каменогорск"),
        ("ust kamenogorsk", "усть-каменогорск"),
        ("усть каменогорск", "усть-каменогорск"),
        ("устькаменогорск", "усть-каменогорск"),
        ("karaganda", "караганда"),
        ("pavlodar", "павлодар"),
        ("kostanay", "костанай"),
        ("kokshetau", "кокшетау"),
        ("petropavlovsk", "петропавловск"),
        ("atyrau", "атырау"),
        ("aktau", "актау"),
        ("aktobe", "актобе"),
        ("taraz", "тараз"),
        ("kyzylorda", "кызылорда"),
        ("уральск", "орал"),
        ("oral", "орал"),
        ("uralsk", "орал"),
    ])
});

/// Kazakh → Russian transliteration used by [`GeoIndex::normalise`].
const KK_TO_RU: [(char, char); 8] = [
    ('қ', 'к'),
    ('ө', 'о'),
    ('ү', 'у'),
    ('ұ', 'у'),
    ('ә', 'а'),
    ('ң', 'н'),
    ('ғ', 'г'),
    ('һ', 'х'),
];

/// Offline geocoder and distance helper. Stateless — safe to share via `&`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoIndex;

impl GeoIndex {
    pub fn new() -> Self {
        GeoIndex
    }

    /// Normalise a city/office string into a stable comparable key:
    /// lowercase; strip a closed set of prefixes ("г.", "город", "city");
    /// fold em/en-dashes to hyphen; drop characters outside
    /// `[0-9a-zA-Z + Cyrillic + space + hyphen]`; collapse
    /// "space-hyphen-space" to "-"; collapse whitespace; fold `ё → е` and
    /// the Kazakh → Russian transliteration.
    pub fn normalise(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let mut s = text.trim().to_lowercase();
        s = PREFIX_RE.replace(&s, "").into_owned();
        s = s.replace('—', "-").replace('–', "-");
        s = TRASH_RE.replace_all(&s, " ").into_owned();
        s = DASH_SPACES_RE.replace_all(&s, "-").into_owned();
        s = SPACES_RE.replace_all(&s, " ").trim().to_string();
        s = s.replace('ё', "е");
        for (kk, ru) in KK_TO_RU {
            s = s.replace(kk, &ru.to_string());
        }
        s = s.replace('і', "и");
        s
    }

    /// Geocode a city (optionally disambiguated by region), trying exact
    /// lookup, alias lookup, then substring match in either direction.
    pub fn geocode(&self, city: &str, region: Option<&str>) -> Option<(f64, f64)> {
        if let Some(coords) = self.geocode_one(city) {
            return Some(coords);
        }
        if let Some(region) = region {
            if !region.trim().is_empty() {
                if let Some(coords) = self.geocode_one(region) {
                    return Some(coords);
                }
            }
        }
        None
    }

    fn geocode_one(&self, text: &str) -> Option<(f64, f64)> {
        let key = self.normalise(text);
        if key.is_empty() {
            return None;
        }
        if let Some(coords) = CITY_COORDS.get(key.as_str()) {
            return Some(*coords);
        }
        if let Some(canonical) = ALIASES.get(key.as_str()) {
            if let Some(coords) = CITY_COORDS.get(canonical) {
                return Some(*coords);
            }
        }
        for (known_key, coords) in CITY_COORDS.iter() {
            if key.contains(known_key) || known_key.contains(key.as_str()) {
                return Some(*coords);
            }
        }
        None
    }

    /// Great-circle distance between two points, in kilometers.
    pub fn distance(&self, a: (f64, f64), b: (f64, f64)) -> f64 {
        let (lat1, lon1) = a;
        let (lat2, lon2) = b;
        let phi1 = lat1.to_radians();
        let phi2 = lat2.to_radians();
        let dphi = (lat2 - lat1).to_radians();
        let dlambda = (lon2 - lon1).to_radians();

        let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
    }

    /// Rank offices with known coordinates by ascending distance from `point`.
    pub fn rank_offices_by_distance(
        &self,
        point: (f64, f64),
        offices: &[(&str, (f64, f64))],
    ) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = offices
            .iter()
            .map(|(name, coords)| (name.to_string(), round2(self.distance(point, *coords))))
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        ranked
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalise_strips_prefixes_and_folds_case() {
        let geo = GeoIndex::new();
        assert_eq!(geo.normalise("г. Алматы"), "алматы");
        assert_eq!(geo.normalise("город Астана"), "астана");
        assert_eq!(geo.normalise("City Almaty"), "almaty");
    }

    #[test]
    fn normalise_folds_dashes_and_kazakh_letters() {
        let geo = GeoIndex::new();
        assert_eq!(geo.normalise("Усть—Каменогорск"), "усть-каменогорск");
        assert_eq!(geo.normalise("Өскемен"), "оскемен");
    }

    #[test]
    fn geocode_exact_and_alias() {
        let geo = GeoIndex::new();
        assert_eq!(geo.geocode("Алматы", None), Some((43.2389, 76.8897)));
        assert_eq!(geo.geocode("Нур-Султан", None), Some((51.1694, 71.4491)));
        assert_eq!(geo.geocode("Oral", None), Some((51.2333, 51.3667)));
    }

    #[test]
    fn geocode_unknown_city_returns_none() {
        let geo = GeoIndex::new();
        assert_eq!(geo.geocode("Atlantis", None), None);
    }

    #[test]
    fn geocode_falls_back_to_region() {
        let geo = GeoIndex::new();
        assert_eq!(geo.geocode("Деревня Нигде", Some("Алматы")), Some((43.2389, 76.8897)));
    }

    #[test]
    fn distance_almaty_to_astana_is_plausible() {
        let geo = GeoIndex::new();
        let almaty = (43.2389, 76.8897);
        let astana = (51.1694, 71.4491);
        let d = geo.distance(almaty, astana);
        // Real-world distance is ~970km; allow generous tolerance for the
        // spherical-earth approximation.
        assert!((900.0..1050.0).contains(&d), "unexpected distance: {d}");
    }

    #[test]
    fn distance_is_symmetric_and_zero_for_same_point() {
        let geo = GeoIndex::new();
        let p = (43.2389, 76.8897);
        assert_eq!(geo.distance(p, p), 0.0);
        let q = (51.1694, 71.4491);
        assert!((geo.distance(p, q) - geo.distance(q, p)).abs() < 1e-9);
    }

    #[test]
    fn rank_offices_orders_ascending() {
        let geo = GeoIndex::new();
        let almaty = (43.2389, 76.8897);
        let offices = [("Астана", (51.1694, 71.4491)), ("Шымкент", (42.3417, 69.5901))];
        let ranked = geo.rank_offices_by_distance(almaty, &offices);
        assert_eq!(ranked[0].0, "Шымкент");
        assert_eq!(ranked[1].0, "Астана");
    }
}
