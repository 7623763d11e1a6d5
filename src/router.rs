//! Deterministic, single-threaded ticket-to-manager routing (C8).
//!
//! Runs strictly sequentially after the concurrent enrichment phase (spec
//! §5) — manager load is mutated in place as each ticket is routed, so no
//! locking is needed. Grounded on
//! `examples/original_source/engine.py` (`FIREEngine`).

use std::collections::HashMap;
use std::time::Instant;

use crate::geo::{round2, GeoIndex};
use crate::models::{
    Assignment, Category, Enrichment, Language, Manager, Office, OfficeReason, Segment, Ticket,
    Trace, ESCALATION_SENTINEL,
};

const CHIEF_POSITION_PATTERNS: &[&str] = &["глав", "chief", "гл. спец", "гл спец"];

fn is_chief(position_normalised: &str) -> bool {
    CHIEF_POSITION_PATTERNS
        .iter()
        .any(|p| position_normalised.starts_with(p) || position_normalised.contains(p))
}

fn normalise_position(position: &str) -> String {
    position
        .to_lowercase()
        .replace('ё', "е")
        .replace("специалист", "спец")
        .trim()
        .to_string()
}

fn parse_skills(skills: &str) -> std::collections::HashSet<String> {
    skills
        .replace(';', ",")
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Routes enriched tickets to managers, tracking per-manager load and a
/// full decision [`Trace`] for every assignment.
pub struct Router {
    geo: GeoIndex,
    managers: Vec<Manager>,
    offices: Vec<String>,
    office_coords: HashMap<String, (f64, f64)>,
    /// Ultimate default office and ultimate-default-even/odd alternation seed —
    /// `fallback_capitals[1]` (Astana in the reference deployment).
    default_office: String,
    /// The other half of the 50/50 alternation — `fallback_capitals[0]`
    /// (Almaty in the reference deployment).
    alt_office: String,
    rr_counters: HashMap<(String, String), u64>,
    unknown_loc_counter: u64,
    rr_spread_threshold: i64,
}

impl Router {
    /// Build a router from raw manager/office records, deduplicating and
    /// coercing corrupt fields. Returns warnings for anything coerced
    /// (spec §7 "Manager name collision on input" / "Corrupt manager load").
    ///
    /// `fallback_capitals` names the ordered pair of offices used by the
    /// non-KZ 50/50 default and the no-coordinates nearest-manager fallback
    /// (spec §4.8.1); office names are matched against it by substring, the
    /// same way `engine.py` locates its Astana/Almaty offices by name.
    pub fn new(
        managers: Vec<Manager>,
        offices: Vec<Office>,
        rr_spread_threshold: i64,
        fallback_capitals: &[String],
    ) -> (Self, Vec<String>) {
        let geo = GeoIndex::new();
        let mut warnings = Vec::new();

        let mut seen_names = std::collections::HashSet::new();
        let mut prepared = Vec::with_capacity(managers.len());
        for mut manager in managers {
            if !seen_names.insert(manager.name.clone()) {
                warnings.push(format!(
                    "duplicate manager name `{}` — keeping first occurrence",
                    manager.name
                ));
                continue;
            }
            if manager.load < 0 {
                warnings.push(format!(
                    "manager `{}` had a negative load ({}) — coerced to 0",
                    manager.name, manager.load
                ));
                manager.load = 0;
            }
            let pos_norm = normalise_position(&manager.position);
            manager.chief = is_chief(&pos_norm);
            manager.skill_set = parse_skills(&manager.skills);
            prepared.push(manager);
        }

        let office_names: Vec<String> = offices.iter().map(|o| o.name.clone()).collect();

        let mut office_coords = HashMap::new();
        for office in &offices {
            let coords = match (office.lat, office.lon) {
                (Some(lat), Some(lon)) => Some((lat, lon)),
                _ => geo.geocode(&office.name, None),
            };
            if let Some(coords) = coords {
                office_coords.insert(office.name.clone(), coords);
            } else {
                warnings.push(format!("could not geocode office `{}`", office.name));
            }
        }

        let find_office = |pattern: &str| -> String {
            office_names
                .iter()
                .find(|name| name.to_lowercase().contains(pattern))
                .cloned()
                .unwrap_or_else(|| {
                    let mut chars = pattern.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                        None => String::new(),
                    }
                })
        };
        let mut capitals = fallback_capitals.iter();
        let alt_capital = capitals.next().map(|s| geo.normalise(s)).unwrap_or_default();
        let default_capital = capitals.next().map(|s| geo.normalise(s)).unwrap_or_default();
        let default_office = find_office(&default_capital);
        let alt_office = find_office(&alt_capital);

        let router = Self {
            geo,
            managers: prepared,
            offices: office_names,
            office_coords,
            default_office,
            alt_office,
            rr_counters: HashMap::new(),
            unknown_loc_counter: 0,
            rr_spread_threshold,
        };
        (router, warnings)
    }

    /// Route one enriched ticket, returning its [`Assignment`].
    #[tracing::instrument(skip(self, ticket, enrichment), fields(guid = %ticket.guid))]
    pub fn route(&mut self, ticket: &Ticket, enrichment: &Enrichment) -> Assignment {
        let start = Instant::now();
        let segment = Segment::normalise(&ticket.segment);
        let category = enrichment.category;
        let language = enrichment.language;

        let (office, office_reason, distance_km) = self.get_office(ticket, enrichment);

        let pool: Vec<usize> = self.managers_in_office(&office);
        let mut trace = Trace {
            home_office: office.clone(),
            office_reason: office_reason.as_str().to_string(),
            initial_pool: pool.len(),
            ..Trace::default()
        };

        let subset = self.apply_filters(&pool, &segment, category, language);
        if segment.is_vip_or_priority() {
            trace.after_vip = Some(subset.len());
        }
        if category == Category::ChangeOfData {
            trace.after_chief = Some(subset.len());
        }
        if language.requires_skill_match() {
            trace.after_lang = Some(subset.len());
        }

        if !subset.is_empty() {
            let rr_key = (office.clone(), language.as_str().to_string());
            let mut ranked = subset.clone();
            ranked.sort_by(|&a, &b| {
                self.managers[a]
                    .load
                    .cmp(&self.managers[b].load)
                    .then_with(|| self.managers[a].name.cmp(&self.managers[b].name))
            });
            trace.top2 = ranked.iter().take(2).map(|&i| self.managers[i].name.clone()).collect();

            let (selected, rr_counter) = self.select_manager(&subset, rr_key);
            let manager_name = self.managers[selected].name.clone();
            trace.rr_counter = rr_counter;
            trace.escalation = false;
            trace.selected = Some(manager_name.clone());
            trace.routing_ms = start.elapsed().as_millis() as u64;

            return Assignment {
                guid: ticket.guid.clone(),
                enrichment: enrichment.clone(),
                office,
                office_reason,
                distance_km,
                manager: manager_name,
                trace,
            };
        }

        trace.escalation_reason = Some("no_suitable_manager_in_home_office".to_string());
        match self.find_nearest_manager(ticket, enrichment, &office, &segment, category, language) {
            Some((manager_name, near_office, near_dist, rr_counter)) => {
                trace.escalation = false;
                trace.redirected_to_office = Some(near_office.clone());
                trace.redirected_distance_km = near_dist;
                trace.rr_counter = rr_counter;
                trace.selected = Some(manager_name.clone());
                trace.routing_ms = start.elapsed().as_millis() as u64;
                Assignment {
                    guid: ticket.guid.clone(),
                    enrichment: enrichment.clone(),
                    office: near_office,
                    office_reason: OfficeReason::NearestOffice,
                    distance_km: near_dist,
                    manager: manager_name,
                    trace,
                }
            }
            None => {
                tracing::warn!(guid = %ticket.guid, "no manager found anywhere — escalating");
                trace.escalation = true;
                trace.routing_ms = start.elapsed().as_millis() as u64;
                Assignment {
                    guid: ticket.guid.clone(),
                    enrichment: enrichment.clone(),
                    office,
                    office_reason,
                    distance_km,
                    manager: ESCALATION_SENTINEL.to_string(),
                    trace,
                }
            }
        }
    }

    fn managers_in_office(&self, office: &str) -> Vec<usize> {
        self.managers
            .iter()
            .enumerate()
            .filter(|(_, m)| m.office == office)
            .map(|(i, _)| i)
            .collect()
    }

    /// Home-office selection ladder (spec §4.8.1): explicit coords → geocoded
    /// city/region → office-name substring match → non-KZ 50/50 → default.
    fn get_office(
        &mut self,
        ticket: &Ticket,
        enrichment: &Enrichment,
    ) -> (String, OfficeReason, Option<f64>) {
        let country = ticket.country.to_lowercase();
        let city_raw = ticket.city.trim();

        if let (Some(lat), Some(lon)) = (ticket.lat.or(enrichment.lat), ticket.lon.or(enrichment.lon)) {
            if let Some((office, dist)) = self.nearest_office_by_coords((lat, lon), None) {
                return (office, OfficeReason::ByCoords, Some(dist));
            }
        }

        if let Some((lat, lon)) = self.geo.geocode(city_raw, Some(ticket.region.trim())) {
            if let Some((office, dist)) = self.nearest_office_by_coords((lat, lon), None) {
                return (office, OfficeReason::ByDistance, Some(dist));
            }
        }

        let city_norm = self.geo.normalise(city_raw);
        if !city_norm.is_empty() {
            for office in &self.offices {
                let office_norm = self.geo.normalise(office);
                if !office_norm.is_empty()
                    && (office_norm.contains(&city_norm) || city_norm.contains(&office_norm))
                {
                    return (office.clone(), OfficeReason::ByMatch, None);
                }
            }
        }

        let is_kz = country.contains("kaz") || country.contains("каз");
        let is_unknown = matches!(country.as_str(), "" | "nan" | "none");
        if !is_kz && !is_unknown {
            let pick = if self.unknown_loc_counter % 2 == 0 {
                &self.default_office
            } else {
                &self.alt_office
            };
            let office = pick.clone();
            self.unknown_loc_counter += 1;
            return (office, OfficeReason::FiftyFifty, None);
        }

        (self.default_office.clone(), OfficeReason::Default, None)
    }

    fn nearest_office_by_coords(&self, point: (f64, f64), exclude: Option<&str>) -> Option<(String, f64)> {
        self.office_coords
            .iter()
            .filter(|(name, _)| exclude != Some(name.as_str()))
            .map(|(name, coords)| (name.clone(), round2(self.geo.distance(point, *coords))))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
    }

    fn offices_sorted_by_distance(&self, point: (f64, f64)) -> Vec<(String, f64)> {
        let pairs: Vec<(&str, (f64, f64))> =
            self.office_coords.iter().map(|(name, coords)| (name.as_str(), *coords)).collect();
        self.geo.rank_offices_by_distance(point, &pairs)
    }

    fn apply_filters(
        &self,
        pool: &[usize],
        segment: &Segment,
        category: Category,
        language: Language,
    ) -> Vec<usize> {
        pool.iter()
            .copied()
            .filter(|&i| {
                let m = &self.managers[i];
                if segment.is_vip_or_priority() && !m.has_skill("VIP") {
                    return false;
                }
                if category == Category::ChangeOfData && !m.chief {
                    return false;
                }
                if language.requires_skill_match() && !m.has_skill(language.as_str()) {
                    return false;
                }
                true
            })
            .collect()
    }

    /// Ordered, strictest-to-loosest filter passes for the nearest-office
    /// fallback ladder (spec §4.8.3).
    fn filter_passes(
        &self,
        segment: &Segment,
        category: Category,
        language: Language,
    ) -> Vec<Box<dyn Fn(&[usize]) -> Vec<usize> + '_>> {
        let is_vip = segment.is_vip_or_priority();
        let is_chief_required = category == Category::ChangeOfData;
        let is_lang_required = language.requires_skill_match();

        let full = {
            let segment = segment.clone();
            move |pool: &[usize]| self.apply_filters(pool, &segment, category, language)
        };
        let no_lang = move |pool: &[usize]| -> Vec<usize> {
            pool.iter()
                .copied()
                .filter(|&i| {
                    let m = &self.managers[i];
                    (!is_vip || m.has_skill("VIP")) && (!is_chief_required || m.chief)
                })
                .collect()
        };
        let vip_only = move |pool: &[usize]| -> Vec<usize> {
            if !is_vip {
                return pool.to_vec();
            }
            pool.iter().copied().filter(|&i| self.managers[i].has_skill("VIP")).collect()
        };
        let any_manager = move |pool: &[usize]| -> Vec<usize> { pool.to_vec() };

        let mut passes: Vec<Box<dyn Fn(&[usize]) -> Vec<usize> + '_>> = vec![Box::new(full)];
        if is_lang_required {
            passes.push(Box::new(no_lang));
        }
        if is_vip || is_chief_required {
            passes.push(Box::new(vip_only));
        }
        passes.push(Box::new(any_manager));
        passes
    }

    fn get_ticket_coords(&self, ticket: &Ticket, enrichment: &Enrichment) -> Option<(f64, f64)> {
        match (ticket.lat.or(enrichment.lat), ticket.lon.or(enrichment.lon)) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => self.geo.geocode(ticket.city.trim(), Some(ticket.region.trim())),
        }
    }

    /// Hierarchical fallback search across nearby offices (spec §4.8.3):
    /// runs each filter pass across every office before relaxing further.
    fn find_nearest_manager(
        &mut self,
        ticket: &Ticket,
        enrichment: &Enrichment,
        current_office: &str,
        segment: &Segment,
        category: Category,
        language: Language,
    ) -> Option<(String, String, Option<f64>, Option<u64>)> {
        let coords = self.get_ticket_coords(ticket, enrichment);

        let selection = match coords {
            None => {
                let candidates = [self.default_office.clone(), self.alt_office.clone()];
                let passes = self.filter_passes(segment, category, language);
                let mut found = None;
                'outer: for fallback_office in candidates {
                    if fallback_office == current_office {
                        continue;
                    }
                    let pool = self.managers_in_office(&fallback_office);
                    for pass in &passes {
                        let subset = pass(&pool);
                        if !subset.is_empty() {
                            found = Some((subset, fallback_office, None));
                            break 'outer;
                        }
                    }
                }
                found
            }
            Some(point) => {
                let offices_by_dist = self.offices_sorted_by_distance(point);
                let passes = self.filter_passes(segment, category, language);
                let mut found = None;
                'outer: for pass in &passes {
                    for (office, dist) in &offices_by_dist {
                        if office == current_office {
                            continue;
                        }
                        let pool = self.managers_in_office(office);
                        let subset = pass(&pool);
                        if !subset.is_empty() {
                            found = Some((subset, office.clone(), Some(*dist)));
                            break 'outer;
                        }
                    }
                }
                found
            }
        };

        let (subset, office, dist) = selection?;
        let rr_key = (office.clone(), language.as_str().to_string());
        let (selected, rr_counter) = self.select_manager(&subset, rr_key);
        let name = self.managers[selected].name.clone();
        Some((name, office, dist, rr_counter))
    }

    /// Weighted round-robin (spec §4.8.2): if the load spread across the
    /// candidate subset exceeds the fairness threshold, always pick the
    /// least-loaded manager; otherwise alternate between the top two.
    ///
    /// Returns the selected index and, only when the RR-alternation branch
    /// fires, the counter value it used — the least-loaded-override branch
    /// never touches `rr_counters`, matching `engine.py::_select_manager`.
    fn select_manager(&mut self, subset: &[usize], rr_key: (String, String)) -> (usize, Option<u64>) {
        let mut sorted = subset.to_vec();
        sorted.sort_by(|&a, &b| {
            self.managers[a]
                .load
                .cmp(&self.managers[b].load)
                .then_with(|| self.managers[a].name.cmp(&self.managers[b].name))
        });

        let (selected_index, rr_counter) = if sorted.len() > 1 {
            let min_load = self.managers[sorted[0]].load;
            let max_load = self.managers[*sorted.last().unwrap()].load;
            if max_load - min_load > self.rr_spread_threshold {
                (sorted[0], None)
            } else {
                let top2 = &sorted[..sorted.len().min(2)];
                let counter = self.rr_counters.entry(rr_key).or_insert(0);
                let used = *counter;
                let chosen = top2[(used as usize) % top2.len()];
                *counter += 1;
                (chosen, Some(used))
            }
        } else {
            (sorted[0], None)
        };

        self.managers[selected_index].load += 1;
        (selected_index, rr_counter)
    }

    /// Final manager loads, for the run-summary Gini computation.
    pub fn manager_loads(&self) -> Vec<i64> {
        self.managers.iter().map(|m| m.load).collect()
    }
}
