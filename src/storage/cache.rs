use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;

use crate::schedule::{Appointment, ProfessionalId, WeekWindow};

pub const KEY_PREFIX: &str = "agendamentos_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub professional_id: ProfessionalId,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

impl CacheKey {
    pub fn new(professional_id: ProfessionalId, window: &WeekWindow) -> Self {
        Self {
            professional_id,
            week_start: window.start(),
            week_end: window.end(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}_{}_{}",
            KEY_PREFIX,
            self.professional_id,
            self.week_start.format("%Y-%m-%d"),
            self.week_end.format("%Y-%m-%d"),
        )
    }
}

#[derive(Debug, Default)]
pub struct WeeklyCache {
    entries: HashMap<CacheKey, Vec<Appointment>>,
}

impl WeeklyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, professional_id: ProfessionalId, window: &WeekWindow) -> Option<&[Appointment]> {
        self.entries
            .get(&CacheKey::new(professional_id, window))
            .map(Vec::as_slice)
    }

    pub fn put(&mut self, professional_id: ProfessionalId, window: &WeekWindow, appointments: Vec<Appointment>) {
        let key = CacheKey::new(professional_id, window);
        tracing::debug!("Caching {} appointments under {}", appointments.len(), key);
        self.entries.insert(key, appointments);
    }

    pub fn invalidate(&mut self, professional_id: Option<ProfessionalId>) {
        match professional_id {
            Some(id) => {
                let before = self.entries.len();
                self.entries.retain(|key, _| key.professional_id != id);
                tracing::debug!(
                    "Invalidated {} cached weeks for professional {}",
                    before - self.entries.len(),
                    id
                );
            }
            None => {
                tracing::debug!("Clearing {} cached weeks", self.entries.len());
                self.entries.clear();
            }
        }
    }

    pub fn contains(&self, professional_id: ProfessionalId, window: &WeekWindow) -> bool {
        self.entries.contains_key(&CacheKey::new(professional_id, window))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn window(year: i32, month: u32, day: u32) -> WeekWindow {
        WeekWindow::containing(NaiveDate::from_ymd_opt(year, month, day).unwrap())
    }

    fn create_test_appointment(id: i64, professional_id: ProfessionalId) -> Appointment {
        let start = NaiveDate::from_ymd_opt(2025, 10, 30)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Appointment {
            id,
            start,
            end: start + chrono::Duration::hours(1),
            title: format!("Consulta {}", id),
            description: "Sem descrição".to_string(),
            client_id: Some(1),
            professional_id: Some(professional_id),
            color: "#DBE9FE".to_string(),
            cancelled: Some(false),
            cancelled_at: None,
        }
    }

    #[test]
    fn key_renders_prefix_professional_and_iso_dates() {
        let key = CacheKey::new(5, &window(2025, 10, 30));

        assert_eq!(key.to_string(), "agendamentos_5_2025-10-26_2025-11-01");
    }

    #[test]
    fn key_is_deterministic_for_recomputed_windows() {
        let first = CacheKey::new(5, &window(2025, 10, 27));
        let second = CacheKey::new(5, &window(2025, 10, 31));

        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn put_then_get_returns_identical_list() {
        let mut cache = WeeklyCache::new();
        let appointments = vec![create_test_appointment(1, 5), create_test_appointment(2, 5)];

        cache.put(5, &window(2025, 10, 30), appointments.clone());

        assert_eq!(cache.get(5, &window(2025, 10, 30)), Some(appointments.as_slice()));
    }

    #[test]
    fn get_missing_week_returns_none() {
        let mut cache = WeeklyCache::new();
        cache.put(5, &window(2025, 10, 30), vec![create_test_appointment(1, 5)]);

        assert_eq!(cache.get(5, &window(2025, 11, 6)), None);
        assert_eq!(cache.get(6, &window(2025, 10, 30)), None);
    }

    #[test]
    fn put_replaces_entry_wholesale() {
        let mut cache = WeeklyCache::new();
        cache.put(5, &window(2025, 10, 30), vec![create_test_appointment(1, 5), create_test_appointment(2, 5)]);

        cache.put(5, &window(2025, 10, 30), vec![create_test_appointment(3, 5)]);

        let ids: Vec<i64> = cache.get(5, &window(2025, 10, 30)).unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidating_one_professional_keeps_others() {
        let mut cache = WeeklyCache::new();
        cache.put(1, &window(2025, 10, 30), vec![create_test_appointment(1, 1)]);
        cache.put(1, &window(2025, 11, 6), vec![create_test_appointment(2, 1)]);
        cache.put(12, &window(2025, 10, 30), vec![create_test_appointment(3, 12)]);

        cache.invalidate(Some(1));

        assert!(!cache.contains(1, &window(2025, 10, 30)));
        assert!(!cache.contains(1, &window(2025, 11, 6)));
        assert!(cache.get(12, &window(2025, 10, 30)).is_some());
    }

    #[test]
    fn invalidating_everything_clears_cache() {
        let mut cache = WeeklyCache::new();
        cache.put(1, &window(2025, 10, 30), vec![]);
        cache.put(2, &window(2025, 10, 30), vec![]);

        cache.invalidate(None);

        assert!(cache.is_empty());
    }

    #[test]
    fn empty_week_is_still_a_hit() {
        let mut cache = WeeklyCache::new();
        cache.put(1, &window(2025, 10, 30), vec![]);

        assert_eq!(cache.get(1, &window(2025, 10, 30)), Some(&[][..]));
    }
}
