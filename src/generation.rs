// Reference Data Generations
//
// A Generation is one immutable snapshot of reference data: the entity table
// plus the prefix and exception indices built from every loaded provider.
// Reloading builds a new Generation and swaps it into the ReferenceStore;
// callers already holding the previous one keep using it until they drop it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{LookupError, Result};
use crate::index::{ExceptionIndex, PrefixIndex, ProviderPriority, Ranked};
use crate::model::{Entity, Exception, InvalidOperation, PrefixRule, ZoneException};
use crate::normalize::NormalizedData;

/// Record counts for one generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub providers: Vec<String>,
    pub entities: usize,
    pub prefixes: usize,
    pub exceptions: usize,
    pub zone_exceptions: usize,
    pub invalid_operations: usize,
    pub warnings: usize,
}

/// Immutable reference data snapshot
#[derive(Debug)]
pub struct Generation {
    id: Uuid,
    created_at: DateTime<Utc>,
    providers: Vec<String>,
    entities: HashMap<u16, Entity>,
    prefixes: PrefixIndex,
    exceptions: ExceptionIndex<Exception>,
    zone_exceptions: ExceptionIndex<ZoneException>,
    invalid_operations: ExceptionIndex<InvalidOperation>,
    warnings: Vec<String>,
}

impl Generation {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Providers in priority order
    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    pub fn entity(&self, adif: u16) -> Option<&Entity> {
        self.entities.get(&adif)
    }

    /// Entity by ADIF number
    pub fn lookup_entity(&self, adif: u16) -> Result<&Entity> {
        self.entity(adif).ok_or_else(|| LookupError::NoMatch {
            callsign: format!("ADIF {}", adif),
        })
    }

    pub fn lookup_exception(&self, call: &str, at: DateTime<Utc>) -> Option<&Exception> {
        self.exceptions.lookup(&crate::callsign::normalize(call), at)
    }

    pub fn lookup_prefix(&self, text: &str, at: DateTime<Utc>) -> Option<&PrefixRule> {
        self.prefixes.lookup_best(&crate::callsign::normalize(text), at)
    }

    /// CQ zone that overrides the entity's zone for `call` at `at`
    pub fn zone_exception(&self, call: &str, at: DateTime<Utc>) -> Option<u8> {
        self.zone_exceptions
            .lookup(&crate::callsign::normalize(call), at)
            .map(|z| z.cq_zone)
    }

    /// Whether `call` is listed as an invalid operation at `at`
    pub fn is_invalid_operation(&self, call: &str, at: DateTime<Utc>) -> bool {
        self.invalid_operations
            .lookup(&crate::callsign::normalize(call), at)
            .is_some()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn stats(&self) -> GenerationStats {
        GenerationStats {
            id: self.id,
            created_at: self.created_at,
            providers: self.providers.clone(),
            entities: self.entities.len(),
            prefixes: self.prefixes.len(),
            exceptions: self.exceptions.len(),
            zone_exceptions: self.zone_exceptions.len(),
            invalid_operations: self.invalid_operations.len(),
            warnings: self.warnings.len(),
        }
    }

    pub(crate) fn prefix_index(&self) -> &PrefixIndex {
        &self.prefixes
    }

    pub(crate) fn exception_index(&self) -> &ExceptionIndex<Exception> {
        &self.exceptions
    }
}

/// Collects normalized provider output and builds one Generation
#[derive(Debug, Default)]
pub struct GenerationBuilder {
    priority: ProviderPriority,
    sources: Vec<NormalizedData>,
}

impl GenerationBuilder {
    pub fn new(priority: ProviderPriority) -> Self {
        Self {
            priority,
            sources: Vec::new(),
        }
    }

    /// Add one provider's records; later additions count as more recent
    pub fn add(&mut self, data: NormalizedData) -> &mut Self {
        self.sources.push(data);
        self
    }

    pub fn with(mut self, data: NormalizedData) -> Self {
        self.add(data);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn build(self) -> Result<Generation> {
        let ranks = self.priority.ranks(self.sources.iter().map(|d| d.provider.as_str()));
        let rank_of = |provider: &str| ranks.get(provider).copied().unwrap_or(usize::MAX);

        let mut providers: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        // An entity published by several providers comes from the best ranked one
        let mut entities: HashMap<u16, (usize, Entity)> = HashMap::new();
        for data in &self.sources {
            if !providers.contains(&data.provider) {
                providers.push(data.provider.clone());
            }
            warnings.extend(data.warnings.iter().map(|w| format!("{}: {}", data.provider, w)));
            let rank = rank_of(data.provider.as_str());
            for entity in &data.entities {
                match entities.get(&entity.adif) {
                    Some((existing, _)) if *existing < rank => {}
                    _ => {
                        entities.insert(entity.adif, (rank, entity.clone()));
                    }
                }
            }
        }
        providers.sort_by_key(|p| (rank_of(p.as_str()), p.clone()));

        let mut sequence = 0usize;
        let mut prefixes = Vec::new();
        let mut exceptions = Vec::new();
        let mut zone_exceptions = Vec::new();
        let mut invalid_operations = Vec::new();

        for data in self.sources {
            let rank = rank_of(data.provider.as_str());
            for rule in data.prefixes {
                if !entities.contains_key(&rule.adif) {
                    warnings.push(format!("{}: prefix {} refers to unknown ADIF {}", data.provider, rule.pattern, rule.adif));
                    continue;
                }
                prefixes.push(Ranked::new(rule, rank, sequence));
                sequence += 1;
            }
            for exception in data.exceptions {
                if !exception.is_no_dxcc() && !entities.contains_key(&exception.adif) {
                    warnings.push(format!(
                        "{}: exception {} refers to unknown ADIF {}",
                        data.provider, exception.call, exception.adif
                    ));
                    continue;
                }
                exceptions.push(Ranked::new(exception, rank, sequence));
                sequence += 1;
            }
            for zone in data.zone_exceptions {
                zone_exceptions.push(Ranked::new(zone, rank, sequence));
                sequence += 1;
            }
            for invalid in data.invalid_operations {
                invalid_operations.push(Ranked::new(invalid, rank, sequence));
                sequence += 1;
            }
        }

        if entities.is_empty() || (prefixes.is_empty() && exceptions.is_empty()) {
            let provider = if providers.is_empty() { "none".to_string() } else { providers.join(",") };
            return Err(LookupError::SourceDataInvalid {
                provider,
                reason: "no usable reference data".to_string(),
            });
        }

        let generation = Generation {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            providers,
            entities: entities.into_iter().map(|(adif, (_, e))| (adif, e)).collect(),
            prefixes: PrefixIndex::build(prefixes),
            exceptions: ExceptionIndex::build(exceptions),
            zone_exceptions: ExceptionIndex::build(zone_exceptions),
            invalid_operations: ExceptionIndex::build(invalid_operations),
            warnings,
        };

        let stats = generation.stats();
        log::info!(
            "Built generation {} from [{}]: {} entities, {} prefixes, {} exceptions, {} zone exceptions, {} invalid operations ({} warnings)",
            stats.id,
            stats.providers.join(", "),
            stats.entities,
            stats.prefixes,
            stats.exceptions,
            stats.zone_exceptions,
            stats.invalid_operations,
            stats.warnings
        );
        Ok(generation)
    }
}

/// Holds the current generation; swapping is atomic for new readers
#[derive(Debug)]
pub struct ReferenceStore {
    current: RwLock<Arc<Generation>>,
}

impl ReferenceStore {
    pub fn new(generation: Generation) -> Self {
        Self {
            current: RwLock::new(Arc::new(generation)),
        }
    }

    /// The current generation, kept alive for as long as the caller holds it
    pub fn current(&self) -> Arc<Generation> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Install `next` and return the generation it replaced
    pub fn swap(&self, next: Generation) -> Arc<Generation> {
        let next = Arc::new(next);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        log::info!("Swapping reference data generation {} -> {}", guard.id, next.id);
        std::mem::replace(&mut *guard, next)
    }

    /// A handle that does not keep the generation alive
    pub fn handle(&self) -> GenerationHandle {
        GenerationHandle::new(&self.current())
    }

    pub fn generation_id(&self) -> Uuid {
        self.current().id()
    }
}

/// Weak reference to one generation
#[derive(Debug, Clone)]
pub struct GenerationHandle {
    id: Uuid,
    generation: Weak<Generation>,
}

impl GenerationHandle {
    pub fn new(generation: &Arc<Generation>) -> Self {
        Self {
            id: generation.id(),
            generation: Arc::downgrade(generation),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The generation, or StaleGeneration once it has been dropped
    pub fn get(&self) -> Result<Arc<Generation>> {
        self.generation.upgrade().ok_or(LookupError::StaleGeneration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Continent, Exception, ExceptionKind, Overrides, Pattern, Validity};
    use chrono::TimeZone;

    fn germany(name: &str) -> Entity {
        Entity {
            adif: 230,
            name: name.to_string(),
            prefix: "DL".to_string(),
            continent: Continent::EU,
            cq_zone: 14,
            itu_zone: Some(28),
            latitude: 51.0,
            longitude: 10.0,
            validity: Validity::ALWAYS,
            deleted: false,
            whitelist: false,
            whitelist_validity: None,
        }
    }

    fn data(provider: &str, name: &str) -> NormalizedData {
        let mut data = NormalizedData::new(provider);
        data.entities.push(germany(name));
        data.prefixes.push(PrefixRule {
            pattern: Pattern::literal("DL"),
            adif: 230,
            overrides: Overrides::default(),
            validity: Validity::ALWAYS,
            primary: true,
            provider: provider.to_string(),
        });
        data
    }

    #[test]
    fn test_entity_from_best_ranked_provider() {
        let priority = ProviderPriority::new(&["clublog_xml", "cty_dat"]);
        let generation = GenerationBuilder::new(priority)
            .with(data("clublog_xml", "FEDERAL REPUBLIC OF GERMANY"))
            .with(data("cty_dat", "Fed. Rep. of Germany"))
            .build()
            .unwrap();

        assert_eq!(generation.lookup_entity(230).unwrap().name, "FEDERAL REPUBLIC OF GERMANY");
        assert_eq!(generation.providers(), &["clublog_xml".to_string(), "cty_dat".to_string()]);
        assert_eq!(generation.stats().prefixes, 2);
        assert_eq!(generation.lookup_entity(1).unwrap_err().kind(), "NoMatch");

        let now = Utc::now();
        assert!(generation.stats().created_at <= now);
        assert_eq!(generation.lookup_prefix("dl1abc", now).unwrap().provider, "clublog_xml");
    }

    #[test]
    fn test_rules_for_unknown_entities_are_dropped() {
        let mut source = data("test", "Germany");
        source.exceptions.push(Exception {
            call: "XX1XX".to_string(),
            kind: ExceptionKind::Exact,
            adif: 4242,
            overrides: Overrides::default(),
            validity: Validity::ALWAYS,
            provider: "test".to_string(),
        });
        let generation = GenerationBuilder::default().with(source).build().unwrap();
        assert_eq!(generation.stats().exceptions, 0);
        assert_eq!(generation.warnings().len(), 1);
    }

    #[test]
    fn test_empty_builder_fails() {
        let err = GenerationBuilder::default().build().unwrap_err();
        assert_eq!(err.kind(), "SourceDataInvalid");
    }

    #[test]
    fn test_zone_exceptions_and_invalid_operations() {
        let window = Validity::new(
            Some(Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2002, 1, 1, 0, 0, 0).unwrap()),
        )
        .unwrap();
        let mut source = data("test", "Germany");
        source.zone_exceptions.push(ZoneException {
            call: "DL0ZZ".to_string(),
            cq_zone: 15,
            validity: Validity::ALWAYS,
            provider: "test".to_string(),
        });
        source.invalid_operations.push(InvalidOperation {
            call: "DL0BAD".to_string(),
            validity: window,
            provider: "test".to_string(),
        });
        let generation = GenerationBuilder::default().with(source).build().unwrap();

        let inside = Utc.with_ymd_and_hms(2001, 6, 1, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2003, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(generation.zone_exception("dl0zz", inside), Some(15));
        assert_eq!(generation.zone_exception("DL0AA", inside), None);
        assert!(generation.is_invalid_operation("DL0BAD", inside));
        assert!(!generation.is_invalid_operation("DL0BAD", after));
    }

    #[test]
    fn test_swap_keeps_old_generation_for_holders() {
        let store = ReferenceStore::new(GenerationBuilder::default().with(data("test", "A")).build().unwrap());
        let held = store.current();
        let handle = store.handle();
        assert_eq!(handle.id(), held.id());

        let old = store.swap(GenerationBuilder::default().with(data("test", "B")).build().unwrap());
        assert_eq!(old.id(), held.id());
        assert_ne!(store.generation_id(), held.id());
        // Still alive through `held` and `old`
        assert_eq!(handle.get().unwrap().lookup_entity(230).unwrap().name, "A");

        drop(old);
        drop(held);
        assert_eq!(handle.get().unwrap_err(), LookupError::StaleGeneration);
        assert_eq!(store.handle().get().unwrap().lookup_entity(230).unwrap().name, "B");
    }
}
