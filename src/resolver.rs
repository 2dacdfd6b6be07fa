// Callsign Resolver
//
// Order of evaluation for a tokenized call (modifier?, base, suffixes):
//
//   1. exception on the whole call as written, when it differs from the base
//   2. exception, then prefix rule, on the prefix modifier
//   3. exception on the base
//   4. prefix rule on the base
//
// The first hit wins. An exception listing the call as counting for no DXCC
// entity ends the search with NoMatch. Suffix modifiers annotate the result but
// never change the entity. Everything here is a pure read of one Generation.

use chrono::{DateTime, Utc};

use crate::callsign::{tokenize, ParsedCallsign};
use crate::error::{LookupError, Result};
use crate::generation::Generation;
use crate::model::{MatchSource, MatchedVia, Overrides, ResolvedEntity, Validity, NO_DXCC};

/// The rule that produced a match, before the entity is attached
struct Hit<'a> {
    adif: u16,
    overrides: &'a Overrides,
    validity: Validity,
    matched: String,
    source: MatchSource,
    via: MatchedVia,
}

fn exception_hit<'a>(generation: &'a Generation, text: &str, at: DateTime<Utc>, via: MatchedVia) -> Option<Hit<'a>> {
    generation.exception_index().lookup(text, at).map(|e| Hit {
        adif: e.adif,
        overrides: &e.overrides,
        validity: e.validity,
        matched: e.call.clone(),
        source: MatchSource::Exception,
        via,
    })
}

fn prefix_hit<'a>(generation: &'a Generation, text: &str, at: DateTime<Utc>, via: MatchedVia) -> Option<Hit<'a>> {
    generation.prefix_index().lookup_best(text, at).map(|r| Hit {
        adif: r.adif,
        overrides: &r.overrides,
        validity: r.validity,
        matched: r.pattern.to_string(),
        source: MatchSource::Prefix,
        via,
    })
}

fn find<'a>(generation: &'a Generation, parsed: &ParsedCallsign, full: &str, at: DateTime<Utc>) -> Option<Hit<'a>> {
    if full != parsed.base {
        if let Some(hit) = exception_hit(generation, full, at, MatchedVia::FullCall) {
            return Some(hit);
        }
    }
    if let Some(modifier) = parsed.prefix_modifier.as_deref() {
        let hit = exception_hit(generation, modifier, at, MatchedVia::Modifier)
            .or_else(|| prefix_hit(generation, modifier, at, MatchedVia::Modifier));
        if hit.is_some() {
            return hit;
        }
        log::debug!("modifier {} of {} has no coverage, falling back to base", modifier, full);
    }
    exception_hit(generation, &parsed.base, at, MatchedVia::Base)
        .or_else(|| prefix_hit(generation, &parsed.base, at, MatchedVia::Base))
}

/// Resolve `raw` against `generation` as of `at`
pub fn resolve_at(generation: &Generation, raw: &str, at: DateTime<Utc>) -> Result<ResolvedEntity> {
    let parsed = tokenize(raw)?;
    let full = parsed.to_string();

    let no_match = || LookupError::NoMatch { callsign: full.clone() };
    let hit = find(generation, &parsed, &full, at).ok_or_else(no_match)?;
    if hit.adif == NO_DXCC {
        log::debug!("{} is listed as no DXCC entity by {}", full, hit.matched);
        return Err(no_match());
    }
    let entity = generation.entity(hit.adif).ok_or_else(no_match)?;

    log::debug!(
        "{} -> {} ({}) via {:?} {:?} {}",
        full,
        entity.name,
        entity.adif,
        hit.via,
        hit.source,
        hit.matched
    );

    Ok(ResolvedEntity {
        entity: hit.overrides.apply(entity),
        callsign: full,
        parsed,
        source: hit.source,
        matched: hit.matched,
        via: hit.via,
        validity: hit.validity,
        generation: generation.id(),
    })
}

/// Resolve `raw` as of now
pub fn resolve(generation: &Generation, raw: &str) -> Result<ResolvedEntity> {
    resolve_at(generation, raw, Utc::now())
}

/// Resolve every call in order; one failure never stops the rest
pub fn resolve_batch<S: AsRef<str>>(generation: &Generation, calls: &[S], at: DateTime<Utc>) -> Vec<Result<ResolvedEntity>> {
    calls
        .iter()
        .map(|call| resolve_at(generation, call.as_ref(), at))
        .collect()
}

impl Generation {
    pub fn resolve(&self, raw: &str) -> Result<ResolvedEntity> {
        resolve(self, raw)
    }

    pub fn resolve_at(&self, raw: &str, at: DateTime<Utc>) -> Result<ResolvedEntity> {
        resolve_at(self, raw, at)
    }

    /// Batch lookup at the current time
    pub fn resolve_batch<S: AsRef<str>>(&self, calls: &[S]) -> Vec<Result<ResolvedEntity>> {
        resolve_batch(self, calls, Utc::now())
    }

    pub fn resolve_batch_at<S: AsRef<str>>(&self, calls: &[S], at: DateTime<Utc>) -> Vec<Result<ResolvedEntity>> {
        resolve_batch(self, calls, at)
    }
}
