// dxlookup Library
// Resolves amateur radio callsigns to DXCC entities from offline reference data

pub mod cache;
pub mod callsign;
pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod model;
pub mod normalize;
pub mod reference;
pub mod resolver;
pub mod source;

pub use cache::{CacheStore, CachedResolver, MemoryCacheStore, SqliteCacheStore};
pub use callsign::{tokenize, Modifier, ParsedCallsign};
pub use config::{CacheConfig, LookupConfig, SourceConfig, SourceKind};
pub use error::{LookupError, Result};
pub use generation::{Generation, GenerationBuilder, GenerationHandle, GenerationStats, ReferenceStore};
pub use index::{ExceptionIndex, PrefixIndex, ProviderPriority};
pub use model::{
    Continent, Entity, Exception, ExceptionKind, MatchSource, MatchedVia, PrefixRule, ResolvedEntity, Validity,
};
pub use normalize::{NormalizedData, Normalizer};
pub use source::{load_generation, load_generation_async};
