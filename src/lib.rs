// CRECI Atlas - Core Library
// Data reconciliation pipeline behind the geographic BI dashboard:
// gazetteer loading, source normalization, fuzzy city matching and
// consolidation, plus the user store behind the login screen.

pub mod cache;       // Content-addressed caching (explicit, no TTL)
pub mod config;      // Environment-driven configuration
pub mod consolidate; // Consolidator - merge both categories per city
pub mod error;       // Pipeline error taxonomy
pub mod export;      // CSV export of consolidated records
pub mod gazetteer;   // Gazetteer Loader - canonical municipality list
pub mod matching;    // Fuzzy City Matcher
pub mod normalize;   // Source Table Normalizer
pub mod sources;     // Local spreadsheet loading + degradation policy
pub mod stats;       // Summary KPIs over consolidated records
pub mod users;       // User store + authenticator

// Re-export commonly used types
pub use cache::{fingerprint, CachedGazetteerLoader, ContentCache};
pub use config::AtlasConfig;
pub use consolidate::{ConsolidatedCityRecord, ConsolidationReport, Consolidator};
pub use error::{PipelineError, PipelineResult};
pub use export::{export_consolidated_csv, write_consolidated_csv};
pub use gazetteer::{
    load_gazetteer, normalize_city_name, Gazetteer, Municipality, REGION_CODE_BAHIA,
};
pub use matching::{weighted_ratio, FuzzyMatcher, DEFAULT_FUZZY_THRESHOLD};
pub use normalize::{normalize, NormalizedSourceRow, RawRow, RegionFilter};
pub use sources::{load_spreadsheet, load_table_or_empty, read_spreadsheet};
pub use stats::{filter_by_minimums, top_cities, SummaryStats};
pub use users::{hash_password, verify_password, Authenticator, UserAccount, UserStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
