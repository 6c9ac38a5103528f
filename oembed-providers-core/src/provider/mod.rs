// oEmbed Provider Records
//
// Raw records (external database entries and projected custom providers)
// flow through `merge` -> `sort_by_name` -> `build_providers`, which yields
// the validated, immutable `Provider` set handed to the host.

pub mod error;
pub mod merge;
pub mod model;
pub mod raw;

pub use error::ValidationError;
pub use merge::{build_providers, lookup, merge, sort_by_name, ProviderMap};
pub use model::{Endpoint, Format, Provider};
pub use raw::{RawEndpoint, RawProvider};
