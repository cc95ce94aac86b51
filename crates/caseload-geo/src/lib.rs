//! Location resolution: coordinate cache, reverse geocoding, continent annotation.

pub mod cache;
mod error;
pub mod http;
pub mod resolver;

pub use cache::LocationCache;
pub use error::{CacheError, GeocodeError, ResolveError};
pub use http::{DEFAULT_GEOCODE_URL, GeocodeClient};
pub use resolver::{Geocoder, ResolveReport, annotate, pending_coordinates, resolve_locations};
