pub mod error;
pub mod factory;
pub mod fetch;
pub mod filmoteca;
pub mod mooby;
pub mod renoir;
pub mod text;
pub mod tmdb;
pub mod traits;
pub mod verdi;
pub mod zumzeig;

pub use error::{FetchError, ParseError, RecordError, TmdbError};
pub use factory::{SourceCatalog, SourceFactory};
pub use fetch::{HttpFetcher, PageFetcher};
pub use tmdb::{MetadataProvider, TmdbClient};
pub use traits::{CinemaSource, ListingPage};
