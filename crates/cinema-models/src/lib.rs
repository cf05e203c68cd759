pub mod month;
pub mod movie;
pub mod screening;
pub mod showtime;
pub mod snapshot;

pub use month::{Month, MonthParseError};
pub use movie::Movie;
pub use screening::ScreeningRecord;
pub use showtime::{earliest_showtime, normalize_showtime};
pub use snapshot::MonthSnapshot;
