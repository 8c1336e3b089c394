pub mod accessor;
pub mod distance;
pub mod radial;
pub mod douglas_peucker;
pub mod simplify;
pub mod batch;
pub mod track;
pub mod error;

pub use accessor::{Coordinates, CoordinateProvider, Dimensions, DirectAccessor, FeatureAccessor, FieldAccessor, FieldNames};
pub use error::{SimplifyError, TrackError};
pub use simplify::{select, Simplified, Simplifier, SimplifyOptions};
