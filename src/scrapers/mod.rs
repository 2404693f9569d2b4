pub mod browser;
pub mod fallback;
pub mod fields;
pub mod realtor;
pub mod redfin;
pub mod target;
pub mod traits;
pub mod zillow;

pub use traits::{adapter_for, Extractor};
