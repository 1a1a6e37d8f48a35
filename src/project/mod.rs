pub mod artifact;
pub mod conversion;
pub mod definition;
pub mod settings;

pub use artifact::*;
pub use conversion::*;
pub use definition::*;
pub use settings::*;
