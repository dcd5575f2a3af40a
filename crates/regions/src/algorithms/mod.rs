pub mod contrast;
pub mod threshold;
pub mod binarize;
pub mod morphology;
pub mod extraction;
pub mod metrics;
pub mod regions;

pub use contrast::*;
pub use threshold::*;
pub use binarize::*;
pub use morphology::*;
pub use extraction::*;
pub use metrics::*;
pub use regions::*;
