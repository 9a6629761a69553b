pub mod diagnosis;
pub mod enums;
pub mod message;
pub mod report;

pub use diagnosis::*;
pub use enums::*;
pub use message::*;
pub use report::*;
