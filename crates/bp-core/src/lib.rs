pub mod error;
pub mod page_id;
pub mod types;
pub mod value;

pub use error::StoryError;
pub use page_id::*;
pub use types::*;
pub use value::*;
