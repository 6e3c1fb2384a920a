pub mod chat;
pub mod highlight;
pub mod message;
pub mod text_range;

pub use chat::Chat;
pub use highlight::Highlight;
pub use message::{Message, Role};
pub use text_range::TextRange;
