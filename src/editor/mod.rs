//! Editor surface - the source buffer, cursor, and modal editing

mod buffer;
mod cursor;
mod editor;
mod mode;

pub use buffer::Buffer;
pub use cursor::Cursor;
pub use editor::{Editor, Request};
pub use mode::Mode;
