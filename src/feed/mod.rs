//! RSS / Atom / RDF parsing into tolerant entry records.

pub mod dates;
pub mod entry;
pub mod parser;

pub use dates::{parse_date, published_at};
pub use entry::{Entry, MediaKind, MediaRef};
pub use parser::{FeedError, parse_feed, parse_feed_text};
