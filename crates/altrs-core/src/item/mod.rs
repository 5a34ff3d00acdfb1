// Altrs Items
// Named records and the ordered lists that hold them

pub mod list;
pub mod named;

pub use list::NamedItemList;
pub use named::{AppItem, ItemChange, Named, NamedItem};
