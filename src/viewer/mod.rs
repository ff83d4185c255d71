//! 展示层：书架列表和分页阅读

pub mod library;
pub mod pager;

pub use library::{action, badge, render_library, LibraryAction};
pub use pager::{Pager, PagerView};
