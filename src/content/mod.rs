//! Content module - posts, the listing state and reading time

mod listing;
pub mod loader;
mod post;
pub mod reading;

pub use listing::ListingPage;
pub use post::{
    ContentBlock, ContentSliceData, DateFormatter, ImageField, PostDetail, PostDetailData,
    PostPagination, PostSummary, PostSummaryData,
};
