pub mod redirect;
pub mod slug_cache;

pub use redirect::{Outcome, RedirectFlow, RequestMeta, Selection};
pub use slug_cache::SlugCache;
