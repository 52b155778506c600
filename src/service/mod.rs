//! Services behind the HTTP handlers: admin record pipelines and the public posts read.

mod posts;
mod records;
mod validation;
pub use posts::{PostService, PostsQuery};
pub use records::{coerce, list_query, RecordService};
pub use validation::RequestValidator;
