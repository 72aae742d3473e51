pub mod research;

pub use research::{ResearchEngine, ResearchResult, NOT_FOUND_ANSWER};
