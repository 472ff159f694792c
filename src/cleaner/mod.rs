pub mod engine;

pub use engine::{remove_items, remove_items_with, CleanReport, Deleter, PermanentDelete};
