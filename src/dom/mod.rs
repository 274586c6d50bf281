pub mod query;

pub use query::{DocumentState, ElementRef, ElementSnapshot, PageHost, PageQuery};
