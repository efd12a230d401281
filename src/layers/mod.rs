pub mod marker;

pub use marker::{AnnotationStore, Marker};
