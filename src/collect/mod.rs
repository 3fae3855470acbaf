//! Form input collection: the current field values and the rules that guard
//! them, for both dropdown selection and voice transcripts.

pub mod fields;

pub use fields::{normalize_case, CollectError, FormField, InputCollector, RequestFields};
