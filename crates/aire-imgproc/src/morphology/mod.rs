//! Morphological operators on arbitrary structuring elements.

mod element;
pub use element::*;

mod ops;
pub use ops::*;
