//! Text-level helpers for reconstruction: normalization, hyphenation and
//! sentence segmentation.

pub mod hyphenation;
pub mod normalize;
pub mod sentence;

pub use hyphenation::ends_with_wrap_hyphen;
pub use normalize::{collapse_whitespace, expand_ligature_char, expand_ligatures, normalize_token};
pub use sentence::{SentenceSplitter, DEFAULT_ABBREVIATIONS};
