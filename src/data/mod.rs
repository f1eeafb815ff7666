pub mod one_hot;

pub use one_hot::{decode, encode, predicted_words, split_context};
