pub mod ai;
pub mod culture;
pub mod parse;
pub mod prompt;
