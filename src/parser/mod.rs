//! Archive loading and text/date parsing helpers.

pub mod archive;
pub mod date;
pub mod markup;
