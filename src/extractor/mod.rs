pub mod charset;
pub mod links;
pub mod text;

pub use charset::{DecodedBody, decode_body};
pub use links::extract_links;
pub use text::{is_stopword, page_text, tokenize};
