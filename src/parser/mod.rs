// Token grammars for raw CSV fields

pub mod lexer;
pub mod token;

// Public API re-exports
pub use token::{parse_bool, parse_clock, parse_edge_list, parse_float, parse_int};
