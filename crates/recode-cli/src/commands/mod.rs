pub mod config_ops;
pub mod decode_ops;
pub mod dict_ops;
pub mod recoder_ops;

use std::fs;
use std::process;

use recode_core::symbols::SymbolSet;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            std::process::exit(1);
        })
    };
}
pub(crate) use die;

/// Read a symbol list: one symbol per line, a line holding a single space
/// is the space symbol.
pub(crate) fn load_symbols(file: &str) -> SymbolSet {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let symbols = SymbolSet::parse_lines(&content);
    if symbols.is_empty() {
        eprintln!("Error: {file} contains no symbols");
        process::exit(1);
    }
    symbols
}
