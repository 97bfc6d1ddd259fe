#[cfg(not(target_endian = "little"))]
compile_error!("recode-core requires a little-endian platform");

pub mod code;
pub mod decoder;
pub mod dict;
pub mod recoder;
pub mod settings;
pub mod symbols;
pub mod unicode;
