use std::fs;

use super::die;

pub fn settings_export() {
    print!("{}", recode_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        recode_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: beam.widths={:?}, beam.top_n={}, scoring.dict_ratio={}, text.simple_text={}",
        s.beam.widths, s.beam.top_n, s.scoring.dict_ratio, s.text.simple_text
    );
}
