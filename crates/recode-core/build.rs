fn main() {
    // Validate the embedded settings at compile time.
    validate_toml(
        "src/default_settings.toml",
        include_str!("src/default_settings.toml"),
    );
}

fn validate_toml(path: &str, content: &str) {
    let value = match content.parse::<toml::Value>() {
        Ok(v) => v,
        Err(_) => panic!("{path} contains invalid TOML"),
    };
    for section in ["beam", "scoring", "text"] {
        if value.get(section).is_none() {
            panic!("{path} is missing the [{section}] section");
        }
    }
}
