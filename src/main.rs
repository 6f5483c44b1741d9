use sieve::config;

fn main() {
    let config = config::Config::from_env().expect("Failed to load configuration");
    let rendered = serde_json::to_string_pretty(&config).expect("Failed to render configuration");
    println!("{}", rendered);
}
