use breakwise_core::{App, Config};

pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open(config)?;
    println!("{}", serde_json::to_string_pretty(&app.status())?);
    Ok(())
}
