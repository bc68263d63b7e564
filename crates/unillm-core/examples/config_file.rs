use unillm_core::{Client, ClientConfig, GenerationRequest, Provider};

const SAMPLE: &str = r#"
connect_timeout_seconds = 5
read_timeout_seconds = 30
timeout_seconds = 90
max_retries = 5
backoff_base = 1.5
max_backoff_seconds = 20
stream = false
default_model = "claude-3-5-sonnet-20241022"
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load from a path when given, otherwise from the inline sample
    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::from_toml_str(SAMPLE)?,
    };
    println!("{config:#?}");

    let client = Client::new(Provider::Claude, None, Some(config))?;
    let text = client
        .generate(GenerationRequest::new("Summarize TOML in one sentence."))
        .await?;
    println!("🤖 {text}");
    Ok(())
}
