use unillm_core::{Client, GenerationRequest, Provider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Pick the provider from argv, e.g. `cargo run --example simple_generate -- claude`
    let provider = match std::env::args().nth(1) {
        Some(name) => Provider::parse(&name)?,
        None => Provider::Google,
    };

    // 1. Credential comes from the provider's environment variables
    let client = Client::new(provider, None, None)?;
    println!("Using {} with model {}", client.provider(), client.default_model());

    // 2. Plain prompt
    let text = client
        .generate(GenerationRequest::new("What is 2 + 2?"))
        .await?;
    println!("🤖 {text}");

    // 3. System instruction and generation parameters
    let request = GenerationRequest::new("Name three primary colors.")
        .system("Answer with a comma separated list and nothing else.")
        .param("temperature", serde_json::json!(0.2));
    println!("🤖 {}", client.generate(request).await?);

    Ok(())
}
