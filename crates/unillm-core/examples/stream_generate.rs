use futures::StreamExt;
use std::io::Write;
use unillm_core::{CancellationToken, Client, ClientConfig, GenerationRequest, LlmError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let provider = std::env::args().nth(1).unwrap_or_else(|| "openai".to_string());
    let config = ClientConfig::default().with_streaming(true);
    let client = Client::from_name(&provider, None, Some(config))?;

    // 1. Pull deltas off the stream directly
    let mut stream = client
        .generate_stream(GenerationRequest::new("Write a haiku about rust.").system("Be vivid"))
        .await?;
    while let Some(delta) = stream.next().await {
        print!("{}", delta?);
        std::io::stdout().flush()?;
    }
    println!();

    // 2. Callback form; the caller accumulates
    let mut story = String::new();
    let full = client
        .generate_with(GenerationRequest::new("Tell a two sentence story."), |chunk| {
            print!("{chunk}");
            story.push_str(chunk);
        })
        .await?;
    println!();
    assert!(full.is_none());
    println!("📊 {} characters streamed", story.chars().count());

    // 3. Cancel after two seconds
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        canceller.cancel();
    });

    let request = GenerationRequest::new("Count slowly from one to one hundred.").cancellation(token);
    let mut stream = client.generate_stream(request).await?;
    while let Some(delta) = stream.next().await {
        match delta {
            Ok(text) => print!("{text}"),
            Err(LlmError::Cancelled) => {
                println!("\n⏹ cancelled");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
