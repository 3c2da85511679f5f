use std::io::Write;

use modelhost_sdk::ModelHostClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = ModelHostClient::builder().build()?;

    let model = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "llama3.2:3b".to_string());

    println!("Pulling {}...", model);
    client
        .pull_model(&model, |fraction| {
            print!("\r{:.1}%", fraction * 100.0);
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!("\nDone.");

    Ok(())
}
