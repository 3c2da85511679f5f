use modelhost_sdk::ModelHostClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = ModelHostClient::builder().build()?;

    let status = client.status().await;
    if status.running {
        println!(
            "Server running (version {})",
            status.version.unwrap_or_else(|| "unknown".to_string())
        );
        for model in status.loaded_models {
            println!("loaded: {}", model);
        }
    } else {
        println!("Server is not running");
    }

    Ok(())
}
