use modelhost_sdk::ModelHostClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = ModelHostClient::builder().build()?;

    for model in client.list_models().await {
        println!("{}\t{} bytes\t{}", model.name, model.size, model.modified_at);
    }

    Ok(())
}
