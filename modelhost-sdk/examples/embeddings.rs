use modelhost_sdk::ModelHostClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = ModelHostClient::builder().build()?;

    let embedding = client
        .embed("The quick brown fox jumps over the lazy dog", None)
        .await?;

    println!("{} dimensions", embedding.len());
    println!("first values: {:?}", &embedding[..embedding.len().min(8)]);

    Ok(())
}
