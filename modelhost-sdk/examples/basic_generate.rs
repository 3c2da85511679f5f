use modelhost_sdk::types::generate::SimpleGenerateRequest;
use modelhost_sdk::ModelHostClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = ModelHostClient::builder().build()?;

    let request = SimpleGenerateRequest::new(
        "llama3.2:3b".to_string(),
        "Why is the sky blue?".to_string(),
    );

    let response = client.generate_simple(request).await?;

    println!("{}", response.response);

    Ok(())
}
