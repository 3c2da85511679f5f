use modelhost_sdk::types::chat::{ChatMessage, SimpleChatRequest};
use modelhost_sdk::ModelHostClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = ModelHostClient::builder().build()?;

    let chat_request = SimpleChatRequest::new("llama3.2:3b".to_string())
        .add_message(ChatMessage::user("What is the capital of France?"));

    let chat_response = client.chat_simple(chat_request).await?;

    println!("Response: {}", chat_response.message.content);

    Ok(())
}
