use futures::StreamExt;
use modelhost_sdk::types::chat::{ChatMessage, ChatStreamEvent, StreamingChatRequest};
use modelhost_sdk::ModelHostClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = ModelHostClient::builder().build()?;

    let chat_request = StreamingChatRequest::new("llama3.2:3b".to_string())
        .add_message(ChatMessage::system("You are a concise assistant."))
        .add_message(ChatMessage::user("Explain ownership in Rust."));

    let mut stream = client.chat_stream(chat_request).await?;

    while let Some(event) = stream.next().await {
        match event {
            Ok(ChatStreamEvent::Message(response)) => print!("{}", response.message.content),
            Ok(ChatStreamEvent::Error(error)) => println!("\nError Chunk: {}", error),
            Ok(ChatStreamEvent::Partial { .. }) => continue,
            Err(e) => eprintln!("Chat Error: {}", e),
        }
    }

    Ok(())
}
