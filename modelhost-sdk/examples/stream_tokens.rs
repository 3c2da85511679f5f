use std::io::Write;

use modelhost_sdk::ModelHostClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = ModelHostClient::builder().build()?;

    client
        .stream(
            "Write a haiku about borrow checking.",
            |token| {
                print!("{}", token);
                let _ = std::io::stdout().flush();
            },
            None,
            None,
        )
        .await?;

    println!();

    Ok(())
}
