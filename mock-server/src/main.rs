use mock_server::{Provider, TEST_CONSUMER_KEY};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let consumer_key =
        std::env::var("CONSUMER_KEY").unwrap_or_else(|_| TEST_CONSUMER_KEY.to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr} (consumer key {consumer_key})");

    let provider = Provider::seeded().with_consumer_key(&consumer_key);
    mock_server::run(listener, provider).await
}
