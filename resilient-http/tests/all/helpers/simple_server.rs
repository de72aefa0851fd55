use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A toy TCP server answering the n-th connection with the n-th raw response,
/// repeating the last one when it runs out.
///
/// Lets tests send bytes that are not valid HTTP, which reqwest reports as a
/// transport error rather than a response.
pub struct SimpleServer {
    listener: TcpListener,
    host: String,
    port: u16,
    raw_http_responses: Vec<String>,
}

impl SimpleServer {
    pub async fn new(host: &str, raw_http_responses: Vec<String>) -> io::Result<Self> {
        let listener = TcpListener::bind((host, 0)).await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            listener,
            host: host.to_string(),
            port,
            raw_http_responses,
        })
    }

    pub fn uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub async fn start(self) {
        let mut served = 0;
        loop {
            let (mut stream, _) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    println!("Connection failed: {}", e);
                    continue;
                }
            };

            // 1024 bytes is enough for a toy HTTP server
            let mut buffer = [0; 1024];
            if let Err(e) = stream.read(&mut buffer).await {
                println!("Error reading request: {}", e);
                continue;
            }

            let index = served.min(self.raw_http_responses.len() - 1);
            served += 1;
            let response = &self.raw_http_responses[index];
            if let Err(e) = stream.write_all(response.as_bytes()).await {
                println!("Error writing response: {}", e);
            }
            let _ = stream.shutdown().await;
        }
    }
}
