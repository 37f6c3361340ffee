use futures::stream::StreamExt;
use prelude::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

pub mod prelude;
pub mod receiver;
pub mod sender;

/// Answers one UDP datagram. Returns `None` to drop the message silently
/// (malformed packet, or a query with no question) rather than replying.
#[async_trait::async_trait]
pub trait Handler {
    async fn handle(&self, message: Message) -> Option<Message>;
}

pub struct UdpServer<H> {
    address: SocketAddr,
    handler: Arc<H>,
}

impl<H: Handler + Send + Sync + 'static> UdpServer<H> {
    pub fn new(address: SocketAddr, handler: H) -> Self {
        Self {
            address,
            handler: Arc::new(handler),
        }
    }

    pub async fn run(&self) -> std::io::Result<()> {
        let socket = UdpSocket::bind(self.address).await?;
        let socket = Arc::new(socket);
        tracing::info!(address = %self.address, "listening for DNS queries");

        let receiver = receiver::Receiver::new(socket.clone());
        let sender = sender::Sender::new(socket);

        let handler = self.handler.clone();
        let stream = receiver
            .into_stream()
            .map(move |item| {
                let handler = handler.clone();
                async move { handler.handle(item).await }
            })
            .buffer_unordered(64);

        tokio::pin!(stream);

        while let Some(item) = stream.next().await {
            let Some(item) = item else {
                continue;
            };
            if let Err(error) = sender.send(&item).await {
                tracing::error!("couldn't send message to {:?}: {error:?}", item.address);
            }
        }

        Ok(())
    }
}
