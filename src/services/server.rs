use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::config::Config;
use crate::modbus;
use crate::storage::DataTableStore;
use crate::utils::error::ModbusError;

/// One receive per connection, one ADU per receive. A request that needs
/// more than this is already far beyond the largest legal ADU.
const RECV_BUFFER_SIZE: usize = 1024;

/// Seam between the socket loop and the codec. Lets tests (or a future
/// bridge to real hardware) stand in for the in-memory emulator.
#[async_trait]
pub trait SlaveHandler: Send {
    async fn handle_request(&mut self, frame: &[u8]) -> Result<Vec<u8>, ModbusError>;
}

/// The default handler: the ADU codec over the in-memory data tables.
pub struct EmulatorHandler {
    store: DataTableStore,
}

impl EmulatorHandler {
    pub fn new(store: DataTableStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &DataTableStore {
        &self.store
    }
}

#[async_trait]
impl SlaveHandler for EmulatorHandler {
    async fn handle_request(&mut self, frame: &[u8]) -> Result<Vec<u8>, ModbusError> {
        modbus::process_request(frame, &mut self.store)
    }
}

#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub address: String,
    pub connected_at: DateTime<Utc>,
}

/// Sequential Modbus/TCP slave: accept one connection, answer one request,
/// close, accept the next. No concurrent clients, no read timeout.
pub struct SlaveServer<H: SlaveHandler> {
    config: Config,
    handler: H,
    exchanges: u64,
}

impl<H: SlaveHandler> SlaveServer<H> {
    pub fn new(config: Config, handler: H) -> Self {
        Self {
            config,
            handler,
            exchanges: 0,
        }
    }

    pub async fn run(&mut self) -> Result<(), ModbusError> {
        let bind_address = self.config.socket_addr();
        let listener = TcpListener::bind(&bind_address).await.map_err(|e| {
            ModbusError::CommunicationError(format!("failed to bind {}: {}", bind_address, e))
        })?;

        info!("🔌 Modbus/TCP slave listening on {}", bind_address);
        self.serve_on(listener).await
    }

    /// Accept loop over an already-bound listener. Protocol failures are
    /// contained per connection: log, drop the socket without a response,
    /// keep accepting.
    pub async fn serve_on(&mut self, listener: TcpListener) -> Result<(), ModbusError> {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("❌ Accept failed: {}", e);
                    continue;
                }
            };

            let client = ClientInfo {
                address: peer.to_string(),
                connected_at: Utc::now(),
            };

            if let Err(e) = self.serve_connection(stream, &client).await {
                warn!("⚠️  Connection {} closed without a response: {}", client.address, e);
            }
        }
    }

    async fn serve_connection(
        &mut self,
        mut stream: TcpStream,
        client: &ClientInfo,
    ) -> Result<(), ModbusError> {
        debug!("🔗 Client connected: {} at {}", client.address, client.connected_at);

        let mut buffer = vec![0u8; RECV_BUFFER_SIZE];
        let received = stream.read(&mut buffer).await?;
        if received == 0 {
            debug!("Client {} disconnected without a request", client.address);
            return Ok(());
        }

        let response = self.handler.handle_request(&buffer[..received]).await?;
        stream.write_all(&response).await?;

        self.exchanges += 1;
        info!(
            "📊 Exchange #{} with {}: {} bytes in, {} bytes out",
            self.exchanges,
            client.address,
            received,
            response.len()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TableKind;

    fn test_config() -> Config {
        Config {
            listen_address: "127.0.0.1".to_string(),
            listen_port: 0,
            ..Config::default()
        }
    }

    fn seeded_handler() -> EmulatorHandler {
        let mut store = DataTableStore::new();
        store
            .write_words(TableKind::AnalogOutputRegisters, 0, &[10, 18, 52])
            .unwrap();
        EmulatorHandler::new(store)
    }

    async fn exchange(addr: std::net::SocketAddr, request: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_handler_answers_fc03() {
        let mut handler = seeded_handler();

        let request = [0x00, 0x68, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x00, 0x00, 0x03];
        let response = handler.handle_request(&request).await.unwrap();

        assert_eq!(
            response,
            vec![0x00, 0x68, 0x00, 0x00, 0x00, 0x09, 0x01, 0x03, 0x06, 0x00, 0x0A, 0x00, 0x12, 0x00, 0x34]
        );
    }

    #[tokio::test]
    async fn test_server_survives_bad_function_code() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut server = SlaveServer::new(test_config(), seeded_handler());
        tokio::spawn(async move {
            let _ = server.serve_on(listener).await;
        });

        // unsupported function: connection closes with no response bytes
        let bogus = [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x63, 0x00, 0x00, 0x00, 0x01];
        assert!(exchange(addr, &bogus).await.is_empty());

        // the listener must still answer the next valid request
        let read = [0x00, 0x02, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x01, 0x00, 0x01];
        let response = exchange(addr, &read).await;
        assert_eq!(&response[7..], &[0x03, 0x02, 0x00, 0x12]);
        assert_eq!(response[0..2], [0x00, 0x02]);
    }

    #[tokio::test]
    async fn test_sequential_clients_share_table_state() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut server = SlaveServer::new(test_config(), EmulatorHandler::new(DataTableStore::new()));
        tokio::spawn(async move {
            let _ = server.serve_on(listener).await;
        });

        // first client forces a coil on
        let write = [0x00, 0x10, 0x00, 0x00, 0x00, 0x06, 0x01, 0x05, 0x00, 0x04, 0xFF, 0x00];
        let confirmation = exchange(addr, &write).await;
        assert_eq!(&confirmation[7..], &[0x05, 0x00, 0x04, 0xFF, 0x00]);

        // second client reads it back
        let read = [0x00, 0x11, 0x00, 0x00, 0x00, 0x06, 0x01, 0x01, 0x00, 0x00, 0x00, 0x08];
        let response = exchange(addr, &read).await;
        assert_eq!(&response[7..], &[0x01, 0x01, 0b0001_0000]);
    }
}
