//! Server network layer: TCP accept loop and per-connection tasks
//!
//! Every accepted socket gets its own task which walks through three phases:
//! 1. Handshake: `welcome` is sent and a `join` must arrive within the
//!    configured timeout
//! 2. Lobby: the player waits in the [`PairingService`] queue
//! 3. Game: client messages become [`SessionCommand`]s for the match task and
//!    messages from the match are written back to the socket
//!
//! A closed socket or a protocol violation during a game is reported to the
//! match as a disconnect, which forfeits the game for that player.

use crate::codec::{MessageReader, MessageWriter};
use crate::config::ServerConfig;
use crate::error::{ProtocolError, ServerError};
use crate::pairing::{PairingService, PlayerId, SessionLink};
use crate::session::SessionCommand;
use log::{debug, error, info, warn};
use shared::{ClientMessage, Move, ServerMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

/// Sender name used for notices that come from the server itself
const SERVER_NAME: &str = "server";

/// Accepts connections and hands them to connection tasks
pub struct Server {
    listener: TcpListener,
    pairing: Arc<PairingService>,
    config: Arc<ServerConfig>,
    next_player_id: PlayerId,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.bind_addr()).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            pairing: Arc::new(PairingService::new(config.random_colors)),
            config: Arc::new(config),
            next_player_id: 1,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn pairing(&self) -> Arc<PairingService> {
        Arc::clone(&self.pairing)
    }

    /// Runs the accept loop until the task is dropped
    pub async fn run(mut self) -> Result<(), ServerError> {
        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let id = self.next_player_id;
                    self.next_player_id += 1;

                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("Could not set TCP_NODELAY for {}: {}", addr, e);
                    }
                    info!("Client {} connected from {}", id, addr);

                    let (reader, writer) = stream.into_split();
                    let pairing = Arc::clone(&self.pairing);
                    let config = Arc::clone(&self.config);
                    tokio::spawn(handle_connection(
                        reader, writer, addr, id, pairing, config,
                    ));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Drives one client connection from handshake to close
pub async fn handle_connection<R, W>(
    reader: R,
    writer: W,
    addr: SocketAddr,
    id: PlayerId,
    pairing: Arc<PairingService>,
    config: Arc<ServerConfig>,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut connection = Connection {
        id,
        name: addr.to_string(),
        reader: MessageReader::new(reader),
        writer: MessageWriter::new(writer),
    };

    match connection.serve(&pairing, &config).await {
        Ok(()) => info!("Client {} ({}) disconnected", id, connection.name),
        Err(ServerError::Protocol(e)) => {
            warn!("Dropping client {} ({}): {}", id, connection.name, e);
            let notice = ServerMessage::Error {
                message: e.to_string(),
            };
            if let Err(e) = connection.writer.send(&notice).await {
                debug!("Could not deliver error to client {}: {}", id, e);
            }
        }
        Err(e) => info!("Client {} ({}) connection lost: {}", id, connection.name, e),
    }
}

enum LobbyEvent {
    Outgoing(Option<ServerMessage>),
    Seated(Result<SessionLink, oneshot::error::RecvError>),
    Incoming(Result<Option<ClientMessage>, ServerError>),
}

enum GameEvent {
    Outgoing(Option<ServerMessage>),
    Incoming(Result<Option<ClientMessage>, ServerError>),
}

/// How the game phase ended for this connection
enum GameExit {
    /// The match is over and said so
    Finished,
    /// The player walked away mid-game
    Left,
}

struct Connection<R, W> {
    id: PlayerId,
    /// Peer address until the player has joined, then their display name
    name: String,
    reader: MessageReader<R>,
    writer: MessageWriter<W>,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn serve(
        &mut self,
        pairing: &PairingService,
        config: &ServerConfig,
    ) -> Result<(), ServerError> {
        self.writer.send(&ServerMessage::Welcome).await?;

        let Some(requested) = self.handshake(config).await? else {
            return Ok(());
        };

        let (outbox_tx, mut outbox) = mpsc::unbounded_channel();
        let (link_tx, mut link_rx) = oneshot::channel();
        self.name = pairing.enqueue(self.id, &requested, outbox_tx, link_tx).await;
        info!("Client {} joined as {}", self.id, self.name);

        let link = match self.wait_for_match(&mut outbox, &mut link_rx).await {
            Ok(Some(link)) => link,
            Ok(None) => {
                leave_queue(self.id, pairing, &mut link_rx).await;
                return Ok(());
            }
            Err(e) => {
                leave_queue(self.id, pairing, &mut link_rx).await;
                return Err(e);
            }
        };
        debug!(
            "Client {} seated as {} in match {}",
            self.id, link.color, link.match_id
        );

        let result = self.play(&link, &mut outbox).await;
        if !matches!(result, Ok(GameExit::Finished)) {
            let _ = link.commands.send(SessionCommand::Disconnect { color: link.color });
        }
        result.map(|_| ())
    }

    /// Waits for a valid `join`; `None` if the peer hung up first
    async fn handshake(&mut self, config: &ServerConfig) -> Result<Option<String>, ServerError> {
        let first = match timeout(config.handshake_timeout, self.reader.read_message()).await {
            Ok(result) => result?,
            Err(_) => return Err(ProtocolError::HandshakeTimeout(config.handshake_timeout).into()),
        };

        match first {
            None => Ok(None),
            Some(ClientMessage::Join { name }) => {
                Ok(Some(validate_name(&name, config.max_name_len)?))
            }
            Some(_) => Err(ProtocolError::ExpectedJoin.into()),
        }
    }

    /// Relays lobby traffic until the player is seated; `None` if they left
    async fn wait_for_match(
        &mut self,
        outbox: &mut mpsc::UnboundedReceiver<ServerMessage>,
        link_rx: &mut oneshot::Receiver<SessionLink>,
    ) -> Result<Option<SessionLink>, ServerError> {
        loop {
            let event = tokio::select! {
                biased;
                message = outbox.recv() => LobbyEvent::Outgoing(message),
                link = &mut *link_rx => LobbyEvent::Seated(link),
                message = self.reader.read_message() => LobbyEvent::Incoming(message),
            };

            match event {
                LobbyEvent::Outgoing(Some(message)) => self.writer.send(&message).await?,
                LobbyEvent::Outgoing(None) | LobbyEvent::Seated(Err(_)) => return Ok(None),
                LobbyEvent::Seated(Ok(link)) => return Ok(Some(link)),
                LobbyEvent::Incoming(message) => match message? {
                    None | Some(ClientMessage::Quit) => return Ok(None),
                    Some(ClientMessage::Chat { .. }) => {
                        let notice = ServerMessage::Chat {
                            from: SERVER_NAME.to_string(),
                            text: "You are not in a game yet, waiting for an opponent".to_string(),
                        };
                        self.writer.send(&notice).await?;
                    }
                    Some(ClientMessage::Join { .. }) => {
                        return Err(out_of_sequence("join", "after joining"))
                    }
                    Some(ClientMessage::Move { .. }) => {
                        return Err(out_of_sequence("move", "before pairing"))
                    }
                    Some(ClientMessage::Resign) => {
                        return Err(out_of_sequence("resign", "before pairing"))
                    }
                },
            }
        }
    }

    /// Forwards moves to the match and match output to the socket
    async fn play(
        &mut self,
        link: &SessionLink,
        outbox: &mut mpsc::UnboundedReceiver<ServerMessage>,
    ) -> Result<GameExit, ServerError> {
        let color = link.color;

        loop {
            let event = tokio::select! {
                biased;
                message = outbox.recv() => GameEvent::Outgoing(message),
                message = self.reader.read_message() => GameEvent::Incoming(message),
            };

            let command = match event {
                GameEvent::Outgoing(Some(message)) => {
                    let over = matches!(message, ServerMessage::GameOver { .. });
                    self.writer.send(&message).await?;
                    if over {
                        return Ok(GameExit::Finished);
                    }
                    continue;
                }
                GameEvent::Outgoing(None) => return Ok(GameExit::Finished),
                GameEvent::Incoming(message) => match message? {
                    None => return Ok(GameExit::Left),
                    Some(ClientMessage::Move {
                        from,
                        to,
                        promotion,
                    }) => SessionCommand::Move {
                        color,
                        mv: Move {
                            from,
                            to,
                            promotion,
                        },
                    },
                    Some(ClientMessage::Resign) => SessionCommand::Resign { color },
                    Some(ClientMessage::Chat { text }) => SessionCommand::Chat { color, text },
                    Some(ClientMessage::Quit) => {
                        let _ = link.commands.send(SessionCommand::Resign { color });
                        return Ok(GameExit::Left);
                    }
                    Some(ClientMessage::Join { .. }) => {
                        return Err(out_of_sequence("join", "during a game"))
                    }
                },
            };

            // A finished match drops its receiver; input after that is moot
            if link.commands.send(command).is_err() {
                debug!("Match {} is gone, dropping input from {}", link.match_id, self.name);
            }
        }
    }
}

/// Leaves the queue, or forfeits if a seat was assigned in the meantime
async fn leave_queue(
    id: PlayerId,
    pairing: &PairingService,
    link_rx: &mut oneshot::Receiver<SessionLink>,
) {
    if pairing.remove(id).await {
        return;
    }
    // Seats are handed out under the queue lock, so the link is already here
    if let Ok(link) = link_rx.try_recv() {
        let _ = link.commands.send(SessionCommand::Disconnect { color: link.color });
    }
}

fn out_of_sequence(message: &'static str, phase: &'static str) -> ServerError {
    ProtocolError::OutOfSequence { message, phase }.into()
}

/// Trims a requested display name and checks it is usable
pub fn validate_name(name: &str, max_len: usize) -> Result<String, ProtocolError> {
    let name = name.trim();
    let length = name.chars().count();
    if length == 0 || length > max_len || name.chars().any(char::is_control) {
        return Err(ProtocolError::BadName { max: max_len });
    }
    Ok(name.to_string())
}
