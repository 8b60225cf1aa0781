use crate::game::ClientGameState;
use crate::input::{parse_command, Command, InputError, HELP};
use crate::rendering;
use log::{debug, info};
use shared::protocol::{decode_line, encode_line};
use shared::{ClientMessage, FenError, ServerMessage};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad message from server: {0}")]
    Json(#[from] serde_json::Error),
    #[error("server sent an unreadable board: {0}")]
    Fen(#[from] FenError),
}

enum Event {
    Server(std::io::Result<Option<String>>),
    User(std::io::Result<Option<String>>),
}

/// Terminal client for the chess server
pub struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    state: ClientGameState,
}

impl Client {
    pub async fn connect(server_addr: &str) -> Result<Self, ClientError> {
        info!("Connecting to server at {}...", server_addr);
        let stream = TcpStream::connect(server_addr).await?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();

        Ok(Client {
            lines: BufReader::new(reader).lines(),
            writer,
            state: ClientGameState::new(),
        })
    }

    pub async fn join(&mut self, name: &str) -> Result<(), ClientError> {
        self.send(&ClientMessage::Join {
            name: name.to_string(),
        })
        .await
    }

    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        let line = encode_line(message)?;
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Next message from the server, or `None` once it hung up
    pub async fn next_message(&mut self) -> Result<Option<ServerMessage>, ClientError> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            if !line.trim().is_empty() {
                return Ok(Some(decode_line(&line)?));
            }
        }
    }

    pub fn state(&self) -> &ClientGameState {
        &self.state
    }

    /// Reads commands from `input` and server messages until either side ends
    pub async fn run<I>(&mut self, input: &mut Lines<I>) -> Result<(), ClientError>
    where
        I: AsyncBufRead + Unpin,
    {
        println!("Type 'help' for a list of commands");

        loop {
            let event = tokio::select! {
                line = self.lines.next_line() => Event::Server(line),
                line = input.next_line() => Event::User(line),
            };

            match event {
                Event::Server(line) => {
                    let Some(line) = line? else {
                        println!("Server closed the connection");
                        return Ok(());
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.show(decode_line(&line)?)?;
                }
                Event::User(line) => {
                    let keep_going = match line? {
                        Some(line) => self.handle_command(&line).await?,
                        None => {
                            self.send(&ClientMessage::Quit).await?;
                            false
                        }
                    };
                    if !keep_going {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn show(&mut self, message: ServerMessage) -> Result<(), ClientError> {
        debug!("Received {:?}", message);
        let redraw = matches!(message, ServerMessage::BoardUpdate { .. });
        if let Some(notice) = self.state.apply(message)? {
            println!("{}", notice);
        }
        if redraw {
            print!("{}", rendering::render(&self.state));
        }
        Ok(())
    }

    /// Returns false once the player asked to leave
    async fn handle_command(&mut self, line: &str) -> Result<bool, ClientError> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(InputError::Empty) => return Ok(true),
            Err(e) => {
                println!("{}", e);
                return Ok(true);
            }
        };

        match command {
            Command::Move(mv) if self.state.is_playing() => self.send(&mv.into()).await?,
            Command::Resign if self.state.is_playing() => {
                self.send(&ClientMessage::Resign).await?
            }
            Command::Move(_) | Command::Resign => println!("You are not in a game"),
            Command::Chat(text) => self.send(&ClientMessage::Chat { text }).await?,
            Command::Board => print!("{}", rendering::render(&self.state)),
            Command::Help => println!("{}", HELP),
            Command::Quit => {
                self.send(&ClientMessage::Quit).await?;
                return Ok(false);
            }
        }
        Ok(true)
    }
}
