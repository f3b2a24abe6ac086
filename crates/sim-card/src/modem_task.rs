//! Modem actor task
//!
//! This module provides an async task that owns a [`SimCard`] and serves it
//! over a byte stream (a serial port, a pty, or an in-memory duplex). The
//! task uses a select! loop to:
//! - Read AT command lines from the stream and answer them
//! - Handle PIN/PUK and shutdown commands from a channel
//! - Emit card status events via a broadcast channel
//!
//! Because the task is the only owner of the card, command dispatch and
//! PIN/PUK checks are serialized without a lock.
//!
//! Lines served on the stream:
//!
//! | Line                    | Answer                                        |
//! |-------------------------|-----------------------------------------------|
//! | `+CRSM=...`             | dispatcher reply                              |
//! | `+CPIN?`                | `+CPIN: READY` / `SIM PIN` / `SIM PUK`, `OK`  |
//! | `+CPIN=<pin>`           | `OK` or `+CME ERROR: 16`                      |
//! | `+CPIN=<puk>,<newpin>`  | `OK` or `+CME ERROR: 16`                      |
//! | anything else           | `ERROR`                                       |
//!
//! An absent card answers every `+CPIN` line with `+CME ERROR: 10`.

use std::io;

use sim_protocol::{AtLineCodec, ProtocolCodec, COMMAND_MARKER};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::card::{SimCard, SimStatus};
use crate::dispatch::SimDispatcher;
use crate::error::CardError;

/// Line terminator for every answer
const EOL: &str = "\r\n";

/// `+CPIN` query and entry command
const CPIN_QUERY: &str = "+CPIN?";
const CPIN_SET: &str = "+CPIN=";

/// CME error: SIM not inserted
pub const CME_SIM_NOT_INSERTED: u16 = 10;
/// CME error: incorrect password
pub const CME_INCORRECT_PASSWORD: u16 = 16;

/// Commands that can be sent to a modem actor
#[derive(Debug)]
pub enum ModemCommand {
    /// Verify a PIN
    CheckPin {
        pin: String,
        reply: oneshot::Sender<bool>,
    },
    /// Unblock with the PUK and install a new PIN
    CheckPuk {
        puk: String,
        new_pin: String,
        reply: oneshot::Sender<bool>,
    },
    /// Replace the PIN
    SetPin {
        pin: String,
        reply: oneshot::Sender<Result<(), CardError>>,
    },
    /// Replace the PUK
    SetPuk {
        puk: String,
        reply: oneshot::Sender<Result<(), CardError>>,
    },
    /// Query the current card status
    Status {
        reply: oneshot::Sender<CardStatusEvent>,
    },
    /// Shutdown the modem actor
    Shutdown,
}

/// Status event emitted when the card's lock state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardStatusEvent {
    /// Current lock status
    pub status: SimStatus,
    /// Failed attempts in the current PIN or PUK phase
    pub pin_retries: u32,
}

impl From<&SimCard> for CardStatusEvent {
    fn from(card: &SimCard) -> Self {
        Self {
            status: card.status(),
            pin_retries: card.pin_retries(),
        }
    }
}

/// Run the modem actor task
///
/// This task owns the card and processes:
/// 1. AT command lines read from the stream
/// 2. PIN/PUK and shutdown commands from the command channel
///
/// Status changes are emitted via the broadcast channel. The task ends when
/// the stream closes, the command channel closes, or on shutdown.
pub async fn run_modem_task<S>(
    mut stream: S,
    mut card: SimCard,
    dispatcher: SimDispatcher,
    mut cmd_rx: mpsc::Receiver<ModemCommand>,
    event_tx: broadcast::Sender<CardStatusEvent>,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut codec = AtLineCodec::new();
    let mut buf = [0u8; 1024];

    info!(
        "Starting modem task (port {}, {} mode, status {})",
        card.identity_port(),
        dispatcher.mode().name(),
        card.status().name()
    );

    let mut last = CardStatusEvent::from(&card);
    let _ = event_tx.send(last);

    loop {
        tokio::select! {
            // Read AT lines from the host
            result = stream.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        debug!("Modem stream closed");
                        break;
                    }
                    Ok(n) => {
                        codec.push_bytes(&buf[..n]);
                        while let Some((line, raw)) = codec.next_command_with_bytes() {
                            trace!("Modem line bytes: {:02X?}", raw);
                            let answer = answer_line(&mut card, &dispatcher, &line);
                            stream.write_all(answer.as_bytes()).await?;
                        }
                        stream.flush().await?;
                    }
                    Err(e) => {
                        warn!("Modem stream error: {}", e);
                        return Err(e);
                    }
                }
            }

            // Handle commands from the channel
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ModemCommand::CheckPin { pin, reply }) => {
                        let _ = reply.send(card.check_pin(&pin));
                    }
                    Some(ModemCommand::CheckPuk { puk, new_pin, reply }) => {
                        let _ = reply.send(card.check_puk(&puk, &new_pin));
                    }
                    Some(ModemCommand::SetPin { pin, reply }) => {
                        let _ = reply.send(card.set_pin(&pin));
                    }
                    Some(ModemCommand::SetPuk { puk, reply }) => {
                        let _ = reply.send(card.set_puk(&puk));
                    }
                    Some(ModemCommand::Status { reply }) => {
                        let _ = reply.send(CardStatusEvent::from(&card));
                    }
                    Some(ModemCommand::Shutdown) => {
                        info!("Shutdown requested for modem task");
                        break;
                    }
                    None => {
                        debug!("Command channel closed for modem task");
                        break;
                    }
                }
            }
        }

        let current = CardStatusEvent::from(&card);
        if current != last {
            debug!(
                "Card status changed: {} (retries {})",
                current.status.name(),
                current.pin_retries
            );
            let _ = event_tx.send(current);
            last = current;
        }
    }

    info!("Modem task ended");
    Ok(())
}

/// Build the full answer, terminators included, for one AT line
fn answer_line(card: &mut SimCard, dispatcher: &SimDispatcher, line: &str) -> String {
    // Bare `AT` handshake
    if line.is_empty() {
        return format!("OK{EOL}");
    }
    if line.starts_with(COMMAND_MARKER) {
        return format!("{}{EOL}", dispatcher.process(card, line));
    }
    if line == CPIN_QUERY {
        return cpin_query(card);
    }
    if let Some(args) = line.strip_prefix(CPIN_SET) {
        return cpin_enter(card, args);
    }
    debug!("Unsupported AT line: {:?}", line);
    format!("ERROR{EOL}")
}

fn cme_error(code: u16) -> String {
    format!("+CME ERROR: {code}{EOL}")
}

fn cpin_query(card: &SimCard) -> String {
    match card.status() {
        SimStatus::Absent => cme_error(CME_SIM_NOT_INSERTED),
        status => format!("+CPIN: {}{EOL}OK{EOL}", status.name()),
    }
}

/// `+CPIN=<pin>` or `+CPIN=<puk>,<newpin>`, values optionally quoted
fn cpin_enter(card: &mut SimCard, args: &str) -> String {
    let values: Vec<&str> = args
        .split(',')
        .map(|value| value.trim().trim_matches('"'))
        .collect();

    let accepted = match (card.status(), values.as_slice()) {
        (SimStatus::Absent, _) => return cme_error(CME_SIM_NOT_INSERTED),
        (SimStatus::Puk, [puk, new_pin]) => card.check_puk(puk, new_pin),
        (SimStatus::Pin | SimStatus::Ready, [pin]) => card.check_pin(pin),
        _ => false,
    };

    if accepted {
        format!("OK{EOL}")
    } else {
        cme_error(CME_INCORRECT_PASSWORD)
    }
}
