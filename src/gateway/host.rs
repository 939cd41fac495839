use std::io::{BufRead, Write};

use tracing::{debug, info, warn};

use crate::error::HostError;
use crate::gateway::gateway::{Gateway, handle_message};
use crate::gateway::message::{BackgroundMessage, EnhanceReply};

/// Counters reported when the host loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HostStats {
    pub handled: usize,
    pub ignored: usize,
    pub rejected: usize,
}

/// Background host: one JSON message per input line, one JSON reply per
/// answered message. Runs until the input closes.
pub fn serve<R: BufRead, W: Write>(
    gateway: &dyn Gateway,
    input: R,
    mut output: W,
) -> Result<HostStats, HostError> {
    let mut stats = HostStats::default();
    info!("background host ready");

    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<BackgroundMessage>(trimmed) {
            Ok(message) => match handle_message(gateway, &message) {
                Some(reply) => {
                    stats.handled += 1;
                    reply
                }
                None => {
                    debug!("ignoring message of unknown type");
                    stats.ignored += 1;
                    continue;
                }
            },
            Err(e) => {
                warn!(error = %e, "rejecting malformed message");
                stats.rejected += 1;
                EnhanceReply::failure(format!("invalid message: {}", e))
            }
        };

        writeln!(output, "{}", serde_json::to_string(&reply)?)?;
        output.flush()?;
    }

    info!(handled = stats.handled, "background host input closed");
    Ok(stats)
}
