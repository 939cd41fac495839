use std::cell::RefCell;
use std::collections::VecDeque;

use tracing::debug;

use crate::error::ChannelError;
use crate::gateway::gateway::{Gateway, handle_message};
use crate::gateway::message::{BackgroundMessage, EnhanceReply};

/// One-shot completion for a message. `Ok(None)` means the other side
/// finished without replying.
pub type ReplyCallback = Box<dyn FnOnce(Result<Option<EnhanceReply>, ChannelError>)>;

/// Request/response port to the privileged background side.
///
/// `send` returns immediately; the reply arrives through the callback on a
/// later turn (or, for in-process ports, possibly before `send` returns).
pub trait EnhancementPort {
    fn send(&self, message: BackgroundMessage, reply: ReplyCallback);
}

/// In-process port that queues messages and answers them when pumped,
/// standing in for the browser's message bus between event-loop turns.
pub struct QueuedPort {
    gateway: Box<dyn Gateway>,
    queue: RefCell<VecDeque<(BackgroundMessage, ReplyCallback)>>,
}

impl QueuedPort {
    pub fn new(gateway: Box<dyn Gateway>) -> Self {
        Self {
            gateway,
            queue: RefCell::new(VecDeque::new()),
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Answer every queued message, including ones queued while pumping.
    /// Returns how many were answered.
    pub fn pump(&self) -> usize {
        let mut answered = 0;
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some((message, reply)) = next else {
                break;
            };
            let response = handle_message(self.gateway.as_ref(), &message);
            answered += 1;
            reply(Ok(response));
        }
        answered
    }
}

impl EnhancementPort for QueuedPort {
    fn send(&self, message: BackgroundMessage, reply: ReplyCallback) {
        debug!(pending = self.pending() + 1, "queued background message");
        self.queue.borrow_mut().push_back((message, reply));
    }
}

/// Port whose background side is gone, e.g. after the extension reloaded.
pub struct DisconnectedPort {
    reason: String,
}

impl DisconnectedPort {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl EnhancementPort for DisconnectedPort {
    fn send(&self, _message: BackgroundMessage, reply: ReplyCallback) {
        reply(Err(ChannelError::Disconnected(self.reason.clone())));
    }
}
