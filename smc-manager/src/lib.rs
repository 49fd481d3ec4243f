//! Sender and Recipient state machines (§4.4, §4.5): the two halves of
//! the channel protocol core, plus the shared replay guard, transport
//! abstraction and polling primitive they're both built on.

pub mod known_channels;
pub mod poll;
pub mod recipient;
pub mod sender;
pub mod transport;

pub use known_channels::{InMemoryKnownChannels, KnownChannels};
pub use poll::{poll_until, PAYMENT_RECEIVE_TIMEOUT, REFUND_POLL_INTERVAL};
pub use recipient::{
    LastPayment, Recipient, RecipientChannel, RecipientState, MIN_ACCEPTED_LIFETIME,
    SETTLE_MARGIN,
};
pub use sender::{Sender, SenderChannel, SenderState};
pub use transport::Transport;
