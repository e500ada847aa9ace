//! Records produced by the response decoders and the client façade.

mod capability;
mod email;
mod mailbox;
mod message;

pub use capability::{Capability, Status};
pub use email::{Attachment, MailboxEmail, attachments};
pub use mailbox::{AccessMode, ListEntry, MailboxDataRecord, SelectResponse};
pub use message::{
    Address, Body, BodyFields, BodyPart, Disposition, Envelope, Extension, MessageAttribute,
    MessageDataRecord, PartKind,
};
