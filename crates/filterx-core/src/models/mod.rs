pub mod attachment;
pub mod conversation_store;
pub mod message;

pub use attachment::{Attachment, AttachmentKind};
pub use conversation_store::{
    ConversationStore, Notice, NoticeLevel, SessionSnapshot, StoreEvent, Subscription,
};
pub use message::{Message, Role};
