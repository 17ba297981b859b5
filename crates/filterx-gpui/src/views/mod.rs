mod attachment_chip;
mod chat_input;
mod chat_view;
mod message_item;

pub use chat_view::ChatView;
