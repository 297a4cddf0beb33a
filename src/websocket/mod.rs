pub mod events;
pub mod handlers;
pub mod message_types;

pub use handlers::{conversation_list_socket, conversation_socket};
