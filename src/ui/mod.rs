pub mod chat_loop;
pub mod render;
