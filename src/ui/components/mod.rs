pub mod chat_area;
pub mod dialogs;
pub mod header;
pub mod input_bar;
