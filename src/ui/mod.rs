pub mod chat_view;
pub mod login;
pub mod main_window;
pub mod product_list;
