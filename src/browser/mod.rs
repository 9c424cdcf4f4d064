pub mod connection;

pub use connection::connect_to_form_page;
