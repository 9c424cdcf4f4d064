pub mod toml_loader;

pub use toml_loader::{load_all_form_documents, load_form_document, FormDocument};
