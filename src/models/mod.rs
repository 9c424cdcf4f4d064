pub mod form_config;
pub mod form_data;
pub mod loaders;
pub mod toast;

pub use form_config::FormConfig;
pub use form_data::{FormData, FormField};
pub use loaders::{load_all_form_documents, load_form_document, FormDocument};
pub use toast::{ElementHandle, ToastKind, ToastSpec, TOAST_ELEMENT_ID};
