pub mod document_loader;

pub use document_loader::load_document_from_file;
