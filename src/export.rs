//! Story document export

mod pdf;

pub use pdf::PdfExporter;

/// Renders a story into a downloadable document
pub trait DocumentExporter: Send + Sync {
    /// Paginated document with the title on the first page and the
    /// text's line breaks preserved
    fn export(&self, title: &str, text: &str) -> Vec<u8>;

    /// MIME type of the produced bytes
    fn content_type(&self) -> &'static str;

    /// File extension, without the dot
    fn extension(&self) -> &'static str;
}
