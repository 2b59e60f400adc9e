//! Interfaces for document serializers.

use crate::model::Document;
use std::error::Error;

/// A serializer for [`Document`](../model/struct.Document.html) trees.
pub trait DocumentFormatter {
    type Error: Error;

    /// Writes a complete document
    fn format(&mut self, document: &Document) -> Result<(), Self::Error>;
}
