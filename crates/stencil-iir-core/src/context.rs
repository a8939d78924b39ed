//! Per-compilation state shared by every do-method of a stencil.

use crate::config::IirOptions;
use crate::diagnostics::CollectingDiagnosticHandler;
use crate::ids::IdGenerator;
use crate::metadata::AccessMetadata;
use std::sync::Arc;

/// Registry, identifier source, options and diagnostics of one compilation.
#[derive(Debug)]
pub struct IirContext {
    pub metadata: AccessMetadata,
    pub options: IirOptions,
    ids: Arc<IdGenerator>,
    diagnostics: Arc<CollectingDiagnosticHandler>,
}

impl IirContext {
    pub fn new() -> Self {
        Self::with_options(IirOptions::default())
    }

    pub fn with_options(options: IirOptions) -> Self {
        Self::with_id_generator(Arc::new(IdGenerator::new()), options)
    }

    /// Context drawing identifiers from an existing generator, so that
    /// several contexts compiled in parallel never hand out the same ID.
    pub fn with_id_generator(ids: Arc<IdGenerator>, options: IirOptions) -> Self {
        IirContext {
            metadata: AccessMetadata::new(Arc::clone(&ids)),
            options,
            ids,
            diagnostics: Arc::new(CollectingDiagnosticHandler::new()),
        }
    }

    pub fn id_generator(&self) -> &Arc<IdGenerator> {
        &self.ids
    }

    pub fn diagnostics(&self) -> &Arc<CollectingDiagnosticHandler> {
        &self.diagnostics
    }
}

impl Default for IirContext {
    fn default() -> Self {
        Self::new()
    }
}
