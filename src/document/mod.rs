//! Composition et génération du document de facture

pub mod composer;
pub mod generator;

pub use composer::{
    compute_totals, DocumentLayout, InvoiceTotals, PageOptions, VatBreakdownEntry,
};
pub use generator::{DocumentGenerator, RenderBackend};
