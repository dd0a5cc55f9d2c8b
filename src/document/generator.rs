//! Orchestration de la génération : validation, charge utile, mise en
//! page, composition, puis rendu par le backend injecté.
//!
//! Le pipeline est synchrone et sans état partagé ; chaque requête est
//! indépendante. Le backend de rendu est la seule étape potentiellement
//! bloquante — délai et annulation appartiennent à l'appelant, aucune
//! reprise n'est tentée ici. Toute erreur de validation interrompt le
//! pipeline avant l'appel du backend : aucun artefact partiel n'est émis.

use tracing::debug;

use super::composer::{self, DocumentLayout, PageOptions};
use crate::models::error::{GenerationError, RenderError};
use crate::models::invoice::InvoiceDocument;
use crate::models::payment::PaymentRecord;
use crate::qrbill::labels::{labels, Language};
use crate::qrbill::{layout, payload};

/// Backend de rendu paginé, injecté par l'appelant.
///
/// Reçoit l'arbre de mise en page composé et retourne le document rendu
/// (la rastérisation n'appartient pas à ce cœur). En test, un backend
/// factice permet de vérifier l'arbre sans rien rastériser.
pub trait RenderBackend {
    fn render(
        &self,
        document: &DocumentLayout,
        options: &PageOptions,
    ) -> Result<Vec<u8>, RenderError>;
}

/// Générateur de documents de facturation avec bulletin QR
pub struct DocumentGenerator {
    backend: Box<dyn RenderBackend>,
}

impl DocumentGenerator {
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        Self { backend }
    }

    /// Charge utile SPC seule, sans rendu — pour l'encodage du symbole QR
    /// par un composant tiers
    pub fn encode_payload(&self, record: &PaymentRecord) -> Result<String, GenerationError> {
        payload::encode(record).map_err(GenerationError::Validation)
    }

    /// Génère la facture complète : corps paginé et bulletin QR ancré au
    /// bas de la dernière page
    pub fn generate_invoice(
        &self,
        invoice: &InvoiceDocument,
        record: &PaymentRecord,
        language: Language,
        options: &PageOptions,
    ) -> Result<Vec<u8>, GenerationError> {
        let mut errors = invoice.validate();
        errors.extend(record.validate());
        if !errors.is_empty() {
            return Err(GenerationError::Validation(errors));
        }
        debug!(invoice_number = %invoice.invoice_number, "facture validée");

        let payload = payload::encode(record).map_err(GenerationError::Validation)?;
        debug!(fields = payload::PAYLOAD_FIELD_COUNT, "charge utile encodée");

        let label_set = labels(language);
        let slip = layout::render_slip(record, &payload, label_set, options.draft);

        let totals = composer::compute_totals(invoice);
        let document = composer::compose(invoice, &totals, slip, options);
        debug!(
            pages = document.pages.len(),
            total = %totals.grand_total,
            "document composé"
        );

        self.backend
            .render(&document, options)
            .map_err(GenerationError::from)
    }

    /// Génère le bulletin QR seul, sur sa propre page
    pub fn generate_payment_slip(
        &self,
        record: &PaymentRecord,
        language: Language,
        options: &PageOptions,
    ) -> Result<Vec<u8>, GenerationError> {
        let payload = payload::encode(record).map_err(GenerationError::Validation)?;
        let label_set = labels(language);
        let slip = layout::render_slip(record, &payload, label_set, options.draft);
        let document = composer::compose_slip_page(slip, options);
        debug!("bulletin seul composé");

        self.backend
            .render(&document, options)
            .map_err(GenerationError::from)
    }
}
