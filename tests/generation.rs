//! Test de bout en bout du pipeline de génération, avec un backend de
//! rendu factice : l'arbre de mise en page est inspecté, rien n'est
//! rastérisé.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use qrfacture::document::composer::DocumentLayout;
use qrfacture::models::address::Address;
use qrfacture::models::error::RenderError;
use qrfacture::models::invoice::{CompanyInfo, InvoiceDocument, LineItem};
use qrfacture::models::payment::{Currency, PaymentRecord, ReferenceType};
use qrfacture::qrbill::reference::generate_qr_reference;
use qrfacture::{
    DocumentGenerator, GenerationError, Language, LayoutNode, PageOptions, RenderBackend,
};

/// Backend factice : enregistre l'arbre composé et compte ses appels
struct RecordingBackend {
    rendered: Rc<RefCell<Option<DocumentLayout>>>,
    calls: Rc<RefCell<usize>>,
}

impl RenderBackend for RecordingBackend {
    fn render(
        &self,
        document: &DocumentLayout,
        _options: &PageOptions,
    ) -> Result<Vec<u8>, RenderError> {
        *self.calls.borrow_mut() += 1;
        *self.rendered.borrow_mut() = Some(document.clone());
        Ok(b"%PDF-factice".to_vec())
    }
}

fn generator() -> (
    DocumentGenerator,
    Rc<RefCell<Option<DocumentLayout>>>,
    Rc<RefCell<usize>>,
) {
    let rendered = Rc::new(RefCell::new(None));
    let calls = Rc::new(RefCell::new(0));
    let backend = RecordingBackend {
        rendered: Rc::clone(&rendered),
        calls: Rc::clone(&calls),
    };
    (DocumentGenerator::new(Box::new(backend)), rendered, calls)
}

fn creditor() -> Address {
    Address {
        name: "Chocolaterie Dubois SA".into(),
        address_line1: "Rue de la Gare 12".into(),
        address_line2: None,
        postal_code: "1003".into(),
        city: "Lausanne".into(),
        country: "CH".into(),
    }
}

fn payment_record() -> PaymentRecord {
    PaymentRecord {
        creditor: creditor(),
        creditor_account: "CH4431999123000889012".into(),
        amount: Some(dec!(1234.56)),
        currency: Currency::Chf,
        debtor: Some(Address {
            name: "Marie Favre".into(),
            address_line1: "Chemin des Vignes 4".into(),
            address_line2: None,
            postal_code: "1700".into(),
            city: "Fribourg".into(),
            country: "CH".into(),
        }),
        reference_type: ReferenceType::Qrr,
        reference: Some(generate_qr_reference("20241278").unwrap()),
        unstructured_message: Some("Facture 2024-1278".into()),
        bill_information: None,
        alternative_procedures: Vec::new(),
    }
}

fn invoice(item_count: usize) -> InvoiceDocument {
    let items = (0..item_count)
        .map(|i| LineItem {
            description: format!("Pralinés assortis, carton {}", i + 1),
            quantity: dec!(2),
            unit_price: dec!(19.90),
            vat_rate: dec!(8.1),
            vat_inclusive: false,
            discount: None,
        })
        .collect();

    InvoiceDocument {
        invoice_number: "2024-1278".into(),
        issue_date: NaiveDate::from_ymd_opt(2024, 11, 5).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2024, 12, 5).unwrap(),
        company: CompanyInfo {
            address: creditor(),
            vat_number: Some("CHE-123.456.789 TVA".into()),
            phone: Some("+41 21 555 00 11".into()),
            email: Some("facturation@chocolaterie-dubois.ch".into()),
            website: None,
        },
        client: Address {
            name: "Marie Favre".into(),
            address_line1: "Chemin des Vignes 4".into(),
            address_line2: None,
            postal_code: "1700".into(),
            city: "Fribourg".into(),
            country: "CH".into(),
        },
        items,
        currency: Currency::Chf,
        global_discount: None,
        notes: Some("Livraison incluse.".into()),
        terms: Some("Paiement à 30 jours.".into()),
    }
}

fn count_slips(node: &LayoutNode) -> usize {
    node.count_matching(&|n| matches!(n, LayoutNode::Region { name, .. } if name == "qr_bill"))
}

#[test]
fn full_invoice_generation_returns_backend_bytes() {
    let (generator, rendered, calls) = generator();
    let bytes = generator
        .generate_invoice(
            &invoice(3),
            &payment_record(),
            Language::Fr,
            &PageOptions::default(),
        )
        .unwrap();

    assert_eq!(bytes, b"%PDF-factice".to_vec());
    assert_eq!(*calls.borrow(), 1);

    let document = rendered.borrow().clone().unwrap();
    assert_eq!(document.pages.len(), 1);
    assert_eq!(count_slips(&document.pages[0]), 1);
}

#[test]
fn thirty_items_produce_multipage_document_with_single_slip() {
    let (generator, rendered, _) = generator();
    generator
        .generate_invoice(
            &invoice(30),
            &payment_record(),
            Language::Fr,
            &PageOptions::default(),
        )
        .unwrap();

    let document = rendered.borrow().clone().unwrap();
    assert!(document.pages.len() > 1);

    let total_slips: usize = document.pages.iter().map(count_slips).sum();
    assert_eq!(total_slips, 1);
    assert_eq!(count_slips(document.pages.last().unwrap()), 1);
}

#[test]
fn validation_failure_never_reaches_backend() {
    let (generator, rendered, calls) = generator();
    let mut record = payment_record();
    record.reference_type = ReferenceType::Non; // référence encore présente

    let error = generator
        .generate_invoice(&invoice(2), &record, Language::Fr, &PageOptions::default())
        .unwrap_err();

    match error {
        GenerationError::Validation(errors) => {
            assert!(errors.iter().any(|e| e.field == "reference"));
        }
        other => panic!("erreur inattendue : {other}"),
    }
    assert_eq!(*calls.borrow(), 0);
    assert!(rendered.borrow().is_none());
}

#[test]
fn payload_field_order_stable_for_scanner_indexing() {
    let (generator, _, _) = generator();
    let payload = generator.encode_payload(&payment_record()).unwrap();
    let lines: Vec<&str> = payload.split('\n').collect();

    assert_eq!(lines.len(), 34);
    assert_eq!(lines[0], "SPC");
    assert_eq!(lines[18], "1234.56");
    assert_eq!(lines[19], "CHF");
    assert_eq!(lines[27], "QRR");
    assert_eq!(lines[30], "EPD");
}

#[test]
fn scor_record_generates_slip() {
    let (generator, rendered, _) = generator();
    let mut record = payment_record();
    record.creditor_account = "CH9300762011623852957".into();
    record.reference_type = ReferenceType::Scor;
    record.reference = Some("RF18539007547034".into());

    generator
        .generate_payment_slip(&record, Language::De, &PageOptions::default())
        .unwrap();

    let document = rendered.borrow().clone().unwrap();
    assert_eq!(document.pages.len(), 1);
    let empfangsschein = document.pages[0].count_matching(&|n| {
        matches!(n, LayoutNode::Text { content, .. } if content == "Empfangsschein")
    });
    assert_eq!(empfangsschein, 1);
}

#[test]
fn layout_tree_serializes_for_snapshotting() {
    let (generator, rendered, _) = generator();
    generator
        .generate_payment_slip(&payment_record(), Language::Fr, &PageOptions::default())
        .unwrap();

    let document = rendered.borrow().clone().unwrap();
    let json = serde_json::to_string(&document).unwrap();
    assert!(json.contains("\"qr_bill\""));
    assert!(json.contains("\"qr_symbol\""));
}
