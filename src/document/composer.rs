//! Composition du document de facture : agrégats financiers (sous-total,
//! rabais, ventilation TVA, total général) et pagination des lignes, avec
//! le bulletin QR ancré au bas de la dernière page.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::invoice::{DiscountKind, InvoiceDocument};
use crate::qrbill::layout::{
    format_amount_display, FontSpec, LayoutNode, Rect, SLIP_HEIGHT_MM,
};

/// Options de page du document généré
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageOptions {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub margin_top_mm: f64,
    pub margin_bottom_mm: f64,
    pub margin_left_mm: f64,
    pub margin_right_mm: f64,
    /// Bulletin sur une page dédiée plutôt qu'intégré au bas de la facture
    #[serde(default)]
    pub standalone_slip: bool,
    /// Document d'essai : le bulletin porte la mention « ne pas utiliser »
    #[serde(default)]
    pub draft: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        // A4 portrait
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_top_mm: 20.0,
            margin_bottom_mm: 15.0,
            margin_left_mm: 20.0,
            margin_right_mm: 20.0,
            standalone_slip: false,
            draft: false,
        }
    }
}

/// Constantes de mise en page du corps de facture (mm)
const ROW_HEIGHT_MM: f64 = 7.0;
const DISCOUNT_LINE_MM: f64 = 5.0;
const TABLE_HEADER_MM: f64 = 9.0;
const TOTALS_LINE_MM: f64 = 6.0;
/// Réserve de bas de page avant de passer à la suivante
const FOOTER_ALLOWANCE_MM: f64 = 12.0;
/// Espace entre le corps et le bulletin intégré
const SLIP_CLEARANCE_MM: f64 = 5.0;

/// Colonnes du tableau des lignes, relatives à la marge gauche (mm)
const COL_QUANTITY_MM: f64 = 92.0;
const COL_UNIT_PRICE_MM: f64 = 110.0;
const COL_VAT_MM: f64 = 135.0;
const COL_TOTAL_MM: f64 = 150.0;

const FONT_COMPANY: FontSpec = FontSpec { size_pt: 14.0, bold: true };
const FONT_TITLE: FontSpec = FontSpec { size_pt: 13.0, bold: true };
const FONT_HEADING: FontSpec = FontSpec { size_pt: 9.0, bold: true };
const FONT_BODY: FontSpec = FontSpec { size_pt: 9.0, bold: false };
const FONT_SMALL: FontSpec = FontSpec { size_pt: 7.5, bold: false };
const FONT_TOTAL: FontSpec = FontSpec { size_pt: 11.0, bold: true };

/// Ventilation TVA pour un taux donné
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VatBreakdownEntry {
    /// Taux en pour cent
    pub rate: Decimal,
    pub net_amount: Decimal,
    pub vat_amount: Decimal,
    pub gross_amount: Decimal,
}

/// Agrégats calculés d'une facture. Jamais stockés : recalculés à chaque
/// génération à partir des lignes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceTotals {
    /// Somme quantité × prix unitaire, avant tout rabais
    pub subtotal: Decimal,
    /// Montant du rabais global, borné au sous-total
    pub discount_amount: Decimal,
    /// Base nette (hors TVA) après rabais de ligne et rabais global
    pub subtotal_after_discount: Decimal,
    /// Ventilation par taux distinct, triée par taux croissant
    pub vat_breakdown: Vec<VatBreakdownEntry>,
    pub vat_total: Decimal,
    pub grand_total: Decimal,
}

/// Arrondi financier à deux décimales, au pair le plus proche
/// (round half to even)
fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Calcule tous les agrégats d'une facture.
///
/// Les lignes TTC (`vat_inclusive`) voient leur net extrait du brut :
/// `net = brut / (1 + taux/100)`, `tva = brut − net`. L'arrondi à deux
/// décimales se fait au pair le plus proche à chaque séparation net/TVA.
pub fn compute_totals(invoice: &InvoiceDocument) -> InvoiceTotals {
    let mut subtotal = Decimal::ZERO;
    let mut net_total = Decimal::ZERO;
    let mut by_rate: BTreeMap<Decimal, (Decimal, Decimal)> = BTreeMap::new();

    for item in &invoice.items {
        subtotal += item.gross_amount();
        let line_net = item.net_amount();

        let (net, vat) = if item.vat_inclusive {
            let divisor = Decimal::ONE + item.vat_rate / Decimal::ONE_HUNDRED;
            let net = round2(line_net / divisor);
            (net, line_net - net)
        } else {
            (line_net, line_net * item.vat_rate / Decimal::ONE_HUNDRED)
        };

        let entry = by_rate
            .entry(item.vat_rate.normalize())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += net;
        entry.1 += vat;
        net_total += net;
    }

    subtotal = round2(subtotal);
    net_total = round2(net_total);

    let discount_amount = invoice
        .global_discount
        .as_ref()
        .map(|discount| {
            let raw = match discount.kind {
                DiscountKind::Percent => {
                    let rate = discount.value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                    subtotal * rate / Decimal::ONE_HUNDRED
                }
                DiscountKind::Flat => discount.value.clamp(Decimal::ZERO, subtotal),
            };
            round2(raw)
        })
        .unwrap_or(Decimal::ZERO);

    let subtotal_after_discount = (net_total - discount_amount).max(Decimal::ZERO);

    let vat_breakdown: Vec<VatBreakdownEntry> = by_rate
        .into_iter()
        .map(|(rate, (net, vat))| {
            let net = round2(net);
            let vat = round2(vat);
            VatBreakdownEntry {
                rate,
                net_amount: net,
                vat_amount: vat,
                gross_amount: net + vat,
            }
        })
        .collect();

    let vat_total = round2(vat_breakdown.iter().map(|e| e.vat_amount).sum());
    let grand_total = round2(subtotal_after_discount + vat_total);

    InvoiceTotals {
        subtotal,
        discount_amount,
        subtotal_after_discount,
        vat_breakdown,
        vat_total,
        grand_total,
    }
}

/// Document composé : une région de mise en page par page physique
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLayout {
    pub pages: Vec<LayoutNode>,
}

/// Compose la facture en pages : en-tête sur la première page, tableau des
/// lignes paginé, bloc des totaux, puis bulletin QR ancré au bas de la
/// dernière page (ou sur une page dédiée). Le bulletin apparaît exactement
/// une fois et n'est jamais scindé.
pub fn compose(
    invoice: &InvoiceDocument,
    totals: &InvoiceTotals,
    slip: LayoutNode,
    options: &PageOptions,
) -> DocumentLayout {
    let currency = invoice.currency.code();
    let content_bottom = options.page_height_mm - options.margin_bottom_mm;
    let row_limit = content_bottom - FOOTER_ALLOWANCE_MM;
    let left = options.margin_left_mm;

    let mut pages: Vec<Vec<LayoutNode>> = Vec::new();
    let mut current: Vec<LayoutNode> = Vec::new();

    // En-tête de document, première page uniquement
    let mut y = document_header(invoice, options, &mut current);
    y += 6.0;
    y = table_header(left, y, &mut current);

    for item in &invoice.items {
        let discount = item.discount_amount();
        let row_height = if discount > Decimal::ZERO {
            ROW_HEIGHT_MM + DISCOUNT_LINE_MM
        } else {
            ROW_HEIGHT_MM
        };

        if y + row_height > row_limit {
            pages.push(std::mem::take(&mut current));
            y = options.margin_top_mm;
            // Les pages de continuation répètent l'en-tête de tableau,
            // jamais l'en-tête de document
            y = table_header(left, y, &mut current);
        }

        let description = truncate(&item.description, 48);
        current.push(text(description, left, y, FONT_BODY));
        current.push(text(item.quantity.normalize().to_string(), left + COL_QUANTITY_MM, y, FONT_BODY));
        current.push(text(
            format_amount_display(item.unit_price),
            left + COL_UNIT_PRICE_MM,
            y,
            FONT_BODY,
        ));
        current.push(text(
            format!("{}%", item.vat_rate.normalize()),
            left + COL_VAT_MM,
            y,
            FONT_BODY,
        ));
        current.push(text(
            format_amount_display(item.net_amount()),
            left + COL_TOTAL_MM,
            y,
            FONT_BODY,
        ));
        y += ROW_HEIGHT_MM;

        if discount > Decimal::ZERO {
            current.push(text(
                format!(
                    "Rabais sur {} : -{} {}",
                    truncate(&item.description, 30),
                    format_amount_display(discount),
                    currency
                ),
                left + 4.0,
                y - 2.0,
                FONT_SMALL,
            ));
            y += DISCOUNT_LINE_MM;
        }
    }

    // Hauteur du bloc des totaux, notes comprises
    let discount_lines = usize::from(totals.discount_amount > Decimal::ZERO) * 2;
    let note_lines = usize::from(invoice.notes.is_some()) * 2
        + usize::from(invoice.terms.is_some()) * 2;
    let totals_height = (2 + discount_lines + totals.vat_breakdown.len() + note_lines) as f64
        * TOTALS_LINE_MM
        + 8.0;

    // Limite basse du bloc des totaux : au-dessus du bulletin intégré
    let totals_limit = if options.standalone_slip {
        content_bottom
    } else {
        options.page_height_mm - SLIP_HEIGHT_MM - SLIP_CLEARANCE_MM
    };

    if y + totals_height > totals_limit {
        pages.push(std::mem::take(&mut current));
        y = options.margin_top_mm;
    }
    totals_block(invoice, totals, options, y, &mut current);

    if options.standalone_slip {
        pages.push(std::mem::take(&mut current));
        // Page dédiée au bulletin
        pages.push(vec![anchor_slip(slip, options.page_height_mm)]);
    } else {
        current.push(anchor_slip(slip, options.page_height_mm));
        pages.push(std::mem::take(&mut current));
    }

    DocumentLayout {
        pages: pages
            .into_iter()
            .map(|children| LayoutNode::Region {
                name: "page".into(),
                frame: Rect {
                    x: 0.0,
                    y: 0.0,
                    width: options.page_width_mm,
                    height: options.page_height_mm,
                },
                children,
            })
            .collect(),
    }
}

/// Compose la page unique d'un bulletin autonome (téléchargement du
/// bulletin seul, sans corps de facture)
pub fn compose_slip_page(slip: LayoutNode, options: &PageOptions) -> DocumentLayout {
    DocumentLayout {
        pages: vec![LayoutNode::Region {
            name: "page".into(),
            frame: Rect {
                x: 0.0,
                y: 0.0,
                width: options.page_width_mm,
                height: options.page_height_mm,
            },
            children: vec![anchor_slip(slip, options.page_height_mm)],
        }],
    }
}

/// Ancre la région du bulletin au bas de la page, pleine largeur
fn anchor_slip(slip: LayoutNode, page_height_mm: f64) -> LayoutNode {
    match slip {
        LayoutNode::Region {
            name,
            frame,
            children,
        } => LayoutNode::Region {
            name,
            frame: Rect {
                x: 0.0,
                y: page_height_mm - SLIP_HEIGHT_MM,
                ..frame
            },
            children,
        },
        other => other,
    }
}

/// En-tête de première page : émetteur, titre, dates, client.
/// Retourne l'ordonnée libre sous l'en-tête.
fn document_header(
    invoice: &InvoiceDocument,
    options: &PageOptions,
    nodes: &mut Vec<LayoutNode>,
) -> f64 {
    let left = options.margin_left_mm;
    let right_column = options.page_width_mm - options.margin_right_mm - 60.0;
    let mut y = options.margin_top_mm;

    let company = &invoice.company;
    nodes.push(text(company.address.name.clone(), left, y, FONT_COMPANY));
    y += 7.0;
    nodes.push(text(company.address.address_line1.clone(), left, y, FONT_BODY));
    y += 4.5;
    nodes.push(text(
        format!("{} {}", company.address.postal_code, company.address.city),
        left,
        y,
        FONT_BODY,
    ));
    y += 4.5;
    for detail in [
        company.vat_number.as_ref().map(|v| format!("TVA : {v}")),
        company.phone.clone(),
        company.email.clone(),
        company.website.clone(),
    ]
    .into_iter()
    .flatten()
    {
        nodes.push(text(detail, left, y, FONT_SMALL));
        y += 4.0;
    }

    // Titre et dates en colonne droite
    let mut right_y = options.margin_top_mm;
    nodes.push(text(
        format!("Facture {}", invoice.invoice_number),
        right_column,
        right_y,
        FONT_TITLE,
    ));
    right_y += 7.0;
    nodes.push(text(
        format!("Date : {}", invoice.issue_date.format("%d.%m.%Y")),
        right_column,
        right_y,
        FONT_BODY,
    ));
    right_y += 4.5;
    nodes.push(text(
        format!("Échéance : {}", invoice.due_date.format("%d.%m.%Y")),
        right_column,
        right_y,
        FONT_BODY,
    ));
    right_y += 4.5;

    // Bloc client
    let mut client_y = y.max(right_y) + 8.0;
    nodes.push(text("Facturé à", left, client_y, FONT_HEADING));
    client_y += 5.0;
    let client = &invoice.client;
    nodes.push(text(client.name.clone(), left, client_y, FONT_BODY));
    client_y += 4.5;
    nodes.push(text(client.address_line1.clone(), left, client_y, FONT_BODY));
    client_y += 4.5;
    if let Some(ref line2) = client.address_line2 {
        if !line2.is_empty() {
            nodes.push(text(line2.clone(), left, client_y, FONT_BODY));
            client_y += 4.5;
        }
    }
    nodes.push(text(
        format!("{} {}", client.postal_code, client.city),
        left,
        client_y,
        FONT_BODY,
    ));
    client_y + 4.5
}

/// En-tête du tableau des lignes ; répété sur chaque page
fn table_header(left: f64, y: f64, nodes: &mut Vec<LayoutNode>) -> f64 {
    nodes.push(text("Description", left, y, FONT_HEADING));
    nodes.push(text("Qté", left + COL_QUANTITY_MM, y, FONT_HEADING));
    nodes.push(text("Prix unitaire", left + COL_UNIT_PRICE_MM, y, FONT_HEADING));
    nodes.push(text("TVA", left + COL_VAT_MM, y, FONT_HEADING));
    nodes.push(text("Total", left + COL_TOTAL_MM, y, FONT_HEADING));
    y + TABLE_HEADER_MM
}

/// Bloc des totaux : sous-total, rabais global, ventilation TVA par taux,
/// total général, puis remarques et conditions
fn totals_block(
    invoice: &InvoiceDocument,
    totals: &InvoiceTotals,
    options: &PageOptions,
    mut y: f64,
    nodes: &mut Vec<LayoutNode>,
) {
    let currency = invoice.currency.code();
    let label_x = options.page_width_mm - options.margin_right_mm - 85.0;
    let value_x = options.page_width_mm - options.margin_right_mm - 30.0;

    nodes.push(text("Sous-total", label_x, y, FONT_BODY));
    nodes.push(text(
        format!("{} {}", format_amount_display(totals.subtotal), currency),
        value_x,
        y,
        FONT_BODY,
    ));
    y += TOTALS_LINE_MM;

    if totals.discount_amount > Decimal::ZERO {
        let note = invoice
            .global_discount
            .as_ref()
            .and_then(|d| d.note.as_deref())
            .unwrap_or("Rabais");
        nodes.push(text(note.to_string(), label_x, y, FONT_BODY));
        nodes.push(text(
            format!("-{} {}", format_amount_display(totals.discount_amount), currency),
            value_x,
            y,
            FONT_BODY,
        ));
        y += TOTALS_LINE_MM;

        nodes.push(text("Sous-total après rabais", label_x, y, FONT_BODY));
        nodes.push(text(
            format!(
                "{} {}",
                format_amount_display(totals.subtotal_after_discount),
                currency
            ),
            value_x,
            y,
            FONT_BODY,
        ));
        y += TOTALS_LINE_MM;
    }

    for entry in &totals.vat_breakdown {
        nodes.push(text(
            format!(
                "TVA {}% sur {} {}",
                entry.rate.normalize(),
                format_amount_display(entry.net_amount),
                currency
            ),
            label_x,
            y,
            FONT_BODY,
        ));
        nodes.push(text(
            format!("{} {}", format_amount_display(entry.vat_amount), currency),
            value_x,
            y,
            FONT_BODY,
        ));
        y += TOTALS_LINE_MM;
    }

    nodes.push(text("Total", label_x, y, FONT_TOTAL));
    nodes.push(text(
        format!("{} {}", format_amount_display(totals.grand_total), currency),
        value_x,
        y,
        FONT_TOTAL,
    ));
    y += TOTALS_LINE_MM + 2.0;

    if let Some(ref notes_text) = invoice.notes {
        nodes.push(text("Remarques", options.margin_left_mm, y, FONT_HEADING));
        y += 4.5;
        nodes.push(text(notes_text.clone(), options.margin_left_mm, y, FONT_SMALL));
        y += TOTALS_LINE_MM;
    }
    if let Some(ref terms) = invoice.terms {
        nodes.push(text("Conditions", options.margin_left_mm, y, FONT_HEADING));
        y += 4.5;
        nodes.push(text(terms.clone(), options.margin_left_mm, y, FONT_SMALL));
    }
}

fn text(content: impl Into<String>, x: f64, y: f64, font: FontSpec) -> LayoutNode {
    LayoutNode::Text {
        content: content.into(),
        x,
        y,
        font,
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        let cut: String = value.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        value.to_string()
    }
}
