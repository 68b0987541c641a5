//! AcroForm builder for interactive PDF forms.
//!
//! Implements the document-level AcroForm dictionary per ISO 32000-1:2008 Section 12.7.2.
//!
//! The AcroForm dictionary is stored in the document catalog and contains:
//! - References to all form fields
//! - Default resources (fonts)
//! - Default appearance string
//!
//! Documents that already carry a form keep their dictionary; new fields are
//! appended with [`AcroFormBuilder::merge_into`].
//!
//! # Example
//!
//! ```
//! use commonforms::writer::AcroFormBuilder;
//! use lopdf::Dictionary;
//!
//! let mut acroform = AcroFormBuilder::new();
//! acroform.add_field((12, 0));
//! let dict = acroform.build(&Dictionary::new());
//! assert!(dict.has(b"Fields"));
//! assert_eq!(dict.get(b"DA").unwrap().as_str().unwrap(), b"/Helv 0 Tf 0 g");
//! ```

use lopdf::{dictionary, Dictionary, Object, ObjectId};

/// Default appearance for fields that don't set their own.
pub const DEFAULT_APPEARANCE: &str = "/Helv 0 Tf 0 g";

/// Resource names and base fonts placed in `/DR`.
pub const STANDARD_FORM_FONTS: [(&str, &str); 2] =
    [("Helv", "Helvetica"), ("ZaDb", "ZapfDingbats")];

/// Builder for the document-level AcroForm dictionary.
///
/// This dictionary defines the document's interactive form properties
/// and contains references to all form fields. The result always asks the
/// viewer to regenerate appearances (`/NeedAppearances true`) and falls back
/// to [`DEFAULT_APPEARANCE`] when the document has no `/DA`.
#[derive(Debug, Clone, Default)]
pub struct AcroFormBuilder {
    /// Field object references
    fields: Vec<ObjectId>,
}

impl AcroFormBuilder {
    /// Create a new AcroForm builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field reference.
    pub fn add_field(&mut self, field_ref: ObjectId) {
        self.fields.push(field_ref);
    }

    /// Check if this form has any fields.
    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Get the number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Build a fresh AcroForm dictionary.
    ///
    /// # Arguments
    ///
    /// * `fonts` - Font resource dictionary for `/DR` (name → font reference)
    pub fn build(&self, fonts: &Dictionary) -> Dictionary {
        let mut dict = Dictionary::new();
        self.merge_into(&mut dict, Vec::new(), fonts);
        dict
    }

    /// Append this builder's fields to an existing AcroForm dictionary.
    ///
    /// `existing_fields` is the document's current `/Fields` array, already
    /// resolved. Entries the document sets itself (`/DA`, fonts in `/DR`) win.
    pub fn merge_into(&self, acroform: &mut Dictionary, existing_fields: Vec<Object>, fonts: &Dictionary) {
        let mut fields = existing_fields;
        fields.extend(self.fields.iter().map(|r| Object::Reference(*r)));
        acroform.set("Fields", Object::Array(fields));

        acroform.set("NeedAppearances", Object::Boolean(true));
        if !acroform.has(b"DA") {
            acroform.set("DA", Object::string_literal(DEFAULT_APPEARANCE));
        }

        if fonts.is_empty() {
            return;
        }
        match acroform.get_mut(b"DR") {
            Ok(Object::Dictionary(dr)) => match dr.get_mut(b"Font") {
                Ok(Object::Dictionary(existing)) => {
                    for (name, font) in fonts.iter() {
                        if !existing.has(name) {
                            existing.set(name.clone(), font.clone());
                        }
                    }
                }
                Ok(_) => {
                    log::debug!("AcroForm /DR /Font is indirect; leaving document fonts as-is");
                }
                Err(_) => dr.set("Font", fonts.clone()),
            },
            Ok(_) => {
                log::debug!("AcroForm /DR is indirect; leaving document resources as-is");
            }
            Err(_) => acroform.set("DR", dictionary! { "Font" => fonts.clone() }),
        }
    }
}

/// Standard 14 font dictionary for form default resources.
pub fn standard_font(base_font: &str) -> Dictionary {
    let mut font = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
    };
    // Symbolic fonts carry their own encoding.
    if base_font != "ZapfDingbats" && base_font != "Symbol" {
        font.set("Encoding", "WinAnsiEncoding");
    }
    font
}
