//! `/Ff` bits for the field types this crate writes (ISO 32000-1, 12.7.3).
//!
//! Text fields and buttons share the low three bits; each type adds its own
//! above them. A checkbox is a `Btn` field with neither `RADIO` nor
//! `PUSHBUTTON` set.

use bitflags::bitflags;

bitflags! {
    /// Flags of a `Tx` field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextFieldFlags: u32 {
        /// Value can't be edited
        const READ_ONLY = 1;
        /// Must be filled before submit
        const REQUIRED = 1 << 1;
        /// Wraps and accepts line breaks
        const MULTILINE = 1 << 12;
        /// No scrolling past the visible box
        const DO_NOT_SCROLL = 1 << 23;
    }
}

bitflags! {
    /// Flags of a `Btn` field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ButtonFieldFlags: u32 {
        /// Value can't be edited
        const READ_ONLY = 1;
        /// Must be set before submit
        const REQUIRED = 1 << 1;
        /// Radio button
        const RADIO = 1 << 15;
        /// Push button
        const PUSHBUTTON = 1 << 16;
    }
}

impl TextFieldFlags {
    /// Add or clear the multiline bit on a raw `/Ff` value.
    ///
    /// Bits this type doesn't know about are preserved.
    ///
    /// # Examples
    ///
    /// ```
    /// use commonforms::writer::form_fields::TextFieldFlags;
    ///
    /// assert_eq!(TextFieldFlags::with_multiline_bit(0, true), 4096);
    /// assert_eq!(TextFieldFlags::with_multiline_bit(4096 | 2, false), 2);
    /// ```
    pub fn with_multiline_bit(raw: i64, multiline: bool) -> i64 {
        let bit = Self::MULTILINE.bits() as i64;
        if multiline {
            raw | bit
        } else {
            raw & !bit
        }
    }
}
