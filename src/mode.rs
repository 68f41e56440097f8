//! The encoding rules.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.


//------------ Mode ----------------------------------------------------------

/// The encoding rules to decode data with.
///
/// ASN.1 data can be encoded following one of three sets of rules. The
/// Basic Encoding Rules (BER) allow some flexibility in how a value is
/// represented. The Canonical Encoding Rules (CER) and Distinguished
/// Encoding Rules (DER) both restrict this flexibility so that there is
/// exactly one encoding for each value.
///
/// The mode is passed to every decode and enforced by the reader and the
/// type decoders.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Basic Encoding Rules.
    ///
    /// These are the most flexible rules, allowing alternative encodings
    /// for some types as well as indefinite length values.
    #[default]
    Ber,

    /// Canonical Encoding Rules.
    ///
    /// These rules always employ indefinite length encoding for constructed
    /// values and the shortest possible form for primitive values. There
    /// are additional restrictions for certain types.
    Cer,

    /// Distinguished Encoding Rules.
    ///
    /// These rules always employ definite length values and require the
    /// shortest possible encoding. Additional rules apply to some types.
    Der,
}

impl Mode {
    /// Returns whether the mode is one of the restricted modes CER or DER.
    pub fn is_restricted(self) -> bool {
        !matches!(self, Mode::Ber)
    }

    /// Returns whether the mode allows definite-length constructed values.
    pub fn allows_definite_constructed(self) -> bool {
        !matches!(self, Mode::Cer)
    }

    /// Returns whether the mode allows indefinite-length constructed values.
    pub fn allows_indefinite_constructed(self) -> bool {
        !matches!(self, Mode::Der)
    }
}
