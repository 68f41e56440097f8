//! Kerberos messages.
//!
//! This module contains the schemas for the KRB-ERROR message of RFC 4120
//! and the types it is built from. They use nothing but the public schema
//! vocabulary and serve as an example of how to describe real-world
//! messages.
//!
//! ```
//! use bcschema::Mode;
//! use bcschema::kerberos::KrbError;
//! use bcschema::schema::Registry;
//!
//! # fn decode(data: &'static [u8]) -> Result<(), bcschema::schema::Error> {
//! let registry = Registry::new();
//! let err: KrbError = registry.decode(data, Mode::Der)?;
//! println!("{} from {}", err.error_code, err.realm);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use crate::decode::ContentError;
use crate::schema::{
    Annotate, Asn1Type, EncodingKind, Field, IntWidth, Repr, SequenceSchema,
    SequenceType, Target, Value,
};
use crate::string::StringKind;
use crate::tag::Tag;


//------------ Kinds ---------------------------------------------------------

/// The encoding of a KerberosTime.
///
/// ```text
/// KerberosTime    ::= GeneralizedTime -- with no fractional seconds
/// ```
pub const KERBEROS_TIME: EncodingKind = EncodingKind::GeneralizedTime {
    disallow_fractions: true
};

/// The encoding of a KerberosString and a Realm.
///
/// ```text
/// KerberosString  ::= GeneralString (IA5String)
/// Realm           ::= KerberosString
/// ```
pub const KERBEROS_STRING: EncodingKind = EncodingKind::GeneralString(
    StringKind::Ia5
);


//------------ KrbError ------------------------------------------------------

/// A KRB-ERROR message.
///
/// ```text
/// KRB-ERROR       ::= [APPLICATION 30] SEQUENCE {
///         pvno            [0] INTEGER (5),
///         msg-type        [1] INTEGER (30),
///         ctime           [2] KerberosTime OPTIONAL,
///         cusec           [3] Microseconds OPTIONAL,
///         stime           [4] KerberosTime,
///         susec           [5] Microseconds,
///         error-code      [6] Int32,
///         crealm          [7] Realm OPTIONAL,
///         cname           [8] PrincipalName OPTIONAL,
///         realm           [9] Realm -- service realm --,
///         sname           [10] PrincipalName -- service name --,
///         e-text          [11] KerberosString OPTIONAL,
///         e-data          [12] OCTET STRING OPTIONAL
/// }
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KrbError {
    pub pvno: i32,
    pub msg_type: MessageType,
    pub ctime: Option<DateTime<Utc>>,
    pub cusec: Option<Microseconds>,
    pub stime: DateTime<Utc>,
    pub susec: Microseconds,
    pub error_code: KrbErrorCode,
    pub crealm: Option<String>,
    pub cname: Option<PrincipalName>,

    /// The realm of the service.
    pub realm: String,

    /// The name of the service.
    pub sname: PrincipalName,

    pub etext: Option<String>,
    pub edata: Option<Bytes>,
}

impl SequenceType for KrbError {
    const NAME: &'static str = "KRB-ERROR";
    const TAG: Option<Tag> = Some(Tag::application(30));

    fn schema() -> SequenceSchema<Self> {
        SequenceSchema::default()
            .field(
                Field::new("pvno", |s: &mut Self, v| s.pvno = v)
                    .explicit(Tag::ctx(0))
            )
            .field(
                Field::new("msg-type", |s: &mut Self, v| s.msg_type = v)
                    .kind(EncodingKind::Integer)
                    .explicit(Tag::ctx(1))
            )
            .field(
                Field::new("ctime", |s: &mut Self, v| s.ctime = v)
                    .kind(KERBEROS_TIME)
                    .explicit(Tag::ctx(2))
                    .optional()
            )
            .field(
                Field::new("cusec", |s: &mut Self, v| s.cusec = v)
                    .explicit(Tag::ctx(3))
                    .optional()
            )
            .field(
                Field::new("stime", |s: &mut Self, v| s.stime = v)
                    .kind(KERBEROS_TIME)
                    .explicit(Tag::ctx(4))
            )
            .field(
                Field::new("susec", |s: &mut Self, v| s.susec = v)
                    .explicit(Tag::ctx(5))
            )
            .field(
                Field::new("error-code", |s: &mut Self, v| s.error_code = v)
                    .explicit(Tag::ctx(6))
            )
            .field(
                Field::new("crealm", |s: &mut Self, v| s.crealm = v)
                    .kind(KERBEROS_STRING)
                    .explicit(Tag::ctx(7))
                    .optional()
            )
            .field(
                Field::new("cname", |s: &mut Self, v| s.cname = v)
                    .explicit(Tag::ctx(8))
                    .optional()
            )
            .field(
                Field::new("realm", |s: &mut Self, v| s.realm = v)
                    .kind(KERBEROS_STRING)
                    .explicit(Tag::ctx(9))
            )
            .field(
                Field::new("sname", |s: &mut Self, v| s.sname = v)
                    .explicit(Tag::ctx(10))
            )
            .field(
                Field::new("e-text", |s: &mut Self, v| s.etext = v)
                    .kind(KERBEROS_STRING)
                    .explicit(Tag::ctx(11))
                    .optional()
            )
            .field(
                Field::new("e-data", |s: &mut Self, v| s.edata = v)
                    .kind(EncodingKind::OctetString)
                    .explicit(Tag::ctx(12))
                    .optional()
            )
    }
}

crate::impl_sequence!(KrbError);


//------------ PrincipalName -------------------------------------------------

/// The name of a principal.
///
/// ```text
/// PrincipalName   ::= SEQUENCE {
///         name-type       [0] Int32,
///         name-string     [1] SEQUENCE OF KerberosString
/// }
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PrincipalName {
    pub name_type: NameType,
    pub name: Vec<String>,
}

impl SequenceType for PrincipalName {
    const NAME: &'static str = "PrincipalName";

    fn schema() -> SequenceSchema<Self> {
        SequenceSchema::default()
            .field(
                Field::new("name-type", |s: &mut Self, v| s.name_type = v)
                    .kind(EncodingKind::Integer)
                    .explicit(Tag::ctx(0))
            )
            .field(
                Field::new("name-string", |s: &mut Self, v| s.name = v)
                    .elements(KERBEROS_STRING)
                    .explicit(Tag::ctx(1))
            )
    }
}

crate::impl_sequence!(PrincipalName);

impl fmt::Display for PrincipalName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name.join("/"))
    }
}


//------------ NameType ------------------------------------------------------

/// The type of a principal name.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum NameType {
    /// Name type not known.
    #[default]
    Unknown = 0,

    /// Just the name of the principal as in DCE, or for users.
    Principal = 1,

    /// Service and other unique instance (krbtgt).
    SrvInst = 2,

    /// Service with host name as instance (telnet, rcommands).
    SrvHst = 3,

    /// Service with host as remaining components.
    SrvXhst = 4,

    /// Unique ID.
    Uid = 5,

    /// Encoded X.509 Distinguished name.
    X500Principal = 6,

    /// Name in form of SMTP email name.
    SmtpName = 7,

    /// Enterprise name, may be mapped to principal name.
    Enterprise = 10,

    /// Well-known principal name.
    WellKnown = 11,
}

impl NameType {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(NameType::Unknown),
            1 => Some(NameType::Principal),
            2 => Some(NameType::SrvInst),
            3 => Some(NameType::SrvHst),
            4 => Some(NameType::SrvXhst),
            5 => Some(NameType::Uid),
            6 => Some(NameType::X500Principal),
            7 => Some(NameType::SmtpName),
            10 => Some(NameType::Enterprise),
            11 => Some(NameType::WellKnown),
            _ => None
        }
    }

    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

impl Asn1Type for NameType {
    fn target() -> Target {
        Target::enumerated("NameType")
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        let value = enum_value(value)?;
        Self::from_i32(value).ok_or_else(|| {
            ContentError::from_string(format!("unknown name type {}", value))
        })
    }
}


//------------ MessageType ---------------------------------------------------

/// The type of a Kerberos message.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MessageType {
    AsReq = 10,
    AsRep = 11,
    TgsReq = 12,
    TgsRep = 13,
    ApReq = 14,
    ApRep = 15,
    Safe = 20,
    Priv = 21,
    Cred = 22,

    #[default]
    Error = 30,
}

impl MessageType {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            10 => Some(MessageType::AsReq),
            11 => Some(MessageType::AsRep),
            12 => Some(MessageType::TgsReq),
            13 => Some(MessageType::TgsRep),
            14 => Some(MessageType::ApReq),
            15 => Some(MessageType::ApRep),
            20 => Some(MessageType::Safe),
            21 => Some(MessageType::Priv),
            22 => Some(MessageType::Cred),
            30 => Some(MessageType::Error),
            _ => None
        }
    }

    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

impl Asn1Type for MessageType {
    fn target() -> Target {
        Target::enumerated("MessageType")
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        let value = enum_value(value)?;
        Self::from_i32(value).ok_or_else(|| {
            ContentError::from_string(
                format!("unknown message type {}", value)
            )
        })
    }
}

/// Converts an integer value into the discriminant of an enum.
fn enum_value(value: Value) -> Result<i32, ContentError> {
    value.into_integer()?.to_i32().ok_or(
        ContentError::from_static("enum value out of range")
    )
}


//------------ KrbErrorCode --------------------------------------------------

/// A Kerberos error code.
///
/// Error codes are kept as a plain number since implementations use codes
/// beyond those defined in RFC 4120. The known ones are available as
/// associated constants.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KrbErrorCode(pub i32);

impl KrbErrorCode {
    pub const KDC_ERR_NONE: Self = KrbErrorCode(0);
    pub const KDC_ERR_NAME_EXP: Self = KrbErrorCode(1);
    pub const KDC_ERR_SERVICE_EXP: Self = KrbErrorCode(2);
    pub const KDC_ERR_BAD_PVNO: Self = KrbErrorCode(3);
    pub const KDC_ERR_C_OLD_MAST_KVNO: Self = KrbErrorCode(4);
    pub const KDC_ERR_S_OLD_MAST_KVNO: Self = KrbErrorCode(5);
    pub const KDC_ERR_C_PRINCIPAL_UNKNOWN: Self = KrbErrorCode(6);
    pub const KDC_ERR_S_PRINCIPAL_UNKNOWN: Self = KrbErrorCode(7);
    pub const KDC_ERR_PRINCIPAL_NOT_UNIQUE: Self = KrbErrorCode(8);
    pub const KDC_ERR_NULL_KEY: Self = KrbErrorCode(9);
    pub const KDC_ERR_CANNOT_POSTDATE: Self = KrbErrorCode(10);
    pub const KDC_ERR_NEVER_VALID: Self = KrbErrorCode(11);
    pub const KDC_ERR_POLICY: Self = KrbErrorCode(12);
    pub const KDC_ERR_BADOPTION: Self = KrbErrorCode(13);
    pub const KDC_ERR_ETYPE_NOSUPP: Self = KrbErrorCode(14);
    pub const KDC_ERR_SUMTYPE_NOSUPP: Self = KrbErrorCode(15);
    pub const KDC_ERR_PADATA_TYPE_NOSUPP: Self = KrbErrorCode(16);
    pub const KDC_ERR_TRTYPE_NOSUPP: Self = KrbErrorCode(17);
    pub const KDC_ERR_CLIENT_REVOKED: Self = KrbErrorCode(18);
    pub const KDC_ERR_SERVICE_REVOKED: Self = KrbErrorCode(19);
    pub const KDC_ERR_TGT_REVOKED: Self = KrbErrorCode(20);
    pub const KDC_ERR_CLIENT_NOTYET: Self = KrbErrorCode(21);
    pub const KDC_ERR_SERVICE_NOTYET: Self = KrbErrorCode(22);
    pub const KDC_ERR_KEY_EXPIRED: Self = KrbErrorCode(23);
    pub const KDC_ERR_PREAUTH_FAILED: Self = KrbErrorCode(24);
    pub const KDC_ERR_PREAUTH_REQUIRED: Self = KrbErrorCode(25);
    pub const KDC_ERR_SERVER_NOMATCH: Self = KrbErrorCode(26);
    pub const KDC_ERR_MUST_USE_USER2USER: Self = KrbErrorCode(27);
    pub const KDC_ERR_PATH_NOT_ACCEPTED: Self = KrbErrorCode(28);
    pub const KDC_ERR_SVC_UNAVAILABLE: Self = KrbErrorCode(29);
    pub const KRB_AP_ERR_BAD_INTEGRITY: Self = KrbErrorCode(31);
    pub const KRB_AP_ERR_TKT_EXPIRED: Self = KrbErrorCode(32);
    pub const KRB_AP_ERR_TKT_NYV: Self = KrbErrorCode(33);
    pub const KRB_AP_ERR_REPEAT: Self = KrbErrorCode(34);
    pub const KRB_AP_ERR_NOT_US: Self = KrbErrorCode(35);
    pub const KRB_AP_ERR_BADMATCH: Self = KrbErrorCode(36);
    pub const KRB_AP_ERR_SKEW: Self = KrbErrorCode(37);
    pub const KRB_AP_ERR_BADADDR: Self = KrbErrorCode(38);
    pub const KRB_AP_ERR_BADVERSION: Self = KrbErrorCode(39);
    pub const KRB_AP_ERR_MSG_TYPE: Self = KrbErrorCode(40);
    pub const KRB_AP_ERR_MODIFIED: Self = KrbErrorCode(41);
    pub const KRB_AP_ERR_BADORDER: Self = KrbErrorCode(42);
    pub const KRB_AP_ERR_BADKEYVER: Self = KrbErrorCode(44);
    pub const KRB_AP_ERR_NOKEY: Self = KrbErrorCode(45);
    pub const KRB_AP_ERR_MUT_FAIL: Self = KrbErrorCode(46);
    pub const KRB_AP_ERR_BADDIRECTION: Self = KrbErrorCode(47);
    pub const KRB_AP_ERR_METHOD: Self = KrbErrorCode(48);
    pub const KRB_AP_ERR_BADSEQ: Self = KrbErrorCode(49);
    pub const KRB_AP_ERR_INAPP_CKSUM: Self = KrbErrorCode(50);
    pub const KRB_AP_PATH_NOT_ACCEPTED: Self = KrbErrorCode(51);
    pub const KRB_ERR_RESPONSE_TOO_BIG: Self = KrbErrorCode(52);
    pub const KRB_ERR_GENERIC: Self = KrbErrorCode(60);
    pub const KRB_ERR_FIELD_TOOLONG: Self = KrbErrorCode(61);

    /// Returns the RFC 4120 name of the code if it is known.
    pub fn name(self) -> Option<&'static str> {
        let res = match self.0 {
            0 => "KDC_ERR_NONE",
            1 => "KDC_ERR_NAME_EXP",
            2 => "KDC_ERR_SERVICE_EXP",
            3 => "KDC_ERR_BAD_PVNO",
            4 => "KDC_ERR_C_OLD_MAST_KVNO",
            5 => "KDC_ERR_S_OLD_MAST_KVNO",
            6 => "KDC_ERR_C_PRINCIPAL_UNKNOWN",
            7 => "KDC_ERR_S_PRINCIPAL_UNKNOWN",
            8 => "KDC_ERR_PRINCIPAL_NOT_UNIQUE",
            9 => "KDC_ERR_NULL_KEY",
            10 => "KDC_ERR_CANNOT_POSTDATE",
            11 => "KDC_ERR_NEVER_VALID",
            12 => "KDC_ERR_POLICY",
            13 => "KDC_ERR_BADOPTION",
            14 => "KDC_ERR_ETYPE_NOSUPP",
            15 => "KDC_ERR_SUMTYPE_NOSUPP",
            16 => "KDC_ERR_PADATA_TYPE_NOSUPP",
            17 => "KDC_ERR_TRTYPE_NOSUPP",
            18 => "KDC_ERR_CLIENT_REVOKED",
            19 => "KDC_ERR_SERVICE_REVOKED",
            20 => "KDC_ERR_TGT_REVOKED",
            21 => "KDC_ERR_CLIENT_NOTYET",
            22 => "KDC_ERR_SERVICE_NOTYET",
            23 => "KDC_ERR_KEY_EXPIRED",
            24 => "KDC_ERR_PREAUTH_FAILED",
            25 => "KDC_ERR_PREAUTH_REQUIRED",
            26 => "KDC_ERR_SERVER_NOMATCH",
            27 => "KDC_ERR_MUST_USE_USER2USER",
            28 => "KDC_ERR_PATH_NOT_ACCEPTED",
            29 => "KDC_ERR_SVC_UNAVAILABLE",
            31 => "KRB_AP_ERR_BAD_INTEGRITY",
            32 => "KRB_AP_ERR_TKT_EXPIRED",
            33 => "KRB_AP_ERR_TKT_NYV",
            34 => "KRB_AP_ERR_REPEAT",
            35 => "KRB_AP_ERR_NOT_US",
            36 => "KRB_AP_ERR_BADMATCH",
            37 => "KRB_AP_ERR_SKEW",
            38 => "KRB_AP_ERR_BADADDR",
            39 => "KRB_AP_ERR_BADVERSION",
            40 => "KRB_AP_ERR_MSG_TYPE",
            41 => "KRB_AP_ERR_MODIFIED",
            42 => "KRB_AP_ERR_BADORDER",
            44 => "KRB_AP_ERR_BADKEYVER",
            45 => "KRB_AP_ERR_NOKEY",
            46 => "KRB_AP_ERR_MUT_FAIL",
            47 => "KRB_AP_ERR_BADDIRECTION",
            48 => "KRB_AP_ERR_METHOD",
            49 => "KRB_AP_ERR_BADSEQ",
            50 => "KRB_AP_ERR_INAPP_CKSUM",
            51 => "KRB_AP_PATH_NOT_ACCEPTED",
            52 => "KRB_ERR_RESPONSE_TOO_BIG",
            60 => "KRB_ERR_GENERIC",
            61 => "KRB_ERR_FIELD_TOOLONG",
            _ => return None
        };
        Some(res)
    }
}

impl Asn1Type for KrbErrorCode {
    fn target() -> Target {
        Target::new(Repr::Int(IntWidth::I32), "KrbErrorCode")
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        i32::from_value(value).map(KrbErrorCode)
    }
}

impl fmt::Display for KrbErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "error code {}", self.0),
        }
    }
}


//------------ KerberosFlags -------------------------------------------------

/// A set of Kerberos flags.
///
/// ```text
/// KerberosFlags   ::= BIT STRING (SIZE (32..MAX))
/// ```
///
/// Flags are numbered from the first bit of the BIT STRING. The associated
/// constants are the ticket flags of RFC 4120.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct KerberosFlags(pub u32);

impl KerberosFlags {
    pub const RESERVED: u32 = 0;
    pub const FORWARDABLE: u32 = 1;
    pub const FORWARDED: u32 = 2;
    pub const PROXIABLE: u32 = 3;
    pub const PROXY: u32 = 4;
    pub const MAY_POSTDATE: u32 = 5;
    pub const POSTDATED: u32 = 6;
    pub const INVALID: u32 = 7;
    pub const RENEWABLE: u32 = 8;
    pub const INITIAL: u32 = 9;
    pub const PRE_AUTHENT: u32 = 10;
    pub const HW_AUTHENT: u32 = 11;
    pub const TRANSITED_POLICY_CHECKED: u32 = 12;
    pub const OK_AS_DELEGATE: u32 = 13;

    /// Returns whether the flag with the given number is set.
    pub fn contains(self, flag: u32) -> bool {
        flag < 32 && self.0 & (1 << flag) != 0
    }
}

impl Asn1Type for KerberosFlags {
    fn target() -> Target {
        Target::flags("KerberosFlags")
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        u32::try_from(value.into_flags()?).map(KerberosFlags).map_err(|_| {
            ContentError::from_static("Kerberos flag beyond 32 bits")
        })
    }
}


//------------ Microseconds --------------------------------------------------

/// The microsecond part of a Kerberos timestamp.
///
/// ```text
/// Microseconds    ::= INTEGER (0..999999)
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Microseconds(u32);

impl Microseconds {
    pub const MAX: u32 = 999_999;

    pub fn new(value: u32) -> Option<Self> {
        if value <= Self::MAX {
            Some(Microseconds(value))
        }
        else {
            None
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Asn1Type for Microseconds {
    fn target() -> Target {
        Target::new(Repr::Int(IntWidth::U32), "Microseconds")
            .with_range(0, Self::MAX.into())
    }

    fn from_value(value: Value) -> Result<Self, ContentError> {
        Self::new(u32::from_value(value)?).ok_or(
            ContentError::from_static("microseconds out of range")
        )
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use super::*;
    use crate::mode::Mode;
    use crate::schema::{Error, Registry};

    /// A KRB-ERROR with error code KRB_ERR_RESPONSE_TOO_BIG.
    const RESPONSE_TOO_BIG: &[u8] = b"\
        \x7e\x6a\x30\x68\
        \xa0\x03\x02\x01\x05\
        \xa1\x03\x02\x01\x1e\
        \xa4\x11\x18\x0f20180806203305Z\
        \xa5\x05\x02\x03\x0d\xa5\x5f\
        \xa6\x03\x02\x01\x34\
        \xa9\x14\x1b\x12INT.DEVDOMAINS.ORG\
        \xaa\x27\x30\x25\
            \xa0\x03\x02\x01\x02\
            \xa1\x1e\x30\x1c\
                \x1b\x06krbtgt\
                \x1b\x12INT.DEVDOMAINS.ORG\
    ";

    /// Encodes a value with a definite length of up to 255 octets.
    fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
        let len = u8::try_from(content.len()).unwrap();
        let mut res = vec![tag];
        if len >= 0x80 {
            res.push(0x81);
        }
        res.push(len);
        res.extend_from_slice(content);
        res
    }

    fn decode(data: impl Into<Bytes>, mode: Mode) -> Result<KrbError, Error> {
        Registry::new().decode(data, mode)
    }

    #[test]
    fn response_too_big() {
        assert_eq!(RESPONSE_TOO_BIG.len(), 108);
        for mode in [Mode::Ber, Mode::Cer, Mode::Der] {
            if mode == Mode::Cer {
                // CER doesn’t allow definite length constructed values.
                assert!(decode(RESPONSE_TOO_BIG, mode).is_err());
                continue
            }
            let err = decode(RESPONSE_TOO_BIG, mode).unwrap();
            assert_eq!(err.pvno, 5);
            assert_eq!(err.msg_type, MessageType::Error);
            assert_eq!(
                err.stime,
                Utc.with_ymd_and_hms(2018, 8, 6, 20, 33, 5).unwrap()
            );
            assert_eq!(err.susec.get(), 894_303);
            assert_eq!(err.error_code, KrbErrorCode::KRB_ERR_RESPONSE_TOO_BIG);
            assert_eq!(err.realm, "INT.DEVDOMAINS.ORG");
            assert_eq!(err.sname.name_type, NameType::SrvInst);
            assert_eq!(err.sname.name, ["krbtgt", "INT.DEVDOMAINS.ORG"]);
            assert_eq!(err.ctime, None);
            assert_eq!(err.cusec, None);
            assert_eq!(err.crealm, None);
            assert_eq!(err.cname, None);
            assert_eq!(err.etext, None);
            assert_eq!(err.edata, None);
        }
    }

    #[test]
    fn decode_with_len() {
        let mut data = RESPONSE_TOO_BIG.to_vec();
        data.extend_from_slice(b"\x05\x00");
        let (err, len) = Registry::new().decode_with_len::<KrbError>(
            data, Mode::Der
        ).unwrap();
        assert_eq!(len, 108);
        assert_eq!(err.error_code.to_string(), "KRB_ERR_RESPONSE_TOO_BIG");
    }

    #[test]
    fn truncated() {
        let registry = Registry::new();
        let data = Bytes::from_static(RESPONSE_TOO_BIG);
        for len in 0..data.len() {
            assert!(
                registry.decode::<KrbError>(
                    data.slice(..len), Mode::Der
                ).is_err(),
                "prefix of {} octets accepted", len
            );
        }
    }

    #[test]
    fn microseconds_out_of_range() {
        let mut data = RESPONSE_TOO_BIG.to_vec();
        // susec becomes 1000000
        data[37..40].copy_from_slice(b"\x0f\x42\x40");
        let err = decode(data, Mode::Der).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 'susec' of KRB-ERROR: \
             value 1000000 out of range 0..=999999 (at position 35)"
        );
    }

    #[test]
    fn all_fields() {
        let name = [
            tlv(0xa0, &tlv(0x02, b"\x01")),
            tlv(0xa1, &tlv(0x30, &tlv(0x1b, b"alice"))),
        ].concat();
        let content = [
            tlv(0xa0, &tlv(0x02, b"\x05")),
            tlv(0xa1, &tlv(0x02, b"\x1e")),
            tlv(0xa2, &tlv(0x18, b"20180806203300Z")),
            tlv(0xa3, &tlv(0x02, b"\x00")),
            tlv(0xa4, &tlv(0x18, b"20180806203305Z")),
            tlv(0xa5, &tlv(0x02, b"\x0d\xa5\x5f")),
            tlv(0xa6, &tlv(0x02, b"\x19")),
            tlv(0xa7, &tlv(0x1b, b"EXAMPLE.ORG")),
            tlv(0xa8, &tlv(0x30, &name)),
            tlv(0xa9, &tlv(0x1b, b"EXAMPLE.ORG")),
            tlv(0xaa, &tlv(0x30, &name)),
            tlv(0xab, &tlv(0x1b, b"preauth required")),
            tlv(0xac, &tlv(0x04, b"\x30\x00")),
        ].concat();
        let data = tlv(0x7e, &tlv(0x30, &content));

        let err = decode(data, Mode::Der).unwrap();
        assert_eq!(
            err.ctime,
            Some(Utc.with_ymd_and_hms(2018, 8, 6, 20, 33, 0).unwrap())
        );
        assert_eq!(err.cusec, Microseconds::new(0));
        assert_eq!(err.error_code, KrbErrorCode::KDC_ERR_PREAUTH_REQUIRED);
        assert_eq!(err.crealm.as_deref(), Some("EXAMPLE.ORG"));
        let cname = err.cname.unwrap();
        assert_eq!(cname.name_type, NameType::Principal);
        assert_eq!(cname.to_string(), "alice");
        assert_eq!(err.etext.as_deref(), Some("preauth required"));
        assert_eq!(err.edata, Some(Bytes::from_static(b"\x30\x00")));
    }

    #[test]
    fn unknown_name_type() {
        let name = [
            tlv(0xa0, &tlv(0x02, b"\x63")),
            tlv(0xa1, &tlv(0x30, &[])),
        ].concat();
        let data = tlv(0x30, &name);
        let err = Registry::new().decode::<PrincipalName>(
            data, Mode::Der
        ).unwrap_err();
        assert!(err.to_string().contains("unknown name type 99"));
    }

    #[test]
    fn fractional_kerberos_time() {
        let mut data = RESPONSE_TOO_BIG.to_vec();
        // Replace the ‘Z’ of stime with a fraction. Both have the same
        // length once the seconds are dropped.
        data[18..33].copy_from_slice(b"201808062033.5Z");
        assert!(decode(data, Mode::Ber).is_err());
    }

    #[test]
    fn kerberos_flags() {
        let registry = Registry::new();
        let flags: KerberosFlags = registry.decode(
            Bytes::from_static(b"\x03\x05\x00\x40\x81\x00\x00"), Mode::Der
        ).unwrap();
        assert!(flags.contains(KerberosFlags::FORWARDABLE));
        assert!(flags.contains(KerberosFlags::RENEWABLE));
        assert!(flags.contains(15));
        assert!(!flags.contains(KerberosFlags::FORWARDED));
        assert!(!flags.contains(40));

        // A flag beyond the 32nd bit.
        assert!(registry.decode::<KerberosFlags>(
            Bytes::from_static(b"\x03\x06\x00\x00\x00\x00\x00\x80"),
            Mode::Der
        ).is_err());
    }

    #[test]
    fn register_kerberos_types() {
        let registry = Registry::new();
        assert!(registry.register::<KrbError>().is_ok());
    }
}
