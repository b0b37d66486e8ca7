//! Fixed lexicons and pattern tables
//!
//! The banking-jargon list, the generic stop-word list, and the transaction
//! type pattern table. All three are immutable data compiled once into
//! regexes at engine construction, never global mutable state.

use regex::{escape, Regex, RegexBuilder};

use crate::error::Result;

/// Banking boilerplate stripped from descriptions to leave the payee.
///
/// Matched longest-first so multi-word phrases win over short terms that
/// are their substrings ("DIRECT DEBIT" before "DD").
pub const BANKING_TERMS: &[&str] = &[
    "DD",
    "DDR",
    "DIRECT DEBIT",
    "DIR DEB",
    "D/D",
    "D/DR",
    "MEMO DD",
    "VAR DD",
    "AUDDIS",
    "SO",
    "STO",
    "S/O",
    "STNDG ORDER",
    "STANDING ORDER",
    "BGC",
    "BACS",
    "BACS CREDIT",
    "BACS PYMT",
    "B.G.C.",
    "BGC/FBP",
    "BGC/FPI",
    "FPI",
    "FPO",
    "FP",
    "FASTER PYMT",
    "FST PYMT",
    "FAST PAY",
    "FP/BGC",
    "CHQ",
    "CHEQUE",
    "CHQ IN",
    "CHQ PAID",
    "C/Q",
    "CQ",
    "CQ IN",
    "ATM",
    "CASH",
    "CASH WDL",
    "WDL",
    "WITHDRAWAL",
    "LINK",
    "CDM",
    "POS",
    "DEB",
    "DEBIT CARD",
    "DC",
    "VISA",
    "MC",
    "MASTERCARD",
    "CHAPS",
    "CHAPS PYMT",
    "CHAP",
    "INT",
    "INTEREST",
    "INT PAID",
    "GROSS INT",
    "NET INT",
    "DIV",
    "DIVIDEND",
    "DIV PAYMT",
    "TFR",
    "TRF",
    "TRANSFER",
    "INTERNAL TFR",
    "ITR",
    "FT",
    "GIRO",
    "GIRO CREDIT",
    "GCT",
    "GIR",
    "REF:",
    "REFERENCE",
    "REF NO",
    "REFN",
    "RN",
    "INV",
    "INVOICE",
    "INV NO",
    "INV#",
    "A/C",
    "AC",
    "ACCOUNT",
    "ACC NO",
    "ACT",
    "ACC",
    "MOTO",
    "E-COM",
    "RECURRING",
    "MANDATE",
    "VALUE DATE",
    "VAL DT",
    "BOOK DATE",
    "NON-STG",
    "NON-STERLING",
    "FX FEE",
    "X-RATE",
    "AUTH",
    "AUTHORISATION",
    "APP CODE",
    "TRANS ID",
    "ORIGINATOR",
    "ORIG",
    "USER ID",
    "MEMO",
    "REMARK",
    "NOTE",
    "CONTACTLESS",
    "CNL",
    "CTLS",
    "COMMISSION",
    "COMM",
    "CMN",
    "FEE",
    "FEES",
    "MONTHLY FEE",
    "ARRANGEMENT FEE",
    "CHARGES",
    "CHG",
    "CHGS",
    "SERVICE CHG",
    "OVERDRAFT",
    "O/D",
    "OD",
    "UNAUTH O/D",
    "PENALTY",
    "RETURNED",
    "UNPAID",
    "STOPPED",
    "ADJUSTMENT",
    "ADJ",
    "CORRECTION",
    "CORR",
    "BENEFICIARY",
    "BILL",
    "BILL PAY",
    "BILL PAYMT",
    "BOND",
    "BONUS",
    "BRANCH",
    "BRH",
    "BROKER",
    "BUSINESS",
    "BUY",
    "CALL",
    "CANCELLED",
    "CAP",
    "CAPITAL",
    "CARD PYMT",
    "CARDHOLDER",
    "CASHBACK",
    "CERTIFICATE",
    "CHARGEBACK",
    "CLEARING",
    "CLOSING",
    "COLL",
    "COLLECTION",
    "COMPOUND",
    "CONSOLIDATED",
    "CONTRA",
    "CONTRACT",
    "CONTRIBUTION",
    "CONVERSION",
    "COST",
    "COUPON",
    "CR",
    "CREDIT",
    "CSD",
    "CUST",
    "DEBIT",
    "DEBT",
    "DRAWING",
    "DR",
    "DUAL",
    "DUE",
    "DUPLICATE",
    "DUTY",
    "EARLY",
    "ELECTRONIC",
    "ESCROW",
    "ESTATE",
    "EST",
    "ESTIMATE",
    "EXCESS",
    "EXCHANGE",
    "EXCL",
    "I-BANK",
    "IBAN",
    "IDENT",
    "IMMED",
    "IMMEDIATE",
    "IMPORT",
    "IMPOST",
    "JRNL",
    "JOURNAL",
    "PAID",
    "PAY",
    "PAYABLE",
    "PAYEE",
    "PAYER",
    "PAYING",
    "PAYMENT",
    "PAYMENTS",
    "ONLINE",
    "TRANSACTION",
    "AUTOMATED",
    "PYMT",
    "PMT",
    "CORD",
    "CARD",
    "CARD TRANSACTION",
    "CORD TRANSACTION",
];

/// Generic words that carry no identity, stripped only for clustering keys.
pub const GENERIC_NOISE: &[&str] = &[
    "TRUCK",
    "STATION",
    "STORE",
    "SHOP",
    "ONLINE",
    "PURCHASE",
    "POS",
    "CARD",
    "TRANSACTION",
    "PAYMENT",
    "BILL",
    "VALUE",
    "DATE",
    "LOC",
    "LOCAL",
    "INT",
    "INTL",
    "COM",
    "CO",
    "UK",
    "USA",
    "EU",
    "THE",
    "AND",
    "AT",
    "OF",
    "TO",
    "FOR",
    "FROM",
    "VIA",
    "IN",
    "ON",
    "BY",
    "MR",
    "MRS",
    "MS",
    "DR",
];

/// Ordered transaction type table: first code with a matching pattern wins.
pub const TYPE_PATTERNS: &[(&str, &[&str])] = &[
    (
        "DD",
        &[
            r"DIRECT DEBIT",
            r"DIR DEB",
            r"MEMO DD",
            r"VAR DD",
            r"\bDD\b",
            r"\bDDR\b",
            r"AUDDIS",
        ],
    ),
    (
        "SO",
        &[
            r"STANDING ORDER",
            r"\bSO\b",
            r"\bSTO\b",
            r"\bS/O\b",
            r"STNDG ORDER",
        ],
    ),
    (
        "FP",
        &[
            r"FASTER PAYMENT",
            r"FASTER PYMT",
            r"FST PYMT",
            r"FP/BGC",
            r"\bFP\b",
            r"\bFPS\b",
            r"\bFPO\b",
            r"\bFPI\b",
            r"FAST PAY",
        ],
    ),
    (
        "CARD",
        &[
            r"CARD TRANSACTION",
            r"VISA",
            r"MASTERCARD",
            r"DEBIT CARD",
            r"CONTACTLESS",
            r"^CD \d",
            r"\bDC\b",
            r"\bPOS\b",
            r"\bMC\b",
            r"CARD\b",
        ],
    ),
    (
        "TFR",
        &[
            r"ONLINE TRANSFER",
            r"INTERNAL TFR",
            r"TRANSFER",
            r"\bTFR\b",
            r"\bTRF\b",
            r"ITR",
            r"\bFT\b",
        ],
    ),
    ("BACS", &[r"\bBACS\b"]),
    ("BGC", &[r"BANK GIRO", r"B\.G\.C\.", r"\bBGC\b"]),
    ("CHQ", &[r"CHEQUE", r"\bCHQ\b", r"C/Q", r"CQ\b"]),
    (
        "CASH",
        &[
            r"\bATM\b",
            r"CASH",
            r"WITHDRAWAL",
            r"\bWDL\b",
            r"\bLINK\b",
            r"\bCDM\b",
        ],
    ),
    (
        "FEE",
        &[
            r"FEE\b",
            r"CHARGE",
            r"\bCHG\b",
            r"COMMISSION",
            r"\bCOMM?\b",
            r"SERVICE CHG",
            r"MONTHLY FEE",
        ],
    ),
    ("INT", &[r"INTEREST", r"\bINT\b", r"GROSS INT", r"NET INT"]),
    ("DIV", &[r"DIVIDEND", r"\bDIV\b"]),
    ("BILL", &[r"BILL PAY", r"\bBP\b", r"BILL\b"]),
    ("SAL", &[r"SALARY", r"PAYROLL", r"WAGES"]),
    ("TAX", &[r"HMRC", r"VAT", r"TAX\b", r"COUNCIL TAX"]),
    ("DEP", &[r"DEPOSIT", r"\bDEP\b", r"CREDIT", r"\bCR\b"]),
    ("CHAPS", &[r"\bCHAPS\b"]),
    (
        "REV",
        &[r"REVERSAL", r"\bREV\b", r"RETURNED", r"UNPAID", r"CANCELLED"],
    ),
    ("REF", &[r"REFUND", r"REPAYMENT", r"\bREFD\b"]),
    ("ADJ", &[r"ADJUSTMENT", r"\bADJ\b", r"CORRECTION", r"\bCORR\b"]),
    ("INS", &[r"INSURANCE", r"\bPREM\b", r"PREMIUM", r"\bINS\b"]),
    ("LOAN", &[r"LOAN", r"MORTGAGE", r"\bMTG\b", r"FINANCE"]),
    ("PENS", &[r"PENSION", r"\bPEN\b"]),
    ("RENT", &[r"RENT\b"]),
    (
        "UTIL",
        &[r"UTILITY", r"\bUTIL\b", r"ELEC", r"GAS\b", r"WATER\b", r"ENERGY"],
    ),
    ("SUB", &[r"SUBSCRIPTION", r"\bSUB\b", r"MEMBERSHIP", r"CLUB\b"]),
    (
        "ONL",
        &[r"ONLINE", r"\bONL\b", r"E-COM", r"INTERNET", r"WEB\b", r"WWW\."],
    ),
    ("PHON", &[r"TELEPHONE", r"PHONE", r"MOBILE", r"\bTEL\b"]),
    ("GIFT", &[r"GIFT", r"DONATION", r"CHARITY"]),
    ("OTHR", &[r"MISC", r"OTHER"]),
];

/// Compile the banking lexicon, longest term first.
///
/// A word boundary is required only on the side of the term that starts or
/// ends with an alphanumeric character. Punctuation-terminated terms like
/// "REF:" or "INV#" are reference markers: they additionally consume the
/// token glued to them, so "REF:1234" disappears as a whole.
pub(crate) fn compile_noise_patterns() -> Result<Vec<Regex>> {
    let mut terms: Vec<&str> = BANKING_TERMS.to_vec();
    terms.sort_by(|a, b| b.len().cmp(&a.len()));

    terms
        .iter()
        .map(|term| {
            let mut pattern = String::new();
            if term.starts_with(|c: char| c.is_ascii_alphanumeric()) {
                pattern.push_str(r"\b");
            }
            pattern.push_str(&escape(term));
            if term.ends_with(|c: char| c.is_ascii_alphanumeric()) {
                pattern.push_str(r"\b");
            } else {
                pattern.push_str(r"\S*");
            }
            case_insensitive(&pattern)
        })
        .collect()
}

/// Compile the generic stop-word list as standalone-word patterns.
pub(crate) fn compile_stop_words() -> Result<Vec<Regex>> {
    GENERIC_NOISE
        .iter()
        .map(|word| Ok(Regex::new(&format!(r"\b{}\b", escape(word)))?))
        .collect()
}

pub(crate) fn case_insensitive(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_patterns_compile() {
        let patterns = compile_noise_patterns().unwrap();
        assert_eq!(patterns.len(), BANKING_TERMS.len());
    }

    #[test]
    fn test_longest_terms_lead() {
        let mut terms: Vec<&str> = BANKING_TERMS.to_vec();
        terms.sort_by(|a, b| b.len().cmp(&a.len()));
        assert!(terms[0].len() >= terms[terms.len() - 1].len());
        let dd = terms.iter().position(|t| *t == "DD").unwrap();
        let direct_debit = terms.iter().position(|t| *t == "DIRECT DEBIT").unwrap();
        assert!(direct_debit < dd);
    }

    #[test]
    fn test_reference_marker_consumes_attached_token() {
        let patterns = compile_noise_patterns().unwrap();
        let cleaned = patterns.iter().fold("REF:1234".to_string(), |text, p| {
            p.replace_all(&text, " ").into_owned()
        });
        assert!(cleaned.trim().is_empty(), "left {cleaned:?}");
    }

    #[test]
    fn test_stop_words_are_standalone() {
        let patterns = compile_stop_words().unwrap();
        let the = patterns
            .iter()
            .find(|p| p.as_str().contains("THE"))
            .unwrap();
        assert!(the.is_match("THE GROCER"));
        assert!(!the.is_match("THEATRE"));
    }
}
