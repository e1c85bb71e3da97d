//! Brazilian tax document (CPF/CNPJ) and phone number helpers.
//!
//! Normalization strips everything but digits; validation implements the
//! official check-digit algorithms. Formatting is for display only and
//! never affects identity comparisons.

/// Strips all non-digit characters from a document string.
pub fn normalize_document(document: &str) -> String {
    document.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalizes a phone number to its last 11 digits.
///
/// Brazilian mobile numbers are 11 digits (DDD + 9 digits); anything
/// longer carries a country prefix that is dropped for comparison.
pub fn normalize_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(11);
    digits[start..].iter().collect()
}

fn digits_of(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// Validates a CPF using its two check digits.
pub fn validate_cpf(cpf: &str) -> bool {
    let digits = digits_of(cpf);
    if digits.len() != 11 || all_same(&digits) {
        return false;
    }

    let mut sum: u32 = 0;
    for i in 0..9 {
        sum += digits[i] * (10 - i as u32);
    }
    let mut remainder = (sum * 10) % 11;
    if remainder >= 10 {
        remainder = 0;
    }
    if remainder != digits[9] {
        return false;
    }

    let mut sum: u32 = 0;
    for i in 0..10 {
        sum += digits[i] * (11 - i as u32);
    }
    let mut remainder = (sum * 10) % 11;
    if remainder >= 10 {
        remainder = 0;
    }
    remainder == digits[10]
}

/// Validates a CNPJ using its two check digits.
pub fn validate_cnpj(cnpj: &str) -> bool {
    let digits = digits_of(cnpj);
    if digits.len() != 14 || all_same(&digits) {
        return false;
    }

    fn check_digit(digits: &[u32]) -> u32 {
        let mut pos = digits.len() as u32 - 7;
        let mut sum: u32 = 0;
        for &d in digits {
            sum += d * pos;
            pos -= 1;
            if pos < 2 {
                pos = 9;
            }
        }
        let rem = sum % 11;
        if rem < 2 {
            0
        } else {
            11 - rem
        }
    }

    check_digit(&digits[..12]) == digits[12] && check_digit(&digits[..13]) == digits[13]
}

/// Formats a bare 11-digit CPF as `000.000.000-00`.
///
/// Inputs that are not 11 digits are returned unchanged.
pub fn format_cpf(cpf: &str) -> String {
    let d = normalize_document(cpf);
    if d.len() != 11 {
        return cpf.to_string();
    }
    format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
}

/// Formats a bare 14-digit CNPJ as `00.000.000/0000-00`.
pub fn format_cnpj(cnpj: &str) -> String {
    let d = normalize_document(cnpj);
    if d.len() != 14 {
        return cnpj.to_string();
    }
    format!(
        "{}.{}.{}/{}-{}",
        &d[0..2],
        &d[2..5],
        &d[5..8],
        &d[8..12],
        &d[12..14]
    )
}

/// Formats a phone number as `(00) 00000-0000` or `(00) 0000-0000`.
pub fn format_phone(phone: &str) -> String {
    let d = normalize_phone(phone);
    match d.len() {
        11 => format!("({}) {}-{}", &d[0..2], &d[2..7], &d[7..11]),
        10 => format!("({}) {}-{}", &d[0..2], &d[2..6], &d[6..10]),
        _ => phone.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_document_strips_punctuation() {
        assert_eq!(normalize_document("111.222.333-44"), "11122233344");
        assert_eq!(normalize_document("12.345.678/0001-95"), "12345678000195");
        assert_eq!(normalize_document(""), "");
    }

    #[test]
    fn test_normalize_phone_keeps_last_11_digits() {
        assert_eq!(normalize_phone("(11) 98765-4321"), "11987654321");
        assert_eq!(normalize_phone("+55 11 98765-4321"), "11987654321");
        assert_eq!(normalize_phone("4321"), "4321");
    }

    #[test]
    fn test_validate_cpf() {
        // 529.982.247-25 is a well-known valid CPF fixture
        assert!(validate_cpf("529.982.247-25"));
        assert!(validate_cpf("52998224725"));
        assert!(!validate_cpf("52998224724"));
        assert!(!validate_cpf("11111111111"));
        assert!(!validate_cpf("1234"));
    }

    #[test]
    fn test_validate_cnpj() {
        // 11.222.333/0001-81 is a well-known valid CNPJ fixture
        assert!(validate_cnpj("11.222.333/0001-81"));
        assert!(validate_cnpj("11222333000181"));
        assert!(!validate_cnpj("11222333000182"));
        assert!(!validate_cnpj("00000000000000"));
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_cpf("52998224725"), "529.982.247-25");
        assert_eq!(format_cnpj("11222333000181"), "11.222.333/0001-81");
        assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
        assert_eq!(format_phone("1133334444"), "(11) 3333-4444");
    }
}
