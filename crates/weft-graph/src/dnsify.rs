//! Conversion of free-form names into DNS labels.

use sha2::{Digest, Sha256};

/// Maximum length of a DNS label.
const MAX_LABEL_LEN: usize = 63;

/// Number of hex digits of the digest prefixed to shortened names.
const HASH_LEN: usize = 10;

/// Rewrites `value` into a lowercase DNS label.
///
/// Separators (`_`, `-`, `.`) become dashes, other punctuation is dropped
/// and upper-case letters start a new dash-separated word. Runs of dashes
/// collapse and the label never starts or ends with one. Labels that are
/// too long keep their tail behind a short digest of the full name. The
/// result may be empty.
pub fn dnsify(value: &str) -> String {
    let mut label = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '_' | '-' | '.' => push_dash(&mut label),
            c if c.is_ascii_lowercase() || c.is_ascii_digit() => label.push(c),
            c if c.is_ascii_uppercase() => {
                push_dash(&mut label);
                label.push(c.to_ascii_lowercase());
            }
            _ => {}
        }
    }

    let label = label.trim_end_matches('-');
    if label.len() <= MAX_LABEL_LEN {
        return label.to_owned();
    }

    // The label is ASCII, so byte offsets are char boundaries.
    let digest = hex::encode(Sha256::digest(value.as_bytes()));
    let keep = MAX_LABEL_LEN - HASH_LEN - 1;
    let tail = label[label.len() - keep..].trim_start_matches('-');
    format!("{}-{tail}", &digest[..HASH_LEN])
}

fn push_dash(label: &mut String) {
    if !label.is_empty() && !label.ends_with('-') {
        label.push('-');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_case() {
        assert_eq!(dnsify("t_1"), "t-1");
        assert_eq!(dnsify("my.node-name"), "my-node-name");
        assert_eq!(dnsify("TrainModel"), "train-model");
        assert_eq!(dnsify("_leading"), "leading");
        assert_eq!(dnsify("trailing_"), "trailing");
        assert_eq!(dnsify("a b!c"), "abc");
    }

    #[test]
    fn empty_results_are_possible() {
        assert_eq!(dnsify(""), "");
        assert_eq!(dnsify("___"), "");
        assert_eq!(dnsify("!!"), "");
    }

    #[test]
    fn long_names_are_shortened_with_a_digest() {
        let name = "a".repeat(80);
        let label = dnsify(&name);
        assert!(label.len() <= MAX_LABEL_LEN);
        assert_eq!(label.len(), HASH_LEN + 1 + 52);
        assert!(label.ends_with(&"a".repeat(52)));
        assert_eq!(dnsify(&name), label);
        assert_ne!(dnsify(&"b".repeat(80)), label);
    }

    fn is_dns_label(label: &str) -> bool {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && !label.contains("--")
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    #[test]
    fn dash_runs_collapse() {
        assert_eq!(dnsify("a__"), "a");
        assert_eq!(dnsify("a..b"), "a-b");
        assert_eq!(dnsify("a_B"), "a-b");
        assert_eq!(dnsify("x-_-.Y__"), "x-y");
    }

    #[test]
    fn expanded_camel_case_is_shortened() {
        let name = "ABCDEFGHIJKLMNOPQRSTUVWXYZ".repeat(2);
        let label = dnsify(&name);
        assert!(is_dns_label(&label), "{label}");
        assert!(label.ends_with("-x-y-z"));
        assert_ne!(dnsify(&name.to_lowercase()), label);

        let long = "Ab_".repeat(40);
        for name in ["Train_Model", "a__", "__Big__Name__", long.as_str()] {
            let label = dnsify(name);
            assert!(is_dns_label(&label), "{name} -> {label}");
        }
    }
}
