//! Slug derivation
//!
//! Derives a URL-safe identifier from a human name: case-folded,
//! diacritics stripped, non-alphanumeric runs collapsed to `-`.
//! Collision resolution (appending `-2`, `-3`, …) lives with the
//! store, which knows which slugs are taken.

/// Derive a URL-safe slug from a name.
///
/// # Examples
///
/// ```
/// use communa_org::slug::slugify;
///
/// assert_eq!(slugify("Setor São João"), "setor-sao-joao");
/// assert_eq!(slugify("  Young   Couples!  "), "young-couples");
/// ```
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true; // suppress leading dash

    for c in name.to_lowercase().chars() {
        let folded = fold_diacritic(c);
        if folded.is_ascii_alphanumeric() {
            out.push(folded);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Build the nth collision candidate for a base slug.
///
/// The first candidate is the base itself; subsequent candidates are
/// `base-2`, `base-3`, and so on.
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}
