//! Route names arrive from two feeds (the live tracker and GTFS) that spell
//! them differently: Greek or Latin capitals, stray spaces, mixed case. Both
//! sides are normalized before comparing.

/// Greek capitals and their Latin look-alikes used on route badges.
const GREEK_TO_LATIN: &[(char, &str)] = &[
    ('Α', "A"), ('Β', "B"), ('Γ', "G"), ('Δ', "D"), ('Ε', "E"), ('Ζ', "Z"),
    ('Η', "H"), ('Θ', "TH"), ('Ι', "I"), ('Κ', "K"), ('Λ', "L"), ('Μ', "M"),
    ('Ν', "N"), ('Ξ', "X"), ('Ο', "O"), ('Π', "P"), ('Ρ', "P"), ('Σ', "S"),
    ('Τ', "T"), ('Υ', "Y"), ('Φ', "F"), ('Χ', "X"), ('Ψ', "PS"), ('Ω', "O"),
];

/// Trims, removes inner `' '` characters (other whitespace is kept),
/// uppercases and transliterates Greek capitals.
pub fn normalize_route_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars().filter(|c| *c != ' ').flat_map(char::to_uppercase) {
        match GREEK_TO_LATIN.iter().find(|(g, _)| *g == ch) {
            Some((_, latin)) => out.push_str(latin),
            None => out.push(ch),
        }
    }
    out
}

/// Splits a comma separated list into trimmed, non-empty tokens.
pub fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|t| !t.is_empty())
}
