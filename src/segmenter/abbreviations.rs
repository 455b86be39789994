use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Words that end in a period without ending the sentence.
///
/// Matched case-sensitively against the word token right before the period
/// (with any interior periods kept, e.g. `e.g` or `Ph.D`).
pub const DEFAULT_ABBREVIATIONS: &[&str] = &[
    // Titles
    "Mr", "Mrs", "Ms", "Dr", "Prof", "Sr", "Jr", "St", "Rev", "Hon", "Gen", "Col", "Capt", "Lt",
    "Sgt", "Mt",
    // Latin and common short forms
    "vs", "etc", "al", "approx", "cf", "viz", "ca", "e.g", "i.e", "Ph.D", "a.m", "p.m",
    // Organisations
    "Inc", "Ltd", "Co", "Corp", "Bros",
    // Months
    "Jan", "Feb", "Mar", "Apr", "Jun", "Jul", "Aug", "Sep", "Sept", "Oct", "Nov", "Dec",
    // References
    "No", "Nos", "Vol", "Vols", "vol", "Fig", "Figs", "fig", "Eq", "eq", "Dept", "Est", "Sec",
    "Ch", "pp",
    // Measurements
    "ft", "lb", "lbs", "oz", "qt", "gal", "mi", "km", "cm", "mm", "kg", "mg", "sq",
    // Other short forms
    "min", "max", "avg", "est", "govt", "Govt", "LLC", "no", "nos",
];

pub(crate) static DEFAULT_ABBREVIATION_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| DEFAULT_ABBREVIATIONS.iter().copied().collect());
