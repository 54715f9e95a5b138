//! The lab bench's reactant catalogue.

use serde::Serialize;

/// A reactant the lab UI can put in a test tube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reactant {
    /// Display symbol, with Unicode subscripts (`H₂`, `Cl₂`).
    pub symbol: &'static str,
    pub color: &'static str,
    pub behavior: &'static str,
    pub note: &'static str,
    /// CSS colour of the test tube.
    pub tube_color: &'static str,
}

const fn reactant(
    symbol: &'static str,
    color: &'static str,
    behavior: &'static str,
    note: &'static str,
    tube_color: &'static str,
) -> Reactant {
    Reactant { symbol, color, behavior, note, tube_color }
}

pub static REACTANTS: &[Reactant] = &[
    reactant("H₂", "colorless gas", "highly flammable", "forms explosive mixture with air", "#a4d8ff"),
    reactant("O₂", "colorless gas", "supports combustion", "essential for respiration", "#ff6666"),
    reactant("Na", "silvery-white metal", "reacts violently with water", "corrosive and produces hydrogen", "#88ccff"),
    reactant("Cl₂", "greenish-yellow gas", "toxic", "forms salts with metals", "#a8e063"),
    reactant("Fe", "grayish metal", "rusts in presence of oxygen and moisture", "forms Fe₂O₃", "#a67c52"),
    reactant("HCl", "colorless acid", "corrosive", "reacts with metals to release hydrogen", "#dd8888"),
    reactant("Zn", "bluish-silver metal", "reacts with acids", "produces hydrogen gas", "#cccccc"),
    reactant("S", "yellow solid", "burns with blue flame", "forms SO₂ on combustion", "#ffdb58"),
    reactant("Cu", "reddish metal", "forms black CuS with sulfur", "used in electrical wiring", "#d17f45"),
    reactant("NaOH", "white solid", "strong base", "neutralizes acids to form salt + water", "#66ccaa"),
    reactant("C", "black solid", "burns in oxygen", "forms CO₂ on complete combustion", "#444444"),
];

/// Look up a reactant by symbol.
///
/// ASCII digits match their subscript form, so `"H2"` finds `H₂`. Matching
/// is otherwise exact.
pub fn find(symbol: &str) -> Option<&'static Reactant> {
    let wanted = to_subscript(symbol.trim());
    REACTANTS.iter().find(|r| r.symbol == wanted)
}

fn to_subscript(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| match c {
            '0'..='9' => char::from_u32('₀' as u32 + (c as u32 - '0' as u32)).unwrap_or(c),
            other => other,
        })
        .collect()
}
