//! Printable catalogs of prefixes, units, constants, kinds and systems

use quanta_core::format::format_general;

use crate::kinds::KINDS;
use crate::prefix::PREFIXES;
use crate::unit::{Category, UnitKind};
use crate::{registry, Dformat, Dimension, SystemType, Unit};

const PRECISION: usize = 10;

pub fn prefixes() -> String {
    let rows = PREFIXES
        .iter()
        .map(|p| {
            vec![
                p.symbol.to_string(),
                p.name.to_string(),
                format_general(p.factor, PRECISION),
                if p.binary { "binary" } else { "decimal" }.to_string(),
            ]
        })
        .collect();
    table(&["Symbol", "Name", "Factor", "Type"], rows)
}

pub fn base_units() -> String {
    unit_table(Category::Base)
}

pub fn derived_units() -> String {
    unit_table(Category::Derived)
}

pub fn logarithmic_units() -> String {
    let rows = registry()
        .by_category(Category::Logarithmic)
        .into_iter()
        .map(|u| {
            let (radix, multiplier) = match u.kind {
                UnitKind::Logarithmic { radix, multiplier } => (radix, multiplier),
                _ => (1.0, 1.0),
            };
            vec![
                u.symbol.clone(),
                u.name.clone(),
                format!("{} {}", format_general(u.factor, PRECISION), u.dimension),
                format_general(radix, PRECISION),
                format_general(multiplier, PRECISION),
            ]
        })
        .collect();
    table(&["Symbol", "Name", "Reference", "Radix", "Multiplier"], rows)
}

pub fn temperature_units() -> String {
    let rows = registry()
        .by_category(Category::Temperature)
        .into_iter()
        .map(|u| {
            let offset = match u.kind {
                UnitKind::Affine { offset } => offset,
                _ => 0.0,
            };
            vec![
                u.symbol.clone(),
                u.name.clone(),
                format_general(u.factor, PRECISION),
                format_general(offset, PRECISION),
            ]
        })
        .collect();
    table(&["Symbol", "Name", "Factor", "Offset"], rows)
}

pub fn constants() -> String {
    let rows = registry()
        .by_category(Category::Constant)
        .into_iter()
        .map(|u| {
            vec![
                u.symbol.clone(),
                u.name.clone(),
                format_general(u.factor, PRECISION),
                u.dimension.to_string(),
            ]
        })
        .collect();
    table(&["Symbol", "Name", "Value (SI)", "Dimension"], rows)
}

/// Quantity kinds with the unit each system uses for them
pub fn quantities() -> String {
    let rows = KINDS
        .iter()
        .map(|k| {
            let mut row = vec![
                format!("<{}>", k.symbol),
                k.name.to_string(),
                dimension_cell(&k.dimension),
            ];
            for system in SystemType::ALL {
                let factor = registry()
                    .kind_unit(k.symbol, system)
                    .map(|u| format_general(u.factor, 6))
                    .unwrap_or_else(|_| "-".to_string());
                row.push(factor);
            }
            row
        })
        .collect();
    let mut headers = vec!["Kind", "Name", "Dimension"];
    headers.extend(SystemType::ALL.iter().map(|s| s.abbrev()));
    table(&headers, rows)
}

pub fn unit_systems() -> String {
    let systems = SystemType::ALL
        .iter()
        .map(|s| {
            vec![
                s.abbrev().to_string(),
                s.name().to_string(),
                s.preferred_units().join(" "),
                registry().system_units(*s).len().to_string(),
            ]
        })
        .collect();
    let formats = Dformat::ALL
        .iter()
        .map(|f| {
            vec![
                f.abbrev().to_string(),
                f.base_units().join(" "),
                f.native_system().abbrev().to_string(),
            ]
        })
        .collect();
    format!(
        "{}\n{}",
        table(&["System", "Name", "Base units", "Units"], systems),
        table(&["Format", "Base units", "System"], formats)
    )
}

fn unit_table(category: Category) -> String {
    let rows = registry()
        .by_category(category)
        .into_iter()
        .map(unit_row)
        .collect();
    table(&["Symbol", "Name", "Dimension", "Factor (SI)", "Systems"], rows)
}

fn unit_row(unit: &Unit) -> Vec<String> {
    let mut symbol = unit.symbol.clone();
    for alias in registry().aliases_of(&unit.symbol) {
        symbol.push_str(", ");
        symbol.push_str(alias);
    }
    let systems = if unit.systems.is_empty() {
        "all".to_string()
    } else {
        unit.systems.iter().map(|s| s.abbrev()).collect::<Vec<_>>().join(" ")
    };
    vec![
        symbol,
        unit.name.clone(),
        dimension_cell(&unit.dimension),
        format_general(unit.factor, PRECISION),
        systems,
    ]
}

/// Dimension formula, followed by its common name when it has one
fn dimension_cell(dimension: &Dimension) -> String {
    match dimension.name() {
        Some(name) => format!("{} ({})", dimension, name),
        None => dimension.to_string(),
    }
}

/// Left-aligned columns separated by two spaces, with a rule under the header
fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: Vec<&str>| -> String {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        line.join("  ").trim_end().to_string()
    };

    let mut out = render(headers.to_vec());
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&render(rule.iter().map(String::as_str).collect()));
    out.push('\n');
    for row in &rows {
        out.push_str(&render(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogs_not_empty() {
        for listing in [
            prefixes(),
            base_units(),
            derived_units(),
            logarithmic_units(),
            temperature_units(),
            constants(),
            quantities(),
            unit_systems(),
        ] {
            assert!(listing.lines().count() > 2, "catalog too short:\n{listing}");
        }
    }

    #[test]
    fn test_catalog_contents() {
        assert!(prefixes().contains("kilo"));
        assert!(base_units().contains("metre"));
        assert!(base_units().contains("L (length)"));
        assert!(derived_units().contains("L M T^-2 (force)"));
        assert!(derived_units().contains("Ohm, "));
        assert!(temperature_units().contains("degC"));
        assert!(logarithmic_units().contains("dBm"));
        assert!(constants().contains("[c]"));
        assert!(quantities().contains("<B>"));
        assert!(unit_systems().contains("EMU"));
        assert!(unit_systems().contains("FPS"));
    }

    #[test]
    fn test_table_alignment() {
        let out = table(&["A", "Long"], vec![vec!["xyz".into(), "1".into()]]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "A    Long");
        assert_eq!(lines[1], "---  ----");
        assert_eq!(lines[2], "xyz  1");
    }
}
