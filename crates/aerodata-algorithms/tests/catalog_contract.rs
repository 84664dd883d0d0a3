//! Cross-cutting checks of the algorithm contract through the catalog.

use aerodata_algorithms::{Catalog, Category};
use aerodata_core::metadata::AttrValue;
use aerodata_core::{Algorithm, Quantity};

/// Resolved output metadata never carries an unresolved `inputN`
/// placeholder.
fn assert_no_placeholders(q: &Quantity) {
    for (key, value) in q.metadata.iter() {
        let text = value.to_string();
        let mut rest = text.as_str();
        while let Some(pos) = rest.find("input") {
            let tail = &rest[pos + 5..];
            assert!(
                !tail.starts_with(|c: char| c.is_ascii_digit()),
                "unresolved placeholder in {}: {}",
                key,
                text
            );
            rest = tail;
        }
    }
}

#[test]
fn test_run_through_trait_object() {
    let catalog = Catalog::builtin();
    let alg = catalog.create("DensityDryAirCnrm").unwrap();

    let p = Quantity::new(vec![1013.25, 900.0], "hPa").unwrap();
    let t = Quantity::new(vec![288.15, 280.0], "K").unwrap();
    let outputs = alg.run(&[p.into(), t.into()]).unwrap();
    assert_eq!(outputs.len(), 1);
    let rho = &outputs[0];
    assert_eq!(rho.units(), "kg/m^3");
    assert!(rho.value()[[0]] > 1.0 && rho.value()[[0]] < 1.5);
    assert_eq!(
        rho.metadata.parent().unwrap().get_str("Processor"),
        Some("DensityDryAirCnrm")
    );
    assert_no_placeholders(rho);
}

#[test]
fn test_templated_outputs_fully_resolved() {
    let catalog = Catalog::builtin();
    let alg = catalog.create("DerivativeWrtTime").unwrap();

    let mut x = Quantity::new(vec![0.0, 1.0, 4.0], "m").unwrap();
    x.metadata.insert("long_name", "altitude");
    let t = Quantity::new(vec![0.0, 1.0, 2.0], "s").unwrap();

    let out = &alg.run(&[x.into(), t.into()]).unwrap()[0];
    assert_eq!(out.metadata.get_str("units"), Some("m/s"));
    assert_eq!(
        out.metadata.get_str("long_name"),
        Some("first derivative of altitude")
    );
    assert_no_placeholders(out);
}

#[test]
fn test_input_units_recorded_in_metadata() {
    let catalog = Catalog::builtin();
    for name in catalog.names(None) {
        let alg = catalog.create(name).unwrap();
        let md = alg.core().metadata();
        let declared = match md.get("Inputs") {
            Some(AttrValue::Strs(v)) => v.len(),
            _ => panic!("{} declares no inputs", name),
        };
        match md.get("InputUnits") {
            Some(AttrValue::Strs(units)) => assert_eq!(
                units.len(),
                declared,
                "{} InputUnits length mismatch",
                name
            ),
            other => panic!("{} has no InputUnits list: {:?}", name, other),
        }
    }
}

#[test]
fn test_every_category_has_an_algorithm() {
    let catalog = Catalog::builtin();
    for category in Category::ALL {
        assert!(
            !catalog.names(Some(category)).is_empty(),
            "category {:?} is empty",
            category
        );
    }
}

#[test]
fn test_unit_equivalence_across_catalog_entry() {
    // Same numeric content in different units produces the same result.
    let catalog = Catalog::builtin();
    let alg = catalog.create("TempPotentialCnrm").unwrap();

    let t_k = Quantity::new(vec![273.15], "K").unwrap();
    let t_c = Quantity::new(vec![0.0], "degC").unwrap();
    let p = Quantity::new(vec![850.0], "hPa").unwrap();

    let from_k = alg
        .run(&[t_k.into(), (&p).into(), 0.286.into()])
        .unwrap();
    let from_c = alg.run(&[t_c.into(), p.into(), 0.286.into()]).unwrap();
    assert!((from_k[0].value()[[0]] - from_c[0].value()[[0]]).abs() < 1e-9);
}
