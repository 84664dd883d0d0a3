//! Algorithm base: unit reconciliation, metadata templating, execution.
//!
//! Every named algorithm in the catalog implements [`Algorithm`]: it
//! declares its metadata and output templates through an
//! [`AlgorithmCore`] and supplies a pure numeric kernel. The provided
//! `run` drives the whole contract: inputs are rescaled into the declared
//! units (with the Celsius/Kelvin offset applied when scales cross),
//! `inputN` placeholders in the output templates are resolved from the
//! corresponding input's metadata, results are wrapped into Quantities
//! stamped with the processing date and parented to the algorithm
//! metadata.

use chrono::Utc;
use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::metadata::{AlgorithmMetadata, AttrValue, ParentMetadata, VariableMetadata};
use crate::quantity::Quantity;
use crate::units::{self, UnitExpr};

/// A positional argument to an algorithm run.
#[derive(Debug, Clone)]
pub enum Input {
    Quantity(Quantity),
    Array(ArrayD<f64>),
    Scalar(f64),
}

impl From<Quantity> for Input {
    fn from(q: Quantity) -> Self {
        Input::Quantity(q)
    }
}

impl From<&Quantity> for Input {
    fn from(q: &Quantity) -> Self {
        Input::Quantity(q.clone())
    }
}

impl From<f64> for Input {
    fn from(v: f64) -> Self {
        Input::Scalar(v)
    }
}

impl From<Vec<f64>> for Input {
    fn from(v: Vec<f64>) -> Self {
        let arr = ArrayD::from_shape_vec(IxDyn(&[v.len()]), v)
            .unwrap_or_else(|_| ArrayD::zeros(IxDyn(&[0])));
        Input::Array(arr)
    }
}

impl From<ArrayD<f64>> for Input {
    fn from(a: ArrayD<f64>) -> Self {
        Input::Array(a)
    }
}

/// Current date/time in ISO 8601, used for `DateProcessed` stamps.
pub fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// The declaration shared by every algorithm: its metadata, the units each
/// positional input must be supplied to the kernel in (`None` meaning
/// "pass through as given"), and the output metadata templates.
#[derive(Debug, Clone)]
pub struct AlgorithmCore {
    metadata: AlgorithmMetadata,
    input_units: Vec<Option<String>>,
    output_templates: Vec<VariableMetadata>,
}

impl AlgorithmCore {
    /// Validate and build an algorithm declaration. Rejects a declaration
    /// with zero outputs, missing mandatory metadata keys, or an input
    /// unit list whose length disagrees with `Inputs`.
    pub fn new(
        mut metadata: AlgorithmMetadata,
        input_units: Vec<Option<&str>>,
        output_templates: Vec<VariableMetadata>,
    ) -> CoreResult<AlgorithmCore> {
        metadata.insert(
            "InputUnits",
            AttrValue::Strs(
                input_units
                    .iter()
                    .map(|u| u.unwrap_or("none").to_string())
                    .collect(),
            ),
        );
        metadata.validate()?;

        if output_templates.is_empty() {
            return Err(CoreError::Metadata(
                "algorithm declares zero output templates".to_string(),
            ));
        }
        let declared_outputs = match metadata.get("Outputs") {
            Some(AttrValue::Strs(v)) => v.len(),
            Some(AttrValue::Str(_)) => 1,
            _ => 0,
        };
        if declared_outputs != output_templates.len() {
            return Err(CoreError::Metadata(format!(
                "algorithm declares {} outputs but provides {} output templates",
                declared_outputs,
                output_templates.len()
            )));
        }
        if let Some(AttrValue::Strs(inputs)) = metadata.get("Inputs") {
            if inputs.len() != input_units.len() {
                return Err(CoreError::Metadata(format!(
                    "algorithm declares {} inputs but {} input units",
                    inputs.len(),
                    input_units.len()
                )));
            }
        }

        Ok(AlgorithmCore {
            metadata,
            input_units: input_units.iter().map(|u| u.map(str::to_string)).collect(),
            output_templates,
        })
    }

    /// Like [`AlgorithmCore::new`], for statically correct built-in
    /// declarations.
    ///
    /// # Panics
    ///
    /// Panics when the declaration is invalid; built-in algorithms declare
    /// their metadata as literals, so a failure here is a programming
    /// error, not a runtime condition.
    pub fn define(
        metadata: AlgorithmMetadata,
        input_units: Vec<Option<&str>>,
        output_templates: Vec<VariableMetadata>,
    ) -> AlgorithmCore {
        match AlgorithmCore::new(metadata, input_units, output_templates) {
            Ok(core) => core,
            Err(e) => panic!("invalid algorithm declaration: {}", e),
        }
    }

    pub fn metadata(&self) -> &AlgorithmMetadata {
        &self.metadata
    }

    pub fn input_units(&self) -> &[Option<String>] {
        &self.input_units
    }

    pub fn output_templates(&self) -> &[VariableMetadata] {
        &self.output_templates
    }
}

/// Contract implemented by every named algorithm.
pub trait Algorithm {
    /// The algorithm's declaration.
    fn core(&self) -> &AlgorithmCore;

    /// The pure numeric kernel. Arguments arrive as plain arrays already
    /// converted into the declared input units.
    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let _ = inputs;
        Err(CoreError::AlgorithmNotImplemented)
    }

    /// Run the algorithm, returning Quantities with resolved output
    /// metadata, in declared output order.
    fn run(&self, args: &[Input]) -> CoreResult<Vec<Quantity>> {
        let (templates, raw) = execute(self.core(), args, &|ins| self.kernel(ins))?;
        raw.into_iter()
            .zip(templates)
            .map(|(value, metadata)| Quantity::with_metadata(value, metadata))
            .collect()
    }

    /// Run the algorithm and return the single declared output.
    fn run_single(&self, args: &[Input]) -> CoreResult<Quantity> {
        let mut outputs = self.run(args)?;
        if outputs.len() != 1 {
            return Err(CoreError::OutputCount {
                expected: 1,
                got: outputs.len(),
            });
        }
        Ok(outputs.remove(0))
    }

    /// Run the algorithm returning the raw numeric results (the
    /// `return_Quantity = false` path); output metadata is still resolved
    /// and stamped on the declaration's behalf but not attached.
    fn run_raw(&self, args: &[Input]) -> CoreResult<Vec<ArrayD<f64>>> {
        let (_, raw) = execute(self.core(), args, &|ins| self.kernel(ins))?;
        Ok(raw)
    }

    /// Human-readable description of the algorithm, assembled from its
    /// metadata.
    fn info(&self) -> String {
        let md = self.core().metadata();
        let mut out = String::new();
        for key in ["Processor", "Purpose", "Description", "Category", "Source", "References"] {
            if let Some(value) = md.get(key) {
                let text = value.to_string();
                if !text.is_empty() {
                    out.push_str(&format!("{:<12}{}\n", key, text));
                }
            }
        }
        out
    }
}

type Kernel<'a> = dyn Fn(&[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> + 'a;

/// The run protocol: template resolution, input conversion, kernel call,
/// stamping and parent wiring. Returns the resolved templates alongside
/// the raw results.
fn execute(
    core: &AlgorithmCore,
    args: &[Input],
    kernel: &Kernel<'_>,
) -> CoreResult<(Vec<VariableMetadata>, Vec<ArrayD<f64>>)> {
    let mut templates = core.output_templates().to_vec();

    for template in templates.iter_mut() {
        resolve_placeholders(template, args);
        rebuild_category(template, args);
    }

    let numeric = convert_inputs(core, args)?;
    let raw = kernel(&numeric)?;

    if raw.len() != templates.len() {
        return Err(CoreError::OutputCount {
            expected: templates.len(),
            got: raw.len(),
        });
    }

    let processor = core
        .metadata()
        .get_str("Processor")
        .unwrap_or_default()
        .to_string();
    let stamp = now_iso();
    for template in templates.iter_mut() {
        template.insert("DateProcessed", stamp.clone());
        template.insert("Processor", processor.clone());
        template.set_parent(ParentMetadata::Algorithm(core.metadata().clone()));
    }

    debug!(processor = %processor, inputs = args.len(), outputs = raw.len(), "algorithm run complete");
    Ok((templates, raw))
}

/// Replace every `inputN` placeholder in the template's string values with
/// the same-keyed attribute of the Nth argument (empty for non-Quantity
/// arguments), repeating until no reference remains.
fn resolve_placeholders(template: &mut VariableMetadata, args: &[Input]) {
    let keys: Vec<String> = template.keys().map(str::to_string).collect();
    for key in keys {
        match template.get(&key).cloned() {
            Some(AttrValue::Str(s)) => {
                let resolved = resolve_string(s, &key, args);
                template.insert(&key, resolved);
            }
            Some(AttrValue::Strs(v)) => {
                let resolved: Vec<String> = v
                    .into_iter()
                    .map(|s| resolve_string(s, &key, args))
                    .collect();
                template.insert(&key, AttrValue::Strs(resolved));
            }
            _ => {}
        }
    }
}

fn resolve_string(mut s: String, key: &str, args: &[Input]) -> String {
    // Substitutions are re-scanned so a replacement that itself names an
    // input is resolved too; the pass cap keeps a malformed self-reference
    // from looping forever.
    let mut passes = 0;
    while let Some((start, end, index)) = find_placeholder(&s) {
        passes += 1;
        if passes > 100 {
            break;
        }
        let replacement = match args.get(index) {
            Some(Input::Quantity(q)) => q
                .metadata
                .get(key)
                .map(|v| v.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };
        s.replace_range(start..end, &replacement);
    }
    s
}

/// Locate the first `input<digits>` occurrence, returning its byte range
/// and the parsed index.
fn find_placeholder(s: &str) -> Option<(usize, usize, usize)> {
    let bytes = s.as_bytes();
    let mut from = 0;
    while let Some(pos) = s[from..].find("input") {
        let start = from + pos;
        let digits_start = start + "input".len();
        let mut end = digits_start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end > digits_start {
            if let Ok(index) = s[digits_start..end].parse::<usize>() {
                return Some((start, end, index));
            }
        }
        from = digits_start;
    }
    None
}

/// Rebuild a `Category` declared as `[""]` into the ordered union of the
/// Quantity inputs' categories.
fn rebuild_category(template: &mut VariableMetadata, args: &[Input]) {
    let is_placeholder = matches!(
        template.get("Category"),
        Some(AttrValue::Strs(v)) if v.len() == 1 && v[0].is_empty()
    );
    if !is_placeholder {
        return;
    }

    let mut categories: Vec<String> = Vec::new();
    for arg in args {
        if let Input::Quantity(q) = arg {
            match q.metadata.get("Category") {
                Some(AttrValue::Strs(list)) => {
                    for c in list {
                        if !c.is_empty() && !categories.contains(c) {
                            categories.push(c.clone());
                        }
                    }
                }
                Some(AttrValue::Str(c)) => {
                    if !c.is_empty() && !categories.contains(c) {
                        categories.push(c.clone());
                    }
                }
                _ => {}
            }
        }
    }
    template.insert("Category", AttrValue::Strs(categories));
}

/// Convert positional arguments into plain arrays in the declared input
/// units. Quantities with a declared unit are rescaled (with the
/// temperature-scale shift applied first when scales cross); quantities
/// without one pass through untouched; plain values are coerced.
fn convert_inputs(core: &AlgorithmCore, args: &[Input]) -> CoreResult<Vec<ArrayD<f64>>> {
    let mut numeric = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        match arg {
            Input::Quantity(q) => {
                let required = core.input_units().get(i).cloned().flatten();
                match required {
                    Some(unit) => {
                        let (short, _) = units::validate_with_origin(&unit)?;
                        let from = UnitExpr::parse(q.units())?;
                        let to = UnitExpr::parse(&short)?;
                        let shifted = match (from.temp_scale(), to.temp_scale()) {
                            (Some(fs), Some(ts)) if fs != ts => {
                                q.shift(units::temperature_shift(fs, ts))
                            }
                            _ => q.clone(),
                        };
                        numeric.push(shifted.rescale(&short)?.into_value());
                    }
                    None => numeric.push(q.value().clone()),
                }
            }
            Input::Array(a) => numeric.push(a.clone()),
            Input::Scalar(v) => numeric.push(ArrayD::from_elem(IxDyn(&[]), *v)),
        }
    }
    Ok(numeric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::AlgorithmMetadata;

    fn algorithm_metadata(
        name: &str,
        inputs: &[&str],
        outputs: &[&str],
    ) -> AlgorithmMetadata {
        AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(inputs)),
            ("InputUnits", AttrValue::Strs(vec![])),
            (
                "InputTypes",
                AttrValue::Strs(inputs.iter().map(|_| "vector".to_string()).collect()),
            ),
            ("Outputs", AttrValue::from(outputs)),
            ("Processor", name.into()),
            ("ProcessorDate", "2026-01-01".into()),
            ("ProcessorVersion", "1.0".into()),
            ("DateProcessed", "".into()),
        ])
    }

    /// Spec scenario: InputUnits ["cm"], output km, kernel x * 1e-5.
    struct DistanceScaler {
        core: AlgorithmCore,
    }

    impl DistanceScaler {
        fn new() -> Self {
            let core = AlgorithmCore::define(
                algorithm_metadata("D", &["x"], &["d"]),
                vec![Some("cm")],
                vec![VariableMetadata::new([
                    ("units", AttrValue::from("km")),
                    ("long_name", "distance".into()),
                ])],
            );
            DistanceScaler { core }
        }
    }

    impl Algorithm for DistanceScaler {
        fn core(&self) -> &AlgorithmCore {
            &self.core
        }

        fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
            Ok(vec![inputs[0].mapv(|x| x * 1e-5)])
        }
    }

    #[test]
    fn test_unit_conversion_through_algorithm() {
        let d = DistanceScaler::new();
        let q = Quantity::new(1000.0, "mm").unwrap();
        let result = d.run_single(&[q.into()]).unwrap();

        assert!((result.as_scalar().unwrap() - 0.001).abs() < 1e-12);
        assert_eq!(result.units(), "km");
        assert_eq!(
            result.metadata.parent().unwrap().get_str("Processor"),
            Some("D")
        );
        assert_eq!(result.metadata.get_str("long_name"), Some("distance"));
        assert!(result.metadata.get_str("DateProcessed").is_some());
    }

    /// Spec scenario: InputUnits [null], templated output metadata.
    struct FirstDerivative {
        core: AlgorithmCore,
    }

    impl FirstDerivative {
        fn new() -> Self {
            let core = AlgorithmCore::define(
                algorithm_metadata("I", &["x"], &["y"]),
                vec![None],
                vec![VariableMetadata::new([
                    ("units", AttrValue::from("input0/sec")),
                    ("long_name", "first derivative of input0".into()),
                ])],
            );
            FirstDerivative { core }
        }
    }

    impl Algorithm for FirstDerivative {
        fn core(&self) -> &AlgorithmCore {
            &self.core
        }

        fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
            Ok(vec![inputs[0].mapv(|x| x * 1e-5)])
        }
    }

    #[test]
    fn test_template_substitution() {
        let alg = FirstDerivative::new();
        let mut q = Quantity::new(vec![1.0, 2.0], "cm").unwrap();
        q.metadata.insert("long_name", "distance");
        let result = alg.run_single(&[q.into()]).unwrap();

        assert_eq!(result.metadata.get_str("units"), Some("cm/sec"));
        assert_eq!(
            result.metadata.get_str("long_name"),
            Some("first derivative of distance")
        );
        assert_eq!(result.units(), "cm/sec");
    }

    #[test]
    fn test_no_placeholder_survives_run() {
        let alg = FirstDerivative::new();
        let mut q = Quantity::new(vec![1.0], "m").unwrap();
        q.metadata.insert("long_name", "x position");
        let result = alg.run_single(&[q.into()]).unwrap();
        for (_, value) in result.metadata.iter() {
            let text = value.to_string();
            assert!(find_placeholder(&text).is_none(), "unresolved: {}", text);
        }
    }

    /// Category union scenario.
    struct Adder {
        core: AlgorithmCore,
    }

    impl Adder {
        fn new() -> Self {
            let core = AlgorithmCore::define(
                algorithm_metadata("Adder", &["a", "b"], &["sum"]),
                vec![None, None],
                vec![VariableMetadata::new([
                    ("units", AttrValue::from("")),
                    ("Category", AttrValue::Strs(vec!["".to_string()])),
                ])],
            );
            Adder { core }
        }
    }

    impl Algorithm for Adder {
        fn core(&self) -> &AlgorithmCore {
            &self.core
        }

        fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
            Ok(vec![&inputs[0] + &inputs[1]])
        }
    }

    #[test]
    fn test_category_union() {
        let alg = Adder::new();
        let mut a = Quantity::new(vec![1.0], "").unwrap();
        a.metadata.insert("Category", AttrValue::Strs(vec!["A".to_string()]));
        let mut b = Quantity::new(vec![2.0], "").unwrap();
        b.metadata.insert("Category", AttrValue::Strs(vec!["B".to_string()]));

        let result = alg.run_single(&[a.into(), b.into()]).unwrap();
        assert_eq!(
            result.metadata.get("Category"),
            Some(&AttrValue::Strs(vec!["A".to_string(), "B".to_string()]))
        );
    }

    #[test]
    fn test_same_content_different_units_same_result() {
        let d = DistanceScaler::new();
        let a = Quantity::new(vec![10.0], "cm").unwrap();
        let b = Quantity::new(vec![100.0], "mm").unwrap();
        let ra = d.run_single(&[a.into()]).unwrap();
        let rb = d.run_single(&[b.into()]).unwrap();
        assert!((ra.value()[[0]] - rb.value()[[0]]).abs() < 1e-15);
    }

    #[test]
    fn test_temperature_scale_crossing() {
        // Kernel sees kelvin even when the caller supplies Celsius.
        struct Identity {
            core: AlgorithmCore,
        }
        impl Identity {
            fn new() -> Self {
                let core = AlgorithmCore::define(
                    algorithm_metadata("Identity", &["T"], &["T_out"]),
                    vec![Some("K")],
                    vec![VariableMetadata::new([("units", AttrValue::from("K"))])],
                );
                Identity { core }
            }
        }
        impl Algorithm for Identity {
            fn core(&self) -> &AlgorithmCore {
                &self.core
            }
            fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
                Ok(vec![inputs[0].clone()])
            }
        }

        let alg = Identity::new();
        let celsius = Quantity::new(vec![0.0, 100.0], "degC").unwrap();
        let result = alg.run_single(&[celsius.into()]).unwrap();
        assert!((result.value()[[0]] - 273.15).abs() < 1e-9);
        assert!((result.value()[[1]] - 373.15).abs() < 1e-9);
    }

    #[test]
    fn test_zero_outputs_rejected_at_construction() {
        let md = algorithm_metadata("Broken", &["x"], &[]);
        assert!(AlgorithmCore::new(md, vec![None], vec![]).is_err());
    }

    #[test]
    fn test_unimplemented_kernel() {
        struct Hollow {
            core: AlgorithmCore,
        }
        impl Algorithm for Hollow {
            fn core(&self) -> &AlgorithmCore {
                &self.core
            }
        }
        let alg = Hollow {
            core: AlgorithmCore::define(
                algorithm_metadata("Hollow", &["x"], &["y"]),
                vec![None],
                vec![VariableMetadata::new([("units", AttrValue::from(""))])],
            ),
        };
        let q = Quantity::new(vec![1.0], "").unwrap();
        assert!(matches!(
            alg.run(&[q.into()]),
            Err(CoreError::AlgorithmNotImplemented)
        ));
    }
}
