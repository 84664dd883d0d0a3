//! Catalog of named algorithms for airborne science data.
//!
//! Algorithms are grouped into seven categories (thermodynamics,
//! microphysics, radiation, mathematics, transforms, corrections,
//! comparisons). Each implements [`aerodata_core::Algorithm`]: the base
//! contract converts Quantity inputs into the declared units, runs the
//! numeric kernel and stamps the outputs with templated metadata. The
//! [`Catalog`] lists the built-ins and accepts user registrations
//! discovered at startup (see [`user`]).

use aerodata_core::{Algorithm, CoreError, CoreResult};
use ndarray::ArrayD;

pub mod comparisons;
pub mod corrections;
pub mod mathematics;
pub mod microphysics;
pub mod radiation;
pub mod thermodynamics;
pub mod transforms;
pub mod user;

/// Algorithm classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Thermodynamics,
    Microphysics,
    Radiation,
    Mathematics,
    Transforms,
    Corrections,
    Comparisons,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Thermodynamics,
        Category::Microphysics,
        Category::Radiation,
        Category::Mathematics,
        Category::Transforms,
        Category::Corrections,
        Category::Comparisons,
    ];

    /// Directory name used in the user-extension tree.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Thermodynamics => "thermodynamics",
            Category::Microphysics => "microphysics",
            Category::Radiation => "radiation",
            Category::Mathematics => "mathematics",
            Category::Transforms => "transforms",
            Category::Corrections => "corrections",
            Category::Comparisons => "comparisons",
        }
    }
}

type Factory = Box<dyn Fn() -> Box<dyn Algorithm> + Send + Sync>;

struct CatalogEntry {
    name: String,
    category: Category,
    factory: Factory,
}

/// Registry of algorithms by name and category.
#[derive(Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog::default()
    }

    /// The catalog of built-in algorithms.
    pub fn builtin() -> Catalog {
        let mut catalog = Catalog::new();
        macro_rules! add {
            ($category:expr, $name:literal, $ty:ty) => {
                catalog.register($name, $category, || Box::new(<$ty>::new()));
            };
        }

        add!(Category::Thermodynamics, "VelocityTasCnrm", thermodynamics::VelocityTasCnrm);
        add!(Category::Thermodynamics, "DensityDryAirCnrm", thermodynamics::DensityDryAirCnrm);
        add!(Category::Thermodynamics, "TempVirtualCnrm", thermodynamics::TempVirtualCnrm);
        add!(Category::Thermodynamics, "TempPotentialCnrm", thermodynamics::TempPotentialCnrm);
        add!(Category::Microphysics, "NumberConcTotalDmt", microphysics::NumberConcTotalDmt);
        add!(Category::Microphysics, "DiameterEffectiveDmt", microphysics::DiameterEffectiveDmt);
        add!(Category::Radiation, "PlanckEmission", radiation::PlanckEmission);
        add!(Category::Radiation, "TempBlackbody", radiation::TempBlackbody);
        add!(Category::Mathematics, "DerivativeWrtTime", mathematics::DerivativeWrtTime);
        add!(Category::Mathematics, "LimitAngleRange", mathematics::LimitAngleRange);
        add!(Category::Transforms, "InterpolationLinear", transforms::InterpolationLinear);
        add!(Category::Corrections, "CorrectionSpikeSimpleCnrm", corrections::CorrectionSpikeSimpleCnrm);
        add!(Category::Comparisons, "CompareParamLcss", comparisons::CompareParamLcss);
        catalog
    }

    /// Register an algorithm factory; a later registration under an
    /// existing name replaces the earlier one.
    pub fn register<F>(&mut self, name: &str, category: Category, factory: F)
    where
        F: Fn() -> Box<dyn Algorithm> + Send + Sync + 'static,
    {
        self.entries.retain(|e| e.name != name);
        self.entries.push(CatalogEntry {
            name: name.to_string(),
            category,
            factory: Box::new(factory),
        });
    }

    /// Instantiate an algorithm by name.
    pub fn create(&self, name: &str) -> Option<Box<dyn Algorithm>> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| (e.factory)())
    }

    /// Algorithm names, optionally restricted to one category.
    pub fn names(&self, category: Option<Category>) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| category.map(|c| e.category == c).unwrap_or(true))
            .map(|e| e.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Borrow exactly `N` kernel inputs, naming the algorithm on mismatch.
pub(crate) fn expect_inputs<'a, const N: usize>(
    inputs: &'a [ArrayD<f64>],
    name: &str,
) -> CoreResult<&'a [ArrayD<f64>; N]> {
    inputs.try_into().map_err(|_| {
        CoreError::Shape(format!(
            "{} expects {} inputs, got {}",
            name,
            N,
            inputs.len()
        ))
    })
}

/// Scalar content of a coefficient input.
pub(crate) fn scalar(input: &ArrayD<f64>, what: &str) -> CoreResult<f64> {
    if input.len() == 1 {
        input
            .first()
            .copied()
            .ok_or_else(|| CoreError::Shape(format!("{} is empty", what)))
    } else {
        Err(CoreError::Shape(format!(
            "{} must be a scalar coefficient, got shape {:?}",
            what,
            input.shape()
        )))
    }
}

/// Check that vector inputs share one shape.
pub(crate) fn same_shape(inputs: &[&ArrayD<f64>], name: &str) -> CoreResult<()> {
    if let Some(first) = inputs.first() {
        for other in &inputs[1..] {
            if other.shape() != first.shape() {
                return Err(CoreError::Shape(format!(
                    "{} requires equally shaped vector inputs, got {:?} and {:?}",
                    name,
                    first.shape(),
                    other.shape()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_lookup() {
        let catalog = Catalog::builtin();
        assert!(catalog.create("VelocityTasCnrm").is_some());
        assert!(catalog.create("NoSuchAlgorithm").is_none());

        let thermo = catalog.names(Some(Category::Thermodynamics));
        assert!(thermo.contains(&"DensityDryAirCnrm"));
        assert!(!thermo.contains(&"PlanckEmission"));
        assert_eq!(catalog.names(None).len(), catalog.len());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut catalog = Catalog::builtin();
        let before = catalog.len();
        catalog.register("VelocityTasCnrm", Category::Thermodynamics, || {
            Box::new(thermodynamics::VelocityTasCnrm::new())
        });
        assert_eq!(catalog.len(), before);
    }

    #[test]
    fn test_every_builtin_has_valid_metadata() {
        let catalog = Catalog::builtin();
        for name in catalog.names(None) {
            let algorithm = catalog.create(name).expect("factory exists");
            algorithm
                .core()
                .metadata()
                .validate()
                .unwrap_or_else(|e| panic!("{}: {}", name, e));
            assert!(!algorithm.info().is_empty(), "{} has no info", name);
        }
    }
}
