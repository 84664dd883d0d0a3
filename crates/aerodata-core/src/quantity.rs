//! The physical quantity type: value, units and metadata together.
//!
//! `Quantity` is the universal currency of the toolkit. File adapters
//! hydrate them, algorithms consume and produce them, and the converters
//! carry them between formats. Values are n-dimensional `f64` arrays
//! (0-dimensional for scalars); units are kept in validated short form
//! while `metadata["units"]` holds the display form, including any
//! `" since <timestamp>"` time origin.

use ndarray::{ArrayD, Axis, IxDyn};

use crate::error::{CoreError, CoreResult};
use crate::metadata::VariableMetadata;
use crate::units::{self, UnitExpr};

/// A value heading into a [`Quantity`], with the units it may already
/// carry. Plain numbers and arrays carry none.
pub struct QuantityValue {
    data: ArrayD<f64>,
    units: Option<String>,
}

impl From<f64> for QuantityValue {
    fn from(v: f64) -> Self {
        QuantityValue {
            data: ArrayD::from_elem(IxDyn(&[]), v),
            units: None,
        }
    }
}

impl From<Vec<f64>> for QuantityValue {
    fn from(v: Vec<f64>) -> Self {
        QuantityValue {
            data: ArrayD::from_shape_vec(IxDyn(&[v.len()]), v)
                .unwrap_or_else(|_| ArrayD::zeros(IxDyn(&[0]))),
            units: None,
        }
    }
}

impl From<&[f64]> for QuantityValue {
    fn from(v: &[f64]) -> Self {
        v.to_vec().into()
    }
}

impl From<ArrayD<f64>> for QuantityValue {
    fn from(data: ArrayD<f64>) -> Self {
        QuantityValue { data, units: None }
    }
}

impl From<&Quantity> for QuantityValue {
    fn from(q: &Quantity) -> Self {
        QuantityValue {
            data: q.value.clone(),
            units: Some(q.units.clone()),
        }
    }
}

impl From<Quantity> for QuantityValue {
    fn from(q: Quantity) -> Self {
        QuantityValue {
            units: Some(q.units),
            data: q.value,
        }
    }
}

/// A numeric value with units and variable metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    value: ArrayD<f64>,
    units: String,
    pub metadata: VariableMetadata,
}

impl Quantity {
    /// Build a quantity from a value and a unit string. When the value is
    /// another quantity and the unit string is empty, the source units are
    /// adopted.
    pub fn new(value: impl Into<QuantityValue>, units: &str) -> CoreResult<Quantity> {
        Quantity::with_units_and_metadata(value, units, VariableMetadata::default())
    }

    /// Build a quantity pulling its units from `metadata["units"]` (or
    /// `"Units"`).
    pub fn with_metadata(
        value: impl Into<QuantityValue>,
        metadata: VariableMetadata,
    ) -> CoreResult<Quantity> {
        let units = metadata
            .get_str("units")
            .or_else(|| metadata.get_str("Units"))
            .unwrap_or("")
            .to_string();
        Quantity::with_units_and_metadata(value, &units, metadata)
    }

    /// Build a quantity from value, unit string and metadata. The unit
    /// string is validated; a time-origin unit leaves its stripped short
    /// form in `units()` and the full form in `metadata["units"]`.
    pub fn with_units_and_metadata(
        value: impl Into<QuantityValue>,
        units: &str,
        mut metadata: VariableMetadata,
    ) -> CoreResult<Quantity> {
        let qv = value.into();
        let given = if units.trim().is_empty() {
            qv.units.clone().unwrap_or_default()
        } else {
            units.to_string()
        };

        let (short, origin) = units::validate_with_origin(&given)?;
        let display = match &origin {
            Some(suffix) => format!("{}{}", short, suffix),
            None => short.clone(),
        };
        metadata.insert("units", display);

        Ok(Quantity {
            value: qv.data,
            units: short,
            metadata,
        })
    }

    pub fn value(&self) -> &ArrayD<f64> {
        &self.value
    }

    pub fn into_value(self) -> ArrayD<f64> {
        self.value
    }

    /// Canonical (validated, origin-stripped) unit string.
    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// Scalar content of a 0-dimensional or single-element quantity.
    pub fn as_scalar(&self) -> Option<f64> {
        if self.value.len() == 1 {
            self.value.first().copied()
        } else {
            None
        }
    }

    /// Return a copy rescaled to the target units.
    ///
    /// The conversion is multiplicative; cross-scale temperature offsets
    /// must be applied first via [`Quantity::shift`] (the algorithm layer
    /// does this automatically). `metadata["units"]` is set to the longest
    /// alias of the target unit, except for time-origin sources where the
    /// target's short form replaces the unit part and the origin suffix is
    /// preserved.
    pub fn rescale(&self, target: &str) -> CoreResult<Quantity> {
        let (short, _) = units::validate_with_origin(target)?;
        let from = UnitExpr::parse(&self.units)?;
        let to = UnitExpr::parse(&short)?;
        let factor = from.factor_to(&to)?;

        let mut metadata = self.metadata.clone();
        let origin_suffix = self.metadata.get_str("units").and_then(|u| {
            u.find(" since ")
                .or_else(|| u.find(" after "))
                .map(|i| u[i..].to_string())
        });
        let display = match origin_suffix {
            Some(suffix) => format!("{}{}", short, suffix),
            None => to.longest_alias(),
        };
        metadata.insert("units", display);

        Ok(Quantity {
            value: self.value.mapv(|v| v * factor),
            units: short,
            metadata,
        })
    }

    /// Additive shift of every element, units unchanged. Used for the
    /// Celsius/Kelvin offset before a multiplicative rescale.
    pub fn shift(&self, offset: f64) -> Quantity {
        Quantity {
            value: self.value.mapv(|v| v + offset),
            units: self.units.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Slice along every axis; the result carries a copy of this
    /// quantity's metadata. `bounds` gives a half-open `(start, end)`
    /// range per axis.
    pub fn slice(&self, bounds: &[(usize, usize)]) -> CoreResult<Quantity> {
        if bounds.len() != self.value.ndim() {
            return Err(CoreError::Shape(format!(
                "{} slice ranges given for a {}-dimensional value",
                bounds.len(),
                self.value.ndim()
            )));
        }
        let mut view = self.value.view();
        for (axis, &(start, end)) in bounds.iter().enumerate() {
            let len = self.value.shape()[axis];
            if start > end || end > len {
                return Err(CoreError::Shape(format!(
                    "slice {}..{} out of bounds for axis {} of length {}",
                    start, end, axis, len
                )));
            }
            view.slice_axis_inplace(Axis(axis), ndarray::Slice::from(start..end));
        }
        Ok(Quantity {
            value: view.to_owned(),
            units: self.units.clone(),
            metadata: self.metadata.clone(),
        })
    }

    /// Addition. A unitless operand is assumed to share this quantity's
    /// units; a quantity operand is rescaled first.
    pub fn try_add(&self, rhs: impl Into<QuantityValue>) -> CoreResult<Quantity> {
        self.additive_op(rhs.into(), |a, b| a + b)
    }

    /// Subtraction, with the same unit reconciliation as [`Self::try_add`].
    pub fn try_sub(&self, rhs: impl Into<QuantityValue>) -> CoreResult<Quantity> {
        self.additive_op(rhs.into(), |a, b| a - b)
    }

    /// Remainder, with the same unit reconciliation as [`Self::try_add`].
    pub fn try_rem(&self, rhs: impl Into<QuantityValue>) -> CoreResult<Quantity> {
        self.additive_op(rhs.into(), |a, b| a % b)
    }

    /// Multiplication; units combine per unit algebra, unitless operands
    /// are dimensionless.
    pub fn try_mul(&self, rhs: impl Into<QuantityValue>) -> CoreResult<Quantity> {
        self.multiplicative_op(rhs.into(), false)
    }

    /// Division; units combine per unit algebra.
    pub fn try_div(&self, rhs: impl Into<QuantityValue>) -> CoreResult<Quantity> {
        self.multiplicative_op(rhs.into(), true)
    }

    /// Raise to an integer power; units exponents multiply.
    pub fn try_powi(&self, n: i32) -> CoreResult<Quantity> {
        let expr = UnitExpr::parse(&self.units)?;
        let units = expr.powi(n).canonical();
        let mut metadata = self.metadata.clone();
        metadata.insert("units", units.clone());
        Ok(Quantity {
            value: self.value.mapv(|v| v.powi(n)),
            units,
            metadata,
        })
    }

    /// Raise a dimensionless quantity to an arbitrary power.
    pub fn try_powf(&self, p: f64) -> CoreResult<Quantity> {
        let expr = UnitExpr::parse(&self.units)?;
        if !expr.is_dimensionless() {
            return Err(CoreError::Unit(format!(
                "cannot raise '{}' to the non-integer power {}",
                self.units, p
            )));
        }
        Ok(Quantity {
            value: self.value.mapv(|v| v.powf(p)),
            units: self.units.clone(),
            metadata: self.metadata.clone(),
        })
    }

    /// Element-wise `<`; the operand is unit-reconciled first.
    pub fn lt(&self, rhs: impl Into<QuantityValue>) -> CoreResult<ArrayD<bool>> {
        self.compare(rhs.into(), |a, b| a < b)
    }

    /// Element-wise `<=`.
    pub fn le(&self, rhs: impl Into<QuantityValue>) -> CoreResult<ArrayD<bool>> {
        self.compare(rhs.into(), |a, b| a <= b)
    }

    /// Element-wise `>`.
    pub fn gt(&self, rhs: impl Into<QuantityValue>) -> CoreResult<ArrayD<bool>> {
        self.compare(rhs.into(), |a, b| a > b)
    }

    /// Element-wise `>=`.
    pub fn ge(&self, rhs: impl Into<QuantityValue>) -> CoreResult<ArrayD<bool>> {
        self.compare(rhs.into(), |a, b| a >= b)
    }

    /// Element-wise equality.
    pub fn eq_elem(&self, rhs: impl Into<QuantityValue>) -> CoreResult<ArrayD<bool>> {
        self.compare(rhs.into(), |a, b| a == b)
    }

    /// Element-wise inequality.
    pub fn ne_elem(&self, rhs: impl Into<QuantityValue>) -> CoreResult<ArrayD<bool>> {
        self.compare(rhs.into(), |a, b| a != b)
    }

    fn reconcile(&self, rhs: QuantityValue) -> CoreResult<ArrayD<f64>> {
        match rhs.units {
            Some(u) if u != self.units => {
                let from = UnitExpr::parse(&u)?;
                let to = UnitExpr::parse(&self.units)?;
                let factor = from.factor_to(&to)?;
                Ok(rhs.data.mapv(|v| v * factor))
            }
            _ => Ok(rhs.data),
        }
    }

    fn additive_op(
        &self,
        rhs: QuantityValue,
        op: fn(f64, f64) -> f64,
    ) -> CoreResult<Quantity> {
        let rhs = self.reconcile(rhs)?;
        Ok(Quantity {
            value: broadcast_op(&self.value, &rhs, op)?,
            units: self.units.clone(),
            metadata: self.metadata.clone(),
        })
    }

    fn multiplicative_op(&self, rhs: QuantityValue, divide: bool) -> CoreResult<Quantity> {
        let lhs_expr = UnitExpr::parse(&self.units)?;
        let rhs_expr = match &rhs.units {
            Some(u) => UnitExpr::parse(u)?,
            None => UnitExpr::parse("")?,
        };
        let expr = if divide {
            lhs_expr.div(&rhs_expr)
        } else {
            lhs_expr.mul(&rhs_expr)
        };
        let units = expr.canonical();
        let op: fn(f64, f64) -> f64 = if divide { |a, b| a / b } else { |a, b| a * b };

        let mut metadata = self.metadata.clone();
        metadata.insert("units", units.clone());
        Ok(Quantity {
            value: broadcast_op(&self.value, &rhs.data, op)?,
            units,
            metadata,
        })
    }

    fn compare(
        &self,
        rhs: QuantityValue,
        cmp: fn(f64, f64) -> bool,
    ) -> CoreResult<ArrayD<bool>> {
        let rhs = self.reconcile(rhs)?;
        let values = broadcast_op(&self.value, &rhs, |a, b| {
            if cmp(a, b) {
                1.0
            } else {
                0.0
            }
        })?;
        Ok(values.mapv(|v| v != 0.0))
    }
}

/// Element-wise binary operation with scalar broadcasting on either side.
fn broadcast_op(
    lhs: &ArrayD<f64>,
    rhs: &ArrayD<f64>,
    op: impl Fn(f64, f64) -> f64,
) -> CoreResult<ArrayD<f64>> {
    if lhs.shape() == rhs.shape() {
        return Ok(ndarray::Zip::from(lhs)
            .and(rhs)
            .map_collect(|&a, &b| op(a, b)));
    }
    if rhs.len() == 1 {
        let Some(&b) = rhs.first() else {
            return Err(CoreError::Shape("empty operand".to_string()));
        };
        return Ok(lhs.mapv(|a| op(a, b)));
    }
    if lhs.len() == 1 {
        let Some(&a) = lhs.first() else {
            return Err(CoreError::Shape("empty operand".to_string()));
        };
        return Ok(rhs.mapv(|b| op(a, b)));
    }
    Err(CoreError::Shape(format!(
        "operands of shape {:?} and {:?} do not broadcast",
        lhs.shape(),
        rhs.shape()
    )))
}

macro_rules! quantity_binop {
    ($trait:ident, $method:ident, $try_method:ident) => {
        impl std::ops::$trait<&Quantity> for &Quantity {
            type Output = Quantity;

            /// Operator form of the fallible method; panics on unit or
            /// shape incompatibility.
            fn $method(self, rhs: &Quantity) -> Quantity {
                match self.$try_method(rhs) {
                    Ok(q) => q,
                    Err(e) => panic!("{}", e),
                }
            }
        }

        impl std::ops::$trait<f64> for &Quantity {
            type Output = Quantity;

            fn $method(self, rhs: f64) -> Quantity {
                match self.$try_method(rhs) {
                    Ok(q) => q,
                    Err(e) => panic!("{}", e),
                }
            }
        }
    };
}

quantity_binop!(Add, add, try_add);
quantity_binop!(Sub, sub, try_sub);
quantity_binop!(Mul, mul, try_mul);
quantity_binop!(Div, div, try_div);
quantity_binop!(Rem, rem, try_rem);

impl std::ops::Neg for &Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity {
            value: self.value.mapv(|v| -v),
            units: self.units.clone(),
            metadata: self.metadata.clone(),
        }
    }
}
