//! Unit string validation and dimensional algebra.
//!
//! Airborne data files carry units as free-form text (`kg m-3`, `J/K/kg`,
//! `%`, `days since 2017-01-01 00:00:00Z`). This module normalises such
//! strings into a canonical product form (`kg*m^-3`) and implements the
//! dimensional bookkeeping needed to rescale values between compatible
//! units: SI-prefix recognition, base-dimension vectors, multiplicative
//! conversion factors and affine temperature-scale conversion.

use crate::error::{CoreError, CoreResult};

/// Base dimension exponents: length, mass, time, current, temperature,
/// amount of substance, luminous intensity, plane angle.
pub type Dim = [i32; 8];

const DIMENSIONLESS: Dim = [0; 8];
const LENGTH: Dim = [1, 0, 0, 0, 0, 0, 0, 0];
const MASS: Dim = [0, 1, 0, 0, 0, 0, 0, 0];
const TIME: Dim = [0, 0, 1, 0, 0, 0, 0, 0];
const CURRENT: Dim = [0, 0, 0, 1, 0, 0, 0, 0];
const TEMPERATURE: Dim = [0, 0, 0, 0, 1, 0, 0, 0];
const AMOUNT: Dim = [0, 0, 0, 0, 0, 1, 0, 0];
const LUMINOUS: Dim = [0, 0, 0, 0, 0, 0, 1, 0];
const ANGLE: Dim = [0, 0, 0, 0, 0, 0, 0, 1];
const FREQUENCY: Dim = [0, 0, -1, 0, 0, 0, 0, 0];
const FORCE: Dim = [1, 1, -2, 0, 0, 0, 0, 0];
const PRESSURE: Dim = [-1, 1, -2, 0, 0, 0, 0, 0];
const ENERGY: Dim = [2, 1, -2, 0, 0, 0, 0, 0];
const POWER: Dim = [2, 1, -3, 0, 0, 0, 0, 0];
const VELOCITY: Dim = [1, 0, -1, 0, 0, 0, 0, 0];
const VOLUME: Dim = [3, 0, 0, 0, 0, 0, 0, 0];
const SOLID_ANGLE: Dim = [0, 0, 0, 0, 0, 0, 0, 2];

/// Temperature scale of a pure temperature unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempScale {
    Kelvin,
    Celsius,
    Fahrenheit,
}

#[derive(Debug)]
struct UnitDef {
    symbol: &'static str,
    name: &'static str,
    aliases: &'static [&'static str],
    dim: Dim,
    /// Multiplicative factor to the coherent SI base (interval factor for
    /// temperature scales; offsets are handled separately).
    factor: f64,
    prefixable: bool,
    scale: Option<TempScale>,
}

const UNITS: &[UnitDef] = &[
    UnitDef { symbol: "m", name: "meter", aliases: &["meters", "metre", "metres"], dim: LENGTH, factor: 1.0, prefixable: true, scale: None },
    UnitDef { symbol: "g", name: "gram", aliases: &["grams"], dim: MASS, factor: 1e-3, prefixable: true, scale: None },
    UnitDef { symbol: "s", name: "second", aliases: &["seconds", "sec", "secs"], dim: TIME, factor: 1.0, prefixable: true, scale: None },
    UnitDef { symbol: "A", name: "ampere", aliases: &["amperes", "amp", "amps"], dim: CURRENT, factor: 1.0, prefixable: true, scale: None },
    UnitDef { symbol: "K", name: "kelvin", aliases: &["kelvins", "degK", "deg_K"], dim: TEMPERATURE, factor: 1.0, prefixable: true, scale: Some(TempScale::Kelvin) },
    UnitDef { symbol: "degC", name: "celsius", aliases: &["deg_C", "degreeC", "degrees_C", "Celsius", "degree_Celsius"], dim: TEMPERATURE, factor: 1.0, prefixable: false, scale: Some(TempScale::Celsius) },
    UnitDef { symbol: "degF", name: "fahrenheit", aliases: &["deg_F", "degreeF", "degrees_F", "Fahrenheit"], dim: TEMPERATURE, factor: 5.0 / 9.0, prefixable: false, scale: Some(TempScale::Fahrenheit) },
    UnitDef { symbol: "mol", name: "mole", aliases: &["moles"], dim: AMOUNT, factor: 1.0, prefixable: true, scale: None },
    UnitDef { symbol: "cd", name: "candela", aliases: &["candelas"], dim: LUMINOUS, factor: 1.0, prefixable: true, scale: None },
    UnitDef { symbol: "Hz", name: "hertz", aliases: &[], dim: FREQUENCY, factor: 1.0, prefixable: true, scale: None },
    UnitDef { symbol: "N", name: "newton", aliases: &["newtons"], dim: FORCE, factor: 1.0, prefixable: true, scale: None },
    UnitDef { symbol: "Pa", name: "pascal", aliases: &["pascals"], dim: PRESSURE, factor: 1.0, prefixable: true, scale: None },
    UnitDef { symbol: "bar", name: "bar", aliases: &["bars"], dim: PRESSURE, factor: 1e5, prefixable: true, scale: None },
    UnitDef { symbol: "atm", name: "atmosphere", aliases: &["atmospheres"], dim: PRESSURE, factor: 101_325.0, prefixable: false, scale: None },
    UnitDef { symbol: "J", name: "joule", aliases: &["joules"], dim: ENERGY, factor: 1.0, prefixable: true, scale: None },
    UnitDef { symbol: "W", name: "watt", aliases: &["watts"], dim: POWER, factor: 1.0, prefixable: true, scale: None },
    UnitDef { symbol: "percent", name: "percent", aliases: &[], dim: DIMENSIONLESS, factor: 0.01, prefixable: false, scale: None },
    UnitDef { symbol: "degree", name: "degree", aliases: &["degrees", "deg"], dim: ANGLE, factor: std::f64::consts::PI / 180.0, prefixable: false, scale: None },
    UnitDef { symbol: "rad", name: "radian", aliases: &["radians"], dim: ANGLE, factor: 1.0, prefixable: true, scale: None },
    UnitDef { symbol: "sr", name: "steradian", aliases: &["steradians"], dim: SOLID_ANGLE, factor: 1.0, prefixable: false, scale: None },
    UnitDef { symbol: "L", name: "liter", aliases: &["liters", "litre", "litres", "l"], dim: VOLUME, factor: 1e-3, prefixable: true, scale: None },
    UnitDef { symbol: "ft", name: "foot", aliases: &["feet"], dim: LENGTH, factor: 0.3048, prefixable: false, scale: None },
    UnitDef { symbol: "kt", name: "knot", aliases: &["knots", "kts", "kn"], dim: VELOCITY, factor: 0.514444, prefixable: false, scale: None },
    UnitDef { symbol: "min", name: "minute", aliases: &["minutes"], dim: TIME, factor: 60.0, prefixable: false, scale: None },
    UnitDef { symbol: "h", name: "hour", aliases: &["hours", "hr", "hrs"], dim: TIME, factor: 3600.0, prefixable: false, scale: None },
    UnitDef { symbol: "day", name: "day", aliases: &["days"], dim: TIME, factor: 86_400.0, prefixable: false, scale: None },
];

#[derive(Debug)]
struct Prefix {
    symbol: &'static str,
    name: &'static str,
    factor: f64,
}

const PREFIXES: &[Prefix] = &[
    Prefix { symbol: "Y", name: "yotta", factor: 1e24 },
    Prefix { symbol: "Z", name: "zetta", factor: 1e21 },
    Prefix { symbol: "E", name: "exa", factor: 1e18 },
    Prefix { symbol: "P", name: "peta", factor: 1e15 },
    Prefix { symbol: "T", name: "tera", factor: 1e12 },
    Prefix { symbol: "G", name: "giga", factor: 1e9 },
    Prefix { symbol: "M", name: "mega", factor: 1e6 },
    Prefix { symbol: "k", name: "kilo", factor: 1e3 },
    Prefix { symbol: "h", name: "hecto", factor: 1e2 },
    Prefix { symbol: "d", name: "deci", factor: 1e-1 },
    Prefix { symbol: "c", name: "centi", factor: 1e-2 },
    Prefix { symbol: "m", name: "milli", factor: 1e-3 },
    Prefix { symbol: "u", name: "micro", factor: 1e-6 },
    Prefix { symbol: "n", name: "nano", factor: 1e-9 },
    Prefix { symbol: "p", name: "pico", factor: 1e-12 },
    Prefix { symbol: "f", name: "femto", factor: 1e-15 },
    Prefix { symbol: "a", name: "atto", factor: 1e-18 },
];

/// Validate and normalise a unit string.
///
/// Applies, in order: the degree/no-unit compatibility patches, stripping of
/// `" since <ts>"` / `" after <ts>"` time origins, `" / "` collapse, caret
/// insertion between a letter and a following digit or minus sign, space
/// runs to `*`, `%` to `percent`, bare `1` to `dimensionless` and `0.01` to
/// `percent`. The normalised form must parse as a unit expression or an
/// error is returned. Validation is idempotent.
pub fn validate(units: &str) -> CoreResult<String> {
    validate_with_origin(units).map(|(u, _)| u)
}

/// Like [`validate`], but also returns the `" since <ts>"` (or `" after"`)
/// time-origin suffix when the input carried one.
pub fn validate_with_origin(units: &str) -> CoreResult<(String, Option<String>)> {
    let mut u = units.trim().to_string();

    // Compatibility patches carried over from legacy flight data.
    if u.contains("degree_") || u.contains("degrees_") || u.contains("decimal degree") {
        u = "degree".to_string();
    }
    if u == "-" || u == "\u{2014}" {
        u.clear();
    }

    let mut origin = None;
    for marker in [" since ", " after "] {
        if let Some(idx) = u.find(marker) {
            origin = Some(u[idx..].to_string());
            u.truncate(idx);
            break;
        }
    }

    u = u.replace(" / ", "/");
    u = insert_carets(&u);

    // Collapse runs of whitespace into multiplication.
    let mut collapsed = String::with_capacity(u.len());
    let mut in_space = false;
    for c in u.chars() {
        if c.is_whitespace() {
            if !in_space && !collapsed.is_empty() {
                collapsed.push('*');
            }
            in_space = true;
        } else {
            collapsed.push(c);
            in_space = false;
        }
    }
    if collapsed.ends_with('*') {
        collapsed.pop();
    }
    u = collapsed;

    if u.contains('%') {
        u = u.replace('%', "percent");
    }
    if u == "1" {
        u = "dimensionless".to_string();
    }
    if u == "0.01" {
        u = "percent".to_string();
    }

    UnitExpr::parse(&u)?;
    Ok((u, origin))
}

/// Insert `^` between an alphabetic character and a directly following
/// digit or minus sign (`kg m-3` has already become `kg m-3` here; the
/// caret turns `m-3` into `m^-3` and `m2` into `m^2`).
fn insert_carets(u: &str) -> String {
    let chars: Vec<char> = u.chars().collect();
    let mut out = String::with_capacity(u.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if c.is_ascii_alphabetic() {
            if let Some(&next) = chars.get(i + 1) {
                if next.is_ascii_digit() || next == '-' {
                    out.push('^');
                }
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct Term {
    prefix: Option<&'static Prefix>,
    unit: &'static UnitDef,
    exp: i32,
}

/// A parsed unit expression: a product of prefixed unit tokens with integer
/// exponents. The empty product is dimensionless.
#[derive(Debug, Clone)]
pub struct UnitExpr {
    terms: Vec<Term>,
}

impl UnitExpr {
    /// Parse a validated unit string. `""`, `"dimensionless"` and `"1"`
    /// all parse to the empty product.
    pub fn parse(units: &str) -> CoreResult<UnitExpr> {
        let trimmed = units.trim();
        if trimmed.is_empty() || trimmed == "dimensionless" || trimmed == "1" {
            return Ok(UnitExpr { terms: Vec::new() });
        }

        let mut terms = Vec::new();
        let mut invert = false;
        let mut token = String::new();
        let mut chars = trimmed.chars().peekable();

        loop {
            match chars.peek().copied() {
                Some(c) if c == '*' || c == '/' => {
                    chars.next();
                    if !token.is_empty() {
                        terms.push(parse_token(&token, invert, units)?);
                        token.clear();
                    }
                    invert = c == '/';
                }
                Some(c) => {
                    chars.next();
                    token.push(c);
                }
                None => {
                    if !token.is_empty() {
                        terms.push(parse_token(&token, invert, units)?);
                    }
                    break;
                }
            }
        }

        Ok(UnitExpr { terms: normalize(terms) })
    }

    /// Canonical short form, e.g. `kg*m^-3`. The empty product renders as
    /// `dimensionless`.
    pub fn canonical(&self) -> String {
        if self.terms.is_empty() {
            return "dimensionless".to_string();
        }
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|t| {
                let sym = format!("{}{}", t.prefix.map(|p| p.symbol).unwrap_or(""), t.unit.symbol);
                if t.exp == 1 {
                    sym
                } else {
                    format!("{}^{}", sym, t.exp)
                }
            })
            .collect();
        parts.join("*")
    }

    /// Display form using the longest known alias of every token,
    /// e.g. `km` becomes `kilometers`.
    pub fn longest_alias(&self) -> String {
        if self.terms.is_empty() {
            return "dimensionless".to_string();
        }
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|t| {
                let mut longest = t.unit.name;
                for alias in t.unit.aliases {
                    if alias.len() > longest.len() {
                        longest = alias;
                    }
                }
                let name = format!("{}{}", t.prefix.map(|p| p.name).unwrap_or(""), longest);
                if t.exp == 1 {
                    name
                } else {
                    format!("{}^{}", name, t.exp)
                }
            })
            .collect();
        parts.join("*")
    }

    /// Base-dimension exponent vector of the expression.
    pub fn dim(&self) -> Dim {
        let mut dim = DIMENSIONLESS;
        for t in &self.terms {
            for (d, u) in dim.iter_mut().zip(t.unit.dim.iter()) {
                *d += u * t.exp;
            }
        }
        dim
    }

    /// Multiplicative factor from this expression to the coherent SI base.
    pub fn si_factor(&self) -> f64 {
        self.terms.iter().fold(1.0, |acc, t| {
            let f = t.prefix.map(|p| p.factor).unwrap_or(1.0) * t.unit.factor;
            acc * f.powi(t.exp)
        })
    }

    /// True when the expression is dimensionless (empty product, or factors
    /// cancelling to the zero dimension vector).
    pub fn is_dimensionless(&self) -> bool {
        self.dim() == DIMENSIONLESS
    }

    /// Temperature scale when the expression is a single bare temperature
    /// unit (`K`, `degC`, `degF`).
    pub fn temp_scale(&self) -> Option<TempScale> {
        match self.terms.as_slice() {
            [t] if t.exp == 1 && t.prefix.is_none() => t.unit.scale,
            _ => None,
        }
    }

    /// Multiplicative conversion factor from this expression to `target`.
    /// Fails when the dimensions differ. Temperature scales convert with
    /// their interval factor only; cross-scale offsets are the caller's
    /// concern (see [`temperature_shift`]).
    pub fn factor_to(&self, target: &UnitExpr) -> CoreResult<f64> {
        if self.dim() != target.dim() {
            return Err(CoreError::UnitMismatch {
                from: self.canonical(),
                to: target.canonical(),
            });
        }
        Ok(self.si_factor() / target.si_factor())
    }

    /// Product of two expressions (unit algebra for multiplication).
    pub fn mul(&self, other: &UnitExpr) -> UnitExpr {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().copied());
        UnitExpr { terms: normalize(terms) }
    }

    /// Quotient of two expressions (unit algebra for division).
    pub fn div(&self, other: &UnitExpr) -> UnitExpr {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().map(|t| Term { exp: -t.exp, ..*t }));
        UnitExpr { terms: normalize(terms) }
    }

    /// Expression raised to an integer power.
    pub fn powi(&self, n: i32) -> UnitExpr {
        let terms = self
            .terms
            .iter()
            .map(|t| Term { exp: t.exp * n, ..*t })
            .collect();
        UnitExpr { terms: normalize(terms) }
    }
}

/// Merge duplicate tokens and drop zero exponents.
fn normalize(terms: Vec<Term>) -> Vec<Term> {
    let mut merged: Vec<Term> = Vec::with_capacity(terms.len());
    for t in terms {
        let key = (t.prefix.map(|p| p.symbol), t.unit.symbol);
        if let Some(existing) = merged
            .iter_mut()
            .find(|m| (m.prefix.map(|p| p.symbol), m.unit.symbol) == key)
        {
            existing.exp += t.exp;
        } else {
            merged.push(t);
        }
    }
    merged.retain(|t| t.exp != 0);
    merged
}

fn parse_token(token: &str, invert: bool, whole: &str) -> CoreResult<Term> {
    let (base, exp) = match token.split_once('^') {
        Some((b, e)) => {
            let exp: i32 = e
                .parse()
                .map_err(|_| CoreError::Unit(whole.to_string()))?;
            (b, exp)
        }
        None => (token, 1),
    };
    if base.is_empty() {
        return Err(CoreError::Unit(whole.to_string()));
    }

    let (prefix, unit) =
        resolve_symbol(base).ok_or_else(|| CoreError::Unit(whole.to_string()))?;

    Ok(Term {
        prefix,
        unit,
        exp: if invert { -exp } else { exp },
    })
}

fn resolve_symbol(token: &str) -> Option<(Option<&'static Prefix>, &'static UnitDef)> {
    // Exact symbol, name or alias match wins over any prefix split, so
    // `min` is minutes rather than milli-inches and `cd` stays candela.
    if let Some(unit) = lookup_exact(token) {
        return Some((None, unit));
    }
    for prefix in PREFIXES {
        for lead in [prefix.symbol, prefix.name] {
            if let Some(rest) = token.strip_prefix(lead) {
                if !rest.is_empty() {
                    if let Some(unit) = lookup_exact(rest) {
                        if unit.prefixable {
                            return Some((Some(prefix), unit));
                        }
                    }
                }
            }
        }
    }
    None
}

fn lookup_exact(token: &str) -> Option<&'static UnitDef> {
    UNITS
        .iter()
        .find(|u| u.symbol == token || u.name == token || u.aliases.contains(&token))
}

/// Additive shift, expressed in units of `from`, that converts a value on
/// one temperature scale to another before the multiplicative rescale is
/// applied: `v_to = (v_from + shift) * factor`.
pub fn temperature_shift(from: TempScale, to: TempScale) -> f64 {
    // Offsets of each scale's zero point from absolute zero, in the
    // scale's own interval unit.
    fn zero_offset(scale: TempScale) -> f64 {
        match scale {
            TempScale::Kelvin => 0.0,
            TempScale::Celsius => 273.15,
            TempScale::Fahrenheit => 459.67,
        }
    }
    fn interval(scale: TempScale) -> f64 {
        match scale {
            TempScale::Kelvin | TempScale::Celsius => 1.0,
            TempScale::Fahrenheit => 5.0 / 9.0,
        }
    }
    // Work through kelvin: (v_from + z_from) * i_from = (v_to + z_to) * i_to
    // => v_to = (v_from + z_from) * i_from / i_to - z_to
    //         = (v_from + shift) * (i_from / i_to)
    // with shift = z_from - z_to * i_to / i_from.
    zero_offset(from) - zero_offset(to) * interval(to) / interval(from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_basic_forms() {
        assert_eq!(validate("kg m-3").unwrap(), "kg*m^-3");
        assert_eq!(validate("m/s").unwrap(), "m/s");
        assert_eq!(validate("g/cm3").unwrap(), "g/cm^3");
        assert_eq!(validate("%").unwrap(), "percent");
        assert_eq!(validate("1").unwrap(), "dimensionless");
        assert_eq!(validate("0.01").unwrap(), "percent");
        assert_eq!(validate("-").unwrap(), "");
        assert_eq!(validate("J / K / kg").unwrap(), "J/K/kg");
        assert_eq!(validate("W m-2 sr-1 nm-1").unwrap(), "W*m^-2*sr^-1*nm^-1");
    }

    #[test]
    fn test_validate_idempotent() {
        for s in ["kg m-3", "m/s", "%", "1", "W m-2 sr-1 nm-1", "degC", "hPa"] {
            let once = validate(s).unwrap();
            assert_eq!(validate(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_validate_time_origin() {
        let (short, origin) = validate_with_origin("days since 2017-01-01 00:00:00Z").unwrap();
        assert_eq!(short, "days");
        assert_eq!(origin.as_deref(), Some(" since 2017-01-01 00:00:00Z"));
    }

    #[test]
    fn test_validate_degree_patch() {
        assert_eq!(validate("degree_north").unwrap(), "degree");
        assert_eq!(validate("decimal degree").unwrap(), "degree");
    }

    #[test]
    fn test_validate_unknown_unit() {
        assert!(validate("furlongs").is_err());
    }

    #[test]
    fn test_parse_prefixed() {
        let expr = UnitExpr::parse("hPa").unwrap();
        assert!((expr.si_factor() - 100.0).abs() < 1e-12);
        let expr = UnitExpr::parse("mm").unwrap();
        assert!((expr.si_factor() - 1e-3).abs() < 1e-18);
        let expr = UnitExpr::parse("ug").unwrap();
        assert!((expr.si_factor() - 1e-9).abs() < 1e-21);
    }

    #[test]
    fn test_factor_between_compatible() {
        let mm = UnitExpr::parse("mm").unwrap();
        let km = UnitExpr::parse("km").unwrap();
        assert!((mm.factor_to(&km).unwrap() - 1e-6).abs() < 1e-18);

        let kgm3 = UnitExpr::parse("kg*m^-3").unwrap();
        let gcm3 = UnitExpr::parse("g/cm^3").unwrap();
        assert!((gcm3.factor_to(&kgm3).unwrap() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_factor_incompatible() {
        let m = UnitExpr::parse("m").unwrap();
        let s = UnitExpr::parse("s").unwrap();
        assert!(matches!(
            m.factor_to(&s),
            Err(CoreError::UnitMismatch { .. })
        ));
    }

    #[test]
    fn test_canonical_and_alias() {
        let expr = UnitExpr::parse("km").unwrap();
        assert_eq!(expr.canonical(), "km");
        assert_eq!(expr.longest_alias(), "kilometers");

        let expr = UnitExpr::parse("kg*m^-3").unwrap();
        assert_eq!(expr.longest_alias(), "kilograms*meters^-3");
    }

    #[test]
    fn test_temp_scales() {
        assert_eq!(UnitExpr::parse("K").unwrap().temp_scale(), Some(TempScale::Kelvin));
        assert_eq!(UnitExpr::parse("degC").unwrap().temp_scale(), Some(TempScale::Celsius));
        assert_eq!(UnitExpr::parse("m").unwrap().temp_scale(), None);
        // Compound expressions are not bare temperature scales.
        assert_eq!(UnitExpr::parse("K/s").unwrap().temp_scale(), None);
    }

    #[test]
    fn test_temperature_shift() {
        // 0 degC -> K: (0 + 273.15) * 1 = 273.15
        let shift = temperature_shift(TempScale::Celsius, TempScale::Kelvin);
        assert!((shift - 273.15).abs() < 1e-12);

        // 32 degF -> K: (32 + 459.67) * 5/9 = 273.15
        let shift = temperature_shift(TempScale::Fahrenheit, TempScale::Kelvin);
        let factor = UnitExpr::parse("degF")
            .unwrap()
            .factor_to(&UnitExpr::parse("K").unwrap())
            .unwrap();
        assert!(((32.0 + shift) * factor - 273.15).abs() < 1e-9);

        // 273.15 K -> degC: (273.15 - 273.15) * 1 = 0
        let shift = temperature_shift(TempScale::Kelvin, TempScale::Celsius);
        assert!((273.15 + shift).abs() < 1e-12);
    }

    #[test]
    fn test_unit_algebra() {
        let m = UnitExpr::parse("m").unwrap();
        let s = UnitExpr::parse("s").unwrap();
        let speed = m.div(&s);
        assert_eq!(speed.canonical(), "m*s^-1");
        let area = m.mul(&m);
        assert_eq!(area.canonical(), "m^2");
        let hz = s.powi(-1);
        assert_eq!(hz.dim(), FREQUENCY);
    }

    #[test]
    fn test_exact_match_beats_prefix() {
        // `min` is minutes, not milli-inch; `cd` is candela, not centi-day.
        let min = UnitExpr::parse("min").unwrap();
        assert!((min.si_factor() - 60.0).abs() < 1e-12);
        let cd = UnitExpr::parse("cd").unwrap();
        assert_eq!(cd.dim(), LUMINOUS);
    }
}
