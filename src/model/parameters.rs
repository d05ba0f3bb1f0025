use serde::{Deserialize, Serialize};

use crate::{Params, QspError};

/// Number of rate, saturation and degradation constants in the model.
pub const NPARAMS: usize = 51;

/// Declares the [Parameters] struct with one named field per model constant.
///
/// The declaration order is the positional order of the flat parameter
/// vector, so `from_slice`/`to_vec` are generated from the same list.
macro_rules! define_parameters {
    ($($name:ident),* $(,)?) => {
        /// Rate constants of one virtual patient.
        ///
        /// Field order matches the positional layout of the 51-value
        /// parameter vectors produced by [crate::population::sample_population].
        #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
        pub struct Parameters {
            $(pub $name: f64,)*
        }

        impl Params for Parameters {
            fn field_names() -> &'static [&'static str] {
                &[$(stringify!($name)),*]
            }

            fn num_params() -> usize {
                NPARAMS
            }

            /// Missing trailing values are filled with `NaN`; use
            /// [Parameters::new] for a validated conversion.
            fn from_slice(values: &[f64]) -> Self {
                let mut values = values.iter().copied();
                Self {
                    $($name: values.next().unwrap_or(f64::NAN),)*
                }
            }

            fn to_vec(&self) -> Vec<f64> {
                vec![$(self.$name),*]
            }
        }
    };
}

define_parameters!(
    k1, k2, k3, b1, b2, b3, b4, b5, d1, d2, d3, b6, d4, d5, d6, d7, b7, b8, d8, k5, k9, d9, b9,
    k6, k10, k7, k8, k11, k12, d10, k13, k14, d11, k15, k16, d12, k17, k18, d13, k19, k20, d14,
    k21, k22, d15, k23, k24, d16, k25, k26, d17,
);

impl Parameters {
    /// Builds a parameter set from a flat vector, checking its length and
    /// that every constant is finite and strictly positive.
    pub fn new(values: &[f64]) -> Result<Self, QspError> {
        if values.len() != NPARAMS {
            return Err(QspError::InvalidLength {
                name: "parameters".to_string(),
                expected: NPARAMS,
                found: values.len(),
            });
        }
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !(v.is_finite() && **v > 0.0))
        {
            return Err(QspError::InvalidValue {
                name: "parameters".to_string(),
                index,
                value,
            });
        }
        Ok(Self::from_slice(values))
    }

    /// Every constant set to the same value. Mostly useful in tests and benches.
    pub fn uniform(value: f64) -> Self {
        Self::from_slice(&[value; NPARAMS])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_positional_layout() {
        let names = Parameters::field_names();
        assert_eq!(names.len(), NPARAMS);
        assert_eq!(Parameters::num_params(), NPARAMS);
        assert_eq!(names[0], "k1");
        assert_eq!(names[2], "k3");
        assert_eq!(names[18], "d8");
        assert_eq!(names[19], "k5");
        assert_eq!(names[29], "d10");
        assert_eq!(names[50], "d17");
    }

    #[test]
    fn slice_conversion_keeps_positions() {
        let values: Vec<f64> = (1..=NPARAMS).map(|i| i as f64).collect();
        let p = Parameters::new(&values).unwrap();
        assert_eq!(p.k1, 1.0);
        assert_eq!(p.k3, 3.0);
        assert_eq!(p.b6, 12.0);
        assert_eq!(p.d8, 19.0);
        assert_eq!(p.k10, 25.0);
        assert_eq!(p.d17, 51.0);
        assert_eq!(p.to_vec(), values);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = Parameters::new(&[1.0; 50]).unwrap_err();
        assert!(matches!(
            err,
            QspError::InvalidLength {
                expected: 51,
                found: 50,
                ..
            }
        ));
    }

    #[test]
    fn rejects_non_positive_values() {
        let mut values = vec![1.0; NPARAMS];
        values[7] = 0.0;
        assert!(matches!(
            Parameters::new(&values),
            Err(QspError::InvalidValue { index: 7, .. })
        ));
        values[7] = f64::NAN;
        assert!(Parameters::new(&values).is_err());
    }
}
