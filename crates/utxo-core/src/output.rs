//! Transaction outputs
//!
//! An output set may contain at most one `max` output. The `max` value is a
//! placeholder: it is resolved exactly once, to whatever remains after the
//! fixed outputs and the fee have been subtracted.

use bitcoin::{Amount, ScriptBuf, TxOut};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputError {
    #[error("Multiple max outputs: found {0}, at most one is allowed")]
    MultipleMaxOutputs(usize),

    #[error("Output value sum overflows")]
    Overflow,
}

/// Value of an output that may still be a placeholder.
///
/// Serializes as a satoshi number or the string `"max"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OutputValueRepr", into = "OutputValueRepr")]
pub enum OutputValue {
    /// A concrete amount
    Fixed(Amount),
    /// Takes whatever remains after fixed outputs and fee
    Max,
}

const MAX_TAG: &str = "max";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OutputValueRepr {
    Sat(u64),
    Tag(String),
}

impl From<OutputValue> for OutputValueRepr {
    fn from(value: OutputValue) -> Self {
        match value {
            OutputValue::Fixed(amount) => OutputValueRepr::Sat(amount.to_sat()),
            OutputValue::Max => OutputValueRepr::Tag(MAX_TAG.to_string()),
        }
    }
}

impl TryFrom<OutputValueRepr> for OutputValue {
    type Error = String;

    fn try_from(repr: OutputValueRepr) -> Result<Self, Self::Error> {
        match repr {
            OutputValueRepr::Sat(sat) => Ok(OutputValue::Fixed(Amount::from_sat(sat))),
            OutputValueRepr::Tag(tag) if tag == MAX_TAG => Ok(OutputValue::Max),
            OutputValueRepr::Tag(tag) => Err(format!(
                "expected a satoshi amount or \"max\", got {:?}",
                tag
            )),
        }
    }
}

impl From<Amount> for OutputValue {
    fn from(amount: Amount) -> Self {
        OutputValue::Fixed(amount)
    }
}

/// A transaction output: script plus value.
///
/// `V` is [`Amount`] for resolved outputs and [`OutputValue`] for output sets
/// that may still carry a `max` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output<V = Amount> {
    /// The output script (scriptPubKey)
    pub script: ScriptBuf,
    /// The output value
    pub value: V,
}

impl<V> Output<V> {
    /// Create a new output
    pub fn new(script: ScriptBuf, value: V) -> Self {
        Self { script, value }
    }

    /// Replace the value, keeping the script
    pub fn with_value<W>(self, value: W) -> Output<W> {
        Output {
            script: self.script,
            value,
        }
    }
}

impl Output<Amount> {
    /// Convert to a consensus `TxOut`
    pub fn to_txout(&self) -> TxOut {
        TxOut {
            value: self.value,
            script_pubkey: self.script.clone(),
        }
    }
}

impl From<TxOut> for Output<Amount> {
    fn from(txout: TxOut) -> Self {
        Self {
            script: txout.script_pubkey,
            value: txout.value,
        }
    }
}

impl From<Output<Amount>> for TxOut {
    fn from(output: Output<Amount>) -> Self {
        TxOut {
            value: output.value,
            script_pubkey: output.script,
        }
    }
}

impl From<Output<Amount>> for Output<OutputValue> {
    fn from(output: Output<Amount>) -> Self {
        Output {
            script: output.script,
            value: OutputValue::Fixed(output.value),
        }
    }
}

/// Returns true if this output carries the `max` placeholder.
pub fn is_max_output(output: &Output<OutputValue>) -> bool {
    output.value == OutputValue::Max
}

/// Find the single `max` output, if any.
///
/// Errors with [`OutputError::MultipleMaxOutputs`] if more than one is present.
pub fn get_max_output(
    outputs: &[Output<OutputValue>],
) -> Result<Option<&Output<OutputValue>>, OutputError> {
    let max_outputs: Vec<&Output<OutputValue>> =
        outputs.iter().filter(|o| is_max_output(o)).collect();
    match max_outputs.len() {
        0 => Ok(None),
        1 => Ok(Some(max_outputs[0])),
        n => Err(OutputError::MultipleMaxOutputs(n)),
    }
}

/// Sum of all output values.
pub fn get_output_sum(outputs: &[Output<Amount>]) -> Result<Amount, OutputError> {
    outputs.iter().try_fold(Amount::ZERO, |sum, o| {
        sum.checked_add(o.value).ok_or(OutputError::Overflow)
    })
}

/// Sum of the values of all outputs that are not `max` outputs.
pub fn get_fixed_output_sum(outputs: &[Output<OutputValue>]) -> Result<Amount, OutputError> {
    outputs
        .iter()
        .filter_map(|o| match o.value {
            OutputValue::Fixed(amount) => Some(amount),
            OutputValue::Max => None,
        })
        .try_fold(Amount::ZERO, |sum, v| {
            sum.checked_add(v).ok_or(OutputError::Overflow)
        })
}

/// Resolve the `max` output (if present) to `max_amount`.
///
/// All other outputs are passed through unchanged. Errors if more than one
/// `max` output is present.
pub fn to_fixed_outputs(
    outputs: &[Output<OutputValue>],
    max_amount: Amount,
) -> Result<Vec<Output<Amount>>, OutputError> {
    // validate before mapping so a bad set never gets partially resolved
    get_max_output(outputs)?;

    Ok(outputs
        .iter()
        .map(|o| {
            let value = match o.value {
                OutputValue::Fixed(amount) => amount,
                OutputValue::Max => max_amount,
            };
            o.clone().with_value(value)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(byte: u8) -> ScriptBuf {
        ScriptBuf::from_bytes(vec![0x00, 0x14, byte])
    }

    fn fixed(byte: u8, sat: u64) -> Output<OutputValue> {
        Output::new(script(byte), OutputValue::Fixed(Amount::from_sat(sat)))
    }

    fn max(byte: u8) -> Output<OutputValue> {
        Output::new(script(byte), OutputValue::Max)
    }

    #[test]
    fn test_is_max_output() {
        assert!(is_max_output(&max(1)));
        assert!(!is_max_output(&fixed(1, 1000)));
    }

    #[test]
    fn test_get_max_output() {
        let outputs = vec![fixed(1, 1000), max(2), fixed(3, 500)];
        let found = get_max_output(&outputs).unwrap().unwrap();
        assert_eq!(found.script, script(2));

        let none = vec![fixed(1, 1000)];
        assert!(get_max_output(&none).unwrap().is_none());

        let two = vec![max(1), fixed(2, 10), max(3)];
        assert_eq!(
            get_max_output(&two).unwrap_err(),
            OutputError::MultipleMaxOutputs(2)
        );
    }

    #[test]
    fn test_output_sums() {
        let outputs = vec![
            Output::new(script(1), Amount::from_sat(1000)),
            Output::new(script(2), Amount::from_sat(2500)),
        ];
        assert_eq!(get_output_sum(&outputs).unwrap(), Amount::from_sat(3500));
        assert_eq!(get_output_sum(&[]).unwrap(), Amount::ZERO);

        let with_max = vec![fixed(1, 1000), max(2), fixed(3, 2500)];
        assert_eq!(
            get_fixed_output_sum(&with_max).unwrap(),
            Amount::from_sat(3500)
        );
    }

    #[test]
    fn test_output_sum_overflow() {
        let outputs = vec![
            Output::new(script(1), Amount::MAX),
            Output::new(script(2), Amount::from_sat(1)),
        ];
        assert_eq!(get_output_sum(&outputs).unwrap_err(), OutputError::Overflow);
    }

    #[test]
    fn test_to_fixed_outputs_resolves_max() {
        let outputs = vec![fixed(1, 1000), max(2), fixed(3, 500)];
        let resolved = to_fixed_outputs(&outputs, Amount::from_sat(77_000)).unwrap();

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].value, Amount::from_sat(1000));
        assert_eq!(resolved[1].value, Amount::from_sat(77_000));
        assert_eq!(resolved[1].script, script(2));
        assert_eq!(resolved[2].value, Amount::from_sat(500));
    }

    #[test]
    fn test_to_fixed_outputs_without_max_is_noop() {
        let outputs = vec![fixed(1, 1000), fixed(2, 2000)];
        let resolved = to_fixed_outputs(&outputs, Amount::from_sat(5)).unwrap();
        let values: Vec<u64> = resolved.iter().map(|o| o.value.to_sat()).collect();
        assert_eq!(values, vec![1000, 2000]);
    }

    #[test]
    fn test_to_fixed_outputs_rejects_multiple_max() {
        let outputs = vec![max(1), max(2)];
        assert!(matches!(
            to_fixed_outputs(&outputs, Amount::from_sat(1)),
            Err(OutputError::MultipleMaxOutputs(2))
        ));
    }

    #[test]
    fn test_fixed_sum_independent_of_resolution() {
        let outputs = vec![fixed(1, 1000), max(2)];
        let before = get_fixed_output_sum(&outputs).unwrap();
        let resolved = to_fixed_outputs(&outputs, Amount::from_sat(9000)).unwrap();
        assert_eq!(before, Amount::from_sat(1000));
        assert_eq!(get_output_sum(&resolved).unwrap(), Amount::from_sat(10_000));
    }

    #[test]
    fn test_txout_conversion() {
        let output = Output::new(script(7), Amount::from_sat(42));
        let txout: TxOut = output.clone().into();
        assert_eq!(txout.value, Amount::from_sat(42));
        assert_eq!(Output::from(txout), output);
    }

    #[test]
    fn test_output_value_serde() {
        let json = serde_json::to_string(&OutputValue::Max).unwrap();
        assert_eq!(json, "\"max\"");
        let parsed: OutputValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, OutputValue::Max);

        let fixed = OutputValue::Fixed(Amount::from_sat(1_500));
        let json = serde_json::to_string(&fixed).unwrap();
        assert_eq!(json, "1500");
        assert_eq!(serde_json::from_str::<OutputValue>(&json).unwrap(), fixed);

        assert!(serde_json::from_str::<OutputValue>("\"all\"").is_err());
        assert!(serde_json::from_str::<OutputValue>("{\"fixed\":1}").is_err());
    }
}
