//! Host-call argument parsing.
//!
//! A call arrives as a positional list of loosely typed values. The type of
//! the second value selects the mode:
//!
//! - `(model, sequence_path, [scale], [preview])`
//! - `(model, device_id, [width], [height], [scale])`

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::shared::constants::{DEFAULT_FRAME_SCALE, DEFAULT_PREVIEW};

/// A dynamically typed host value.
#[derive(Clone, Debug, PartialEq)]
pub enum Argument {
    Text(String),
    Double(f64),
    Int32(i32),
    Bool(bool),
    /// Placeholder that selects the default for an optional parameter.
    Empty,
}

impl Argument {
    /// Converts a command-line token into a typed value.
    ///
    /// A leading `'` forces text, so numeric-looking paths can be passed.
    pub fn from_token(token: &str) -> Self {
        if let Some(text) = token.strip_prefix('\'') {
            return Argument::Text(text.strip_suffix('\'').unwrap_or(text).to_string());
        }
        match token {
            "true" => return Argument::Bool(true),
            "false" => return Argument::Bool(false),
            "[]" => return Argument::Empty,
            _ => {}
        }
        if let Ok(i) = token.parse::<i32>() {
            return Argument::Int32(i);
        }
        let lower = token.to_ascii_lowercase();
        match token.parse::<f64>() {
            Ok(d) if !lower.contains("inf") && !lower.contains("nan") => Argument::Double(d),
            _ => Argument::Text(token.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Argument::Double(_) | Argument::Int32(_))
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Argument::Double(d) => Some(*d),
            Argument::Int32(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Text(s) => write!(f, "'{s}'"),
            Argument::Double(d) => write!(f, "{d}"),
            Argument::Int32(i) => write!(f, "{i}"),
            Argument::Bool(b) => write!(f, "{b}"),
            Argument::Empty => write!(f, "[]"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArgumentError {
    #[error("no parameters specified")]
    NoParameters,
    #[error("invalid number of parameters")]
    InvalidCount,
    #[error("model path must be a string containing the path to the model file")]
    ModelPathNotText,
    #[error("second parameter must be either a sequence path or a device id")]
    InvalidSource,
    #[error("parameter {position} must be a number, got {value}")]
    ExpectedNumber { position: usize, value: Argument },
    #[error("parameter {position} must be a non-negative integer, got {value}")]
    ExpectedNonNegative { position: usize, value: Argument },
    #[error("parameter {position} must be a logical value, got {value}")]
    ExpectedLogical { position: usize, value: Argument },
    #[error("frame scale must be a positive number, got {0}")]
    InvalidScale(f64),
}

/// Where frames come from.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceSpec {
    /// Video file, image file or directory of images.
    Sequence { path: PathBuf },
    /// Capture device; a zero width/height keeps the device default.
    Device { id: u32, width: u32, height: u32 },
}

/// Typed parameters of one call.
#[derive(Clone, Debug, PartialEq)]
pub struct InvocationParams {
    pub model_path: PathBuf,
    pub source: SourceSpec,
    pub frame_scale: f64,
    pub preview: bool,
}

const MAX_SEQUENCE_ARGS: usize = 4;
const MAX_DEVICE_ARGS: usize = 5;

impl InvocationParams {
    pub fn parse(args: &[Argument]) -> Result<Self, ArgumentError> {
        if args.is_empty() {
            return Err(ArgumentError::NoParameters);
        }
        if args.len() < 2 {
            return Err(ArgumentError::InvalidCount);
        }

        let Argument::Text(model) = &args[0] else {
            return Err(ArgumentError::ModelPathNotText);
        };
        let model_path = PathBuf::from(model);

        match &args[1] {
            Argument::Text(path) => {
                if args.len() > MAX_SEQUENCE_ARGS {
                    return Err(ArgumentError::InvalidCount);
                }
                let frame_scale = scale_at(args, 2)?;
                let preview = logical_at(args, 3, DEFAULT_PREVIEW)?;
                Ok(Self {
                    model_path,
                    source: SourceSpec::Sequence {
                        path: PathBuf::from(path),
                    },
                    frame_scale,
                    preview,
                })
            }
            device if device.is_numeric() => {
                if args.len() > MAX_DEVICE_ARGS {
                    return Err(ArgumentError::InvalidCount);
                }
                let id = non_negative_at(args, 1, 0)?;
                let width = non_negative_at(args, 2, 0)?;
                let height = non_negative_at(args, 3, 0)?;
                let frame_scale = scale_at(args, 4)?;
                Ok(Self {
                    model_path,
                    source: SourceSpec::Device { id, width, height },
                    frame_scale,
                    preview: DEFAULT_PREVIEW,
                })
            }
            _ => Err(ArgumentError::InvalidSource),
        }
    }
}

/// Optional argument at `index`, treating `Empty` as absent.
fn optional(args: &[Argument], index: usize) -> Option<&Argument> {
    args.get(index).filter(|a| **a != Argument::Empty)
}

fn number_at(args: &[Argument], index: usize) -> Result<Option<f64>, ArgumentError> {
    let Some(arg) = optional(args, index) else {
        return Ok(None);
    };
    arg.as_f64()
        .map(Some)
        .ok_or_else(|| ArgumentError::ExpectedNumber {
            position: index + 1,
            value: arg.clone(),
        })
}

fn scale_at(args: &[Argument], index: usize) -> Result<f64, ArgumentError> {
    let scale = number_at(args, index)?.unwrap_or(DEFAULT_FRAME_SCALE);
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ArgumentError::InvalidScale(scale));
    }
    Ok(scale)
}

fn non_negative_at(args: &[Argument], index: usize, default: u32) -> Result<u32, ArgumentError> {
    let Some(value) = number_at(args, index)? else {
        return Ok(default);
    };
    // Host integers arrive as doubles; truncate like the host's int cast.
    let truncated = value.trunc();
    if !truncated.is_finite() || truncated < 0.0 || truncated > u32::MAX as f64 {
        return Err(ArgumentError::ExpectedNonNegative {
            position: index + 1,
            value: args[index].clone(),
        });
    }
    Ok(truncated as u32)
}

fn logical_at(args: &[Argument], index: usize, default: bool) -> Result<bool, ArgumentError> {
    match optional(args, index) {
        None => Ok(default),
        Some(Argument::Bool(b)) => Ok(*b),
        Some(arg) if arg.is_numeric() => Ok(arg.as_f64().is_some_and(|v| v != 0.0)),
        Some(arg) => Err(ArgumentError::ExpectedLogical {
            position: index + 1,
            value: arg.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn text(s: &str) -> Argument {
        Argument::Text(s.to_string())
    }

    // ── Shape errors ─────────────────────────────────────────────────

    #[test]
    fn test_zero_arguments_is_no_parameters() {
        assert_eq!(
            InvocationParams::parse(&[]),
            Err(ArgumentError::NoParameters)
        );
    }

    #[test]
    fn test_single_argument_is_invalid_count() {
        assert_eq!(
            InvocationParams::parse(&[text("model.onnx")]),
            Err(ArgumentError::InvalidCount)
        );
    }

    #[rstest]
    #[case::number_then_path(vec![Argument::Double(1.0), text("video.mp4")])]
    #[case::int_then_device(vec![Argument::Int32(3), Argument::Int32(0)])]
    #[case::bool_then_path(vec![Argument::Bool(true), text("video.mp4"), Argument::Double(0.5)])]
    #[case::empty_then_device(vec![Argument::Empty, Argument::Int32(0), Argument::Int32(640)])]
    fn test_non_text_model_path_fails(#[case] args: Vec<Argument>) {
        assert_eq!(
            InvocationParams::parse(&args),
            Err(ArgumentError::ModelPathNotText)
        );
    }

    #[rstest]
    #[case::bool(Argument::Bool(true))]
    #[case::empty(Argument::Empty)]
    fn test_second_argument_neither_path_nor_device_fails(#[case] second: Argument) {
        assert_eq!(
            InvocationParams::parse(&[text("model.onnx"), second]),
            Err(ArgumentError::InvalidSource)
        );
    }

    #[test]
    fn test_too_many_sequence_arguments() {
        let args = [
            text("m"),
            text("v.mp4"),
            Argument::Double(1.0),
            Argument::Bool(true),
            Argument::Int32(1),
        ];
        assert_eq!(
            InvocationParams::parse(&args),
            Err(ArgumentError::InvalidCount)
        );
    }

    #[test]
    fn test_too_many_device_arguments() {
        let mut args = vec![Argument::Int32(1); 6];
        args[0] = text("m");
        assert_eq!(
            InvocationParams::parse(&args),
            Err(ArgumentError::InvalidCount)
        );
    }

    // ── Sequence mode ────────────────────────────────────────────────

    #[test]
    fn test_sequence_defaults() {
        let params = InvocationParams::parse(&[text("model.onnx"), text("clip.mp4")]).unwrap();
        assert_eq!(params.model_path, PathBuf::from("model.onnx"));
        assert_eq!(
            params.source,
            SourceSpec::Sequence {
                path: PathBuf::from("clip.mp4")
            }
        );
        assert_relative_eq!(params.frame_scale, 1.0);
        assert!(params.preview);
    }

    #[test]
    fn test_sequence_scale_and_preview() {
        let params = InvocationParams::parse(&[
            text("model.onnx"),
            text("frames/"),
            Argument::Double(0.5),
            Argument::Bool(false),
        ])
        .unwrap();
        assert_relative_eq!(params.frame_scale, 0.5);
        assert!(!params.preview);
    }

    #[rstest]
    #[case::zero(Argument::Double(0.0), false)]
    #[case::one(Argument::Int32(1), true)]
    #[case::empty_keeps_default(Argument::Empty, true)]
    fn test_sequence_preview_accepts_numbers(#[case] arg: Argument, #[case] expected: bool) {
        let params =
            InvocationParams::parse(&[text("m"), text("v.mp4"), Argument::Double(1.0), arg])
                .unwrap();
        assert_eq!(params.preview, expected);
    }

    #[test]
    fn test_sequence_preview_rejects_text() {
        let err = InvocationParams::parse(&[text("m"), text("v.mp4"), Argument::Empty, text("no")])
            .unwrap_err();
        assert!(matches!(
            err,
            ArgumentError::ExpectedLogical { position: 4, .. }
        ));
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-1.0)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn test_invalid_scale(#[case] scale: f64) {
        let err = InvocationParams::parse(&[text("m"), text("v.mp4"), Argument::Double(scale)])
            .unwrap_err();
        assert!(matches!(err, ArgumentError::InvalidScale(_)));
    }

    #[test]
    fn test_scale_must_be_numeric() {
        let err =
            InvocationParams::parse(&[text("m"), text("v.mp4"), text("big")]).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::ExpectedNumber {
                position: 3,
                value: text("big"),
            }
        );
    }

    // ── Device mode ──────────────────────────────────────────────────

    #[test]
    fn test_device_defaults() {
        let params = InvocationParams::parse(&[text("model.onnx"), Argument::Double(0.0)]).unwrap();
        assert_eq!(
            params.source,
            SourceSpec::Device {
                id: 0,
                width: 0,
                height: 0
            }
        );
        assert_relative_eq!(params.frame_scale, 1.0);
        assert!(params.preview);
    }

    #[test]
    fn test_device_full_arguments() {
        let params = InvocationParams::parse(&[
            text("model.onnx"),
            Argument::Int32(1),
            Argument::Int32(1280),
            Argument::Double(720.0),
            Argument::Double(0.25),
        ])
        .unwrap();
        assert_eq!(
            params.source,
            SourceSpec::Device {
                id: 1,
                width: 1280,
                height: 720
            }
        );
        assert_relative_eq!(params.frame_scale, 0.25);
    }

    #[test]
    fn test_device_size_truncates_doubles() {
        let params = InvocationParams::parse(&[
            text("m"),
            Argument::Double(2.9),
            Argument::Double(640.7),
        ])
        .unwrap();
        assert_eq!(
            params.source,
            SourceSpec::Device {
                id: 2,
                width: 640,
                height: 0
            }
        );
    }

    #[test]
    fn test_negative_device_id_fails() {
        let err = InvocationParams::parse(&[text("m"), Argument::Int32(-1)]).unwrap_err();
        assert!(matches!(
            err,
            ArgumentError::ExpectedNonNegative { position: 2, .. }
        ));
    }

    // ── Tokens ───────────────────────────────────────────────────────

    #[rstest]
    #[case::text("clip.mp4", text("clip.mp4"))]
    #[case::int("0", Argument::Int32(0))]
    #[case::negative_int("-3", Argument::Int32(-3))]
    #[case::double("0.5", Argument::Double(0.5))]
    #[case::exponent("1e-1", Argument::Double(0.1))]
    #[case::bool_true("true", Argument::Bool(true))]
    #[case::bool_false("false", Argument::Bool(false))]
    #[case::empty("[]", Argument::Empty)]
    #[case::quoted_number("'42", text("42"))]
    #[case::quoted_both_sides("'7'", text("7"))]
    #[case::word_like_float("inf", text("inf"))]
    #[case::nan_word("NaN", text("NaN"))]
    fn test_from_token(#[case] token: &str, #[case] expected: Argument) {
        assert_eq!(Argument::from_token(token), expected);
    }

    #[test]
    fn test_tokens_drive_mode_selection() {
        let args: Vec<Argument> = ["model.onnx", "0", "640", "480"]
            .iter()
            .map(|t| Argument::from_token(t))
            .collect();
        let params = InvocationParams::parse(&args).unwrap();
        assert!(matches!(params.source, SourceSpec::Device { id: 0, .. }));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ArgumentError::NoParameters.to_string(),
            "no parameters specified"
        );
        assert_eq!(
            ArgumentError::InvalidSource.to_string(),
            "second parameter must be either a sequence path or a device id"
        );
    }
}
